//! Doctor command - verify API keys, external tools and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    Output::header("Innsikt Doctor");
    println!();
    println!("Checking API keys, tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    let key_checks = vec![
        check_key(
            &settings.model.api_key_env,
            std::env::var(&settings.model.api_key_env).ok(),
            true,
            "Required by every agent",
        ),
        check_key(
            &settings.search.tavily_api_key_env,
            std::env::var(&settings.search.tavily_api_key_env).ok(),
            false,
            "Only the ingredients agent needs it (tavily_search)",
        ),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("External Tools").bold());
    let ytdlp = check_tool("yt-dlp", install_hint_ytdlp());
    ytdlp.print();
    checks.push(ytdlp);

    println!();

    println!("{}", style("Model").bold());
    Output::kv("Endpoint", &settings.model.api_base);
    Output::kv("Model", &settings.model.model);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path.unwrap_or_else(Settings::default_config_path));
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Innsikt.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Innsikt is ready to use.");
    }

    Ok(())
}

/// Check an API key read from `var`. A missing optional key is only a warning.
fn check_key(var: &str, value: Option<String>, required: bool, purpose: &str) -> CheckResult {
    let hint = format!("Set with: export {}='...' ({})", var, purpose);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) => CheckResult::ok(var, &format!("configured ({})", mask_key(&key))),
        None if required => CheckResult::error(var, "not set", &hint),
        None => CheckResult::warning(var, "not set", &hint),
    }
}

/// Show only the edges of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (needed for youtube)", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: std::path::PathBuf) -> CheckResult {
    if config_path.exists() {
        match Settings::load_from(Some(&config_path)) {
            Ok(_) => CheckResult::ok("Config file", &format!("{}", config_path.display())),
            Err(e) => CheckResult::error(
                "Config file",
                &format!("{} does not parse: {}", config_path.display(), e),
                "Fix the file or regenerate it with: innsikt config init",
            ),
        }
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: innsikt config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_key() {
        let ok = check_key("GOOGLE_API_KEY", Some("AIzaSyExampleKey1234".to_string()), true, "x");
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (AIza...1234)");

        let missing_required = check_key("GOOGLE_API_KEY", None, true, "x");
        assert_eq!(missing_required.status, CheckStatus::Error);

        let missing_optional = check_key("TAVILY_API_KEY", None, false, "x");
        assert_eq!(missing_optional.status, CheckStatus::Warning);

        let empty = check_key("TAVILY_API_KEY", Some("  ".to_string()), false, "x");
        assert_eq!(empty.status, CheckStatus::Error);
    }

    #[test]
    fn test_mask_key_short() {
        assert_eq!(mask_key("abc"), "***");
    }

    #[test]
    fn test_check_config_file_broken() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model\n")?;
        assert_eq!(check_config_file(path).status, CheckStatus::Error);
        assert_eq!(
            check_config_file(dir.path().join("absent.toml")).status,
            CheckStatus::Warning
        );
        Ok(())
    }
}
