//! Configuration module for Innsikt.
//!
//! Handles loading and managing application settings and prompt framings.

mod prompts;
mod settings;

pub use prompts::{Framing, Prompts};
pub use settings::{
    AgentProfile, AgentSettings, GeneralSettings, MediaSettings, ModelSettings, PromptSettings,
    SearchSettings, Settings, TranscriptSettings,
};

/// Overlay `overlay` onto `base`, recursing into tables so that keys absent
/// from the overlay keep their base value. Arrays and scalars are replaced.
pub(crate) fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_toml_keeps_unset_keys() {
        let mut base: toml::Value =
            toml::from_str("[a]\nname = \"x\"\nlist = [1, 2]\n[b]\nflag = true\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\nlist = [3]\n[c]\nnew = 1\n").unwrap();
        merge_toml(&mut base, overlay);

        assert_eq!(base["a"]["name"].as_str(), Some("x"));
        assert_eq!(base["a"]["list"].as_array().map(|a| a.len()), Some(1));
        assert_eq!(base["b"]["flag"].as_bool(), Some(true));
        assert_eq!(base["c"]["new"].as_integer(), Some(1));
    }
}
