//! Stock data tools backed by Yahoo Finance's public endpoints.

use super::{required_str, Tool};
use crate::error::{InnsiktError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const CONSENT_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Thin Yahoo Finance client shared by the finance tools.
///
/// quoteSummary needs a session cookie plus a crumb; both are fetched once
/// on first use.
pub struct YahooFinance {
    http: reqwest::Client,
    crumb: OnceCell<String>,
}

impl YahooFinance {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            crumb: OnceCell::new(),
        }
    }

    async fn get_json(&self, url: url::Url) -> Result<Value> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status, &text)
    }

    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // Sets the session cookie; the status is irrelevant.
                let _ = self.http.get(CONSENT_URL).send().await;
                let crumb = self.http.get(CRUMB_URL).send().await?.text().await?;
                if crumb.trim().is_empty() || crumb.contains('<') {
                    return Err(InnsiktError::Tool(
                        "Yahoo Finance did not issue a crumb".to_string(),
                    ));
                }
                Ok::<_, InnsiktError>(crumb.trim().to_string())
            })
            .await?;
        Ok(crumb.as_str())
    }

    /// Latest chart metadata for a symbol.
    pub async fn chart_meta(&self, symbol: &str) -> Result<Value> {
        let url = symbol_url(CHART_URL, symbol, &[("range", "1d"), ("interval", "1d")])?;
        let body = self.get_json(url).await?;
        body["chart"]["result"][0]["meta"]
            .as_object()
            .map(|m| Value::Object(m.clone()))
            .ok_or_else(|| {
                InnsiktError::Tool(
                    yahoo_error(&body).unwrap_or_else(|| format!("No data for {}", symbol)),
                )
            })
    }

    /// quoteSummary modules for a symbol.
    pub async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value> {
        let crumb = self.crumb().await?;
        let url = symbol_url(QUOTE_SUMMARY_URL, symbol, &[("modules", modules), ("crumb", crumb)])?;
        let body = self.get_json(url).await?;
        let result = &body["quoteSummary"]["result"][0];
        if result.is_null() {
            return Err(InnsiktError::Tool(
                yahoo_error(&body).unwrap_or_else(|| format!("No data for {}", symbol)),
            ));
        }
        Ok(result.clone())
    }

    /// News items mentioning a symbol.
    pub async fn news(&self, symbol: &str, count: usize) -> Result<Value> {
        let count = count.to_string();
        let url = url::Url::parse_with_params(
            SEARCH_URL,
            &[("q", symbol), ("newsCount", count.as_str()), ("quotesCount", "0")],
        )
        .map_err(|e| InnsiktError::Tool(e.to_string()))?;
        let body = self.get_json(url).await?;
        Ok(body["news"].clone())
    }
}

/// `base/<symbol>?params`, with the symbol percent-encoded as one path segment.
fn symbol_url(base: &str, symbol: &str, params: &[(&str, &str)]) -> Result<url::Url> {
    let mut url = url::Url::parse(base).map_err(|e| InnsiktError::Tool(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| InnsiktError::Tool(format!("{} cannot take a path", base)))?
        .push(symbol);
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

/// Check the status before decoding, so rate limits and HTML error pages
/// surface as what they are.
fn parse_response(status: reqwest::StatusCode, text: &str) -> Result<Value> {
    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|body| yahoo_error(&body))
            .unwrap_or_else(|| text.trim().chars().take(200).collect());
        return Err(InnsiktError::Tool(format!(
            "Yahoo Finance returned {}: {}",
            status, detail
        )));
    }
    Ok(serde_json::from_str(text)?)
}

fn yahoo_error(body: &Value) -> Option<String> {
    ["chart", "quoteSummary", "finance"]
        .iter()
        .find_map(|root| body[*root]["error"]["description"].as_str())
        .map(|s| s.to_string())
}

fn symbol_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": "The stock ticker symbol, e.g. NVDA"
            }
        },
        "required": ["symbol"]
    })
}

fn normalize_symbol(arguments: &Value) -> Result<String> {
    Ok(required_str(arguments, "symbol")?.trim().to_uppercase())
}

/// `get_stock_price`: current price and day range.
pub struct StockPrice {
    yahoo: Arc<YahooFinance>,
}

impl StockPrice {
    pub fn new(yahoo: Arc<YahooFinance>) -> Self {
        Self { yahoo }
    }
}

#[async_trait]
impl Tool for StockPrice {
    fn name(&self) -> &'static str {
        "get_stock_price"
    }

    fn description(&self) -> &'static str {
        "Get the current stock price, currency and today's trading range for a ticker symbol."
    }

    fn parameters(&self) -> Value {
        symbol_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let symbol = normalize_symbol(arguments)?;
        let meta = self.yahoo.chart_meta(&symbol).await?;
        Ok(format_price(&symbol, &meta))
    }
}

/// `get_stock_fundamentals`: valuation and profile figures.
pub struct StockFundamentals {
    yahoo: Arc<YahooFinance>,
}

impl StockFundamentals {
    pub fn new(yahoo: Arc<YahooFinance>) -> Self {
        Self { yahoo }
    }
}

#[async_trait]
impl Tool for StockFundamentals {
    fn name(&self) -> &'static str {
        "get_stock_fundamentals"
    }

    fn description(&self) -> &'static str {
        "Get company fundamentals (sector, market cap, P/E, margins, 52-week range) for a ticker symbol."
    }

    fn parameters(&self) -> Value {
        symbol_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let symbol = normalize_symbol(arguments)?;
        let summary = self
            .yahoo
            .quote_summary(&symbol, "assetProfile,summaryDetail,financialData")
            .await?;
        Ok(format_fundamentals(&symbol, &summary))
    }
}

/// `get_analyst_recommendations`: buy/hold/sell counts by period.
pub struct AnalystRecommendations {
    yahoo: Arc<YahooFinance>,
}

impl AnalystRecommendations {
    pub fn new(yahoo: Arc<YahooFinance>) -> Self {
        Self { yahoo }
    }
}

#[async_trait]
impl Tool for AnalystRecommendations {
    fn name(&self) -> &'static str {
        "get_analyst_recommendations"
    }

    fn description(&self) -> &'static str {
        "Get analyst recommendation counts (strong buy to strong sell) for recent months."
    }

    fn parameters(&self) -> Value {
        symbol_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let symbol = normalize_symbol(arguments)?;
        let summary = self
            .yahoo
            .quote_summary(&symbol, "recommendationTrend")
            .await?;
        Ok(format_recommendations(&symbol, &summary))
    }
}

/// `get_company_news`: recent headlines.
pub struct CompanyNews {
    yahoo: Arc<YahooFinance>,
    count: usize,
}

impl CompanyNews {
    pub fn new(yahoo: Arc<YahooFinance>, count: usize) -> Self {
        Self { yahoo, count }
    }
}

#[async_trait]
impl Tool for CompanyNews {
    fn name(&self) -> &'static str {
        "get_company_news"
    }

    fn description(&self) -> &'static str {
        "Get recent news headlines about a company by ticker symbol."
    }

    fn parameters(&self) -> Value {
        symbol_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let symbol = normalize_symbol(arguments)?;
        let news = self.yahoo.news(&symbol, self.count).await?;
        Ok(format_news(&symbol, &news))
    }
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| value["raw"].as_f64())
}

/// Yahoo's preformatted value, falling back to the raw one.
fn display(value: &Value) -> Option<String> {
    value["fmt"]
        .as_str()
        .map(|s| s.to_string())
        .or_else(|| value.as_str().map(|s| s.to_string()))
        .or_else(|| number(value).map(|n| format!("{:.2}", n)))
}

fn format_price(symbol: &str, meta: &Value) -> String {
    let currency = meta["currency"].as_str().unwrap_or("");
    let field = |key: &str| {
        number(&meta[key])
            .map(|n| format!("{:.2} {}", n, currency).trim().to_string())
            .unwrap_or_else(|| "n/a".to_string())
    };

    format!(
        "| Symbol | Price | Previous Close | Day Low | Day High |\n\
         |---|---|---|---|---|\n\
         | {} | {} | {} | {} | {} |",
        symbol,
        field("regularMarketPrice"),
        field("chartPreviousClose"),
        field("regularMarketDayLow"),
        field("regularMarketDayHigh"),
    )
}

fn format_fundamentals(symbol: &str, summary: &Value) -> String {
    let rows = [
        ("Sector", &summary["assetProfile"]["sector"]),
        ("Industry", &summary["assetProfile"]["industry"]),
        ("Market Cap", &summary["summaryDetail"]["marketCap"]),
        ("Trailing P/E", &summary["summaryDetail"]["trailingPE"]),
        ("Forward P/E", &summary["summaryDetail"]["forwardPE"]),
        ("Dividend Yield", &summary["summaryDetail"]["dividendYield"]),
        ("Beta", &summary["summaryDetail"]["beta"]),
        ("52 Week Low", &summary["summaryDetail"]["fiftyTwoWeekLow"]),
        ("52 Week High", &summary["summaryDetail"]["fiftyTwoWeekHigh"]),
        ("Total Revenue", &summary["financialData"]["totalRevenue"]),
        ("Profit Margin", &summary["financialData"]["profitMargins"]),
        ("Target Mean Price", &summary["financialData"]["targetMeanPrice"]),
        ("Recommendation", &summary["financialData"]["recommendationKey"]),
    ];

    let mut out = format!("Fundamentals for {}\n\n| Metric | Value |\n|---|---|", symbol);
    for (label, value) in rows {
        if let Some(text) = display(value) {
            out.push_str(&format!("\n| {} | {} |", label, text));
        }
    }
    out
}

fn format_recommendations(symbol: &str, summary: &Value) -> String {
    let trend = summary["recommendationTrend"]["trend"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    if trend.is_empty() {
        return format!("No analyst recommendations available for {}.", symbol);
    }

    let mut out = format!(
        "Analyst recommendations for {}\n\n| Period | Strong Buy | Buy | Hold | Sell | Strong Sell |\n|---|---|---|---|---|---|",
        symbol
    );
    for row in trend {
        let count = |key: &str| row[key].as_u64().unwrap_or(0);
        out.push_str(&format!(
            "\n| {} | {} | {} | {} | {} | {} |",
            row["period"].as_str().unwrap_or("?"),
            count("strongBuy"),
            count("buy"),
            count("hold"),
            count("sell"),
            count("strongSell"),
        ));
    }
    out
}

fn format_news(symbol: &str, news: &Value) -> String {
    let items = news.as_array().cloned().unwrap_or_default();
    if items.is_empty() {
        return format!("No recent news found for {}.", symbol);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let published = item["providerPublishTime"]
                .as_i64()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "unknown date".to_string());
            format!(
                "{}. {} ({}, {})\n   {}",
                i + 1,
                item["title"].as_str().unwrap_or("Untitled"),
                item["publisher"].as_str().unwrap_or("unknown publisher"),
                published,
                item["link"].as_str().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
