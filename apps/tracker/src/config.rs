use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

const DEFAULT_SEARCH_TERMS: &str = "bewerbung,application";

/// Application configuration loaded from environment variables.
/// Loaded once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Subject keywords; a mail matches if its subject contains any of them.
    pub search_terms: Vec<String>,
    /// Only mails received on or after this date. Also the report period start.
    pub since_date: Option<NaiveDate>,
    pub include_role_in_key: bool,
    /// Ask the user for missing job titles and addresses.
    pub interactive: bool,
    /// Agreed number of applications for the reporting period.
    pub agreed_count: Option<u32>,
    pub customer_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub manual_addr_db: Option<String>,
    pub openregister_db: Option<String>,
    /// xlsx report template with the "Eigenbemühungen" sheet.
    pub table_xlsx: Option<PathBuf>,
    pub report_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

/// Model endpoint settings. Only commands that call the model load these.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            search_terms: parse_terms(
                &std::env::var("SEARCH_TERMS").unwrap_or_else(|_| DEFAULT_SEARCH_TERMS.to_string()),
            ),
            since_date: optional_env("SINCE_DATE")
                .map(|v| parse_date(&v))
                .transpose()
                .context("SINCE_DATE must be a date in YYYY-MM-DD format")?,
            include_role_in_key: optional_env("INCLUDE_JOB_TITLE_IN_KEY")
                .map(|v| parse_bool(&v))
                .transpose()
                .context("INCLUDE_JOB_TITLE_IN_KEY must be true or false")?
                .unwrap_or(false),
            interactive: optional_env("INTERACTIVE")
                .map(|v| parse_bool(&v))
                .transpose()
                .context("INTERACTIVE must be true or false")?
                .unwrap_or(true),
            agreed_count: optional_env("AGREED_COUNT")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("AGREED_COUNT must be a non-negative number")?,
            customer_number: optional_env("KUNDENNUMMER"),
            first_name: optional_env("VORNAME"),
            last_name: optional_env("NACHNAME"),
            manual_addr_db: optional_env("MANUAL_ADDR_DB"),
            openregister_db: optional_env("OPENREGISTER_DB"),
            table_xlsx: optional_env("TABLE_XLSX").map(PathBuf::from),
            report_dir: optional_env("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("reports")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(LlmConfig {
            base_url: require_env("OLLAMA_BASE_URL")?,
            api_key: require_env("OLLAMA_API_KEY")?,
            model: require_env("OLLAMA_MODEL")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is not a YYYY-MM-DD date"))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}
