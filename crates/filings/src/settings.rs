//! Process-wide settings, loaded once at start-up.
//!
//! SEC EDGAR requires every request to identify the caller with a company name
//! and contact e-mail. Both come from the environment (optionally via a `.env`
//! file) and are handed to the repository explicitly.

use std::path::{Path, PathBuf};

use filings_core::{FilingError, Result};

/// Environment variable holding the company name sent to SEC EDGAR.
pub const COMPANY_NAME_VAR: &str = "COMPANY_NAME";
/// Environment variable holding the contact e-mail sent to SEC EDGAR.
pub const EMAIL_VAR: &str = "EMAIL";
/// Environment variable holding the directory result files are written to.
pub const BASE_PATH_VAR: &str = "BASE_PATH";

/// Settings shared by every run of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Company name part of the user agent.
    pub company_name: String,
    /// Contact e-mail part of the user agent.
    pub email: String,
    /// Directory result files are written to.
    pub output_dir: PathBuf,
}

impl Settings {
    /// Builds settings from explicit values.
    pub fn new(
        company_name: impl Into<String>,
        email: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let settings = Self {
            company_name: company_name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            output_dir: output_dir.into(),
        };
        if settings.company_name.is_empty() {
            return Err(FilingError::Config(format!("{COMPANY_NAME_VAR} is not set")));
        }
        if settings.email.is_empty() {
            return Err(FilingError::Config(format!("{EMAIL_VAR} is not set")));
        }
        Ok(settings)
    }

    /// Loads settings from the process environment after reading `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Self::new(
            lookup(COMPANY_NAME_VAR).unwrap_or_default(),
            lookup(EMAIL_VAR).unwrap_or_default(),
            lookup(BASE_PATH_VAR)
                .filter(|p| !p.trim().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
        )
    }

    /// Replaces the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// User agent sent with every SEC request, `"{company} {email}"`.
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!("{} {}", self.company_name, self.email)
    }

    /// Repository configuration using this user agent.
    #[cfg(feature = "edgar")]
    #[must_use]
    pub fn edgar_config(&self) -> filings_edgar::EdgarConfig {
        filings_edgar::EdgarConfig::new(self.user_agent())
    }
}
