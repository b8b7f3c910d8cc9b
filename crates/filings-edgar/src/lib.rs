#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR filing repository.
//!
//! This crate retrieves 10-K and 10-Q filings from SEC EDGAR:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Recent filings index from the submissions API
//! - Full-submission download from the EDGAR archives
//! - Record extraction from the SEC header and inline XBRL facts
//!
//! # Example
//!
//! ```no_run
//! use filings_edgar::{EdgarConfig, EdgarRepository};
//! use filings_core::{EntityId, FilingRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = EdgarRepository::new(EdgarConfig::new("MyApp contact@example.com"))?;
//!
//!     let records = repository.fetch_quarterly(&EntityId::new("AAPL"), 4).await?;
//!     for record in &records {
//!         println!("{} {} revenue={:?}", record.record_kind, record.period_end, record.revenue);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Record extraction from full-submission text files.
pub mod document;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use filings_core::{EntityId, FilingError, FilingRepository, RecordKind, RecordSet, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC EDGAR archives base URL
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default per-request HTTP timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Connection settings for [`EdgarRepository`].
#[derive(Clone, Debug)]
pub struct EdgarConfig {
    /// User agent sent with every request.
    ///
    /// The SEC requires a company name and contact e-mail, e.g.
    /// "Sample Company admin@sample.com".
    pub user_agent: String,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Minimum spacing between two requests.
    pub min_request_interval: Duration,
    /// Base URL of the submissions API.
    pub data_base_url: String,
    /// Base URL of the filing archives.
    pub archives_base_url: String,
    /// URL of the ticker to CIK mapping.
    pub tickers_url: String,
}

impl EdgarConfig {
    /// Creates a configuration for the public SEC endpoints.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            min_request_interval: DEFAULT_RATE_LIMIT,
            data_base_url: EDGAR_BASE_URL.to_string(),
            archives_base_url: ARCHIVES_BASE_URL.to_string(),
            tickers_url: COMPANY_TICKERS_URL.to_string(),
        }
    }

    /// Serves every endpoint from `base_url` (`/submissions`, `/Archives/edgar/data`,
    /// `/files/company_tickers.json`). Used to point the repository at a mirror.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.data_base_url = base.to_string();
        self.archives_base_url = format!("{base}/Archives/edgar/data");
        self.tickers_url = format!("{base}/files/company_tickers.json");
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub const fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }
}

/// SEC EDGAR filing repository.
///
/// Downloads the most recent 10-K or 10-Q full submissions for an entity and
/// extracts one [`FilingRecord`](filings_core::FilingRecord) per document.
/// Implements rate limiting per SEC requirements (max 10 requests/second),
/// shared by all concurrent calls on the same repository.
#[derive(Debug)]
pub struct EdgarRepository {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    cik_cache: Mutex<HashMap<EntityId, String>>,
    config: EdgarConfig,
}

impl EdgarRepository {
    /// Create a new EDGAR repository.
    ///
    /// # Example
    /// ```
    /// use filings_edgar::{EdgarConfig, EdgarRepository};
    ///
    /// let repository = EdgarRepository::new(EdgarConfig::new("MyApp contact@example.com")).unwrap();
    /// ```
    pub fn new(config: EdgarConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(FilingError::Config(
                "SEC EDGAR requires a user agent with a contact address".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FilingError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a new EDGAR repository with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, config: EdgarConfig) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_request_interval))),
            cik_cache: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Returns the configuration this repository was built with.
    #[must_use]
    pub const fn config(&self) -> &EdgarConfig {
        &self.config
    }

    /// Resolve an entity to its zero-padded 10-digit CIK.
    ///
    /// Numeric identifiers are taken as CIKs. Tickers are looked up in the SEC
    /// ticker file once per repository.
    pub async fn get_cik(&self, entity: &EntityId) -> Result<String> {
        if entity.as_str().is_empty() {
            return Err(FilingError::InvalidParameter("Empty entity".to_string()));
        }
        if entity.is_cik() {
            return Ok(format!("{:0>10}", entity.as_str()));
        }
        if let Some(cik) = self.cik_cache.lock().await.get(entity) {
            return Ok(cik.clone());
        }

        debug!("Fetching company tickers from SEC");
        let data: HashMap<String, CompanyTickerInfo> =
            self.get_json(&self.config.tickers_url).await?;

        let ticker = entity.as_str();
        let cik = data
            .values()
            .find(|company| company.ticker.eq_ignore_ascii_case(ticker))
            .map(|company| format!("{:0>10}", company.cik_str))
            .ok_or_else(|| FilingError::EntityNotFound(ticker.to_string()))?;

        debug!("Found CIK {} for ticker {}", cik, ticker);
        self.cik_cache
            .lock()
            .await
            .insert(entity.clone(), cik.clone());
        Ok(cik)
    }

    /// Fetch company submissions/filings metadata.
    async fn fetch_company_submissions(&self, cik: &str) -> Result<CompanySubmissions> {
        let url = format!("{}/submissions/CIK{}.json", self.config.data_base_url, cik);
        debug!("Fetching company submissions from {}", url);
        self.get_json(&url).await
    }

    /// Download one full-submission text file.
    async fn fetch_submission_text(&self, cik: &str, accession: &str) -> Result<String> {
        let url = format!(
            "{}/{}/{}/{}.txt",
            self.config.archives_base_url,
            cik.trim_start_matches('0'),
            accession.replace('-', ""),
            accession
        );
        debug!("Downloading filing from {}", url);
        let response = self.send(&url).await?;
        response
            .text()
            .await
            .map_err(|e| FilingError::Network(format!("Failed to read {url}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url).await?;
        response
            .json()
            .await
            .map_err(|e| FilingError::Parse(format!("Failed to parse {url}: {e}")))
    }

    /// Rate-limited GET that maps HTTP failures onto [`FilingError`].
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilingError::Network(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(FilingError::RateLimited {
                    provider: self.name().to_string(),
                    retry_after,
                })
            }
            status => Err(FilingError::Network(format!(
                "Failed to fetch {url}: HTTP {status}"
            ))),
        }
    }
}

#[async_trait]
impl FilingRepository for EdgarRepository {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    async fn fetch_records(
        &self,
        entity: &EntityId,
        kind: RecordKind,
        limit: usize,
    ) -> Result<RecordSet> {
        if limit == 0 {
            return Ok(RecordSet::new());
        }

        let cik = self.get_cik(entity).await?;
        let submissions = self.fetch_company_submissions(&cik).await?;
        let filings = submissions.filings.recent.latest(kind, limit);

        if filings.is_empty() {
            return Err(FilingError::DataNotAvailable {
                entity: entity.to_string(),
                kind: kind.form_type().to_string(),
            });
        }

        info!(
            entity = %entity,
            form = kind.form_type(),
            count = filings.len(),
            "Downloading filings"
        );

        let mut records = Vec::with_capacity(filings.len());
        for filing in filings {
            let source_file = format!("{}.txt", filing.accession_number);
            debug!(file = %source_file, report_date = %filing.report_date, "Fetching filing");
            let text = match self
                .fetch_submission_text(&cik, &filing.accession_number)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %source_file, error = %e, "Could not download filing, skipping");
                    continue;
                }
            };

            match document::extract_record(&text, &source_file, entity, kind) {
                Ok(record) => records.push(record),
                Err(e) => warn!(file = %source_file, error = %e, "Could not extract filing, skipping"),
            }
        }

        Ok(RecordSet::from_records(records))
    }
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Company submissions/filings metadata.
#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    /// Filing history
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    /// Most recent filings, newest first, in columnar form
    recent: RecentFilings,
}

/// Columnar listing of recent filings; index `i` of every column is one filing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
}

/// One filing row from [`RecentFilings`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilingEntry {
    accession_number: String,
    report_date: String,
}

impl RecentFilings {
    /// The `limit` newest filings of `kind`.
    fn latest(&self, kind: RecordKind, limit: usize) -> Vec<FilingEntry> {
        self.form
            .iter()
            .zip(&self.accession_number)
            .enumerate()
            .filter(|(_, (form, _))| form.as_str() == kind.form_type())
            .map(|(i, (_, accession))| FilingEntry {
                accession_number: accession.clone(),
                report_date: self.report_date.get(i).cloned().unwrap_or_default(),
            })
            .take(limit)
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn recent() -> RecentFilings {
        serde_json::from_str(
            r#"{
                "accessionNumber": ["a-1", "a-2", "a-3", "a-4", "a-5"],
                "form": ["10-Q", "8-K", "10-K", "10-Q", "10-Q"],
                "reportDate": ["2024-06-29", "", "2023-09-30", "2023-07-01", "2023-04-01"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_latest_filters_by_form_and_limit() {
        let quarterly = recent().latest(RecordKind::Quarterly, 2);
        assert_eq!(
            quarterly,
            vec![
                FilingEntry {
                    accession_number: "a-1".into(),
                    report_date: "2024-06-29".into(),
                },
                FilingEntry {
                    accession_number: "a-4".into(),
                    report_date: "2023-07-01".into(),
                },
            ]
        );

        let annual = recent().latest(RecordKind::Annual, 5);
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].accession_number, "a-3");
    }

    #[test]
    fn test_repository_name() {
        let repository = EdgarRepository::new(EdgarConfig::new("Test test@example.com")).unwrap();
        assert_eq!(repository.name(), "SEC EDGAR");
    }

    #[test]
    fn test_empty_user_agent_is_rejected() {
        let err = EdgarRepository::new(EdgarConfig::new("  ")).unwrap_err();
        assert!(matches!(err, FilingError::Config(_)));
    }

    #[test]
    fn test_base_url_override() {
        let config = EdgarConfig::new("Test test@example.com").with_base_url("http://127.0.0.1:9/");
        assert_eq!(config.data_base_url, "http://127.0.0.1:9");
        assert_eq!(config.archives_base_url, "http://127.0.0.1:9/Archives/edgar/data");
        assert_eq!(config.tickers_url, "http://127.0.0.1:9/files/company_tickers.json");
    }

    #[tokio::test]
    async fn test_numeric_entity_is_cik() {
        let repository = EdgarRepository::new(EdgarConfig::new("Test test@example.com")).unwrap();
        let cik = repository.get_cik(&EntityId::new("320193")).await.unwrap();
        assert_eq!(cik, "0000320193");
    }
}
