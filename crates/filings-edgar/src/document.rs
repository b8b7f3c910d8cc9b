//! Extraction of a [`FilingRecord`] from a full-submission text file.
//!
//! EDGAR full submissions start with an SEC header (`CONFORMED PERIOD OF REPORT`,
//! `CONFORMED SUBMISSION TYPE`, ...) followed by the filed documents. Financial
//! figures are read from inline XBRL `ix:nonFraction` facts.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use filings_core::{EntityId, FilingError, FilingRecord, RecordKind, Result};
use regex::Regex;
use tracing::debug;

static PERIOD_OF_REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONFORMED PERIOD OF REPORT:\s*(\d{8})").expect("valid period regex")
});

static SUBMISSION_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONFORMED SUBMISSION TYPE:\s*(\S+)").expect("valid submission type regex")
});

static NON_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ix:nonFraction\b([^>]*)>(.*?)</ix:nonFraction\s*>")
        .expect("valid nonFraction regex")
});

static NAME_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bname\s*=\s*["']([^"']+)["']"#).expect("valid name attribute regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// XBRL concepts tried, in order, for each extracted figure.
const NET_INCOME: &[&str] = &["us-gaap:NetIncomeLoss"];
const SHARES_OUTSTANDING: &[&str] = &["us-gaap:WeightedAverageNumberOfDilutedSharesOutstanding"];
const REVENUE: &[&str] = &[
    "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax",
    "us-gaap:Revenues",
];
const EQUITY: &[&str] = &["us-gaap:StockholdersEquity"];

/// Builds a record from the text of one full submission.
///
/// The period of report is required. Figures that are absent from the
/// document are left empty.
pub fn extract_record(
    text: &str,
    source_file: &str,
    entity: &EntityId,
    kind: RecordKind,
) -> Result<FilingRecord> {
    let period_end = parse_period_of_report(text).ok_or_else(|| FilingError::Extraction {
        source_file: source_file.to_string(),
        reason: "no CONFORMED PERIOD OF REPORT in header".to_string(),
    })?;

    if let Some(found) = SUBMISSION_TYPE.captures(text).and_then(|c| c.get(1)) {
        if found.as_str() != kind.form_type() {
            return Err(FilingError::Extraction {
                source_file: source_file.to_string(),
                reason: format!(
                    "expected a {} submission, found {}",
                    kind.form_type(),
                    found.as_str()
                ),
            });
        }
    }

    let facts = collect_facts(text);
    let figure = |concepts: &[&str], label: &str| {
        let value = concepts
            .iter()
            .find_map(|c| facts.get(*c).and_then(|raw| parse_figure(raw)));
        if value.is_none() {
            debug!(file = source_file, figure = label, "Figure not found");
        }
        value
    };

    Ok(
        FilingRecord::new(source_file, entity.clone(), kind, period_end)
            .with_net_income(figure(NET_INCOME, "net_income"))
            .with_shares_outstanding(figure(SHARES_OUTSTANDING, "shares_outstanding"))
            .with_revenue(figure(REVENUE, "revenue"))
            .with_equity(figure(EQUITY, "equity")),
    )
}

/// Reads the `CONFORMED PERIOD OF REPORT` date from the SEC header.
#[must_use]
pub fn parse_period_of_report(text: &str) -> Option<NaiveDate> {
    let digits = PERIOD_OF_REPORT.captures(text)?.get(1)?.as_str();
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// Parses a displayed figure such as `"96,995"` or `"1,234.6"`.
///
/// Thousands separators are dropped and decimals are truncated toward zero.
#[must_use]
pub fn parse_figure(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok().or_else(|| {
        let value = cleaned.parse::<f64>().ok()?.trunc();
        // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
        (value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64)
            .then(|| value as i64)
    })
}

/// Maps each concept name to the text of its first `ix:nonFraction` fact.
fn collect_facts(text: &str) -> HashMap<String, String> {
    let mut facts = HashMap::new();
    for caps in NON_FRACTION.captures_iter(text) {
        let (Some(attrs), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(name) = NAME_ATTR.captures(attrs.as_str()).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = TAG.replace_all(body.as_str(), "").trim().to_string();
        facts.entry(name.as_str().to_string()).or_insert(value);
    }
    facts
}
