//! HTTP-level tests for the EDGAR repository against a mock server.

use std::time::Duration;

use chrono::NaiveDate;
use filings_core::{EntityId, FilingError, FilingRepository, RecordKind};
use filings_edgar::{EdgarConfig, EdgarRepository};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBMISSIONS_PATH: &str = "/submissions/CIK0000320193.json";

fn filing_text(form: &str, period: &str, revenue: &str) -> String {
    format!(
        "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE:\t{form}\nCONFORMED PERIOD OF REPORT:\t{period}\n</SEC-HEADER>\n\
         <ix:nonFraction name=\"us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax\" unitRef=\"usd\">{revenue}</ix:nonFraction>\n\
         <ix:nonFraction name=\"us-gaap:StockholdersEquity\" unitRef=\"usd\">66,708</ix:nonFraction>"
    )
}

async fn repository(server: &MockServer) -> EdgarRepository {
    let config = EdgarConfig::new("Test test@example.com")
        .with_base_url(&server.uri())
        .with_min_request_interval(Duration::ZERO);
    EdgarRepository::new(config).unwrap()
}

async fn mount_tickers(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
            "1": { "cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP" }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_submissions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SUBMISSIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cik": "320193",
            "name": "Apple Inc.",
            "filings": {
                "recent": {
                    "accessionNumber": [
                        "0000320193-24-000081",
                        "0000320193-24-000069",
                        "0000320193-23-000106",
                        "0000320193-23-000077",
                        "0000320193-23-000064"
                    ],
                    "form": ["10-Q", "10-Q", "10-K", "10-Q", "10-Q"],
                    "reportDate": ["2024-06-29", "2024-03-30", "2023-09-30", "2023-07-01", "2023-04-01"]
                },
                "files": []
            }
        })))
        .mount(server)
        .await;
}

async fn mount_document(server: &MockServer, accession: &str, body: String) {
    let archive = format!(
        "/Archives/edgar/data/320193/{}/{}.txt",
        accession.replace('-', ""),
        accession
    );
    Mock::given(method("GET"))
        .and(path(archive))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_quarterly_newest_first() {
    let server = MockServer::start().await;
    mount_tickers(&server, 1).await;
    mount_submissions(&server).await;
    mount_document(
        &server,
        "0000320193-24-000081",
        filing_text("10-Q", "20240629", "85,777"),
    )
    .await;
    mount_document(
        &server,
        "0000320193-24-000069",
        filing_text("10-Q", "20240330", "90,753"),
    )
    .await;

    let repo = repository(&server).await;
    let records = repo
        .fetch_quarterly(&EntityId::new("aapl"), 2)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let first = &records.as_slice()[0];
    assert_eq!(first.source_file, "0000320193-24-000081.txt");
    assert_eq!(first.entity_id, EntityId::new("AAPL"));
    assert_eq!(first.record_kind, RecordKind::Quarterly);
    assert_eq!(first.period_end, NaiveDate::from_ymd_opt(2024, 6, 29).unwrap());
    assert_eq!(first.revenue, Some(85_777));
    assert_eq!(first.equity, Some(66_708));
    assert_eq!(first.net_income, None);
    assert_eq!(
        records.as_slice()[1].period_end,
        NaiveDate::from_ymd_opt(2024, 3, 30).unwrap()
    );
}

#[tokio::test]
async fn test_bad_documents_are_skipped() {
    let server = MockServer::start().await;
    mount_tickers(&server, 1).await;
    mount_submissions(&server).await;
    // Newest 10-Q has no period header, second is missing, third is fine.
    mount_document(
        &server,
        "0000320193-24-000081",
        "<SEC-HEADER>no period here</SEC-HEADER>".to_string(),
    )
    .await;
    mount_document(
        &server,
        "0000320193-23-000077",
        filing_text("10-Q", "20230701", "81,797"),
    )
    .await;

    let repo = repository(&server).await;
    let records = repo
        .fetch_quarterly(&EntityId::new("AAPL"), 3)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records.as_slice()[0].source_file, "0000320193-23-000077.txt");
}

#[tokio::test]
async fn test_ticker_lookup_is_cached() {
    let server = MockServer::start().await;
    mount_tickers(&server, 1).await;
    mount_submissions(&server).await;
    mount_document(
        &server,
        "0000320193-23-000106",
        filing_text("10-K", "20230930", "383,285"),
    )
    .await;

    let repo = repository(&server).await;
    let entity = EntityId::new("AAPL");
    let first = repo.fetch_annual(&entity, 1).await.unwrap();
    let second = repo.fetch_annual(&entity, 1).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.as_slice()[0].record_kind, RecordKind::Annual);
    assert_eq!(first.as_slice()[0].revenue, Some(383_285));
}

#[tokio::test]
async fn test_unknown_ticker() {
    let server = MockServer::start().await;
    mount_tickers(&server, 1).await;

    let repo = repository(&server).await;
    let err = repo
        .fetch_quarterly(&EntityId::new("NOPE"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, FilingError::EntityNotFound(ref t) if t == "NOPE"));
    assert!(err.is_retrieval_failure());
}

#[tokio::test]
async fn test_no_filings_of_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000789019.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filings": { "recent": { "accessionNumber": ["x"], "form": ["8-K"], "reportDate": [""] } }
        })))
        .mount(&server)
        .await;

    let repo = repository(&server).await;
    let err = repo
        .fetch_annual(&EntityId::new("789019"), 2)
        .await
        .unwrap_err();

    assert!(matches!(err, FilingError::DataNotAvailable { .. }));
}

#[tokio::test]
async fn test_rate_limited_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SUBMISSIONS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let repo = repository(&server).await;
    let err = repo
        .fetch_quarterly(&EntityId::new("320193"), 1)
        .await
        .unwrap_err();

    match err {
        FilingError::RateLimited {
            provider,
            retry_after,
        } => {
            assert_eq!(provider, "SEC EDGAR");
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_limit_makes_no_requests() {
    let server = MockServer::start().await;
    mount_tickers(&server, 0).await;

    let repo = repository(&server).await;
    let records = repo
        .fetch_quarterly(&EntityId::new("AAPL"), 0)
        .await
        .unwrap();
    assert!(records.is_empty());
}
