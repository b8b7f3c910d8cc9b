#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for filing reconciliation.
//!
//! This crate provides the foundational abstractions:
//!
//! - [`FilingRepository`](repository::FilingRepository) - Source of annual and quarterly records
//! - [`FilingRecord`](types::FilingRecord) and [`RecordSet`](types::RecordSet) - Extracted records
//! - [`Period`](period::Period) and [`generate_periods`](period::generate_periods) - Calendar quarters
//! - [`FilingError`](error::FilingError) - Error taxonomy

/// Error types for filing operations.
pub mod error;
/// Record kind definitions (annual, quarterly).
pub mod kind;
/// Calendar-quarter periods and the period generator.
pub mod period;
/// Repository trait for fetching filing records.
pub mod repository;
/// Core data types (EntityId, FilingRecord, RecordSet).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{FilingError, Result};
pub use kind::RecordKind;
pub use period::{Period, generate_periods, generate_periods_from};
pub use repository::FilingRepository;
pub use types::{EntityId, FilingRecord, QUARTERS_PER_ANNUAL, RecordSet};
