#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Gap-free reconciliation of quarterly and annual filing records.
//!
//! This crate re-exports the core types and the repository implementations,
//! and provides the [`Reconciler`] that fills missing quarters with
//! supplemental retrievals.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR repository (default)
//!
//! # Example
//!
//! ```rust,ignore
//! use filings::{EdgarRepository, EntityId, Reconciler, Settings, export};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let repository = EdgarRepository::new(settings.edgar_config())?;
//!     let entity = EntityId::new("AAPL");
//!
//!     let outcome = Reconciler::new(repository).reconcile(&entity, 4).await?;
//!     let path = export::output_path(&settings.output_dir, &entity, 4);
//!     export::write_csv(&outcome.records, &path)?;
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use filings_core::*;

// Repositories
#[cfg(feature = "edgar")]
pub use filings_edgar::{EdgarConfig, EdgarRepository};

pub mod export;
pub mod gap;
pub mod reconcile;
pub mod settings;

pub use gap::{covered_periods, find_gaps};
pub use reconcile::{
    DedupPolicy, ReconcileOptions, ReconcileState, Reconciler, Reconciliation, RetrievalIssue,
    RetrievalStage, YearDeficit, completeness_deficits,
};
pub use settings::Settings;
