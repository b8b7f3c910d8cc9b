//! Repository trait for retrieving filing records.
//!
//! A [`FilingRepository`] returns the most recent annual or quarterly records
//! it can obtain for an entity. Implementations are expected to be slow and
//! rate limited; callers should not assume sub-second latency.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::Result,
    kind::RecordKind,
    types::{EntityId, RecordSet},
};

/// Source of annual and quarterly filing records.
///
/// Implementations skip documents that cannot be turned into a record and
/// return the rest, so a successful call may hold fewer records than `limit`.
/// An `Err` means nothing could be retrieved for the request.
#[async_trait]
pub trait FilingRepository: Send + Sync + Debug {
    /// Returns the name of this repository (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Fetches up to `limit` most recent records of `kind` for `entity`.
    async fn fetch_records(
        &self,
        entity: &EntityId,
        kind: RecordKind,
        limit: usize,
    ) -> Result<RecordSet>;

    /// Fetches up to `limit` most recent annual records.
    async fn fetch_annual(&self, entity: &EntityId, limit: usize) -> Result<RecordSet> {
        self.fetch_records(entity, RecordKind::Annual, limit).await
    }

    /// Fetches up to `limit` most recent quarterly records.
    async fn fetch_quarterly(&self, entity: &EntityId, limit: usize) -> Result<RecordSet> {
        self.fetch_records(entity, RecordKind::Quarterly, limit).await
    }
}

#[async_trait]
impl<T: FilingRepository + ?Sized> FilingRepository for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_records(
        &self,
        entity: &EntityId,
        kind: RecordKind,
        limit: usize,
    ) -> Result<RecordSet> {
        (**self).fetch_records(entity, kind, limit).await
    }
}
