//! Reconciliation of quarterly and annual records into a gap-free series.
//!
//! The [`Reconciler`] pulls the most recent quarterly records, checks them
//! against the calendar quarters of the lookback window, and when quarters are
//! missing pulls annual records as anchors and tops up each anchored year until
//! it holds three quarterly records.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use filings_core::{
    EntityId, FilingError, FilingRepository, Period, QUARTERS_PER_ANNUAL, RecordKind, RecordSet,
    Result, generate_periods_from,
};

use crate::gap::find_gaps;

/// Default number of supplemental retrievals in flight at once.
const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default deadline for a single repository call.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// What to do with records returned by more than one retrieval round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep every record from every round, repeats included.
    #[default]
    Preserve,
    /// Keep the first record per `(entity_id, record_kind, period_end)`.
    ByPeriod,
}

/// Tuning for a [`Reconciler`].
#[derive(Clone, Debug)]
pub struct ReconcileOptions {
    /// Date the lookback window ends on; today when `None`.
    pub as_of: Option<NaiveDate>,
    /// Maximum supplemental retrievals in flight at once.
    pub max_concurrency: usize,
    /// Deadline for each repository call; expiry counts as a retrieval failure.
    pub fetch_timeout: Duration,
    /// Handling of repeated records in the merged result.
    pub dedup: DedupPolicy,
    /// Append the base records once when no anchored year needed a
    /// supplemental round. Off by default, in which case such a run returns
    /// only the annual records.
    pub keep_base_without_rounds: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            as_of: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            dedup: DedupPolicy::default(),
            keep_base_without_rounds: false,
        }
    }
}

impl ReconcileOptions {
    /// Fixes the date the lookback window ends on.
    #[must_use]
    pub const fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Sets the number of supplemental retrievals in flight at once (at least one).
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Sets the deadline for each repository call.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the handling of repeated records.
    #[must_use]
    pub const fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Keeps the base records when no supplemental round ran.
    #[must_use]
    pub const fn with_keep_base_without_rounds(mut self, keep: bool) -> Self {
        self.keep_base_without_rounds = keep;
        self
    }
}

/// Progress of a reconciliation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    /// Nothing retrieved yet.
    Initial,
    /// Base quarterly records retrieved and compared against the periods.
    GapChecked,
    /// The base records already covered every period.
    Complete,
    /// Filling anchored years with supplemental quarterly records.
    Supplementing,
    /// Annual, supplemental and base records concatenated.
    Merged,
}

impl ReconcileState {
    /// Returns true for the states a run ends in.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Merged)
    }
}

/// Which retrieval a recovered failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrievalStage {
    /// The initial quarterly pull.
    Base,
    /// The annual anchor pull.
    Anchors,
    /// A supplemental quarterly pull for one anchored year.
    Supplement {
        /// Calendar year of the anchor.
        year: i32,
    },
}

/// A retrieval that failed and contributed no records.
#[derive(Debug)]
pub struct RetrievalIssue {
    /// Where in the run the failure happened.
    pub stage: RetrievalStage,
    /// The recovered error.
    pub error: FilingError,
}

/// A year anchored by an annual record that has too few quarterly records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearDeficit {
    /// Calendar year of the annual record.
    pub year: i32,
    /// Quarterly records found for that year.
    pub quarterly: usize,
}

impl YearDeficit {
    /// Number of quarterly records still missing.
    #[must_use]
    pub const fn missing(&self) -> usize {
        QUARTERS_PER_ANNUAL.saturating_sub(self.quarterly)
    }
}

/// Lists every year with an annual record but fewer than three quarterly
/// records, in ascending year order.
#[must_use]
pub fn completeness_deficits(records: &RecordSet) -> Vec<YearDeficit> {
    records
        .years_with_annual()
        .into_iter()
        .map(|year| YearDeficit {
            year,
            quarterly: records.quarterly_in_year(year),
        })
        .filter(|d| d.missing() > 0)
        .collect()
}

/// Outcome of [`Reconciler::reconcile`].
#[derive(Debug)]
pub struct Reconciliation {
    /// Entity the run was for.
    pub entity: EntityId,
    /// Requested number of quarters.
    pub lookback: usize,
    /// Calendar quarters of the lookback window, oldest first.
    pub periods: Vec<Period>,
    /// Quarters the base quarterly records did not cover.
    pub gaps: Vec<Period>,
    /// Merged records.
    pub records: RecordSet,
    /// Terminal state of the run.
    pub state: ReconcileState,
    /// Retrievals that failed and were skipped.
    pub issues: Vec<RetrievalIssue>,
    /// Anchored years still short of quarterly records after merging.
    pub deficits: Vec<YearDeficit>,
}

impl Reconciliation {
    /// Returns true if the base records covered every period.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == ReconcileState::Complete
    }

    /// Consumes the outcome and returns the merged records.
    #[must_use]
    pub fn into_records(self) -> RecordSet {
        self.records
    }
}

/// Drives a [`FilingRepository`] until the lookback window is covered.
#[derive(Debug)]
pub struct Reconciler<R> {
    repository: R,
    options: ReconcileOptions,
}

impl<R: FilingRepository> Reconciler<R> {
    /// Create a reconciler with default options.
    #[must_use]
    pub fn new(repository: R) -> Self {
        Self::with_options(repository, ReconcileOptions::default())
    }

    /// Create a reconciler with explicit options.
    #[must_use]
    pub const fn with_options(repository: R, options: ReconcileOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    /// Returns the options in use.
    #[must_use]
    pub const fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Returns the underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Assembles the records for the `lookback` most recent quarters of `entity`.
    ///
    /// Retrieval failures are recovered and listed in
    /// [`Reconciliation::issues`]. A zero lookback and other invalid input are
    /// returned as errors before anything is retrieved.
    #[instrument(skip(self), fields(repository = self.repository.name()))]
    pub async fn reconcile(&self, entity: &EntityId, lookback: usize) -> Result<Reconciliation> {
        if lookback == 0 {
            return Err(FilingError::InvalidParameter(
                "lookback must be a positive number of periods".to_string(),
            ));
        }

        let mut state = ReconcileState::Initial;
        let today = self
            .options
            .as_of
            .unwrap_or_else(|| Local::now().date_naive());
        let periods = generate_periods_from(today, lookback)?;
        let mut issues = Vec::new();

        let base = self
            .retrieve(
                entity,
                RecordKind::Quarterly,
                lookback,
                RetrievalStage::Base,
                &mut issues,
            )
            .await?;
        let gaps = find_gaps(&periods, &base);
        state = advance(state, ReconcileState::GapChecked);
        info!(
            entity = %entity,
            periods = periods.len(),
            base = base.len(),
            gaps = gaps.len(),
            "Checked base records against periods"
        );

        if gaps.is_empty() {
            return Ok(Reconciliation {
                entity: entity.clone(),
                lookback,
                periods,
                gaps,
                deficits: completeness_deficits(&base),
                records: base,
                state: advance(state, ReconcileState::Complete),
                issues,
            });
        }

        for gap in &gaps {
            debug!(entity = %entity, period = %gap, "Missing quarterly report");
        }

        let anchors = self
            .retrieve(
                entity,
                RecordKind::Annual,
                gaps.len(),
                RetrievalStage::Anchors,
                &mut issues,
            )
            .await?;
        state = advance(state, ReconcileState::Supplementing);

        let mut records = anchors.clone();
        let mut rounds = 0usize;
        for (year, outcome) in self.supplement(entity, lookback, &anchors, &base).await {
            match outcome {
                Ok(batch) => records.extend_from(&batch),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(
                        entity = %entity,
                        year,
                        error = %error,
                        "Supplemental quarterly retrieval failed"
                    );
                    issues.push(RetrievalIssue {
                        stage: RetrievalStage::Supplement { year },
                        error,
                    });
                }
            }
            records.extend_from(&base);
            rounds += 1;
        }
        if rounds == 0 && self.options.keep_base_without_rounds {
            records.extend_from(&base);
        }

        if self.options.dedup == DedupPolicy::ByPeriod {
            records = records.dedup_by_period();
        }

        let deficits = completeness_deficits(&records);
        for deficit in &deficits {
            warn!(
                entity = %entity,
                year = deficit.year,
                quarterly = deficit.quarterly,
                missing = deficit.missing(),
                "Year still short of quarterly records"
            );
        }

        info!(
            entity = %entity,
            anchors = anchors.len(),
            rounds,
            records = records.len(),
            issues = issues.len(),
            "Merged records"
        );

        Ok(Reconciliation {
            entity: entity.clone(),
            lookback,
            periods,
            gaps,
            records,
            state: advance(state, ReconcileState::Merged),
            issues,
            deficits,
        })
    }

    /// Fetches the extra quarterly records each short anchored year needs.
    ///
    /// Requests run concurrently up to `max_concurrency`; outcomes come back in
    /// anchor order regardless of completion order.
    async fn supplement(
        &self,
        entity: &EntityId,
        lookback: usize,
        anchors: &RecordSet,
        base: &RecordSet,
    ) -> Vec<(i32, Result<RecordSet>)> {
        let requests: Vec<(i32, usize)> = anchors
            .iter()
            .filter_map(|anchor| {
                let year = anchor.year();
                let existing = base.quarterly_in_year(year);
                if existing >= QUARTERS_PER_ANNUAL {
                    debug!(entity = %entity, year, existing, "Year already complete");
                    return None;
                }
                let deficit = QUARTERS_PER_ANNUAL - existing;
                info!(
                    entity = %entity,
                    year,
                    deficit,
                    "Missing quarters, requesting additional quarterly records"
                );
                Some((year, lookback + deficit))
            })
            .collect();

        stream::iter(requests)
            .map(|(year, limit)| async move {
                (
                    year,
                    self.fetch(entity, RecordKind::Quarterly, limit).await,
                )
            })
            .buffered(self.options.max_concurrency.max(1))
            .collect()
            .await
    }

    /// Fetches one round, recovering retrieval failures as an empty set.
    async fn retrieve(
        &self,
        entity: &EntityId,
        kind: RecordKind,
        limit: usize,
        stage: RetrievalStage,
        issues: &mut Vec<RetrievalIssue>,
    ) -> Result<RecordSet> {
        match self.fetch(entity, kind, limit).await {
            Ok(records) => Ok(records),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!(
                    entity = %entity,
                    form = kind.form_type(),
                    limit,
                    error = %error,
                    "Retrieval failed, continuing without records"
                );
                issues.push(RetrievalIssue { stage, error });
                Ok(RecordSet::new())
            }
        }
    }

    async fn fetch(&self, entity: &EntityId, kind: RecordKind, limit: usize) -> Result<RecordSet> {
        debug!(
            repository = self.repository.name(),
            entity = %entity,
            form = kind.form_type(),
            limit,
            "Fetching records"
        );
        tokio::time::timeout(
            self.options.fetch_timeout,
            self.repository.fetch_records(entity, kind, limit),
        )
        .await
        .map_err(|_| FilingError::Timeout(self.options.fetch_timeout))?
    }
}

fn advance(from: ReconcileState, to: ReconcileState) -> ReconcileState {
    debug!(?from, ?to, "Reconciliation state change");
    to
}
