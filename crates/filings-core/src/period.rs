//! Calendar-quarter periods and the period generator.
//!
//! A [`Period`] is one calendar quarter `[start, end]`, both ends inclusive.
//! [`generate_periods`] lists the quarters of a lookback window ending with the
//! current quarter, oldest first.

use std::fmt;

use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{FilingError, Result};

/// First month of each calendar quarter.
const QUARTER_START_MONTHS: [u32; 4] = [1, 4, 7, 10];

/// One calendar quarter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    /// First day of the quarter.
    pub start: NaiveDate,
    /// Last day of the quarter's third month.
    pub end: NaiveDate,
}

impl Period {
    /// Builds the quarter `index` (0-3) of `year`.
    pub fn for_quarter(year: i32, index: usize) -> Result<Self> {
        let month = *QUARTER_START_MONTHS.get(index).ok_or_else(|| {
            FilingError::InvalidParameter(format!("quarter index {index} out of range"))
        })?;
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            FilingError::InvalidParameter(format!("unrepresentable quarter start {year}-{month:02}"))
        })?;
        let end = start
            .checked_add_months(Months::new(3))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| {
                FilingError::InvalidParameter(format!("unrepresentable quarter end after {start}"))
            })?;
        Ok(Self { start, end })
    }

    /// Returns the quarter containing `date`.
    pub fn containing(date: NaiveDate) -> Result<Self> {
        Self::for_quarter(date.year(), date.month0() as usize / 3)
    }

    /// Returns true if `date` lies within the quarter, both ends included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar year of the quarter.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Quarter number, 1 through 4.
    #[must_use]
    pub fn quarter(&self) -> u32 {
        self.start.month0() / 3 + 1
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Generates the `lookback` most recent quarters up to and including the
/// current one, oldest first.
pub fn generate_periods(lookback: usize) -> Result<Vec<Period>> {
    generate_periods_from(Local::now().date_naive(), lookback)
}

/// Generates the `lookback` quarters ending with the quarter containing
/// `today`, oldest first.
///
/// A lookback of zero yields no periods.
pub fn generate_periods_from(today: NaiveDate, lookback: usize) -> Result<Vec<Period>> {
    let mut year = today.year();
    let mut index = QUARTER_START_MONTHS
        .iter()
        .rposition(|&month| month <= today.month())
        .unwrap_or(0);

    let mut periods = Vec::with_capacity(lookback);
    for _ in 0..lookback {
        periods.push(Period::for_quarter(year, index)?);

        if index == 0 {
            index = 3;
            year = year.checked_sub(1).ok_or_else(|| {
                FilingError::InvalidParameter("lookback reaches before year i32::MIN".to_string())
            })?;
        } else {
            index -= 1;
        }
    }

    periods.reverse();
    Ok(periods)
}
