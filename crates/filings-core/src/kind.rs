//! Record kind definitions.
//!
//! This module defines [`RecordKind`], the two kinds of periodic disclosure a
//! record can be extracted from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilingError;

/// Kind of periodic report a record was extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// Yearly disclosure (form 10-K).
    Annual,
    /// Quarterly disclosure (form 10-Q).
    Quarterly,
}

impl RecordKind {
    /// Returns the SEC form type for this kind.
    #[must_use]
    pub const fn form_type(&self) -> &'static str {
        match self {
            Self::Annual => "10-K",
            Self::Quarterly => "10-Q",
        }
    }

    /// Returns true for quarterly records.
    #[must_use]
    pub const fn is_quarterly(&self) -> bool {
        matches!(self, Self::Quarterly)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_type())
    }
}

impl FromStr for RecordKind {
    type Err = FilingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "10-K" | "ANNUAL" => Ok(Self::Annual),
            "10-Q" | "QUARTERLY" => Ok(Self::Quarterly),
            other => Err(FilingError::Parse(format!("unknown form type: {other}"))),
        }
    }
}
