//! Calendar dates as the backend exchanges them (`YYYY-MM-DD`)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("'{value}' is not a YYYY-MM-DD date: {e}")))
}

/// A stay from `check_in` up to (not including) `check_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(alias = "start_date")]
    pub check_in: NaiveDate,
    #[serde(alias = "end_date")]
    pub check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(Error::InvalidInput(format!(
                "check-out {check_out} must be after check-in {check_in}"
            )));
        }
        Ok(Self { check_in, check_out })
    }

    /// Build a range from two `YYYY-MM-DD` strings.
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self> {
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}
