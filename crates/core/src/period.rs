use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid date '{0}', expected DD/MM/AAAA")]
    InvalidDate(String),
    #[error("Period ends ({end}) before it starts ({start})")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Parse a Brazilian `DD/MM/AAAA` date. Surrounding whitespace is ignored.
pub fn parse_br_date(s: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .map_err(|_| PeriodError::InvalidDate(s.trim().to_string()))
}

/// Inclusive span of dates covered by a reimbursement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} a {}", self.start.format("%d/%m/%Y"), self.end.format("%d/%m/%Y"))
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::Inverted { start, end });
        }
        Ok(DateRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_day_first() {
        assert_eq!(parse_br_date("05/03/2025").unwrap(), d(2025, 3, 5));
        assert_eq!(parse_br_date("  31/12/2024 ").unwrap(), d(2024, 12, 31));
    }

    #[test]
    fn rejects_other_formats() {
        assert!(matches!(parse_br_date("2025-03-05"), Err(PeriodError::InvalidDate(_))));
        assert!(parse_br_date("31/02/2025").is_err());
        assert!(parse_br_date("").is_err());
    }

    #[test]
    fn range_rejects_inverted() {
        assert!(matches!(
            DateRange::new(d(2025, 3, 10), d(2025, 3, 1)),
            Err(PeriodError::Inverted { .. })
        ));
    }

    #[test]
    fn range_display() {
        let range = DateRange::new(d(2025, 3, 1), d(2025, 3, 31)).unwrap();
        assert_eq!(range.to_string(), "01/03/2025 a 31/03/2025");
    }
}
