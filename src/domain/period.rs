use crate::error::{Result, ScholarshipError};
use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One payment cycle, identified by calendar month and year.
///
/// Deserialization goes through [`Period::new`], so a stored period is always
/// a valid calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = ScholarshipError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ScholarshipError::InvalidInput(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ScholarshipError::InvalidInput(format!(
                "Year {} is out of range",
                year
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        // Every constructor range-checks the month and year.
        match (
            NaiveDate::from_ymd_opt(self.year, self.month, 1),
            NaiveDate::from_ymd_opt(next_year, next_month, 1),
        ) {
            (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
            _ => 31,
        }
    }

    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month as u8)
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// Resolves an English month name ("March") to its number.
pub fn month_from_name(name: &str) -> Option<u32> {
    name.parse::<Month>().ok().map(|m| m.number_from_month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(Period::new(3, 2025).unwrap().days_in_month(), 31);
        assert_eq!(Period::new(4, 2025).unwrap().days_in_month(), 30);
        assert_eq!(Period::new(2, 2025).unwrap().days_in_month(), 28);
        assert_eq!(Period::new(2, 2024).unwrap().days_in_month(), 29);
        assert_eq!(Period::new(12, 2024).unwrap().days_in_month(), 31);
    }

    #[test]
    fn test_month_validation() {
        assert!(matches!(
            Period::new(0, 2025),
            Err(ScholarshipError::InvalidInput(_))
        ));
        assert!(matches!(
            Period::new(13, 2025),
            Err(ScholarshipError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_month_names() {
        let period = Period::new(3, 2025).unwrap();
        assert_eq!(period.month_name(), "March");
        assert_eq!(period.to_string(), "March 2025");
        assert_eq!(month_from_name("March"), Some(3));
        assert_eq!(month_from_name("December"), Some(12));
        assert_eq!(month_from_name("Smarch"), None);
    }

    #[test]
    fn test_deserialize_validates_month() {
        let period: Period = serde_json::from_str(r#"{"year": 2025, "month": 2}"#).unwrap();
        assert_eq!(period, Period::new(2, 2025).unwrap());
        assert_eq!(
            serde_json::to_string(&period).unwrap(),
            r#"{"year":2025,"month":2}"#
        );

        let result = serde_json::from_str::<Period>(r#"{"year": 2025, "month": 13}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Month must be between 1 and 12"));
        assert!(serde_json::from_str::<Period>(r#"{"year": 2025, "month": 0}"#).is_err());
    }

    #[test]
    fn test_containing_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 19).unwrap();
        assert_eq!(Period::containing(date), Period::new(7, 2025).unwrap());
    }
}
