//! Date partition resolution.
//!
//! Every path the pipeline touches is derived from one [`DateContext`]: the
//! calendar day being prepared, split into a `{year, month, day}` triple with
//! two-digit month and day. The formatting is plain `{:02}` padding, so the
//! result never depends on the host locale.
//!
//! ```
//! use dailycarto::date::DateContext;
//!
//! let ctx = DateContext::resolve(Some("2024-03-05")).unwrap();
//! assert_eq!((ctx.year, ctx.month.as_str(), ctx.day.as_str()), (2024, "03", "05"));
//! assert_eq!(ctx.iso(), "2024-03-05");
//! ```

use chrono::{DateTime, Datelike, Local, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid date '{input}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
pub struct DateError {
    pub input: String,
}

/// The resolved calendar day for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateContext {
    pub year: i32,
    /// Two-digit month, `"01"`..`"12"`.
    pub month: String,
    /// Two-digit day of month, `"01"`..`"31"`.
    pub day: String,
    date: NaiveDate,
}

impl DateContext {
    /// Resolve an optional date string; `None` means today (local time).
    ///
    /// Accepts `YYYY-MM-DD` and RFC 3339 timestamps. For timestamps the date
    /// is taken as written, without converting to the local timezone.
    pub fn resolve(input: Option<&str>) -> Result<Self, DateError> {
        match input {
            None => Ok(Self::today()),
            Some(raw) => parse_date(raw).map(Self::for_date),
        }
    }

    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: format!("{:02}", date.month()),
            day: format!("{:02}", date.day()),
            date,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `YYYY-MM-DD`, as used in log lines and result messages.
    pub fn iso(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// Relative partition directory: `YYYY/MM/DD`.
    pub fn partition(&self) -> PathBuf {
        PathBuf::from(self.year.to_string())
            .join(&self.month)
            .join(&self.day)
    }

    /// The day before. Saturates at the earliest representable date.
    pub fn previous_day(&self) -> Self {
        Self::for_date(self.date.pred_opt().unwrap_or(self.date))
    }
}

impl fmt::Display for DateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.day)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| DateError {
            input: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_single_digit_month_and_day() {
        let ctx = DateContext::resolve(Some("2023-01-09")).unwrap();
        assert_eq!(ctx.year, 2023);
        assert_eq!(ctx.month, "01");
        assert_eq!(ctx.day, "09");
    }

    #[test]
    fn keeps_two_digit_components() {
        let ctx = DateContext::resolve(Some("2022-12-31")).unwrap();
        assert_eq!(ctx.month, "12");
        assert_eq!(ctx.day, "31");
        assert_eq!(ctx.iso(), "2022-12-31");
        assert_eq!(ctx.to_string(), "2022-12-31");
    }

    #[test]
    fn rfc3339_keeps_written_date() {
        let ctx = DateContext::resolve(Some("2024-03-05T23:30:00-08:00")).unwrap();
        assert_eq!(ctx.iso(), "2024-03-05");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let ctx = DateContext::resolve(Some(" 2024-03-05\n")).unwrap();
        assert_eq!(ctx.iso(), "2024-03-05");
    }

    #[test]
    fn invalid_calendar_date_is_error() {
        let err = DateContext::resolve(Some("2023-02-30")).unwrap_err();
        assert_eq!(err.input, "2023-02-30");
        assert!(err.to_string().contains("2023-02-30"));
    }

    #[test]
    fn error_names_both_accepted_formats() {
        let message = DateContext::resolve(Some("05/03/2024")).unwrap_err().to_string();
        assert!(message.contains("YYYY-MM-DD"));
        assert!(message.contains("RFC 3339"));
    }

    #[test]
    fn garbage_is_error() {
        assert!(DateContext::resolve(Some("yesterday")).is_err());
        assert!(DateContext::resolve(Some("")).is_err());
    }

    #[test]
    fn none_resolves_to_today() {
        let ctx = DateContext::resolve(None).unwrap();
        assert_eq!(ctx.date(), Local::now().date_naive());
    }

    #[test]
    fn partition_is_year_month_day() {
        let ctx = DateContext::resolve(Some("2024-03-05")).unwrap();
        assert_eq!(ctx.partition(), PathBuf::from("2024").join("03").join("05"));
    }

    #[test]
    fn previous_day_crosses_month_and_year() {
        let ctx = DateContext::resolve(Some("2024-03-01")).unwrap();
        assert_eq!(ctx.previous_day().iso(), "2024-02-29");

        let ctx = DateContext::resolve(Some("2024-01-01")).unwrap();
        assert_eq!(ctx.previous_day().iso(), "2023-12-31");
    }
}
