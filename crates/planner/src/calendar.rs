//! Date parsing, range validation and calendar bucket enumeration.

use chrono::{Duration, NaiveDate};
use studyplan_core::{DateRangeError, Granularity, PlanError, PlanResult};

/// Longest plan span accepted by default, in days (inclusive).
pub const MAX_SPAN_DAYS: i64 = 365;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> PlanResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| DateRangeError::Unparsable(input.to_string()).into())
}

/// Reject a daily budget that is not a positive finite number.
pub fn validate_budget(daily_hours: f64) -> PlanResult<f64> {
    if daily_hours.is_finite() && daily_hours > 0.0 {
        Ok(daily_hours)
    } else {
        Err(PlanError::InvalidBudget(daily_hours))
    }
}

/// A validated, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Validate `start..=end` against the span limit.
    pub fn new(start: NaiveDate, end: NaiveDate, max_span_days: i64) -> PlanResult<Self> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end }.into());
        }
        let days = (end - start).num_days() + 1;
        if days > max_span_days {
            return Err(DateRangeError::SpanTooLong { days, max_days: max_span_days }.into());
        }
        Ok(Self { start, end })
    }

    /// Parse and validate two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str, max_span_days: i64) -> PlanResult<Self> {
        Self::new(parse_date(start)?, parse_date(end)?, max_span_days)
    }

    /// First day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, counting both ends.
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Calendar buckets covering the range, the last one clipped to `end`.
    pub fn buckets(&self, granularity: Granularity) -> Vec<CalendarBucket> {
        let step = granularity.days();
        let mut buckets = Vec::new();
        let mut cursor = self.start;
        let mut number = 1;

        while cursor <= self.end {
            let last = std::cmp::min(cursor + Duration::days(step - 1), self.end);
            buckets.push(CalendarBucket {
                number,
                start: cursor,
                end: last,
            });
            cursor = last + Duration::days(1);
            number += 1;
        }

        buckets
    }
}

/// One calendar slot before any topic is placed in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarBucket {
    /// 1-based position within the range
    pub number: u32,
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl CalendarBucket {
    /// Days covered by this bucket.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::parse("2024-03-10", "2024-03-10", MAX_SPAN_DAYS).unwrap();
        assert_eq!(range.total_days(), 1);
        assert_eq!(range.buckets(Granularity::Week).len(), 1);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let err = DateRange::parse("2024-02-01", "2024-01-01", MAX_SPAN_DAYS).unwrap_err();
        assert!(matches!(
            err,
            PlanError::InvalidDateRange(DateRangeError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn test_span_limit_is_inclusive() {
        // 2024 is a leap year: Jan 1 ..= Dec 30 is exactly 365 days
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 12, 30), 365).is_ok());

        let err = DateRange::new(date(2024, 1, 1), date(2024, 12, 31), 365).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidDateRange(DateRangeError::SpanTooLong { days: 366, max_days: 365 })
        );
    }

    #[test]
    fn test_unparsable_date_rejected() {
        let err = DateRange::parse("2024/01/01", "2024-01-05", MAX_SPAN_DAYS).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDateRange(DateRangeError::Unparsable(_))));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_week_buckets_clip_to_end() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 17), MAX_SPAN_DAYS).unwrap();
        let buckets = range.buckets(Granularity::Week);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].start, date(2024, 1, 1));
        assert_eq!(buckets[0].end, date(2024, 1, 7));
        assert_eq!(buckets[1].start, date(2024, 1, 8));
        assert_eq!(buckets[2].start, date(2024, 1, 15));
        assert_eq!(buckets[2].end, date(2024, 1, 17));
        assert_eq!(buckets[2].length_days(), 3);
        assert_eq!(buckets[2].number, 3);
    }

    #[test]
    fn test_day_buckets_cover_every_day() {
        let range = DateRange::new(date(2024, 2, 27), date(2024, 3, 2), MAX_SPAN_DAYS).unwrap();
        let buckets = range.buckets(Granularity::Day);

        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[2].start, date(2024, 2, 29));
        assert!(buckets.iter().all(|b| b.start == b.end));
    }

    #[test]
    fn test_budget_validation() {
        assert_eq!(validate_budget(2.5), Ok(2.5));
        assert_eq!(validate_budget(0.0), Err(PlanError::InvalidBudget(0.0)));
        assert!(validate_budget(-1.0).is_err());
        assert!(validate_budget(f64::NAN).is_err());
    }
}
