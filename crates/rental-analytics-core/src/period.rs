use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RentalAnalyticsError;
use crate::fallback::{first_success, Strategy};
use crate::RentalAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An inclusive calendar range. An empty range (a period that ended before
/// the property was acquired) contains no dates and spans zero months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub empty: bool,
}

impl DateRange {
    /// Build an inclusive range. `end` before `start` is rejected.
    pub fn new(start: NaiveDate, end: NaiveDate) -> RentalAnalyticsResult<Self> {
        if end < start {
            return Err(RentalAnalyticsError::InvalidInput {
                field: "range".into(),
                reason: format!("end {end} precedes start {start}"),
            });
        }
        Ok(DateRange {
            start,
            end,
            empty: false,
        })
    }

    /// The zero-length range both of whose bounds sit on `at`.
    pub fn empty_at(at: NaiveDate) -> Self {
        DateRange {
            start: at,
            end: at,
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        !self.empty && date >= self.start && date <= self.end
    }

    /// Inclusive calendar-month count: Jan 15 – Feb 3 spans 2 months.
    /// Any non-empty range spans at least one month.
    pub fn months(&self) -> u32 {
        if self.empty {
            return 0;
        }
        let months = (self.end.year() - self.start.year()) * 12
            + self.end.month() as i32
            - self.start.month() as i32
            + 1;
        months.max(1) as u32
    }

    pub fn days(&self) -> i64 {
        if self.empty {
            return 0;
        }
        (self.end - self.start).num_days() + 1
    }

    /// Never let a period start before the property was acquired.
    ///
    /// A range ending before `purchase_date` collapses to an empty range at
    /// its end; otherwise the start is raised to `purchase_date`.
    pub fn clip_to(self, purchase_date: Option<NaiveDate>) -> Self {
        let Some(acquired) = purchase_date else {
            return self;
        };
        if self.empty {
            return self;
        }
        if self.end < acquired {
            return DateRange::empty_at(self.end);
        }
        DateRange {
            start: self.start.max(acquired),
            ..self
        }
    }
}

/// The five report periods derived from one (year, month) anchor, each
/// clipped to the acquisition date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriods {
    pub year: i32,
    pub month_number: u32,
    pub month: DateRange,
    pub quarter: DateRange,
    pub year_range: DateRange,
    pub prior_year: DateRange,
    pub ytd: DateRange,
}

impl ReportPeriods {
    pub fn resolve(
        year: i32,
        month: u32,
        purchase_date: Option<NaiveDate>,
    ) -> RentalAnalyticsResult<Self> {
        Ok(ReportPeriods {
            year,
            month_number: month,
            month: month_range(year, month)?.clip_to(purchase_date),
            quarter: quarter_range(year, month)?.clip_to(purchase_date),
            year_range: year_range(year)?.clip_to(purchase_date),
            prior_year: year_range(shift_year(year, -1)?)?.clip_to(purchase_date),
            ytd: ytd_range(year, month)?.clip_to(purchase_date),
        })
    }

    /// `YYYY-MM`
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month_number)
    }

    /// `YYYY-Qn`
    pub fn quarter_label(&self) -> String {
        format!("{}-Q{}", self.year, quarter_index(self.month_number) + 1)
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

fn validate_month(month: u32) -> RentalAnalyticsResult<()> {
    if !(1..=12).contains(&month) {
        return Err(RentalAnalyticsError::InvalidInput {
            field: "month".into(),
            reason: format!("month must be 1-12, got {month}"),
        });
    }
    Ok(())
}

fn shift_year(year: i32, by: i32) -> RentalAnalyticsResult<i32> {
    year.checked_add(by)
        .ok_or_else(|| RentalAnalyticsError::DateError(format!("year {year} out of range")))
}

fn ymd(year: i32, month: u32, day: u32) -> RentalAnalyticsResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| RentalAnalyticsError::DateError(format!("{year:04}-{month:02}-{day:02}")))
}

pub fn last_day_of_month(year: i32, month: u32) -> RentalAnalyticsResult<NaiveDate> {
    validate_month(month)?;
    let first_of_next = if month == 12 {
        ymd(shift_year(year, 1)?, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    first_of_next
        .pred_opt()
        .ok_or_else(|| RentalAnalyticsError::DateError(format!("{year:04}-{month:02}")))
}

/// Zero-based quarter of a month: Jan–Mar → 0, Oct–Dec → 3.
pub fn quarter_index(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3
}

pub fn month_range(year: i32, month: u32) -> RentalAnalyticsResult<DateRange> {
    validate_month(month)?;
    DateRange::new(ymd(year, month, 1)?, last_day_of_month(year, month)?)
}

pub fn quarter_range(year: i32, month: u32) -> RentalAnalyticsResult<DateRange> {
    validate_month(month)?;
    let first_month = quarter_index(month) * 3 + 1;
    DateRange::new(
        ymd(year, first_month, 1)?,
        last_day_of_month(year, first_month + 2)?,
    )
}

pub fn year_range(year: i32) -> RentalAnalyticsResult<DateRange> {
    DateRange::new(ymd(year, 1, 1)?, ymd(year, 12, 31)?)
}

/// Jan 1 through the last day of the anchor month.
pub fn ytd_range(year: i32, month: u32) -> RentalAnalyticsResult<DateRange> {
    DateRange::new(ymd(year, 1, 1)?, last_day_of_month(year, month)?)
}

/// Range covered by a lifetime report, ending at `as_of`.
///
/// Start is the purchase date, else the earliest payment, else the earliest
/// rent charge, else Jan 1 of the anchor year.
pub fn lifetime_range(
    purchase_date: Option<NaiveDate>,
    earliest_payment: Option<NaiveDate>,
    earliest_charge: Option<NaiveDate>,
    anchor_year: i32,
    as_of: NaiveDate,
) -> RentalAnalyticsResult<DateRange> {
    let start = first_success(vec![
        Strategy::new("purchase_date", || purchase_date),
        Strategy::new("earliest_payment", || earliest_payment),
        Strategy::new("earliest_rent_charge", || earliest_charge),
        Strategy::new("anchor_year", || NaiveDate::from_ymd_opt(anchor_year, 1, 1)),
    ])
    .map(|r| r.value)
    .ok_or_else(|| RentalAnalyticsError::DateError(format!("{anchor_year}-01-01")))?;

    if start > as_of {
        return Ok(DateRange::empty_at(as_of));
    }
    DateRange::new(start, as_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_range_leap_february() {
        let r = month_range(2024, 2).unwrap();
        assert_eq!(r.start, d(2024, 2, 1));
        assert_eq!(r.end, d(2024, 2, 29));
        assert_eq!(r.months(), 1);
    }

    #[test]
    fn test_quarter_range_from_month() {
        let r = quarter_range(2025, 5).unwrap();
        assert_eq!(r.start, d(2025, 4, 1));
        assert_eq!(r.end, d(2025, 6, 30));
        assert_eq!(r.months(), 3);

        let q4 = quarter_range(2025, 12).unwrap();
        assert_eq!(q4.start, d(2025, 10, 1));
        assert_eq!(q4.end, d(2025, 12, 31));
    }

    #[test]
    fn test_ytd_range_ends_at_anchor_month() {
        let r = ytd_range(2025, 3).unwrap();
        assert_eq!(r.start, d(2025, 1, 1));
        assert_eq!(r.end, d(2025, 3, 31));
        assert_eq!(r.months(), 3);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(month_range(2025, 0).is_err());
        assert!(quarter_range(2025, 13).is_err());
    }

    #[test]
    fn test_extreme_years_are_date_errors() {
        for year in [i32::MIN, i32::MAX] {
            let err = ReportPeriods::resolve(year, 12, None).unwrap_err();
            assert!(matches!(err, RentalAnalyticsError::DateError(_)), "{err:?}");
            assert!(last_day_of_month(year, 12).is_err());
        }
    }

    #[test]
    fn test_clip_before_purchase_collapses_to_empty() {
        let r = DateRange::new(d(2025, 1, 1), d(2025, 5, 31))
            .unwrap()
            .clip_to(Some(d(2025, 6, 15)));
        assert!(r.is_empty());
        assert_eq!(r.start, d(2025, 5, 31));
        assert_eq!(r.end, d(2025, 5, 31));
        assert_eq!(r.months(), 0);
        assert!(!r.contains(d(2025, 5, 31)));
    }

    #[test]
    fn test_clip_raises_start_to_purchase() {
        let r = year_range(2025).unwrap().clip_to(Some(d(2025, 6, 15)));
        assert!(!r.is_empty());
        assert_eq!(r.start, d(2025, 6, 15));
        assert_eq!(r.months(), 7);
    }

    #[test]
    fn test_clip_without_purchase_date_is_noop() {
        let r = year_range(2025).unwrap();
        assert_eq!(r.clip_to(None), r);
    }

    #[test]
    fn test_partial_month_counts_as_one() {
        let r = DateRange::new(d(2025, 3, 20), d(2025, 3, 31)).unwrap();
        assert_eq!(r.months(), 1);
        assert_eq!(r.days(), 12);
    }

    #[test]
    fn test_resolve_periods_mid_year_purchase() {
        let p = ReportPeriods::resolve(2025, 8, Some(d(2025, 6, 15))).unwrap();
        assert_eq!(p.month.start, d(2025, 8, 1));
        assert_eq!(p.quarter.start, d(2025, 7, 1));
        assert_eq!(p.ytd.start, d(2025, 6, 15));
        assert_eq!(p.ytd.months(), 3);
        assert!(p.prior_year.is_empty());
        assert_eq!(p.month_label(), "2025-08");
        assert_eq!(p.quarter_label(), "2025-Q3");
    }

    #[test]
    fn test_lifetime_range_fallback_chain() {
        let as_of = d(2026, 3, 1);
        let r = lifetime_range(None, Some(d(2024, 2, 1)), Some(d(2023, 1, 1)), 2026, as_of).unwrap();
        assert_eq!(r.start, d(2024, 2, 1));

        let r = lifetime_range(None, None, Some(d(2023, 1, 1)), 2026, as_of).unwrap();
        assert_eq!(r.start, d(2023, 1, 1));

        let r = lifetime_range(None, None, None, 2026, as_of).unwrap();
        assert_eq!(r.start, d(2026, 1, 1));
        assert_eq!(r.end, as_of);
    }

    #[test]
    fn test_lifetime_range_future_purchase_is_empty() {
        let r = lifetime_range(Some(d(2027, 1, 1)), None, None, 2026, d(2026, 3, 1)).unwrap();
        assert!(r.is_empty());
    }
}
