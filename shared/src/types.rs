//! Common types used across the platform

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

/// Largest page a caller may request
pub const MAX_PER_PAGE: u32 = 500;

impl Pagination {
    fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

/// Inclusive date range for queries and reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range covering a whole calendar month; `None` for an invalid month
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next - Duration::days(1),
        })
    }

    /// From the first day of the fiscal year containing `end` up to `end`
    pub fn fiscal_year_to_date(end: NaiveDate, fiscal_start_month: u32) -> Self {
        let month = fiscal_start_month.clamp(1, 12);
        let year = if end.month() >= month {
            end.year()
        } else {
            end.year() - 1
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(end);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Every calendar day in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_range() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.start, d(2024, 2, 1));
        assert_eq!(feb.end, d(2024, 2, 29));
        assert_eq!(feb.days().count(), 29);

        let dec = DateRange::month(2023, 12).unwrap();
        assert_eq!(dec.end, d(2023, 12, 31));

        assert!(DateRange::month(2024, 13).is_none());
    }

    #[test]
    fn test_fiscal_year_to_date() {
        let calendar = DateRange::fiscal_year_to_date(d(2024, 5, 10), 1);
        assert_eq!(calendar.start, d(2024, 1, 1));

        let july = DateRange::fiscal_year_to_date(d(2024, 5, 10), 7);
        assert_eq!(july.start, d(2023, 7, 1));

        let july_after = DateRange::fiscal_year_to_date(d(2024, 8, 1), 7);
        assert_eq!(july_after.start, d(2024, 7, 1));
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination { page: 3, per_page: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(Pagination { page: 0, per_page: 20 }.offset(), 0);
    }

    #[test]
    fn test_oversized_pages_stay_contiguous() {
        for per_page in [0, 1, 50, 500, 501, 1000, u32::MAX] {
            for page in 1..4 {
                let this = Pagination { page, per_page };
                let next = Pagination { page: page + 1, per_page };
                assert_eq!(this.offset() + this.limit(), next.offset(), "per_page={}", per_page);
            }
        }
        assert_eq!(Pagination { page: 1, per_page: 1000 }.limit(), 500);
    }
}
