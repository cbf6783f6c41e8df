//! Date ranges for the scheduling calendar views.
//!
//! Weeks start on Monday. Month views cover whole weeks so the grid has no
//! ragged edges, which means the range usually spills into the neighbouring
//! months.

use chrono::{Datelike, Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarView {
    Day,
    Week,
    Month,
}

impl CalendarView {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Some(CalendarView::Day),
            "week" => Some(CalendarView::Week),
            "month" => Some(CalendarView::Month),
            _ => None,
        }
    }

    /// Visible range of this view around `anchor`.
    pub fn range(&self, anchor: NaiveDate) -> DateRange {
        match self {
            CalendarView::Day => DateRange {
                from: anchor,
                to: anchor,
            },
            CalendarView::Week => {
                let from = start_of_week(anchor);
                DateRange {
                    from,
                    to: from + Duration::days(6),
                }
            }
            CalendarView::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let last = last_day_of_month(anchor);
                DateRange {
                    from: start_of_week(first),
                    to: start_of_week(last) + Duration::days(6),
                }
            }
        }
    }

    /// Anchor of the next (`forward`) or previous view.
    pub fn step(&self, anchor: NaiveDate, forward: bool) -> NaiveDate {
        let sign = if forward { 1 } else { -1 };
        match self {
            CalendarView::Day => anchor + Duration::days(sign),
            CalendarView::Week => anchor + Duration::days(7 * sign),
            CalendarView::Month => {
                let months = chrono::Months::new(1);
                let stepped = if forward {
                    anchor.checked_add_months(months)
                } else {
                    anchor.checked_sub_months(months)
                };
                stepped.unwrap_or(anchor)
            }
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let from = self.from;
        (0..self.days().max(0)).map(move |offset| from + Duration::days(offset))
    }
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}
