//! Date helpers for the case_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};

/// The day `days` days before `date`
pub fn days_before(date: NaiveDate, days: usize) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(days as u64)).ok_or_else(|| {
        ForecastError::InvalidParameter(format!("{} minus {} days is out of range", date, days))
    })
}

/// Every day from `start` to `end`, both included
pub fn daily_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Days in `[from, until)` that have no row in `present`, which must be date-ordered
pub fn missing_days(from: NaiveDate, until: NaiveDate, present: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut missing = Vec::new();
    let mut present = present.iter().peekable();

    for day in from.iter_days().take_while(|day| *day < until) {
        while present.next_if(|p| **p < day).is_some() {}
        if present.next_if_eq(&&day).is_none() {
            missing.push(day);
        }
    }

    missing
}
