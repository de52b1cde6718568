use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::ops::Bound;

/// Non-working dates. Callers fetch it for `[today, due_date]` before classifying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    /// Holidays in `(after, through]` falling Monday to Friday
    pub fn weekdays_between(&self, after: NaiveDate, through: NaiveDate) -> usize {
        if through <= after {
            return 0;
        }
        self.dates
            .range((Bound::Excluded(after), Bound::Included(through)))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .count()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}
