use crate::models::{ActiveDispute, HolidaySet, TierUpdate, UrgencyTier};
use chrono::{Datelike, NaiveDate, Weekday};
use rayon::prelude::*;

/// Business-day count and the tier it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    /// `None` once the due date has passed
    pub business_days: Option<u32>,
    pub tier: UrgencyTier,
}

impl Assessment {
    /// Stored as 0 for expired glosas
    pub fn days_for_storage(&self) -> i32 {
        self.business_days
            .map(|d| i32::try_from(d).unwrap_or(i32::MAX))
            .unwrap_or(0)
    }
}

pub fn is_business_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// Business days in `(today, due]`. `None` when `due < today`.
///
/// Any seven consecutive days hold five weekdays, so only the trailing
/// partial week is walked; weekday holidays are then subtracted.
pub fn business_days_remaining(due: NaiveDate, holidays: &HolidaySet, today: NaiveDate) -> Option<u32> {
    if due < today {
        return None;
    }

    let span = (due - today).num_days() as u64;
    let start = u64::from(today.weekday().num_days_from_monday());
    let partial = (1..=span % 7).filter(|k| (start + k) % 7 < 5).count() as u64;
    let weekdays = span / 7 * 5 + partial;

    let count = weekdays.saturating_sub(holidays.weekdays_between(today, due) as u64);
    Some(u32::try_from(count).unwrap_or(u32::MAX))
}

pub fn tier_for_business_days(days: u32) -> UrgencyTier {
    match days {
        0 => UrgencyTier::Black,
        1..=5 => UrgencyTier::Red,
        6..=10 => UrgencyTier::Yellow,
        _ => UrgencyTier::Green,
    }
}

pub fn assess(due: NaiveDate, holidays: &HolidaySet, today: NaiveDate) -> Assessment {
    let business_days = business_days_remaining(due, holidays, today);
    let tier = business_days.map(tier_for_business_days).unwrap_or(UrgencyTier::Black);
    Assessment { business_days, tier }
}

pub fn classify(due: NaiveDate, holidays: &HolidaySet, today: NaiveDate) -> UrgencyTier {
    assess(due, holidays, today).tier
}

/// Re-classifies every active glosa. Pure and order-independent, so running
/// it twice against the same inputs yields the same updates.
pub fn recompute_tiers(
    disputes: &[ActiveDispute],
    holidays: &HolidaySet,
    today: NaiveDate,
) -> Vec<TierUpdate> {
    disputes
        .par_iter()
        .map(|d| {
            let assessment = assess(d.due_date, holidays, today);
            TierUpdate {
                dispute_id: d.id,
                tier: assessment.tier,
                business_days_remaining: assessment.days_for_storage(),
            }
        })
        .collect()
}
