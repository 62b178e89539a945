//! Weekly mood aggregation for the dashboard summary.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use tally_types::api::WeeklySummary;
use tally_types::models::MoodSample;

use crate::error::SummaryError;
use crate::streak::day_key;

pub const DEFAULT_SUMMARY_WEEKS: u32 = 4;
pub const MAX_SUMMARY_WEEKS: u32 = 520;

#[derive(Default)]
struct WeekBucket {
    entries: u32,
    mood_total: u32,
    days: BTreeSet<NaiveDate>,
}

/// Monday of the ISO week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Midnight UTC on the first day of the oldest week covered by a summary.
pub fn summary_window_start(now: DateTime<Utc>, weeks: u32) -> Result<DateTime<Utc>, SummaryError> {
    check_weeks(weeks)?;
    let oldest = week_start(day_key(now)) - Duration::weeks(i64::from(weeks - 1));
    Ok(oldest.and_time(NaiveTime::default()).and_utc())
}

/// Group samples into the `weeks` ISO weeks ending with the current one.
///
/// Newest week first. Weeks without entries are still listed, with no
/// average. Samples outside the covered weeks are ignored.
pub fn weekly_summaries(
    samples: &[MoodSample],
    now: DateTime<Utc>,
    weeks: u32,
) -> Result<Vec<WeeklySummary>, SummaryError> {
    check_weeks(weeks)?;

    let current = week_start(day_key(now));
    let mut buckets: BTreeMap<NaiveDate, WeekBucket> = (0..weeks)
        .map(|w| (current - Duration::weeks(i64::from(w)), WeekBucket::default()))
        .collect();

    for sample in samples {
        let day = day_key(sample.occurred_at);
        if let Some(bucket) = buckets.get_mut(&week_start(day)) {
            bucket.entries += 1;
            bucket.mood_total += u32::from(sample.mood.value());
            bucket.days.insert(day);
        }
    }

    Ok(buckets
        .into_iter()
        .rev()
        .map(|(week_start, bucket)| WeeklySummary {
            week_start,
            entries: bucket.entries,
            active_days: bucket.days.len() as u32,
            average_mood: average(bucket.mood_total, bucket.entries),
        })
        .collect())
}

/// Entry counts per mood level, index 0 for mood 1.
pub fn mood_distribution(samples: &[MoodSample]) -> [u32; 5] {
    let mut counts = [0u32; 5];
    for sample in samples {
        counts[usize::from(sample.mood.value() - 1)] += 1;
    }
    counts
}

fn check_weeks(weeks: u32) -> Result<(), SummaryError> {
    match weeks {
        0 => Err(SummaryError::InvalidWeeks),
        w if w > MAX_SUMMARY_WEEKS => Err(SummaryError::TooManyWeeks(MAX_SUMMARY_WEEKS)),
        _ => Ok(()),
    }
}

fn average(total: u32, count: u32) -> Option<f64> {
    if count == 0 {
        return None;
    }
    let mean = f64::from(total) / f64::from(count);
    Some((mean * 100.0).round() / 100.0)
}
