//! Consecutive-day streaks over a habit's activity log.
//!
//! Timestamps are reduced to UTC calendar days ("day keys") before any
//! counting, so several entries on one day count once and 23:59 followed by
//! 00:01 is two consecutive days. All day keys in the crate use UTC; mixing
//! conventions across calls would break streak continuity.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use tally_types::api::StreakResult;

use crate::clock::{Clock, SystemClock};
use crate::error::StreakError;
use crate::store::ActivityStore;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// Extra iterations the backward walk may take beyond the lookback window.
pub const WALK_MARGIN_DAYS: u32 = 35;

pub struct StreakEngine<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: ActivityStore> StreakEngine<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ActivityStore, C: Clock> StreakEngine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute `{current, longest}` for a habit over the last `lookback_days`.
    ///
    /// Ids must be non-empty and `lookback_days` at least 1; both are checked
    /// before the store is touched. Store failures are returned as
    /// [`StreakError::Storage`] and never turn into a zero streak.
    pub async fn compute_streak(
        &self,
        habit_id: &str,
        user_id: &str,
        lookback_days: u32,
    ) -> Result<StreakResult, StreakError> {
        if habit_id.trim().is_empty() {
            return Err(StreakError::EmptyHabitId);
        }
        if user_id.trim().is_empty() {
            return Err(StreakError::EmptyUserId);
        }
        if lookback_days == 0 {
            return Err(StreakError::InvalidLookback);
        }

        let now = self.clock.now();
        let cutoff = window_start(now, lookback_days);
        let records = self.store.fetch_activity(habit_id, user_id, cutoff).await?;

        Ok(compute_from_timestamps(
            records.iter().map(|r| r.occurred_at),
            now,
            lookback_days,
        ))
    }

    pub async fn compute_default_streak(
        &self,
        habit_id: &str,
        user_id: &str,
    ) -> Result<StreakResult, StreakError> {
        self.compute_streak(habit_id, user_id, DEFAULT_LOOKBACK_DAYS).await
    }
}

/// Earliest instant inside the window. Records at exactly this instant count.
pub fn window_start(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Upper bound on the backward walk for a given window.
pub fn walk_bound(lookback_days: u32) -> u32 {
    lookback_days.saturating_add(WALK_MARGIN_DAYS)
}

pub fn day_key(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Distinct day keys of all timestamps at or after `cutoff`.
pub fn day_keys<I>(timestamps: I, cutoff: DateTime<Utc>) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .filter(|ts| *ts >= cutoff)
        .map(day_key)
        .collect()
}

/// Consecutive days ending at `today` (inclusive), capped at `bound`.
/// Zero when `today` itself has no activity.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate, bound: u32) -> u32 {
    let mut count = 0;
    let mut day = today;

    while count < bound && days.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }

    count
}

/// Longest run of consecutive days anywhere in `days`.
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    // BTreeSet iterates in ascending order
    for &day in days {
        run = match prev {
            Some(p) if (day - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    longest
}

/// Both streak metrics from raw timestamps, without touching a store.
pub fn compute_from_timestamps<I>(timestamps: I, now: DateTime<Utc>, lookback_days: u32) -> StreakResult
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days = day_keys(timestamps, window_start(now, lookback_days));

    StreakResult {
        current: current_streak(&days, day_key(now), walk_bound(lookback_days)),
        longest: longest_streak(&days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryActivityStore;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tally_types::models::ActivityRecord;

    const HABIT: &str = "habit-1";
    const USER: &str = "user-1";

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(2024, 1, 10, 12, 0)
    }

    fn days_ago(n: i64) -> DateTime<Utc> {
        now() - Duration::days(n)
    }

    fn engine_with(times: &[DateTime<Utc>]) -> StreakEngine<InMemoryActivityStore, FixedClock> {
        let store = InMemoryActivityStore::new();
        for t in times {
            store.record(HABIT, USER, *t).unwrap();
        }
        StreakEngine::with_clock(store, FixedClock(now()))
    }

    async fn streak(times: &[DateTime<Utc>]) -> StreakResult {
        engine_with(times).compute_default_streak(HABIT, USER).await.unwrap()
    }

    struct FailingStore;

    impl ActivityStore for FailingStore {
        async fn fetch_activity(
            &self,
            _habit_id: &str,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> anyhow::Result<Vec<ActivityRecord>> {
            Err(anyhow!("connection refused"))
        }
    }

    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    impl ActivityStore for CountingStore {
        async fn fetch_activity(
            &self,
            _habit_id: &str,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> anyhow::Result<Vec<ActivityRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn empty_history_is_zero() {
        assert_eq!(streak(&[]).await, StreakResult { current: 0, longest: 0 });
    }

    #[tokio::test]
    async fn single_entry_today() {
        assert_eq!(streak(&[now()]).await, StreakResult { current: 1, longest: 1 });
    }

    #[tokio::test]
    async fn single_entry_in_the_past() {
        assert_eq!(streak(&[days_ago(5)]).await, StreakResult { current: 0, longest: 1 });
    }

    #[tokio::test]
    async fn run_ending_today() {
        let result = streak(&[days_ago(2), days_ago(1), now()]).await;
        assert_eq!(result, StreakResult { current: 3, longest: 3 });
    }

    #[tokio::test]
    async fn broken_run_keeps_older_longest() {
        let result = streak(&[days_ago(10), days_ago(9), days_ago(8), days_ago(1), now()]).await;
        assert_eq!(result, StreakResult { current: 2, longest: 3 });
    }

    #[tokio::test]
    async fn active_yesterday_but_not_today_is_zero_current() {
        let result = streak(&[days_ago(2), days_ago(1)]).await;
        assert_eq!(result, StreakResult { current: 0, longest: 2 });
    }

    #[tokio::test]
    async fn same_day_entries_count_once() {
        let times = [
            at(2024, 1, 9, 8, 0),
            at(2024, 1, 9, 20, 0),
            at(2024, 1, 10, 7, 0),
            at(2024, 1, 10, 9, 30),
            at(2024, 1, 10, 11, 0),
        ];
        assert_eq!(streak(&times).await, StreakResult { current: 2, longest: 2 });
    }

    #[tokio::test]
    async fn calendar_days_not_hours_decide_adjacency() {
        // Two minutes apart, but on different UTC days
        let times = [at(2024, 1, 5, 23, 59), at(2024, 1, 6, 0, 1)];
        assert_eq!(streak(&times).await.longest, 2);

        // Thirty hours apart with a whole day in between
        let times = [at(2024, 1, 3, 0, 0), at(2024, 1, 5, 6, 0)];
        assert_eq!(streak(&times).await.longest, 1);
    }

    #[tokio::test]
    async fn january_scenario() {
        let times = [
            at(2024, 1, 1, 9, 0),
            at(2024, 1, 2, 9, 0),
            at(2024, 1, 3, 9, 0),
            at(2024, 1, 10, 9, 0),
        ];
        assert_eq!(streak(&times).await, StreakResult { current: 1, longest: 3 });
    }

    #[tokio::test]
    async fn repeated_calls_agree() {
        let engine = engine_with(&[days_ago(3), days_ago(1), now()]);
        let first = engine.compute_default_streak(HABIT, USER).await.unwrap();
        let second = engine.compute_default_streak(HABIT, USER).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn window_boundary_is_inclusive() {
        let cutoff = window_start(now(), 30);
        let engine = engine_with(&[cutoff]);
        let result = engine.compute_streak(HABIT, USER, 30).await.unwrap();
        assert_eq!(result.longest, 1);

        let engine = engine_with(&[cutoff - Duration::seconds(1)]);
        let result = engine.compute_streak(HABIT, USER, 30).await.unwrap();
        assert_eq!(result, StreakResult { current: 0, longest: 0 });
    }

    #[tokio::test]
    async fn activity_outside_window_never_counts() {
        // A long run 40-50 days ago, a short one inside a 30-day window
        let mut times: Vec<_> = (40..=50).map(days_ago).collect();
        times.extend([days_ago(1), now()]);

        let engine = engine_with(&times);
        let narrow = engine.compute_streak(HABIT, USER, 30).await.unwrap();
        assert_eq!(narrow, StreakResult { current: 2, longest: 2 });

        let wide = engine.compute_streak(HABIT, USER, 60).await.unwrap();
        assert_eq!(wide, StreakResult { current: 2, longest: 11 });
    }

    #[tokio::test]
    async fn future_entries_are_kept() {
        let result = streak(&[now(), now() + Duration::days(1)]).await;
        assert_eq!(result, StreakResult { current: 1, longest: 2 });
    }

    #[tokio::test]
    async fn full_year_streak_is_not_truncated() {
        let times: Vec<_> = (0..365).map(days_ago).collect();
        let result = streak(&times).await;
        assert_eq!(result, StreakResult { current: 365, longest: 365 });
    }

    #[tokio::test]
    async fn other_users_activity_is_ignored() {
        let store = InMemoryActivityStore::new();
        store.record(HABIT, "someone-else", now()).unwrap();
        store.record(HABIT, USER, days_ago(3)).unwrap();
        let engine = StreakEngine::with_clock(store, FixedClock(now()));

        let result = engine.compute_default_streak(HABIT, USER).await.unwrap();
        assert_eq!(result, StreakResult { current: 0, longest: 1 });
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let engine = StreakEngine::with_clock(FailingStore, FixedClock(now()));
        let err = engine.compute_default_streak(HABIT, USER).await.unwrap_err();
        assert!(matches!(err, StreakError::Storage(_)));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_fetch() {
        let engine = StreakEngine::with_clock(CountingStore::default(), FixedClock(now()));

        assert!(matches!(
            engine.compute_streak("", USER, 365).await,
            Err(StreakError::EmptyHabitId)
        ));
        assert!(matches!(
            engine.compute_streak(HABIT, "  ", 365).await,
            Err(StreakError::EmptyUserId)
        ));
        assert!(matches!(
            engine.compute_streak(HABIT, USER, 0).await,
            Err(StreakError::InvalidLookback)
        ));
        assert_eq!(engine.store().calls.load(Ordering::SeqCst), 0);

        engine.compute_streak(HABIT, USER, 1).await.unwrap();
        assert_eq!(engine.store().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn walk_respects_bound() {
        let today = now().date_naive();
        let days: BTreeSet<_> = (0..10).map(|n| today - Duration::days(n)).collect();
        assert_eq!(current_streak(&days, today, 4), 4);
        assert_eq!(current_streak(&days, today, 100), 10);
    }

    #[test]
    fn walk_bound_exceeds_window() {
        assert_eq!(walk_bound(DEFAULT_LOOKBACK_DAYS), 400);
        assert!(walk_bound(u32::MAX) >= u32::MAX - 1);
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let result = compute_from_timestamps([now()], now(), u32::MAX);
        assert_eq!(result, StreakResult { current: 1, longest: 1 });
    }

    #[test]
    fn current_never_exceeds_longest() {
        // Every activity pattern over the last 10 days
        for mask in 0u32..(1 << 10) {
            let times: Vec<_> = (0u32..10)
                .filter(|bit| mask & (1 << bit) != 0)
                .map(|bit| days_ago(i64::from(bit)))
                .collect();
            let result = compute_from_timestamps(times, now(), DEFAULT_LOOKBACK_DAYS);
            assert!(
                result.current <= result.longest,
                "mask {:010b}: current {} > longest {}",
                mask,
                result.current,
                result.longest
            );
        }
    }
}
