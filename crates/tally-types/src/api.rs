use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Streaks --

/// Current and longest consecutive-day runs for one habit.
/// Recomputed on every request, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResult {
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub habit_id: Uuid,
    pub lookback_days: u32,
    #[serde(flatten)]
    pub streak: StreakResult,
}

// -- Summaries --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Monday of the ISO week, UTC.
    pub week_start: NaiveDate,
    pub entries: u32,
    pub active_days: u32,
    pub average_mood: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub habit_id: Uuid,
    pub weeks: Vec<WeeklySummary>,
    /// Entry counts for moods 1 through 5.
    pub mood_distribution: [u32; 5],
}

// -- Creation --

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}
