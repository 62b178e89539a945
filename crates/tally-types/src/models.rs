use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// The slice of an entry that streak computation reads.
/// Mood and reflection never take part in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub habit_id: String,
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// The slice of an entry that mood aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodSample {
    pub occurred_at: DateTime<Utc>,
    pub mood: Mood,
}

// -- Mood --

pub const MOOD_MIN: u8 = 1;
pub const MOOD_MAX: u8 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("mood must be between {MOOD_MIN} and {MOOD_MAX}, got {0}")]
pub struct MoodError(pub i64);

/// Self-reported mood on a 1 (low) to 5 (high) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Mood(u8);

impl Mood {
    pub fn new(value: u8) -> Result<Self, MoodError> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Mood {
    type Error = MoodError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MOOD_MIN)..=i64::from(MOOD_MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(MoodError(value))
        }
    }
}

impl From<Mood> for i64 {
    fn from(mood: Mood) -> Self {
        i64::from(mood.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_accepts_scale_bounds() {
        assert_eq!(Mood::new(1).unwrap().value(), 1);
        assert_eq!(Mood::new(5).unwrap().value(), 5);
    }

    #[test]
    fn mood_rejects_out_of_range() {
        assert_eq!(Mood::new(0), Err(MoodError(0)));
        assert_eq!(Mood::try_from(6), Err(MoodError(6)));
        assert_eq!(Mood::try_from(-3), Err(MoodError(-3)));
    }

    #[test]
    fn mood_deserialize_validates() {
        let ok: Mood = serde_json::from_str("4").unwrap();
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Mood>("9").is_err());
    }
}
