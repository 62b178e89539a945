use std::future::Future;
use std::sync::RwLock;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use tally_types::models::ActivityRecord;

/// Read access to logged activity.
///
/// Implementations return every record for the `(habit_id, user_id)` pair
/// with `occurred_at >= since`, in any order. Retries and timeouts belong
/// to the implementation.
pub trait ActivityStore: Send + Sync {
    fn fetch_activity(
        &self,
        habit_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<Vec<ActivityRecord>>> + Send;
}

/// Activity kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    records: RwLock<Vec<ActivityRecord>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, habit_id: &str, user_id: &str, occurred_at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Activity lock poisoned: {}", e))?;
        records.push(ActivityRecord {
            habit_id: habit_id.to_string(),
            user_id: user_id.to_string(),
            occurred_at,
        });
        Ok(())
    }
}

impl ActivityStore for InMemoryActivityStore {
    async fn fetch_activity(
        &self,
        habit_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ActivityRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Activity lock poisoned: {}", e))?;

        Ok(records
            .iter()
            .filter(|r| r.habit_id == habit_id && r.user_id == user_id && r.occurred_at >= since)
            .cloned()
            .collect())
    }
}
