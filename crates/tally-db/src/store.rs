use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use tally_core::ActivityStore;
use tally_types::models::ActivityRecord;

use crate::Database;

/// [`ActivityStore`] backed by the SQLite entries table.
#[derive(Clone)]
pub struct SqliteActivityStore {
    db: Arc<Database>,
}

impl SqliteActivityStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ActivityStore for SqliteActivityStore {
    async fn fetch_activity(
        &self,
        habit_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ActivityRecord>> {
        // Run the blocking query off the async runtime
        let db = self.db.clone();
        let hid = habit_id.to_string();
        let uid = user_id.to_string();

        let records = tokio::task::spawn_blocking(move || db.activity_since(&hid, &uid, since))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                anyhow!("Activity fetch aborted: {}", e)
            })??;

        debug!(
            "Fetched {} activity records for habit {} since {}",
            records.len(),
            habit_id,
            since
        );
        Ok(records)
    }
}
