use crate::models::{HabitRow, UserRow};
use crate::{Database, format_timestamp, parse_timestamp};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Datelike, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use tally_types::models::{ActivityRecord, Mood, MoodSample};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, ?2)",
                (id, username),
            )?;
            info!("Created user {} ({})", username, id);
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Habits --

    pub fn create_habit(&self, id: &str, user_id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            if query_user_by_id(conn, user_id)?.is_none() {
                bail!("User not found: {}", user_id);
            }

            conn.execute(
                "INSERT INTO habits (id, user_id, name) VALUES (?1, ?2, ?3)",
                (id, user_id, name),
            )
            .with_context(|| format!("Failed to create habit '{}'", name))?;
            info!("Created habit {} for user {}", id, user_id);
            Ok(())
        })
    }

    /// Habit by id, only if `user_id` owns it.
    pub fn get_habit(&self, habit_id: &str, user_id: &str) -> Result<Option<HabitRow>> {
        self.with_conn(|conn| query_habit(conn, habit_id, user_id))
    }

    pub fn list_habits(&self, user_id: &str, include_archived: bool) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, archived, created_at
                 FROM habits
                 WHERE user_id = ?1 AND (?2 OR archived = 0)
                 ORDER BY created_at ASC, name ASC",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, include_archived], habit_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Returns false when the habit does not exist or belongs to someone else.
    pub fn archive_habit(&self, habit_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET archived = 1 WHERE id = ?1 AND user_id = ?2",
                (habit_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Entries --

    /// Log an entry. The habit must exist, be owned by `user_id` and not be archived.
    /// `occurred_at` must fall in years 0 through 9999, the range the stored
    /// text format keeps in time order.
    pub fn insert_entry(
        &self,
        id: &str,
        habit_id: &str,
        user_id: &str,
        mood: Mood,
        reflection: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<()> {
        if !(0..=9999).contains(&occurred_at.year()) {
            bail!("Entry time {} is outside the storable range", occurred_at);
        }

        self.with_conn(|conn| {
            let habit = query_habit(conn, habit_id, user_id)?
                .ok_or_else(|| anyhow!("Habit not found: {}", habit_id))?;
            if habit.archived {
                bail!("Habit {} is archived", habit_id);
            }

            conn.execute(
                "INSERT INTO entries (id, habit_id, user_id, mood, reflection, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id,
                    habit_id,
                    user_id,
                    i64::from(mood),
                    reflection,
                    format_timestamp(occurred_at)
                ],
            )?;
            debug!("Logged entry {} on habit {}", id, habit_id);
            Ok(())
        })
    }

    /// Every entry timestamp for the pair at or after `cutoff`, oldest first.
    pub fn activity_since(
        &self,
        habit_id: &str,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>> {
        let raw = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT occurred_at FROM entries
                 WHERE habit_id = ?1 AND user_id = ?2 AND occurred_at >= ?3
                 ORDER BY occurred_at ASC",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![habit_id, user_id, format_timestamp(cutoff)],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })?;

        raw.iter()
            .map(|occurred_at| -> Result<ActivityRecord> {
                Ok(ActivityRecord {
                    habit_id: habit_id.to_string(),
                    user_id: user_id.to_string(),
                    occurred_at: parse_timestamp(occurred_at)?,
                })
            })
            .collect()
    }

    pub fn mood_samples_since(
        &self,
        habit_id: &str,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<MoodSample>> {
        let raw = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT occurred_at, mood FROM entries
                 WHERE habit_id = ?1 AND user_id = ?2 AND occurred_at >= ?3
                 ORDER BY occurred_at ASC",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![habit_id, user_id, format_timestamp(cutoff)],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })?;

        raw.into_iter()
            .map(|(occurred_at, mood)| -> Result<MoodSample> {
                Ok(MoodSample {
                    occurred_at: parse_timestamp(&occurred_at)?,
                    mood: Mood::try_from(mood)?,
                })
            })
            .collect()
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, username, created_at FROM users WHERE username = ?1")?;
    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, username, created_at FROM users WHERE id = ?1")?;
    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn query_habit(conn: &Connection, habit_id: &str, user_id: &str) -> Result<Option<HabitRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, archived, created_at
         FROM habits
         WHERE id = ?1 AND user_id = ?2",
    )?;

    let row = stmt.query_row([habit_id, user_id], habit_from_row).optional()?;
    Ok(row)
}

fn habit_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        archived: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
