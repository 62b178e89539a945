//! Database row types, mapped directly from SQLite rows.
//! Distinct from tally-types models to keep the DB layer independent.

use anyhow::{Context, Result};

use tally_types::models::Habit;

use crate::parse_timestamp;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

pub struct HabitRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub archived: bool,
    pub created_at: String,
}

impl HabitRow {
    pub fn into_habit(self) -> Result<Habit> {
        Ok(Habit {
            id: self.id.parse().with_context(|| format!("Corrupt habit id '{}'", self.id))?,
            user_id: self
                .user_id
                .parse()
                .with_context(|| format!("Corrupt user_id '{}' on habit '{}'", self.user_id, self.id))?,
            created_at: parse_timestamp(&self.created_at)?,
            name: self.name,
            archived: self.archived,
        })
    }
}
