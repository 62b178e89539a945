use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use tally_core::summary::summary_window_start;
use tally_core::{Clock, StreakEngine, SystemClock, mood_distribution, weekly_summaries};
use tally_db::{Database, SqliteActivityStore};
use tally_types::api::{CreatedResponse, StreakResponse, SummaryResponse};
use tally_types::models::Mood;

use crate::config::Config;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Manage habits
    Habit {
        #[command(subcommand)]
        action: HabitCommand,
    },
    /// Log an entry for a habit
    Log {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        habit: Uuid,
        /// Mood from 1 (low) to 5 (high)
        #[arg(long)]
        mood: i64,
        #[arg(long)]
        reflection: Option<String>,
        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Current and longest streak for a habit
    Streak {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        habit: Uuid,
        #[arg(long)]
        lookback_days: Option<u32>,
    },
    /// Weekly mood summary for a habit
    Summary {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        habit: Uuid,
        #[arg(long)]
        weeks: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    Add { username: String },
}

#[derive(Debug, Subcommand)]
pub enum HabitCommand {
    Add {
        #[arg(long)]
        user: Uuid,
        name: String,
    },
    List {
        #[arg(long)]
        user: Uuid,
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    Archive {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        habit: Uuid,
    },
}

pub async fn run(command: Command, db: Arc<Database>, config: &Config) -> Result<Value> {
    run_with_clock(command, db, config, SystemClock).await
}

/// Runs a command with `clock` standing in for the current time.
pub async fn run_with_clock<C>(command: Command, db: Arc<Database>, config: &Config, clock: C) -> Result<Value>
where
    C: Clock,
{
    match command {
        Command::User { action: UserCommand::Add { username } } => add_user(&db, &username),
        Command::Habit { action } => match action {
            HabitCommand::Add { user, name } => add_habit(&db, user, &name),
            HabitCommand::List { user, all } => list_habits(&db, user, all),
            HabitCommand::Archive { user, habit } => archive_habit(&db, user, habit),
        },
        Command::Log { user, habit, mood, reflection, at } => {
            let occurred_at = at.unwrap_or_else(|| clock.now());
            log_entry(&db, user, habit, mood, reflection.as_deref(), occurred_at)
        }
        Command::Streak { user, habit, lookback_days } => {
            let lookback_days = lookback_days.unwrap_or(config.lookback_days);
            streak(db, clock, user, habit, lookback_days).await
        }
        Command::Summary { user, habit, weeks } => {
            summary(&db, clock.now(), user, habit, weeks.unwrap_or(config.summary_weeks))
        }
    }
}

fn add_user(db: &Database, username: &str) -> Result<Value> {
    let username = username.trim();
    let chars = username.chars().count();
    if !(3..=32).contains(&chars) {
        bail!("Username must be between 3 and 32 characters");
    }
    if db.get_user_by_username(username)?.is_some() {
        bail!("Username '{}' is already taken", username);
    }

    let id = Uuid::new_v4();
    db.create_user(&id.to_string(), username)?;

    Ok(serde_json::to_value(CreatedResponse { id })?)
}

fn add_habit(db: &Database, user: Uuid, name: &str) -> Result<Value> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        bail!("Habit name must be between 1 and 64 characters");
    }

    let id = Uuid::new_v4();
    db.create_habit(&id.to_string(), &user.to_string(), name)?;

    Ok(serde_json::to_value(CreatedResponse { id })?)
}

fn list_habits(db: &Database, user: Uuid, include_archived: bool) -> Result<Value> {
    let habits = db
        .list_habits(&user.to_string(), include_archived)?
        .into_iter()
        .map(|row| row.into_habit())
        .collect::<Result<Vec<_>>>()?;

    Ok(serde_json::to_value(habits)?)
}

fn archive_habit(db: &Database, user: Uuid, habit: Uuid) -> Result<Value> {
    if !db.archive_habit(&habit.to_string(), &user.to_string())? {
        bail!("Habit {} not found for user {}", habit, user);
    }
    info!("Archived habit {}", habit);
    Ok(serde_json::json!({ "archived": habit }))
}

fn log_entry(
    db: &Database,
    user: Uuid,
    habit: Uuid,
    mood: i64,
    reflection: Option<&str>,
    occurred_at: DateTime<Utc>,
) -> Result<Value> {
    let mood = Mood::try_from(mood)?;
    let reflection = reflection.map(str::trim).filter(|r| !r.is_empty());

    let id = Uuid::new_v4();
    db.insert_entry(
        &id.to_string(),
        &habit.to_string(),
        &user.to_string(),
        mood,
        reflection,
        occurred_at,
    )?;

    Ok(serde_json::to_value(CreatedResponse { id })?)
}

/// The habit must belong to the user before its activity is read.
fn require_owned_habit(db: &Database, user: Uuid, habit: Uuid) -> Result<()> {
    db.get_habit(&habit.to_string(), &user.to_string())?
        .ok_or_else(|| anyhow!("Habit {} not found for user {}", habit, user))?;
    Ok(())
}

async fn streak<C: Clock>(
    db: Arc<Database>,
    clock: C,
    user: Uuid,
    habit: Uuid,
    lookback_days: u32,
) -> Result<Value> {
    require_owned_habit(&db, user, habit)?;

    let engine = StreakEngine::with_clock(SqliteActivityStore::new(db), clock);
    let streak = engine
        .compute_streak(&habit.to_string(), &user.to_string(), lookback_days)
        .await
        .context("Failed to compute streak")?;

    info!(
        "Streak for habit {}: current={} longest={} (lookback {} days)",
        habit, streak.current, streak.longest, lookback_days
    );

    Ok(serde_json::to_value(StreakResponse {
        habit_id: habit,
        lookback_days,
        streak,
    })?)
}

fn summary(db: &Database, now: DateTime<Utc>, user: Uuid, habit: Uuid, weeks: u32) -> Result<Value> {
    require_owned_habit(db, user, habit)?;

    let since = summary_window_start(now, weeks)?;
    let samples = db.mood_samples_since(&habit.to_string(), &user.to_string(), since)?;

    Ok(serde_json::to_value(SummaryResponse {
        habit_id: habit,
        weeks: weekly_summaries(&samples, now, weeks)?,
        mood_distribution: mood_distribution(&samples),
    })?)
}
