use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use tally_core::{DEFAULT_LOOKBACK_DAYS, DEFAULT_SUMMARY_WEEKS};

pub struct Config {
    pub db_path: PathBuf,
    pub lookback_days: u32,
    pub summary_weeks: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookback_days: u32 =
            try_load(&lookup, "TALLY_LOOKBACK_DAYS", &DEFAULT_LOOKBACK_DAYS.to_string())?;
        if lookback_days == 0 {
            bail!("TALLY_LOOKBACK_DAYS must be at least 1");
        }

        let summary_weeks: u32 =
            try_load(&lookup, "TALLY_SUMMARY_WEEKS", &DEFAULT_SUMMARY_WEEKS.to_string())?;
        if summary_weeks == 0 {
            bail!("TALLY_SUMMARY_WEEKS must be at least 1");
        }

        Ok(Self {
            db_path: try_load(&lookup, "TALLY_DB_PATH", "tally.db")?,
            lookback_days,
            summary_weeks,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
}
