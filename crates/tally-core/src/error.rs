use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreakError {
    #[error("habit id must not be empty")]
    EmptyHabitId,

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("lookback window must be at least one day")]
    InvalidLookback,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("summary must cover at least one week")]
    InvalidWeeks,

    #[error("summary can cover at most {0} weeks")]
    TooManyWeeks(u32),
}
