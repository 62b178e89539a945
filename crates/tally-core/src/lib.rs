//! Streak and mood computations over a user's habit activity.
//!
//! Everything here is pure computation. Storage is reached only through
//! [`store::ActivityStore`] and time only through [`clock::Clock`].

pub mod clock;
pub mod error;
pub mod store;
pub mod streak;
pub mod summary;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{StreakError, SummaryError};
pub use store::{ActivityStore, InMemoryActivityStore};
pub use streak::{DEFAULT_LOOKBACK_DAYS, StreakEngine};
pub use summary::{DEFAULT_SUMMARY_WEEKS, mood_distribution, weekly_summaries};
