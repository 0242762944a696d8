//! Completion tracking and week aggregation.

pub mod completions;
pub mod weeks;

pub use completions::CompletionMap;
pub use weeks::{
    DEFAULT_DAYS_PER_WEEK, ProgressSummary, Week, WeekAggregator, clamp_week_index,
};
