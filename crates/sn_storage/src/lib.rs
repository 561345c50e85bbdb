pub mod backends;
pub mod weekly;

pub use backends::*;
pub use weekly::{WeeklyAggregator, WeeklyOutcome};

pub mod prelude {
    pub use super::backends::*;
    pub use super::weekly::{WeeklyAggregator, WeeklyOutcome};
    pub use sn_core::{DailyLoad, DatasetStore};
}
