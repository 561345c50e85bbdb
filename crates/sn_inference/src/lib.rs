pub mod detect;
pub mod models;
pub mod translate;
pub mod trend;

pub use detect::ScriptDetector;
pub use models::create_model;
pub use translate::ModelTranslator;
pub use trend::{TrendOutcome, TrendSummarizer, INSUFFICIENT_TEXT_SUMMARY};

pub mod prelude {
    pub use super::models::create_model;
    pub use super::trend::{TrendOutcome, TrendSummarizer};
    pub use sn_core::{Error, Result, SummaryOutcome, TextGenerator, TrendReport};
}
