pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod source;
pub mod storage;
pub mod types;

pub use config::{InferenceSettings, PipelineConfig};
pub use error::{Error, Result};
pub use models::{LanguageDetector, TextGenerator, Translator};
pub use source::FeedSource;
pub use storage::{DailyLoad, DatasetStore, WeeklyRef};
pub use types::{DateSource, NewsItem, RawEntry, ResolvedTimestamp, SummaryOutcome, TrendReport};
