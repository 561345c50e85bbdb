pub mod collector;
pub mod date;
pub mod logging;
pub mod relevance;
pub mod feed;
pub mod text;

pub use collector::{CollectionReport, DailyCollector, SourceReport};
pub use date::DateResolver;
pub use logging::{init_logging, Logger};
pub use relevance::is_relevant;
pub use feed::RssFeedSource;

pub mod prelude {
    pub use super::collector::DailyCollector;
    pub use super::feed::RssFeedSource;
    pub use sn_core::{FeedSource, NewsItem, Result, Error};
}
