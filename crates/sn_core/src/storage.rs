use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{NewsItem, TrendReport};
use crate::Result;

/// Result of looking up the dataset of a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyLoad {
    Missing,
    /// The dataset exists but holds no data at all, not even a header.
    Empty,
    Loaded(Vec<NewsItem>),
    /// Some rows could not be turned into items. Rewriting the dataset from
    /// `items` alone would drop them.
    Partial { items: Vec<NewsItem>, unreadable: usize },
}

/// A persisted weekly dataset, identified by the end date of its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyRef {
    pub end_date: NaiveDate,
    pub name: String,
}

#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn load_daily(&self, day: NaiveDate) -> Result<DailyLoad>;

    /// Replace the dataset of `day`. Returns the location written to.
    async fn save_daily(&self, day: NaiveDate, items: &[NewsItem]) -> Result<String>;

    async fn save_weekly(&self, end_date: NaiveDate, items: &[NewsItem]) -> Result<String>;

    /// The weekly dataset with the latest end date, if any.
    async fn latest_weekly(&self) -> Result<Option<WeeklyRef>>;

    async fn load_weekly(&self, weekly: &WeeklyRef) -> Result<Vec<NewsItem>>;

    async fn save_trend_report(&self, report: &TrendReport) -> Result<String>;
}
