//! Weekly aggregation of daily datasets.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use sn_core::dataset;
use sn_core::{DailyLoad, DatasetStore, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeeklyOutcome {
    Written {
        location: String,
        items: usize,
        files_loaded: usize,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// No daily dataset in the window could be loaded; nothing was written.
    NoDailyData {
        start: NaiveDate,
        end: NaiveDate,
        message: String,
    },
}

pub struct WeeklyAggregator {
    store: Arc<dyn DatasetStore>,
    days: i64,
}

impl WeeklyAggregator {
    pub fn new(store: Arc<dyn DatasetStore>, days: i64) -> Self {
        Self { store, days }
    }

    /// Inclusive window ending at `today`; it spans `days + 1` calendar days.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.days), today)
    }

    pub async fn aggregate(&self, today: NaiveDate) -> Result<WeeklyOutcome> {
        let (start, end) = self.window(today);
        tracing::info!("Building weekly report for {} ~ {}", start, end);

        let mut combined = Vec::new();
        let mut files_loaded = 0;
        for day in start.iter_days().take_while(|day| *day <= end) {
            match self.store.load_daily(day).await {
                Ok(DailyLoad::Loaded(items)) => {
                    tracing::debug!("Loaded {} items for {}", items.len(), day);
                    files_loaded += 1;
                    combined.extend(items);
                }
                Ok(DailyLoad::Partial { items, unreadable }) => {
                    tracing::warn!("Skipping {} unreadable rows in the daily dataset for {}", unreadable, day);
                    files_loaded += 1;
                    combined.extend(items);
                }
                Ok(DailyLoad::Missing) => {}
                Ok(DailyLoad::Empty) => {
                    tracing::warn!("Daily dataset for {} is empty, skipping", day);
                }
                Err(e) => {
                    tracing::warn!("Could not read daily dataset for {}: {}", day, e);
                }
            }
        }

        if files_loaded == 0 {
            let message = format!("No daily news data found between {} and {}", start, end);
            tracing::info!("{}", message);
            return Ok(WeeklyOutcome::NoDailyData { start, end, message });
        }

        let mut items = dataset::dedup_by_identity(combined);
        dataset::sort_newest_first(&mut items);
        let location = self.store.save_weekly(end, &items).await?;
        tracing::info!(
            "Weekly report with {} items from {} daily datasets saved to {}",
            items.len(),
            files_loaded,
            location
        );

        Ok(WeeklyOutcome::Written {
            location,
            items: items.len(),
            files_loaded,
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::{FixedOffset, TimeZone};
    use sn_core::NewsItem;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn item(title: &str, link: &str, d: u32, hour: u32) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            summary: String::new(),
            source: "feed".to_string(),
            published_at: FixedOffset::east_opt(9 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 5, d, hour, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_window_is_inclusive() {
        let aggregator = WeeklyAggregator::new(Arc::new(MemoryStore::new()), 7);
        assert_eq!(aggregator.window(day(10)), (day(3), day(10)));
    }

    #[tokio::test]
    async fn test_no_daily_data() {
        let store = Arc::new(MemoryStore::new());
        let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(day(10)).await.unwrap();
        assert!(matches!(outcome, WeeklyOutcome::NoDailyData { start, .. } if start == day(3)));
        assert!(store.latest_weekly().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dedup_and_order() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_daily(day(8), vec![item("A", "u1", 8, 9), item("B", "u2", 8, 12)])
            .await;
        store
            .insert_daily(day(9), vec![item("A", "u1", 9, 9), item("C", "u3", 9, 10)])
            .await;
        // outside the window
        store.insert_daily(day(1), vec![item("Old", "u0", 1, 9)]).await;

        let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(day(10)).await.unwrap();
        match outcome {
            WeeklyOutcome::Written { items, files_loaded, .. } => {
                assert_eq!(items, 3);
                assert_eq!(files_loaded, 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        let datasets = store.datasets();
        let datasets = datasets.read().await;
        let weekly = datasets.weekly(day(10)).unwrap();
        let titles: Vec<_> = weekly.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
        // first occurrence of A is the one from the 8th
        assert_eq!(weekly[2].published_at, item("A", "u1", 8, 9).published_at);
    }
}
