use async_trait::async_trait;
use chrono::NaiveDate;
use sn_core::{DailyLoad, DatasetStore, Error, NewsItem, Result, TrendReport, WeeklyRef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::csv_file::weekly_file_name;

#[derive(Debug, Default)]
pub struct MemoryDatasets {
    daily: BTreeMap<NaiveDate, Vec<NewsItem>>,
    weekly: BTreeMap<NaiveDate, Vec<NewsItem>>,
    reports: BTreeMap<NaiveDate, TrendReport>,
}

impl MemoryDatasets {
    pub fn weekly(&self, end_date: NaiveDate) -> Option<&[NewsItem]> {
        self.weekly.get(&end_date).map(Vec::as_slice)
    }

    pub fn report(&self, end_date: NaiveDate) -> Option<&TrendReport> {
        self.reports.get(&end_date)
    }
}

/// Keeps every dataset in process memory. Used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    store: Arc<RwLock<MemoryDatasets>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the stored datasets.
    pub fn datasets(&self) -> Arc<RwLock<MemoryDatasets>> {
        self.store.clone()
    }

    pub async fn insert_daily(&self, day: NaiveDate, items: Vec<NewsItem>) {
        self.store.write().await.daily.insert(day, items);
    }

    pub async fn insert_weekly(&self, end_date: NaiveDate, items: Vec<NewsItem>) {
        self.store.write().await.weekly.insert(end_date, items);
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn load_daily(&self, day: NaiveDate) -> Result<DailyLoad> {
        let store = self.store.read().await;
        Ok(match store.daily.get(&day) {
            Some(items) => DailyLoad::Loaded(items.clone()),
            None => DailyLoad::Missing,
        })
    }

    async fn save_daily(&self, day: NaiveDate, items: &[NewsItem]) -> Result<String> {
        self.insert_daily(day, items.to_vec()).await;
        Ok(format!("memory://daily/{}", day))
    }

    async fn save_weekly(&self, end_date: NaiveDate, items: &[NewsItem]) -> Result<String> {
        self.insert_weekly(end_date, items.to_vec()).await;
        Ok(format!("memory://weekly/{}", end_date))
    }

    async fn latest_weekly(&self) -> Result<Option<WeeklyRef>> {
        let store = self.store.read().await;
        Ok(store.weekly.keys().next_back().map(|end_date| WeeklyRef {
            end_date: *end_date,
            name: weekly_file_name(*end_date),
        }))
    }

    async fn load_weekly(&self, weekly: &WeeklyRef) -> Result<Vec<NewsItem>> {
        let store = self.store.read().await;
        store
            .weekly
            .get(&weekly.end_date)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("weekly dataset not found: {}", weekly.name)))
    }

    async fn save_trend_report(&self, report: &TrendReport) -> Result<String> {
        let mut store = self.store.write().await;
        store.reports.insert(report.period_end, report.clone());
        Ok(format!("memory://reports/{}", report.period_end))
    }
}
