//! Daily collection: fetch every configured feed, keep recent and relevant
//! entries, and merge them into the dataset of the current day.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use sn_core::dataset;
use sn_core::{DailyLoad, DatasetStore, Error, FeedSource, NewsItem, PipelineConfig, RawEntry, Result};
use url::Url;

use crate::date::DateResolver;
use crate::logging::Logger;
use crate::relevance::is_relevant;
use crate::text::clean_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub url: String,
    pub fetched: usize,
    pub kept: usize,
    /// Set when the source could not be fetched or parsed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub day: NaiveDate,
    pub sources: Vec<SourceReport>,
    pub rejected_stale: usize,
    pub rejected_irrelevant: usize,
    pub fallback_dates: usize,
    /// Items that survived filtering in this run, before merging.
    pub new_items: usize,
    /// Size of the day's dataset after merging; zero when nothing was written.
    pub total_items: usize,
    pub written: Option<String>,
}

impl CollectionReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.error.is_some())
    }
}

/// Items kept from one feed plus the reasons others were dropped.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub items: Vec<NewsItem>,
    pub rejected_stale: usize,
    pub rejected_irrelevant: usize,
    pub fallback_dates: usize,
}

pub struct DailyCollector {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn DatasetStore>,
    resolver: DateResolver,
    feeds: Vec<String>,
    keywords: Vec<String>,
    latest_days: i64,
    logger: Logger,
}

impl DailyCollector {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn DatasetStore>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        Ok(Self {
            source,
            store,
            resolver: DateResolver::new(config.offset()?),
            feeds: config.feeds.clone(),
            keywords: config.keywords.clone(),
            latest_days: config.latest_days,
            logger: Logger::new().with_prefix("collect".to_string()),
        })
    }

    /// Run one collection for the day `now` falls on, in the target timezone.
    pub async fn collect(&self, now: DateTime<FixedOffset>) -> Result<CollectionReport> {
        let now = now.with_timezone(&self.resolver.timezone());
        let day = now.date_naive();
        let threshold = now - Duration::days(self.latest_days);
        self.logger.info(&format!(
            "Collecting {} feeds for {} (threshold {})",
            self.feeds.len(),
            day,
            threshold.format("%Y-%m-%d %H:%M:%S %:z")
        ));

        let mut report = CollectionReport {
            day,
            sources: Vec::with_capacity(self.feeds.len()),
            rejected_stale: 0,
            rejected_irrelevant: 0,
            fallback_dates: 0,
            new_items: 0,
            total_items: 0,
            written: None,
        };
        let mut collected = Vec::new();

        for url in &self.feeds {
            let logger = self.logger.clone().with_prefix(feed_host(url));
            match self.source.fetch(url).await {
                Ok(entries) => {
                    let fetched = entries.len();
                    let batch = self.filter_entries(url, entries, now, threshold);
                    logger.info(&format!("{} of {} entries kept", batch.items.len(), fetched));
                    report.sources.push(SourceReport {
                        url: url.clone(),
                        fetched,
                        kept: batch.items.len(),
                        error: None,
                    });
                    report.rejected_stale += batch.rejected_stale;
                    report.rejected_irrelevant += batch.rejected_irrelevant;
                    report.fallback_dates += batch.fallback_dates;
                    collected.extend(batch.items);
                }
                Err(e) => {
                    logger.error(&format!("Error collecting from {}: {}", url, e));
                    report.sources.push(SourceReport {
                        url: url.clone(),
                        fetched: 0,
                        kept: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        report.new_items = collected.len();
        if collected.is_empty() {
            self.logger.info(&format!("No relevant security news collected for {}", day));
            return Ok(report);
        }

        let existing = match self.store.load_daily(day).await? {
            DailyLoad::Loaded(items) => items,
            DailyLoad::Missing | DailyLoad::Empty => Vec::new(),
            DailyLoad::Partial { unreadable, .. } => {
                let message = format!(
                    "daily dataset for {} has {} unreadable rows, leaving it untouched",
                    day, unreadable
                );
                self.logger.error(&message);
                return Err(Error::Storage(message));
            }
        };
        let merged = dataset::merge(existing, collected);
        let location = self.store.save_daily(day, &merged).await?;
        self.logger.info(&format!(
            "Saved {} relevant security news items for {} to {}",
            merged.len(),
            day,
            location
        ));

        report.total_items = merged.len();
        report.written = Some(location);
        Ok(report)
    }

    /// Normalize, date and filter the entries of one feed.
    pub fn filter_entries(
        &self,
        url: &str,
        entries: Vec<RawEntry>,
        now: DateTime<FixedOffset>,
        threshold: DateTime<FixedOffset>,
    ) -> FeedBatch {
        let mut batch = FeedBatch::default();
        let logger = self.logger.clone().with_prefix(feed_host(url));

        for entry in entries {
            let title = clean_text(entry.title.as_deref().unwrap_or_default());
            let summary = clean_text(entry.summary.as_deref().unwrap_or_default());
            let link = entry.link.as_deref().unwrap_or_default().trim().to_string();

            let resolved = self.resolver.resolve(&entry, now);
            if resolved.is_fallback() {
                batch.fallback_dates += 1;
                logger.debug(&format!("No usable date for '{}', using collection time", title));
            }
            let published_at = resolved.instant();

            if published_at < threshold {
                batch.rejected_stale += 1;
                continue;
            }
            if !is_relevant(&title, &summary, &self.keywords) {
                batch.rejected_irrelevant += 1;
                continue;
            }

            batch.items.push(NewsItem {
                title,
                link,
                summary,
                source: url.to_string(),
                published_at,
            });
        }

        batch
    }
}

fn feed_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use sn_core::{Error, TrendReport, WeeklyRef};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockSource {
        feeds: HashMap<String, Vec<RawEntry>>,
    }

    #[async_trait]
    impl FeedSource for MockSource {
        fn name(&self) -> &str {
            "mock"
        }

        async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
            self.feeds
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Feed(format!("unreachable: {}", url)))
        }
    }

    #[derive(Default)]
    struct MockStore {
        days: Mutex<HashMap<NaiveDate, Vec<NewsItem>>>,
    }

    #[async_trait]
    impl DatasetStore for MockStore {
        async fn load_daily(&self, day: NaiveDate) -> Result<DailyLoad> {
            Ok(match self.days.lock().unwrap().get(&day) {
                Some(items) => DailyLoad::Loaded(items.clone()),
                None => DailyLoad::Missing,
            })
        }

        async fn save_daily(&self, day: NaiveDate, items: &[NewsItem]) -> Result<String> {
            self.days.lock().unwrap().insert(day, items.to_vec());
            Ok(format!("mock://{}", day))
        }

        async fn save_weekly(&self, _end_date: NaiveDate, _items: &[NewsItem]) -> Result<String> {
            unimplemented!()
        }

        async fn latest_weekly(&self) -> Result<Option<WeeklyRef>> {
            Ok(None)
        }

        async fn load_weekly(&self, _weekly: &WeeklyRef) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }

        async fn save_trend_report(&self, _report: &TrendReport) -> Result<String> {
            unimplemented!()
        }
    }

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn now() -> DateTime<FixedOffset> {
        kst().with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn entry(title: &str, link: &str, published: &str) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            summary: Some(String::new()),
            published_parsed: None,
            published: Some(published.to_string()),
        }
    }

    fn config(feeds: &[&str]) -> PipelineConfig {
        PipelineConfig {
            feeds: feeds.iter().map(|s| s.to_string()).collect(),
            keywords: vec!["Ransomware".to_string()],
            ..PipelineConfig::default()
        }
    }

    fn collector(feeds: HashMap<String, Vec<RawEntry>>, store: Arc<MockStore>, urls: &[&str]) -> DailyCollector {
        DailyCollector::new(Arc::new(MockSource { feeds }), store, &config(urls)).unwrap()
    }

    #[tokio::test]
    async fn test_keyword_filter_scenario() {
        let url = "https://a.example/rss";
        let feeds = HashMap::from([(
            url.to_string(),
            vec![
                entry("Ransomware hits X", "u1", "2024-05-10 09:00:00"),
                entry("Weather today", "u2", "2024-05-10 09:00:00"),
            ],
        )]);
        let store = Arc::new(MockStore::default());
        let report = collector(feeds, store.clone(), &[url]).collect(now()).await.unwrap();

        assert_eq!(report.new_items, 1);
        assert_eq!(report.rejected_irrelevant, 1);
        let day = store.days.lock().unwrap()[&report.day].clone();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].title, "Ransomware hits X");
        assert_eq!(day[0].source, url);
    }

    #[tokio::test]
    async fn test_stale_items_are_excluded_even_if_relevant() {
        let url = "https://a.example/rss";
        let feeds = HashMap::from([(
            url.to_string(),
            vec![
                entry("Ransomware old", "u1", "2024-05-07 09:00:00"),
                entry("Ransomware recent", "u2", "2024-05-08 13:00:00"),
            ],
        )]);
        let store = Arc::new(MockStore::default());
        let report = collector(feeds, store.clone(), &[url]).collect(now()).await.unwrap();

        assert_eq!(report.rejected_stale, 1);
        assert_eq!(report.new_items, 1);
        assert_eq!(report.total_items, 1);
    }

    #[tokio::test]
    async fn test_unparseable_dates_fall_back_to_now_and_are_kept() {
        let url = "https://a.example/rss";
        let feeds = HashMap::from([(url.to_string(), vec![entry("Ransomware undated", "u1", "n/a")])]);
        let store = Arc::new(MockStore::default());
        let report = collector(feeds, store.clone(), &[url]).collect(now()).await.unwrap();

        assert_eq!(report.fallback_dates, 1);
        let day = store.days.lock().unwrap()[&report.day].clone();
        assert_eq!(day[0].published_at, now());
    }

    #[tokio::test]
    async fn test_failing_source_does_not_abort_others() {
        let good = "https://good.example/rss";
        let bad = "https://bad.example/rss";
        let feeds = HashMap::from([(good.to_string(), vec![entry("Ransomware A", "u1", "2024-05-10 08:00:00")])]);
        let store = Arc::new(MockStore::default());
        let report = collector(feeds, store.clone(), &[bad, good]).collect(now()).await.unwrap();

        assert_eq!(report.sources.len(), 2);
        let failed: Vec<_> = report.failed_sources().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, bad);
        assert_eq!(report.total_items, 1);
    }

    #[tokio::test]
    async fn test_rerun_merges_without_duplicates() {
        let url = "https://a.example/rss";
        let store = Arc::new(MockStore::default());

        let run1 = HashMap::from([(url.to_string(), vec![entry("Ransomware A", "u1", "2024-05-10 08:00:00")])]);
        collector(run1, store.clone(), &[url]).collect(now()).await.unwrap();

        let run2 = HashMap::from([(
            url.to_string(),
            vec![
                entry("Ransomware A", "u1", "2024-05-10 08:00:00"),
                entry("Ransomware C", "u3", "2024-05-10 10:00:00"),
            ],
        )]);
        let c = collector(run2, store.clone(), &[url]);
        let report = c.collect(now()).await.unwrap();
        assert_eq!(report.total_items, 2);

        // same content again: count is unchanged
        let report = c.collect(now()).await.unwrap();
        assert_eq!(report.total_items, 2);
        let titles: Vec<_> = store.days.lock().unwrap()[&report.day]
            .iter()
            .map(|i| i.title.clone())
            .collect();
        assert_eq!(titles, vec!["Ransomware A", "Ransomware C"]);
    }

    #[tokio::test]
    async fn test_nothing_written_when_no_item_survives() {
        let url = "https://a.example/rss";
        let feeds = HashMap::from([(url.to_string(), vec![entry("Weather", "u1", "2024-05-10 08:00:00")])]);
        let store = Arc::new(MockStore::default());
        let report = collector(feeds, store.clone(), &[url]).collect(now()).await.unwrap();
        assert!(report.written.is_none());
        assert!(store.days.lock().unwrap().is_empty());
    }

    #[test]
    fn test_markup_is_stripped_before_matching() {
        let store = Arc::new(MockStore::default());
        let c = collector(HashMap::new(), store, &[]);
        let raw = RawEntry {
            title: Some("<b>Ransom</b>ware wave".to_string()),
            link: Some(" https://x/1 ".to_string()),
            summary: Some("<p>details&nbsp;here</p>".to_string()),
            published_parsed: None,
            published: Some("2024-05-10 08:00:00".to_string()),
        };
        let batch = c.filter_entries("https://x/rss", vec![raw], now(), now() - Duration::days(2));
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].title, "Ransomware wave");
        assert_eq!(batch.items[0].summary, "details here");
        assert_eq!(batch.items[0].link, "https://x/1");
    }

    #[test]
    fn test_feed_host() {
        assert_eq!(feed_host("https://krebsonsecurity.com/feed/"), "krebsonsecurity.com");
        assert_eq!(feed_host("not a url"), "not a url");
    }
}
