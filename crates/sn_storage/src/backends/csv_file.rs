//! CSV files on disk, one per dataset.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding; the mark is optional when reading. Every write goes to a
//! temporary sibling first and is then renamed over the target.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Deserialize;
use sn_core::{DailyLoad, DatasetStore, Error, NewsItem, PipelineConfig, Result, TrendReport, WeeklyRef};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const DATASET_HEADER: [&str; 6] = ["Date", "Time", "Title", "Link", "Summary", "Source"];
const TREND_HEADER: [&str; 5] = [
    "Analysis_Date",
    "Report_Period",
    "Status",
    "AI_Generated_Summary",
    "Source_Weekly_Report",
];

const DAILY_PREFIX: &str = "daily_news_";
const WEEKLY_PREFIX: &str = "weekly_security_report_";
const TREND_PREFIX: &str = "ai_security_trend_report_";

pub fn daily_file_name(day: NaiveDate) -> String {
    format!("{}{}.csv", DAILY_PREFIX, day.format("%Y-%m-%d"))
}

pub fn weekly_file_name(end_date: NaiveDate) -> String {
    format!("{}{}.csv", WEEKLY_PREFIX, end_date.format("%Y-%m-%d"))
}

pub fn trend_file_name(end_date: NaiveDate) -> String {
    format!("{}{}.csv", TREND_PREFIX, end_date.format("%Y-%m-%d"))
}

/// End date encoded in a weekly dataset file name, if it is one.
pub fn parse_weekly_file_name(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(WEEKLY_PREFIX)?.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time", default)]
    time: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Link", default)]
    link: String,
    #[serde(rename = "Summary", default)]
    summary: String,
    #[serde(rename = "Source", default)]
    source: String,
}

#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
    weekly_dir: PathBuf,
    analysis_dir: PathBuf,
    tz: FixedOffset,
}

impl CsvStore {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        weekly_dir: impl Into<PathBuf>,
        analysis_dir: impl Into<PathBuf>,
        tz: FixedOffset,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            weekly_dir: weekly_dir.into(),
            analysis_dir: analysis_dir.into(),
            tz,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(
            &config.data_dir,
            &config.weekly_report_dir,
            &config.analysis_report_dir,
            config.offset()?,
        ))
    }

    pub fn daily_path(&self, day: NaiveDate) -> PathBuf {
        self.data_dir.join(daily_file_name(day))
    }

    pub fn weekly_path(&self, end_date: NaiveDate) -> PathBuf {
        self.weekly_dir.join(weekly_file_name(end_date))
    }

    pub fn trend_path(&self, end_date: NaiveDate) -> PathBuf {
        self.analysis_dir.join(trend_file_name(end_date))
    }

    async fn read_dataset(&self, path: &Path) -> Result<DailyLoad> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DailyLoad::Missing),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(DailyLoad::Empty);
        }
        let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);
        let (items, unreadable) = parse_dataset(body, self.tz, &path.display().to_string())?;
        if unreadable > 0 {
            return Ok(DailyLoad::Partial { items, unreadable });
        }
        Ok(DailyLoad::Loaded(items))
    }

    fn encode_dataset(&self, items: &[NewsItem]) -> Result<Vec<u8>> {
        let mut buf = BOM.to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(DATASET_HEADER)?;
            for item in items {
                let local = item.published_at.with_timezone(&self.tz);
                writer.write_record([
                    local.format("%Y-%m-%d").to_string().as_str(),
                    local.format("%H:%M:%S").to_string().as_str(),
                    item.title.as_str(),
                    item.link.as_str(),
                    item.summary.as_str(),
                    item.source.as_str(),
                ])?;
            }
            writer.flush()?;
        }
        Ok(buf)
    }

    fn encode_trend_report(&self, report: &TrendReport) -> Result<Vec<u8>> {
        let mut buf = BOM.to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(TREND_HEADER)?;
            let period = format!(
                "{} ~ {}",
                report.period_start.format("%Y-%m-%d"),
                report.period_end.format("%Y-%m-%d")
            );
            writer.write_record([
                report
                    .generated_at
                    .with_timezone(&self.tz)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
                    .as_str(),
                period.as_str(),
                report.summary.status(),
                report.summary.text(),
                report.source_dataset.as_str(),
            ])?;
            writer.flush()?;
        }
        Ok(buf)
    }
}

/// Parses dataset rows. Rows whose date cannot be read are left out and
/// counted; an unreadable time falls back to midnight.
fn parse_dataset(body: &[u8], tz: FixedOffset, origin: &str) -> Result<(Vec<NewsItem>, usize)> {
    let mut reader = csv::Reader::from_reader(body);
    let mut items = Vec::new();
    let mut unreadable = 0;

    for (index, row) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = row?;
        let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                tracing::warn!("{}: row {} has an unreadable date '{}'", origin, index + 1, row.date);
                unreadable += 1;
                continue;
            }
        };
        let time = NaiveTime::parse_from_str(row.time.trim(), "%H:%M:%S").unwrap_or_default();
        let Some(published_at) = tz.from_local_datetime(&NaiveDateTime::new(date, time)).single() else {
            unreadable += 1;
            continue;
        };

        items.push(NewsItem {
            title: row.title,
            link: row.link,
            summary: row.summary,
            source: row.source,
            published_at,
        });
    }

    Ok((items, unreadable))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Storage(format!("not a file path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl DatasetStore for CsvStore {
    async fn load_daily(&self, day: NaiveDate) -> Result<DailyLoad> {
        self.read_dataset(&self.daily_path(day)).await
    }

    async fn save_daily(&self, day: NaiveDate, items: &[NewsItem]) -> Result<String> {
        let path = self.daily_path(day);
        write_atomic(&path, &self.encode_dataset(items)?).await?;
        Ok(path.display().to_string())
    }

    async fn save_weekly(&self, end_date: NaiveDate, items: &[NewsItem]) -> Result<String> {
        let path = self.weekly_path(end_date);
        write_atomic(&path, &self.encode_dataset(items)?).await?;
        Ok(path.display().to_string())
    }

    async fn latest_weekly(&self) -> Result<Option<WeeklyRef>> {
        let mut entries = match tokio::fs::read_dir(&self.weekly_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<WeeklyRef> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(end_date) = parse_weekly_file_name(&name) else {
                continue;
            };
            if latest.as_ref().map_or(true, |l| end_date > l.end_date) {
                latest = Some(WeeklyRef { end_date, name });
            }
        }
        Ok(latest)
    }

    async fn load_weekly(&self, weekly: &WeeklyRef) -> Result<Vec<NewsItem>> {
        let path = self.weekly_dir.join(&weekly.name);
        match self.read_dataset(&path).await? {
            DailyLoad::Loaded(items) | DailyLoad::Partial { items, .. } => Ok(items),
            DailyLoad::Empty => Ok(Vec::new()),
            DailyLoad::Missing => Err(Error::Storage(format!("weekly dataset not found: {}", path.display()))),
        }
    }

    async fn save_trend_report(&self, report: &TrendReport) -> Result<String> {
        let path = self.trend_path(report.period_end);
        write_atomic(&path, &self.encode_trend_report(report)?).await?;
        Ok(path.display().to_string())
    }
}
