use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A collected article, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Feed URL the item was collected from.
    pub source: String,
    pub published_at: DateTime<FixedOffset>,
}

impl NewsItem {
    /// Two items are the same article iff title and link are equal.
    pub fn identity(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }
}

/// An entry as handed over by a feed source, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// Structured timestamp produced by the feed parser, as UTC wall-clock.
    pub published_parsed: Option<NaiveDateTime>,
    /// Textual timestamp exactly as it appeared in the feed.
    pub published: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Structured,
    Text,
}

/// Outcome of date resolution. `FallbackUsed` carries the collection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTimestamp {
    Resolved {
        at: DateTime<FixedOffset>,
        source: DateSource,
    },
    FallbackUsed {
        at: DateTime<FixedOffset>,
    },
}

impl ResolvedTimestamp {
    pub fn instant(&self) -> DateTime<FixedOffset> {
        match self {
            Self::Resolved { at, .. } | Self::FallbackUsed { at } => *at,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackUsed { .. })
    }
}

/// What ended up in the summary field of a trend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Generated(String),
    /// Generation was not attempted, e.g. too little input text.
    Skipped(String),
    /// The generation service failed; the text explains why.
    Failed(String),
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Skipped(text) | Self::Failed(text) => text,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Generated(_) => "generated",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendReport {
    pub generated_at: DateTime<FixedOffset>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub summary: SummaryOutcome,
    /// File name of the weekly dataset the report was derived from.
    pub source_dataset: String,
    pub truncated: bool,
}
