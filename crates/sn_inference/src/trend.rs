//! Weekly trend summaries.
//!
//! The latest weekly dataset is flattened into a bounded excerpt, wrapped in
//! an analysis prompt and handed to a [`TextGenerator`]. Whatever happens
//! with the generator, exactly one trend report is persisted per run with a
//! usable weekly dataset; generation problems end up in the report itself.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use sn_core::{
    DatasetStore, InferenceSettings, LanguageDetector, NewsItem, Result, SummaryOutcome, TextGenerator,
    TrendReport, Translator,
};

use crate::models::delimit;

/// Recorded instead of a summary when there is too little text to analyze.
pub const INSUFFICIENT_TEXT_SUMMARY: &str =
    "AI summary generation failed: not enough text to analyze, or the model failed while processing.";

pub const TRUNCATION_MARKER: &str = "[input too long, only part of the weekly report was used]";

const FAILURE_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Article lines only, without the truncation marker.
    pub body: String,
    pub truncated: bool,
    pub articles: usize,
}

impl Excerpt {
    /// The excerpt as sent to the model.
    pub fn rendered(&self) -> String {
        if self.truncated {
            format!("{} {}", self.body, TRUNCATION_MARKER).trim_start().to_string()
        } else {
            self.body.clone()
        }
    }

    pub fn char_count(&self) -> usize {
        self.body.chars().count()
    }
}

/// Concatenates `Title: .. Summary: ..` lines, in order, until the next line
/// would push the excerpt past `max_chars`.
pub fn build_excerpt<'a, I>(articles: I, max_chars: usize) -> Excerpt
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut body = String::new();
    let mut used = 0;
    let mut count = 0;
    let mut truncated = false;

    for (title, summary) in articles {
        let line = format!("Title: {}. Summary: {}.", title, summary);
        let len = line.chars().count();
        if used + len > max_chars {
            truncated = true;
            break;
        }
        body.push_str(&line);
        body.push(' ');
        used += len + 1;
        count += 1;
    }

    Excerpt {
        body: body.trim().to_string(),
        truncated,
        articles: count,
    }
}

pub fn trend_prompt(excerpt: &str, report_language: &str) -> String {
    format!(
        "The following is a collection of this week's cybersecurity news, one article per \
         'Title: ... Summary: ...' entry.\n\n\
         {}\n\n\
         Based only on these articles, write a concise weekly security trend report. \
         Group related items into a few major trends with a heading each, name the concrete \
         threats, vulnerabilities, actors and affected organizations mentioned, and close each \
         trend with its practical implications for security teams. Do not refer to articles by \
         number and do not add facts that are not in the articles. \
         Write the whole report in {}.",
        delimit(excerpt),
        report_language
    )
}

fn is_quota_error(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("quota") || message.contains("rate limit") || message.contains("429")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendOutcome {
    Written { report: TrendReport, location: String },
    /// No weekly dataset exists yet.
    NoWeeklyReport,
    /// The latest weekly dataset holds no items.
    EmptyWeeklyReport { source_dataset: String },
}

pub struct TrendSummarizer {
    store: Arc<dyn DatasetStore>,
    generator: Arc<dyn TextGenerator>,
    detector: Option<Arc<dyn LanguageDetector>>,
    translator: Option<Arc<dyn Translator>>,
    settings: InferenceSettings,
    weekly_report_days: i64,
}

impl TrendSummarizer {
    pub fn new(
        store: Arc<dyn DatasetStore>,
        generator: Arc<dyn TextGenerator>,
        settings: InferenceSettings,
        weekly_report_days: i64,
    ) -> Self {
        Self {
            store,
            generator,
            detector: None,
            translator: None,
            settings,
            weekly_report_days,
        }
    }

    /// Enables translation of article summaries before the excerpt is built.
    /// Only takes effect when `translate` is set in the settings.
    pub fn with_translation(mut self, detector: Arc<dyn LanguageDetector>, translator: Arc<dyn Translator>) -> Self {
        self.detector = Some(detector);
        self.translator = Some(translator);
        self
    }

    pub async fn summarize(&self, now: DateTime<FixedOffset>) -> Result<TrendOutcome> {
        let Some(weekly) = self.store.latest_weekly().await? else {
            tracing::info!("No weekly report found, run the weekly stage first");
            return Ok(TrendOutcome::NoWeeklyReport);
        };
        tracing::info!("Analyzing {}", weekly.name);

        let items = self.store.load_weekly(&weekly).await?;
        if items.is_empty() {
            tracing::info!("Weekly report {} is empty, nothing to analyze", weekly.name);
            return Ok(TrendOutcome::EmptyWeeklyReport {
                source_dataset: weekly.name,
            });
        }

        let articles = self.prepare_articles(&items).await;
        let excerpt = build_excerpt(
            articles.iter().map(|(title, summary)| (title.as_str(), summary.as_str())),
            self.settings.max_input_chars,
        );
        if excerpt.truncated {
            tracing::info!(
                "Excerpt limited to {} of {} articles ({} chars)",
                excerpt.articles,
                articles.len(),
                self.settings.max_input_chars
            );
        }

        let summary = self.generate_summary(&excerpt).await;
        let report = TrendReport {
            generated_at: now,
            period_start: weekly.end_date - Duration::days(self.weekly_report_days),
            period_end: weekly.end_date,
            summary,
            source_dataset: weekly.name,
            truncated: excerpt.truncated,
        };
        let location = self.store.save_trend_report(&report).await?;
        tracing::info!("Trend report ({}) saved to {}", report.summary.status(), location);

        Ok(TrendOutcome::Written { report, location })
    }

    /// Title and summary of every article that goes into the excerpt.
    pub async fn prepare_articles(&self, items: &[NewsItem]) -> Vec<(String, String)> {
        let (Some(detector), Some(translator)) = (&self.detector, &self.translator) else {
            return items.iter().map(|i| (i.title.clone(), i.summary.clone())).collect();
        };
        if !self.settings.translate {
            return items.iter().map(|i| (i.title.clone(), i.summary.clone())).collect();
        }

        let target = self.settings.target_language.as_str();
        let mut articles = Vec::with_capacity(items.len());
        for item in items {
            let summary = item.summary.trim();
            if summary.chars().count() < self.settings.min_article_chars {
                tracing::debug!("Skipping '{}': summary too short", item.title);
                continue;
            }

            let language = match detector.detect(summary) {
                Ok(language) => language,
                Err(e) => {
                    tracing::warn!("Language detection failed for '{}': {}", item.title, e);
                    continue;
                }
            };

            if language == target {
                articles.push((item.title.clone(), summary.to_string()));
            } else if self.settings.translate_from.iter().any(|l| *l == language) {
                match translator.translate(summary, target).await {
                    Ok(translated) => articles.push((item.title.clone(), translated)),
                    Err(e) => tracing::warn!("Translation failed for '{}': {}", item.title, e),
                }
            } else {
                tracing::debug!("Skipping '{}': language {} not handled", item.title, language);
            }
        }
        articles
    }

    pub async fn generate_summary(&self, excerpt: &Excerpt) -> SummaryOutcome {
        let chars = excerpt.char_count();
        if chars < self.settings.min_valid_chars {
            tracing::info!("Text to analyze is too short ({} chars), skipping generation", chars);
            return SummaryOutcome::Skipped(INSUFFICIENT_TEXT_SUMMARY.to_string());
        }

        let rendered = excerpt.rendered();
        let prompt = trend_prompt(&rendered, &self.settings.report_language);
        tracing::info!("Generating trend summary with {}", self.generator.name());
        match self.generator.generate(&prompt).await {
            Ok(text) => SummaryOutcome::Generated(text.trim().to_string()),
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Trend summary generation failed: {}", message);
                if is_quota_error(&message) {
                    tracing::warn!("Quota or rate limit reached, retry later or check the API quota");
                }
                let start: String = rendered.chars().take(FAILURE_EXCERPT_CHARS).collect();
                SummaryOutcome::Failed(format!(
                    "AI summary generation failed: {}. Source text begins: '{}...'",
                    message, start
                ))
            }
        }
    }
}
