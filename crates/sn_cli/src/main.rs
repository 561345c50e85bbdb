use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use clap::Parser;
use sn_core::{DatasetStore, PipelineConfig};
use sn_feeds::{init_logging, DailyCollector, RssFeedSource};
use sn_inference::{create_model, ModelTranslator, ScriptDetector, TrendOutcome, TrendSummarizer};
use sn_storage::{CsvStore, MemoryStore, WeeklyAggregator, WeeklyOutcome};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects, aggregates and summarizes security news feeds", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "secnews.toml")]
    config: PathBuf,
    /// Where datasets live: `csv` files, or `memory` for a dry run that persists nothing.
    #[arg(long, default_value = "csv")]
    storage: String,
    #[arg(long, help = "Text generation backend: dummy, deepseek, gemini or ollama")]
    model: Option<String>,
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    model_name: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    weekly_dir: Option<PathBuf>,
    #[arg(long)]
    analysis_dir: Option<PathBuf>,
    /// Translate article summaries before trend analysis.
    #[arg(long)]
    translate: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Collect today's relevant news from every configured feed.
    Collect,
    /// Aggregate the daily datasets of the past week.
    Weekly {
        /// Last day of the window (YYYY-MM-DD), today by default.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Summarize the latest weekly dataset into a trend report.
    Analyze,
    /// Collect, aggregate and analyze in one go.
    Run,
}

impl Cli {
    fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(model) = &self.model {
            config.inference.model = model.clone();
        }
        if let Some(url) = &self.model_url {
            config.inference.model_url = Some(url.clone());
        }
        if let Some(name) = &self.model_name {
            config.inference.model_name = Some(name.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.weekly_dir {
            config.weekly_report_dir = dir.clone();
        }
        if let Some(dir) = &self.analysis_dir {
            config.analysis_report_dir = dir.clone();
        }
        if self.translate {
            config.inference.translate = true;
        }
    }
}

fn create_store(kind: &str, config: &PipelineConfig) -> anyhow::Result<Arc<dyn DatasetStore>> {
    match kind {
        "csv" => Ok(Arc::new(CsvStore::from_config(config)?)),
        "memory" => {
            info!("Using in-memory storage, nothing will be written to disk");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => anyhow::bail!("unknown storage backend: {} (expected csv or memory)", other),
    }
}

async fn collect(config: &PipelineConfig, store: Arc<dyn DatasetStore>, now: DateTime<FixedOffset>) -> anyhow::Result<()> {
    let source = Arc::new(RssFeedSource::new(&config.user_agent)?);
    let collector = DailyCollector::new(source, store, config)?;
    let report = collector.collect(now).await?;

    let failed = report.failed_sources().count();
    match &report.written {
        Some(location) => println!(
            "collect: {} new items, {} total for {} -> {} ({} of {} sources failed)",
            report.new_items,
            report.total_items,
            report.day,
            location,
            failed,
            report.sources.len()
        ),
        None => println!(
            "collect: no relevant news for {} ({} of {} sources failed)",
            report.day,
            failed,
            report.sources.len()
        ),
    }
    if report.fallback_dates > 0 {
        println!("collect: {} items had no usable date and were stamped with the collection time", report.fallback_dates);
    }
    Ok(())
}

async fn weekly(config: &PipelineConfig, store: Arc<dyn DatasetStore>, today: NaiveDate) -> anyhow::Result<()> {
    let aggregator = WeeklyAggregator::new(store, config.weekly_report_days);
    match aggregator.aggregate(today).await? {
        WeeklyOutcome::Written {
            location,
            items,
            files_loaded,
            start,
            end,
        } => println!(
            "weekly: {} items from {} daily datasets ({} ~ {}) -> {}",
            items, files_loaded, start, end, location
        ),
        WeeklyOutcome::NoDailyData { message, .. } => println!("weekly: {}", message),
    }
    Ok(())
}

async fn analyze(config: &PipelineConfig, store: Arc<dyn DatasetStore>, now: DateTime<FixedOffset>) -> anyhow::Result<()> {
    let generator = create_model(&config.inference).context("failed to set up the text generation backend")?;
    let mut summarizer = TrendSummarizer::new(
        store,
        generator.clone(),
        config.inference.clone(),
        config.weekly_report_days,
    );
    if config.inference.translate {
        summarizer = summarizer.with_translation(Arc::new(ScriptDetector::new()), Arc::new(ModelTranslator::new(generator)));
    }

    match summarizer.summarize(now).await? {
        TrendOutcome::Written { report, location } => println!(
            "analyze: {} summary for {} ~ {}{} -> {}",
            report.summary.status(),
            report.period_start,
            report.period_end,
            if report.truncated { " (input truncated)" } else { "" },
            location
        ),
        TrendOutcome::NoWeeklyReport => println!("analyze: no weekly report found, run `secnews weekly` first"),
        TrendOutcome::EmptyWeeklyReport { source_dataset } => {
            println!("analyze: {} is empty, nothing to analyze", source_dataset)
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = PipelineConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let store = create_store(&cli.storage, &config)?;
    let now = Utc::now().with_timezone(&config.offset()?);
    info!("secnews {} at {}", env!("CARGO_PKG_VERSION"), now.format("%Y-%m-%d %H:%M:%S %:z"));

    match cli.command {
        Commands::Collect => collect(&config, store, now).await?,
        Commands::Weekly { date } => weekly(&config, store, date.unwrap_or_else(|| now.date_naive())).await?,
        Commands::Analyze => analyze(&config, store, now).await?,
        Commands::Run => {
            collect(&config, store.clone(), now).await?;
            weekly(&config, store.clone(), now.date_naive()).await?;
            analyze(&config, store, now).await?;
        }
    }
    Ok(())
}
