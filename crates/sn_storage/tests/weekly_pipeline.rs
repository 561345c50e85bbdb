use std::sync::Arc;

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
use sn_core::{DatasetStore, NewsItem};
use sn_storage::{CsvStore, WeeklyAggregator, WeeklyOutcome};

fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn item(title: &str, link: &str, day: NaiveDate, hour: u32) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        link: link.to_string(),
        summary: format!("{} summary", title),
        source: "https://feed.example/rss".to_string(),
        published_at: kst()
            .from_local_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
            .unwrap(),
    }
}

fn setup(dir: &std::path::Path) -> Arc<CsvStore> {
    Arc::new(CsvStore::new(
        dir.join("security_news_data"),
        dir.join("weekly_reports"),
        dir.join("ai_analysis_reports"),
        kst(),
    ))
}

#[tokio::test]
async fn test_window_loads_exactly_the_files_inside_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    for offset in [8, 7, 3, 0] {
        let day = today - Duration::days(offset);
        store
            .save_daily(day, &[item(&format!("Ransomware D-{}", offset), &format!("u{}", offset), day, 9)])
            .await
            .unwrap();
    }

    let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(today).await.unwrap();
    let WeeklyOutcome::Written { files_loaded, items, start, end, location } = outcome else {
        panic!("expected a weekly dataset");
    };
    assert_eq!(files_loaded, 3);
    assert_eq!(items, 3);
    assert_eq!(start, today - Duration::days(7));
    assert_eq!(end, today);
    assert!(location.ends_with("weekly_security_report_2024-05-10.csv"));

    let latest = store.latest_weekly().await.unwrap().unwrap();
    let weekly = store.load_weekly(&latest).await.unwrap();
    let titles: Vec<_> = weekly.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Ransomware D-0", "Ransomware D-3", "Ransomware D-7"]);
}

#[tokio::test]
async fn test_rerun_produces_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let yesterday = today.pred_opt().unwrap();

    store
        .save_daily(yesterday, &[item("A", "u1", yesterday, 9), item("B", "u2", yesterday, 9)])
        .await
        .unwrap();
    store
        .save_daily(today, &[item("A", "u1", yesterday, 9), item("C", "u3", today, 8)])
        .await
        .unwrap();

    let aggregator = WeeklyAggregator::new(store.clone(), 7);
    aggregator.aggregate(today).await.unwrap();
    let first = std::fs::read(store.weekly_path(today)).unwrap();
    aggregator.aggregate(today).await.unwrap();
    let second = std::fs::read(store.weekly_path(today)).unwrap();
    assert_eq!(first, second);

    let weekly = store
        .load_weekly(&store.latest_weekly().await.unwrap().unwrap())
        .await
        .unwrap();
    assert_eq!(weekly.len(), 3);
    assert!(weekly.windows(2).all(|w| w[0].published_at >= w[1].published_at));
}

#[tokio::test]
async fn test_unreadable_and_empty_days_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let d1 = today - Duration::days(1);
    let d2 = today - Duration::days(2);

    store.save_daily(today, &[item("A", "u1", today, 9)]).await.unwrap();
    std::fs::write(store.daily_path(d1), b"").unwrap();
    std::fs::write(store.daily_path(d2), "Title,Link\n\"unterminated,x\n").unwrap();

    let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(today).await.unwrap();
    assert!(matches!(outcome, WeeklyOutcome::Written { files_loaded: 1, items: 1, .. }));
}

#[tokio::test]
async fn test_readable_rows_of_a_partly_damaged_day_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    std::fs::create_dir_all(dir.path().join("security_news_data")).unwrap();
    std::fs::write(
        store.daily_path(today),
        "Date,Time,Title,Link,Summary,Source\n2024-05-10,09:00:00,A,u1,s,f\n05/10/2024,10:00:00,B,u2,s,f\n",
    )
    .unwrap();

    let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(today).await.unwrap();
    assert!(matches!(outcome, WeeklyOutcome::Written { files_loaded: 1, items: 1, .. }));
    // the daily file itself is not rewritten by aggregation
    assert!(std::fs::read_to_string(store.daily_path(today)).unwrap().contains("05/10/2024"));
}

#[tokio::test]
async fn test_no_daily_files_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(dir.path());
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let outcome = WeeklyAggregator::new(store.clone(), 7).aggregate(today).await.unwrap();
    assert!(matches!(outcome, WeeklyOutcome::NoDailyData { .. }));
    assert!(!store.weekly_path(today).exists());
}
