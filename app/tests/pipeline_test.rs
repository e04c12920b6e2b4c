//! Tracker runs end to end against scripted boards.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use salarysleuth::{Pipeline, RESULTS_FILE};
use sleuth_core::clock::{ManualClock, RecordingSleeper};
use sleuth_core::{EnrichedJob, SleuthConfig};
use sleuth_http::ScriptedFetcher;
use sleuth_ledger::JobStore;
use tempfile::TempDir;

const FIRST_PAGE: &str = r#"
    <div class="base-card">
      <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/7"></a>
      <h3 class="base-search-card__title">Senior Software Engineer</h3>
      <h4 class="base-search-card__subtitle">Initech</h4>
      <span class="job-search-card__location">Remote</span>
    </div>
"#;

const SECOND_PAGE: &str = r#"
    <div class="base-card">
      <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/7"></a>
      <h3 class="base-search-card__title">Senior Software Engineer</h3>
      <h4 class="base-search-card__subtitle">Initech</h4>
      <span class="job-search-card__location">Remote</span>
      <span class="job-search-card__salary-info">$180,000 - $220,000</span>
    </div>
    <div class="base-card">
      <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/8"></a>
      <h3 class="base-search-card__title">Staff Software Engineer</h3>
      <h4 class="base-search-card__subtitle">Hooli</h4>
      <span class="job-search-card__location">Remote</span>
    </div>
"#;

const CAPTCHA_PAGE: &str = "<html><body>Please verify you are a human</body></html>";

fn config(passes: u32) -> SleuthConfig {
    let mut config = SleuthConfig::default();
    config.search.description = "software engineer".to_string();
    config.search.pages = 1;
    config.search.sources = vec!["linkedin".to_string()];
    config.enrichment.enabled = false;
    config.ledger.passes = passes;
    config
}

fn pipeline(
    config: SleuthConfig,
    fetcher: Arc<ScriptedFetcher>,
    sleeper: Arc<RecordingSleeper>,
    dir: &TempDir,
) -> Pipeline {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap(),
    ));
    Pipeline::new(
        config,
        fetcher,
        clock,
        sleeper,
        dir.path().join("data"),
        dir.path().join("cache"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_passes_merge_and_backfill_salary() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().sequence(
        "https://www.linkedin.com/",
        vec![(200, FIRST_PAGE), (200, SECOND_PAGE)],
    ));
    let sleeper = Arc::new(RecordingSleeper::new());

    let summary = pipeline(config(2), fetcher, sleeper.clone(), &dir)
        .run()
        .await
        .unwrap();

    assert!(summary.persisted);
    assert_eq!(summary.passes_used, 2);
    assert!(sleeper.calls().contains(&Duration::from_secs(5)));

    let companies: Vec<&str> = summary
        .jobs
        .iter()
        .map(|j| j.posting.company.as_str())
        .collect();
    assert_eq!(companies, vec!["Initech", "Hooli"]);
    assert!(summary.jobs[0].posting.salary_range.contains("$180,000"));
    assert_eq!(summary.new_jobs.len(), 2);

    let results: Vec<EnrichedJob> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("data").join(RESULTS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(results, summary.jobs);

    let store = JobStore::load(&dir.path().join("data").join("jobs.json"));
    assert_eq!(store.jobs.len(), 2);
}

#[tokio::test]
async fn test_second_run_reports_nothing_new() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().route(
        "https://www.linkedin.com/",
        200,
        FIRST_PAGE,
    ));

    let first = pipeline(config(1), fetcher.clone(), Arc::new(RecordingSleeper::new()), &dir)
        .run()
        .await
        .unwrap();
    let second = pipeline(config(1), fetcher, Arc::new(RecordingSleeper::new()), &dir)
        .run()
        .await
        .unwrap();

    assert_eq!(first.new_jobs.len(), 1);
    assert!(second.new_jobs.is_empty());
    assert_eq!(second.jobs.len(), 1);
}

#[tokio::test]
async fn test_fully_blocked_run_keeps_previous_ledger() {
    let dir = TempDir::new().unwrap();
    let good = Arc::new(ScriptedFetcher::new().route(
        "https://www.linkedin.com/",
        200,
        FIRST_PAGE,
    ));
    pipeline(config(1), good, Arc::new(RecordingSleeper::new()), &dir)
        .run()
        .await
        .unwrap();

    let blocked = Arc::new(ScriptedFetcher::new().route(
        "https://www.linkedin.com/",
        403,
        CAPTCHA_PAGE,
    ));
    let summary = pipeline(config(2), blocked, Arc::new(RecordingSleeper::new()), &dir)
        .run()
        .await
        .unwrap();

    assert!(!summary.persisted);
    assert_eq!(summary.passes_used, 0);
    let store = JobStore::load(&dir.path().join("data").join("jobs.json"));
    assert_eq!(store.jobs.len(), 1);
}
