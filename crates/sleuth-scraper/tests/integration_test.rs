//! End-to-end runs against scripted boards.

use std::sync::Arc;

use chrono::Utc;
use sleuth_core::clock::{ManualClock, RecordingSleeper};
use sleuth_core::{NetworkConfig, SearchQuery, Source, NOT_AVAILABLE};
use sleuth_http::ScriptedFetcher;
use sleuth_scraper::ScrapeOrchestrator;

const CAPTCHA_PAGE: &str = "<html><head><title>Security Verification</title></head>\
    <body>Please verify you are a human</body></html>";

const LINKEDIN_PAGE: &str = r#"
    <div class="base-card">
      <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/7"></a>
      <h3 class="base-search-card__title">Senior Software Engineer</h3>
      <h4 class="base-search-card__subtitle">Initech</h4>
      <span class="job-search-card__location">Remote</span>
    </div>
"#;

const GREENHOUSE_LIST: &str = r#"{"jobs": [
    {"id": 11, "title": "Senior Software Engineer", "absolute_url": "https://boards.greenhouse.io/stripe/jobs/11", "location": {"name": "Remote"}}
]}"#;

fn orchestrator(fetcher: Arc<ScriptedFetcher>, sleeper: Arc<RecordingSleeper>) -> ScrapeOrchestrator {
    ScrapeOrchestrator::new(fetcher, Arc::new(ManualClock::new(Utc::now())), sleeper)
}

#[tokio::test]
async fn test_captcha_on_every_attempt_aborts_after_first_detection() {
    let fetcher = Arc::new(ScriptedFetcher::new().route(
        "https://www.linkedin.com/",
        403,
        CAPTCHA_PAGE,
    ));
    let network = NetworkConfig {
        source_concurrency: 3,
        ..NetworkConfig::default()
    };

    let report = orchestrator(fetcher.clone(), Arc::new(RecordingSleeper::new()))
        .with_network(&network)
        .run(&SearchQuery::new("software engineer").with_pages(1), &[Source::Linkedin])
        .await;

    assert_eq!(fetcher.count("https://www.linkedin.com/"), 1);
    assert_eq!(report.blocked_sources(), vec![Source::Linkedin]);
    assert_eq!(
        report.sources[0].blocked.as_deref(),
        Some("please verify you are a human")
    );
    assert_eq!(report.skipped_units(), 0);
    assert!(report.jobs.is_empty());
}

#[tokio::test]
async fn test_blocked_source_does_not_affect_others() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .route("https://www.indeed.com/", 200, "<html>Just a moment...</html>")
            .route("https://www.linkedin.com/", 200, LINKEDIN_PAGE)
            .route("https://api.greenhouse.io/v1/boards/", 404, "")
            .route(
                "https://api.greenhouse.io/v1/boards/stripe/jobs",
                200,
                GREENHOUSE_LIST,
            ),
    );

    let report = orchestrator(fetcher.clone(), Arc::new(RecordingSleeper::new()))
        .run(
            &SearchQuery::new("software engineer"),
            &[Source::Indeed, Source::Linkedin, Source::Greenhouse],
        )
        .await;

    let order: Vec<Source> = report.sources.iter().map(|s| s.source).collect();
    assert_eq!(order, vec![Source::Indeed, Source::Linkedin, Source::Greenhouse]);
    assert_eq!(report.blocked_sources(), vec![Source::Indeed]);

    let companies: Vec<&str> = report
        .jobs
        .iter()
        .map(|j| j.posting.company.as_str())
        .collect();
    assert_eq!(companies, vec!["Initech", "Stripe"]);
    assert!(report
        .jobs
        .iter()
        .all(|j| j.posting.salary_range == NOT_AVAILABLE));

    // every other Greenhouse board 404s and is skipped after retries
    let greenhouse = &report.sources[2];
    assert_eq!(greenhouse.collected, 1);
    assert_eq!(greenhouse.skipped_units.len(), 44);
}
