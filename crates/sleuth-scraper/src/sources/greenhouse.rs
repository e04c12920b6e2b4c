//! Greenhouse public board API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{json_headers, PageRequest};
use tracing::debug;

use super::{roster_units, Board, ScrapeContext, SourceScraper, Unit};
use crate::error::{Result, ScrapeError};
use crate::salary;

const API_BASE: &str = "https://api.greenhouse.io/v1/boards";

/// Companies with public Greenhouse boards.
pub const GREENHOUSE_BOARDS: &[Board] = &[
    Board { slug: "discord", display: "Discord" },
    Board { slug: "airbnb", display: "Airbnb" },
    Board { slug: "pinterest", display: "Pinterest" },
    Board { slug: "dropbox", display: "Dropbox" },
    Board { slug: "instacart", display: "Instacart" },
    Board { slug: "doordash", display: "DoorDash" },
    Board { slug: "lyft", display: "Lyft" },
    Board { slug: "stripe", display: "Stripe" },
    Board { slug: "coinbase", display: "Coinbase" },
    Board { slug: "robinhood", display: "Robinhood" },
    Board { slug: "figma", display: "Figma" },
    Board { slug: "notion", display: "Notion" },
    Board { slug: "airtable", display: "Airtable" },
    Board { slug: "canva", display: "Canva" },
    Board { slug: "gitlab", display: "GitLab" },
    Board { slug: "twitch", display: "Twitch" },
    Board { slug: "snap", display: "Snap" },
    Board { slug: "square", display: "Square" },
    Board { slug: "affirm", display: "Affirm" },
    Board { slug: "brex", display: "Brex" },
    Board { slug: "ramp", display: "Ramp" },
    Board { slug: "chime", display: "Chime" },
    Board { slug: "gusto", display: "Gusto" },
    Board { slug: "rippling", display: "Rippling" },
    Board { slug: "lattice", display: "Lattice" },
    Board { slug: "vercel", display: "Vercel" },
    Board { slug: "hashicorp", display: "HashiCorp" },
    Board { slug: "datadog", display: "Datadog" },
    Board { slug: "mongodb", display: "MongoDB" },
    Board { slug: "elastic", display: "Elastic" },
    Board { slug: "confluent", display: "Confluent" },
    Board { slug: "snowflake", display: "Snowflake" },
    Board { slug: "databricks", display: "Databricks" },
    Board { slug: "dbt", display: "dbt Labs" },
    Board { slug: "miro", display: "Miro" },
    Board { slug: "loom", display: "Loom" },
    Board { slug: "calendly", display: "Calendly" },
    Board { slug: "zapier", display: "Zapier" },
    Board { slug: "asana", display: "Asana" },
    Board { slug: "monday", display: "monday.com" },
    Board { slug: "clickup", display: "ClickUp" },
    Board { slug: "linear", display: "Linear" },
    Board { slug: "retool", display: "Retool" },
    Board { slug: "webflow", display: "Webflow" },
    Board { slug: "framer", display: "Framer" },
];

#[derive(Debug, Default, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Default, Deserialize)]
struct Job {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    absolute_url: Option<String>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Option<Vec<Metadata>>,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Value,
}

impl Job {
    fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    fn metadata_pairs(&self) -> Vec<(String, String)> {
        self.metadata
            .iter()
            .flatten()
            .filter_map(|m| {
                let value = match &m.value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((m.name.clone().unwrap_or_default(), value))
            })
            .collect()
    }
}

/// Scraper for Greenhouse company boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreenhouseScraper;

impl GreenhouseScraper {
    fn list_url(slug: &str) -> String {
        format!("{API_BASE}/{slug}/jobs")
    }

    fn detail_url(slug: &str, id: u64) -> String {
        format!("{API_BASE}/{slug}/jobs/{id}")
    }

    /// Fetch a job's detail document once; failures fall back to the list entry.
    ///
    /// Detail requests are not retried, but each one waits a jitter window
    /// first so a large board is not fetched in a burst.
    async fn detail(&self, ctx: &ScrapeContext, board: Board, id: u64) -> Option<Job> {
        let request = PageRequest::new(Self::detail_url(board.slug, id), json_headers());
        let page = match ctx.fetch_once(&request, board.slug).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                debug!(company = board.slug, id, status = page.status, "Detail fetch failed");
                return None;
            }
            Err(e) => {
                debug!(company = board.slug, id, error = %e, "Detail fetch failed");
                return None;
            }
        };
        serde_json::from_str(&page.body).ok()
    }
}

fn parse_jobs(body: &str, unit: &str, description: &str) -> Result<Vec<Job>> {
    let list: JobList = serde_json::from_str(body).map_err(|e| ScrapeError::json(unit, &e))?;
    let wanted = description.trim().to_lowercase();
    Ok(list
        .jobs
        .into_iter()
        .filter(|job| job.title().to_lowercase().contains(&wanted))
        .collect())
}

fn to_posting(board: Board, job: &Job, detail: Option<&Job>) -> JobPosting {
    let primary = detail.unwrap_or(job);
    let mut metadata = primary.metadata_pairs();
    if detail.is_some() {
        metadata.extend(job.metadata_pairs());
    }
    let content = primary.content.as_deref().unwrap_or_default();

    JobPosting {
        company: board.display.to_string(),
        title: job.title().trim().to_string(),
        location: job
            .location
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string(),
        url: job.absolute_url.clone().unwrap_or_default(),
        salary_range: salary::extract(
            None,
            metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            content,
        ),
        source: Source::Greenhouse,
    }
}

#[async_trait]
impl SourceScraper for GreenhouseScraper {
    fn source(&self) -> Source {
        Source::Greenhouse
    }

    fn delay_window(&self) -> (Duration, Duration) {
        (Duration::from_secs(1), Duration::from_secs(3))
    }

    fn units(&self, query: &SearchQuery, directory: Option<&CompanyDirectory>) -> Vec<Unit> {
        roster_units(GREENHOUSE_BOARDS, query, directory)
    }

    async fn scrape_unit(
        &self,
        ctx: &ScrapeContext,
        query: &SearchQuery,
        unit: Unit,
        jitter_first: bool,
    ) -> Result<Vec<JobPosting>> {
        let Unit::Company(board) = unit else {
            return Ok(Vec::new());
        };

        let body = ctx
            .fetch_body(Source::Greenhouse, board.slug, jitter_first, &[], || {
                PageRequest::new(Self::list_url(board.slug), json_headers())
            })
            .await?;
        let jobs = parse_jobs(&body, board.slug, &query.description)?;

        let mut postings = Vec::with_capacity(jobs.len());
        for job in &jobs {
            ctx.retry.pause(board.slug, &ctx.cancel).await?;
            let detail = self.detail(ctx, board, job.id).await;
            postings.push(to_posting(board, job, detail.as_ref()));
        }

        debug!(company = board.slug, count = postings.len(), "Greenhouse board scraped");
        Ok(postings)
    }
}
