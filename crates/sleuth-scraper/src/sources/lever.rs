//! Lever public postings API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{json_headers, PageRequest};
use tracing::debug;

use super::{roster_units, Board, ScrapeContext, SourceScraper, Unit};
use crate::error::{Result, ScrapeError};
use crate::salary::{self, SalaryRange};

const API_BASE: &str = "https://api.lever.co/v0/postings";

/// Companies with public Lever boards.
pub const LEVER_BOARDS: &[Board] = &[
    Board { slug: "plaid", display: "Plaid" },
    Board { slug: "figma", display: "Figma" },
    Board { slug: "notion", display: "Notion" },
    Board { slug: "netflix", display: "Netflix" },
    Board { slug: "openai", display: "OpenAI" },
    Board { slug: "anthropic", display: "Anthropic" },
    Board { slug: "scale", display: "Scale AI" },
    Board { slug: "anduril", display: "Anduril" },
    Board { slug: "verkada", display: "Verkada" },
    Board { slug: "flexport", display: "Flexport" },
    Board { slug: "faire", display: "Faire" },
    Board { slug: "intercom", display: "Intercom" },
    Board { slug: "carta", display: "Carta" },
    Board { slug: "retool", display: "Retool" },
    Board { slug: "samsara", display: "Samsara" },
    Board { slug: "duolingo", display: "Duolingo" },
    Board { slug: "cruise", display: "Cruise" },
    Board { slug: "nuro", display: "Nuro" },
    Board { slug: "waymo", display: "Waymo" },
    Board { slug: "aurora", display: "Aurora" },
    Board { slug: "zoox", display: "Zoox" },
    Board { slug: "rivian", display: "Rivian" },
    Board { slug: "lucid", display: "Lucid Motors" },
    Board { slug: "airtable", display: "Airtable" },
    Board { slug: "amplitude", display: "Amplitude" },
    Board { slug: "mixpanel", display: "Mixpanel" },
    Board { slug: "segment", display: "Segment" },
    Board { slug: "braze", display: "Braze" },
    Board { slug: "iterable", display: "Iterable" },
    Board { slug: "onelogin", display: "OneLogin" },
    Board { slug: "okta", display: "Okta" },
    Board { slug: "auth0", display: "Auth0" },
    Board { slug: "lacework", display: "Lacework" },
    Board { slug: "snyk", display: "Snyk" },
    Board { slug: "crowdstrike", display: "CrowdStrike" },
    Board { slug: "sentinelone", display: "SentinelOne" },
    Board { slug: "palo-alto-networks", display: "Palo Alto Networks" },
    Board { slug: "cloudflare", display: "Cloudflare" },
    Board { slug: "fastly", display: "Fastly" },
    Board { slug: "netlify", display: "Netlify" },
    Board { slug: "supabase", display: "Supabase" },
    Board { slug: "planetscale", display: "PlanetScale" },
    Board { slug: "cockroachlabs", display: "Cockroach Labs" },
    Board { slug: "timescale", display: "Timescale" },
    Board { slug: "yugabyte", display: "Yugabyte" },
    Board { slug: "materialize", display: "Materialize" },
    Board { slug: "starburst", display: "Starburst" },
    Board { slug: "dremio", display: "Dremio" },
    Board { slug: "fivetran", display: "Fivetran" },
    Board { slug: "airbyte", display: "Airbyte" },
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Posting {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    hosted_url: Option<String>,
    #[serde(default)]
    description_plain: Option<String>,
    #[serde(default)]
    additional_plain: Option<String>,
    #[serde(default)]
    categories: Option<Categories>,
    #[serde(default)]
    lists: Option<Vec<ListSection>>,
    #[serde(default)]
    salary_range: Option<LeverSalary>,
}

#[derive(Debug, Default, Deserialize)]
struct Categories {
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListSection {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverSalary {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    interval: Option<String>,
}

impl Posting {
    fn title(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    fn structured_salary(&self) -> Option<SalaryRange> {
        let range = self.salary_range.as_ref()?;
        Some(SalaryRange::new(
            range.min.unwrap_or_default(),
            range.max.unwrap_or_default(),
            range.interval.as_deref(),
        ))
    }

    fn free_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.description_plain.as_deref().unwrap_or_default(),
            self.additional_plain.as_deref().unwrap_or_default(),
        ];
        for section in self.lists.iter().flatten() {
            parts.push(section.text.as_deref().unwrap_or_default());
            parts.push(section.content.as_deref().unwrap_or_default());
        }
        parts.join(" ")
    }
}

fn parse_postings(body: &str, unit: &str, description: &str) -> Result<Vec<Posting>> {
    let postings: Vec<Posting> =
        serde_json::from_str(body).map_err(|e| ScrapeError::json(unit, &e))?;
    let wanted = description.trim().to_lowercase();
    Ok(postings
        .into_iter()
        .filter(|p| p.title().to_lowercase().contains(&wanted))
        .collect())
}

fn to_posting(board: Board, posting: &Posting) -> JobPosting {
    JobPosting {
        company: board.display.to_string(),
        title: posting.title().trim().to_string(),
        location: posting
            .categories
            .as_ref()
            .and_then(|c| c.location.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string(),
        url: posting.hosted_url.clone().unwrap_or_default(),
        salary_range: salary::extract(
            posting.structured_salary().as_ref(),
            [],
            &posting.free_text(),
        ),
        source: Source::Lever,
    }
}

/// Scraper for Lever company boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeverScraper;

#[async_trait]
impl SourceScraper for LeverScraper {
    fn source(&self) -> Source {
        Source::Lever
    }

    fn delay_window(&self) -> (Duration, Duration) {
        (Duration::from_secs(1), Duration::from_secs(3))
    }

    fn units(&self, query: &SearchQuery, directory: Option<&CompanyDirectory>) -> Vec<Unit> {
        roster_units(LEVER_BOARDS, query, directory)
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
            .fetch_body(Source::Lever, board.slug, jitter_first, &[], || {
                PageRequest::new(format!("{API_BASE}/{}?mode=json", board.slug), json_headers())
            })
            .await?;

        let postings: Vec<JobPosting> = parse_postings(&body, board.slug, &query.description)?
            .iter()
            .map(|p| to_posting(board, p))
            .collect();

        debug!(company = board.slug, count = postings.len(), "Lever board scraped");
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tests::context;
    use sleuth_core::clock::RecordingSleeper;
    use sleuth_core::NOT_AVAILABLE;
    use sleuth_http::ScriptedFetcher;
    use std::sync::Arc;

    const BOARD: &str = r#"[
        {
            "id": "a1",
            "text": "Software Engineer, Infrastructure",
            "hostedUrl": "https://jobs.lever.co/scale/a1",
            "categories": {"location": "San Francisco, CA", "team": "Infra"},
            "salaryRange": {"min": 180000, "max": 240000, "currency": "USD", "interval": "per-year-salary"}
        },
        {
            "id": "a2",
            "text": "Software Engineer, ML",
            "hostedUrl": "https://jobs.lever.co/scale/a2",
            "categories": {"location": null},
            "descriptionPlain": "Build models.",
            "lists": [{"text": "Compensation", "content": "The range is $150,000 - $210,000 per year"}]
        },
        {
            "id": "a3",
            "text": "Recruiter",
            "hostedUrl": "https://jobs.lever.co/scale/a3"
        },
        {
            "id": "a4",
            "text": "Software Engineer Intern",
            "salaryRange": {"min": 0, "max": 0}
        }
    ]"#;

    #[test]
    fn test_parse_and_extract() {
        let board = Board { slug: "scale", display: "Scale AI" };
        let postings: Vec<JobPosting> = parse_postings(BOARD, "scale", "software engineer")
            .unwrap()
            .iter()
            .map(|p| to_posting(board, p))
            .collect();

        assert_eq!(postings.len(), 3);
        assert_eq!(postings[0].company, "Scale AI");
        assert_eq!(postings[0].salary_range, "$180,000 - $240,000/per-year-salary");
        assert_eq!(postings[1].salary_range, "$150,000 - $210,000");
        assert_eq!(postings[1].location, "");
        assert_eq!(postings[2].salary_range, NOT_AVAILABLE);
    }

    #[test]
    fn test_single_figure_range() {
        let body = r#"[{"text": "Engineer", "salaryRange": {"min": 200000, "max": 200000}}]"#;
        let postings = parse_postings(body, "scale", "engineer").unwrap();
        let board = Board { slug: "scale", display: "Scale AI" };
        assert_eq!(to_posting(board, &postings[0]).salary_range, "$200,000/year");
    }

    #[test]
    fn test_roster() {
        assert_eq!(LEVER_BOARDS.len(), 50);
        let lucid = LEVER_BOARDS.iter().find(|b| b.slug == "lucid").unwrap();
        assert_eq!(lucid.display, "Lucid Motors");
    }

    #[tokio::test]
    async fn test_rate_limited_then_recovers() {
        let fetcher = Arc::new(ScriptedFetcher::new().sequence(
            "https://api.lever.co/v0/postings/scale",
            vec![(429, ""), (200, BOARD)],
        ));
        let sleeper = Arc::new(RecordingSleeper::new());
        let ctx = context(fetcher.clone(), sleeper.clone());
        let board = Board { slug: "scale", display: "Scale AI" };

        let postings = LeverScraper
            .scrape_unit(&ctx, &SearchQuery::new("intern"), Unit::Company(board), false)
            .await
            .unwrap();

        assert_eq!(postings.len(), 1);
        assert_eq!(fetcher.count("https://api.lever.co/"), 2);
        assert_eq!(sleeper.calls(), vec![crate::retry::RATE_LIMIT_PENALTY]);
    }
}
