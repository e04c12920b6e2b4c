//! Indeed search result pages.

use std::time::Duration;

use async_trait::async_trait;
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{random_headers, PageRequest};
use url::form_urlencoded;

use super::{card_posting, page_units, ScrapeContext, SourceScraper, Unit};
use crate::error::Result;
use crate::selectors::{absolute_url, CardSpec};

const BASE_URL: &str = "https://www.indeed.com";
const PAGE_SIZE: u32 = 10;

const SIGNATURES: &[&str] = &[
    "just a moment",
    "cf-browser-verification",
    "additional verification required",
    "captcha",
];

const CARDS: CardSpec = CardSpec {
    cards: &[
        "div.job_seen_beacon",
        "div.jobsearch-ResultsList div.cardOutline",
        "div[data-jk]",
        "div.result",
        "td.resultContent",
    ],
    title: &[
        "h2.jobTitle span[title]",
        "h2.jobTitle a",
        "h2.jobTitle",
        "a.jcs-JobTitle span",
        "a.jcs-JobTitle",
    ],
    company: &[
        "span.companyName",
        "span[data-testid='company-name']",
        "div.companyInfo span.companyName",
        "span.company",
    ],
    location: &[
        "div.companyLocation",
        "div[data-testid='text-location']",
        "span.companyLocation",
        "span.location",
    ],
    salary: &[
        "div.salary-snippet-container",
        "div[data-testid='attribute_snippet_testid']",
        "span.salaryText",
        "div.metadata.salary-snippet-container",
    ],
    link: &["a.jcs-JobTitle", "h2.jobTitle a"],
    free_text: &["div.job-snippet", "table.jobCardShelfContainer"],
};

/// Scraper for Indeed result pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndeedScraper;

impl IndeedScraper {
    /// Search URL for a zero-based page.
    #[must_use]
    pub fn search_url(query: &SearchQuery, page: u32) -> String {
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &query.description)
            .append_pair("l", "")
            .append_pair("start", &(page * PAGE_SIZE).to_string())
            .finish();
        format!("{BASE_URL}/jobs?{params}")
    }
}

/// Parse one page of Indeed result cards.
pub fn parse_page(html: &str) -> Result<Vec<JobPosting>> {
    Ok(CARDS
        .parse(html, &["data-jk"], &[])?
        .iter()
        .filter_map(|card| {
            let url = if card.href.is_empty() {
                card.attributes
                    .first()
                    .cloned()
                    .flatten()
                    .map(|jk| format!("{BASE_URL}/viewjob?jk={jk}"))
                    .unwrap_or_default()
            } else {
                absolute_url(BASE_URL, &card.href)
            };
            card_posting(card, &card.company, url, Source::Indeed)
        })
        .collect())
}

#[async_trait]
impl SourceScraper for IndeedScraper {
    fn source(&self) -> Source {
        Source::Indeed
    }

    fn delay_window(&self) -> (Duration, Duration) {
        (Duration::from_secs(3), Duration::from_secs(7))
    }

    fn block_signatures(&self) -> &'static [&'static str] {
        SIGNATURES
    }

    fn units(&self, query: &SearchQuery, _directory: Option<&CompanyDirectory>) -> Vec<Unit> {
        page_units(query)
    }

    async fn scrape_unit(
        &self,
        ctx: &ScrapeContext,
        query: &SearchQuery,
        unit: Unit,
        jitter_first: bool,
    ) -> Result<Vec<JobPosting>> {
        let Unit::Page(page) = unit else {
            return Ok(Vec::new());
        };

        let url = Self::search_url(query, page);
        let body = ctx
            .fetch_body(Source::Indeed, &unit.label(), jitter_first, SIGNATURES, || {
                PageRequest::new(url.clone(), random_headers())
            })
            .await?;

        parse_page(&body)
    }
}
