//! Monster search result pages.

use std::time::Duration;

use async_trait::async_trait;
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{random_headers, PageRequest};
use url::form_urlencoded;

use super::{card_posting, page_units, ScrapeContext, SourceScraper, Unit};
use crate::error::Result;
use crate::selectors::{absolute_url, CardSpec};

const BASE_URL: &str = "https://www.monster.com";

const SIGNATURES: &[&str] = &[
    "verification required",
    "captcha",
    "unusual activity",
    "slide right to complete the puzzle",
];

const CARDS: CardSpec = CardSpec {
    cards: &[
        "div[data-testid='svx_jobCard']",
        "div.job-cardstyle__JobCardComponent",
        "div.card-content",
        "div.flex-row",
        "article.job-cardstyle",
        "div.results-card",
    ],
    title: &[
        "h2[data-testid='svx_jobCard-title']",
        "h2.title a",
        "h2.title",
        "a.job-cardstyle__jobTitleLink",
        "h3.job-title",
    ],
    company: &[
        "span[data-testid='svx_jobCard-companyName']",
        "div.company span",
        "div.company",
        "span.company-name",
        "a.company",
    ],
    location: &[
        "span[data-testid='svx_jobCard-location']",
        "div.location span",
        "div.location",
        "span.location",
    ],
    salary: &[
        "span[data-testid='svx_jobCard-salary']",
        "div.job-salary",
        "div.salary span",
        "span.salary",
    ],
    link: &["a[data-testid='svx_jobCard-title']", "h2.title a", "a"],
    free_text: &[],
};

/// Scraper for Monster result pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonsterScraper;

impl MonsterScraper {
    /// Search URL for a zero-based page; Monster numbers pages from one.
    #[must_use]
    pub fn search_url(query: &SearchQuery, page: u32) -> String {
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &query.description)
            .append_pair("page", &(page + 1).to_string())
            .finish();
        format!("{BASE_URL}/jobs/search?{params}")
    }
}

/// Parse one page of Monster result cards.
pub fn parse_page(html: &str) -> Result<Vec<JobPosting>> {
    Ok(CARDS
        .parse(html, &[], &[])?
        .iter()
        .filter_map(|card| {
            card_posting(
                card,
                &card.company,
                absolute_url(BASE_URL, &card.href),
                Source::Monster,
            )
        })
        .collect())
}

#[async_trait]
impl SourceScraper for MonsterScraper {
    fn source(&self) -> Source {
        Source::Monster
    }

    fn delay_window(&self) -> (Duration, Duration) {
        (Duration::from_secs(3), Duration::from_secs(6))
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
            .fetch_body(Source::Monster, &unit.label(), jitter_first, SIGNATURES, || {
                PageRequest::new(url.clone(), random_headers())
            })
            .await?;

        parse_page(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <section>
          <div data-testid="svx_jobCard">
            <a data-testid="svx_jobCard-title" href="/job-openings/sre-seattle-wa--1234">
              <h2 data-testid="svx_jobCard-title">Site Reliability Engineer</h2>
            </a>
            <span data-testid="svx_jobCard-companyName">Umbrella</span>
            <span data-testid="svx_jobCard-location">Seattle, WA</span>
            <p>Competitive pay of $175K with equity</p>
          </div>
          <div data-testid="svx_jobCard">
            <h2 data-testid="svx_jobCard-title">QA Analyst</h2>
            <span data-testid="svx_jobCard-companyName">Vandelay</span>
            <span data-testid="svx_jobCard-salary">$80,000</span>
            <a href="https://www.monster.com/job-openings/qa--99">apply</a>
          </div>
        </section>
    "#;

    #[test]
    fn test_parse_page() {
        let postings = parse_page(PAGE).unwrap();
        assert_eq!(postings.len(), 2);

        assert_eq!(postings[0].title, "Site Reliability Engineer");
        assert_eq!(postings[0].company, "Umbrella");
        assert_eq!(
            postings[0].url,
            "https://www.monster.com/job-openings/sre-seattle-wa--1234"
        );
        // whole card text is scanned
        assert_eq!(postings[0].salary_range, "$175K");

        assert_eq!(postings[1].salary_range, "$80,000");
        assert_eq!(postings[1].url, "https://www.monster.com/job-openings/qa--99");
        assert_eq!(postings[1].location, "");
    }

    #[test]
    fn test_search_url_is_one_based() {
        let query = SearchQuery::new("nurse");
        assert_eq!(
            MonsterScraper::search_url(&query, 0),
            "https://www.monster.com/jobs/search?q=nurse&page=1"
        );
    }

    #[test]
    fn test_challenge_page_has_no_cards() {
        let postings =
            parse_page("<html><body>Slide right to complete the puzzle</body></html>").unwrap();
        assert!(postings.is_empty());
    }
}
