//! LinkedIn guest job search.

use std::time::Duration;

use async_trait::async_trait;
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{mobile_headers, PageRequest};
use url::form_urlencoded;

use super::{card_posting, page_units, ScrapeContext, SourceScraper, Unit};
use crate::error::Result;
use crate::selectors::CardSpec;

const SEARCH_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const PAGE_SIZE: u32 = 25;

const SIGNATURES: &[&str] = &[
    "please verify you are a human",
    "unusual activity",
    "security verification",
    "captcha",
];

const CARDS: CardSpec = CardSpec {
    cards: &["div.base-card"],
    title: &["h3.base-search-card__title"],
    company: &["h4.base-search-card__subtitle"],
    location: &["span.job-search-card__location"],
    salary: &["span.job-search-card__salary-info"],
    link: &["a.base-card__full-link"],
    free_text: &[
        "div.job-posting-benefits",
        "div.base-search-card__metadata",
        "div.job-search-card__description",
    ],
};

const MASK_CLASSES: &[&str] = &["blurred-content"];

/// Scraper for LinkedIn's guest search pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedinScraper;

impl LinkedinScraper {
    /// Search URL for a zero-based page.
    #[must_use]
    pub fn search_url(query: &SearchQuery, page: u32) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("keywords", &query.description);
        if let Some(city) = query.city.as_deref().filter(|c| !c.trim().is_empty()) {
            params.append_pair("location", city.trim());
        }
        if query.filters.remote_only {
            params.append_pair("f_WT", "2");
        }
        params.append_pair("position", "1");
        params.append_pair("pageNum", "0");
        params.append_pair("sortBy", "DD");
        if page > 0 {
            params.append_pair("start", &(page * PAGE_SIZE).to_string());
        }
        format!("{SEARCH_URL}?{}", params.finish())
    }
}

/// Parse one page of LinkedIn result cards.
pub fn parse_page(html: &str) -> Result<Vec<JobPosting>> {
    Ok(CARDS
        .parse(html, &[], MASK_CLASSES)?
        .iter()
        .filter(|card| !card.masked)
        .filter_map(|card| {
            card_posting(
                card,
                &card.company_first_line,
                card.href.clone(),
                Source::Linkedin,
            )
        })
        .collect())
}

#[async_trait]
impl SourceScraper for LinkedinScraper {
    fn source(&self) -> Source {
        Source::Linkedin
    }

    fn delay_window(&self) -> (Duration, Duration) {
        (Duration::from_secs(2), Duration::from_secs(4))
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
        let referer = (page > 0).then_some(SEARCH_URL);
        let body = ctx
            .fetch_body(Source::Linkedin, &unit.label(), jitter_first, SIGNATURES, || {
                PageRequest::new(url.clone(), mobile_headers(referer))
            })
            .await?;

        parse_page(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::{JobFilters, NOT_AVAILABLE};

    const PAGE: &str = r#"
        <ul>
          <li>
            <div class="base-card">
              <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/1"></a>
              <h3 class="base-search-card__title">  Staff Engineer </h3>
              <h4 class="base-search-card__subtitle">
                Acme Corp
                Series C
              </h4>
              <span class="job-search-card__location">New York, NY</span>
              <span class="job-search-card__salary-info">$200,000 - $260,000</span>
            </div>
          </li>
          <li>
            <div class="base-card blurred-content">
              <h3 class="base-search-card__title">Hidden</h3>
              <h4 class="base-search-card__subtitle">Nobody</h4>
            </div>
          </li>
          <li>
            <div class="base-card">
              <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/3"></a>
              <h3 class="base-search-card__title">Platform Engineer</h3>
              <h4 class="base-search-card__subtitle">Globex</h4>
              <span class="job-search-card__location">United States</span>
              <div class="job-posting-benefits">Pay $150K - $180K</div>
            </div>
          </li>
          <li>
            <div class="base-card">
              <h3 class="base-search-card__title">Engineer</h3>
              <h4 class="base-search-card__subtitle">Initech</h4>
              <p>$999K somewhere else</p>
            </div>
          </li>
        </ul>
    "#;

    #[test]
    fn test_parse_page() {
        let postings = parse_page(PAGE).unwrap();
        assert_eq!(postings.len(), 3);

        assert_eq!(postings[0].title, "Staff Engineer");
        assert_eq!(postings[0].company, "Acme Corp");
        assert_eq!(postings[0].salary_range, "$200,000 - $260,000");
        assert_eq!(postings[0].url, "https://www.linkedin.com/jobs/view/1");

        assert_eq!(postings[1].company, "Globex");
        assert_eq!(postings[1].salary_range, "$150K - $180K");

        // only the benefit, metadata and description sections are scanned
        assert_eq!(postings[2].salary_range, NOT_AVAILABLE);
        assert!(postings.iter().all(|p| p.source == Source::Linkedin));
    }

    #[test]
    fn test_search_url() {
        let mut query = SearchQuery::new("rust engineer").with_filters(JobFilters {
            remote_only: true,
            ..JobFilters::default()
        });
        query.city = Some("Austin, TX".to_string());

        assert_eq!(
            LinkedinScraper::search_url(&query, 0),
            "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search\
             ?keywords=rust+engineer&location=Austin%2C+TX&f_WT=2&position=1&pageNum=0&sortBy=DD"
        );
        assert!(LinkedinScraper::search_url(&query, 2).ends_with("&start=50"));
    }
}
