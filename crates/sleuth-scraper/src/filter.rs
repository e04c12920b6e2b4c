//! Posting filters applied after collection.

use sleuth_core::{JobFilters, JobPosting, SearchQuery};
use sleuth_enrich::CompanyDirectory;

const REMOTE_LOCATION_MARKERS: [&str; 4] = ["remote", "anywhere", "work from home", "wfh"];
const REMOTE_TITLE_MARKERS: [&str; 3] = ["remote", "wfh", "work from home"];

/// Title keyword, remote, internship and top-pay filtering.
#[derive(Clone, Default)]
pub struct JobFilter {
    title_keyword: Option<String>,
    filters: JobFilters,
    directory: Option<CompanyDirectory>,
}

impl JobFilter {
    /// Build a filter from a search query.
    ///
    /// The directory is consulted only when top-pay filtering is on and must
    /// already be refreshed.
    #[must_use]
    pub fn new(query: &SearchQuery, directory: Option<CompanyDirectory>) -> Self {
        Self {
            title_keyword: query
                .title_keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_lowercase),
            filters: query.filters,
            directory,
        }
    }

    /// Whether a posting passes every active filter.
    #[must_use]
    pub fn matches(&self, posting: &JobPosting) -> bool {
        self.is_valid_job(&posting.title, &posting.location, &posting.company)
    }

    /// Whether a title/location/company combination passes every active filter.
    #[must_use]
    pub fn is_valid_job(&self, title: &str, location: &str, company: &str) -> bool {
        let title = title.to_lowercase();

        if let Some(keyword) = &self.title_keyword {
            if !title.contains(keyword.as_str()) {
                return false;
            }
        }

        if self.filters.remote_only && !is_remote(&title, location) {
            return false;
        }

        if self.filters.internships_only && !title.contains("intern") {
            return false;
        }

        if self.filters.top_pay_only {
            let listed = self
                .directory
                .as_ref()
                .is_some_and(|directory| directory.contains(company));
            if !listed {
                return false;
            }
        }

        true
    }
}

/// Remote heuristic: remote markers in location or title, or a bare
/// "United States" location with no city.
#[must_use]
pub fn is_remote(title: &str, location: &str) -> bool {
    let title = title.to_lowercase();
    let location = location.to_lowercase();

    REMOTE_LOCATION_MARKERS.iter().any(|m| location.contains(m))
        || REMOTE_TITLE_MARKERS.iter().any(|m| title.contains(m))
        || (location.contains("united states") && !location.contains(','))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::clock::{ManualClock, RecordingSleeper};
    use sleuth_enrich::CacheData;
    use sleuth_http::ScriptedFetcher;
    use std::sync::Arc;

    fn query(filters: JobFilters, keyword: Option<&str>) -> SearchQuery {
        let mut query = SearchQuery::new("software engineer").with_filters(filters);
        query.title_keyword = keyword.map(str::to_string);
        query
    }

    #[test]
    fn test_remote_heuristic() {
        assert!(is_remote("Backend Engineer", "Remote - US"));
        assert!(is_remote("Backend Engineer", "Anywhere"));
        assert!(is_remote("Backend Engineer (WFH)", "Chicago, IL"));
        assert!(is_remote("Backend Engineer", "United States"));
        assert!(!is_remote("Backend Engineer", "Austin, Texas, United States"));
        assert!(!is_remote("Backend Engineer", "New York, NY"));
    }

    #[test]
    fn test_title_keyword() {
        let filter = JobFilter::new(&query(JobFilters::default(), Some("Senior")), None);
        assert!(filter.is_valid_job("Senior Software Engineer", "NYC", "Acme"));
        assert!(!filter.is_valid_job("Software Engineer II", "NYC", "Acme"));
    }

    #[test]
    fn test_internships() {
        let filters = JobFilters {
            internships_only: true,
            ..JobFilters::default()
        };
        let filter = JobFilter::new(&query(filters, None), None);
        assert!(filter.is_valid_job("Software Engineering Intern", "NYC", "Acme"));
        assert!(filter.is_valid_job("Summer Internship", "NYC", "Acme"));
        assert!(!filter.is_valid_job("Staff Engineer", "NYC", "Acme"));
    }

    #[test]
    fn test_top_pay_uses_directory() {
        let directory = CompanyDirectory::new(
            Arc::new(ScriptedFetcher::new()),
            Arc::new(ManualClock::new(chrono::Utc::now())),
            Arc::new(RecordingSleeper::new()),
        );
        directory.replace(CacheData::from_names(["Stripe", "Jane Street"]));

        let filters = JobFilters {
            top_pay_only: true,
            ..JobFilters::default()
        };
        let filter = JobFilter::new(&query(filters, None), Some(directory));
        assert!(filter.is_valid_job("Engineer", "Remote", "Stripe, Inc."));
        assert!(filter.is_valid_job("Engineer", "Remote", "Jane Street"));
        assert!(!filter.is_valid_job("Engineer", "Remote", "Initech"));

        let without_directory = JobFilter::new(&query(filters, None), None);
        assert!(!without_directory.is_valid_job("Engineer", "Remote", "Stripe"));
    }

    #[test]
    fn test_no_filters_accepts_everything() {
        let filter = JobFilter::new(&query(JobFilters::default(), None), None);
        assert!(filter.is_valid_job("Anything", "", ""));
    }
}
