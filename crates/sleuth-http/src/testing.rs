//! Scripted [`Fetcher`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{HttpError, Result};
use crate::fetcher::{FetchedPage, Fetcher, PageRequest};

#[derive(Debug, Clone)]
enum Scripted {
    Page(FetchedPage),
    Failure(String),
}

#[derive(Debug, Default)]
struct Route {
    responses: Vec<Scripted>,
    served: usize,
}

impl Route {
    fn next(&mut self) -> Option<Scripted> {
        let index = self.served.min(self.responses.len().checked_sub(1)?);
        self.served += 1;
        self.responses.get(index).cloned()
    }
}

/// Fetcher that replays canned responses keyed by URL prefix.
///
/// The longest matching prefix wins. Each route serves its responses in
/// order and then keeps repeating the last one. Unmatched URLs get a 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Route>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a single response for every URL starting with `prefix`.
    #[must_use]
    pub fn route(self, prefix: &str, status: u16, body: &str) -> Self {
        self.push(prefix, Scripted::Page(FetchedPage::new(status, body)));
        self
    }

    /// Serve `pages` in order for `prefix`, repeating the last.
    #[must_use]
    pub fn sequence(self, prefix: &str, pages: Vec<(u16, &str)>) -> Self {
        for (status, body) in pages {
            self.push(prefix, Scripted::Page(FetchedPage::new(status, body)));
        }
        self
    }

    /// Fail with a transport error for `prefix`.
    #[must_use]
    pub fn failure(self, prefix: &str, reason: &str) -> Self {
        self.push(prefix, Scripted::Failure(reason.to_string()));
        self
    }

    /// Every URL requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().expect("acquire fetch log lock").clone()
    }

    /// Number of requests whose URL starts with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .expect("acquire fetch log lock")
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    fn push(&self, prefix: &str, response: Scripted) {
        self.routes
            .lock()
            .expect("acquire routes lock")
            .entry(prefix.to_string())
            .or_default()
            .responses
            .push(response);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage> {
        self.log
            .lock()
            .expect("acquire fetch log lock")
            .push(request.url.clone());

        let scripted = {
            let mut routes = self.routes.lock().expect("acquire routes lock");
            let prefix = routes
                .keys()
                .filter(|p| request.url.starts_with(p.as_str()))
                .max_by_key(|p| p.len())
                .cloned();
            prefix.and_then(|p| routes.get_mut(&p).and_then(Route::next))
        };

        match scripted {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Failure(reason)) => Err(HttpError::Request {
                url: request.url.clone(),
                reason,
            }),
            None => Ok(FetchedPage::new(404, "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    fn get(url: &str) -> PageRequest {
        PageRequest::new(url, HeaderMap::new())
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let fetcher = ScriptedFetcher::new()
            .route("https://jobs.example.com/", 200, "generic")
            .route("https://jobs.example.com/acme", 200, "acme");

        let page = fetcher.fetch(&get("https://jobs.example.com/acme/1")).await.unwrap();
        assert_eq!(page.body, "acme");

        let page = fetcher.fetch(&get("https://jobs.example.com/other")).await.unwrap();
        assert_eq!(page.body, "generic");
    }

    #[tokio::test]
    async fn test_sequence_repeats_last() {
        let fetcher = ScriptedFetcher::new().sequence(
            "https://jobs.example.com",
            vec![(429, ""), (200, "ok")],
        );

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let page = fetcher.fetch(&get("https://jobs.example.com/page")).await.unwrap();
            statuses.push(page.status);
        }
        assert_eq!(statuses, vec![429, 200, 200]);
        assert_eq!(fetcher.count("https://jobs.example.com"), 3);
    }

    #[tokio::test]
    async fn test_unmatched_is_not_found() {
        let fetcher = ScriptedFetcher::new();
        let page = fetcher.fetch(&get("https://nowhere.example.com")).await.unwrap();
        assert_eq!(page.status, 404);
        assert_eq!(fetcher.requests(), vec!["https://nowhere.example.com"]);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let fetcher = ScriptedFetcher::new().failure("https://down.example.com", "connection refused");
        let err = fetcher.fetch(&get("https://down.example.com/x")).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
