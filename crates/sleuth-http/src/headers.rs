use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, DNT,
    REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

/// Common desktop user agents.
pub const DESKTOP_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Common mobile user agents.
pub const MOBILE_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
];

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Browser-like desktop header set with a random user agent and viewport.
#[must_use]
pub fn random_headers() -> HeaderMap {
    let mut rng = rand::thread_rng();
    let user_agent = DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0]);

    let mut headers = base_headers(user_agent);
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("viewport-width"),
        HeaderValue::from(rng.gen_range(1200_u32..1600)),
    );
    headers.insert(
        HeaderName::from_static("viewport-height"),
        HeaderValue::from(rng.gen_range(800_u32..1200)),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static("\"Google Chrome\";v=\"120\", \"Chromium\";v=\"120\""),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("device-memory"),
        HeaderValue::from_static("8"),
    );
    headers.insert(HeaderName::from_static("dpr"), HeaderValue::from_static("2"));
    headers
}

/// Desktop header set asking for JSON, for the board APIs.
#[must_use]
pub fn json_headers() -> HeaderMap {
    let mut headers = random_headers();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Mobile header set, optionally carrying a referer.
#[must_use]
pub fn mobile_headers(referer: Option<&str>) -> HeaderMap {
    let mut rng = rand::thread_rng();
    let user_agent = MOBILE_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(MOBILE_USER_AGENTS[0]);

    let mut headers = base_headers(user_agent);
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Android\""),
    );

    if let Some(value) = referer.and_then(|r| HeaderValue::from_str(r).ok()) {
        headers.insert(REFERER, value);
    }
    headers
}

fn base_headers(user_agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_random_headers() {
        let headers = random_headers();
        assert!(DESKTOP_USER_AGENTS.contains(&header(&headers, "user-agent")));
        assert_eq!(header(&headers, "accept-language"), "en-US,en;q=0.9");
        assert_eq!(header(&headers, "accept-encoding"), "gzip, deflate");

        let width: u32 = header(&headers, "viewport-width").parse().unwrap();
        let height: u32 = header(&headers, "viewport-height").parse().unwrap();
        assert!((1200..1600).contains(&width));
        assert!((800..1200).contains(&height));
    }

    #[test]
    fn test_header_variation() {
        // Probabilistic, but 20 identical draws from 5 agents and 400 widths is vanishingly rare
        let samples: Vec<_> = (0..20).map(|_| random_headers()).collect();
        let first_ua = header(&samples[0], "user-agent").to_string();
        let first_width = header(&samples[0], "viewport-width").to_string();

        let all_same = samples.iter().all(|h| {
            header(h, "user-agent") == first_ua && header(h, "viewport-width") == first_width
        });
        assert!(!all_same, "Expected variation in header sets");
    }

    #[test]
    fn test_json_headers() {
        let headers = json_headers();
        assert_eq!(header(&headers, "accept"), "application/json");
    }

    #[test]
    fn test_mobile_headers() {
        let headers = mobile_headers(Some("https://www.linkedin.com/jobs"));
        assert!(MOBILE_USER_AGENTS.contains(&header(&headers, "user-agent")));
        assert_eq!(header(&headers, "sec-ch-ua-mobile"), "?1");
        assert_eq!(header(&headers, "referer"), "https://www.linkedin.com/jobs");

        let headers = mobile_headers(None);
        assert!(headers.get("referer").is_none());
    }
}
