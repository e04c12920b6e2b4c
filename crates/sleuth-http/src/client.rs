//! reqwest-backed [`Fetcher`] with proxy support and manual body decoding.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::{GzDecoder, ZlibDecoder};
use reqwest::header::CONTENT_ENCODING;
use reqwest::Client;
use sleuth_core::NetworkConfig;
use tracing::debug;
use url::Url;

use crate::error::{HttpError, Result};
use crate::fetcher::{FetchedPage, Fetcher, PageRequest};

/// Shared HTTP client used by every scraper and the enrichment layer.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    /// Build a client with an optional proxy and a per-request timeout.
    ///
    /// TLS certificate verification is disabled so traffic can be routed
    /// through an intercepting proxy.
    pub fn new(proxy: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout);

        if let Some(proxy_url) = proxy {
            validate_proxy(proxy_url)?;
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| HttpError::InvalidProxy {
                url: proxy_url.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
            debug!(proxy = %proxy_url, "Routing requests through proxy");
        }

        let client = builder
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Build a client from the `[network]` config section.
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        Self::new(config.proxy_url.as_deref(), config.timeout())
    }
}

#[async_trait]
impl Fetcher for RequestClient {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage> {
        let request_error = |e: reqwest::Error| HttpError::Request {
            url: request.url.clone(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(&request.url)
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status().as_u16();
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let bytes = response.bytes().await.map_err(request_error)?;
        let body = decode_body(&bytes, encoding.as_deref())?;

        debug!(url = %request.url, status, bytes = bytes.len(), "Fetched page");
        Ok(FetchedPage { status, body })
    }
}

fn validate_proxy(proxy_url: &str) -> Result<()> {
    let invalid = |reason: &str| HttpError::InvalidProxy {
        url: proxy_url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(proxy_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(())
}

/// Inflate a response body according to its `Content-Encoding`.
///
/// Unknown or absent encodings are passed through as lossy UTF-8.
pub fn decode_body(bytes: &[u8], encoding: Option<&str>) -> Result<String> {
    let decode_error = |enc: &str, e: std::io::Error| HttpError::Decode {
        encoding: enc.to_string(),
        reason: e.to_string(),
    };

    match encoding.map(str::trim) {
        Some(enc @ ("gzip" | "x-gzip")) => {
            let mut raw = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut raw)
                .map_err(|e| decode_error(enc, e))?;
            Ok(String::from_utf8_lossy(&raw).into_owned())
        }
        Some(enc @ "deflate") => {
            let mut raw = Vec::new();
            ZlibDecoder::new(bytes)
                .read_to_end(&mut raw)
                .map_err(|e| decode_error(enc, e))?;
            Ok(String::from_utf8_lossy(&raw).into_owned())
        }
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_client_without_proxy() {
        let client = RequestClient::new(None, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_valid_proxy() {
        let client = RequestClient::new(Some("http://127.0.0.1:8080"), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_bad_proxy() {
        for bad in ["not a url", "ftp://127.0.0.1:21", "socks9://proxy:1080"] {
            let err = RequestClient::new(Some(bad), Duration::from_secs(5)).unwrap_err();
            assert!(
                matches!(err, HttpError::InvalidProxy { .. }),
                "expected InvalidProxy for {bad}, got {err:?}"
            );
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = NetworkConfig::default();
        assert!(RequestClient::from_config(&config).is_ok());

        config.proxy_url = Some("http://".to_string());
        assert!(RequestClient::from_config(&config).is_err());
    }

    #[test]
    fn test_decode_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<html>Salary: $150K</html>").unwrap();
        let compressed = encoder.finish().unwrap();

        let body = decode_body(&compressed, Some("gzip")).unwrap();
        assert_eq!(body, "<html>Salary: $150K</html>");
    }

    #[test]
    fn test_decode_deflate() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"jobs\":[]}").unwrap();
        let compressed = encoder.finish().unwrap();

        let body = decode_body(&compressed, Some("deflate")).unwrap();
        assert_eq!(body, "{\"jobs\":[]}");
    }

    #[test]
    fn test_decode_identity() {
        assert_eq!(decode_body(b"plain", None).unwrap(), "plain");
        assert_eq!(decode_body(b"plain", Some("identity")).unwrap(), "plain");
    }

    #[test]
    fn test_decode_corrupt_gzip() {
        let err = decode_body(b"definitely not gzip", Some("gzip")).unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
    }
}
