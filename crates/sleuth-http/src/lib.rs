//! SalarySleuth HTTP - request plumbing shared by scrapers and enrichment.
//!
//! # Modules
//!
//! - [`fetcher`] - The `Fetcher` trait every network consumer goes through
//! - [`client`] - reqwest implementation with proxy validation and gzip/deflate decoding
//! - [`headers`] - Randomized desktop, mobile and JSON header sets
//! - [`error`] - HTTP error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod fetcher;
pub mod headers;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use client::{decode_body, RequestClient};
pub use error::{HttpError, Result};
pub use fetcher::{FetchedPage, Fetcher, PageRequest};
pub use headers::{json_headers, mobile_headers, random_headers};

#[cfg(any(test, feature = "testing"))]
pub use testing::ScriptedFetcher;
