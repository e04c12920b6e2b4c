//! Stable job identifiers.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Longest identifier produced by [`stable_id`].
pub const MAX_ID_LEN: usize = 100;

const HASH_SUFFIX_LEN: usize = 16;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new("[^a-z0-9]+").expect("valid separator regex"))
}

/// Deterministic identifier for a `(company, title, url)` triple.
///
/// The triple is lowercased and slugged. Slugs longer than [`MAX_ID_LEN`]
/// are cut and suffixed with a hash of the full slug, so two long URLs that
/// share a prefix still get distinct IDs.
#[must_use]
pub fn stable_id(company: &str, title: &str, url: &str) -> String {
    let joined = format!("{company}|{title}|{url}").to_lowercase();
    let slug = separator().replace_all(&joined, "-");
    let slug = slug.trim_matches('-');

    if slug.len() <= MAX_ID_LEN {
        return slug.to_string();
    }

    let digest = hex::encode(Sha256::digest(slug.as_bytes()));
    let keep = MAX_ID_LEN - HASH_SUFFIX_LEN - 1;
    format!(
        "{}-{}",
        slug[..keep].trim_end_matches('-'),
        &digest[..HASH_SUFFIX_LEN]
    )
}
