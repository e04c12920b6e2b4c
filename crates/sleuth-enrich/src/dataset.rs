//! Bundled compensation figures used when the cache has no fresh entry.
//!
//! Figures are median total compensation for US software engineers and are
//! keyed by [`normalize`]d company name.

use crate::normalizer::normalize;

/// Minimum key length for substring matching; shorter keys match too much.
const MIN_SUBSTRING_LEN: usize = 5;

/// Trailing name fragments tried after an exact miss ("Scale AI" -> "scale").
const DATASET_SUFFIXES: &[&str] = &["labs", "ai", "hq", "group", "holdings", "global", "io"];

const COMPENSATION: &[(&str, &str)] = &[
    ("airbnb", "$310,000"),
    ("amazon", "$245,000"),
    ("anthropic", "$420,000"),
    ("apple", "$265,000"),
    ("atlassian", "$230,000"),
    ("block", "$265,000"),
    ("brex", "$250,000"),
    ("bytedance", "$280,000"),
    ("citadel", "$400,000"),
    ("cloudflare", "$235,000"),
    ("coinbase", "$300,000"),
    ("databricks", "$330,000"),
    ("datadog", "$260,000"),
    ("discord", "$280,000"),
    ("doordash", "$290,000"),
    ("dropbox", "$275,000"),
    ("figma", "$300,000"),
    ("google", "$300,000"),
    ("hudsonrivertrading", "$410,000"),
    ("instacart", "$260,000"),
    ("janestreet", "$450,000"),
    ("linkedin", "$270,000"),
    ("lyft", "$265,000"),
    ("meta", "$330,000"),
    ("microsoft", "$230,000"),
    ("netflix", "$500,000"),
    ("notion", "$290,000"),
    ("nvidia", "$310,000"),
    ("openai", "$560,000"),
    ("oracle", "$200,000"),
    ("palantir", "$230,000"),
    ("pinterest", "$280,000"),
    ("plaid", "$270,000"),
    ("reddit", "$285,000"),
    ("rippling", "$265,000"),
    ("robinhood", "$300,000"),
    ("roblox", "$360,000"),
    ("salesforce", "$240,000"),
    ("scale", "$280,000"),
    ("snap", "$300,000"),
    ("snowflake", "$320,000"),
    ("stripe", "$330,000"),
    ("twosigma", "$380,000"),
    ("uber", "$290,000"),
    ("waymo", "$300,000"),
];

/// Look up a bundled compensation figure.
///
/// Tries the exact key, then the key with a trailing fragment removed, then
/// the longest dataset key contained in (or containing) the query.
#[must_use]
pub fn lookup(company: &str) -> Option<&'static str> {
    let key = normalize(company);
    if key.is_empty() {
        return None;
    }

    if let Some(salary) = exact(&key) {
        return Some(salary);
    }

    for suffix in DATASET_SUFFIXES {
        if let Some(stem) = key.strip_suffix(suffix) {
            if let Some(salary) = (!stem.is_empty()).then(|| exact(stem)).flatten() {
                return Some(salary);
            }
        }
    }

    if key.len() < MIN_SUBSTRING_LEN {
        return None;
    }

    COMPENSATION
        .iter()
        .filter(|(k, _)| k.len() >= MIN_SUBSTRING_LEN)
        .filter(|(k, _)| key.contains(k) || k.contains(key.as_str()))
        .max_by_key(|(k, _)| k.len())
        .map(|(_, salary)| *salary)
}

fn exact(key: &str) -> Option<&'static str> {
    COMPENSATION
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, salary)| *salary)
}

/// Number of companies in the bundled dataset.
#[must_use]
pub fn len() -> usize {
    COMPENSATION.len()
}
