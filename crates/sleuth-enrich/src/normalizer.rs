//! Canonical company keys.
//!
//! Every comparison of company names in the workspace goes through
//! [`normalize`], so there is exactly one alias table.

use std::sync::OnceLock;

use regex::Regex;

/// Trailing tokens that carry no identity ("Acme Inc" == "Acme").
const SUFFIX_TOKENS: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "llc",
    "ltd",
    "limited",
    "co",
    "company",
    "technologies",
    "technology",
    "plc",
    "gmbh",
];

/// Known aliases, keyed by already-collapsed names.
///
/// Targets are never keys themselves, which keeps [`normalize`] idempotent.
const ALIASES: &[(&str, &str)] = &[
    ("facebook", "meta"),
    ("metaplatforms", "meta"),
    ("alphabet", "google"),
    ("googlellc", "google"),
    ("twitter", "x"),
    ("xcorp", "x"),
    ("amazoncom", "amazon"),
    ("amazonwebservices", "amazon"),
    ("aws", "amazon"),
    ("squareup", "block"),
    ("square", "block"),
    ("bytedanceltd", "bytedance"),
    ("tiktok", "bytedance"),
    ("snapchat", "snap"),
    ("cruiseautomation", "cruise"),
    ("waymollc", "waymo"),
    ("jpmorganchase", "jpmorgan"),
    ("jpmorganchaseco", "jpmorgan"),
];

/// Levels.fyi uses the pre-rename slug for some companies.
const LEVELS_SLUG_OVERRIDES: &[(&str, &str)] = &[("meta", "facebook")];

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid separator regex"))
}

/// Canonicalize a company display name into a comparison key.
///
/// Lowercases, drops punctuation and whitespace, strips trailing legal
/// suffixes while more than one token remains, then resolves aliases.
#[must_use]
pub fn normalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut tokens: Vec<&str> = separator_regex()
        .split(&lower)
        .filter(|t| !t.is_empty())
        .collect();

    while tokens.len() > 1 && tokens.last().is_some_and(|t| SUFFIX_TOKENS.contains(t)) {
        tokens.pop();
    }

    let collapsed = tokens.concat();
    resolve_alias(&collapsed).map_or(collapsed, str::to_string)
}

fn resolve_alias(key: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| *target)
}

/// URL slug used on levels.fyi company pages.
#[must_use]
pub fn levels_slug(name: &str) -> String {
    let key = normalize(name);
    if let Some((_, slug)) = LEVELS_SLUG_OVERRIDES.iter().find(|(k, _)| *k == key) {
        return (*slug).to_string();
    }

    let lower = name.trim().to_lowercase();
    let slug: Vec<&str> = separator_regex()
        .split(&lower)
        .filter(|t| !t.is_empty())
        .collect();
    slug.join("-")
}
