//! Cross-source deduplication.

use std::collections::HashMap;

use sleuth_core::JobPosting;

fn normalize_part(value: &str) -> String {
    value
        .to_lowercase()
        .replace([',', '.'], "")
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dedup key: normalized company and title joined by `|`.
#[must_use]
pub fn dedup_key(company: &str, title: &str) -> String {
    format!("{}|{}", normalize_part(company), normalize_part(title))
}

/// Collapse postings that share a dedup key.
///
/// The first posting for a key keeps its position. A later duplicate replaces
/// it only when the kept posting has no salary and the newcomer does.
#[must_use]
pub fn dedup(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut kept: Vec<JobPosting> = Vec::with_capacity(postings.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(postings.len());

    for posting in postings {
        let key = dedup_key(&posting.company, &posting.title);
        match index.get(&key) {
            Some(&slot) => {
                if !kept[slot].has_salary() && posting.has_salary() {
                    kept[slot] = posting;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(posting);
            }
        }
    }

    kept
}
