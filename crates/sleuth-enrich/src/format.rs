//! Compensation figure formatting.

use std::sync::OnceLock;

use regex::Regex;
use sleuth_core::{NOT_AVAILABLE, NO_DATA};

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(k)?").expect("valid amount regex")
    })
}

/// Parse a single figure such as `$245,000`, `245000` or `$245K`.
///
/// Returns `None` for ranges, text and anything else that is not one number.
#[must_use]
pub fn parse_amount(value: &str) -> Option<u64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let (digits, multiplier) = match cleaned.strip_suffix(['k', 'K']) {
        Some(stripped) => (stripped, 1000),
        None => (cleaned.as_str(), 1),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Render a figure as `$NNN,NNN`.
///
/// Sentinels, empty strings and unparseable text pass through unchanged.
#[must_use]
pub fn format_salary(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE || trimmed == NO_DATA {
        return value.to_string();
    }
    match parse_amount(trimmed) {
        Some(amount) if amount > 0 => format!("${}", with_commas(amount)),
        _ => value.to_string(),
    }
}

/// Leading numeric value of a salary string, for sorting.
///
/// `"$120K - $150K"` sorts as 120000; text without digits sorts as 0.
#[must_use]
pub fn numeric_value(value: &str) -> u64 {
    let Some(caps) = amount_regex().captures(value) else {
        return 0;
    };
    let digits: String = caps[1].chars().take_while(|c| *c != '.').filter(char::is_ascii_digit).collect();
    let base = digits.parse::<u64>().unwrap_or(0);
    if caps.get(2).is_some() {
        base.saturating_mul(1000)
    } else {
        base
    }
}

/// Insert thousands separators.
#[must_use]
pub fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
