//! Salary extraction.
//!
//! Precedence, first hit wins:
//! 1. a structured salary field (board API range or JSON-LD `baseSalary`)
//! 2. a metadata field whose name mentions salary or compensation
//! 3. the first free-text pattern match, tried in [`SALARY_PATTERNS`] order
//!
//! Anything else yields [`NOT_AVAILABLE`].

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::Value;
use sleuth_core::{has_value, NOT_AVAILABLE};
use sleuth_enrich::format::with_commas;

/// Free-text salary patterns, in priority order.
pub const SALARY_PATTERNS: [&str; 6] = [
    r"\$\d{2,3}K\s*-\s*\$\d{2,3}K",
    r"\$\d{2,3},\d{3}\s*-\s*\$\d{2,3},\d{3}",
    r"\$\d{2,3}K",
    r"\$\d{2,3},\d{3}",
    r"\$\d{2,3}(?:\.\d{2})?\s*(?:per hour|/hr|/hour)",
    r"\$\d{2,3}(?:,\d{3})?\s*(?:per year|/year|annual|annually)",
];

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SALARY_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
            .collect()
    })
}

/// A structured compensation range.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRange {
    /// Lower bound, zero when absent
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Pay interval such as `year` or `hour`
    pub interval: String,
}

impl SalaryRange {
    /// Build a range, defaulting the interval to `year`.
    #[must_use]
    pub fn new(min: f64, max: f64, interval: Option<&str>) -> Self {
        let interval = interval
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map_or_else(|| "year".to_string(), str::to_lowercase);
        Self { min, max, interval }
    }

    /// Render as `$min - $max/interval`, or `$max/interval` for a single figure.
    ///
    /// Returns `None` when there is no positive upper bound.
    #[must_use]
    pub fn format(&self) -> Option<String> {
        if self.max <= 0.0 {
            return None;
        }
        #[allow(clippy::float_cmp)]
        let single = self.min <= 0.0 || self.min == self.max;
        Some(if single {
            format!("${}/{}", format_amount(self.max), self.interval)
        } else {
            format!(
                "${} - ${}/{}",
                format_amount(self.min),
                format_amount(self.max),
                self.interval
            )
        })
    }
}

/// Pick a salary string using the extraction precedence.
pub fn extract<'a>(
    structured: Option<&SalaryRange>,
    metadata: impl IntoIterator<Item = (&'a str, &'a str)>,
    free_text: &str,
) -> String {
    if let Some(formatted) = structured.and_then(SalaryRange::format) {
        return formatted;
    }

    let from_metadata = metadata.into_iter().find_map(|(name, value)| {
        let name = name.to_lowercase();
        let value = value.trim();
        ((name.contains("salary") || name.contains("compensation")) && has_value(value))
            .then(|| value.to_string())
    });
    if let Some(value) = from_metadata {
        return value;
    }

    find_in_text(free_text).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// First free-text salary match, preserving the original casing.
#[must_use]
pub fn find_in_text(text: &str) -> Option<String> {
    patterns()
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

/// Parse a JSON-LD document's `baseSalary` into a range.
///
/// Accepts a bare object, an array of objects, or an `@graph` wrapper.
#[must_use]
pub fn from_json_ld(json: &str) -> Option<SalaryRange> {
    let value: Value = serde_json::from_str(json).ok()?;
    base_salary(&value)
}

fn base_salary(value: &Value) -> Option<SalaryRange> {
    match value {
        Value::Array(items) => items.iter().find_map(base_salary),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                return base_salary(graph);
            }
            let salary = map.get("baseSalary")?;
            let quantity = salary.get("value").unwrap_or(salary);
            match quantity {
                Value::Number(n) => Some(SalaryRange::new(0.0, n.as_f64()?, None)),
                Value::Object(q) => {
                    let max = number(q.get("maxValue")).or_else(|| number(q.get("value")))?;
                    let min = number(q.get("minValue")).unwrap_or(0.0);
                    let unit = q.get("unitText").and_then(Value::as_str);
                    Some(SalaryRange::new(min, max, unit))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        with_commas(amount as u64)
    } else {
        format!("{amount:.2}")
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

/// JSON-LD salary embedded anywhere under `element`.
#[must_use]
pub fn json_ld_in(element: &ElementRef<'_>) -> Option<SalaryRange> {
    static SCRIPT: OnceLock<Option<Selector>> = OnceLock::new();
    let selector = SCRIPT
        .get_or_init(|| Selector::parse("script[type='application/ld+json']").ok())
        .as_ref()?;
    element
        .select(selector)
        .find_map(|script| from_json_ld(&script.text().collect::<String>()))
}
