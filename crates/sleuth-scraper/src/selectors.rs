//! Card-based HTML extraction shared by the page scrapers.
//!
//! Each HTML source describes its result cards as ordered selector variants
//! per field. The first variant yielding non-empty text wins, which keeps
//! the scrapers working across the markup revisions the boards serve.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::salary::{json_ld_in, SalaryRange};

/// Selector variants for one source's result cards.
#[derive(Debug, Clone, Copy)]
pub struct CardSpec {
    /// Card containers, tried in order until one matches anything
    pub cards: &'static [&'static str],
    /// Title element variants
    pub title: &'static [&'static str],
    /// Company element variants
    pub company: &'static [&'static str],
    /// Location element variants
    pub location: &'static [&'static str],
    /// Dedicated salary element variants
    pub salary: &'static [&'static str],
    /// Anchor variants whose `href` is the posting link
    pub link: &'static [&'static str],
    /// Free-text sections scanned for salary patterns; empty means the whole card
    pub free_text: &'static [&'static str],
}

/// Raw fields lifted from one result card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFields {
    /// Title text
    pub title: String,
    /// Company text
    pub company: String,
    /// First non-empty line of the company element
    pub company_first_line: String,
    /// Location text
    pub location: String,
    /// Dedicated salary element text
    pub salary: String,
    /// Posting link as found in the markup
    pub href: String,
    /// Concatenated free-text sections
    pub free_text: String,
    /// Embedded JSON-LD salary, if any
    pub structured: Option<SalaryRange>,
    /// Card attributes requested by the caller, in request order
    pub attributes: Vec<Option<String>>,
    /// Whether the card or an inner element carries one of the skip classes
    pub masked: bool,
}

/// Compile a selector, mapping failures to [`ScrapeError::InvalidSelector`].
pub fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn compile_all(selectors: &[&str]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Whitespace-collapsed text of an element.
#[must_use]
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first selector variant that yields non-empty text.
#[must_use]
pub fn first_text(element: &ElementRef<'_>, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .flat_map(|selector| element.select(selector))
        .map(|found| element_text(&found))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// First non-empty line of the first selector variant with any text.
#[must_use]
pub fn first_line(element: &ElementRef<'_>, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .flat_map(|selector| element.select(selector))
        .find_map(|found| {
            found
                .text()
                .collect::<String>()
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// `href` of the first matching anchor variant.
#[must_use]
pub fn first_href(element: &ElementRef<'_>, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .flat_map(|selector| element.select(selector))
        .filter_map(|found| found.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Join a possibly relative link onto `base`.
#[must_use]
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{href}", base.trim_end_matches('/'))
    } else {
        format!("{}/{href}", base.trim_end_matches('/'))
    }
}

struct Compiled {
    cards: Vec<Selector>,
    title: Vec<Selector>,
    company: Vec<Selector>,
    location: Vec<Selector>,
    salary: Vec<Selector>,
    link: Vec<Selector>,
    free_text: Vec<Selector>,
    mask: Vec<Selector>,
}

impl CardSpec {
    fn compile(&self, mask_classes: &[&str]) -> Result<Compiled> {
        let mask: Vec<String> = mask_classes.iter().map(|c| format!(".{c}")).collect();
        let mask: Vec<&str> = mask.iter().map(String::as_str).collect();
        Ok(Compiled {
            cards: compile_all(self.cards)?,
            title: compile_all(self.title)?,
            company: compile_all(self.company)?,
            location: compile_all(self.location)?,
            salary: compile_all(self.salary)?,
            link: compile_all(self.link)?,
            free_text: compile_all(self.free_text)?,
            mask: compile_all(&mask)?,
        })
    }

    /// Extract raw card fields from a result page.
    ///
    /// Card variants are tried in order and the first variant that matches
    /// any element is used. `attributes` names card-level attributes to
    /// capture and `mask_classes` flags cards that carry any of those
    /// classes, sit directly inside such an element, or contain one.
    pub fn parse(
        &self,
        html: &str,
        attributes: &[&str],
        mask_classes: &[&str],
    ) -> Result<Vec<CardFields>> {
        let compiled = self.compile(mask_classes)?;
        let document = Html::parse_document(html);

        let Some(cards) = compiled
            .cards
            .iter()
            .map(|selector| document.select(selector).collect::<Vec<_>>())
            .find(|cards| !cards.is_empty())
        else {
            return Ok(Vec::new());
        };

        Ok(cards
            .iter()
            .map(|card| extract_card(card, &compiled, attributes, mask_classes))
            .collect())
    }
}

fn extract_card(
    card: &ElementRef<'_>,
    compiled: &Compiled,
    attributes: &[&str],
    mask_classes: &[&str],
) -> CardFields {
    let free_text = if compiled.free_text.is_empty() {
        element_text(card)
    } else {
        compiled
            .free_text
            .iter()
            .flat_map(|selector| card.select(selector))
            .map(|section| element_text(&section))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let has_mask_class = |element: &ElementRef<'_>| {
        element
            .value()
            .classes()
            .any(|c| mask_classes.contains(&c))
    };
    let masked = has_mask_class(card)
        || card
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| has_mask_class(&parent))
        || compiled
            .mask
            .iter()
            .any(|selector| card.select(selector).next().is_some());

    CardFields {
        title: first_text(card, &compiled.title),
        company: first_text(card, &compiled.company),
        company_first_line: first_line(card, &compiled.company),
        location: first_text(card, &compiled.location),
        salary: first_text(card, &compiled.salary),
        href: first_href(card, &compiled.link),
        free_text,
        structured: json_ld_in(card),
        attributes: attributes
            .iter()
            .map(|name| card.value().attr(name).map(str::to_string))
            .collect(),
        masked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: CardSpec = CardSpec {
        cards: &["div.new-card", "div.card"],
        title: &["h2.title span", "h2.title"],
        company: &["span.company"],
        location: &["span.location"],
        salary: &["span.pay"],
        link: &["a.primary", "a"],
        free_text: &[],
    };

    const PAGE: &str = r#"
        <html><body>
          <div class="card" data-id="1">
            <h2 class="title"><span>  Backend
               Engineer </span></h2>
            <span class="company">Acme</span>
            <span class="location">Remote</span>
            <a href="/jobs/1">view</a>
            <p>Pay: $150K - $190K</p>
          </div>
          <div class="card hidden-card" data-id="2">
            <h2 class="title">Data Engineer</h2>
            <span class="company">Globex</span>
            <span class="pay">$120,000</span>
            <a class="primary" href="https://globex.example/jobs/2">view</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_falls_through_card_variants() {
        let cards = SPEC.parse(PAGE, &["data-id"], &["hidden-card"]).unwrap();
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].title, "Backend Engineer");
        assert_eq!(cards[0].company, "Acme");
        assert_eq!(cards[0].company_first_line, "Acme");
        assert_eq!(cards[0].location, "Remote");
        assert_eq!(cards[0].href, "/jobs/1");
        assert!(cards[0].free_text.contains("$150K - $190K"));
        assert_eq!(cards[0].attributes, vec![Some("1".to_string())]);
        assert!(!cards[0].masked);

        assert_eq!(cards[1].title, "Data Engineer");
        assert_eq!(cards[1].salary, "$120,000");
        assert_eq!(cards[1].href, "https://globex.example/jobs/2");
        assert!(cards[1].masked);
    }

    #[test]
    fn test_no_cards() {
        let cards = SPEC.parse("<html><body></body></html>", &[], &[]).unwrap();
        assert!(cards.is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let broken = CardSpec {
            cards: &["div[unterminated"],
            ..SPEC
        };
        assert!(matches!(
            broken.parse(PAGE, &[], &[]),
            Err(ScrapeError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://www.monster.com", "/job/123"),
            "https://www.monster.com/job/123"
        );
        assert_eq!(
            absolute_url("https://www.indeed.com/", "rc/clk?jk=1"),
            "https://www.indeed.com/rc/clk?jk=1"
        );
        assert_eq!(
            absolute_url("https://www.indeed.com", "https://other.example/x"),
            "https://other.example/x"
        );
        assert_eq!(absolute_url("https://www.indeed.com", ""), "");
    }
}
