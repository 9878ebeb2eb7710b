//! Field extraction from one subdivision's search results page.
//!
//! Each mayor is listed in its own `<ul>` inside `div.post-content`:
//!
//! ```text
//! <img src=...>
//! <b>Ethan Berkowitz</b>
//! Anchorage, AK
//! Population: 291,538
//! <a href=...>Web Site</a>
//! Next Election Date: 04/06/2021
//! <a href=...>Bio</a>
//! Phone: <a href="tel:...">...</a>
//! Email: <a href="mailto:...">...</a>
//! ```
//!
//! Fields are keyed by their label text. Position is only used when a
//! label is missing.

use anyhow::{Context, Result};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::email::{self, EMAIL_PROTECTION_PREFIX, EmailDecodeError};
use crate::schema::MayorRecord;
use crate::subdivision::Subdivision;

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.post-content ul").expect("static selector"));
static BOLD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").expect("static selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("static selector"));
static CF_EMAIL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-cfemail]").expect("static selector"));

const POPULATION_LABEL: &str = "Population:";
const ELECTION_LABEL: &str = "Next Election Date:";
const SITE_LABELS: &[&str] = &["web site", "website"];
const BIO_LABELS: &[&str] = &["bio", "biography"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("vacant seat (no name)")]
    Vacant,
    #[error("no \"City, ST\" line")]
    MissingCityState,
    #[error("listed under {found}, expected {expected}")]
    StateMismatch { expected: String, found: String },
    #[error("undecodable email: {0}")]
    MalformedEmail(#[from] EmailDecodeError),
}

/// A container that produced no record, with its position on the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listing #{index}: {reason}")]
pub struct Skip {
    pub index: usize,
    pub reason: SkipReason,
}

pub type Outcome = std::result::Result<MayorRecord, Skip>;

pub struct Extractor {
    base_url: Url,
}

impl Extractor {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
        Ok(Self { base_url })
    }

    /// One outcome per listing container, in page order.
    pub fn extract(&self, html: &str, expected: &Subdivision) -> Vec<Outcome> {
        let document = Html::parse_document(html);
        document
            .select(&CONTAINER)
            .enumerate()
            .map(|(index, node)| {
                self.extract_listing(node, expected)
                    .map_err(|reason| Skip { index, reason })
            })
            .collect()
    }

    fn extract_listing(
        &self,
        node: ElementRef<'_>,
        expected: &Subdivision,
    ) -> std::result::Result<MayorRecord, SkipReason> {
        // 1) Name from the bold marker; blank means the seat is vacant
        let name = node
            .select(&BOLD)
            .next()
            .map(|b| collapse_ws(&b.text().collect::<String>()))
            .filter(|n| !n.is_empty())
            .ok_or(SkipReason::Vacant)?;

        let lines: Vec<String> = node
            .text()
            .map(collapse_ws)
            .filter(|s| !s.is_empty())
            .collect();

        // 2) City and state, re-validated against the subdivision queried
        let (city, state) = lines
            .iter()
            .filter(|l| **l != name)
            .find_map(|l| split_city_state(l))
            .or_else(|| lines.get(1).and_then(|l| l.rsplit_once(", ")))
            .map(|(c, s)| (c.trim().to_string(), s.trim().to_string()))
            .ok_or(SkipReason::MissingCityState)?;
        if state != expected.code {
            return Err(SkipReason::StateMismatch {
                expected: expected.code.to_string(),
                found: state,
            });
        }

        let population = labeled(&lines, POPULATION_LABEL)
            .and_then(normalize_population)
            .or_else(|| lines.get(2).and_then(|l| normalize_population(l)));

        let next_election = match labeled(&lines, ELECTION_LABEL) {
            Some(raw) => parse_election_date(raw),
            None => lines.iter().find_map(|l| parse_election_date(l)),
        };

        // 3) Anchors: phone and email by scheme, the rest by link text
        let mut phone = None;
        let mut email = None;
        let mut others: Vec<(String, String)> = Vec::new();
        for a in node.select(&ANCHOR) {
            let href = a.value().attr("href").unwrap_or_default().trim();
            if let Some(number) = strip_prefix_ci(href, "tel:") {
                if phone.is_none() {
                    phone = non_empty(number.trim());
                }
            } else if strip_prefix_ci(href, "mailto:").is_some()
                || href.contains(EMAIL_PROTECTION_PREFIX.trim_end_matches('#'))
            {
                if email.is_none() {
                    email = decode_anchor_email(a, href)?;
                }
            } else if !href.is_empty() {
                others.push((href.to_string(), collapse_ws(&a.text().collect::<String>())));
            }
        }

        let site_at = others.iter().position(|(_, text)| has_label(text, SITE_LABELS));
        let bio_at = others.iter().position(|(_, text)| has_label(text, BIO_LABELS));
        let mut unlabeled = others
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != site_at && Some(*i) != bio_at)
            .map(|(_, (href, _))| href.clone());
        let city_site_url = site_at.map(|i| others[i].0.clone()).or_else(|| unlabeled.next());
        let bio_url = bio_at.map(|i| others[i].0.clone()).or_else(|| unlabeled.next());

        // 4) Portrait, made absolute
        let img_url = node
            .select(&IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(|src| self.resolve(src));

        Ok(MayorRecord {
            name,
            email,
            phone,
            bio_url,
            img_url,
            city,
            state,
            population,
            city_site_url,
            next_election,
        })
    }

    fn resolve(&self, src: &str) -> String {
        self.base_url
            .join(src)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| src.to_string())
    }
}

fn decode_anchor_email(
    a: ElementRef<'_>,
    href: &str,
) -> std::result::Result<Option<String>, SkipReason> {
    // Cloudflare variant that keeps the token in an attribute instead of the href
    let attr_token = a
        .value()
        .attr("data-cfemail")
        .or_else(|| a.select(&CF_EMAIL).find_map(|e| e.value().attr("data-cfemail")));
    let decoded = match attr_token {
        Some(token) if !href.contains(EMAIL_PROTECTION_PREFIX) => email::decode_token(token)?,
        _ => {
            let value = strip_prefix_ci(href, "mailto:").unwrap_or(href);
            let value = value.split('?').next().unwrap_or_default();
            email::decode_email(value.trim())?
        }
    };
    Ok(non_empty(decoded.trim()))
}

/// Strips the label and thousands separators: `"Population: 291,538"` -> `"291538"`.
/// Values that are not a number are dropped.
pub fn normalize_population(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix(POPULATION_LABEL).unwrap_or(raw);
    let digits: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    non_empty(&digits)
}

/// `MM/DD/YYYY` (label optional) to ISO `YYYY-MM-DD`. Anything else is `None`.
pub fn parse_election_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix(ELECTION_LABEL).unwrap_or(raw).trim();
    if raw.is_empty() {
        return None;
    }
    let input = format_description!("[month padding:none]/[day padding:none]/[year]");
    let output = format_description!("[year]-[month]-[day]");
    Date::parse(raw, input).ok()?.format(output).ok()
}

/// `"Anchorage, AK"` -> `("Anchorage", "AK")`; the state part must be a
/// two-letter uppercase code.
pub fn split_city_state(line: &str) -> Option<(&str, &str)> {
    let (city, state) = line.rsplit_once(", ")?;
    let state = state.trim();
    let is_code = state.len() == 2 && state.chars().all(|c| c.is_ascii_uppercase());
    (is_code && !city.trim().is_empty()).then_some((city.trim(), state))
}

/// Value after `label`, or the following line when the label stands alone.
fn labeled<'a>(lines: &'a [String], label: &str) -> Option<&'a str> {
    let at = lines.iter().position(|l| l.starts_with(label))?;
    let value = lines[at][label.len()..].trim();
    if value.is_empty() {
        lines.get(at + 1).map(String::as_str)
    } else {
        Some(value)
    }
}

fn has_label(text: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| text.eq_ignore_ascii_case(l))
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
