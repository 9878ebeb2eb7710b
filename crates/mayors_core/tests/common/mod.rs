#![allow(dead_code)]

use anyhow::{Result, anyhow};
use mayors_core::extract::Extractor;
use mayors_core::fetch::Fetch;
use mayors_core::schema::MayorRecord;
use mayors_core::subdivision::Subdivision;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn load_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", relative))
}

pub fn extractor() -> Extractor {
    Extractor::new(mayors_core::config::DEFAULT_BASE_URL).unwrap()
}

/// Serves canned pages by subdivision code and records every request.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, code: &str, html: impl Into<String>) -> Self {
        self.pages.insert(code.to_string(), html.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetch for FakeFetcher {
    fn fetch(&self, subdivision: &Subdivision) -> Result<String> {
        self.calls.borrow_mut().push(subdivision.code.to_string());
        self.pages
            .get(subdivision.code)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found for {}", subdivision.code))
    }
}

/// Wraps listing fragments in the page chrome the directory serves.
pub fn page(listings: &[&str]) -> String {
    format!(
        "<html><body><div class=\"post-content\">{}</div></body></html>",
        listings.join("\n")
    )
}

pub fn listing(name: &str, city_state: &str, population: &str) -> String {
    format!(
        "<ul>\
         <li><img src=\"/img/{slug}.jpg\"></li>\
         <li><b>{name}</b></li>\
         <li>{city_state}</li>\
         <li>Population: {population}</li>\
         <li><a href=\"https://city.example/{slug}\">Web Site</a></li>\
         <li>Next Election Date: 11/03/2026</li>\
         <li><a href=\"https://www.usmayors.org/mayors/{slug}/\">Bio</a></li>\
         <li>Phone: <a href=\"tel:555-0100\">555-0100</a></li>\
         <li>Email: <a href=\"mailto:{slug}@city.example\">{slug}@city.example</a></li>\
         </ul>",
        slug = name.to_lowercase().replace(' ', "-"),
    )
}

pub fn record(name: &str, city: &str, state: &str) -> MayorRecord {
    MayorRecord {
        name: name.to_string(),
        email: Some(format!("{}@city.example", name.to_lowercase())),
        phone: Some("555-0100".to_string()),
        bio_url: None,
        img_url: None,
        city: city.to_string(),
        state: state.to_string(),
        population: Some("1000".to_string()),
        city_site_url: None,
        next_election: None,
    }
}
