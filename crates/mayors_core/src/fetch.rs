use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::subdivision::Subdivision;

/// Source of one subdivision's raw search results page.
pub trait Fetch {
    fn fetch(&self, subdivision: &Subdivision) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
    search_url: String,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            search_url: source.search_url.clone(),
            user_agent: source.user_agent.clone(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, subdivision: &Subdivision) -> Result<String> {
        info!(state = subdivision.code, url = %self.search_url, "searching directory");
        let form = [("submit", "Search"), ("searchTerm", subdivision.name)];
        let response = self
            .client
            .post(&self.search_url)
            .header(USER_AGENT, &self.user_agent)
            .form(&form)
            .send()
            .with_context(|| format!("requesting {} listing", subdivision.code))?
            .error_for_status()
            .with_context(|| format!("search for {} failed", subdivision.code))?;
        let body = response
            .bytes()
            .with_context(|| format!("reading {} listing", subdivision.code))?;
        Ok(decode_latin1(&body))
    }
}

/// The directory serves Latin-1; every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Serves a subdivision from `<dir>/<CODE>-<YYYY-MM-DD>.html` when that file
/// exists, otherwise fetches and stores it. Files from other days are left alone.
pub struct CachedFetcher<F> {
    inner: F,
    dir: PathBuf,
    today: Date,
}

impl<F: Fetch> CachedFetcher<F> {
    pub fn new(inner: F, dir: impl Into<PathBuf>) -> Self {
        Self::for_date(inner, dir, local_today())
    }

    pub fn for_date(inner: F, dir: impl Into<PathBuf>, today: Date) -> Self {
        Self {
            inner,
            dir: dir.into(),
            today,
        }
    }

    pub fn cache_path(&self, subdivision: &Subdivision) -> PathBuf {
        cache_file_path(&self.dir, subdivision, self.today)
    }
}

impl<F: Fetch> Fetch for CachedFetcher<F> {
    fn fetch(&self, subdivision: &Subdivision) -> Result<String> {
        let path = self.cache_path(subdivision);
        if path.is_file() {
            debug!(state = subdivision.code, path = %path.display(), "day-cache hit");
            return fs::read_to_string(&path)
                .with_context(|| format!("reading cache file {}", path.display()));
        }

        debug!(state = subdivision.code, path = %path.display(), "day-cache miss");
        let body = self.inner.fetch(subdivision)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache dir {}", self.dir.display()))?;
        fs::write(&path, &body).with_context(|| format!("writing cache file {}", path.display()))?;
        Ok(body)
    }
}

/// Today's local date. The local offset is unreadable once the process has
/// spawned threads on some platforms; UTC is used then.
pub fn local_today() -> Date {
    match OffsetDateTime::now_local() {
        Ok(now) => now.date(),
        Err(err) => {
            let today = OffsetDateTime::now_utc().date();
            debug!(error = %err, %today, "local offset unavailable, dating cache by UTC");
            today
        }
    }
}

pub fn cache_file_path(dir: &Path, subdivision: &Subdivision, day: Date) -> PathBuf {
    let stamp = day
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string());
    dir.join(format!("{}-{}.html", subdivision.code, stamp))
}
