use anyhow::Result;
use tracing::{debug, info, warn};

use crate::extract::{Extractor, SkipReason};
use crate::fetch::Fetch;
use crate::subdivision::Subdivision;
use crate::writer::RecordSink;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub subdivisions: usize,
    pub written: usize,
    pub duplicates: usize, // dropped by an appending sink
    pub vacant: usize,
    pub skipped: usize, // mismatched state or malformed listing
}

/// Fetches and drains each subdivision in order, streaming accepted records
/// into `sink`. A failed fetch ends the run; a bad listing only skips itself.
pub fn scrape<F: Fetch + ?Sized>(
    fetcher: &F,
    extractor: &Extractor,
    subdivisions: &[&Subdivision],
    sink: &mut dyn RecordSink,
) -> Result<ScrapeSummary> {
    let mut summary = ScrapeSummary::default();

    for sub in subdivisions {
        let html = fetcher.fetch(sub)?;
        summary.subdivisions += 1;

        let mut accepted = 0usize;
        for outcome in extractor.extract(&html, sub) {
            match outcome {
                Ok(record) => {
                    if sink.write(&record)? {
                        summary.written += 1;
                        accepted += 1;
                    } else {
                        summary.duplicates += 1;
                    }
                }
                Err(skip) if skip.reason == SkipReason::Vacant => {
                    debug!(state = sub.code, listing = skip.index, "vacant seat");
                    summary.vacant += 1;
                }
                Err(skip) => {
                    warn!(state = sub.code, listing = skip.index, reason = %skip.reason, "listing skipped");
                    summary.skipped += 1;
                }
            }
        }
        info!(state = sub.code, records = accepted, "subdivision done");
    }

    Ok(summary)
}
