use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, Writer};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::{CSV_FIELDS, MayorRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized output format {0:?} (expected csv or json)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` is standard output.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    /// Explicit format wins; otherwise the file extension decides and stdout is CSV.
    pub fn resolve_format(&self, explicit: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = explicit {
            return Ok(format);
        }
        match self {
            Self::Stdout => Ok(OutputFormat::Csv),
            Self::File(path) => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .ok_or_else(|| {
                        anyhow!("cannot infer format of {}; pass --format", path.display())
                    })?;
                ext.parse::<OutputFormat>()
                    .with_context(|| format!("cannot infer format of {}; pass --format", path.display()))
            }
        }
    }
}

/// Accepts records one at a time; `finish` must be called once at the end.
pub trait RecordSink {
    fn write(&mut self, record: &MayorRecord) -> Result<bool>;
    fn finish(self: Box<Self>) -> Result<usize>;
}

pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    seen: Option<HashSet<Vec<String>>>, // only tracked when appending
    written: usize,
}

impl<W: Write> CsvSink<W> {
    /// Writes the header row immediately, so an empty run still yields it.
    pub fn new(out: W) -> Result<Self> {
        let mut writer = Writer::from_writer(out);
        writer.write_record(CSV_FIELDS)?;
        writer.flush()?;
        Ok(Self {
            writer,
            seen: None,
            written: 0,
        })
    }
}

impl CsvSink<File> {
    /// Appends to `path` when it already holds data, skipping rows already
    /// present. A missing or empty file is (re)written with a header.
    pub fn append(path: &Path) -> Result<Self> {
        let has_data = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        if !has_data {
            let file = create_file(path)?;
            let mut sink = Self::new(file)?;
            sink.seen = Some(HashSet::new());
            return Ok(sink);
        }

        let seen = read_existing_rows(path)?;
        debug!(path = %path.display(), rows = seen.len(), "appending to existing csv");
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {} for append", path.display()))?;
        if !ends_with_newline(&mut file)? {
            // Hand-edited or truncated file; keep the next row off the last one
            file.write_all(b"\n")
                .with_context(|| format!("terminating last row of {}", path.display()))?;
        }
        Ok(Self {
            writer: Writer::from_writer(file),
            seen: Some(seen),
            written: 0,
        })
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write(&mut self, record: &MayorRecord) -> Result<bool> {
        let row = record.to_row();
        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(row.clone()) {
                return Ok(false);
            }
        }
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(true)
    }

    fn finish(mut self: Box<Self>) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

fn read_existing_rows(path: &Path) -> Result<HashSet<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut rows = HashSet::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        rows.insert(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Buffers records and writes one pretty-printed array on `finish`.
pub struct JsonSink<W: Write> {
    out: W,
    records: Vec<MayorRecord>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records: Vec::new(),
        }
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn write(&mut self, record: &MayorRecord) -> Result<bool> {
        self.records.push(record.clone());
        Ok(true)
    }

    fn finish(self: Box<Self>) -> Result<usize> {
        let Self { mut out, records } = *self;
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        records.serialize(&mut ser)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(records.len())
    }
}

/// Opens the sink for a target. `append` is only meaningful for CSV files.
pub fn open_sink(
    target: &OutputTarget,
    format: OutputFormat,
    append: bool,
) -> Result<Box<dyn RecordSink>> {
    if append && (format != OutputFormat::Csv || *target == OutputTarget::Stdout) {
        return Err(anyhow!("--append needs a CSV output file"));
    }
    let sink: Box<dyn RecordSink> = match (target, format) {
        (OutputTarget::Stdout, OutputFormat::Csv) => Box::new(CsvSink::new(io::stdout())?),
        (OutputTarget::Stdout, OutputFormat::Json) => Box::new(JsonSink::new(io::stdout())),
        (OutputTarget::File(path), OutputFormat::Csv) if append => Box::new(CsvSink::append(path)?),
        (OutputTarget::File(path), OutputFormat::Csv) => Box::new(CsvSink::new(create_file(path)?)?),
        (OutputTarget::File(path), OutputFormat::Json) => Box::new(JsonSink::new(create_file(path)?)),
    };
    info!(format = %format, append, "output opened");
    Ok(sink)
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(
            "xml".parse::<OutputFormat>(),
            Err(UnknownFormat("xml".to_string()))
        );
    }

    #[test]
    fn format_is_inferred_from_extension() {
        let json = OutputTarget::parse("out/mayors.JSON");
        assert_eq!(json.resolve_format(None).unwrap(), OutputFormat::Json);

        let csv = OutputTarget::parse("mayors.csv");
        assert_eq!(csv.resolve_format(None).unwrap(), OutputFormat::Csv);
        assert_eq!(
            csv.resolve_format(Some(OutputFormat::Json)).unwrap(),
            OutputFormat::Json
        );
    }

    #[test]
    fn stdout_defaults_to_csv() {
        let target = OutputTarget::parse("-");
        assert_eq!(target, OutputTarget::Stdout);
        assert_eq!(target.resolve_format(None).unwrap(), OutputFormat::Csv);
    }

    #[test]
    fn unknown_or_missing_extension_is_an_error() {
        assert!(OutputTarget::parse("mayors.txt").resolve_format(None).is_err());
        assert!(OutputTarget::parse("mayors").resolve_format(None).is_err());
    }

    #[test]
    fn append_is_rejected_outside_csv_files() {
        assert!(open_sink(&OutputTarget::Stdout, OutputFormat::Csv, true).is_err());
        let json = OutputTarget::File(PathBuf::from("never-created.json"));
        assert!(open_sink(&json, OutputFormat::Json, true).is_err());
        assert!(!Path::new("never-created.json").exists());
    }
}
