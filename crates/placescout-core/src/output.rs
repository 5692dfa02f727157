//! Destination file I/O.
//!
//! JSON destinations are a pretty-printed array rewritten atomically on every
//! flush. CSV destinations carry a UTF-8 BOM and a header written once; later
//! runs append rows positionally.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::error::AppError;
use crate::fields::FieldSelection;
use crate::models::Record;

const UTF8_BOM: &str = "\u{feff}";

/// Destination file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(AppError::ConfigError(format!("Unknown output format: {s}"))),
        }
    }
}

/// Write `records` in the given format. Returns the number of records in
/// the file afterwards.
pub fn flush(
    format: OutputFormat,
    path: &Path,
    records: &[Record],
    selection: &FieldSelection,
    merge_with_existing: bool,
) -> Result<usize, AppError> {
    match format {
        OutputFormat::Json => flush_json(path, records, selection, merge_with_existing),
        OutputFormat::Csv => flush_csv(path, records, selection, merge_with_existing),
    }
}

/// Rewrite the JSON array at `path`, optionally keeping its current entries
/// first. The new content is written to a sibling temp file and renamed into
/// place, so a failed write leaves the old file intact.
pub fn flush_json(
    path: &Path,
    records: &[Record],
    selection: &FieldSelection,
    merge_with_existing: bool,
) -> Result<usize, AppError> {
    ensure_parent_dir(path)?;

    let mut entries = if merge_with_existing && path.exists() {
        match read_json_array(path) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Existing file unreadable, starting a fresh array");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };
    entries.extend(records.iter().map(|r| r.to_json(selection)));

    let body = serde_json::to_string_pretty(&entries)?;
    let tmp = temp_path(path);
    fs::write(&tmp, body)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(entries.len())
}

/// Append `records` to the CSV at `path`, or create it with a BOM and header.
pub fn flush_csv(
    path: &Path,
    records: &[Record],
    selection: &FieldSelection,
    merge_with_existing: bool,
) -> Result<usize, AppError> {
    ensure_parent_dir(path)?;
    let header = selection.output_keys();

    if merge_with_existing && has_content(path) {
        let (existing_header, existing_rows) = match read_csv(path) {
            Ok((h, rows)) => (h, rows.len()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Existing CSV unreadable, appending anyway");
                (Vec::new(), 0)
            }
        };
        if !existing_header.is_empty() && existing_header != header {
            tracing::warn!(
                path = %path.display(),
                existing = ?existing_header,
                current = ?header,
                "CSV header differs from selected fields; rows are appended positionally"
            );
        }

        let mut file = OpenOptions::new().read(true).append(true).open(path)?;
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for record in records {
            writer.write_record(record.to_csv_row(selection))?;
        }
        writer.flush()?;
        return Ok(existing_rows + records.len());
    }

    let mut file = fs::File::create(path)?;
    file.write_all(UTF8_BOM.as_bytes())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(record.to_csv_row(selection))?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Parse an existing JSON destination; anything but an array is malformed.
pub fn read_json_array(path: &Path) -> Result<Vec<Value>, AppError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(content.trim_start_matches(UTF8_BOM)) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(AppError::MalformedFile {
            path: path.display().to_string(),
            message: "top-level value is not an array".into(),
        }),
        Err(e) => Err(AppError::MalformedFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Parse an existing CSV destination into its header and data rows.
pub fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>), AppError> {
    let content = fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.trim_start_matches(UTF8_BOM).as_bytes());
    let malformed = |e: csv::Error| AppError::MalformedFile {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let header = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;
    Ok((header, rows))
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ends_with_newline(file: &mut fs::File) -> Result<bool, AppError> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
