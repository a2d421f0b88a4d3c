use chrono::NaiveDate;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One survey submission: field name to value, in insertion order.
///
/// `serde_json` is built with `preserve_order`, so the key order of the
/// first stored record carries through to the CSV header.
pub type Submission = serde_json::Map<String, Value>;

const FILE_PREFIX: &str = "log-";
const FILE_SUFFIX: &str = ".txt";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no record file for {0}")]
    NotFound(String),

    #[error("record file for {0} holds no records")]
    Empty(String),

    #[error("corrupt record line: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Append-only store of survey submissions, one file per calendar date
///
/// Files are named `log-<YYYY-MM-DD>.txt` and hold one JSON object per
/// line. Lines are never rewritten; the file grows until the day rolls
/// over. The store owns the persistence directory exclusively.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<RecordStore> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(RecordStore { dir })
    }

    /// Path of the record file for a date key
    pub fn file_path(&self, date_key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, date_key, FILE_SUFFIX))
    }

    /// Append one submission to the file for `date_key`
    ///
    /// The record is serialized as a single JSON line and written with one
    /// write call, creating the file on first submission of the day.
    ///
    /// # Arguments
    /// * `date_key` - Calendar date in `YYYY-MM-DD` form
    /// * `record` - The sanitized, timestamped submission
    pub fn append(&self, date_key: &str, record: &Submission) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.file_path(date_key))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read all submissions for a date, in file order
    ///
    /// # Errors
    /// * `StoreError::NotFound` - No record file exists for the date
    /// * `StoreError::Empty` - The file exists but holds zero records
    /// * `StoreError::Parse` - A stored line is not valid JSON (fail-fast,
    ///   records are self-produced so this indicates corruption)
    pub fn read_all(&self, date_key: &str) -> Result<Vec<Submission>, StoreError> {
        let path = self.file_path(date_key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(date_key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }

        if records.is_empty() {
            return Err(StoreError::Empty(date_key.to_string()));
        }
        Ok(records)
    }

    /// Date keys for which a record file exists, sorted ascending
    ///
    /// Derived from filenames matching the day-file naming convention;
    /// anything else in the directory is ignored.
    pub fn list_date_keys(&self) -> std::io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = date_key_from_file_name(name) {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Extract the date key from a record file name, if it follows the
/// `log-<YYYY-MM-DD>.txt` convention.
fn date_key_from_file_name(name: &str) -> Option<&str> {
    let key = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()?;
    Some(key)
}

/// Check that a client-supplied date key is a well-formed calendar date
pub fn is_valid_date_key(date_key: &str) -> bool {
    NaiveDate::parse_from_str(date_key, DATE_FORMAT).is_ok()
}
