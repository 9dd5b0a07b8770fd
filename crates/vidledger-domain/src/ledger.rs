//! Flat CSV ledger of videos that already exist on the labeling platform.
//!
//! The file carries one row per uploaded video under the header
//! `dataset_name,video_name,data_row_id,dataset_id`. Rows are only ever
//! appended; the whole file is rewritten on every save.

use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const LEDGER_HEADER: [&str; 4] = ["dataset_name", "video_name", "data_row_id", "dataset_id"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub dataset_name: String,
    pub video_name: String,
    pub data_row_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub dataset_name: String,
    pub data_row_id: String,
    pub dataset_id: String,
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("failed to access ledger {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger {} is not valid CSV", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LedgerError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// In-memory view of the ledger keyed by `video_name`.
///
/// Insertion order follows the file; a name that appears more than once keeps
/// its first position but takes the values of its last row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: IndexMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ledger at `path`, returning an empty ledger when no file exists.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let records = read_records(path)?;
        let ledger = Self::from_records(records);
        tracing::debug!(path = %path.display(), entries = ledger.len(), "loaded ledger");
        Ok(ledger)
    }

    pub fn from_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.insert(record);
        }
        ledger
    }

    pub fn insert(&mut self, record: InventoryRecord) {
        let InventoryRecord {
            dataset_name,
            video_name,
            data_row_id,
            dataset_id,
        } = record;
        self.entries.insert(
            video_name,
            LedgerEntry {
                dataset_name,
                data_row_id,
                dataset_id,
            },
        );
    }

    pub fn contains(&self, video_name: &str) -> bool {
        self.entries.contains_key(video_name)
    }

    pub fn get(&self, video_name: &str) -> Option<&LedgerEntry> {
        self.entries.get(video_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> Vec<InventoryRecord> {
        self.entries
            .iter()
            .map(|(name, entry)| InventoryRecord {
                dataset_name: entry.dataset_name.clone(),
                video_name: name.clone(),
                data_row_id: entry.data_row_id.clone(),
                dataset_id: entry.dataset_id.clone(),
            })
            .collect()
    }
}

/// Reads every row of the ledger verbatim, duplicates included.
pub fn read_records(path: &Path) -> Result<Vec<InventoryRecord>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs_err::File::open(path).map_err(|err| LedgerError::io(path, err))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize::<InventoryRecord>() {
        records.push(row.map_err(|err| LedgerError::csv(path, err))?);
    }
    Ok(records)
}

/// Overwrites `path` with the header followed by `records`.
pub fn write_records(path: &Path, records: &[InventoryRecord]) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent).map_err(|err| LedgerError::io(path, err))?;
    }
    let file = fs_err::File::create(path).map_err(|err| LedgerError::io(path, err))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record(LEDGER_HEADER)
        .map_err(|err| LedgerError::csv(path, err))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| LedgerError::csv(path, err))?;
    }
    writer.flush().map_err(|err| LedgerError::io(path, err))?;
    Ok(())
}

/// Appends `new_records` to the rows already on disk and rewrites the file.
///
/// Returns the number of rows in the rewritten file. There is no
/// partial-write protection: a crash mid-write can truncate the ledger.
pub fn append_records(path: &Path, new_records: &[InventoryRecord]) -> Result<usize, LedgerError> {
    let mut rows = read_records(path)?;
    rows.extend_from_slice(new_records);
    write_records(path, &rows)?;
    tracing::debug!(
        path = %path.display(),
        added = new_records.len(),
        total = rows.len(),
        "rewrote ledger"
    );
    Ok(rows.len())
}
