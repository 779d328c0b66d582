use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::detection::{DetectionReport, MediaKind};
use crate::liability::ApportionmentResult;

/// One processed piece of evidence, as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub version: u32,
    pub id: String,
    pub filename: String,
    pub file_hash: String,
    pub timestamp: DateTime<Utc>,
    pub media_kind: MediaKind,
    pub detection: DetectionReport,
    pub ledger_tx_id: String,
    pub liability: ApportionmentResult,
    pub certificate_path: Option<PathBuf>,
    pub status: String,
}

pub const RECORD_VERSION: u32 = 1;

fn record_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

/// Save a record atomically as `<id>.json` under the records directory,
/// creating the directory if needed.
pub fn save_record(dir: &Path, record: &EvidenceRecord) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create records directory at {}", dir.display()))?;

    let path = record_path(dir, &record.id);
    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, record).context("Failed to serialize record")?;
    file.commit()
        .with_context(|| format!("Failed to save record at {}", path.display()))?;

    Ok(())
}

/// Load a record by id. Returns `None` when no such record exists.
pub fn load_record(dir: &Path, id: &str) -> Result<Option<EvidenceRecord>> {
    let path = record_path(dir, id);
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(&path)
        .with_context(|| format!("Failed to open record at {}", path.display()))?;
    let record: EvidenceRecord = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse record at {}", path.display()))?;

    if record.version != RECORD_VERSION {
        anyhow::bail!("Unsupported record version: {}", record.version);
    }

    Ok(Some(record))
}

/// All records in the directory, newest first. Unparseable files are
/// skipped rather than failing the whole listing.
pub fn list_records(dir: &Path) -> Result<Vec<EvidenceRecord>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read records directory at {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Ok(file) = File::open(&path) {
            if let Ok(record) = serde_json::from_reader::<_, EvidenceRecord>(file) {
                records.push(record);
            }
        }
    }

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(records)
}

/// Find the most recent record matching a file hash.
pub fn find_by_hash(dir: &Path, file_hash: &str) -> Result<Option<EvidenceRecord>> {
    Ok(list_records(dir)?
        .into_iter()
        .find(|record| record.file_hash == file_hash))
}
