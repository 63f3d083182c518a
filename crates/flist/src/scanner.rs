use fmcore::{Error, Result};
use path::AbsPath;
use tracing::debug;

use crate::record::{stat_from_metadata, FileRecord, Stat};
use crate::sort::{sort_records, SortKey};

/// The outcome of a directory scan: the sorted records plus the two
/// counters the panel keeps alongside them.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every materialized entry, sorted per the requested order vector.
    pub records: Vec<FileRecord>,
    /// Total number of entries (== `records.len()`).
    pub total: usize,
    /// Number of entries whose name starts with `.`.
    pub hidden: usize,
}

/// Materialize `wd` into a sorted array of [`FileRecord`]s.
///
/// `.` and `..` are never materialized. A per-entry `lstat` failure is
/// absorbed: the record is emitted with a zeroed [`Stat`] and the scan
/// continues. An allocation failure while growing the record
/// vector clears all partial work and returns [`Error::OutOfMemory`].
///
/// # Errors
///
/// Returns an error if `wd` cannot be opened, or [`Error::OutOfMemory`]
/// on allocation failure.
pub fn scan(wd: &AbsPath, order: &[SortKey], ascending: bool) -> Result<ScanResult> {
    let entries = std::fs::read_dir(wd.as_str()).map_err(|e| Error::from_io(wd.as_str(), e))?;

    let mut records: Vec<FileRecord> = Vec::new();
    let mut hidden = 0usize;

    for entry in entries {
        let Ok(entry) = entry else {
            // A readdir() error mid-stream on this entry; skip it the
            // same way a failed lstat is absorbed rather than aborting
            // the whole scan.
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();

        if records.try_reserve(1).is_err() {
            records.clear();
            return Err(Error::OutOfMemory);
        }

        if name.starts_with('.') {
            hidden += 1;
        }

        let mut full = wd.clone();
        let stat = match full.push(&name) {
            Ok(()) => std::fs::symlink_metadata(full.as_str())
                .map(|m| stat_from_metadata(&m))
                .unwrap_or_else(|err| {
                    debug!(path = %full, error = %err, "lstat failed during scan; zeroing metadata");
                    Stat::default()
                }),
            Err(_) => Stat::default(),
        };

        records.push(FileRecord {
            name,
            stat,
            selected: false,
        });
    }

    let total = records.len();
    sort_records(&mut records, order, ascending);
    Ok(ScanResult {
        records,
        total,
        hidden,
    })
}
