//! Line-delimited JSON manifest reader.
//!
//! A manifest holds one JSON object per line. Blank lines are skipped;
//! anything else that is not a JSON object fails with the line number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};

use super::model::ManifestRecord;
use crate::error::RecordgenError;

/// Reads every record of a manifest file into memory, in file order.
///
/// # Errors
/// Returns an error if the file cannot be read or a line is not a JSON
/// object.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRecord>, RecordgenError> {
    let file = File::open(path).map_err(|source| RecordgenError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    read_manifest_from(BufReader::new(file), path)
}

/// Reads manifest records from bytes.
///
/// Useful for fuzzing and tests without file I/O.
pub fn from_manifest_slice(bytes: &[u8]) -> Result<Vec<ManifestRecord>, RecordgenError> {
    read_manifest_from(bytes, Path::new("<bytes>"))
}

/// Reads manifest records from a string.
pub fn from_manifest_str(manifest: &str) -> Result<Vec<ManifestRecord>, RecordgenError> {
    from_manifest_slice(manifest.as_bytes())
}

fn read_manifest_from<R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<Vec<ManifestRecord>, RecordgenError> {
    let mut records = Vec::new();

    for (line_idx, line_res) in reader.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = line_res.map_err(|source| RecordgenError::ManifestRead {
            path: path.to_path_buf(),
            line: line_num,
            source,
        })?;

        if let Some(record) = parse_manifest_line(&line, line_num, path)? {
            records.push(record);
        }
    }

    Ok(records)
}

/// Parses one manifest line. Returns `Ok(None)` for blank lines.
pub fn parse_manifest_line(
    line: &str,
    line_num: usize,
    path: &Path,
) -> Result<Option<ManifestRecord>, RecordgenError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields: Map<String, Value> =
        serde_json::from_str(line).map_err(|source| RecordgenError::ManifestParse {
            path: path.to_path_buf(),
            line: line_num,
            source,
        })?;

    Ok(Some(ManifestRecord::new(line_num, fields)))
}
