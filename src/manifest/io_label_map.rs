//! Label map reader.
//!
//! The label map is a single JSON object mapping decimal class ids to class
//! names, e.g. `{"0": "wasp", "1": "bee"}`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::model::LabelMap;
use crate::error::RecordgenError;

/// Reads a label map from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not a JSON object of
/// strings, or has a key that is not an integer.
pub fn read_label_map(path: &Path) -> Result<LabelMap, RecordgenError> {
    let file = File::open(path).map_err(|source| RecordgenError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let entries: BTreeMap<String, String> =
        serde_json::from_reader(reader).map_err(|source| RecordgenError::LabelMapParse {
            path: path.to_path_buf(),
            source,
        })?;

    check_keys(entries, path)
}

/// Reads a label map from a JSON string.
pub fn from_label_map_str(json: &str) -> Result<LabelMap, RecordgenError> {
    let path = Path::new("<string>");
    let entries: BTreeMap<String, String> =
        serde_json::from_str(json).map_err(|source| RecordgenError::LabelMapParse {
            path: path.to_path_buf(),
            source,
        })?;

    check_keys(entries, path)
}

fn check_keys(entries: BTreeMap<String, String>, path: &Path) -> Result<LabelMap, RecordgenError> {
    if let Some(bad) = entries.keys().find(|k| k.parse::<i64>().is_err()) {
        return Err(RecordgenError::LabelMapInvalid {
            path: path.to_path_buf(),
            message: format!("key '{bad}' is not an integer class id"),
        });
    }

    Ok(LabelMap::new(entries))
}
