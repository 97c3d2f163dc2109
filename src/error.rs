use std::path::PathBuf;
use thiserror::Error;

/// The main error type for recordgen operations.
#[derive(Debug, Error)]
pub enum RecordgenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read manifest {path} at line {line}: {source}")]
    ManifestRead {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path} at line {line}: {source}")]
    ManifestParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest record at line {line} ({source_ref}): {message}")]
    ManifestSchema {
        line: usize,
        source_ref: String,
        message: String,
    },

    #[error("Invalid storage prefix: {message}")]
    InvalidStoragePrefix { message: String },

    #[error("Storage prefix '{prefix}' not found in image reference '{source_ref}' (line {line})")]
    StoragePrefixNotFound {
        line: usize,
        source_ref: String,
        prefix: String,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Class id {class_id} not found in label map (image '{source_ref}', line {line})")]
    UnknownClassId {
        class_id: i64,
        source_ref: String,
        line: usize,
    },

    #[error("Failed to parse label map {path}: {source}")]
    LabelMapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid label map {path}: {message}")]
    LabelMapInvalid { path: PathBuf, message: String },

    #[error("Failed to write records to {path}: {source}")]
    RecordWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record in {path} at byte offset {offset}: {message}")]
    RecordCorrupt {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error("Failed to decode record #{index} in {path}: {source}")]
    RecordDecode {
        path: PathBuf,
        index: usize,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Record #{index} in {path} does not match the example schema: {message}")]
    RecordSchema {
        path: PathBuf,
        index: usize,
        message: String,
    },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),
}
