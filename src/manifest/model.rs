//! Core types: manifest records on the way in, normalized examples on the
//! way out, and the split dataset in between.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bbox::BBoxXYXY;
use super::ids::ImageId;
use super::space::Normalized;
use crate::error::RecordgenError;

/// Manifest key holding the image location.
pub const SOURCE_REF_KEY: &str = "source-ref";

/// Key inside the labeling-job value that holds the box list.
pub const ANNOTATIONS_KEY: &str = "annotations";

/// One line of a labeling-job manifest.
///
/// The JSON object is kept as parsed; fields are only interpreted when the
/// record is mapped, so a bad record fails at mapping time and carries its
/// line number into the error.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestRecord {
    /// 1-based line number in the manifest file.
    pub line: usize,
    pub fields: Map<String, Value>,
}

/// How to find the labeling-job entry of a manifest record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LabelJobKey {
    /// Use the only key, besides `source-ref`, whose value is an object
    /// with an `annotations` array.
    #[default]
    Discover,
    /// Use exactly this key.
    Named(String),
}

/// One pixel-space box from the labeling job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub class_id: i64,
}

impl ManifestRecord {
    pub fn new(line: usize, fields: Map<String, Value>) -> Self {
        Self { line, fields }
    }

    /// The image reference, e.g. `s3://bucket/prefix/images/0001.jpg`.
    pub fn source_ref(&self) -> Result<&str, RecordgenError> {
        match self.fields.get(SOURCE_REF_KEY) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(self.schema_error(format!("'{SOURCE_REF_KEY}' is not a string"))),
            None => Err(self.schema_error(format!("missing '{SOURCE_REF_KEY}'"))),
        }
    }

    /// Resolves the labeling-job key and deserializes its annotation list.
    pub fn annotations(&self, key: &LabelJobKey) -> Result<Vec<RawAnnotation>, RecordgenError> {
        let job = match key {
            LabelJobKey::Named(name) => self
                .fields
                .get(name)
                .ok_or_else(|| self.schema_error(format!("missing labeling-job key '{name}'")))?,
            LabelJobKey::Discover => self.discover_job()?,
        };

        let list = job.get(ANNOTATIONS_KEY).ok_or_else(|| {
            self.schema_error(format!("labeling-job value has no '{ANNOTATIONS_KEY}'"))
        })?;

        Vec::<RawAnnotation>::deserialize(list)
            .map_err(|e| self.schema_error(format!("malformed annotations: {e}")))
    }

    fn discover_job(&self) -> Result<&Value, RecordgenError> {
        let candidates: Vec<(&String, &Value)> = self
            .fields
            .iter()
            .filter(|(k, v)| {
                k.as_str() != SOURCE_REF_KEY
                    && v.get(ANNOTATIONS_KEY).is_some_and(Value::is_array)
            })
            .collect();

        match candidates.as_slice() {
            [(_, value)] => Ok(*value),
            [] => Err(self.schema_error(format!(
                "no labeling-job key with an '{ANNOTATIONS_KEY}' list"
            ))),
            many => {
                let keys: Vec<&str> = many.iter().map(|(k, _)| k.as_str()).collect();
                Err(self.schema_error(format!(
                    "ambiguous labeling-job key (candidates: {}); pass one explicitly",
                    keys.join(", ")
                )))
            }
        }
    }

    /// The reference for error messages, even when it is missing.
    pub(crate) fn display_ref(&self) -> String {
        match self.fields.get(SOURCE_REF_KEY) {
            Some(Value::String(s)) => s.clone(),
            _ => "<no source-ref>".to_string(),
        }
    }

    fn schema_error(&self, message: String) -> RecordgenError {
        RecordgenError::ManifestSchema {
            line: self.line,
            source_ref: self.display_ref(),
            message,
        }
    }
}

/// Class id to class name lookup, keyed by the decimal class id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(BTreeMap<String, String>);

impl LabelMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn get(&self, class_id: i64) -> Option<&str> {
        self.0.get(&class_id.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One labeled object of a [`NormalizedExample`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedObject {
    pub bbox: BBoxXYXY<Normalized>,
    pub class_label: i64,
    pub class_text: String,
}

/// Everything written for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedExample {
    pub height: u32,
    pub width: u32,
    /// Image path relative to the image root.
    pub filename: String,
    pub source_id: ImageId,
    /// The image file, byte for byte.
    pub encoded: Vec<u8>,
    pub format: String,
    pub objects: Vec<NormalizedObject>,
}

impl NormalizedExample {
    pub fn xmins(&self) -> Vec<f64> {
        self.objects.iter().map(|o| o.bbox.xmin).collect()
    }

    pub fn xmaxs(&self) -> Vec<f64> {
        self.objects.iter().map(|o| o.bbox.xmax).collect()
    }

    pub fn ymins(&self) -> Vec<f64> {
        self.objects.iter().map(|o| o.bbox.ymin).collect()
    }

    pub fn ymaxs(&self) -> Vec<f64> {
        self.objects.iter().map(|o| o.bbox.ymax).collect()
    }

    pub fn class_labels(&self) -> Vec<i64> {
        self.objects.iter().map(|o| o.class_label).collect()
    }

    pub fn class_texts(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.class_text.as_str()).collect()
    }
}

/// Output partitions, in the order they are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Validation];

    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
        }
    }

    /// File name of this split's output, e.g. `train.records`.
    pub fn file_name(&self) -> String {
        format!("{}.records", self.name())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A shuffled manifest, partitioned into train and validation records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub train: Vec<ManifestRecord>,
    pub validation: Vec<ManifestRecord>,
}

impl Dataset {
    pub fn records(&self, split: Split) -> &[ManifestRecord] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
