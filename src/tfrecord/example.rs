//! `tf.train.Example` messages and the object-detection feature layout.
//!
//! The message definitions mirror `tensorflow/core/example/example.proto`
//! and `feature.proto`; only the parts needed for detection records are
//! declared. Features live in a `BTreeMap`, so encoding the same example
//! twice yields the same bytes.

use std::collections::BTreeMap;

use crate::manifest::{BBoxXYXY, ImageId, Normalized, NormalizedExample, NormalizedObject};

pub const HEIGHT: &str = "image/height";
pub const WIDTH: &str = "image/width";
pub const FILENAME: &str = "image/filename";
pub const SOURCE_ID: &str = "image/source_id";
pub const ENCODED: &str = "image/encoded";
pub const FORMAT: &str = "image/format";
pub const BBOX_XMIN: &str = "image/object/bbox/xmin";
pub const BBOX_XMAX: &str = "image/object/bbox/xmax";
pub const BBOX_YMIN: &str = "image/object/bbox/ymin";
pub const BBOX_YMAX: &str = "image/object/bbox/ymax";
pub const CLASS_TEXT: &str = "image/object/class/text";
pub const CLASS_LABEL: &str = "image/object/class/label";

#[derive(Clone, PartialEq, prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

impl Feature {
    pub fn bytes_list(value: Vec<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList { value })),
        }
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::bytes_list(vec![value.into()])
    }

    pub fn float_list(value: Vec<f32>) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value })),
        }
    }

    pub fn int64_list(value: Vec<i64>) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value })),
        }
    }

    pub fn int64(value: i64) -> Self {
        Self::int64_list(vec![value])
    }
}

/// Builds the detection `Example` for one image.
///
/// Box coordinates are narrowed to `f32`, the precision of `FloatList`.
pub fn encode_example(example: &NormalizedExample) -> Example {
    let coords = |f: fn(&BBoxXYXY<Normalized>) -> f64| {
        Feature::float_list(example.objects.iter().map(|o| f(&o.bbox) as f32).collect())
    };

    let mut feature = BTreeMap::new();
    feature.insert(HEIGHT.to_string(), Feature::int64(i64::from(example.height)));
    feature.insert(WIDTH.to_string(), Feature::int64(i64::from(example.width)));
    feature.insert(FILENAME.to_string(), Feature::bytes(example.filename.as_bytes()));
    feature.insert(
        SOURCE_ID.to_string(),
        Feature::bytes(example.source_id.to_string()),
    );
    feature.insert(ENCODED.to_string(), Feature::bytes(example.encoded.clone()));
    feature.insert(FORMAT.to_string(), Feature::bytes(example.format.as_bytes()));
    feature.insert(BBOX_XMIN.to_string(), coords(|b| b.xmin));
    feature.insert(BBOX_XMAX.to_string(), coords(|b| b.xmax));
    feature.insert(BBOX_YMIN.to_string(), coords(|b| b.ymin));
    feature.insert(BBOX_YMAX.to_string(), coords(|b| b.ymax));
    feature.insert(
        CLASS_TEXT.to_string(),
        Feature::bytes_list(
            example
                .objects
                .iter()
                .map(|o| o.class_text.as_bytes().to_vec())
                .collect(),
        ),
    );
    feature.insert(
        CLASS_LABEL.to_string(),
        Feature::int64_list(example.objects.iter().map(|o| o.class_label).collect()),
    );

    Example {
        features: Some(Features { feature }),
    }
}

/// Reads a detection `Example` back into a [`NormalizedExample`].
///
/// Returns a description of the first missing or mistyped feature.
pub fn decode_example(example: &Example) -> Result<NormalizedExample, String> {
    let features = example
        .features
        .as_ref()
        .map(|f| &f.feature)
        .ok_or_else(|| "example has no features".to_string())?;

    let height = single_int(features, HEIGHT)?;
    let width = single_int(features, WIDTH)?;
    let source_id = utf8(single_bytes(features, SOURCE_ID)?, SOURCE_ID)?;
    let source_id = source_id
        .parse::<u64>()
        .map_err(|_| format!("'{SOURCE_ID}' is not a decimal id: '{source_id}'"))?;

    let xmins = floats(features, BBOX_XMIN)?;
    let xmaxs = floats(features, BBOX_XMAX)?;
    let ymins = floats(features, BBOX_YMIN)?;
    let ymaxs = floats(features, BBOX_YMAX)?;
    let labels = ints(features, CLASS_LABEL)?;
    let texts = bytes_list(features, CLASS_TEXT)?;

    let n = xmins.len();
    let lengths = [xmaxs.len(), ymins.len(), ymaxs.len(), labels.len(), texts.len()];
    if lengths.iter().any(|&len| len != n) {
        return Err(format!(
            "per-object lists have different lengths ({n} xmin vs {lengths:?})"
        ));
    }

    let mut objects = Vec::with_capacity(n);
    for i in 0..n {
        objects.push(NormalizedObject {
            bbox: BBoxXYXY::from_xyxy(
                f64::from(xmins[i]),
                f64::from(ymins[i]),
                f64::from(xmaxs[i]),
                f64::from(ymaxs[i]),
            ),
            class_label: labels[i],
            class_text: utf8(&texts[i], CLASS_TEXT)?.to_string(),
        });
    }

    Ok(NormalizedExample {
        height: u32::try_from(height).map_err(|_| format!("'{HEIGHT}' out of range: {height}"))?,
        width: u32::try_from(width).map_err(|_| format!("'{WIDTH}' out of range: {width}"))?,
        filename: utf8(single_bytes(features, FILENAME)?, FILENAME)?.to_string(),
        source_id: ImageId::new(source_id),
        encoded: single_bytes(features, ENCODED)?.to_vec(),
        format: utf8(single_bytes(features, FORMAT)?, FORMAT)?.to_string(),
        objects,
    })
}

fn kind<'a>(
    features: &'a BTreeMap<String, Feature>,
    key: &str,
) -> Result<&'a feature::Kind, String> {
    features
        .get(key)
        .and_then(|f| f.kind.as_ref())
        .ok_or_else(|| format!("missing feature '{key}'"))
}

fn bytes_list<'a>(
    features: &'a BTreeMap<String, Feature>,
    key: &str,
) -> Result<&'a [Vec<u8>], String> {
    match kind(features, key)? {
        feature::Kind::BytesList(list) => Ok(list.value.as_slice()),
        _ => Err(format!("feature '{key}' is not a bytes list")),
    }
}

fn single_bytes<'a>(
    features: &'a BTreeMap<String, Feature>,
    key: &str,
) -> Result<&'a [u8], String> {
    match bytes_list(features, key)? {
        [value] => Ok(value.as_slice()),
        other => Err(format!("feature '{key}' has {} values, expected 1", other.len())),
    }
}

fn ints<'a>(features: &'a BTreeMap<String, Feature>, key: &str) -> Result<&'a [i64], String> {
    match kind(features, key)? {
        feature::Kind::Int64List(list) => Ok(list.value.as_slice()),
        _ => Err(format!("feature '{key}' is not an int64 list")),
    }
}

fn single_int(features: &BTreeMap<String, Feature>, key: &str) -> Result<i64, String> {
    match ints(features, key)? {
        [value] => Ok(*value),
        other => Err(format!("feature '{key}' has {} values, expected 1", other.len())),
    }
}

fn floats<'a>(features: &'a BTreeMap<String, Feature>, key: &str) -> Result<&'a [f32], String> {
    match kind(features, key)? {
        feature::Kind::FloatList(list) => Ok(list.value.as_slice()),
        _ => Err(format!("feature '{key}' is not a float list")),
    }
}

fn utf8<'a>(bytes: &'a [u8], key: &str) -> Result<&'a str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("feature '{key}' is not UTF-8: {e}"))
}
