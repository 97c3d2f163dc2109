//! Manifest record to normalized example mapping.
//!
//! For each record the mapper resolves the image on local disk, reads its
//! bytes and pixel size, normalizes every box against that size, looks up
//! class names, and assigns the next image id.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RecordgenError;
use crate::manifest::{
    BBoxXYXY, IdAllocator, LabelJobKey, LabelMap, ManifestRecord, NormalizedExample,
    NormalizedObject, Pixel, RawAnnotation,
};

/// Value written to `image/format` unless detection is requested.
pub const DEFAULT_IMAGE_FORMAT: &str = "png";

/// What to write to `image/format`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageFormatPolicy {
    /// Always write this literal, whatever the image really is. Existing
    /// consumers of these records expect `"png"`.
    Fixed(String),
    /// Sniff the format from the image header.
    Detect,
}

impl Default for ImageFormatPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_IMAGE_FORMAT.to_string())
    }
}

/// Mapper settings.
#[derive(Clone, Debug, Default)]
pub struct MapperConfig {
    /// Local directory the manifest's images were synced into.
    pub image_root: PathBuf,
    /// Remote path component that precedes the image-root-relative path in
    /// each `source-ref` (e.g. the S3 key prefix).
    pub storage_prefix: String,
    pub label_job: LabelJobKey,
    pub format: ImageFormatPolicy,
}

impl MapperConfig {
    pub fn new(image_root: impl Into<PathBuf>, storage_prefix: impl Into<String>) -> Self {
        Self {
            image_root: image_root.into(),
            storage_prefix: storage_prefix.into(),
            ..Default::default()
        }
    }

    /// Rejects settings no record could be mapped with.
    pub fn validate(&self) -> Result<(), RecordgenError> {
        if self.storage_prefix.is_empty() {
            return Err(RecordgenError::InvalidStoragePrefix {
                message: "prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Turns manifest records into [`NormalizedExample`]s.
///
/// Owns the run's [`IdAllocator`]: every successfully mapped record gets
/// the next image id, in call order.
pub struct AnnotationMapper<'a> {
    config: MapperConfig,
    label_map: &'a LabelMap,
    ids: IdAllocator,
}

impl<'a> AnnotationMapper<'a> {
    pub fn new(config: MapperConfig, label_map: &'a LabelMap) -> Self {
        Self::with_allocator(config, label_map, IdAllocator::new())
    }

    pub fn with_allocator(config: MapperConfig, label_map: &'a LabelMap, ids: IdAllocator) -> Self {
        Self {
            config,
            label_map,
            ids,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Gives the allocator back, e.g. to see how many ids were issued.
    pub fn into_allocator(self) -> IdAllocator {
        self.ids
    }

    /// Maps one record.
    ///
    /// # Errors
    /// - `ManifestSchema` if `source-ref` or the annotation list is missing
    ///   or malformed
    /// - `StoragePrefixNotFound` if the reference does not contain the
    ///   storage prefix
    /// - `ImageRead` / `ImageDimensionRead` if the image cannot be read
    /// - `UnknownClassId` if a class id is not in the label map
    pub fn map(&mut self, record: &ManifestRecord) -> Result<NormalizedExample, RecordgenError> {
        let source_ref = record.source_ref()?;
        let annotations = record.annotations(&self.config.label_job)?;

        let relative = strip_storage_prefix(source_ref, &self.config.storage_prefix).ok_or_else(
            || RecordgenError::StoragePrefixNotFound {
                line: record.line,
                source_ref: source_ref.to_string(),
                prefix: self.config.storage_prefix.clone(),
            },
        )?;

        let image_path = join_image_path(&self.config.image_root, relative);
        let image = load_image(&image_path, &self.config.format)?;

        let objects = annotations
            .iter()
            .map(|ann| self.normalize(ann, image.width, image.height, record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NormalizedExample {
            height: image.height,
            width: image.width,
            filename: relative.to_string(),
            source_id: self.ids.next_image_id(),
            encoded: image.bytes,
            format: image.format,
            objects,
        })
    }

    fn normalize(
        &self,
        ann: &RawAnnotation,
        width: u32,
        height: u32,
        record: &ManifestRecord,
    ) -> Result<NormalizedObject, RecordgenError> {
        let class_text =
            self.label_map
                .get(ann.class_id)
                .ok_or_else(|| RecordgenError::UnknownClassId {
                    class_id: ann.class_id,
                    source_ref: record.display_ref(),
                    line: record.line,
                })?;

        Ok(NormalizedObject {
            bbox: BBoxXYXY::<Pixel>::from_ltwh(ann.left, ann.top, ann.width, ann.height)
                .to_normalized(width, height),
            class_label: ann.class_id,
            class_text: class_text.to_string(),
        })
    }
}

/// Returns the part of `source_ref` after the first occurrence of
/// `prefix`, minus one leading `/`.
///
/// The prefix may occur anywhere in the reference, not only at the start:
///
/// ```
/// use recordgen::mapping::strip_storage_prefix;
///
/// assert_eq!(
///     strip_storage_prefix("s3://bucket/data/images/foo.jpg", "data"),
///     Some("images/foo.jpg")
/// );
/// assert_eq!(strip_storage_prefix("s3://bucket/foo.jpg", "data"), None);
/// ```
///
/// An empty prefix never matches.
pub fn strip_storage_prefix<'r>(source_ref: &'r str, prefix: &str) -> Option<&'r str> {
    if prefix.is_empty() {
        return None;
    }
    let (_, rest) = source_ref.split_once(prefix)?;
    Some(rest.strip_prefix('/').unwrap_or(rest))
}

/// `{image_root}/{relative}`, joined as text so a relative path with a
/// leading separator stays under the root.
fn join_image_path(image_root: &Path, relative: &str) -> PathBuf {
    let mut joined = OsString::from(image_root.as_os_str());
    joined.push("/");
    joined.push(relative);
    PathBuf::from(joined)
}

struct LoadedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: String,
}

fn load_image(path: &Path, policy: &ImageFormatPolicy) -> Result<LoadedImage, RecordgenError> {
    let bytes = fs::read(path).map_err(|source| RecordgenError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;

    let dimension_error = |source| RecordgenError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    };

    let size = imagesize::blob_size(&bytes).map_err(dimension_error)?;
    let width = u32::try_from(size.width)
        .map_err(|_| dimension_error(imagesize::ImageError::CorruptedImage))?;
    let height = u32::try_from(size.height)
        .map_err(|_| dimension_error(imagesize::ImageError::CorruptedImage))?;

    let format = match policy {
        ImageFormatPolicy::Fixed(literal) => literal.clone(),
        ImageFormatPolicy::Detect => {
            format_name(imagesize::image_type(&bytes).map_err(dimension_error)?)
        }
    };

    Ok(LoadedImage {
        bytes,
        width,
        height,
        format,
    })
}

fn format_name(image_type: imagesize::ImageType) -> String {
    use imagesize::ImageType;

    match image_type {
        ImageType::Jpeg => "jpeg".to_string(),
        ImageType::Png => "png".to_string(),
        ImageType::Gif => "gif".to_string(),
        ImageType::Bmp => "bmp".to_string(),
        ImageType::Webp => "webp".to_string(),
        ImageType::Tiff => "tiff".to_string(),
        other => format!("{other:?}").to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ImageId;
    use serde_json::{json, Value};
    use std::io::Write;

    /// Smallest BMP header imagesize accepts, with the given dimensions.
    fn bmp(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&(54u32 + width * height * 4).to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&(width as i32).to_le_bytes());
        bytes.extend_from_slice(&(height as i32).to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.resize(54, 0);
        bytes
    }

    fn write_image(root: &Path, rel: &str, width: u32, height: u32) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = fs::File::create(path).unwrap();
        file.write_all(&bmp(width, height)).unwrap();
    }

    fn record(value: Value) -> ManifestRecord {
        match value {
            Value::Object(fields) => ManifestRecord::new(1, fields),
            other => panic!("not an object: {other}"),
        }
    }

    fn bee_record(class_id: i64) -> ManifestRecord {
        record(json!({
            "source-ref": "s3://bucket/data/images/foo.bmp",
            "bees": {"annotations": [
                {"left": 10, "top": 20, "width": 30, "height": 40, "class_id": class_id}
            ]}
        }))
    }

    fn labels() -> LabelMap {
        [("0", "wasp"), ("2", "bee")].into_iter().collect()
    }

    #[test]
    fn strips_prefix_found_mid_path() {
        assert_eq!(
            strip_storage_prefix("s3://bucket/data/images/foo.jpg", "data"),
            Some("images/foo.jpg")
        );
    }

    #[test]
    fn strips_only_one_separator() {
        assert_eq!(strip_storage_prefix("s3://b/data//x.jpg", "data"), Some("/x.jpg"));
        assert_eq!(strip_storage_prefix("s3://b/data/x.jpg", "data/"), Some("x.jpg"));
    }

    #[test]
    fn splits_on_first_occurrence() {
        assert_eq!(
            strip_storage_prefix("s3://data-bucket/data/a.jpg", "data"),
            Some("-bucket/data/a.jpg")
        );
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert_eq!(strip_storage_prefix("s3://b/data/x.jpg", ""), None);

        let config = MapperConfig::new("/images", "");
        assert!(matches!(
            config.validate(),
            Err(RecordgenError::InvalidStoragePrefix { .. })
        ));
        assert!(MapperConfig::new("/images", "data").validate().is_ok());
    }

    #[test]
    fn joins_as_text() {
        let joined = join_image_path(Path::new("/images"), "/x.jpg");
        assert_eq!(joined, PathBuf::from("/images//x.jpg"));
    }

    #[test]
    fn maps_record_with_normalized_boxes() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 100, 200);
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let ex = mapper.map(&bee_record(2)).expect("map");
        assert_eq!((ex.width, ex.height), (100, 200));
        assert_eq!(ex.filename, "images/foo.bmp");
        assert_eq!(ex.source_id, ImageId(1));
        assert_eq!(ex.format, "png");
        assert_eq!(ex.class_texts(), vec!["bee"]);
        assert_eq!(ex.class_labels(), vec![2]);

        let bbox = ex.objects[0].bbox;
        assert!((bbox.xmin - 0.1).abs() < 1e-12);
        assert!((bbox.xmax - 0.4).abs() < 1e-12);
        assert!((bbox.ymin - 0.1).abs() < 1e-12);
        assert!((bbox.ymax - 0.3).abs() < 1e-12);
    }

    #[test]
    fn encoded_bytes_are_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 8, 8);
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let ex = mapper.map(&bee_record(0)).unwrap();
        assert_eq!(ex.encoded, bmp(8, 8));
    }

    #[test]
    fn ids_increase_per_mapped_record() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 10, 10);
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let ids: Vec<u64> = (0..3)
            .map(|_| mapper.map(&bee_record(2)).unwrap().source_id.as_u64())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(mapper.into_allocator().images_issued(), 3);
    }

    #[test]
    fn unknown_class_is_key_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 10, 10);
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let err = mapper.map(&bee_record(9)).unwrap_err();
        assert!(matches!(err, RecordgenError::UnknownClassId { class_id: 9, .. }));
    }

    #[test]
    fn missing_image_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let err = mapper.map(&bee_record(2)).unwrap_err();
        assert!(matches!(err, RecordgenError::ImageRead { .. }));
    }

    #[test]
    fn missing_prefix_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let labels = labels();
        let mut mapper =
            AnnotationMapper::new(MapperConfig::new(dir.path(), "elsewhere"), &labels);

        let err = mapper.map(&bee_record(2)).unwrap_err();
        assert!(matches!(err, RecordgenError::StoragePrefixNotFound { .. }));
    }

    #[test]
    fn missing_source_ref_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let err = mapper
            .map(&record(json!({"bees": {"annotations": []}})))
            .unwrap_err();
        assert!(matches!(err, RecordgenError::ManifestSchema { .. }));
    }

    #[test]
    fn detect_policy_sniffs_header() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 4, 4);
        let labels = labels();
        let config = MapperConfig {
            format: ImageFormatPolicy::Detect,
            ..MapperConfig::new(dir.path(), "data")
        };
        let mut mapper = AnnotationMapper::new(config, &labels);

        assert_eq!(mapper.map(&bee_record(2)).unwrap().format, "bmp");
    }

    #[test]
    fn image_without_annotations_has_no_objects() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "images/foo.bmp", 4, 4);
        let labels = labels();
        let mut mapper = AnnotationMapper::new(MapperConfig::new(dir.path(), "data"), &labels);

        let rec = record(json!({
            "source-ref": "s3://bucket/data/images/foo.bmp",
            "bees": {"annotations": []}
        }));
        assert!(mapper.map(&rec).unwrap().objects.is_empty());
    }
}
