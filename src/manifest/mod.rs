//! Manifest-side data model for recordgen.
//!
//! A labeling job produces a manifest: one JSON object per image with the
//! image location (`source-ref`) and the job's output, whose `annotations`
//! list holds pixel-space boxes. This module defines the records read from
//! the manifest, the label map, and the normalized examples that are
//! written out as training records.
//!
//! Boxes are typed by coordinate space so pixel and normalized values
//! cannot be mixed:
//!
//! ```
//! use recordgen::manifest::{BBoxXYXY, Pixel};
//!
//! let bbox = BBoxXYXY::<Pixel>::from_ltwh(10.0, 20.0, 30.0, 40.0);
//! let norm = bbox.to_normalized(100, 200);
//! assert!((norm.xmax - 0.4).abs() < 1e-12);
//! ```

mod bbox;
mod ids;
pub mod io_label_map;
pub mod io_manifest;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use ids::{AnnotationId, IdAllocator, ImageId};
pub use model::{
    Dataset, LabelJobKey, LabelMap, ManifestRecord, NormalizedExample, NormalizedObject,
    RawAnnotation, Split, ANNOTATIONS_KEY, SOURCE_REF_KEY,
};
pub use space::{Normalized, Pixel};
