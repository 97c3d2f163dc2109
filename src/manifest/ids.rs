//! Newtype IDs and the per-run id allocator.
//!
//! Using newtypes prevents accidentally mixing up different kinds of IDs
//! (e.g., passing an image ID where an annotation ID is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Synthetic identifier of one image within a generation run.
///
/// Written to `image/source_id` as its decimal string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        ImageId::new(id)
    }
}

/// Synthetic identifier of one annotation within a generation run.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl AnnotationId {
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AnnotationId {
    fn from(id: u64) -> Self {
        AnnotationId::new(id)
    }
}

/// Hands out image and annotation ids for one generation run.
///
/// Both counters start at zero, so the first id of each kind is 1. The
/// allocator is a plain value: whoever owns it owns the id sequence, and
/// two allocators never share state.
#[derive(Debug, Default)]
pub struct IdAllocator {
    image: u64,
    annotation: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next image id (1, 2, 3, ...).
    pub fn next_image_id(&mut self) -> ImageId {
        self.image += 1;
        ImageId(self.image)
    }

    /// Returns the next annotation id (1, 2, 3, ...).
    pub fn next_annotation_id(&mut self) -> AnnotationId {
        self.annotation += 1;
        AnnotationId(self.annotation)
    }

    /// Number of image ids issued so far.
    pub fn images_issued(&self) -> u64 {
        self.image
    }
}
