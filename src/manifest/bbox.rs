//! Bounding boxes in XYXY layout, tagged with their coordinate space.

use std::marker::PhantomData;

use super::space::{Normalized, Pixel};

/// An axis-aligned bounding box (xmin, ymin, xmax, ymax).
///
/// The constructor does not enforce `min <= max`; a malformed box coming
/// out of a manifest is carried through as-is.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }
}

impl BBoxXYXY<Pixel> {
    /// Builds a pixel box from a top-left corner plus width and height,
    /// the layout labeling jobs emit (`left`, `top`, `width`, `height`).
    #[inline]
    pub fn from_ltwh(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(left, top, left + width, top + height)
    }

    /// Divides x coordinates by the image width and y coordinates by the
    /// image height.
    ///
    /// Zero dimensions produce non-finite values; they are not rejected.
    pub fn to_normalized(&self, image_width: u32, image_height: u32) -> BBoxXYXY<Normalized> {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        BBoxXYXY::from_xyxy(self.xmin / w, self.ymin / h, self.xmax / w, self.ymax / h)
    }
}

impl BBoxXYXY<Normalized> {
    /// Returns true if every coordinate lies in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}
