#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use recordgen::manifest::{BBoxXYXY, ImageId, NormalizedExample, NormalizedObject};

/// Box coordinates survive the records file as f32.
pub const EPS_F32: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image dimensions as labeling tools report them.
pub fn arb_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=4096, 1u32..=4096)
}

/// A pixel-space `(left, top, width, height)` box inside a `w x h` image.
pub fn arb_ltwh(w: u32, h: u32) -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..w as f64, 0.0..h as f64).prop_flat_map(move |(left, top)| {
        (
            Just(left),
            Just(top),
            0.0..=(w as f64 - left),
            0.0..=(h as f64 - top),
        )
    })
}

pub fn arb_object() -> impl Strategy<Value = NormalizedObject> {
    (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0i64..20, "[a-z ]{1,12}").prop_map(
        |(x0, y0, x1, y1, class_label, class_text)| NormalizedObject {
            bbox: BBoxXYXY::from_xyxy(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)),
            class_label,
            class_text,
        },
    )
}

pub fn arb_example() -> impl Strategy<Value = NormalizedExample> {
    (
        arb_dims(),
        "[a-z0-9_/]{1,24}\\.png",
        1u64..100_000,
        proptest::collection::vec(any::<u8>(), 0..64),
        proptest::collection::vec(arb_object(), 0..8),
    )
        .prop_map(|((width, height), filename, id, encoded, objects)| NormalizedExample {
            height,
            width,
            filename,
            source_id: ImageId(id),
            encoded,
            format: "png".to_string(),
            objects,
        })
}
