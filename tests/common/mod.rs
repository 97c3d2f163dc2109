#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const STORAGE_PREFIX: &str = "labeling-data";

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A labeling-job workspace on disk: images, manifest, label map, and an
/// output directory that does not exist yet.
pub struct Fixture {
    pub root: PathBuf,
    pub image_root: PathBuf,
    pub manifest: PathBuf,
    pub label_map: PathBuf,
    pub output_dir: PathBuf,
}

/// One manifest line: `source-ref` pointing at `img_{n}.bmp` under the
/// storage prefix, with a single box of `class_id`.
pub fn manifest_line(n: usize, class_id: i64) -> String {
    format!(
        r#"{{"source-ref":"s3://bucket/{STORAGE_PREFIX}/batch/img_{n}.bmp","bees-job":{{"annotations":[{{"left":{l},"top":5,"width":20,"height":10,"class_id":{class_id}}}],"image_size":[{{"width":100,"height":50,"depth":3}}]}},"bees-job-metadata":{{"job-name":"bees-job"}}}}"#,
        l = n
    )
}

/// Writes `count` 100x50 images and a manifest referencing them.
///
/// Every record uses class id 0 except those listed in `unknown`, which
/// use class id 99.
pub fn fixture(dir: &Path, count: usize, unknown: &[usize]) -> Fixture {
    let image_root = dir.join("images");
    for n in 1..=count {
        write_bmp(&image_root.join(format!("batch/img_{n}.bmp")), 100, 50);
    }

    let lines: Vec<String> = (1..=count)
        .map(|n| manifest_line(n, if unknown.contains(&n) { 99 } else { 0 }))
        .collect();
    let manifest = dir.join("output.manifest");
    fs::write(&manifest, lines.join("\n") + "\n").expect("write manifest");

    let label_map = dir.join("label_map.json");
    fs::write(&label_map, r#"{"0": "bee", "1": "wasp"}"#).expect("write label map");

    Fixture {
        root: dir.to_path_buf(),
        image_root,
        manifest,
        label_map,
        output_dir: dir.join("out"),
    }
}
