//! End-to-end generation: manifest in, `train.records` and
//! `validation.records` out.

mod report;

pub use report::{GenerateReport, SplitSummary};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::RecordgenError;
use crate::manifest::io_manifest::read_manifest;
use crate::manifest::{Dataset, LabelMap, Split};
use crate::mapping::{AnnotationMapper, MapperConfig};
use crate::split::{split_dataset, SplitOptions};
use crate::tfrecord::RecordWriter;

/// Everything a generation run needs besides the label map.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub mapper: MapperConfig,
    pub split: SplitOptions,
}

impl GenerateOptions {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        image_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        storage_prefix: impl Into<String>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            output_dir: output_dir.into(),
            mapper: MapperConfig::new(image_root, storage_prefix),
            split: SplitOptions::default(),
        }
    }
}

/// Reads the manifest, splits it, and writes one records file per split.
///
/// Splits are written in order, train first. The first failing record
/// aborts the run; files already written are left as they are.
pub fn generate_all(
    opts: &GenerateOptions,
    label_map: &LabelMap,
) -> Result<GenerateReport, RecordgenError> {
    opts.mapper.validate()?;

    let records = read_manifest(&opts.manifest_path)?;
    info!(
        manifest = %opts.manifest_path.display(),
        records = records.len(),
        "read manifest"
    );

    let dataset = split_dataset(records, &opts.split)?;
    write_dataset(&dataset, opts.mapper.clone(), label_map, &opts.output_dir)
}

/// Maps and writes an already split dataset into `output_dir`.
pub fn write_dataset(
    dataset: &Dataset,
    mapper: MapperConfig,
    label_map: &LabelMap,
    output_dir: &Path,
) -> Result<GenerateReport, RecordgenError> {
    fs::create_dir_all(output_dir).map_err(|source| RecordgenError::RecordWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut mapper = AnnotationMapper::new(mapper, label_map);
    let mut report = GenerateReport::default();

    for split in Split::ALL {
        let path = output_dir.join(split.file_name());
        let summary = write_split(&mut mapper, dataset, split, &path)?;
        report.splits.push(summary);
    }

    Ok(report)
}

fn write_split(
    mapper: &mut AnnotationMapper<'_>,
    dataset: &Dataset,
    split: Split,
    path: &Path,
) -> Result<SplitSummary, RecordgenError> {
    info!(split = %split, path = %path.display(), "generating records");

    let mut writer = RecordWriter::create(path)?;
    let mut objects = 0;

    for record in dataset.records(split) {
        let example = mapper.map(record)?;
        debug!(
            source_id = %example.source_id,
            filename = %example.filename,
            objects = example.objects.len(),
            "writing record"
        );
        objects += example.objects.len();
        writer.write_example(&example)?;
    }

    let records = writer.finish()?;
    info!(split = %split, records, objects, "finished split");

    Ok(SplitSummary {
        split,
        path: path.to_path_buf(),
        records,
        objects,
    })
}
