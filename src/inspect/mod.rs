//! Records file inspection.
//!
//! Reads a `.records` file back and summarizes what was written: record
//! and object counts, label distribution, and normalized box sanity.

mod report;

pub use report::{BoxStats, InspectReport, LabelCount, LabelsSection, SummarySection};

use std::collections::HashMap;
use std::path::Path;

use crate::error::RecordgenError;
use crate::manifest::NormalizedExample;
use crate::tfrecord::RecordReader;

/// Options for records inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Number of top labels to show in the histogram.
    pub top_labels: usize,
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            top_labels: 10,
            bar_width: 20,
        }
    }
}

/// Decodes every record of `path` and builds a report.
///
/// Records are streamed; only the running totals are kept.
pub fn inspect_records(path: &Path, opts: &InspectOptions) -> Result<InspectReport, RecordgenError> {
    let mut acc = Accumulator::default();
    for example in RecordReader::open(path)? {
        acc.add(&example?);
    }
    Ok(acc.finish(opts))
}

/// Builds a report from examples already in memory.
pub fn inspect_examples(examples: &[NormalizedExample], opts: &InspectOptions) -> InspectReport {
    let mut acc = Accumulator::default();
    for example in examples {
        acc.add(example);
    }
    acc.finish(opts)
}

#[derive(Default)]
struct Accumulator {
    summary: SummarySection,
    labels: HashMap<String, usize>,
    boxes: BoxStats,
}

impl Accumulator {
    fn add(&mut self, example: &NormalizedExample) {
        let s = &mut self.summary;
        s.records += 1;
        s.objects += example.objects.len();
        if example.objects.is_empty() {
            s.records_without_objects += 1;
        }
        *s.formats.entry(example.format.clone()).or_insert(0) += 1;

        let id = example.source_id.as_u64();
        s.min_source_id = Some(s.min_source_id.map_or(id, |m| m.min(id)));
        s.max_source_id = Some(s.max_source_id.map_or(id, |m| m.max(id)));

        for object in &example.objects {
            *self.labels.entry(object.class_text.clone()).or_insert(0) += 1;

            let b = &mut self.boxes;
            b.total += 1;
            if !object.bbox.is_finite() {
                continue;
            }
            b.finite += 1;
            if object.bbox.is_ordered() {
                b.ordered += 1;
                if object.bbox.width() * object.bbox.height() <= 0.0 {
                    b.degenerate_area += 1;
                }
            }
            if !object.bbox.is_within_unit() {
                b.outside_unit += 1;
            }
        }
    }

    fn finish(self, opts: &InspectOptions) -> InspectReport {
        let total_objects = self.summary.objects;

        // Sort by count descending, then by name ascending for deterministic output
        let mut sorted: Vec<(String, usize)> = self.labels.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total_distinct = sorted.len();
        let rest = sorted.split_off(opts.top_labels.min(sorted.len()));
        let other_count = rest.iter().map(|(_, count)| count).sum();

        InspectReport {
            summary: self.summary,
            labels: LabelsSection {
                top_n: opts.top_labels,
                total_distinct,
                total_objects,
                entries: sorted
                    .into_iter()
                    .map(|(label, count)| LabelCount { label, count })
                    .collect(),
                other_count,
            },
            boxes: self.boxes,
            bar_width: opts.bar_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BBoxXYXY, ImageId, NormalizedObject};

    fn object(label: &str, bbox: (f64, f64, f64, f64)) -> NormalizedObject {
        NormalizedObject {
            bbox: BBoxXYXY::from_xyxy(bbox.0, bbox.1, bbox.2, bbox.3),
            class_label: 0,
            class_text: label.to_string(),
        }
    }

    fn example(id: u64, objects: Vec<NormalizedObject>) -> NormalizedExample {
        NormalizedExample {
            height: 10,
            width: 10,
            filename: format!("{id}.png"),
            source_id: ImageId(id),
            encoded: Vec::new(),
            format: "png".into(),
            objects,
        }
    }

    fn make_examples() -> Vec<NormalizedExample> {
        vec![
            example(
                1,
                vec![
                    object("bee", (0.1, 0.1, 0.2, 0.2)),
                    object("bee", (0.3, 0.3, 0.5, 0.5)),
                ],
            ),
            example(2, vec![object("wasp", (0.9, 0.9, 1.2, 1.0))]),
            example(3, Vec::new()),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let report = inspect_examples(&make_examples(), &InspectOptions::default());
        assert_eq!(report.summary.records, 3);
        assert_eq!(report.summary.objects, 3);
        assert_eq!(report.summary.records_without_objects, 1);
        assert_eq!(report.summary.min_source_id, Some(1));
        assert_eq!(report.summary.max_source_id, Some(3));
        assert_eq!(report.summary.formats.get("png"), Some(&3));
    }

    #[test]
    fn test_label_histogram() {
        let report = inspect_examples(&make_examples(), &InspectOptions::default());
        assert_eq!(report.labels.total_distinct, 2);
        assert_eq!(report.labels.entries[0].label, "bee");
        assert_eq!(report.labels.entries[0].count, 2);
    }

    #[test]
    fn top_labels_limits_entries() {
        let opts = InspectOptions {
            top_labels: 1,
            ..Default::default()
        };
        let report = inspect_examples(&make_examples(), &opts);
        assert_eq!(report.labels.entries.len(), 1);
        assert_eq!(report.labels.other_count, 1);
    }

    #[test]
    fn test_box_stats() {
        let report = inspect_examples(&make_examples(), &InspectOptions::default());
        assert_eq!(report.boxes.total, 3);
        assert_eq!(report.boxes.finite, 3);
        assert_eq!(report.boxes.ordered, 3);
        assert_eq!(report.boxes.outside_unit, 1);
        assert_eq!(report.boxes.degenerate_area, 0);
    }

    #[test]
    fn empty_input_reports_nothing() {
        let report = inspect_examples(&[], &InspectOptions::default());
        assert_eq!(report.summary.records, 0);
        assert_eq!(report.summary.min_source_id, None);
        assert!(report.labels.entries.is_empty());
    }
}
