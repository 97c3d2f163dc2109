//! Inspect report types and terminal formatting.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The result of inspecting a records file.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    pub labels: LabelsSection,
    pub boxes: BoxStats,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

/// Summary counts for the records file.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub records: usize,
    pub objects: usize,
    pub records_without_objects: usize,
    /// `image/format` values and how many records carry each.
    pub formats: BTreeMap<String, usize>,
    pub min_source_id: Option<u64>,
    pub max_source_id: Option<u64>,
}

/// Label distribution section.
#[derive(Clone, Debug, Serialize)]
pub struct LabelsSection {
    /// How many top labels to show.
    pub top_n: usize,
    /// Distinct `class/text` values.
    pub total_distinct: usize,
    pub total_objects: usize,
    /// Top label entries (sorted by count descending).
    pub entries: Vec<LabelCount>,
    /// Sum of counts for labels not in the top N.
    pub other_count: usize,
}

/// A single label with its object count.
#[derive(Clone, Debug, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Normalized box sanity counts.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BoxStats {
    pub total: usize,
    /// Boxes with finite (non-NaN, non-Inf) coordinates.
    pub finite: usize,
    /// Boxes with min <= max on both axes.
    pub ordered: usize,
    /// Ordered boxes with zero area.
    pub degenerate_area: usize,
    /// Finite boxes with a coordinate outside [0, 1].
    pub outside_unit: usize,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records Inspection Report")?;
        writeln!(f)?;
        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_labels(f)?;
        writeln!(f)?;
        self.fmt_boxes(f)
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        writeln!(f, "┌─ Summary")?;
        writeln!(f, "│   Records:          {:>8}", format_number(s.records))?;
        writeln!(f, "│   Objects:          {:>8}", format_number(s.objects))?;
        writeln!(
            f,
            "│   Without objects:  {:>8}",
            format_number(s.records_without_objects)
        )?;
        if let (Some(min), Some(max)) = (s.min_source_id, s.max_source_id) {
            writeln!(f, "│   Source ids:       {min} to {max}")?;
        }
        if !s.formats.is_empty() {
            let formats: Vec<String> = s
                .formats
                .iter()
                .map(|(name, count)| format!("{name} ({})", format_number(*count)))
                .collect();
            writeln!(f, "│   Formats:          {}", formats.join(", "))?;
        }
        writeln!(f, "└─")
    }

    fn fmt_labels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = &self.labels;

        if l.total_distinct > l.top_n {
            writeln!(f, "┌─ Labels (top {} of {})", l.top_n, l.total_distinct)?;
        } else {
            writeln!(f, "┌─ Labels ({})", l.total_distinct)?;
        }

        if l.entries.is_empty() {
            writeln!(f, "│   No objects found.")?;
        } else {
            let max_count = l.entries.iter().map(|e| e.count).max().unwrap_or(1);

            for entry in &l.entries {
                writeln!(
                    f,
                    "│   {:<16} {:>7} {:>6}  {}",
                    truncate_label(&entry.label, 16),
                    format_number(entry.count),
                    fmt_percent(entry.count, l.total_objects),
                    render_bar(entry.count, max_count, self.bar_width)
                )?;
            }

            if l.other_count > 0 {
                writeln!(
                    f,
                    "│   {:<16} {:>7} {:>6}  {}",
                    "(other)",
                    format_number(l.other_count),
                    fmt_percent(l.other_count, l.total_objects),
                    render_bar(l.other_count, max_count, self.bar_width)
                )?;
            }
        }

        writeln!(f, "└─")
    }

    fn fmt_boxes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.boxes;

        writeln!(f, "┌─ Bounding Boxes")?;
        if b.total == 0 {
            writeln!(f, "│   No bounding boxes found.")?;
            return writeln!(f, "└─");
        }

        writeln!(
            f,
            "│   ✓ Finite coords:     {:>7} / {:>7}  ({})",
            format_number(b.finite),
            format_number(b.total),
            fmt_percent(b.finite, b.total)
        )?;
        writeln!(
            f,
            "│   ✓ Properly ordered:  {:>7} / {:>7}  ({})",
            format_number(b.ordered),
            format_number(b.total),
            fmt_percent(b.ordered, b.total)
        )?;

        let issues = [
            ("⚠ Outside [0, 1]:  ", b.outside_unit),
            ("⚠ Degenerate area: ", b.degenerate_area),
            ("✗ Non-finite coords:", b.total - b.finite),
        ];
        if issues.iter().all(|(_, n)| *n == 0) {
            writeln!(f, "│   ✓ No issues detected")?;
        } else {
            for (label, n) in issues.iter().filter(|(_, n)| *n > 0) {
                writeln!(
                    f,
                    "│   {label}  {:>7} / {:>7}  ({})",
                    format_number(*n),
                    format_number(b.total),
                    fmt_percent(*n, b.total)
                )?;
            }
        }

        writeln!(f, "└─")
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a percentage, handling zero denominators.
fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }

    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars - 1).collect();
        format!("{head}…")
    }
}
