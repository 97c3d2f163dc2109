//! Generation report and terminal formatting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::manifest::Split;

/// What one generation run wrote.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GenerateReport {
    /// One entry per split, in write order.
    pub splits: Vec<SplitSummary>,
}

/// Output of a single split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    pub path: PathBuf,
    pub records: usize,
    pub objects: usize,
}

impl GenerateReport {
    pub fn split(&self, split: Split) -> Option<&SplitSummary> {
        self.splits.iter().find(|s| s.split == split)
    }

    pub fn total_records(&self) -> usize {
        self.splits.iter().map(|s| s.records).sum()
    }
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated {} record(s):", self.total_records())?;
        for s in &self.splits {
            writeln!(
                f,
                "  {:<10} {:>6} record(s) {:>7} object(s)  {}",
                s.split.name(),
                s.records,
                s.objects,
                s.path.display()
            )?;
        }
        Ok(())
    }
}
