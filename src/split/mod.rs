//! Deterministic train/validation splitting.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::error::RecordgenError;
use crate::manifest::{Dataset, ManifestRecord};

/// Seed used when none is given. Re-running on the same manifest must
/// produce the same split.
pub const DEFAULT_SEED: u64 = 42;

/// Share of records that go to the train split by default.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.9;

/// Split options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitOptions {
    pub seed: u64,
    pub train_fraction: f64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            train_fraction: DEFAULT_TRAIN_FRACTION,
        }
    }
}

/// Validate split options before running.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), RecordgenError> {
    if !(0.0..=1.0).contains(&opts.train_fraction) {
        return Err(RecordgenError::InvalidSplitParams {
            message: format!(
                "train fraction must be in the interval [0.0, 1.0], got {}",
                opts.train_fraction
            ),
        });
    }
    Ok(())
}

/// Number of train records for a manifest of `total` records:
/// `floor(total * fraction)`.
pub fn train_count(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).floor() as usize).min(total)
}

/// Shuffles the records with a seeded generator and cuts them into train
/// and validation.
///
/// No stratification: membership depends only on the record count and the
/// seed. Both subsets may be empty.
pub fn split_dataset(
    mut records: Vec<ManifestRecord>,
    opts: &SplitOptions,
) -> Result<Dataset, RecordgenError> {
    validate_split_options(opts)?;

    let mut rng = StdRng::seed_from_u64(opts.seed);
    records.shuffle(&mut rng);

    let num_train = train_count(records.len(), opts.train_fraction);
    let validation = records.split_off(num_train);
    let dataset = Dataset {
        train: records,
        validation,
    };

    info!(
        train = dataset.train.len(),
        validation = dataset.validation.len(),
        "split manifest"
    );

    Ok(dataset)
}
