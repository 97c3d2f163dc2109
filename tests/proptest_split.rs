//! Property tests for the train/validation split.

mod proptest_helpers;

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{Map, Value};

use proptest_helpers::proptest_config;
use recordgen::manifest::ManifestRecord;
use recordgen::split::{split_dataset, train_count, SplitOptions};

fn records(n: usize) -> Vec<ManifestRecord> {
    (1..=n)
        .map(|line| {
            let mut fields = Map::new();
            fields.insert(
                "source-ref".into(),
                Value::String(format!("s3://bucket/data/{line}.png")),
            );
            ManifestRecord::new(line, fields)
        })
        .collect()
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn split_is_a_partition(n in 0usize..300, seed in any::<u64>(), fraction in 0.0f64..=1.0) {
        let opts = SplitOptions { seed, train_fraction: fraction };
        let dataset = split_dataset(records(n), &opts).unwrap();

        prop_assert_eq!(dataset.len(), n);
        prop_assert_eq!(dataset.train.len(), train_count(n, fraction));

        let lines: BTreeSet<usize> = dataset
            .train
            .iter()
            .chain(&dataset.validation)
            .map(|r| r.line)
            .collect();
        prop_assert_eq!(lines, (1..=n).collect::<BTreeSet<_>>());
    }

    #[test]
    fn split_is_deterministic(n in 0usize..100, seed in any::<u64>()) {
        let opts = SplitOptions { seed, ..Default::default() };
        let a = split_dataset(records(n), &opts).unwrap();
        let b = split_dataset(records(n), &opts).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn default_fraction_floors(n in 0usize..10_000) {
        let train = train_count(n, 0.9);
        prop_assert!(train <= n);
        prop_assert!((train as f64) <= 0.9 * n as f64);
        prop_assert!((train as f64) > 0.9 * n as f64 - 1.0);
    }
}
