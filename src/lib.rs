//! recordgen: labeling-job manifests to TFRecord training data.
//!
//! recordgen reads a line-delimited JSON manifest produced by an image
//! labeling job, splits it deterministically into train and validation
//! sets, and writes each set as a TFRecord file of `tf.train.Example`s in
//! the layout object-detection training pipelines expect.
//!
//! # Modules
//!
//! - [`manifest`]: manifest records, label map, normalized examples
//! - [`split`]: seeded train/validation split
//! - [`mapping`]: record to example mapping (paths, image size, boxes)
//! - [`tfrecord`]: TFRecord framing and the `Example` schema
//! - [`generate`]: the end-to-end run
//! - [`inspect`]: summaries of written records files
//! - [`error`]: error types for recordgen operations

pub mod error;
pub mod generate;
pub mod inspect;
pub mod manifest;
pub mod mapping;
pub mod split;
pub mod tfrecord;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::RecordgenError;

use generate::GenerateOptions;
use manifest::LabelJobKey;
use mapping::{ImageFormatPolicy, MapperConfig};
use split::{SplitOptions, DEFAULT_SEED, DEFAULT_TRAIN_FRACTION};

/// The recordgen CLI application.
#[derive(Parser)]
#[command(name = "recordgen")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate train/validation records from a manifest.
    Generate(GenerateArgs),
    /// Summarize an existing records file.
    Inspect(InspectArgs),
}

/// Arguments for the generate subcommand.
#[derive(clap::Args)]
struct GenerateArgs {
    /// Line-delimited JSON manifest from the labeling job.
    #[arg(long, env = "RECORDGEN_MANIFEST")]
    manifest: PathBuf,

    /// Local directory holding the manifest's images.
    #[arg(long, env = "RECORDGEN_IMAGE_ROOT")]
    image_root: PathBuf,

    /// JSON object mapping class ids to class names.
    #[arg(long, env = "RECORDGEN_LABEL_MAP")]
    label_map: PathBuf,

    /// Directory for train.records and validation.records.
    #[arg(long, env = "RECORDGEN_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Path component of each source-ref after which the image-root
    /// relative path starts.
    #[arg(long, env = "RECORDGEN_STORAGE_PREFIX")]
    storage_prefix: String,

    /// Labeling-job key holding the annotations (discovered if omitted).
    #[arg(long, env = "RECORDGEN_LABEL_JOB")]
    label_job: Option<String>,

    /// Shuffle seed.
    #[arg(long, env = "RECORDGEN_SEED", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Share of records written to train.records.
    #[arg(long, env = "RECORDGEN_TRAIN_FRACTION", default_value_t = DEFAULT_TRAIN_FRACTION)]
    train_fraction: f64,

    /// Write the sniffed image format instead of the fixed "png".
    #[arg(long, env = "RECORDGEN_DETECT_FORMAT")]
    detect_format: bool,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Records file to inspect.
    input: PathBuf,

    /// Number of labels to list.
    #[arg(long, default_value_t = 10)]
    top_labels: usize,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the recordgen CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RecordgenError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate(args)) => run_generate(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("recordgen {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Turn labeling-job manifests into TFRecord training data.");
            println!();
            println!("Run 'recordgen --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the generate subcommand.
fn run_generate(args: GenerateArgs) -> Result<(), RecordgenError> {
    let label_map = manifest::io_label_map::read_label_map(&args.label_map)?;

    let opts = GenerateOptions {
        manifest_path: args.manifest,
        output_dir: args.output_dir,
        mapper: MapperConfig {
            image_root: args.image_root,
            storage_prefix: args.storage_prefix,
            label_job: args
                .label_job
                .map(LabelJobKey::Named)
                .unwrap_or_default(),
            format: if args.detect_format {
                ImageFormatPolicy::Detect
            } else {
                ImageFormatPolicy::default()
            },
        },
        split: SplitOptions {
            seed: args.seed,
            train_fraction: args.train_fraction,
        },
    };

    let report = generate::generate_all(&opts, &label_map)?;
    print!("{}", report);
    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), RecordgenError> {
    let opts = inspect::InspectOptions {
        top_labels: args.top_labels,
        ..Default::default()
    };
    let report = inspect::inspect_records(&args.input, &opts)?;

    match args.output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| RecordgenError::UnsupportedOutput(e.to_string()))?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{}", report),
    }

    Ok(())
}
