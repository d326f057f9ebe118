//! Cocoprep: COCO dataset preparation toolkit.
//!
//! Cocoprep manipulates object-detection datasets stored as COCO-style
//! JSON annotation files paired with an image directory: resizing images
//! together with their bounding boxes, partitioning a dataset into
//! train/val subsets, validating annotation files, converting PNGs to
//! JPGs, and pruning unannotated images.
//!
//! # Modules
//!
//! - [`coco`]: dataset model and JSON I/O
//! - [`resize`]: resolution transform (images + annotations in lockstep)
//! - [`split`]: train/val partition engine
//! - [`validation`]: structural and referential validation
//! - [`convert`], [`prune`]: directory-level cleanup helpers
//! - [`error`]: error types for cocoprep operations

pub mod coco;
pub mod codec;
pub mod convert;
pub mod error;
pub mod progress;
pub mod prune;
pub mod resize;
pub mod split;
pub mod validation;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};

pub use error::CocoPrepError;

use resize::{ClampPolicy, ResizeOptions};
use split::SplitOptions;
use validation::ValidateOptions;

/// The cocoprep CLI application.
#[derive(Parser)]
#[command(name = "cocoprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resize a dataset's images and rescale their annotations.
    Resize(ResizeArgs),

    /// Partition a dataset into train/val subsets.
    Split(SplitArgs),

    /// Validate an annotation file for errors and warnings.
    Validate(ValidateArgs),

    /// Convert every PNG under a directory to JPG.
    Convert(ConvertArgs),

    /// Move unannotated images to _trash and write a cleaned annotation file.
    Prune(PruneArgs),
}

/// Arguments for the resize subcommand.
#[derive(clap::Args)]
struct ResizeArgs {
    /// Input directory containing images.
    images_dir: PathBuf,

    /// Output directory for resized images and adjusted annotations.
    output_dir: PathBuf,

    /// Annotation file in COCO format.
    annotation_file: PathBuf,

    /// Target resolution for images.
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [512u32, 512u32])]
    resolution: Vec<u32>,

    /// JPEG re-encode quality.
    #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Clip rescaled bounding boxes to the target image bounds.
    #[arg(long)]
    clamp: bool,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Source image directory (files are moved out of it).
    images_dir: PathBuf,

    /// Source annotation file in COCO format.
    annotation_file: PathBuf,

    /// Output directory; images/{train,val} and annotations/ are created inside.
    output_dir: PathBuf,

    /// Proportion of the dataset to use for training.
    #[arg(long = "split-ratio", default_value_t = 0.8, value_parser = parse_ratio)]
    split_ratio: f64,

    /// Seed for random shuffling; omit for a non-deterministic split.
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Annotation file to validate.
    annotation_file: PathBuf,

    /// Image directory to check file existence against.
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Probe each raster and compare against the stored width/height.
    #[arg(long, requires = "images_dir")]
    check_dimensions: bool,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory tree to convert.
    input_dir: PathBuf,

    /// JPEG quality for the converted files.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

/// Arguments for the prune subcommand.
#[derive(clap::Args)]
struct PruneArgs {
    /// Image directory to be cleaned.
    images_dir: PathBuf,

    /// Annotation file in COCO format.
    annotation_file: PathBuf,
}

// Validate that the ratio is strictly between 0.0 and 1.0
fn parse_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("RATIO must be strictly between 0.0 and 1.0".to_string()),
    }
}

fn require_exists(path: &Path) -> Result<(), CocoPrepError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CocoPrepError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

/// Run the cocoprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocoPrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Resize(args)) => run_resize(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Prune(args)) => run_prune(args),
        None => {
            println!("cocoprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("COCO dataset preparation toolkit.");
            println!();
            println!("Run 'cocoprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the resize subcommand.
fn run_resize(args: ResizeArgs) -> Result<(), CocoPrepError> {
    require_exists(&args.images_dir)?;
    require_exists(&args.annotation_file)?;

    let opts = ResizeOptions {
        resolution: (args.resolution[0], args.resolution[1]),
        quality: args.quality,
        clamp: if args.clamp {
            ClampPolicy::Clamp
        } else {
            ClampPolicy::PassThrough
        },
    };

    let outcome = resize::resize_dataset(
        &args.images_dir,
        &args.output_dir,
        &args.annotation_file,
        &opts,
    )?;

    print!("{}", outcome.report);
    println!(
        "Adjusted annotations written to {}",
        outcome.adjusted_annotations.display()
    );
    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), CocoPrepError> {
    require_exists(&args.images_dir)?;
    require_exists(&args.annotation_file)?;

    let opts = SplitOptions {
        ratio: args.split_ratio,
        seed: args.seed,
    };

    let outcome = split::split_dataset(
        &args.images_dir,
        &args.annotation_file,
        &args.output_dir,
        &opts,
    )?;

    println!(
        "Moved {} train and {} val image(s)",
        outcome.moved_train, outcome.moved_val
    );
    for (name, report) in [
        ("train", &outcome.train_report),
        ("val", &outcome.val_report),
    ] {
        print!("{}: {}", name, report);
    }
    println!("Output files validation complete. Successfully split dataset.");
    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), CocoPrepError> {
    require_exists(&args.annotation_file)?;
    if let Some(images_dir) = &args.images_dir {
        require_exists(images_dir)?;
    }

    let opts = ValidateOptions {
        check_dimensions: args.check_dimensions,
    };
    let report =
        validation::validate_annotation_file(&args.annotation_file, args.images_dir.as_deref(), &opts)?;

    print!("{}", report);

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(CocoPrepError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
        })
    } else {
        Ok(())
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), CocoPrepError> {
    require_exists(&args.input_dir)?;

    let summary = convert::convert_png_tree(&args.input_dir, args.quality)?;
    println!(
        "Converted {} PNG(s), {} failure(s)",
        summary.converted, summary.failed
    );
    Ok(())
}

/// Execute the prune subcommand.
fn run_prune(args: PruneArgs) -> Result<(), CocoPrepError> {
    require_exists(&args.images_dir)?;
    require_exists(&args.annotation_file)?;

    let summary = prune::prune_unannotated(&args.images_dir, &args.annotation_file)?;
    println!(
        "Moved {} unannotated image(s) to _trash, dropped {} missing record(s)",
        summary.trashed, summary.dropped_missing
    );
    println!("Cleaned annotations written to {}", summary.output.display());
    Ok(())
}
