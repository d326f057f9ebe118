//! Partition engine: split a dataset into disjoint train/val subsets.
//!
//! Every image (and each of its annotations) lands in exactly one subset.
//! Image files are *moved* out of the source directory into the per-subset
//! output directories - the operation is destructive to the source layout
//! and not idempotent: re-running it against an already-partitioned source
//! will find no files to relocate.
//!
//! Shuffling is reproducible only when the caller supplies a seed; the
//! seed is an explicit option, not ambient global state.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::coco::{io_json, Dataset, ImageId};
use crate::error::CocoPrepError;
use crate::progress::progress_bar;
use crate::validation::{self, ValidateOptions, ValidationReport};

/// Options for partitioning.
#[derive(Clone, Copy, Debug)]
pub struct SplitOptions {
    /// Proportion of images assigned to the training subset, in (0, 1).
    pub ratio: f64,

    /// Shuffle seed. `None` means a fresh thread-local RNG per run.
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            seed: None,
        }
    }
}

/// Validate partition options before running.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), CocoPrepError> {
    if !(opts.ratio > 0.0 && opts.ratio < 1.0) {
        return Err(CocoPrepError::InvalidArgument {
            message: "--split-ratio must be strictly between 0.0 and 1.0".to_string(),
        });
    }
    Ok(())
}

/// The result of a full partition run.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Number of image files relocated into each subset directory.
    pub moved_train: usize,
    pub moved_val: usize,

    /// Post-emission validation findings, one report per subset.
    pub train_report: ValidationReport,
    pub val_report: ValidationReport,

    /// Where the subset annotation files were written.
    pub train_annotations: PathBuf,
    pub val_annotations: PathBuf,
}

/// Runs the full partition: shuffle, derive subsets, relocate image files,
/// emit one annotation file per subset, then validate the emitted files.
pub fn split_dataset(
    images_dir: &Path,
    annotation_file: &Path,
    output_dir: &Path,
    opts: &SplitOptions,
) -> Result<SplitOutcome, CocoPrepError> {
    validate_split_options(opts)?;

    let dataset = io_json::load_coco_json(annotation_file)?;

    let train_ids = select_train_ids(&dataset, opts.ratio, opts.seed);
    let (train, val) = partition_dataset(&dataset, &train_ids);
    info!(
        "partitioned {} image(s) into {} train / {} val",
        dataset.images.len(),
        train.images.len(),
        val.images.len()
    );

    let train_images_dir = output_dir.join("images").join("train");
    let val_images_dir = output_dir.join("images").join("val");
    let moved_train = move_subset_images(&train, images_dir, &train_images_dir, "Train")?;
    let moved_val = move_subset_images(&val, images_dir, &val_images_dir, "Val")?;

    // One write per subset, after all per-image relocation has completed.
    let annotations_dir = output_dir.join("annotations");
    let train_annotations = annotations_dir.join("train.json");
    let val_annotations = annotations_dir.join("val.json");
    io_json::save_coco_json(&train_annotations, &train)?;
    io_json::save_coco_json(&val_annotations, &val)?;

    // Read-only pass over the emitted files; findings are reported to the
    // caller, never raised.
    let validate_opts = ValidateOptions::default();
    let train_report =
        validation::validate_annotation_file(&train_annotations, Some(&train_images_dir), &validate_opts)?;
    let val_report =
        validation::validate_annotation_file(&val_annotations, Some(&val_images_dir), &validate_opts)?;

    Ok(SplitOutcome {
        moved_train,
        moved_val,
        train_report,
        val_report,
        train_annotations,
        val_annotations,
    })
}

/// Selects the training subset: the first `floor(ratio * N)` of the
/// shuffled distinct image IDs.
pub fn select_train_ids(dataset: &Dataset, ratio: f64, seed: Option<u64>) -> HashSet<ImageId> {
    let mut ids = dataset.distinct_image_ids();

    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        ids.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        ids.shuffle(&mut rng);
    }

    let train_count = (ratio * ids.len() as f64).floor() as usize;
    ids.truncate(train_count);
    ids.into_iter().collect()
}

/// Derives the two subset datasets from a train-side ID set.
///
/// `licenses`, `info`, and `categories` are carried into both subsets
/// verbatim; images and annotations are filtered by ID membership.
pub fn partition_dataset(dataset: &Dataset, train_ids: &HashSet<ImageId>) -> (Dataset, Dataset) {
    let train = subset_by_image_ids(dataset, |id| train_ids.contains(&id));
    let val = subset_by_image_ids(dataset, |id| !train_ids.contains(&id));
    (train, val)
}

/// Creates a subset dataset containing the images selected by `keep` and
/// exactly the annotations owned by those images.
pub fn subset_by_image_ids(dataset: &Dataset, keep: impl Fn(ImageId) -> bool) -> Dataset {
    let images = dataset
        .images
        .iter()
        .filter(|image| keep(image.id))
        .cloned()
        .collect();

    let annotations = dataset
        .annotations
        .iter()
        .filter(|ann| keep(ann.image_id))
        .cloned()
        .collect();

    Dataset {
        licenses: dataset.licenses.clone(),
        info: dataset.info.clone(),
        categories: dataset.categories.clone(),
        images,
        annotations,
    }
}

/// Moves a subset's image files from `src_dir` into `dst_dir`.
///
/// A file missing from the source is logged and skipped; the validation
/// pass will report it against the emitted annotation file.
fn move_subset_images(
    subset: &Dataset,
    src_dir: &Path,
    dst_dir: &Path,
    label: &str,
) -> Result<usize, CocoPrepError> {
    fs::create_dir_all(dst_dir)?;

    let pb = progress_bar(subset.images.len() as u64, label);
    let mut moved = 0;

    for image in &subset.images {
        let src = src_dir.join(&image.file_name);
        let dst = dst_dir.join(&image.file_name);

        if !src.is_file() {
            warn!("image file not found, skipping move: {}", src.display());
            pb.inc(1);
            continue;
        }

        move_file(&src, &dst)?;
        moved += 1;
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} images moved", label));
    Ok(moved)
}

/// Moves a single file, falling back to copy+remove when a plain rename is
/// not possible (e.g. across filesystems).
fn move_file(src: &Path, dst: &Path) -> Result<(), CocoPrepError> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)?;
    fs::remove_file(src)?;
    Ok(())
}
