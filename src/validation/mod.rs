//! Dataset validation.
//!
//! This module implements the read-only validation pass that runs after a
//! partition (and backs the standalone `validate` subcommand), checking:
//! - Structural completeness (required top-level keys present)
//! - Referential integrity (every annotation's `image_id` resolves, image
//!   files exist on disk)
//! - Geometric validity (bounding boxes finite and within image bounds)
//!
//! All findings are collected into a [`ValidationReport`]; nothing here
//! mutates the dataset or aborts a run.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::coco::{AnnotationId, Dataset, ImageId};
use crate::error::CocoPrepError;

/// Top-level keys a complete COCO annotation file carries.
const REQUIRED_KEYS: &[&str] = &["licenses", "info", "categories", "images", "annotations"];

/// Options for validation behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidateOptions {
    /// Probe each raster on disk and compare against the stored
    /// width/height. Costs one header read per image.
    pub check_dimensions: bool,
}

/// Validates an annotation file on disk, optionally against its image
/// directory.
///
/// The file is read once; structural checks run on the raw JSON so a key
/// that is merely absent is reported rather than failing the parse.
///
/// # Errors
/// Returns an error only when the file cannot be read or is not a COCO
/// document at all; every dataset-level inconsistency is reported as an
/// issue instead.
pub fn validate_annotation_file(
    annotation_path: &Path,
    images_dir: Option<&Path>,
    opts: &ValidateOptions,
) -> Result<ValidationReport, CocoPrepError> {
    let file = File::open(annotation_path).map_err(CocoPrepError::Io)?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        CocoPrepError::CocoJsonParse {
            path: annotation_path.to_path_buf(),
            source,
        }
    })?;

    let mut report = ValidationReport::new();
    check_required_keys(&raw, &mut report);

    let dataset: Dataset =
        serde_json::from_value(raw).map_err(|source| CocoPrepError::CocoJsonParse {
            path: annotation_path.to_path_buf(),
            source,
        })?;

    validate_dataset(&dataset, &mut report);

    if let Some(images_dir) = images_dir {
        validate_image_files(&dataset, images_dir, opts, &mut report);
    }

    Ok(report)
}

/// Runs the in-memory consistency checks on an already-loaded dataset.
pub fn validate_dataset(dataset: &Dataset, report: &mut ValidationReport) {
    let image_ids = validate_images(dataset, report);
    validate_annotations(dataset, &image_ids, report);
}

fn check_required_keys(raw: &serde_json::Value, report: &mut ValidationReport) {
    for key in REQUIRED_KEYS {
        if raw.get(key).is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingTopLevelKey,
                format!("missing top-level key '{}'", key),
                IssueContext::Dataset,
            ));
        }
    }
}

fn validate_images(dataset: &Dataset, report: &mut ValidationReport) -> HashSet<ImageId> {
    let mut seen: HashMap<ImageId, usize> = HashMap::new();

    for (idx, image) in dataset.images.iter().enumerate() {
        if let Some(first_idx) = seen.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "duplicate image ID {} (first seen at index {})",
                    image.id, first_idx
                ),
                IssueContext::Image {
                    id: image.id.as_u64(),
                },
            ));
        } else {
            seen.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image {
                    id: image.id.as_u64(),
                },
            ));
        }
    }

    seen.into_keys().collect()
}

fn validate_annotations(
    dataset: &Dataset,
    image_ids: &HashSet<ImageId>,
    report: &mut ValidationReport,
) {
    let dims_by_id: HashMap<ImageId, (u32, u32)> = dataset
        .images
        .iter()
        .map(|img| (img.id, (img.width, img.height)))
        .collect();

    let mut seen: HashSet<AnnotationId> = HashSet::new();

    for ann in &dataset.annotations {
        let context = IssueContext::Annotation {
            id: ann.id.as_u64(),
        };

        if !seen.insert(ann.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!("duplicate annotation ID {}", ann.id),
                context.clone(),
            ));
        }

        if !image_ids.contains(&ann.image_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("references image {} which does not exist", ann.image_id),
                context.clone(),
            ));
            continue;
        }

        if !ann.bbox.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::BBoxNotFinite,
                format!("bbox {:?} has non-finite coordinates", ann.bbox),
                context,
            ));
            continue;
        }

        if let Some(&(width, height)) = dims_by_id.get(&ann.image_id) {
            if !ann.bbox.within_bounds(width as f64, height as f64) {
                report.add(ValidationIssue::warning(
                    IssueCode::BBoxOutOfBounds,
                    format!(
                        "bbox {:?} extends outside image bounds {}x{}",
                        ann.bbox, width, height
                    ),
                    context,
                ));
            }
        }
    }
}

fn validate_image_files(
    dataset: &Dataset,
    images_dir: &Path,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    for image in &dataset.images {
        let path = images_dir.join(&image.file_name);
        let context = IssueContext::Image {
            id: image.id.as_u64(),
        };

        if !path.is_file() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingImageFile,
                format!("file '{}' is missing from {}", image.file_name, images_dir.display()),
                context,
            ));
            continue;
        }

        if opts.check_dimensions {
            match imagesize::size(&path) {
                Ok(size) => {
                    if size.width as u32 != image.width || size.height as u32 != image.height {
                        report.add(ValidationIssue::warning(
                            IssueCode::DimensionMismatch,
                            format!(
                                "stored dimensions {}x{} but raster is {}x{}",
                                image.width, image.height, size.width, size.height
                            ),
                            context,
                        ));
                    }
                }
                Err(err) => {
                    report.add(ValidationIssue::warning(
                        IssueCode::DimensionMismatch,
                        format!("could not probe '{}': {}", image.file_name, err),
                        context,
                    ));
                }
            }
        }
    }
}
