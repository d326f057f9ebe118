//! Resolution transform: resize images and rescale their annotations.
//!
//! The transform has two halves that must stay in lockstep:
//!
//! 1. Every raster under the input directory is resized to exactly the
//!    target resolution and rewritten (same file name) into the output
//!    image directory.
//! 2. Every image record's annotations are rescaled by that image's own
//!    scale factors, computed from its *original* stored dimensions, and
//!    the record's dimensions are updated to the target.
//!
//! Two images of different original sizes get different scale factors even
//! though both end up at the same target resolution. The adjusted
//! annotations are written to a new file; the input file is never touched.

mod report;

pub use report::{ResizeFailure, ResizeReport};

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::coco::{io_json, AnnotationIndex, Dataset};
use crate::codec;
use crate::error::CocoPrepError;
use crate::progress::progress_bar;

/// Policy for bounding boxes that fall outside the target bounds after
/// rescaling (possible only when the original box already overhung its
/// image).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClampPolicy {
    /// Emit the rescaled box unchanged.
    #[default]
    PassThrough,
    /// Clip the rescaled box to `[0, W] x [0, H]`.
    Clamp,
}

/// Options for the resolution transform.
#[derive(Clone, Copy, Debug)]
pub struct ResizeOptions {
    /// Target resolution as (width, height).
    pub resolution: (u32, u32),

    /// JPEG re-encode quality (1-100).
    pub quality: u8,

    /// What to do with boxes that land outside the target bounds.
    pub clamp: ClampPolicy,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            resolution: (512, 512),
            quality: 95,
            clamp: ClampPolicy::PassThrough,
        }
    }
}

/// The result of a full resolution transform.
#[derive(Debug)]
pub struct ResizeOutcome {
    /// Per-file outcome of the raster batch.
    pub report: ResizeReport,

    /// Where the adjusted annotation file was written.
    pub adjusted_annotations: PathBuf,
}

/// Runs the full resolution transform.
///
/// Resized images land in `<output_dir>/images/`, the adjusted annotation
/// file in `<output_dir>/annotations/<stem>_adjusted.json`. The annotation
/// file is written once, after all per-image work has completed.
pub fn resize_dataset(
    images_dir: &Path,
    output_dir: &Path,
    annotation_file: &Path,
    opts: &ResizeOptions,
) -> Result<ResizeOutcome, CocoPrepError> {
    let (width, height) = opts.resolution;
    if width == 0 || height == 0 {
        return Err(CocoPrepError::InvalidArgument {
            message: format!("target resolution {}x{} must be positive", width, height),
        });
    }

    // Load before touching the filesystem so a malformed annotation file
    // fails the run without leaving a half-written output tree.
    let mut dataset = io_json::load_coco_json(annotation_file)?;

    let images_out = output_dir.join("images");
    let report = resize_image_files(images_dir, &images_out, opts.resolution, opts.quality)?;
    info!(
        "resized {} image(s), {} failure(s)",
        report.resized,
        report.failures.len()
    );

    rescale_annotations(&mut dataset, opts.resolution, opts.clamp);

    let stem = annotation_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "annotations".to_string());
    let adjusted = output_dir
        .join("annotations")
        .join(format!("{}_adjusted.json", stem));
    io_json::save_coco_json(&adjusted, &dataset)?;

    Ok(ResizeOutcome {
        report,
        adjusted_annotations: adjusted,
    })
}

/// Resizes every supported raster under `input_dir` to `resolution` and
/// writes it under the same file name into `output_dir`.
///
/// Per-file work fans out over the rayon pool; a decode or encode failure
/// is recorded and skipped without aborting the batch.
pub fn resize_image_files(
    input_dir: &Path,
    output_dir: &Path,
    resolution: (u32, u32),
    quality: u8,
) -> Result<ResizeReport, CocoPrepError> {
    fs::create_dir_all(output_dir)?;

    let files: Vec<(PathBuf, String)> = WalkDir::new(input_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| codec::is_supported_image(entry.path()))
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            (entry.into_path(), name)
        })
        .collect();

    let (width, height) = resolution;
    let pb = progress_bar(files.len() as u64, "Resizing");

    let failures: Vec<ResizeFailure> = files
        .par_iter()
        .filter_map(|(path, name)| {
            let result = codec::decode(path)
                .map(|img| codec::resize_exact(&img, width, height))
                .and_then(|img| codec::encode(&img, &output_dir.join(name), quality));
            pb.inc(1);

            match result {
                Ok(()) => None,
                Err(err) => {
                    warn!("skipping {}: {}", path.display(), err);
                    Some(ResizeFailure {
                        path: path.clone(),
                        reason: err.to_string(),
                    })
                }
            }
        })
        .collect();

    pb.finish_with_message("Image resizing complete");

    Ok(ResizeReport {
        resized: files.len() - failures.len(),
        failures,
    })
}

/// Rescales every annotation to the target resolution and updates each
/// image record's stored dimensions.
///
/// Scale factors are per image, derived from the image's original stored
/// dimensions, and the same factors apply to every annotation of that
/// image. Applying this twice at the same resolution is a no-op (the
/// factors become 1.0).
pub fn rescale_annotations(dataset: &mut Dataset, resolution: (u32, u32), clamp: ClampPolicy) {
    let (target_w, target_h) = resolution;
    let index = AnnotationIndex::build(&dataset.annotations);

    let Dataset {
        images,
        annotations,
        ..
    } = dataset;

    for image in images.iter_mut() {
        if image.width == 0 || image.height == 0 {
            warn!(
                "image {} has invalid dimensions {}x{}; leaving its annotations alone",
                image.id, image.width, image.height
            );
            continue;
        }

        let scale_x = target_w as f64 / image.width as f64;
        let scale_y = target_h as f64 / image.height as f64;

        for &idx in index.for_image(image.id) {
            let ann = &mut annotations[idx];
            let mut bbox = ann.bbox.scaled(scale_x, scale_y);
            if clamp == ClampPolicy::Clamp {
                bbox = bbox.clamped(target_w as f64, target_h as f64);
            }
            ann.bbox = bbox;
        }

        image.width = target_w;
        image.height = target_h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::{Annotation, Bbox, Image};

    fn two_image_dataset() -> Dataset {
        Dataset {
            images: vec![
                Image::new(1u64, "small.jpg", 400, 300),
                Image::new(2u64, "large.jpg", 800, 600),
            ],
            annotations: vec![
                Annotation::new(1u64, 1u64, Bbox::new(10.0, 10.0, 100.0, 50.0)),
                Annotation::new(2u64, 2u64, Bbox::new(10.0, 10.0, 100.0, 50.0)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn scale_factors_are_per_image() {
        let mut dataset = two_image_dataset();
        rescale_annotations(&mut dataset, (800, 600), ClampPolicy::PassThrough);

        // Image 1 was 400x300: both axes double.
        assert_eq!(dataset.annotations[0].bbox, Bbox::new(20.0, 20.0, 200.0, 100.0));
        // Image 2 was already 800x600: untouched.
        assert_eq!(dataset.annotations[1].bbox, Bbox::new(10.0, 10.0, 100.0, 50.0));

        for image in &dataset.images {
            assert_eq!((image.width, image.height), (800, 600));
        }
    }

    #[test]
    fn second_pass_at_same_resolution_is_noop() {
        let mut dataset = two_image_dataset();
        rescale_annotations(&mut dataset, (800, 600), ClampPolicy::PassThrough);
        let after_first: Vec<Bbox> = dataset.annotations.iter().map(|a| a.bbox).collect();

        rescale_annotations(&mut dataset, (800, 600), ClampPolicy::PassThrough);
        let after_second: Vec<Bbox> = dataset.annotations.iter().map(|a| a.bbox).collect();

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn contained_boxes_stay_contained() {
        let mut dataset = two_image_dataset();
        rescale_annotations(&mut dataset, (97, 31), ClampPolicy::PassThrough);

        for ann in &dataset.annotations {
            assert!(ann.bbox.within_bounds(97.0, 31.0), "escaped: {:?}", ann.bbox);
        }
    }

    #[test]
    fn clamp_policy_clips_overhanging_boxes() {
        let mut dataset = Dataset {
            images: vec![Image::new(1u64, "a.jpg", 100, 100)],
            annotations: vec![Annotation::new(
                1u64,
                1u64,
                Bbox::new(90.0, 90.0, 20.0, 20.0),
            )],
            ..Default::default()
        };

        let mut passthrough = dataset.clone();
        rescale_annotations(&mut passthrough, (200, 200), ClampPolicy::PassThrough);
        assert_eq!(
            passthrough.annotations[0].bbox,
            Bbox::new(180.0, 180.0, 40.0, 40.0)
        );

        rescale_annotations(&mut dataset, (200, 200), ClampPolicy::Clamp);
        assert_eq!(
            dataset.annotations[0].bbox,
            Bbox::new(180.0, 180.0, 20.0, 20.0)
        );
        assert!(dataset.annotations[0].bbox.within_bounds(200.0, 200.0));
    }

    #[test]
    fn zero_dimension_image_is_skipped() {
        let mut dataset = Dataset {
            images: vec![Image::new(1u64, "broken.jpg", 0, 100)],
            annotations: vec![Annotation::new(1u64, 1u64, Bbox::new(1.0, 1.0, 2.0, 2.0))],
            ..Default::default()
        };
        rescale_annotations(&mut dataset, (200, 200), ClampPolicy::PassThrough);

        assert_eq!(dataset.annotations[0].bbox, Bbox::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!((dataset.images[0].width, dataset.images[0].height), (0, 100));
    }
}
