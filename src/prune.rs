//! Unannotated-image cleanup.
//!
//! Images that own no annotations are moved into an `_trash` directory
//! beside the rest of the image files (non-destructive cleaning), and a
//! new annotation file without them is written next to the input file.
//! Records whose files are already missing from disk are dropped from the
//! output as well.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::coco::{io_json, AnnotationIndex, ImageId};
use crate::error::CocoPrepError;

/// Counts and output location for a prune run.
#[derive(Debug)]
pub struct PruneSummary {
    /// Unannotated images moved to the `_trash` directory.
    pub trashed: usize,
    /// Records dropped because their file was missing from disk.
    pub dropped_missing: usize,
    /// Where the cleaned annotation file was written.
    pub output: PathBuf,
}

/// Moves unannotated images to `<images_dir>/_trash/` and writes a cleaned
/// annotation file as `new_annotations.json` beside the input file.
pub fn prune_unannotated(
    images_dir: &Path,
    annotation_file: &Path,
) -> Result<PruneSummary, CocoPrepError> {
    let dataset = io_json::load_coco_json(annotation_file)?;
    let index = AnnotationIndex::build(&dataset.annotations);

    let trash_dir = images_dir.join("_trash");
    let mut trashed = 0;
    let mut dropped_missing = 0;
    let mut removed: HashSet<ImageId> = HashSet::new();

    for image in &dataset.images {
        if index.is_annotated(image.id) {
            continue;
        }

        let src = images_dir.join(&image.file_name);
        if src.is_file() {
            if trashed == 0 {
                fs::create_dir_all(&trash_dir)?;
            }
            fs::rename(&src, trash_dir.join(&image.file_name))?;
            trashed += 1;
        } else {
            warn!(
                "file {} does not exist and will be removed from annotations",
                image.file_name
            );
            dropped_missing += 1;
        }
        removed.insert(image.id);
    }

    let cleaned = crate::split::subset_by_image_ids(&dataset, |id| !removed.contains(&id));

    let output = annotation_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("new_annotations.json");
    io_json::save_coco_json(&output, &cleaned)?;

    info!(
        "pruned {} unannotated image(s), dropped {} missing record(s)",
        trashed, dropped_missing
    );

    Ok(PruneSummary {
        trashed,
        dropped_missing,
        output,
    })
}
