//! Core dataset model for COCO-style annotation files.
//!
//! The model is deliberately minimal: only the fields the engines actually
//! interpret (`id`, `file_name`, `width`, `height`, `image_id`, `bbox`) are
//! typed. Everything else an annotation file carries - category definitions,
//! license blocks, segmentation polygons, capture metadata - is preserved
//! verbatim and re-emitted untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::bbox::Bbox;
use super::ids::{AnnotationId, ImageId};

/// A complete COCO-style dataset.
///
/// `licenses`, `info`, and `categories` are opaque pass-through blocks: they
/// are kept exactly as loaded and a key that was absent in the input stays
/// absent in the output.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// License definitions, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Value>,

    /// Dataset metadata block, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,

    /// Category definitions, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Value>,

    /// All images in the dataset.
    pub images: Vec<Image>,

    /// All annotations, each owned by exactly one image via `image_id`.
    pub annotations: Vec<Annotation>,
}

impl Dataset {
    /// Returns the distinct image IDs in ascending order.
    ///
    /// The deterministic ordering matters: the partition engine shuffles
    /// this list under a caller-supplied seed, and a stable starting order
    /// is what makes the shuffle reproducible.
    pub fn distinct_image_ids(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self.images.iter().map(|img| img.id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// An image record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Image {
    /// Unique identifier for this image.
    pub id: ImageId,

    /// Filename relative to the dataset's image directory.
    pub file_name: String,

    /// Width in pixels of the raster currently stored on disk.
    pub width: u32,

    /// Height in pixels of the raster currently stored on disk.
    pub height: u32,

    /// All other fields (license, date_captured, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Image {
    /// Creates a new image record with the given properties.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            extra: serde_json::Map::new(),
        }
    }
}

/// An annotation record (bounding box plus opaque metadata).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier for this annotation.
    pub id: AnnotationId,

    /// ID of the image this annotation belongs to.
    pub image_id: ImageId,

    /// Bounding box in pixel coordinates (COCO XYWH format).
    pub bbox: Bbox,

    /// All other fields (category_id, area, iscrowd, segmentation, ...),
    /// preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Annotation {
    /// Creates a new annotation with the minimum required fields.
    pub fn new(id: impl Into<AnnotationId>, image_id: impl Into<ImageId>, bbox: Bbox) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            bbox,
            extra: serde_json::Map::new(),
        }
    }
}

/// A lookup table from image ID to the positions of its annotations.
///
/// Built once per run so every "annotations of this image" query is a map
/// lookup instead of a scan over the whole annotation sequence.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    by_image: HashMap<ImageId, Vec<usize>>,
}

impl AnnotationIndex {
    /// Builds the index over an annotation sequence.
    pub fn build(annotations: &[Annotation]) -> Self {
        let mut by_image: HashMap<ImageId, Vec<usize>> = HashMap::new();
        for (idx, ann) in annotations.iter().enumerate() {
            by_image.entry(ann.image_id).or_default().push(idx);
        }
        Self { by_image }
    }

    /// Returns the annotation positions belonging to `image_id`.
    pub fn for_image(&self, image_id: ImageId) -> &[usize] {
        self.by_image
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if `image_id` owns at least one annotation.
    pub fn is_annotated(&self, image_id: ImageId) -> bool {
        !self.for_image(image_id).is_empty()
    }
}
