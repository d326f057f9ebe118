//! COCO JSON reader and writer.
//!
//! Loading is strict about the two arrays the engines interpret (`images`
//! and `annotations` must be present and well-formed) and lenient about
//! everything else. Writing creates parent directories as needed and never
//! mutates the input file a dataset was loaded from.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::model::Dataset;
use crate::error::CocoPrepError;

/// Reads a dataset from a COCO JSON file.
///
/// # Errors
/// Returns [`CocoPrepError::CocoJsonParse`] when the file is not valid JSON
/// or lacks the required `images`/`annotations` arrays, and
/// [`CocoPrepError::Io`] when it cannot be opened.
pub fn load_coco_json(path: &Path) -> Result<Dataset, CocoPrepError> {
    let file = File::open(path).map_err(CocoPrepError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocoPrepError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a dataset to a COCO JSON file, creating parent directories as
/// needed.
pub fn save_coco_json(path: &Path, dataset: &Dataset) -> Result<(), CocoPrepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path).map_err(CocoPrepError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, dataset).map_err(|source| CocoPrepError::CocoJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a dataset from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes a dataset to a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn to_coco_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coco_json() -> &'static str {
        r#"{
            "licenses": [{"id": 1, "name": "CC BY 4.0", "url": ""}],
            "info": {"year": 2023, "description": "Test dataset"},
            "categories": [{"id": 1, "name": "person", "supercategory": "human"}],
            "images": [
                {"id": 1, "width": 640, "height": 480, "file_name": "image001.jpg", "license": 1}
            ],
            "annotations": [
                {
                    "id": 1,
                    "image_id": 1,
                    "category_id": 1,
                    "bbox": [10.0, 20.0, 90.0, 60.0],
                    "area": 5400.0,
                    "iscrowd": 0
                }
            ]
        }"#
    }

    #[test]
    fn parses_core_fields() {
        let dataset = from_coco_str(sample_coco_json()).expect("parse failed");

        assert_eq!(dataset.images.len(), 1);
        assert_eq!(dataset.annotations.len(), 1);

        let img = &dataset.images[0];
        assert_eq!(img.id.as_u64(), 1);
        assert_eq!(img.file_name, "image001.jpg");
        assert_eq!((img.width, img.height), (640, 480));

        let ann = &dataset.annotations[0];
        assert_eq!(ann.image_id.as_u64(), 1);
        assert_eq!(ann.bbox.0, [10.0, 20.0, 90.0, 60.0]);
    }

    #[test]
    fn roundtrip_preserves_passthrough_blocks() {
        let original = from_coco_str(sample_coco_json()).expect("parse failed");
        let json = to_coco_string(&original).expect("serialize failed");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["licenses"][0]["name"], "CC BY 4.0");
        assert_eq!(value["info"]["year"], 2023);
        assert_eq!(value["categories"][0]["name"], "person");
        assert_eq!(value["annotations"][0]["area"], 5400.0);
        assert_eq!(value["images"][0]["license"], 1);
    }

    #[test]
    fn absent_optional_blocks_stay_absent() {
        let minimal = r#"{"images": [], "annotations": []}"#;
        let dataset = from_coco_str(minimal).expect("parse failed");
        let json = to_coco_string(&dataset).expect("serialize failed");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("licenses").is_none());
        assert!(value.get("info").is_none());
        assert!(value.get("categories").is_none());
    }

    #[test]
    fn missing_required_arrays_fail_to_parse() {
        assert!(from_coco_str(r#"{"images": []}"#).is_err());
        assert!(from_coco_str("not json at all").is_err());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_coco_json(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, CocoPrepError::Io(_)));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.json");
        let dataset = from_coco_str(r#"{"images": [], "annotations": []}"#).unwrap();

        save_coco_json(&path, &dataset).expect("save failed");
        assert!(path.is_file());
    }
}
