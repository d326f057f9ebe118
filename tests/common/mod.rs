use std::fs;
use std::path::Path;

use serde_json::json;

/// Builds a minimal valid 24-bit BMP of the given size.
///
/// Cheap to synthesize, decodable by the image codec, and probe-able by
/// `imagesize`, which makes it the raster of choice for scratch datasets.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Builds a complete COCO document from image and annotation tuples.
///
/// Images are `(id, file_name, width, height)`; annotations are
/// `(id, image_id, bbox)`.
pub fn coco_json(images: &[(u64, &str, u32, u32)], annotations: &[(u64, u64, [f64; 4])]) -> String {
    let images: Vec<_> = images
        .iter()
        .map(|(id, file_name, width, height)| {
            json!({
                "id": id,
                "file_name": file_name,
                "width": width,
                "height": height,
                "license": 1
            })
        })
        .collect();

    let annotations: Vec<_> = annotations
        .iter()
        .map(|(id, image_id, bbox)| {
            json!({
                "id": id,
                "image_id": image_id,
                "category_id": 1,
                "bbox": bbox,
                "area": bbox[2] * bbox[3],
                "iscrowd": 0
            })
        })
        .collect();

    json!({
        "licenses": [{"id": 1, "name": "CC BY 4.0", "url": ""}],
        "info": {"year": 2023, "description": "scratch dataset"},
        "categories": [{"id": 1, "name": "object", "supercategory": "none"}],
        "images": images,
        "annotations": annotations
    })
    .to_string()
}

pub fn write_coco_json(
    path: &Path,
    images: &[(u64, &str, u32, u32)],
    annotations: &[(u64, u64, [f64; 4])],
) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, coco_json(images, annotations)).expect("write annotation file");
}
