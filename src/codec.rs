//! Image codec collaborator: decode, resize, encode.
//!
//! Thin wrapper over the `image` crate so the engines deal in
//! [`CocoPrepError`] values carrying the offending path instead of raw
//! codec errors.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::CocoPrepError;

/// File extensions the resize batch will pick up.
pub const IMG_FORMATS: &[&str] = &["bmp", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Returns true if the path has a supported raster extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMG_FORMATS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decodes the raster file at `path`.
pub fn decode(path: &Path) -> Result<DynamicImage, CocoPrepError> {
    image::open(path).map_err(|source| CocoPrepError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Resizes to exactly `width x height`, ignoring the source aspect ratio.
///
/// Bilinear filtering, matching the fixed resampling the annotation
/// rescale assumes: every source pixel column maps to the same output
/// column regardless of the image's content.
pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Encodes `img` to `path`, with the format inferred from the extension.
///
/// JPEG output honours `quality` (1-100); other formats encode at their
/// default settings.
pub fn encode(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), CocoPrepError> {
    let is_jpeg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false);

    if is_jpeg {
        let file = File::create(path).map_err(CocoPrepError::Io)?;
        let writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(writer, quality);
        // JPEG has no alpha channel; flatten before encoding.
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|source| CocoPrepError::ImageEncode {
                path: path.to_path_buf(),
                source,
            })
    } else {
        img.save(path).map_err(|source| CocoPrepError::ImageEncode {
            path: path.to_path_buf(),
            source,
        })
    }
}
