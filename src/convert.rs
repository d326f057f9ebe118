//! PNG to JPG conversion over a directory tree.
//!
//! Every `.png` under the input root is re-encoded as a `.jpg` next to it,
//! keeping the directory structure and file stems. The original PNG files
//! are left in place.

use std::path::Path;

use log::warn;
use walkdir::WalkDir;

use crate::codec;
use crate::error::CocoPrepError;
use crate::progress::progress_bar;

/// Counts for a conversion run.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertSummary {
    /// Files converted successfully.
    pub converted: usize,
    /// Files skipped because decoding or encoding failed.
    pub failed: usize,
}

/// Converts every PNG under `input_root` to a sibling JPG at `quality`.
///
/// Per-file failures are logged with the file name and skipped.
pub fn convert_png_tree(input_root: &Path, quality: u8) -> Result<ConvertSummary, CocoPrepError> {
    let pngs: Vec<_> = WalkDir::new(input_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    let pb = progress_bar(pngs.len() as u64, "Converting");
    let mut summary = ConvertSummary::default();

    for path in &pngs {
        let result = codec::decode(path)
            .and_then(|img| codec::encode(&img, &path.with_extension("jpg"), quality));
        pb.inc(1);

        match result {
            Ok(()) => summary.converted += 1,
            Err(err) => {
                warn!("skipping {}: {}", path.display(), err);
                summary.failed += 1;
            }
        }
    }

    pb.finish_with_message("Conversion complete");
    Ok(summary)
}
