use std::fs;

use cocoprep::coco::io_json;
use cocoprep::resize::{resize_dataset, ResizeOptions};

mod common;

#[test]
fn resize_adjusts_each_image_by_its_own_factors() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    let output_dir = dir.path().join("out");
    let annotation_file = dir.path().join("drone_set.json");

    common::write_bmp(&images_dir.join("small.bmp"), 400, 300);
    common::write_bmp(&images_dir.join("large.bmp"), 800, 600);
    common::write_coco_json(
        &annotation_file,
        &[(1, "small.bmp", 400, 300), (2, "large.bmp", 800, 600)],
        &[
            (1, 1, [10.0, 10.0, 100.0, 50.0]),
            (2, 2, [10.0, 10.0, 100.0, 50.0]),
        ],
    );

    let opts = ResizeOptions {
        resolution: (800, 600),
        ..Default::default()
    };
    let outcome = resize_dataset(&images_dir, &output_dir, &annotation_file, &opts).unwrap();

    assert!(outcome.report.is_complete());
    assert_eq!(outcome.report.resized, 2);

    // Both rasters land at the target resolution under their original names.
    for name in ["small.bmp", "large.bmp"] {
        let size = imagesize::size(output_dir.join("images").join(name)).unwrap();
        assert_eq!((size.width, size.height), (800, 600));
    }

    // The adjusted file is derived from the input stem; the input is untouched.
    assert_eq!(
        outcome.adjusted_annotations,
        output_dir.join("annotations/drone_set_adjusted.json")
    );
    let original = io_json::load_coco_json(&annotation_file).unwrap();
    assert_eq!(original.annotations[0].bbox.0, [10.0, 10.0, 100.0, 50.0]);

    // Image 1 was 400x300: factors (2, 2). Image 2 was already at target.
    let adjusted = io_json::load_coco_json(&outcome.adjusted_annotations).unwrap();
    assert_eq!(adjusted.annotations[0].bbox.0, [20.0, 20.0, 200.0, 100.0]);
    assert_eq!(adjusted.annotations[1].bbox.0, [10.0, 10.0, 100.0, 50.0]);
    for image in &adjusted.images {
        assert_eq!((image.width, image.height), (800, 600));
    }
}

#[test]
fn corrupt_image_is_skipped_without_aborting_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    let output_dir = dir.path().join("out");
    let annotation_file = dir.path().join("annotations.json");

    common::write_bmp(&images_dir.join("good.bmp"), 100, 100);
    fs::write(images_dir.join("corrupt.png"), b"definitely not a png").unwrap();
    common::write_coco_json(
        &annotation_file,
        &[(1, "good.bmp", 100, 100)],
        &[(1, 1, [5.0, 5.0, 10.0, 10.0])],
    );

    let opts = ResizeOptions {
        resolution: (50, 50),
        ..Default::default()
    };
    let outcome = resize_dataset(&images_dir, &output_dir, &annotation_file, &opts).unwrap();

    assert_eq!(outcome.report.resized, 1);
    assert_eq!(outcome.report.failures.len(), 1);
    assert!(outcome.report.failures[0]
        .path
        .to_string_lossy()
        .contains("corrupt.png"));

    // The healthy file still made it through.
    assert!(output_dir.join("images/good.bmp").is_file());
    let adjusted = io_json::load_coco_json(&outcome.adjusted_annotations).unwrap();
    assert_eq!(adjusted.annotations[0].bbox.0, [2.5, 2.5, 5.0, 5.0]);
}

#[test]
fn malformed_annotation_file_fails_before_writing_output() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    let output_dir = dir.path().join("out");
    let annotation_file = dir.path().join("broken.json");

    common::write_bmp(&images_dir.join("a.bmp"), 10, 10);
    fs::write(&annotation_file, b"{ not json").unwrap();

    let err = resize_dataset(
        &images_dir,
        &output_dir,
        &annotation_file,
        &ResizeOptions::default(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("broken.json"));
    assert!(!output_dir.exists());
}
