//! Per-file class population counts.

use crate::types::{AnnotationFile, DatasetError, DatasetResult};
use data_contracts::{ClassCounts, PerImageStats};
use image::GrayImage;
use std::path::Path;

/// Counts every pixel value of `label` in a single pass.
pub fn histogram(label: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for px in label.as_raw() {
        hist[*px as usize] += 1;
    }
    hist
}

/// Class counts of an in-memory label image, restricted to `[0, num_classes)`.
pub fn class_counts(label: &GrayImage, num_classes: usize) -> ClassCounts {
    ClassCounts::from_histogram(&histogram(label), num_classes)
}

/// Stats for a freshly written label image.
///
/// Returns `Ok(None)` for files outside the training split without touching
/// the image; training files are loaded exactly once.
pub fn extract_class_stats(
    label_path: &Path,
    annotation: &AnnotationFile,
    num_classes: usize,
) -> DatasetResult<Option<PerImageStats>> {
    if !annotation.is_train() {
        return Ok(None);
    }
    let label = image::open(label_path)
        .map_err(|e| DatasetError::Image {
            path: label_path.to_path_buf(),
            source: e,
        })?
        .into_luma8();
    Ok(Some(PerImageStats::new(
        label_path,
        class_counts(&label, num_classes),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Split;
    use image::Luma;

    #[test]
    fn ignore_only_image_has_empty_counts() {
        let img = GrayImage::from_pixel(3, 3, Luma([255]));
        let counts = class_counts(&img, 19);
        assert!(counts.is_empty());
    }

    #[test]
    fn counts_each_class_once() {
        let mut img = GrayImage::from_pixel(4, 2, Luma([0]));
        img.put_pixel(0, 0, Luma([18]));
        img.put_pixel(1, 0, Luma([19]));
        let counts = class_counts(&img, 19);
        assert_eq!(counts.get(0), Some(6));
        assert_eq!(counts.get(18), Some(1));
        assert_eq!(counts.get(19), None);
    }

    #[test]
    fn non_training_files_are_skipped_without_reading() {
        let file = AnnotationFile {
            path: "gtFine/val/a_gtFine_polygons.json".into(),
            relative: "a_gtFine_polygons.json".into(),
            split: Some(Split::Val),
        };
        let out = extract_class_stats(Path::new("does/not/exist.png"), &file, 19).unwrap();
        assert!(out.is_none());
    }
}
