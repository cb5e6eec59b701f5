//! End-to-end preparation: discover, convert, aggregate, write manifests.

use crate::aggregate::{load_stats, ClassStatsIndices};
use crate::discovery::{count_by_split, discover_annotations};
use crate::dispatch::{convert_all, ConvertOptions};
use crate::rasterize::Rasterizer;
use crate::splits::{build_split_manifests, write_split_manifests, SplitManifest};
use crate::types::{DatasetError, DatasetResult, Split};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub input_root: PathBuf,
    pub annotation_subdir: String,
    /// Where indices and manifests go.
    pub output_dir: PathBuf,
    pub convert: ConvertOptions,
    /// Skip rasterization and rebuild indices from an existing `sample_class_stats.json`.
    pub only_postprocessing: bool,
}

impl PrepareOptions {
    /// Options for `input_root`, writing outputs next to the dataset.
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        let input_root = input_root.into();
        Self {
            output_dir: input_root.clone(),
            input_root,
            annotation_subdir: "gtFine".to_string(),
            convert: ConvertOptions::default(),
            only_postprocessing: false,
        }
    }

    pub fn annotation_root(&self) -> PathBuf {
        self.input_root.join(&self.annotation_subdir)
    }

    /// Redirect indices and manifests; `None` keeps the current directory.
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct PrepareReport {
    pub output_dir: PathBuf,
    pub discovered: usize,
    pub converted: usize,
    pub unsplit: usize,
    pub indices: ClassStatsIndices,
    pub manifests: Vec<SplitManifest>,
}

impl PrepareReport {
    pub fn manifest(&self, split: Split) -> Option<&SplitManifest> {
        self.manifests.iter().find(|m| m.split == split)
    }
}

pub fn prepare_dataset<R: Rasterizer + ?Sized>(
    opts: &PrepareOptions,
    rasterizer: &R,
) -> DatasetResult<PrepareReport> {
    let annotation_root = opts.annotation_root();
    if !opts.input_root.is_dir() {
        return Err(DatasetError::MissingDirectory {
            path: opts.input_root.clone(),
        });
    }
    let output_dir = opts.output_dir.clone();
    fs::create_dir_all(&output_dir).map_err(|e| DatasetError::Io {
        path: output_dir.clone(),
        source: e,
    })?;

    let files = discover_annotations(&annotation_root)?;
    let by_split = count_by_split(&files);
    for (split, n) in &by_split {
        match split {
            Some(s) => log::info!("{s}: {n} annotation files"),
            None => log::warn!("{n} annotation files outside train/val/test"),
        }
    }

    let (indices, converted) = if opts.only_postprocessing {
        log::info!("only post-processing; reloading stats from {}", output_dir.display());
        (ClassStatsIndices::build(load_stats(&output_dir)?), 0)
    } else {
        let results = convert_all(rasterizer, &files, &opts.convert)?;
        let converted = results.len();
        (ClassStatsIndices::from_results(results), converted)
    };
    indices.save(&output_dir)?;

    let manifests = build_split_manifests(&files, &opts.annotation_subdir);
    write_split_manifests(&output_dir, &manifests)?;

    Ok(PrepareReport {
        output_dir,
        discovered: files.len(),
        converted,
        unsplit: by_split.get(&None).copied().unwrap_or(0),
        indices,
        manifests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_default_to_the_dataset_root() {
        let opts = PrepareOptions::new("data/cityscapes");
        assert_eq!(opts.output_dir, PathBuf::from("data/cityscapes"));
        assert_eq!(opts.annotation_root(), PathBuf::from("data/cityscapes/gtFine"));

        let kept = PrepareOptions::new("data/cityscapes").with_output_dir(None);
        assert_eq!(kept.output_dir, PathBuf::from("data/cityscapes"));

        let moved = PrepareOptions::new("data/cityscapes").with_output_dir(Some("out".into()));
        assert_eq!(moved.output_dir, PathBuf::from("out"));
    }
}
