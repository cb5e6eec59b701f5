//! Per-split manifests of base file identifiers.

use crate::discovery::files_in_split;
use crate::labels::POLYGON_SUFFIX;
use crate::types::{AnnotationFile, DatasetError, DatasetResult, Split};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitManifest {
    pub split: Split,
    /// Base identifiers in discovery order, e.g. `aachen/aachen_000000_000019`.
    pub ids: Vec<String>,
}

impl SplitManifest {
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.split)
    }

    pub fn write(&self, out_dir: &Path) -> DatasetResult<PathBuf> {
        let path = out_dir.join(self.file_name());
        let io_err = |e: std::io::Error| DatasetError::Io {
            path: path.clone(),
            source: e,
        };
        let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
        for id in &self.ids {
            writeln!(writer, "{id}").map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;
        Ok(path)
    }
}

/// Strip `_<annotation_subdir>_polygons.json` (or just `_polygons.json`) from the split-relative path.
pub fn base_identifier(file: &AnnotationFile, annotation_subdir: &str) -> String {
    let rel = file
        .relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let full_suffix = format!("_{annotation_subdir}{POLYGON_SUFFIX}");
    rel.strip_suffix(full_suffix.as_str())
        .or_else(|| rel.strip_suffix(POLYGON_SUFFIX))
        .unwrap_or(rel.as_str())
        .to_string()
}

/// One manifest per split, always all three, even when a split has no files.
pub fn build_split_manifests(files: &[AnnotationFile], annotation_subdir: &str) -> Vec<SplitManifest> {
    Split::ALL
        .into_iter()
        .map(|split| SplitManifest {
            split,
            ids: files_in_split(files, split)
                .map(|f| base_identifier(f, annotation_subdir))
                .collect(),
        })
        .collect()
}

pub fn write_split_manifests(out_dir: &Path, manifests: &[SplitManifest]) -> DatasetResult<()> {
    for manifest in manifests {
        let path = manifest.write(out_dir)?;
        log::info!("wrote {} ids to {}", manifest.ids.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(split: Option<Split>, relative: &str) -> AnnotationFile {
        AnnotationFile {
            path: PathBuf::from("gtFine").join(relative),
            relative: PathBuf::from(relative),
            split,
        }
    }

    #[test]
    fn strips_annotation_suffix() {
        let f = file(Some(Split::Train), "aachen/aachen_000000_000019_gtFine_polygons.json");
        assert_eq!(base_identifier(&f, "gtFine"), "aachen/aachen_000000_000019");
        let coarse = file(Some(Split::Train), "a/a_1_gtCoarse_polygons.json");
        assert_eq!(base_identifier(&coarse, "gtFine"), "a/a_1_gtCoarse");
        assert_eq!(base_identifier(&coarse, "gtCoarse"), "a/a_1");
    }

    #[test]
    fn every_split_gets_a_manifest() {
        let files = vec![
            file(Some(Split::Val), "b/b_0_gtFine_polygons.json"),
            file(Some(Split::Train), "a/a_0_gtFine_polygons.json"),
            file(None, "extra/e_0_gtFine_polygons.json"),
        ];
        let manifests = build_split_manifests(&files, "gtFine");
        assert_eq!(manifests.len(), 3);
        assert_eq!(manifests[0].ids, vec!["a/a_0".to_string()]);
        assert_eq!(manifests[1].ids, vec!["b/b_0".to_string()]);
        assert!(manifests[2].ids.is_empty());
        assert_eq!(manifests[2].file_name(), "test.txt");
    }
}
