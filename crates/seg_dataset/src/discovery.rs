//! Recursive discovery of polygon annotation files.

use crate::labels::POLYGON_SUFFIX;
use crate::types::{AnnotationFile, DatasetError, DatasetResult, Split};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Walk `annotation_root` and index every `*_polygons.json` file.
///
/// Traversal is depth-first with entries sorted by file name, so the result is
/// stable across runs. Symlinked directories are followed; hidden files
/// (`.`-prefixed, e.g. `._*` resource forks) are skipped, hidden directories
/// are still descended. The split of each file is the first directory below
/// `annotation_root`; files outside `train`/`val`/`test` get no split.
pub fn discover_annotations(annotation_root: &Path) -> DatasetResult<Vec<AnnotationFile>> {
    if !annotation_root.is_dir() {
        return Err(DatasetError::MissingDirectory {
            path: annotation_root.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(annotation_root)
        .follow_links(true)
        .sort_by_file_name() {
        let entry = entry.map_err(|e| DatasetError::Io {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| annotation_root.to_path_buf()),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_polygon = entry
            .file_name()
            .to_str()
            .is_some_and(|n| !n.starts_with('.') && n.ends_with(POLYGON_SUFFIX));
        if !is_polygon {
            continue;
        }
        let path = entry.into_path();
        let Ok(rel) = path.strip_prefix(annotation_root) else {
            continue;
        };
        let mut components = rel.components();
        let split = match components.next() {
            Some(Component::Normal(first)) if rel.components().count() > 1 => {
                first.to_str().and_then(Split::from_dir_name)
            }
            _ => None,
        };
        let relative = if split.is_some() {
            components.as_path().to_path_buf()
        } else {
            rel.to_path_buf()
        };
        files.push(AnnotationFile {
            path,
            relative,
            split,
        });
    }
    log::debug!(
        "discovered {} annotation files under {}",
        files.len(),
        annotation_root.display()
    );
    Ok(files)
}

/// Files of one split, in discovery order.
pub fn files_in_split(files: &[AnnotationFile], split: Split) -> impl Iterator<Item = &AnnotationFile> {
    files.iter().filter(move |f| f.split == Some(split))
}

/// Per-split file counts; files outside any split are counted under `None`.
pub fn count_by_split(files: &[AnnotationFile]) -> BTreeMap<Option<Split>, usize> {
    let mut counts = BTreeMap::new();
    for f in files {
        *counts.entry(f.split).or_insert(0) += 1;
    }
    counts
}
