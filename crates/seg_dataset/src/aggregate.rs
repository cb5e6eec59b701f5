//! Aggregation of per-image stats into the persisted sampling indices.

use crate::types::{ClassId, DatasetError, DatasetResult};
use data_contracts::{ClassCounts, PerImageStats};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SAMPLE_CLASS_STATS_FILE: &str = "sample_class_stats.json";
pub const SAMPLE_CLASS_STATS_DICT_FILE: &str = "sample_class_stats_dict.json";
pub const SAMPLES_WITH_CLASS_FILE: &str = "samples_with_class.json";

/// Drop absent results, keeping the order of the rest.
pub fn collect_stats(results: Vec<Option<PerImageStats>>) -> Vec<PerImageStats> {
    results.into_iter().flatten().collect()
}

/// Label image path → class counts, in stats order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStatsIndex {
    entries: Vec<(PathBuf, ClassCounts)>,
}

impl FileStatsIndex {
    /// A repeated path keeps its first position and takes the latest counts.
    pub fn from_stats(stats: &[PerImageStats]) -> Self {
        let mut entries: Vec<(PathBuf, ClassCounts)> = Vec::with_capacity(stats.len());
        let mut position: HashMap<PathBuf, usize> = HashMap::with_capacity(stats.len());
        for record in stats {
            let (file, counts) = record.clone().into_parts();
            match position.get(&file) {
                Some(&i) => entries[i].1 = counts,
                None => {
                    position.insert(file.clone(), entries.len());
                    entries.push((file, counts));
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, file: &Path) -> Option<&ClassCounts> {
        self.entries
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, counts)| counts)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ClassCounts)> {
        self.entries.iter().map(|(f, c)| (f, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FileStatsIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (file, counts) in &self.entries {
            map.serialize_entry(file, counts)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FileStatsIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = FileStatsIndex;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of label file to class counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((file, counts)) = access.next_entry::<PathBuf, ClassCounts>()? {
                    entries.push((file, counts));
                }
                Ok(FileStatsIndex { entries })
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}

/// Class → `(label file, pixel count)` for every file containing the class.
///
/// Classes absent from every file have no key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassInvertedIndex(pub BTreeMap<ClassId, Vec<(PathBuf, u64)>>);

impl ClassInvertedIndex {
    pub fn from_file_index(index: &FileStatsIndex) -> Self {
        let mut by_class: BTreeMap<ClassId, Vec<(PathBuf, u64)>> = BTreeMap::new();
        for (file, counts) in index.iter() {
            for (class, n) in counts.iter() {
                by_class.entry(class).or_default().push((file.clone(), n));
            }
        }
        Self(by_class)
    }

    pub fn samples(&self, class: ClassId) -> &[(PathBuf, u64)] {
        self.0.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.0.keys().copied()
    }
}

/// The three persisted class-statistics artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassStatsIndices {
    pub stats: Vec<PerImageStats>,
    pub by_file: FileStatsIndex,
    pub by_class: ClassInvertedIndex,
}

impl ClassStatsIndices {
    pub fn build(stats: Vec<PerImageStats>) -> Self {
        let by_file = FileStatsIndex::from_stats(&stats);
        let by_class = ClassInvertedIndex::from_file_index(&by_file);
        Self {
            stats,
            by_file,
            by_class,
        }
    }

    /// Dispatcher output → indices, dropping non-training results.
    pub fn from_results(results: Vec<Option<PerImageStats>>) -> Self {
        Self::build(collect_stats(results))
    }

    pub fn save(&self, out_dir: &Path) -> DatasetResult<()> {
        fs::create_dir_all(out_dir).map_err(|e| DatasetError::Io {
            path: out_dir.to_path_buf(),
            source: e,
        })?;
        write_json(&out_dir.join(SAMPLE_CLASS_STATS_FILE), &self.stats)?;
        write_json(&out_dir.join(SAMPLE_CLASS_STATS_DICT_FILE), &self.by_file)?;
        write_json(&out_dir.join(SAMPLES_WITH_CLASS_FILE), &self.by_class)?;
        log::info!(
            "wrote class stats for {} images ({} classes present) to {}",
            self.stats.len(),
            self.by_class.0.len(),
            out_dir.display()
        );
        Ok(())
    }
}

/// Reload a previously written `sample_class_stats.json`.
pub fn load_stats(out_dir: &Path) -> DatasetResult<Vec<PerImageStats>> {
    let path = out_dir.join(SAMPLE_CLASS_STATS_FILE);
    let raw = fs::read(&path).map_err(|e| DatasetError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_slice(&raw).map_err(|e| DatasetError::Json { path, source: e })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> DatasetResult<()> {
    let io_err = |e: std::io::Error| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| DatasetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(file: &str, counts: &[(ClassId, u64)]) -> PerImageStats {
        PerImageStats::new(file, counts.iter().copied().collect())
    }

    #[test]
    fn builds_indices_for_two_files() {
        let indices = ClassStatsIndices::from_results(vec![
            Some(stats("A_label", &[(0, 100)])),
            None,
            Some(stats("B_label", &[(0, 50), (1, 10)])),
        ]);
        assert_eq!(indices.stats.len(), 2);

        let dict = serde_json::to_string(&indices.by_file).unwrap();
        assert_eq!(dict, r#"{"A_label":{"0":100},"B_label":{"0":50,"1":10}}"#);

        let inverted = serde_json::to_string(&indices.by_class).unwrap();
        assert_eq!(
            inverted,
            r#"{"0":[["A_label",100],["B_label",50]],"1":[["B_label",10]]}"#
        );
    }

    #[test]
    fn empty_counts_stay_in_stats_but_not_in_inverted_index() {
        let indices = ClassStatsIndices::build(vec![stats("empty", &[]), stats("one", &[(4, 2)])]);
        assert_eq!(indices.by_file.len(), 2);
        assert!(indices.by_file.get(Path::new("empty")).unwrap().is_empty());
        assert_eq!(indices.by_class.classes().collect::<Vec<_>>(), vec![4]);
        assert!(indices.by_class.samples(0).is_empty());
    }

    #[test]
    fn inverted_index_matches_file_index() {
        let indices = ClassStatsIndices::build(vec![
            stats("a", &[(0, 1), (2, 5)]),
            stats("b", &[(2, 3)]),
            stats("c", &[(0, 9), (7, 1)]),
        ]);
        for (file, counts) in indices.by_file.iter() {
            for (class, n) in counts.iter() {
                let hits = indices
                    .by_class
                    .samples(class)
                    .iter()
                    .filter(|(f, m)| f == file && *m == n)
                    .count();
                assert_eq!(hits, 1);
            }
        }
        let pairs: usize = indices.by_class.0.values().map(Vec::len).sum();
        let entries: usize = indices.by_file.iter().map(|(_, c)| c.len()).sum();
        assert_eq!(pairs, entries);
    }

    #[test]
    fn file_index_round_trips_in_order() {
        let index = FileStatsIndex::from_stats(&[stats("z", &[(1, 1)]), stats("a", &[(2, 2)])]);
        let json = serde_json::to_string(&index).unwrap();
        let back: FileStatsIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
        assert_eq!(back.iter().next().map(|(f, _)| f.clone()), Some(PathBuf::from("z")));
    }
}
