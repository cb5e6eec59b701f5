//! Persisted per-image class statistics.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Integer class identifier in `[0, K)`.
pub type ClassId = u8;

/// Reserved key holding the label image path in a serialized [`PerImageStats`].
pub const FILE_KEY: &str = "file";

/// Pixel count per class. Only classes with a non-zero count are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassCounts(pub BTreeMap<ClassId, u64>);

impl ClassCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds counts from a dense histogram, keeping classes below `num_classes` with pixels.
    pub fn from_histogram(histogram: &[u64], num_classes: usize) -> Self {
        let counts = histogram
            .iter()
            .take(num_classes)
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .map(|(c, n)| (c as ClassId, *n))
            .collect();
        Self(counts)
    }

    pub fn get(&self, class: ClassId) -> Option<u64> {
        self.0.get(&class).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, u64)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }
}

impl FromIterator<(ClassId, u64)> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = (ClassId, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Class population of one training label image.
///
/// Serialized as a flat JSON object: one `"<class>": count` entry per class in
/// ascending order, followed by `"file": "<label image path>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerImageStats {
    pub file: PathBuf,
    pub counts: ClassCounts,
}

impl PerImageStats {
    pub fn new(file: impl Into<PathBuf>, counts: ClassCounts) -> Self {
        Self {
            file: file.into(),
            counts,
        }
    }

    /// Splits the record into its path and counts, dropping the reserved key.
    pub fn into_parts(self) -> (PathBuf, ClassCounts) {
        (self.file, self.counts)
    }
}

impl Serialize for PerImageStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 1))?;
        for (class, n) in self.counts.iter() {
            map.serialize_entry(&class.to_string(), &n)?;
        }
        map.serialize_entry(FILE_KEY, &self.file)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for PerImageStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatsVisitor;

        impl<'de> Visitor<'de> for StatsVisitor {
            type Value = PerImageStats;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of class counts with a \"file\" key")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut file: Option<PathBuf> = None;
                let mut counts = BTreeMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == FILE_KEY {
                        if file.is_some() {
                            return Err(de::Error::duplicate_field(FILE_KEY));
                        }
                        file = Some(access.next_value()?);
                        continue;
                    }
                    let class: ClassId = key.parse().map_err(|_| {
                        de::Error::invalid_value(de::Unexpected::Str(&key), &"a class id")
                    })?;
                    counts.insert(class, access.next_value()?);
                }
                let file = file.ok_or_else(|| de::Error::missing_field(FILE_KEY))?;
                Ok(PerImageStats {
                    file,
                    counts: ClassCounts(counts),
                })
            }
        }

        deserializer.deserialize_map(StatsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_counts_before_file() {
        let stats = PerImageStats::new(
            "a_labelTrainIds.png",
            ClassCounts::from_iter([(10, 3), (2, 7)]),
        );
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"2":7,"10":3,"file":"a_labelTrainIds.png"}"#);
    }

    #[test]
    fn reads_back_written_record() {
        let raw = r#"{"0": 100, "file": "x.png", "5": 1}"#;
        let stats: PerImageStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.file, PathBuf::from("x.png"));
        assert_eq!(stats.counts.get(0), Some(100));
        assert_eq!(stats.counts.get(5), Some(1));
        assert_eq!(stats.counts.len(), 2);
    }

    #[test]
    fn missing_file_key_is_rejected() {
        let err = serde_json::from_str::<PerImageStats>(r#"{"0": 1}"#).unwrap_err();
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn histogram_drops_zero_and_out_of_palette_classes() {
        let mut hist = vec![0u64; 256];
        hist[0] = 4;
        hist[3] = 1;
        hist[255] = 9;
        let counts = ClassCounts::from_histogram(&hist, 19);
        assert_eq!(counts, ClassCounts::from_iter([(0, 4), (3, 1)]));
    }
}
