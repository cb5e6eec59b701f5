//! Core types and error definitions for seg_dataset.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use data_contracts::ClassId;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid annotation at {path}: {source}")]
    Annotation {
        path: PathBuf,
        #[source]
        source: data_contracts::AnnotationError,
    },
    #[error("label not known: '{label}' in {path}")]
    UnknownLabel { path: PathBuf, label: String },
    #[error("directory missing: {path}")]
    MissingDirectory { path: PathBuf },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("{0}")]
    Other(String),
}

/// Dataset split a file was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// Exact match on a directory name; `train_extra` is not `train`.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Split::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered polygon annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFile {
    pub path: PathBuf,
    /// Path relative to the split directory (or the annotation root when `split` is `None`).
    pub relative: PathBuf,
    pub split: Option<Split>,
}

impl AnnotationFile {
    pub fn is_train(&self) -> bool {
        self.split == Some(Split::Train)
    }
}
