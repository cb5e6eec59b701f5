//! Label materialization and class statistics for Cityscapes-style segmentation datasets.
//!
//! This crate provides utilities for:
//! - Discovering polygon annotation files per split
//! - Rasterizing polygons into label images
//! - Counting class pixels for rare-class sampling
//! - Persisting class indices and split manifests

pub mod aggregate;
pub mod discovery;
pub mod dispatch;
pub mod labels;
pub mod pipeline;
pub mod rasterize;
pub mod splits;
pub mod stats;
pub mod types;

pub use aggregate::{
    collect_stats, load_stats, ClassInvertedIndex, ClassStatsIndices, FileStatsIndex,
    SAMPLES_WITH_CLASS_FILE, SAMPLE_CLASS_STATS_DICT_FILE, SAMPLE_CLASS_STATS_FILE,
};
pub use discovery::{count_by_split, discover_annotations, files_in_split};
pub use dispatch::{convert_all, convert_one, dispatch, ConvertOptions};
pub use labels::{LabelScheme, CITYSCAPES_NUM_CLASSES, POLYGON_SUFFIX};
pub use pipeline::{prepare_dataset, PrepareOptions, PrepareReport};
pub use rasterize::{label_path_for, PolygonRasterizer, Rasterizer};
pub use splits::{base_identifier, build_split_manifests, write_split_manifests, SplitManifest};
pub use stats::{class_counts, extract_class_stats};
pub use types::*;

pub use data_contracts::{ClassCounts, PerImageStats};
