//! Shared data contracts for polygon annotations and class statistics records.

pub mod annotation;
pub mod class_stats;

pub use annotation::{AnnotatedObject, AnnotationError, PolygonAnnotation};
pub use class_stats::{ClassCounts, ClassId, PerImageStats, FILE_KEY};
