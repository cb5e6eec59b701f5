use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One labelled region of a polygon annotation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedObject {
    pub label: String,
    /// Vertices in pixel coordinates, `[x, y]`.
    pub polygon: Vec<[f64; 2]>,
    /// Non-zero when the annotator removed the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u8>,
}

impl AnnotatedObject {
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some_and(|d| d != 0)
    }
}

/// A Cityscapes-style `*_polygons.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonAnnotation {
    pub img_height: u32,
    pub img_width: u32,
    #[serde(default)]
    pub objects: Vec<AnnotatedObject>,
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("image size {width}x{height} is empty")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("object {index} ({label}) has a non-finite vertex")]
    NonFiniteVertex { index: usize, label: String },
}

impl PolygonAnnotation {
    /// Structural checks only; polygon geometry is taken as-is.
    pub fn validate(&self) -> Result<(), AnnotationError> {
        if self.img_width == 0 || self.img_height == 0 {
            return Err(AnnotationError::EmptyCanvas {
                width: self.img_width,
                height: self.img_height,
            });
        }
        for (index, obj) in self.objects.iter().enumerate() {
            if obj.polygon.iter().flatten().any(|v| !v.is_finite()) {
                return Err(AnnotationError::NonFiniteVertex {
                    index,
                    label: obj.label.clone(),
                });
            }
        }
        Ok(())
    }
}
