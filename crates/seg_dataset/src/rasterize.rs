//! Polygon annotation → dense label image.

use crate::labels::{self, LabelScheme, POLYGON_SUFFIX};
use crate::types::{DatasetError, DatasetResult};
use data_contracts::PolygonAnnotation;
use image::{GrayImage, ImageFormat, Luma};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the label image for one annotation file.
///
/// Implementations must be callable from several worker threads at once; each
/// call writes only `output`.
pub trait Rasterizer: Sync {
    fn rasterize(&self, annotation: &Path, output: &Path, scheme: LabelScheme) -> DatasetResult<()>;
}

/// Label image path for `annotation`: `_polygons.json` becomes the scheme suffix, same directory.
pub fn label_path_for(annotation: &Path, scheme: LabelScheme) -> PathBuf {
    let name = annotation
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = match name.strip_suffix(POLYGON_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => annotation
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name),
    };
    annotation.with_file_name(format!("{base}{}", scheme.label_suffix()))
}

/// Cityscapes polygon rasterizer: later objects paint over earlier ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonRasterizer;

impl PolygonRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Paint `doc` onto a fresh canvas. `path` is only used for error reporting.
    pub fn render(
        &self,
        doc: &PolygonAnnotation,
        scheme: LabelScheme,
        path: &Path,
    ) -> DatasetResult<GrayImage> {
        doc.validate().map_err(|e| DatasetError::Annotation {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut canvas =
            GrayImage::from_pixel(doc.img_width, doc.img_height, Luma([scheme.background()]));
        for obj in doc.objects.iter().filter(|o| !o.is_deleted()) {
            let label = labels::lookup(&obj.label).ok_or_else(|| DatasetError::UnknownLabel {
                path: path.to_path_buf(),
                label: obj.label.clone(),
            })?;
            let Some(value) = scheme.value_of(label) else {
                continue;
            };
            fill_polygon(&mut canvas, &obj.polygon, value);
        }
        Ok(canvas)
    }
}

impl Rasterizer for PolygonRasterizer {
    fn rasterize(&self, annotation: &Path, output: &Path, scheme: LabelScheme) -> DatasetResult<()> {
        let raw = fs::read(annotation).map_err(|e| DatasetError::Io {
            path: annotation.to_path_buf(),
            source: e,
        })?;
        let doc: PolygonAnnotation =
            serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
                path: annotation.to_path_buf(),
                source: e,
            })?;
        let canvas = self.render(&doc, scheme, annotation)?;
        canvas
            .save_with_format(output, ImageFormat::Png)
            .map_err(|e| DatasetError::Image {
                path: output.to_path_buf(),
                source: e,
            })
    }
}

/// Even-odd scanline fill plus outline, so vertices and edges are always painted.
pub(crate) fn fill_polygon(canvas: &mut GrayImage, polygon: &[[f64; 2]], value: u8) {
    if polygon.is_empty() {
        return;
    }
    let (w, h) = canvas.dimensions();
    if polygon.len() >= 3 {
        let ymin = polygon.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let ymax = polygon.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);
        let y0 = ymin.ceil().max(0.0) as i64;
        let y1 = ymax.floor().min(h as f64 - 1.0) as i64;
        let mut xs = Vec::new();
        for y in y0..=y1 {
            let yc = y as f64;
            xs.clear();
            for (i, a) in polygon.iter().enumerate() {
                let b = polygon[(i + 1) % polygon.len()];
                let crosses = (a[1] <= yc && b[1] > yc) || (b[1] <= yc && a[1] > yc);
                if crosses {
                    xs.push(a[0] + (yc - a[1]) * (b[0] - a[0]) / (b[1] - a[1]));
                }
            }
            xs.sort_by(|l, r| l.total_cmp(r));
            for pair in xs.chunks_exact(2) {
                let xa = pair[0].ceil().max(0.0) as i64;
                let xb = pair[1].floor().min(w as f64 - 1.0) as i64;
                for x in xa..=xb {
                    canvas.put_pixel(x as u32, y as u32, Luma([value]));
                }
            }
        }
    }
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        draw_line(canvas, *a, b, value);
    }
}

fn draw_line(canvas: &mut GrayImage, a: [f64; 2], b: [f64; 2], value: u8) {
    let (w, h) = canvas.dimensions();
    let Some((a, b)) = clip_segment(a, b, w, h) else {
        return;
    };
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (a[0] + dx * t).round();
        let y = (a[1] + dy * t).round();
        if x >= 0.0 && y >= 0.0 && (x as u32) < w && (y as u32) < h {
            canvas.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}

/// Liang-Barsky clip of `a`-`b` to `[-1, w] x [-1, h]`, one pixel beyond the canvas.
///
/// Keeps the outline walk bounded by the canvas size however far the vertices lie.
fn clip_segment(a: [f64; 2], b: [f64; 2], w: u32, h: u32) -> Option<([f64; 2], [f64; 2])> {
    let (xmin, xmax) = (-1.0, w as f64);
    let (ymin, ymax) = (-1.0, h as f64);
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, a[0] - xmin),
        (dx, xmax - a[0]),
        (-dy, a[1] - ymin),
        (dy, ymax - a[1]),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        [a[0] + t0 * dx, a[1] + t0 * dy],
        [a[0] + t1 * dx, a[1] + t1 * dy],
    ))
}
