//! Fan-out of per-file (rasterize → extract stats) units.

use crate::labels::{LabelScheme, CITYSCAPES_NUM_CLASSES};
use crate::rasterize::{label_path_for, Rasterizer};
use crate::stats::extract_class_stats;
use crate::types::{AnnotationFile, DatasetResult};
use data_contracts::PerImageStats;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Pool size; `<= 1` runs on the calling thread.
    pub worker_count: usize,
    pub scheme: LabelScheme,
    pub num_classes: usize,
    pub show_progress: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            worker_count: 1,
            scheme: LabelScheme::TrainIds,
            num_classes: CITYSCAPES_NUM_CLASSES,
            show_progress: false,
        }
    }
}

/// Progress bar over `len` units, hidden when `visible` is false.
pub fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, eta {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    pb
}

/// Apply `unit` to every item, returning results in input order.
///
/// With `worker_count > 1` the units run on a dedicated pool of exactly that
/// many threads. The first failing unit's error is returned once in-flight
/// units settle; no partial results are kept.
pub fn dispatch<T, U, F>(
    items: &[T],
    worker_count: usize,
    progress: &ProgressBar,
    unit: F,
) -> DatasetResult<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> DatasetResult<U> + Sync,
{
    let run = |item: &T| {
        let out = unit(item);
        progress.inc(1);
        out
    };
    if worker_count <= 1 {
        return items.iter().map(run).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .thread_name(|i| format!("label-worker-{i}"))
        .build()?;
    pool.install(|| items.par_iter().map(run).collect())
}

/// One unit of work: write the label image, then count its classes.
pub fn convert_one<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    file: &AnnotationFile,
    opts: &ConvertOptions,
) -> DatasetResult<Option<PerImageStats>> {
    let label_path = label_path_for(&file.path, opts.scheme);
    rasterizer.rasterize(&file.path, &label_path, opts.scheme)?;
    extract_class_stats(&label_path, file, opts.num_classes)
}

/// Convert every file; `result[i]` belongs to `files[i]`.
pub fn convert_all<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    files: &[AnnotationFile],
    opts: &ConvertOptions,
) -> DatasetResult<Vec<Option<PerImageStats>>> {
    log::info!(
        "converting {} annotation files to {} with {} worker(s)",
        files.len(),
        opts.scheme,
        opts.worker_count.max(1)
    );
    let pb = progress_bar(files.len(), opts.show_progress);
    let results = dispatch(files, opts.worker_count, &pb, |f| {
        convert_one(rasterizer, f, opts)
    });
    match &results {
        Ok(_) => pb.finish(),
        Err(_) => pb.abandon(),
    }
    results
}
