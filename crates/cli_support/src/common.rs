use clap::Args;
use std::path::{Path, PathBuf};

/// Dataset location shared across dataset-preparation binaries.
#[derive(Debug, Clone, Args)]
pub struct DatasetRootArgs {
    /// Root of the dataset (e.g. data/cityscapes). Falls back to the tools config.
    #[arg(long, alias = "cityscapes-path")]
    pub input_root: Option<PathBuf>,
    /// Annotation tree below the root (e.g. gtFine).
    #[arg(long, alias = "gt-dir")]
    pub annotation_subdir: Option<String>,
    /// Where indices and split manifests are written (defaults to the input root).
    #[arg(short = 'o', long, alias = "out-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DatasetRootOpts {
    pub input_root: PathBuf,
    pub annotation_subdir: String,
    /// Explicit output location; consumers decide the default.
    pub output_dir: Option<PathBuf>,
}

impl DatasetRootOpts {
    pub fn new(input_root: PathBuf, annotation_subdir: String, output_dir: Option<PathBuf>) -> Self {
        Self {
            input_root,
            annotation_subdir,
            output_dir,
        }
    }

    pub fn annotation_root(&self) -> PathBuf {
        self.input_root.join(&self.annotation_subdir)
    }
}

impl DatasetRootArgs {
    /// Resolve against fallbacks for anything not given on the command line.
    pub fn resolve(&self, default_root: &Path, default_subdir: &str) -> DatasetRootOpts {
        DatasetRootOpts::new(
            self.input_root.clone().unwrap_or_else(|| default_root.to_path_buf()),
            self.annotation_subdir
                .clone()
                .unwrap_or_else(|| default_subdir.to_string()),
            self.output_dir.clone(),
        )
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    /// Number of parallel workers; 1 runs sequentially.
    #[arg(long, alias = "nproc")]
    pub worker_count: Option<usize>,
    /// Hide the progress bar.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl WorkerArgs {
    pub fn resolve_worker_count(&self, default: usize) -> usize {
        self.worker_count.unwrap_or(default).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_fall_back_to_config_values() {
        let args = DatasetRootArgs {
            input_root: Some(PathBuf::from("data/cityscapes")),
            annotation_subdir: None,
            output_dir: None,
        };
        let opts = args.resolve(Path::new("unused"), "gtFine");
        assert_eq!(opts.input_root, PathBuf::from("data/cityscapes"));
        assert_eq!(opts.annotation_subdir, "gtFine");
        assert_eq!(opts.output_dir, None);
        assert_eq!(opts.annotation_root(), PathBuf::from("data/cityscapes/gtFine"));
    }

    #[test]
    fn zero_workers_means_sequential() {
        let args = WorkerArgs {
            worker_count: Some(0),
            no_progress: true,
        };
        assert_eq!(args.resolve_worker_count(4), 1);
    }
}
