use anyhow::Context;
use cityscapes_tools::ToolConfig;
use clap::Parser;
use cli_support::common::{DatasetRootArgs, WorkerArgs};
use seg_dataset::{
    prepare_dataset, ConvertOptions, LabelScheme, PolygonRasterizer, PrepareOptions, Split,
};

#[derive(Parser, Debug)]
#[command(
    name = "convert_cityscapes",
    about = "Convert Cityscapes polygon annotations to label images and write class statistics"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetRootArgs,
    #[command(flatten)]
    workers: WorkerArgs,
    /// Value scheme burned into the label images.
    #[arg(long, value_parser = ["trainIds", "ids"])]
    label_scheme: Option<String>,
    /// Number of classes counted in the statistics.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=256))]
    num_classes: Option<u16>,
    /// Skip rasterization and rebuild indices from an existing sample_class_stats.json.
    #[arg(long, default_value_t = false)]
    only_postprocessing: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = ToolConfig::load();

    let dataset = args
        .dataset
        .resolve(&cfg.dataset_root, &cfg.annotation_subdir);
    let scheme = match args.label_scheme.as_deref() {
        Some(s) => s
            .parse::<LabelScheme>()
            .map_err(anyhow::Error::msg)?,
        None => cfg.label_scheme,
    };
    let mut opts = PrepareOptions::new(dataset.input_root.clone())
        .with_output_dir(dataset.output_dir.clone());
    opts.annotation_subdir = dataset.annotation_subdir.clone();
    opts.convert = ConvertOptions {
        worker_count: args.workers.resolve_worker_count(cfg.worker_count),
        scheme,
        num_classes: args
            .num_classes
            .map(usize::from)
            .unwrap_or(cfg.num_classes),
        show_progress: !args.workers.no_progress,
    };
    opts.only_postprocessing = args.only_postprocessing;

    let report = prepare_dataset(&opts, &PolygonRasterizer::new()).with_context(|| {
        format!(
            "preparing {} (annotations {})",
            dataset.input_root.display(),
            dataset.annotation_root().display()
        )
    })?;

    println!(
        "Prepared {}: discovered={} converted={} train_stats={} classes_present={} outside_splits={}",
        dataset.input_root.display(),
        report.discovered,
        report.converted,
        report.indices.stats.len(),
        report.indices.by_class.0.len(),
        report.unsplit
    );
    for split in Split::ALL {
        if let Some(manifest) = report.manifest(split) {
            println!(" - {}: {} ids", manifest.file_name(), manifest.ids.len());
        }
    }
    println!("Outputs written to {}", report.output_dir.display());
    Ok(())
}
