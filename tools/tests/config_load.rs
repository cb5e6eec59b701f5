use std::fs;
use std::path::PathBuf;

use cityscapes_tools::ToolConfig;
use seg_dataset::LabelScheme;

fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "cityscapes-tools-test-{}-{}.toml",
        name,
        std::process::id()
    ));
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn loads_minimal_config() {
    let path = write_temp_config("minimal", "dataset_root = \"/data/cityscapes\"\n");
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.dataset_root, PathBuf::from("/data/cityscapes"));
    assert_eq!(cfg.annotation_subdir, "gtFine");
    assert_eq!(cfg.worker_count, 1);
    assert_eq!(cfg.label_scheme, LabelScheme::TrainIds);
    assert_eq!(cfg.num_classes, 19);
    let _ = fs::remove_file(&path);
}

#[test]
fn invalid_values_fall_back_to_defaults() {
    let path = write_temp_config(
        "invalid",
        "worker_count = 0\nlabel_scheme = \"color\"\nnum_classes = 1000\nannotation_subdir = \" \"\n",
    );
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.worker_count, 1);
    assert_eq!(cfg.label_scheme, LabelScheme::TrainIds);
    assert_eq!(cfg.num_classes, 19);
    assert_eq!(cfg.annotation_subdir, "gtFine");
    let _ = fs::remove_file(&path);
}

#[test]
fn full_config_is_applied() {
    let path = write_temp_config(
        "full",
        "dataset_root = \"/srv/cs\"\nannotation_subdir = \"gtCoarse\"\nworker_count = 8\nlabel_scheme = \"ids\"\nnum_classes = 34\n",
    );
    let cfg = ToolConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.annotation_subdir, "gtCoarse");
    assert_eq!(cfg.worker_count, 8);
    assert_eq!(cfg.label_scheme, LabelScheme::Ids);
    assert_eq!(cfg.num_classes, 34);
    let _ = fs::remove_file(&path);
}

#[test]
fn missing_file_yields_none() {
    assert!(ToolConfig::from_path(&PathBuf::from("/nonexistent/cityscapes-tools.toml")).is_none());
}
