use std::path::{Path, PathBuf};

use seg_dataset::{LabelScheme, CITYSCAPES_NUM_CLASSES};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "cityscapes-tools.toml";
const CONFIG_ENV: &str = "CITYSCAPES_TOOLS_CONFIG";
const DEFAULT_ANNOTATION_SUBDIR: &str = "gtFine";

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub dataset_root: PathBuf,
    pub annotation_subdir: String,
    pub worker_count: usize,
    pub label_scheme: LabelScheme,
    pub num_classes: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("data/cityscapes"),
            annotation_subdir: DEFAULT_ANNOTATION_SUBDIR.to_string(),
            worker_count: 1,
            label_scheme: LabelScheme::TrainIds,
            num_classes: CITYSCAPES_NUM_CLASSES,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ToolConfigFile {
    dataset_root: Option<String>,
    annotation_subdir: Option<String>,
    worker_count: Option<usize>,
    label_scheme: Option<String>,
    num_classes: Option<usize>,
}

impl ToolConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path)).unwrap_or_default();
        }
        Self::from_path(Path::new(DEFAULT_CONFIG_NAME)).unwrap_or_default()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<ToolConfigFile>(&raw) {
            Ok(file) => {
                log::debug!("loaded tools config from {}", path.display());
                Some(Self::from_file(file))
            }
            Err(e) => {
                log::warn!("tools config {} is invalid, using defaults: {e}", path.display());
                None
            }
        }
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let defaults = Self::default();
        let label_scheme = match file.label_scheme.as_deref().map(str::parse::<LabelScheme>) {
            Some(Ok(scheme)) => scheme,
            Some(Err(e)) => {
                log::warn!("tools config: {e}; using {}", defaults.label_scheme);
                defaults.label_scheme
            }
            None => defaults.label_scheme,
        };
        let worker_count = match file.worker_count {
            Some(0) => {
                log::warn!("tools config: worker_count = 0; running sequentially");
                1
            }
            Some(n) => n,
            None => defaults.worker_count,
        };
        let num_classes = match file.num_classes {
            Some(n) if (1..=256).contains(&n) => n,
            Some(n) => {
                log::warn!(
                    "tools config: num_classes = {n} is outside 1..=256; using {}",
                    defaults.num_classes
                );
                defaults.num_classes
            }
            None => defaults.num_classes,
        };

        ToolConfig {
            dataset_root: file
                .dataset_root
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.dataset_root),
            annotation_subdir: file
                .annotation_subdir
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.annotation_subdir),
            worker_count,
            label_scheme,
            num_classes,
        }
    }
}

/// `${VAR}` expansion, then a leading `~` or `~/` resolved against `$HOME`.
fn expand_path(raw: &str) -> PathBuf {
    let home = std::env::var("HOME").ok();
    resolve_home(&expand_env(raw), home.as_deref())
}

fn resolve_home(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            Path::new(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

fn expand_env(input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match std::env::var(key) {
            Ok(val) => out.push_str(&val),
            Err(_) => out.push_str(&format!("${{{key}}}")),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::{expand_env, resolve_home};
    use std::path::PathBuf;

    #[test]
    fn tilde_resolves_only_as_a_home_prefix() {
        let home = Some("/home/ci");
        assert_eq!(resolve_home("~", home), PathBuf::from("/home/ci"));
        assert_eq!(
            resolve_home("~/data/cityscapes", home),
            PathBuf::from("/home/ci/data/cityscapes")
        );
        assert_eq!(resolve_home("~other/data", home), PathBuf::from("~other/data"));
        assert_eq!(resolve_home("~/data", None), PathBuf::from("~/data"));
    }

    #[test]
    fn unknown_variables_are_kept() {
        assert_eq!(
            expand_env("/data/${CITYSCAPES_TOOLS_SURELY_UNSET}/x"),
            "/data/${CITYSCAPES_TOOLS_SURELY_UNSET}/x"
        );
        assert_eq!(expand_env("plain/${unterminated"), "plain/${unterminated");
    }
}
