//! Shared clap argument groups for dataset tooling.

pub mod common;

pub use common::{DatasetRootArgs, DatasetRootOpts, WorkerArgs};
