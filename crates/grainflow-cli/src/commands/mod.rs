//! CLI command implementations.

pub mod config;
pub mod graph;
pub mod nodes;
pub mod stretch;

use grainflow_config::EngineConfig;
use grainflow_core::NodeRegistry;
use grainflow_core::nodes::register_builtin_nodes;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Registry with every built-in node kind.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_builtin_nodes(&mut registry);
    registry
}

/// Engine config from `path`, or the defaults.
pub fn load_engine_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            tracing::info!(path = %path.display(), "loaded engine config");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Frame-count progress bar.
pub fn frame_progress(total: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}
