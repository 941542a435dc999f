use std::path::PathBuf;
use std::time::Duration;

use log::*;

use glsl_layout_reflect::build_tasks::{self, Config};
use glsl_layout_reflect::shader_watcher;
use glsl_layout_reflect::util::relative_path;

const WATCH_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Writes a reflection json per shader pipeline in the source dir;
/// with WATCH_SHADERS set, keeps rewriting them as the sources change
fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let config = Config {
        shaders_source_dir: dir_var("SHADERS_SOURCE_DIR", ["shaders", "source"]),
        reflection_dir: dir_var("REFLECTION_OUTPUT_DIR", ["shaders", "reflected"]),
    };

    build_tasks::write_reflection_json(&config)?;

    if !flag_var("WATCH_SHADERS") {
        return Ok(());
    }

    let mut changes = shader_watcher::watch(&config.shaders_source_dir)?;
    loop {
        let events = changes.wait(WATCH_SETTLE_DELAY)?;
        debug!("shader changes: {events:?}");

        // a broken shader mid-edit shouldn't end the watch
        if let Err(e) = build_tasks::write_reflection_json(&config) {
            error!("failed to reflect shaders: {e:#}");
        }
    }
}

fn dir_var<const N: usize>(name: &str, default: [&str; N]) -> PathBuf {
    match std::env::var(name) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => relative_path(default),
    }
}

fn flag_var(name: &str) -> bool {
    match std::env::var(name).ok() {
        None => false,
        Some(s) if s.is_empty() => false,
        Some(s) if s.to_lowercase() == "false" => false,
        _ => true,
    }
}
