use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use safegym_core::scene::SceneDescriptor;

/// Write a scene descriptor as pretty RON, creating parent directories
pub fn write_scene(path: &Path, scene: &SceneDescriptor) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let text = scene.to_ron().context("Failed to serialize scene")?;
    fs::write(path, text).with_context(|| format!("Failed to write scene to {:?}", path))?;
    log::info!("Wrote scene with {} bodies to {:?}", scene.bodies.len(), path);
    Ok(())
}

/// Read a scene written by [`write_scene`]
pub fn read_scene(path: &Path) -> Result<SceneDescriptor> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read scene {:?}", path))?;
    ron::from_str(&text).with_context(|| format!("Failed to parse scene {:?}", path))
}
