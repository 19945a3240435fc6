use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model {name} not found (searched: {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("could not determine data directory")]
    NoDataDir,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a model file, checking the per-user application data directory
/// before a bundled directory.
///
/// Absolute paths and paths that already exist relative to the working
/// directory are returned as-is.
///
/// Resolution order:
/// 1. The path itself
/// 2. User application data directory (platform-specific)
/// 3. Bundled directory (development / pre-packaged installs)
pub fn resolve(name: &Path, bundled_dir: Option<&Path>) -> Result<PathBuf, ModelResolveError> {
    let mut searched = vec![name.to_path_buf()];
    if name.exists() {
        return Ok(name.to_path_buf());
    }
    if name.is_absolute() {
        return Err(not_found(name, searched));
    }

    if let Ok(dir) = app_data_dir() {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    if let Some(dir) = bundled_dir {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(not_found(name, searched))
}

/// Like [`resolve`], but falls back to the unresolved path so a later
/// existence check can report it against the component that needs it.
pub fn resolve_or_keep(name: &Path, bundled_dir: Option<&Path>) -> PathBuf {
    resolve(name, bundled_dir).unwrap_or_else(|e| {
        log::debug!("{e}");
        name.to_path_buf()
    })
}

/// Platform-specific application data directory. Model names carry their
/// own `models/...` prefix beneath it.
///
/// - macOS: `~/Library/Application Support/FaceEnroll/`
/// - Linux: `$XDG_DATA_HOME/FaceEnroll/` or `~/.local/share/FaceEnroll/`
/// - Windows: `%APPDATA%/FaceEnroll/`
pub fn app_data_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(ModelResolveError::NoDataDir)
}

fn not_found(name: &Path, searched: Vec<PathBuf>) -> ModelResolveError {
    ModelResolveError::NotFound {
        name: name.display().to_string(),
        searched,
    }
}
