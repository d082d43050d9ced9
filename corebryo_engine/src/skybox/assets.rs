/// Locating cooked assets on disk

use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::error::{Error, Result};

/// Cooked asset root, relative to some ancestor of the working directory
pub const ASSETS_READY_DIR: &str = "Assets/Ready";

/// Walk up from the current directory until `Assets/Ready` exists
pub fn locate_assets_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| {
        Error::InitializationFailed(format!("Cannot read current directory: {}", e))
    })?;

    locate_assets_root_from(&cwd).ok_or_else(|| {
        Error::InitializationFailed(format!(
            "{} not found above {}",
            ASSETS_READY_DIR,
            cwd.display()
        ))
    })
}

/// Nearest `start/../Assets/Ready`, checking `start` itself first
pub fn locate_assets_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(ASSETS_READY_DIR))
        .find(|candidate| candidate.exists())
}

/// First regular file named `name` anywhere below `root`
pub fn find_file_in_tree(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(|entry| entry.into_path())
}
