/// Skybox catalog (`skyboxes.txt`)
///
/// ```text
/// # comment
/// default = desert
/// desert = Skyboxes/desert.hdr; size=256
/// night  = /abs/path/night.hdr
/// ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};
use super::assets::find_file_in_tree;

pub const CATALOG_FILE_NAME: &str = "skyboxes.txt";
/// Cubemap face size when an entry has no `size=`
pub const DEFAULT_FACE_SIZE: u32 = 512;

const DEFAULT_KEY: &str = "default";
const SIZE_PREFIX: &str = "size=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyboxEntry {
    pub name: String,
    pub hdr_path: PathBuf,
    pub size: u32,
}

/// Parsed catalog, entries sorted by name with a resolved default
#[derive(Debug, Clone)]
pub struct SkyboxCatalog {
    entries: Vec<SkyboxEntry>,
    default_index: usize,
}

impl SkyboxCatalog {
    /// Parse catalog text; relative HDR paths are joined onto `assets_root`
    pub fn parse(text: &str, assets_root: &Path) -> Result<Self> {
        let mut entries: BTreeMap<String, SkyboxEntry> = BTreeMap::new();
        let mut default_name: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }

            if key == DEFAULT_KEY {
                default_name = Some(value.to_string());
                continue;
            }

            if let Some(entry) = parse_entry(key, value, assets_root) {
                entries.insert(entry.name.clone(), entry);
            }
        }

        if entries.is_empty() {
            return Err(Error::Catalog("No skyboxes defined".to_string()));
        }

        let entries: Vec<SkyboxEntry> = entries.into_values().collect();
        let default_index = default_name
            .and_then(|name| entries.iter().position(|e| e.name == name))
            .unwrap_or(0);

        Ok(Self { entries, default_index })
    }

    pub fn load(path: &Path, assets_root: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::parse(&text, assets_root)
    }

    /// Find `skyboxes.txt` anywhere under `assets_root` and load it
    pub fn discover(assets_root: &Path) -> Result<Self> {
        let path = find_file_in_tree(assets_root, CATALOG_FILE_NAME).ok_or_else(|| {
            Error::Catalog(format!("{} not found under {}", CATALOG_FILE_NAME, assets_root.display()))
        })?;
        Self::load(&path, assets_root)
    }

    pub fn default_entry(&self) -> &SkyboxEntry {
        &self.entries[self.default_index]
    }

    pub fn get(&self, name: &str) -> Option<&SkyboxEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries sorted by name
    pub fn entries(&self) -> &[SkyboxEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `path[; size=<int>]`, `None` when no path is given
fn parse_entry(name: &str, value: &str, assets_root: &Path) -> Option<SkyboxEntry> {
    let mut parts = value.split(';').map(str::trim).filter(|part| !part.is_empty());

    let path = PathBuf::from(parts.next()?);
    let hdr_path = if path.is_relative() { assets_root.join(path) } else { path };

    let size = parts
        .filter_map(|part| part.strip_prefix(SIZE_PREFIX))
        .filter_map(parse_leading_digits)
        .last()
        .filter(|&size| size > 0)
        .unwrap_or(DEFAULT_FACE_SIZE);

    Some(SkyboxEntry {
        name: name.to_string(),
        hdr_path,
        size,
    })
}

fn parse_leading_digits(text: &str) -> Option<u32> {
    let text = text.trim();
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    text[..end].parse().ok()
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
