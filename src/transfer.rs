//! Moving the restaurant list in and out of JSON files.
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::restaurants::RestaurantList;
use crate::storage::KeyValueStore;

pub const EXPORT_FILE_NAME: &str = "restaurants.json";

///
/// Writes the list as indented JSON.
///
/// If `path` is an existing directory the file is written inside it as `restaurants.json`.
/// Returns the path actually written.
///
pub fn export_to<S: KeyValueStore>(list: &RestaurantList<S>, path: &Path) -> Result<PathBuf> {
    let path = if path.is_dir() {
        path.join(EXPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, list.export_json()?)?;
    info!("Exported {} restaurants to {}", list.len(), path.display());
    Ok(path)
}

/// Replaces the list with the contents of a JSON file. Returns how many were imported.
pub fn import_from<S: KeyValueStore>(list: &mut RestaurantList<S>, path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    list.import_json(&text)
}
