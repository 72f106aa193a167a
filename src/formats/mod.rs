pub mod json;
pub mod wav;

use crate::error::{Result, StoreError};
use crate::store::Container;
use std::path::Path;

pub use json::JsonContainer;
pub use wav::WavContainer;

/// Open a container, picking the backend from the file extension.
pub fn open_container(path: &Path) -> Result<Box<dyn Container>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Box::new(JsonContainer::open(path)?)),
        "wav" | "wave" => Ok(Box::new(WavContainer::open(path)?)),
        _ => Err(StoreError::Unsupported(path.display().to_string())),
    }
}
