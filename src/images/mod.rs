//! Image files selected by the user and the preview handles created
//! over their in-memory bytes.
pub mod preview;
pub use preview::{DataUrlPreviewStore, PreviewHandle, PreviewStore, SharedPreviewStore};

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

/// Raw image bytes plus the media type sent to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: &str, media_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        }
    }

    /// Read an image from disk, inferring the media type from the
    /// file extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let media_type = media_type_for_path(path)
            .ok_or_else(|| anyhow!("Unsupported image type: {}", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!("Loaded {} ({}, {} bytes)", name, media_type, bytes.len());

        Ok(Self::new(&name, media_type, bytes))
    }

    /// Load every path in order, failing on the first bad one.
    pub async fn load_all(paths: &[PathBuf]) -> Result<Vec<Self>> {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            images.push(Self::from_path(path).await?);
        }
        Ok(images)
    }
}

pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(media_type)
}
