//! Caller-supplied source images.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// File extensions tried, in order, by [`SourceImage::load_named`].
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff"];

/// An encoded still image identified by name.
///
/// The bytes are kept encoded; decoding happens in [`crate::rasterize`] so that an undecodable
/// image surfaces as [`ReelError::InvalidImage`] at the stage that owns it.
#[derive(Clone, Debug)]
pub struct SourceImage {
    name: String,
    bytes: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap already loaded image bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes.into()),
        }
    }

    /// Read an image file; the name is the file name without its extension.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ReelError::validation(format!(
                    "image path '{}' has no usable file name",
                    path.display()
                ))
            })?
            .to_string();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        Ok(Self::from_bytes(name, bytes))
    }

    /// Resolve `<dir>/<name>.<ext>` over [`IMAGE_EXTENSIONS`] and load the first match.
    ///
    /// `name` may already carry an extension, in which case it is used verbatim.
    pub fn load_named(dir: impl AsRef<Path>, name: &str) -> ReelResult<Self> {
        let dir = dir.as_ref();
        let direct = dir.join(name);
        if direct.is_file() {
            let bytes = std::fs::read(&direct)
                .with_context(|| format!("read image '{}'", direct.display()))?;
            return Ok(Self::from_bytes(name, bytes));
        }
        for ext in IMAGE_EXTENSIONS {
            let candidate = dir.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                let bytes = std::fs::read(&candidate)
                    .with_context(|| format!("read image '{}'", candidate.display()))?;
                return Ok(Self::from_bytes(name, bytes));
            }
        }
        Err(ReelError::invalid_image(
            name,
            format!("no image named '{name}' in '{}'", dir.display()),
        ))
    }

    /// Image name as supplied by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
#[path = "../tests/unit/assets/source.rs"]
mod tests;
