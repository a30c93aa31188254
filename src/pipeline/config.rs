use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::encode::clip::ClipEncoderOpts;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::text::OverlayLayer;
use crate::player::PlaybackSettings;
use crate::timeline::compose::ComposeOpts;

/// File form of [`GenerateOpts`](crate::GenerateOpts).
///
/// Every field is optional in JSON; missing fields take their defaults.
///
/// ```json
/// {
///   "encoder": { "out_dir": "/tmp/reel", "duration_secs": 3 },
///   "compose": { "duration_policy": "visible_span" },
///   "threads": 4,
///   "overlay": { "text": "Hello", "frame": { "x0": 0, "y0": 0, "x1": 200, "y1": 80 } }
/// }
/// ```
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReelConfig {
    /// Clip encoding options.
    pub encoder: ClipEncoderOpts,
    /// Timeline options.
    pub compose: ComposeOpts,
    /// Encode worker threads; rayon's default when unset.
    pub threads: Option<usize>,
    /// Presentation size; the composition's render size when unset.
    pub viewport: Option<Canvas>,
    /// Text layer; the default layer when unset.
    pub overlay: Option<OverlayLayer>,
    /// Disable the text layer altogether.
    pub no_overlay: bool,
    /// Background of the overlay host.
    pub overlay_background: Option<Rgba8>,
    /// Playback settings.
    pub playback: PlaybackSettings,
}

impl ReelConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ReelError::validation(format!("parse reel config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open reel config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
