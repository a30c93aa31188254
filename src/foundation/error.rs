use std::path::PathBuf;

/// Result alias used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Errors produced while building or playing a reel.
///
/// The first four variants map one-to-one onto the pipeline stages that can fail; the rest are
/// shared plumbing errors.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// The source image could not be decoded into a renderable bitmap.
    #[error("invalid image '{name}': {reason}")]
    InvalidImage {
        /// Name of the offending source image.
        name: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// No writable output location could be derived for a clip.
    #[error("invalid output location for '{name}': {reason}")]
    InvalidUrl {
        /// Image name the location was derived from.
        name: String,
        /// Why the location is unusable.
        reason: String,
    },

    /// A composition track could not be allocated for a clip.
    #[error("invalid video track for clip {index}: {reason}")]
    InvalidVideoTrack {
        /// 0-based position of the clip in the requested order.
        index: usize,
        /// Why the track could not be allocated.
        reason: String,
    },

    /// The clip writer could not be constructed.
    #[error("encoder init failed for '{}': {reason}", .path.display())]
    EncoderInitFailed {
        /// Output path the writer was opened for.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Invalid caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure while running an otherwise valid request.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The request was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("generation cancelled")]
    Cancelled,

    /// Anything else, usually I/O with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::InvalidImage`].
    pub fn invalid_image(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ReelError::InvalidUrl`].
    pub fn invalid_url(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ReelError::InvalidVideoTrack`].
    pub fn invalid_video_track(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidVideoTrack {
            index,
            reason: reason.into(),
        }
    }

    /// Build a [`ReelError::EncoderInitFailed`].
    pub fn encoder_init(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::EncoderInitFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
