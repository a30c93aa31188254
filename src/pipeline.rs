//! One generation request: images in, playable reel out.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::SourceImage;
use crate::encode::clip::{ClipEncoder, ClipEncoderOpts, ClipSinkFactory, EncodedClip, clip_root};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::sync::{DEFAULT_SYNC_FRAME, SyncLayer};
use crate::overlay::text::OverlayLayer;
use crate::player::{PlayableHandle, PlaybackSettings};
use crate::raster::{PixelBuffer, rasterize};
use crate::render::source::StillFrameSource;
use crate::timeline::compose::{ComposeOpts, compose};

/// JSON configuration file form of [`GenerateOpts`].
pub mod config;

use config::ReelConfig;

/// Options for [`ReelGenerator`].
#[derive(Clone, Debug)]
pub struct GenerateOpts {
    /// Clip encoding options.
    pub encoder: ClipEncoderOpts,
    /// Timeline options.
    pub compose: ComposeOpts,
    /// Encode worker threads; rayon's default when `None`.
    pub threads: Option<usize>,
    /// Presentation size; the composition's render size when `None`.
    pub viewport: Option<Canvas>,
    /// Text layer drawn above the video, if any.
    pub overlay: Option<OverlayLayer>,
    /// Background of the overlay host.
    pub overlay_background: Option<Rgba8>,
    /// Playback settings of the resulting handle.
    pub playback: PlaybackSettings,
    /// Cancels the request from another thread.
    pub cancel: CancelToken,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            encoder: ClipEncoderOpts::default(),
            compose: ComposeOpts::default(),
            threads: None,
            viewport: None,
            overlay: Some(OverlayLayer::default()),
            overlay_background: None,
            playback: PlaybackSettings::default(),
            cancel: CancelToken::new(),
        }
    }
}

impl GenerateOpts {
    /// Default options writing clips into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoder: ClipEncoderOpts::new(out_dir),
            ..Self::default()
        }
    }

    /// Return options with a different cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Return options with a bounded worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

impl From<ReelConfig> for GenerateOpts {
    fn from(cfg: ReelConfig) -> Self {
        let overlay = if cfg.no_overlay {
            None
        } else {
            Some(cfg.overlay.unwrap_or_default())
        };
        Self {
            encoder: cfg.encoder,
            compose: cfg.compose,
            threads: cfg.threads,
            viewport: cfg.viewport,
            overlay,
            overlay_background: cfg.overlay_background,
            playback: cfg.playback,
            cancel: CancelToken::new(),
        }
    }
}

/// Everything a finished request produced.
#[derive(Debug)]
pub struct GeneratedReel {
    /// The playable result.
    pub handle: PlayableHandle,
    /// Clips in request order.
    pub clips: Vec<EncodedClip>,
    /// The rasterized stills, keyed by clip path, for rendering without decoding.
    pub stills: StillFrameSource,
}

/// Runs generation requests.
///
/// A generator owns its encoder and options; separate generators share no state.
#[derive(Debug)]
pub struct ReelGenerator {
    encoder: ClipEncoder,
    opts: GenerateOpts,
}

impl ReelGenerator {
    /// Generator encoding through `ffmpeg`.
    pub fn new(opts: GenerateOpts) -> Self {
        Self {
            encoder: ClipEncoder::new(opts.encoder.clone()),
            opts,
        }
    }

    /// Generator encoding through a custom sink factory.
    pub fn with_sink_factory(opts: GenerateOpts, sinks: impl ClipSinkFactory + 'static) -> Self {
        Self {
            encoder: ClipEncoder::with_sink_factory(opts.encoder.clone(), sinks),
            opts,
        }
    }

    /// Generator options.
    pub fn opts(&self) -> &GenerateOpts {
        &self.opts
    }

    /// Token that cancels requests run by this generator.
    pub fn cancel_token(&self) -> CancelToken {
        self.opts.cancel.clone()
    }

    /// Turn `images` into a playable reel, in the order given.
    pub fn generate(&self, images: &[SourceImage]) -> ReelResult<PlayableHandle> {
        self.generate_reel(images).map(|reel| reel.handle)
    }

    /// [`ReelGenerator::generate`], also returning the clips and rasterized stills.
    ///
    /// All-or-nothing: on failure or cancellation every clip written by this call is removed.
    #[tracing::instrument(skip(self, images), fields(images = images.len()))]
    pub fn generate_reel(&self, images: &[SourceImage]) -> ReelResult<GeneratedReel> {
        if images.is_empty() {
            return Err(ReelError::validation("at least one image is required"));
        }
        check_unique_roots(images)?;
        self.encoder.opts().validate()?;
        self.opts.cancel.check()?;
        tracing::info!(
            out_dir = %self.encoder.opts().out_dir.display(),
            "generation started"
        );

        let pool = build_thread_pool(self.opts.threads)?;

        // Armed with every target path, so a failed rerun also drops the previous run's clip
        // for an image that never reached the encoder.
        let mut written = WrittenClips(
            images
                .iter()
                .map(|image| self.encoder.clip_path(image.name()))
                .collect::<ReelResult<_>>()?,
        );

        let results: Vec<ReelResult<(EncodedClip, PixelBuffer)>> = pool.install(|| {
            images
                .par_iter()
                .map(|image| self.encode_one(image))
                .collect()
        });

        let mut first_err = None;
        let mut encoded = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(pair) => encoded.push(pair),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_err {
            tracing::warn!(error = %e, targets = written.0.len(), "generation failed");
            return Err(e);
        }
        self.opts.cancel.check()?;

        let clips: Vec<EncodedClip> = encoded.iter().map(|(clip, _)| clip.clone()).collect();
        let composition = compose(&clips, &self.opts.compose)?;

        let mut sync_layer = SyncLayer::new(DEFAULT_SYNC_FRAME);
        if let Some(bg) = self.opts.overlay_background {
            sync_layer = sync_layer.with_background(bg);
        }
        if let Some(overlay) = &self.opts.overlay {
            overlay.validate()?;
            sync_layer.add_sublayer(overlay.clone());
        }

        let viewport = self.opts.viewport.unwrap_or(composition.render_size());
        let handle = PlayableHandle::assemble_with(
            Arc::new(composition),
            sync_layer,
            viewport,
            self.opts.playback,
        )?;

        let mut stills = StillFrameSource::new();
        for (clip, buffer) in &encoded {
            stills.insert(&clip.path, buffer);
        }

        written.disarm();
        tracing::info!(
            clips = clips.len(),
            duration_secs = handle.composition().duration_secs(),
            "generation finished"
        );
        Ok(GeneratedReel {
            handle,
            clips,
            stills,
        })
    }

    #[tracing::instrument(skip(self, image), fields(name = image.name()))]
    fn encode_one(&self, image: &SourceImage) -> ReelResult<(EncodedClip, PixelBuffer)> {
        self.opts.cancel.check()?;
        let buffer = rasterize(image)?;
        let clip = self.encoder.encode(&buffer, image.name(), &self.opts.cancel)?;
        Ok((clip, buffer))
    }
}

fn check_unique_roots(images: &[SourceImage]) -> ReelResult<()> {
    let mut seen = HashSet::with_capacity(images.len());
    for image in images {
        let root = clip_root(image.name())?;
        if !seen.insert(root) {
            return Err(ReelError::validation(format!(
                "images '{}' and an earlier image share the clip name '{root}'",
                image.name()
            )));
        }
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation("'threads' must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

/// Clip paths targeted by a request, removed on drop unless the request succeeded.
struct WrittenClips(Vec<PathBuf>);

impl WrittenClips {
    fn disarm(&mut self) {
        self.0.clear();
    }
}

impl Drop for WrittenClips {
    fn drop(&mut self) {
        for path in self.0.drain(..) {
            if let Err(e) = std::fs::remove_file(&path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), error = %e, "could not remove clip");
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/pipeline.rs"]
mod tests;
