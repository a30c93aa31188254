use crate::encode::clip::EncodedClip;
use crate::foundation::core::{Canvas, Fps, FrameIndex, TimeRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::ramp::{OpacityRamp, RampCurve};
use crate::timeline::track::{Track, TrackAllocator, TrackId, TrackKind};

/// How the composition's total duration is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Sum of every clip's duration, ignoring overlap (five 3 s clips give 15 s).
    #[default]
    NaiveSum,
    /// End of the last visible clip (five 3 s clips give 10 s).
    VisibleSpan,
}

/// Ticks per second clip starts and fade windows are quantized to.
pub const PLACEMENT_TIMESCALE: u32 = 60;

fn snap_to_timescale(secs: f64) -> f64 {
    let scale = f64::from(PLACEMENT_TIMESCALE);
    (secs * scale).round() / scale
}

/// Placement rule for clip starts and fade windows.
///
/// Clip `i > 0` starts at `stride * i - lead` and clip 0 at 0. Clip `i` fades out over
/// `[stride * i + lead, stride * i + lead + fade)`. The defaults give starts 0, 1, 3, 5, 7 and
/// fade windows starting at 1, 3, 5, 7, 9.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionLayout {
    /// Seconds between consecutive clip slots.
    pub stride_secs: f64,
    /// Seconds a clip starts before its slot, and its fade starts after it.
    pub lead_secs: f64,
    /// Fade-out length in seconds.
    pub fade_secs: f64,
    /// Easing applied across each fade window.
    pub curve: RampCurve,
}

impl Default for TransitionLayout {
    fn default() -> Self {
        Self {
            stride_secs: 2.0,
            lead_secs: 1.0,
            fade_secs: 1.0,
            curve: RampCurve::Linear,
        }
    }
}

impl TransitionLayout {
    /// Timeline start of clip `index`, snapped to [`PLACEMENT_TIMESCALE`].
    pub fn start_secs(&self, index: usize) -> f64 {
        if index == 0 {
            return 0.0;
        }
        snap_to_timescale((self.stride_secs * index as f64 - self.lead_secs).max(0.0))
    }

    /// Fade-out window of clip `index`, both ends snapped to [`PLACEMENT_TIMESCALE`].
    pub fn fade_window(&self, index: usize) -> TimeRange {
        let start = self.stride_secs * index as f64 + self.lead_secs;
        let snapped = snap_to_timescale(start);
        TimeRange {
            start: snapped,
            duration: (snap_to_timescale(start + self.fade_secs) - snapped).max(0.0),
        }
    }

    fn validate(&self) -> ReelResult<()> {
        let fields = [
            ("stride_secs", self.stride_secs),
            ("lead_secs", self.lead_secs),
            ("fade_secs", self.fade_secs),
        ];
        for (label, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "transition layout '{label}' must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Options for [`compose`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComposeOpts {
    /// Total-duration rule.
    pub duration_policy: DurationPolicy,
    /// Clip start and fade placement.
    pub layout: TransitionLayout,
    /// Maximum number of tracks (video and audio together).
    pub max_tracks: usize,
    /// Frame rate the composition is rendered at.
    pub frame_rate: Fps,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            duration_policy: DurationPolicy::NaiveSum,
            layout: TransitionLayout::default(),
            max_tracks: 64,
            frame_rate: Fps::whole(60),
        }
    }
}

impl ComposeOpts {
    /// Return options with a different duration policy.
    pub fn with_duration_policy(mut self, policy: DurationPolicy) -> Self {
        self.duration_policy = policy;
        self
    }

    /// Return options with a different track cap.
    pub fn with_max_tracks(mut self, max_tracks: usize) -> Self {
        self.max_tracks = max_tracks;
        self
    }
}

/// One clip placed on the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineEntry {
    /// 0-based position in the requested order. Entry 0 is the top-most layer.
    pub index: usize,
    /// The clip this entry plays.
    pub clip: EncodedClip,
    /// Video track carrying the clip.
    pub video_track: TrackId,
    /// Silent audio track reserved for the clip.
    pub audio_track: TrackId,
    /// Portion of the clip inserted (always the whole clip).
    pub source_range: TimeRange,
    /// Composition time the clip starts at.
    pub start_secs: f64,
    /// Fade-out applied to the video track.
    pub ramp: OpacityRamp,
}

impl TimelineEntry {
    /// Span the clip occupies on the timeline.
    pub fn timeline_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_secs,
            duration: self.source_range.duration,
        }
    }

    /// Clip-local time for composition time `t`, or `None` when the clip is not playing.
    pub fn local_time(&self, t: f64) -> Option<f64> {
        self.timeline_range()
            .contains(t)
            .then(|| self.source_range.start + (t - self.start_secs))
    }
}

/// A layer to draw at a given composition time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerSample<'a> {
    /// Entry being drawn.
    pub entry: &'a TimelineEntry,
    /// Clip-local time in seconds.
    pub local_secs: f64,
    /// Layer opacity in `0..=1`.
    pub opacity: f32,
}

/// Ordered clips sharing one render size and time base. Immutable once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    entries: Vec<TimelineEntry>,
    tracks: Vec<Track>,
    render_size: Canvas,
    frame_rate: Fps,
    duration_secs: f64,
    duration_policy: DurationPolicy,
}

impl Composition {
    /// Timeline entries in requested order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Every allocated track, in allocation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of video tracks.
    pub fn video_track_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Video)
            .count()
    }

    /// Pixel size the composition renders at (natural size of the last clip).
    pub fn render_size(&self) -> Canvas {
        self.render_size
    }

    /// Render frame rate.
    pub fn frame_rate(&self) -> Fps {
        self.frame_rate
    }

    /// Total duration in seconds, per the policy the composition was built with.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Policy used for [`Composition::duration_secs`].
    pub fn duration_policy(&self) -> DurationPolicy {
        self.duration_policy
    }

    /// End of the last clip on the timeline.
    pub fn visible_span_secs(&self) -> f64 {
        visible_span(&self.entries)
    }

    /// The single instruction window covering the whole composition.
    pub fn instruction_time_range(&self) -> TimeRange {
        TimeRange {
            start: 0.0,
            duration: self.duration_secs,
        }
    }

    /// Number of frames at [`Composition::frame_rate`].
    pub fn frame_count(&self) -> u64 {
        self.frame_rate.secs_to_frames_round(self.duration_secs)
    }

    /// Composition time of frame `idx`.
    pub fn frame_time(&self, idx: FrameIndex) -> f64 {
        self.frame_rate.frames_to_secs(idx.0)
    }

    /// Layers visible at composition time `t`, ordered bottom to top.
    ///
    /// Entry 0 is drawn last (top-most), so an outgoing clip fades out over the clip that
    /// follows it. Fully transparent layers are skipped.
    pub fn layers_at(&self, t: f64) -> Vec<LayerSample<'_>> {
        if !self.instruction_time_range().contains(t) {
            return Vec::new();
        }
        self.entries
            .iter()
            .rev()
            .filter_map(|entry| {
                let local_secs = entry.local_time(t)?;
                let opacity = entry.ramp.opacity_at(t);
                (opacity > 0.0).then_some(LayerSample {
                    entry,
                    local_secs,
                    opacity,
                })
            })
            .collect()
    }
}

/// Lay `clips` out on one timeline with overlapping fade-out transitions.
///
/// All-or-nothing: if any clip cannot get its tracks, no composition is produced.
#[tracing::instrument(skip(clips, opts), fields(clips = clips.len()))]
pub fn compose(clips: &[EncodedClip], opts: &ComposeOpts) -> ReelResult<Composition> {
    if clips.is_empty() {
        return Err(ReelError::validation("composition needs at least one clip"));
    }
    opts.layout.validate()?;
    if opts.frame_rate.num == 0 || opts.frame_rate.den == 0 {
        return Err(ReelError::validation("composition frame rate must be non-zero"));
    }

    let mut alloc = TrackAllocator::new(opts.max_tracks)?;
    let mut entries = Vec::with_capacity(clips.len());
    let mut render_size = Canvas::new(0, 0);

    for (index, clip) in clips.iter().enumerate() {
        if clip.natural_size.is_empty() {
            return Err(ReelError::invalid_video_track(
                index,
                format!("clip '{}' has no picture", clip.path.display()),
            ));
        }
        if !clip.duration_secs.is_finite() || clip.duration_secs <= 0.0 {
            return Err(ReelError::invalid_video_track(
                index,
                format!("clip '{}' has no duration", clip.path.display()),
            ));
        }

        let video_track = alloc.allocate(TrackKind::Video).ok_or_else(|| {
            ReelError::invalid_video_track(index, "video track limit reached")
        })?;
        let audio_track = alloc.allocate(TrackKind::Audio).ok_or_else(|| {
            ReelError::invalid_video_track(index, "audio track limit reached")
        })?;

        let start_secs = opts.layout.start_secs(index);
        let ramp =
            OpacityRamp::fade_out(opts.layout.fade_window(index)).with_curve(opts.layout.curve);
        tracing::debug!(
            index,
            start_secs,
            fade_start = ramp.range.start,
            fade_secs = ramp.range.duration,
            "placed clip"
        );

        render_size = clip.natural_size;
        entries.push(TimelineEntry {
            index,
            clip: clip.clone(),
            video_track,
            audio_track,
            source_range: TimeRange {
                start: 0.0,
                duration: clip.duration_secs,
            },
            start_secs,
            ramp,
        });
    }

    let duration_secs = match opts.duration_policy {
        DurationPolicy::NaiveSum => clips.iter().map(|c| c.duration_secs).sum(),
        DurationPolicy::VisibleSpan => visible_span(&entries),
    };

    Ok(Composition {
        entries,
        tracks: alloc.into_tracks(),
        render_size,
        frame_rate: opts.frame_rate,
        duration_secs,
        duration_policy: opts.duration_policy,
    })
}

fn visible_span(entries: &[TimelineEntry]) -> f64 {
    entries
        .iter()
        .map(|e| e.timeline_range().end())
        .fold(0.0, f64::max)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/compose.rs"]
mod tests;
