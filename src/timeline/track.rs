use crate::foundation::error::{ReelError, ReelResult};

/// Identifier of a composition track. Ids start at 1 and are never reused within a composition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TrackId(pub u32);

/// Media carried by a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Picture track.
    Video,
    /// Sound track. Clips built from stills carry a silent one.
    Audio,
}

/// One allocated track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Track id.
    pub id: TrackId,
    /// Track media kind.
    pub kind: TrackKind,
}

/// Hands out track ids up to a fixed cap.
#[derive(Debug)]
pub struct TrackAllocator {
    max_tracks: usize,
    tracks: Vec<Track>,
}

impl TrackAllocator {
    /// Allocator that refuses to hand out more than `max_tracks` tracks.
    pub fn new(max_tracks: usize) -> ReelResult<Self> {
        if max_tracks == 0 {
            return Err(ReelError::validation("max_tracks must be >= 1"));
        }
        Ok(Self {
            max_tracks,
            tracks: Vec::new(),
        })
    }

    /// Allocate a new track, or `None` once the cap is reached.
    pub fn allocate(&mut self, kind: TrackKind) -> Option<TrackId> {
        if self.tracks.len() >= self.max_tracks {
            return None;
        }
        let id = TrackId(self.tracks.len() as u32 + 1);
        self.tracks.push(Track { id, kind });
        Some(id)
    }

    /// Tracks allocated so far, in allocation order.
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}
