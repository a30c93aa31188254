use std::sync::OnceLock;

use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::text::OverlayLayer;
use crate::render::FrameRGBA;
use crate::render::composite::{blit_over, fill_rect_over};

/// Default host frame: 500x500 at the origin.
pub const DEFAULT_SYNC_FRAME: Rect = Rect::new(0.0, 0.0, 500.0, 500.0);

#[derive(Clone, Debug)]
struct Hosted {
    layer: OverlayLayer,
    tile: OnceLock<Vec<u8>>,
}

impl Hosted {
    fn tile(&self) -> ReelResult<&[u8]> {
        if let Some(tile) = self.tile.get() {
            return Ok(tile);
        }
        let tile = self.layer.rasterize()?;
        Ok(self.tile.get_or_init(|| tile))
    }
}

/// Host layer that follows the composition's clock.
///
/// Sublayer frames are relative to the host frame. A sublayer is drawn once composition time
/// minus the host's `begin_time` reaches its own `begin_time`.
#[derive(Clone, Debug)]
pub struct SyncLayer {
    frame: Rect,
    background: Option<Rgba8>,
    opacity: f32,
    begin_time: f64,
    sublayers: Vec<Hosted>,
}

impl Default for SyncLayer {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_FRAME)
    }
}

impl SyncLayer {
    /// Empty host covering `frame`, visible from t = 0 with no background.
    pub fn new(frame: Rect) -> Self {
        Self {
            frame,
            background: None,
            opacity: 1.0,
            begin_time: 0.0,
            sublayers: Vec::new(),
        }
    }

    /// Fill the host frame with `color` beneath its sublayers.
    pub fn with_background(mut self, color: Rgba8) -> Self {
        self.background = Some(color);
        self
    }

    /// Host opacity, applied on top of each sublayer's own opacity.
    pub fn with_opacity(mut self, opacity: f32) -> ReelResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ReelError::validation("sync layer opacity must be within 0..=1"));
        }
        self.opacity = opacity;
        Ok(self)
    }

    /// Composition time the host appears at.
    pub fn with_begin_time(mut self, t: f64) -> ReelResult<Self> {
        if !t.is_finite() || t < 0.0 {
            return Err(ReelError::validation("sync layer begin time must be >= 0"));
        }
        self.begin_time = t;
        Ok(self)
    }

    /// Append a sublayer, drawn above the ones added before it.
    pub fn add_sublayer(&mut self, layer: OverlayLayer) {
        self.sublayers.push(Hosted {
            layer,
            tile: OnceLock::new(),
        });
    }

    /// Host frame in composition pixels.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Host background, if any.
    pub fn background(&self) -> Option<Rgba8> {
        self.background
    }

    /// Host opacity.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Composition time the host appears at.
    pub fn begin_time(&self) -> f64 {
        self.begin_time
    }

    /// Hosted layers, bottom first.
    pub fn sublayers(&self) -> impl Iterator<Item = &OverlayLayer> {
        self.sublayers.iter().map(|h| &h.layer)
    }

    /// `true` once composition time `t` reaches the host's begin time.
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.begin_time && self.opacity > 0.0
    }

    /// Draw the host and its visible sublayers over `frame` at composition time `t`.
    pub fn composite_onto(&self, frame: &mut FrameRGBA, t: f64) -> ReelResult<()> {
        if !self.is_visible_at(t) {
            return Ok(());
        }
        let size = Canvas::new(frame.width, frame.height);
        let (ox, oy) = (self.frame.x0.round() as i64, self.frame.y0.round() as i64);

        if let Some(bg) = self.background {
            let rect = (
                ox,
                oy,
                self.frame.x1.round() as i64,
                self.frame.y1.round() as i64,
            );
            fill_rect_over(&mut frame.data, size, rect, bg.to_premul(), self.opacity)?;
        }

        let local = t - self.begin_time;
        for hosted in &self.sublayers {
            let layer = &hosted.layer;
            if !layer.is_visible_at(local) {
                continue;
            }
            let tile = hosted.tile()?;
            blit_over(
                &mut frame.data,
                size,
                tile,
                layer.pixel_size(),
                ox + layer.frame.x0.round() as i64,
                oy + layer.frame.y0.round() as i64,
                self.opacity * layer.opacity,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/sync.rs"]
mod tests;
