use crate::foundation::core::TimeRange;

/// Interpolation curve applied across a ramp's window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampCurve {
    /// Constant rate of change.
    #[default]
    Linear,
    /// Slow start (quadratic).
    EaseIn,
    /// Slow end (quadratic).
    EaseOut,
    /// Slow start and end (cubic).
    EaseInOut,
}

impl RampCurve {
    /// Map normalized progress `t` (clamped to `0..=1`) through the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Opacity change over a time window, in composition time.
///
/// Before the window the layer sits at `from`; after it, at `to`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpacityRamp {
    /// Opacity at and before `range.start`.
    pub from: f32,
    /// Opacity at and after `range.end()`.
    pub to: f32,
    /// Window over which opacity changes.
    pub range: TimeRange,
    /// Interpolation curve.
    #[serde(default)]
    pub curve: RampCurve,
}

impl OpacityRamp {
    /// Fade from fully opaque to fully transparent over `range`.
    pub fn fade_out(range: TimeRange) -> Self {
        Self {
            from: 1.0,
            to: 0.0,
            range,
            curve: RampCurve::Linear,
        }
    }

    /// Return the ramp with a different curve.
    pub fn with_curve(mut self, curve: RampCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Opacity at composition time `t` seconds.
    pub fn opacity_at(&self, t: f64) -> f32 {
        if t < self.range.start {
            return self.from;
        }
        if t >= self.range.end() || self.range.duration <= 0.0 {
            return self.to;
        }
        let p = self.curve.apply((t - self.range.start) / self.range.duration) as f32;
        self.from + (self.to - self.from) * p
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/ramp.rs"]
mod tests;
