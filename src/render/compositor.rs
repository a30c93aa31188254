use crate::foundation::core::Rgba8;
use crate::foundation::error::ReelResult;
use crate::render::FrameRGBA;
use crate::render::composite::{blit_over, fill};
use crate::render::source::ClipFrameSource;
use crate::timeline::compose::Composition;

/// Options for [`render_composition_frame`].
#[derive(Clone, Copy, Debug)]
pub struct CompositorOpts {
    /// Colour the frame is cleared to before any clip is drawn.
    pub clear: Rgba8,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            clear: Rgba8::BLACK,
        }
    }
}

/// Render the composition at time `t` seconds at its render size.
///
/// Clips are drawn unscaled at the origin, bottom layer first, each at its ramp opacity.
pub fn render_composition_frame(
    comp: &Composition,
    t: f64,
    source: &mut dyn ClipFrameSource,
    opts: CompositorOpts,
) -> ReelResult<FrameRGBA> {
    let size = comp.render_size();
    let mut data = vec![0u8; size.rgba_len()];
    fill(&mut data, opts.clear.to_premul());

    for layer in comp.layers_at(t) {
        let picture = source.frame_at(&layer.entry.clip, layer.local_secs)?;
        blit_over(
            &mut data,
            size,
            &picture.rgba8_premul,
            picture.size,
            0,
            0,
            layer.opacity,
        )?;
    }

    Ok(FrameRGBA {
        width: size.width,
        height: size.height,
        data,
        premultiplied: true,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
