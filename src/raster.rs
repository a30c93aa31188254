//! Still image to encoder-ready pixel buffer.

use crate::assets::SourceImage;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

/// Byte layout of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// 32-bit BGRA, straight alpha, one byte per channel.
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 => 4,
        }
    }

    /// `ffmpeg` `-pix_fmt` name for raw input in this layout.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Bgra8 => "bgra",
        }
    }
}

/// A rasterized frame sized to its source image's native extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `data`.
    pub format: PixelFormat,
    /// Tightly packed, row-major pixel bytes.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// A buffer filled with one colour.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> Self {
        let px = [color.b, color.g, color.r, color.a];
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            format: PixelFormat::Bgra8,
            data,
        }
    }

    /// Buffer dimensions.
    pub fn size(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Convert to premultiplied RGBA8, the compositor's working format.
    pub fn to_rgba8_premul(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let color = Rgba8 {
                r: px[2],
                g: px[1],
                b: px[0],
                a: px[3],
            };
            out.extend_from_slice(&color.to_premul());
        }
        out
    }
}

/// Decode `image` and lay it out as a [`PixelFormat::Bgra8`] buffer.
#[tracing::instrument(skip(image), fields(name = image.name()))]
pub fn rasterize(image: &SourceImage) -> ReelResult<PixelBuffer> {
    let decoded = image::load_from_memory(image.bytes())
        .map_err(|e| ReelError::invalid_image(image.name(), e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ReelError::invalid_image(
            image.name(),
            "image has an empty extent",
        ));
    }

    let mut data = rgba.into_raw();
    rgba_to_bgra_in_place(&mut data);
    tracing::debug!(width, height, "rasterized source image");

    Ok(PixelBuffer {
        width,
        height,
        format: PixelFormat::Bgra8,
        data,
    })
}

fn rgba_to_bgra_in_place(px: &mut [u8]) {
    for p in px.chunks_exact_mut(4) {
        p.swap(0, 2);
    }
}

#[cfg(test)]
#[path = "../tests/unit/raster/raster.rs"]
mod tests;
