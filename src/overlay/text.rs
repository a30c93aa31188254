use std::sync::{Arc, OnceLock};

use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

/// Horizontal text alignment inside the layer frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centred.
    #[default]
    Center,
    /// Flush right.
    Right,
}

impl TextAlign {
    fn svg_anchor(self) -> &'static str {
        match self {
            Self::Left => "start",
            Self::Center => "middle",
            Self::Right => "end",
        }
    }
}

/// Visual style of an [`OverlayLayer`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Preferred font family.
    pub font_family: String,
    /// Generic family used when the preferred one is not installed.
    pub fallback_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text colour.
    pub color: Rgba8,
    /// Fill behind the text, covering the whole layer frame.
    pub background: Rgba8,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Break lines that do not fit the frame width.
    pub wrapped: bool,
    /// Replace text that does not fit vertically with a trailing ellipsis.
    pub truncate_end: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Chalkduster".to_string(),
            fallback_family: "sans-serif".to_string(),
            font_size: 30.0,
            color: Rgba8::CYAN,
            background: Rgba8::BROWN,
            align: TextAlign::Center,
            wrapped: true,
            truncate_end: true,
        }
    }
}

/// A fixed-position text element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayLayer {
    /// Text content.
    pub text: String,
    /// Position and size in composition pixels.
    pub frame: Rect,
    /// Style attributes.
    pub style: TextStyle,
    /// Composition time the layer appears at.
    pub begin_time: f64,
    /// Layer opacity in `0..=1`.
    pub opacity: f32,
}

impl Default for OverlayLayer {
    fn default() -> Self {
        Self {
            text: "My text".to_string(),
            frame: Rect::new(0.0, 0.0, 100.0, 100.0),
            style: TextStyle::default(),
            begin_time: 0.0,
            opacity: 1.0,
        }
    }
}

impl OverlayLayer {
    /// Start building a layer from the default text and style.
    pub fn builder() -> OverlayLayerBuilder {
        OverlayLayerBuilder::default()
    }

    /// Check geometry, font size, begin time and opacity.
    pub fn validate(&self) -> ReelResult<()> {
        if !(self.frame.width() > 0.0 && self.frame.height() > 0.0) {
            return Err(ReelError::validation("text layer frame must be non-empty"));
        }
        if !self.style.font_size.is_finite() || self.style.font_size <= 0.0 {
            return Err(ReelError::validation(
                "text layer font size must be finite and > 0",
            ));
        }
        if !self.begin_time.is_finite() || self.begin_time < 0.0 {
            return Err(ReelError::validation("text layer begin time must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ReelError::validation("text layer opacity must be within 0..=1"));
        }
        Ok(())
    }

    /// `true` once composition time reaches `begin_time`.
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.begin_time && self.opacity > 0.0
    }

    /// Pixel size of the layer frame, rounded up.
    pub fn pixel_size(&self) -> Canvas {
        Canvas::new(
            self.frame.width().max(0.0).ceil() as u32,
            self.frame.height().max(0.0).ceil() as u32,
        )
    }

    /// Lines to draw after wrapping and truncation.
    ///
    /// Glyph widths are estimated from the font size since the final face is only known to the
    /// rasterizer.
    pub fn layout_lines(&self) -> Vec<String> {
        let size = self.pixel_size();
        let avg_glyph = f64::from(self.style.font_size) * 0.55;
        let line_height = f64::from(self.style.font_size) * 1.2;
        let max_chars = if self.style.wrapped && avg_glyph > 0.0 {
            ((f64::from(size.width) / avg_glyph).floor() as usize).max(1)
        } else {
            usize::MAX
        };
        let max_lines = if line_height > 0.0 {
            ((f64::from(size.height) / line_height).floor() as usize).max(1)
        } else {
            1
        };

        let mut lines = Vec::new();
        for paragraph in self.text.lines() {
            wrap_words(paragraph, max_chars, &mut lines);
        }
        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if self.style.truncate_end
                && let Some(last) = lines.last_mut()
            {
                let keep = last.chars().count().min(max_chars.saturating_sub(1));
                *last = last.chars().take(keep).collect::<String>() + "\u{2026}";
            }
        }
        lines
    }

    /// Standalone SVG document drawing the layer at its own size.
    pub fn to_svg(&self) -> String {
        let size = self.pixel_size();
        let (w, h) = (size.width, size.height);
        let fs = self.style.font_size;
        let line_height = f64::from(fs) * 1.2;
        let x = match self.style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => f64::from(w) / 2.0,
            TextAlign::Right => f64::from(w),
        };

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        svg.push_str(&format!(
            r#"<rect width="{w}" height="{h}" fill="{}" fill-opacity="{}"/>"#,
            self.style.background.to_hex_rgb(),
            self.style.background.alpha_f32()
        ));
        svg.push_str(&format!(
            r#"<text font-family="{}, {}" font-size="{fs}" fill="{}" fill-opacity="{}" text-anchor="{}">"#,
            xml_escape(&quote_family(&self.style.font_family)),
            xml_escape(&self.style.fallback_family),
            self.style.color.to_hex_rgb(),
            self.style.color.alpha_f32(),
            self.style.align.svg_anchor()
        ));
        for (i, line) in self.layout_lines().iter().enumerate() {
            let y = f64::from(fs) + line_height * i as f64;
            svg.push_str(&format!(
                r#"<tspan x="{x}" y="{y}">{}</tspan>"#,
                xml_escape(line)
            ));
        }
        svg.push_str("</text></svg>");
        svg
    }

    /// Rasterize the layer into a premultiplied RGBA8 tile of [`OverlayLayer::pixel_size`].
    pub fn rasterize(&self) -> ReelResult<Vec<u8>> {
        let size = self.pixel_size();
        if size.is_empty() {
            return Err(ReelError::validation("text layer frame must be non-empty"));
        }
        let tree = usvg::Tree::from_str(&self.to_svg(), &svg_options())
            .map_err(|e| ReelError::evaluation(format!("text layer svg: {e}")))?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width, size.height)
            .ok_or_else(|| ReelError::evaluation("failed to allocate text layer pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.data().to_vec())
    }
}

/// Builder for [`OverlayLayer`]. Defaults: `"My text"`, 100x100 at the origin, begin time 0.
#[derive(Clone, Debug, Default)]
pub struct OverlayLayerBuilder {
    layer: OverlayLayer,
}

impl OverlayLayerBuilder {
    /// Text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.layer.text = text.into();
        self
    }

    /// Position and size in composition pixels.
    pub fn frame(mut self, frame: Rect) -> Self {
        self.layer.frame = frame;
        self
    }

    /// Replace the whole style.
    pub fn style(mut self, style: TextStyle) -> Self {
        self.layer.style = style;
        self
    }

    /// Preferred font family.
    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.layer.style.font_family = family.into();
        self
    }

    /// Font size in pixels.
    pub fn font_size(mut self, size: f32) -> Self {
        self.layer.style.font_size = size;
        self
    }

    /// Text colour.
    pub fn color(mut self, color: Rgba8) -> Self {
        self.layer.style.color = color;
        self
    }

    /// Background colour.
    pub fn background(mut self, color: Rgba8) -> Self {
        self.layer.style.background = color;
        self
    }

    /// Composition time the layer appears at.
    pub fn begin_time(mut self, t: f64) -> Self {
        self.layer.begin_time = t;
        self
    }

    /// Layer opacity.
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.layer.opacity = opacity;
        self
    }

    /// Validate and produce the layer.
    pub fn build(self) -> ReelResult<OverlayLayer> {
        self.layer.validate()?;
        Ok(self.layer)
    }
}

fn wrap_words(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    for word in paragraph.split_whitespace() {
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !line.is_empty() {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        out.push(line);
    }
}

fn quote_family(family: &str) -> String {
    if family.contains(' ') {
        format!("'{family}'")
    } else {
        family.to_string()
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn svg_options() -> usvg::Options<'static> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    let fontdb = FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts for text layers");
            Arc::new(db)
        })
        .clone();
    let mut opts = usvg::Options::default();
    opts.fontdb = fontdb;
    opts
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/text.rs"]
mod tests;
