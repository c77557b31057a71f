use image::RgbaImage;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premul_over_in_place;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Straight-alpha RGBA8 brush carried through Parley layout runs.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

/// Shapes single-run text with Parley.
///
/// Only fonts registered from bytes are visible; no system font discovery happens, so a layout
/// depends on nothing but the text, the font file and the size.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out `text` on a single unbounded line.
    pub(crate) fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Filled rounded rectangle drawn underneath a text block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Backdrop {
    pub(crate) rect: kurbo::Rect,
    pub(crate) radius: f64,
    pub(crate) color: TextBrushRgba8,
}

/// Rasterizes laid-out text (and an optional backdrop) onto RGBA images with `vello_cpu`.
pub(crate) struct TextPainter {
    font: vello_cpu::peniko::FontData,
}

impl TextPainter {
    pub(crate) fn new(font_bytes: &[u8]) -> Self {
        Self {
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
                0,
            ),
        }
    }

    /// Draw `layout` with its top-left corner at `origin`, over an opaque `dst`.
    ///
    /// The overlay is rendered into a transparent pixmap and composited source-over, so `dst`
    /// must hold opaque pixels (straight and premultiplied alpha coincide there).
    pub(crate) fn paint(
        &self,
        dst: &mut RgbaImage,
        layout: &parley::Layout<TextBrushRgba8>,
        origin: (f64, f64),
        backdrop: Option<&Backdrop>,
    ) -> ReelResult<()> {
        let (width, height) = dst.dimensions();
        let w: u16 = width
            .try_into()
            .map_err(|_| ReelError::validation("text target width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ReelError::validation("text target height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);

        if let Some(b) = backdrop {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                b.color.r, b.color.g, b.color.b, b.color.a,
            ));
            let rr = kurbo::RoundedRect::from_rect(b.rect, b.radius);
            ctx.fill_path(&to_cpu_path(kurbo::Shape::path_elements(&rr, 0.1)));
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.0, origin.1)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        premul_over_in_place(dst.as_mut(), pixmap.data_as_u8_slice())
    }
}

fn to_cpu_path(elements: impl Iterator<Item = kurbo::PathEl>) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in elements {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
