// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Backend seam: the layout engines emit glyph quads, a backend turns
//! them into something visible.
//!
//! Two implementations: gl renders through glow (atlas texture + VBO),
//! image composes into a cpu byte canvas. Both receive quads in canvas
//! pixel coordinates and normalize internally.

use crate::font::glyph::GlyphInfo;
use crate::render::style::{BackgroundSettings, RenderParams, RenderSettings};

pub mod gl;
pub mod image;

/// One corner of a glyph quad: canvas position and atlas uv, both
/// normalized to 0..1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }
}

/// Normalized min/max corners of the quad of glyph gi drawn at pen
/// position (x, y). ps_* is 1/canvas size, t_* is 1/texture size.
pub fn quad_corners(
    gi: &GlyphInfo,
    x: f32,
    y: f32,
    scale: f32,
    ps_w: f32,
    ps_h: f32,
    t_w: f32,
    t_h: f32,
) -> (Vertex, Vertex) {
    let fx = x + gi.bmp_x as f32 * scale;
    let fy = y - gi.bmp_y as f32 * scale;

    let vmin = Vertex::new(
        fx * ps_w,
        fy * ps_h,
        gi.tx as f32 * t_w,
        gi.ty as f32 * t_h,
    );
    let vmax = Vertex::new(
        (fx + gi.bmp_w as f32 * scale) * ps_w,
        (fy + gi.bmp_h as f32 * scale) * ps_h,
        (gi.tx + gi.bmp_w) as f32 * t_w,
        (gi.ty + gi.bmp_h) as f32 * t_h,
    );
    (vmin, vmax)
}

pub trait Backend {
    fn settings(&self) -> RenderSettings;

    fn set_canvas_size(&mut self, w: i32, h: i32);
    fn swap_canvas_wh(&mut self);

    fn set_enabled(&mut self, val: bool);
    fn is_enabled(&self) -> bool;

    fn set_background(&mut self, _bs: Option<BackgroundSettings>) {}

    /// Drop all geometry accumulated for the current frame.
    fn clear(&mut self);

    /// Emit one glyph quad at pen position (x, y) in canvas pixels.
    fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, rp: &RenderParams);

    /// Called after all quads of one string / number were emitted.
    fn finish_quad_group(&mut self, _rp: &RenderParams) {}

    /// Upload the atlas bytes, called only when the atlas changed.
    fn fill_font_texture(&mut self, bytes: &[u8], w: i32, h: i32);

    /// Push the accumulated vertex data to its destination.
    fn fill_geometry(&mut self);

    fn render(&mut self) {
        self.render_with(None, None);
    }

    /// Draw, with optional host callbacks around the actual draw call.
    /// The pre callback receives the native shader program id on the gl
    /// backend and 0 elsewhere.
    fn render_with(
        &mut self,
        pre: Option<&mut dyn FnMut(u32)>,
        post: Option<&mut dyn FnMut()>,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyph::tests::test_glyph;

    #[test]
    fn quad_corners_map_pen_and_uv() {
        let mut gi = test_glyph('A', 10, 20, 0);
        gi.bmp_x = 2;
        gi.bmp_y = 18;
        gi.tx = 32;
        gi.ty = 64;

        // canvas 100x200, texture 128x128
        let (vmin, vmax) =
            quad_corners(&gi, 10.0, 50.0, 1.0, 1.0 / 100.0, 1.0 / 200.0, 1.0 / 128.0, 1.0 / 128.0);

        // pen 10 + bearing 2 = 12, top = 50 - 18 = 32
        assert!((vmin.x - 0.12).abs() < 1e-6);
        assert!((vmin.y - 0.16).abs() < 1e-6);
        assert!((vmax.x - 0.22).abs() < 1e-6);
        assert!((vmax.y - 0.26).abs() < 1e-6);

        assert!((vmin.u - 0.25).abs() < 1e-6);
        assert!((vmin.v - 0.5).abs() < 1e-6);
        assert!((vmax.u - (42.0 / 128.0)).abs() < 1e-6);
        assert!((vmax.v - (84.0 / 128.0)).abs() < 1e-6);
    }
}
