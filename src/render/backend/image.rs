// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! CPU compositing backend.
//!
//! Keeps the composed canvas as a plain byte buffer in GRAYSCALE, RGB or
//! RGBA. add_quad samples the glyph's coverage out of the stored atlas
//! copy (nearest when scaled) and runs every destination pixel through a
//! blend closure. The result is pulled with get_raw_data() or cropped to
//! the union of all quads with get_tight_clamped_raw_data().

use crate::font::glyph::GlyphInfo;
use crate::render::backend::Backend;
use crate::render::style::{Color, ImageFormat, RenderParams, RenderSettings};
use crate::util::Aabb;
use log::warn;

/// blend(coverage, dst_pixel, color, format)
pub type ColorBlend = Box<dyn Fn(u8, &mut [u8], &Color, ImageFormat)>;

/// Extra canvas kept around the quad union when tight clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TightCanvasSettings {
    pub border_left: i32,
    pub border_right: i32,
    pub border_top: i32,
    pub border_bottom: i32,
}

#[derive(Debug, Clone)]
pub struct ImageData {
    pub format: ImageFormat,
    pub w: i32,
    pub h: i32,
    pub raw_data: Vec<u8>,
}

/// Source-over with the glyph coverage as alpha.
fn default_blend(coverage: u8, dst: &mut [u8], color: &Color, format: ImageFormat) {
    let a = (coverage as f32 / 255.0) * color.a;
    if a <= 0.0 {
        return;
    }
    match format {
        ImageFormat::Grayscale => {
            let g = (0.299 * color.r + 0.587 * color.g + 0.114 * color.b) * 255.0;
            dst[0] = (dst[0] as f32 * (1.0 - a) + g * a) as u8;
        }
        ImageFormat::Rgb => {
            dst[0] = (dst[0] as f32 * (1.0 - a) + color.r * 255.0 * a) as u8;
            dst[1] = (dst[1] as f32 * (1.0 - a) + color.g * 255.0 * a) as u8;
            dst[2] = (dst[2] as f32 * (1.0 - a) + color.b * 255.0 * a) as u8;
        }
        ImageFormat::Rgba => {
            dst[0] = (dst[0] as f32 * (1.0 - a) + color.r * 255.0 * a) as u8;
            dst[1] = (dst[1] as f32 * (1.0 - a) + color.g * 255.0 * a) as u8;
            dst[2] = (dst[2] as f32 * (1.0 - a) + color.b * 255.0 * a) as u8;
            dst[3] = (dst[3] as f32 + (255.0 - dst[3] as f32) * a) as u8;
        }
    }
}

pub struct ImageBackend {
    rs: RenderSettings,
    img: ImageData,

    bg_value: [u8; 4],
    color_blend: ColorBlend,

    enable_tight_canvas: bool,
    tight_settings: TightCanvasSettings,
    quads_aabb: Aabb,

    // atlas copy, the source of glyph coverage
    atlas: Vec<u8>,
    atlas_w: i32,
    atlas_h: i32,

    enabled: bool,
}

impl ImageBackend {
    pub fn new(rs: RenderSettings, format: ImageFormat) -> Self {
        let size = (rs.canvas_w * rs.canvas_h) as usize * format.channels();
        Self {
            rs,
            img: ImageData {
                format,
                w: rs.canvas_w,
                h: rs.canvas_h,
                raw_data: vec![0u8; size],
            },
            bg_value: [0, 0, 0, 0],
            color_blend: Box::new(default_blend),
            enable_tight_canvas: false,
            tight_settings: TightCanvasSettings::default(),
            quads_aabb: Aabb::new(),
            atlas: vec![],
            atlas_w: 0,
            atlas_h: 0,
            enabled: true,
        }
    }

    pub fn set_background_value(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.bg_value = [r, g, b, a];
        self.fill_canvas();
    }

    pub fn set_color_blend(&mut self, blend: ColorBlend) {
        self.color_blend = blend;
    }

    pub fn set_tight_dynamic_canvas_enabled(&mut self, val: bool, ts: TightCanvasSettings) {
        self.enable_tight_canvas = val;
        self.tight_settings = ts;
    }

    pub fn get_raw_data(&self) -> &ImageData {
        &self.img
    }

    /// The canvas cropped to the union of all quads, padded by the tight
    /// borders and clamped to the canvas.
    pub fn get_tight_clamped_raw_data(&self) -> ImageData {
        if !self.enable_tight_canvas || self.quads_aabb.is_empty() {
            return self.img.clone();
        }

        let ts = &self.tight_settings;
        let min_x = ((self.quads_aabb.min_x.floor() as i32) - ts.border_left).max(0);
        let min_y = ((self.quads_aabb.min_y.floor() as i32) - ts.border_top).max(0);
        let max_x = ((self.quads_aabb.max_x.ceil() as i32) + ts.border_right).min(self.img.w);
        let max_y = ((self.quads_aabb.max_y.ceil() as i32) + ts.border_bottom).min(self.img.h);

        let ch = self.img.format.channels();
        let w = (max_x - min_x).max(0);
        let h = (max_y - min_y).max(0);
        let mut raw = Vec::with_capacity((w * h) as usize * ch);
        for y in min_y..max_y {
            let start = ((y * self.img.w + min_x) as usize) * ch;
            raw.extend_from_slice(&self.img.raw_data[start..start + (w as usize) * ch]);
        }
        ImageData {
            format: self.img.format,
            w,
            h,
            raw_data: raw,
        }
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), crate::error::FontError> {
        let color = match self.img.format {
            ImageFormat::Grayscale => image::ColorType::L8,
            ImageFormat::Rgb => image::ColorType::Rgb8,
            ImageFormat::Rgba => image::ColorType::Rgba8,
        };
        image::save_buffer(
            path,
            &self.img.raw_data,
            self.img.w as u32,
            self.img.h as u32,
            color,
        )
        .map_err(|e| crate::error::FontError::Backend(e.to_string()))
    }

    fn fill_canvas(&mut self) {
        let ch = self.img.format.channels();
        for px in self.img.raw_data.chunks_exact_mut(ch) {
            px.copy_from_slice(&self.bg_value[..ch]);
        }
    }

    fn resize_canvas(&mut self) {
        self.img.w = self.rs.canvas_w;
        self.img.h = self.rs.canvas_h;
        self.img.raw_data =
            vec![0u8; (self.img.w * self.img.h) as usize * self.img.format.channels()];
        self.fill_canvas();
        self.quads_aabb = Aabb::new();
    }
}

impl Backend for ImageBackend {
    fn settings(&self) -> RenderSettings {
        self.rs
    }

    fn set_canvas_size(&mut self, w: i32, h: i32) {
        self.rs.canvas_w = w;
        self.rs.canvas_h = h;
        self.resize_canvas();
    }

    fn swap_canvas_wh(&mut self) {
        std::mem::swap(&mut self.rs.canvas_w, &mut self.rs.canvas_h);
        self.resize_canvas();
    }

    fn set_enabled(&mut self, val: bool) {
        self.enabled = val;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn clear(&mut self) {
        self.fill_canvas();
        self.quads_aabb = Aabb::new();
    }

    fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, rp: &RenderParams) {
        if self.atlas.is_empty() {
            warn!("image backend: no atlas uploaded yet");
            return;
        }

        let scale = rp.scale;
        let fx = x + gi.bmp_x as f32 * scale;
        let fy = y - gi.bmp_y as f32 * scale;
        let qw = gi.bmp_w as f32 * scale;
        let qh = gi.bmp_h as f32 * scale;

        self.quads_aabb.update(fx, fy, qw, qh);

        let ch = self.img.format.channels();
        let x0 = fx.floor() as i32;
        let y0 = fy.floor() as i32;
        let x1 = (fx + qw).ceil() as i32;
        let y1 = (fy + qh).ceil() as i32;

        for iy in y0.max(0)..y1.min(self.img.h) {
            let sy = (((iy as f32 - fy) / scale) as i32).clamp(0, gi.bmp_h - 1);
            for ix in x0.max(0)..x1.min(self.img.w) {
                let sx = (((ix as f32 - fx) / scale) as i32).clamp(0, gi.bmp_w - 1);

                let ax = gi.tx + sx;
                let ay = gi.ty + sy;
                if ax < 0 || ay < 0 || ax >= self.atlas_w || ay >= self.atlas_h {
                    continue;
                }
                let coverage = self.atlas[(ay * self.atlas_w + ax) as usize];
                if coverage == 0 {
                    continue;
                }

                let di = ((iy * self.img.w + ix) as usize) * ch;
                (self.color_blend)(
                    coverage,
                    &mut self.img.raw_data[di..di + ch],
                    &rp.color,
                    self.img.format,
                );
            }
        }
    }

    fn fill_font_texture(&mut self, bytes: &[u8], w: i32, h: i32) {
        self.atlas = bytes.to_vec();
        self.atlas_w = w;
        self.atlas_h = h;
    }

    fn fill_geometry(&mut self) {
        // quads are composed immediately, nothing to upload
    }

    fn render_with(
        &mut self,
        pre: Option<&mut dyn FnMut(u32)>,
        post: Option<&mut dyn FnMut()>,
    ) {
        if !self.enabled {
            return;
        }
        if let Some(pre) = pre {
            pre(0);
        }
        if let Some(post) = post {
            post();
        }
    }
}
