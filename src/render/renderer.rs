// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Shared renderer core: composes the font builder with a backend and
//! carries the state both layout engines need - caption config, axis
//! origin, the changed flag and the per-pass touched-glyph set that
//! drives eviction.

use crate::font::builder::FontBuilder;
use crate::font::cache::FontCache;
use crate::font::glyph::{FontBuilderSettings, GlyphInfo};
use crate::render::backend::Backend;
use crate::render::style::{AxisYOrigin, BackgroundSettings, RenderParams};
use std::collections::HashSet;
use std::sync::Arc;

pub struct CaptionInfo {
    pub mark: String,
    pub offset: i32,
}

impl Default for CaptionInfo {
    fn default() -> Self {
        Self {
            mark: ".".to_string(),
            offset: 10,
        }
    }
}

pub struct RendererCore {
    pub fb: FontBuilder,
    pub backend: Box<dyn Backend>,
    pub ci: CaptionInfo,
    pub axis_y_origin: AxisYOrigin,
    pub check_visibility: bool,
    pub str_changed: bool,
    touched: HashSet<(usize, char)>,
}

impl RendererCore {
    pub fn new(
        settings: &FontBuilderSettings,
        cache: &Arc<FontCache>,
        backend: Box<dyn Backend>,
    ) -> Self {
        Self {
            fb: FontBuilder::new(settings, cache),
            backend,
            ci: CaptionInfo::default(),
            axis_y_origin: AxisYOrigin::Top,
            check_visibility: true,
            str_changed: false,
            touched: HashSet::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fb: FontBuilder, backend: Box<dyn Backend>) -> Self {
        Self {
            fb,
            backend,
            ci: CaptionInfo::default(),
            axis_y_origin: AxisYOrigin::Top,
            check_visibility: true,
            str_changed: false,
            touched: HashSet::new(),
        }
    }

    pub fn canvas_w(&self) -> i32 {
        self.backend.settings().canvas_w
    }

    pub fn canvas_h(&self) -> i32 {
        self.backend.settings().canvas_h
    }

    pub fn set_canvas_size(&mut self, w: i32, h: i32) {
        self.backend.set_canvas_size(w, h);
        self.str_changed = true;
    }

    pub fn swap_canvas_wh(&mut self) {
        self.backend.swap_canvas_wh();
        self.str_changed = true;
    }

    pub fn set_caption(&mut self, mark: &str, offset_px: i32) {
        self.ci.mark = mark.to_string();
        self.ci.offset = offset_px;
    }

    pub fn set_caption_offset(&mut self, offset_px: i32) {
        self.ci.offset = offset_px;
    }

    pub fn set_axis_y_origin(&mut self, origin: AxisYOrigin) {
        self.axis_y_origin = origin;
    }

    pub fn set_visibility_check(&mut self, val: bool) {
        self.check_visibility = val;
    }

    pub fn set_background_settings(&mut self, bs: Option<BackgroundSettings>) {
        self.backend.set_background(bs);
    }

    /// Flip incoming y when the origin sits at the bottom.
    pub fn apply_axis_y(&self, y: i32) -> i32 {
        match self.axis_y_origin {
            AxisYOrigin::Top => y,
            AxisYOrigin::Down => self.canvas_h() - y,
        }
    }

    /// Emit one glyph quad and remember that the glyph was used this pass.
    pub fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, rp: &RenderParams) {
        self.touched.insert((gi.font_index, gi.code));
        self.backend.add_quad(gi, x, y, rp);
    }

    /// Build the atlas for all pending code points; upload it when it
    /// changed. Returns whether an upload happened.
    pub fn prepare_atlas(&mut self) -> bool {
        if self.fb.create_font_atlas() {
            self.backend.fill_font_texture(
                self.fb.texture(),
                self.fb.texture_width(),
                self.fb.texture_height(),
            );
            return true;
        }
        false
    }

    /// Hand the touched set to the builder: everything else becomes
    /// eviction fodder for the next pack.
    pub fn finish_pass(&mut self) {
        let touched = std::mem::take(&mut self.touched);
        self.fb.update_unused(&touched);
    }
}

#[cfg(test)]
pub(crate) mod test_backend {
    use super::*;
    use crate::render::style::RenderSettings;

    /// Records emitted quads instead of drawing them.
    pub struct RecordingBackend {
        pub rs: RenderSettings,
        pub quads: Vec<(char, f32, f32)>,
        pub groups_finished: usize,
        pub clears: usize,
        pub texture_uploads: usize,
        pub geometry_uploads: usize,
        enabled: bool,
    }

    impl RecordingBackend {
        pub fn new(canvas_w: i32, canvas_h: i32) -> Self {
            Self {
                rs: RenderSettings {
                    canvas_w,
                    canvas_h,
                    ..Default::default()
                },
                quads: vec![],
                groups_finished: 0,
                clears: 0,
                texture_uploads: 0,
                geometry_uploads: 0,
                enabled: true,
            }
        }

        pub fn emitted(&self) -> String {
            self.quads.iter().map(|q| q.0).collect()
        }
    }

    impl Backend for RecordingBackend {
        fn settings(&self) -> RenderSettings {
            self.rs
        }

        fn set_canvas_size(&mut self, w: i32, h: i32) {
            self.rs.canvas_w = w;
            self.rs.canvas_h = h;
        }

        fn swap_canvas_wh(&mut self) {
            std::mem::swap(&mut self.rs.canvas_w, &mut self.rs.canvas_h);
        }

        fn set_enabled(&mut self, val: bool) {
            self.enabled = val;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn clear(&mut self) {
            self.quads.clear();
            self.clears += 1;
        }

        fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, _rp: &RenderParams) {
            self.quads.push((gi.code, x, y));
        }

        fn finish_quad_group(&mut self, _rp: &RenderParams) {
            self.groups_finished += 1;
        }

        fn fill_font_texture(&mut self, _bytes: &[u8], _w: i32, _h: i32) {
            self.texture_uploads += 1;
        }

        fn fill_geometry(&mut self) {
            self.geometry_uploads += 1;
        }

        fn render_with(
            &mut self,
            _pre: Option<&mut dyn FnMut(u32)>,
            _post: Option<&mut dyn FnMut()>,
        ) {
        }
    }

    /// Cloneable handle so a test can keep inspecting the backend after
    /// it moved into the renderer.
    #[derive(Clone)]
    pub struct SharedBackend(pub std::rc::Rc<std::cell::RefCell<RecordingBackend>>);

    impl SharedBackend {
        pub fn new(canvas_w: i32, canvas_h: i32) -> Self {
            Self(std::rc::Rc::new(std::cell::RefCell::new(
                RecordingBackend::new(canvas_w, canvas_h),
            )))
        }
    }

    impl Backend for SharedBackend {
        fn settings(&self) -> RenderSettings {
            self.0.borrow().rs
        }

        fn set_canvas_size(&mut self, w: i32, h: i32) {
            self.0.borrow_mut().set_canvas_size(w, h);
        }

        fn swap_canvas_wh(&mut self) {
            self.0.borrow_mut().swap_canvas_wh();
        }

        fn set_enabled(&mut self, val: bool) {
            self.0.borrow_mut().set_enabled(val);
        }

        fn is_enabled(&self) -> bool {
            self.0.borrow().is_enabled()
        }

        fn clear(&mut self) {
            self.0.borrow_mut().clear();
        }

        fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, rp: &RenderParams) {
            self.0.borrow_mut().add_quad(gi, x, y, rp);
        }

        fn finish_quad_group(&mut self, rp: &RenderParams) {
            self.0.borrow_mut().finish_quad_group(rp);
        }

        fn fill_font_texture(&mut self, bytes: &[u8], w: i32, h: i32) {
            self.0.borrow_mut().fill_font_texture(bytes, w, h);
        }

        fn fill_geometry(&mut self) {
            self.0.borrow_mut().fill_geometry();
        }

        fn render_with(
            &mut self,
            pre: Option<&mut dyn FnMut(u32)>,
            post: Option<&mut dyn FnMut()>,
        ) {
            self.0.borrow_mut().render_with(pre, post);
        }
    }
}
