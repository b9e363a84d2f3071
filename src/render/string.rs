// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! String layout.
//!
//! add_string validates and stores, render() walks the stored strings and
//! emits one quad per printable glyph. Validation covers duplicates, the
//! coarse visibility estimate and the deadzone. Bidi text is converted to
//! visual order at ingest, so emission is a plain left-to-right walk.

use crate::font::builder::FontBuilder;
use crate::font::cache::FontCache;
use crate::font::glyph::FontBuilderSettings;
use crate::render::backend::Backend;
use crate::render::renderer::RendererCore;
use crate::render::style::{
    AxisYOrigin, BackgroundSettings, RenderParams, TextAlign, TextAnchor, TextType,
};
use crate::unicode;
use crate::util::Aabb;
use std::sync::Arc;

/// One submitted string with its cached layout. lines is empty until the
/// first geometry pass anchors the string; canvas changes clear it again.
pub struct StringInfo {
    pub text: String,
    pub x: i32,
    pub y: i32,

    pub anchor: TextAnchor,
    pub align: TextAlign,
    pub ttype: TextType,

    pub anchor_x: f32,
    pub anchor_y: f32,

    pub render_params: RenderParams,

    pub lines: Vec<Aabb>,
    pub global: Aabb,
    pub max_new_line_offset: f32,
}

impl StringInfo {
    fn new(
        text: String,
        x: i32,
        y: i32,
        rp: RenderParams,
        anchor: TextAnchor,
        align: TextAlign,
        ttype: TextType,
    ) -> Self {
        Self {
            text,
            x,
            y,
            anchor,
            align,
            ttype,
            anchor_x: x as f32,
            anchor_y: y as f32,
            render_params: rp,
            lines: vec![],
            global: Aabb::new(),
            max_new_line_offset: 0.0,
        }
    }
}

pub struct StringRenderer {
    core: RendererCore,
    strs: Vec<StringInfo>,

    is_bidi_enabled: bool,
    deadzone_radius2: i32,
    nl_offset_px: i32,

    space_size: i64,
    space_size_exist: bool,
}

impl StringRenderer {
    pub fn new(
        settings: &FontBuilderSettings,
        cache: &Arc<FontCache>,
        backend: Box<dyn Backend>,
    ) -> Self {
        Self::with_core(RendererCore::new(settings, cache, backend))
    }

    fn with_core(core: RendererCore) -> Self {
        Self {
            core,
            strs: vec![],
            is_bidi_enabled: true,
            deadzone_radius2: 0,
            nl_offset_px: 0,
            space_size: 10,
            space_size_exist: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_core(core: RendererCore) -> Self {
        Self::with_core(core)
    }

    // ------------------------------------------------------------------
    // configuration passthrough

    pub fn font_builder(&mut self) -> &mut FontBuilder {
        &mut self.core.fb
    }

    pub fn set_canvas_size(&mut self, w: i32, h: i32) {
        self.core.set_canvas_size(w, h);
        self.invalidate_layout();
    }

    pub fn swap_canvas_wh(&mut self) {
        self.core.swap_canvas_wh();
        self.invalidate_layout();
    }

    pub fn set_caption(&mut self, mark: &str, offset_px: i32) {
        self.core.set_caption(mark, offset_px);
    }

    pub fn set_axis_y_origin(&mut self, origin: AxisYOrigin) {
        self.core.set_axis_y_origin(origin);
    }

    pub fn set_visibility_check(&mut self, val: bool) {
        self.core.set_visibility_check(val);
    }

    pub fn set_background_settings(&mut self, bs: Option<BackgroundSettings>) {
        self.core.set_background_settings(bs);
    }

    pub fn set_new_line_offset(&mut self, offset_px: i32) {
        self.nl_offset_px = offset_px;
    }

    pub fn set_bidi_enabled(&mut self, val: bool) {
        self.is_bidi_enabled = val;
    }

    /// New strings within this radius of an accepted string of the same
    /// type are rejected.
    pub fn set_string_deadzone(&mut self, radius_px: i32) {
        self.deadzone_radius2 = radius_px * radius_px;
    }

    // ------------------------------------------------------------------
    // submitted strings

    pub fn clear(&mut self) {
        self.core.backend.clear();
        self.core.str_changed = true;
        self.strs.clear();
    }

    pub fn get_strings_count(&self) -> usize {
        self.strs.len()
    }

    pub fn get_string_info(&self, index: usize) -> Option<&StringInfo> {
        self.strs.get(index)
    }

    /// The most recently added string; for captions this is the text, not
    /// the mark.
    pub fn get_last_string_info(&self) -> Option<&StringInfo> {
        let mut it = self.strs.iter().rev();
        let last = it.next()?;
        if last.ttype == TextType::CaptionSymbol {
            return it.next();
        }
        Some(last)
    }

    pub fn add_string(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
        align: TextAlign,
    ) -> bool {
        self.add_string_internal(text, x, y, rp, anchor, align, TextType::Text)
    }

    /// Coordinates in 0..1 of the canvas.
    pub fn add_string_rel(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        rp: &RenderParams,
        anchor: TextAnchor,
        align: TextAlign,
    ) -> bool {
        let xx = (x * self.core.canvas_w() as f32) as i32;
        let yy = (y * self.core.canvas_h() as f32) as i32;
        self.add_string_internal(text, xx, yy, rp, anchor, align, TextType::Text)
    }

    /// Caption: the mark glyph plus the text, both centered on (x, y);
    /// anchoring stacks the mark above the text block.
    pub fn add_string_caption(&mut self, text: &str, x: i32, y: i32, rp: &RenderParams) -> bool {
        let mark = self.core.ci.mark.clone();
        self.add_string_internal(
            &mark,
            x,
            y,
            rp,
            TextAnchor::Center,
            TextAlign::Center,
            TextType::CaptionSymbol,
        );
        self.add_string_internal(
            text,
            x,
            y,
            rp,
            TextAnchor::Center,
            TextAlign::Center,
            TextType::CaptionText,
        )
    }

    pub fn add_string_caption_rel(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        rp: &RenderParams,
    ) -> bool {
        let xx = (x * self.core.canvas_w() as f32) as i32;
        let yy = (y * self.core.canvas_h() as f32) as i32;
        self.add_string_caption(text, xx, yy, rp)
    }

    fn add_string_internal(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
        align: TextAlign,
        ttype: TextType,
    ) -> bool {
        let y = self.core.apply_axis_y(y);

        let uni = if self.is_bidi_enabled {
            unicode::convert_one_line(text)
        } else {
            text.to_string()
        };

        if !self.can_add_string(&uni, x, y, rp, anchor, align, ttype) {
            return false;
        }

        self.core.fb.add_string(&uni);
        self.strs
            .push(StringInfo::new(uni, x, y, *rp, anchor, align, ttype));
        self.core.str_changed = true;
        true
    }

    fn can_add_string(
        &self,
        uni: &str,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
        align: TextAlign,
        ttype: TextType,
    ) -> bool {
        // an identical string on the identical position already exists
        for s in &self.strs {
            if s.x == x
                && s.y == y
                && s.render_params.scale == rp.scale
                && s.align == align
                && s.anchor == anchor
                && s.ttype == ttype
                && s.text == uni
            {
                return false;
            }
        }

        if self.core.check_visibility {
            let mut estim =
                self.estimate_string_aabb(uni, x as f32, y as f32, rp.scale);
            if anchor == TextAnchor::Center {
                let w = estim.max_x - estim.min_x;
                let h = estim.max_y - estim.min_y;
                estim.min_x -= w / 2.0;
                estim.max_x -= w / 2.0;
                estim.min_y -= h / 2.0;
                estim.max_y -= h / 2.0;
            }

            if uni != self.core.ci.mark
                && (estim.max_x <= 0.0
                    || estim.max_y <= 0.0
                    || estim.min_x > self.core.canvas_w() as f32
                    || estim.min_y > self.core.canvas_h() as f32)
            {
                return false;
            }
        }

        if self.deadzone_radius2 > 0 {
            for s in &self.strs {
                if s.ttype != ttype {
                    continue;
                }
                let dx = s.x - x;
                let dy = s.y - y;
                if dx * dx + dy * dy <= self.deadzone_radius2 {
                    return false;
                }
            }
        }

        true
    }

    /// Coarse AABB: unknown glyphs count as max_font_px squares. Cheap on
    /// purpose, it runs on every add_string.
    fn estimate_string_aabb(&self, text: &str, x: f32, y: f32, scale: f32) -> Aabb {
        let fb = &self.core.fb;
        let mut aabb = Aabb::new();

        let max_glyph_h = fb.max_font_pixel_height() as f32 * scale;
        let mut w;
        let mut h;
        let mut adv;

        let start_x = x;
        let mut x = x;
        let mut y = y;

        let mut last_new_line_offset = fb.max_new_line_offset() as f32 * scale;
        let mut new_line_offset = 0.0f32;

        for c in text.chars() {
            if c == '\n' {
                if new_line_offset == 0.0 {
                    new_line_offset = last_new_line_offset;
                }
                x = start_x;
                y += new_line_offset;
                last_new_line_offset = new_line_offset;
                new_line_offset = 0.0;
                continue;
            }

            if let Some((gi, fi)) = fb.get_glyph_with_font(c) {
                w = gi.bmp_w as f32 * scale;
                h = gi.bmp_h as f32 * scale;
                adv = ((gi.adv >> 6) as f32) * scale;
                new_line_offset = new_line_offset.max(fi.new_line_offset as f32 * scale);
            } else {
                w = max_glyph_h;
                h = max_glyph_h;
                adv = max_glyph_h;
            }

            aabb.update(x + w, y - h, w, h);
            x += adv;
        }
        aabb
    }

    /// Exact per-line AABBs from the real glyph metrics, unpositioned;
    /// scaled at the end, the global box is the union of the lines.
    fn calc_string_aabb(fb: &FontBuilder, nl_offset_px: i32, si: &mut StringInfo) {
        let s = si.render_params.scale;
        si.max_new_line_offset = (fb.max_new_line_offset() + nl_offset_px) as f32 * s;

        let mut lines: Vec<Aabb> = vec![];
        let mut line = Aabb::new();

        let mut x = 0.0f32;
        let mut y = 0.0f32;
        let mut new_line_offset = 0.0f32;

        for c in si.text.chars() {
            if c == '\n' {
                if new_line_offset == 0.0 {
                    new_line_offset = (fb.max_new_line_offset() + nl_offset_px) as f32;
                }
                x = 0.0;
                y += new_line_offset;
                lines.push(line);
                line = Aabb::new();
                new_line_offset = 0.0;
                continue;
            }

            let Some((gi, fi)) = fb.get_glyph_with_font(c) else {
                continue;
            };
            new_line_offset =
                new_line_offset.max((fi.new_line_offset + nl_offset_px) as f32);

            line.update(
                x + gi.bmp_x as f32,
                y - gi.bmp_y as f32,
                gi.bmp_w as f32,
                gi.bmp_h as f32,
            );
            x += (gi.adv >> 6) as f32;
        }
        lines.push(line);

        let mut global = Aabb::new();
        for a in &mut lines {
            if !a.is_empty() {
                a.min_x *= s;
                a.min_y *= s;
                a.max_x *= s;
                a.max_y *= s;
            }
            global.union(a);
        }

        si.lines = lines;
        si.global = global;
    }

    /// Anchor every string that has no cached layout yet. Pure in
    /// (x, y, global aabb, anchor); captions additionally stack the mark
    /// above its text block.
    fn calc_anchored_position(&mut self) {
        let mut caption_mark_anchor_y = 0.0f32;

        for si in &mut self.strs {
            if !si.lines.is_empty() {
                continue;
            }

            Self::calc_string_aabb(&self.core.fb, self.nl_offset_px, si);
            let g = &si.global;

            match si.anchor {
                TextAnchor::LeftTop => {
                    si.anchor_x = si.x as f32;
                    si.anchor_y = si.y as f32 - g.min_y.min(0.0);
                }
                TextAnchor::Center => {
                    si.anchor_x = (si.x - ((g.max_x - g.min_x) as i32) / 2) as f32;
                    si.anchor_y = si.y as f32
                        - g.min_y.min(0.0)
                        - (((g.max_y - g.min_y) as i32) / 2) as f32;
                }
                TextAnchor::LeftDown => {
                    si.anchor_x = si.x as f32;
                    si.anchor_y = si.y as f32 - (g.max_y - g.min_y);
                }
            }

            match si.ttype {
                TextType::CaptionSymbol => {
                    let mark_char = self.core.ci.mark.chars().next();
                    match mark_char.and_then(|m| self.core.fb.get_glyph(m)) {
                        Some(gi) => {
                            si.anchor_y += gi.bmp_h as f32;
                            caption_mark_anchor_y = si.anchor_y + gi.bmp_h as f32;
                        }
                        None => {
                            caption_mark_anchor_y = si.anchor_y;
                        }
                    }
                    caption_mark_anchor_y += self.core.ci.offset as f32;
                }
                TextType::CaptionText => {
                    si.anchor_y -= caption_mark_anchor_y - si.anchor_y;
                }
                TextType::Text => {}
            }
        }
    }

    /// Centered lines shift right by the difference of block and line
    /// half-widths.
    fn calc_line_align(si: &StringInfo, line_id: usize, x: &mut f32) {
        if si.align == TextAlign::Center {
            if let Some(line) = si.lines.get(line_id) {
                let block_center_x = (si.global.max_x - si.global.min_x) / 2.0;
                let line_center_x = (line.max_x - line.min_x) / 2.0;
                *x += block_center_x - line_center_x;
            }
        }
    }

    /// Advance used for every non-printable below space: the advance of
    /// ' ', then of 'a', then 10 px.
    fn calc_space_size(&mut self) -> i64 {
        if self.space_size_exist {
            return self.space_size;
        }

        if let Some(gi) = self.core.fb.get_glyph(' ') {
            self.space_size = gi.adv >> 6;
            self.space_size_exist = true;
        } else if let Some(gi) = self.core.fb.get_glyph('a') {
            self.space_size = gi.adv >> 6;
        } else {
            self.space_size = 10;
        }
        self.space_size
    }

    fn invalidate_layout(&mut self) {
        for si in &mut self.strs {
            si.lines.clear();
            si.global = Aabb::new();
        }
        self.space_size_exist = false;
    }

    /// Build quads for every stored string. Returns false when nothing
    /// changed since the last call.
    pub fn generate_geometry(&mut self) -> bool {
        if !self.core.str_changed {
            return false;
        }

        self.core.prepare_atlas();
        self.calc_anchored_position();
        let space_size = self.calc_space_size();

        self.core.backend.clear();

        for idx in 0..self.strs.len() {
            let (anchor_x, anchor_y, scale, rp, max_nl) = {
                let si = &self.strs[idx];
                (
                    si.anchor_x,
                    si.anchor_y,
                    si.render_params.scale,
                    si.render_params,
                    si.max_new_line_offset,
                )
            };

            let mut last_new_line_offset = max_nl - self.nl_offset_px as f32 * scale;
            let mut new_line_offset = 0.0f32;
            let mut line_id = 0usize;

            let mut x = anchor_x;
            let mut y = anchor_y;
            Self::calc_line_align(&self.strs[idx], line_id, &mut x);

            let chars: Vec<char> = self.strs[idx].text.chars().collect();
            for c in chars {
                if (c as u32) <= 32 {
                    if c == '\n' {
                        if new_line_offset == 0.0 {
                            new_line_offset = last_new_line_offset;
                        }
                        x = anchor_x;
                        y += new_line_offset + self.nl_offset_px as f32 * scale;
                        line_id += 1;
                        Self::calc_line_align(&self.strs[idx], line_id, &mut x);

                        last_new_line_offset = new_line_offset;
                        new_line_offset = 0.0;
                    } else {
                        x += space_size as f32 * scale;
                    }
                    continue;
                }

                let Some((gi, nlo)) = self
                    .core
                    .fb
                    .get_glyph_with_font(c)
                    .map(|(g, f)| (g.shallow(), f.new_line_offset))
                else {
                    // rasterizer refused the code point, keep the pen moving
                    x += space_size as f32 * scale;
                    continue;
                };

                new_line_offset = new_line_offset.max(nlo as f32 * scale);

                self.core.add_quad(&gi, x, y, &rp);
                x += ((gi.adv >> 6) as f32) * scale;
            }

            let group_rp = self.strs[idx].render_params;
            self.core.backend.finish_quad_group(&group_rp);
        }

        self.core.str_changed = false;
        self.core.finish_pass();
        self.core.backend.fill_geometry();
        true
    }

    pub fn render(&mut self) {
        self.generate_geometry();
        self.core.backend.render();
    }

    pub fn render_with(
        &mut self,
        pre: Option<&mut dyn FnMut(u32)>,
        post: Option<&mut dyn FnMut()>,
    ) {
        self.generate_geometry();
        self.core.backend.render_with(pre, post);
    }

    pub fn save_atlas(&self, path: &str) -> Result<(), crate::error::FontError> {
        self.core.fb.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::builder::tests::builder_with_glyphs;
    use crate::render::renderer::test_backend::SharedBackend;

    fn renderer_with(
        glyphs: &[(char, i32, i32)],
        canvas_w: i32,
        canvas_h: i32,
    ) -> (StringRenderer, SharedBackend) {
        let fb = builder_with_glyphs(glyphs);
        let shared = SharedBackend::new(canvas_w, canvas_h);
        let core = RendererCore::from_parts(fb, Box::new(shared.clone()));
        let mut sr = StringRenderer::from_core(core);
        sr.set_bidi_enabled(false);
        (sr, shared)
    }

    const ABC: &[(char, i32, i32)] = &[
        ('a', 8, 10),
        ('b', 8, 12),
        ('c', 8, 10),
        ('h', 8, 12),
        ('e', 8, 10),
        ('l', 4, 12),
        ('o', 8, 10),
        (' ', 4, 0),
    ];

    #[test]
    fn culling_rejects_strings_outside_the_canvas() {
        let (mut sr, _) = renderer_with(ABC, 100, 100);
        let rp = RenderParams::default();

        assert!(!sr.add_string("hello", 200, 50, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert_eq!(sr.get_strings_count(), 0);

        assert!(sr.add_string("hello", 20, 50, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert_eq!(sr.get_strings_count(), 1);
    }

    #[test]
    fn duplicates_are_rejected() {
        let (mut sr, _) = renderer_with(ABC, 100, 100);
        let rp = RenderParams::default();

        assert!(sr.add_string("abc", 10, 10, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert!(!sr.add_string("abc", 10, 10, &rp, TextAnchor::LeftTop, TextAlign::Left));
        // different position is a different string
        assert!(sr.add_string("abc", 10, 40, &rp, TextAnchor::LeftTop, TextAlign::Left));
        // different scale too
        assert!(sr.add_string(
            "abc",
            10,
            10,
            &RenderParams::with_scale(2.0),
            TextAnchor::LeftTop,
            TextAlign::Left
        ));
        assert_eq!(sr.get_strings_count(), 3);
    }

    #[test]
    fn deadzone_suppresses_nearby_strings_of_same_type() {
        let (mut sr, _) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();
        sr.set_string_deadzone(10);

        assert!(sr.add_string("abc", 50, 50, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert!(!sr.add_string("cba", 55, 52, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert!(sr.add_string("cba", 70, 50, &rp, TextAnchor::LeftTop, TextAlign::Left));
        assert_eq!(sr.get_strings_count(), 2);
    }

    #[test]
    fn left_top_anchor_keeps_the_ascender_visible() {
        let (mut sr, shared) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        // 'a' is 8x10 with top bearing 10: unanchored box spans y -10..0
        sr.add_string("a", 10, 10, &rp, TextAnchor::LeftTop, TextAlign::Left);
        assert!(sr.generate_geometry());

        let be = shared.0.borrow();
        assert_eq!(be.quads.len(), 1);
        let (code, x, y) = be.quads[0];
        assert_eq!(code, 'a');
        assert_eq!(x, 10.0);
        // pen moved down by the ascender height
        assert_eq!(y, 20.0);
    }

    #[test]
    fn generate_geometry_is_idempotent() {
        let (mut sr, shared) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        sr.add_string("abc", 10, 20, &rp, TextAnchor::LeftTop, TextAlign::Left);
        assert!(sr.generate_geometry());
        let first: Vec<(char, f32, f32)> = shared.0.borrow().quads.clone();

        // no intervening add/clear: nothing to do
        assert!(!sr.generate_geometry());
        assert_eq!(shared.0.borrow().quads, first);

        sr.add_string("abc", 10, 60, &rp, TextAnchor::LeftTop, TextAlign::Left);
        assert!(sr.generate_geometry());
        assert_ne!(shared.0.borrow().quads.len(), first.len());
    }

    #[test]
    fn newline_resets_x_and_advances_y() {
        let (mut sr, shared) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        sr.add_string("ab\nc", 10, 10, &rp, TextAnchor::LeftTop, TextAlign::Left);
        sr.generate_geometry();

        let be = shared.0.borrow();
        assert_eq!(be.emitted(), "abc");
        let (_, ax, ay) = be.quads[0];
        let (_, cx, cy) = be.quads[2];
        assert_eq!(cx, ax);
        // test glyphs report new_line_offset 18
        assert_eq!(cy - ay, 18.0);
    }

    #[test]
    fn spaces_advance_without_quads() {
        let (mut sr, shared) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        sr.add_string("a c", 10, 20, &rp, TextAnchor::LeftTop, TextAlign::Left);
        sr.generate_geometry();

        let be = shared.0.borrow();
        assert_eq!(be.emitted(), "ac");
        let (_, ax, _) = be.quads[0];
        let (_, cx, _) = be.quads[1];
        // advance of 'a' (8 px) plus the space advance (4 px)
        assert_eq!(cx - ax, 12.0);
    }

    #[test]
    fn bidi_input_is_stored_in_visual_order() {
        let mut glyphs: Vec<(char, i32, i32)> = ABC.to_vec();
        for c in ['\u{FEB3}', '\u{FEFC}', '\u{FEE1}'] {
            glyphs.push((c, 9, 11));
        }
        let (mut sr, shared) = renderer_with(&glyphs, 400, 200);
        sr.set_bidi_enabled(true);
        let rp = RenderParams::default();

        assert!(sr.add_string(
            "abc\u{0633}\u{0644}\u{0627}\u{0645}",
            10,
            30,
            &rp,
            TextAnchor::LeftTop,
            TextAlign::Left
        ));
        sr.generate_geometry();

        let be = shared.0.borrow();
        // ltr run first, then the arabic run reversed and shaped
        assert_eq!(
            be.emitted(),
            "abc\u{FEE1}\u{FEFC}\u{FEB3}"
        );
        assert_eq!(be.quads.len(), 6);
    }

    #[test]
    fn captions_add_mark_and_text_once() {
        let (mut sr, _) = renderer_with(&[('X', 10, 12), ('.', 3, 3)], 200, 200);
        let rp = RenderParams::default();

        assert!(sr.add_string_caption("X", 100, 100, &rp));
        assert_eq!(sr.get_strings_count(), 2);
        // the repeated caption is fully rejected: mark and text duplicate
        assert!(!sr.add_string_caption("X", 100, 100, &rp));
        assert_eq!(sr.get_strings_count(), 2);

        // last string info skips the caption mark
        assert_eq!(sr.get_last_string_info().unwrap().text, "X");
    }

    #[test]
    fn axis_down_flips_y_at_ingest() {
        let (mut sr, _) = renderer_with(ABC, 200, 100, );
        sr.set_axis_y_origin(AxisYOrigin::Down);
        let rp = RenderParams::default();

        sr.add_string("a", 10, 30, &rp, TextAnchor::LeftTop, TextAlign::Left);
        assert_eq!(sr.get_string_info(0).unwrap().y, 70);
    }

    #[test]
    fn canvas_resize_invalidates_cached_anchors_but_keeps_strings() {
        let (mut sr, _) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        sr.add_string("abc", 10, 20, &rp, TextAnchor::LeftTop, TextAlign::Left);
        sr.generate_geometry();
        assert!(!sr.get_string_info(0).unwrap().lines.is_empty());

        sr.set_canvas_size(300, 300);
        assert_eq!(sr.get_strings_count(), 1);
        assert!(sr.get_string_info(0).unwrap().lines.is_empty());
        // next pass recomputes
        assert!(sr.generate_geometry());
        assert!(!sr.get_string_info(0).unwrap().lines.is_empty());
    }

    #[test]
    fn touched_glyphs_stay_off_the_unused_list() {
        let (mut sr, _) = renderer_with(ABC, 200, 200);
        let rp = RenderParams::default();

        sr.add_string("ab", 10, 20, &rp, TextAnchor::LeftTop, TextAlign::Left);
        sr.generate_geometry();

        let unused: Vec<char> = sr.core.fb.unused().iter().map(|u| u.code).collect();
        assert!(!unused.contains(&'a'));
        assert!(!unused.contains(&'b'));
        // 'c' exists in the builder but was not drawn
        assert!(unused.contains(&'c'));
        // whitespace is exempt
        assert!(!unused.contains(&' '));
    }
}
