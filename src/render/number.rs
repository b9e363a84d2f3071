// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Number layout.
//!
//! Values are decomposed once at add time: sign, integer part with its
//! power-of-ten order, and the fraction digits reversed (leading zeros
//! preserved by shifting). Emission walks the integer part two digits at
//! a time through a precomputed table of the hundred double-digit glyph
//! pairs, so no string formatting happens per frame.

use crate::font::cache::FontCache;
use crate::font::glyph::{FontBuilderSettings, GlyphInfo};
use crate::render::backend::Backend;
use crate::render::renderer::RendererCore;
use crate::render::style::{
    AxisYOrigin, BackgroundSettings, RenderParams, TextAnchor, TextType,
};
use crate::util::Aabb;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

pub const NUMBERS_STRING: &str = "0123456789,.-";

#[derive(Debug, Clone, Copy)]
struct NumberInfo {
    val: f64,
    negative: bool,
    int_part_order: u64,
    int_part: u32,
    fract_part_reverse: u32,

    render_params: RenderParams,
    anchor: TextAnchor,
    ttype: TextType,

    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

/// Glyph pair of one value 0..=99 with its combined box and advance.
/// pair[0] is the ones digit, pair[1] the tens digit.
#[derive(Debug, Clone)]
struct Precomputed {
    pair: [char; 2],
    aabb: Aabb,
    x_offset: i64,
}

pub struct NumberRenderer {
    core: RendererCore,
    nmbrs: Vec<NumberInfo>,

    /// metrics of "0123456789,.-", cached at init for the layout math
    gmetrics: HashMap<char, GlyphInfo>,
    caption_mark: Option<GlyphInfo>,
    precomputed: Vec<Precomputed>,

    check_if_exist: bool,
    new_line_offset: i32,

    decimal_places: i32,
    decimal_mult: f64,
}

impl NumberRenderer {
    pub fn new(
        settings: &FontBuilderSettings,
        cache: &Arc<FontCache>,
        backend: Box<dyn Backend>,
    ) -> Self {
        let mut core = RendererCore::new(settings, cache, backend);
        let mark = core.ci.mark.clone();
        core.fb.add_string(NUMBERS_STRING);
        core.fb.add_string(&mark);
        core.prepare_atlas();
        Self::with_core(core)
    }

    #[cfg(test)]
    pub(crate) fn from_core(mut core: RendererCore) -> Self {
        core.prepare_atlas();
        Self::with_core(core)
    }

    fn with_core(mut core: RendererCore) -> Self {
        let mut gmetrics = HashMap::new();
        for c in NUMBERS_STRING.chars() {
            match core.fb.get_glyph(c) {
                Some(gi) => {
                    gmetrics.insert(c, gi.shallow());
                }
                None => warn!("number renderer: digit glyph '{}' missing", c),
            }
        }

        // fall back to '.' when the caption mark has no glyph
        let mark_char = core.ci.mark.chars().next();
        let mut caption_mark = mark_char
            .and_then(|m| core.fb.get_glyph(m))
            .map(|gi| gi.shallow());
        if caption_mark.is_none() {
            core.ci.mark = ".".to_string();
            core.ci.offset = 10;
            caption_mark = core.fb.get_glyph('.').map(|gi| gi.shallow());
        }

        let new_line_offset = core.fb.max_new_line_offset();

        let mut nr = Self {
            core,
            nmbrs: vec![],
            gmetrics,
            caption_mark,
            precomputed: vec![],
            check_if_exist: true,
            new_line_offset,
            decimal_places: 0,
            decimal_mult: 1.0,
        };
        nr.set_decimal_precision(2);
        nr.precompute();
        nr
    }

    /// The hundred double-digit pairs with their combined AABBs.
    fn precompute(&mut self) {
        self.precomputed = Vec::with_capacity(100);
        for i in 0..100u32 {
            let ones = char::from_digit(i % 10, 10).unwrap();
            let tens = if i < 10 {
                '0'
            } else {
                char::from_digit(i / 10, 10).unwrap()
            };
            let pair = [ones, tens];

            let mut aabb = Aabb::new();
            let mut x = 0i64;
            for c in pair {
                if let Some(gi) = self.gmetrics.get(&c) {
                    aabb.update(
                        x as f32 + gi.bmp_x as f32,
                        -gi.bmp_y as f32,
                        gi.bmp_w as f32,
                        gi.bmp_h as f32,
                    );
                    x += gi.adv >> 6;
                }
            }
            self.precomputed.push(Precomputed {
                pair,
                aabb,
                x_offset: x,
            });
        }
    }

    // ------------------------------------------------------------------
    // configuration

    pub fn set_existence_check(&mut self, val: bool) {
        self.check_if_exist = val;
    }

    pub fn set_decimal_precision(&mut self, digits: i32) {
        if self.decimal_places == digits {
            return;
        }
        self.decimal_places = digits;
        self.decimal_mult = 10f64.powi(digits);
    }

    pub fn get_decimal_precision(&self) -> i32 {
        self.decimal_places
    }

    pub fn set_canvas_size(&mut self, w: i32, h: i32) {
        self.core.set_canvas_size(w, h);
    }

    pub fn swap_canvas_wh(&mut self) {
        self.core.swap_canvas_wh();
    }

    pub fn set_axis_y_origin(&mut self, origin: AxisYOrigin) {
        self.core.set_axis_y_origin(origin);
    }

    pub fn set_background_settings(&mut self, bs: Option<BackgroundSettings>) {
        self.core.set_background_settings(bs);
    }

    pub fn get_numbers_count(&self) -> usize {
        self.nmbrs.len()
    }

    pub fn clear(&mut self) {
        self.core.backend.clear();
        self.core.str_changed = true;
        self.nmbrs.clear();
    }

    // ------------------------------------------------------------------
    // adding numbers

    pub fn add_number(
        &mut self,
        val: f64,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
    ) -> bool {
        self.add_float_internal(val, x, y, rp, anchor, TextType::Text)
    }

    pub fn add_number_rel(
        &mut self,
        val: f64,
        x: f32,
        y: f32,
        rp: &RenderParams,
        anchor: TextAnchor,
    ) -> bool {
        let xx = (x * self.core.canvas_w() as f32) as i32;
        let yy = (y * self.core.canvas_h() as f32) as i32;
        self.add_float_internal(val, xx, yy, rp, anchor, TextType::Text)
    }

    pub fn add_integer(
        &mut self,
        val: i64,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
    ) -> bool {
        self.add_integral_internal(val, x, y, rp, anchor, TextType::Text)
    }

    pub fn add_number_caption(&mut self, val: f64, x: i32, y: i32, rp: &RenderParams) -> bool {
        self.add_float_internal(val, x, y, rp, TextAnchor::Center, TextType::CaptionText)
    }

    pub fn add_integer_caption(&mut self, val: i64, x: i32, y: i32, rp: &RenderParams) -> bool {
        self.add_integral_internal(val, x, y, rp, TextAnchor::Center, TextType::CaptionText)
    }

    fn already_exists(&self, val: f64, x: i32, y: i32, anchor: TextAnchor, ttype: TextType) -> bool {
        self.nmbrs.iter().any(|s| {
            s.x == x && s.y == y && s.anchor == anchor && s.ttype == ttype && s.val == val
        })
    }

    fn add_integral_internal(
        &mut self,
        val: i64,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
        ttype: TextType,
    ) -> bool {
        let y = self.core.apply_axis_y(y);
        if self.check_if_exist && self.already_exists(val as f64, x, y, anchor, ttype) {
            return false;
        }

        let negative = val < 0;
        let magnitude = val.unsigned_abs().min(u32::MAX as u64) as u32;
        let n = NumberInfo {
            val: val as f64,
            negative,
            int_part: magnitude,
            int_part_order: int_divisor(magnitude),
            fract_part_reverse: 0,
            render_params: *rp,
            anchor,
            ttype,
            x: 0,
            y: 0,
            w: 0,
            h: 0,
        };
        self.add_number_internal(n, x, y)
    }

    fn add_float_internal(
        &mut self,
        val: f64,
        x: i32,
        y: i32,
        rp: &RenderParams,
        anchor: TextAnchor,
        ttype: TextType,
    ) -> bool {
        let y = self.core.apply_axis_y(y);
        if self.check_if_exist && self.already_exists(val, x, y, anchor, ttype) {
            return false;
        }

        let mut negative = val < 0.0;
        let magnitude = val.abs();
        let int_part = int_part_of(magnitude);
        let fract_part_reverse = fract_part_reversed(magnitude, int_part, self.decimal_mult);

        // -0.004 at two decimal places is plain zero
        if negative && fract_part_reverse == 0 && int_part == 0 {
            negative = false;
        }

        let n = NumberInfo {
            val,
            negative,
            int_part,
            int_part_order: int_divisor(int_part),
            fract_part_reverse,
            render_params: *rp,
            anchor,
            ttype,
            x: 0,
            y: 0,
            w: 0,
            h: 0,
        };
        self.add_number_internal(n, x, y)
    }

    fn add_number_internal(&mut self, mut n: NumberInfo, x: i32, y: i32) -> bool {
        let mut aabb = self.calc_number_aabb(
            x,
            y,
            n.negative,
            n.int_part,
            n.int_part_order,
            n.fract_part_reverse,
        );

        let w = aabb.max_x - aabb.min_x;
        let h = aabb.max_y - aabb.min_y;

        if n.anchor == TextAnchor::Center {
            let w_half = w / 2.0;
            let h_half = h / 2.0;
            aabb.min_x -= w_half;
            aabb.max_x -= w_half;
            aabb.min_y -= h_half;
            aabb.max_y -= h_half;
        }

        if aabb.max_x <= 0.0
            || aabb.max_y <= 0.0
            || aabb.min_x > self.core.canvas_w() as f32
            || aabb.min_y > self.core.canvas_h() as f32
        {
            return false;
        }

        n.x = x;
        n.y = y;
        n.w = w as i32;
        n.h = h as i32;

        self.nmbrs.push(n);
        self.core.str_changed = true;
        true
    }

    fn metric(&self, c: char) -> Option<&GlyphInfo> {
        self.gmetrics.get(&c)
    }

    fn calc_number_aabb(
        &self,
        x: i32,
        y: i32,
        negative: bool,
        int_part: u32,
        int_part_order: u64,
        fract_part_reversed: u32,
    ) -> Aabb {
        let x_offset = x as f32;
        let y_offset = y as f32;

        let mut aabb = Aabb::new();
        let mut x = 0i64;
        let mut int_part = int_part;

        let mut push = |aabb: &mut Aabb, x: &mut i64, c: char| {
            if let Some(gi) = self.metric(c) {
                aabb.update(
                    *x as f32 + gi.bmp_x as f32,
                    -gi.bmp_y as f32,
                    gi.bmp_w as f32,
                    gi.bmp_h as f32,
                );
                *x += gi.adv >> 6;
            }
        };

        if negative {
            push(&mut aabb, &mut x, '-');
        }

        if int_part <= 9 {
            push(&mut aabb, &mut x, char::from_digit(int_part, 10).unwrap());
        } else {
            let mut divisor = int_part_order;
            loop {
                divisor /= 100;
                let tmp = (int_part as u64 / divisor) as usize;
                let t = &self.precomputed[tmp];

                aabb.union_with_offset(&t.aabb, x as f32);
                x += t.x_offset;

                int_part -= (tmp as u64 * divisor) as u32;
                if divisor <= 10 {
                    break;
                }
            }
            if divisor_leaves_single_digit(int_part_order) {
                push(&mut aabb, &mut x, char::from_digit(int_part, 10).unwrap());
            }
        }

        if fract_part_reversed != 0 {
            push(&mut aabb, &mut x, '.');
            let mut fract = fract_part_reversed;
            while fract != 0 {
                let cc = fract % 10;
                push(&mut aabb, &mut x, char::from_digit(cc, 10).unwrap());
                fract /= 10;
            }
        }

        aabb.min_x += x_offset;
        aabb.min_y += y_offset;
        aabb.max_x += x_offset;
        aabb.max_y += y_offset;
        aabb
    }

    /// Anchored pen position of a number.
    fn get_anchored_position(&self, si: &NumberInfo) -> (i32, i32) {
        // LEFT_DOWN needs no correction
        let mut x = si.x;
        let mut y = si.y;

        match si.anchor {
            TextAnchor::LeftTop => {
                y = si.y + self.new_line_offset;
            }
            TextAnchor::Center => {
                x = si.x - si.w / 2;
                y = si.y + self.new_line_offset / 2;
            }
            TextAnchor::LeftDown => {}
        }

        if si.ttype == TextType::CaptionText {
            y -= si.h / 2 + self.core.ci.offset;
            if let Some(mark) = &self.caption_mark {
                y -= 2 * mark.bmp_h;
            }
        }
        (x, y)
    }

    /// Emit the quad of one character through the live glyph table and
    /// return its advance in whole pixels.
    fn emit_glyph(&mut self, c: char, x: i32, y: i32, rp: &RenderParams) -> i64 {
        let Some(gi) = self.core.fb.get_glyph(c).map(|g| g.shallow()) else {
            return self.metric(c).map_or(0, |g| g.adv >> 6);
        };
        self.core.add_quad(&gi, x as f32, y as f32, rp);
        gi.adv >> 6
    }

    /// Build quads for every stored number. Returns false when nothing
    /// changed since the last call.
    pub fn generate_geometry(&mut self) -> bool {
        if !self.core.str_changed {
            return false;
        }

        self.core.backend.clear();

        for idx in 0..self.nmbrs.len() {
            let si = self.nmbrs[idx];
            let rp = si.render_params;
            let (mut x, y) = self.get_anchored_position(&si);

            if si.ttype == TextType::CaptionText {
                if let Some(mark) = self.caption_mark.clone() {
                    let xx = si.x - mark.bmp_w / 2;
                    let yy = si.y + mark.bmp_h;
                    self.core.add_quad(&mark, xx as f32, yy as f32, &rp);
                }
            }

            if si.negative {
                x += self.emit_glyph('-', x, y, &rp) as i32;
            }

            // split the integer part into double digits
            let mut int_part = si.int_part;
            if int_part <= 9 {
                let c = char::from_digit(int_part, 10).unwrap();
                x += self.emit_glyph(c, x, y, &rp) as i32;
            } else {
                let mut divisor = si.int_part_order;
                loop {
                    divisor /= 100;
                    let tmp = (int_part as u64 / divisor) as usize;
                    let t = self.precomputed[tmp].pair;

                    // tens first, then ones
                    x += self.emit_glyph(t[1], x, y, &rp) as i32;
                    x += self.emit_glyph(t[0], x, y, &rp) as i32;

                    int_part -= (tmp as u64 * divisor) as u32;
                    if divisor <= 10 {
                        break;
                    }
                }
                if divisor_leaves_single_digit(si.int_part_order) {
                    let c = char::from_digit(int_part, 10).unwrap();
                    x += self.emit_glyph(c, x, y, &rp) as i32;
                }
            }

            let mut fract = si.fract_part_reverse;
            if fract != 0 {
                x += self.emit_glyph('.', x, y, &rp) as i32;
                while fract != 0 {
                    let c = char::from_digit(fract % 10, 10).unwrap();
                    x += self.emit_glyph(c, x, y, &rp) as i32;
                    fract /= 10;
                }
            }

            self.core.backend.finish_quad_group(&rp);
        }

        self.core.str_changed = false;
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
}

/// Integer part of a non-negative value, saturating at u32.
fn int_part_of(magnitude: f64) -> u32 {
    magnitude.min(u32::MAX as f64) as u32
}

/// Power-of-ten divisor that peels the first two digits when the integer
/// is repeatedly divided by 100.
fn int_divisor(x: u32) -> u64 {
    if x >= 10_000 {
        if x >= 10_000_000 {
            if x >= 100_000_000 {
                if x >= 1_000_000_000 {
                    return 10_000_000_000;
                }
                return 1_000_000_000;
            }
            return 100_000_000;
        }
        if x >= 100_000 {
            if x >= 1_000_000 {
                return 10_000_000;
            }
            return 1_000_000;
        }
        return 100_000;
    }
    if x >= 100 {
        if x >= 1_000 {
            return 10_000;
        }
        return 1_000;
    }
    if x >= 10 {
        return 100;
    }
    1
}

/// Orders with an odd digit count leave one digit after the double-digit
/// loop.
fn divisor_leaves_single_digit(int_part_order: u64) -> bool {
    let mut divisor = int_part_order;
    loop {
        divisor /= 100;
        if divisor <= 10 {
            break;
        }
    }
    divisor >= 10
}

/// 123 -> 321. Trailing zeros vanish, the caller re-shifts for them.
fn reverse_digits(num: u32) -> u32 {
    if num < 10 {
        return num;
    }
    let mut num = num;
    let mut rev = 0u32;
    while num > 0 {
        rev = rev * 10 + num % 10;
        num /= 10;
    }
    rev
}

/// Reversed fraction digits of a non-negative value, shifted left so
/// leading zeros survive: 0.0157 at 4 places -> 7510.
fn fract_part_reversed(val: f64, int_part: u32, decimal_mult: f64) -> u32 {
    let mut fract_part = val - int_part as f64;

    let fract_part_reverse = reverse_digits((fract_part * decimal_mult).round() as u32);
    if fract_part_reverse == 0 {
        return 0;
    }

    let mut fract_leading_zeros = 0;
    while fract_part < 1.0 {
        fract_leading_zeros += 1;
        fract_part *= 10.0;
    }
    fract_leading_zeros -= 1;

    let mut shifted = fract_part_reverse;
    while fract_leading_zeros > 0 {
        shifted *= 10;
        fract_leading_zeros -= 1;
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::builder::tests::builder_with_glyphs;
    use crate::render::renderer::test_backend::SharedBackend;

    fn renderer(canvas_w: i32, canvas_h: i32) -> (NumberRenderer, SharedBackend) {
        let glyphs: Vec<(char, i32, i32)> =
            NUMBERS_STRING.chars().map(|c| (c, 8, 10)).collect();
        let fb = builder_with_glyphs(&glyphs);
        let shared = SharedBackend::new(canvas_w, canvas_h);
        let core = RendererCore::from_parts(fb, Box::new(shared.clone()));
        (NumberRenderer::from_core(core), shared)
    }

    #[test]
    fn it_decomposes_negative_floats() {
        let (mut nr, _) = renderer(400, 300);
        assert_eq!(nr.get_decimal_precision(), 2);

        assert!(nr.add_number(
            -45.27,
            10,
            30,
            &RenderParams::default(),
            TextAnchor::LeftTop
        ));

        let n = &nr.nmbrs[0];
        assert!(n.negative);
        assert_eq!(n.int_part, 45);
        assert_eq!(n.int_part_order, 100);
        assert_eq!(n.fract_part_reverse, 72);
    }

    #[test]
    fn it_renders_sign_digits_and_fraction_in_order() {
        let (mut nr, shared) = renderer(400, 300);
        nr.add_number(-45.27, 10, 30, &RenderParams::default(), TextAnchor::LeftTop);
        assert!(nr.generate_geometry());

        assert_eq!(shared.0.borrow().emitted(), "-45.27");
    }

    #[test]
    fn large_integers_emit_double_digit_pairs() {
        let (mut nr, shared) = renderer(400, 300);
        nr.add_integer(4527, 10, 30, &RenderParams::default(), TextAnchor::LeftTop);
        nr.generate_geometry();
        assert_eq!(shared.0.borrow().emitted(), "4527");
    }

    #[test]
    fn odd_digit_counts_keep_the_trailing_digit() {
        let (mut nr, shared) = renderer(400, 300);
        nr.add_integer(456, 10, 30, &RenderParams::default(), TextAnchor::LeftTop);
        nr.generate_geometry();
        assert_eq!(shared.0.borrow().emitted(), "456");
    }

    #[test]
    fn fraction_preserves_leading_zeros() {
        let (mut nr, shared) = renderer(400, 300);
        nr.set_decimal_precision(4);
        nr.add_number(0.0157, 10, 30, &RenderParams::default(), TextAnchor::LeftTop);

        assert_eq!(nr.nmbrs[0].fract_part_reverse, 7510);
        nr.generate_geometry();
        assert_eq!(shared.0.borrow().emitted(), "0.0157");
    }

    #[test]
    fn negative_zero_collapses_to_zero() {
        let (mut nr, shared) = renderer(400, 300);
        nr.add_number(-0.001, 10, 30, &RenderParams::default(), TextAnchor::LeftTop);

        assert!(!nr.nmbrs[0].negative);
        nr.generate_geometry();
        assert_eq!(shared.0.borrow().emitted(), "0");
    }

    #[test]
    fn duplicates_are_rejected_until_disabled() {
        let (mut nr, _) = renderer(400, 300);
        let rp = RenderParams::default();

        assert!(nr.add_number(7.0, 10, 30, &rp, TextAnchor::LeftTop));
        assert!(!nr.add_number(7.0, 10, 30, &rp, TextAnchor::LeftTop));
        assert_eq!(nr.get_numbers_count(), 1);

        nr.set_existence_check(false);
        assert!(nr.add_number(7.0, 10, 30, &rp, TextAnchor::LeftTop));
        assert_eq!(nr.get_numbers_count(), 2);
    }

    #[test]
    fn numbers_outside_the_canvas_are_rejected() {
        let (mut nr, _) = renderer(100, 100);
        let rp = RenderParams::default();

        assert!(!nr.add_number(5.0, 300, 50, &rp, TextAnchor::LeftTop));
        assert!(!nr.add_number(5.0, 50, -300, &rp, TextAnchor::LeftTop));
        assert_eq!(nr.get_numbers_count(), 0);
    }

    #[test]
    fn divisor_ladder_matches_digit_counts() {
        assert_eq!(int_divisor(0), 1);
        assert_eq!(int_divisor(9), 1);
        assert_eq!(int_divisor(45), 100);
        assert_eq!(int_divisor(456), 1_000);
        assert_eq!(int_divisor(4527), 10_000);
        assert_eq!(int_divisor(1_000_000_000), 10_000_000_000);
    }

    #[test]
    fn reverse_digits_round_trips_without_trailing_zeros() {
        assert_eq!(reverse_digits(123), 321);
        assert_eq!(reverse_digits(reverse_digits(123)), 123);
        assert_eq!(reverse_digits(7), 7);
        assert_eq!(reverse_digits(10), 1);
    }

    #[test]
    fn caption_emits_the_mark_quad_first() {
        let (mut nr, shared) = renderer(400, 300);
        nr.add_number_caption(3.0, 100, 100, &RenderParams::default());
        nr.generate_geometry();

        let be = shared.0.borrow();
        // caption mark defaults to '.', drawn before the digits
        assert_eq!(be.quads[0].0, '.');
        assert_eq!(be.emitted(), ".3");
    }
}
