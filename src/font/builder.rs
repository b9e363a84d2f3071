// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! FontBuilder owns the font fleet and the atlas packer.
//!
//! Callers feed it strings and code points; on create_font_atlas() every
//! pending code point is rasterized with fontdue into the first font of
//! the fleet that maps it, then the packer places all new glyphs. The
//! layout pass reports which glyphs it touched and everything else lands
//! on the unused list the packer evicts from.
//!
//! http://www.freetype.org/freetype2/documentation.html
//! http://en.wikibooks.org/wiki/OpenGL_Programming/Modern_OpenGL_Tutorial_Text_Rendering_01

use crate::font::atlas::TextureAtlasPack;
use crate::font::cache::FontCache;
use crate::font::glyph::{
    FontBuilderSettings, FontInfo, FontSize, GlyphInfo, UnusedGlyphInfo,
};
use log::warn;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const LETTER_BORDER_SIZE: i32 = 0;

pub struct FontBuilder {
    fonts: Vec<FontInfo>,
    packer: TextureAtlasPack,

    screen_scale: f32,
    screen_dpi: i32,

    /// codes already in some lut that were requested again
    reused: HashSet<char>,
    /// codes waiting for rasterization
    new_codes: HashSet<char>,

    unused: Vec<UnusedGlyphInfo>,
}

/// px stays px, em scales the font's own em size by the screen scale,
/// pt goes through the screen dpi.
pub(crate) fn resolve_pixel_size(
    size: FontSize,
    default_em_px: i32,
    screen_scale: f32,
    screen_dpi: i32,
) -> i32 {
    match size {
        FontSize::Px(px) => px,
        FontSize::Em(em) => (default_em_px as f32 * em * screen_scale).round() as i32,
        FontSize::Pt(pt) => (pt * screen_dpi as f32 / 72.0).round() as i32,
    }
}

impl FontBuilder {
    pub fn new(settings: &FontBuilderSettings, cache: &Arc<FontCache>) -> Self {
        let mut fb = Self {
            fonts: vec![],
            packer: TextureAtlasPack::new(
                settings.texture_w,
                settings.texture_h,
                LETTER_BORDER_SIZE,
            ),
            screen_scale: settings.screen_scale,
            screen_dpi: settings.screen_dpi,
            reused: HashSet::new(),
            new_codes: HashSet::new(),
            unused: vec![],
        };

        for f in &settings.fonts {
            let Some(bytes) = cache.get(&f.name) else {
                warn!("font builder: skipping '{}', load failed", f.name);
                continue;
            };
            let face =
                match fontdue::Font::from_bytes(&bytes[..], fontdue::FontSettings::default()) {
                    Ok(face) => face,
                    Err(e) => {
                        warn!("font builder: skipping '{}': {}", f.name, e);
                        continue;
                    }
                };

            let px = resolve_pixel_size(
                f.size,
                f.default_em_px,
                settings.screen_scale,
                settings.screen_dpi,
            )
            .max(1);
            let new_line_offset = face
                .horizontal_line_metrics(px as f32)
                .map(|m| m.new_line_size.round() as i32)
                .unwrap_or(px);

            let index = fb.fonts.len();
            fb.fonts.push(FontInfo {
                face_name: f.name.clone(),
                pixel_size: px,
                new_line_offset,
                glyphs: vec![],
                lut: HashMap::new(),
                face: Some(face),
                index,
            });
        }

        let ps = fb.max_em_size();
        fb.packer.set_grid_packing(ps, ps);
        fb
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fonts: Vec<FontInfo>, texture_w: i32, texture_h: i32) -> Self {
        let mut fb = Self {
            fonts,
            packer: TextureAtlasPack::new(texture_w, texture_h, LETTER_BORDER_SIZE),
            screen_scale: 1.0,
            screen_dpi: 0,
            reused: HashSet::new(),
            new_codes: HashSet::new(),
            unused: vec![],
        };
        let ps = fb.max_em_size();
        fb.packer.set_grid_packing(ps, ps);
        fb
    }

    pub fn fonts(&self) -> &[FontInfo] {
        &self.fonts
    }

    pub fn unused(&self) -> &[UnusedGlyphInfo] {
        &self.unused
    }

    // ------------------------------------------------------------------
    // requesting code points

    pub fn add_string(&mut self, s: &str) {
        for c in s.chars() {
            self.add_character(c);
        }
    }

    pub fn add_character(&mut self, c: char) {
        if self.fonts.iter().any(|f| f.lut.contains_key(&c)) {
            self.reused.insert(c);
        } else {
            self.new_codes.insert(c);
        }
    }

    pub fn add_all_ascii_letters(&mut self) {
        for c in ('a'..='z').chain('A'..='Z') {
            self.add_character(c);
        }
    }

    pub fn add_all_ascii_numbers(&mut self) {
        for c in '0'..='9' {
            self.add_character(c);
        }
    }

    // ------------------------------------------------------------------
    // packing

    pub fn set_tight_packing(&mut self) {
        self.requeue_all_codes();
        self.packer.set_tight_packing();
    }

    pub fn set_grid_packing(&mut self, bin_w: i32, bin_h: i32) {
        self.requeue_all_codes();
        self.packer.set_grid_packing(bin_w, bin_h);
    }

    /// Re-resolve every face to a new size. All cached glyphs are invalid
    /// after this; their codes are queued again so the next atlas build
    /// re-rasterizes them.
    pub fn set_font_size(&mut self, size: FontSize, default_em_px: i32) {
        for f in &mut self.fonts {
            let px = resolve_pixel_size(size, default_em_px, self.screen_scale, self.screen_dpi)
                .max(1);
            f.pixel_size = px;
            f.new_line_offset = f
                .face
                .as_ref()
                .and_then(|face| face.horizontal_line_metrics(px as f32))
                .map(|m| m.new_line_size.round() as i32)
                .unwrap_or(px);
            for g in &f.glyphs {
                self.new_codes.insert(g.code);
            }
            f.glyphs.clear();
            f.lut.clear();
        }
        self.unused.clear();
        let ps = self.max_em_size();
        self.packer.set_grid_packing(ps, ps);
    }

    fn requeue_all_codes(&mut self) {
        for f in &mut self.fonts {
            for g in &f.glyphs {
                self.new_codes.insert(g.code);
            }
            f.glyphs.clear();
            f.lut.clear();
        }
        self.unused.clear();
    }

    /// Rasterize every pending code point and pack the fleet. Returns true
    /// when the atlas bytes changed and the backend texture must be
    /// re-uploaded.
    pub fn create_font_atlas(&mut self) -> bool {
        let mut loaded_any = false;
        let pending: Vec<char> = self.new_codes.drain().collect();
        for c in pending {
            if self.load_glyph_info(c) {
                loaded_any = true;
            }
        }
        self.reused.clear();

        if loaded_any {
            if !self.packer.pack(&mut self.fonts, &mut self.unused) {
                warn!("font builder: atlas full, some glyphs not drawn this frame");
            }
        }
        self.packer.take_dirty()
    }

    fn load_glyph_info(&mut self, c: char) -> bool {
        for i in 0..self.fonts.len() {
            let Some(face) = &self.fonts[i].face else {
                continue;
            };
            if face.lookup_glyph_index(c) == 0 {
                continue;
            }
            let (metrics, bitmap) = face.rasterize(c, self.fonts[i].pixel_size as f32);
            let gi = GlyphInfo {
                code: c,
                bmp_w: metrics.width as i32,
                bmp_h: metrics.height as i32,
                bmp_x: metrics.xmin,
                bmp_y: metrics.ymin + metrics.height as i32,
                adv: ((metrics.advance_width * 64.0).round() as i64).max(0),
                raw_data: Some(bitmap),
                tx: 0,
                ty: 0,
                font_index: i,
            };
            self.fonts[i].insert_glyph(gi);
            return true;
        }
        warn!("font builder: no face maps U+{:04X}", c as u32);
        false
    }

    // ------------------------------------------------------------------
    // used / unused accounting

    /// Rebuild the unused list from the set of glyphs the last layout pass
    /// touched. Whitespace is exempt, it is never packed anyway.
    pub fn update_unused(&mut self, touched: &HashSet<(usize, char)>) {
        self.unused.clear();
        for f in &self.fonts {
            for g in &f.glyphs {
                if g.is_whitespace() {
                    continue;
                }
                if !touched.contains(&(f.index, g.code)) {
                    self.unused.push(UnusedGlyphInfo {
                        font_index: f.index,
                        code: g.code,
                    });
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // queries

    /// First font of the fleet that has the code rasterized.
    pub fn get_glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.get_glyph_with_font(c).map(|(g, _)| g)
    }

    pub fn get_glyph_with_font(&self, c: char) -> Option<(&GlyphInfo, &FontInfo)> {
        for f in &self.fonts {
            if let Some(g) = f.glyph(c) {
                return Some((g, f));
            }
        }
        None
    }

    pub fn max_new_line_offset(&self) -> i32 {
        self.fonts.iter().map(|f| f.new_line_offset).max().unwrap_or(0)
    }

    pub fn max_font_pixel_height(&self) -> i32 {
        self.max_em_size()
    }

    pub fn max_em_size(&self) -> i32 {
        self.fonts.iter().map(|f| f.pixel_size).max().unwrap_or(0)
    }

    pub fn texture(&self) -> &[u8] {
        self.packer.texture()
    }

    pub fn texture_width(&self) -> i32 {
        self.packer.texture_width()
    }

    pub fn texture_height(&self) -> i32 {
        self.packer.texture_height()
    }

    /// Save the current atlas as a grayscale PNG.
    pub fn save(&self, path: &str) -> Result<(), crate::error::FontError> {
        self.packer.save(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::font::glyph::tests::{test_font, test_glyph};

    pub(crate) fn builder_with_glyphs(glyphs: &[(char, i32, i32)]) -> FontBuilder {
        let mut fi = test_font(0);
        for &(c, w, h) in glyphs {
            fi.insert_glyph(test_glyph(c, w, h, 0));
        }
        FontBuilder::from_parts(vec![fi], 256, 256)
    }

    #[test]
    fn it_resolves_size_units() {
        assert_eq!(resolve_pixel_size(FontSize::Px(40), 16, 2.0, 96), 40);
        assert_eq!(resolve_pixel_size(FontSize::Em(1.5), 16, 1.0, 96), 24);
        // em respects the screen scale
        assert_eq!(resolve_pixel_size(FontSize::Em(1.5), 16, 2.0, 96), 48);
        // 12 pt at 96 dpi = 16 px
        assert_eq!(resolve_pixel_size(FontSize::Pt(12.0), 16, 1.0, 96), 16);
    }

    #[test]
    fn known_codes_are_reused_not_requeued() {
        let mut fb = builder_with_glyphs(&[('a', 8, 10)]);
        fb.add_string("ab");
        assert!(fb.reused.contains(&'a'));
        assert!(fb.new_codes.contains(&'b'));
        assert!(!fb.new_codes.contains(&'a'));
    }

    #[test]
    fn unused_is_complement_of_touched_without_whitespace() {
        let mut fb = builder_with_glyphs(&[('a', 8, 10), ('b', 8, 10), (' ', 4, 4)]);

        let mut touched = HashSet::new();
        touched.insert((0usize, 'a'));
        fb.update_unused(&touched);

        assert_eq!(fb.unused().len(), 1);
        assert_eq!(fb.unused()[0].code, 'b');
    }

    #[test]
    fn lookup_walks_fonts_in_order() {
        let mut f0 = test_font(0);
        f0.insert_glyph(test_glyph('x', 5, 5, 0));
        let mut f1 = test_font(1);
        f1.insert_glyph(test_glyph('x', 9, 9, 1));
        f1.insert_glyph(test_glyph('y', 7, 7, 1));
        let fb = FontBuilder::from_parts(vec![f0, f1], 128, 128);

        assert_eq!(fb.get_glyph('x').unwrap().bmp_w, 5);
        assert_eq!(fb.get_glyph('y').unwrap().font_index, 1);
        assert!(fb.get_glyph('z').is_none());
    }
}
