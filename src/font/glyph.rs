// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Glyph and font data model plus the builder settings structs.
//!
//! A GlyphInfo is the rasterized form of one code point at one pixel size.
//! A FontInfo owns one loaded face: its glyphs in insertion order and a
//! lut mapping code -> index. Invariant: every lut entry points at a glyph
//! whose code equals the key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rasterized representation of one code point at one pixel size.
#[derive(Debug, Clone)]
pub struct GlyphInfo {
    pub code: char,

    // bitmap size in pixels
    pub bmp_w: i32,
    pub bmp_h: i32,

    // pen-to-bitmap offsets: left bearing, top bearing
    pub bmp_x: i32,
    pub bmp_y: i32,

    /// horizontal advance in 1/64 pixel units, never negative
    pub adv: i64,

    /// 8-bit grayscale coverage, bmp_w * bmp_h bytes.
    /// None once the atlas absorbed the bytes.
    pub raw_data: Option<Vec<u8>>,

    // position inside the atlas, valid only while packed
    pub tx: i32,
    pub ty: i32,

    /// back-reference to the owning font
    pub font_index: usize,
}

impl GlyphInfo {
    /// Copy without the bitmap bytes, for handing to backends and caches.
    pub fn shallow(&self) -> GlyphInfo {
        GlyphInfo {
            raw_data: None,
            ..self.clone()
        }
    }

    pub fn is_whitespace(&self) -> bool {
        (self.code as u32) <= 32
    }
}

/// One loaded face at one pixel size.
pub struct FontInfo {
    pub face_name: String,
    pub pixel_size: i32,

    /// vertical distance between consecutive baselines, from face metrics
    pub new_line_offset: i32,

    /// insertion order preserved, packing iterates this
    pub glyphs: Vec<GlyphInfo>,
    pub lut: HashMap<char, usize>,

    /// None when the face bytes failed to parse, the font is then skipped
    pub face: Option<fontdue::Font>,
    pub index: usize,
}

impl FontInfo {
    pub fn glyph(&self, code: char) -> Option<&GlyphInfo> {
        self.lut.get(&code).map(|&i| &self.glyphs[i])
    }

    pub fn glyph_mut(&mut self, code: char) -> Option<&mut GlyphInfo> {
        match self.lut.get(&code) {
            Some(&i) => Some(&mut self.glyphs[i]),
            None => None,
        }
    }

    pub fn insert_glyph(&mut self, gi: GlyphInfo) {
        let code = gi.code;
        self.glyphs.push(gi);
        self.lut.insert(code, self.glyphs.len() - 1);
    }

    /// Drop one glyph, keeping insertion order and the lut indices in sync.
    pub fn remove_glyph(&mut self, code: char) {
        if let Some(idx) = self.lut.remove(&code) {
            self.glyphs.remove(idx);
            for v in self.lut.values_mut() {
                if *v > idx {
                    *v -= 1;
                }
            }
        }
    }
}

/// Requested size of one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FontSize {
    Px(i32),
    Em(f32),
    Pt(f32),
}

impl Default for FontSize {
    fn default() -> Self {
        FontSize::Px(12)
    }
}

/// One font of the fleet: file path, requested size and the pixel size
/// one em maps to when the size is given in em units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    pub name: String,
    pub size: FontSize,
    pub default_em_px: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontBuilderSettings {
    pub fonts: Vec<FontSettings>,
    pub texture_w: i32,
    pub texture_h: i32,
    pub screen_scale: f32,
    pub screen_dpi: i32,
}

impl Default for FontBuilderSettings {
    fn default() -> Self {
        Self {
            fonts: vec![],
            texture_w: 512,
            texture_h: 512,
            screen_scale: 1.0,
            screen_dpi: 0,
        }
    }
}

/// A glyph that was not referenced in the most recent layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnusedGlyphInfo {
    pub font_index: usize,
    pub code: char,
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn test_glyph(code: char, w: i32, h: i32, font_index: usize) -> GlyphInfo {
        GlyphInfo {
            code,
            bmp_w: w,
            bmp_h: h,
            bmp_x: 0,
            bmp_y: h,
            adv: (w as i64) << 6,
            raw_data: Some(vec![255u8; (w * h) as usize]),
            tx: 0,
            ty: 0,
            font_index,
        }
    }

    pub fn test_font(index: usize) -> FontInfo {
        FontInfo {
            face_name: format!("test{}", index),
            pixel_size: 16,
            new_line_offset: 18,
            glyphs: vec![],
            lut: HashMap::new(),
            face: None,
            index,
        }
    }

    #[test]
    fn lut_points_at_matching_codes() {
        let mut fi = test_font(0);
        for (i, c) in ['a', 'b', 'c', 'd'].into_iter().enumerate() {
            fi.insert_glyph(test_glyph(c, 4 + i as i32, 6, 0));
        }
        for (&code, &idx) in fi.lut.iter() {
            assert_eq!(fi.glyphs[idx].code, code);
        }

        fi.remove_glyph('b');
        assert_eq!(fi.glyphs.len(), 3);
        assert!(fi.glyph('b').is_none());
        for (&code, &idx) in fi.lut.iter() {
            assert_eq!(fi.glyphs[idx].code, code);
        }
        assert_eq!(fi.glyph('d').unwrap().bmp_w, 7);
    }
}
