// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! One-line bidi: reorder logical text into visual order so that the
//! layout pass can emit glyphs strictly left to right.
//!
//! RTL runs are arabic-shaped first and then reversed in storage, the
//! later left-to-right emission therefore produces visually correct
//! glyph order.
//!
//! https://unicode.org/reports/tr9/

use unicode_bidi::{BidiClass, BidiInfo};

pub mod shape;

/// Cheap pre-test: anything above Latin Extended-A may need the full
/// bidi pass.
/// https://en.wikipedia.org/wiki/List_of_Unicode_characters
pub fn requires_bidi(text: &str) -> bool {
    text.chars().any(|c| (c as u32) > 383)
}

/// Logical to visual reorder of the whole string, paragraph by
/// paragraph. Paragraph separators stay in their logical position.
pub fn convert_one_line(text: &str) -> String {
    if !requires_bidi(text) {
        return text.to_string();
    }

    let bidi = BidiInfo::new(text, None);
    let mut out = String::with_capacity(text.len());

    for para in &bidi.paragraphs {
        let mut end = para.range.end;
        while end > para.range.start && bidi.original_classes[end - 1] == BidiClass::B {
            end -= 1;
        }

        let (_, runs) = bidi.visual_runs(para, para.range.start..end);
        for run in runs {
            let piece = &text[run.clone()];
            if bidi.levels[run.start].is_rtl() {
                let shaped = shape::shape_arabic(piece);
                out.extend(shaped.chars().rev());
            } else {
                out.push_str(piece);
            }
        }
        out.push_str(&text[end..para.range.end]);
    }
    out
}
