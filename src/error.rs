// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Error taxonomy. Every kind is recovered locally: a failed font is
//! skipped, a refused glyph is substituted with the space advance, a full
//! atlas drops the quad for one frame. Nothing escapes render().

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to load font face '{0}'")]
    FontLoadFailed(String),

    #[error("rasterizer refused code point U+{0:04X}")]
    GlyphLoadFailed(u32),

    #[error("atlas full: {0} glyph(s) left unplaced")]
    AtlasFull(usize),

    #[error("backend: {0}")]
    Backend(String),
}
