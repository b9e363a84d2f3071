// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! PixelFont builds and maintains a dynamic glyph texture atlas together with
//! the text layout pipeline that consumes it.
//!
//! Callers submit strings and numbers with screen positions. Glyphs are
//! rasterized on demand with fontdue, packed into a grayscale atlas texture
//! (tight guillotine packing or a fixed grid of bins), and evicted again once
//! they stop being used. Layout walks the submitted inputs and emits one
//! textured quad per visible glyph.
//!
//! Two backends consume the output:
//! a glow based OpenGL backend (atlas texture + VBO/VAO + shader managers)
//! and a CPU image backend that blends coverage directly into a byte canvas.
//!
//! Typical HUD usage: create a [`render::string::StringRenderer`] over a
//! backend, `add_string` every frame, call `render`.

/// error taxonomy: font load, glyph load, atlas full, backend
pub mod error;

/// font subsystem:
/// cache: process-wide font file byte cache.
/// glyph: glyph / font data model and builder settings.
/// atlas: texture atlas packer with tight and grid strategies plus eviction.
/// builder: orchestrates rasterization, packing and used/unused accounting.
pub mod font;

/// log
pub mod log;

/// Render module.
/// backend: quad sinks (opengl via glow, cpu image compositing).
/// renderer: composition of font builder, backend and caption config.
/// string: unicode string layout with bidi, anchoring, dedup and culling.
/// number: decomposed number layout with a precomputed two-digit table.
/// style: colors, render params, background settings and config enums.
pub mod render;

/// one-line bidi reorder and arabic presentation-forms shaping
pub mod unicode;

/// common tools and data structures: AABB, small helpers
pub mod util;
