// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Render module.
//! backend: quad sinks, opengl via glow and cpu image compositing.
//! renderer: shared core composing font builder, backend and captions.
//! string: unicode string layout.
//! number: decomposed number layout.
//! style: colors, render params and the config enums.

pub mod backend;
pub mod number;
pub mod renderer;
pub mod string;
pub mod style;
