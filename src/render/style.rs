// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Colors, per-string render params and the configuration enums shared by
//! the layout engines and the backends.

use serde::{Deserialize, Serialize};

/// RGBA, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Per-string / per-number styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub color: Color,
    /// must stay positive
    pub scale: f32,
    pub bg_color: Option<Color>,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            scale: 1.0,
            bg_color: None,
        }
    }
}

impl RenderParams {
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }
}

/// Settings of the optional background rectangle behind each quad group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    pub padding: i32,
    pub corner_radius: f32,
    pub shadow: bool,
    pub color: Option<Color>,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            padding: 0,
            corner_radius: 0.0,
            shadow: false,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    LeftTop,
    Center,
    LeftDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextType {
    Text,
    CaptionText,
    CaptionSymbol,
}

/// Where y = 0 sits on the canvas. DOWN flips incoming y coordinates to
/// canvas_h - y at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisYOrigin {
    Top,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Grayscale = 1,
    Rgb = 3,
    Rgba = 4,
}

impl ImageFormat {
    pub fn channels(&self) -> usize {
        *self as usize
    }
}

/// Canvas and atlas texture dimensions plus the screen dpi used for
/// pt-sized fonts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub canvas_w: i32,
    pub canvas_h: i32,
    pub texture_w: i32,
    pub texture_h: i32,
    pub screen_dpi: i32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas_w: 800,
            canvas_h: 600,
            texture_w: 512,
            texture_h: 512,
            screen_dpi: 0,
        }
    }
}
