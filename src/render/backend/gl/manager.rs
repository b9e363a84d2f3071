// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Shader managers as one tagged variant. Each variant knows its GLSL
//! sources, vertex layout, how to serialize one quad into the vertex
//! stream and how to issue the draw call.
//!
//! DefaultFont     pos2 + uv2 + color4 per vertex
//! SingleColorFont pos2 + uv2, color as uniform
//! Background / SingleColorBackground
//!                 pos2 only, color as uniform; with a corner radius the
//!                 quad becomes a 38 vertex triangle fan

use crate::render::backend::Vertex;
use crate::render::style::{Color, RenderParams};
use glow::HasContext;

use super::shader_source::*;

/// quarter-circle samples for the rounded-corner fan, 10 degree steps
#[rustfmt::skip]
const SINA: [f32; 45] = [
    0.0, 0.1736482, 0.3420201, 0.5, 0.6427876, 0.7660444, 0.8660254,
    0.9396926, 0.9848077, 1.0, 0.9848078, 0.9396927, 0.8660255, 0.7660446,
    0.6427878, 0.5000002, 0.3420205, 0.1736485, 3.894144e-7, -0.1736478,
    -0.3420197, -0.4999996, -0.6427872, -0.7660443, -0.8660252, -0.9396925,
    -0.9848077, -1.0, -0.9848078, -0.9396928, -0.8660257, -0.7660449,
    -0.6427881, -0.5000006, -0.3420208, -0.1736489, 0.0, 0.1736482,
    0.3420201, 0.5, 0.6427876, 0.7660444, 0.8660254, 0.9396926, 0.9848077,
];

fn cosa(i: usize) -> f32 {
    SINA[i + 9]
}

fn ndc(v: &Vertex) -> (f32, f32) {
    (2.0 * v.x - 1.0, -(2.0 * v.y - 1.0))
}

#[derive(Default)]
pub struct DefaultFontManager {
    position_loc: u32,
    tex_coord_loc: u32,
    color_loc: u32,
}

pub struct SingleColorFontManager {
    position_loc: u32,
    tex_coord_loc: u32,
    color_uniform: Option<glow::UniformLocation>,
    pub color: Color,
}

impl SingleColorFontManager {
    pub fn new(color: Color) -> Self {
        Self {
            position_loc: 0,
            tex_coord_loc: 0,
            color_uniform: None,
            color,
        }
    }
}

pub struct BackgroundManager {
    position_loc: u32,
    color_uniform: Option<glow::UniformLocation>,
    pub color: Color,
    /// radius in normalized device units, 0 disables the rounded fan
    pub corner_radius: f32,
    // per-quad draw ranges for the triangle fans
    starts: Vec<i32>,
    counts: Vec<i32>,
}

impl BackgroundManager {
    pub fn new(color: Color, corner_radius: f32) -> Self {
        Self {
            position_loc: 0,
            color_uniform: None,
            color,
            corner_radius,
            starts: vec![],
            counts: vec![],
        }
    }
}

pub enum ShaderManager {
    DefaultFont(DefaultFontManager),
    SingleColorFont(SingleColorFontManager),
    Background(BackgroundManager),
    SingleColorBackground(BackgroundManager),
}

impl ShaderManager {
    pub fn default_font() -> Self {
        ShaderManager::DefaultFont(DefaultFontManager::default())
    }

    pub fn single_color_font(color: Color) -> Self {
        ShaderManager::SingleColorFont(SingleColorFontManager::new(color))
    }

    pub fn sources(&self) -> (&'static str, &'static str) {
        match self {
            ShaderManager::DefaultFont(_) => (
                DEFAULT_FONT_VERTEX_SHADER_SOURCE,
                DEFAULT_FONT_PIXEL_SHADER_SOURCE,
            ),
            ShaderManager::SingleColorFont(_) => (
                SINGLE_COLOR_VERTEX_SHADER_SOURCE,
                SINGLE_COLOR_PIXEL_SHADER_SOURCE,
            ),
            ShaderManager::Background(_) | ShaderManager::SingleColorBackground(_) => (
                BACKGROUND_VERTEX_SHADER_SOURCE,
                BACKGROUND_PIXEL_SHADER_SOURCE,
            ),
        }
    }

    /// floats per vertex
    pub fn vertex_size(&self) -> usize {
        match self {
            ShaderManager::DefaultFont(_) => 8,
            ShaderManager::SingleColorFont(_) => 4,
            ShaderManager::Background(_) | ShaderManager::SingleColorBackground(_) => 2,
        }
    }

    pub fn quad_vertices(&self) -> usize {
        match self {
            ShaderManager::DefaultFont(_) | ShaderManager::SingleColorFont(_) => 6,
            ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                if m.corner_radius == 0.0 {
                    6
                } else {
                    38
                }
            }
        }
    }

    pub fn lookup_locations(&mut self, gl: &glow::Context, program: glow::Program) {
        unsafe {
            match self {
                ShaderManager::DefaultFont(m) => {
                    m.position_loc = gl.get_attrib_location(program, "POSITION").unwrap_or(0);
                    m.tex_coord_loc = gl.get_attrib_location(program, "TEXCOORD0").unwrap_or(0);
                    m.color_loc = gl.get_attrib_location(program, "COLOR").unwrap_or(0);
                }
                ShaderManager::SingleColorFont(m) => {
                    m.position_loc = gl.get_attrib_location(program, "POSITION").unwrap_or(0);
                    m.tex_coord_loc = gl.get_attrib_location(program, "TEXCOORD0").unwrap_or(0);
                    m.color_uniform = gl.get_uniform_location(program, "fontColor");
                }
                ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                    m.position_loc = gl.get_attrib_location(program, "POSITION").unwrap_or(0);
                    m.color_uniform = gl.get_uniform_location(program, "bgColor");
                }
            }
        }
    }

    pub fn bind_vertex_attribs(&self, gl: &glow::Context) {
        let stride = (self.vertex_size() * std::mem::size_of::<f32>()) as i32;
        unsafe {
            match self {
                ShaderManager::DefaultFont(m) => {
                    gl.enable_vertex_attrib_array(m.position_loc);
                    gl.vertex_attrib_pointer_f32(m.position_loc, 2, glow::FLOAT, false, stride, 0);
                    gl.enable_vertex_attrib_array(m.tex_coord_loc);
                    gl.vertex_attrib_pointer_f32(m.tex_coord_loc, 2, glow::FLOAT, false, stride, 8);
                    gl.enable_vertex_attrib_array(m.color_loc);
                    gl.vertex_attrib_pointer_f32(m.color_loc, 4, glow::FLOAT, false, stride, 16);
                }
                ShaderManager::SingleColorFont(m) => {
                    gl.enable_vertex_attrib_array(m.position_loc);
                    gl.vertex_attrib_pointer_f32(m.position_loc, 2, glow::FLOAT, false, stride, 0);
                    gl.enable_vertex_attrib_array(m.tex_coord_loc);
                    gl.vertex_attrib_pointer_f32(m.tex_coord_loc, 2, glow::FLOAT, false, stride, 8);
                }
                ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                    gl.enable_vertex_attrib_array(m.position_loc);
                    gl.vertex_attrib_pointer_f32(m.position_loc, 2, glow::FLOAT, false, stride, 0);
                }
            }
        }
    }

    /// Serialize one quad into the vertex stream. Vertices come in
    /// normalized canvas coordinates and leave as NDC.
    pub fn fill_quad_data(
        &mut self,
        vmin: &Vertex,
        vmax: &Vertex,
        rp: &RenderParams,
        vec: &mut Vec<f32>,
    ) {
        let (min_x, min_y) = ndc(vmin);
        let (max_x, max_y) = ndc(vmax);

        match self {
            ShaderManager::DefaultFont(_) => {
                let c = rp.color;
                for (x, y, u, v) in [
                    (min_x, min_y, vmin.u, vmin.v),
                    (max_x, min_y, vmax.u, vmin.v),
                    (min_x, max_y, vmin.u, vmax.v),
                    (max_x, min_y, vmax.u, vmin.v),
                    (max_x, max_y, vmax.u, vmax.v),
                    (min_x, max_y, vmin.u, vmax.v),
                ] {
                    vec.extend_from_slice(&[x, y, u, v, c.r, c.g, c.b, c.a]);
                }
            }
            ShaderManager::SingleColorFont(_) => {
                for (x, y, u, v) in [
                    (min_x, min_y, vmin.u, vmin.v),
                    (max_x, min_y, vmax.u, vmin.v),
                    (min_x, max_y, vmin.u, vmax.v),
                    (max_x, min_y, vmax.u, vmin.v),
                    (max_x, max_y, vmax.u, vmax.v),
                    (min_x, max_y, vmin.u, vmax.v),
                ] {
                    vec.extend_from_slice(&[x, y, u, v]);
                }
            }
            ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                let start = (vec.len() / 2) as i32;
                if m.corner_radius == 0.0 {
                    vec.extend_from_slice(&[
                        min_x, min_y, max_x, min_y, min_x, max_y, max_x, min_y, max_x, max_y,
                        min_x, max_y,
                    ]);
                } else {
                    // https://stackoverflow.com/questions/74960029/how-to-draw-a-rectangle-in-opengl-with-rounded-corners
                    let r = m.corner_radius;
                    let cx = min_x + 0.5 * (max_x - min_x);
                    let cy = min_y + 0.5 * (max_y - min_y);
                    let mut dx = (max_x - min_x).abs() - 2.0 * r;
                    let mut dy = (max_y - min_y).abs() - 2.0 * r;

                    // keep the fan from folding over when the radius is
                    // larger than the box
                    dx = dx.max(-0.05 * r);
                    dy = dy.max(-0.05 * r);

                    fill_round_corners_quad(cx, cy, dx, dy, r, vec);
                }
                m.starts.push(start);
                m.counts.push(((vec.len() / 2) as i32) - start);
            }
        }
    }

    pub fn pre_render(&self, gl: &glow::Context) {
        unsafe {
            match self {
                ShaderManager::DefaultFont(_) => {}
                ShaderManager::SingleColorFont(m) => {
                    let c = m.color;
                    gl.uniform_4_f32(m.color_uniform.as_ref(), c.r, c.g, c.b, c.a);
                }
                ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                    let c = m.color;
                    gl.uniform_4_f32(m.color_uniform.as_ref(), c.r, c.g, c.b, c.a);
                }
            }
        }
    }

    pub fn draw(&self, gl: &glow::Context, quads_count: usize) {
        unsafe {
            match self {
                ShaderManager::DefaultFont(_) | ShaderManager::SingleColorFont(_) => {
                    gl.draw_arrays(glow::TRIANGLES, 0, (quads_count * 6) as i32);
                }
                ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) => {
                    let mode = if m.corner_radius == 0.0 {
                        glow::TRIANGLES
                    } else {
                        glow::TRIANGLE_FAN
                    };
                    for (&s, &c) in m.starts.iter().zip(m.counts.iter()) {
                        gl.draw_arrays(mode, s, c);
                    }
                }
            }
        }
    }

    /// Per-frame reset of the draw range bookkeeping.
    pub fn clear(&mut self) {
        if let ShaderManager::Background(m) | ShaderManager::SingleColorBackground(m) = self {
            m.starts.clear();
            m.counts.clear();
        }
    }
}

/// Center vertex plus 36 rim samples plus the closing vertex.
fn fill_round_corners_quad(cx: f32, cy: f32, dx: f32, dy: f32, r: f32, vec: &mut Vec<f32>) {
    vec.extend_from_slice(&[cx, cy]);

    let mut x0 = cx + 0.5 * dx;
    let mut y0 = cy + 0.5 * dy;
    let mut last = (0.0, 0.0);
    for i in 0..9 {
        last = (x0 + r * cosa(i), y0 + r * SINA[i]);
        vec.extend_from_slice(&[last.0, last.1]);
    }
    x0 -= dx;
    for i in 9..18 {
        last = (x0 + r * cosa(i), y0 + r * SINA[i]);
        vec.extend_from_slice(&[last.0, last.1]);
    }
    y0 -= dy;
    for i in 18..27 {
        last = (x0 + r * cosa(i), y0 + r * SINA[i]);
        vec.extend_from_slice(&[last.0, last.1]);
    }
    x0 += dx;
    for i in 27..36 {
        last = (x0 + r * cosa(i), y0 + r * SINA[i]);
        vec.extend_from_slice(&[last.0, last.1]);
    }
    vec.extend_from_slice(&[last.0, cy + 0.5 * dy]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_font_quad_is_six_vertices_in_ndc() {
        let mut m = ShaderManager::default_font();
        let mut vec = vec![];
        let vmin = Vertex::new(0.0, 0.0, 0.1, 0.2);
        let vmax = Vertex::new(0.5, 1.0, 0.3, 0.4);
        let rp = RenderParams::default();

        m.fill_quad_data(&vmin, &vmax, &rp, &mut vec);
        assert_eq!(vec.len(), 6 * 8);
        // canvas (0,0) maps to ndc (-1,1), canvas (0.5,1) to (0,-1)
        assert_eq!((vec[0], vec[1]), (-1.0, 1.0));
        let last = &vec[5 * 8..];
        assert_eq!((last[0], last[1]), (-1.0, -1.0));
        // color rides in the last four floats
        assert_eq!(&last[4..8], &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn background_fan_records_draw_ranges() {
        let mut m = ShaderManager::SingleColorBackground(BackgroundManager::new(
            Color::WHITE,
            0.05,
        ));
        assert_eq!(m.quad_vertices(), 38);

        let mut vec = vec![];
        let rp = RenderParams::default();
        m.fill_quad_data(
            &Vertex::new(0.1, 0.1, 0.0, 0.0),
            &Vertex::new(0.4, 0.3, 0.0, 0.0),
            &rp,
            &mut vec,
        );
        m.fill_quad_data(
            &Vertex::new(0.5, 0.5, 0.0, 0.0),
            &Vertex::new(0.9, 0.8, 0.0, 0.0),
            &rp,
            &mut vec,
        );
        assert_eq!(vec.len(), 2 * 38 * 2);

        if let ShaderManager::SingleColorBackground(bm) = &m {
            assert_eq!(bm.starts, vec![0, 38]);
            assert_eq!(bm.counts, vec![38, 38]);
        } else {
            unreachable!();
        }

        m.clear();
        if let ShaderManager::SingleColorBackground(bm) = &m {
            assert!(bm.starts.is_empty());
        }
    }
}
