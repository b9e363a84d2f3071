// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! OpenGL backend on glow.
//!
//! Owns the context handed over at construction, one R8 atlas texture,
//! one dynamic VBO + VAO pair per layer (font, optional background) and
//! the shader manager that serializes quads and issues draw calls.

use crate::font::glyph::GlyphInfo;
use crate::render::backend::{quad_corners, Backend, Vertex};
use crate::render::style::{BackgroundSettings, Color, RenderParams, RenderSettings};
use crate::util::Aabb;
use glow::HasContext;
use log::warn;

pub mod manager;
pub mod shader;
pub mod shader_source;

use manager::{BackgroundManager, ShaderManager};
use shader::GlShader;

/// Background layer: collects one padded rectangle per quad group.
struct GlBackground {
    bs: BackgroundSettings,
    manager: ShaderManager,
    shader: GlShader,
    vbo: glow::Buffer,
    vao: glow::VertexArray,
    geom: Vec<f32>,
    quads_count: usize,
    group_aabb: Aabb,
}

pub struct GlBackend {
    gl: glow::Context,
    ver: String,
    rs: RenderSettings,

    manager: ShaderManager,
    shader: GlShader,
    vbo: glow::Buffer,
    vao: glow::VertexArray,
    font_tex: Option<glow::Texture>,
    linear_filter: bool,

    geom: Vec<f32>,
    quads_count: usize,

    // 1.0 / canvas size, 1.0 / texture size
    ps_w: f32,
    ps_h: f32,
    t_w: f32,
    t_h: f32,

    enabled: bool,
    background: Option<GlBackground>,
}

impl GlBackend {
    /// Per-vertex colored font rendering.
    pub fn new(gl: glow::Context, ver: &str, rs: RenderSettings) -> Result<Self, String> {
        Self::with_manager(gl, ver, rs, ShaderManager::default_font())
    }

    /// Every string rendered with the one color baked into the shader.
    pub fn new_single_color(
        gl: glow::Context,
        ver: &str,
        rs: RenderSettings,
        color: Color,
    ) -> Result<Self, String> {
        Self::with_manager(gl, ver, rs, ShaderManager::single_color_font(color))
    }

    pub fn with_manager(
        gl: glow::Context,
        ver: &str,
        rs: RenderSettings,
        mut manager: ShaderManager,
    ) -> Result<Self, String> {
        let (vs, fs) = manager.sources();
        let shader = GlShader::new(&gl, ver, vs, fs)?;
        manager.lookup_locations(&gl, shader.program);

        let (vbo, vao) = unsafe {
            let vbo = gl.create_buffer()?;
            let vao = gl.create_vertex_array()?;
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            manager.bind_vertex_attribs(&gl);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            // the atlas always lands in texture unit 0
            shader.bind(&gl);
            let sampler = gl.get_uniform_location(shader.program, "fontTex");
            gl.uniform_1_i32(sampler.as_ref(), 0);
            gl.use_program(None);

            gl.enable(glow::BLEND);
            gl.blend_func_separate(
                glow::SRC_ALPHA,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            );
            (vbo, vao)
        };

        Ok(Self {
            ps_w: 1.0 / rs.canvas_w as f32,
            ps_h: 1.0 / rs.canvas_h as f32,
            t_w: 1.0 / rs.texture_w as f32,
            t_h: 1.0 / rs.texture_h as f32,
            gl,
            ver: ver.to_string(),
            rs,
            manager,
            shader,
            vbo,
            vao,
            font_tex: None,
            linear_filter: false,
            geom: vec![],
            quads_count: 0,
            enabled: true,
            background: None,
        })
    }

    pub fn set_font_texture_linear_filter(&mut self, val: bool) {
        self.linear_filter = val;
    }

    pub fn shader_program(&self) -> glow::Program {
        self.shader.program
    }

    fn on_canvas_changes(&mut self) {
        self.ps_w = 1.0 / self.rs.canvas_w as f32;
        self.ps_h = 1.0 / self.rs.canvas_h as f32;
    }
}

impl Backend for GlBackend {
    fn settings(&self) -> RenderSettings {
        self.rs
    }

    fn set_canvas_size(&mut self, w: i32, h: i32) {
        self.rs.canvas_w = w;
        self.rs.canvas_h = h;
        self.on_canvas_changes();
    }

    fn swap_canvas_wh(&mut self) {
        std::mem::swap(&mut self.rs.canvas_w, &mut self.rs.canvas_h);
        self.on_canvas_changes();
    }

    fn set_enabled(&mut self, val: bool) {
        self.enabled = val;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_background(&mut self, bs: Option<BackgroundSettings>) {
        let Some(bs) = bs else {
            self.background = None;
            return;
        };

        let radius = bs.corner_radius * self.ps_w;
        let manager = match bs.color {
            Some(c) => {
                ShaderManager::SingleColorBackground(BackgroundManager::new(c, radius))
            }
            None => ShaderManager::Background(BackgroundManager::new(Color::WHITE, radius)),
        };
        let (vs, fs) = manager.sources();
        let mut manager = manager;

        let built = (|| -> Result<GlBackground, String> {
            let shader = GlShader::new(&self.gl, &self.ver, vs, fs)?;
            manager.lookup_locations(&self.gl, shader.program);
            unsafe {
                let vbo = self.gl.create_buffer()?;
                let vao = self.gl.create_vertex_array()?;
                self.gl.bind_vertex_array(Some(vao));
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
                manager.bind_vertex_attribs(&self.gl);
                self.gl.bind_vertex_array(None);
                self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
                Ok(GlBackground {
                    bs,
                    manager,
                    shader,
                    vbo,
                    vao,
                    geom: vec![],
                    quads_count: 0,
                    group_aabb: Aabb::new(),
                })
            }
        })();

        match built {
            Ok(bg) => self.background = Some(bg),
            Err(e) => {
                warn!("gl backend: background disabled: {}", e);
                self.background = None;
            }
        }
    }

    fn clear(&mut self) {
        self.geom.clear();
        self.quads_count = 0;
        self.manager.clear();
        if let Some(bg) = &mut self.background {
            bg.geom.clear();
            bg.quads_count = 0;
            bg.group_aabb = Aabb::new();
            bg.manager.clear();
        }
    }

    fn add_quad(&mut self, gi: &GlyphInfo, x: f32, y: f32, rp: &RenderParams) {
        let (vmin, vmax) = quad_corners(
            gi, x, y, rp.scale, self.ps_w, self.ps_h, self.t_w, self.t_h,
        );
        self.manager.fill_quad_data(&vmin, &vmax, rp, &mut self.geom);
        self.quads_count += 1;

        if let Some(bg) = &mut self.background {
            bg.group_aabb.update(
                vmin.x,
                vmin.y,
                vmax.x - vmin.x,
                vmax.y - vmin.y,
            );
        }
    }

    fn finish_quad_group(&mut self, rp: &RenderParams) {
        let ps_w = self.ps_w;
        let ps_h = self.ps_h;
        let Some(bg) = &mut self.background else {
            return;
        };
        if bg.group_aabb.is_empty() {
            return;
        }

        let pad_x = bg.bs.padding as f32 * ps_w;
        let pad_y = bg.bs.padding as f32 * ps_h;
        let vmin = Vertex::new(
            bg.group_aabb.min_x - pad_x,
            bg.group_aabb.min_y - pad_y,
            0.0,
            0.0,
        );
        let vmax = Vertex::new(
            bg.group_aabb.max_x + pad_x,
            bg.group_aabb.max_y + pad_y,
            0.0,
            0.0,
        );
        bg.manager.fill_quad_data(&vmin, &vmax, rp, &mut bg.geom);
        bg.quads_count += 1;
        bg.group_aabb = Aabb::new();
    }

    fn fill_font_texture(&mut self, bytes: &[u8], w: i32, h: i32) {
        unsafe {
            let tex = match self.font_tex {
                Some(t) => t,
                None => match self.gl.create_texture() {
                    Ok(t) => {
                        self.font_tex = Some(t);
                        t
                    }
                    Err(e) => {
                        warn!("gl backend: create_texture failed: {}", e);
                        return;
                    }
                },
            };

            self.gl.bind_texture(glow::TEXTURE_2D, Some(tex));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::R8 as i32,
                w,
                h,
                0,
                glow::RED,
                glow::UNSIGNED_BYTE,
                Some(bytes),
            );

            let filter = if self.linear_filter {
                glow::LINEAR
            } else {
                glow::NEAREST
            } as i32;
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }

        self.rs.texture_w = w;
        self.rs.texture_h = h;
        self.t_w = 1.0 / w as f32;
        self.t_h = 1.0 / h as f32;
    }

    fn fill_geometry(&mut self) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                self.geom.align_to::<u8>().1,
                glow::DYNAMIC_DRAW,
            );
            if let Some(bg) = &self.background {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(bg.vbo));
                self.gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bg.geom.align_to::<u8>().1,
                    glow::DYNAMIC_DRAW,
                );
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn render_with(
        &mut self,
        pre: Option<&mut dyn FnMut(u32)>,
        post: Option<&mut dyn FnMut()>,
    ) {
        if !self.enabled {
            return;
        }

        unsafe {
            // background first, the glyphs paint over it
            if let Some(bg) = &self.background {
                if bg.quads_count > 0 {
                    bg.shader.bind(&self.gl);
                    self.gl.bind_vertex_array(Some(bg.vao));
                    bg.manager.pre_render(&self.gl);
                    bg.manager.draw(&self.gl, bg.quads_count);
                    self.gl.bind_vertex_array(None);
                }
            }

            if self.quads_count > 0 {
                self.shader.bind(&self.gl);
                if let Some(pre) = pre {
                    pre(self.shader.program.0.get());
                }

                self.gl.active_texture(glow::TEXTURE0);
                self.gl.bind_texture(glow::TEXTURE_2D, self.font_tex);
                self.gl.bind_vertex_array(Some(self.vao));

                self.manager.pre_render(&self.gl);
                self.manager.draw(&self.gl, self.quads_count);

                self.gl.bind_vertex_array(None);
                self.gl.bind_texture(glow::TEXTURE_2D, None);
            }
            self.gl.use_program(None);

            if let Some(post) = post {
                post();
            }
        }
    }
}
