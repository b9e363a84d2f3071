// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! GLSL sources of the font and background shader managers. The caller
//! prepends a version line (e.g. "#version 330 core").

pub const DEFAULT_FONT_VERTEX_SHADER_SOURCE: &str = r#"
precision mediump float;
in vec2 POSITION;
in vec2 TEXCOORD0;
in vec4 COLOR;
out vec2 uv;
out vec4 colorj;
void main() {
    gl_Position = vec4(POSITION, 0.0, 1.0);
    uv = TEXCOORD0;
    colorj = COLOR;
}
"#;

pub const DEFAULT_FONT_PIXEL_SHADER_SOURCE: &str = r#"
precision mediump float;
uniform sampler2D fontTex;
in vec2 uv;
in vec4 colorj;
layout(location=0) out vec4 fragColor;
void main() {
    float coverage = texture(fontTex, uv).r;
    fragColor = vec4(colorj.rgb, colorj.a * coverage);
}
"#;

pub const SINGLE_COLOR_VERTEX_SHADER_SOURCE: &str = r#"
precision mediump float;
in vec2 POSITION;
in vec2 TEXCOORD0;
out vec2 uv;
void main() {
    gl_Position = vec4(POSITION, 0.0, 1.0);
    uv = TEXCOORD0;
}
"#;

pub const SINGLE_COLOR_PIXEL_SHADER_SOURCE: &str = r#"
precision mediump float;
uniform sampler2D fontTex;
uniform vec4 fontColor;
in vec2 uv;
layout(location=0) out vec4 fragColor;
void main() {
    fragColor = vec4(fontColor.rgb, fontColor.a * texture(fontTex, uv).r);
}
"#;

pub const BACKGROUND_VERTEX_SHADER_SOURCE: &str = r#"
precision mediump float;
in vec2 POSITION;
void main() {
    gl_Position = vec4(POSITION, 0.0, 1.0);
}
"#;

pub const BACKGROUND_PIXEL_SHADER_SOURCE: &str = r#"
precision mediump float;
uniform vec4 bgColor;
layout(location=0) out vec4 fragColor;
void main() {
    fragColor = bgColor;
}
"#;
