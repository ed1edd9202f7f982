/*!
The graphics context driven by the conformance runner.

The `Backend` trait mirrors the subset of the WebGL API the texture upload suite calls, with GL
enums as arguments so that invalid values can be passed through and rejected by the
implementation, the same way a real context would.

Errors are never returned by the individual calls: like GL, an implementation records them and
hands the first one out through `get_error`.

*/
use std::error::Error;
use std::fmt;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::gl;
use crate::gl::types::{GLenum, GLint, GLsizei, GLuint};
use crate::image_source::DecodedImage;
use crate::{sync, GlObject};

pub mod headless;

/// Handle to a texture object created by `Backend::create_texture`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub GLuint);

impl GlObject for TextureId {
    type Id = GLuint;

    #[inline]
    fn get_id(&self) -> GLuint {
        self.0
    }
}

/// Handle to a linked program returned by the quad setup functions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub GLuint);

impl GlObject for ProgramId {
    type Id = GLuint;

    #[inline]
    fn get_id(&self) -> GLuint {
        self.0
    }
}

/// Location of a uniform inside a program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    /// Program the location was queried from.
    pub program: ProgramId,
    /// Implementation-defined index.
    pub index: GLint,
}

/// Error returned when the textured quad program can't be built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramSetupError {
    /// No sampler type matches the internal format.
    UnsupportedInternalFormat(GLenum),
}

impl fmt::Display for ProgramSetupError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ProgramSetupError::UnsupportedInternalFormat(format) =>
                write!(formatter, "No textured quad program for internal format 0x{:04X}",
                       format),
        }
    }
}

impl Error for ProgramSetupError {}

/// Returns the six cube map face targets, in the order faces are uploaded and drawn.
pub const CUBE_MAP_FACES: [GLenum; 6] = [
    gl::TEXTURE_CUBE_MAP_POSITIVE_X,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
    gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

/// Returns true if `target` is one of the six cube map faces.
pub fn is_cube_map_face(target: GLenum) -> bool {
    CUBE_MAP_FACES.contains(&target)
}

/// Returns a readable name for the binding targets and errors that show up in logs.
pub fn enum_name(value: GLenum) -> String {
    match value {
        gl::TEXTURE_2D => "TEXTURE_2D".to_owned(),
        gl::TEXTURE_CUBE_MAP => "TEXTURE_CUBE_MAP".to_owned(),
        gl::NO_ERROR => "NO_ERROR".to_owned(),
        gl::INVALID_ENUM => "INVALID_ENUM".to_owned(),
        gl::INVALID_VALUE => "INVALID_VALUE".to_owned(),
        gl::INVALID_OPERATION => "INVALID_OPERATION".to_owned(),
        gl::OUT_OF_MEMORY => "OUT_OF_MEMORY".to_owned(),
        other => format!("0x{:04X}", other),
    }
}

/// A WebGL-like rendering context.
///
/// Methods take `&self`; implementations are expected to keep their state behind interior
/// mutability, since the context is owned by a single thread.
pub trait Backend {
    /// Returns the string `getParameter(VERSION)` would return, for example
    /// `"WebGL 2.0 (OpenGL ES 3.0)"`.
    fn version_string(&self) -> String;

    /// Returns the width and height of the drawing buffer.
    fn canvas_dimensions(&self) -> (u32, u32);

    /// `clearColor`.
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    /// `clearDepth`.
    fn clear_depth(&self, depth: f32);
    /// `clear`. `mask` is a combination of `COLOR_BUFFER_BIT`, `DEPTH_BUFFER_BIT` and
    /// `STENCIL_BUFFER_BIT`.
    fn clear(&self, mask: GLenum);
    /// `colorMask`.
    fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool);

    /// `createTexture`.
    fn create_texture(&self) -> TextureId;
    /// `bindTexture`. A texture keeps the target it was first bound to.
    fn bind_texture(&self, target: GLenum, texture: Option<TextureId>);
    /// `texParameteri` on the texture bound to `target`.
    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint);
    /// `pixelStorei`, for the unpack parameters.
    fn pixel_store_i(&self, pname: GLenum, param: GLint);

    /// `texImage2D(target, level, internalformat, width, height, 0, format, type, null)`.
    fn tex_image_2d_empty(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum);

    /// `texImage2D(target, level, internalformat, format, type, source)`.
    fn tex_image_2d(&self, target: GLenum, level: GLint, internal_format: GLenum,
                    format: GLenum, ty: GLenum, source: &DecodedImage);

    /// `texImage2D(target, level, internalformat, width, height, 0, format, type, source)`.
    ///
    /// WebGL 2 only. The region starts at `UNPACK_SKIP_PIXELS`, `UNPACK_SKIP_ROWS`.
    fn tex_image_2d_sized(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum,
                          source: &DecodedImage);

    /// `texSubImage2D(target, level, xoffset, yoffset, format, type, source)`.
    fn tex_sub_image_2d(&self, target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint,
                        format: GLenum, ty: GLenum, source: &DecodedImage);

    /// `texSubImage2D(target, level, xoffset, yoffset, width, height, format, type, source)`.
    ///
    /// WebGL 2 only.
    fn tex_sub_image_2d_sized(&self, target: GLenum, level: GLint, xoffset: GLint,
                              yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum,
                              ty: GLenum, source: &DecodedImage);

    /// Builds and uses a program drawing a unit quad textured with the `TEXTURE_2D` bound to
    /// unit 0. The sampler type is chosen from `internal_format`.
    fn setup_textured_quad(&self, internal_format: GLenum) -> Result<ProgramId, ProgramSetupError>;

    /// Same as `setup_textured_quad`, sampling the `TEXTURE_CUBE_MAP` face named by the `face`
    /// uniform.
    fn setup_textured_quad_with_cube_map(&self, internal_format: GLenum)
                                         -> Result<ProgramId, ProgramSetupError>;

    /// `getUniformLocation`. Returns `None` if the program has no such uniform.
    fn get_uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// `uniform1i` on the program currently in use.
    fn uniform_1i(&self, location: &UniformLocation, value: GLint);

    /// Clears the color and depth buffers to `color` and draws the unit quad with the current
    /// program.
    fn clear_and_draw_unit_quad(&self, color: [u8; 4]);

    /// Reads an RGBA8 region of the drawing buffer. `y` is counted from the bottom; rows are
    /// returned bottom first. Pixels outside the buffer read as zero.
    fn read_pixels(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<[u8; 4]>;

    /// Returns and clears the recorded error.
    fn get_error(&self) -> GLenum;

    /// Yields to the scheduler once, letting the frame settle.
    fn dispatch(&self) -> LocalBoxFuture<'_, ()> {
        sync::yield_now().boxed_local()
    }
}
