/*!
A software WebGL context.

`HeadlessContext` keeps textures and the drawing buffer in memory and implements the parts of
the upload pipeline the conformance suite exercises:

 - validation of targets, enums, format combinations and sizes (up to `MAX_TEXTURE_SIZE`),
   with GL's sticky error;
 - the unpack state: flip-Y, alpha premultiplication, color-space conversion, skip pixels/rows;
 - conversion of source pixels to the pixel type's precision and the pixel format's channels;
 - nearest or linear sampling of a full-viewport quad, for 2D textures and single cube map faces;
 - color masking and read-back.

Sources carry no embedded color profile, so `BROWSER_DEFAULT_WEBGL` conversion leaves pixels
untouched.

*/
use std::cell::RefCell;

use backtrace::Backtrace;
use fnv::FnvHashMap;

use crate::backend::{self, Backend, ProgramId, ProgramSetupError, TextureId, UniformLocation};
use crate::gl;
use crate::gl::types::{GLenum, GLint, GLsizei, GLuint};
use crate::image_format::{self, InternalFormat, PixelFormat, PixelType};
use crate::image_source::DecodedImage;
use crate::version::Version;
use crate::GlObject;

/// Default drawing buffer size of a canvas element in the test pages.
pub const DEFAULT_CANVAS_SIZE: u32 = 32;

/// Largest width or height of a texture level, cube map faces included.
pub const MAX_TEXTURE_SIZE: u32 = 4096;

const UNIFORM_SAMPLER: GLint = 0;
const UNIFORM_FACE: GLint = 1;

/// One mipmap level of a texture target.
#[derive(Debug, Clone)]
struct Level {
    width: u32,
    height: u32,
    internal_format: InternalFormat,
    /// Texels row by row, row 0 at texture coordinate `t = 0`.
    texels: Vec<[f32; 4]>,
}

#[derive(Debug)]
struct TextureObject {
    /// Fixed by the first `bind_texture`.
    target: Option<GLenum>,
    min_filter: GLint,
    mag_filter: GLint,
    wrap_s: GLint,
    wrap_t: GLint,
    /// Keyed by `(face target or TEXTURE_2D, level)`.
    levels: FnvHashMap<(GLenum, GLint), Level>,
}

impl TextureObject {
    fn new() -> TextureObject {
        TextureObject {
            target: None,
            min_filter: gl::NEAREST_MIPMAP_LINEAR as GLint,
            mag_filter: gl::LINEAR as GLint,
            wrap_s: gl::REPEAT as GLint,
            wrap_t: gl::REPEAT as GLint,
            levels: FnvHashMap::default(),
        }
    }

    /// Returns level 0 of `image_target` if the texture can be sampled without mipmaps.
    ///
    /// With `npot_needs_clamp`, non-power-of-two levels also need `CLAMP_TO_EDGE` wrapping.
    fn base_level(&self, image_target: GLenum, npot_needs_clamp: bool) -> Option<&Level> {
        let needs_mipmaps = self.min_filter != gl::NEAREST as GLint &&
                            self.min_filter != gl::LINEAR as GLint;
        if needs_mipmaps {
            return None;
        }

        if self.target == Some(gl::TEXTURE_CUBE_MAP) {
            // cube completeness: six square faces of identical size and format
            let first = self.levels.get(&(backend::CUBE_MAP_FACES[0], 0))?;
            for face in backend::CUBE_MAP_FACES.iter() {
                let level = self.levels.get(&(*face, 0))?;
                if level.width != first.width || level.height != first.height ||
                   level.internal_format != first.internal_format
                {
                    return None;
                }
            }
        }

        let level = self.levels.get(&(image_target, 0))?;
        let npot = !level.width.is_power_of_two() || !level.height.is_power_of_two();
        let clamped = self.wrap_s == gl::CLAMP_TO_EDGE as GLint &&
                      self.wrap_t == gl::CLAMP_TO_EDGE as GLint;
        if npot_needs_clamp && npot && !clamped {
            return None;
        }

        Some(level)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ProgramKind {
    Texture2d,
    CubeMap,
}

#[derive(Debug, Clone)]
struct Program {
    kind: ProgramKind,
    integer_sampler: bool,
    face: GLint,
}

#[derive(Debug, Clone)]
struct UnpackState {
    flip_y: bool,
    premultiply_alpha: bool,
    colorspace_conversion: GLenum,
    skip_pixels: u32,
    skip_rows: u32,
}

impl Default for UnpackState {
    fn default() -> UnpackState {
        UnpackState {
            flip_y: false,
            premultiply_alpha: false,
            colorspace_conversion: gl::BROWSER_DEFAULT_WEBGL,
            skip_pixels: 0,
            skip_rows: 0,
        }
    }
}

struct State {
    version: Version,
    width: u32,
    height: u32,
    /// Row 0 is the bottom of the canvas.
    color_buffer: Vec<[u8; 4]>,
    clear_color: [f32; 4],
    clear_depth: f32,
    color_mask: [bool; 4],

    textures: FnvHashMap<GLuint, TextureObject>,
    next_texture: GLuint,
    texture_2d_binding: Option<GLuint>,
    texture_cube_binding: Option<GLuint>,

    programs: FnvHashMap<GLuint, Program>,
    next_program: GLuint,
    current_program: Option<GLuint>,

    unpack: UnpackState,
    error: GLenum,
}

/// Where a texture image comes from.
enum Pixels<'a> {
    /// `null`: the level is zero-filled.
    Zero,
    Source(&'a DecodedImage),
}

/// A software implementation of `Backend`.
pub struct HeadlessContext {
    state: RefCell<State>,
}

impl HeadlessContext {
    /// Builds a context with a 32x32 drawing buffer.
    pub fn new(version: Version) -> HeadlessContext {
        HeadlessContext::with_dimensions(version, DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }

    /// Builds a context with a drawing buffer of the given size.
    pub fn with_dimensions(version: Version, width: u32, height: u32) -> HeadlessContext {
        HeadlessContext {
            state: RefCell::new(State {
                version,
                width,
                height,
                color_buffer: vec![[0, 0, 0, 0]; width as usize * height as usize],
                clear_color: [0.0; 4],
                clear_depth: 1.0,
                color_mask: [true; 4],
                textures: FnvHashMap::default(),
                next_texture: 1,
                texture_2d_binding: None,
                texture_cube_binding: None,
                programs: FnvHashMap::default(),
                next_program: 1,
                current_program: None,
                unpack: UnpackState::default(),
                error: gl::NO_ERROR,
            }),
        }
    }

    /// Returns the version this context implements.
    pub fn version(&self) -> Version {
        self.state.borrow().version
    }
}

impl State {
    /// Records `error` unless an earlier one is still pending.
    fn synthesize_error(&mut self, error: GLenum, function: &str, msg: &str) {
        log::debug!("{}: {}: {}\n{:?}", function, backend::enum_name(error), msg,
                    Backtrace::new());

        if self.error == gl::NO_ERROR {
            self.error = error;
        }
    }

    fn binding_for(&self, target: GLenum) -> Option<Option<GLuint>> {
        match target {
            gl::TEXTURE_2D => Some(self.texture_2d_binding),
            gl::TEXTURE_CUBE_MAP => Some(self.texture_cube_binding),
            _ => None,
        }
    }

    /// Resolves an image target (`TEXTURE_2D` or a cube face) to the bound texture.
    fn bound_texture_for_image(&mut self, target: GLenum, function: &str) -> Option<GLuint> {
        let binding = if target == gl::TEXTURE_2D {
            self.texture_2d_binding
        } else if backend::is_cube_map_face(target) {
            self.texture_cube_binding
        } else {
            self.synthesize_error(gl::INVALID_ENUM, function, "invalid texture target");
            return None;
        };

        if binding.is_none() {
            self.synthesize_error(gl::INVALID_OPERATION, function, "no texture bound to target");
        }
        binding
    }

    fn parse_formats(&mut self, function: &str, internal: Option<GLenum>, format: GLenum,
                     ty: GLenum) -> Option<(Option<InternalFormat>, PixelFormat, PixelType)>
    {
        let internal = match internal {
            Some(value) => match InternalFormat::from_glenum(value) {
                Some(internal) => Some(internal),
                None => {
                    self.synthesize_error(gl::INVALID_VALUE, function, "invalid internalformat");
                    return None;
                },
            },
            None => None,
        };

        let format = match PixelFormat::from_glenum(format) {
            Some(format) => format,
            None => {
                self.synthesize_error(gl::INVALID_ENUM, function, "invalid format");
                return None;
            },
        };

        let ty = match PixelType::from_glenum(ty) {
            Some(ty) => ty,
            None => {
                self.synthesize_error(gl::INVALID_ENUM, function, "invalid type");
                return None;
            },
        };

        Some((internal, format, ty))
    }

    /// Returns the source region in upload order, applying flip-Y and the skip parameters.
    ///
    /// Row 0 of the result is the first row uploaded, which ends up at `t = 0`.
    fn unpack_source(&mut self, function: &str, source: &DecodedImage, width: u32, height: u32)
                     -> Option<Vec<[u8; 4]>>
    {
        let UnpackState { flip_y, skip_pixels, skip_rows, .. } = self.unpack;

        let columns_end = skip_pixels.checked_add(width);
        let rows_end = skip_rows.checked_add(height);
        let inside = columns_end.map_or(false, |end| end <= source.width()) &&
                     rows_end.map_or(false, |end| end <= source.height());
        if !inside {
            self.synthesize_error(gl::INVALID_OPERATION, function,
                                  "source sub-rectangle lies outside of the source");
            return None;
        }

        let mut out = Vec::with_capacity(width as usize * height as usize);
        for row in skip_rows .. skip_rows + height {
            let source_row = if flip_y { source.height() - 1 - row } else { row };
            for column in skip_pixels .. skip_pixels + width {
                out.push(source.pixel(column, source_row));
            }
        }
        Some(out)
    }

    fn convert_pixels(&self, pixels: &[[u8; 4]], internal: InternalFormat, format: PixelFormat,
                      ty: PixelType) -> Vec<[f32; 4]>
    {
        let premultiply = self.unpack.premultiply_alpha;
        // sources are untagged; BROWSER_DEFAULT_WEBGL maps them to themselves
        log::trace!("converting {} pixels to {}/{}/{}, conversion {}", pixels.len(), internal,
                    format, ty, backend::enum_name(self.unpack.colorspace_conversion));

        pixels.iter().map(|pixel| {
            let mut value = [0.0f32; 4];
            for (v, p) in value.iter_mut().zip(pixel.iter()) {
                *v = *p as f32 / 255.0;
            }
            if premultiply {
                let alpha = value[3];
                value[0] *= alpha;
                value[1] *= alpha;
                value[2] *= alpha;
            }

            let value = quantize(value, ty.channel_bits());
            let value = quantize(value, internal.channel_bits());
            internal.base_format().expand(format.base_format().expand(value))
        }).collect()
    }

    fn tex_image(&mut self, function: &str, target: GLenum, level: GLint, internal: GLenum,
                 size: Option<(GLsizei, GLsizei)>, format: GLenum, ty: GLenum, pixels: Pixels)
    {
        let texture = match self.bound_texture_for_image(target, function) {
            Some(t) => t,
            None => return,
        };

        let (internal, format, ty) = match self.parse_formats(function, Some(internal), format, ty) {
            Some((Some(internal), format, ty)) => (internal, format, ty),
            _ => return,
        };

        if !image_format::is_valid_combination(internal, format, ty, self.version) {
            self.synthesize_error(gl::INVALID_OPERATION, function,
                                  "invalid internalformat/format/type combination");
            return;
        }

        if level < 0 {
            self.synthesize_error(gl::INVALID_VALUE, function, "level < 0");
            return;
        }

        let (width, height) = match (size, &pixels) {
            (Some((w, h)), _) => {
                if w < 0 || h < 0 {
                    self.synthesize_error(gl::INVALID_VALUE, function, "negative size");
                    return;
                }
                (w as u32, h as u32)
            },
            (None, Pixels::Source(source)) => (source.width(), source.height()),
            (None, Pixels::Zero) => (0, 0),
        };

        if width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            self.synthesize_error(gl::INVALID_VALUE, function, "size > MAX_TEXTURE_SIZE");
            return;
        }

        if backend::is_cube_map_face(target) && width != height {
            self.synthesize_error(gl::INVALID_VALUE, function, "cube map faces must be square");
            return;
        }

        let texels = match pixels {
            Pixels::Zero => {
                let zero = internal.base_format().expand([0.0; 4]);
                vec![zero; width as usize * height as usize]
            },
            Pixels::Source(source) => {
                let region = match self.unpack_source(function, source, width, height) {
                    Some(r) => r,
                    None => return,
                };
                self.convert_pixels(&region, internal, format, ty)
            },
        };

        if let Some(texture) = self.textures.get_mut(&texture) {
            texture.levels.insert((target, level), Level {
                width,
                height,
                internal_format: internal,
                texels,
            });
        }
    }

    fn tex_sub_image(&mut self, function: &str, target: GLenum, level: GLint, xoffset: GLint,
                     yoffset: GLint, size: Option<(GLsizei, GLsizei)>, format: GLenum,
                     ty: GLenum, source: &DecodedImage)
    {
        let texture = match self.bound_texture_for_image(target, function) {
            Some(t) => t,
            None => return,
        };

        let (format, ty) = match self.parse_formats(function, None, format, ty) {
            Some((_, format, ty)) => (format, ty),
            None => return,
        };

        let existing = self.textures.get(&texture)
                                    .and_then(|t| t.levels.get(&(target, level)))
                                    .map(|l| (l.width, l.height, l.internal_format));
        let (level_width, level_height, internal) = match existing {
            Some(existing) => existing,
            None => {
                self.synthesize_error(gl::INVALID_OPERATION, function,
                                      "no image defined for this level");
                return;
            },
        };

        if !image_format::is_valid_combination(internal, format, ty, self.version) {
            self.synthesize_error(gl::INVALID_OPERATION, function,
                                  "format/type don't match the level's internalformat");
            return;
        }

        let (width, height) = match size {
            Some((w, h)) if w < 0 || h < 0 => {
                self.synthesize_error(gl::INVALID_VALUE, function, "negative size");
                return;
            },
            Some((w, h)) => (w as u32, h as u32),
            None => (source.width(), source.height()),
        };

        let fits = |offset: GLint, size: u32, limit: u32| {
            offset >= 0 && (offset as u32).checked_add(size).map_or(false, |end| end <= limit)
        };
        if !fits(xoffset, width, level_width) || !fits(yoffset, height, level_height) {
            self.synthesize_error(gl::INVALID_VALUE, function,
                                  "region lies outside of the texture level");
            return;
        }

        let region = match self.unpack_source(function, source, width, height) {
            Some(r) => r,
            None => return,
        };
        let texels = self.convert_pixels(&region, internal, format, ty);

        let level = self.textures.get_mut(&texture).and_then(|t| t.levels.get_mut(&(target, level)));
        if let Some(level) = level {
            for row in 0 .. height {
                for column in 0 .. width {
                    let dst = (yoffset as u32 + row) * level.width + xoffset as u32 + column;
                    level.texels[dst as usize] = texels[(row * width + column) as usize];
                }
            }
        }
    }

    fn clear_color_buffer(&mut self, color: [f32; 4]) {
        let color = to_unorm8(color);
        let mask = self.color_mask;
        for pixel in self.color_buffer.iter_mut() {
            write_masked(pixel, color, mask);
        }
    }

    fn sample(&self, program: &Program, s: f32, t: f32) -> [f32; 4] {
        const INCOMPLETE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

        let (binding, image_target) = match program.kind {
            ProgramKind::Texture2d => (self.texture_2d_binding, gl::TEXTURE_2D),
            ProgramKind::CubeMap => {
                let face = program.face as GLenum;
                if !backend::is_cube_map_face(face) {
                    return INCOMPLETE;
                }
                (self.texture_cube_binding, face)
            },
        };

        let texture = match binding.and_then(|id| self.textures.get(&id)) {
            Some(t) => t,
            None => return INCOMPLETE,
        };
        let level = match texture.base_level(image_target, !self.version.is_webgl2()) {
            Some(l) if l.width > 0 && l.height > 0 => l,
            _ => return INCOMPLETE,
        };

        // the quad covers the canvas, so a level no bigger than it is magnified
        let magnified = level.width <= self.width && level.height <= self.height;
        let filter = if magnified { texture.mag_filter } else { texture.min_filter };

        let texel = if filter == gl::LINEAR as GLint {
            sample_linear(level, s, t)
        } else {
            sample_nearest(level, s, t)
        };

        if level.internal_format.is_srgb() {
            [srgb_to_linear(texel[0]), srgb_to_linear(texel[1]), srgb_to_linear(texel[2]),
             texel[3]]
        } else {
            texel
        }
    }

    fn draw_unit_quad(&mut self) {
        const FUNCTION: &str = "drawArrays";

        let program = self.current_program.and_then(|p| self.programs.get(&p)).cloned();
        let program = match program {
            Some(p) => p,
            None => {
                self.synthesize_error(gl::INVALID_OPERATION, FUNCTION, "no program in use");
                return;
            },
        };

        let image_target = match program.kind {
            ProgramKind::Texture2d => gl::TEXTURE_2D,
            ProgramKind::CubeMap => program.face as GLenum,
        };
        let binding = match program.kind {
            ProgramKind::Texture2d => self.texture_2d_binding,
            ProgramKind::CubeMap => self.texture_cube_binding,
        };
        let texture_is_integer = binding
            .and_then(|id| self.textures.get(&id))
            .and_then(|texture| texture.base_level(image_target, !self.version.is_webgl2()))
            .map(|level| level.internal_format.is_integer());
        if let Some(is_integer) = texture_is_integer {
            if is_integer != program.integer_sampler {
                self.synthesize_error(gl::INVALID_OPERATION, FUNCTION,
                                      "sampler type doesn't match the texture format");
                return;
            }
        }

        let (width, height) = (self.width, self.height);
        let mask = self.color_mask;
        for y in 0 .. height {
            let t = (y as f32 + 0.5) / height as f32;
            for x in 0 .. width {
                let s = (x as f32 + 0.5) / width as f32;
                let color = to_unorm8(self.sample(&program, s, t));
                let index = (y * width + x) as usize;
                write_masked(&mut self.color_buffer[index], color, mask);
            }
        }
    }
}

fn texel_at(level: &Level, column: i64, row: i64) -> [f32; 4] {
    // CLAMP_TO_EDGE
    let column = column.clamp(0, level.width as i64 - 1) as u32;
    let row = row.clamp(0, level.height as i64 - 1) as u32;
    level.texels[(row * level.width + column) as usize]
}

fn sample_nearest(level: &Level, s: f32, t: f32) -> [f32; 4] {
    let column = (s * level.width as f32).floor() as i64;
    let row = (t * level.height as f32).floor() as i64;
    texel_at(level, column, row)
}

fn sample_linear(level: &Level, s: f32, t: f32) -> [f32; 4] {
    let u = s * level.width as f32 - 0.5;
    let v = t * level.height as f32 - 0.5;
    let (column, row) = (u.floor() as i64, v.floor() as i64);
    let (fu, fv) = (u - u.floor(), v - v.floor());

    let corners = [
        (texel_at(level, column, row), (1.0 - fu) * (1.0 - fv)),
        (texel_at(level, column + 1, row), fu * (1.0 - fv)),
        (texel_at(level, column, row + 1), (1.0 - fu) * fv),
        (texel_at(level, column + 1, row + 1), fu * fv),
    ];

    let mut out = [0.0f32; 4];
    for (texel, weight) in corners.iter() {
        for (o, c) in out.iter_mut().zip(texel.iter()) {
            *o += c * weight;
        }
    }
    out
}

/// Rounds each channel to the nearest value representable with `bits`.
fn quantize(value: [f32; 4], bits: Option<[u8; 4]>) -> [f32; 4] {
    let bits = match bits {
        Some(b) => b,
        None => return value,
    };

    let mut out = value;
    for (v, b) in out.iter_mut().zip(bits.iter()) {
        if *b == 0 {
            // channel not stored; sampling substitutes its default
            continue;
        }
        let max = ((1u32 << *b) - 1) as f32;
        *v = (*v * max).round() / max;
    }
    out
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn to_unorm8(value: [f32; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (o, v) in out.iter_mut().zip(value.iter()) {
        *o = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}

fn write_masked(pixel: &mut [u8; 4], color: [u8; 4], mask: [bool; 4]) {
    for channel in 0 .. 4 {
        if mask[channel] {
            pixel[channel] = color[channel];
        }
    }
}

impl Backend for HeadlessContext {
    fn version_string(&self) -> String {
        let version = self.state.borrow().version;
        let (major, minor) = version.gles_version();
        format!("WebGL {}.{} (OpenGL ES {}.{} headless)", version.0, version.1, major, minor)
    }

    fn canvas_dimensions(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.borrow_mut().clear_color = [red, green, blue, alpha];
    }

    fn clear_depth(&self, depth: f32) {
        self.state.borrow_mut().clear_depth = depth.clamp(0.0, 1.0);
    }

    fn clear(&self, mask: GLenum) {
        let mut state = self.state.borrow_mut();
        let known = gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT;
        if mask & !known != 0 {
            state.synthesize_error(gl::INVALID_VALUE, "clear", "unknown bits in mask");
            return;
        }

        if mask & gl::COLOR_BUFFER_BIT != 0 {
            let color = state.clear_color;
            state.clear_color_buffer(color);
        }
        // there is no depth or stencil attachment
    }

    fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.state.borrow_mut().color_mask = [red, green, blue, alpha];
    }

    fn create_texture(&self) -> TextureId {
        let mut state = self.state.borrow_mut();
        let id = state.next_texture;
        state.next_texture += 1;
        state.textures.insert(id, TextureObject::new());
        TextureId(id)
    }

    fn bind_texture(&self, target: GLenum, texture: Option<TextureId>) {
        const FUNCTION: &str = "bindTexture";
        let mut state = self.state.borrow_mut();

        if target != gl::TEXTURE_2D && target != gl::TEXTURE_CUBE_MAP {
            state.synthesize_error(gl::INVALID_ENUM, FUNCTION, "invalid target");
            return;
        }

        let id = match texture {
            Some(texture) => texture.get_id(),
            None => {
                if target == gl::TEXTURE_2D {
                    state.texture_2d_binding = None;
                } else {
                    state.texture_cube_binding = None;
                }
                return;
            },
        };

        let object_target = match state.textures.get(&id) {
            Some(object) => object.target,
            None => {
                state.synthesize_error(gl::INVALID_OPERATION, FUNCTION, "unknown texture");
                return;
            },
        };

        match object_target {
            Some(existing) if existing != target => {
                state.synthesize_error(gl::INVALID_OPERATION, FUNCTION,
                                       "texture was already bound to another target");
                return;
            },
            Some(_) => (),
            None => {
                if let Some(object) = state.textures.get_mut(&id) {
                    object.target = Some(target);
                }
            },
        }

        if target == gl::TEXTURE_2D {
            state.texture_2d_binding = Some(id);
        } else {
            state.texture_cube_binding = Some(id);
        }
    }

    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        const FUNCTION: &str = "texParameteri";
        let mut state = self.state.borrow_mut();

        let binding = match state.binding_for(target) {
            Some(Some(binding)) => binding,
            Some(None) => {
                state.synthesize_error(gl::INVALID_OPERATION, FUNCTION, "no texture bound");
                return;
            },
            None => {
                state.synthesize_error(gl::INVALID_ENUM, FUNCTION, "invalid target");
                return;
            },
        };

        let filters = [gl::NEAREST, gl::LINEAR, gl::NEAREST_MIPMAP_NEAREST,
                       gl::LINEAR_MIPMAP_NEAREST, gl::NEAREST_MIPMAP_LINEAR,
                       gl::LINEAR_MIPMAP_LINEAR];
        let valid = match pname {
            gl::TEXTURE_MIN_FILTER => filters.contains(&(param as GLenum)),
            gl::TEXTURE_MAG_FILTER => param as GLenum == gl::NEAREST ||
                                      param as GLenum == gl::LINEAR,
            gl::TEXTURE_WRAP_S | gl::TEXTURE_WRAP_T => {
                [gl::REPEAT, gl::CLAMP_TO_EDGE, gl::MIRRORED_REPEAT].contains(&(param as GLenum))
            },
            _ => {
                state.synthesize_error(gl::INVALID_ENUM, FUNCTION, "invalid pname");
                return;
            },
        };

        if !valid {
            state.synthesize_error(gl::INVALID_ENUM, FUNCTION, "invalid param");
            return;
        }

        if let Some(texture) = state.textures.get_mut(&binding) {
            match pname {
                gl::TEXTURE_MIN_FILTER => texture.min_filter = param,
                gl::TEXTURE_MAG_FILTER => texture.mag_filter = param,
                gl::TEXTURE_WRAP_S => texture.wrap_s = param,
                gl::TEXTURE_WRAP_T => texture.wrap_t = param,
                _ => (),
            }
        }
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        const FUNCTION: &str = "pixelStorei";
        let mut state = self.state.borrow_mut();
        let webgl2 = state.version.is_webgl2();

        match pname {
            gl::UNPACK_FLIP_Y_WEBGL => state.unpack.flip_y = param != 0,
            gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL => state.unpack.premultiply_alpha = param != 0,
            gl::UNPACK_COLORSPACE_CONVERSION_WEBGL => {
                let param = param as GLenum;
                if param != gl::NONE && param != gl::BROWSER_DEFAULT_WEBGL {
                    state.synthesize_error(gl::INVALID_VALUE, FUNCTION,
                                           "invalid color-space conversion");
                    return;
                }
                state.unpack.colorspace_conversion = param;
            },
            gl::UNPACK_ALIGNMENT => {
                if ![1, 2, 4, 8].contains(&param) {
                    state.synthesize_error(gl::INVALID_VALUE, FUNCTION, "invalid alignment");
                    return;
                }
            },
            gl::UNPACK_SKIP_PIXELS | gl::UNPACK_SKIP_ROWS if webgl2 => {
                if param < 0 {
                    state.synthesize_error(gl::INVALID_VALUE, FUNCTION, "negative skip");
                    return;
                }
                if pname == gl::UNPACK_SKIP_PIXELS {
                    state.unpack.skip_pixels = param as u32;
                } else {
                    state.unpack.skip_rows = param as u32;
                }
            },
            _ => state.synthesize_error(gl::INVALID_ENUM, FUNCTION, "invalid pname"),
        }
    }

    fn tex_image_2d_empty(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum)
    {
        self.state.borrow_mut().tex_image("texImage2D", target, level, internal_format,
                                          Some((width, height)), format, ty, Pixels::Zero);
    }

    fn tex_image_2d(&self, target: GLenum, level: GLint, internal_format: GLenum,
                    format: GLenum, ty: GLenum, source: &DecodedImage)
    {
        self.state.borrow_mut().tex_image("texImage2D", target, level, internal_format, None,
                                          format, ty, Pixels::Source(source));
    }

    fn tex_image_2d_sized(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum,
                          source: &DecodedImage)
    {
        let mut state = self.state.borrow_mut();
        if !state.version.is_webgl2() {
            state.synthesize_error(gl::INVALID_OPERATION, "texImage2D",
                                   "sized uploads from a source need WebGL 2");
            return;
        }
        state.tex_image("texImage2D", target, level, internal_format, Some((width, height)),
                        format, ty, Pixels::Source(source));
    }

    fn tex_sub_image_2d(&self, target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint,
                        format: GLenum, ty: GLenum, source: &DecodedImage)
    {
        self.state.borrow_mut().tex_sub_image("texSubImage2D", target, level, xoffset, yoffset,
                                              None, format, ty, source);
    }

    fn tex_sub_image_2d_sized(&self, target: GLenum, level: GLint, xoffset: GLint,
                              yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum,
                              ty: GLenum, source: &DecodedImage)
    {
        let mut state = self.state.borrow_mut();
        if !state.version.is_webgl2() {
            state.synthesize_error(gl::INVALID_OPERATION, "texSubImage2D",
                                   "sized uploads from a source need WebGL 2");
            return;
        }
        state.tex_sub_image("texSubImage2D", target, level, xoffset, yoffset,
                            Some((width, height)), format, ty, source);
    }

    fn setup_textured_quad(&self, internal_format: GLenum) -> Result<ProgramId, ProgramSetupError> {
        self.setup_program(ProgramKind::Texture2d, internal_format)
    }

    fn setup_textured_quad_with_cube_map(&self, internal_format: GLenum)
                                         -> Result<ProgramId, ProgramSetupError>
    {
        self.setup_program(ProgramKind::CubeMap, internal_format)
    }

    fn get_uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let kind = state.programs.get(&program.get_id())?.kind;
        let index = match (name, kind) {
            ("tex", _) => UNIFORM_SAMPLER,
            ("face", ProgramKind::CubeMap) => UNIFORM_FACE,
            _ => return None,
        };
        Some(UniformLocation { program, index })
    }

    fn uniform_1i(&self, location: &UniformLocation, value: GLint) {
        const FUNCTION: &str = "uniform1i";
        let mut state = self.state.borrow_mut();

        if state.current_program != Some(location.program.get_id()) {
            state.synthesize_error(gl::INVALID_OPERATION, FUNCTION,
                                   "location doesn't belong to the current program");
            return;
        }

        if location.index == UNIFORM_FACE {
            if let Some(program) = state.programs.get_mut(&location.program.get_id()) {
                program.face = value;
            }
        }
    }

    fn clear_and_draw_unit_quad(&self, color: [u8; 4]) {
        let mut state = self.state.borrow_mut();
        state.clear_color = [color[0] as f32 / 255.0, color[1] as f32 / 255.0,
                             color[2] as f32 / 255.0, color[3] as f32 / 255.0];
        let clear = state.clear_color;
        state.clear_color_buffer(clear);
        state.draw_unit_quad();
    }

    fn read_pixels(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<[u8; 4]> {
        let state = self.state.borrow();
        let mut out = Vec::with_capacity(width as usize * height as usize);
        for row in 0 .. height as i32 {
            for column in 0 .. width as i32 {
                let (px, py) = (x + column, y + row);
                let inside = px >= 0 && py >= 0 && (px as u32) < state.width &&
                             (py as u32) < state.height;
                out.push(if inside {
                    state.color_buffer[(py as u32 * state.width + px as u32) as usize]
                } else {
                    [0, 0, 0, 0]
                });
            }
        }
        out
    }

    fn get_error(&self) -> GLenum {
        let mut state = self.state.borrow_mut();
        let error = state.error;
        state.error = gl::NO_ERROR;
        error
    }
}

impl HeadlessContext {
    fn setup_program(&self, kind: ProgramKind, internal_format: GLenum)
                     -> Result<ProgramId, ProgramSetupError>
    {
        let internal = InternalFormat::from_glenum(internal_format)
            .ok_or(ProgramSetupError::UnsupportedInternalFormat(internal_format))?;

        let mut state = self.state.borrow_mut();
        let id = state.next_program;
        state.next_program += 1;
        state.programs.insert(id, Program {
            kind,
            integer_sampler: internal.is_integer(),
            face: 0,
        });
        state.current_program = Some(id);
        Ok(ProgramId(id))
    }
}
