/*!
Texture formats accepted by `texImage2D` when the source is an image.

A texture upload is described by three GL enums: the internal format the texture stores, the
pixel format (channel layout) of the client data and the pixel type (per-channel encoding). This
module parses them from their GL names, tells which combinations are legal for a given context
version, and describes what each one keeps of an 8-bit RGBA source.

*/
use std::error::Error;
use std::fmt;

use crate::version::Version;

gl_named_enum! {
    /// Internal storage format of a texture.
    ///
    /// The first five are the unsized formats that WebGL 1 accepts. The others are the sized
    /// formats of WebGL 2 that may be uploaded from image sources.
    #[allow(missing_docs)]
    pub enum InternalFormat {
        Rgba => RGBA,
        Rgb => RGB,
        LuminanceAlpha => LUMINANCE_ALPHA,
        Luminance => LUMINANCE,
        Alpha => ALPHA,
        R8 => R8,
        R16F => R16F,
        R32F => R32F,
        R8UI => R8UI,
        Rg8 => RG8,
        Rg16F => RG16F,
        Rg32F => RG32F,
        Rg8UI => RG8UI,
        Rgb8 => RGB8,
        Srgb8 => SRGB8,
        Rgb565 => RGB565,
        R11FG11FB10F => R11F_G11F_B10F,
        Rgb9E5 => RGB9_E5,
        Rgb16F => RGB16F,
        Rgb32F => RGB32F,
        Rgb8UI => RGB8UI,
        Rgba8 => RGBA8,
        Srgb8Alpha8 => SRGB8_ALPHA8,
        Rgb5A1 => RGB5_A1,
        Rgba4 => RGBA4,
        Rgb10A2 => RGB10_A2,
        Rgba16F => RGBA16F,
        Rgba32F => RGBA32F,
        Rgba8UI => RGBA8UI,
    }
}

gl_named_enum! {
    /// Channel layout of the client-side pixel data.
    #[allow(missing_docs)]
    pub enum PixelFormat {
        Rgba => RGBA,
        Rgb => RGB,
        Rg => RG,
        Red => RED,
        RgbaInteger => RGBA_INTEGER,
        RgbInteger => RGB_INTEGER,
        RgInteger => RG_INTEGER,
        RedInteger => RED_INTEGER,
        LuminanceAlpha => LUMINANCE_ALPHA,
        Luminance => LUMINANCE,
        Alpha => ALPHA,
    }
}

gl_named_enum! {
    /// Per-channel encoding of the client-side pixel data.
    #[allow(missing_docs)]
    pub enum PixelType {
        UnsignedByte => UNSIGNED_BYTE,
        UnsignedShort565 => UNSIGNED_SHORT_5_6_5,
        UnsignedShort4444 => UNSIGNED_SHORT_4_4_4_4,
        UnsignedShort5551 => UNSIGNED_SHORT_5_5_5_1,
        HalfFloat => HALF_FLOAT,
        Float => FLOAT,
        UnsignedInt10F11F11FRev => UNSIGNED_INT_10F_11F_11F_REV,
        UnsignedInt5999Rev => UNSIGNED_INT_5_9_9_9_REV,
        UnsignedInt2101010Rev => UNSIGNED_INT_2_10_10_10_REV,
    }
}

/// Error returned when a GL name doesn't match any known format or type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatParseError {
    /// Which enum was being parsed, for example `"PixelType"`.
    pub kind: &'static str,
    /// The rejected input.
    pub name: String,
}

impl fmt::Display for FormatParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "Unknown {} name: {:?}", self.kind, self.name)
    }
}

impl Error for FormatParseError {}

/// Components a texture keeps, and how sampling expands them to RGBA.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BaseFormat {
    /// Sampled as `(r, 0, 0, 1)`.
    Red,
    /// Sampled as `(r, g, 0, 1)`.
    Rg,
    /// Sampled as `(r, g, b, 1)`.
    Rgb,
    /// Sampled as `(r, g, b, a)`.
    Rgba,
    /// Sampled as `(l, l, l, 1)`.
    Luminance,
    /// Sampled as `(l, l, l, a)`.
    LuminanceAlpha,
    /// Sampled as `(0, 0, 0, a)`.
    Alpha,
}

impl BaseFormat {
    /// Keeps the components of `rgba` this format stores and expands them the way sampling does.
    ///
    /// Luminance is taken from the red channel, as WebGL does for DOM sources.
    pub fn expand(&self, rgba: [f32; 4]) -> [f32; 4] {
        let [r, g, b, a] = rgba;
        match *self {
            BaseFormat::Red => [r, 0.0, 0.0, 1.0],
            BaseFormat::Rg => [r, g, 0.0, 1.0],
            BaseFormat::Rgb => [r, g, b, 1.0],
            BaseFormat::Rgba => [r, g, b, a],
            BaseFormat::Luminance => [r, r, r, 1.0],
            BaseFormat::LuminanceAlpha => [r, r, r, a],
            BaseFormat::Alpha => [0.0, 0.0, 0.0, a],
        }
    }
}

impl InternalFormat {
    /// Returns true for the unsized formats, the only ones WebGL 1 knows.
    pub fn is_unsized(&self) -> bool {
        matches!(*self, InternalFormat::Rgba | InternalFormat::Rgb |
                        InternalFormat::LuminanceAlpha | InternalFormat::Luminance |
                        InternalFormat::Alpha)
    }

    /// Returns true if the texture stores unsigned integers and must be sampled with `usampler`.
    pub fn is_integer(&self) -> bool {
        matches!(*self, InternalFormat::R8UI | InternalFormat::Rg8UI | InternalFormat::Rgb8UI |
                        InternalFormat::Rgba8UI)
    }

    /// Returns true if the texture stores sRGB-encoded values that sampling linearizes.
    pub fn is_srgb(&self) -> bool {
        matches!(*self, InternalFormat::Srgb8 | InternalFormat::Srgb8Alpha8)
    }

    /// Returns the components kept by this format.
    pub fn base_format(&self) -> BaseFormat {
        match *self {
            InternalFormat::Luminance => BaseFormat::Luminance,
            InternalFormat::LuminanceAlpha => BaseFormat::LuminanceAlpha,
            InternalFormat::Alpha => BaseFormat::Alpha,
            InternalFormat::R8 | InternalFormat::R16F | InternalFormat::R32F |
            InternalFormat::R8UI => BaseFormat::Red,
            InternalFormat::Rg8 | InternalFormat::Rg16F | InternalFormat::Rg32F |
            InternalFormat::Rg8UI => BaseFormat::Rg,
            InternalFormat::Rgb | InternalFormat::Rgb8 | InternalFormat::Srgb8 |
            InternalFormat::Rgb565 | InternalFormat::R11FG11FB10F | InternalFormat::Rgb9E5 |
            InternalFormat::Rgb16F | InternalFormat::Rgb32F |
            InternalFormat::Rgb8UI => BaseFormat::Rgb,
            InternalFormat::Rgba | InternalFormat::Rgba8 | InternalFormat::Srgb8Alpha8 |
            InternalFormat::Rgb5A1 | InternalFormat::Rgba4 | InternalFormat::Rgb10A2 |
            InternalFormat::Rgba16F | InternalFormat::Rgba32F |
            InternalFormat::Rgba8UI => BaseFormat::Rgba,
        }
    }

    /// Returns the bits stored per channel, or `None` for floating-point storage.
    pub fn channel_bits(&self) -> Option<[u8; 4]> {
        match *self {
            InternalFormat::Rgb565 => Some([5, 6, 5, 0]),
            InternalFormat::Rgb5A1 => Some([5, 5, 5, 1]),
            InternalFormat::Rgba4 => Some([4, 4, 4, 4]),
            InternalFormat::Rgb10A2 => Some([10, 10, 10, 2]),
            InternalFormat::R16F | InternalFormat::R32F | InternalFormat::Rg16F |
            InternalFormat::Rg32F | InternalFormat::R11FG11FB10F | InternalFormat::Rgb9E5 |
            InternalFormat::Rgb16F | InternalFormat::Rgb32F | InternalFormat::Rgba16F |
            InternalFormat::Rgba32F => None,
            _ => Some([8, 8, 8, 8]),
        }
    }
}

impl PixelFormat {
    /// Returns the components carried by client data of this layout.
    pub fn base_format(&self) -> BaseFormat {
        match *self {
            PixelFormat::Rgba | PixelFormat::RgbaInteger => BaseFormat::Rgba,
            PixelFormat::Rgb | PixelFormat::RgbInteger => BaseFormat::Rgb,
            PixelFormat::Rg | PixelFormat::RgInteger => BaseFormat::Rg,
            PixelFormat::Red | PixelFormat::RedInteger => BaseFormat::Red,
            PixelFormat::LuminanceAlpha => BaseFormat::LuminanceAlpha,
            PixelFormat::Luminance => BaseFormat::Luminance,
            PixelFormat::Alpha => BaseFormat::Alpha,
        }
    }
}

impl PixelType {
    /// Returns the bits per channel of this encoding, or `None` for floating-point encodings.
    pub fn channel_bits(&self) -> Option<[u8; 4]> {
        match *self {
            PixelType::UnsignedByte => Some([8, 8, 8, 8]),
            PixelType::UnsignedShort565 => Some([5, 6, 5, 0]),
            PixelType::UnsignedShort4444 => Some([4, 4, 4, 4]),
            PixelType::UnsignedShort5551 => Some([5, 5, 5, 1]),
            PixelType::UnsignedInt2101010Rev => Some([10, 10, 10, 2]),
            PixelType::HalfFloat | PixelType::Float | PixelType::UnsignedInt10F11F11FRev |
            PixelType::UnsignedInt5999Rev => None,
        }
    }
}

/// The three enums of a texture upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FormatTriple {
    /// Storage format of the texture.
    pub internal_format: InternalFormat,
    /// Channel layout of the source data.
    pub pixel_format: PixelFormat,
    /// Channel encoding of the source data.
    pub pixel_type: PixelType,
}

impl FormatTriple {
    /// Builds a triple.
    pub fn new(internal_format: InternalFormat, pixel_format: PixelFormat, pixel_type: PixelType)
               -> FormatTriple
    {
        FormatTriple { internal_format, pixel_format, pixel_type }
    }

    /// Builds a triple from GL names such as `("RGBA8", "RGBA", "UNSIGNED_BYTE")`.
    pub fn from_names(internal_format: &str, pixel_format: &str, pixel_type: &str)
                      -> Result<FormatTriple, FormatParseError>
    {
        Ok(FormatTriple {
            internal_format: internal_format.parse()?,
            pixel_format: pixel_format.parse()?,
            pixel_type: pixel_type.parse()?,
        })
    }

    /// Returns true if `texImage2D` accepts this combination on a context of `version`.
    pub fn is_supported(&self, version: Version) -> bool {
        is_valid_combination(self.internal_format, self.pixel_format, self.pixel_type, version)
    }
}

impl fmt::Display for FormatTriple {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "{}/{}/{}", self.internal_format, self.pixel_format, self.pixel_type)
    }
}

/// Returns true if `(internal, format, ty)` is a legal upload combination for `version`.
///
/// WebGL 1 requires the internal format to equal the pixel format and only knows the unsized
/// formats. WebGL 2 additionally accepts the sized combinations of the OpenGL ES 3.0 table.
pub fn is_valid_combination(internal: InternalFormat, format: PixelFormat, ty: PixelType,
                            version: Version) -> bool
{
    use self::InternalFormat as I;
    use self::PixelFormat as F;
    use self::PixelType as T;

    let unsized_ok = match (internal, format, ty) {
        (I::Rgba, F::Rgba, T::UnsignedByte) => true,
        (I::Rgba, F::Rgba, T::UnsignedShort4444) => true,
        (I::Rgba, F::Rgba, T::UnsignedShort5551) => true,
        (I::Rgb, F::Rgb, T::UnsignedByte) => true,
        (I::Rgb, F::Rgb, T::UnsignedShort565) => true,
        (I::LuminanceAlpha, F::LuminanceAlpha, T::UnsignedByte) => true,
        (I::Luminance, F::Luminance, T::UnsignedByte) => true,
        (I::Alpha, F::Alpha, T::UnsignedByte) => true,
        _ => false,
    };

    if unsized_ok || !version.is_webgl2() {
        return unsized_ok;
    }

    match (internal, format) {
        (I::R8, F::Red) => ty == T::UnsignedByte,
        (I::R16F, F::Red) => matches!(ty, T::HalfFloat | T::Float),
        (I::R32F, F::Red) => ty == T::Float,
        (I::R8UI, F::RedInteger) => ty == T::UnsignedByte,
        (I::Rg8, F::Rg) => ty == T::UnsignedByte,
        (I::Rg16F, F::Rg) => matches!(ty, T::HalfFloat | T::Float),
        (I::Rg32F, F::Rg) => ty == T::Float,
        (I::Rg8UI, F::RgInteger) => ty == T::UnsignedByte,
        (I::Rgb8, F::Rgb) => ty == T::UnsignedByte,
        (I::Srgb8, F::Rgb) => ty == T::UnsignedByte,
        (I::Rgb565, F::Rgb) => matches!(ty, T::UnsignedByte | T::UnsignedShort565),
        (I::R11FG11FB10F, F::Rgb) => {
            matches!(ty, T::UnsignedInt10F11F11FRev | T::HalfFloat | T::Float)
        },
        (I::Rgb9E5, F::Rgb) => matches!(ty, T::UnsignedInt5999Rev | T::HalfFloat | T::Float),
        (I::Rgb16F, F::Rgb) => matches!(ty, T::HalfFloat | T::Float),
        (I::Rgb32F, F::Rgb) => ty == T::Float,
        (I::Rgb8UI, F::RgbInteger) => ty == T::UnsignedByte,
        (I::Rgba8, F::Rgba) => ty == T::UnsignedByte,
        (I::Srgb8Alpha8, F::Rgba) => ty == T::UnsignedByte,
        (I::Rgb5A1, F::Rgba) => {
            matches!(ty, T::UnsignedByte | T::UnsignedShort5551 | T::UnsignedInt2101010Rev)
        },
        (I::Rgba4, F::Rgba) => matches!(ty, T::UnsignedByte | T::UnsignedShort4444),
        (I::Rgb10A2, F::Rgba) => ty == T::UnsignedInt2101010Rev,
        (I::Rgba16F, F::Rgba) => matches!(ty, T::HalfFloat | T::Float),
        (I::Rgba32F, F::Rgba) => ty == T::Float,
        (I::Rgba8UI, F::RgbaInteger) => ty == T::UnsignedByte,
        _ => false,
    }
}
