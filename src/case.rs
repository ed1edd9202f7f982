/*!
Test cases of the texture upload matrix.

Each case says how the image is uploaded (full `texImage2D`, or allocation followed by
`texSubImage2D`), whether rows are flipped, which part of the source is taken, which color-space
conversion is requested, and what colors the top and bottom of the canvas must show afterwards.

*/
use std::fmt;

use crate::color::Color;
use crate::gl;
use crate::version::Version;
use crate::ToGlEnum;

/// Value of `UNPACK_COLORSPACE_CONVERSION_WEBGL` used during the upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ColorSpaceConversion {
    /// No conversion; the source's bytes are uploaded as they are.
    None,
    /// The browser may convert the source to its default color space.
    BrowserDefault,
}

impl ColorSpaceConversion {
    /// Both values, in the order the cases are expanded.
    pub const ALL: [ColorSpaceConversion; 2] =
        [ColorSpaceConversion::None, ColorSpaceConversion::BrowserDefault];

    /// Returns the WebGL name of the value.
    pub fn name(&self) -> &'static str {
        match *self {
            ColorSpaceConversion::None => "NONE",
            ColorSpaceConversion::BrowserDefault => "BROWSER_DEFAULT_WEBGL",
        }
    }
}

impl ToGlEnum for ColorSpaceConversion {
    fn to_glenum(&self) -> gl::types::GLenum {
        match *self {
            ColorSpaceConversion::None => gl::NONE,
            ColorSpaceConversion::BrowserDefault => gl::BROWSER_DEFAULT_WEBGL,
        }
    }
}

/// Region of the source image to upload, in source pixels from the top-left corner of the
/// (possibly flipped) image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubRectangle {
    /// Value given to `UNPACK_SKIP_PIXELS`.
    pub x: u32,
    /// Value given to `UNPACK_SKIP_ROWS`.
    pub y: u32,
    /// Width of the uploaded region.
    pub width: u32,
    /// Height of the uploaded region.
    pub height: u32,
}

impl SubRectangle {
    /// Builds a rectangle from `[x, y, width, height]`.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> SubRectangle {
        SubRectangle { x, y, width, height }
    }
}

impl fmt::Display for SubRectangle {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// One upload and its expected result.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Allocate the level with `null` data first, then fill it with `texSubImage2D`.
    pub sub: bool,
    /// Value of `UNPACK_FLIP_Y_WEBGL`.
    pub flip_y: bool,
    /// Color expected near the top-left corner of the canvas.
    pub top_color: Color,
    /// Color expected near the bottom-left corner of the canvas.
    pub bottom_color: Color,
    /// Part of the source to upload; `None` uploads the whole image.
    pub source_sub_rectangle: Option<SubRectangle>,
    /// Value of `UNPACK_COLORSPACE_CONVERSION_WEBGL`.
    pub color_space_conversion: ColorSpaceConversion,
}

impl TestCase {
    /// Builds a case uploading the whole image without color-space conversion.
    pub fn new(sub: bool, flip_y: bool, top_color: Color, bottom_color: Color) -> TestCase {
        TestCase {
            sub,
            flip_y,
            top_color,
            bottom_color,
            source_sub_rectangle: None,
            color_space_conversion: ColorSpaceConversion::None,
        }
    }

    /// Returns the same case, restricted to a region of the source.
    pub fn with_sub_rectangle(mut self, rect: SubRectangle) -> TestCase {
        self.source_sub_rectangle = Some(rect);
        self
    }

    /// Returns the same case, with another color-space conversion.
    pub fn with_color_space_conversion(mut self, conversion: ColorSpaceConversion) -> TestCase {
        self.color_space_conversion = conversion;
        self
    }

    /// Maximum per-channel difference accepted when checking this case.
    ///
    /// Always zero, color-space conversion included: the sources carry no color profile, so
    /// any difference is a bug.
    pub fn pixel_max_error(&self) -> u8 {
        0
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "{{\"sub\":{},\"flipY\":{},\"topColor\":[{}],\"bottomColor\":[{}]",
               self.sub, self.flip_y, self.top_color, self.bottom_color)?;
        if let Some(rect) = self.source_sub_rectangle {
            write!(formatter, ",\"sourceSubRectangle\":[{}]", rect)?;
        }
        write!(formatter, ",\"UNPACK_COLORSPACE_CONVERSION\":\"{}\"}}",
               self.color_space_conversion.name())
    }
}

/// Returns the cases to run, before color-space expansion.
///
/// The four whole-image cases always run. Contexts above version 1 also get the eight
/// single-pixel sub-rectangle cases, which rely on `UNPACK_SKIP_PIXELS` and `UNPACK_SKIP_ROWS`.
pub fn base_cases(version: Version, red: Color, green: Color) -> Vec<TestCase> {
    let mut cases = vec![
        TestCase::new(false, true, red, green),
        TestCase::new(false, false, green, red),
        TestCase::new(true, true, red, green),
        TestCase::new(true, false, green, red),
    ];

    if version.major() > 1 {
        let first_row = SubRectangle::new(0, 0, 1, 1);
        let second_row = SubRectangle::new(0, 1, 1, 1);

        for &sub in &[false, true] {
            cases.push(TestCase::new(sub, false, red, red).with_sub_rectangle(first_row));
            cases.push(TestCase::new(sub, true, green, green).with_sub_rectangle(first_row));
            cases.push(TestCase::new(sub, false, green, green).with_sub_rectangle(second_row));
            cases.push(TestCase::new(sub, true, red, red).with_sub_rectangle(second_row));
        }
    }

    cases
}

/// Returns every pair `(a, b)` combined with `combine`, iterating `b` fastest.
pub fn cross_combine<A, B, T, F>(first: &[A], second: &[B], mut combine: F) -> Vec<T>
    where F: FnMut(&A, &B) -> T
{
    let mut out = Vec::with_capacity(first.len() * second.len());
    for a in first {
        for b in second {
            out.push(combine(a, b));
        }
    }
    out
}

/// Returns the full list of cases for one image source.
pub fn generate_cases(version: Version, red: Color, green: Color) -> Vec<TestCase> {
    cross_combine(&base_cases(version, red, green), &ColorSpaceConversion::ALL,
                  |case, conversion| case.with_color_space_conversion(*conversion))
}
