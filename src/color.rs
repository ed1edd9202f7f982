//! Colors the runner expects to read back.

use std::fmt;

use crate::image_format::PixelFormat;

/// An 8-bit RGB color, as sampled from the canvas.
///
/// Alpha is never compared because the runner disables alpha writes before drawing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    /// Pure red.
    pub const RED: Color = Color([255, 0, 0]);
    /// Pure green.
    pub const GREEN: Color = Color([0, 255, 0]);
    /// Black, also what formats without color channels read back.
    pub const BLACK: Color = Color([0, 0, 0]);
    /// White.
    pub const WHITE: Color = Color([255, 255, 255]);

    /// Returns the channels as a slice.
    #[inline]
    pub fn channels(&self) -> &[u8] {
        &self.0
    }

    /// Returns the color with an opaque alpha channel.
    #[inline]
    pub fn to_rgba(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], 255]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Returns the colors that the red and green regions of a source image are expected to read
/// back as once uploaded with `pixel_format`.
///
/// Formats with fewer channels drop or merge components: a red-only texture turns green into
/// black, luminance is taken from the red channel, and alpha-only textures render black since
/// alpha writes are masked.
pub fn colors_for_format(pixel_format: PixelFormat) -> (Color, Color) {
    match pixel_format {
        PixelFormat::Red | PixelFormat::RedInteger => (Color::RED, Color::BLACK),
        PixelFormat::Luminance | PixelFormat::LuminanceAlpha => (Color::WHITE, Color::BLACK),
        PixelFormat::Alpha => (Color::BLACK, Color::BLACK),
        _ => (Color::RED, Color::GREEN),
    }
}
