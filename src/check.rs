//! Assertions on the drawing buffer and on the GL error state.

use crate::backend::{self, Backend};
use crate::gl::types::GLenum;
use crate::report::Reporter;

/// Checks that every pixel of a canvas region has the expected color.
///
/// `y` is counted from the bottom of the canvas. Only the first `expected.len()` channels of
/// each pixel are compared, and a channel matches if it differs by at most `tolerance`.
/// Reports a single pass, or a single failure naming the first mismatching pixel.
pub fn check_canvas_rect<B, R>(ctx: &B, reporter: &R, x: i32, y: i32, width: u32, height: u32,
                               expected: &[u8], msg: &str, tolerance: u8) -> bool
    where B: Backend + ?Sized, R: Reporter + ?Sized
{
    let pixels = ctx.read_pixels(x, y, width, height);
    let channels = expected.len().min(4);

    for (i, pixel) in pixels.iter().enumerate() {
        let matches = pixel[.. channels].iter().zip(expected)
                                             .all(|(a, e)| a.abs_diff(*e) <= tolerance);
        if !matches {
            let px = x + (i as u32 % width) as i32;
            let py = y + (i as u32 / width) as i32;
            reporter.test_failed(&format!("{}: at ({}, {}) expected: {:?} was {:?}", msg, px, py,
                                          expected, &pixel[.. channels]));
            return false;
        }
    }

    reporter.test_passed(msg);
    true
}

/// Checks that `get_error` returns `expected`.
pub fn gl_error_should_be<B, R>(ctx: &B, reporter: &R, expected: GLenum, msg: &str) -> bool
    where B: Backend + ?Sized, R: Reporter + ?Sized
{
    let error = ctx.get_error();
    if error == expected {
        reporter.test_passed(&format!("getError was expected value: {} : {}",
                                      backend::enum_name(expected), msg));
        true
    } else {
        reporter.test_failed(&format!("getError expected: {}. Was {} : {}",
                                      backend::enum_name(expected), backend::enum_name(error),
                                      msg));
        false
    }
}
