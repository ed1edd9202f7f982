extern crate teximage_conformance;

use teximage_conformance::backend::Backend;
use teximage_conformance::gl;
use teximage_conformance::gl::types::GLint;
use teximage_conformance::image_source::DecodedImage;
use teximage_conformance::Version;

mod support;

fn red_over_green() -> DecodedImage {
    DecodedImage::new(2, 2, vec![[255, 0, 0, 255], [255, 0, 0, 255],
                                 [0, 255, 0, 255], [0, 255, 0, 255]])
}

fn bind_texture_2d<B: Backend>(ctx: &B) {
    let texture = ctx.create_texture();
    ctx.bind_texture(gl::TEXTURE_2D, Some(texture));
    ctx.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
    ctx.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
}

#[test]
fn version_string() {
    let ctx = support::build_context(Version::WEBGL2);
    assert_eq!(ctx.version_string(), "WebGL 2.0 (OpenGL ES 3.0 headless)");
    assert_eq!(ctx.version_string().parse::<Version>().unwrap(), Version::WEBGL2);
    assert_eq!(ctx.canvas_dimensions(), (32, 32));
}

#[test]
fn upload_without_texture() {
    let ctx = support::build_context(Version::WEBGL1);
    ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, gl::RGBA, gl::UNSIGNED_BYTE, &red_over_green());
    assert_eq!(ctx.get_error(), gl::INVALID_OPERATION);
}

#[test]
fn sub_image_needs_a_level() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    ctx.tex_sub_image_2d(gl::TEXTURE_2D, 0, 0, 0, gl::RGBA, gl::UNSIGNED_BYTE, &red_over_green());
    assert_eq!(ctx.get_error(), gl::INVALID_OPERATION);
}

#[test]
fn sub_image_out_of_bounds() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    ctx.tex_image_2d_empty(gl::TEXTURE_2D, 0, gl::RGBA, 2, 2, gl::RGBA, gl::UNSIGNED_BYTE);
    ctx.tex_sub_image_2d(gl::TEXTURE_2D, 0, 1, 0, gl::RGBA, gl::UNSIGNED_BYTE, &red_over_green());
    assert_eq!(ctx.get_error(), gl::INVALID_VALUE);
}

#[test]
fn null_upload_samples_black() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    ctx.tex_image_2d_empty(gl::TEXTURE_2D, 0, gl::RGB, 2, 2, gl::RGB, gl::UNSIGNED_BYTE);
    ctx.setup_textured_quad(gl::RGB).unwrap();
    ctx.clear_and_draw_unit_quad([255, 255, 255, 255]);

    assert_eq!(ctx.read_pixels(0, 0, 1, 1), vec![[0, 0, 0, 255]]);
    assert_eq!(ctx.get_error(), gl::NO_ERROR);
}

#[test]
fn sized_source_upload_needs_webgl2() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    ctx.tex_image_2d_sized(gl::TEXTURE_2D, 0, gl::RGBA, 1, 1, gl::RGBA, gl::UNSIGNED_BYTE,
                           &red_over_green());
    assert_eq!(ctx.get_error(), gl::INVALID_OPERATION);
}

#[test]
fn colorspace_conversion_values() {
    let ctx = support::build_context(Version::WEBGL1);
    ctx.pixel_store_i(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, gl::NONE as GLint);
    ctx.pixel_store_i(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, gl::BROWSER_DEFAULT_WEBGL as GLint);
    assert_eq!(ctx.get_error(), gl::NO_ERROR);

    ctx.pixel_store_i(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, gl::RGBA as GLint);
    assert_eq!(ctx.get_error(), gl::INVALID_VALUE);
}

#[test]
fn browser_default_conversion_keeps_colors() {
    for &conversion in &[gl::NONE, gl::BROWSER_DEFAULT_WEBGL] {
        let ctx = support::build_context(Version::WEBGL1);
        bind_texture_2d(&ctx);
        ctx.pixel_store_i(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, conversion as GLint);
        ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, gl::RGBA, gl::UNSIGNED_BYTE,
                         &red_over_green());
        ctx.setup_textured_quad(gl::RGBA).unwrap();
        ctx.clear_and_draw_unit_quad([0, 0, 0, 255]);

        assert_eq!(ctx.read_pixels(4, 4, 1, 1), vec![[255, 0, 0, 255]]);
    }
}

#[test]
fn premultiplied_upload() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    ctx.pixel_store_i(gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 1);
    let half = DecodedImage::new(1, 1, vec![[255, 255, 255, 128]]);
    ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, gl::RGBA, gl::UNSIGNED_BYTE, &half);
    ctx.setup_textured_quad(gl::RGBA).unwrap();
    ctx.clear_and_draw_unit_quad([0, 0, 0, 255]);

    assert_eq!(ctx.read_pixels(0, 0, 1, 1), vec![[128, 128, 128, 128]]);
}

#[test]
fn read_pixels_outside_canvas() {
    let ctx = support::build_context(Version::WEBGL1);
    ctx.clear_color(1.0, 1.0, 1.0, 1.0);
    ctx.clear(gl::COLOR_BUFFER_BIT);

    let pixels = ctx.read_pixels(31, 31, 2, 1);
    assert_eq!(pixels, vec![[255, 255, 255, 255], [0, 0, 0, 0]]);
}

#[test]
fn packed_types_quantize() {
    let ctx = support::build_context(Version::WEBGL1);
    bind_texture_2d(&ctx);
    let grey = DecodedImage::new(1, 1, vec![[100, 100, 100, 255]]);
    ctx.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA, gl::RGBA, gl::UNSIGNED_SHORT_4_4_4_4, &grey);
    ctx.setup_textured_quad(gl::RGBA).unwrap();
    ctx.clear_and_draw_unit_quad([0, 0, 0, 255]);

    // 100 / 255 * 15 rounds to 6, read back as 6 * 17
    assert_eq!(ctx.read_pixels(0, 0, 1, 1), vec![[102, 102, 102, 255]]);
}
