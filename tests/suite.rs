extern crate teximage_conformance;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use teximage_conformance::backend::headless::HeadlessContext;
use teximage_conformance::backend::{Backend, ProgramId, ProgramSetupError, TextureId,
                                    UniformLocation};
use teximage_conformance::gl::types::{GLenum, GLint, GLsizei};
use teximage_conformance::image_source::DecodedImage;
use teximage_conformance::report::{Reporter, TestResults};
use teximage_conformance::suite::{self, Harness, SuiteConfig};
use teximage_conformance::{ContextCreationError, Version};

mod support;

// per source: 2D cases plus the whole-image cases on six cube faces, two checks per draw
const WEBGL1_CHECKS: usize = 3 * (8 * 2 + 8 * 6 * 2) + 1;
const WEBGL2_CHECKS: usize = 3 * (24 * 2 + 8 * 6 * 2) + 1;

#[test]
fn rgba_unsigned_byte_webgl1() {
    let results = support::run_suite("RGBA", "RGBA", "UNSIGNED_BYTE", Version::WEBGL1);
    let summary = results.summary();

    support::assert_no_failures(&summary);
    assert_eq!(summary.passed, WEBGL1_CHECKS);
    assert!(results.is_finished());
    assert_eq!(results.description_text().unwrap(),
               "Verify texImage2D and texSubImage2D code paths taking image elements \
                (RGBA/RGBA/UNSIGNED_BYTE)");
}

#[test]
fn rgba_unsigned_byte_webgl2() {
    let results = support::run_suite("RGBA", "RGBA", "UNSIGNED_BYTE", Version::WEBGL2);
    let summary = results.summary();

    support::assert_no_failures(&summary);
    assert_eq!(summary.passed, WEBGL2_CHECKS);
}

#[test]
fn unsized_formats() {
    for &(internal, format, ty) in &[
        ("RGB", "RGB", "UNSIGNED_BYTE"),
        ("RGB", "RGB", "UNSIGNED_SHORT_5_6_5"),
        ("RGBA", "RGBA", "UNSIGNED_SHORT_4_4_4_4"),
        ("RGBA", "RGBA", "UNSIGNED_SHORT_5_5_5_1"),
        ("LUMINANCE", "LUMINANCE", "UNSIGNED_BYTE"),
        ("LUMINANCE_ALPHA", "LUMINANCE_ALPHA", "UNSIGNED_BYTE"),
        ("ALPHA", "ALPHA", "UNSIGNED_BYTE"),
    ] {
        let results = support::run_suite(internal, format, ty, Version::WEBGL1);
        let summary = results.summary();
        support::assert_no_failures(&summary);
        assert_eq!(summary.passed, WEBGL1_CHECKS, "{}/{}/{}", internal, format, ty);
    }
}

#[test]
fn sized_formats() {
    for &(internal, format, ty) in &[
        ("R8", "RED", "UNSIGNED_BYTE"),
        ("R16F", "RED", "HALF_FLOAT"),
        ("R32F", "RED", "FLOAT"),
        ("R8UI", "RED_INTEGER", "UNSIGNED_BYTE"),
        ("RG8", "RG", "UNSIGNED_BYTE"),
        ("RG8UI", "RG_INTEGER", "UNSIGNED_BYTE"),
        ("RGB8", "RGB", "UNSIGNED_BYTE"),
        ("SRGB8", "RGB", "UNSIGNED_BYTE"),
        ("RGB565", "RGB", "UNSIGNED_SHORT_5_6_5"),
        ("R11F_G11F_B10F", "RGB", "UNSIGNED_INT_10F_11F_11F_REV"),
        ("RGB9_E5", "RGB", "HALF_FLOAT"),
        ("RGB8UI", "RGB_INTEGER", "UNSIGNED_BYTE"),
        ("RGBA8", "RGBA", "UNSIGNED_BYTE"),
        ("SRGB8_ALPHA8", "RGBA", "UNSIGNED_BYTE"),
        ("RGB5_A1", "RGBA", "UNSIGNED_SHORT_5_5_5_1"),
        ("RGBA4", "RGBA", "UNSIGNED_SHORT_4_4_4_4"),
        ("RGB10_A2", "RGBA", "UNSIGNED_INT_2_10_10_10_REV"),
        ("RGBA16F", "RGBA", "FLOAT"),
        ("RGBA8UI", "RGBA_INTEGER", "UNSIGNED_BYTE"),
    ] {
        let results = support::run_suite(internal, format, ty, Version::WEBGL2);
        let summary = results.summary();
        support::assert_no_failures(&summary);
        assert_eq!(summary.passed, WEBGL2_CHECKS, "{}/{}/{}", internal, format, ty);
    }
}

#[test]
fn unsupported_triple_runs_nothing() {
    // sized formats need WebGL 2; the prologue turns the suite down
    let results = support::run_suite("RGBA8", "RGBA", "UNSIGNED_BYTE", Version::WEBGL1);
    let summary = results.summary();

    assert_eq!(summary.passed, 0);
    assert_eq!(summary.failed, 0);
    assert!(results.is_finished());
}

#[test]
fn context_creation_failure_is_reported() {
    support::init_logging();

    let config = SuiteConfig::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
        .with_resource_path(support::resource_path())
        .with_default_context_version(Version(3, 0));
    let (harness, results) = support::HeadlessHarness::with_max_version(Version::WEBGL2);
    pollster::block_on(suite::generate_test(config, suite::format_supported, harness)());

    let summary = results.summary();
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].contains("WebGL 3.0"), "{}", summary.failures[0]);
    assert!(results.is_finished());
}

#[test]
fn missing_png_does_not_stop_canvas_sources() {
    support::init_logging();

    let config = SuiteConfig::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
        .with_resource_path("/nonexistent")
        .with_default_context_version(Version::WEBGL1);
    let (harness, results) = support::HeadlessHarness::new();
    pollster::block_on(suite::generate_test(config, suite::format_supported, harness)());

    let summary = results.summary();
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].starts_with("Creating Image from png failed. src: "),
            "{}", summary.failures[0]);
    // the two canvas-derived sources and the final error check
    assert_eq!(summary.passed, 2 * (8 * 2 + 8 * 6 * 2) + 1);
}

#[test]
fn custom_prologue_can_skip() {
    support::init_logging();

    let config = SuiteConfig::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
        .with_resource_path(support::resource_path());
    let (harness, results) = support::HeadlessHarness::new();
    let init = suite::generate_test(config, |_, _| false, harness);
    pollster::block_on(init());

    assert_eq!(results.summary().passed, 0);
    assert!(results.is_finished());
}

/// What goes wrong in a `FaultyContext`.
#[derive(Copy, Clone)]
enum Fault {
    /// Panics on the nth `tex_image_2d` taking a source, counted from 1.
    PanicOnUpload(usize),
    /// Cube map programs have no `face` uniform.
    NoFaceUniform,
}

/// A headless context that breaks in a controlled way.
struct FaultyContext {
    inner: HeadlessContext,
    fault: Fault,
    uploads: Cell<usize>,
}

impl Backend for FaultyContext {
    fn version_string(&self) -> String {
        self.inner.version_string()
    }

    fn canvas_dimensions(&self) -> (u32, u32) {
        self.inner.canvas_dimensions()
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.inner.clear_color(red, green, blue, alpha)
    }

    fn clear_depth(&self, depth: f32) {
        self.inner.clear_depth(depth)
    }

    fn clear(&self, mask: GLenum) {
        self.inner.clear(mask)
    }

    fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.inner.color_mask(red, green, blue, alpha)
    }

    fn create_texture(&self) -> TextureId {
        self.inner.create_texture()
    }

    fn bind_texture(&self, target: GLenum, texture: Option<TextureId>) {
        self.inner.bind_texture(target, texture)
    }

    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.inner.tex_parameter_i(target, pname, param)
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        self.inner.pixel_store_i(pname, param)
    }

    fn tex_image_2d_empty(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum)
    {
        self.inner.tex_image_2d_empty(target, level, internal_format, width, height, format, ty)
    }

    fn tex_image_2d(&self, target: GLenum, level: GLint, internal_format: GLenum,
                    format: GLenum, ty: GLenum, source: &DecodedImage)
    {
        self.uploads.set(self.uploads.get() + 1);
        if let Fault::PanicOnUpload(n) = self.fault {
            if self.uploads.get() == n {
                panic!("driver blew up");
            }
        }
        self.inner.tex_image_2d(target, level, internal_format, format, ty, source)
    }

    fn tex_image_2d_sized(&self, target: GLenum, level: GLint, internal_format: GLenum,
                          width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum,
                          source: &DecodedImage)
    {
        self.inner.tex_image_2d_sized(target, level, internal_format, width, height, format, ty,
                                      source)
    }

    fn tex_sub_image_2d(&self, target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint,
                        format: GLenum, ty: GLenum, source: &DecodedImage)
    {
        self.inner.tex_sub_image_2d(target, level, xoffset, yoffset, format, ty, source)
    }

    fn tex_sub_image_2d_sized(&self, target: GLenum, level: GLint, xoffset: GLint,
                              yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum,
                              ty: GLenum, source: &DecodedImage)
    {
        self.inner.tex_sub_image_2d_sized(target, level, xoffset, yoffset, width, height, format,
                                          ty, source)
    }

    fn setup_textured_quad(&self, internal_format: GLenum) -> Result<ProgramId, ProgramSetupError> {
        self.inner.setup_textured_quad(internal_format)
    }

    fn setup_textured_quad_with_cube_map(&self, internal_format: GLenum)
                                         -> Result<ProgramId, ProgramSetupError>
    {
        self.inner.setup_textured_quad_with_cube_map(internal_format)
    }

    fn get_uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        match self.fault {
            Fault::NoFaceUniform if name == "face" => None,
            _ => self.inner.get_uniform_location(program, name),
        }
    }

    fn uniform_1i(&self, location: &UniformLocation, value: GLint) {
        self.inner.uniform_1i(location, value)
    }

    fn clear_and_draw_unit_quad(&self, color: [u8; 4]) {
        self.inner.clear_and_draw_unit_quad(color)
    }

    fn read_pixels(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<[u8; 4]> {
        self.inner.read_pixels(x, y, width, height)
    }

    fn get_error(&self) -> GLenum {
        self.inner.get_error()
    }
}

/// Keeps the pass messages next to the usual results.
#[derive(Default)]
struct Recorder {
    results: TestResults,
    passes: RefCell<Vec<String>>,
}

impl Reporter for Recorder {
    fn description(&self, msg: &str) {
        self.results.description(msg)
    }

    fn debug(&self, msg: &str) {
        self.results.debug(msg)
    }

    fn test_passed(&self, msg: &str) {
        self.passes.borrow_mut().push(msg.to_owned());
        self.results.test_passed(msg)
    }

    fn test_failed(&self, msg: &str) {
        self.results.test_failed(msg)
    }

    fn finish_test(&self) {
        self.results.finish_test()
    }
}

struct FaultyHarness {
    fault: Fault,
    recorder: Rc<Recorder>,
}

impl Harness for FaultyHarness {
    type Context = FaultyContext;
    type Reporter = Recorder;

    fn create_context(&self, version: Version) -> Result<FaultyContext, ContextCreationError> {
        Ok(FaultyContext {
            inner: HeadlessContext::new(version),
            fault: self.fault,
            uploads: Cell::new(0),
        })
    }

    fn reporter(&self) -> &Recorder {
        &self.recorder
    }
}

fn run_faulty_suite(fault: Fault) -> Rc<Recorder> {
    support::init_logging();

    let config = SuiteConfig::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
        .with_resource_path(support::resource_path())
        .with_default_context_version(Version::WEBGL1);
    let recorder = Rc::new(Recorder::default());
    let harness = FaultyHarness { fault, recorder: recorder.clone() };
    pollster::block_on(suite::generate_test(config, suite::format_supported, harness)());
    recorder
}

#[test]
fn panic_in_driver_is_reported_then_checks_errors() {
    let recorder = run_faulty_suite(Fault::PanicOnUpload(3));
    let summary = recorder.results.summary();

    assert_eq!(summary.failures, vec!["Unexpected exception: driver blew up".to_owned()]);
    assert_eq!(recorder.passes.borrow().last().map(String::as_str),
               Some("getError was expected value: NO_ERROR : should be no errors"));
    assert!(recorder.results.is_finished());
}

#[test]
fn run_error_is_reported_then_checks_errors() {
    let recorder = run_faulty_suite(Fault::NoFaceUniform);
    let summary = recorder.results.summary();

    assert_eq!(summary.failures,
               vec!["Unexpected exception: Uniform `face` not found in the program".to_owned()]);
    // the PNG's 2D cases ran, then the first cube map iteration gave up
    assert_eq!(summary.passed, 8 * 2 + 1);
    assert_eq!(recorder.passes.borrow().last().map(String::as_str),
               Some("getError was expected value: NO_ERROR : should be no errors"));
    assert!(recorder.results.is_finished());
}
