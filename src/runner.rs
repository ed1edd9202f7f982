/*!
Runs the upload matrix for one format triple.

For every image source, each case of `case::generate_cases` is run against a `TEXTURE_2D`
texture, then, if the image is square, against a `TEXTURE_CUBE_MAP` with every face uploaded.
Every iteration creates a new texture, draws it on the whole canvas and checks a region near the
bottom-left corner and one near the top-left corner.

*/
use std::error::Error;
use std::fmt;
use std::path::Path;

use smallvec::SmallVec;

use crate::backend::{self, Backend, ProgramId, ProgramSetupError};
use crate::case::{self, TestCase};
use crate::check;
use crate::color::{self, Color};
use crate::gl;
use crate::gl::types::{GLenum, GLint, GLsizei};
use crate::image_format::FormatTriple;
use crate::image_source::{self, DecodedImage, Image, ImageSource, ImgElement};
use crate::report::Reporter;
use crate::version::Version;
use crate::ToGlEnum;

/// Name of the PNG fixture inside the resource directory.
pub const RESOURCE_IMAGE: &str = "red-green.png";

/// Unexpected failure that aborts the run.
///
/// Check failures are not errors; they go to the `Reporter` and the run continues.
#[derive(Debug)]
pub enum RunError {
    /// The textured quad program couldn't be built.
    ProgramSetup(ProgramSetupError),

    /// The program lacks a uniform the runner needs.
    MissingUniform(&'static str),

    /// The canvas couldn't be encoded to a data URL.
    Encode(image::ImageError),
}

impl fmt::Display for RunError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            RunError::ProgramSetup(err) => write!(formatter, "{}", err),
            RunError::MissingUniform(name) =>
                write!(formatter, "Uniform `{}` not found in the program", name),
            RunError::Encode(err) =>
                write!(formatter, "Could not encode the canvas: {}", err),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunError::ProgramSetup(err) => Some(err),
            RunError::Encode(err) => Some(err),
            RunError::MissingUniform(_) => None,
        }
    }
}

impl From<ProgramSetupError> for RunError {
    fn from(err: ProgramSetupError) -> RunError {
        RunError::ProgramSetup(err)
    }
}

/// Runs the cases of one format triple on a context.
pub struct ConformanceRunner<'a, B: ?Sized, R: ?Sized> {
    ctx: &'a B,
    reporter: &'a R,
    triple: FormatTriple,
    version: Version,
    red: Color,
    green: Color,
}

impl<'a, B: ?Sized, R: ?Sized> ConformanceRunner<'a, B, R> where B: Backend, R: Reporter {
    /// Builds a runner. `version` decides whether the sub-rectangle cases run.
    pub fn new(ctx: &'a B, reporter: &'a R, triple: FormatTriple, version: Version)
               -> ConformanceRunner<'a, B, R>
    {
        let (red, green) = color::colors_for_format(triple.pixel_format);
        ConformanceRunner { ctx, reporter, triple, version, red, green }
    }

    /// Returns the colors the red and green parts of a source read back as.
    pub fn colors(&self) -> (Color, Color) {
        (self.red, self.green)
    }

    /// Returns the sources the suite uploads: the PNG fixture in `resource_path`, then a 2x2
    /// canvas with a row of each color seen through an `Image` and through an `<img>`.
    pub fn default_sources(&self, resource_path: &Path) -> Result<Vec<ImageSource>, RunError> {
        let canvas = image_source::two_color_canvas(2, 2, self.red.to_rgba(),
                                                    self.green.to_rgba());
        let url = canvas.to_data_url().map_err(RunError::Encode)?;

        Ok(vec![
            ImageSource::Png(Image::from_path(resource_path.join(RESOURCE_IMAGE))),
            ImageSource::Canvas(Image::from_data_url(url.clone())),
            ImageSource::Element(ImgElement::new(url)),
        ])
    }

    /// Runs every case on the default sources.
    pub async fn run_test(&self, resource_path: &Path) -> Result<(), RunError> {
        let sources = self.default_sources(resource_path)?;
        self.run_sources(&sources).await
    }

    /// Decodes each source in turn and runs every case on it.
    ///
    /// A source that fails to decode is reported and skipped.
    pub async fn run_sources(&self, sources: &[ImageSource]) -> Result<(), RunError> {
        for source in sources {
            self.reporter.debug("");
            self.reporter.debug("==================================");
            self.reporter.debug(source.header());
            self.reporter.debug("");

            let image = match source.decode().await {
                Ok(image) => image,
                Err(e) => {
                    self.reporter.test_failed(&format!("Creating {} failed. src: {}, e: {}",
                                                       source.kind(), source.src(), e));
                    continue;
                },
            };

            self.run_test_on_image(&image).await?;
        }

        Ok(())
    }

    /// Runs every case on `image`, first as a 2D texture, then as a cube map.
    pub async fn run_test_on_image(&self, image: &DecodedImage) -> Result<(), RunError> {
        let cases = case::generate_cases(self.version, self.red, self.green);
        self.run_cases_on_image(image, &cases).await
    }

    /// Runs `cases` on `image`, yielding to the scheduler after each one.
    pub async fn run_cases_on_image(&self, image: &DecodedImage, cases: &[TestCase])
                                    -> Result<(), RunError>
    {
        let internal_format = self.triple.internal_format.to_glenum();

        let program = self.ctx.setup_textured_quad(internal_format)?;
        for case in cases {
            self.run_one_iteration(image, case, gl::TEXTURE_2D, program)?;
            self.ctx.dispatch().await;
        }

        // cube map faces must be square
        if image.width() != image.height() {
            return Ok(());
        }

        let program = self.ctx.setup_textured_quad_with_cube_map(internal_format)?;
        for case in cases {
            // no sub-rectangle uploads on cube maps
            if case.source_sub_rectangle.is_none() {
                self.run_one_iteration(image, case, gl::TEXTURE_CUBE_MAP, program)?;
            }
            self.ctx.dispatch().await;
        }

        Ok(())
    }

    /// Uploads `image` to a new texture bound to `binding_target` as `case` says, draws it with
    /// `program` and checks the canvas.
    pub fn run_one_iteration(&self, image: &DecodedImage, case: &TestCase,
                             binding_target: GLenum, program: ProgramId) -> Result<(), RunError>
    {
        let ctx = self.ctx;
        let internal_format = self.triple.internal_format.to_glenum();
        let format = self.triple.pixel_format.to_glenum();
        let ty = self.triple.pixel_type.to_glenum();

        self.reporter.debug(&format!("Testing  with {}x{} bindingTarget={} and {}",
                                     image.width(), image.height(),
                                     backend::enum_name(binding_target), case));

        ctx.clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        // alpha is never written
        ctx.color_mask(true, true, true, false);

        let texture = ctx.create_texture();
        ctx.bind_texture(binding_target, Some(texture));
        ctx.tex_parameter_i(binding_target, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
        ctx.tex_parameter_i(binding_target, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);

        ctx.pixel_store_i(gl::UNPACK_FLIP_Y_WEBGL, case.flip_y as GLint);
        ctx.pixel_store_i(gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 0);
        ctx.pixel_store_i(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL,
                          case.color_space_conversion.to_glenum() as GLint);
        let tolerance = case.pixel_max_error();

        let targets: SmallVec<[GLenum; 6]> = if binding_target == gl::TEXTURE_CUBE_MAP {
            backend::CUBE_MAP_FACES.iter().cloned().collect()
        } else {
            SmallVec::from_slice(&[gl::TEXTURE_2D])
        };

        if let Some(rect) = case.source_sub_rectangle {
            ctx.pixel_store_i(gl::UNPACK_SKIP_PIXELS, rect.x as GLint);
            ctx.pixel_store_i(gl::UNPACK_SKIP_ROWS, rect.y as GLint);
        }

        for &target in &targets {
            match case.source_sub_rectangle {
                Some(rect) => {
                    let (width, height) = (rect.width as GLsizei, rect.height as GLsizei);
                    if case.sub {
                        ctx.tex_image_2d_empty(target, 0, internal_format, width, height, format,
                                               ty);
                        ctx.tex_sub_image_2d_sized(target, 0, 0, 0, width, height, format, ty,
                                                   image);
                    } else {
                        ctx.tex_image_2d_sized(target, 0, internal_format, width, height, format,
                                               ty, image);
                    }
                },
                None => {
                    if case.sub {
                        ctx.tex_image_2d_empty(target, 0, internal_format,
                                               image.width() as GLsizei,
                                               image.height() as GLsizei, format, ty);
                        ctx.tex_sub_image_2d(target, 0, 0, 0, format, ty, image);
                    } else {
                        ctx.tex_image_2d(target, 0, internal_format, format, ty, image);
                    }
                },
            }
        }

        if case.source_sub_rectangle.is_some() {
            ctx.pixel_store_i(gl::UNPACK_SKIP_PIXELS, 0);
            ctx.pixel_store_i(gl::UNPACK_SKIP_ROWS, 0);
        }

        let face = if binding_target == gl::TEXTURE_CUBE_MAP {
            Some(ctx.get_uniform_location(program, "face")
                    .ok_or(RunError::MissingUniform("face"))?)
        } else {
            None
        };

        let (_, canvas_height) = ctx.canvas_dimensions();
        for &target in &targets {
            if let Some(face) = &face {
                ctx.uniform_1i(face, target as GLint);
            }

            ctx.clear_and_draw_unit_quad([0, 0, 0, 255]);

            self.reporter.debug("Checking lower left corner");
            check::check_canvas_rect(ctx, self.reporter, 4, 4, 2, 2,
                                     case.bottom_color.channels(),
                                     &format!("shouldBe {}", case.bottom_color), tolerance);
            self.reporter.debug("Checking upper left corner");
            check::check_canvas_rect(ctx, self.reporter, 4, canvas_height as i32 - 8, 2, 2,
                                     case.top_color.channels(),
                                     &format!("shouldBe {}", case.top_color), tolerance);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessContext;
    use crate::case::SubRectangle;
    use crate::report::TestResults;

    fn red_over_green() -> DecodedImage {
        DecodedImage::new(2, 2, vec![[255, 0, 0, 255], [255, 0, 0, 255],
                                     [0, 255, 0, 255], [0, 255, 0, 255]])
    }

    fn rgba() -> FormatTriple {
        FormatTriple::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
    }

    #[test]
    fn single_iteration_checks_both_corners() {
        let ctx = HeadlessContext::new(Version::WEBGL1);
        let results = TestResults::new();
        let runner = ConformanceRunner::new(&ctx, &results, rgba(), Version::WEBGL1);

        let program = ctx.setup_textured_quad(gl::RGBA).unwrap();
        let case = TestCase::new(false, false, Color::GREEN, Color::RED);
        runner.run_one_iteration(&red_over_green(), &case, gl::TEXTURE_2D, program).unwrap();

        let summary = results.summary();
        assert_eq!(summary.passed, 2, "{:?}", summary.failures);
        assert_eq!(summary.failed, 0);
        assert_eq!(ctx.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn sub_rectangle_first_row_is_red() {
        let ctx = HeadlessContext::new(Version::WEBGL2);
        let results = TestResults::new();
        let runner = ConformanceRunner::new(&ctx, &results, rgba(), Version::WEBGL2);

        let program = ctx.setup_textured_quad(gl::RGBA).unwrap();
        for &sub in &[false, true] {
            let case = TestCase::new(sub, false, Color::RED, Color::RED)
                .with_sub_rectangle(SubRectangle::new(0, 0, 1, 1));
            runner.run_one_iteration(&red_over_green(), &case, gl::TEXTURE_2D, program).unwrap();
        }

        assert_eq!(results.summary().failed, 0, "{:?}", results.summary().failures);
        assert_eq!(ctx.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn cube_map_checks_every_face() {
        let ctx = HeadlessContext::new(Version::WEBGL1);
        let results = TestResults::new();
        let runner = ConformanceRunner::new(&ctx, &results, rgba(), Version::WEBGL1);

        let program = ctx.setup_textured_quad_with_cube_map(gl::RGBA).unwrap();
        let case = TestCase::new(true, true, Color::RED, Color::GREEN);
        runner.run_one_iteration(&red_over_green(), &case, gl::TEXTURE_CUBE_MAP, program)
              .unwrap();

        assert_eq!(results.summary().passed, 12);
        assert_eq!(results.summary().failed, 0);
    }

    #[test]
    fn missing_face_uniform_is_an_error() {
        let ctx = HeadlessContext::new(Version::WEBGL1);
        let results = TestResults::new();
        let runner = ConformanceRunner::new(&ctx, &results, rgba(), Version::WEBGL1);

        // the 2D program has no `face` uniform
        let program = ctx.setup_textured_quad(gl::RGBA).unwrap();
        let case = TestCase::new(false, true, Color::RED, Color::GREEN);
        let err = runner.run_one_iteration(&red_over_green(), &case, gl::TEXTURE_CUBE_MAP,
                                           program).unwrap_err();
        assert!(matches!(err, RunError::MissingUniform("face")));
    }

    #[test]
    fn canvas_sources_use_format_colors() {
        let ctx = HeadlessContext::new(Version::WEBGL1);
        let results = TestResults::new();
        let triple = FormatTriple::from_names("LUMINANCE", "LUMINANCE", "UNSIGNED_BYTE").unwrap();
        let runner = ConformanceRunner::new(&ctx, &results, triple, Version::WEBGL1);
        assert_eq!(runner.colors(), (Color::WHITE, Color::BLACK));

        let sources = runner.default_sources(Path::new("resources")).unwrap();
        let image = pollster::block_on(sources[1].decode()).unwrap();
        assert_eq!(image.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(image.pixel(0, 1), [0, 0, 0, 255]);
    }
}
