/*!
Entry point of a conformance suite.

`generate_test` binds a format triple, a resource directory and a default context version, and
returns the closure a test page would call on load. Running it:

 - prints the suite's description,
 - resolves the context version (`WEBGL_VERSION` overrides the configured default),
 - creates the context through the `Harness`,
 - lets the prologue decide whether the suite applies,
 - runs every source and case, turning unexpected errors and panics into failures,
 - checks that no GL error is pending and finishes the test.

*/
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::backend::Backend;
use crate::check;
use crate::gl;
use crate::image_format::{FormatParseError, FormatTriple};
use crate::report::Reporter;
use crate::runner::ConformanceRunner;
use crate::version::{self, Version};
use crate::ContextCreationError;

/// Directory searched for `red-green.png` when none is given.
pub const DEFAULT_RESOURCE_PATH: &str = "resources/";

/// Parameters of a generated suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Formats passed to every upload.
    pub triple: FormatTriple,

    /// Directory containing the PNG fixture.
    pub resource_path: PathBuf,

    /// Version used unless `WEBGL_VERSION` says otherwise.
    pub default_context_version: Version,
}

impl SuiteConfig {
    /// Builds a configuration for `triple`, with fixtures in `resources/` and a WebGL 1
    /// default.
    pub fn new(triple: FormatTriple) -> SuiteConfig {
        SuiteConfig {
            triple,
            resource_path: PathBuf::from(DEFAULT_RESOURCE_PATH),
            default_context_version: Version::WEBGL1,
        }
    }

    /// Same as `new`, with the formats given by their GL names.
    pub fn from_names(internal_format: &str, pixel_format: &str, pixel_type: &str)
                      -> Result<SuiteConfig, FormatParseError>
    {
        Ok(SuiteConfig::new(FormatTriple::from_names(internal_format, pixel_format,
                                                     pixel_type)?))
    }

    /// Sets the directory containing the PNG fixture.
    #[inline]
    pub fn with_resource_path<P>(mut self, path: P) -> SuiteConfig where P: Into<PathBuf> {
        self.resource_path = path.into();
        self
    }

    /// Sets the version used when `WEBGL_VERSION` is not set.
    #[inline]
    pub fn with_default_context_version(mut self, version: Version) -> SuiteConfig {
        self.default_context_version = version;
        self
    }
}

/// The environment a suite runs in.
pub trait Harness {
    /// The context type the suite draws with.
    type Context: Backend;

    /// Receiver of the suite's results.
    type Reporter: Reporter;

    /// Creates the context the suite draws with.
    fn create_context(&self, version: Version) -> Result<Self::Context, ContextCreationError>;

    /// Returns where results go.
    fn reporter(&self) -> &Self::Reporter;
}

/// Prologue accepting the suite only when the triple is a legal upload on the context.
pub fn format_supported<B>(ctx: &B, triple: &FormatTriple) -> bool where B: Backend + ?Sized {
    match ctx.version_string().parse::<Version>() {
        Ok(version) => triple.is_supported(version),
        Err(e) => {
            log::warn!("{}", e);
            false
        },
    }
}

/// Returns the suite's init function.
///
/// `prologue` is called with the new context before anything runs; returning `false` finishes
/// the test without running any case.
pub fn generate_test<H, P>(config: SuiteConfig, prologue: P, harness: H)
                           -> impl FnOnce() -> LocalBoxFuture<'static, ()>
    where H: Harness + 'static,
          P: FnOnce(&H::Context, &FormatTriple) -> bool + 'static
{
    move || async move {
        let reporter = harness.reporter();
        reporter.description(&format!("Verify texImage2D and texSubImage2D code paths taking \
                                       image elements ({})", config.triple));

        let version = version::resolve_context_version(config.default_context_version);
        let ctx = match harness.create_context(version) {
            Ok(ctx) => ctx,
            Err(e) => {
                reporter.test_failed(&format!("Could not create the context: {}", e));
                reporter.finish_test();
                return;
            },
        };

        if !prologue(&ctx, &config.triple) {
            reporter.finish_test();
            return;
        }

        ctx.clear_color(0.0, 0.0, 0.0, 1.0);
        ctx.clear_depth(1.0);

        let runner = ConformanceRunner::new(&ctx, reporter, config.triple, version);
        let outcome = AssertUnwindSafe(runner.run_test(&config.resource_path))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => (),
            Ok(Err(e)) => reporter.test_failed(&format!("Unexpected exception: {}", e)),
            Err(payload) => reporter.test_failed(&format!("Unexpected exception: {}",
                                                          panic_message(&*payload))),
        }

        check::gl_error_should_be(&ctx, reporter, gl::NO_ERROR, "should be no errors");
        reporter.finish_test();
    }.boxed_local()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_owned()
    }
}
