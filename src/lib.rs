/*!
Conformance tests for `texImage2D` and `texSubImage2D` taking image sources.

For a format triple (internal format, pixel format, pixel type) and a context version, the
generated suite uploads decoded images into `TEXTURE_2D` and `TEXTURE_CUBE_MAP` textures under
every combination of:

 - full upload or allocation followed by `texSubImage2D`,
 - `UNPACK_FLIP_Y_WEBGL` on or off,
 - a source sub-rectangle (WebGL 2 only),
 - `UNPACK_COLORSPACE_CONVERSION_WEBGL` set to `NONE` or `BROWSER_DEFAULT_WEBGL`.

Each texture is drawn to a full-viewport quad and two regions of the canvas are compared with
the expected colors.

# Running a suite

The graphics context is reached through the `Backend` trait and created by a `Harness`, which
also receives the results. `generate_test` returns the suite's entry point:

```no_run
use teximage_conformance::backend::headless::HeadlessContext;
use teximage_conformance::report::TestResults;
use teximage_conformance::suite::{self, Harness, SuiteConfig};
use teximage_conformance::{ContextCreationError, Version};

struct Headless(TestResults);

impl Harness for Headless {
    type Context = HeadlessContext;
    type Reporter = TestResults;

    fn create_context(&self, version: Version) -> Result<HeadlessContext, ContextCreationError> {
        Ok(HeadlessContext::new(version))
    }

    fn reporter(&self) -> &TestResults {
        &self.0
    }
}

let config = SuiteConfig::from_names("RGBA", "RGBA", "UNSIGNED_BYTE").unwrap()
    .with_resource_path("resources/");
let init = suite::generate_test(config, suite::format_supported, Headless(TestResults::new()));
pollster::block_on(init());
```

The `backend::headless` module contains a software implementation of the upload and sampling
rules, so the suite can run anywhere.

*/
#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

#[macro_use]
mod macros;

pub use crate::case::{ColorSpaceConversion, SubRectangle, TestCase};
pub use crate::color::{colors_for_format, Color};
pub use crate::image_format::{FormatTriple, InternalFormat, PixelFormat, PixelType};
pub use crate::runner::{ConformanceRunner, RunError};
pub use crate::suite::{generate_test, SuiteConfig};
pub use crate::version::Version;

use std::error::Error;
use std::fmt;

pub mod backend;
pub mod case;
pub mod check;
pub mod color;
pub mod image_format;
pub mod image_source;
pub mod report;
pub mod runner;
pub mod suite;
pub mod sync;
pub mod version;

/// OpenGL ES 3.0 enums and types, plus the WebGL-only enums.
#[allow(missing_docs, non_upper_case_globals, dead_code, clippy::all)]
pub mod gl {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));

    pub const UNPACK_FLIP_Y_WEBGL: types::GLenum = 0x9240;
    pub const UNPACK_PREMULTIPLY_ALPHA_WEBGL: types::GLenum = 0x9241;
    pub const UNPACK_COLORSPACE_CONVERSION_WEBGL: types::GLenum = 0x9243;
    pub const BROWSER_DEFAULT_WEBGL: types::GLenum = 0x9244;
}

/// Trait for objects that are OpenGL objects.
pub trait GlObject {
    /// The type of identifier for this object.
    type Id;

    /// Returns the id of the object.
    fn get_id(&self) -> Self::Id;
}

/// Trait for enums that can be turned into GLenum.
pub trait ToGlEnum {
    /// Returns the value.
    fn to_glenum(&self) -> gl::types::GLenum;
}

/// Error that can happen while creating a context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextCreationError {
    /// The requested API version is not available.
    VersionNotSupported(Version),

    /// The context could not be created for another reason.
    Other(String),
}

impl fmt::Display for ContextCreationError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ContextCreationError::VersionNotSupported(version) =>
                write!(formatter, "{} is not supported by this backend", version),
            ContextCreationError::Other(msg) =>
                write!(formatter, "Could not create the context: {}", msg),
        }
    }
}

impl Error for ContextCreationError {}
