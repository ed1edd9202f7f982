/*!
Test supports module.

*/

#![allow(dead_code)]

use std::path::PathBuf;
use std::rc::Rc;

use teximage_conformance::backend::headless::HeadlessContext;
use teximage_conformance::report::{Summary, TestResults};
use teximage_conformance::suite::{self, Harness, SuiteConfig};
use teximage_conformance::{ContextCreationError, Version};

/// Installs the logger once; `RUST_LOG=debug` shows every case.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Returns the directory holding `red-green.png`.
pub fn resource_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

/// Builds a headless context of the given version with the default canvas.
pub fn build_context(version: Version) -> HeadlessContext {
    init_logging();
    HeadlessContext::new(version)
}

/// Harness creating `HeadlessContext`s and sharing its results with the test.
pub struct HeadlessHarness {
    results: Rc<TestResults>,
    max_version: Version,
}

impl HeadlessHarness {
    pub fn new() -> (HeadlessHarness, Rc<TestResults>) {
        HeadlessHarness::with_max_version(Version::WEBGL2)
    }

    /// A harness that refuses versions above `max_version`.
    pub fn with_max_version(max_version: Version) -> (HeadlessHarness, Rc<TestResults>) {
        let results = Rc::new(TestResults::new());
        (HeadlessHarness { results: results.clone(), max_version }, results)
    }
}

impl Harness for HeadlessHarness {
    type Context = HeadlessContext;
    type Reporter = TestResults;

    fn create_context(&self, version: Version) -> Result<HeadlessContext, ContextCreationError> {
        if version > self.max_version {
            return Err(ContextCreationError::VersionNotSupported(version));
        }
        Ok(HeadlessContext::new(version))
    }

    fn reporter(&self) -> &TestResults {
        &self.results
    }
}

/// Runs a whole suite on a headless context and returns its results.
pub fn run_suite(internal_format: &str, pixel_format: &str, pixel_type: &str,
                 version: Version) -> Rc<TestResults>
{
    init_logging();

    let config = SuiteConfig::from_names(internal_format, pixel_format, pixel_type).unwrap()
        .with_resource_path(resource_path())
        .with_default_context_version(version);
    let (harness, results) = HeadlessHarness::new();

    let init = suite::generate_test(config, suite::format_supported, harness);
    pollster::block_on(init());
    results
}

/// Panics with every failure message unless the summary is clean.
pub fn assert_no_failures(summary: &Summary) {
    assert!(summary.failed == 0, "{} failures:\n{}", summary.failed,
            summary.failures.join("\n"));
}
