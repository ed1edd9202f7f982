/*!
Receivers of test results.

The runner never asserts: every check ends in `test_passed` or `test_failed` on a `Reporter`,
and the suite ends with `finish_test`.

*/
use std::cell::{Cell, RefCell};

/// Receives the outcome of every check of a suite.
pub trait Reporter {
    /// Announces what the suite verifies.
    fn description(&self, msg: &str);

    /// Progress message that is not a result.
    fn debug(&self, msg: &str);

    /// A check succeeded.
    fn test_passed(&self, msg: &str);

    /// A check failed. `msg` says what was expected and what was found.
    fn test_failed(&self, msg: &str);

    /// Called once, after the last check.
    fn finish_test(&self);
}

impl<'a, R: ?Sized> Reporter for &'a R where R: Reporter {
    fn description(&self, msg: &str) {
        (**self).description(msg)
    }

    fn debug(&self, msg: &str) {
        (**self).debug(msg)
    }

    fn test_passed(&self, msg: &str) {
        (**self).test_passed(msg)
    }

    fn test_failed(&self, msg: &str) {
        (**self).test_failed(msg)
    }

    fn finish_test(&self) {
        (**self).finish_test()
    }
}

/// Counts of a finished or running suite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of passed checks.
    pub passed: usize,
    /// Number of failed checks.
    pub failed: usize,
    /// Failure messages, in order.
    pub failures: Vec<String>,
}

impl Summary {
    /// Returns true if at least one check ran and none failed.
    pub fn all_passed(&self) -> bool {
        self.passed > 0 && self.failed == 0
    }
}

/// A `Reporter` that logs every message and keeps the results.
#[derive(Debug, Default)]
pub struct TestResults {
    description: RefCell<Option<String>>,
    passed: Cell<usize>,
    failures: RefCell<Vec<String>>,
    debug: RefCell<Vec<String>>,
    finished: Cell<bool>,
}

impl TestResults {
    /// Builds an empty collector.
    pub fn new() -> TestResults {
        TestResults::default()
    }

    /// Returns the description given by the suite, if any.
    pub fn description_text(&self) -> Option<String> {
        self.description.borrow().clone()
    }

    /// Returns the debug messages received so far.
    pub fn debug_messages(&self) -> Vec<String> {
        self.debug.borrow().clone()
    }

    /// Returns true once `finish_test` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    /// Returns the counts and failure messages received so far.
    pub fn summary(&self) -> Summary {
        let failures = self.failures.borrow().clone();
        Summary {
            passed: self.passed.get(),
            failed: failures.len(),
            failures,
        }
    }
}

impl Reporter for TestResults {
    fn description(&self, msg: &str) {
        log::info!("{}", msg);
        *self.description.borrow_mut() = Some(msg.to_owned());
    }

    fn debug(&self, msg: &str) {
        log::debug!("{}", msg);
        self.debug.borrow_mut().push(msg.to_owned());
    }

    fn test_passed(&self, msg: &str) {
        log::debug!("PASS {}", msg);
        self.passed.set(self.passed.get() + 1);
    }

    fn test_failed(&self, msg: &str) {
        log::error!("FAIL {}", msg);
        self.failures.borrow_mut().push(msg.to_owned());
    }

    fn finish_test(&self) {
        let summary = self.summary();
        log::info!("finished: {} passed, {} failed", summary.passed, summary.failed);
        self.finished.set(true);
    }
}
