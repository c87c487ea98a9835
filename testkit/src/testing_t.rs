use std::sync::atomic::{AtomicBool, Ordering};

/// The test runner the harness reports to.
///
/// [`StdT`] reports to the standard Rust test harness. Other implementations
/// can capture output, which is how the harness tests itself.
///
/// Methods that report a location are `#[track_caller]` at the harness's
/// public entry points, so failures point at the test code rather than the
/// harness.
pub trait TestingT: Send + Sync {
    /// Writes a line to the test log.
    fn log(&self, message: &str);

    /// Marks the test as failed and stops it.
    fn fail_now(&self) -> !;

    fn failed(&self) -> bool;

    /// Logs `message`, then fails the test and stops it.
    fn fatal(&self, message: &str) -> ! {
        self.log(message);
        self.fail_now()
    }
}

/// Reports to the standard Rust test harness: logs go to stdout (captured
/// per test) and failures panic.
#[derive(Debug, Default)]
pub struct StdT {
    failed: AtomicBool,
}

impl StdT {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestingT for StdT {
    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn fail_now(&self) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        panic!("test failed, see the log above for details");
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}
