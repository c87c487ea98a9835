use std::{
    fmt,
    panic::{self, AssertUnwindSafe, Location},
};

use crate::{
    Fact,
    expectation::{Predicate, SatisfyFn},
    report::{LOG_MESSAGES, Report, ReportGenerationContext},
};

/// Unwinds out of a user-defined expectation without failing the test.
struct Abort;

/// The handle passed to a [`satisfy`](crate::satisfy) function.
///
/// Mirrors the assertion primitives of a test runner. Methods that stop the
/// function (`fail_now`, `fatal`, `skip`, `skip_now`) unwind back to the
/// harness, which records the outcome and carries on with the test.
///
/// The assertion methods are `#[track_caller]`: the reported failure location
/// is the line in the user's function. Helpers that call these methods should
/// be `#[track_caller]` too, so the location points at the helper's caller.
pub struct SatisfyT {
    facts: Vec<Fact>,
    logs: Vec<String>,
    failed: bool,
    skipped: bool,
    failure: Option<&'static Location<'static>>,
    cleanups: Vec<Box<dyn FnOnce() + Send>>,
}

impl SatisfyT {
    fn new(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            logs: Vec::new(),
            failed: false,
            skipped: false,
            failure: None,
            cleanups: Vec::new(),
        }
    }

    /// The facts produced by the action, in order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn log(&mut self, message: impl fmt::Display) {
        self.logs.push(message.to_string());
    }

    /// Marks the expectation as failed and keeps going.
    #[track_caller]
    pub fn fail(&mut self) {
        self.failed = true;
        self.failure.get_or_insert(Location::caller());
    }

    /// Marks the expectation as failed and stops the function.
    #[track_caller]
    pub fn fail_now(&mut self) -> ! {
        self.fail();
        panic::resume_unwind(Box::new(Abort))
    }

    /// Logs `message` and marks the expectation as failed.
    #[track_caller]
    pub fn error(&mut self, message: impl fmt::Display) {
        self.log(message);
        self.fail();
    }

    /// Logs `message`, marks the expectation as failed and stops the function.
    #[track_caller]
    pub fn fatal(&mut self, message: impl fmt::Display) -> ! {
        self.log(message);
        self.fail_now()
    }

    /// Logs `message` and stops the function, marking the expectation as skipped.
    pub fn skip(&mut self, message: impl fmt::Display) -> ! {
        self.log(message);
        self.skip_now()
    }

    pub fn skip_now(&mut self) -> ! {
        self.skipped = true;
        panic::resume_unwind(Box::new(Abort))
    }

    /// Registers a function to run once the user function has returned.
    /// Cleanups run in reverse order of registration, even if the user
    /// function panics.
    pub fn cleanup(&mut self, f: impl FnOnce() + Send + 'static) {
        self.cleanups.push(Box::new(f));
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    fn run_cleanups(&mut self) {
        while let Some(cleanup) = self.cleanups.pop() {
            cleanup();
        }
    }
}

/// Collects facts while the action runs, then calls the user function.
pub(crate) struct SatisfyPredicate {
    criteria: String,
    func: SatisfyFn,
    facts: Vec<Fact>,
    outcome: Option<SatisfyT>,
}

impl SatisfyPredicate {
    pub fn new(criteria: String, func: SatisfyFn) -> Self {
        Self {
            criteria,
            func,
            facts: Vec::new(),
            outcome: None,
        }
    }
}

impl Predicate for SatisfyPredicate {
    fn notify(&mut self, fact: &Fact) {
        self.facts.push(fact.clone());
    }

    fn ok(&self) -> bool {
        self.outcome.as_ref().is_some_and(|t| !t.failed && !t.skipped)
    }

    fn done(&mut self) {
        let mut t = SatisfyT::new(std::mem::take(&mut self.facts));
        let func = self.func.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| func(&mut t)));
        t.run_cleanups();
        self.outcome = Some(t);

        if let Err(payload) = result
            && !payload.is::<Abort>()
        {
            panic::resume_unwind(payload);
        }
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let ok = self.ok();
        let mut report = Report::new(ctx, ok, self.criteria.clone());
        let Some(t) = &self.outcome else {
            return report;
        };

        if t.skipped {
            report.outcome = "the user-defined expectation was skipped".to_owned();
        } else if t.failed {
            report.outcome = "the user-defined expectation failed".to_owned();
        }

        if ctx.omits_detail(ok) {
            return report;
        }

        if let Some(location) = t.failure {
            report.set_explanation(format!("the expectation failed at {location}"));
        }
        if !t.logs.is_empty() {
            let section = report.section(LOG_MESSAGES);
            for line in &t.logs {
                section.append_list_item(line);
            }
        }
        report
    }
}
