//! Messages, an application and test doubles shared by the crate's tests.

use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::TimeDelta;
use serde::Serialize;

use crate::{
    AnyMessage, Application, ApplicationConfigurer, Handler, HandlerConfigurer, HandlerScope,
    Message, Result, TestingT, ValidationError,
    expectation::Predicate,
    report::{Report, ReportGenerationContext},
};

fn non_negative(value: i32) -> std::result::Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(format!("value must not be negative, got {value}")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmdA {
    pub value: i32,
}

impl Message for CmdA {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        non_negative(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmdB {
    pub value: i32,
}

impl Message for CmdB {}

/// Records one `EvtA` per value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmdMany {
    pub values: Vec<i32>,
}

impl Message for CmdMany {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvtA {
    pub value: i32,
}

impl Message for EvtA {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        non_negative(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvtB {
    pub value: i32,
}

impl Message for EvtB {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutA {
    pub value: i32,
}

impl Message for TimeoutA {}

/// Compared by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canonical {
    pub id: u32,
    pub noise: String,
}

impl Message for Canonical {
    fn canonical_form(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "id": self.id }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tagged {
    pub name: String,
    pub tags: Vec<String>,
    pub count: i32,
}

impl Message for Tagged {}

/// Carries a map, so "like" comparisons see keys rather than fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Limits {
    pub limits: BTreeMap<String, i32>,
}

impl Message for Limits {}

/// Handles `CmdA` and `CmdMany` by recording `EvtA`.
struct Account;

impl Handler for Account {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("account")
            .handles_command::<CmdA>()
            .handles_command::<CmdMany>()
            .records_event::<EvtA>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result<()> {
        if let Some(cmd) = message.downcast_ref::<CmdA>() {
            scope.record_event(EvtA { value: cmd.value });
        } else if let Some(cmd) = message.downcast_ref::<CmdMany>() {
            for value in &cmd.values {
                scope.record_event(EvtA { value: *value });
            }
        }
        Ok(())
    }
}

/// Reacts to `EvtA` by executing `CmdB` and scheduling a `TimeoutA` half an
/// hour later.
struct Notifier;

impl Handler for Notifier {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("notifier")
            .handles_event::<EvtA>()
            .executes_command::<CmdB>()
            .schedules_timeout::<TimeoutA>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result<()> {
        if let Some(evt) = message.downcast_ref::<EvtA>() {
            scope.execute_command(CmdB { value: evt.value });
            let at = scope.now() + TimeDelta::minutes(30);
            scope.schedule_timeout(TimeoutA { value: evt.value }, at);
        } else if let Some(timeout) = message.downcast_ref::<TimeoutA>() {
            scope.log(format!("timeout {} elapsed", timeout.value));
        }
        Ok(())
    }
}

/// Handles `CmdB` by recording `EvtB`.
struct Mailer;

impl Handler for Mailer {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("mailer").handles_command::<CmdB>().records_event::<EvtB>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result<()> {
        if let Some(cmd) = message.downcast_ref::<CmdB>() {
            scope.record_event(EvtB { value: cmd.value });
        }
        Ok(())
    }
}

struct Ledger;

impl Handler for Ledger {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("ledger").handles_event::<EvtA>().handles_event::<EvtB>();
    }

    fn handle(&mut self, _: &mut HandlerScope<'_>, _: &dyn AnyMessage) -> Result<()> {
        Ok(())
    }
}

/// An application named "app" with one handler of each type.
pub struct App;

impl Application for App {
    fn configure(&self, c: &mut ApplicationConfigurer) {
        c.identity("app")
            .register_aggregate(Account)
            .register_process(Notifier)
            .register_integration(Mailer)
            .register_projection(Ledger);
    }
}

/// A predicate with a fixed outcome.
#[derive(Clone)]
pub struct Fixed {
    criteria: String,
    ok: bool,
    explanation: String,
}

impl Fixed {
    pub fn new(criteria: &str, ok: bool) -> Self {
        Self {
            criteria: criteria.to_owned(),
            ok,
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = explanation.to_owned();
        self
    }
}

impl Predicate for Fixed {
    fn notify(&mut self, _: &crate::Fact) {}

    fn ok(&self) -> bool {
        self.ok
    }

    fn done(&mut self) {}

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let mut report = Report::new(ctx, self.ok, self.criteria.clone());
        if !ctx.omits_detail(self.ok) && !self.explanation.is_empty() {
            report.set_explanation(self.explanation.clone());
        }
        report
    }
}

/// Unwinds out of a test run by [`MockT`].
pub struct FailNow;

/// Captures the log and stops the test by unwinding with [`FailNow`].
#[derive(Default)]
pub struct MockT {
    logs: Mutex<Vec<String>>,
    failed: AtomicBool,
}

impl MockT {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far, one entry per call.
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    pub fn output(&self) -> String {
        self.logs().join("\n")
    }

    /// Runs `f`, swallowing a [`FailNow`] unwind. Other panics propagate.
    pub fn run(&self, f: impl FnOnce()) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        if let Err(payload) = result
            && !payload.is::<FailNow>()
        {
            std::panic::resume_unwind(payload);
        }
    }
}

impl TestingT for MockT {
    fn log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_owned());
    }

    fn fail_now(&self) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        std::panic::resume_unwind(Box::new(FailNow))
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}
