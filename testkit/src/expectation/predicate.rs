use std::sync::Arc;

use crate::{
    ApplicationConfig, Fact,
    compare::Comparator,
    report::{Report, ReportGenerationContext},
};

/// The live, stateful form of an [`Expectation`](crate::Expectation),
/// evaluated against the facts of a single action.
///
/// The lifecycle is: created, notified of every fact in order, polled with
/// [`ok`](Predicate::ok), finalised with [`done`](Predicate::done), and
/// finally asked for a [`Report`].
pub trait Predicate: Send {
    fn notify(&mut self, fact: &Fact);

    fn ok(&self) -> bool;

    /// Called once, after the action has completed.
    fn done(&mut self);

    fn report(&self, ctx: ReportGenerationContext) -> Report;
}

/// Options an action may set on the predicates that observe it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredicateOptions {
    /// Treat the message that starts a dispatch cycle as produced. Set by
    /// actions whose messages are dispatched by user code rather than by a
    /// handler.
    pub match_dispatch_cycle_started_facts: bool,
}

/// Everything an expectation needs to become a predicate.
#[derive(Clone)]
pub struct PredicateScope {
    pub app: Arc<ApplicationConfig>,
    pub comparator: Arc<dyn Comparator>,
    pub options: PredicateOptions,
}
