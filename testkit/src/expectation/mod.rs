//! Expectations: declarative descriptions of what an action should cause.
//!
//! An [`Expectation`] is an immutable value. When a test performs an action it
//! compiles the expectation into a [`Predicate`] bound to the application's
//! configuration, feeds it every [`Fact`](crate::Fact) the action produces,
//! and renders its [`Report`](crate::report::Report).
//!
//! ```rust,ignore
//! test.expect(
//!     execute_command(Deposit { amount: 100 }),
//!     all_of([
//!         to_record_event(Deposited { amount: 100 }),
//!         not(to_execute_command_of_type::<Freeze>()),
//!     ]),
//! );
//! ```

mod composite;
mod message;
mod not;
mod predicate;
mod repeat;
mod satisfy;

use std::sync::Arc;

pub use message::{
    MatchError, to_execute_command, to_execute_command_like, to_execute_command_matching,
    to_execute_command_of_type, to_only_execute_commands_matching, to_only_record_events_matching,
    to_only_schedule_timeouts_matching, to_record_event, to_record_event_like,
    to_record_event_matching, to_record_event_of_type, to_schedule_timeout,
    to_schedule_timeout_like, to_schedule_timeout_matching, to_schedule_timeout_of_type,
};
pub use predicate::{Predicate, PredicateOptions, PredicateScope};
pub use satisfy::SatisfyT;

use crate::Result;

type RepeatFactory = Arc<dyn Fn(usize) -> Expectation + Send + Sync>;
type SatisfyFn = Arc<dyn Fn(&mut SatisfyT) + Send + Sync>;

/// A declarative description of required behavior.
#[derive(Clone)]
pub struct Expectation(Kind);

#[derive(Clone)]
enum Kind {
    AllOf(Vec<Expectation>),
    AnyOf(Vec<Expectation>),
    NoneOf(Vec<Expectation>),
    Not(Box<Expectation>),
    Repeat {
        description: String,
        count: usize,
        factory: RepeatFactory,
    },
    Satisfy {
        description: String,
        func: SatisfyFn,
    },
    Message(message::MessageExpectation),
}

impl Expectation {
    /// One-line imperative summary, used in headings and reports.
    pub fn caption(&self) -> String {
        match &self.0 {
            Kind::AllOf(children) if children.len() == 1 => children[0].caption(),
            Kind::AllOf(_) => "all of".to_owned(),
            Kind::AnyOf(children) if children.len() == 1 => children[0].caption(),
            Kind::AnyOf(_) => "any of".to_owned(),
            Kind::NoneOf(_) => "none of".to_owned(),
            Kind::Not(child) => not::negate(&child.caption()),
            Kind::Repeat { description, .. } | Kind::Satisfy { description, .. } => description.clone(),
            Kind::Message(m) => m.caption(),
        }
    }

    /// Compiles the expectation into a predicate.
    ///
    /// Fails if a message expectation refers to a message the application
    /// can never produce as expected.
    pub fn predicate(&self, scope: &PredicateScope) -> Result<Box<dyn Predicate>> {
        match &self.0 {
            Kind::AllOf(children) => Ok(Box::new(composite::AllOf::new(compile(children, scope)?))),
            Kind::AnyOf(children) => Ok(Box::new(composite::AnyOf::new(compile(children, scope)?))),
            Kind::NoneOf(children) => Ok(Box::new(composite::NoneOf::new(compile(children, scope)?))),
            Kind::Not(child) => Ok(Box::new(not::NotPredicate::new(
                self.caption(),
                child.predicate(scope)?,
            ))),
            Kind::Repeat {
                description,
                count,
                factory,
            } => {
                let children = (0..*count)
                    .map(|i| factory(i).predicate(scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(repeat::RepeatPredicate::new(description.clone(), children)))
            }
            Kind::Satisfy { description, func } => Ok(Box::new(satisfy::SatisfyPredicate::new(
                description.clone(),
                func.clone(),
            ))),
            Kind::Message(m) => m.predicate(scope),
        }
    }
}

fn compile(children: &[Expectation], scope: &PredicateScope) -> Result<Vec<Box<dyn Predicate>>> {
    children.iter().map(|c| c.predicate(scope)).collect()
}

fn collect_children(constructor: &str, children: impl IntoIterator<Item = Expectation>) -> Vec<Expectation> {
    let children: Vec<_> = children.into_iter().collect();
    if children.is_empty() {
        panic!("{constructor}(): at least one child expectation must be provided");
    }
    children
}

/// Passes if every child passes.
///
/// # Panics
///
/// Panics if `children` is empty.
pub fn all_of(children: impl IntoIterator<Item = Expectation>) -> Expectation {
    Expectation(Kind::AllOf(collect_children("all_of", children)))
}

/// Passes if at least one child passes.
///
/// # Panics
///
/// Panics if `children` is empty.
pub fn any_of(children: impl IntoIterator<Item = Expectation>) -> Expectation {
    Expectation(Kind::AnyOf(collect_children("any_of", children)))
}

/// Passes if no child passes.
///
/// # Panics
///
/// Panics if `children` is empty.
pub fn none_of(children: impl IntoIterator<Item = Expectation>) -> Expectation {
    Expectation(Kind::NoneOf(collect_children("none_of", children)))
}

/// Passes if `expectation` fails.
pub fn not(expectation: Expectation) -> Expectation {
    Expectation(Kind::Not(Box::new(expectation)))
}

/// Passes if each of the `count` expectations built by `factory` passes.
/// `factory` is called with the iteration index, from `0` to `count - 1`.
///
/// # Panics
///
/// Panics if `description` is empty or `count` is zero.
pub fn repeat(
    description: &str,
    count: usize,
    factory: impl Fn(usize) -> Expectation + Send + Sync + 'static,
) -> Expectation {
    if description.is_empty() {
        panic!("repeat(): description must not be empty");
    }
    if count == 0 {
        panic!("repeat({description:?}): count must be greater than zero");
    }
    Expectation(Kind::Repeat {
        description: description.to_owned(),
        count,
        factory: Arc::new(factory),
    })
}

/// A user-defined expectation.
///
/// `func` is called once the action has completed, with a [`SatisfyT`] that
/// exposes the facts the action produced and assertion primitives in the
/// style of a test runner.
///
/// ```rust,ignore
/// satisfy("record exactly two events", |t| {
///     let n = t.facts().iter().filter(|f| matches!(f, Fact::EventRecordedByAggregate { .. })).count();
///     if n != 2 {
///         t.error(format!("recorded {n} events"));
///     }
/// })
/// ```
///
/// # Panics
///
/// Panics if `description` is empty.
pub fn satisfy(
    description: &str,
    func: impl Fn(&mut SatisfyT) + Send + Sync + 'static,
) -> Expectation {
    if description.is_empty() {
        panic!("satisfy(): description must not be empty");
    }
    Expectation(Kind::Satisfy {
        description: description.to_owned(),
        func: Arc::new(func),
    })
}
