//! Expectations about the messages an action causes the application to
//! produce.

mod exact;
mod explain;
mod matching;
mod of_type;
mod tracker;

use std::sync::Arc;

use crate::{
    AnyMessage, Error, Message, MessageKind, MessageType, Result,
    expectation::{Expectation, Kind, Predicate, PredicateScope},
    inflect::{inflect, produced},
};

use exact::{Comparison, MessagePredicate};
use matching::{MatchingPredicate, OnlyMatchingPredicate};
use of_type::TypePredicate;
use tracker::Tracker;

/// The result of a matching function that did not match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The message is not relevant to the expectation. It counts neither as
    /// a match nor as a failure.
    #[error("message ignored")]
    IgnoreMessage,

    /// The message is relevant but does not match, for the given reason.
    #[error("{0}")]
    Mismatch(String),
}

impl MatchError {
    pub fn mismatch(reason: impl Into<String>) -> Self {
        MatchError::Mismatch(reason.into())
    }
}

impl From<&str> for MatchError {
    fn from(reason: &str) -> Self {
        MatchError::Mismatch(reason.to_owned())
    }
}

impl From<String> for MatchError {
    fn from(reason: String) -> Self {
        MatchError::Mismatch(reason)
    }
}

pub(super) type MatchFn = Arc<dyn Fn(&dyn AnyMessage) -> std::result::Result<(), MatchError> + Send + Sync>;

#[derive(Clone)]
pub(super) struct MessageExpectation {
    kind: MessageKind,
    criterion: Criterion,
}

#[derive(Clone)]
enum Criterion {
    Exact(Arc<dyn AnyMessage>),
    Like(Arc<dyn AnyMessage>),
    OfType(MessageType),
    Matching {
        description: String,
        message_type: MessageType,
        func: MatchFn,
    },
    OnlyMatching {
        description: String,
        message_type: MessageType,
        func: MatchFn,
    },
}

impl Criterion {
    fn message_type(&self) -> MessageType {
        match self {
            Criterion::Exact(m) | Criterion::Like(m) => m.type_of(),
            Criterion::OfType(t) => t.clone(),
            Criterion::Matching { message_type, .. } | Criterion::OnlyMatching { message_type, .. } => {
                message_type.clone()
            }
        }
    }
}

impl MessageExpectation {
    pub fn caption(&self) -> String {
        let template = match &self.criterion {
            Criterion::Exact(m) => format!("<produce> a specific '{}' <message>", m.type_of()),
            Criterion::Like(m) => format!("<produce> a '{}' <message> like the one given", m.type_of()),
            Criterion::OfType(t) => format!("<produce> any '{t}' <message>"),
            Criterion::Matching { description, .. } => format!("<produce> a <message> that {description}"),
            Criterion::OnlyMatching { description, .. } => {
                format!("only <produce> <messages> that {description}")
            }
        };
        inflect(self.kind, &template)
    }

    pub fn predicate(&self, scope: &PredicateScope) -> Result<Box<dyn Predicate>> {
        self.validate(scope)?;

        let caption = self.caption();
        let tracker = Tracker::new(self.kind, scope.app.clone(), scope.options);
        Ok(match &self.criterion {
            Criterion::Exact(m) => Box::new(MessagePredicate::new(
                caption,
                m.clone(),
                Comparison::Equal(scope.comparator.clone()),
                tracker,
            )),
            Criterion::Like(m) => Box::new(MessagePredicate::new(caption, m.clone(), Comparison::Like, tracker)),
            Criterion::OfType(t) => Box::new(TypePredicate::new(caption, t.clone(), tracker)),
            Criterion::Matching { func, .. } => Box::new(MatchingPredicate::new(caption, func.clone(), tracker)),
            Criterion::OnlyMatching { func, .. } => {
                Box::new(OnlyMatchingPredicate::new(caption, func.clone(), tracker))
            }
        })
    }

    /// Checks that the application can produce the expected message as the
    /// expected kind.
    fn validate(&self, scope: &PredicateScope) -> Result<()> {
        let expected = self.criterion.message_type();
        let app = &scope.app;

        let (used, kind) = match app.kind_of(&expected) {
            Some(kind) => (expected.clone(), kind),
            None => app
                .closest_type(&expected)
                .and_then(|t| app.kind_of(t).map(|k| (t.clone(), k)))
                .ok_or_else(|| {
                    Error::expectation(inflect(
                        self.kind,
                        &format!(
                            "a '{expected}' <message> can never be <produced>, the application does not use this message type"
                        ),
                    ))
                })?,
        };

        if kind != self.kind {
            return Err(Error::expectation(format!(
                "'{used}' is configured as {}, it can never be {} as {}",
                kind.indefinite(),
                produced(self.kind),
                self.kind.indefinite()
            )));
        }

        if !scope.options.match_dispatch_cycle_started_facts && !app.is_produced(&used) {
            return Err(Error::expectation(inflect(
                self.kind,
                &format!("no handlers <produce> '{used}' <messages>, they are only ever consumed"),
            )));
        }
        Ok(())
    }
}

fn expect(kind: MessageKind, criterion: Criterion) -> Expectation {
    Expectation(Kind::Message(MessageExpectation { kind, criterion }))
}

fn exact<M: Message>(constructor: &str, kind: MessageKind, message: M) -> Expectation {
    if let Err(e) = message.validate() {
        panic!("{constructor}({}): invalid message: {e}", M::message_type());
    }
    expect(kind, Criterion::Exact(Arc::new(message)))
}

fn like<M: Message>(kind: MessageKind, message: M) -> Expectation {
    expect(kind, Criterion::Like(Arc::new(message)))
}

fn matching<M, F>(constructor: &str, kind: MessageKind, only: bool, description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    if description.is_empty() {
        panic!("{constructor}(): description must not be empty");
    }
    let func: MatchFn = Arc::new(move |message: &dyn AnyMessage| match message.downcast_ref::<M>() {
        Some(m) => func(m),
        None => Err(MatchError::IgnoreMessage),
    });
    let description = description.to_owned();
    let message_type = M::message_type();
    let criterion = if only {
        Criterion::OnlyMatching {
            description,
            message_type,
            func,
        }
    } else {
        Criterion::Matching {
            description,
            message_type,
            func,
        }
    };
    expect(kind, criterion)
}

/// Passes if a command equal to `command` is executed.
///
/// # Panics
///
/// Panics if `command` is not valid.
pub fn to_execute_command<M: Message>(command: M) -> Expectation {
    exact("to_execute_command", MessageKind::Command, command)
}

/// Passes if an event equal to `event` is recorded.
///
/// # Panics
///
/// Panics if `event` is not valid.
pub fn to_record_event<M: Message>(event: M) -> Expectation {
    exact("to_record_event", MessageKind::Event, event)
}

/// Passes if a timeout equal to `timeout` is scheduled.
///
/// # Panics
///
/// Panics if `timeout` is not valid.
pub fn to_schedule_timeout<M: Message>(timeout: M) -> Expectation {
    exact("to_schedule_timeout", MessageKind::Timeout, timeout)
}

/// Passes if an executed command contains every non-zero field of `command`.
/// The partial `command` is not validated.
pub fn to_execute_command_like<M: Message>(command: M) -> Expectation {
    like(MessageKind::Command, command)
}

/// Passes if a recorded event contains every non-zero field of `event`.
/// The partial `event` is not validated.
pub fn to_record_event_like<M: Message>(event: M) -> Expectation {
    like(MessageKind::Event, event)
}

/// Passes if a scheduled timeout contains every non-zero field of `timeout`.
pub fn to_schedule_timeout_like<M: Message>(timeout: M) -> Expectation {
    like(MessageKind::Timeout, timeout)
}

/// Passes if any command of type `M` is executed.
pub fn to_execute_command_of_type<M: Message>() -> Expectation {
    expect(MessageKind::Command, Criterion::OfType(M::message_type()))
}

/// Passes if any event of type `M` is recorded.
pub fn to_record_event_of_type<M: Message>() -> Expectation {
    expect(MessageKind::Event, Criterion::OfType(M::message_type()))
}

/// Passes if any timeout of type `M` is scheduled.
pub fn to_schedule_timeout_of_type<M: Message>() -> Expectation {
    expect(MessageKind::Timeout, Criterion::OfType(M::message_type()))
}

/// Passes if an executed command of type `M` satisfies `func`.
///
/// `func` returns `Ok(())` for a match, [`MatchError::IgnoreMessage`] for a
/// message that is not relevant, or a [`MatchError::Mismatch`] explaining
/// why the message does not match.
///
/// ```rust,ignore
/// to_execute_command_matching("debits the account", |cmd: &Debit| {
///     if cmd.amount > 0 { Ok(()) } else { Err("amount must be positive".into()) }
/// })
/// ```
///
/// # Panics
///
/// Panics if `description` is empty.
pub fn to_execute_command_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_execute_command_matching", MessageKind::Command, false, description, func)
}

/// Passes if a recorded event of type `M` satisfies `func`.
///
/// # Panics
///
/// Panics if `description` is empty.
pub fn to_record_event_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_record_event_matching", MessageKind::Event, false, description, func)
}

/// Passes if a scheduled timeout of type `M` satisfies `func`.
pub fn to_schedule_timeout_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_schedule_timeout_matching", MessageKind::Timeout, false, description, func)
}

/// Passes if every relevant executed command satisfies `func`. Commands of
/// other types, and those for which `func` returns
/// [`MatchError::IgnoreMessage`], are not relevant. Passes when no command
/// is relevant.
///
/// # Panics
///
/// Panics if `description` is empty.
pub fn to_only_execute_commands_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_only_execute_commands_matching", MessageKind::Command, true, description, func)
}

/// Passes if every relevant recorded event satisfies `func`.
///
/// # Panics
///
/// Panics if `description` is empty.
pub fn to_only_record_events_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_only_record_events_matching", MessageKind::Event, true, description, func)
}

/// Passes if every relevant scheduled timeout satisfies `func`.
pub fn to_only_schedule_timeouts_matching<M, F>(description: &str, func: F) -> Expectation
where
    M: Message,
    F: Fn(&M) -> std::result::Result<(), MatchError> + Send + Sync + 'static,
{
    matching("to_only_schedule_timeouts_matching", MessageKind::Timeout, true, description, func)
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        Engine, Fact, HandlerType, OperationOption,
        compare::DefaultComparator,
        enable_handler_type,
        expectation::PredicateOptions,
        fixtures::{App, CmdA, CmdMany, EvtA, EvtB},
        report::{FAILED_MATCHES, MESSAGE_DIFF, Report, ReportGenerationContext, SUGGESTIONS},
        with_observer,
    };

    fn scope(engine: &Engine, options: PredicateOptions) -> PredicateScope {
        PredicateScope {
            app: engine.config().clone(),
            comparator: Arc::new(DefaultComparator),
            options,
        }
    }

    /// Dispatches `message` and evaluates `expectation` against the facts.
    fn evaluate(
        expectation: Expectation,
        message: impl Message,
        mut options: Vec<OperationOption>,
    ) -> (bool, Report) {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let mut predicate = expectation
            .predicate(&scope(&engine, PredicateOptions::default()))
            .unwrap();

        let facts = Arc::new(Mutex::new(Vec::<Fact>::new()));
        let sink = facts.clone();
        options.push(with_observer(move |f: &Fact| sink.lock().push(f.clone())));
        engine
            .dispatch(&CancellationToken::new(), Arc::new(message), &options)
            .unwrap();

        for fact in facts.lock().iter() {
            predicate.notify(fact);
        }
        predicate.done();
        (predicate.ok(), predicate.report(ReportGenerationContext::default()))
    }

    fn section<'r>(report: &'r Report, title: &str) -> &'r str {
        report
            .sections
            .iter()
            .find(|s| s.title == title)
            .map_or("", |s| s.content.as_str())
    }

    #[test]
    fn captions_are_inflected_by_kind() {
        assert_eq!(to_record_event(EvtA { value: 1 }).caption(), "record a specific 'EvtA' event");
        assert_eq!(
            to_execute_command_like(CmdA { value: 0 }).caption(),
            "execute a 'CmdA' command like the one given"
        );
        assert_eq!(to_schedule_timeout_of_type::<EvtB>().caption(), "schedule any 'EvtB' timeout");
        assert_eq!(
            to_only_record_events_matching("are small", |_: &EvtA| Ok(())).caption(),
            "only record events that are small"
        );
    }

    #[test]
    fn exact_match_passes() {
        let (ok, _) = evaluate(to_record_event(EvtA { value: 1 }), CmdA { value: 1 }, vec![]);
        assert!(ok);
    }

    #[test]
    fn content_mismatch_is_explained_with_a_diff() {
        let (ok, report) = evaluate(to_record_event(EvtA { value: 2 }), CmdA { value: 1 }, vec![]);
        assert!(!ok);
        assert_eq!(
            report.explanation,
            "a similar event was recorded by the 'account' aggregate message handler"
        );
        assert!(section(&report, SUGGESTIONS).contains("• check the content of the message"));
        assert!(section(&report, MESSAGE_DIFF).contains("[-2-]{+1+}"));
    }

    #[test]
    fn pointer_mismatch_suggests_checking_the_type() {
        let expectation = to_record_event(Box::new(EvtA { value: 1 }));
        assert_eq!(expectation.caption(), "record a specific 'Box<EvtA>' event");

        let (ok, report) = evaluate(expectation, CmdA { value: 1 }, vec![]);
        assert!(!ok);
        assert_eq!(
            report.explanation,
            "an event of a similar type was recorded by the 'account' aggregate message handler"
        );
        assert!(section(&report, SUGGESTIONS).contains("• check the message type, should it be a pointer?"));
        assert!(section(&report, MESSAGE_DIFF).starts_with("[-Box::new(-]EvtA"));
    }

    #[test]
    fn like_ignores_zero_fields() {
        let (ok, _) = evaluate(to_record_event_like(EvtA { value: 0 }), CmdA { value: 7 }, vec![]);
        assert!(ok);
    }

    #[test]
    fn disabled_handler_types_are_suggested() {
        let (ok, report) = evaluate(
            to_record_event_of_type::<EvtB>(),
            CmdA { value: 1 },
            vec![enable_handler_type(HandlerType::Integration, false)],
        );
        assert!(!ok);
        assert_eq!(report.explanation, "none of the engaged handlers recorded the expected event");
        assert_eq!(
            section(&report, SUGGESTIONS),
            "• enable integration handlers using the enable_handler_type() method\n\
             • verify the logic within the 'account' aggregate message handler\n"
        );

        let (ok, _) = evaluate(to_record_event_of_type::<EvtB>(), CmdA { value: 1 }, vec![]);
        assert!(ok);
    }

    #[test]
    fn impossible_expectations_fail_to_compile() {
        let engine = Engine::new(Arc::new(App)).unwrap();
        let scope = scope(&engine, PredicateOptions::default());
        let error = |e: Expectation| e.predicate(&scope).err().map(|e| e.to_string()).unwrap_or_default();

        assert_eq!(
            error(to_execute_command(EvtA { value: 1 })),
            "invalid expectation: 'EvtA' is configured as an event, it can never be executed as a command"
        );
        assert_eq!(
            error(to_record_event_of_type::<crate::fixtures::Tagged>()),
            "invalid expectation: a 'Tagged' event can never be recorded, the application does not use this message type"
        );
        assert_eq!(
            error(to_execute_command_of_type::<CmdA>()),
            "invalid expectation: no handlers execute 'CmdA' commands, they are only ever consumed"
        );

        let lenient = PredicateScope {
            options: PredicateOptions {
                match_dispatch_cycle_started_facts: true,
            },
            ..scope.clone()
        };
        assert!(to_execute_command_of_type::<CmdA>().predicate(&lenient).is_ok());
    }

    #[test]
    fn failed_matches_are_grouped() {
        let positive = || {
            to_record_event_matching("has a positive value", |e: &EvtA| {
                if e.value > 0 { Ok(()) } else { Err("value is zero".into()) }
            })
        };

        let (ok, _) = evaluate(positive(), CmdMany { values: vec![0, 0, 5] }, vec![]);
        assert!(ok);

        let (ok, report) = evaluate(positive(), CmdMany { values: vec![0, 0] }, vec![]);
        assert!(!ok);
        assert_eq!(section(&report, FAILED_MATCHES), "• EvtA: value is zero (repeated 2 times)\n");
    }

    #[test]
    fn only_matching_counts_relevant_messages() {
        let small = to_only_record_events_matching("are small", |e: &EvtA| {
            if e.value < 10 {
                Ok(())
            } else {
                Err(MatchError::mismatch(format!("value {} is too large", e.value)))
            }
        });
        let (ok, report) = evaluate(small, CmdMany { values: vec![1, 20] }, vec![]);
        assert!(!ok);
        assert_eq!(report.outcome, "1 of 2 relevant events matched");
        assert_eq!(section(&report, FAILED_MATCHES), "• EvtA: value 20 is too large\n");
    }

    #[test]
    #[should_panic(expected = "to_record_event(EvtA): invalid message")]
    fn invalid_expected_messages_panic() {
        to_record_event(EvtA { value: -1 });
    }

    #[test]
    fn ignored_messages_are_not_relevant() {
        let small = || {
            to_only_record_events_matching("are small", |e: &EvtA| match e.value {
                1 => Err(MatchError::IgnoreMessage),
                v if v < 10 => Ok(()),
                v => Err(MatchError::mismatch(format!("value {v} is too large"))),
            })
        };

        let (ok, _) = evaluate(small(), CmdMany { values: vec![1, 1] }, vec![]);
        assert!(ok);

        let (ok, report) = evaluate(small(), CmdMany { values: vec![1, 1, 20] }, vec![]);
        assert!(!ok);
        assert_eq!(report.outcome, "0 of 1 relevant events matched");
        assert_eq!(section(&report, FAILED_MATCHES), "• EvtA: value 20 is too large\n");
    }

    #[test]
    fn first_best_match_wins_ties() {
        let (ok, report) = evaluate(to_record_event(EvtA { value: 9 }), CmdMany { values: vec![1, 2] }, vec![]);
        assert!(!ok);
        let diff = section(&report, MESSAGE_DIFF);
        assert!(diff.contains("[-9-]{+1+}"), "{diff}");
        assert!(!diff.contains("{+2+}"), "{diff}");
    }

    #[test]
    fn missing_cycles_are_explained() {
        let engine = Engine::new(Arc::new(App)).unwrap();
        let explain = |options: PredicateOptions| {
            let mut predicate = to_record_event(EvtA { value: 1 })
                .predicate(&scope(&engine, options))
                .unwrap();
            predicate.done();
            predicate.report(ReportGenerationContext::default()).explanation
        };

        assert_eq!(explain(PredicateOptions::default()), "no dispatch or tick cycle was started");
        assert_eq!(
            explain(PredicateOptions {
                match_dispatch_cycle_started_facts: true,
            }),
            "the user-defined function did not dispatch any messages"
        );
    }
}
