//! Explanations and suggestions shared by the message predicates.

use crate::{
    Envelope, MessageKind, MessageType,
    inflect::{inflect, produce},
    report::Report,
};

use super::tracker::Tracker;

/// Who produced the envelope, for use in explanations.
pub(super) fn producer(envelope: &Envelope) -> String {
    match envelope.origin() {
        Some(origin) => format!(
            "the '{}' {} message handler",
            origin.handler(),
            origin.handler_type()
        ),
        None => match envelope.kind() {
            MessageKind::Command => "the command executor".to_owned(),
            MessageKind::Event => "the event recorder".to_owned(),
            MessageKind::Timeout => "the test".to_owned(),
        },
    }
}

/// Explains why nothing satisfied the predicate, given only the tracker.
/// `expected` names what was looked for, such as "the expected <message>".
pub(super) fn explain_no_match(report: &mut Report, tracker: &Tracker, expected: &str) {
    let kind = tracker.kind;
    let explanation = if !tracker.cycle_begun {
        if tracker.options.match_dispatch_cycle_started_facts {
            "the user-defined function did not dispatch any messages".to_owned()
        } else {
            "no dispatch or tick cycle was started".to_owned()
        }
    } else if tracker.total == 0 {
        "no messages were produced at all".to_owned()
    } else if tracker.produced == 0 {
        inflect(kind, "no <messages> were <produced> at all")
    } else if tracker.options.match_dispatch_cycle_started_facts {
        inflect(kind, &format!("nothing <produced> {expected}"))
    } else {
        inflect(kind, &format!("none of the engaged handlers <produced> {expected}"))
    };
    report.set_explanation(explanation);
    suggest_common(report, tracker);
}

/// Suggestions that apply whenever the expected message was not found, in
/// canonical order: disabled handler types, engaged handlers, user code.
pub(super) fn suggest_common(report: &mut Report, tracker: &Tracker) {
    let kind = tracker.kind;
    let mut disabled = false;
    for (handler_type, enabled) in &tracker.enabled {
        if !enabled && tracker.app().has_producer_of_type(*handler_type, kind) {
            disabled = true;
            report.suggest(format!(
                "enable {handler_type} handlers using the enable_handler_type() method"
            ));
        }
    }

    for (handler, handler_type) in &tracker.engaged {
        report.suggest(format!(
            "verify the logic within the '{handler}' {handler_type} message handler"
        ));
    }

    if tracker.options.match_dispatch_cycle_started_facts {
        report.suggest("verify the logic within the user-defined function");
    } else if tracker.engaged.is_empty() && !disabled {
        report.suggest(format!(
            "check the application's routing configuration, no handler that can {} {} was engaged",
            produce(kind),
            kind.indefinite()
        ));
    }
}

/// Points out that the expected and actual types differ by pointer layers.
pub(super) fn suggest_pointer(report: &mut Report, expected: &MessageType, actual: &MessageType) {
    if expected.pointer_depth() > actual.pointer_depth() {
        report.suggest("check the message type, should it be a pointer?");
    } else {
        report.suggest("check the message type, should it be a non-pointer?");
    }
}
