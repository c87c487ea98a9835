use std::sync::Arc;

use crate::{
    AnyMessage, Envelope, Fact, MessageKind, MessageType,
    compare::{Comparator, TypeDistance, is_superset, type_distance},
    expectation::Predicate,
    inflect::inflect,
    message,
    report::{MESSAGE_DIFF, Report, ReportGenerationContext, word_diff},
};

use super::{
    explain::{explain_no_match, producer, suggest_pointer},
    tracker::Tracker,
};

/// How produced messages are compared with the expected one.
pub(super) enum Comparison {
    Equal(Arc<dyn Comparator>),
    /// The produced message must contain everything the expected one specifies.
    Like,
}

impl Comparison {
    fn matches(&self, actual: &dyn AnyMessage, expected: &dyn AnyMessage) -> bool {
        match self {
            Comparison::Equal(comparator) => comparator.equal(actual, expected),
            Comparison::Like => is_superset(actual, expected),
        }
    }
}

/// The produced message most similar to the expected one.
struct BestMatch {
    envelope: Envelope,
    distance: TypeDistance,
    equal: bool,
}

/// Passes once a produced message of the expected kind matches the expected
/// message.
pub(super) struct MessagePredicate {
    criteria: String,
    kind: MessageKind,
    expected: Arc<dyn AnyMessage>,
    expected_type: MessageType,
    comparison: Comparison,
    ok: bool,
    best: Option<BestMatch>,
    tracker: Tracker,
}

impl MessagePredicate {
    pub fn new(
        criteria: String,
        expected: Arc<dyn AnyMessage>,
        comparison: Comparison,
        tracker: Tracker,
    ) -> Self {
        Self {
            criteria,
            kind: tracker.kind,
            expected_type: expected.type_of(),
            expected,
            comparison,
            ok: false,
            best: None,
            tracker,
        }
    }

    fn best_distance(&self) -> TypeDistance {
        self.best.as_ref().map_or(TypeDistance::Unrelated, |b| b.distance)
    }
}

impl Predicate for MessagePredicate {
    fn notify(&mut self, fact: &Fact) {
        let Some(envelope) = self.tracker.notify(fact) else {
            return;
        };
        if self.ok {
            return;
        }

        let equal = self
            .comparison
            .matches(envelope.message().as_ref(), self.expected.as_ref());
        if equal && envelope.kind() == self.kind {
            self.ok = true;
            return;
        }

        let distance = type_distance(&self.expected_type, &envelope.message_type());
        if distance < self.best_distance() {
            self.best = Some(BestMatch {
                envelope: envelope.clone(),
                distance,
                equal,
            });
        }
    }

    fn ok(&self) -> bool {
        self.ok
    }

    fn done(&mut self) {}

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let mut report = Report::new(ctx, self.ok, self.criteria.clone());
        if ctx.omits_detail(self.ok) {
            return report;
        }

        let Some(best) = &self.best else {
            explain_no_match(&mut report, &self.tracker, "the expected <message>");
            return report;
        };

        let actual_type = best.envelope.message_type();
        if best.distance == TypeDistance::Identical {
            if best.envelope.kind() == self.kind {
                report.set_explanation(inflect(
                    self.kind,
                    &format!("a similar <message> was <produced> by {}", producer(&best.envelope)),
                ));
                report.suggest("check the content of the message");
            } else {
                report.set_explanation(format!(
                    "a '{actual_type}' message was produced as {} by {}",
                    best.envelope.kind().indefinite(),
                    producer(&best.envelope)
                ));
            }
        } else {
            report.set_explanation(inflect(
                self.kind,
                &format!(
                    "a <message> of a similar type was <produced> by {}",
                    producer(&best.envelope)
                ),
            ));
            suggest_pointer(&mut report, &self.expected_type, &actual_type);
        }

        if best.envelope.kind() == self.kind && !best.equal {
            report.section(MESSAGE_DIFF).append(&word_diff(
                &message::render(self.expected.as_ref()),
                &message::render(best.envelope.message().as_ref()),
            ));
        }
        report
    }
}
