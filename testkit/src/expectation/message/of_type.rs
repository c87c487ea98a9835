use crate::{
    Envelope, Fact, MessageType,
    compare::{TypeDistance, type_distance},
    expectation::Predicate,
    inflect::inflect,
    report::{MESSAGE_TYPE_DIFF, Report, ReportGenerationContext, word_diff},
};

use super::{
    explain::{explain_no_match, producer, suggest_pointer},
    tracker::Tracker,
};

/// Passes once a message of the expected type and kind is produced,
/// regardless of its content.
pub(super) struct TypePredicate {
    criteria: String,
    expected: MessageType,
    ok: bool,
    best: Option<(Envelope, TypeDistance)>,
    tracker: Tracker,
}

impl TypePredicate {
    pub fn new(criteria: String, expected: MessageType, tracker: Tracker) -> Self {
        Self {
            criteria,
            expected,
            ok: false,
            best: None,
            tracker,
        }
    }
}

impl Predicate for TypePredicate {
    fn notify(&mut self, fact: &Fact) {
        let Some(envelope) = self.tracker.notify(fact) else {
            return;
        };
        if self.ok {
            return;
        }

        let actual = envelope.message_type();
        if actual == self.expected && envelope.kind() == self.tracker.kind {
            self.ok = true;
            return;
        }

        let distance = type_distance(&self.expected, &actual);
        let best = self.best.as_ref().map_or(TypeDistance::Unrelated, |(_, d)| *d);
        if distance < best {
            self.best = Some((envelope.clone(), distance));
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

        let Some((envelope, distance)) = &self.best else {
            explain_no_match(&mut report, &self.tracker, "the expected <message>");
            return report;
        };

        let actual = envelope.message_type();
        if *distance == TypeDistance::Identical {
            report.set_explanation(format!(
                "a '{actual}' message was produced as {} by {}",
                envelope.kind().indefinite(),
                producer(envelope)
            ));
            return report;
        }

        report.set_explanation(inflect(
            self.tracker.kind,
            &format!(
                "a <message> of a similar type was <produced> by {}",
                producer(envelope)
            ),
        ));
        suggest_pointer(&mut report, &self.expected, &actual);
        report
            .section(MESSAGE_TYPE_DIFF)
            .append(&word_diff(self.expected.name(), actual.name()));
        report
    }
}
