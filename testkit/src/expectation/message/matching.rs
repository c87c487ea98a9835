use crate::{
    Fact,
    expectation::Predicate,
    inflect::{inflect, messages},
    report::{FAILED_MATCHES, Report, ReportGenerationContext},
};

use super::{
    MatchError, MatchFn,
    explain::{explain_no_match, suggest_common},
    tracker::Tracker,
};

/// A distinct reason a message did not match, with how often it occurred.
struct FailedMatch {
    message_type: String,
    reason: String,
    count: usize,
}

#[derive(Default)]
struct Failures(Vec<FailedMatch>);

impl Failures {
    fn record(&mut self, message_type: String, reason: String) {
        match self
            .0
            .iter_mut()
            .find(|f| f.message_type == message_type && f.reason == reason)
        {
            Some(existing) => existing.count += 1,
            None => self.0.push(FailedMatch {
                message_type,
                reason,
                count: 1,
            }),
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn write_section(&self, report: &mut Report) {
        let section = report.section(FAILED_MATCHES);
        for f in &self.0 {
            if f.count > 1 {
                section.append_list_item(&format!(
                    "{}: {} (repeated {} times)",
                    f.message_type, f.reason, f.count
                ));
            } else {
                section.append_list_item(&format!("{}: {}", f.message_type, f.reason));
            }
        }
    }
}

/// Passes once any produced message of the expected kind satisfies the
/// user's function.
pub(super) struct MatchingPredicate {
    criteria: String,
    func: MatchFn,
    ok: bool,
    ignored: usize,
    failures: Failures,
    tracker: Tracker,
}

impl MatchingPredicate {
    pub fn new(criteria: String, func: MatchFn, tracker: Tracker) -> Self {
        Self {
            criteria,
            func,
            ok: false,
            ignored: 0,
            failures: Failures::default(),
            tracker,
        }
    }
}

impl Predicate for MatchingPredicate {
    fn notify(&mut self, fact: &Fact) {
        let Some(envelope) = self.tracker.notify(fact) else {
            return;
        };
        if self.ok || envelope.kind() != self.tracker.kind {
            return;
        }
        match (self.func)(envelope.message().as_ref()) {
            Ok(()) => self.ok = true,
            Err(MatchError::IgnoreMessage) => self.ignored += 1,
            Err(MatchError::Mismatch(reason)) => {
                self.failures.record(envelope.message_type().to_string(), reason)
            }
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

        let kind = self.tracker.kind;
        if self.failures.is_empty() {
            if self.ignored > 0 {
                report.set_explanation(inflect(
                    kind,
                    &format!(
                        "all {} of the <produced> <messages> were ignored by the predicate function",
                        self.ignored
                    ),
                ));
                suggest_common(&mut report, &self.tracker);
            } else {
                explain_no_match(&mut report, &self.tracker, "a matching <message>");
            }
            return report;
        }

        report.set_explanation(inflect(
            kind,
            "none of the <produced> <messages> satisfied the predicate function",
        ));
        report.suggest("check the failed matches below");
        suggest_common(&mut report, &self.tracker);
        self.failures.write_section(&mut report);
        report
    }
}

/// Passes as long as every relevant produced message of the expected kind
/// satisfies the user's function. Messages the function ignores are not
/// relevant.
pub(super) struct OnlyMatchingPredicate {
    criteria: String,
    func: MatchFn,
    relevant: usize,
    matched: usize,
    failures: Failures,
    tracker: Tracker,
}

impl OnlyMatchingPredicate {
    pub fn new(criteria: String, func: MatchFn, tracker: Tracker) -> Self {
        Self {
            criteria,
            func,
            relevant: 0,
            matched: 0,
            failures: Failures::default(),
            tracker,
        }
    }
}

impl Predicate for OnlyMatchingPredicate {
    fn notify(&mut self, fact: &Fact) {
        let Some(envelope) = self.tracker.notify(fact) else {
            return;
        };
        if envelope.kind() != self.tracker.kind {
            return;
        }
        match (self.func)(envelope.message().as_ref()) {
            Ok(()) => {
                self.relevant += 1;
                self.matched += 1;
            }
            Err(MatchError::IgnoreMessage) => {}
            Err(MatchError::Mismatch(reason)) => {
                self.relevant += 1;
                self.failures.record(envelope.message_type().to_string(), reason);
            }
        }
    }

    fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn done(&mut self) {}

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let ok = self.ok();
        let kind = self.tracker.kind;
        let mut report = Report::new(ctx, ok, self.criteria.clone());
        if !ok {
            report.outcome = format!(
                "{} of {} relevant {} matched",
                self.matched,
                self.relevant,
                messages(kind)
            );
        }
        if ctx.omits_detail(ok) {
            return report;
        }

        report.set_explanation(inflect(
            kind,
            &format!(
                "{} of the relevant <messages> did not satisfy the predicate function",
                self.relevant - self.matched
            ),
        ));
        report.suggest("check the failed matches below");
        suggest_common(&mut report, &self.tracker);
        self.failures.write_section(&mut report);
        report
    }
}
