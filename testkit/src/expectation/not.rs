use crate::{
    Fact,
    expectation::Predicate,
    report::{Report, ReportGenerationContext},
};

const NEGATION: &str = "do not ";

/// Prefixes `criteria` with "do not ", or removes the prefix if already negated.
pub(crate) fn negate(criteria: &str) -> String {
    match criteria.strip_prefix(NEGATION) {
        Some(rest) => rest.to_owned(),
        None => format!("{NEGATION}{criteria}"),
    }
}

/// Passes when its child fails.
pub(crate) struct NotPredicate {
    criteria: String,
    child: Box<dyn Predicate>,
}

impl NotPredicate {
    pub fn new(criteria: String, child: Box<dyn Predicate>) -> Self {
        Self { criteria, child }
    }
}

impl Predicate for NotPredicate {
    fn notify(&mut self, fact: &Fact) {
        self.child.notify(fact);
    }

    fn ok(&self) -> bool {
        !self.child.ok()
    }

    fn done(&mut self) {
        self.child.done();
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let child = self.child.report(ctx.inverted());
        Report {
            tree_ok: ctx.tree_ok,
            ok: self.ok(),
            criteria: self.criteria.clone(),
            ..child
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixed;

    #[test]
    fn negation_flips_the_outcome() {
        let p = NotPredicate::new(negate("pass"), Box::new(Fixed::new("pass", true)));
        assert!(!p.ok());
        let report = p.report(ReportGenerationContext::default());
        assert_eq!(report.criteria, "do not pass");
        assert!(!report.ok);
    }

    #[test]
    fn double_negation_is_idempotent() {
        let ctx = ReportGenerationContext::default();
        let plain = Fixed::new("record", false).with_explanation("nothing happened");
        let inner = NotPredicate::new(negate("record"), Box::new(plain.clone()));
        let outer = NotPredicate::new(negate(&negate("record")), Box::new(inner));

        let expected = plain.report(ctx);
        let actual = outer.report(ctx);
        assert_eq!(outer.ok(), plain.ok());
        assert_eq!(actual.ok, expected.ok);
        assert_eq!(actual.outcome, expected.outcome);
        assert_eq!(actual.explanation, expected.explanation);
        assert_eq!(actual.criteria, expected.criteria);
    }
}
