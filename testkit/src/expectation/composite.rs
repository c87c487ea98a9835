use crate::{
    Fact,
    expectation::Predicate,
    report::{Report, ReportGenerationContext},
};

/// Passes when every child passes.
pub(crate) struct AllOf {
    children: Vec<Box<dyn Predicate>>,
}

impl AllOf {
    pub fn new(children: Vec<Box<dyn Predicate>>) -> Self {
        Self { children }
    }
}

impl Predicate for AllOf {
    fn notify(&mut self, fact: &Fact) {
        notify_all(&mut self.children, fact);
    }

    fn ok(&self) -> bool {
        self.children.iter().all(|c| c.ok())
    }

    fn done(&mut self) {
        done_all(&mut self.children);
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        if let [only] = self.children.as_slice() {
            return only.report(ctx);
        }
        let failed = self.children.iter().filter(|c| !c.ok()).count();
        let mut report = Report::new(ctx, failed == 0, "all of");
        if failed > 0 {
            report.outcome = format!("{failed} of the expectations failed");
        }
        append_children(&mut report, &self.children, ctx);
        report
    }
}

/// Passes when at least one child passes.
pub(crate) struct AnyOf {
    children: Vec<Box<dyn Predicate>>,
}

impl AnyOf {
    pub fn new(children: Vec<Box<dyn Predicate>>) -> Self {
        Self { children }
    }
}

impl Predicate for AnyOf {
    fn notify(&mut self, fact: &Fact) {
        notify_all(&mut self.children, fact);
    }

    fn ok(&self) -> bool {
        self.children.iter().any(|c| c.ok())
    }

    fn done(&mut self) {
        done_all(&mut self.children);
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        if let [only] = self.children.as_slice() {
            return only.report(ctx);
        }
        let ok = self.ok();
        let mut report = Report::new(ctx, ok, "any of");
        if !ok {
            report.outcome = format!("none of the {} expectations passed", self.children.len());
        }
        append_children(&mut report, &self.children, ctx);
        report
    }
}

/// Passes when no child passes. Children are reported with inverted polarity.
pub(crate) struct NoneOf {
    children: Vec<Box<dyn Predicate>>,
}

impl NoneOf {
    pub fn new(children: Vec<Box<dyn Predicate>>) -> Self {
        Self { children }
    }
}

impl Predicate for NoneOf {
    fn notify(&mut self, fact: &Fact) {
        notify_all(&mut self.children, fact);
    }

    fn ok(&self) -> bool {
        !self.children.iter().any(|c| c.ok())
    }

    fn done(&mut self) {
        done_all(&mut self.children);
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let passed = self.children.iter().filter(|c| c.ok()).count();
        let mut report = Report::new(ctx, passed == 0, "none of");
        if passed > 0 {
            report.outcome = format!("{passed} of the expectations passed unexpectedly");
        }
        append_children(&mut report, &self.children, ctx.inverted());
        report
    }
}

fn notify_all(children: &mut [Box<dyn Predicate>], fact: &Fact) {
    for child in children {
        child.notify(fact);
    }
}

fn done_all(children: &mut [Box<dyn Predicate>]) {
    for child in children {
        child.done();
    }
}

fn append_children(report: &mut Report, children: &[Box<dyn Predicate>], ctx: ReportGenerationContext) {
    for child in children {
        report.append(child.report(ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixed;

    fn fixed(results: &[bool]) -> Vec<Box<dyn Predicate>> {
        results
            .iter()
            .enumerate()
            .map(|(i, ok)| Box::new(Fixed::new(&format!("child {i}"), *ok)) as Box<dyn Predicate>)
            .collect()
    }

    #[test]
    fn all_of_requires_every_child() {
        assert!(AllOf::new(fixed(&[true, true])).ok());
        let p = AllOf::new(fixed(&[true, false, false]));
        assert!(!p.ok());
        assert_eq!(p.report(ReportGenerationContext::default()).outcome, "2 of the expectations failed");
    }

    #[test]
    fn all_of_with_one_child_renders_the_child() {
        let p = AllOf::new(fixed(&[false]));
        assert_eq!(p.report(ReportGenerationContext::default()).criteria, "child 0");
    }

    #[test]
    fn any_of_requires_one_child() {
        assert!(AnyOf::new(fixed(&[false, true])).ok());
        let p = AnyOf::new(fixed(&[false, false, false]));
        assert!(!p.ok());
        assert_eq!(
            p.report(ReportGenerationContext::default()).outcome,
            "none of the 3 expectations passed"
        );
    }

    #[test]
    fn none_of_inverts_its_children() {
        assert!(NoneOf::new(fixed(&[false, false])).ok());
        let p = NoneOf::new(fixed(&[true, false]));
        assert!(!p.ok());
        let report = p.report(ReportGenerationContext::default());
        assert_eq!(report.outcome, "1 of the expectations passed unexpectedly");
        assert!(report.sub_reports.iter().all(|r| r.explanation.is_empty()));
    }
}
