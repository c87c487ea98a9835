use crate::{
    Fact,
    expectation::Predicate,
    report::{Report, ReportGenerationContext},
};

/// Passes when every iteration passes. Only the first failing iteration is
/// reported.
pub(crate) struct RepeatPredicate {
    criteria: String,
    children: Vec<Box<dyn Predicate>>,
}

impl RepeatPredicate {
    pub fn new(criteria: String, children: Vec<Box<dyn Predicate>>) -> Self {
        Self { criteria, children }
    }
}

impl Predicate for RepeatPredicate {
    fn notify(&mut self, fact: &Fact) {
        for child in &mut self.children {
            child.notify(fact);
        }
    }

    fn ok(&self) -> bool {
        self.children.iter().all(|c| c.ok())
    }

    fn done(&mut self) {
        for child in &mut self.children {
            child.done();
        }
    }

    fn report(&self, ctx: ReportGenerationContext) -> Report {
        let failed: Vec<usize> = (0..self.children.len()).filter(|i| !self.children[*i].ok()).collect();
        let mut report = Report::new(ctx, failed.is_empty(), self.criteria.clone());
        if let Some(&first) = failed.first() {
            report.outcome = format!(
                "{} of {} iterations failed, iteration #{first} shown",
                failed.len(),
                self.children.len()
            );
            report.append(self.children[first].report(ctx));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixed;

    #[test]
    fn only_the_first_failure_is_reported() {
        let children: Vec<Box<dyn Predicate>> = [true, false, true, false]
            .iter()
            .map(|ok| Box::new(Fixed::new("iteration", *ok)) as Box<dyn Predicate>)
            .collect();
        let p = RepeatPredicate::new("repeat".into(), children);
        assert!(!p.ok());

        let report = p.report(ReportGenerationContext::default());
        assert_eq!(report.outcome, "2 of 4 iterations failed, iteration #1 shown");
        assert_eq!(report.sub_reports.len(), 1);
    }
}
