//! Human-readable explanation of an expectation's outcome.
//!
//! Every predicate produces a [`Report`] tree once the action has completed.
//! Reports are rendered with their `Display` implementation:
//!
//! ```text
//! ✗ record a specific 'EvtA' event
//!
//!   | EXPLANATION
//!   |     a similar event was recorded by the 'account' aggregate message handler
//!   |
//!   | SUGGESTIONS
//!   |     • check the content of the message
//! ```

mod diff;
mod render;

pub use diff::word_diff;

pub const SUGGESTIONS: &str = "Suggestions";
pub const MESSAGE_DIFF: &str = "Message Diff";
pub const MESSAGE_TYPE_DIFF: &str = "Message Type Diff";
pub const FAILED_MATCHES: &str = "Failed Matches";
pub const LOG_MESSAGES: &str = "Log Messages";

/// Flags that control how much detail a report includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportGenerationContext {
    /// The entire expectation tree passed.
    pub tree_ok: bool,
    /// The report is rendered beneath an odd number of negations.
    pub is_inverted: bool,
}

impl ReportGenerationContext {
    /// The same context with inversion flipped.
    pub fn inverted(self) -> Self {
        Self {
            is_inverted: !self.is_inverted,
            ..self
        }
    }

    /// Whether a predicate with the given outcome should omit its explanation
    /// and sections.
    pub fn omits_detail(&self, ok: bool) -> bool {
        self.tree_ok || ok || self.is_inverted
    }
}

/// A titled block of free-form text within a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub content: String,
}

impl ReportSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
        }
    }

    /// Appends `text` as a line.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
        if !text.ends_with('\n') {
            self.content.push('\n');
        }
    }

    /// Appends `text` as a bullet point.
    pub fn append_list_item(&mut self, text: &str) {
        self.append(&format!("• {text}"));
    }

    fn has_list_item(&self, text: &str) -> bool {
        self.content.lines().any(|line| line.strip_prefix("• ") == Some(text))
    }
}

/// The outcome of an expectation, with explanation and nested reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub tree_ok: bool,
    pub ok: bool,
    pub criteria: String,
    pub outcome: String,
    pub explanation: String,
    pub sections: Vec<ReportSection>,
    pub sub_reports: Vec<Report>,
}

impl Report {
    pub fn new(ctx: ReportGenerationContext, ok: bool, criteria: impl Into<String>) -> Self {
        Self {
            tree_ok: ctx.tree_ok,
            ok,
            criteria: criteria.into(),
            ..Self::default()
        }
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = outcome.into();
        self
    }

    pub fn set_explanation(&mut self, explanation: impl Into<String>) {
        self.explanation = explanation.into();
    }

    /// Returns the section with the given title, creating it if necessary.
    pub fn section(&mut self, title: &str) -> &mut ReportSection {
        let index = match self.sections.iter().position(|s| s.title == title) {
            Some(index) => index,
            None => {
                self.sections.push(ReportSection::new(title));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Adds a suggestion, ignoring duplicates.
    pub fn suggest(&mut self, suggestion: impl AsRef<str>) {
        let suggestion = suggestion.as_ref();
        let section = self.section(SUGGESTIONS);
        if !section.has_list_item(suggestion) {
            section.append_list_item(suggestion);
        }
    }

    pub fn append(&mut self, sub_report: Report) {
        self.sub_reports.push(sub_report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_are_deduplicated_and_ordered() {
        let mut report = Report::new(ReportGenerationContext::default(), false, "x");
        report.suggest("first");
        report.suggest("second");
        report.suggest("first");
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].content, "• first\n• second\n");
    }

    #[test]
    fn detail_is_omitted_unless_failing_in_a_failing_tree() {
        let ctx = ReportGenerationContext::default();
        assert!(!ctx.omits_detail(false));
        assert!(ctx.omits_detail(true));
        assert!(ctx.inverted().omits_detail(false));
        assert!(ReportGenerationContext { tree_ok: true, is_inverted: false }.omits_detail(false));
    }
}
