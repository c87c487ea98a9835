use std::fmt;

use super::Report;

const BLOCK_PREFIX: &str = "  | ";
const CONTENT_INDENT: &str = "    ";
const SUB_REPORT_INDENT: &str = "    ";

impl Report {
    fn render_into(&self, out: &mut String) {
        out.push_str(if self.ok { "✓ " } else { "✗ " });
        out.push_str(&self.criteria);
        if !self.outcome.is_empty() {
            out.push_str(" (");
            out.push_str(&self.outcome);
            out.push(')');
        }
        out.push('\n');

        let sections: Vec<_> = self.sections.iter().filter(|s| !s.content.is_empty()).collect();
        if !self.explanation.is_empty() || !sections.is_empty() {
            let mut block = String::new();
            if !self.explanation.is_empty() {
                block.push_str("EXPLANATION\n");
                block.push_str(&indent(&with_newline(&self.explanation), CONTENT_INDENT));
            }
            for section in sections {
                if !block.is_empty() {
                    block.push('\n');
                }
                block.push_str(&section.title.to_uppercase());
                block.push('\n');
                block.push_str(&indent(&with_newline(&section.content), CONTENT_INDENT));
            }
            out.push('\n');
            out.push_str(&indent(&block, BLOCK_PREFIX));
            out.push('\n');
        }

        for sub_report in &self.sub_reports {
            let mut text = String::new();
            sub_report.render_into(&mut text);
            out.push_str(&indent(&text, SUB_REPORT_INDENT));
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(&mut out);
        f.write_str(&out)
    }
}

fn with_newline(text: &str) -> String {
    let mut text = text.to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Prefixes every line of `text`. Blank lines get the prefix without its
/// trailing whitespace.
fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportGenerationContext, SUGGESTIONS};

    #[test]
    fn renders_criteria_outcome_and_sections() {
        let mut report = Report::new(ReportGenerationContext::default(), false, "record a specific 'EvtA' event")
            .with_outcome("something went wrong");
        report.set_explanation("a similar event was recorded by the 'account' aggregate message handler");
        report.suggest("check the content of the message");

        let expected = "\
✗ record a specific 'EvtA' event (something went wrong)

  | EXPLANATION
  |     a similar event was recorded by the 'account' aggregate message handler
  |
  | SUGGESTIONS
  |     • check the content of the message

";
        assert_eq!(report.to_string(), expected);
        assert_eq!(report.sections[0].title, SUGGESTIONS);
    }

    #[test]
    fn sub_reports_are_indented() {
        let ctx = ReportGenerationContext::default();
        let mut report = Report::new(ctx, false, "none of").with_outcome("1 of the expectations passed unexpectedly");
        report.append(Report::new(ctx, true, "record a specific 'EvtA' event"));
        report.append(Report::new(ctx, false, "record a specific 'EvtB' event"));

        assert_eq!(
            report.to_string(),
            "✗ none of (1 of the expectations passed unexpectedly)\n    ✓ record a specific 'EvtA' event\n    ✗ record a specific 'EvtB' event\n"
        );
    }

    #[test]
    fn blank_lines_in_content_keep_the_margin() {
        assert_eq!(indent("a\n\nb\n", "  | "), "  | a\n  |\n  | b\n");
    }
}
