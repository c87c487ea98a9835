use std::sync::Arc;

use crate::{Fact, Observer, TestingT, clock::format_time};

/// An observer that writes a one-line transcript of each noteworthy fact to
/// the test log.
///
/// Lines are prefixed with the short ID of the message they concern. Routine
/// handling facts are omitted unless the handler failed or was skipped.
pub struct FactLogger {
    t: Arc<dyn TestingT>,
}

impl FactLogger {
    pub fn new(t: Arc<dyn TestingT>) -> Self {
        Self { t }
    }
}

impl Observer for FactLogger {
    fn notify(&self, fact: &Fact) {
        if let Some(line) = describe(fact) {
            self.t.log(&line);
        }
    }
}

fn describe(fact: &Fact) -> Option<String> {
    let line = match fact {
        Fact::DispatchCycleBegun { envelope, .. } => format!(
            "[{}] {} '{}' dispatched by the test",
            envelope.id().short(),
            envelope.kind(),
            envelope.message_type()
        ),
        Fact::DispatchCycleCompleted {
            envelope,
            error: Some(error),
        } => format!("[{}] dispatch cycle failed: {error}", envelope.id().short()),
        Fact::TickCycleBegun { now, .. } => format!("tick at {}", format_time(now)),
        Fact::TickCycleCompleted { error: Some(error), .. } => format!("tick failed: {error}"),
        Fact::HandlingSkipped {
            handler,
            handler_type,
            envelope,
        } => format!(
            "[{}] '{handler}' {handler_type} handler is disabled, skipped '{}'",
            envelope.id().short(),
            envelope.message_type()
        ),
        Fact::HandlingCompleted {
            handler,
            handler_type,
            envelope,
            error: Some(error),
        } => format!(
            "[{}] '{handler}' {handler_type} handler failed: {error}",
            envelope.id().short()
        ),
        Fact::EventRecordedByAggregate { handler, envelope }
        | Fact::EventRecordedByIntegration { handler, envelope } => format!(
            "[{}] '{handler}' recorded a '{}' event",
            envelope.id().short(),
            envelope.message_type()
        ),
        Fact::CommandExecutedByProcess { handler, envelope } => format!(
            "[{}] '{handler}' executed a '{}' command",
            envelope.id().short(),
            envelope.message_type()
        ),
        Fact::TimeoutScheduledByProcess { handler, envelope } => {
            let mut line = format!(
                "[{}] '{handler}' scheduled a '{}' timeout",
                envelope.id().short(),
                envelope.message_type()
            );
            if let Some(at) = envelope.meta().scheduled_for() {
                line.push_str(&format!(" for {}", format_time(&at)));
            }
            line
        }
        Fact::MessageLoggedByHandler {
            handler,
            handler_type,
            envelope,
            message,
        } => format!(
            "[{}] '{handler}' {handler_type} handler: {message}",
            envelope.id().short()
        ),
        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::fixtures::MockT;

    #[test]
    fn routine_facts_are_omitted() {
        let t = Arc::new(MockT::new());
        let logger = FactLogger::new(t.clone());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        logger.notify(&Fact::TickCycleBegun {
            now,
            enabled_handler_types: Default::default(),
        });
        logger.notify(&Fact::TickCycleCompleted { now, error: None });
        logger.notify(&Fact::TickCycleCompleted {
            now,
            error: Some("operation cancelled".into()),
        });

        assert_eq!(
            t.logs(),
            vec!["tick at 2024-01-01T00:00:00Z", "tick failed: operation cancelled"]
        );
    }
}
