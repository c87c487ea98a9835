use crate::{Fact, Observer};

/// An observer that logs facts to the `tracing` crate.
///
/// Log levels:
/// - `trace` - handling begun/completed/skipped (high volume)
/// - `debug` - dispatch and tick cycles, produced messages, handler log lines
/// - `warn` - cycles and handlers that failed
///
/// # Example
///
/// ```ignore
/// use testkit::observers::Tracer;
///
/// let config = TestConfig::default().with_observer(Tracer);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Tracer;

impl Observer for Tracer {
    fn notify(&self, fact: &Fact) {
        match fact {
            Fact::DispatchCycleBegun { envelope, .. } => {
                tracing::debug!(
                    message_id = %envelope.id(),
                    message_type = %envelope.message_type(),
                    kind = %envelope.kind(),
                    "dispatch cycle begun"
                );
            }
            Fact::DispatchCycleCompleted { envelope, error } => match error {
                Some(error) => tracing::warn!(message_id = %envelope.id(), %error, "dispatch cycle failed"),
                None => tracing::debug!(message_id = %envelope.id(), "dispatch cycle completed"),
            },
            Fact::TickCycleBegun { now, .. } => {
                tracing::debug!(%now, "tick cycle begun");
            }
            Fact::TickCycleCompleted { now, error } => match error {
                Some(error) => tracing::warn!(%now, %error, "tick cycle failed"),
                None => tracing::debug!(%now, "tick cycle completed"),
            },
            Fact::HandlingBegun {
                handler,
                handler_type,
                envelope,
            } => {
                tracing::trace!(
                    handler = %handler,
                    %handler_type,
                    message_id = %envelope.id(),
                    message_type = %envelope.message_type(),
                    "handling begun"
                );
            }
            Fact::HandlingCompleted {
                handler,
                handler_type,
                envelope,
                error,
            } => match error {
                Some(error) => tracing::warn!(
                    handler = %handler,
                    %handler_type,
                    message_id = %envelope.id(),
                    %error,
                    "handler failed"
                ),
                None => tracing::trace!(handler = %handler, message_id = %envelope.id(), "handling completed"),
            },
            Fact::HandlingSkipped {
                handler,
                handler_type,
                envelope,
            } => {
                tracing::trace!(
                    handler = %handler,
                    %handler_type,
                    message_id = %envelope.id(),
                    "handling skipped"
                );
            }
            Fact::MessageLoggedByHandler { handler, message, .. } => {
                tracing::debug!(handler = %handler, "{message}");
            }
            other => {
                if let Some(envelope) = other.produced_envelope() {
                    tracing::debug!(
                        message_id = %envelope.id(),
                        message_type = %envelope.message_type(),
                        message = ?envelope.message(),
                        "{}",
                        other.name()
                    );
                }
            }
        }
    }
}
