use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    AnyMessage, Envelope, HandlerConfig, HandlerConfigurer, Message, MessageKind, Result,
    application::Direction,
};

/// The four kinds of message handler an application can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    /// Handles commands and records events.
    Aggregate,
    /// Handles events and timeouts, executes commands and schedules timeouts.
    Process,
    /// Handles commands and records events, typically talking to the outside world.
    Integration,
    /// Handles events to build read models. Produces nothing.
    Projection,
}

impl HandlerType {
    pub const ALL: [HandlerType; 4] = [
        HandlerType::Aggregate,
        HandlerType::Process,
        HandlerType::Integration,
        HandlerType::Projection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HandlerType::Aggregate => "aggregate",
            HandlerType::Process => "process",
            HandlerType::Integration => "integration",
            HandlerType::Projection => "projection",
        }
    }

    /// Whether handlers of this type may consume messages of the given kind.
    pub fn can_consume(&self, kind: MessageKind) -> bool {
        matches!(
            (self, kind),
            (HandlerType::Aggregate, MessageKind::Command)
                | (HandlerType::Integration, MessageKind::Command)
                | (HandlerType::Process, MessageKind::Event)
                | (HandlerType::Process, MessageKind::Timeout)
                | (HandlerType::Projection, MessageKind::Event)
        )
    }

    /// Whether handlers of this type may produce messages of the given kind.
    pub fn can_produce(&self, kind: MessageKind) -> bool {
        matches!(
            (self, kind),
            (HandlerType::Aggregate, MessageKind::Event)
                | (HandlerType::Integration, MessageKind::Event)
                | (HandlerType::Process, MessageKind::Command)
                | (HandlerType::Process, MessageKind::Timeout)
        )
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message handler within the application under test.
///
/// Handlers declare their identity and routes in [`configure`](Handler::configure)
/// and react to messages in [`handle`](Handler::handle), producing new messages
/// through the [`HandlerScope`].
///
/// # Example
///
/// ```rust,ignore
/// struct Account {
///     balance: i64,
/// }
///
/// impl Handler for Account {
///     fn configure(&self, c: &mut HandlerConfigurer) {
///         c.identity("account");
///         c.handles_command::<Deposit>();
///         c.records_event::<Deposited>();
///     }
///
///     fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result<()> {
///         if let Some(cmd) = message.downcast_ref::<Deposit>() {
///             self.balance += cmd.amount;
///             scope.record_event(Deposited { amount: cmd.amount });
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: Send + 'static {
    fn configure(&self, c: &mut HandlerConfigurer);

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result<()>;
}

/// A message produced by a handler, not yet wrapped in an envelope.
pub(crate) struct Produced {
    pub message: Arc<dyn AnyMessage>,
    pub kind: MessageKind,
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Everything a handler may do while handling a single message.
///
/// # Panics
///
/// Producing a message the handler did not declare a route for, or an invalid
/// message, panics. Both are bugs in the application rather than test failures.
pub struct HandlerScope<'a> {
    config: &'a HandlerConfig,
    envelope: &'a Envelope,
    now: DateTime<Utc>,
    produced: Vec<Produced>,
    logs: Vec<String>,
}

impl<'a> HandlerScope<'a> {
    pub(crate) fn new(config: &'a HandlerConfig, envelope: &'a Envelope, now: DateTime<Utc>) -> Self {
        Self {
            config,
            envelope,
            now,
            produced: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Produced>, Vec<String>) {
        (self.produced, self.logs)
    }

    /// Records an event. Aggregate and integration handlers only.
    pub fn record_event<M: Message>(&mut self, event: M) {
        self.produce(Arc::new(event), MessageKind::Event, None);
    }

    /// Executes a command. Process handlers only.
    pub fn execute_command<M: Message>(&mut self, command: M) {
        self.produce(Arc::new(command), MessageKind::Command, None);
    }

    /// Schedules a timeout to be delivered back to this handler at `at`.
    /// Process handlers only.
    pub fn schedule_timeout<M: Message>(&mut self, timeout: M, at: DateTime<Utc>) {
        self.produce(Arc::new(timeout), MessageKind::Timeout, Some(at));
    }

    /// Adds a message to the test log, attributed to this handler.
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    /// The engine's current time.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The envelope of the message being handled.
    pub fn envelope(&self) -> &Envelope {
        self.envelope
    }

    pub fn handler(&self) -> &HandlerConfig {
        self.config
    }

    fn produce(
        &mut self,
        message: Arc<dyn AnyMessage>,
        kind: MessageKind,
        scheduled_for: Option<DateTime<Utc>>,
    ) {
        let message_type = message.type_of();
        if !self.config.has_route(&message_type, kind, Direction::Outbound) {
            panic!(
                "the '{}' {} message handler is not configured to produce '{}' {}s",
                self.config.identity(),
                self.config.handler_type(),
                message_type,
                kind,
            );
        }
        if let Err(e) = message.check_valid() {
            panic!(
                "the '{}' {} message handler produced an invalid '{}' {}: {e}",
                self.config.identity(),
                self.config.handler_type(),
                message_type,
                kind,
            );
        }
        self.produced.push(Produced {
            message,
            kind,
            scheduled_for,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_type_capabilities() {
        assert!(HandlerType::Aggregate.can_produce(MessageKind::Event));
        assert!(!HandlerType::Aggregate.can_produce(MessageKind::Command));
        assert!(HandlerType::Process.can_produce(MessageKind::Timeout));
        assert!(HandlerType::Process.can_consume(MessageKind::Timeout));
        assert!(!HandlerType::Projection.can_produce(MessageKind::Event));
        assert!(HandlerType::Projection.can_consume(MessageKind::Event));
        assert!(HandlerType::Integration.can_consume(MessageKind::Command));
    }
}
