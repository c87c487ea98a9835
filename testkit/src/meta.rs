use chrono::{DateTime, Utc};

use crate::{HandlerIdentity, HandlerType, MessageId};

/// Metadata attached to every [`Envelope`](crate::Envelope).
///
/// - `id`: unique message identifier.
/// - `causation_id`: the message that directly caused this one. Equal to `id`
///   for messages dispatched by the test itself.
/// - `correlation_id`: the root message of the dispatch cycle.
/// - `created_at`: the engine's current time when the message was produced.
/// - `scheduled_for`: when a timeout becomes due.
/// - `origin`: the handler that produced the message, absent for messages
///   dispatched by the test.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Meta {
    id: MessageId,
    causation_id: MessageId,
    correlation_id: MessageId,
    created_at: DateTime<Utc>,
    scheduled_for: Option<DateTime<Utc>>,
    origin: Option<Origin>,
}

/// The handler that produced a message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Origin {
    handler: HandlerIdentity,
    handler_type: HandlerType,
}

impl Origin {
    pub fn new(handler: HandlerIdentity, handler_type: HandlerType) -> Self {
        Self {
            handler,
            handler_type,
        }
    }

    pub fn handler(&self) -> &HandlerIdentity {
        &self.handler
    }

    pub fn handler_type(&self) -> HandlerType {
        self.handler_type
    }
}

impl Meta {
    pub(crate) fn root(created_at: DateTime<Utc>) -> Self {
        let id = MessageId::new();
        Self {
            id,
            causation_id: id,
            correlation_id: id,
            created_at,
            scheduled_for: None,
            origin: None,
        }
    }

    pub(crate) fn child(&self, created_at: DateTime<Utc>, origin: Origin) -> Self {
        Self {
            id: MessageId::new(),
            causation_id: self.id,
            correlation_id: self.correlation_id,
            created_at,
            scheduled_for: None,
            origin: Some(origin),
        }
    }

    pub(crate) fn set_scheduled_for(&mut self, at: DateTime<Utc>) {
        self.scheduled_for = Some(at);
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn causation_id(&self) -> MessageId {
        self.causation_id
    }

    pub fn correlation_id(&self) -> MessageId {
        self.correlation_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When a timeout is due. `None` for commands and events.
    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.scheduled_for
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }
}
