use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;

use crate::{AnyMessage, MessageId, MessageKind, MessageType, Meta, meta::Origin};

/// A message together with the metadata the engine attached to it.
///
/// Envelopes are cheap to clone: the message itself is shared behind an
/// `Arc`. Every fact that concerns a message carries its envelope.
#[derive(Clone)]
pub struct Envelope {
    meta: Meta,
    kind: MessageKind,
    message: Arc<dyn AnyMessage>,
}

impl Envelope {
    /// Wraps a message dispatched by the test, starting a new causal chain.
    pub(crate) fn new(message: Arc<dyn AnyMessage>, kind: MessageKind, now: DateTime<Utc>) -> Self {
        Self {
            meta: Meta::root(now),
            kind,
            message,
        }
    }

    /// Wraps a message produced by a handler while handling `self`.
    pub(crate) fn new_child(
        &self,
        message: Arc<dyn AnyMessage>,
        kind: MessageKind,
        now: DateTime<Utc>,
        origin: Origin,
    ) -> Self {
        Self {
            meta: self.meta.child(now, origin),
            kind,
            message,
        }
    }

    pub(crate) fn with_scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.meta.set_scheduled_for(at);
        self
    }

    #[inline]
    pub fn message(&self) -> &Arc<dyn AnyMessage> {
        &self.message
    }

    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn message_type(&self) -> MessageType {
        self.message.type_of()
    }

    #[inline]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Shorthand for `self.meta().id()`.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.meta.id()
    }

    /// Shorthand for `self.meta().origin()`.
    pub fn origin(&self) -> Option<&Origin> {
        self.meta.origin()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.meta.id())
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("created_at", &self.meta.created_at())
            .field("causation_id", &self.meta.causation_id())
            .field("origin", &self.meta.origin())
            .finish()
    }
}

impl serde::Serialize for Envelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 4)?;
        state.serialize_field("meta", &self.meta)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("message_type", &self.message.type_of())?;
        state.serialize_field("message", &self.message.to_json())?;
        state.end()
    }
}
