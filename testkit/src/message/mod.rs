//! Messages exchanged between the test and the application under test.
//!
//! Any `Debug + PartialEq + Serialize` type becomes a message by implementing
//! [`Message`]. The harness works with type-erased messages through
//! [`AnyMessage`], which every [`Message`] implements automatically.
//!
//! `Box<M>` is itself a message whose [`MessageType`] wraps the type of `M`.
//! This gives the harness a notion of "pointer" types so it can tell a user
//! that they expected `Box<EvtA>` while the application produced `EvtA`.

mod kind;
mod message_id;
mod message_type;

use std::{any::Any, fmt};

use serde::Serialize;

pub use kind::MessageKind;
pub use message_id::MessageId;
pub use message_type::MessageType;

/// Error returned by [`Message::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A command, event or timeout understood by the application under test.
///
/// Messages must be comparable (`PartialEq`) and serializable. Equality is the
/// default comparison used by exact expectations, and the serialized form is
/// used for "like" comparisons and fact recording.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
/// use testkit::{Message, ValidationError};
///
/// #[derive(Debug, Clone, PartialEq, Serialize)]
/// struct OpenAccount {
///     id: String,
/// }
///
/// impl Message for OpenAccount {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.id.is_empty() {
///             return Err(ValidationError::new("account ID must not be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Message: fmt::Debug + PartialEq + Serialize + Send + Sync + Sized + 'static {
    /// Checks the message is well-formed.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// An optional canonical representation used by the default comparator
    /// in place of `PartialEq`.
    fn canonical_form(&self) -> Option<serde_json::Value> {
        None
    }

    fn message_type() -> MessageType {
        MessageType::of::<Self>()
    }
}

impl<M: Message> Message for Box<M> {
    fn validate(&self) -> Result<(), ValidationError> {
        (**self).validate()
    }

    fn canonical_form(&self) -> Option<serde_json::Value> {
        (**self).canonical_form()
    }

    fn message_type() -> MessageType {
        MessageType::pointer::<Self>("Box", M::message_type())
    }
}

/// Object-safe view of a [`Message`].
pub trait AnyMessage: fmt::Debug + Send + Sync + 'static {
    fn type_of(&self) -> MessageType;

    fn as_any(&self) -> &dyn Any;

    /// Compares two messages using the `PartialEq` of the concrete type.
    /// Messages of different types are never equal.
    fn eq_message(&self, other: &dyn AnyMessage) -> bool;

    fn check_valid(&self) -> Result<(), ValidationError>;

    /// Serialized form of the message. Serialization failures yield `Null`.
    fn to_json(&self) -> serde_json::Value;

    fn canonical_json(&self) -> Option<serde_json::Value>;
}

impl<M: Message> AnyMessage for M {
    fn type_of(&self) -> MessageType {
        M::message_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_message(&self, other: &dyn AnyMessage) -> bool {
        other.as_any().downcast_ref::<M>().is_some_and(|other| self == other)
    }

    fn check_valid(&self) -> Result<(), ValidationError> {
        self.validate()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            tracing::warn!(message_type = %M::message_type(), error = %e, "unable to serialize message");
            serde_json::Value::Null
        })
    }

    fn canonical_json(&self) -> Option<serde_json::Value> {
        self.canonical_form()
    }
}

impl dyn AnyMessage {
    /// Returns the concrete message if it is of type `M`.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }

    pub fn is<M: Message>(&self) -> bool {
        self.as_any().is::<M>()
    }
}

/// Renders a message the way it would be written in Rust source, wrapping
/// pointer layers in `Box::new(..)`.
pub(crate) fn render(message: &dyn AnyMessage) -> String {
    let mut text = format!("{message:#?}");
    let mut wrappers = Vec::new();
    let mut current = message.type_of();
    while let Some((wrapper, inner)) = current.pointer_parts() {
        wrappers.push(wrapper);
        current = inner;
    }
    for wrapper in wrappers.iter().rev() {
        text = format!("{wrapper}::new({text})");
    }
    text
}
