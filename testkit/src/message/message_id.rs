use std::{fmt, hash};

use uuid::Uuid;

/// Unique identifier of a message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash, serde::Serialize)]
pub struct MessageId(u128);

impl MessageId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// The first eight hex digits, enough to tell envelopes apart in logs.
    pub fn short(&self) -> String {
        let mut text = Uuid::from_u128(self.0).simple().to_string();
        text.truncate(8);
        text
    }
}

impl From<u128> for MessageId {
    fn from(value: u128) -> Self {
        MessageId(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        MessageId::new()
    }
}
