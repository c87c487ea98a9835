use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{HandlerIdentity, HandlerType, MessageKind, MessageType, ValidationError, clock};

/// The single error type for all testkit operations.
///
/// Every fallible API returns `testkit::Result<T>` (alias for
/// `Result<T, testkit::Error>`). Failures raised by application handlers are
/// wrapped in [`Error::Handler`] so the test only has to deal with one error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("the application does not use '{0}' messages")]
    UnknownMessageType(MessageType),

    #[error("'{message_type}' is configured as {}, not {}", .actual.indefinite(), .expected.indefinite())]
    KindMismatch {
        message_type: MessageType,
        expected: MessageKind,
        actual: MessageKind,
    },

    #[error("'{message_type}' is not a valid message: {reason}")]
    InvalidMessage {
        message_type: MessageType,
        #[source]
        reason: ValidationError,
    },

    #[error("'{0}' is a timeout, timeouts can only be scheduled by process handlers")]
    CannotDispatchTimeout(MessageType),

    #[error("adjusting the clock to {} would reverse time", clock::format_time(.to))]
    ReverseTime {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("the '{handler}' {handler_type} message handler failed: {source}")]
    Handler {
        handler: HandlerIdentity,
        handler_type: HandlerType,
        #[source]
        source: Arc<Error>,
    },

    #[error("invalid application configuration: {0}")]
    Configuration(String),

    #[error("invalid expectation: {0}")]
    Expectation(String),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error raised by application code.
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn expectation(message: impl Into<String>) -> Self {
        Error::Expectation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::fixtures::EvtA;
    use crate::Message;

    #[test]
    fn reverse_time_error_names_the_target_time() {
        let to = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = Error::ReverseTime { from, to };
        assert_eq!(
            err.to_string(),
            "adjusting the clock to 2023-12-31T23:59:59Z would reverse time"
        );
    }

    #[test]
    fn kind_mismatch_uses_articles() {
        let err = Error::KindMismatch {
            message_type: EvtA::message_type(),
            expected: MessageKind::Command,
            actual: MessageKind::Event,
        };
        assert_eq!(err.to_string(), "'EvtA' is configured as an event, not a command");
    }

    #[test]
    fn io_failures_in_handlers_are_external() {
        use std::error::Error as _;

        let err = Error::external(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "External error: disk full");
        assert!(err.source().is_some_and(|s| s.to_string() == "disk full"));
    }
}
