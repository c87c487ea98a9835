use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{Envelope, HandlerIdentity, HandlerType};

/// A notification emitted by the engine as it dispatches and handles
/// messages.
///
/// Facts are delivered synchronously, in order, to every observer attached
/// to the operation. Expectations are evaluated purely from facts.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum Fact {
    /// The test dispatched a command or recorded an event.
    DispatchCycleBegun {
        envelope: Envelope,
        enabled_handler_types: BTreeMap<HandlerType, bool>,
        enabled_handlers: BTreeMap<HandlerIdentity, bool>,
    },
    DispatchCycleCompleted {
        envelope: Envelope,
        error: Option<String>,
    },
    /// Time advanced and due timeouts are about to be delivered.
    TickCycleBegun {
        now: DateTime<Utc>,
        enabled_handler_types: BTreeMap<HandlerType, bool>,
    },
    TickCycleCompleted {
        now: DateTime<Utc>,
        error: Option<String>,
    },
    HandlingBegun {
        handler: HandlerIdentity,
        handler_type: HandlerType,
        envelope: Envelope,
    },
    HandlingCompleted {
        handler: HandlerIdentity,
        handler_type: HandlerType,
        envelope: Envelope,
        error: Option<String>,
    },
    /// A handler that would have handled the message is disabled.
    HandlingSkipped {
        handler: HandlerIdentity,
        handler_type: HandlerType,
        envelope: Envelope,
    },
    EventRecordedByAggregate {
        handler: HandlerIdentity,
        envelope: Envelope,
    },
    EventRecordedByIntegration {
        handler: HandlerIdentity,
        envelope: Envelope,
    },
    CommandExecutedByProcess {
        handler: HandlerIdentity,
        envelope: Envelope,
    },
    TimeoutScheduledByProcess {
        handler: HandlerIdentity,
        envelope: Envelope,
    },
    MessageLoggedByHandler {
        handler: HandlerIdentity,
        handler_type: HandlerType,
        envelope: Envelope,
        message: String,
    },
}

impl Fact {
    /// The envelope of a message produced by a handler, for the facts that
    /// announce one.
    pub fn produced_envelope(&self) -> Option<&Envelope> {
        match self {
            Fact::EventRecordedByAggregate { envelope, .. }
            | Fact::EventRecordedByIntegration { envelope, .. }
            | Fact::CommandExecutedByProcess { envelope, .. }
            | Fact::TimeoutScheduledByProcess { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    /// A short name for the fact, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Fact::DispatchCycleBegun { .. } => "dispatch cycle begun",
            Fact::DispatchCycleCompleted { .. } => "dispatch cycle completed",
            Fact::TickCycleBegun { .. } => "tick cycle begun",
            Fact::TickCycleCompleted { .. } => "tick cycle completed",
            Fact::HandlingBegun { .. } => "handling begun",
            Fact::HandlingCompleted { .. } => "handling completed",
            Fact::HandlingSkipped { .. } => "handling skipped",
            Fact::EventRecordedByAggregate { .. } => "event recorded by aggregate",
            Fact::EventRecordedByIntegration { .. } => "event recorded by integration",
            Fact::CommandExecutedByProcess { .. } => "command executed by process",
            Fact::TimeoutScheduledByProcess { .. } => "timeout scheduled by process",
            Fact::MessageLoggedByHandler { .. } => "message logged by handler",
        }
    }
}
