use std::{collections::BTreeMap, sync::Arc};

use crate::{
    ApplicationConfig, Envelope, Fact, HandlerIdentity, HandlerType, MessageKind,
    expectation::PredicateOptions,
};

/// Per-action bookkeeping shared by the message predicates: which handlers
/// were engaged and how many messages were produced.
pub(super) struct Tracker {
    pub kind: MessageKind,
    pub options: PredicateOptions,
    app: Arc<ApplicationConfig>,
    /// Whether the action started a dispatch or tick cycle.
    pub cycle_begun: bool,
    /// Messages produced, of any kind.
    pub total: usize,
    /// Messages produced of the tracked kind.
    pub produced: usize,
    /// Handlers capable of producing the tracked kind that handled a message,
    /// in order of first engagement.
    pub engaged: Vec<(HandlerIdentity, HandlerType)>,
    pub enabled: BTreeMap<HandlerType, bool>,
}

impl Tracker {
    pub fn new(kind: MessageKind, app: Arc<ApplicationConfig>, options: PredicateOptions) -> Self {
        Self {
            kind,
            options,
            app,
            cycle_begun: false,
            total: 0,
            produced: 0,
            engaged: Vec::new(),
            enabled: BTreeMap::new(),
        }
    }

    pub fn app(&self) -> &ApplicationConfig {
        &self.app
    }

    /// Updates the bookkeeping, returning the envelope of a produced message
    /// the predicate should consider.
    pub fn notify<'f>(&mut self, fact: &'f Fact) -> Option<&'f Envelope> {
        match fact {
            Fact::DispatchCycleBegun {
                envelope,
                enabled_handler_types,
                ..
            } => {
                self.cycle_begun = true;
                self.enabled = enabled_handler_types.clone();
                if self.options.match_dispatch_cycle_started_facts {
                    self.count(envelope);
                    return Some(envelope);
                }
                None
            }
            Fact::TickCycleBegun {
                enabled_handler_types,
                ..
            } => {
                self.cycle_begun = true;
                self.enabled = enabled_handler_types.clone();
                None
            }
            Fact::HandlingBegun {
                handler,
                handler_type,
                ..
            } => {
                let capable = self
                    .app
                    .handler(handler.as_str())
                    .is_some_and(|h| h.produces_kind(self.kind));
                if capable && !self.engaged.iter().any(|(h, _)| h == handler) {
                    self.engaged.push((handler.clone(), *handler_type));
                }
                None
            }
            other => {
                let envelope = other.produced_envelope()?;
                self.count(envelope);
                Some(envelope)
            }
        }
    }

    fn count(&mut self, envelope: &Envelope) {
        self.total += 1;
        if envelope.kind() == self.kind {
            self.produced += 1;
        }
    }
}
