//! A synchronous, in-memory engine that runs the application under test.
//!
//! The engine routes each message to the handlers that consume it, then
//! routes whatever those handlers produce, until the dispatch cycle is
//! exhausted. Timeouts are held until the engine's current time reaches
//! their scheduled time and are delivered by [`Engine::tick`].
//!
//! Every step is announced as a [`Fact`](crate::Fact) to the observers
//! attached to the operation.

mod options;

use std::{collections::VecDeque, sync::Arc};

use tokio_util::sync::CancellationToken;

pub use options::{
    OperationOption, enable_handler, enable_handler_type, with_current_time, with_observer,
};
pub(crate) use options::Settings;

use crate::{
    AnyMessage, Application, ApplicationConfig, Envelope, Error, Fact, Handler, HandlerScope,
    MessageKind, Result, meta::Origin,
};

pub struct Engine {
    app: Arc<dyn Application>,
    config: Arc<ApplicationConfig>,
    handlers: Vec<Box<dyn Handler>>,
    timeouts: Vec<Envelope>,
}

impl Engine {
    pub fn new(app: Arc<dyn Application>) -> Result<Self> {
        let (config, handlers) = ApplicationConfig::build(app.as_ref())?;
        Ok(Self {
            app,
            config: Arc::new(config),
            handlers,
            timeouts: Vec::new(),
        })
    }

    pub fn config(&self) -> &Arc<ApplicationConfig> {
        &self.config
    }

    /// Timeouts scheduled but not yet delivered.
    pub fn pending_timeouts(&self) -> &[Envelope] {
        &self.timeouts
    }

    /// Discards all handler state and pending timeouts.
    pub fn reset(&mut self) -> Result<()> {
        let (_, handlers) = ApplicationConfig::build(self.app.as_ref())?;
        self.handlers = handlers;
        self.timeouts.clear();
        tracing::debug!(application = %self.config.identity(), "engine reset");
        Ok(())
    }

    /// Dispatches a command or event and everything it causes.
    pub fn dispatch(
        &mut self,
        cancel: &CancellationToken,
        message: Arc<dyn AnyMessage>,
        options: &[OperationOption],
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let message_type = message.type_of();
        let kind = self
            .config
            .kind_of(&message_type)
            .ok_or_else(|| Error::UnknownMessageType(message_type.clone()))?;
        if kind == MessageKind::Timeout {
            return Err(Error::CannotDispatchTimeout(message_type));
        }
        message.check_valid().map_err(|reason| Error::InvalidMessage {
            message_type: message_type.clone(),
            reason,
        })?;

        let settings = Settings::resolve(options);
        let envelope = Envelope::new(message, kind, settings.now);
        tracing::debug!(message_id = %envelope.id(), message_type = %message_type, %kind, "dispatch");

        settings.observe(Fact::DispatchCycleBegun {
            envelope: envelope.clone(),
            enabled_handler_types: settings.handler_types.clone(),
            enabled_handlers: settings.handlers.clone(),
        });
        let result = self.run(cancel, &settings, VecDeque::from([envelope.clone()]));
        settings.observe(Fact::DispatchCycleCompleted {
            envelope,
            error: result.as_ref().err().map(ToString::to_string),
        });
        result
    }

    /// Delivers every timeout that is due at the operation's current time.
    pub fn tick(&mut self, cancel: &CancellationToken, options: &[OperationOption]) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let settings = Settings::resolve(options);
        let now = settings.now;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timeouts)
            .into_iter()
            .partition(|env| env.meta().scheduled_for().is_none_or(|at| at <= now));
        due.sort_by_key(|env| env.meta().scheduled_for());
        self.timeouts = pending;
        tracing::debug!(%now, due = due.len(), "tick");

        settings.observe(Fact::TickCycleBegun {
            now,
            enabled_handler_types: settings.handler_types.clone(),
        });
        let result = self.run(cancel, &settings, due.into());
        settings.observe(Fact::TickCycleCompleted {
            now,
            error: result.as_ref().err().map(ToString::to_string),
        });
        result
    }

    fn run(&mut self, cancel: &CancellationToken, settings: &Settings, mut queue: VecDeque<Envelope>) -> Result<()> {
        let config = self.config.clone();
        while let Some(envelope) = queue.pop_front() {
            if let Some(at) = envelope.meta().scheduled_for()
                && at > settings.now
            {
                self.timeouts.push(envelope);
                continue;
            }

            let message_type = envelope.message_type();
            for (index, handler) in config.handlers().iter().enumerate() {
                if !handler.consumes(&message_type) {
                    continue;
                }
                if envelope.kind() == MessageKind::Timeout
                    && envelope.origin().map(|o| o.handler()) != Some(handler.identity())
                {
                    continue;
                }

                let identity = handler.identity().clone();
                let handler_type = handler.handler_type();
                if !settings.is_enabled(handler) {
                    settings.observe(Fact::HandlingSkipped {
                        handler: identity,
                        handler_type,
                        envelope: envelope.clone(),
                    });
                    continue;
                }
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                settings.observe(Fact::HandlingBegun {
                    handler: identity.clone(),
                    handler_type,
                    envelope: envelope.clone(),
                });

                let mut scope = HandlerScope::new(handler, &envelope, settings.now);
                let result = self.handlers[index].handle(&mut scope, envelope.message().as_ref());
                let (produced, logs) = scope.into_parts();

                for message in logs {
                    settings.observe(Fact::MessageLoggedByHandler {
                        handler: identity.clone(),
                        handler_type,
                        envelope: envelope.clone(),
                        message,
                    });
                }

                if let Err(e) = result {
                    settings.observe(Fact::HandlingCompleted {
                        handler: identity.clone(),
                        handler_type,
                        envelope: envelope.clone(),
                        error: Some(e.to_string()),
                    });
                    return Err(Error::Handler {
                        handler: identity,
                        handler_type,
                        source: Arc::new(e),
                    });
                }

                for p in produced {
                    let origin = Origin::new(identity.clone(), handler_type);
                    let mut child = envelope.new_child(p.message, p.kind, settings.now, origin);
                    if let Some(at) = p.scheduled_for {
                        child = child.with_scheduled_for(at);
                    }
                    let fact = match p.kind {
                        MessageKind::Command => Fact::CommandExecutedByProcess {
                            handler: identity.clone(),
                            envelope: child.clone(),
                        },
                        MessageKind::Timeout => Fact::TimeoutScheduledByProcess {
                            handler: identity.clone(),
                            envelope: child.clone(),
                        },
                        MessageKind::Event if handler_type == crate::HandlerType::Integration => {
                            Fact::EventRecordedByIntegration {
                                handler: identity.clone(),
                                envelope: child.clone(),
                            }
                        }
                        MessageKind::Event => Fact::EventRecordedByAggregate {
                            handler: identity.clone(),
                            envelope: child.clone(),
                        },
                    };
                    settings.observe(fact);
                    queue.push_back(child);
                }

                settings.observe(Fact::HandlingCompleted {
                    handler: identity,
                    handler_type,
                    envelope: envelope.clone(),
                    error: None,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        HandlerType,
        fixtures::{App, CmdA, CmdB, EvtA, TimeoutA},
    };

    fn collect(facts: &Arc<Mutex<Vec<Fact>>>) -> OperationOption {
        let facts = facts.clone();
        with_observer(move |f: &Fact| facts.lock().push(f.clone()))
    }

    fn names(facts: &Arc<Mutex<Vec<Fact>>>) -> Vec<&'static str> {
        facts.lock().iter().map(Fact::name).collect()
    }

    #[test]
    fn dispatch_routes_produced_messages_breadth_first() {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let facts = Arc::new(Mutex::new(Vec::new()));
        engine
            .dispatch(&CancellationToken::new(), Arc::new(CmdA { value: 1 }), &[collect(&facts)])
            .unwrap();

        let names = names(&facts);
        assert_eq!(names.first(), Some(&"dispatch cycle begun"));
        assert_eq!(names.last(), Some(&"dispatch cycle completed"));
        assert!(names.contains(&"event recorded by aggregate"));
        assert!(names.contains(&"command executed by process"));
    }

    #[test]
    fn disabled_handlers_are_skipped() {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let facts = Arc::new(Mutex::new(Vec::new()));
        engine
            .dispatch(
                &CancellationToken::new(),
                Arc::new(CmdB { value: 1 }),
                &[collect(&facts), enable_handler_type(HandlerType::Integration, false)],
            )
            .unwrap();

        let facts = facts.lock();
        assert!(facts.iter().any(|f| matches!(
            f,
            Fact::HandlingSkipped { handler_type: HandlerType::Integration, .. }
        )));
        assert!(!facts.iter().any(|f| matches!(f, Fact::EventRecordedByIntegration { .. })));
    }

    #[test]
    fn unknown_and_timeout_messages_are_rejected() {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let cancel = CancellationToken::new();
        assert!(matches!(
            engine.dispatch(&cancel, Arc::new(Box::new(EvtA { value: 1 })), &[]),
            Err(Error::UnknownMessageType(_))
        ));
        assert!(matches!(
            engine.dispatch(&cancel, Arc::new(TimeoutA { value: 1 }), &[]),
            Err(Error::CannotDispatchTimeout(_))
        ));
        assert!(matches!(
            engine.dispatch(&cancel, Arc::new(CmdA { value: -1 }), &[]),
            Err(Error::InvalidMessage { .. })
        ));
    }

    #[test]
    fn timeouts_are_delivered_once_due() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let cancel = CancellationToken::new();

        engine
            .dispatch(&cancel, Arc::new(EvtA { value: 1 }), &[with_current_time(start)])
            .unwrap();
        assert_eq!(engine.pending_timeouts().len(), 1);

        engine.tick(&cancel, &[with_current_time(start)]).unwrap();
        assert_eq!(engine.pending_timeouts().len(), 1);

        let facts = Arc::new(Mutex::new(Vec::new()));
        engine
            .tick(&cancel, &[with_current_time(start + TimeDelta::hours(1)), collect(&facts)])
            .unwrap();
        assert!(engine.pending_timeouts().is_empty());
        assert!(facts.lock().iter().any(|f| matches!(
            f,
            Fact::HandlingBegun { envelope, .. } if envelope.kind() == MessageKind::Timeout
        )));
    }

    #[test]
    fn cancelled_operations_fail() {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            engine.dispatch(&cancel, Arc::new(CmdA { value: 1 }), &[]),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn reset_discards_pending_timeouts() {
        let mut engine = Engine::new(Arc::new(App)).unwrap();
        engine
            .dispatch(&CancellationToken::new(), Arc::new(EvtA { value: 1 }), &[])
            .unwrap();
        assert!(!engine.pending_timeouts().is_empty());
        engine.reset().unwrap();
        assert!(engine.pending_timeouts().is_empty());
    }
}
