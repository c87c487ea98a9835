use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{Fact, HandlerConfig, HandlerIdentity, HandlerType, Observer};

/// Per-operation settings passed to [`Engine::dispatch`](crate::Engine::dispatch)
/// and [`Engine::tick`](crate::Engine::tick).
///
/// Later options override earlier ones.
#[derive(Clone)]
pub enum OperationOption {
    Observer(Arc<dyn Observer>),
    CurrentTime(DateTime<Utc>),
    EnableHandlerType(HandlerType, bool),
    EnableHandler(HandlerIdentity, bool),
}

impl fmt::Debug for OperationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOption::Observer(_) => f.write_str("Observer(..)"),
            OperationOption::CurrentTime(t) => f.debug_tuple("CurrentTime").field(t).finish(),
            OperationOption::EnableHandlerType(t, on) => {
                f.debug_tuple("EnableHandlerType").field(t).field(on).finish()
            }
            OperationOption::EnableHandler(h, on) => f.debug_tuple("EnableHandler").field(h).field(on).finish(),
        }
    }
}

/// Notifies `observer` of every fact produced by the operation.
pub fn with_observer(observer: impl Observer + 'static) -> OperationOption {
    OperationOption::Observer(Arc::new(observer))
}

/// Sets the time the engine reports as "now" during the operation.
pub fn with_current_time(now: DateTime<Utc>) -> OperationOption {
    OperationOption::CurrentTime(now)
}

pub fn enable_handler_type(handler_type: HandlerType, enabled: bool) -> OperationOption {
    OperationOption::EnableHandlerType(handler_type, enabled)
}

/// Enables or disables a single handler, overriding the setting for its type.
pub fn enable_handler(name: &str, enabled: bool) -> OperationOption {
    OperationOption::EnableHandler(HandlerIdentity::new(name), enabled)
}

/// Options resolved for a single operation.
pub(crate) struct Settings {
    observers: Vec<Arc<dyn Observer>>,
    pub now: DateTime<Utc>,
    pub handler_types: BTreeMap<HandlerType, bool>,
    pub handlers: BTreeMap<HandlerIdentity, bool>,
}

impl Settings {
    pub fn resolve(options: &[OperationOption]) -> Self {
        let mut settings = Self {
            observers: Vec::new(),
            now: Utc::now(),
            handler_types: HandlerType::ALL.iter().map(|t| (*t, true)).collect(),
            handlers: BTreeMap::new(),
        };
        for option in options {
            match option {
                OperationOption::Observer(o) => settings.observers.push(o.clone()),
                OperationOption::CurrentTime(t) => settings.now = *t,
                OperationOption::EnableHandlerType(t, on) => {
                    settings.handler_types.insert(*t, *on);
                }
                OperationOption::EnableHandler(h, on) => {
                    settings.handlers.insert(h.clone(), *on);
                }
            }
        }
        settings
    }

    pub fn is_enabled(&self, handler: &HandlerConfig) -> bool {
        self.handlers.get(handler.identity()).copied().unwrap_or_else(|| {
            self.handler_types
                .get(&handler.handler_type())
                .copied()
                .unwrap_or(true)
        })
    }

    pub fn observe(&self, fact: Fact) {
        tracing::trace!(fact = fact.name(), "engine fact");
        for observer in &self.observers {
            observer.notify(&fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_options_override_earlier_ones() {
        let settings = Settings::resolve(&[
            enable_handler_type(HandlerType::Projection, false),
            enable_handler_type(HandlerType::Projection, true),
            enable_handler("account", false),
        ]);
        assert_eq!(settings.handler_types[&HandlerType::Projection], true);
        assert_eq!(settings.handlers[&HandlerIdentity::new("account")], false);
    }
}
