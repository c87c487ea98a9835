use std::{fmt, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::{AnyMessage, Engine, Message, MessageKind, OperationOption, Result, TestingT};

use super::check_kind;

/// Wraps the dispatch of a message made through a [`CommandExecutor`] or
/// [`EventRecorder`].
///
/// The interceptor receives the message and a `next` continuation that
/// dispatches a message to the engine. It may inspect or replace the message,
/// dispatch it more than once, or not at all.
///
/// ```rust,ignore
/// let logging = interceptor(|message, next| {
///     tracing::info!(?message, "executing");
///     next(message)
/// });
/// ```
pub type Interceptor =
    Arc<dyn Fn(Arc<dyn AnyMessage>, &dyn Fn(Arc<dyn AnyMessage>) -> Result<()>) -> Result<()> + Send + Sync>;

/// Builds an [`Interceptor`] from a closure.
pub fn interceptor<F>(f: F) -> Interceptor
where
    F: Fn(Arc<dyn AnyMessage>, &dyn Fn(Arc<dyn AnyMessage>) -> Result<()>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub type CommandExecutorInterceptor = Interceptor;
pub type EventRecorderInterceptor = Interceptor;

/// What a binding dispatches to while a `call()` action runs.
pub(crate) struct Bound {
    pub engine: Arc<Mutex<Engine>>,
    pub cancel: CancellationToken,
    pub options: Vec<OperationOption>,
    pub interceptor: Option<Interceptor>,
}

#[derive(Clone)]
struct Binding {
    kind: MessageKind,
    slot: Arc<RwLock<Option<Bound>>>,
    t: Arc<dyn TestingT>,
}

impl Binding {
    fn new(kind: MessageKind, t: Arc<dyn TestingT>) -> Self {
        Self {
            kind,
            slot: Arc::new(RwLock::new(None)),
            t,
        }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            MessageKind::Command => "command executor",
            _ => "event recorder",
        }
    }

    fn bind(&self, bound: Bound) -> BindGuard {
        let mut slot = self.slot.write();
        if slot.is_some() {
            panic!("the {} is already bound, call() actions can not be nested", self.name());
        }
        *slot = Some(bound);
        BindGuard {
            slot: self.slot.clone(),
        }
    }

    fn dispatch(&self, message: Arc<dyn AnyMessage>) -> Result<()> {
        let slot = self.slot.read();
        let Some(bound) = slot.as_ref() else {
            self.t.fatal(&format!(
                "the {} can only be used within a call() action",
                self.name()
            ));
        };

        let next = |message: Arc<dyn AnyMessage>| -> Result<()> {
            let mut engine = bound.engine.lock();
            check_kind(engine.config(), message.as_ref(), self.kind)?;
            engine.dispatch(&bound.cancel, message, &bound.options)
        };
        match &bound.interceptor {
            Some(interceptor) => interceptor(message, &next),
            None => next(message),
        }
    }
}

/// Clears a binding when dropped, including during unwinding.
pub(crate) struct BindGuard {
    slot: Arc<RwLock<Option<Bound>>>,
}

impl Drop for BindGuard {
    fn drop(&mut self) {
        *self.slot.write() = None;
    }
}

/// Executes commands against the application from within a
/// [`call`](crate::call) action.
///
/// The executor may be cloned and used from other threads spawned by the
/// user function, but only while the action is running.
#[derive(Clone)]
pub struct CommandExecutor(Binding);

impl CommandExecutor {
    pub(crate) fn new(t: Arc<dyn TestingT>) -> Self {
        Self(Binding::new(MessageKind::Command, t))
    }

    pub(crate) fn bind(&self, bound: Bound) -> BindGuard {
        self.0.bind(bound)
    }

    /// Dispatches `command` and everything it causes.
    pub fn execute_command<M: Message>(&self, command: M) -> Result<()> {
        self.0.dispatch(Arc::new(command))
    }
}

impl fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("bound", &self.0.slot.read().is_some())
            .finish()
    }
}

/// Records events against the application from within a
/// [`call`](crate::call) action.
#[derive(Clone)]
pub struct EventRecorder(Binding);

impl EventRecorder {
    pub(crate) fn new(t: Arc<dyn TestingT>) -> Self {
        Self(Binding::new(MessageKind::Event, t))
    }

    pub(crate) fn bind(&self, bound: Bound) -> BindGuard {
        self.0.bind(bound)
    }

    /// Dispatches `event` and everything it causes.
    pub fn record_event<M: Message>(&self, event: M) -> Result<()> {
        self.0.dispatch(Arc::new(event))
    }
}

impl fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecorder")
            .field("bound", &self.0.slot.read().is_some())
            .finish()
    }
}
