//! Actions: the stimuli a test applies to the application.
//!
//! Each action performs exactly one engine operation (a dispatch or a tick)
//! with the engine's current time pinned to the test's virtual clock, except
//! [`call`], which hands control to user code that may dispatch any number of
//! messages through the test's [`CommandExecutor`] and [`EventRecorder`].

mod executor;
mod scenario;

use std::{fmt, panic::Location, sync::Arc};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

pub use executor::{
    CommandExecutor, CommandExecutorInterceptor, EventRecorder, EventRecorderInterceptor,
    Interceptor, interceptor,
};
pub(crate) use executor::Bound;
pub use scenario::Scenario;

use crate::{
    AnyMessage, ApplicationConfig, Engine, Error, Message, MessageKind, OperationOption, Result,
    TimeAdjustment, VirtualClock, expectation::PredicateOptions, with_current_time,
};

type CallFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Something the test does to the application.
#[derive(Clone)]
pub struct Action {
    kind: Kind,
    location: &'static Location<'static>,
}

#[derive(Clone)]
enum Kind {
    Dispatch {
        kind: MessageKind,
        message: Arc<dyn AnyMessage>,
    },
    AdvanceTime(Arc<dyn TimeAdjustment>),
    Call {
        func: CallFn,
        options: CallOptions,
    },
}

/// Per-action overrides for a [`call_with`] action.
#[derive(Clone, Default)]
pub struct CallOptions {
    command_executor_interceptor: Option<Interceptor>,
    event_recorder_interceptor: Option<Interceptor>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intercepts commands executed through the test's [`CommandExecutor`]
    /// during this call, replacing the test-wide interceptor.
    pub fn with_command_executor_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.command_executor_interceptor = Some(interceptor);
        self
    }

    /// Intercepts events recorded through the test's [`EventRecorder`]
    /// during this call, replacing the test-wide interceptor.
    pub fn with_event_recorder_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.event_recorder_interceptor = Some(interceptor);
        self
    }

    /// Fills in unset interceptors from `defaults`.
    pub(crate) fn or(&self, defaults: &CallOptions) -> CallOptions {
        CallOptions {
            command_executor_interceptor: self
                .command_executor_interceptor
                .clone()
                .or_else(|| defaults.command_executor_interceptor.clone()),
            event_recorder_interceptor: self
                .event_recorder_interceptor
                .clone()
                .or_else(|| defaults.event_recorder_interceptor.clone()),
        }
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("command_executor_interceptor", &self.command_executor_interceptor.is_some())
            .field("event_recorder_interceptor", &self.event_recorder_interceptor.is_some())
            .finish()
    }
}

/// Everything an action may touch while it runs.
pub(crate) struct ActionScope<'a> {
    pub engine: &'a Arc<Mutex<Engine>>,
    pub clock: &'a mut VirtualClock,
    /// Observers and handler enablement for the operation. The current time
    /// is added by the action.
    pub options: Vec<OperationOption>,
    pub executor: &'a CommandExecutor,
    pub recorder: &'a EventRecorder,
    pub call_defaults: &'a CallOptions,
    pub cancel: &'a CancellationToken,
}

impl ActionScope<'_> {
    fn options_at(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<OperationOption> {
        let mut options = self.options.clone();
        options.push(with_current_time(now));
        options
    }
}

impl Action {
    /// One-line description used in test headings, such as
    /// "executing a 'Deposit' command".
    pub fn caption(&self) -> String {
        match &self.kind {
            Kind::Dispatch {
                kind: MessageKind::Command,
                message,
            } => format!("executing a '{}' command", message.type_of()),
            Kind::Dispatch { message, .. } => format!("recording a '{}' event", message.type_of()),
            Kind::AdvanceTime(adjustment) => format!("advancing time {}", adjustment.description()),
            Kind::Call { .. } => "calling a user-defined function".to_owned(),
        }
    }

    /// Where the action was constructed.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Adjusts the options of the predicates observing this action.
    pub fn configure_predicate(&self, options: &mut PredicateOptions) {
        if let Kind::Call { .. } = self.kind {
            options.match_dispatch_cycle_started_facts = true;
        }
    }

    pub(crate) fn perform(&self, scope: ActionScope<'_>) -> Result<()> {
        tracing::debug!(action = %self.caption(), location = %self.location, "performing action");
        match &self.kind {
            Kind::Dispatch { kind, message } => {
                let options = scope.options_at(scope.clock.now());
                let mut engine = scope.engine.lock();
                check_kind(engine.config(), message.as_ref(), *kind)?;
                engine.dispatch(scope.cancel, message.clone(), &options)
            }
            Kind::AdvanceTime(adjustment) => {
                let now = scope.clock.adjust(adjustment.as_ref())?;
                let options = scope.options_at(now);
                scope.engine.lock().tick(scope.cancel, &options)
            }
            Kind::Call { func, options } => {
                let options = options.or(scope.call_defaults);
                let engine_options = scope.options_at(scope.clock.now());
                let _executor = scope.executor.bind(Bound {
                    engine: scope.engine.clone(),
                    cancel: scope.cancel.clone(),
                    options: engine_options.clone(),
                    interceptor: options.command_executor_interceptor,
                });
                let _recorder = scope.recorder.bind(Bound {
                    engine: scope.engine.clone(),
                    cancel: scope.cancel.clone(),
                    options: engine_options,
                    interceptor: options.event_recorder_interceptor,
                });
                func()
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("caption", &self.caption())
            .field("location", &self.location)
            .finish()
    }
}

/// Fails unless `message` is known to the application as `expected`.
pub(crate) fn check_kind(config: &ApplicationConfig, message: &dyn AnyMessage, expected: MessageKind) -> Result<()> {
    let message_type = message.type_of();
    match config.kind_of(&message_type) {
        None => Err(Error::UnknownMessageType(message_type)),
        Some(actual) if actual != expected => Err(Error::KindMismatch {
            message_type,
            expected,
            actual,
        }),
        Some(_) => Ok(()),
    }
}

#[track_caller]
fn dispatch<M: Message>(constructor: &str, kind: MessageKind, message: M) -> Action {
    if let Err(e) = message.validate() {
        panic!("{constructor}({}): invalid message: {e}", M::message_type());
    }
    Action {
        kind: Kind::Dispatch {
            kind,
            message: Arc::new(message),
        },
        location: Location::caller(),
    }
}

/// Executes `command` as though it came from outside the application.
///
/// # Panics
///
/// Panics if `command` is not valid.
#[track_caller]
pub fn execute_command<M: Message>(command: M) -> Action {
    dispatch("execute_command", MessageKind::Command, command)
}

/// Records `event` as though it came from outside the application.
///
/// # Panics
///
/// Panics if `event` is not valid.
#[track_caller]
pub fn record_event<M: Message>(event: M) -> Action {
    dispatch("record_event", MessageKind::Event, event)
}

/// Moves the virtual clock forward and delivers every timeout that becomes
/// due.
///
/// ```rust,ignore
/// test.prepare([advance_time(by_duration(TimeDelta::hours(1)))]);
/// ```
#[track_caller]
pub fn advance_time(adjustment: impl TimeAdjustment + 'static) -> Action {
    Action {
        kind: Kind::AdvanceTime(Arc::new(adjustment)),
        location: Location::caller(),
    }
}

/// Calls `func`, which may use the test's [`CommandExecutor`] and
/// [`EventRecorder`] to dispatch messages. Expectations observing the call
/// also consider the messages `func` dispatches as produced.
#[track_caller]
pub fn call(func: impl Fn() -> Result<()> + Send + Sync + 'static) -> Action {
    call_with(CallOptions::default(), func)
}

#[track_caller]
pub fn call_with(options: CallOptions, func: impl Fn() -> Result<()> + Send + Sync + 'static) -> Action {
    Action {
        kind: Kind::Call {
            func: Arc::new(func),
            options,
        },
        location: Location::caller(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::{
        Fact, by_duration,
        fixtures::{App, CmdA, EvtA, MockT, TimeoutA},
        to_time, with_observer,
    };

    struct Fixture {
        engine: Arc<Mutex<Engine>>,
        clock: VirtualClock,
        executor: CommandExecutor,
        recorder: EventRecorder,
        defaults: CallOptions,
        cancel: CancellationToken,
        facts: Arc<Mutex<Vec<Fact>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let t = Arc::new(MockT::new());
            Self {
                engine: Arc::new(Mutex::new(Engine::new(Arc::new(App)).unwrap())),
                clock: VirtualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                executor: CommandExecutor::new(t.clone()),
                recorder: EventRecorder::new(t),
                defaults: CallOptions::default(),
                cancel: CancellationToken::new(),
                facts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn perform(&mut self, action: &Action) -> Result<()> {
            let facts = self.facts.clone();
            action.perform(ActionScope {
                engine: &self.engine,
                clock: &mut self.clock,
                options: vec![with_observer(move |f: &Fact| facts.lock().push(f.clone()))],
                executor: &self.executor,
                recorder: &self.recorder,
                call_defaults: &self.defaults,
                cancel: &self.cancel,
            })
        }
    }

    #[test]
    fn captions_describe_the_action() {
        assert_eq!(execute_command(CmdA { value: 1 }).caption(), "executing a 'CmdA' command");
        assert_eq!(record_event(EvtA { value: 1 }).caption(), "recording a 'EvtA' event");
        assert_eq!(
            advance_time(by_duration(TimeDelta::seconds(3))).caption(),
            "advancing time by 3s"
        );
        assert_eq!(call(|| Ok(())).caption(), "calling a user-defined function");
    }

    #[test]
    fn location_is_the_construction_site() {
        let action = execute_command(CmdA { value: 1 });
        assert!(action.location().file().ends_with("mod.rs"), "{}", action.location());
    }

    #[test]
    fn dispatch_uses_the_virtual_clock() {
        let mut fx = Fixture::new();
        fx.perform(&execute_command(CmdA { value: 1 })).unwrap();
        let facts = fx.facts.lock();
        let Some(Fact::DispatchCycleBegun { envelope, .. }) = facts.first() else {
            panic!("expected a dispatch cycle, got {:?}", facts.first().map(Fact::name));
        };
        assert_eq!(envelope.meta().created_at(), fx.clock.now());
    }

    #[test]
    fn dispatch_rejects_the_wrong_kind() {
        let mut fx = Fixture::new();
        let err = fx.perform(&execute_command(EvtA { value: 1 })).unwrap_err();
        assert_eq!(err.to_string(), "'EvtA' is configured as an event, not a command");
    }

    #[test]
    fn advancing_time_delivers_due_timeouts() {
        let mut fx = Fixture::new();
        let start = fx.clock.now();
        fx.perform(&record_event(EvtA { value: 1 })).unwrap();
        fx.facts.lock().clear();

        fx.perform(&advance_time(by_duration(TimeDelta::hours(1)))).unwrap();
        assert_eq!(fx.clock.now(), start + TimeDelta::hours(1));

        let facts = fx.facts.lock();
        assert_eq!(
            facts.iter().filter(|f| matches!(f, Fact::TickCycleBegun { .. })).count(),
            1
        );
        assert!(facts.iter().any(|f| matches!(
            f,
            Fact::HandlingBegun { envelope, .. } if envelope.message().is::<TimeoutA>()
        )));
    }

    #[test]
    fn reversing_time_fails_and_keeps_the_clock() {
        let mut fx = Fixture::new();
        let start = fx.clock.now();
        let err = fx
            .perform(&advance_time(to_time(start - TimeDelta::seconds(1))))
            .unwrap_err();
        assert_eq!(err.to_string(), "adjusting the clock to 2023-12-31T23:59:59Z would reverse time");
        assert_eq!(fx.clock.now(), start);
    }

    #[test]
    fn call_binds_the_executor_for_its_duration() {
        let mut fx = Fixture::new();
        let executor = fx.executor.clone();
        fx.perform(&call(move || executor.execute_command(CmdA { value: 1 })))
            .unwrap();
        assert!(fx.facts.lock().iter().any(|f| matches!(
            f,
            Fact::DispatchCycleBegun { envelope, .. } if envelope.origin().is_none()
        )));

        let mut options = PredicateOptions::default();
        call(|| Ok(())).configure_predicate(&mut options);
        assert!(options.match_dispatch_cycle_started_facts);
    }

    #[test]
    #[should_panic(expected = "execute_command(CmdA): invalid message")]
    fn invalid_messages_panic_at_construction() {
        execute_command(CmdA { value: -1 });
    }
}
