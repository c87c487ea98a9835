use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    Comparator, DefaultComparator, HandlerType, Interceptor, Observer, OperationOption,
    action::CallOptions, enable_handler_type,
};

/// Configuration for a [`Test`](crate::Test).
///
/// Use the builder methods to customize, or use [`Default`] for sensible
/// defaults: the clock starts at the wall-clock time, messages are compared
/// with [`DefaultComparator`], and facts are logged as the test runs.
///
/// Integration and projection handlers are disabled unless enabled here or
/// with [`Test::enable_handler_type`](crate::Test::enable_handler_type).
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use testkit::{HandlerType, TestConfig, enable_handler_type};
///
/// let config = TestConfig::default()
///     .with_start_time(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
///     .with_operation_option(enable_handler_type(HandlerType::Projection, true))
///     .with_verbose(false);
/// ```
#[derive(Clone)]
pub struct TestConfig {
    start_time: Option<DateTime<Utc>>,
    comparator: Arc<dyn Comparator>,
    operation_options: Vec<OperationOption>,
    call_options: CallOptions,
    verbose: bool,
    cancel: CancellationToken,
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig {
            start_time: None,
            comparator: Arc::new(DefaultComparator),
            operation_options: vec![
                enable_handler_type(HandlerType::Integration, false),
                enable_handler_type(HandlerType::Projection, false),
            ],
            call_options: CallOptions::default(),
            verbose: true,
            cancel: CancellationToken::new(),
        }
    }
}

impl TestConfig {
    /// Set the time the virtual clock starts at.
    pub fn with_start_time(mut self, t: DateTime<Utc>) -> Self {
        self.start_time = Some(t);
        self
    }

    /// Returns the configured start time, if any.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Set the comparator used by exact message expectations.
    pub fn with_comparator(mut self, comparator: impl Comparator + 'static) -> Self {
        self.comparator = Arc::new(comparator);
        self
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    /// Add an option applied to every engine operation. Later options
    /// override earlier ones.
    pub fn with_operation_option(mut self, option: OperationOption) -> Self {
        self.operation_options.push(option);
        self
    }

    /// Add an observer notified of every fact, in addition to expectations.
    pub fn with_observer(self, observer: impl Observer + 'static) -> Self {
        self.with_operation_option(crate::with_observer(observer))
    }

    pub fn operation_options(&self) -> &[OperationOption] {
        &self.operation_options
    }

    /// Intercept commands executed through the test's
    /// [`CommandExecutor`](crate::CommandExecutor).
    pub fn with_command_executor_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.call_options = self.call_options.with_command_executor_interceptor(interceptor);
        self
    }

    /// Intercept events recorded through the test's
    /// [`EventRecorder`](crate::EventRecorder).
    pub fn with_event_recorder_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.call_options = self.call_options.with_event_recorder_interceptor(interceptor);
        self
    }

    pub(crate) fn call_options(&self) -> &CallOptions {
        &self.call_options
    }

    /// Set whether every fact is written to the test log.
    /// Default: true
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Set the token that cancels the test's engine operations.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for TestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestConfig")
            .field("start_time", &self.start_time)
            .field("operation_options", &self.operation_options)
            .field("call_options", &self.call_options)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// Per-expectation overrides for [`Test::expect_with`](crate::Test::expect_with).
#[derive(Clone, Default)]
pub struct ExpectConfig {
    comparator: Option<Arc<dyn Comparator>>,
}

impl ExpectConfig {
    /// Compare messages with `comparator` instead of the test's comparator.
    pub fn with_comparator(mut self, comparator: impl Comparator + 'static) -> Self {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    pub fn comparator(&self) -> Option<&Arc<dyn Comparator>> {
        self.comparator.as_ref()
    }
}

impl fmt::Debug for ExpectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectConfig")
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::EvtA;

    #[test]
    fn defaults_disable_integrations_and_projections() {
        let config = TestConfig::default();
        assert!(config.verbose());
        assert!(config.start_time().is_none());
        assert!(matches!(
            config.operation_options(),
            [
                OperationOption::EnableHandlerType(HandlerType::Integration, false),
                OperationOption::EnableHandlerType(HandlerType::Projection, false),
            ]
        ));
    }

    #[test]
    fn comparator_can_be_replaced() {
        let config = TestConfig::default().with_comparator(|_: &dyn crate::AnyMessage, _: &dyn crate::AnyMessage| true);
        assert!(config.comparator().equal(&EvtA { value: 1 }, &EvtA { value: 2 }));

        let expect = ExpectConfig::default();
        assert!(expect.comparator().is_none());
    }
}
