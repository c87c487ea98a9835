#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Testkit
//!
//! Expectation-driven black-box testing for message-based applications.
//!
//! An application is a set of handlers that consume and produce commands,
//! events and timeouts. Testkit runs the application on an in-memory engine,
//! applies actions to it (executing a command, recording an event, advancing a
//! virtual clock, calling user code) and checks each action against a
//! declarative [`Expectation`]. Every expectation produces a human-readable
//! report explaining why it passed or failed, with suggestions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde::Serialize;
//! use testkit::*;
//!
//! #[derive(Debug, PartialEq, Serialize)]
//! struct Deposit {
//!     amount: u64,
//! }
//!
//! impl Message for Deposit {}
//!
//! #[derive(Debug, PartialEq, Serialize)]
//! struct Deposited {
//!     amount: u64,
//! }
//!
//! impl Message for Deposited {}
//!
//! struct Account;
//!
//! impl Handler for Account {
//!     fn configure(&self, c: &mut HandlerConfigurer) {
//!         c.identity("account")
//!             .handles_command::<Deposit>()
//!             .records_event::<Deposited>();
//!     }
//!
//!     fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result {
//!         if let Some(cmd) = message.downcast_ref::<Deposit>() {
//!             scope.record_event(Deposited { amount: cmd.amount });
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct Bank;
//!
//! impl Application for Bank {
//!     fn configure(&self, c: &mut ApplicationConfigurer) {
//!         c.identity("bank").register_aggregate(Account);
//!     }
//! }
//!
//! Test::begin(Bank).expect(
//!     execute_command(Deposit { amount: 100 }),
//!     to_record_event(Deposited { amount: 100 }),
//! );
//! ```
//!
//! A failing expectation logs a report such as:
//!
//! ```text
//! --- expect executing a 'Deposit' command to record a specific 'Deposited' event ---
//!
//! ✗ record a specific 'Deposited' event
//!
//!   | EXPLANATION
//!   |     a similar event was recorded by the 'account' aggregate message handler
//!   |
//!   | SUGGESTIONS
//!   |     • check the content of the message
//!   |
//!   | MESSAGE DIFF
//!   |     Deposited {
//!   |         amount: [-100-]{+10+},
//!   |     }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Trait for commands, events and timeouts |
//! | [`Handler`] | Trait for the application's message handlers |
//! | [`Application`] | Registers the handlers under test |
//! | [`Test`] | Runs actions against the application and checks expectations |
//! | [`Action`] | Something the test does: [`execute_command`], [`record_event`], [`advance_time`], [`call`] |
//! | [`Scenario`] | A reusable, named sequence of actions |
//! | [`Expectation`] | What an action should cause, such as [`to_record_event`] |
//! | [`Engine`] | The synchronous engine that runs the application |
//! | [`Fact`] | A notification of what the engine did |
//!
//! ## Composing Expectations
//!
//! Expectations compose with [`all_of`], [`any_of`], [`none_of`], [`not`] and
//! [`repeat`]. [`satisfy`] evaluates arbitrary user code against the facts an
//! action produced.
//!
//! ## Handler Types
//!
//! By default a test disables integration and projection handlers, so tests
//! exercise domain logic without side effects. Enable them with
//! [`Test::enable_handler_type`] or [`TestConfig::with_operation_option`].
//!
//! ## Features
//!
//! - **`recorder`** - Built-in [`observers::Recorder`] for writing facts to JSON Lines files
//!
//! ## Examples
//!
//! See the `examples/` directory:
//!
//! - `bank.rs` - Accounts, deposits and a scenario shared between tests
//! - `scheduled-reminders.rs` - Timeouts driven by the virtual clock

mod action;
mod application;
mod clock;
mod config;
mod engine;
mod envelope;
mod error;
mod fact;
mod handler;
mod handler_identity;
mod inflect;
mod message;
mod meta;
mod observer;
mod testing_t;

pub mod compare;
pub mod expectation;
pub mod observers;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use action::{
    Action, CallOptions, CommandExecutor, CommandExecutorInterceptor, EventRecorder,
    EventRecorderInterceptor, Interceptor, Scenario, advance_time, call, call_with,
    execute_command, interceptor, record_event,
};
pub use application::{
    Application, ApplicationConfig, ApplicationConfigurer, Direction, HandlerConfig,
    HandlerConfigurer, Route,
};
pub use clock::{
    ByDuration, TimeAdjustment, ToTime, VirtualClock, by_duration, format_duration, format_time,
    to_time,
};
pub use compare::{Comparator, DefaultComparator};
pub use config::{ExpectConfig, TestConfig};
pub use engine::{
    Engine, OperationOption, enable_handler, enable_handler_type, with_current_time,
    with_observer,
};
pub use envelope::Envelope;
pub use error::Error;
pub use expectation::{
    Expectation, MatchError, SatisfyT, all_of, any_of, none_of, not, repeat, satisfy,
    to_execute_command, to_execute_command_like, to_execute_command_matching,
    to_execute_command_of_type, to_only_execute_commands_matching,
    to_only_record_events_matching, to_only_schedule_timeouts_matching, to_record_event,
    to_record_event_like, to_record_event_matching, to_record_event_of_type,
    to_schedule_timeout, to_schedule_timeout_like, to_schedule_timeout_matching,
    to_schedule_timeout_of_type,
};
pub use fact::Fact;
pub use handler::{Handler, HandlerScope, HandlerType};
pub use handler_identity::HandlerIdentity;
pub use message::{AnyMessage, Message, MessageId, MessageKind, MessageType, ValidationError};
pub use meta::{Meta, Origin};
pub use observer::Observer;
pub use test::Test;
pub use testing_t::{StdT, TestingT};

/// Convenience alias for `Result<T, testkit::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
