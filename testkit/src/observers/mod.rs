//! Ready-to-use [`Observer`](crate::Observer) implementations.
//!
//! # Available Observers
//!
//! - [`Tracer`] - Logs facts via the `tracing` crate
//! - [`FactLogger`] - Writes a one-line transcript of each fact to the test log
//! - [`Recorder`] - Records facts to a JSON Lines file (requires `recorder` feature)
//!
//! # Example
//!
//! ```ignore
//! use testkit::{TestConfig, observers::Tracer};
//!
//! let config = TestConfig::default().with_observer(Tracer);
//! ```

mod fact_logger;
pub use fact_logger::FactLogger;

mod tracer;
pub use tracer::Tracer;

#[cfg(feature = "recorder")]
mod recorder;

#[cfg(feature = "recorder")]
#[cfg_attr(docsrs, doc(cfg(feature = "recorder")))]
pub use recorder::Recorder;
