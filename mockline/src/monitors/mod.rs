//! Ready-to-use monitor implementations.
//!
//! This module contains concrete [`Monitor`](crate::monitoring::Monitor)
//! implementations for common use cases like logging and counting.
//!
//! # Available Monitors
//!
//! - [`Tracer`] - Logs the interception lifecycle via `tracing` crate
//! - [`InterceptionStats`] - Counts mocked, real and failed invocations per component
//!
//! # Example
//!
//! ```ignore
//! use mockline::monitors::Tracer;
//!
//! ctx.monitors().add(Tracer);
//! ```

mod tracer;
pub use tracer::Tracer;

mod interception_stats;
pub use interception_stats::InterceptionStats;
