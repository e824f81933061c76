//! Monitoring API for observing interception as it happens.
//!
//! # Overview
//!
//! The monitoring system provides hooks into the interception lifecycle:
//! - Invocation intercepted, mocked, or passed to the real processor
//! - Spy failures and processor errors
//! - Calls recorded in the ledger
//! - Proxy degradation and context resets
//!
//! Hooks run synchronously on the thread that invoked the processor. A
//! monitor that panics is removed and the panic is logged; the invocation
//! itself is not affected.
//!
//! # Example
//!
//! ```ignore
//! use mockline::monitoring::Monitor;
//!
//! struct CallPrinter;
//!
//! impl<E: Event> Monitor<E> for CallPrinter {
//!     fn on_call_recorded(&self, call: &Call) {
//!         println!("[call] #{} {}", call.sequence(), call.id());
//!     }
//! }
//!
//! let id = ctx.monitors().add(CallPrinter);
//! ```

mod monitor;
mod registry;

/// Unique identifier for a registered monitor.
pub type MonitorId = u16;

pub use monitor::Monitor;
pub use registry::MonitorRegistry;
