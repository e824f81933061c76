#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Mockline
//!
//! Interception, mocking and verification for message-pipeline components.
//!
//! Mockline sits between a pipeline and its processors. Every processor built
//! through a [`MockContext`] is wrapped in an [`Interceptable`]: on each
//! invocation it consults the registered behaviors and spies, runs either the
//! real processor or a mocked outcome, and records the call. Tests then verify
//! how often components were called, with which attributes, in which flow.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use mockline::*;
//!
//! struct Logger;
//!
//! impl Processor<String> for Logger {
//!     fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
//!         Ok(envelope)
//!     }
//! }
//!
//! # fn main() -> Result {
//! let ctx = MockContext::<String>::new();
//! ctx.register_class(ProcessorClass::new("Logger").nullary(|| Logger));
//!
//! let logger = ctx.create_interceptable(
//!     "Logger",
//!     ComponentId::parse("logger")?,
//!     BTreeMap::new(),
//!     SourceLocation::new("main.xml", 4),
//!     &[],
//! )?;
//!
//! // Mock it
//! ctx.on_call("logger").then_return("silenced".to_string())?;
//!
//! let out = logger.process(Envelope::new("hello".to_string()).with_flow("main"))?;
//! assert_eq!(out.message(), "silenced");
//!
//! // Verify it
//! ctx.verify_call("logger").times(1)?;
//! assert_eq!(ctx.calls().in_flow("main").count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MockContext`] | Owns registries, the call ledger and pipeline state for one test run |
//! | [`Processor`] | Trait implemented by pipeline components |
//! | [`Interceptable`] | Wraps a real processor and routes its invocations through the context |
//! | [`OnCall`] | Builder for behaviors and spies (`ctx.on_call(..)`, `ctx.spy(..)`) |
//! | [`VerifyCall`] | Builder for cardinality checks (`ctx.verify_call(..)`) |
//! | [`Outcome`] | What a mocked call produces: a message, a transform, or an error |
//! | [`Call`] | One recorded invocation: component, attributes, flow and source |
//! | [`CallQuery`] | Chainable filters over recorded calls |
//! | [`PipelineSync`] | Counts in-flight pipeline executions for verification |
//! | [`ProcessorClass`] | Describes how to construct a processor type |
//!
//! ## Selecting Behaviors
//!
//! Behaviors and spies are keyed by [`ComponentId`] plus attribute predicates.
//! When several apply to a call, the one with the most predicates wins; ties
//! go to the most recently registered one:
//!
//! ```rust,ignore
//! ctx.on_call("jira:create-group").then_return(generic)?;
//! ctx.on_call("jira:create-group")
//!     .with_attribute("groupName", "admins")
//!     .then_return(for_admins)?;
//! ```
//!
//! ## Waiting for Pipelines
//!
//! Pipelines report start and end through [`MockContext::notify_pipeline_start`]
//! and [`MockContext::notify_pipeline_end`], or hold a [`PipelineGuard`].
//! Verification waits until no pipeline is in flight, up to
//! [`MockConfig::settle_timeout`]. From async tests, prefer
//! [`VerifyCall::eventually`], which does not block the runtime thread.
//!
//! ## Features
//!
//! - **`serde`** - Serialization of recorded calls and JSON export
//!   (e.g. [`CallLedger::to_json()`])
//!
//! ## Examples
//!
//! See the `examples/` directory:
//!
//! - `group-flow.rs` - Mocking, spying and verifying a small multi-threaded pipeline

mod attribute;
mod call;
mod call_trace;
mod cardinality;
mod component_id;
mod config;
mod context;
mod envelope;
mod error;
mod event;
mod event_id;
mod interceptor;
mod ledger;
mod meta;
mod on_call;
mod pipeline_sync;
mod processor;
mod query;
mod registry;
mod verify;

pub mod monitoring;
pub mod monitors;
pub mod proxy;

pub use attribute::{AttributeMatcher, Attributes};
pub use call::{Call, SourceLocation};
pub use call_trace::TraceFrame;
pub use cardinality::Cardinality;
pub use component_id::{ComponentId, DEFAULT_NAMESPACE};
pub use config::MockConfig;
pub use context::MockContext;
pub use envelope::Envelope;
pub use error::{Error, VerificationFailure};
pub use event::Event;
pub use event_id::EventId;
pub use interceptor::Interceptable;
pub use ledger::CallLedger;
pub use meta::Meta;
pub use on_call::OnCall;
pub use pipeline_sync::{PipelineGuard, PipelineNotification, PipelineSync};
pub use processor::Processor;
pub use proxy::{ArgValue, Constructor, Instance, ParamType, ProcessorClass, ProxyFactory};
pub use query::CallQuery;
pub use registry::{
    Behavior, Outcome, Registration, Registry, SpyAction, SpyHook, SpyPhase, SpyRegistry,
    spy_action,
};
pub use verify::VerifyCall;

/// Convenience alias for `Result<T, mockline::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
