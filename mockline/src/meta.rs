use std::{fmt, hash, sync::Arc, time::SystemTime};

use crate::EventId;

/// Metadata attached to every [`Envelope`](crate::Envelope).
///
/// - `id`: unique message identifier (UUID v4, not monotonic).
/// - `timestamp`: creation time in nanoseconds since Unix epoch (`u64`).
/// - `flow`: name of the flow (pipeline) the message is travelling through,
///   if the host pipeline supplied one. The interceptor copies it into every
///   recorded [`Call`](crate::Call).
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meta {
    id: EventId,
    timestamp: u64,
    flow: Option<Arc<str>>,
}

impl Meta {
    /// Construct metadata with a fresh id and the current time.
    pub fn new(flow: Option<Arc<str>>) -> Self {
        Self {
            id: EventId::new(),
            timestamp: now_nanos(),
            flow,
        }
    }

    /// Unique identifier for this envelope.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Timestamp in nanoseconds since Unix epoch (u64 truncation).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Name of the flow carrying this message, or `""` when unknown.
    pub fn flow_name(&self) -> &str {
        self.flow.as_deref().unwrap_or_default()
    }

    pub(crate) fn set_flow(&mut self, flow: Arc<str>) {
        self.flow = Some(flow);
    }
}

// A clock set before the epoch reads as zero rather than aborting a test run.
fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event Meta {{ id: {}, timestamp: {}",
            self.id(),
            self.timestamp(),
        )?;
        if let Some(flow) = &self.flow {
            write!(f, ", flow: {}", flow)?;
        }
        write!(f, "}}")?;
        Ok(())
    }
}
