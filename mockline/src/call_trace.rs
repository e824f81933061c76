use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{Call, ComponentId, SourceLocation};

/// Attribute that names a component instance; omitted from trace frames.
const NAME_ATTRIBUTE: &str = "name";

/// One line of a call trace: which component ran, in which flow, declared where.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceFrame {
    component: ComponentId,
    attributes: BTreeMap<String, String>,
    flow_name: Arc<str>,
    source: SourceLocation,
}

impl TraceFrame {
    fn from_call(call: &Call) -> Self {
        let mut attributes = call.attributes().clone();
        attributes.remove(NAME_ATTRIBUTE);
        Self {
            component: call.id().clone(),
            attributes,
            flow_name: Arc::from(call.flow_name()),
            source: call.source().clone(),
        }
    }

    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}.{}{{", self.flow_name, self.component)?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}({})", self.source)
    }
}

/// Rebuild a stack-trace-like view of executed components, most recent first.
pub fn build<'a>(calls: impl IntoIterator<Item = &'a Call>) -> Vec<TraceFrame> {
    let mut frames: Vec<TraceFrame> = calls.into_iter().map(TraceFrame::from_call).collect();
    frames.reverse();
    frames
}
