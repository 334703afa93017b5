//! Busy flags keyed by action kind and target identity.

use std::collections::HashSet;
use std::fmt;

/// Mutating actions exposed by the editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    CreateCollection,
    ForkCollection,
    DeleteCollection,
    CreateKey,
    ForkKey,
    DeleteKey,
    Save,
    Restore,
}

impl OpKind {
    /// Human-readable action label for status messages.
    pub fn label(self) -> &'static str {
        match self {
            OpKind::CreateCollection => "Create database",
            OpKind::ForkCollection => "Fork database",
            OpKind::DeleteCollection => "Delete database",
            OpKind::CreateKey => "Create key",
            OpKind::ForkKey => "Fork key",
            OpKind::DeleteKey => "Delete key",
            OpKind::Save => "Save",
            OpKind::Restore => "Restore version",
        }
    }
}

/// Identity of one in-flight action: what it does and what it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpKey {
    pub kind: OpKind,
    pub target: String,
}

impl OpKey {
    pub fn new(kind: OpKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    /// Key for an action targeting one document of a collection.
    pub fn for_key(kind: OpKind, collection: &str, key: &str) -> Self {
        Self::new(kind, format!("{}/{}", collection, key))
    }
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind.label(), self.target)
    }
}

/// Set of actions currently awaiting a backend reply.
#[derive(Debug, Default)]
pub struct BusyFlags {
    in_flight: HashSet<OpKey>,
}

impl BusyFlags {
    /// Mark `op` in flight.
    ///
    /// # Returns
    /// `false` when the same action on the same target is already in flight.
    pub fn begin(&mut self, op: OpKey) -> bool {
        self.in_flight.insert(op)
    }

    /// Clear `op`; unknown keys are ignored.
    pub fn finish(&mut self, op: &OpKey) {
        self.in_flight.remove(op);
    }

    pub fn is_busy(&self, op: &OpKey) -> bool {
        self.in_flight.contains(op)
    }

    /// Whether any action of `kind` is in flight, regardless of target.
    pub fn is_kind_busy(&self, kind: OpKind) -> bool {
        self.in_flight.iter().any(|op| op.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpKey> {
        self.in_flight.iter()
    }
}
