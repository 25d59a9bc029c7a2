//! Domain types shared across crates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of one `ProcessCommand` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generate a fresh random (v4) identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for InvocationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A single line of process output as seen by log stream subscribers.
///
/// Immutable once created; the hub hands out clones to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Invocation that produced this line
    pub invocation_id: InvocationId,
}

impl LogMessage {
    /// Create a message stamped with the current time
    pub fn new(invocation_id: InvocationId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            invocation_id,
        }
    }
}

/// Final result of a successful command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub invocation_id: InvocationId,
    pub sensor_id: String,
    /// Last line the process printed on stdout
    pub value: String,
}

impl CommandResult {
    /// Comma-joined `id,sensor,value` form used by older clients
    pub fn combined(&self) -> String {
        format!("{},{},{}", self.invocation_id, self.sensor_id, self.value)
    }
}

/// Lifecycle of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationPhase {
    #[default]
    Idle,
    Resolving,
    Running,
    Succeeded,
    Failed,
}

impl InvocationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationPhase::Succeeded | InvocationPhase::Failed)
    }
}

impl std::fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationPhase::Idle => write!(f, "idle"),
            InvocationPhase::Resolving => write!(f, "resolving"),
            InvocationPhase::Running => write!(f, "running"),
            InvocationPhase::Succeeded => write!(f, "succeeded"),
            InvocationPhase::Failed => write!(f, "failed"),
        }
    }
}
