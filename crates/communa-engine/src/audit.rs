//! Audit event emission
//!
//! The engine emits an audit event for every committed mutation. The
//! sink is a collaborator seam: persistence, shipping, and retention
//! are its problem. Emission is fire-and-forget — a sink failure is
//! logged and never fails the operation that produced the event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A single audit record describing one committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: Uuid,

    /// User who performed the action
    pub actor_user_id: Uuid,

    /// Action identifier (e.g. "org_unit.created", "org_invite.accepted")
    pub action: String,

    /// Kind of entity acted on (e.g. "org_unit", "org_invite")
    pub entity_type: String,

    /// Id of the entity acted on
    pub entity_id: Uuid,

    /// Additional structured context
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the event was recorded
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(
        actor_user_id: Uuid,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_user_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id,
            metadata: HashMap::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one audit event.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Audit sink failure.
///
/// Sink failures are logged by the engine and never surfaced to the
/// caller of the operation that produced the event.
#[derive(Debug, thiserror::Error)]
#[error("Failed to record audit event: {0}")]
pub struct AuditError(pub String);

/// In-memory audit sink.
///
/// Suitable for single-process deployments and testing. Events are
/// appended in arrival order and can be inspected with [`events`].
///
/// [`events`]: MemoryAuditSink::events
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in arrival order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Number of recorded events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Check whether no events were recorded.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.write().await.push(event);
        Ok(())
    }
}
