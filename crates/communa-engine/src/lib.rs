//! # Communa Engine
//!
//! This crate provides the membership and hierarchy engine for the
//! Communa platform: unit creation, the invite lifecycle, the
//! membership ledger, permission resolution, and the org tree query.
//!
//! ## Overview
//!
//! The communa-engine crate handles:
//! - **Unit lifecycle**: Root bootstrap and coordinator-driven child creation
//! - **Invite state machine**: Pending → Accepted / Rejected / Expired / Cancelled
//! - **Membership ledger**: Soft-deleted rows, role changes, the last-coordinator guard
//! - **Permissions**: Capability sets per (actor, unit) pair
//! - **Tree query**: Depth-bounded, visibility-pruned subtree with live member counts
//! - **Audit**: One event per committed mutation, via a pluggable [`AuditSink`]
//!
//! All state lives behind a single `tokio::sync::RwLock`; each mutating
//! operation validates its invariants and writes under one write-guard
//! acquisition, so concurrent requests cannot interleave between a
//! check and its commit.
//!
//! ## Usage
//!
//! ```rust
//! use communa_engine::{Actor, CreateUnitRequest, OrgService, SendInviteRequest};
//! use communa_org::{GlobalRole, OrgUnitType};
//! use uuid::Uuid;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let service = OrgService::new();
//!
//! // Developers bootstrap the root Council
//! let dev = Actor::new(Uuid::now_v7()).with_global_role(GlobalRole::Developer);
//! let root = service
//!     .create_unit(&dev, CreateUnitRequest::new(OrgUnitType::Council, "General Council", None))
//!     .await
//!     .unwrap();
//!
//! // Coordinators invite; invitees respond
//! let member = Actor::new(Uuid::now_v7());
//! service.register_user(member.user_id).await;
//! let invite = service
//!     .send_invite(&dev, root.id, SendInviteRequest::member(member.user_id))
//!     .await
//!     .unwrap();
//! service.respond_to_invite(&member, invite.id, true).await.unwrap();
//! # });
//! ```

pub mod actor;
pub mod audit;
pub mod config;
pub mod error;
pub mod permissions;
pub mod service;
pub mod tree;

mod store;

// Re-export main types
pub use actor::Actor;
pub use audit::{AuditError, AuditEvent, AuditSink, MemoryAuditSink};
pub use config::EngineConfig;
pub use error::{OrgError, OrgResult, Resource};
pub use permissions::UnitPermissions;
pub use service::{CreateUnitRequest, OrgService, SendInviteRequest};
pub use tree::UnitNode;
