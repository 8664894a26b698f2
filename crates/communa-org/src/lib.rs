//! # Communa Organization Domain
//!
//! This crate provides the domain models for the Communa platform's
//! organizational hierarchy: a single tree of units (council, executive
//! council, sectors, ministries, groups) plus the membership and invite
//! records that tie users to units.
//!
//! ## Overview
//!
//! The communa-org crate handles:
//! - **Units**: nodes of the organizational tree with type, slug, and visibility
//! - **Hierarchy policy**: the fixed parent→child type mapping
//! - **Memberships**: per-(user, unit) role and status records
//! - **Invites**: coordinator-proposed admission with accept/reject/expiry
//! - **Roles**: per-unit roles (member, coordinator) and global platform roles
//! - **Slugs**: URL-safe identifier derivation
//!
//! ## Architecture
//!
//! ```text
//! Council
//!   └─ ExecutiveCouncil
//!        └─ Sector
//!             ├─ Ministry ─→ Group
//!             └─ Group
//!
//! User ── Membership ─→ OrgUnit
//!      ── Invite ─────→ OrgUnit (until accepted)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use communa_org::{OrgUnit, OrgUnitType, Membership, OrgRole};
//! use uuid::Uuid;
//!
//! let creator = Uuid::now_v7();
//! let root = OrgUnit::new(OrgUnitType::Council, "General Council", "general-council", None, creator);
//!
//! // The creator becomes the unit's first coordinator
//! let membership = Membership::new(root.id, creator, OrgRole::Coordinator);
//! assert!(membership.is_active_coordinator());
//! ```
//!
//! This crate is pure domain: no storage, no async. The request-scoped
//! engine that enforces the cross-record invariants (slug uniqueness,
//! the last-coordinator guard, pending-invite uniqueness) lives in
//! `communa-engine`.

pub mod hierarchy;
pub mod invite;
pub mod membership;
pub mod roles;
pub mod slug;
pub mod unit;

// Re-export main types for convenience
pub use invite::{Invite, InviteStatus};
pub use membership::{Membership, MembershipStatus};
pub use roles::{GlobalRole, OrgRole};
pub use unit::{GroupCategory, OrgUnit, OrgUnitType, Visibility};
