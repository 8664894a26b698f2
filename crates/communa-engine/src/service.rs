//! Organization service
//!
//! The request-scoped engine behind the org API: unit creation, the
//! invite state machine, membership role changes and removals, the
//! permission resolver, and the tree query.
//!
//! Every mutating operation acquires the state write guard once,
//! re-validates every invariant it depends on (slug uniqueness, the
//! last-coordinator count, pending-invite uniqueness) under that guard,
//! and only then writes. Two concurrent requests therefore cannot both
//! pass a check that the other's commit invalidates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use communa_org::{
    hierarchy, slug, GlobalRole, GroupCategory, Invite, InviteStatus, Membership, OrgRole,
    OrgUnit, OrgUnitType, Visibility,
};

use crate::actor::Actor;
use crate::audit::{AuditEvent, AuditSink, MemoryAuditSink};
use crate::config::EngineConfig;
use crate::error::{OrgError, OrgResult, Resource};
use crate::permissions::{self, UnitPermissions};
use crate::store::StoreState;
use crate::tree::{self, UnitNode};

/// Request body for creating a child unit (or the root Council).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnitRequest {
    /// Parent unit; None only when creating the root Council
    pub parent_id: Option<Uuid>,

    /// Type of the unit to create
    pub unit_type: OrgUnitType,

    /// Human-readable name (the slug is derived from it)
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Visibility; defaults to Public
    #[serde(default)]
    pub visibility: Option<Visibility>,

    /// Group category; required iff `unit_type` is Group
    #[serde(default)]
    pub group_category: Option<GroupCategory>,

    /// Additional users admitted as coordinators alongside the creator
    #[serde(default)]
    pub coordinator_user_ids: Vec<Uuid>,
}

impl CreateUnitRequest {
    /// Minimal request: everything optional left at its default.
    pub fn new(unit_type: OrgUnitType, name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            parent_id,
            unit_type,
            name: name.into(),
            description: None,
            visibility: None,
            group_category: None,
            coordinator_user_ids: Vec::new(),
        }
    }
}

/// Request body for sending an invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendInviteRequest {
    /// The user to invite
    pub user_id: Uuid,

    /// Proposed role; defaults to Member
    #[serde(default)]
    pub role: Option<OrgRole>,

    /// Optional personal message
    #[serde(default)]
    pub message: Option<String>,
}

impl SendInviteRequest {
    /// Invite `user_id` as a plain member.
    pub fn member(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: None,
            message: None,
        }
    }
}

/// The organization engine.
///
/// Owns the org records behind a single `RwLock`; read queries take
/// the read guard, mutations take the write guard for their whole
/// check-then-write span.
///
/// # Examples
///
/// ```
/// use communa_engine::{Actor, CreateUnitRequest, OrgService};
/// use communa_org::{GlobalRole, OrgUnitType};
/// use uuid::Uuid;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let service = OrgService::new();
/// let dev = Actor::new(Uuid::now_v7()).with_global_role(GlobalRole::Developer);
///
/// let root = service
///     .create_unit(&dev, CreateUnitRequest::new(OrgUnitType::Council, "General Council", None))
///     .await
///     .unwrap();
/// assert_eq!(root.slug, "general-council");
/// # });
/// ```
pub struct OrgService {
    state: RwLock<StoreState>,
    config: EngineConfig,
    audit: Arc<dyn AuditSink>,
}

impl OrgService {
    /// Create an engine with default configuration and an in-memory
    /// audit sink.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            config,
            audit: Arc::new(MemoryAuditSink::new()),
        }
    }

    /// Replace the audit sink.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a user id as known to the platform.
    ///
    /// Stand-in for the external user directory: invitees and
    /// co-coordinators are validated against this set.
    pub async fn register_user(&self, user_id: Uuid) {
        self.state.write().await.users.insert(user_id);
    }

    // ------------------------------------------------------------------
    // Unit creation
    // ------------------------------------------------------------------

    /// Create a unit (§ create child / bootstrap root).
    ///
    /// The root Council may only be created by a Developer and only
    /// once; any other type requires the actor to be an active
    /// coordinator of a parent whose type admits the requested child
    /// type. The creator and any named co-coordinators are admitted as
    /// active coordinators atomically with the unit.
    pub async fn create_unit(&self, actor: &Actor, req: CreateUnitRequest) -> OrgResult<OrgUnit> {
        match (req.unit_type, req.group_category) {
            (OrgUnitType::Group, None) => {
                return Err(OrgError::InvalidField(
                    "group_category is required for groups".into(),
                ))
            }
            (t, Some(_)) if t != OrgUnitType::Group => {
                return Err(OrgError::InvalidField(
                    "group_category is only valid for groups".into(),
                ))
            }
            _ => {}
        }

        let mut state = self.state.write().await;

        if req.unit_type.is_root() {
            if !actor.has_global_role(GlobalRole::Developer) {
                return Err(OrgError::PermissionDenied);
            }
            if req.parent_id.is_some() {
                return Err(OrgError::InvalidField(
                    "the root council cannot have a parent".into(),
                ));
            }
            if state.active_root().is_some() {
                return Err(OrgError::AlreadyExists(
                    "an active root council already exists".into(),
                ));
            }
        } else {
            let parent_id = req.parent_id.ok_or_else(|| {
                OrgError::InvalidField("parent_id is required for non-root units".into())
            })?;
            let parent = state
                .units
                .get(&parent_id)
                .filter(|u| u.is_active)
                .ok_or(OrgError::NotFound(Resource::Unit))?;

            // Visibility gates every mutation before its own checks
            if !state.visible_to(actor, parent) {
                return Err(OrgError::PermissionDenied);
            }
            if !state.is_coordinator(actor.user_id, parent_id) {
                return Err(OrgError::PermissionDenied);
            }
            if !hierarchy::is_valid_child(parent.unit_type, req.unit_type) {
                return Err(OrgError::InvalidHierarchy);
            }
        }

        // Slug allocation happens under the same guard as the insert,
        // so the uniqueness check is authoritative.
        let base = slug::slugify(&req.name);
        if base.is_empty() {
            return Err(OrgError::InvalidField(
                "name must contain at least one alphanumeric character".into(),
            ));
        }
        let unit_slug = (1..=self.config.max_slug_attempts)
            .map(|attempt| slug::candidate(&base, attempt))
            .find(|candidate| !state.slug_taken(candidate))
            .ok_or_else(|| OrgError::AlreadyExists(format!("no free slug for '{base}'")))?;

        let mut unit = OrgUnit::new(req.unit_type, req.name, unit_slug, req.parent_id, actor.user_id);
        unit.description = req.description;
        unit.visibility = req.visibility.unwrap_or_default();
        unit.group_category = req.group_category;
        let unit_id = unit.id;

        state.units.insert(unit_id, unit.clone());

        // Creator is the unit's first coordinator
        let creator = Membership::new(unit_id, actor.user_id, OrgRole::Coordinator);
        state.memberships.insert(creator.id, creator);

        // Extra coordinators: duplicates and unknown user ids are
        // skipped, never fatal
        for coordinator_id in req.coordinator_user_ids {
            if coordinator_id == actor.user_id || state.is_member(coordinator_id, unit_id) {
                continue;
            }
            if !state.users.contains(&coordinator_id) {
                debug!(user_id = %coordinator_id, "skipping unknown co-coordinator");
                continue;
            }
            let membership = Membership::new(unit_id, coordinator_id, OrgRole::Coordinator);
            state.memberships.insert(membership.id, membership);
        }

        drop(state);

        info!(
            unit_id = %unit_id,
            unit_type = unit.unit_type.as_str(),
            slug = %unit.slug,
            "created org unit"
        );
        self.emit(
            AuditEvent::new(actor.user_id, "org_unit.created", "org_unit", unit_id)
                .with_metadata("unit_type", serde_json::json!(unit.unit_type.as_str()))
                .with_metadata("slug", serde_json::json!(unit.slug)),
        )
        .await;

        Ok(unit)
    }

    // ------------------------------------------------------------------
    // Invite state machine
    // ------------------------------------------------------------------

    /// Send an invite (coordinator-only).
    pub async fn send_invite(
        &self,
        actor: &Actor,
        org_unit_id: Uuid,
        req: SendInviteRequest,
    ) -> OrgResult<Invite> {
        let mut state = self.state.write().await;

        let unit = state
            .units
            .get(&org_unit_id)
            .filter(|u| u.is_active)
            .ok_or(OrgError::NotFound(Resource::Unit))?;
        if !state.visible_to(actor, unit) {
            return Err(OrgError::PermissionDenied);
        }
        if !state.is_coordinator(actor.user_id, org_unit_id) {
            return Err(OrgError::PermissionDenied);
        }
        if !state.users.contains(&req.user_id) {
            return Err(OrgError::NotFound(Resource::User));
        }
        if state.is_member(req.user_id, org_unit_id) {
            return Err(OrgError::AlreadyMember);
        }

        let now = Utc::now();
        // A stale pending invite is lazily expired instead of blocking
        // the retry
        let stale_id = match state.pending_invite(org_unit_id, req.user_id) {
            Some(existing) if existing.is_expired(now) => Some(existing.id),
            Some(_) => return Err(OrgError::InviteExists),
            None => None,
        };
        if let Some(id) = stale_id {
            if let Some(stale) = state.invites.get_mut(&id) {
                stale.status = InviteStatus::Expired;
            }
        }

        let mut invite = Invite::new(
            org_unit_id,
            req.user_id,
            actor.user_id,
            req.role.unwrap_or_default(),
            self.config.invite_expiration_days,
        );
        invite.message = req.message;
        state.invites.insert(invite.id, invite.clone());
        drop(state);

        debug!(invite_id = %invite.id, unit_id = %org_unit_id, "invite sent");
        self.emit(
            AuditEvent::new(actor.user_id, "org_invite.sent", "org_invite", invite.id)
                .with_metadata("org_unit_id", serde_json::json!(org_unit_id))
                .with_metadata("invited_user_id", serde_json::json!(invite.invited_user_id)),
        )
        .await;

        Ok(invite)
    }

    /// Accept or reject an invite (invitee-only).
    ///
    /// A past-deadline invite is transitioned to Expired here and the
    /// call fails with `InviteExpired` — never a silent success.
    pub async fn respond_to_invite(
        &self,
        actor: &Actor,
        invite_id: Uuid,
        accept: bool,
    ) -> OrgResult<Invite> {
        let mut state = self.state.write().await;

        let invite = state
            .invites
            .get(&invite_id)
            .ok_or(OrgError::NotFound(Resource::Invite))?;
        if invite.invited_user_id != actor.user_id {
            return Err(OrgError::PermissionDenied);
        }
        if invite.status.is_terminal() {
            return Err(OrgError::NotPending);
        }

        let now = Utc::now();
        let org_unit_id = invite.org_unit_id;
        let proposed_role = invite.role;

        if invite.is_expired(now) {
            if let Some(inv) = state.invites.get_mut(&invite_id) {
                inv.status = InviteStatus::Expired;
            }
            drop(state);
            self.emit(AuditEvent::new(
                actor.user_id,
                "org_invite.expired",
                "org_invite",
                invite_id,
            ))
            .await;
            return Err(OrgError::InviteExpired);
        }

        if accept {
            // Uniqueness re-check: the user may have been admitted
            // directly since the invite was sent
            if state.is_member(actor.user_id, org_unit_id) {
                return Err(OrgError::AlreadyMember);
            }
            let membership =
                Membership::new(org_unit_id, actor.user_id, proposed_role).with_invite(invite_id);
            state.memberships.insert(membership.id, membership);
        }

        let updated = {
            let inv = state
                .invites
                .get_mut(&invite_id)
                .ok_or_else(|| OrgError::Internal("invite vanished mid-transaction".into()))?;
            inv.status = if accept {
                InviteStatus::Accepted
            } else {
                InviteStatus::Rejected
            };
            inv.responded_at = Some(now);
            inv.clone()
        };
        drop(state);

        let action = if accept {
            "org_invite.accepted"
        } else {
            "org_invite.rejected"
        };
        info!(invite_id = %invite_id, unit_id = %org_unit_id, action, "invite resolved");
        self.emit(AuditEvent::new(actor.user_id, action, "org_invite", invite_id)).await;

        Ok(updated)
    }

    /// Withdraw a pending invite (coordinator of the unit only).
    pub async fn cancel_invite(&self, actor: &Actor, invite_id: Uuid) -> OrgResult<Invite> {
        let mut state = self.state.write().await;

        let invite = state
            .invites
            .get(&invite_id)
            .ok_or(OrgError::NotFound(Resource::Invite))?;
        let org_unit_id = invite.org_unit_id;
        let terminal = invite.status.is_terminal();

        if !state.is_coordinator(actor.user_id, org_unit_id) {
            return Err(OrgError::PermissionDenied);
        }
        if terminal {
            return Err(OrgError::NotPending);
        }

        let updated = {
            let inv = state
                .invites
                .get_mut(&invite_id)
                .ok_or_else(|| OrgError::Internal("invite vanished mid-transaction".into()))?;
            inv.status = InviteStatus::Cancelled;
            inv.clone()
        };
        drop(state);

        info!(invite_id = %invite_id, unit_id = %org_unit_id, "invite cancelled");
        self.emit(AuditEvent::new(actor.user_id, "org_invite.cancelled", "org_invite", invite_id))
            .await;

        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Membership ledger
    // ------------------------------------------------------------------

    /// Change a member's role (coordinator-only).
    ///
    /// Demoting an active coordinator is refused while they are the
    /// unit's last one; the count is taken under the write guard, so
    /// two concurrent demotions cannot both pass.
    pub async fn update_member_role(
        &self,
        actor: &Actor,
        org_unit_id: Uuid,
        target_user_id: Uuid,
        new_role: OrgRole,
    ) -> OrgResult<Membership> {
        let mut state = self.state.write().await;

        let unit = state
            .units
            .get(&org_unit_id)
            .filter(|u| u.is_active)
            .ok_or(OrgError::NotFound(Resource::Unit))?;
        if !state.visible_to(actor, unit) {
            return Err(OrgError::PermissionDenied);
        }
        if !state.is_coordinator(actor.user_id, org_unit_id) {
            return Err(OrgError::PermissionDenied);
        }

        let membership = state
            .active_membership(target_user_id, org_unit_id)
            .ok_or(OrgError::NotFound(Resource::Member))?;
        let membership_id = membership.id;
        let demoting_coordinator =
            membership.role.is_coordinator() && !new_role.is_coordinator();

        if demoting_coordinator && state.active_coordinator_count(org_unit_id) <= 1 {
            return Err(OrgError::LastCoordinator);
        }

        let updated = {
            let m = state
                .memberships
                .get_mut(&membership_id)
                .ok_or_else(|| OrgError::Internal("membership vanished mid-transaction".into()))?;
            m.role = new_role;
            m.clone()
        };
        drop(state);

        info!(
            unit_id = %org_unit_id,
            target = %target_user_id,
            new_role = new_role.as_str(),
            "member role updated"
        );
        self.emit(
            AuditEvent::new(actor.user_id, "org_member.role_updated", "org_membership", membership_id)
                .with_metadata("org_unit_id", serde_json::json!(org_unit_id))
                .with_metadata("new_role", serde_json::json!(new_role.as_str())),
        )
        .await;

        Ok(updated)
    }

    /// Remove a member; targeting oneself is "leave".
    ///
    /// Soft delete: the row is retained with status Removed. Removing
    /// a unit's last active coordinator is refused regardless of who
    /// initiates it.
    pub async fn remove_member(
        &self,
        actor: &Actor,
        org_unit_id: Uuid,
        target_user_id: Uuid,
    ) -> OrgResult<()> {
        let mut state = self.state.write().await;

        let unit = state
            .units
            .get(&org_unit_id)
            .filter(|u| u.is_active)
            .ok_or(OrgError::NotFound(Resource::Unit))?;

        let is_self = actor.user_id == target_user_id;
        if !is_self {
            if !state.visible_to(actor, unit) {
                return Err(OrgError::PermissionDenied);
            }
            if !state.is_coordinator(actor.user_id, org_unit_id) {
                return Err(OrgError::PermissionDenied);
            }
        }

        let membership = state
            .active_membership(target_user_id, org_unit_id)
            .ok_or(OrgError::NotFound(Resource::Member))?;
        let membership_id = membership.id;

        if membership.role.is_coordinator() && state.active_coordinator_count(org_unit_id) <= 1 {
            return Err(OrgError::LastCoordinator);
        }

        let now = Utc::now();
        if let Some(m) = state.memberships.get_mut(&membership_id) {
            m.remove(now);
        }
        drop(state);

        info!(unit_id = %org_unit_id, target = %target_user_id, self_removal = is_self, "member removed");
        self.emit(
            AuditEvent::new(actor.user_id, "org_member.removed", "org_membership", membership_id)
                .with_metadata("org_unit_id", serde_json::json!(org_unit_id))
                .with_metadata("self_removal", serde_json::json!(is_self)),
        )
        .await;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Read queries
    // ------------------------------------------------------------------

    /// Unit details, honoring visibility.
    pub async fn unit(&self, actor: &Actor, org_unit_id: Uuid) -> OrgResult<OrgUnit> {
        let state = self.state.read().await;
        let unit = state
            .units
            .get(&org_unit_id)
            .filter(|u| u.is_active)
            .ok_or(OrgError::NotFound(Resource::Unit))?;
        if !state.visible_to(actor, unit) {
            return Err(OrgError::PermissionDenied);
        }
        Ok(unit.clone())
    }

    /// The capability set of `actor` over one unit.
    pub async fn permissions(&self, actor: &Actor, org_unit_id: Uuid) -> OrgResult<UnitPermissions> {
        let state = self.state.read().await;
        if !state.units.contains_key(&org_unit_id) {
            return Err(OrgError::NotFound(Resource::Unit));
        }
        Ok(permissions::resolve(&state, actor, org_unit_id))
    }

    /// The visible tree from the root, depth-bounded.
    ///
    /// Returns None when no active root exists or the root itself is
    /// not visible to the actor.
    pub async fn org_tree(&self, actor: &Actor) -> Option<UnitNode> {
        let state = self.state.read().await;
        let root = state.active_root()?.clone();
        if !state.visible_to(actor, &root) {
            return None;
        }
        Some(tree::build_subtree(&state, actor, &root, self.config.max_tree_depth))
    }

    /// Active members of a unit, coordinators first.
    pub async fn list_members(&self, actor: &Actor, org_unit_id: Uuid) -> OrgResult<Vec<Membership>> {
        let state = self.state.read().await;
        let unit = state
            .units
            .get(&org_unit_id)
            .filter(|u| u.is_active)
            .ok_or(OrgError::NotFound(Resource::Unit))?;
        if !state.visible_to(actor, unit) {
            return Err(OrgError::PermissionDenied);
        }
        Ok(state
            .active_members(org_unit_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Pending invites of a unit (coordinator-only), most recent first.
    ///
    /// Stale pendings are lazily expired before listing.
    pub async fn pending_invites_for_unit(
        &self,
        actor: &Actor,
        org_unit_id: Uuid,
    ) -> OrgResult<Vec<Invite>> {
        let mut state = self.state.write().await;
        if !state
            .units
            .get(&org_unit_id)
            .is_some_and(|u| u.is_active)
        {
            return Err(OrgError::NotFound(Resource::Unit));
        }
        if !state.is_coordinator(actor.user_id, org_unit_id) {
            return Err(OrgError::PermissionDenied);
        }

        expire_stale(&mut state, Utc::now());

        let mut invites: Vec<Invite> = state
            .invites
            .values()
            .filter(|i| i.org_unit_id == org_unit_id && i.status == InviteStatus::Pending)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    /// The actor's own pending invites, most recent first.
    pub async fn pending_invites_for_user(&self, actor: &Actor) -> Vec<Invite> {
        let mut state = self.state.write().await;
        expire_stale(&mut state, Utc::now());

        let mut invites: Vec<Invite> = state
            .invites
            .values()
            .filter(|i| i.invited_user_id == actor.user_id && i.status == InviteStatus::Pending)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        invites
    }

    /// The actor's own active memberships, oldest first.
    pub async fn memberships_for_user(&self, actor: &Actor) -> Vec<Membership> {
        let state = self.state.read().await;
        let mut memberships: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.user_id == actor.user_id && m.is_active())
            .cloned()
            .collect();
        memberships.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        memberships
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event).await {
            warn!(error = %err, "audit sink rejected event");
        }
    }
}

impl Default for OrgService {
    fn default() -> Self {
        Self::new()
    }
}

/// Flip every past-deadline Pending invite to Expired.
///
/// Runs on the invite read paths; expiry is never driven by a timer.
fn expire_stale(state: &mut StoreState, now: DateTime<Utc>) {
    for invite in state.invites.values_mut() {
        if invite.status == InviteStatus::Pending && invite.is_expired(now) {
            invite.status = InviteStatus::Expired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;

    fn developer() -> Actor {
        Actor::new(Uuid::now_v7()).with_global_role(GlobalRole::Developer)
    }

    fn group_request(parent_id: Uuid, name: &str) -> CreateUnitRequest {
        let mut req = CreateUnitRequest::new(OrgUnitType::Group, name, Some(parent_id));
        req.group_category = Some(GroupCategory::Welcome);
        req
    }

    /// Bootstraps Council → ExecutiveCouncil → Sector with `coordinator`
    /// added as a co-coordinator of the sector. Returns the sector id.
    async fn setup_sector(service: &OrgService, dev: &Actor, coordinator: &Actor) -> Uuid {
        service.register_user(coordinator.user_id).await;

        let root = service
            .create_unit(dev, CreateUnitRequest::new(OrgUnitType::Council, "General Council", None))
            .await
            .unwrap();
        let exec = service
            .create_unit(
                dev,
                CreateUnitRequest::new(OrgUnitType::ExecutiveCouncil, "Executive Council", Some(root.id)),
            )
            .await
            .unwrap();
        let mut sector_req =
            CreateUnitRequest::new(OrgUnitType::Sector, "Youth Sector", Some(exec.id));
        sector_req.coordinator_user_ids = vec![coordinator.user_id];
        let sector = service.create_unit(dev, sector_req).await.unwrap();
        sector.id
    }

    #[tokio::test]
    async fn test_root_creation_requires_developer() {
        let service = OrgService::new();
        let plain = Actor::new(Uuid::now_v7());
        let admin = Actor::new(Uuid::now_v7()).with_global_role(GlobalRole::Admin);

        let req = CreateUnitRequest::new(OrgUnitType::Council, "Council", None);
        assert!(matches!(
            service.create_unit(&plain, req.clone()).await,
            Err(OrgError::PermissionDenied)
        ));
        assert!(matches!(
            service.create_unit(&admin, req.clone()).await,
            Err(OrgError::PermissionDenied)
        ));

        let dev = developer();
        let root = service.create_unit(&dev, req.clone()).await.unwrap();
        assert!(root.is_root());

        // A second active root is refused
        assert!(matches!(
            service.create_unit(&dev, req).await,
            Err(OrgError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_root_cannot_have_parent() {
        let service = OrgService::new();
        let dev = developer();
        let req = CreateUnitRequest::new(OrgUnitType::Council, "Council", Some(Uuid::now_v7()));
        assert!(matches!(
            service.create_unit(&dev, req).await,
            Err(OrgError::InvalidField(_))
        ));
    }

    #[tokio::test]
    async fn test_non_root_requires_parent_and_coordinator() {
        let service = OrgService::new();
        let dev = developer();
        let root = service
            .create_unit(&dev, CreateUnitRequest::new(OrgUnitType::Council, "Council", None))
            .await
            .unwrap();

        // Missing parent
        let req = CreateUnitRequest::new(OrgUnitType::ExecutiveCouncil, "Exec", None);
        assert!(matches!(
            service.create_unit(&dev, req).await,
            Err(OrgError::InvalidField(_))
        ));

        // Unknown parent
        let req = CreateUnitRequest::new(OrgUnitType::ExecutiveCouncil, "Exec", Some(Uuid::now_v7()));
        assert!(matches!(
            service.create_unit(&dev, req).await,
            Err(OrgError::NotFound(Resource::Unit))
        ));

        // Non-coordinator of the parent
        let outsider = Actor::new(Uuid::now_v7());
        let req = CreateUnitRequest::new(OrgUnitType::ExecutiveCouncil, "Exec", Some(root.id));
        assert!(matches!(
            service.create_unit(&outsider, req).await,
            Err(OrgError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn test_scenario_a_ministry_under_sector() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        // C creates a ministry with no extra coordinators
        let ministry = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Music Ministry", Some(sector_id)),
            )
            .await
            .unwrap();
        assert_eq!(ministry.parent_id, Some(sector_id));

        // C is the sole active coordinator of the ministry
        let members = service.list_members(&coordinator, ministry.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, coordinator.user_id);
        assert_eq!(members[0].role, OrgRole::Coordinator);

        // A ministry cannot create sectors
        let bad = CreateUnitRequest::new(OrgUnitType::Sector, "Nested Sector", Some(ministry.id));
        assert!(matches!(
            service.create_unit(&coordinator, bad).await,
            Err(OrgError::InvalidHierarchy)
        ));

        let perms = service.permissions(&coordinator, ministry.id).await.unwrap();
        assert!(!perms.allowed_child_types.contains(&OrgUnitType::Sector));
    }

    #[tokio::test]
    async fn test_group_category_validation() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        // Group without a category
        let req = CreateUnitRequest::new(OrgUnitType::Group, "Welcome Group", Some(sector_id));
        assert!(matches!(
            service.create_unit(&coordinator, req).await,
            Err(OrgError::InvalidField(_))
        ));

        // Category on a non-group
        let mut req = CreateUnitRequest::new(OrgUnitType::Ministry, "Music", Some(sector_id));
        req.group_category = Some(GroupCategory::Course);
        assert!(matches!(
            service.create_unit(&coordinator, req).await,
            Err(OrgError::InvalidField(_))
        ));

        // Valid group
        let group = service
            .create_unit(&coordinator, group_request(sector_id, "Welcome Group"))
            .await
            .unwrap();
        assert_eq!(group.group_category, Some(GroupCategory::Welcome));
    }

    #[tokio::test]
    async fn test_slug_collisions_get_numeric_suffixes() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let first = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Música", Some(sector_id)),
            )
            .await
            .unwrap();
        let second = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Musica", Some(sector_id)),
            )
            .await
            .unwrap();
        let third = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "musica!", Some(sector_id)),
            )
            .await
            .unwrap();

        assert_eq!(first.slug, "musica");
        assert_eq!(second.slug, "musica-2");
        assert_eq!(third.slug, "musica-3");
    }

    #[tokio::test]
    async fn test_co_coordinators_skip_unknown_and_duplicates() {
        let service = OrgService::new();
        let dev = developer();
        let known = Uuid::now_v7();
        service.register_user(known).await;
        let unknown = Uuid::now_v7();

        let root = service
            .create_unit(&dev, CreateUnitRequest::new(OrgUnitType::Council, "Council", None))
            .await
            .unwrap();

        let mut req = CreateUnitRequest::new(OrgUnitType::ExecutiveCouncil, "Exec", Some(root.id));
        req.coordinator_user_ids = vec![known, unknown, known, dev.user_id];
        let exec = service.create_unit(&dev, req).await.unwrap();

        let members = service.list_members(&dev, exec.id).await.unwrap();
        assert_eq!(members.len(), 2); // dev + known, unknown skipped
        assert!(members.iter().all(|m| m.role == OrgRole::Coordinator));
    }

    #[tokio::test]
    async fn test_scenario_b_invite_round_trip_and_uniqueness() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;
        let ministry = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Music", Some(sector_id)),
            )
            .await
            .unwrap();

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;

        let invite = service
            .send_invite(&coordinator, ministry.id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();
        assert_eq!(invite.status, InviteStatus::Pending);

        // Second invite while the first is pending
        assert!(matches!(
            service
                .send_invite(&coordinator, ministry.id, SendInviteRequest::member(invitee.user_id))
                .await,
            Err(OrgError::InviteExists)
        ));

        let accepted = service.respond_to_invite(&invitee, invite.id, true).await.unwrap();
        assert_eq!(accepted.status, InviteStatus::Accepted);
        assert!(accepted.responded_at.is_some());

        // Exactly one active membership with the proposed role
        let memberships = service.memberships_for_user(&invitee).await;
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].org_unit_id, ministry.id);
        assert_eq!(memberships[0].role, OrgRole::Member);
        assert_eq!(memberships[0].invite_id, Some(invite.id));

        // Inviting an existing member
        assert!(matches!(
            service
                .send_invite(&coordinator, ministry.id, SendInviteRequest::member(invitee.user_id))
                .await,
            Err(OrgError::AlreadyMember)
        ));
    }

    #[tokio::test]
    async fn test_invite_permission_and_unknown_invitee() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        // Unknown invitee
        assert!(matches!(
            service
                .send_invite(&coordinator, sector_id, SendInviteRequest::member(Uuid::now_v7()))
                .await,
            Err(OrgError::NotFound(Resource::User))
        ));

        // Plain members cannot invite
        let member = Actor::new(Uuid::now_v7());
        service.register_user(member.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(member.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&member, invite.id, true).await.unwrap();

        let other = Uuid::now_v7();
        service.register_user(other).await;
        assert!(matches!(
            service
                .send_invite(&member, sector_id, SendInviteRequest::member(other))
                .await,
            Err(OrgError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn test_invite_terminal_states_never_transition_again() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;

        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&invitee, invite.id, false).await.unwrap();

        // Repeated responses fail NotPending, in both directions
        assert!(matches!(
            service.respond_to_invite(&invitee, invite.id, true).await,
            Err(OrgError::NotPending)
        ));
        assert!(matches!(
            service.respond_to_invite(&invitee, invite.id, false).await,
            Err(OrgError::NotPending)
        ));

        // And no membership was created by the rejection
        assert!(service.memberships_for_user(&invitee).await.is_empty());
    }

    #[tokio::test]
    async fn test_respond_requires_the_invitee() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();

        let stranger = Actor::new(Uuid::now_v7());
        assert!(matches!(
            service.respond_to_invite(&stranger, invite.id, true).await,
            Err(OrgError::PermissionDenied)
        ));
        assert!(matches!(
            service.respond_to_invite(&invitee, Uuid::now_v7(), true).await,
            Err(OrgError::NotFound(Resource::Invite))
        ));
    }

    #[tokio::test]
    async fn test_scenario_e_expired_invite() {
        let config = EngineConfig {
            invite_expiration_days: -1, // already past deadline
            ..EngineConfig::default()
        };
        let service = OrgService::with_config(config);
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();

        assert!(matches!(
            service.respond_to_invite(&invitee, invite.id, true).await,
            Err(OrgError::InviteExpired)
        ));

        // The stored status transitioned to Expired, and stays there
        assert!(matches!(
            service.respond_to_invite(&invitee, invite.id, true).await,
            Err(OrgError::NotPending)
        ));
        assert!(service.memberships_for_user(&invitee).await.is_empty());

        // An expired pending no longer blocks a fresh invite
        let retry = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();
        assert_eq!(retry.status, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_invite() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();

        // The invitee cannot cancel
        assert!(matches!(
            service.cancel_invite(&invitee, invite.id).await,
            Err(OrgError::PermissionDenied)
        ));

        let cancelled = service.cancel_invite(&coordinator, invite.id).await.unwrap();
        assert_eq!(cancelled.status, InviteStatus::Cancelled);

        assert!(matches!(
            service.respond_to_invite(&invitee, invite.id, true).await,
            Err(OrgError::NotPending)
        ));
    }

    #[tokio::test]
    async fn test_membership_is_scoped_per_unit() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();

        // Co-coordinator admission into a sibling ministry does not
        // collide with the pending sector invite
        let mut req = CreateUnitRequest::new(OrgUnitType::Ministry, "Choir", Some(sector_id));
        req.coordinator_user_ids = vec![invitee.user_id];
        service.create_unit(&coordinator, req).await.unwrap();

        let accepted = service.respond_to_invite(&invitee, invite.id, true).await.unwrap();
        assert_eq!(accepted.status, InviteStatus::Accepted);

        let memberships = service.memberships_for_user(&invitee).await;
        assert_eq!(memberships.len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_c_last_coordinator_guard_on_demotion() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;
        let ministry = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Music", Some(sector_id)),
            )
            .await
            .unwrap();

        // Sole coordinator cannot demote themselves
        assert!(matches!(
            service
                .update_member_role(&coordinator, ministry.id, coordinator.user_id, OrgRole::Member)
                .await,
            Err(OrgError::LastCoordinator)
        ));

        // Admit U and promote them to coordinator
        let u = Actor::new(Uuid::now_v7());
        service.register_user(u.user_id).await;
        let invite = service
            .send_invite(&coordinator, ministry.id, SendInviteRequest::member(u.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&u, invite.id, true).await.unwrap();
        service
            .update_member_role(&coordinator, ministry.id, u.user_id, OrgRole::Coordinator)
            .await
            .unwrap();

        // Now the same self-demotion succeeds
        let demoted = service
            .update_member_role(&coordinator, ministry.id, coordinator.user_id, OrgRole::Member)
            .await
            .unwrap();
        assert_eq!(demoted.role, OrgRole::Member);
    }

    #[tokio::test]
    async fn test_last_coordinator_guard_on_removal_and_leave() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;
        let ministry = service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Music", Some(sector_id)),
            )
            .await
            .unwrap();

        // Leaving as the sole coordinator is refused
        assert!(matches!(
            service
                .remove_member(&coordinator, ministry.id, coordinator.user_id)
                .await,
            Err(OrgError::LastCoordinator)
        ));

        // A plain member can leave freely
        let member = Actor::new(Uuid::now_v7());
        service.register_user(member.user_id).await;
        let invite = service
            .send_invite(&coordinator, ministry.id, SendInviteRequest::member(member.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&member, invite.id, true).await.unwrap();

        service
            .remove_member(&member, ministry.id, member.user_id)
            .await
            .unwrap();
        assert!(service.memberships_for_user(&member).await.is_empty());

        // Removing them again: the live row is gone
        assert!(matches!(
            service.remove_member(&member, ministry.id, member.user_id).await,
            Err(OrgError::NotFound(Resource::Member))
        ));
    }

    #[tokio::test]
    async fn test_remove_member_permissions() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let member = Actor::new(Uuid::now_v7());
        service.register_user(member.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(member.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&member, invite.id, true).await.unwrap();

        // A third party cannot remove someone else
        let stranger = Actor::new(Uuid::now_v7());
        assert!(matches!(
            service.remove_member(&stranger, sector_id, member.user_id).await,
            Err(OrgError::PermissionDenied)
        ));

        // A coordinator can
        service
            .remove_member(&coordinator, sector_id, member.user_id)
            .await
            .unwrap();
        let members = service.list_members(&coordinator, sector_id).await.unwrap();
        assert!(members.iter().all(|m| m.user_id != member.user_id));
    }

    #[tokio::test]
    async fn test_rejoin_after_leave_via_new_invite() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let member = Actor::new(Uuid::now_v7());
        service.register_user(member.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(member.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&member, invite.id, true).await.unwrap();
        service.remove_member(&member, sector_id, member.user_id).await.unwrap();

        // The soft-deleted row does not block a fresh admission
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(member.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&member, invite.id, true).await.unwrap();

        let memberships = service.memberships_for_user(&member).await;
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].org_unit_id, sector_id);
    }

    #[tokio::test]
    async fn test_scenario_d_restricted_unit_hides_everything_from_outsiders() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let mut req = CreateUnitRequest::new(OrgUnitType::Ministry, "Intercession", Some(sector_id));
        req.visibility = Some(Visibility::Restricted);
        let ministry = service.create_unit(&coordinator, req).await.unwrap();

        let outsider = Actor::new(Uuid::now_v7());
        let perms = service.permissions(&outsider, ministry.id).await.unwrap();
        assert!(!perms.can_view);
        assert!(!perms.can_view_members);
        assert!(!perms.can_invite);
        assert!(!perms.can_create_child);
        assert!(!perms.can_edit);
        assert!(!perms.can_manage_members);

        // Reads are refused outright
        assert!(matches!(
            service.unit(&outsider, ministry.id).await,
            Err(OrgError::PermissionDenied)
        ));
        assert!(matches!(
            service.list_members(&outsider, ministry.id).await,
            Err(OrgError::PermissionDenied)
        ));

        // Visibility is evaluated before the operation's own checks
        assert!(matches!(
            service
                .update_member_role(&outsider, ministry.id, coordinator.user_id, OrgRole::Member)
                .await,
            Err(OrgError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn test_tree_query_prunes_and_counts() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let mut restricted =
            CreateUnitRequest::new(OrgUnitType::Ministry, "Hidden", Some(sector_id));
        restricted.visibility = Some(Visibility::Restricted);
        service.create_unit(&coordinator, restricted).await.unwrap();
        service
            .create_unit(
                &coordinator,
                CreateUnitRequest::new(OrgUnitType::Ministry, "Visible", Some(sector_id)),
            )
            .await
            .unwrap();

        let outsider = Actor::new(Uuid::now_v7());
        let tree = service.org_tree(&outsider).await.unwrap();

        // root → exec → sector → only the public ministry
        assert_eq!(tree.unit_type, OrgUnitType::Council);
        let exec = &tree.children[0];
        let sector = &exec.children[0];
        assert_eq!(sector.id, sector_id);
        assert_eq!(sector.children.len(), 1);
        assert_eq!(sector.children[0].name, "Visible");

        // Member counts are live: dev + coordinator in the sector
        assert_eq!(sector.member_count, 2);

        // The coordinator sees both ministries
        let tree = service.org_tree(&coordinator).await.unwrap();
        let sector = &tree.children[0].children[0];
        assert_eq!(sector.children.len(), 2);
    }

    #[tokio::test]
    async fn test_tree_absent_without_root() {
        let service = OrgService::new();
        let actor = Actor::new(Uuid::now_v7());
        assert!(service.org_tree(&actor).await.is_none());
    }

    #[tokio::test]
    async fn test_pending_invite_listings() {
        let service = OrgService::new();
        let dev = developer();
        let coordinator = Actor::new(Uuid::now_v7());
        let sector_id = setup_sector(&service, &dev, &coordinator).await;

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&coordinator, sector_id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();

        // Coordinator sees the unit's pending invites
        let pending = service
            .pending_invites_for_unit(&coordinator, sector_id)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, invite.id);

        // Plain members do not
        assert!(matches!(
            service.pending_invites_for_unit(&invitee, sector_id).await,
            Err(OrgError::PermissionDenied)
        ));

        // The invitee sees their own
        let mine = service.pending_invites_for_user(&invitee).await;
        assert_eq!(mine.len(), 1);

        service.respond_to_invite(&invitee, invite.id, true).await.unwrap();
        assert!(service.pending_invites_for_user(&invitee).await.is_empty());
    }

    #[tokio::test]
    async fn test_audit_trail_records_mutations() {
        let sink = Arc::new(MemoryAuditSink::new());
        let service = OrgService::new().with_audit_sink(sink.clone());
        let dev = developer();

        let root = service
            .create_unit(&dev, CreateUnitRequest::new(OrgUnitType::Council, "Council", None))
            .await
            .unwrap();

        let invitee = Actor::new(Uuid::now_v7());
        service.register_user(invitee.user_id).await;
        let invite = service
            .send_invite(&dev, root.id, SendInviteRequest::member(invitee.user_id))
            .await
            .unwrap();
        service.respond_to_invite(&invitee, invite.id, true).await.unwrap();

        let actions: Vec<String> = sink
            .events()
            .await
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec!["org_unit.created", "org_invite.sent", "org_invite.accepted"]
        );
    }

    #[tokio::test]
    async fn test_failed_operations_leave_no_trace() {
        let sink = Arc::new(MemoryAuditSink::new());
        let service = OrgService::new().with_audit_sink(sink.clone());
        let plain = Actor::new(Uuid::now_v7());

        assert!(service
            .create_unit(&plain, CreateUnitRequest::new(OrgUnitType::Council, "Council", None))
            .await
            .is_err());

        assert!(sink.is_empty().await);
        assert!(service.org_tree(&plain).await.is_none());
    }
}
