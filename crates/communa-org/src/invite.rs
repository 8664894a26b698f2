//! Invite domain models
//!
//! Admission to a unit is invite-based: a coordinator proposes, the
//! invited user accepts, rejects, or lets the invite expire. An invite
//! that has left Pending never transitions again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::OrgRole;

/// Lifecycle status of an invite.
///
/// `Pending` is the only non-terminal state. Transitions out of
/// Pending are one-way; a new invite must be issued to retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Awaiting the invited user's response
    Pending,

    /// Accepted; exactly one membership was created
    Accepted,

    /// Declined by the invited user
    Rejected,

    /// Response deadline passed before the user acted
    Expired,

    /// Withdrawn by a coordinator before any response
    Cancelled,
}

impl InviteStatus {
    /// Check whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A proposal for a user to join a unit with a given role.
///
/// At most one Pending invite may exist per (unit, invited user) pair.
/// The invite references inviter and invitee without implying
/// membership until accepted.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use communa_org::{Invite, InviteStatus, OrgRole};
///
/// let invite = Invite::new(Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7(), OrgRole::Member, 7);
/// assert_eq!(invite.status, InviteStatus::Pending);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    /// Unique invite ID
    pub id: Uuid,

    /// Unit the user is invited to
    pub org_unit_id: Uuid,

    /// The invited user
    pub invited_user_id: Uuid,

    /// The coordinator who sent the invite
    pub invited_by_user_id: Uuid,

    /// Proposed role upon acceptance
    pub role: OrgRole,

    /// Lifecycle status
    pub status: InviteStatus,

    /// Optional personal message from the inviter
    pub message: Option<String>,

    /// When the invite was created
    pub created_at: DateTime<Utc>,

    /// Response deadline
    pub expires_at: DateTime<Utc>,

    /// When the invited user responded (accept or reject)
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// Creates a new pending invite expiring `ttl_days` from now.
    ///
    /// # Arguments
    ///
    /// * `org_unit_id` - The target unit
    /// * `invited_user_id` - The invited user
    /// * `invited_by_user_id` - The inviting coordinator
    /// * `role` - Proposed role upon acceptance
    /// * `ttl_days` - Days until the invite expires
    pub fn new(
        org_unit_id: Uuid,
        invited_user_id: Uuid,
        invited_by_user_id: Uuid,
        role: OrgRole,
        ttl_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            org_unit_id,
            invited_user_id,
            invited_by_user_id,
            role,
            status: InviteStatus::Pending,
            message: None,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
            responded_at: None,
        }
    }

    /// Attach a personal message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Check whether the response deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
