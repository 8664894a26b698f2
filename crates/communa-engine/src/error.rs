//! Error types for organization engine operations
//!
//! Every error here is recoverable at the request boundary: the caller
//! receives a structured (code, message) pair and the operation's
//! changes are discarded. Only `Internal` indicates an unexpected
//! failure, and it never carries row-level detail.

use thiserror::Error;

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// An organizational unit
    Unit,
    /// A platform user
    User,
    /// An invite
    Invite,
    /// A membership in a unit
    Member,
}

impl Resource {
    /// Human-readable name of the resource kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::User => "user",
            Self::Invite => "invite",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Organization engine error types.
///
/// These cover every failure mode of the mutating operations and the
/// read queries: authorization, hierarchy validation, and the two
/// state machines (invite and membership).
#[derive(Debug, Error)]
pub enum OrgError {
    /// Actor is not allowed to perform this operation
    #[error("Permission denied")]
    PermissionDenied,

    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(Resource),

    /// The requested parent→child unit type pair is not allowed
    #[error("Invalid hierarchy: this unit type cannot be created under the given parent")]
    InvalidHierarchy,

    /// A field was supplied or omitted incorrectly
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// The entity already exists (duplicate root, exhausted slug retries)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The invited user is already an active member of the unit
    #[error("User is already a member of this unit")]
    AlreadyMember,

    /// A pending invite already targets this (unit, user) pair
    #[error("A pending invite already exists for this user")]
    InviteExists,

    /// The invite's response deadline has passed
    #[error("Invite has expired")]
    InviteExpired,

    /// The invite has already reached a terminal state
    #[error("Invite is no longer pending")]
    NotPending,

    /// The unit would be left without an active coordinator
    #[error("Cannot remove or demote the last coordinator; promote another member first")]
    LastCoordinator,

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl OrgError {
    /// Check if this error should be logged at error level.
    ///
    /// Domain failures (permission, state-machine) are expected and
    /// should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, OrgError::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            OrgError::PermissionDenied => 403,
            OrgError::NotFound(_) => 404,

            OrgError::InvalidHierarchy | OrgError::InvalidField(_) => 400,

            OrgError::AlreadyExists(_)
            | OrgError::AlreadyMember
            | OrgError::InviteExists
            | OrgError::NotPending
            | OrgError::LastCoordinator => 409,

            OrgError::InviteExpired => 410,

            OrgError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::PermissionDenied => "PERMISSION_DENIED",
            OrgError::NotFound(_) => "NOT_FOUND",
            OrgError::InvalidHierarchy => "INVALID_HIERARCHY",
            OrgError::InvalidField(_) => "INVALID_FIELD",
            OrgError::AlreadyExists(_) => "ALREADY_EXISTS",
            OrgError::AlreadyMember => "ALREADY_MEMBER",
            OrgError::InviteExists => "INVITE_EXISTS",
            OrgError::InviteExpired => "INVITE_EXPIRED",
            OrgError::NotPending => "NOT_PENDING",
            OrgError::LastCoordinator => "LAST_COORDINATOR",
            OrgError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
