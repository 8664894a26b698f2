//! Hierarchy policy
//!
//! Pure rules for which unit types may live under which parents. The
//! mapping is owned by [`OrgUnitType::allowed_children`]; this module
//! exposes the checks the engine runs before creating a unit.

use crate::unit::OrgUnitType;

/// Check whether `parent` may create a child of type `child`.
pub fn is_valid_child(parent: OrgUnitType, child: OrgUnitType) -> bool {
    parent.allowed_children().contains(&child)
}

/// The unique parent type required for a non-root unit type.
///
/// Returns `None` for [`OrgUnitType::Council`], which has no parent.
/// `Group` reports `Sector` here for the single-predecessor rule;
/// groups under ministries are additionally allowed by
/// [`is_valid_child`].
pub fn required_parent(child: OrgUnitType) -> Option<&'static [OrgUnitType]> {
    match child {
        OrgUnitType::Council => None,
        OrgUnitType::ExecutiveCouncil => Some(&[OrgUnitType::Council]),
        OrgUnitType::Sector => Some(&[OrgUnitType::ExecutiveCouncil]),
        OrgUnitType::Ministry => Some(&[OrgUnitType::Sector]),
        OrgUnitType::Group => Some(&[OrgUnitType::Sector, OrgUnitType::Ministry]),
    }
}

/// Check whether `parent` is a valid parent type for `child`.
pub fn can_have_parent(child: OrgUnitType, parent: OrgUnitType) -> bool {
    required_parent(child).is_some_and(|parents| parents.contains(&parent))
}
