//! Organizational unit domain models
//!
//! This module provides the core OrgUnit entity: a node in the
//! organizational tree, from the single root Council down to Groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type of an organizational unit.
///
/// Unit types form a fixed hierarchy; each type may only be created
/// under its unique predecessor type (see [`allowed_children`]):
///
/// ```text
/// Council
///   └─ ExecutiveCouncil
///        └─ Sector
///             ├─ Ministry
///             │    └─ Group
///             └─ Group
/// ```
///
/// [`allowed_children`]: OrgUnitType::allowed_children
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrgUnitType {
    /// The single root of the tree
    Council,

    /// Executive branch directly under the Council
    ExecutiveCouncil,

    /// A sector grouping ministries and groups
    Sector,

    /// A ministry within a sector
    Ministry,

    /// A leaf community group
    Group,
}

impl OrgUnitType {
    /// The child types a unit of this type may create.
    ///
    /// The mapping is fixed: Council→ExecutiveCouncil,
    /// ExecutiveCouncil→Sector, Sector→{Ministry, Group},
    /// Ministry→Group, Group→nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use communa_org::OrgUnitType;
    ///
    /// assert_eq!(
    ///     OrgUnitType::Sector.allowed_children(),
    ///     &[OrgUnitType::Ministry, OrgUnitType::Group]
    /// );
    /// assert!(OrgUnitType::Group.allowed_children().is_empty());
    /// ```
    pub fn allowed_children(&self) -> &'static [OrgUnitType] {
        match self {
            Self::Council => &[Self::ExecutiveCouncil],
            Self::ExecutiveCouncil => &[Self::Sector],
            Self::Sector => &[Self::Ministry, Self::Group],
            Self::Ministry => &[Self::Group],
            Self::Group => &[],
        }
    }

    /// Check if this type is the tree root.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Council)
    }

    /// Parse unit type from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "council" => Some(Self::Council),
            "executive_council" => Some(Self::ExecutiveCouncil),
            "sector" => Some(Self::Sector),
            "ministry" => Some(Self::Ministry),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    /// Get string representation of the unit type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Council => "council",
            Self::ExecutiveCouncil => "executive_council",
            Self::Sector => "sector",
            Self::Ministry => "ministry",
            Self::Group => "group",
        }
    }

    /// Get a human-readable display name for the unit type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Council => "Council",
            Self::ExecutiveCouncil => "Executive Council",
            Self::Sector => "Sector",
            Self::Ministry => "Ministry",
            Self::Group => "Group",
        }
    }
}

/// The category of a Group unit.
///
/// Only units of type [`OrgUnitType::Group`] carry a category; it is
/// required for groups and rejected everywhere else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupCategory {
    /// First-contact / welcome groups
    Welcome,

    /// Deepening and formation groups
    Deepening,

    /// Vocational discernment groups
    Vocational,

    /// Couples groups
    Couples,

    /// Courses with a fixed duration
    Course,

    /// Project-based groups
    Project,
}

impl GroupCategory {
    /// All valid group categories.
    pub const ALL: [GroupCategory; 6] = [
        Self::Welcome,
        Self::Deepening,
        Self::Vocational,
        Self::Couples,
        Self::Course,
        Self::Project,
    ];

    /// Parse category from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "welcome" => Some(Self::Welcome),
            "deepening" => Some(Self::Deepening),
            "vocational" => Some(Self::Vocational),
            "couples" => Some(Self::Couples),
            "course" => Some(Self::Course),
            "project" => Some(Self::Project),
            _ => None,
        }
    }

    /// Get string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Deepening => "deepening",
            Self::Vocational => "vocational",
            Self::Couples => "couples",
            Self::Course => "course",
            Self::Project => "project",
        }
    }
}

/// Visibility of a unit to non-members.
///
/// Public units are visible to every authenticated user; Restricted
/// units are visible only to their members and platform admins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to everyone
    Public,

    /// Visible to members and admins only
    Restricted,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

/// A node in the organizational tree.
///
/// Units form a single tree rooted at the Council. Each unit tracks its
/// parent by id (explicit adjacency, no back-references), its
/// visibility, and whether it is active. Inactive units are retained
/// but never traversed.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use communa_org::{OrgUnit, OrgUnitType, Visibility};
///
/// let creator = Uuid::now_v7();
/// let root = OrgUnit::new(OrgUnitType::Council, "General Council", "general-council", None, creator);
/// assert!(root.is_active);
/// assert_eq!(root.visibility, Visibility::Public);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    /// Unique identifier for the unit
    pub id: Uuid,

    /// The unit's type in the hierarchy
    pub unit_type: OrgUnitType,

    /// Group category; present iff `unit_type` is Group
    pub group_category: Option<GroupCategory>,

    /// Human-readable name
    pub name: String,

    /// URL-friendly slug (globally unique, immutable once issued)
    pub slug: String,

    /// Optional description
    pub description: Option<String>,

    /// Parent unit id; None only for the root Council
    pub parent_id: Option<Uuid>,

    /// Who may see this unit's existence and members
    pub visibility: Visibility,

    /// Whether the unit is active (inactive units are never traversed)
    pub is_active: bool,

    /// User who created the unit
    pub created_by: Uuid,

    /// When the unit was created
    pub created_at: DateTime<Utc>,
}

impl OrgUnit {
    /// Creates a new active, public unit.
    ///
    /// # Arguments
    ///
    /// * `unit_type` - The unit's type in the hierarchy
    /// * `name` - Human-readable name
    /// * `slug` - URL-friendly slug (must be globally unique)
    /// * `parent_id` - Parent unit, None only for the root Council
    /// * `created_by` - The creating user
    pub fn new(
        unit_type: OrgUnitType,
        name: impl Into<String>,
        slug: impl Into<String>,
        parent_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            unit_type,
            group_category: None,
            name: name.into(),
            slug: slug.into(),
            description: None,
            parent_id,
            visibility: Visibility::default(),
            is_active: true,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Set the group category.
    pub fn with_group_category(mut self, category: GroupCategory) -> Self {
        self.group_category = Some(category);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Check if this unit is the tree root.
    pub fn is_root(&self) -> bool {
        self.unit_type.is_root() && self.parent_id.is_none()
    }
}
