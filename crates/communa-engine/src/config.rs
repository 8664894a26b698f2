//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunable parameters for the organization engine.
///
/// # Examples
///
/// ```
/// use communa_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.invite_expiration_days, 7);
/// assert_eq!(config.max_tree_depth, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days an invite stays pending before it can no longer be accepted
    pub invite_expiration_days: i64,

    /// Maximum depth rendered by the org tree query
    pub max_tree_depth: usize,

    /// Attempts at slug collision resolution before giving up
    pub max_slug_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            invite_expiration_days: 7,
            max_tree_depth: 5,
            max_slug_attempts: 100,
        }
    }
}
