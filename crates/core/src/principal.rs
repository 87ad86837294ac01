//! Authenticated principals and vote target groups.

use std::fmt;

use rollcall_db::entities::user::{self, Role};
use serde::{Deserialize, Serialize};

/// Label of the target group covering every registered user.
pub const ALL_GROUP: &str = "ALL";

/// Label of the target group covering every member with a party.
pub const CHAMBER_GROUP: &str = "院會";

/// The caller of an engine operation, as known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct Principal {
    /// User directory id.
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: Role,
    /// Raw party; prefer [`Principal::party`].
    pub party: Option<String>,
    /// Raw committee; prefer [`Principal::committee`].
    pub committee: Option<String>,
}

impl Principal {
    /// Party affiliation, with empty strings treated as none.
    #[must_use]
    pub fn party(&self) -> Option<&str> {
        self.party.as_deref().filter(|p| !p.is_empty())
    }

    /// Committee membership, with empty strings treated as none.
    #[must_use]
    pub fn committee(&self) -> Option<&str> {
        self.committee.as_deref().filter(|c| !c.is_empty())
    }

    /// Whether the principal may create and delete votes.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<user::Model> for Principal {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            party: user.party,
            committee: user.committee,
        }
    }
}

/// Who may vote on a motion.
///
/// Parsed once from the stored label; `Named` matches either a party or a
/// committee of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetGroup {
    /// Every registered user.
    #[default]
    All,
    /// Every member with a party affiliation.
    Chamber,
    /// Members of one party or committee.
    Named(String),
}

impl TargetGroup {
    /// Stored label of the group.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_GROUP,
            Self::Chamber => CHAMBER_GROUP,
            Self::Named(name) => name,
        }
    }

    /// Whether `principal` belongs to the group.
    #[must_use]
    pub fn contains(&self, principal: &Principal) -> bool {
        match self {
            Self::All => true,
            Self::Chamber => principal.party().is_some(),
            Self::Named(name) => {
                principal.party() == Some(name.as_str())
                    || principal.committee() == Some(name.as_str())
            }
        }
    }
}

impl From<&str> for TargetGroup {
    fn from(label: &str) -> Self {
        match label {
            ALL_GROUP => Self::All,
            CHAMBER_GROUP => Self::Chamber,
            other => Self::Named(other.to_string()),
        }
    }
}

impl From<String> for TargetGroup {
    fn from(label: String) -> Self {
        match label.as_str() {
            ALL_GROUP => Self::All,
            CHAMBER_GROUP => Self::Chamber,
            _ => Self::Named(label),
        }
    }
}

impl From<TargetGroup> for String {
    fn from(group: TargetGroup) -> Self {
        match group {
            TargetGroup::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
