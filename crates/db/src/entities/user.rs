//! User directory entity.
//!
//! Rows are maintained by the user-management service; the voting engine
//! only reads them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Principal role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Role {
    /// Ordinary assembly member.
    #[sea_orm(string_value = "member")]
    #[default]
    Member,
    /// Press observer.
    #[sea_orm(string_value = "press")]
    Press,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "superadmin")]
    SuperAdmin,
}

impl Role {
    /// Admins and super-admins may create and delete votes.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Display name shown on public vote records
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    pub role: Role,

    /// Party caucus; empty or NULL means unaffiliated
    #[sea_orm(nullable)]
    pub party: Option<String>,

    #[sea_orm(nullable)]
    pub committee: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,

    #[sea_orm(has_many = "super::ballot::Entity")]
    Ballots,
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl Related<super::ballot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ballots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
