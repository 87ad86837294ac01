//! User directory repository.

use std::sync::Arc;

use crate::entities::{User, user};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};

/// User directory repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count every registered user.
    pub async fn count_all(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users with a non-empty party.
    pub async fn count_with_party(&self) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Party.is_not_null())
            .filter(user::Column::Party.ne(""))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users whose party or committee equals `group`.
    ///
    /// An empty string is no affiliation, so an empty `group` has no members.
    pub async fn count_in_group(&self, group: &str) -> AppResult<u64> {
        if group.is_empty() {
            return Ok(0);
        }
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Party.eq(group))
                    .add(user::Column::Committee.eq(group)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::Role;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, party: Option<&str>) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("member-{id}"),
            display_name: Some("Test Member".to_string()),
            role: Role::Member,
            party: party.map(str::to_string),
            committee: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("u1", Some("Green"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_id("u1").await.unwrap().unwrap();

        assert_eq!(found.party.as_deref(), Some("Green"));
        assert_eq!(found.role, Role::Member);
    }

    #[tokio::test]
    async fn test_count_in_group() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert_eq!(repo.count_in_group("Finance").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_count_in_empty_group_skips_query() {
        // An empty label must match nobody, including users stored with `party = ''`
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        assert_eq!(repo.count_in_group("").await.unwrap(), 0);
    }
}
