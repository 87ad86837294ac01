//! Eligibility resolution for target groups.

use rollcall_common::AppResult;
use rollcall_db::entities::vote;
use rollcall_db::repositories::UserRepository;

use crate::principal::{Principal, TargetGroup};

/// Whether `principal` may vote on `vote`.
#[must_use]
pub fn is_eligible(vote: &vote::Model, principal: &Principal) -> bool {
    TargetGroup::from(vote.target_group.as_str()).contains(principal)
}

/// Resolves target groups against the user directory.
#[derive(Clone)]
pub struct EligibilityResolver {
    user_repo: UserRepository,
}

impl EligibilityResolver {
    /// Create a new eligibility resolver.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Number of directory users eligible for `vote`.
    pub async fn eligible_count(&self, vote: &vote::Model) -> AppResult<u64> {
        match TargetGroup::from(vote.target_group.as_str()) {
            TargetGroup::All => self.user_repo.count_all().await,
            TargetGroup::Chamber => self.user_repo.count_with_party().await,
            TargetGroup::Named(name) => self.user_repo.count_in_group(&name).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rollcall_db::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn vote_for(group: &str) -> vote::Model {
        let now = Utc::now();
        vote::Model {
            id: "v1".to_string(),
            title: "Motion".to_string(),
            description: String::new(),
            start_time: now.into(),
            end_time: now.into(),
            is_anonymous: false,
            target_group: group.to_string(),
            created_at: now.into(),
        }
    }

    fn principal(party: Option<&str>, committee: Option<&str>) -> Principal {
        Principal {
            id: "u1".to_string(),
            username: "member1".to_string(),
            display_name: None,
            role: Role::Member,
            party: party.map(str::to_string),
            committee: committee.map(str::to_string),
        }
    }

    #[test]
    fn test_committee_mismatch_is_ineligible() {
        let vote = vote_for("财政委员会");
        assert!(!is_eligible(&vote, &principal(None, Some("交通委员会"))));
        assert!(is_eligible(&vote, &principal(None, Some("财政委员会"))));
    }

    #[test]
    fn test_press_without_party_only_votes_on_all() {
        let mut press = principal(None, None);
        press.role = Role::Press;
        assert!(is_eligible(&vote_for("ALL"), &press));
        assert!(!is_eligible(&vote_for("院會"), &press));
    }

    #[tokio::test]
    async fn test_eligible_count_for_chamber() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(7))
            }]])
            .into_connection();
        let resolver = EligibilityResolver::new(UserRepository::new(Arc::new(db)));

        assert_eq!(resolver.eligible_count(&vote_for("院會")).await.unwrap(), 7);
    }
}
