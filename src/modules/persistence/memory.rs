use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::contributors::models::{Contributor, ContributorKind, ContributorType};
use crate::features::contributors::relations::ContributorGraph;
use crate::features::open_dates::models::OpenDate;
use crate::features::users::models::User;

use super::Repository;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    contributors: HashMap<Uuid, Contributor>,
    open_dates: HashMap<Uuid, OpenDate>,
}

/// Process-local repository used for development and tests.
///
/// Keeps both sides of every relation as committed by the graph, and
/// enforces the same uniqueness rules as the database schema.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    /// Copy of a stored contributor with its relation lists in the order the
    /// postgres repository reads them: by creation time, then id
    fn read_contributor(&self, contributor: &Contributor) -> Contributor {
        let mut c = contributor.clone();
        let by_date = |id: &Uuid| (self.open_dates.get(id).map(|o| o.created_at()), *id);
        c.owned_open_dates.sort_by_key(by_date);
        c.invited_to_open_dates.sort_by_key(by_date);
        if let ContributorKind::Troupe { teams } = &mut c.kind {
            teams.sort_by_key(|id| (self.contributors.get(id).map(|t| t.created_at()), *id));
        }
        c
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_contributor(&self, id: Uuid) -> Result<Option<Contributor>> {
        let state = self.state.read().await;
        Ok(state.contributors.get(&id).map(|c| state.read_contributor(c)))
    }

    async fn find_contributors(&self, ids: &[Uuid]) -> Result<Vec<Contributor>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.contributors.get(id))
            .map(|c| state.read_contributor(c))
            .collect())
    }

    async fn find_contributor_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Contributor>> {
        let state = self.state.read().await;
        Ok(state
            .contributors
            .values()
            .find(|c| c.identifier() == identifier)
            .map(|c| state.read_contributor(c)))
    }

    async fn list_contributors(
        &self,
        contributor_type: Option<ContributorType>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Contributor>, i64)> {
        let state = self.state.read().await;
        let mut matching: Vec<&Contributor> = state
            .contributors
            .values()
            .filter(|c| contributor_type.is_none_or(|t| c.contributor_type() == t))
            .collect();
        matching.sort_by_key(|c| (c.created_at(), c.id()));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|c| state.read_contributor(c))
            .collect();

        Ok((page, total))
    }

    async fn identifier_taken(&self, identifier: &str, except: Option<Uuid>) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .contributors
            .values()
            .any(|c| c.identifier() == identifier && Some(c.id()) != except))
    }

    async fn find_open_date(&self, id: Uuid) -> Result<Option<OpenDate>> {
        Ok(self.state.read().await.open_dates.get(&id).cloned())
    }

    async fn find_open_dates(&self, ids: &[Uuid]) -> Result<Vec<OpenDate>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.open_dates.get(id).cloned())
            .collect())
    }

    async fn commit(&self, graph: &ContributorGraph) -> Result<()> {
        let mut state = self.state.write().await;

        // Check the unique identifier before writing anything
        for contributor in graph.dirty_contributors() {
            let clash = state.contributors.values().any(|other| {
                other.id() != contributor.id()
                    && other.identifier() == contributor.identifier()
                    && !graph.removed_contributors().contains(&other.id())
            });
            if clash {
                return Err(AppError::Conflict(format!(
                    "Identifier '{}' is already in use",
                    contributor.identifier()
                )));
            }
        }

        let now = Utc::now();
        for contributor in graph.dirty_contributors() {
            let mut stored = contributor.clone();
            stored.updated_at = now;
            state.contributors.insert(stored.id(), stored);
        }
        for open_date in graph.dirty_open_dates() {
            let mut stored = open_date.clone();
            stored.updated_at = now;
            state.open_dates.insert(stored.id(), stored);
        }
        for id in graph.removed_contributors() {
            state.contributors.remove(id);
        }

        tracing::debug!(
            contributors = graph.dirty_contributors().count(),
            open_dates = graph.dirty_open_dates().count(),
            removed = graph.removed_contributors().len(),
            "Committed graph to in-memory repository"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_contributor(repo: &InMemoryRepository, short_name: &str) -> Contributor {
        let c = Contributor::new(ContributorType::Troupe, "Troupe", short_name, Uuid::new_v4());
        let mut graph = ContributorGraph::new();
        graph.track_new_contributor(c.clone());
        repo.commit(&graph).await.unwrap();
        c
    }

    #[tokio::test]
    async fn test_relation_lists_read_back_by_creation_time() {
        let repo = InMemoryRepository::new();
        let mut graph = ContributorGraph::new();
        let owner = graph.track_new_contributor(Contributor::new(
            ContributorType::Improvisator,
            "Anna",
            "Anna",
            Uuid::new_v4(),
        ));
        let mut older = OpenDate::new("Older", None, true);
        older.created_at = Utc::now() - chrono::Duration::days(2);
        let older = graph.track_new_open_date(older);
        let newer = graph.track_new_open_date(OpenDate::new("Newer", None, true));

        graph.add_owned_open_date(owner, newer).unwrap();
        graph.add_owned_open_date(owner, older).unwrap();
        graph.add_invited_to_open_date(owner, newer).unwrap();
        graph.add_invited_to_open_date(owner, older).unwrap();
        repo.commit(&graph).await.unwrap();

        let stored = repo.find_contributor(owner).await.unwrap().unwrap();
        assert_eq!(stored.owned_open_dates(), &[older, newer]);
        assert_eq!(stored.invited_to_open_dates(), &[older, newer]);

        let mut loaded = ContributorGraph::new();
        loaded.load_contributor(stored);
        for date in repo.find_open_dates(&[older, newer]).await.unwrap() {
            loaded.load_open_date(date);
        }
        let public: Vec<Uuid> = loaded
            .public_owned_open_dates(owner)
            .into_iter()
            .map(|o| o.id())
            .collect();
        assert_eq!(public, vec![older, newer]);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = InMemoryRepository::new();
        repo.insert_user(&User::new("yann")).await.unwrap();

        let err = repo.insert_user(&User::new("yann")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_rejects_identifier_clash() {
        let repo = InMemoryRepository::new();
        seed_contributor(&repo, "Ligue").await;

        let mut graph = ContributorGraph::new();
        graph.track_new_contributor(Contributor::new(
            ContributorType::Team,
            "Team",
            "Ligue",
            Uuid::new_v4(),
        ));

        let err = repo.commit(&graph).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.list_contributors(None, 0, 10).await.unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_identifier_taken_ignores_self() {
        let repo = InMemoryRepository::new();
        let c = seed_contributor(&repo, "Ligue").await;

        assert!(repo.identifier_taken("ligue", None).await.unwrap());
        assert!(!repo.identifier_taken("ligue", Some(c.id())).await.unwrap());
        assert!(!repo.identifier_taken("other", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_type_and_pages() {
        let repo = InMemoryRepository::new();
        for name in ["a", "b", "c"] {
            seed_contributor(&repo, name).await;
        }
        let mut graph = ContributorGraph::new();
        graph.track_new_contributor(Contributor::new(
            ContributorType::Improvisator,
            "Solo",
            "solo",
            Uuid::new_v4(),
        ));
        repo.commit(&graph).await.unwrap();

        let (troupes, total) = repo
            .list_contributors(Some(ContributorType::Troupe), 1, 1)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(troupes.len(), 1);

        let (all, total) = repo.list_contributors(None, 0, 10).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_commit_deletes_removed_contributors() {
        let repo = InMemoryRepository::new();
        let c = seed_contributor(&repo, "Ligue").await;

        let mut graph = ContributorGraph::new();
        graph.load_contributor(c.clone());
        graph.remove_contributor(c.id()).unwrap();
        repo.commit(&graph).await.unwrap();

        assert!(repo.find_contributor(c.id()).await.unwrap().is_none());
    }
}
