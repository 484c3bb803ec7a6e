#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum::Router;
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use crate::features::contributors::models::{Contributor, ContributorType};
#[cfg(test)]
use crate::features::contributors::relations::ContributorGraph;
#[cfg(test)]
use crate::features::users::models::User;
#[cfg(test)]
use crate::modules::persistence::{InMemoryRepository, Repository};

/// API router over a fresh in-memory repository
#[cfg(test)]
pub fn test_app() -> (Router, Arc<InMemoryRepository>) {
    let repository = Arc::new(InMemoryRepository::new());
    let app = crate::features::routes(repository.clone());
    (app, repository)
}

#[cfg(test)]
pub async fn create_test_user(repository: &InMemoryRepository, username: &str) -> Uuid {
    let user = User::new(username);
    repository
        .insert_user(&user)
        .await
        .expect("test user should be inserted");
    user.id
}

/// Improvisator whose identifier is the slug of `short_name`
#[cfg(test)]
pub async fn create_test_contributor(repository: &InMemoryRepository, short_name: &str) -> Uuid {
    let creator = create_test_user(repository, &format!("creator_{}", short_name.to_lowercase())).await;
    let mut contributor = Contributor::new(ContributorType::Improvisator, short_name, short_name, creator);
    contributor.add_super_admin(creator);

    let mut graph = ContributorGraph::new();
    let id = graph.track_new_contributor(contributor);
    repository
        .commit(&graph)
        .await
        .expect("test contributor should be committed");
    id
}
