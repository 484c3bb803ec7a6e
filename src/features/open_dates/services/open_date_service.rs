use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::contributors::services::GraphLoader;
use crate::features::open_dates::dtos::{CreateOpenDateDto, OpenDateResponseDto};
use crate::features::open_dates::models::OpenDate;
use crate::modules::persistence::Repository;

/// Service for open dates
pub struct OpenDateService {
    repository: Arc<dyn Repository>,
}

impl OpenDateService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Open a date on the owner's calendar
    pub async fn create(&self, dto: CreateOpenDateDto) -> Result<OpenDateResponseDto> {
        let mut loader = GraphLoader::new(self.repository.as_ref());
        let owner = loader.contributor(dto.owner_id).await?;

        let graph = loader.graph_mut();
        let id = graph.track_new_open_date(OpenDate::new(dto.title, dto.starts_at, dto.is_public));
        graph.add_owned_open_date(owner, id)?;

        self.repository.commit(loader.graph()).await?;
        tracing::info!("Open date created: id={}, owner={}", id, owner);

        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<OpenDateResponseDto> {
        self.repository
            .find_open_date(id)
            .await?
            .map(|o| OpenDateResponseDto::from(&o))
            .ok_or_else(|| AppError::NotFound(format!("Open date {} not found", id)))
    }

    pub async fn set_visibility(&self, id: Uuid, is_public: bool) -> Result<OpenDateResponseDto> {
        let mut loader = GraphLoader::new(self.repository.as_ref());
        loader.open_date(id).await?;

        let graph = loader.graph_mut();
        let current = graph.open_date(id).map(OpenDate::is_public);
        if current.is_some_and(|public| public != is_public) {
            if let Some(open_date) = graph.open_date_mut(id) {
                open_date.set_public(is_public);
            }
            tracing::debug!("Open date {} visibility set to public={}", id, is_public);
        }

        if graph.is_dirty() {
            self.repository.commit(graph).await?;
        }

        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::contributors::models::{Contributor, ContributorType};
    use crate::features::contributors::relations::ContributorGraph;
    use crate::modules::persistence::InMemoryRepository;

    async fn setup() -> (OpenDateService, Arc<InMemoryRepository>, Uuid) {
        let repository = Arc::new(InMemoryRepository::new());
        let mut graph = ContributorGraph::new();
        let owner = graph.track_new_contributor(Contributor::new(
            ContributorType::Improvisator,
            "Jeanne",
            "jeanne",
            Uuid::new_v4(),
        ));
        repository.commit(&graph).await.unwrap();
        (OpenDateService::new(repository.clone()), repository, owner)
    }

    fn dto(owner_id: Uuid) -> CreateOpenDateDto {
        CreateOpenDateDto {
            title: "Cabaret".to_string(),
            starts_at: None,
            is_public: false,
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_create_sets_both_sides_of_ownership() {
        let (service, repository, owner) = setup().await;

        let created = service.create(dto(owner)).await.unwrap();

        assert_eq!(created.owner_id, Some(owner));
        let stored_owner = repository.find_contributor(owner).await.unwrap().unwrap();
        assert_eq!(stored_owner.owned_open_dates(), &[created.id]);
    }

    #[tokio::test]
    async fn test_create_with_unknown_owner_is_not_found() {
        let (service, _, _) = setup().await;
        let err = service.create(dto(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_visibility() {
        let (service, _, owner) = setup().await;
        let created = service.create(dto(owner)).await.unwrap();
        assert!(!created.is_public);

        let updated = service.set_visibility(created.id, true).await.unwrap();
        assert!(updated.is_public);

        let unchanged = service.set_visibility(created.id, true).await.unwrap();
        assert_eq!(unchanged.updated_at, updated.updated_at);
    }
}
