use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::contributors::dtos::{
    blank_to_none, ContributorEditFormDto, ContributorQueryParams, ContributorResponseDto,
    CreateContributorDto,
};
use crate::features::contributors::models::{Contributor, ContributorType};
use crate::features::contributors::relations::ContributorGraph;
use crate::features::contributors::services::GraphLoader;
use crate::features::open_dates::dtos::OpenDateResponseDto;
use crate::modules::persistence::Repository;
use crate::shared::constants::IDENTIFIER_MAX_ATTEMPTS;
use crate::shared::slug::identifier_candidates;

/// Relation endpoints report the contributor and whether anything changed
pub type RelationOutcome = (ContributorResponseDto, bool);

/// Service for contributors and their relations.
///
/// Every mutating operation loads a `ContributorGraph`, mutates it and
/// commits it once.
pub struct ContributorService {
    repository: Arc<dyn Repository>,
}

impl ContributorService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    fn loader(&self) -> GraphLoader<'_> {
        GraphLoader::new(self.repository.as_ref())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<()> {
        self.repository
            .find_user(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// First free identifier among `base`, `base-1`, `base-2`, ...
    async fn unique_identifier(&self, base: &str, except: Option<Uuid>) -> Result<String> {
        for candidate in identifier_candidates(base).take(IDENTIFIER_MAX_ATTEMPTS) {
            if !self.repository.identifier_taken(&candidate, except).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Conflict(format!(
            "No free identifier left for '{}'",
            base
        )))
    }

    async fn commit(&self, graph: &ContributorGraph) -> Result<()> {
        if graph.is_dirty() {
            self.repository.commit(graph).await?;
        }
        Ok(())
    }

    /// Re-read a contributor after commit so responses carry stored values
    async fn fetch(&self, id: Uuid) -> Result<ContributorResponseDto> {
        self.repository
            .find_contributor(id)
            .await?
            .map(|c| ContributorResponseDto::from(&c))
            .ok_or_else(|| AppError::NotFound(format!("Contributor {} not found", id)))
    }

    async fn finish(&self, graph: ContributorGraph, id: Uuid, changed: bool) -> Result<RelationOutcome> {
        self.commit(&graph).await?;
        Ok((self.fetch(id).await?, changed))
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    pub async fn create(&self, dto: CreateContributorDto) -> Result<ContributorResponseDto> {
        if dto.troupe_id.is_some() && dto.contributor_type != ContributorType::Team {
            return Err(AppError::BadRequest(
                "Only teams can join a troupe".to_string(),
            ));
        }
        self.require_user(dto.created_by).await?;

        let mut contributor = Contributor::new(
            dto.contributor_type,
            dto.name,
            dto.short_name,
            dto.created_by,
        );
        contributor.set_description(dto.description);
        contributor.set_location(dto.location);
        contributor.set_banner_pic_url(blank_to_none(dto.banner_pic_url));
        contributor.set_profile_pic_url(blank_to_none(dto.profile_pic_url));
        contributor.add_super_admin(dto.created_by);

        let identifier = self
            .unique_identifier(&contributor.identifier_base(), None)
            .await?;
        contributor.set_identifier(identifier);

        let mut loader = self.loader();
        let id = loader.graph_mut().track_new_contributor(contributor);
        if let Some(troupe_id) = dto.troupe_id {
            loader.contributor(troupe_id).await?;
            loader.graph_mut().add_team(troupe_id, id)?;
        }

        let graph = loader.into_graph();
        self.commit(&graph).await?;

        if let Some(c) = graph.contributor(id) {
            tracing::info!(
                "Contributor created: id={}, type={}, identifier={}",
                id,
                c.type_name(),
                c.identifier()
            );
        }

        self.fetch(id).await
    }

    pub async fn get(&self, identifier: &str) -> Result<ContributorResponseDto> {
        self.repository
            .find_contributor_by_identifier(identifier)
            .await?
            .map(|c| ContributorResponseDto::from(&c))
            .ok_or_else(|| AppError::NotFound(format!("Contributor '{}' not found", identifier)))
    }

    /// Current values of the edit form
    pub async fn edit_form(&self, identifier: &str) -> Result<ContributorEditFormDto> {
        self.repository
            .find_contributor_by_identifier(identifier)
            .await?
            .map(|c| ContributorEditFormDto::from_contributor(&c))
            .ok_or_else(|| AppError::NotFound(format!("Contributor '{}' not found", identifier)))
    }

    pub async fn list(
        &self,
        params: &ContributorQueryParams,
    ) -> Result<(Vec<ContributorResponseDto>, i64)> {
        let (contributors, total) = self
            .repository
            .list_contributors(params.contributor_type, params.offset(), params.limit())
            .await?;

        Ok((contributors.iter().map(Into::into).collect(), total))
    }

    /// Bind the edit form onto the contributor and store it
    pub async fn update(
        &self,
        identifier: &str,
        form: ContributorEditFormDto,
    ) -> Result<ContributorResponseDto> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;

        let Some(contributor) = loader.graph_mut().contributor_mut(id) else {
            return Err(AppError::NotFound(format!(
                "Contributor '{}' not found",
                identifier
            )));
        };
        let short_name_changed = form.apply_to(contributor);
        let base = contributor.identifier().to_string();

        if short_name_changed {
            let unique = self.unique_identifier(&base, Some(id)).await?;
            if let Some(contributor) = loader.graph_mut().contributor_mut(id) {
                contributor.set_identifier(unique);
            }
        }

        self.commit(loader.graph()).await?;
        tracing::info!("Contributor updated: id={}", id);

        self.fetch(id).await
    }

    /// Delete a contributor. Its owned open dates are kept without an owner.
    pub async fn delete(&self, identifier: &str) -> Result<()> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.removal_scope(id).await?;

        let mut graph = loader.into_graph();
        let removed = graph.remove_contributor(id)?;
        self.commit(&graph).await?;

        tracing::info!(
            "Contributor deleted: id={}, identifier={}",
            id,
            removed.identifier()
        );

        Ok(())
    }

    // =========================================================================
    // OPEN DATES
    // =========================================================================

    /// Public open dates owned by the contributor, plus those owned by the
    /// teams of a troupe
    pub async fn public_open_dates(&self, identifier: &str) -> Result<Vec<OpenDateResponseDto>> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.public_dates_scope(id).await?;

        Ok(loader
            .graph()
            .public_owned_open_dates(id)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub async fn add_owned_open_date(
        &self,
        identifier: &str,
        open_date_id: Uuid,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.open_date_with_owner(open_date_id).await?;

        let changed = loader.graph_mut().add_owned_open_date(id, open_date_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn remove_owned_open_date(
        &self,
        identifier: &str,
        open_date_id: Uuid,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.open_date(open_date_id).await?;

        let changed = loader.graph_mut().remove_owned_open_date(id, open_date_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn add_invited_to_open_date(
        &self,
        identifier: &str,
        open_date_id: Uuid,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.open_date(open_date_id).await?;

        let changed = loader
            .graph_mut()
            .add_invited_to_open_date(id, open_date_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn remove_invited_to_open_date(
        &self,
        identifier: &str,
        open_date_id: Uuid,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;
        loader.open_date(open_date_id).await?;

        let changed = loader
            .graph_mut()
            .remove_invited_to_open_date(id, open_date_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    // =========================================================================
    // ADMINISTRATORS
    // =========================================================================

    pub async fn add_admin(&self, identifier: &str, user_id: Uuid) -> Result<RelationOutcome> {
        self.require_user(user_id).await?;
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;

        let changed = loader.graph_mut().add_admin(id, user_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn remove_admin(&self, identifier: &str, user_id: Uuid) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;

        let changed = loader.graph_mut().remove_admin(id, user_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn add_super_admin(
        &self,
        identifier: &str,
        user_id: Uuid,
    ) -> Result<RelationOutcome> {
        self.require_user(user_id).await?;
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;

        let changed = loader.graph_mut().add_super_admin(id, user_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    pub async fn remove_super_admin(
        &self,
        identifier: &str,
        user_id: Uuid,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let id = loader.contributor_by_identifier(identifier).await?;

        let changed = loader.graph_mut().remove_super_admin(id, user_id)?;
        self.finish(loader.into_graph(), id, changed).await
    }

    // =========================================================================
    // TEAMS
    // =========================================================================

    /// Make a team a member of the troupe, moving it out of its previous one
    pub async fn add_team(&self, identifier: &str, team_identifier: &str) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let troupe_id = loader.contributor_by_identifier(identifier).await?;
        let team_id = loader.contributor_by_identifier(team_identifier).await?;
        loader.membership(team_id).await?;

        let changed = loader.graph_mut().add_team(troupe_id, team_id)?;
        self.finish(loader.into_graph(), troupe_id, changed).await
    }

    pub async fn remove_team(
        &self,
        identifier: &str,
        team_identifier: &str,
    ) -> Result<RelationOutcome> {
        let mut loader = self.loader();
        let troupe_id = loader.contributor_by_identifier(identifier).await?;
        let team_id = loader.contributor_by_identifier(team_identifier).await?;

        let changed = loader.graph_mut().remove_team(troupe_id, team_id)?;
        self.finish(loader.into_graph(), troupe_id, changed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::open_dates::models::OpenDate;
    use crate::features::users::models::User;
    use crate::modules::persistence::InMemoryRepository;

    struct Fixture {
        repository: Arc<InMemoryRepository>,
        service: ContributorService,
        user: Uuid,
    }

    async fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryRepository::new());
        let user = User::new("creator");
        repository.insert_user(&user).await.unwrap();
        Fixture {
            service: ContributorService::new(repository.clone()),
            repository,
            user: user.id,
        }
    }

    fn create_dto(contributor_type: ContributorType, short_name: &str, user: Uuid) -> CreateContributorDto {
        CreateContributorDto {
            contributor_type,
            name: format!("{} name", short_name),
            short_name: short_name.to_string(),
            description: String::new(),
            location: "Paris".to_string(),
            banner_pic_url: None,
            profile_pic_url: Some(String::new()),
            created_by: user,
            troupe_id: None,
        }
    }

    async fn seed_open_date(repository: &InMemoryRepository, is_public: bool) -> Uuid {
        let mut graph = ContributorGraph::new();
        let id = graph.track_new_open_date(OpenDate::new("Match", None, is_public));
        repository.commit(&graph).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_makes_creator_super_admin() {
        let f = fixture().await;
        let created = f
            .service
            .create(create_dto(ContributorType::Troupe, "La Ligue", f.user))
            .await
            .unwrap();

        assert_eq!(created.identifier, "la-ligue");
        assert_eq!(created.super_admins, vec![f.user]);
        assert_eq!(created.profile_pic_url, None);
        assert_eq!(created.teams, Some(vec![]));
    }

    #[tokio::test]
    async fn test_create_suffixes_taken_identifiers() {
        let f = fixture().await;
        for expected in ["ligue", "ligue-1", "ligue-2"] {
            let created = f
                .service
                .create(create_dto(ContributorType::Improvisator, "Ligue", f.user))
                .await
                .unwrap();
            assert_eq!(created.identifier, expected);
        }
    }

    #[tokio::test]
    async fn test_create_requires_existing_creator() {
        let f = fixture().await;
        let err = f
            .service
            .create(create_dto(ContributorType::Team, "Bleus", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_team_created_inside_troupe() {
        let f = fixture().await;
        let troupe = f
            .service
            .create(create_dto(ContributorType::Troupe, "Ligue", f.user))
            .await
            .unwrap();

        let mut dto = create_dto(ContributorType::Team, "Bleus", f.user);
        dto.troupe_id = Some(troupe.id);
        let team = f.service.create(dto).await.unwrap();

        assert_eq!(team.troupe_id, Some(troupe.id));
        assert_eq!(f.service.get("ligue").await.unwrap().teams, Some(vec![team.id]));
    }

    #[tokio::test]
    async fn test_only_teams_can_name_a_troupe() {
        let f = fixture().await;
        let mut dto = create_dto(ContributorType::Improvisator, "Solo", f.user);
        dto.troupe_id = Some(Uuid::new_v4());

        let err = f.service.create(dto).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_regenerates_unique_identifier() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::Troupe, "Bleus", f.user))
            .await
            .unwrap();
        f.service
            .create(create_dto(ContributorType::Team, "Rouges", f.user))
            .await
            .unwrap();

        let mut form = f.service.edit_form("rouges").await.unwrap();
        form.short_name = "Bleus".to_string();
        form.location = "Lille".to_string();
        let updated = f.service.update("rouges", form).await.unwrap();

        assert_eq!(updated.identifier, "bleus-1");
        assert_eq!(updated.location, "Lille");
        assert!(f.service.get("rouges").await.is_err());
    }

    #[tokio::test]
    async fn test_public_open_dates_aggregates_team_dates() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::Troupe, "Ligue", f.user))
            .await
            .unwrap();
        f.service
            .create(create_dto(ContributorType::Team, "Bleus", f.user))
            .await
            .unwrap();
        f.service.add_team("ligue", "bleus").await.unwrap();

        let a = seed_open_date(&f.repository, true).await;
        let b = seed_open_date(&f.repository, false).await;
        let c = seed_open_date(&f.repository, true).await;
        f.service.add_owned_open_date("ligue", a).await.unwrap();
        f.service.add_owned_open_date("ligue", b).await.unwrap();
        f.service.add_owned_open_date("bleus", c).await.unwrap();

        let ids: Vec<Uuid> = f
            .service
            .public_open_dates("ligue")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![a, c]);

        let team_ids: Vec<Uuid> = f
            .service
            .public_open_dates("bleus")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(team_ids, vec![c]);
    }

    #[tokio::test]
    async fn test_relation_outcome_reports_noop() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::ImprovGroup, "Zygos", f.user))
            .await
            .unwrap();
        let date = seed_open_date(&f.repository, true).await;

        let (dto, changed) = f.service.add_invited_to_open_date("zygos", date).await.unwrap();
        assert!(changed);
        assert_eq!(dto.invited_to_open_dates, vec![date]);

        let (_, changed) = f.service.add_invited_to_open_date("zygos", date).await.unwrap();
        assert!(!changed);

        let (dto, changed) = f.service.add_admin("zygos", f.user).await.unwrap();
        assert!(changed);
        assert_eq!(dto.admins, vec![f.user]);

        let (_, changed) = f.service.remove_super_admin("zygos", Uuid::new_v4()).await.unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_ownership_moves_between_contributors() {
        let f = fixture().await;
        for name in ["Anna", "Bruno"] {
            f.service
                .create(create_dto(ContributorType::Improvisator, name, f.user))
                .await
                .unwrap();
        }
        let date = seed_open_date(&f.repository, true).await;

        f.service.add_owned_open_date("anna", date).await.unwrap();
        let (bruno, _) = f.service.add_owned_open_date("bruno", date).await.unwrap();

        assert_eq!(bruno.owned_open_dates, vec![date]);
        assert!(f.service.get("anna").await.unwrap().owned_open_dates.is_empty());
    }

    #[tokio::test]
    async fn test_add_team_rejects_wrong_variants() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::Improvisator, "Solo", f.user))
            .await
            .unwrap();
        f.service
            .create(create_dto(ContributorType::Team, "Bleus", f.user))
            .await
            .unwrap();

        let err = f.service.add_team("solo", "bleus").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_keeps_owned_open_dates_unowned() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::Improvisator, "Anna", f.user))
            .await
            .unwrap();
        let date = seed_open_date(&f.repository, true).await;
        f.service.add_owned_open_date("anna", date).await.unwrap();

        f.service.delete("anna").await.unwrap();

        assert!(matches!(
            f.service.get("anna").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let stored = f.repository.find_open_date(date).await.unwrap().unwrap();
        assert_eq!(stored.owner(), None);
    }

    #[tokio::test]
    async fn test_list_filters_by_type() {
        let f = fixture().await;
        f.service
            .create(create_dto(ContributorType::Troupe, "Ligue", f.user))
            .await
            .unwrap();
        f.service
            .create(create_dto(ContributorType::Team, "Bleus", f.user))
            .await
            .unwrap();

        let params = ContributorQueryParams {
            page: 1,
            page_size: 10,
            contributor_type: Some(ContributorType::Team),
        };
        let (items, total) = f.service.list(&params).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].identifier, "bleus");
    }
}
