use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::contributors::models::ContributorKind;
use crate::features::contributors::relations::ContributorGraph;
use crate::modules::persistence::Repository;
use crate::shared::slug::is_identifier;

/// Fills a `ContributorGraph` with what an operation is about to touch.
///
/// Graph mutators reject entities that are not loaded, so each service
/// operation first asks the loader for the neighbourhood it needs (previous
/// owner of a date, previous troupe of a team, ...).
pub struct GraphLoader<'r> {
    repository: &'r dyn Repository,
    graph: ContributorGraph,
}

impl<'r> GraphLoader<'r> {
    pub fn new(repository: &'r dyn Repository) -> Self {
        Self {
            repository,
            graph: ContributorGraph::new(),
        }
    }

    pub fn graph(&self) -> &ContributorGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ContributorGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> ContributorGraph {
        self.graph
    }

    /// Load a contributor by id; `NotFound` if it does not exist
    pub async fn contributor(&mut self, id: Uuid) -> Result<Uuid> {
        if !self.graph.has_contributor(id) {
            let contributor = self
                .repository
                .find_contributor(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Contributor {} not found", id)))?;
            self.graph.load_contributor(contributor);
        }
        Ok(id)
    }

    /// Load a contributor by its identifier slug; `NotFound` if unknown
    pub async fn contributor_by_identifier(&mut self, identifier: &str) -> Result<Uuid> {
        let not_found = || AppError::NotFound(format!("Contributor '{}' not found", identifier));
        if !is_identifier(identifier) {
            return Err(not_found());
        }
        let contributor = self
            .repository
            .find_contributor_by_identifier(identifier)
            .await?
            .ok_or_else(not_found)?;
        let id = contributor.id();
        self.graph.load_contributor(contributor);
        Ok(id)
    }

    /// Load whichever of `ids` exist and are not loaded yet
    pub async fn contributors(&mut self, ids: &[Uuid]) -> Result<()> {
        let missing: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !self.graph.has_contributor(*id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        for contributor in self.repository.find_contributors(&missing).await? {
            self.graph.load_contributor(contributor);
        }
        Ok(())
    }

    /// Load an open date by id; `NotFound` if it does not exist
    pub async fn open_date(&mut self, id: Uuid) -> Result<Uuid> {
        if !self.graph.has_open_date(id) {
            let open_date = self
                .repository
                .find_open_date(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Open date {} not found", id)))?;
            self.graph.load_open_date(open_date);
        }
        Ok(id)
    }

    /// Load whichever of `ids` exist and are not loaded yet
    pub async fn open_dates(&mut self, ids: &[Uuid]) -> Result<()> {
        let missing: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !self.graph.has_open_date(*id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        for open_date in self.repository.find_open_dates(&missing).await? {
            self.graph.load_open_date(open_date);
        }
        Ok(())
    }

    /// Load an open date together with its current owner
    pub async fn open_date_with_owner(&mut self, id: Uuid) -> Result<Uuid> {
        self.open_date(id).await?;
        if let Some(owner) = self.graph.open_date(id).and_then(|o| o.owner()) {
            self.contributors(&[owner]).await?;
        }
        Ok(id)
    }

    /// Load the other side of a contributor's troupe membership: the troupe of
    /// a team, or the teams of a troupe
    pub async fn membership(&mut self, contributor_id: Uuid) -> Result<()> {
        let related: Vec<Uuid> = match self.graph.contributor(contributor_id).map(|c| c.kind()) {
            Some(ContributorKind::Troupe { teams }) => teams.clone(),
            Some(ContributorKind::Team {
                troupe: Some(troupe),
            }) => vec![*troupe],
            _ => Vec::new(),
        };
        self.contributors(&related).await
    }

    /// Everything `ContributorGraph::public_owned_open_dates` reads: the
    /// contributor's owned dates and, for a troupe, each team's owned dates
    pub async fn public_dates_scope(&mut self, contributor_id: Uuid) -> Result<()> {
        self.membership(contributor_id).await?;

        let Some(contributor) = self.graph.contributor(contributor_id) else {
            return Ok(());
        };
        let mut owned: Vec<Uuid> = contributor.owned_open_dates().to_vec();
        for team in contributor.teams() {
            if let Some(team) = self.graph.contributor(*team) {
                owned.extend_from_slice(team.owned_open_dates());
            }
        }

        self.open_dates(&owned).await
    }

    /// Everything `ContributorGraph::remove_contributor` has to detach
    pub async fn removal_scope(&mut self, contributor_id: Uuid) -> Result<()> {
        self.membership(contributor_id).await?;

        let Some(contributor) = self.graph.contributor(contributor_id) else {
            return Ok(());
        };
        let dates: Vec<Uuid> = contributor
            .owned_open_dates()
            .iter()
            .chain(contributor.invited_to_open_dates())
            .copied()
            .collect();

        self.open_dates(&dates).await
    }
}
