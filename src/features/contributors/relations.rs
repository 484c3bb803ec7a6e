//! Request-scoped unit of work over contributors and open dates.
//!
//! Every relation with a back-reference is changed here so that both sides
//! are updated in the same call: ownership (`Contributor::owned_open_dates`
//! and `OpenDate::owner`), invitations (`Contributor::invited_to_open_dates`
//! and `OpenDate::invited_contributors`) and troupe membership
//! (`Troupe.teams` and `Team.troupe`).
//!
//! Mutators validate everything they need before touching anything, so a
//! `RelationError` leaves the graph unchanged. A graph is built, mutated and
//! committed within one request and is never shared between threads.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::features::contributors::models::{
    insert_unique, remove_item, Contributor, ContributorKind,
};
use crate::features::open_dates::models::OpenDate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    #[error("contributor {0} is not loaded")]
    UnknownContributor(Uuid),

    #[error("open date {0} is not loaded")]
    UnknownOpenDate(Uuid),

    #[error("contributor {0} is not a troupe")]
    NotATroupe(Uuid),

    #[error("contributor {0} is not a team")]
    NotATeam(Uuid),
}

#[derive(Debug, Default)]
pub struct ContributorGraph {
    contributors: HashMap<Uuid, Contributor>,
    open_dates: HashMap<Uuid, OpenDate>,
    // Insertion-ordered so commits write in a stable order
    dirty_contributors: Vec<Uuid>,
    dirty_open_dates: Vec<Uuid>,
    removed_contributors: Vec<Uuid>,
}

impl ContributorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // LOADING & TRACKING
    // =========================================================================

    /// Add a contributor as loaded from storage. Already loaded ids are kept.
    pub fn load_contributor(&mut self, contributor: Contributor) {
        self.contributors.entry(contributor.id).or_insert(contributor);
    }

    /// Add an open date as loaded from storage. Already loaded ids are kept.
    pub fn load_open_date(&mut self, open_date: OpenDate) {
        self.open_dates.entry(open_date.id).or_insert(open_date);
    }

    /// Add a contributor that does not exist in storage yet
    pub fn track_new_contributor(&mut self, contributor: Contributor) -> Uuid {
        let id = contributor.id;
        self.contributors.insert(id, contributor);
        insert_unique(&mut self.dirty_contributors, id);
        id
    }

    /// Add an open date that does not exist in storage yet
    pub fn track_new_open_date(&mut self, open_date: OpenDate) -> Uuid {
        let id = open_date.id;
        self.open_dates.insert(id, open_date);
        insert_unique(&mut self.dirty_open_dates, id);
        id
    }

    pub fn has_contributor(&self, id: Uuid) -> bool {
        self.contributors.contains_key(&id)
    }

    pub fn has_open_date(&self, id: Uuid) -> bool {
        self.open_dates.contains_key(&id)
    }

    pub fn contributor(&self, id: Uuid) -> Option<&Contributor> {
        self.contributors.get(&id)
    }

    pub fn open_date(&self, id: Uuid) -> Option<&OpenDate> {
        self.open_dates.get(&id)
    }

    /// Mutable access for attribute setters; marks the contributor for commit
    pub fn contributor_mut(&mut self, id: Uuid) -> Option<&mut Contributor> {
        let contributor = self.contributors.get_mut(&id)?;
        insert_unique(&mut self.dirty_contributors, id);
        Some(contributor)
    }

    /// Mutable access for attribute setters; marks the open date for commit
    pub fn open_date_mut(&mut self, id: Uuid) -> Option<&mut OpenDate> {
        let open_date = self.open_dates.get_mut(&id)?;
        insert_unique(&mut self.dirty_open_dates, id);
        Some(open_date)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_contributors.is_empty()
            || !self.dirty_open_dates.is_empty()
            || !self.removed_contributors.is_empty()
    }

    /// Contributors to write, in the order they were first changed
    pub fn dirty_contributors(&self) -> impl Iterator<Item = &Contributor> {
        self.dirty_contributors
            .iter()
            .filter_map(|id| self.contributors.get(id))
    }

    /// Open dates to write, in the order they were first changed
    pub fn dirty_open_dates(&self) -> impl Iterator<Item = &OpenDate> {
        self.dirty_open_dates
            .iter()
            .filter_map(|id| self.open_dates.get(id))
    }

    /// Contributors to delete
    pub fn removed_contributors(&self) -> &[Uuid] {
        &self.removed_contributors
    }

    fn require_contributor(&self, id: Uuid) -> Result<&Contributor, RelationError> {
        self.contributors
            .get(&id)
            .ok_or(RelationError::UnknownContributor(id))
    }

    fn require_open_date(&self, id: Uuid) -> Result<&OpenDate, RelationError> {
        self.open_dates
            .get(&id)
            .ok_or(RelationError::UnknownOpenDate(id))
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    /// Make `contributor_id` the owner of `open_date_id`.
    ///
    /// If another contributor owned the date, it is removed from that
    /// contributor's list, which therefore has to be loaded as well.
    pub fn add_owned_open_date(
        &mut self,
        contributor_id: Uuid,
        open_date_id: Uuid,
    ) -> Result<bool, RelationError> {
        let contributor = self.require_contributor(contributor_id)?;
        let open_date = self.require_open_date(open_date_id)?;

        if contributor.owned_open_dates.contains(&open_date_id) {
            return Ok(false);
        }

        let previous_owner = open_date.owner.filter(|owner| *owner != contributor_id);
        if let Some(previous) = previous_owner {
            self.require_contributor(previous)?;
        }

        if let Some(previous) = previous_owner {
            if let Some(c) = self.contributor_mut(previous) {
                remove_item(&mut c.owned_open_dates, open_date_id);
            }
        }
        if let Some(c) = self.contributor_mut(contributor_id) {
            c.owned_open_dates.push(open_date_id);
        }
        if let Some(o) = self.open_date_mut(open_date_id) {
            o.owner = Some(contributor_id);
        }

        Ok(true)
    }

    /// Drop `open_date_id` from the contributor's owned dates. The date's
    /// owner is cleared only if it still points at this contributor.
    pub fn remove_owned_open_date(
        &mut self,
        contributor_id: Uuid,
        open_date_id: Uuid,
    ) -> Result<bool, RelationError> {
        let contributor = self.require_contributor(contributor_id)?;
        self.require_open_date(open_date_id)?;

        if !contributor.owned_open_dates.contains(&open_date_id) {
            return Ok(false);
        }

        if let Some(c) = self.contributor_mut(contributor_id) {
            remove_item(&mut c.owned_open_dates, open_date_id);
        }
        if let Some(o) = self.open_date_mut(open_date_id) {
            if o.owner == Some(contributor_id) {
                o.owner = None;
            }
        }

        Ok(true)
    }

    // =========================================================================
    // INVITATIONS
    // =========================================================================

    pub fn add_invited_to_open_date(
        &mut self,
        contributor_id: Uuid,
        open_date_id: Uuid,
    ) -> Result<bool, RelationError> {
        let contributor = self.require_contributor(contributor_id)?;
        self.require_open_date(open_date_id)?;

        if contributor.invited_to_open_dates.contains(&open_date_id) {
            return Ok(false);
        }

        if let Some(c) = self.contributor_mut(contributor_id) {
            c.invited_to_open_dates.push(open_date_id);
        }
        if let Some(o) = self.open_date_mut(open_date_id) {
            insert_unique(&mut o.invited_contributors, contributor_id);
        }

        Ok(true)
    }

    pub fn remove_invited_to_open_date(
        &mut self,
        contributor_id: Uuid,
        open_date_id: Uuid,
    ) -> Result<bool, RelationError> {
        let contributor = self.require_contributor(contributor_id)?;
        self.require_open_date(open_date_id)?;

        if !contributor.invited_to_open_dates.contains(&open_date_id) {
            return Ok(false);
        }

        if let Some(c) = self.contributor_mut(contributor_id) {
            remove_item(&mut c.invited_to_open_dates, open_date_id);
        }
        if let Some(o) = self.open_date_mut(open_date_id) {
            remove_item(&mut o.invited_contributors, contributor_id);
        }

        Ok(true)
    }

    // =========================================================================
    // ADMINISTRATORS
    // =========================================================================

    pub fn add_admin(&mut self, contributor_id: Uuid, user_id: Uuid) -> Result<bool, RelationError> {
        if self.require_contributor(contributor_id)?.admins.contains(&user_id) {
            return Ok(false);
        }
        Ok(self
            .contributor_mut(contributor_id)
            .is_some_and(|c| c.add_admin(user_id)))
    }

    pub fn remove_admin(
        &mut self,
        contributor_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RelationError> {
        if !self.require_contributor(contributor_id)?.admins.contains(&user_id) {
            return Ok(false);
        }
        Ok(self
            .contributor_mut(contributor_id)
            .is_some_and(|c| c.remove_admin(user_id)))
    }

    pub fn add_super_admin(
        &mut self,
        contributor_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RelationError> {
        if self
            .require_contributor(contributor_id)?
            .super_admins
            .contains(&user_id)
        {
            return Ok(false);
        }
        Ok(self
            .contributor_mut(contributor_id)
            .is_some_and(|c| c.add_super_admin(user_id)))
    }

    pub fn remove_super_admin(
        &mut self,
        contributor_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RelationError> {
        if !self
            .require_contributor(contributor_id)?
            .super_admins
            .contains(&user_id)
        {
            return Ok(false);
        }
        Ok(self
            .contributor_mut(contributor_id)
            .is_some_and(|c| c.remove_super_admin(user_id)))
    }

    // =========================================================================
    // TROUPE MEMBERSHIP
    // =========================================================================

    fn require_troupe(&self, id: Uuid) -> Result<&Vec<Uuid>, RelationError> {
        match &self.require_contributor(id)?.kind {
            ContributorKind::Troupe { teams } => Ok(teams),
            _ => Err(RelationError::NotATroupe(id)),
        }
    }

    fn require_team(&self, id: Uuid) -> Result<Option<Uuid>, RelationError> {
        match self.require_contributor(id)?.kind {
            ContributorKind::Team { troupe } => Ok(troupe),
            _ => Err(RelationError::NotATeam(id)),
        }
    }

    fn teams_mut(&mut self, troupe_id: Uuid) -> Option<&mut Vec<Uuid>> {
        match &mut self.contributor_mut(troupe_id)?.kind {
            ContributorKind::Troupe { teams } => Some(teams),
            _ => None,
        }
    }

    fn set_team_troupe(&mut self, team_id: Uuid, value: Option<Uuid>) {
        if let Some(ContributorKind::Team { troupe }) =
            self.contributor_mut(team_id).map(|c| &mut c.kind)
        {
            *troupe = value;
        }
    }

    /// Make `team_id` a member of `troupe_id`, leaving any previous troupe
    pub fn add_team(&mut self, troupe_id: Uuid, team_id: Uuid) -> Result<bool, RelationError> {
        let teams = self.require_troupe(troupe_id)?;
        let already_member = teams.contains(&team_id);
        let current_troupe = self.require_team(team_id)?;

        if already_member {
            return Ok(false);
        }

        let previous_troupe = current_troupe.filter(|t| *t != troupe_id);
        if let Some(previous) = previous_troupe {
            self.require_troupe(previous)?;
        }

        if let Some(previous) = previous_troupe {
            if let Some(teams) = self.teams_mut(previous) {
                remove_item(teams, team_id);
            }
        }
        if let Some(teams) = self.teams_mut(troupe_id) {
            teams.push(team_id);
        }
        self.set_team_troupe(team_id, Some(troupe_id));

        Ok(true)
    }

    pub fn remove_team(&mut self, troupe_id: Uuid, team_id: Uuid) -> Result<bool, RelationError> {
        let is_member = self.require_troupe(troupe_id)?.contains(&team_id);
        let current_troupe = self.require_team(team_id)?;

        if !is_member {
            return Ok(false);
        }

        if let Some(teams) = self.teams_mut(troupe_id) {
            remove_item(teams, team_id);
        }
        if current_troupe == Some(troupe_id) {
            self.set_team_troupe(team_id, None);
        }

        Ok(true)
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Detach a contributor from every relation and schedule its deletion.
    ///
    /// Every open date it owns or is invited to, and its troupe or teams,
    /// must be loaded. Owned open dates are kept but left without an owner.
    pub fn remove_contributor(&mut self, contributor_id: Uuid) -> Result<Contributor, RelationError> {
        let contributor = self.require_contributor(contributor_id)?;
        let owned = contributor.owned_open_dates.clone();
        let invited = contributor.invited_to_open_dates.clone();
        let kind = contributor.kind.clone();

        for id in owned.iter().chain(invited.iter()) {
            self.require_open_date(*id)?;
        }
        match &kind {
            ContributorKind::Troupe { teams } => {
                for team in teams {
                    self.require_contributor(*team)?;
                }
            }
            ContributorKind::Team { troupe: Some(troupe) } => {
                self.require_contributor(*troupe)?;
            }
            _ => {}
        }

        for id in owned {
            self.remove_owned_open_date(contributor_id, id)?;
        }
        for id in invited {
            self.remove_invited_to_open_date(contributor_id, id)?;
        }
        match kind {
            ContributorKind::Troupe { teams } => {
                for team in teams {
                    self.remove_team(contributor_id, team)?;
                }
            }
            ContributorKind::Team { troupe: Some(troupe) } => {
                self.remove_team(troupe, contributor_id)?;
            }
            _ => {}
        }

        remove_item(&mut self.dirty_contributors, contributor_id);
        insert_unique(&mut self.removed_contributors, contributor_id);
        self.contributors
            .remove(&contributor_id)
            .ok_or(RelationError::UnknownContributor(contributor_id))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Public open dates owned by the contributor and, for a troupe, public
    /// open dates owned directly by each of its teams.
    ///
    /// Only one level is followed: a team's own relations are not traversed.
    /// Unknown ids and entries that are not loaded are skipped, so this never
    /// fails; an open date appears at most once, in discovery order.
    pub fn public_owned_open_dates(&self, contributor_id: Uuid) -> Vec<&OpenDate> {
        let Some(contributor) = self.contributors.get(&contributor_id) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        self.collect_public_owned(contributor, &mut result);

        if let ContributorKind::Troupe { teams } = &contributor.kind {
            for team in teams.iter().filter_map(|id| self.contributors.get(id)) {
                self.collect_public_owned(team, &mut result);
            }
        }

        result
    }

    fn collect_public_owned<'a>(&'a self, owner: &Contributor, out: &mut Vec<&'a OpenDate>) {
        for open_date in owner
            .owned_open_dates
            .iter()
            .filter_map(|id| self.open_dates.get(id))
            .filter(|o| o.is_public)
        {
            if !out.iter().any(|o| o.id == open_date.id) {
                out.push(open_date);
            }
        }
    }
}
