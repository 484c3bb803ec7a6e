use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::contributors::dtos::ContributorResponseDto;
use crate::features::contributors::models::{ContributorKind, ContributorType};
use crate::shared::slug::slugify;

/// An event contributor: a troupe, a team, an improvisator or an improv group.
///
/// Relations are held as identifiers. The bidirectional ones
/// (`owned_open_dates`, `invited_to_open_dates`, troupe/team membership) must
/// be changed through `ContributorGraph` so both sides stay in sync; the
/// user lists have no back-reference and can be changed here directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Contributor {
    pub(crate) id: Uuid,
    pub(crate) kind: ContributorKind,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) short_name: String,
    pub(crate) identifier: String,
    pub(crate) location: String,
    pub(crate) banner_pic_url: Option<String>,
    pub(crate) profile_pic_url: Option<String>,
    pub(crate) created_by: Uuid,
    pub(crate) super_admins: Vec<Uuid>,
    pub(crate) admins: Vec<Uuid>,
    pub(crate) owned_open_dates: Vec<Uuid>,
    pub(crate) invited_to_open_dates: Vec<Uuid>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Contributor {
    pub fn new(
        contributor_type: ContributorType,
        name: impl Into<String>,
        short_name: impl Into<String>,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        let mut contributor = Self {
            id: Uuid::new_v4(),
            kind: ContributorKind::empty(contributor_type),
            name: name.into(),
            description: String::new(),
            short_name: String::new(),
            identifier: String::new(),
            location: String::new(),
            banner_pic_url: None,
            profile_pic_url: None,
            created_by,
            super_admins: Vec::new(),
            admins: Vec::new(),
            owned_open_dates: Vec::new(),
            invited_to_open_dates: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        contributor.set_short_name(short_name);
        contributor
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &ContributorKind {
        &self.kind
    }

    pub fn contributor_type(&self) -> ContributorType {
        self.kind.contributor_type()
    }

    pub fn type_name(&self) -> &'static str {
        self.contributor_type().type_name()
    }

    pub fn is_improv_group(&self) -> bool {
        matches!(self.kind, ContributorKind::ImprovGroup)
    }

    /// Member teams; empty for anything but a troupe
    pub fn teams(&self) -> &[Uuid] {
        match &self.kind {
            ContributorKind::Troupe { teams } => teams,
            _ => &[],
        }
    }

    /// Troupe this contributor belongs to; only teams have one
    pub fn troupe(&self) -> Option<Uuid> {
        match self.kind {
            ContributorKind::Team { troupe } => troupe,
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Also regenerates the identifier from the new short name.
    ///
    /// The regenerated identifier is only the slug base; callers that persist
    /// the contributor make it unique first.
    pub fn set_short_name(&mut self, short_name: impl Into<String>) {
        self.short_name = short_name.into();
        self.identifier = self.identifier_base();
    }

    /// Slug of the short name, falling back to the type name when the short
    /// name has no sluggable characters
    pub fn identifier_base(&self) -> String {
        let slug = slugify(&self.short_name);
        if slug.is_empty() {
            self.type_name().replace('_', "-")
        } else {
            slug
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = identifier.into();
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn banner_pic_url(&self) -> Option<&str> {
        self.banner_pic_url.as_deref()
    }

    pub fn set_banner_pic_url(&mut self, url: Option<String>) {
        self.banner_pic_url = url;
    }

    pub fn profile_pic_url(&self) -> Option<&str> {
        self.profile_pic_url.as_deref()
    }

    pub fn set_profile_pic_url(&mut self, url: Option<String>) {
        self.profile_pic_url = url;
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }

    pub fn set_created_by(&mut self, user_id: Uuid) {
        self.created_by = user_id;
    }

    pub fn super_admins(&self) -> &[Uuid] {
        &self.super_admins
    }

    pub fn admins(&self) -> &[Uuid] {
        &self.admins
    }

    /// Returns false if the user already was a super-admin
    pub fn add_super_admin(&mut self, user_id: Uuid) -> bool {
        insert_unique(&mut self.super_admins, user_id)
    }

    pub fn remove_super_admin(&mut self, user_id: Uuid) -> bool {
        remove_item(&mut self.super_admins, user_id)
    }

    /// Returns false if the user already was an admin
    pub fn add_admin(&mut self, user_id: Uuid) -> bool {
        insert_unique(&mut self.admins, user_id)
    }

    pub fn remove_admin(&mut self, user_id: Uuid) -> bool {
        remove_item(&mut self.admins, user_id)
    }

    pub fn owned_open_dates(&self) -> &[Uuid] {
        &self.owned_open_dates
    }

    pub fn invited_to_open_dates(&self) -> &[Uuid] {
        &self.invited_to_open_dates
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Set-style insert that keeps first-insertion order
pub(crate) fn insert_unique(items: &mut Vec<Uuid>, id: Uuid) -> bool {
    if items.contains(&id) {
        return false;
    }
    items.push(id);
    true
}

pub(crate) fn remove_item(items: &mut Vec<Uuid>, id: Uuid) -> bool {
    let before = items.len();
    items.retain(|item| *item != id);
    items.len() != before
}

impl From<&Contributor> for ContributorResponseDto {
    fn from(c: &Contributor) -> Self {
        Self {
            id: c.id,
            contributor_type: c.contributor_type(),
            identifier: c.identifier.clone(),
            name: c.name.clone(),
            short_name: c.short_name.clone(),
            description: c.description.clone(),
            location: c.location.clone(),
            banner_pic_url: c.banner_pic_url.clone(),
            profile_pic_url: c.profile_pic_url.clone(),
            created_by: c.created_by,
            super_admins: c.super_admins.clone(),
            admins: c.admins.clone(),
            owned_open_dates: c.owned_open_dates.clone(),
            invited_to_open_dates: c.invited_to_open_dates.clone(),
            teams: matches!(c.kind, ContributorKind::Troupe { .. }).then(|| c.teams().to_vec()),
            troupe_id: c.troupe(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn improvisator(short_name: &str) -> Contributor {
        Contributor::new(
            ContributorType::Improvisator,
            "Jeanne Dupont",
            short_name,
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_new_contributor_defaults() {
        let creator = Uuid::new_v4();
        let c = Contributor::new(ContributorType::Troupe, "La Ligue", "Ligue", creator);

        assert_eq!(c.identifier(), "ligue");
        assert_eq!(c.description(), "");
        assert_eq!(c.location(), "");
        assert_eq!(c.created_by(), creator);
        assert!(c.super_admins().is_empty());
        assert!(c.admins().is_empty());
        assert!(c.owned_open_dates().is_empty());
        assert!(c.invited_to_open_dates().is_empty());
        assert!(c.teams().is_empty());
        assert_eq!(c.type_name(), "troupe");
        assert!(!c.is_improv_group());
    }

    #[test]
    fn test_set_created_by_leaves_admins_alone() {
        let mut c = improvisator("Jeanne");
        let admin = Uuid::new_v4();
        c.add_super_admin(admin);
        let new_creator = Uuid::new_v4();

        c.set_created_by(new_creator);

        assert_eq!(c.created_by(), new_creator);
        assert_eq!(c.super_admins(), &[admin]);
    }

    #[test]
    fn test_short_name_change_regenerates_identifier() {
        let mut c = improvisator("Jeanne D.");
        assert_eq!(c.identifier(), "jeanne-d");

        c.set_short_name("Jeannot Élégant");
        assert_eq!(c.short_name(), "Jeannot Élégant");
        assert_eq!(c.identifier(), "jeannot-elegant");
    }

    #[test]
    fn test_unsluggable_short_name_falls_back_to_type() {
        let c = Contributor::new(ContributorType::ImprovGroup, "???", "???", Uuid::new_v4());
        assert_eq!(c.identifier(), "improv-group");
        assert!(c.is_improv_group());
    }

    #[test]
    fn test_admin_sets_ignore_duplicates() {
        let mut c = improvisator("jd");
        let user = Uuid::new_v4();

        assert!(c.add_admin(user));
        assert!(!c.add_admin(user));
        assert_eq!(c.admins().len(), 1);

        assert!(c.add_super_admin(user));
        assert!(!c.add_super_admin(user));
        assert_eq!(c.super_admins().len(), 1);

        assert!(c.remove_admin(user));
        assert!(!c.remove_admin(user));
        assert!(c.admins().is_empty());
        assert!(c.remove_super_admin(user));
        assert!(c.super_admins().is_empty());
    }

    #[test]
    fn test_team_and_troupe_accessors() {
        let team = Contributor::new(ContributorType::Team, "Les Bleus", "Bleus", Uuid::new_v4());
        assert_eq!(team.troupe(), None);
        assert!(team.teams().is_empty());

        let dto = ContributorResponseDto::from(&team);
        assert_eq!(dto.teams, None);
        assert_eq!(dto.contributor_type, ContributorType::Team);
    }
}
