use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::open_dates::dtos::OpenDateResponseDto;

/// A calendar slot a contributor opens for events.
///
/// `owner` and `invited_contributors` are the inverse sides of
/// `Contributor::owned_open_dates` and `Contributor::invited_to_open_dates`;
/// they are only changed through `ContributorGraph`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDate {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) starts_at: Option<DateTime<Utc>>,
    pub(crate) is_public: bool,
    pub(crate) owner: Option<Uuid>,
    pub(crate) invited_contributors: Vec<Uuid>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl OpenDate {
    /// A fresh, unowned open date. Ownership is assigned through the graph.
    pub fn new(title: impl Into<String>, starts_at: Option<DateTime<Utc>>, is_public: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            starts_at,
            is_public,
            owner: None,
            invited_contributors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn set_public(&mut self, is_public: bool) {
        self.is_public = is_public;
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn invited_contributors(&self) -> &[Uuid] {
        &self.invited_contributors
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<&OpenDate> for OpenDateResponseDto {
    fn from(o: &OpenDate) -> Self {
        Self {
            id: o.id,
            title: o.title.clone(),
            starts_at: o.starts_at,
            is_public: o.is_public,
            owner_id: o.owner,
            invited_contributors: o.invited_contributors.clone(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}
