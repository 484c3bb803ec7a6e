use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::contributors::models::{Contributor, ContributorType};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Request DTO for creating a contributor
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContributorDto {
    #[serde(rename = "type")]
    pub contributor_type: ContributorType,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 70, message = "Short name must be 1-70 characters"))]
    pub short_name: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Description must not exceed 255 characters"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Location must not exceed 100 characters"))]
    pub location: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        url(message = "Banner picture must be a valid URL"),
        length(max = 255, message = "Banner picture URL must not exceed 255 characters")
    )]
    pub banner_pic_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        url(message = "Profile picture must be a valid URL"),
        length(max = 255, message = "Profile picture URL must not exceed 255 characters")
    )]
    pub profile_pic_url: Option<String>,

    /// User creating the contributor; becomes its first super-admin
    pub created_by: Uuid,

    /// Troupe to join; only accepted for teams
    pub troupe_id: Option<Uuid>,
}

/// Contributor edit form.
///
/// Binds exactly the descriptive fields. Ownership, administrators and
/// variant relations have their own endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributorEditFormDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Description must not exceed 255 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 70, message = "Short name must be 1-70 characters"))]
    pub short_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Location must not exceed 100 characters"))]
    pub location: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        url(message = "Banner picture must be a valid URL"),
        length(max = 255, message = "Banner picture URL must not exceed 255 characters")
    )]
    pub banner_pic_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        url(message = "Profile picture must be a valid URL"),
        length(max = 255, message = "Profile picture URL must not exceed 255 characters")
    )]
    pub profile_pic_url: Option<String>,
}

impl ContributorEditFormDto {
    /// Pre-filled form for an existing contributor
    pub fn from_contributor(c: &Contributor) -> Self {
        Self {
            name: c.name().to_string(),
            description: c.description().to_string(),
            short_name: c.short_name().to_string(),
            location: c.location().to_string(),
            banner_pic_url: c.banner_pic_url().map(str::to_string),
            profile_pic_url: c.profile_pic_url().map(str::to_string),
        }
    }

    /// Write the submitted values through the contributor's setters.
    ///
    /// Returns true when the short name changed, in which case the
    /// identifier has been regenerated and needs a uniqueness check.
    pub fn apply_to(self, contributor: &mut Contributor) -> bool {
        let short_name_changed = contributor.short_name() != self.short_name;

        contributor.set_name(self.name);
        contributor.set_description(self.description);
        if short_name_changed {
            contributor.set_short_name(self.short_name);
        }
        contributor.set_location(self.location);
        contributor.set_banner_pic_url(blank_to_none(self.banner_pic_url));
        contributor.set_profile_pic_url(blank_to_none(self.profile_pic_url));

        short_name_changed
    }
}

/// An empty form input means "no picture"
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Blank picture inputs deserialize as absent, so they skip URL validation
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_to_none(Option::<String>::deserialize(deserializer)?))
}

/// Query params for listing contributors
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ContributorQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Only list contributors of this type
    #[serde(rename = "type")]
    pub contributor_type: Option<ContributorType>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ContributorQueryParams {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Response DTO for contributor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributorResponseDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub contributor_type: ContributorType,
    pub identifier: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub location: String,
    pub banner_pic_url: Option<String>,
    pub profile_pic_url: Option<String>,
    pub created_by: Uuid,
    pub super_admins: Vec<Uuid>,
    pub admins: Vec<Uuid>,
    pub owned_open_dates: Vec<Uuid>,
    pub invited_to_open_dates: Vec<Uuid>,
    /// Member teams (troupes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<Uuid>>,
    /// Parent troupe (teams only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troupe_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
