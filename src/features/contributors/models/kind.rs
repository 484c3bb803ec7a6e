use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Contributor variant without its variant data.
///
/// Used for filters, request bodies and the persistence discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContributorType {
    Troupe,
    Team,
    Improvisator,
    ImprovGroup,
}

impl ContributorType {
    pub const ALL: [ContributorType; 4] = [
        ContributorType::Troupe,
        ContributorType::Team,
        ContributorType::Improvisator,
        ContributorType::ImprovGroup,
    ];

    /// Code stored in the `contributor.type` column
    pub fn discriminator(self) -> &'static str {
        match self {
            ContributorType::Troupe => "TRO",
            ContributorType::Team => "TEA",
            ContributorType::Improvisator => "IMP",
            ContributorType::ImprovGroup => "Grou",
        }
    }

    pub fn from_discriminator(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.discriminator() == code)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            ContributorType::Troupe => "troupe",
            ContributorType::Team => "team",
            ContributorType::Improvisator => "improvisator",
            ContributorType::ImprovGroup => "improv_group",
        }
    }
}

impl std::fmt::Display for ContributorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Contributor variant with its variant-specific relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributorKind {
    /// Member teams, kept in sync with each team's `troupe`
    Troupe { teams: Vec<Uuid> },
    Team { troupe: Option<Uuid> },
    Improvisator,
    ImprovGroup,
}

impl ContributorKind {
    /// A kind with empty relations
    pub fn empty(contributor_type: ContributorType) -> Self {
        match contributor_type {
            ContributorType::Troupe => ContributorKind::Troupe { teams: Vec::new() },
            ContributorType::Team => ContributorKind::Team { troupe: None },
            ContributorType::Improvisator => ContributorKind::Improvisator,
            ContributorType::ImprovGroup => ContributorKind::ImprovGroup,
        }
    }

    pub fn contributor_type(&self) -> ContributorType {
        match self {
            ContributorKind::Troupe { .. } => ContributorType::Troupe,
            ContributorKind::Team { .. } => ContributorType::Team,
            ContributorKind::Improvisator => ContributorType::Improvisator,
            ContributorKind::ImprovGroup => ContributorType::ImprovGroup,
        }
    }
}
