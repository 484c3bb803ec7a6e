use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::shared::validation::USERNAME_REGEX;

/// Request DTO for creating a user account
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    #[validate(
        length(min = 3, max = 180, message = "Username must be 3-180 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username must start with a letter or underscore and contain only letters, digits and underscores"
        )
    )]
    pub username: String,
}

/// Response DTO for user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(CreateUserDto {
            username: "yann_loup".to_string()
        }
        .validate()
        .is_ok());
        assert!(CreateUserDto {
            username: "yo".to_string()
        }
        .validate()
        .is_err());
        assert!(CreateUserDto {
            username: "9lives".to_string()
        }
        .validate()
        .is_err());
    }
}
