use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::dtos::{CreateUserDto, UserResponseDto};
use crate::features::users::models::User;
use crate::modules::persistence::Repository;

/// Service for user accounts
pub struct UserService {
    repository: Arc<dyn Repository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, dto: CreateUserDto) -> Result<UserResponseDto> {
        let user = User::new(dto.username);
        self.repository.insert_user(&user).await?;

        tracing::info!("User created: id={}, username={}", user.id, user.username);

        Ok(user.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<UserResponseDto> {
        self.repository
            .find_user(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
