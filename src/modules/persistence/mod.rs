//! Persistence for users, contributors and open dates.
//!
//! Services only talk to the [`Repository`] trait. Reads return fully
//! materialized values (relations as id lists); writes go through
//! [`Repository::commit`], which stores everything a `ContributorGraph`
//! changed in one unit.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::contributors::models::{Contributor, ContributorType};
use crate::features::contributors::relations::ContributorGraph;
use crate::features::open_dates::models::OpenDate;
use crate::features::users::models::User;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Fails with `AppError::Conflict` when the username is taken
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_contributor(&self, id: Uuid) -> Result<Option<Contributor>>;

    /// Missing ids are skipped; order follows `ids`
    async fn find_contributors(&self, ids: &[Uuid]) -> Result<Vec<Contributor>>;

    async fn find_contributor_by_identifier(&self, identifier: &str)
        -> Result<Option<Contributor>>;

    /// Page of contributors ordered by creation, with the total count
    async fn list_contributors(
        &self,
        contributor_type: Option<ContributorType>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Contributor>, i64)>;

    /// Whether another contributor than `except` already uses `identifier`
    async fn identifier_taken(&self, identifier: &str, except: Option<Uuid>) -> Result<bool>;

    async fn find_open_date(&self, id: Uuid) -> Result<Option<OpenDate>>;

    /// Missing ids are skipped; order follows `ids`
    async fn find_open_dates(&self, ids: &[Uuid]) -> Result<Vec<OpenDate>>;

    /// Write every changed contributor and open date, then delete removed
    /// contributors. `updated_at` is refreshed on every written row.
    async fn commit(&self, graph: &ContributorGraph) -> Result<()>;
}
