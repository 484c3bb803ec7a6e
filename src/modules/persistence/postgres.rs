use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::contributors::models::{Contributor, ContributorKind, ContributorType};
use crate::features::contributors::relations::ContributorGraph;
use crate::features::open_dates::models::OpenDate;
use crate::features::users::models::User;

use super::Repository;

const CONTRIBUTOR_COLUMNS: &str = r#"
    id, type, name, description, short_name, identifier, location,
    banner_pic_url, profile_pic_url, created_by, troupe_id, created_at, updated_at
"#;

const OPEN_DATE_COLUMNS: &str = r#"
    id, title, starts_at, is_public, owner_id, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct ContributorRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    discriminator: String,
    name: String,
    description: String,
    short_name: String,
    identifier: String,
    location: String,
    banner_pic_url: Option<String>,
    profile_pic_url: Option<String>,
    created_by: Uuid,
    troupe_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OpenDateRow {
    id: Uuid,
    title: String,
    starts_at: Option<DateTime<Utc>>,
    is_public: bool,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Relation id lists loaded alongside a contributor row
#[derive(Debug, Default)]
struct ContributorRelations {
    super_admins: Vec<Uuid>,
    admins: Vec<Uuid>,
    owned_open_dates: Vec<Uuid>,
    invited_to_open_dates: Vec<Uuid>,
    teams: Vec<Uuid>,
}

fn contributor_from_row(row: ContributorRow, relations: ContributorRelations) -> Result<Contributor> {
    let contributor_type = ContributorType::from_discriminator(&row.discriminator).ok_or_else(|| {
        AppError::Internal(format!(
            "Unknown contributor discriminator '{}' for {}",
            row.discriminator, row.id
        ))
    })?;

    let kind = match contributor_type {
        ContributorType::Troupe => ContributorKind::Troupe {
            teams: relations.teams,
        },
        ContributorType::Team => ContributorKind::Team {
            troupe: row.troupe_id,
        },
        ContributorType::Improvisator => ContributorKind::Improvisator,
        ContributorType::ImprovGroup => ContributorKind::ImprovGroup,
    };

    Ok(Contributor {
        id: row.id,
        kind,
        name: row.name,
        description: row.description,
        short_name: row.short_name,
        identifier: row.identifier,
        location: row.location,
        banner_pic_url: row.banner_pic_url,
        profile_pic_url: row.profile_pic_url,
        created_by: row.created_by,
        super_admins: relations.super_admins,
        admins: relations.admins,
        owned_open_dates: relations.owned_open_dates,
        invited_to_open_dates: relations.invited_to_open_dates,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn open_date_from_row(row: OpenDateRow, invited_contributors: Vec<Uuid>) -> OpenDate {
    OpenDate {
        id: row.id,
        title: row.title,
        starts_at: row.starts_at,
        is_public: row.is_public,
        owner: row.owner_id,
        invited_contributors,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Keep the caller's order for batch lookups
fn order_by_ids<T>(ids: &[Uuid], mut items: Vec<T>, id_of: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut ordered = Vec::with_capacity(items.len());
    for id in ids {
        if let Some(pos) = items.iter().position(|item| id_of(item) == *id) {
            ordered.push(items.swap_remove(pos));
        }
    }
    ordered
}

/// Map constraint violations on writes to client errors
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            return match db_err.constraint() {
                Some("users_username_key") => {
                    AppError::Conflict("Username is already taken".to_string())
                }
                Some("contributor_identifier_key") => {
                    AppError::Conflict("Contributor identifier is already in use".to_string())
                }
                _ => AppError::Conflict("Record already exists".to_string()),
            };
        }

        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::BadRequest("Referenced record does not exist.".to_string());
        }
    }

    AppError::Database(e)
}

/// Postgres-backed repository.
///
/// Relations are stored on the owning side only: `contributor.troupe_id` for
/// membership, `open_date.owner_id` for ownership and ordered join tables for
/// administrators and invitations. Inverse lists are rebuilt on load.
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_relations(&self, row: &ContributorRow) -> Result<ContributorRelations> {
        let id = row.id;

        let super_admins = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM contributors_super_admins WHERE contributor_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch super-admins of {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let admins = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM contributors_admins WHERE contributor_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch admins of {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let owned_open_dates = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM open_date WHERE owner_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch open dates owned by {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let invited_to_open_dates = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT i.open_date_id
            FROM open_date_invited_contributors i
            JOIN open_date o ON o.id = i.open_date_id
            WHERE i.contributor_id = $1
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch invitations of {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let teams = if row.discriminator == ContributorType::Troupe.discriminator() {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM contributor WHERE troupe_id = $1 ORDER BY created_at, id",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch teams of {}: {:?}", id, e);
                AppError::Database(e)
            })?
        } else {
            Vec::new()
        };

        Ok(ContributorRelations {
            super_admins,
            admins,
            owned_open_dates,
            invited_to_open_dates,
            teams,
        })
    }

    async fn hydrate_contributor(&self, row: ContributorRow) -> Result<Contributor> {
        let relations = self.load_relations(&row).await?;
        contributor_from_row(row, relations)
    }

    async fn hydrate_open_date(&self, row: OpenDateRow) -> Result<OpenDate> {
        let invited = sqlx::query_scalar::<_, Uuid>(
            "SELECT contributor_id FROM open_date_invited_contributors WHERE open_date_id = $1 ORDER BY position",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch invitations of open date {}: {:?}", row.id, e);
            AppError::Database(e)
        })?;

        Ok(open_date_from_row(row, invited))
    }

    async fn write_contributor(
        tx: &mut Transaction<'_, Postgres>,
        contributor: &Contributor,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contributor (
                id, type, name, description, short_name, identifier, location,
                banner_pic_url, profile_pic_url, created_by, troupe_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                short_name = EXCLUDED.short_name,
                identifier = EXCLUDED.identifier,
                location = EXCLUDED.location,
                banner_pic_url = EXCLUDED.banner_pic_url,
                profile_pic_url = EXCLUDED.profile_pic_url,
                created_by = EXCLUDED.created_by,
                troupe_id = EXCLUDED.troupe_id,
                updated_at = NOW()
            "#,
        )
        .bind(contributor.id())
        .bind(contributor.contributor_type().discriminator())
        .bind(contributor.name())
        .bind(contributor.description())
        .bind(contributor.short_name())
        .bind(contributor.identifier())
        .bind(contributor.location())
        .bind(contributor.banner_pic_url())
        .bind(contributor.profile_pic_url())
        .bind(contributor.created_by())
        .bind(contributor.troupe())
        .bind(contributor.created_at())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write contributor {}: {:?}", contributor.id(), e);
            handle_db_error(e)
        })?;

        for (table, users) in [
            ("contributors_super_admins", contributor.super_admins()),
            ("contributors_admins", contributor.admins()),
        ] {
            Self::replace_user_list(tx, table, contributor.id(), users).await?;
        }

        Ok(())
    }

    async fn replace_user_list(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        contributor_id: Uuid,
        users: &[Uuid],
    ) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE contributor_id = $1", table))
            .bind(contributor_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear {} for {}: {:?}", table, contributor_id, e);
                AppError::Database(e)
            })?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (contributor_id, user_id, position)
            SELECT $1, u.user_id, u.position
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS u(user_id, position)
            "#,
            table
        ))
        .bind(contributor_id)
        .bind(users)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write {} for {}: {:?}", table, contributor_id, e);
            handle_db_error(e)
        })?;

        Ok(())
    }

    async fn write_open_date(tx: &mut Transaction<'_, Postgres>, open_date: &OpenDate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO open_date (id, title, starts_at, is_public, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                starts_at = EXCLUDED.starts_at,
                is_public = EXCLUDED.is_public,
                owner_id = EXCLUDED.owner_id,
                updated_at = NOW()
            "#,
        )
        .bind(open_date.id())
        .bind(open_date.title())
        .bind(open_date.starts_at())
        .bind(open_date.is_public())
        .bind(open_date.owner())
        .bind(open_date.created_at())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write open date {}: {:?}", open_date.id(), e);
            handle_db_error(e)
        })?;

        sqlx::query("DELETE FROM open_date_invited_contributors WHERE open_date_id = $1")
            .bind(open_date.id())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear invitations of {}: {:?}", open_date.id(), e);
                AppError::Database(e)
            })?;

        sqlx::query(
            r#"
            INSERT INTO open_date_invited_contributors (open_date_id, contributor_id, position)
            SELECT $1, i.contributor_id, i.position
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS i(contributor_id, position)
            "#,
        )
        .bind(open_date.id())
        .bind(open_date.invited_contributors())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write invitations of {}: {:?}", open_date.id(), e);
            handle_db_error(e)
        })?;

        Ok(())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert user: {:?}", e);
            handle_db_error(e)
        })?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    async fn find_contributor(&self, id: Uuid) -> Result<Option<Contributor>> {
        let row = sqlx::query_as::<_, ContributorRow>(&format!(
            "SELECT {} FROM contributor WHERE id = $1",
            CONTRIBUTOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch contributor {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        match row {
            Some(row) => Ok(Some(self.hydrate_contributor(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_contributors(&self, ids: &[Uuid]) -> Result<Vec<Contributor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ContributorRow>(&format!(
            "SELECT {} FROM contributor WHERE id = ANY($1)",
            CONTRIBUTOR_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch contributors: {:?}", e);
            AppError::Database(e)
        })?;

        let mut contributors = Vec::with_capacity(rows.len());
        for row in rows {
            contributors.push(self.hydrate_contributor(row).await?);
        }

        Ok(order_by_ids(ids, contributors, Contributor::id))
    }

    async fn find_contributor_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Contributor>> {
        let row = sqlx::query_as::<_, ContributorRow>(&format!(
            "SELECT {} FROM contributor WHERE identifier = $1",
            CONTRIBUTOR_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch contributor '{}': {:?}", identifier, e);
            AppError::Database(e)
        })?;

        match row {
            Some(row) => Ok(Some(self.hydrate_contributor(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_contributors(
        &self,
        contributor_type: Option<ContributorType>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Contributor>, i64)> {
        let discriminator = contributor_type.map(ContributorType::discriminator);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contributor WHERE ($1::varchar IS NULL OR type = $1)",
        )
        .bind(discriminator)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count contributors: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, ContributorRow>(&format!(
            r#"
            SELECT {} FROM contributor
            WHERE ($1::varchar IS NULL OR type = $1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
            CONTRIBUTOR_COLUMNS
        ))
        .bind(discriminator)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list contributors: {:?}", e);
            AppError::Database(e)
        })?;

        let mut contributors = Vec::with_capacity(rows.len());
        for row in rows {
            contributors.push(self.hydrate_contributor(row).await?);
        }

        Ok((contributors, total))
    }

    async fn identifier_taken(&self, identifier: &str, except: Option<Uuid>) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contributor
                WHERE identifier = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(identifier)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check identifier '{}': {:?}", identifier, e);
            AppError::Database(e)
        })
    }

    async fn find_open_date(&self, id: Uuid) -> Result<Option<OpenDate>> {
        let row = sqlx::query_as::<_, OpenDateRow>(&format!(
            "SELECT {} FROM open_date WHERE id = $1",
            OPEN_DATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch open date {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        match row {
            Some(row) => Ok(Some(self.hydrate_open_date(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_open_dates(&self, ids: &[Uuid]) -> Result<Vec<OpenDate>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, OpenDateRow>(&format!(
            "SELECT {} FROM open_date WHERE id = ANY($1)",
            OPEN_DATE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch open dates: {:?}", e);
            AppError::Database(e)
        })?;

        let mut open_dates = Vec::with_capacity(rows.len());
        for row in rows {
            open_dates.push(self.hydrate_open_date(row).await?);
        }

        Ok(order_by_ids(ids, open_dates, OpenDate::id))
    }

    async fn commit(&self, graph: &ContributorGraph) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::Database(e)
        })?;

        for contributor in graph.dirty_contributors() {
            Self::write_contributor(&mut tx, contributor).await?;
        }
        for open_date in graph.dirty_open_dates() {
            Self::write_open_date(&mut tx, open_date).await?;
        }
        if !graph.removed_contributors().is_empty() {
            sqlx::query("DELETE FROM contributor WHERE id = ANY($1)")
                .bind(graph.removed_contributors())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete contributors: {:?}", e);
                    AppError::Database(e)
                })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit transaction: {:?}", e);
            handle_db_error(e)
        })?;

        tracing::debug!(
            contributors = graph.dirty_contributors().count(),
            open_dates = graph.dirty_open_dates().count(),
            removed = graph.removed_contributors().len(),
            "Committed graph to database"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(discriminator: &str) -> ContributorRow {
        let now = Utc::now();
        ContributorRow {
            id: Uuid::new_v4(),
            discriminator: discriminator.to_string(),
            name: "Les Zygos".to_string(),
            description: String::new(),
            short_name: "Zygos".to_string(),
            identifier: "zygos".to_string(),
            location: "Nantes".to_string(),
            banner_pic_url: None,
            profile_pic_url: None,
            created_by: Uuid::new_v4(),
            troupe_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_discriminator_selects_variant() {
        let team = contributor_from_row(row("TEA"), ContributorRelations::default()).unwrap();
        assert_eq!(team.contributor_type(), ContributorType::Team);
        assert!(team.troupe().is_some());

        let group = contributor_from_row(row("Grou"), ContributorRelations::default()).unwrap();
        assert!(group.is_improv_group());
        assert_eq!(group.troupe(), None);
    }

    #[test]
    fn test_troupe_row_takes_loaded_teams() {
        let team = Uuid::new_v4();
        let relations = ContributorRelations {
            teams: vec![team],
            ..Default::default()
        };

        let troupe = contributor_from_row(row("TRO"), relations).unwrap();
        assert_eq!(troupe.teams(), &[team]);
    }

    #[test]
    fn test_unknown_discriminator_is_internal_error() {
        let err = contributor_from_row(row("XXX"), ContributorRelations::default()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_order_by_ids_follows_request_and_skips_missing() {
        let (a, b, missing) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ordered = order_by_ids(&[b, missing, a], vec![a, b], |id| *id);
        assert_eq!(ordered, vec![b, a]);
    }
}
