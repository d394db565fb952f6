use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::application::Application;
use crate::models::profile::Profile;
use crate::store::{ApplicationStore, RemoteStore, StoreError};

/// `profiles` table: one jsonb document per user.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for PgProfileStore {
    type Key = Uuid;
    type Document = Profile;

    async fn load(&self, user_id: &Uuid) -> Result<Option<Profile>, StoreError> {
        let row: Option<Json<Profile>> =
            sqlx::query_scalar("SELECT document FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(profile)| profile))
    }

    async fn save(&self, user_id: &Uuid, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, document, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(Json(profile))
        .execute(&self.pool)
        .await?;

        debug!("Saved profile for user {user_id}");
        Ok(())
    }
}

/// `applications` table: one jsonb document per application, indexed by owner.
#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteStore for PgApplicationStore {
    type Key = Uuid;
    type Document = Application;

    async fn load(&self, id: &Uuid) -> Result<Option<Application>, StoreError> {
        let row: Option<Json<Application>> =
            sqlx::query_scalar("SELECT document FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(application)| application))
    }

    async fn save(&self, id: &Uuid, application: &Application) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO applications (id, user_id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = now()
            "#,
        )
        .bind(id)
        .bind(application.user_id)
        .bind(Json(application))
        .bind(application.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Saved application {id}");
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let rows: Vec<Json<Application>> = sqlx::query_scalar(
            "SELECT document FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(application)| application).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
