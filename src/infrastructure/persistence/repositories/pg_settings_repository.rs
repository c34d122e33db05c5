use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use crate::application::ports::{RepositoryError, SettingsRepository};
use crate::domain::{ConversionOptions, OwnerId};

pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    #[tracing::instrument(skip(self), fields(owner_id = %owner_id.as_uuid()))]
    async fn default_options(
        &self,
        owner_id: OwnerId,
    ) -> Result<ConversionOptions, RepositoryError> {
        let row = sqlx::query("SELECT default_options FROM owner_settings WHERE owner_id = $1")
            .bind(owner_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let Some(row) = row else {
            return Ok(ConversionOptions::default());
        };

        let options: serde_json::Value = row
            .try_get("default_options")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        serde_json::from_value(options)
            .map_err(|e| RepositoryError::QueryFailed(format!("options decode: {e}")))
    }

    #[tracing::instrument(skip(self, options), fields(owner_id = %owner_id.as_uuid()))]
    async fn put_default_options(
        &self,
        owner_id: OwnerId,
        options: &ConversionOptions,
    ) -> Result<(), RepositoryError> {
        let options = serde_json::to_value(options)
            .map_err(|e| RepositoryError::QueryFailed(format!("options encode: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO owner_settings (owner_id, default_options, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id)
            DO UPDATE SET default_options = EXCLUDED.default_options, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(options)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
