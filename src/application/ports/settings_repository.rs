use async_trait::async_trait;

use crate::domain::{ConversionOptions, OwnerId};

use super::RepositoryError;

/// Per-owner default conversion options, read before every submission and
/// merged beneath the caller's explicit options.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Missing settings are an empty option set, not an error.
    async fn default_options(&self, owner_id: OwnerId) -> Result<ConversionOptions, RepositoryError>;

    async fn put_default_options(
        &self,
        owner_id: OwnerId,
        options: &ConversionOptions,
    ) -> Result<(), RepositoryError>;
}
