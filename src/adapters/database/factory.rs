//! Storage factory
//!
//! This module provides the factory function that creates the medication store
//! from configuration.

use crate::adapters::database::traits::MedicationStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::MedscanConfig;
use crate::domain::{MedscanError, Result};
use std::sync::Arc;

/// Create the medication store described by the configuration
///
/// # Arguments
///
/// * `config` - The medscan configuration
///
/// # Returns
///
/// Returns an Arc-wrapped trait object that implements MedicationStore
///
/// # Errors
///
/// Returns [`MedscanError::Configuration`] if no `[postgresql]` section is
/// configured, or an error if the connection pool cannot be created.
pub async fn create_medication_store(
    config: &MedscanConfig,
) -> Result<Arc<dyn MedicationStore + Send + Sync>> {
    let pg_config = config.postgresql.as_ref().ok_or_else(|| {
        MedscanError::Configuration(
            "Saving medications requires a [postgresql] section or MEDSCAN_POSTGRESQL_CONNECTION_STRING"
                .to_string(),
        )
    })?;

    tracing::info!("Creating PostgreSQL medication store");
    let client = PostgreSQLClient::new(pg_config.clone()).await?;
    let adapter = PostgreSQLAdapter::new(client);

    Ok(Arc::new(adapter) as Arc<dyn MedicationStore + Send + Sync>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_postgresql_section_is_configuration_error() {
        let config = MedscanConfig::default();
        let result = create_medication_store(&config).await;
        assert!(matches!(result, Err(MedscanError::Configuration(_))));
    }
}
