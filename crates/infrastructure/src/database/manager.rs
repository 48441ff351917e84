use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use users_config::{DatabaseBackend, DatabaseConfig, DeploymentEnvironment};
use users_domain::UserRepository;

use super::{DatabaseManager, InMemoryUserRepository, PostgresUserRepository};

/// Connects the configured user store.
///
/// A migration failure aborts startup in production and is only logged
/// elsewhere, so a development database in an unexpected state still serves.
pub async fn build_user_repository(
    config: &DatabaseConfig,
    environment: DeploymentEnvironment,
) -> Result<Arc<dyn UserRepository>> {
    match config.backend {
        DatabaseBackend::Memory => {
            warn!("Using in-memory user store; data is lost on restart");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
        DatabaseBackend::Postgres => {
            let manager = DatabaseManager::new(config).await?;
            manager.health_check().await?;
            info!(
                max_connections = config.max_connections,
                "Connected to PostgreSQL"
            );

            if config.run_migrations {
                match manager.migrate().await {
                    Ok(()) => info!("Database migrations applied"),
                    Err(err) if environment.is_production() => return Err(err),
                    Err(err) => error!(error = ?err, "Database migrations failed, continuing"),
                }
            }

            Ok(Arc::new(PostgresUserRepository::new(manager.pool().clone())))
        }
    }
}
