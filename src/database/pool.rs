use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::{get_config, Config};
use crate::error::{Error, Result};

pub fn pool_options(config: &Config) -> Result<PgPoolOptions> {
    if config.db_max_connections == 0 {
        return Err(Error::Config(
            "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
        ));
    }
    Ok(PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs)))
}

pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = pool_options(config)?.connect(&config.database_url).await?;
    info!(
        max_connections = config.db_max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_connections: u32) -> Config {
        Config {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/test".into(),
            db_max_connections: max_connections,
            db_acquire_timeout_secs: 5,
            import_min_confidence: 0.7,
            import_fallback_encoding: "windows-1251".into(),
            import_require_all_files: true,
            max_upload_bytes: 1024,
        }
    }

    #[test]
    fn pool_size_comes_from_config() {
        let options = pool_options(&config(4)).unwrap();
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(pool_options(&config(0)), Err(Error::Config(_))));
    }
}
