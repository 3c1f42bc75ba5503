// src/utils/db_connect.rs

use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::info;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Connection settings from `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`,
/// `POSTGRES_USER` and `POSTGRES_PASSWORD`.
fn pg_config_from(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let host = lookup("POSTGRES_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let port = lookup("POSTGRES_PORT")
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(5432);
    let dbname = lookup("POSTGRES_DB").unwrap_or_else(|| "dataplatform".to_string());
    let user = lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());

    info!("DB Config: Host={}, Port={}, DB={}, User={}", host, port, dbname, user);
    let mut config = Config::new();
    config
        .host(&host)
        .port(port)
        .dbname(&dbname)
        .user(&user)
        .password(lookup("POSTGRES_PASSWORD").unwrap_or_default())
        .application_name("individual_dedupe")
        .connect_timeout(Duration::from_secs(10));
    config
}

/// A single-connection pool, checked with `SELECT 1`. Each CLI run works
/// inside one transaction, so more connections would sit idle.
pub async fn connect() -> Result<PgPool> {
    let manager = PostgresConnectionManager::new(pg_config_from(|key| std::env::var(key).ok()), NoTls);
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    pool.get()
        .await
        .context("Failed to get test connection from pool")?
        .query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;

    info!("Database connection ready.");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::config::Host;

    #[test]
    fn test_pg_config_defaults() {
        let config = pg_config_from(|_| None);
        assert_eq!(config.get_hosts(), &[Host::Tcp("127.0.0.1".to_string())]);
        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_dbname(), Some("dataplatform"));
        assert_eq!(config.get_user(), Some("postgres"));
        assert_eq!(config.get_application_name(), Some("individual_dedupe"));
    }

    #[test]
    fn test_pg_config_from_values() {
        let config = pg_config_from(|key| match key {
            "POSTGRES_HOST" => Some("db.internal".to_string()),
            "POSTGRES_PORT" => Some("not-a-port".to_string()),
            "POSTGRES_DB" => Some("registry".to_string()),
            _ => None,
        });
        assert_eq!(config.get_hosts(), &[Host::Tcp("db.internal".to_string())]);
        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_dbname(), Some("registry"));
    }
}
