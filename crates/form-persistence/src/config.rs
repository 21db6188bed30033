//! Configuración de conexión desde variables de entorno.
//! Convención `DATABASE_URL` más parámetros opcionales de pool.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Espera máxima al pedir una conexión al pool.
    pub connect_timeout: Duration,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL is not set".into()))?;
        if url.trim().is_empty() {
            return Err(PersistenceError::Config("DATABASE_URL is empty".into()));
        }
        Ok(Self { url,
                  min_connections: env_or("DATABASE_MIN_CONNECTIONS", 2),
                  max_connections: env_or("DATABASE_MAX_CONNECTIONS", 16),
                  connect_timeout: Duration::from_millis(env_or("DATABASE_CONNECT_TIMEOUT_MS", 5_000)) })
    }
}
