//! FormFlow Rust Library
//!
//! Punto de entrada de la aplicación sobre los crates del workspace:
//! - `config`: `AppConfig` desde variables de entorno.
//! - `errors`: `AppError` y códigos de salida de los binarios.
//! - `logging`: subscriber de logs para binarios.
//! - constructores del façade sobre el backend en memoria o Postgres.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::AppConfig;
pub use errors::AppError;
pub use logging::init_logging;

pub use form_core::{CallContext, CoreError, ErrorKind, FormFlowService, InMemoryStore, Store};
pub use form_persistence::{DbConfig, PgStore, PoolProvider};

/// Façade sobre el backend en memoria, con la política y el timeout de `cfg`.
pub fn memory_service(cfg: &AppConfig) -> FormFlowService<InMemoryStore> {
    FormFlowService::new(InMemoryStore::new()).with_policy(cfg.policy())
                                              .with_call_timeout(cfg.call_timeout)
}

/// Façade sobre Postgres: lee `DbConfig`, construye el pool (con migraciones)
/// y aplica la política y el timeout de `cfg`.
pub fn pg_service(cfg: &AppConfig) -> Result<FormFlowService<PgStore<PoolProvider>>, AppError> {
    let pool = form_persistence::build_pool_from_env()?;
    Ok(FormFlowService::new(PgStore::new(PoolProvider { pool })).with_policy(cfg.policy())
                                                                .with_call_timeout(cfg.call_timeout))
}
