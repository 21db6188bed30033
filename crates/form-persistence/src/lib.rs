//! form-persistence
//!
//! Backend Postgres (Diesel + r2d2) de los traits de store de `form-core`.
//!
//! Módulos:
//! - `pg`: `PgStore`, proveedor de conexiones y construcción del pool.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::DbConfig;
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgPool, PgStore, PoolProvider};
