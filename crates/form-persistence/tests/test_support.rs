use form_persistence::config::DbConfig;
use form_persistence::pg::{build_pool, PgPool, PgStore, PoolProvider};
use once_cell::sync::Lazy;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    // pool chico y estable para tests
    match build_pool(&cfg.url, 1, 4, cfg.connect_timeout) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_store<F, R>(f: F) -> Option<R>
    where F: FnOnce(PgStore<PoolProvider>) -> R
{
    match TEST_POOL.as_ref() {
        Some(pool) => Some(f(PgStore::new(PoolProvider { pool: pool.clone() }))),
        None => {
            eprintln!("skip (no DATABASE_URL)");
            None
        }
    }
}
