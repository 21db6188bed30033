//! Inicialización de logging para los binarios.
//!
//! `tracing-subscriber` con `EnvFilter` (`RUST_LOG`, por defecto `info`); los
//! registros del facade `log` que emiten core y persistencia se reenvían al
//! mismo subscriber.
use tracing_subscriber::EnvFilter;

/// Idempotente: llamadas posteriores a la primera no hacen nada.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter)
                                     .with_writer(std::io::stderr)
                                     .try_init();
}
