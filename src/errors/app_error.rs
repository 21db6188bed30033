use form_core::{CoreError, ErrorKind};
use form_persistence::PersistenceError;
use thiserror::Error;

/// Errores de nivel aplicación (binarios): configuración, arranque del
/// backend y errores del core propagados.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Código de salida de los binarios: 3 JSON de entrada inválido, 4
    /// rechazo de negocio / no encontrado / falta configuración, 5 fallo del
    /// backend. El 2 (uso) lo emite clap.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Json(_) => 3,
            AppError::Config(_) | AppError::Persistence(PersistenceError::Config(_)) => 4,
            AppError::Core(e) => match e.kind() {
                ErrorKind::Persistence | ErrorKind::Cancelled | ErrorKind::DeadlineExceeded => 5,
                _ => 4,
            },
            AppError::Persistence(_) | AppError::Io(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_core::StoreError;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("mala configuración".into());
        assert_eq!(err.to_string(), "Error de configuración: mala configuración");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_core_errors_are_transparent() {
        let err: AppError = CoreError::InvalidStatus("zzz".into()).into();
        assert_eq!(err.to_string(), "invalid status: zzz");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_backend_failures_exit_with_five() {
        let err: AppError = CoreError::from_store("get_workflow", StoreError::Backend("down".into())).into();
        assert_eq!(err.exit_code(), 5);
        let err: AppError = PersistenceError::TransientIo("pool".into()).into();
        assert_eq!(err.exit_code(), 5);
        let err: AppError = PersistenceError::Config("DATABASE_URL".into()).into();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_json_variant_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: AppError = json_err.into();
        assert_eq!(err.exit_code(), 3);
    }
}
