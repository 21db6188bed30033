//! Errores de persistencia.
//! Mapea errores de Diesel / pool a variantes semánticas y de ahí al
//! `StoreError` genérico que consume el core.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use form_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("statement timeout")]
    StatementTimeout,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    /// Fila que no se puede convertir al modelo de dominio.
    #[error("corrupt row: {0}")]
    Corrupt(String),
    /// Operación condicionada rechazada dentro de la transacción.
    #[error("rejected: {0}")]
    Rejected(StoreError),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                // SQLSTATE 57014 no tiene variante propia en Diesel
                _ if info.message().contains("statement timeout") => Self::StatementTimeout,
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Corrupt(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Rejected(inner) => inner,
            PersistenceError::NotFound => StoreError::NotFound,
            PersistenceError::UniqueViolation(msg) => StoreError::Conflict(msg),
            PersistenceError::SerializationConflict => StoreError::Transient("serialization conflict".into()),
            PersistenceError::TransientIo(msg) => StoreError::Transient(msg),
            PersistenceError::StatementTimeout => StoreError::DeadlineExceeded,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_domain::WorkflowStatus;

    #[test]
    fn rejected_guards_keep_their_store_error() {
        let err = PersistenceError::Rejected(StoreError::StatusMismatch(WorkflowStatus::Paused));
        assert_eq!(StoreError::from(err), StoreError::StatusMismatch(WorkflowStatus::Paused));
        assert_eq!(StoreError::from(PersistenceError::Rejected(StoreError::HasSubmissions(3))),
                   StoreError::HasSubmissions(3));
    }

    #[test]
    fn transient_causes_are_transient() {
        assert!(StoreError::from(PersistenceError::SerializationConflict).is_transient());
        assert!(StoreError::from(PersistenceError::TransientIo("pool".into())).is_transient());
        assert!(!StoreError::from(PersistenceError::CheckViolation("status".into())).is_transient());
        assert!(!StoreError::from(PersistenceError::UniqueViolation("forms_pkey".into())).is_transient());
        assert_eq!(StoreError::from(PersistenceError::StatementTimeout), StoreError::DeadlineExceeded);
    }

    #[test]
    fn diesel_not_found_maps_through() {
        assert_eq!(StoreError::from(PersistenceError::from(DieselError::NotFound)), StoreError::NotFound);
    }
}
