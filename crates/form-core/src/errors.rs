//! Errores del core.
//!
//! `CoreError` es la taxonomía que ve el transporte: cada variante mapea a un
//! único `ErrorKind` (y de ahí a un status HTTP) sin inspeccionar texto.
//! `StoreError` es lo que devuelven los backends de persistencia.

use form_domain::{DomainError, WorkflowStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::Violation;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    /// Operación condicionada rechazada: el workflow está en otro estado.
    #[error("workflow status is {0}")]
    StatusMismatch(WorkflowStatus),
    /// Borrado condicionado rechazado: el workflow tiene submissions.
    #[error("workflow has {0} submission(s)")]
    HasSubmissions(u64),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transient backend error: {0}")]
    Transient(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    /// Candidato a reintento por parte del caller (el core nunca reintenta).
    /// Un `Conflict` (id duplicado) es determinista y no se reintenta.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),
    #[error("workflow {id} can only be updated in draft status (current: {status})")]
    NotEditable { id: Uuid, status: WorkflowStatus },
    #[error("workflow {id} is not active and cannot accept submissions (current: {status})")]
    NotAccepting { id: Uuid, status: WorkflowStatus },
    #[error("cannot delete workflow {id} with {count} existing submission(s)")]
    HasDependents { id: Uuid, count: u64 },
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("persistence error during {op}: {source}")]
    Persistence {
        op: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Clase estable de error para el transporte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    ValidationFailed,
    NotEditable,
    NotAccepting,
    HasDependents,
    InvalidStatus,
    Persistence,
    Cancelled,
    DeadlineExceeded,
}

impl ErrorKind {
    /// Mapeo canónico a status HTTP.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput | ErrorKind::InvalidStatus => 400,
            ErrorKind::ValidationFailed => 422,
            ErrorKind::NotEditable | ErrorKind::NotAccepting | ErrorKind::HasDependents => 409,
            ErrorKind::Persistence => 500,
            ErrorKind::Cancelled => 499,
            ErrorKind::DeadlineExceeded => 504,
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            CoreError::NotEditable { .. } => ErrorKind::NotEditable,
            CoreError::NotAccepting { .. } => ErrorKind::NotAccepting,
            CoreError::HasDependents { .. } => ErrorKind::HasDependents,
            CoreError::InvalidStatus(_) => ErrorKind::InvalidStatus,
            CoreError::Persistence { .. } => ErrorKind::Persistence,
            CoreError::Cancelled => ErrorKind::Cancelled,
            CoreError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    /// Sólo fallos transitorios del backend son reintentables por el caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Persistence { source, .. } if source.is_transient())
    }

    /// Status HTTP sugerido; un fallo transitorio del backend se reporta 503.
    pub fn http_status(&self) -> u16 {
        if self.is_retryable() {
            return 503;
        }
        self.kind().http_status()
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { entity, id: id.to_string() }
    }

    /// Traduce un `StoreError` genérico: cancelación y deadline conservan su
    /// propia variante, el resto se envuelve con el nombre de la operación.
    pub fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::Cancelled => CoreError::Cancelled,
            StoreError::DeadlineExceeded => CoreError::DeadlineExceeded,
            other => CoreError::Persistence { op, source: other },
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStatus(s) => CoreError::InvalidStatus(s),
            other => CoreError::InvalidInput(other.to_string()),
        }
    }
}
