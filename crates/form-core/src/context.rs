//! Contexto por llamada: deadline + token de cancelación.
//!
//! Todo método de store recibe un `CallContext` y lo verifica antes de tocar
//! el backend. El backend Postgres además traduce el tiempo restante a
//! `statement_timeout`.
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::constants::DEFAULT_CALL_TIMEOUT_MS;
use crate::errors::StoreError;

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CallContext {
    /// Sin deadline; sólo cancelable explícitamente.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Some(Instant::now() + timeout),
               token: CancellationToken::new() }
    }

    /// Deadline por defecto (`DEFAULT_CALL_TIMEOUT_MS`).
    pub fn with_default_timeout() -> Self {
        Self::with_timeout(Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS))
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline: Some(deadline),
               token: CancellationToken::new() }
    }

    /// Contexto hijo: hereda deadline y se cancela cuando se cancela el padre.
    pub fn child(&self) -> Self {
        Self { deadline: self.deadline,
               token: self.token.child_token() }
    }

    /// Token para cancelar desde otro hilo (p.ej. el handler al cerrarse la
    /// conexión del cliente).
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Tiempo restante; `Some(ZERO)` si ya expiró, `None` si no hay deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Falla con `Cancelled` o `DeadlineExceeded` si la llamada no debe
    /// continuar.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(StoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_context_never_expires() {
        let ctx = CallContext::background();
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn expired_deadline_is_reported() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(5));
        assert_eq!(ctx.check(), Err(StoreError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(5));
        ctx.cancel();
        assert_eq!(ctx.check(), Err(StoreError::Cancelled));
    }

    #[test]
    fn cancelling_parent_cancels_child() {
        let parent = CallContext::with_default_timeout();
        let child = parent.child();
        parent.token().cancel();
        assert!(child.is_cancelled());
        assert_eq!(child.check(), Err(StoreError::Cancelled));
    }
}
