//! Constantes del core.
//!
//! `FINGERPRINT_VERSION` participa en el hashing de esquemas: cambiarlo
//! invalida todas las huellas previas aunque los campos no cambien.

/// Versión lógica del formato de huella de esquema.
pub const FINGERPRINT_VERSION: &str = "S1";

/// Deadline por defecto de una llamada al store (ms) cuando el caller no fija
/// uno propio.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Tolerancia al comparar `(valor - base) / step` contra un entero.
pub const STEP_EPSILON: f64 = 1e-9;
