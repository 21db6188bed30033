//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `AppConfig`, que
//! fija el deadline por llamada y la política de transiciones del façade.
//! La configuración de base de datos vive en `form_persistence::DbConfig`.
use form_core::constants::DEFAULT_CALL_TIMEOUT_MS;
use form_core::TransitionPolicy;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::errors::AppError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Deadline por defecto de cada operación (`FORMFLOW_CALL_TIMEOUT_MS`).
    pub call_timeout: Duration,
    /// Tabla estricta de transiciones (`FORMFLOW_STRICT_TRANSITIONS`).
    pub strict_transitions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
               strict_transitions: false }
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::Config(format!("{key}: valor booleano inválido {other:?}"))),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mut cfg = AppConfig::default();
        if let Some(raw) = lookup("FORMFLOW_CALL_TIMEOUT_MS") {
            let ms: u64 = raw.trim()
                             .parse()
                             .map_err(|_| AppError::Config(format!("FORMFLOW_CALL_TIMEOUT_MS inválido: {raw:?}")))?;
            if ms == 0 {
                return Err(AppError::Config("FORMFLOW_CALL_TIMEOUT_MS debe ser > 0".into()));
            }
            cfg.call_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("FORMFLOW_STRICT_TRANSITIONS") {
            cfg.strict_transitions = parse_bool("FORMFLOW_STRICT_TRANSITIONS", &raw)?;
        }
        Ok(cfg)
    }

    pub fn policy(&self) -> TransitionPolicy {
        if self.strict_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.policy(), TransitionPolicy::Permissive);
    }

    #[test]
    fn reads_timeout_and_strict_flag() {
        let cfg = AppConfig::from_lookup(lookup(&[("FORMFLOW_CALL_TIMEOUT_MS", "250"),
                                                  ("FORMFLOW_STRICT_TRANSITIONS", "TRUE")])).unwrap();
        assert_eq!(cfg.call_timeout, Duration::from_millis(250));
        assert_eq!(cfg.policy(), TransitionPolicy::Strict);
    }

    #[test]
    fn rejects_garbage() {
        assert!(AppConfig::from_lookup(lookup(&[("FORMFLOW_CALL_TIMEOUT_MS", "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("FORMFLOW_CALL_TIMEOUT_MS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("FORMFLOW_STRICT_TRANSITIONS", "maybe")])).is_err());
    }
}
