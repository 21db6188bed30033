//! Submission: una entrada de datos contra un workflow activo.
//!
//! Los datos son inmutables tras la creación; sólo `status` (y
//! `updated_at`) cambian después.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::DomainError;

/// Estado del post-procesamiento asíncrono de una submission.
///
/// `Pending` -> `Processing` -> `Completed` | `Failed`. Desacoplado del estado
/// del workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 4] = [SubmissionStatus::Pending,
                                            SubmissionStatus::Processing,
                                            SubmissionStatus::Completed,
                                            SubmissionStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed)
    }
}

impl FromStr for SubmissionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL.iter()
                             .copied()
                             .find(|st| st.as_str() == s)
                             .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contexto del envío. Los campos ausentes se leen como cadena vacía.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}

impl SubmissionMetadata {
    /// Lectura tolerante desde JSON arbitrario: claves ausentes, `null` o de
    /// tipo no-string quedan como `""`.
    pub fn from_json(value: &Value) -> Self {
        let pick = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        SubmissionMetadata { ip_address: pick("ipAddress"),
                             user_agent: pick("userAgent"),
                             referrer: pick("referrer") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub workflow_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<Uuid>,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: SubmissionMetadata,
    pub status: SubmissionStatus,
    /// Huella del esquema vigente al momento del envío.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Nueva submission con identidad fresca y estado `Pending`.
    pub fn new_pending(workflow_id: Uuid,
                       schema_id: Option<Uuid>,
                       data: Map<String, Value>,
                       metadata: SubmissionMetadata,
                       schema_fingerprint: Option<String>)
                       -> Self {
        let now = Utc::now();
        Submission { id: Uuid::new_v4(),
                     workflow_id,
                     schema_id,
                     data,
                     metadata,
                     status: SubmissionStatus::Pending,
                     schema_fingerprint,
                     created_at: now,
                     updated_at: now }
    }
}
