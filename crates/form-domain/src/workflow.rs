//! Workflow: controlador operativo de un esquema de formulario.
//!
//! Define el trigger, mantiene el estado de ciclo de vida y contiene la
//! secuencia ordenada de acciones (la ejecución de acciones queda fuera de
//! este workspace; aquí sólo se modela el orden).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::conditional::Conditional;
use crate::DomainError;

/// Estado de ciclo de vida de un workflow.
///
/// Flujo habitual: `Draft` -> `Active` -> `Paused` -> `Archived`. `Stopped`
/// está definido pero ningún camino del producto lo usa todavía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Estado inicial; único estado editable.
    Draft,
    /// Único estado que acepta submissions.
    Active,
    Paused,
    /// Reservado.
    Stopped,
    Archived,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 5] = [WorkflowStatus::Draft,
                                          WorkflowStatus::Active,
                                          WorkflowStatus::Paused,
                                          WorkflowStatus::Stopped,
                                          WorkflowStatus::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Active => "active",
            WorkflowStatus::Paused => "paused",
            WorkflowStatus::Stopped => "stopped",
            WorkflowStatus::Archived => "archived",
        }
    }
}

impl FromStr for WorkflowStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStatus::ALL.iter()
                           .copied()
                           .find(|st| st.as_str() == s)
                           .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    FormSubmission,
    Webhook,
    #[default]
    Manual,
}

/// Evento que inicia el workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type", default)]
    pub trigger_type: TriggerType,
    /// Configuración opaca específica del tipo (p.ej. URL del webhook).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendEmail,
    CallWebhook,
    Notification,
    Condition,
}

/// Un paso del workflow posterior a la recepción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Guardia opcional; su `field_id` debería existir en el esquema del
    /// workflow (no se verifica al escribir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl Action {
    pub fn new(action_type: ActionType, config: Option<Value>) -> Self {
        Self { id: Uuid::new_v4().to_string(),
               action_type,
               description: None,
               config,
               conditional: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<Uuid>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub trigger: Trigger,
    /// Orden significativo (orden de ejecución).
    #[serde(default)]
    pub actions: Vec<Action>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Crea un workflow nuevo, siempre en `Draft`.
    pub fn new(name: &str,
               description: Option<String>,
               owner_id: Uuid,
               schema_id: Option<Uuid>,
               trigger: Trigger,
               actions: Vec<Action>)
               -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::ValidationError("workflow name is required".to_string()));
        }
        let now = Utc::now();
        Ok(Workflow { id: Uuid::new_v4(),
                      name: name.to_string(),
                      description,
                      owner_id,
                      schema_id,
                      status: WorkflowStatus::Draft,
                      trigger,
                      actions,
                      created_at: now,
                      updated_at: now })
    }

    pub fn is_editable(&self) -> bool {
        self.status == WorkflowStatus::Draft
    }

    pub fn accepts_submissions(&self) -> bool {
        self.status == WorkflowStatus::Active
    }
}
