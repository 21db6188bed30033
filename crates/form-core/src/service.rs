//! Façade del core: lo que llaman los handlers externos (CLI, demo, un
//! eventual transporte HTTP).
//!
//! Los ids llegan como `&str` (tal cual vienen de la ruta) y se parsean aquí:
//! un id malformado es `InvalidInput`, nunca `NotFound`. Cada operación recibe
//! el `CallContext` de la llamada; `new_context()` fabrica uno con el timeout
//! configurado.
use chrono::Utc;
use form_domain::{Action, Field, FormSchema, Submission, SubmissionMetadata, Trigger, Workflow};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::DEFAULT_CALL_TIMEOUT_MS;
use crate::context::CallContext;
use crate::errors::{CoreError, StoreError};
use crate::lifecycle::{self, TransitionPolicy, WorkflowPatch};
use crate::store::Store;
use crate::{intake, pipeline};

/// Alta de formulario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub fields: Vec<Field>,
}

/// Merge-patch de formulario; no hay gate de estado para formularios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<Field>>,
}

/// Alta de workflow. El estado no es configurable: siempre nace en `draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflow {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: Uuid,
    #[serde(default)]
    pub schema_id: Option<Uuid>,
    #[serde(default)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Acción cuyo `conditional` apunta a un campo que el esquema no tiene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub action_id: String,
    pub field_id: String,
}

pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CoreError::InvalidInput(format!("invalid {entity} id: {raw:?}")))
}

#[derive(Debug)]
pub struct FormFlowService<S: Store> {
    store: S,
    policy: TransitionPolicy,
    call_timeout: Duration,
}

impl<S: Store> FormFlowService<S> {
    pub fn new(store: S) -> Self {
        Self { store,
               policy: TransitionPolicy::default(),
               call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS) }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Contexto nuevo con el deadline configurado.
    pub fn new_context(&self) -> CallContext {
        CallContext::with_timeout(self.call_timeout)
    }

    // ---- Forms ----

    pub fn create_form(&self, ctx: &CallContext, req: NewForm) -> Result<FormSchema, CoreError> {
        let form = FormSchema::new(&req.name, req.description, req.fields, req.owner_id)?;
        self.store.insert_form(ctx, &form).map_err(|e| CoreError::from_store("insert_form", e))?;
        info!("form {} created owner={}", form.id, form.owner_id);
        Ok(form)
    }

    pub fn get_form(&self, ctx: &CallContext, id: &str) -> Result<FormSchema, CoreError> {
        let id = parse_id(id, "form")?;
        self.store
            .get_form(ctx, id)
            .map_err(|e| CoreError::from_store("get_form", e))?
            .ok_or_else(|| CoreError::not_found("form", id))
    }

    pub fn list_forms(&self, ctx: &CallContext, owner_id: &str) -> Result<Vec<FormSchema>, CoreError> {
        let owner_id = parse_id(owner_id, "owner")?;
        self.store.list_forms(ctx, owner_id).map_err(|e| CoreError::from_store("list_forms", e))
    }

    pub fn update_form(&self, ctx: &CallContext, id: &str, patch: FormPatch) -> Result<FormSchema, CoreError> {
        let mut form = self.get_form(ctx, id)?;
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CoreError::InvalidInput("form name must not be empty".into()));
            }
            form.name = name;
        }
        if let Some(description) = patch.description {
            form.description = Some(description);
        }
        if let Some(fields) = patch.fields {
            form.replace_fields(fields)?;
        }
        form.updated_at = Utc::now();
        match self.store.update_form(ctx, &form) {
            Ok(()) => Ok(form),
            Err(StoreError::NotFound) => Err(CoreError::not_found("form", form.id)),
            Err(e) => Err(CoreError::from_store("update_form", e)),
        }
    }

    pub fn delete_form(&self, ctx: &CallContext, id: &str) -> Result<(), CoreError> {
        let id = parse_id(id, "form")?;
        match self.store.delete_form(ctx, id) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(CoreError::not_found("form", id)),
            Err(e) => Err(CoreError::from_store("delete_form", e)),
        }
    }

    // ---- Workflows ----

    pub fn create_workflow(&self, ctx: &CallContext, req: NewWorkflow) -> Result<Workflow, CoreError> {
        let trigger = req.trigger.unwrap_or_default();
        let wf = Workflow::new(&req.name, req.description, req.owner_id, req.schema_id, trigger, req.actions)?;
        self.store.insert_workflow(ctx, &wf).map_err(|e| CoreError::from_store("insert_workflow", e))?;
        info!("workflow {} created owner={}", wf.id, wf.owner_id);
        Ok(wf)
    }

    pub fn get_workflow(&self, ctx: &CallContext, id: &str) -> Result<Workflow, CoreError> {
        let id = parse_id(id, "workflow")?;
        self.store
            .get_workflow(ctx, id)
            .map_err(|e| CoreError::from_store("get_workflow", e))?
            .ok_or_else(|| CoreError::not_found("workflow", id))
    }

    pub fn list_workflows(&self, ctx: &CallContext, owner_id: &str) -> Result<Vec<Workflow>, CoreError> {
        let owner_id = parse_id(owner_id, "owner")?;
        self.store.list_workflows(ctx, owner_id).map_err(|e| CoreError::from_store("list_workflows", e))
    }

    pub fn update_workflow(&self, ctx: &CallContext, id: &str, patch: &WorkflowPatch) -> Result<Workflow, CoreError> {
        let id = parse_id(id, "workflow")?;
        lifecycle::update_workflow(&self.store, ctx, id, patch)
    }

    pub fn update_workflow_status(&self, ctx: &CallContext, id: &str, status: &str) -> Result<Workflow, CoreError> {
        let id = parse_id(id, "workflow")?;
        lifecycle::update_status(&self.store, ctx, self.policy, id, status)
    }

    pub fn delete_workflow(&self, ctx: &CallContext, id: &str) -> Result<(), CoreError> {
        let id = parse_id(id, "workflow")?;
        lifecycle::delete_workflow(&self.store, ctx, id)
    }

    /// Acciones con `conditional` hacia campos inexistentes en el esquema del
    /// workflow. Informativo: ninguna escritura se rechaza por esto.
    pub fn check_action_references(&self, ctx: &CallContext, id: &str) -> Result<Vec<DanglingReference>, CoreError> {
        let wf = self.get_workflow(ctx, id)?;
        let schema = match wf.schema_id {
            Some(schema_id) => {
                self.store.get_form(ctx, schema_id).map_err(|e| CoreError::from_store("get_form", e))?
            }
            None => None,
        };
        let dangling: Vec<DanglingReference> =
            wf.actions
              .iter()
              .filter_map(|a| a.conditional.as_ref().map(|c| (a, c)))
              .filter(|(_, c)| schema.as_ref().and_then(|s| s.field(&c.field_id)).is_none())
              .map(|(a, c)| DanglingReference { action_id: a.id.clone(),
                                                field_id: c.field_id.clone() })
              .collect();
        debug!("check_action_references workflow={} dangling={}", wf.id, dangling.len());
        Ok(dangling)
    }

    // ---- Submissions ----

    pub fn submit(&self,
                  ctx: &CallContext,
                  workflow_id: &str,
                  data: Value,
                  metadata: SubmissionMetadata)
                  -> Result<Submission, CoreError> {
        let workflow_id = parse_id(workflow_id, "workflow")?;
        intake::submit(&self.store, ctx, workflow_id, data, metadata)
    }

    pub fn get_submission(&self, ctx: &CallContext, id: &str) -> Result<Submission, CoreError> {
        let id = parse_id(id, "submission")?;
        self.store
            .get_submission(ctx, id)
            .map_err(|e| CoreError::from_store("get_submission", e))?
            .ok_or_else(|| CoreError::not_found("submission", id))
    }

    pub fn list_submissions(&self, ctx: &CallContext, workflow_id: &str) -> Result<Vec<Submission>, CoreError> {
        let workflow_id = parse_id(workflow_id, "workflow")?;
        self.store.list_submissions(ctx, workflow_id).map_err(|e| CoreError::from_store("list_submissions", e))
    }

    pub fn list_submissions_by_owner(&self, ctx: &CallContext, owner_id: &str) -> Result<Vec<Submission>, CoreError> {
        let owner_id = parse_id(owner_id, "owner")?;
        self.store
            .list_submissions_by_owner(ctx, owner_id)
            .map_err(|e| CoreError::from_store("list_submissions_by_owner", e))
    }

    pub fn update_submission_status(&self, ctx: &CallContext, id: &str, status: &str) -> Result<Submission, CoreError> {
        let id = parse_id(id, "submission")?;
        pipeline::update_submission_status(&self.store, ctx, id, status)
    }

    pub fn delete_submission(&self, ctx: &CallContext, id: &str) -> Result<(), CoreError> {
        let id = parse_id(id, "submission")?;
        match self.store.delete_submission(ctx, id) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(CoreError::not_found("submission", id)),
            Err(e) => Err(CoreError::from_store("delete_submission", e)),
        }
    }
}
