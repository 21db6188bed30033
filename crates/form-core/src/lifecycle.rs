//! Ciclo de vida del workflow: parseo de estado, política de transición,
//! gate de edición sólo-draft y borrado condicionado a no tener submissions.
//!
//! Los chequeos que dependen del estado persistido se re-verifican dentro
//! del store (`update_workflow_if_draft`, `transition_workflow_status`,
//! `delete_workflow_if_unreferenced`); la lectura previa sólo sirve para
//! rechazar rápido y para construir el workflow parcheado.
use chrono::Utc;
use form_domain::{Action, Trigger, Workflow, WorkflowStatus};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::context::CallContext;
use crate::errors::{CoreError, StoreError};
use crate::store::WorkflowStore;

/// Qué transiciones de estado se aceptan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Cualquiera de los cinco estados desde cualquier otro.
    #[default]
    Permissive,
    /// Sólo las aristas del grafo de producto.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: WorkflowStatus, to: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                from == to
                || matches!((from, to),
                            (Draft, Active)
                            | (Draft, Archived)
                            | (Active, Paused)
                            | (Active, Stopped)
                            | (Active, Archived)
                            | (Paused, Active)
                            | (Paused, Stopped)
                            | (Paused, Archived)
                            | (Stopped, Archived))
            }
        }
    }
}

pub fn parse_workflow_status(raw: &str) -> Result<WorkflowStatus, CoreError> {
    WorkflowStatus::from_str(raw).map_err(CoreError::from)
}

/// Rechaza la edición de un workflow que no está en `Draft`.
pub fn ensure_editable(workflow: &Workflow) -> Result<(), CoreError> {
    if workflow.is_editable() {
        Ok(())
    } else {
        Err(CoreError::NotEditable { id: workflow.id,
                                     status: workflow.status })
    }
}

/// Merge-patch de un workflow: `None` conserva el valor actual. El estado no
/// forma parte del patch (ver `update_status`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schema_id: Option<Uuid>,
    pub trigger: Option<Trigger>,
    pub actions: Option<Vec<Action>>,
}

impl WorkflowPatch {
    /// Aplica el patch sobre una copia; el original queda intacto si falla.
    pub fn apply(&self, workflow: &Workflow) -> Result<Workflow, CoreError> {
        let mut next = workflow.clone();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::InvalidInput("workflow name must not be empty".into()));
            }
            next.name = name.clone();
        }
        if let Some(description) = &self.description {
            next.description = Some(description.clone());
        }
        if let Some(schema_id) = self.schema_id {
            next.schema_id = Some(schema_id);
        }
        if let Some(trigger) = &self.trigger {
            next.trigger = trigger.clone();
        }
        if let Some(actions) = &self.actions {
            next.actions = actions.clone();
        }
        next.updated_at = Utc::now();
        Ok(next)
    }
}

fn load<S: WorkflowStore + ?Sized>(store: &S, ctx: &CallContext, id: Uuid) -> Result<Workflow, CoreError> {
    store.get_workflow(ctx, id)
         .map_err(|e| CoreError::from_store("get_workflow", e))?
         .ok_or_else(|| CoreError::not_found("workflow", id))
}

/// `UpdateWorkflow`: sólo en `Draft`, todo o nada.
pub fn update_workflow<S: WorkflowStore + ?Sized>(store: &S,
                                                  ctx: &CallContext,
                                                  id: Uuid,
                                                  patch: &WorkflowPatch)
                                                  -> Result<Workflow, CoreError> {
    let current = load(store, ctx, id)?;
    if let Err(e) = ensure_editable(&current) {
        warn!("update_workflow rejected id={id} status={}", current.status);
        return Err(e);
    }
    let next = patch.apply(&current)?;
    match store.update_workflow_if_draft(ctx, &next) {
        Ok(()) => Ok(next),
        Err(StoreError::StatusMismatch(status)) => {
            warn!("update_workflow lost race id={id} status={status}");
            Err(CoreError::NotEditable { id, status })
        }
        Err(StoreError::NotFound) => Err(CoreError::not_found("workflow", id)),
        Err(e) => Err(CoreError::from_store("update_workflow_if_draft", e)),
    }
}

/// `UpdateWorkflowStatus`: el string debe pertenecer al set cerrado; la
/// política decide si la arista es válida desde el estado persistido.
pub fn update_status<S: WorkflowStore + ?Sized>(store: &S,
                                                ctx: &CallContext,
                                                policy: TransitionPolicy,
                                                id: Uuid,
                                                raw_status: &str)
                                                -> Result<Workflow, CoreError> {
    let to = parse_workflow_status(raw_status)?;
    let allowed = |from: WorkflowStatus| policy.allows(from, to);
    match store.transition_workflow_status(ctx, id, to, &allowed, Utc::now()) {
        Ok(wf) => {
            info!("workflow {id} status -> {to}");
            Ok(wf)
        }
        Err(StoreError::StatusMismatch(from)) => {
            warn!("transition {from} -> {to} rejected for workflow {id}");
            Err(CoreError::InvalidStatus(format!("transition {from} -> {to} is not allowed")))
        }
        Err(StoreError::NotFound) => Err(CoreError::not_found("workflow", id)),
        Err(e) => Err(CoreError::from_store("transition_workflow_status", e)),
    }
}

/// `DeleteWorkflow`: conteo y borrado en la misma unidad atómica del store.
pub fn delete_workflow<S: WorkflowStore + ?Sized>(store: &S, ctx: &CallContext, id: Uuid) -> Result<(), CoreError> {
    match store.delete_workflow_if_unreferenced(ctx, id) {
        Ok(()) => {
            info!("workflow {id} deleted");
            Ok(())
        }
        Err(StoreError::HasSubmissions(count)) => {
            warn!("delete_workflow rejected id={id} submissions={count}");
            Err(CoreError::HasDependents { id, count })
        }
        Err(StoreError::NotFound) => Err(CoreError::not_found("workflow", id)),
        Err(e) => Err(CoreError::from_store("delete_workflow_if_unreferenced", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_policy_accepts_every_pair() {
        for from in WorkflowStatus::ALL {
            for to in WorkflowStatus::ALL {
                assert!(TransitionPolicy::Permissive.allows(from, to));
            }
        }
    }

    #[test]
    fn strict_policy_follows_product_graph() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.allows(WorkflowStatus::Draft, WorkflowStatus::Active));
        assert!(strict.allows(WorkflowStatus::Paused, WorkflowStatus::Active));
        assert!(strict.allows(WorkflowStatus::Archived, WorkflowStatus::Archived));
        assert!(!strict.allows(WorkflowStatus::Archived, WorkflowStatus::Active));
        assert!(!strict.allows(WorkflowStatus::Active, WorkflowStatus::Draft));
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let wf = Workflow::new("orig", Some("desc".into()), Uuid::new_v4(), None, Trigger::default(), vec![]).unwrap();
        let patch = WorkflowPatch { name: Some("renamed".into()),
                                    ..Default::default() };
        let next = patch.apply(&wf).unwrap();
        assert_eq!(next.name, "renamed");
        assert_eq!(next.description.as_deref(), Some("desc"));
        assert_eq!(next.status, WorkflowStatus::Draft);
        assert!(WorkflowPatch { name: Some(" ".into()),
                                ..Default::default() }.apply(&wf)
                                                     .is_err());
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert_eq!(parse_workflow_status("deleted"), Err(CoreError::InvalidStatus("deleted".into())));
        assert_eq!(parse_workflow_status("paused"), Ok(WorkflowStatus::Paused));
    }
}
