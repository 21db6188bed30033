//! Backend en memoria.
//!
//! Todo el estado vive detrás de un único `RwLock`, de modo que las
//! operaciones condicionadas (leer estado/contar y luego escribir) son
//! atómicas respecto de cualquier otra llamada. `IndexMap` conserva el orden
//! de inserción, que es el orden de listado.
use chrono::{DateTime, Utc};
use form_domain::{FormSchema, Submission, SubmissionStatus, Workflow, WorkflowStatus};
use indexmap::IndexMap;
use log::debug;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::context::CallContext;
use crate::errors::StoreError;
use crate::store::types::{FormStore, SubmissionStore, WorkflowStore};

#[derive(Debug, Default)]
struct State {
    forms: IndexMap<Uuid, FormSchema>,
    workflows: IndexMap<Uuid, Workflow>,
    submissions: IndexMap<Uuid, Submission>,
}

impl State {
    fn submission_count(&self, workflow_id: Uuid) -> u64 {
        self.submissions.values().filter(|s| s.workflow_id == workflow_id).count() as u64
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, ctx: &CallContext) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        ctx.check()?;
        self.inner.read().map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self, ctx: &CallContext) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        ctx.check()?;
        self.inner.write().map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }
}

impl FormStore for InMemoryStore {
    fn insert_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        if state.forms.contains_key(&form.id) {
            return Err(StoreError::Conflict(format!("form {} already exists", form.id)));
        }
        state.forms.insert(form.id, form.clone());
        Ok(())
    }

    fn get_form(&self, ctx: &CallContext, id: Uuid) -> Result<Option<FormSchema>, StoreError> {
        Ok(self.read(ctx)?.forms.get(&id).cloned())
    }

    fn list_forms(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<FormSchema>, StoreError> {
        Ok(self.read(ctx)?.forms.values().filter(|f| f.owner_id == owner_id).cloned().collect())
    }

    fn update_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        let slot = state.forms.get_mut(&form.id).ok_or(StoreError::NotFound)?;
        *slot = form.clone();
        Ok(())
    }

    fn delete_form(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        self.write(ctx)?.forms.shift_remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

impl WorkflowStore for InMemoryStore {
    fn insert_workflow(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        if state.workflows.contains_key(&workflow.id) {
            return Err(StoreError::Conflict(format!("workflow {} already exists", workflow.id)));
        }
        state.workflows.insert(workflow.id, workflow.clone());
        Ok(())
    }

    fn get_workflow(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Workflow>, StoreError> {
        Ok(self.read(ctx)?.workflows.get(&id).cloned())
    }

    fn list_workflows(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        Ok(self.read(ctx)?.workflows.values().filter(|w| w.owner_id == owner_id).cloned().collect())
    }

    fn update_workflow_if_draft(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        let slot = state.workflows.get_mut(&workflow.id).ok_or(StoreError::NotFound)?;
        if slot.status != WorkflowStatus::Draft {
            return Err(StoreError::StatusMismatch(slot.status));
        }
        // el estado lo gobierna transition_workflow_status, nunca el update
        let status = slot.status;
        *slot = workflow.clone();
        slot.status = status;
        Ok(())
    }

    fn transition_workflow_status(&self,
                                  ctx: &CallContext,
                                  id: Uuid,
                                  to: WorkflowStatus,
                                  allowed: &dyn Fn(WorkflowStatus) -> bool,
                                  at: DateTime<Utc>)
                                  -> Result<Workflow, StoreError> {
        let mut state = self.write(ctx)?;
        let slot = state.workflows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !allowed(slot.status) {
            return Err(StoreError::StatusMismatch(slot.status));
        }
        debug!("transition_workflow_status id={id} {} -> {}", slot.status, to);
        slot.status = to;
        slot.updated_at = at;
        Ok(slot.clone())
    }

    fn delete_workflow_if_unreferenced(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        if !state.workflows.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        let count = state.submission_count(id);
        if count > 0 {
            return Err(StoreError::HasSubmissions(count));
        }
        state.workflows.shift_remove(&id);
        Ok(())
    }
}

impl SubmissionStore for InMemoryStore {
    fn insert_submission_if_accepting(&self, ctx: &CallContext, submission: &Submission) -> Result<(), StoreError> {
        let mut state = self.write(ctx)?;
        let status = state.workflows
                          .get(&submission.workflow_id)
                          .map(|w| w.status)
                          .ok_or(StoreError::NotFound)?;
        if status != WorkflowStatus::Active {
            return Err(StoreError::StatusMismatch(status));
        }
        if state.submissions.contains_key(&submission.id) {
            return Err(StoreError::Conflict(format!("submission {} already exists", submission.id)));
        }
        state.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    fn get_submission(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self.read(ctx)?.submissions.get(&id).cloned())
    }

    fn list_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        Ok(self.read(ctx)?
               .submissions
               .values()
               .filter(|s| s.workflow_id == workflow_id)
               .cloned()
               .collect())
    }

    fn list_submissions_by_owner(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        let state = self.read(ctx)?;
        Ok(state.submissions
                .values()
                .filter(|s| state.workflows.get(&s.workflow_id).is_some_and(|w| w.owner_id == owner_id))
                .cloned()
                .collect())
    }

    fn count_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.read(ctx)?.submission_count(workflow_id))
    }

    fn set_submission_status(&self,
                             ctx: &CallContext,
                             id: Uuid,
                             status: SubmissionStatus,
                             at: DateTime<Utc>)
                             -> Result<Submission, StoreError> {
        let mut state = self.write(ctx)?;
        let slot = state.submissions.get_mut(&id).ok_or(StoreError::NotFound)?;
        slot.status = status;
        slot.updated_at = at;
        Ok(slot.clone())
    }

    fn delete_submission(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        self.write(ctx)?.submissions.shift_remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
