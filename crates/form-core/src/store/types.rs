//! Traits de persistencia consumidos por el core.
//!
//! Cada backend implementa los tres traits sobre el mismo estado compartido:
//! las operaciones condicionadas (`*_if_*`) cruzan tablas y deben ejecutarse
//! como una única unidad atómica (lock de escritura en memoria, transacción
//! con lock de fila en Postgres). Todas reciben un `CallContext` y deben
//! abortar con `Cancelled`/`DeadlineExceeded` en lugar de bloquear.
use chrono::{DateTime, Utc};
use form_domain::{FormSchema, Submission, SubmissionStatus, Workflow, WorkflowStatus};
use uuid::Uuid;

use crate::context::CallContext;
use crate::errors::StoreError;

pub trait FormStore {
    fn insert_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError>;
    fn get_form(&self, ctx: &CallContext, id: Uuid) -> Result<Option<FormSchema>, StoreError>;
    /// Formularios de un owner, en orden de creación.
    fn list_forms(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<FormSchema>, StoreError>;
    /// Reemplaza el formulario completo. `NotFound` si no existe.
    fn update_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError>;
    fn delete_form(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError>;
}

pub trait WorkflowStore {
    fn insert_workflow(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError>;
    fn get_workflow(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Workflow>, StoreError>;
    fn list_workflows(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Workflow>, StoreError>;

    /// Reemplaza el workflow sólo si su estado persistido sigue siendo
    /// `Draft`. Errores: `NotFound`, `StatusMismatch(actual)`.
    fn update_workflow_if_draft(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError>;

    /// Cambia el estado si `allowed(actual)` lo permite, leyendo y
    /// escribiendo bajo el mismo lock. Errores: `NotFound`,
    /// `StatusMismatch(actual)`.
    fn transition_workflow_status(&self,
                                  ctx: &CallContext,
                                  id: Uuid,
                                  to: WorkflowStatus,
                                  allowed: &dyn Fn(WorkflowStatus) -> bool,
                                  at: DateTime<Utc>)
                                  -> Result<Workflow, StoreError>;

    /// Cuenta submissions y borra en la misma unidad atómica. Errores:
    /// `NotFound`, `HasSubmissions(n)`.
    fn delete_workflow_if_unreferenced(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError>;
}

pub trait SubmissionStore {
    /// Inserta sólo si el workflow referenciado existe y sigue `Active`.
    /// Errores: `NotFound` (workflow), `StatusMismatch(actual)`.
    fn insert_submission_if_accepting(&self, ctx: &CallContext, submission: &Submission) -> Result<(), StoreError>;
    fn get_submission(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Submission>, StoreError>;
    /// Submissions de un workflow, en orden de creación.
    fn list_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<Vec<Submission>, StoreError>;
    /// Submissions de todos los workflows de un owner.
    fn list_submissions_by_owner(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Submission>, StoreError>;
    fn count_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<u64, StoreError>;
    fn set_submission_status(&self,
                             ctx: &CallContext,
                             id: Uuid,
                             status: SubmissionStatus,
                             at: DateTime<Utc>)
                             -> Result<Submission, StoreError>;
    fn delete_submission(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError>;
}

/// Backend completo que necesita el façade.
pub trait Store: FormStore + WorkflowStore + SubmissionStore {}

impl<T> Store for T where T: FormStore + WorkflowStore + SubmissionStore {}
