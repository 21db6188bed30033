//! Recepción de submissions.
//!
//! Secuencia con corte en el primer fallo: datos bien formados → workflow
//! existe → workflow `Active` → esquema cargado y datos válidos → insert
//! condicionado. El insert vuelve a comprobar en el store que el workflow
//! sigue `Active`, así que un cambio de estado concurrente nunca deja pasar
//! una submission a un workflow pausado.
use form_domain::{FormSchema, Submission, SubmissionMetadata, Workflow};
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::context::CallContext;
use crate::errors::{CoreError, StoreError};
use crate::hashing::schema_fingerprint;
use crate::store::Store;
use crate::validation::validate;

pub fn submit<S: Store + ?Sized>(store: &S,
                                 ctx: &CallContext,
                                 workflow_id: Uuid,
                                 data: Value,
                                 metadata: SubmissionMetadata)
                                 -> Result<Submission, CoreError> {
    let Value::Object(data) = data else {
        return Err(CoreError::InvalidInput("submission data must be a JSON object".into()));
    };

    let workflow = store.get_workflow(ctx, workflow_id)
                        .map_err(|e| CoreError::from_store("get_workflow", e))?
                        .ok_or_else(|| CoreError::not_found("workflow", workflow_id))?;
    ensure_accepting(&workflow)?;

    let schema = load_schema(store, ctx, &workflow)?;
    let fingerprint = match &schema {
        Some(schema) => {
            if let Err(violations) = validate(schema, &data).into_result() {
                debug!("submit rejected workflow={workflow_id} violations={}", violations.len());
                return Err(CoreError::ValidationFailed(violations));
            }
            schema_fingerprint(&schema.fields)
        }
        None => None,
    };

    let submission = Submission::new_pending(workflow.id, workflow.schema_id, data, metadata, fingerprint);
    match store.insert_submission_if_accepting(ctx, &submission) {
        Ok(()) => {
            info!("submission {} accepted for workflow {}", submission.id, workflow_id);
            Ok(submission)
        }
        Err(StoreError::StatusMismatch(status)) => {
            warn!("submit lost race workflow={workflow_id} status={status}");
            Err(CoreError::NotAccepting { id: workflow_id, status })
        }
        Err(StoreError::NotFound) => Err(CoreError::not_found("workflow", workflow_id)),
        Err(e) => Err(CoreError::from_store("insert_submission_if_accepting", e)),
    }
}

fn ensure_accepting(workflow: &Workflow) -> Result<(), CoreError> {
    if workflow.accepts_submissions() {
        return Ok(());
    }
    warn!("submit rejected workflow={} status={}", workflow.id, workflow.status);
    Err(CoreError::NotAccepting { id: workflow.id,
                                  status: workflow.status })
}

/// Esquema del workflow; un `schema_id` colgante es `NotFound`.
fn load_schema<S: Store + ?Sized>(store: &S,
                                  ctx: &CallContext,
                                  workflow: &Workflow)
                                  -> Result<Option<FormSchema>, CoreError> {
    let Some(schema_id) = workflow.schema_id else {
        return Ok(None);
    };
    store.get_form(ctx, schema_id)
         .map_err(|e| CoreError::from_store("get_form", e))?
         .map(Some)
         .ok_or_else(|| CoreError::not_found("form", schema_id))
}
