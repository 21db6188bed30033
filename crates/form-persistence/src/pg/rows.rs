//! Filas Diesel y su conversión al modelo de dominio.
//!
//! Los JSONB (campos, trigger, acciones, datos, metadata) se guardan con el
//! mismo formato camelCase que usa la API. Una fila que no deserializa es
//! `PersistenceError::Corrupt`, nunca un pánico.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use form_domain::{Action, Field, FormSchema, Submission, SubmissionMetadata, Trigger, Workflow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{forms, submissions, workflows};

fn to_json<T: Serialize>(what: &str, value: &T) -> Result<Value, PersistenceError> {
    serde_json::to_value(value).map_err(|e| PersistenceError::Corrupt(format!("{what}: {e}")))
}

fn from_json<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, PersistenceError> {
    serde_json::from_value(value).map_err(|e| PersistenceError::Corrupt(format!("{what}: {e}")))
}

fn parse_status<T: std::str::FromStr>(what: &str, raw: &str) -> Result<T, PersistenceError> {
    raw.parse().map_err(|_| PersistenceError::Corrupt(format!("{what} status {raw:?}")))
}

// ---- forms ----

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = forms)]
pub struct FormRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub fields: Value,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = forms)]
pub struct NewFormRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub fields: Value,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a FormSchema> for NewFormRow<'a> {
    type Error = PersistenceError;

    fn try_from(form: &'a FormSchema) -> Result<Self, Self::Error> {
        Ok(NewFormRow { id: form.id,
                        name: &form.name,
                        description: form.description.as_deref(),
                        fields: to_json("form fields", &form.fields)?,
                        owner_id: form.owner_id,
                        created_at: form.created_at,
                        updated_at: form.updated_at })
    }
}

impl TryFrom<FormRow> for FormSchema {
    type Error = PersistenceError;

    fn try_from(row: FormRow) -> Result<Self, Self::Error> {
        let fields: Vec<Field> = from_json("form fields", row.fields)?;
        Ok(FormSchema { id: row.id,
                        name: row.name,
                        description: row.description,
                        fields,
                        owner_id: row.owner_id,
                        created_at: row.created_at,
                        updated_at: row.updated_at })
    }
}

// ---- workflows ----

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = workflows)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub schema_id: Option<Uuid>,
    pub status: String,
    pub workflow_trigger: Value,
    pub actions: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = workflows)]
pub struct NewWorkflowRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub owner_id: Uuid,
    pub schema_id: Option<Uuid>,
    pub status: &'static str,
    pub workflow_trigger: Value,
    pub actions: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a Workflow> for NewWorkflowRow<'a> {
    type Error = PersistenceError;

    fn try_from(wf: &'a Workflow) -> Result<Self, Self::Error> {
        Ok(NewWorkflowRow { id: wf.id,
                            name: &wf.name,
                            description: wf.description.as_deref(),
                            owner_id: wf.owner_id,
                            schema_id: wf.schema_id,
                            status: wf.status.as_str(),
                            workflow_trigger: to_json("workflow trigger", &wf.trigger)?,
                            actions: to_json("workflow actions", &wf.actions)?,
                            created_at: wf.created_at,
                            updated_at: wf.updated_at })
    }
}

impl TryFrom<WorkflowRow> for Workflow {
    type Error = PersistenceError;

    fn try_from(row: WorkflowRow) -> Result<Self, Self::Error> {
        let trigger: Trigger = from_json("workflow trigger", row.workflow_trigger)?;
        let actions: Vec<Action> = from_json("workflow actions", row.actions)?;
        Ok(Workflow { id: row.id,
                      name: row.name,
                      description: row.description,
                      owner_id: row.owner_id,
                      schema_id: row.schema_id,
                      status: parse_status("workflow", &row.status)?,
                      trigger,
                      actions,
                      created_at: row.created_at,
                      updated_at: row.updated_at })
    }
}

// ---- submissions ----

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = submissions)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub schema_id: Option<Uuid>,
    pub data: Value,
    pub metadata: Value,
    pub status: String,
    pub schema_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = submissions)]
pub struct NewSubmissionRow<'a> {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub schema_id: Option<Uuid>,
    pub data: Value,
    pub metadata: Value,
    pub status: &'static str,
    pub schema_fingerprint: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a Submission> for NewSubmissionRow<'a> {
    type Error = PersistenceError;

    fn try_from(sub: &'a Submission) -> Result<Self, Self::Error> {
        Ok(NewSubmissionRow { id: sub.id,
                              workflow_id: sub.workflow_id,
                              schema_id: sub.schema_id,
                              data: Value::Object(sub.data.clone()),
                              metadata: to_json("submission metadata", &sub.metadata)?,
                              status: sub.status.as_str(),
                              schema_fingerprint: sub.schema_fingerprint.as_deref(),
                              created_at: sub.created_at,
                              updated_at: sub.updated_at })
    }
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = PersistenceError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let Value::Object(data) = row.data else {
            return Err(PersistenceError::Corrupt(format!("submission {} data is not an object", row.id)));
        };
        Ok(Submission { id: row.id,
                        workflow_id: row.workflow_id,
                        schema_id: row.schema_id,
                        data,
                        metadata: SubmissionMetadata::from_json(&row.metadata),
                        status: parse_status("submission", &row.status)?,
                        schema_fingerprint: row.schema_fingerprint,
                        created_at: row.created_at,
                        updated_at: row.updated_at })
    }
}
