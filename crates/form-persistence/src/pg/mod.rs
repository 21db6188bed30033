//! Implementación Postgres (Diesel) de los traits de store del core.
//!
//! Paridad 1:1 con `InMemoryStore`:
//! - Cada llamada corre en su propia transacción, con `SET LOCAL
//!   statement_timeout` derivado del deadline del `CallContext`.
//! - Las operaciones condicionadas bloquean la fila del workflow antes de
//!   decidir: `FOR UPDATE` para cambios de estado, update y borrado; `FOR
//!   SHARE` para el insert de submissions. Así el conteo del borrado y el
//!   chequeo de `active` del insert nunca se intercalan.
//! - Los rechazos de guardas abortan la transacción como
//!   `PersistenceError::Rejected` y llegan al core como su `StoreError`.
//! - Sin reintentos: los errores transitorios se reportan como tales.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use form_core::{CallContext, FormStore, StoreError, SubmissionStore, WorkflowStore};
use form_domain::{FormSchema, Submission, SubmissionStatus, Workflow, WorkflowStatus};
use log::{debug, error, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{forms, submissions, workflows};

mod rows;

use rows::{FormRow, NewFormRow, NewSubmissionRow, NewWorkflowRow, SubmissionRow, WorkflowRow};

/// Pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o, en tests, un proveedor que falle a
/// voluntad. Debe devolver `PersistenceError::TransientIo` si no hay conexión
/// disponible dentro de `timeout` (o del timeout del pool si es `None`).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self,
                  timeout: Option<Duration>)
                  -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// `ConnectionProvider` respaldado por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self,
                  timeout: Option<Duration>)
                  -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        let wait = checkout_timeout(timeout, self.pool.connection_timeout());
        self.pool.get_timeout(wait).map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Espera máxima del checkout: nunca más que lo que le queda a la llamada.
fn checkout_timeout(remaining: Option<Duration>, configured: Duration) -> Duration {
    match remaining {
        Some(left) => left.min(configured).max(Duration::from_millis(1)),
        None => configured,
    }
}

/// Store Postgres de formularios, workflows y submissions.
pub struct PgStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Ejecuta `f` dentro de una transacción acotada por el deadline de
    /// `ctx`. Cancelación y deadline se verifican antes de pedir conexión, al
    /// obtenerla y antes del commit; el checkout espera como mucho el tiempo
    /// restante.
    fn with_tx<T, F>(&self, ctx: &CallContext, op: &'static str, read_only: bool, f: F) -> Result<T, StoreError>
        where F: FnOnce(&mut PgConnection) -> Result<T, PersistenceError>
    {
        ctx.check()?;
        debug!("{op}:start");
        let result = self.provider.connection(ctx.remaining()).and_then(|mut conn| {
                                                   ctx.check().map_err(PersistenceError::Rejected)?;
                                                   let mut tx = conn.build_transaction();
                                                   if read_only {
                                                       tx = tx.read_only();
                                                   }
                                                   tx.run(|tx_conn| {
                                                         if let Some(left) = ctx.remaining() {
                                                             set_statement_timeout(tx_conn, left)?;
                                                         }
                                                         let value = f(tx_conn)?;
                                                         // cancelada durante la consulta: rollback
                                                         ctx.check().map_err(PersistenceError::Rejected)?;
                                                         Ok(value)
                                                     })
                                               });
        match result {
            Ok(v) => {
                debug!("{op}:done");
                Ok(v)
            }
            Err(PersistenceError::Rejected(e)) => {
                debug!("{op}:rejected {e}");
                Err(e)
            }
            Err(e) => {
                error!("{op}:failed {e}");
                Err(e.into())
            }
        }
    }
}

fn set_statement_timeout(conn: &mut PgConnection, left: Duration) -> Result<(), PersistenceError> {
    let ms = left.as_millis().max(1);
    diesel::sql_query(format!("SET LOCAL statement_timeout = {ms}")).execute(conn)?;
    Ok(())
}

fn parse_workflow_status(raw: &str) -> Result<WorkflowStatus, PersistenceError> {
    raw.parse().map_err(|_| PersistenceError::Corrupt(format!("workflow status {raw:?}")))
}

/// Estado actual del workflow con lock de fila; `Rejected(NotFound)` si no
/// existe.
fn lock_workflow_status(conn: &mut PgConnection, id: Uuid, exclusive: bool) -> Result<WorkflowStatus, PersistenceError> {
    let query = workflows::table.find(id).select(workflows::status);
    let status: Option<String> = if exclusive {
        query.for_update().first(conn).optional()?
    } else {
        query.for_share().first(conn).optional()?
    };
    match status {
        Some(raw) => parse_workflow_status(&raw),
        None => Err(PersistenceError::Rejected(StoreError::NotFound)),
    }
}

fn affected_or_not_found(n: usize) -> Result<(), PersistenceError> {
    if n == 0 {
        Err(PersistenceError::Rejected(StoreError::NotFound))
    } else {
        Ok(())
    }
}

impl<P: ConnectionProvider> FormStore for PgStore<P> {
    fn insert_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError> {
        self.with_tx(ctx, "insert_form", false, |conn| {
                let row = NewFormRow::try_from(form)?;
                diesel::insert_into(forms::table).values(&row).execute(conn)?;
                Ok(())
            })
    }

    fn get_form(&self, ctx: &CallContext, id: Uuid) -> Result<Option<FormSchema>, StoreError> {
        self.with_tx(ctx, "get_form", true, |conn| {
                let row: Option<FormRow> = forms::table.find(id).first(conn).optional()?;
                row.map(FormSchema::try_from).transpose()
            })
    }

    fn list_forms(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<FormSchema>, StoreError> {
        self.with_tx(ctx, "list_forms", true, |conn| {
                let rows: Vec<FormRow> = forms::table.filter(forms::owner_id.eq(owner_id))
                                                     .order((forms::created_at.asc(), forms::id.asc()))
                                                     .load(conn)?;
                rows.into_iter().map(FormSchema::try_from).collect()
            })
    }

    fn update_form(&self, ctx: &CallContext, form: &FormSchema) -> Result<(), StoreError> {
        self.with_tx(ctx, "update_form", false, |conn| {
                let row = NewFormRow::try_from(form)?;
                let n = diesel::update(forms::table.find(form.id)).set((forms::name.eq(row.name),
                                                                         forms::description.eq(row.description),
                                                                         forms::fields.eq(&row.fields),
                                                                         forms::updated_at.eq(row.updated_at)))
                                                                   .execute(conn)?;
                affected_or_not_found(n)
            })
    }

    fn delete_form(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        self.with_tx(ctx, "delete_form", false, |conn| {
                let n = diesel::delete(forms::table.find(id)).execute(conn)?;
                affected_or_not_found(n)
            })
    }
}

impl<P: ConnectionProvider> WorkflowStore for PgStore<P> {
    fn insert_workflow(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError> {
        self.with_tx(ctx, "insert_workflow", false, |conn| {
                let row = NewWorkflowRow::try_from(workflow)?;
                diesel::insert_into(workflows::table).values(&row).execute(conn)?;
                Ok(())
            })
    }

    fn get_workflow(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Workflow>, StoreError> {
        self.with_tx(ctx, "get_workflow", true, |conn| {
                let row: Option<WorkflowRow> = workflows::table.find(id).first(conn).optional()?;
                row.map(Workflow::try_from).transpose()
            })
    }

    fn list_workflows(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        self.with_tx(ctx, "list_workflows", true, |conn| {
                let rows: Vec<WorkflowRow> = workflows::table.filter(workflows::owner_id.eq(owner_id))
                                                             .order((workflows::created_at.asc(), workflows::id.asc()))
                                                             .load(conn)?;
                rows.into_iter().map(Workflow::try_from).collect()
            })
    }

    fn update_workflow_if_draft(&self, ctx: &CallContext, workflow: &Workflow) -> Result<(), StoreError> {
        self.with_tx(ctx, "update_workflow_if_draft", false, |conn| {
                let status = lock_workflow_status(conn, workflow.id, true)?;
                if status != WorkflowStatus::Draft {
                    return Err(PersistenceError::Rejected(StoreError::StatusMismatch(status)));
                }
                // el estado no se toca aquí
                let row = NewWorkflowRow::try_from(workflow)?;
                diesel::update(workflows::table.find(workflow.id)).set((workflows::name.eq(row.name),
                                                                         workflows::description.eq(row.description),
                                                                         workflows::schema_id.eq(row.schema_id),
                                                                         workflows::workflow_trigger.eq(&row.workflow_trigger),
                                                                         workflows::actions.eq(&row.actions),
                                                                         workflows::updated_at.eq(row.updated_at)))
                                                                   .execute(conn)?;
                Ok(())
            })
    }

    fn transition_workflow_status(&self,
                                  ctx: &CallContext,
                                  id: Uuid,
                                  to: WorkflowStatus,
                                  allowed: &dyn Fn(WorkflowStatus) -> bool,
                                  at: DateTime<Utc>)
                                  -> Result<Workflow, StoreError> {
        self.with_tx(ctx, "transition_workflow_status", false, |conn| {
                let from = lock_workflow_status(conn, id, true)?;
                if !allowed(from) {
                    return Err(PersistenceError::Rejected(StoreError::StatusMismatch(from)));
                }
                let row: WorkflowRow =
                    diesel::update(workflows::table.find(id)).set((workflows::status.eq(to.as_str()),
                                                                    workflows::updated_at.eq(at)))
                                                              .get_result(conn)?;
                debug!("transition_workflow_status id={id} {from} -> {to}");
                Workflow::try_from(row)
            })
    }

    fn delete_workflow_if_unreferenced(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        self.with_tx(ctx, "delete_workflow_if_unreferenced", false, |conn| {
                lock_workflow_status(conn, id, true)?;
                // los inserts concurrentes esperan el lock FOR SHARE, el conteo
                // ya ve todo lo confirmado
                let count: i64 = submissions::table.filter(submissions::workflow_id.eq(id))
                                                   .count()
                                                   .get_result(conn)?;
                if count > 0 {
                    warn!("delete_workflow_if_unreferenced id={id} submissions={count}");
                    return Err(PersistenceError::Rejected(StoreError::HasSubmissions(count as u64)));
                }
                diesel::delete(workflows::table.find(id)).execute(conn)?;
                Ok(())
            })
    }
}

impl<P: ConnectionProvider> SubmissionStore for PgStore<P> {
    fn insert_submission_if_accepting(&self, ctx: &CallContext, submission: &Submission) -> Result<(), StoreError> {
        self.with_tx(ctx, "insert_submission_if_accepting", false, |conn| {
                let status = lock_workflow_status(conn, submission.workflow_id, false)?;
                if status != WorkflowStatus::Active {
                    return Err(PersistenceError::Rejected(StoreError::StatusMismatch(status)));
                }
                let row = NewSubmissionRow::try_from(submission)?;
                diesel::insert_into(submissions::table).values(&row).execute(conn)?;
                Ok(())
            })
    }

    fn get_submission(&self, ctx: &CallContext, id: Uuid) -> Result<Option<Submission>, StoreError> {
        self.with_tx(ctx, "get_submission", true, |conn| {
                let row: Option<SubmissionRow> = submissions::table.find(id).first(conn).optional()?;
                row.map(Submission::try_from).transpose()
            })
    }

    fn list_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        self.with_tx(ctx, "list_submissions", true, |conn| {
                let rows: Vec<SubmissionRow> =
                    submissions::table.filter(submissions::workflow_id.eq(workflow_id))
                                      .order((submissions::created_at.asc(), submissions::id.asc()))
                                      .load(conn)?;
                rows.into_iter().map(Submission::try_from).collect()
            })
    }

    fn list_submissions_by_owner(&self, ctx: &CallContext, owner_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        self.with_tx(ctx, "list_submissions_by_owner", true, |conn| {
                let rows: Vec<SubmissionRow> =
                    submissions::table.inner_join(workflows::table)
                                      .filter(workflows::owner_id.eq(owner_id))
                                      .order((submissions::created_at.asc(), submissions::id.asc()))
                                      .select(SubmissionRow::as_select())
                                      .load(conn)?;
                rows.into_iter().map(Submission::try_from).collect()
            })
    }

    fn count_submissions(&self, ctx: &CallContext, workflow_id: Uuid) -> Result<u64, StoreError> {
        self.with_tx(ctx, "count_submissions", true, |conn| {
                let count: i64 = submissions::table.filter(submissions::workflow_id.eq(workflow_id))
                                                   .count()
                                                   .get_result(conn)?;
                Ok(count as u64)
            })
    }

    fn set_submission_status(&self,
                             ctx: &CallContext,
                             id: Uuid,
                             status: SubmissionStatus,
                             at: DateTime<Utc>)
                             -> Result<Submission, StoreError> {
        self.with_tx(ctx, "set_submission_status", false, |conn| {
                let row: Option<SubmissionRow> =
                    diesel::update(submissions::table.find(id)).set((submissions::status.eq(status.as_str()),
                                                                      submissions::updated_at.eq(at)))
                                                                .get_result(conn)
                                                                .optional()?;
                match row {
                    Some(row) => Submission::try_from(row),
                    None => Err(PersistenceError::Rejected(StoreError::NotFound)),
                }
            })
    }

    fn delete_submission(&self, ctx: &CallContext, id: Uuid) -> Result<(), StoreError> {
        self.with_tx(ctx, "delete_submission", false, |conn| {
                let n = diesel::delete(submissions::table.find(id)).execute(conn)?;
                affected_or_not_found(n)
            })
    }
}

/// Construye un pool r2d2 y corre las migraciones pendientes.
///
/// - `min_size`/`max_size` en 0 se elevan a 1; si `min > max` se usa `max`.
/// - `connect_timeout` acota la espera de cada checkout.
pub fn build_pool(database_url: &str,
                  min_size: u32,
                  max_size: u32,
                  connect_timeout: Duration)
                  -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let min = min_size.max(1);
    if min > max {
        warn!("min_size > max_size ({min} > {max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min.min(max)))
                                    .max_size(max)
                                    .connection_timeout(connect_timeout)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections, cfg.connect_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_never_outlives_the_call() {
        let pool_wait = Duration::from_secs(5);
        assert_eq!(checkout_timeout(Some(Duration::from_millis(200)), pool_wait), Duration::from_millis(200));
        assert_eq!(checkout_timeout(Some(Duration::from_secs(30)), pool_wait), pool_wait);
        assert_eq!(checkout_timeout(None, pool_wait), pool_wait);
        assert_eq!(checkout_timeout(Some(Duration::ZERO), pool_wait), Duration::from_millis(1));
    }
}
