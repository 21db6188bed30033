//! Demo de punta a punta del ciclo de vida: formulario age/guardianName,
//! workflow en draft → active, submissions válidas e inválidas, pausa,
//! gate de borrado y pipeline de estado de la submission.
//!
//! Corre siempre contra el backend en memoria. Con el feature `pg_demo` y
//! `FORMFLOW_RUN_PG_DEMO=1` repite el escenario contra Postgres.
use form_core::{FormFlowService, NewForm, NewWorkflow, Store, WorkflowPatch};
use form_domain::{Conditional, ConditionalOperator, Field, FieldType, SubmissionMetadata};
use formflow_rust::{init_logging, memory_service, AppConfig, AppError};
use log::{error, info};
use serde_json::json;
use uuid::Uuid;

fn run_scenario<S: Store>(label: &str, svc: &FormFlowService<S>) -> Result<(), AppError> {
    let ctx = svc.new_context();
    let owner = Uuid::new_v4();

    let fields = vec![Field::new("age", FieldType::Number, "Age").required().with_range(Some(0.0), Some(120.0), Some(1.0)),
                      Field::new("guardianName", FieldType::Text, "Guardian name").required()
                                                                               .with_conditional(Conditional::new("age",
                                                                                                                  ConditionalOperator::Less,
                                                                                                                  json!(18)))];
    let form = svc.create_form(&ctx,
                               NewForm { name: "Signup".into(),
                                         description: Some("Alta con tutor para menores".into()),
                                         owner_id: owner,
                                         fields })?;
    let wf = svc.create_workflow(&ctx,
                                 NewWorkflow { name: "Signup flow".into(),
                                               description: None,
                                               owner_id: owner,
                                               schema_id: Some(form.id),
                                               trigger: None,
                                               actions: vec![] })?;
    let id = wf.id.to_string();
    println!("[{label}] workflow {} creado en estado {}", wf.id, wf.status);

    svc.update_workflow(&ctx,
                        &id,
                        &WorkflowPatch { description: Some("editado en draft".into()),
                                         ..Default::default() })?;
    svc.update_workflow_status(&ctx, &id, "active")?;

    let rejected = svc.update_workflow(&ctx,
                                       &id,
                                       &WorkflowPatch { name: Some("no permitido".into()),
                                                        ..Default::default() });
    println!("[{label}] update en active -> {:?}", rejected.map(|w| w.name));

    let adult = svc.submit(&ctx, &id, json!({"age": 30}), SubmissionMetadata::default())?;
    println!("[{label}] adulto aceptado: {} ({})", adult.id, adult.status);

    match svc.submit(&ctx, &id, json!({"age": 12}), SubmissionMetadata::default()) {
        Ok(sub) => println!("[{label}] inesperado: menor aceptado {}", sub.id),
        Err(e) => println!("[{label}] menor sin tutor -> {} ({})", e, e.http_status()),
    }

    svc.update_workflow_status(&ctx, &id, "paused")?;
    if let Err(e) = svc.submit(&ctx, &id, json!({"age": 40}), SubmissionMetadata::default()) {
        println!("[{label}] submit en paused -> {e}");
    }

    for status in ["processing", "completed"] {
        svc.update_submission_status(&ctx, &adult.id.to_string(), status)?;
    }

    if let Err(e) = svc.delete_workflow(&ctx, &id) {
        println!("[{label}] delete con submissions -> {e}");
    }
    svc.delete_submission(&ctx, &adult.id.to_string())?;
    svc.delete_workflow(&ctx, &id)?;
    svc.delete_form(&ctx, &form.id.to_string())?;
    println!("[{label}] escenario completo");
    Ok(())
}

#[cfg(feature = "pg_demo")]
fn maybe_run_pg_demo(cfg: &AppConfig) -> Result<(), AppError> {
    if std::env::var("FORMFLOW_RUN_PG_DEMO").ok().as_deref() != Some("1") {
        eprintln!("[PG DEMO] Skipping (set FORMFLOW_RUN_PG_DEMO=1 to enable)");
        return Ok(());
    }
    let svc = formflow_rust::pg_service(cfg)?;
    run_scenario("postgres", &svc)
}

fn main() {
    init_logging();
    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };
    info!("policy={:?} call_timeout={:?}", cfg.policy(), cfg.call_timeout);

    if let Err(e) = run_scenario("memoria", &memory_service(&cfg)) {
        error!("escenario en memoria falló: {e}");
        std::process::exit(e.exit_code());
    }

    #[cfg(feature = "pg_demo")]
    if let Err(e) = maybe_run_pg_demo(&cfg) {
        error!("[PG DEMO] {e}");
        std::process::exit(e.exit_code());
    }
}
