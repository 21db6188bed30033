//! CLI operativa sobre el backend Postgres.
//!
//! Códigos de salida: 0 ok, 2 uso (clap), 3 JSON de entrada inválido,
//! 4 rechazo de negocio / no encontrado / falta `DATABASE_URL`, 5 backend.
use clap::{Args, Parser, Subcommand};
use form_core::{CallContext, FormFlowService, NewForm, NewWorkflow, Store, WorkflowPatch};
use form_domain::SubmissionMetadata;
use formflow_rust::{init_logging, pg_service, AppConfig, AppError};
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(name = "form-cli", version, about = "Operaciones sobre formularios, workflows y submissions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Formularios
    #[command(subcommand)]
    Form(FormCommand),
    /// Workflows
    #[command(subcommand)]
    Workflow(WorkflowCommand),
    /// Envía una submission a un workflow activo.
    Submit {
        workflow_id: String,
        /// Objeto JSON con los valores por id de campo.
        #[arg(long)]
        data: String,
        /// Metadata opcional (`ipAddress`, `userAgent`, `referrer`).
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Submissions
    #[command(subcommand)]
    Submission(SubmissionCommand),
}

#[derive(Subcommand, Debug)]
enum FormCommand {
    /// Crea un formulario a partir de un JSON `{name, description, ownerId, fields}`.
    Create { json: String },
    Show { id: String },
    List {
        #[arg(long)]
        owner: String,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Crea un workflow en `draft` a partir de un JSON `{name, ownerId, schemaId, ...}`.
    Create { json: String },
    /// Muestra el workflow y las acciones con referencias colgantes.
    Show { id: String },
    List {
        #[arg(long)]
        owner: String,
    },
    /// Merge-patch sobre un workflow en `draft`.
    Update { id: String, patch: String },
    Status { id: String, status: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum SubmissionCommand {
    List(SubmissionFilter),
    Show { id: String },
    Status { id: String, status: String },
    Delete { id: String },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SubmissionFilter {
    #[arg(long)]
    workflow: Option<String>,
    #[arg(long)]
    owner: Option<String>,
}

fn parse_json(raw: &str) -> Result<Value, AppError> {
    Ok(serde_json::from_str(raw)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run<S: Store>(svc: &FormFlowService<S>, ctx: &CallContext, command: Command) -> Result<(), AppError> {
    match command {
        Command::Form(cmd) => match cmd {
            FormCommand::Create { json } => {
                let req: NewForm = serde_json::from_value(parse_json(&json)?)?;
                print_json(&svc.create_form(ctx, req)?)
            }
            FormCommand::Show { id } => print_json(&svc.get_form(ctx, &id)?),
            FormCommand::List { owner } => print_json(&svc.list_forms(ctx, &owner)?),
            FormCommand::Delete { id } => {
                svc.delete_form(ctx, &id)?;
                println!("deleted form {id}");
                Ok(())
            }
        },
        Command::Workflow(cmd) => match cmd {
            WorkflowCommand::Create { json } => {
                let req: NewWorkflow = serde_json::from_value(parse_json(&json)?)?;
                print_json(&svc.create_workflow(ctx, req)?)
            }
            WorkflowCommand::Show { id } => {
                let wf = svc.get_workflow(ctx, &id)?;
                let dangling = svc.check_action_references(ctx, &id)?;
                print_json(&json!({ "workflow": wf, "danglingReferences": dangling }))
            }
            WorkflowCommand::List { owner } => print_json(&svc.list_workflows(ctx, &owner)?),
            WorkflowCommand::Update { id, patch } => {
                let patch: WorkflowPatch = serde_json::from_value(parse_json(&patch)?)?;
                print_json(&svc.update_workflow(ctx, &id, &patch)?)
            }
            WorkflowCommand::Status { id, status } => print_json(&svc.update_workflow_status(ctx, &id, &status)?),
            WorkflowCommand::Delete { id } => {
                svc.delete_workflow(ctx, &id)?;
                println!("deleted workflow {id}");
                Ok(())
            }
        },
        Command::Submit { workflow_id, data, metadata } => {
            let data = parse_json(&data)?;
            let metadata = match metadata {
                Some(raw) => SubmissionMetadata::from_json(&parse_json(&raw)?),
                None => SubmissionMetadata::default(),
            };
            print_json(&svc.submit(ctx, &workflow_id, data, metadata)?)
        }
        Command::Submission(cmd) => match cmd {
            SubmissionCommand::List(SubmissionFilter { workflow: Some(wf), .. }) => {
                print_json(&svc.list_submissions(ctx, &wf)?)
            }
            SubmissionCommand::List(SubmissionFilter { owner: Some(owner), .. }) => {
                print_json(&svc.list_submissions_by_owner(ctx, &owner)?)
            }
            SubmissionCommand::List(_) => Err(AppError::Config("--workflow u --owner es obligatorio".into())),
            SubmissionCommand::Show { id } => print_json(&svc.get_submission(ctx, &id)?),
            SubmissionCommand::Status { id, status } => print_json(&svc.update_submission_status(ctx, &id, &status)?),
            SubmissionCommand::Delete { id } => {
                svc.delete_submission(ctx, &id)?;
                println!("deleted submission {id}");
                Ok(())
            }
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();
    debug!("{:?}", cli.command);

    let result = AppConfig::from_env().and_then(|cfg| pg_service(&cfg))
                                      .and_then(|svc| {
                                          let ctx = svc.new_context();
                                          run(&svc, &ctx, cli.command)
                                      });
    if let Err(e) = result {
        eprintln!("[form-cli] {e}");
        std::process::exit(e.exit_code());
    }
}
