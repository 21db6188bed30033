//! form-core: ciclo de vida de workflows y recepción de submissions.
pub mod constants;
pub mod context;
pub mod errors;
pub mod hashing;
pub mod intake;
pub mod lifecycle;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod validation;

pub use context::CallContext;
pub use errors::{CoreError, ErrorKind, StoreError};
pub use lifecycle::{TransitionPolicy, WorkflowPatch};
pub use service::{DanglingReference, FormFlowService, FormPatch, NewForm, NewWorkflow};
pub use store::{FormStore, InMemoryStore, Store, SubmissionStore, WorkflowStore};
pub use validation::{validate, ValidationResult, Violation};
