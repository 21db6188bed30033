// form-domain library entry point
pub mod conditional;
pub mod error;
pub mod field;
pub mod schema;
pub mod submission;
pub mod workflow;
pub use conditional::{Conditional, ConditionalOperator};
pub use error::DomainError;
pub use field::{DataSource, Field, FieldCapability, FieldOption, FieldType, Validation};
pub use schema::FormSchema;
pub use submission::{Submission, SubmissionMetadata, SubmissionStatus};
pub use workflow::{Action, ActionType, Trigger, TriggerType, Workflow, WorkflowStatus};
