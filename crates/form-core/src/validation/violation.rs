use serde::{Deserialize, Serialize};

/// Una regla incumplida por un campo. El orden de la lista resultante sigue
/// el orden de los campos en el esquema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingRequired { field_id: String },
    NotANumber { field_id: String },
    BelowMinimum { field_id: String, min: f64, value: f64 },
    AboveMaximum { field_id: String, max: f64, value: f64 },
    StepMismatch { field_id: String, step: f64, value: f64 },
    TooShort { field_id: String, min_length: usize, length: usize },
    TooLong { field_id: String, max_length: usize, length: usize },
    PatternMismatch { field_id: String, message: String },
    InvalidEmail { field_id: String },
    NotAnOption { field_id: String, value: String },
    WrongType { field_id: String, expected: String },
}

impl Violation {
    pub fn field_id(&self) -> &str {
        match self {
            Violation::MissingRequired { field_id }
            | Violation::NotANumber { field_id }
            | Violation::BelowMinimum { field_id, .. }
            | Violation::AboveMaximum { field_id, .. }
            | Violation::StepMismatch { field_id, .. }
            | Violation::TooShort { field_id, .. }
            | Violation::TooLong { field_id, .. }
            | Violation::PatternMismatch { field_id, .. }
            | Violation::InvalidEmail { field_id }
            | Violation::NotAnOption { field_id, .. }
            | Violation::WrongType { field_id, .. } => field_id,
        }
    }

    /// Mensaje legible para el usuario final.
    pub fn message(&self) -> String {
        match self {
            Violation::MissingRequired { field_id } => format!("{field_id} is required"),
            Violation::NotANumber { field_id } => format!("{field_id} must be a number"),
            Violation::BelowMinimum { field_id, min, .. } => format!("{field_id} must be at least {min}"),
            Violation::AboveMaximum { field_id, max, .. } => format!("{field_id} must be at most {max}"),
            Violation::StepMismatch { field_id, step, .. } => format!("{field_id} must be a multiple of {step}"),
            Violation::TooShort { field_id, min_length, .. } => {
                format!("{field_id} must be at least {min_length} characters")
            }
            Violation::TooLong { field_id, max_length, .. } => {
                format!("{field_id} must be at most {max_length} characters")
            }
            Violation::PatternMismatch { message, .. } => message.clone(),
            Violation::InvalidEmail { field_id } => format!("{field_id} must be a valid email address"),
            Violation::NotAnOption { field_id, value } => format!("{value} is not a valid option for {field_id}"),
            Violation::WrongType { field_id, expected } => format!("{field_id} must be {expected}"),
        }
    }
}

/// Resultado de `validate`: vacío ⇒ la submission se acepta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}
