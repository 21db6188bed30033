use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::field::Field;
use crate::DomainError;

/// Esquema de formulario: lista ordenada de campos de un owner.
///
/// Invariante: los ids de campo son únicos dentro del esquema. Se verifica en
/// los constructores y en `replace_fields`; la deserialización no lo fuerza
/// (las filas persistidas ya pasaron por aquí).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSchema {
    pub fn new(name: &str, description: Option<String>, fields: Vec<Field>, owner_id: Uuid) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::ValidationError("form name is required".to_string()));
        }
        ensure_unique_field_ids(&fields)?;
        let now = Utc::now();
        Ok(FormSchema { id: Uuid::new_v4(),
                        name: name.to_string(),
                        description,
                        fields,
                        owner_id,
                        created_at: now,
                        updated_at: now })
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn replace_fields(&mut self, fields: Vec<Field>) -> Result<(), DomainError> {
        ensure_unique_field_ids(&fields)?;
        self.fields = fields;
        Ok(())
    }
}

pub fn ensure_unique_field_ids(fields: &[Field]) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for f in fields {
        if f.id.trim().is_empty() {
            return Err(DomainError::ValidationError("field id must not be empty".to_string()));
        }
        if !seen.insert(f.id.as_str()) {
            return Err(DomainError::DuplicateFieldId(f.id.clone()));
        }
    }
    Ok(())
}
