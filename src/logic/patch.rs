//! Patch documents for points of interest.
//!
//! A document is an ordered list of JSON Patch style operations over the flat
//! `{name, description}` edit view:
//!
//! ```json
//! [
//!     { "op": "replace", "path": "/name", "value": "Obelisk" },
//!     { "op": "remove", "path": "/description" }
//! ]
//! ```
//!
//! The whole document is checked before anything is applied, so a bad path in
//! the last operation rejects the request without touching any field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::model::PointOfInterestForUpdateDto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchOpKind::Add => "add",
            PatchOpKind::Remove => "remove",
            PatchOpKind::Replace => "replace",
            PatchOpKind::Move => "move",
            PatchOpKind::Copy => "copy",
            PatchOpKind::Test => "test",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    #[serde(alias = "operation")]
    pub op: PatchOpKind,
    pub path: String,
    /// `None` when the key is absent, `Some(Value::Null)` for an explicit null
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl PatchOperation {
    pub fn replace(path: &str, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOpKind::Replace,
            path: path.to_string(),
            value: Some(value.into()),
            from: None,
        }
    }

    pub fn remove(path: &str) -> Self {
        Self {
            op: PatchOpKind::Remove,
            path: path.to_string(),
            value: None,
            from: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument {
    pub operations: Vec<PatchOperation>,
}

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply the document to a copy of `target`, left to right.
    ///
    /// Every operation is resolved first; the copy is only modified once the
    /// whole document is structurally valid.
    pub fn apply_to(
        &self,
        target: &PointOfInterestForUpdateDto,
    ) -> Result<PointOfInterestForUpdateDto, PatchError> {
        let resolved = self
            .operations
            .iter()
            .map(ResolvedOperation::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidate = target.clone();
        for operation in &resolved {
            operation.apply(&mut candidate)?;
        }

        Ok(candidate)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("The path '{path}' is not a valid pointer to a single field")]
    InvalidPath { path: String },
    #[error("The target location '{path}' was not found")]
    UnknownField { path: String },
    #[error("The '{op}' operation on '{path}' requires a value")]
    MissingValue { op: PatchOpKind, path: String },
    #[error("The value for '{path}' must be a string or null")]
    InvalidValue { path: String },
    #[error("The '{op}' operation on '{path}' requires a 'from' location")]
    MissingFrom { op: PatchOpKind, path: String },
    #[error("The current value at '{path}' is not equal to the test value")]
    TestFailed { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditableField {
    Name,
    Description,
}

impl EditableField {
    fn parse(path: &str) -> Result<Self, PatchError> {
        let segment = path
            .strip_prefix('/')
            .filter(|s| !s.is_empty() && !s.contains('/'))
            .ok_or_else(|| PatchError::InvalidPath {
                path: path.to_string(),
            })?;

        // RFC 6901 escapes; order matters
        let segment = segment.replace("~1", "/").replace("~0", "~");

        match segment.to_ascii_lowercase().as_str() {
            "name" => Ok(EditableField::Name),
            "description" => Ok(EditableField::Description),
            _ => Err(PatchError::UnknownField {
                path: path.to_string(),
            }),
        }
    }

    fn slot<'a>(&self, dto: &'a mut PointOfInterestForUpdateDto) -> &'a mut Option<String> {
        match self {
            EditableField::Name => &mut dto.name,
            EditableField::Description => &mut dto.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ResolvedOperation {
    Set(EditableField, Option<String>),
    Unset(EditableField),
    Copy { from: EditableField, to: EditableField },
    Move { from: EditableField, to: EditableField },
    Test { field: EditableField, expected: Option<String>, path: String },
}

impl ResolvedOperation {
    fn resolve(operation: &PatchOperation) -> Result<Self, PatchError> {
        let field = EditableField::parse(&operation.path)?;

        match operation.op {
            PatchOpKind::Add | PatchOpKind::Replace => {
                Ok(ResolvedOperation::Set(field, string_value(operation)?))
            }
            PatchOpKind::Remove => Ok(ResolvedOperation::Unset(field)),
            PatchOpKind::Copy | PatchOpKind::Move => {
                let from = operation.from.as_deref().ok_or_else(|| PatchError::MissingFrom {
                    op: operation.op,
                    path: operation.path.clone(),
                })?;
                let from = EditableField::parse(from)?;
                if operation.op == PatchOpKind::Copy {
                    Ok(ResolvedOperation::Copy { from, to: field })
                } else {
                    Ok(ResolvedOperation::Move { from, to: field })
                }
            }
            PatchOpKind::Test => Ok(ResolvedOperation::Test {
                field,
                expected: string_value(operation)?,
                path: operation.path.clone(),
            }),
        }
    }

    fn apply(&self, dto: &mut PointOfInterestForUpdateDto) -> Result<(), PatchError> {
        match self {
            ResolvedOperation::Set(field, value) => *field.slot(dto) = value.clone(),
            ResolvedOperation::Unset(field) => *field.slot(dto) = None,
            ResolvedOperation::Copy { from, to } => {
                let value = from.slot(dto).clone();
                *to.slot(dto) = value;
            }
            ResolvedOperation::Move { from, to } => {
                let value = from.slot(dto).take();
                *to.slot(dto) = value;
            }
            ResolvedOperation::Test {
                field,
                expected,
                path,
            } => {
                if field.slot(dto) != expected {
                    return Err(PatchError::TestFailed { path: path.clone() });
                }
            }
        }
        Ok(())
    }
}

fn string_value(operation: &PatchOperation) -> Result<Option<String>, PatchError> {
    match &operation.value {
        None => Err(PatchError::MissingValue {
            op: operation.op,
            path: operation.path.clone(),
        }),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PatchError::InvalidValue {
            path: operation.path.clone(),
        }),
    }
}
