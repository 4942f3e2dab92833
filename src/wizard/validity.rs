//! Per-step field schemas and validity tracking
//!
//! Each step owns a small schema describing the fields its form collects. A
//! step is checked only against its own fields, so an invalid value written by
//! one step never marks another step invalid.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::step::StepRegistry;
use super::value::{is_filled, DraftValue};

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn looks_like_email(s: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(s))
}

/// Field name → human readable message, ordered by field name
pub type FieldErrors = BTreeMap<String, String>;

/// Kind of value a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Url,
    Number,
    Boolean,
    /// JSON array; `max_length` caps the number of items
    List,
    /// Reference to another record: an object carrying `id`, or a bare id
    Reference,
}

/// Schema definition for a single field in a step form
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSchema {
    /// Key of the field in the aggregate value
    pub name: &'static str,
    /// Label shown next to the input
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Maximum characters for text fields, maximum items for lists
    pub max_length: Option<usize>,
}

impl FieldSchema {
    pub const fn required(name: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            label,
            field_type,
            required: true,
            max_length: None,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            label,
            field_type,
            required: false,
            max_length: None,
        }
    }

    pub const fn max(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Check this field against `value`, returning a message on failure
    pub fn check(&self, value: &DraftValue) -> Option<String> {
        if !is_filled(value, self.name) {
            return self.required.then(|| format!("{} is required", self.label));
        }

        // is_filled guarantees the key is present
        let field = value.get(self.name)?;
        match self.field_type {
            FieldType::Text => match field.as_str() {
                Some(s) => self.check_length(s.chars().count()),
                None => Some(format!("{} must be text", self.label)),
            },
            FieldType::Email => match field.as_str() {
                Some(s) if looks_like_email(s.trim()) => None,
                _ => Some(format!("{} must be a valid email address", self.label)),
            },
            FieldType::Url => match field.as_str().map(|s| reqwest::Url::parse(s.trim())) {
                Some(Ok(url)) if matches!(url.scheme(), "http" | "https") => None,
                _ => Some(format!("{} must be an http(s) URL", self.label)),
            },
            FieldType::Number => {
                if field.is_number() {
                    None
                } else {
                    Some(format!("{} must be a number", self.label))
                }
            }
            FieldType::Boolean => {
                if field.is_boolean() {
                    None
                } else {
                    Some(format!("{} must be true or false", self.label))
                }
            }
            FieldType::List => match field.as_array() {
                Some(items) => self.check_length(items.len()),
                None => Some(format!("{} must be a list", self.label)),
            },
            FieldType::Reference => {
                if is_reference(field) {
                    None
                } else {
                    Some(format!("{} must reference an existing record", self.label))
                }
            }
        }
    }

    fn check_length(&self, len: usize) -> Option<String> {
        match self.max_length {
            Some(max) if len > max => Some(format!(
                "{} must be at most {} {}",
                self.label,
                max,
                if self.field_type == FieldType::List {
                    "items"
                } else {
                    "characters"
                }
            )),
            _ => None,
        }
    }
}

fn is_reference(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Number(_) => true,
        Value::Object(map) => map
            .get("id")
            .is_some_and(|id| id.is_string() || id.is_number()),
        _ => false,
    }
}

/// Validate `value` against a step's fields
pub fn validate_fields(fields: &[FieldSchema], value: &DraftValue) -> Result<(), FieldErrors> {
    let errors: FieldErrors = fields
        .iter()
        .filter_map(|f| f.check(value).map(|msg| (f.name.to_string(), msg)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validity of one step for the current aggregate value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepValidity {
    pub step_id: String,
    /// The step's completion predicate holds
    pub done: bool,
    /// The step's own fields pass their schema
    pub valid: bool,
    pub errors: FieldErrors,
}

/// Snapshot of every step's validity, in registry order
#[derive(Debug, Clone, Default)]
pub struct ValidityTracker {
    steps: Vec<StepValidity>,
}

impl ValidityTracker {
    pub fn evaluate(registry: &StepRegistry, value: &DraftValue) -> Self {
        let steps = registry
            .steps()
            .iter()
            .map(|step| {
                let errors = validate_fields(step.fields, value).err().unwrap_or_default();
                StepValidity {
                    step_id: step.id.to_string(),
                    done: (step.is_done)(value),
                    valid: errors.is_empty(),
                    errors,
                }
            })
            .collect();

        Self { steps }
    }

    pub fn get(&self, step_id: &str) -> Option<&StepValidity> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn is_valid(&self, step_id: &str) -> bool {
        self.get(step_id).is_some_and(|s| s.valid)
    }

    /// Ids of steps whose fields currently fail validation
    pub fn invalid_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| !s.valid)
            .map(|s| s.step_id.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepValidity> {
        self.steps.iter()
    }

    pub fn into_vec(self) -> Vec<StepValidity> {
        self.steps
    }
}
