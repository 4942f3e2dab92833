//! Project composer: basics → description → location → roles

use serde_json::Value;

use crate::api::EntityShape;
use crate::wizard::kind::{SubmitMode, WizardKind};
use crate::wizard::step::{LabelContext, StepDescriptor, StepLabel, StepRegistry};
use crate::wizard::validity::{FieldSchema, FieldType};
use crate::wizard::value::{is_filled, DraftValue};

const BASICS: &[FieldSchema] = &[
    FieldSchema::required("title", "Title", FieldType::Text).max(120),
    FieldSchema::required("organization", "Organization", FieldType::Reference),
];

const DESCRIPTION: &[FieldSchema] = &[
    FieldSchema::required("description", "Description", FieldType::Text).max(5000),
    FieldSchema::optional("causes", "Causes", FieldType::List).max(3),
    FieldSchema::optional("skills", "Skills", FieldType::List).max(10),
];

const LOCATION: &[FieldSchema] = &[
    FieldSchema::optional("is_virtual", "Virtual", FieldType::Boolean),
    FieldSchema::optional("address", "Address", FieldType::Text).max(255),
    FieldSchema::optional("start_date", "Start date", FieldType::Text),
    FieldSchema::optional("end_date", "End date", FieldType::Text),
];

const ROLES: &[FieldSchema] = &[FieldSchema::required("roles", "Roles", FieldType::List).max(20)];

pub const SHAPE: EntityShape = EntityShape {
    accepted: &[
        "title",
        "description",
        "is_virtual",
        "address",
        "start_date",
        "end_date",
        "roles",
        "slug",
    ],
    references: &[("organization", "organization_id")],
    reference_lists: &[("causes", "cause_ids"), ("skills", "skill_ids")],
    server_ids: &["slug"],
    nested_server_ids: &[("roles", "id")],
};

fn basics_label(ctx: &LabelContext<'_>) -> String {
    match ctx.mode {
        SubmitMode::Create => "Basics".to_string(),
        SubmitMode::Edit { .. } => "Edit basics".to_string(),
        SubmitMode::Duplicate => "Basics (copy)".to_string(),
    }
}

fn roles_label(ctx: &LabelContext<'_>) -> String {
    match ctx.value.get("roles").and_then(Value::as_array) {
        Some(roles) if !roles.is_empty() => format!("Roles ({})", roles.len()),
        _ => "Roles".to_string(),
    }
}

fn location_done(value: &DraftValue) -> bool {
    value.get("is_virtual").and_then(Value::as_bool) == Some(true) || is_filled(value, "address")
}

pub fn registry() -> StepRegistry {
    let steps = vec![
        StepDescriptor {
            id: "basics",
            label: StepLabel::Contextual(basics_label),
            is_done: |v| is_filled(v, "title") && is_filled(v, "organization"),
            fields: BASICS,
        },
        StepDescriptor {
            id: "description",
            label: StepLabel::Static("Description"),
            is_done: |v| is_filled(v, "description"),
            fields: DESCRIPTION,
        },
        StepDescriptor {
            id: "location",
            label: StepLabel::Static("Location"),
            is_done: location_done,
            fields: LOCATION,
        },
        StepDescriptor {
            id: "roles",
            label: StepLabel::Contextual(roles_label),
            is_done: |v| is_filled(v, "roles"),
            fields: ROLES,
        },
    ];

    match StepRegistry::new(WizardKind::Project, steps) {
        Ok(registry) => registry,
        Err(e) => unreachable!("project step table is static: {e}"),
    }
}
