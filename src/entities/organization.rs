//! Organization composer: basics → contact → causes

use crate::api::EntityShape;
use crate::wizard::kind::WizardKind;
use crate::wizard::step::{StepDescriptor, StepLabel, StepRegistry};
use crate::wizard::validity::{FieldSchema, FieldType};
use crate::wizard::value::is_filled;

const BASICS: &[FieldSchema] = &[
    FieldSchema::required("name", "Name", FieldType::Text).max(120),
    FieldSchema::required("description", "Description", FieldType::Text).max(2000),
];

const CONTACT: &[FieldSchema] = &[
    FieldSchema::required("email", "Email", FieldType::Email),
    FieldSchema::optional("website", "Website", FieldType::Url),
    FieldSchema::optional("phone", "Phone", FieldType::Text).max(32),
];

const CAUSES: &[FieldSchema] = &[FieldSchema::required("causes", "Causes", FieldType::List).max(5)];

pub const SHAPE: EntityShape = EntityShape {
    accepted: &["name", "description", "email", "website", "phone", "slug"],
    references: &[],
    reference_lists: &[("causes", "cause_ids")],
    server_ids: &["slug"],
    nested_server_ids: &[],
};

pub fn registry() -> StepRegistry {
    let steps = vec![
        StepDescriptor {
            id: "basics",
            label: StepLabel::Static("About the organization"),
            is_done: |v| is_filled(v, "name") && is_filled(v, "description"),
            fields: BASICS,
        },
        StepDescriptor {
            id: "contact",
            label: StepLabel::Static("Contact"),
            is_done: |v| is_filled(v, "email"),
            fields: CONTACT,
        },
        StepDescriptor {
            id: "causes",
            label: StepLabel::Static("Causes"),
            is_done: |v| is_filled(v, "causes"),
            fields: CAUSES,
        },
    ];

    match StepRegistry::new(WizardKind::Organization, steps) {
        Ok(registry) => registry,
        Err(e) => unreachable!("organization step table is static: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::kind::SubmitMode;
    use crate::wizard::value::from_json;
    use serde_json::json;

    #[test]
    fn test_step_order() {
        let ids: Vec<_> = registry().ids().collect();
        assert_eq!(ids, vec!["basics", "contact", "causes"]);
    }

    #[test]
    fn test_shape_maps_causes_to_ids() {
        let value = from_json(json!({
            "name": "Harbor Shelter",
            "causes": [{"id": "animals"}, {"id": "housing"}]
        }))
        .unwrap();
        let body = SHAPE.prepare(&value, &SubmitMode::Create);
        assert_eq!(body["cause_ids"], json!(["animals", "housing"]));
        assert!(body.get("causes").is_none());
    }
}
