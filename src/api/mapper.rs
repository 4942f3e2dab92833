//! Maps an aggregate wizard value onto the body the remote API accepts

use serde_json::{Map, Value};

use crate::wizard::kind::SubmitMode;
use crate::wizard::value::DraftValue;

/// Which keys of a wizard value the API accepts, and how
#[derive(Debug, Clone, Copy)]
pub struct EntityShape {
    /// Keys passed through unchanged
    pub accepted: &'static [&'static str],
    /// Single references: (wizard field, API key). The field's object is
    /// replaced by its `id`.
    pub references: &'static [(&'static str, &'static str)],
    /// Reference lists: (wizard field, API key). Each item becomes its `id`.
    pub reference_lists: &'static [(&'static str, &'static str)],
    /// Top-level keys the server assigns; dropped when duplicating
    pub server_ids: &'static [&'static str],
    /// (list field, key) pairs assigned by the server per item; dropped when
    /// duplicating
    pub nested_server_ids: &'static [(&'static str, &'static str)],
}

impl EntityShape {
    /// Build the request body for `mode`
    pub fn prepare(&self, value: &DraftValue, mode: &SubmitMode) -> Value {
        let mut body = Map::new();

        for key in self.accepted {
            if let Some(v) = value.get(*key) {
                body.insert((*key).to_string(), v.clone());
            }
        }

        for (field, api_key) in self.references {
            if let Some(id) = value.get(*field).and_then(reference_id) {
                body.insert((*api_key).to_string(), id);
            }
        }

        for (field, api_key) in self.reference_lists {
            if let Some(items) = value.get(*field).and_then(Value::as_array) {
                let ids: Vec<Value> = items.iter().filter_map(reference_id).collect();
                body.insert((*api_key).to_string(), Value::Array(ids));
            }
        }

        if *mode == SubmitMode::Duplicate {
            for key in self.server_ids {
                body.remove(*key);
            }
            for (list, key) in self.nested_server_ids {
                if let Some(Value::Array(items)) = body.get_mut(*list) {
                    for item in items.iter_mut() {
                        if let Value::Object(obj) = item {
                            obj.remove(*key);
                        }
                    }
                }
            }
        }

        Value::Object(body)
    }

    /// Wizard field a server error key refers to
    pub fn field_for_api_key<'a>(&self, api_key: &'a str) -> &'a str {
        let found = self
            .references
            .iter()
            .chain(self.reference_lists.iter())
            .find(|(_, key)| *key == api_key);
        match found {
            Some((field, _)) => field,
            None => api_key,
        }
    }
}

/// Id of a reference: an object's `id`, or a bare string/number id
fn reference_id(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) | Value::Number(_) => Some(value.clone()),
        Value::Object(obj) => obj
            .get("id")
            .filter(|id| id.is_string() || id.is_number())
            .cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::value::from_json;
    use serde_json::json;

    const SHAPE: EntityShape = EntityShape {
        accepted: &["title", "roles", "slug"],
        references: &[("organization", "organization_id")],
        reference_lists: &[("causes", "cause_ids")],
        server_ids: &["slug"],
        nested_server_ids: &[("roles", "id")],
    };

    fn value() -> DraftValue {
        from_json(json!({
            "id": 99,
            "title": "Park cleanup",
            "slug": "park-cleanup",
            "organization": {"id": 4, "name": "Friends of the Park"},
            "causes": [{"id": 1, "name": "Environment"}, 2, {"name": "no id"}],
            "roles": [{"id": 10, "title": "Lead"}, {"title": "Helper"}],
            "ui_only": true
        }))
        .unwrap()
    }

    #[test]
    fn test_create_replaces_nested_objects_with_ids() {
        let body = SHAPE.prepare(&value(), &SubmitMode::Create);

        assert_eq!(
            body,
            json!({
                "title": "Park cleanup",
                "slug": "park-cleanup",
                "organization_id": 4,
                "cause_ids": [1, 2],
                "roles": [{"id": 10, "title": "Lead"}, {"title": "Helper"}]
            })
        );
    }

    #[test]
    fn test_duplicate_strips_server_assigned_ids() {
        let body = SHAPE.prepare(&value(), &SubmitMode::Duplicate);

        assert!(body.get("slug").is_none());
        assert!(body.get("id").is_none());
        assert_eq!(
            body["roles"],
            json!([{"title": "Lead"}, {"title": "Helper"}])
        );
        assert_eq!(body["organization_id"], 4);
    }

    #[test]
    fn test_edit_keeps_role_ids() {
        let body = SHAPE.prepare(&value(), &SubmitMode::Edit { id: "99".into() });
        assert_eq!(body["roles"][0]["id"], 10);
        assert_eq!(body["slug"], "park-cleanup");
    }

    #[test]
    fn test_field_for_api_key() {
        assert_eq!(SHAPE.field_for_api_key("organization_id"), "organization");
        assert_eq!(SHAPE.field_for_api_key("cause_ids"), "causes");
        assert_eq!(SHAPE.field_for_api_key("title"), "title");
    }
}
