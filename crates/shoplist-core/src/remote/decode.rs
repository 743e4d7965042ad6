//! ============================================================================
//! Response Decoding - Webhook payloads resolved once at the boundary
//! ============================================================================
//! The template endpoint answers either `{ "template": { cat: [items] } }`
//! or a bare `{ cat: [items] }`. Items are bare strings or objects with
//! `nome` and an optional `id`.
//! ============================================================================

use serde_json::Value;

use crate::types::{Template, TemplateItem};

/// Outcome of decoding a template response
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDecode {
    Template(Template),
    Unrecognized(String),
}

/// Decode a template fetch response
pub fn decode_template(body: &Value) -> TemplateDecode {
    let root = match body {
        Value::Object(map) => match map.get("template") {
            Some(nested) if is_truthy(nested) => nested,
            _ => body,
        },
        Value::Array(_) => return TemplateDecode::Unrecognized("top-level array".into()),
        other => return TemplateDecode::Unrecognized(format!("top-level {}", kind(other))),
    };

    let Value::Object(categories) = root else {
        return TemplateDecode::Unrecognized(format!("template is {}", kind(root)));
    };

    let mut template = Template::new();
    for (category, items) in categories {
        let Value::Array(items) = items else {
            return TemplateDecode::Unrecognized(format!(
                "category {} holds {}",
                category,
                kind(items)
            ));
        };

        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            match decode_item(item) {
                Some(item) => decoded.push(item),
                None => {
                    return TemplateDecode::Unrecognized(format!(
                        "category {} has a {} item",
                        category,
                        kind(item)
                    ))
                }
            }
        }
        template.insert(category.clone(), decoded);
    }

    TemplateDecode::Template(template)
}

fn decode_item(item: &Value) -> Option<TemplateItem> {
    match item {
        Value::String(name) => Some(TemplateItem::new(name.clone(), name.clone())),
        Value::Object(map) => {
            let name = map.get("nome")?.as_str()?.to_string();
            let id = map
                .get("id")
                .and_then(scalar_to_string)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| name.clone());
            Some(TemplateItem::new(id, name))
        }
        _ => None,
    }
}

/// Pull `user_id` out of a login response. Missing, empty, null or false
/// means the credentials were rejected.
pub fn extract_user_id(body: &Value) -> Option<String> {
    body.get("user_id")
        .and_then(scalar_to_string)
        .filter(|id| !id.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect_template(body: Value) -> Template {
        match decode_template(&body) {
            TemplateDecode::Template(t) => t,
            TemplateDecode::Unrecognized(reason) => panic!("unexpected rejection: {}", reason),
        }
    }

    #[test]
    fn test_nested_template() {
        let t = expect_template(json!({
            "template": { "🍎 Fruits": [{ "id": "a", "nome": "Apple" }] }
        }));
        assert_eq!(t["🍎 Fruits"], vec![TemplateItem::new("a", "Apple")]);
    }

    #[test]
    fn test_bare_template_with_string_items() {
        let t = expect_template(json!({ "🥤 Bebidas": ["Suco", "Água"] }));
        assert_eq!(
            t["🥤 Bebidas"],
            vec![TemplateItem::new("Suco", "Suco"), TemplateItem::new("Água", "Água")]
        );
    }

    #[test]
    fn test_missing_id_falls_back_to_name() {
        let t = expect_template(json!({
            "📦 Misc": [{ "nome": "Pilhas" }, { "id": "", "nome": "Fita" }, { "id": 42, "nome": "Cola" }]
        }));
        let items = &t["📦 Misc"];
        assert_eq!(items[0].id, "Pilhas");
        assert_eq!(items[1].id, "Fita");
        assert_eq!(items[2].id, "42");
    }

    #[test]
    fn test_empty_object_is_empty_template() {
        assert!(expect_template(json!({})).is_empty());
        assert!(expect_template(json!({ "template": {} })).is_empty());
    }

    #[test]
    fn test_unrecognized_shapes() {
        for body in [
            json!([]),
            json!("nope"),
            json!(null),
            json!({ "template": [1, 2] }),
            json!({ "template": null }),
            json!({ "Fruits": "Apple" }),
            json!({ "Fruits": [1] }),
            json!({ "Fruits": [{ "id": "a" }] }),
        ] {
            assert!(
                matches!(decode_template(&body), TemplateDecode::Unrecognized(_)),
                "should reject {}",
                body
            );
        }
    }

    #[test]
    fn test_extract_user_id() {
        assert_eq!(extract_user_id(&json!({ "user_id": "u-1" })), Some("u-1".into()));
        assert_eq!(extract_user_id(&json!({ "user_id": 7 })), Some("7".into()));
        assert_eq!(extract_user_id(&json!({ "user_id": "" })), None);
        assert_eq!(extract_user_id(&json!({ "user_id": null })), None);
        assert_eq!(extract_user_id(&json!({ "error": "bad" })), None);
        assert_eq!(extract_user_id(&json!([])), None);
    }
}
