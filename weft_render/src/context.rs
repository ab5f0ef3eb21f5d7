//! Render context: the data a compiled template runs against
//!
//! Three collaborator surfaces feed a render: the root value map, an
//! entity catalog of field/attribute maps for form constructs, and a
//! key-value translation catalog for translate directives.

use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    root: BTreeMap<String, Value>,
    entities: BTreeMap<String, Value>,
    translations: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the root scope from a JSON object; non-object values become a
    /// single `data` entry.
    pub fn from_json(json: serde_json::Value) -> Self {
        let mut context = Self::new();
        match Value::from(json) {
            Value::Map(entries) => context.root = entries,
            other => {
                context.root.insert("data".to_string(), other);
            }
        }
        context
    }

    /// Bind a root value
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.root.insert(name.to_string(), value);
        self
    }

    /// Register an entity's field/attribute map for form constructs
    pub fn with_entity(mut self, name: &str, fields: Value) -> Self {
        self.entities.insert(name.to_string(), fields);
        self
    }

    /// Register one localized text under its key
    pub fn with_translation(mut self, key: &str, text: &str) -> Self {
        self.translations.insert(key.to_string(), text.to_string());
        self
    }

    pub fn root_value(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    pub fn entity(&self, name: &str) -> Option<&Value> {
        self.entities.get(name)
    }

    pub fn translation(&self, key: &str) -> Option<&str> {
        self.translations.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_surfaces() {
        let context = RenderContext::new()
            .with_value("title", Value::Str("Home".into()))
            .with_entity("user", Value::Map(Default::default()))
            .with_translation("greeting.hello", "Hello");

        assert_eq!(
            context.root_value("title"),
            Some(&Value::Str("Home".into()))
        );
        assert!(context.entity("user").is_some());
        assert_eq!(context.translation("greeting.hello"), Some("Hello"));
        assert_eq!(context.translation("missing"), None);
    }

    #[test]
    fn test_from_json_object() {
        let context = RenderContext::from_json(serde_json::json!({"count": 3}));
        assert_eq!(context.root_value("count"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_from_json_scalar_falls_back_to_data() {
        let context = RenderContext::from_json(serde_json::json!(7));
        assert_eq!(context.root_value("data"), Some(&Value::Int(7)));
    }
}
