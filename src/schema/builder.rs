use serde_json::{Map, Value, json};

use super::Schema;

/// SchemaBuilder helps construct JSON Schema incrementally.
///
/// Properties and `required` keep insertion order; objects also carry a
/// `propertyOrdering` list so Gemini emits fields in the declared order.
#[derive(Default)]
pub struct SchemaBuilder {
    schema_type: String,
    description: Option<String>,
    properties: Vec<(String, Value)>,
    required: Vec<String>,
    items: Option<Value>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self::new()
    }

    pub fn array(items: Value) -> Self {
        Self {
            schema_type: "array".to_string(),
            items: Some(items),
            ..Default::default()
        }
    }

    /// A string property restricted to `values`.
    pub fn string_enum(values: &[&str]) -> Value {
        json!({
            "type": "string",
            "enum": values,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        property_schema: Value,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        match self.properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = property_schema,
            None => self.properties.push((name, property_schema)),
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema::new(self.build_value())
    }

    /// Build into a bare JSON value, for nesting inside another builder.
    pub fn build_value(self) -> Value {
        let mut schema = json!({
            "type": self.schema_type
        });

        if let Some(description) = self.description {
            schema["description"] = json!(description);
        }

        if self.schema_type == "array" {
            if let Some(items) = self.items {
                schema["items"] = items;
            }
            return schema;
        }

        if !self.properties.is_empty() {
            let ordering: Vec<&str> = self.properties.iter().map(|(n, _)| n.as_str()).collect();
            schema["propertyOrdering"] = json!(ordering);

            let mut properties = Map::new();
            for (name, value) in self.properties {
                properties.insert(name, value);
            }
            schema["properties"] = Value::Object(properties);

            if !self.required.is_empty() {
                schema["required"] = json!(self.required);
            }
        }

        schema
    }
}
