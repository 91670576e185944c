use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ConvertError;

/// Typed accessors over the loose JSON attribute bag of one resource.
///
/// Terraform reports attributes as arbitrary JSON; these helpers normalize
/// the cases the converter cares about: numbers arriving as strings, keys
/// reported as explicit `null`, and the difference between an absent key and
/// a present zero (which matters for validation bounds).
#[derive(Debug)]
pub(crate) struct AttributeBag<'a> {
    address: &'a str,
    values: &'a Map<String, Value>,
}

impl<'a> AttributeBag<'a> {
    pub fn new(address: &'a str, values: &'a Map<String, Value>) -> Self {
        Self { address, values }
    }

    /// An explicit JSON `null` counts as absent everywhere.
    fn lookup(&self, field: &str) -> Option<&'a Value> {
        match self.values.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn require_str(&self, field: &str) -> Result<String, ConvertError> {
        match self.lookup(field) {
            Some(value) => self.as_str(field, value),
            None => Err(ConvertError::MissingAttribute {
                address: self.address.to_string(),
                field: field.to_string(),
            }),
        }
    }

    pub fn str_or_default(&self, field: &str) -> Result<String, ConvertError> {
        match self.lookup(field) {
            Some(value) => self.as_str(field, value),
            None => Ok(String::new()),
        }
    }

    /// A value that may legitimately arrive as either a JSON string or a
    /// JSON scalar (numeric defaults, option values). Scalars are rendered
    /// to their canonical string form; absence stays `None`.
    pub fn scalar_string(&self, field: &str) -> Result<Option<String>, ConvertError> {
        match self.lookup(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Number(value)) => Ok(Some(value.to_string())),
            Some(Value::Bool(value)) => Ok(Some(value.to_string())),
            Some(_) => Err(self.wrong_type(field, "a string or scalar")),
        }
    }

    pub fn bool_or_default(&self, field: &str) -> Result<bool, ConvertError> {
        match self.lookup(field) {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(Value::String(value)) => value
                .parse()
                .map_err(|_| self.wrong_type(field, "a boolean")),
            Some(_) => Err(self.wrong_type(field, "a boolean")),
        }
    }

    pub fn i64_or_default(&self, field: &str) -> Result<i64, ConvertError> {
        Ok(self.opt_i64(field)?.unwrap_or(0))
    }

    pub fn i32_or_default(&self, field: &str) -> Result<i32, ConvertError> {
        Ok(self.opt_i32(field)?.unwrap_or(0))
    }

    /// Presence-preserving integer: `Ok(None)` only when the key is absent.
    /// A present zero decodes as `Some(0)`.
    pub fn opt_i32(&self, field: &str) -> Result<Option<i32>, ConvertError> {
        match self.opt_i64(field)? {
            None => Ok(None),
            Some(wide) => i32::try_from(wide)
                .map(Some)
                .map_err(|_| self.wrong_type(field, "a 32-bit integer")),
        }
    }

    pub fn opt_i64(&self, field: &str) -> Result<Option<i64>, ConvertError> {
        match self.lookup(field) {
            None => Ok(None),
            Some(Value::Number(value)) => match value.as_i64() {
                Some(number) => Ok(Some(number)),
                None => Err(self.wrong_type(field, "an integer")),
            },
            Some(Value::String(value)) => value
                .parse()
                .map(Some)
                .map_err(|_| self.wrong_type(field, "an integer")),
            Some(_) => Err(self.wrong_type(field, "an integer")),
        }
    }

    pub fn string_map(&self, field: &str) -> Result<BTreeMap<String, String>, ConvertError> {
        let mut entries = BTreeMap::new();
        let Some(value) = self.lookup(field) else {
            return Ok(entries);
        };
        let Value::Object(object) = value else {
            return Err(self.wrong_type(field, "a map of strings"));
        };
        for (key, entry) in object {
            let Value::String(entry) = entry else {
                return Err(self.wrong_type(field, "a map of strings"));
            };
            entries.insert(key.clone(), entry.clone());
        }
        Ok(entries)
    }

    pub fn string_list(&self, field: &str) -> Result<Vec<String>, ConvertError> {
        let Some(value) = self.lookup(field) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(self.wrong_type(field, "a list of strings"));
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let Value::String(item) = item else {
                return Err(self.wrong_type(field, "a list of strings"));
            };
            entries.push(item.clone());
        }
        Ok(entries)
    }

    /// A repeated configuration block: a JSON array of objects, each
    /// returned as its own bag. Absent or empty both mean no blocks.
    pub fn blocks(&self, field: &str) -> Result<Vec<AttributeBag<'a>>, ConvertError> {
        let Some(value) = self.lookup(field) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(self.wrong_type(field, "a list of blocks"));
        };
        let mut bags = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(object) = item else {
                return Err(self.wrong_type(field, "a list of blocks"));
            };
            bags.push(AttributeBag::new(self.address, object));
        }
        Ok(bags)
    }

    fn as_str(&self, field: &str, value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::String(value) => Ok(value.clone()),
            _ => Err(self.wrong_type(field, "a string")),
        }
    }

    fn wrong_type(&self, field: &str, expected: &str) -> ConvertError {
        ConvertError::decode(self.address, format!("attribute `{field}` must be {expected}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).expect("fixture attribute bag")
    }

    #[test]
    fn numeric_attributes_accept_numbers_and_numeric_strings() {
        let values = bag(r#"{"as_number": 120, "as_string": "120"}"#);
        let attrs = AttributeBag::new("null_resource.a", &values);
        assert_eq!(attrs.i64_or_default("as_number").expect("number"), 120);
        assert_eq!(attrs.i64_or_default("as_string").expect("string"), 120);
    }

    #[test]
    fn optional_integer_distinguishes_absent_from_zero() {
        let values = bag(r#"{"present_zero": 0, "nulled": null}"#);
        let attrs = AttributeBag::new("null_resource.a", &values);
        assert_eq!(attrs.opt_i32("present_zero").expect("zero"), Some(0));
        assert_eq!(attrs.opt_i32("nulled").expect("null"), None);
        assert_eq!(attrs.opt_i32("missing").expect("missing"), None);
    }

    #[test]
    fn missing_required_attribute_names_address_and_field() {
        let values = bag("{}");
        let attrs = AttributeBag::new("coder_app.code-server", &values);
        let err = attrs.require_str("slug").expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("coder_app.code-server"));
        assert!(message.contains("`slug`"));
    }

    #[test]
    fn scalar_string_renders_numbers_canonically() {
        let values = bag(r#"{"default": 4}"#);
        let attrs = AttributeBag::new("coder_parameter.example", &values);
        assert_eq!(
            attrs.scalar_string("default").expect("scalar"),
            Some("4".to_string())
        );
    }

    #[test]
    fn blocks_reject_non_object_entries() {
        let values = bag(r#"{"item": ["not-a-block"]}"#);
        let attrs = AttributeBag::new("coder_metadata.about", &values);
        let err = attrs.blocks("item").expect_err("must fail");
        assert!(err.to_string().contains("must be a list of blocks"));
    }
}
