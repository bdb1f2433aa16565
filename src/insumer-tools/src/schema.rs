//! Declarative argument schemas.
//!
//! Each tool describes its arguments once as a list of [`Field`]s. The same
//! description drives [`validate`], which checks caller input before any
//! network traffic, and [`input_schema`], which produces the JSON Schema
//! advertised through `tools/list`. The two cannot drift apart.

use std::sync::LazyLock;

use insumer_mcp_types::{PropertySchema, ToolInputSchema};
use regex::Regex;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::chain::ChainSet;

/// Constraints on a string value. Lengths count characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringRule {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub pattern: Option<&'static LazyLock<Regex>>,
}

impl StringRule {
    /// Any string.
    pub const fn any() -> Self {
        Self {
            min_len: None,
            max_len: None,
            pattern: None,
        }
    }

    /// Inclusive length bounds.
    pub const fn len(mut self, min: usize, max: usize) -> Self {
        self.min_len = Some(min);
        self.max_len = Some(max);
        self
    }

    pub const fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    /// Anchored regular expression the whole value must match.
    pub const fn pattern(mut self, pattern: &'static LazyLock<Regex>) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

/// The shape a value must have.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String(StringRule),
    Integer { min: Option<i64>, max: Option<i64> },
    Number { min: Option<f64>, max: Option<f64> },
    Boolean,
    /// One of a closed list of string literals.
    Enum(&'static [&'static str]),
    /// A chain identifier from the given set.
    Chain(&'static ChainSet),
    /// A closed object; unknown members are rejected.
    Object(Vec<Field>),
    Array {
        items: Box<FieldKind>,
        min_items: usize,
        max_items: usize,
    },
}

impl FieldKind {
    pub fn integer(min: i64, max: i64) -> Self {
        Self::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn integer_at_least(min: i64) -> Self {
        Self::Integer {
            min: Some(min),
            max: None,
        }
    }

    pub fn number_at_least(min: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: None,
        }
    }

    pub fn array(items: FieldKind, min_items: usize, max_items: usize) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items,
            max_items,
        }
    }
}

/// A named argument.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Whether an explicit `null` is a meaningful value (usually "clear it").
    pub nullable: bool,
}

impl Field {
    /// An optional, non-nullable field.
    pub fn new(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
            nullable: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// JSON Schema for this field, including its description.
    pub fn property_schema(&self) -> PropertySchema {
        let schema = kind_schema(&self.kind);
        let schema = if self.nullable {
            PropertySchema::any_of(vec![schema, PropertySchema::null()])
        } else {
            schema
        };
        schema.description(self.description)
    }
}

/// What was wrong with a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("is required")]
    Missing,

    #[error("is not a recognized argument")]
    UnknownField,

    #[error("must not be null")]
    Null,

    #[error("must be {0}")]
    WrongType(&'static str),

    #[error("must be an integer")]
    NotInteger,

    #[error("must be at least {0} characters")]
    TooShort(usize),

    #[error("must be at most {0} characters")]
    TooLong(usize),

    #[error("must match {0}")]
    Pattern(String),

    #[error("must be at least {0}")]
    BelowMinimum(String),

    #[error("must be at most {0}")]
    AboveMaximum(String),

    #[error("must be one of: {}", .0.join(", "))]
    NotAllowed(&'static [&'static str]),

    #[error("must be {0}")]
    Chain(String),

    #[error("must contain at least {0} items")]
    TooFewItems(usize),

    #[error("must contain at most {0} items")]
    TooManyItems(usize),
}

/// A rejected argument: where, and which constraint it broke.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {violation}")]
pub struct ValidationError {
    /// Dotted path with array indices, e.g. `conditions[3].chainId`.
    pub path: String,
    pub violation: Violation,
}

impl ValidationError {
    fn new(path: impl Into<String>, violation: Violation) -> Self {
        Self {
            path: path.into(),
            violation,
        }
    }

    /// Structured error data for the JSON-RPC error object.
    pub fn to_data(&self, tool: &str) -> Value {
        json!({
            "tool": tool,
            "path": self.path,
            "constraint": self.violation.to_string(),
        })
    }
}

/// Path reported when the arguments are not an object at all.
const ROOT_PATH: &str = "arguments";

/// Check caller input against a field list.
///
/// Returns the accepted members in declaration order. Absent optional fields
/// stay absent; `null` on a nullable field is kept; `null` on an optional
/// non-nullable field is treated as absent. Missing `arguments` counts as
/// an empty object.
pub fn validate(fields: &[Field], input: &Value) -> Result<Map<String, Value>, ValidationError> {
    match input {
        Value::Object(object) => validate_object(fields, object, ""),
        Value::Null => validate_object(fields, &Map::new(), ""),
        _ => Err(ValidationError::new(ROOT_PATH, Violation::WrongType("an object"))),
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn validate_object(
    fields: &[Field],
    object: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, ValidationError> {
    if let Some(unknown) = object
        .keys()
        .find(|key| !fields.iter().any(|field| field.name == key.as_str()))
    {
        return Err(ValidationError::new(join(path, unknown), Violation::UnknownField));
    }

    let mut accepted = Map::new();
    for field in fields {
        let field_path = join(path, field.name);
        match object.get(field.name) {
            None if field.required => {
                return Err(ValidationError::new(field_path, Violation::Missing));
            }
            None => {}
            Some(Value::Null) if field.nullable => {
                accepted.insert(field.name.to_string(), Value::Null);
            }
            Some(Value::Null) if field.required => {
                return Err(ValidationError::new(field_path, Violation::Null));
            }
            Some(Value::Null) => {}
            Some(value) => {
                let value = check(&field.kind, value, &field_path)?;
                accepted.insert(field.name.to_string(), value);
            }
        }
    }
    Ok(accepted)
}

fn check(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, ValidationError> {
    let fail = |violation| Err(ValidationError::new(path, violation));

    match kind {
        FieldKind::String(rule) => {
            let Some(s) = value.as_str() else {
                return fail(Violation::WrongType("a string"));
            };
            let len = s.chars().count();
            if let Some(min) = rule.min_len.filter(|&min| len < min) {
                return fail(Violation::TooShort(min));
            }
            if let Some(max) = rule.max_len.filter(|&max| len > max) {
                return fail(Violation::TooLong(max));
            }
            if let Some(pattern) = rule.pattern.filter(|pattern| !pattern.is_match(s)) {
                return fail(Violation::Pattern(pattern.as_str().to_string()));
            }
        }
        FieldKind::Integer { min, max } => {
            let n = match value.as_i64() {
                Some(n) => n,
                // Past i64::MAX: still an integer, just too large.
                None if value.is_u64() => {
                    return fail(Violation::AboveMaximum(max.unwrap_or(i64::MAX).to_string()));
                }
                None if value.is_number() => return fail(Violation::NotInteger),
                None => return fail(Violation::WrongType("an integer")),
            };
            if let Some(min) = min.filter(|&min| n < min) {
                return fail(Violation::BelowMinimum(min.to_string()));
            }
            if let Some(max) = max.filter(|&max| n > max) {
                return fail(Violation::AboveMaximum(max.to_string()));
            }
        }
        FieldKind::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                return fail(Violation::WrongType("a number"));
            };
            if let Some(min) = min.filter(|&min| n < min) {
                return fail(Violation::BelowMinimum(min.to_string()));
            }
            if let Some(max) = max.filter(|&max| n > max) {
                return fail(Violation::AboveMaximum(max.to_string()));
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return fail(Violation::WrongType("a boolean"));
            }
        }
        FieldKind::Enum(allowed) => {
            if !value.as_str().is_some_and(|s| allowed.contains(&s)) {
                return fail(Violation::NotAllowed(*allowed));
            }
        }
        FieldKind::Chain(set) => {
            return set
                .parse(value)
                .map(|chain| chain.to_value())
                .map_err(|violation| ValidationError::new(path, violation));
        }
        FieldKind::Object(fields) => {
            let Some(object) = value.as_object() else {
                return fail(Violation::WrongType("an object"));
            };
            return validate_object(fields, object, path).map(Value::Object);
        }
        FieldKind::Array {
            items,
            min_items,
            max_items,
        } => {
            let Some(array) = value.as_array() else {
                return fail(Violation::WrongType("an array"));
            };
            if array.len() < *min_items {
                return fail(Violation::TooFewItems(*min_items));
            }
            if array.len() > *max_items {
                return fail(Violation::TooManyItems(*max_items));
            }
            return array
                .iter()
                .enumerate()
                .map(|(i, item)| check(items, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        }
    }
    Ok(value.clone())
}

fn kind_schema(kind: &FieldKind) -> PropertySchema {
    match kind {
        FieldKind::String(rule) => {
            let mut schema = PropertySchema::string();
            if let Some(min) = rule.min_len {
                schema = schema.min_len(min as u64);
            }
            if let Some(max) = rule.max_len {
                schema = schema.max_len(max as u64);
            }
            if let Some(pattern) = rule.pattern {
                schema = schema.pattern(pattern.as_str());
            }
            schema
        }
        FieldKind::Integer { min, max } => {
            let mut schema = PropertySchema::integer();
            if let Some(min) = min {
                schema = schema.min(*min as f64);
            }
            if let Some(max) = max {
                schema = schema.max(*max as f64);
            }
            schema
        }
        FieldKind::Number { min, max } => {
            let mut schema = PropertySchema::number();
            if let Some(min) = min {
                schema = schema.min(*min);
            }
            if let Some(max) = max {
                schema = schema.max(*max);
            }
            schema
        }
        FieldKind::Boolean => PropertySchema::boolean(),
        FieldKind::Enum(allowed) => PropertySchema::string().enum_values(allowed.iter().copied()),
        FieldKind::Chain(set) => set.property_schema(),
        FieldKind::Object(fields) => {
            let schema = fields.iter().fold(PropertySchema::object(), |schema, field| {
                schema.property(field.name, field.property_schema())
            });
            let required = required_names(fields);
            if required.is_empty() {
                schema
            } else {
                schema.required(required)
            }
        }
        FieldKind::Array {
            items,
            min_items,
            max_items,
        } => PropertySchema::array(kind_schema(items))
            .item_count(*min_items as u64, *max_items as u64),
    }
}

fn required_names(fields: &[Field]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|field| field.required)
        .map(|field| field.name)
        .collect()
}

/// The advertised input schema for a field list.
pub fn input_schema(fields: &[Field]) -> ToolInputSchema {
    fields
        .iter()
        .fold(ToolInputSchema::object(), |schema, field| {
            schema.property(field.name, field.property_schema())
        })
        .required(required_names(fields))
}
