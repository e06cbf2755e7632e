//! Record tree
//!
//! A [`Node`] is one element of a record: a typed node holding an optional
//! scalar (primitive types) and named child fields (structured types). The
//! caller owns the tree; evaluation only borrows it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::schema::{PrimitiveKind, SchemaReflector, TypeKind};
use crate::temporal::{PartialDateTime, PartialTime};

/// Scalar payload of a primitive node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    /// Enum symbol, read through [`SchemaReflector::enum_code`].
    Enum(String),
    Date(PartialDateTime),
    DateTime(PartialDateTime),
    Time(PartialTime),
}

/// One element of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    type_name: String,
    value: Option<Scalar>,
    fields: BTreeMap<String, Vec<Node>>,
}

impl Node {
    /// Structured node with no fields set.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn primitive(type_name: impl Into<String>, value: Scalar) -> Self {
        Self {
            value: Some(value),
            ..Self::new(type_name)
        }
    }

    pub fn string(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::primitive(type_name, Scalar::String(value.into()))
    }

    /// Append `child` to the field with internal name `field`.
    pub fn with(mut self, field: impl Into<String>, child: Node) -> Self {
        self.push(field, child);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, child: Node) {
        self.fields.entry(field.into()).or_default().push(child);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    /// Children stored under an internal field name.
    pub fn field(&self, name: &str) -> &[Node] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The set branch of a choice node.
    pub fn choice_branch(&self) -> Option<&Node> {
        self.fields.values().flatten().next()
    }

    /// Materialize a record from JSON. Object keys are field names as they
    /// would be written in an expression, choice fields hold an object with a
    /// single branch key, and repeated fields accept a single value or an
    /// array. Decimals may be given as strings to keep their exact text.
    pub fn from_json(schema: &dyn SchemaReflector, type_name: &str, json: &JsonValue) -> Result<Node> {
        let descriptor = schema
            .describe(type_name)
            .ok_or_else(|| Error::NotFound(format!("type '{type_name}'")))?;

        if let TypeKind::Primitive(kind) = descriptor.kind {
            return Ok(Node::primitive(type_name, scalar_from_json(kind, type_name, json)?));
        }

        let JsonValue::Object(object) = json else {
            return Err(Error::Internal(format!(
                "expected an object for '{type_name}', got {json}"
            )));
        };

        if descriptor.kind == TypeKind::Choice && object.len() != 1 {
            return Err(Error::Internal(format!(
                "choice '{type_name}' needs exactly one branch, got {}",
                object.len()
            )));
        }

        let mut node = Node::new(type_name);
        for (key, value) in object {
            let field = schema.find_field(type_name, key).ok_or_else(|| {
                Error::Internal(format!("unknown field '{key}' on '{type_name}'"))
            })?;
            let items = match value {
                JsonValue::Array(items) if field.repeated => items.as_slice(),
                JsonValue::Array(_) => {
                    return Err(Error::Internal(format!(
                        "field '{type_name}.{key}' is not repeated"
                    )))
                }
                single => std::slice::from_ref(single),
            };
            for item in items {
                node.push(field.name.clone(), Node::from_json(schema, &field.type_name, item)?);
            }
        }
        Ok(node)
    }
}

fn scalar_from_json(kind: PrimitiveKind, type_name: &str, json: &JsonValue) -> Result<Scalar> {
    let mismatch = || Error::Internal(format!("invalid {type_name} value {json}"));
    let scalar = match kind {
        PrimitiveKind::Boolean => Scalar::Boolean(json.as_bool().ok_or_else(mismatch)?),
        PrimitiveKind::Integer | PrimitiveKind::UnsignedInt | PrimitiveKind::PositiveInt => {
            Scalar::Integer(json.as_i64().ok_or_else(mismatch)?)
        }
        PrimitiveKind::Decimal => {
            let text = match json {
                JsonValue::String(text) => text.clone(),
                JsonValue::Number(number) => number.to_string(),
                _ => return Err(mismatch()),
            };
            Scalar::Decimal(text.parse().map_err(|_| mismatch())?)
        }
        PrimitiveKind::String | PrimitiveKind::Code | PrimitiveKind::Id | PrimitiveKind::Uri => {
            Scalar::String(json.as_str().ok_or_else(mismatch)?.to_string())
        }
        PrimitiveKind::Date => {
            Scalar::Date(PartialDateTime::parse_date(json.as_str().ok_or_else(mismatch)?)?)
        }
        PrimitiveKind::DateTime => Scalar::DateTime(PartialDateTime::parse_date_time(
            json.as_str().ok_or_else(mismatch)?,
        )?),
        PrimitiveKind::Time => {
            Scalar::Time(PartialTime::parse(json.as_str().ok_or_else(mismatch)?)?)
        }
    };
    Ok(scalar)
}
