//! Type names for `is`, `as` and `ofType`
//!
//! A type specifier is either one of the FHIRPath system types or the name of
//! a type known to the schema. Matching is exact: an integer is not a
//! `Decimal`, a `code` is not a `String`.

use std::sync::Arc;

use phf::phf_map;

use crate::error::{Error, Result};
use crate::node::Scalar;
use crate::schema::{PrimitiveKind, SchemaReflector, TypeKind};
use crate::value::Value;

/// FHIRPath system types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
    Quantity,
}

static SYSTEM_TYPES: phf::Map<&'static str, TypeId> = phf_map! {
    "Boolean" => TypeId::Boolean,
    "Integer" => TypeId::Integer,
    "Decimal" => TypeId::Decimal,
    "String" => TypeId::String,
    "Date" => TypeId::Date,
    "DateTime" => TypeId::DateTime,
    "Time" => TypeId::Time,
    "Quantity" => TypeId::Quantity,
};

impl TypeId {
    pub fn from_name(name: &str) -> Option<TypeId> {
        SYSTEM_TYPES.get(name).copied()
    }

    /// System type of a value, if it has one. Record primitives only count
    /// when their scalar kind is the system kind itself.
    pub fn of(value: &Value<'_>, schema: &dyn SchemaReflector) -> Option<TypeId> {
        let node = match value {
            Value::Node(node) => node,
            Value::Boolean(_) => return Some(TypeId::Boolean),
            Value::Integer(_) => return Some(TypeId::Integer),
            Value::Decimal(_) => return Some(TypeId::Decimal),
            Value::String(_) => return Some(TypeId::String),
            Value::Date(_) => return Some(TypeId::Date),
            Value::DateTime(_) => return Some(TypeId::DateTime),
            Value::Time(_) => return Some(TypeId::Time),
            Value::Quantity(_) => return Some(TypeId::Quantity),
        };

        match schema.describe(node.type_name())?.kind {
            TypeKind::Quantity => Some(TypeId::Quantity),
            TypeKind::Primitive(kind) => match (kind, node.value()?) {
                (PrimitiveKind::Boolean, Scalar::Boolean(_)) => Some(TypeId::Boolean),
                (PrimitiveKind::Integer, Scalar::Integer(_)) => Some(TypeId::Integer),
                (PrimitiveKind::Decimal, Scalar::Decimal(_)) => Some(TypeId::Decimal),
                (PrimitiveKind::String, Scalar::String(_)) => Some(TypeId::String),
                (PrimitiveKind::Date, Scalar::Date(_)) => Some(TypeId::Date),
                (PrimitiveKind::DateTime, Scalar::DateTime(_)) => Some(TypeId::DateTime),
                (PrimitiveKind::Time, Scalar::Time(_)) => Some(TypeId::Time),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Resolved type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpecifier {
    System(TypeId),
    Named(Arc<str>),
}

impl TypeSpecifier {
    /// Resolve `System.X`, `FHIR.X` or a bare name. System names win over
    /// schema names for unqualified lookups.
    pub fn resolve(name: &str, schema: &dyn SchemaReflector) -> Result<TypeSpecifier> {
        let (namespace, bare) = match name.split_once('.') {
            Some((ns @ ("System" | "FHIR"), rest)) => (Some(ns), rest),
            _ => (None, name),
        };

        if namespace != Some("FHIR") {
            if let Some(id) = TypeId::from_name(bare) {
                return Ok(TypeSpecifier::System(id));
            }
        }
        if namespace != Some("System") && schema.describe(bare).is_some() {
            return Ok(TypeSpecifier::Named(Arc::from(bare)));
        }
        Err(Error::NotFound(format!("Unknown type name '{name}'")))
    }

    pub fn matches(&self, value: &Value<'_>, schema: &dyn SchemaReflector) -> bool {
        match self {
            TypeSpecifier::System(id) => TypeId::of(value, schema) == Some(*id),
            TypeSpecifier::Named(name) => value
                .as_node()
                .is_some_and(|node| node.type_name() == name.as_ref()),
        }
    }
}
