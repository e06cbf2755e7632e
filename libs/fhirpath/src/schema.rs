//! Schema reflection
//!
//! The compiler and evaluator learn about record types only through the
//! [`SchemaReflector`] trait: which fields a type declares (with their JSON
//! and internal names, target type and cardinality), whether a type is a
//! primitive, a choice group, a quantity or a resource, and how enum symbols
//! map to external codes.
//!
//! [`Schema`] is a data-driven implementation that can be loaded from JSON:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Period", "fields": [
//!         { "name": "start", "type": "dateTime" },
//!         { "name": "end", "type": "dateTime" } ] },
//!     { "name": "Observation", "resource": true, "fields": [
//!         { "name": "status", "type": "code" },
//!         { "name": "value", "type": "Observation.Value" } ] },
//!     { "name": "Observation.Value", "kind": "choice", "fields": [
//!         { "name": "quantity", "type": "Quantity" },
//!         { "name": "string_value", "jsonName": "string", "type": "string" } ] }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scalar representation of a primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    UnsignedInt,
    PositiveInt,
    Decimal,
    String,
    Code,
    Id,
    Uri,
    Date,
    DateTime,
    Time,
}

impl PrimitiveKind {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Integer | PrimitiveKind::UnsignedInt | PrimitiveKind::PositiveInt
        )
    }

    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            PrimitiveKind::String | PrimitiveKind::Code | PrimitiveKind::Id | PrimitiveKind::Uri
        )
    }
}

/// Shape of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    /// Carries a scalar value.
    Primitive(PrimitiveKind),
    /// Ordinary record with named fields.
    #[default]
    Structured,
    /// Exactly one of its fields is set; navigation yields that field.
    /// Also used for containers holding one of many resource types.
    Choice,
    /// Structured type with `value`, `unit`, `system` and `code` fields that
    /// behaves as a quantity in comparisons.
    Quantity,
}

/// A declared field of a structured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Internal (snake_case) name, the key used by [`crate::Node`].
    pub name: String,
    /// Name used in expressions. Defaults to the lowerCamelCase internal name.
    #[serde(default)]
    pub json_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub repeated: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            json_name: name.to_lower_camel_case(),
            name,
            type_name: type_name.into(),
            repeated: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }
}

/// Everything the engine needs to know about one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    /// Marks a resource boundary for `%resource`.
    #[serde(default)]
    pub resource: bool,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Enum symbol to external code overrides.
    #[serde(default)]
    pub enum_codes: BTreeMap<String, String>,
}

impl TypeDescriptor {
    pub fn structured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Structured,
            resource: false,
            fields: Vec::new(),
            enum_codes: BTreeMap::new(),
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            kind: TypeKind::Primitive(kind),
            ..Self::structured(name)
        }
    }

    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            resource: true,
            ..Self::structured(name)
        }
    }

    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_enum_code(mut self, symbol: impl Into<String>, code: impl Into<String>) -> Self {
        self.enum_codes.insert(symbol.into(), code.into());
        self
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Read-only view of the record schema used during compilation and
/// evaluation.
pub trait SchemaReflector: Send + Sync {
    /// Describe a type by name.
    fn describe(&self, type_name: &str) -> Option<&TypeDescriptor>;

    /// Resolve a field name as written in an expression: the JSON name first,
    /// then the snake_case internal name.
    fn find_field(&self, type_name: &str, name: &str) -> Option<&FieldDescriptor> {
        let descriptor = self.describe(type_name)?;
        if let Some(field) = descriptor.fields.iter().find(|f| f.json_name == name) {
            return Some(field);
        }
        let internal = name.to_snake_case();
        descriptor.fields.iter().find(|f| f.name == internal)
    }

    /// External code for an enum symbol of `type_name`. Symbols without an
    /// explicit mapping are lowercased with `_` turned into `-`.
    fn enum_code(&self, type_name: &str, symbol: &str) -> String {
        self.describe(type_name)
            .and_then(|d| d.enum_codes.get(symbol).cloned())
            .unwrap_or_else(|| symbol.to_lowercase().replace('_', "-"))
    }

    fn is_resource(&self, type_name: &str) -> bool {
        self.describe(type_name).is_some_and(|d| d.resource)
    }

    fn is_choice(&self, type_name: &str) -> bool {
        self.describe(type_name)
            .is_some_and(|d| d.kind == TypeKind::Choice)
    }
}

/// FHIR primitive type names and their scalar representation.
const FHIR_PRIMITIVES: &[(&str, PrimitiveKind)] = &[
    ("boolean", PrimitiveKind::Boolean),
    ("integer", PrimitiveKind::Integer),
    ("unsignedInt", PrimitiveKind::UnsignedInt),
    ("positiveInt", PrimitiveKind::PositiveInt),
    ("decimal", PrimitiveKind::Decimal),
    ("string", PrimitiveKind::String),
    ("markdown", PrimitiveKind::String),
    ("base64Binary", PrimitiveKind::String),
    ("code", PrimitiveKind::Code),
    ("id", PrimitiveKind::Id),
    ("uri", PrimitiveKind::Uri),
    ("url", PrimitiveKind::Uri),
    ("canonical", PrimitiveKind::Uri),
    ("oid", PrimitiveKind::Uri),
    ("uuid", PrimitiveKind::Uri),
    ("date", PrimitiveKind::Date),
    ("dateTime", PrimitiveKind::DateTime),
    ("instant", PrimitiveKind::DateTime),
    ("time", PrimitiveKind::Time),
];

#[derive(Deserialize)]
struct SchemaDocument {
    types: Vec<TypeDescriptor>,
}

/// In-memory schema with the FHIR primitive types pre-registered.
#[derive(Debug, Clone)]
pub struct Schema {
    types: HashMap<String, TypeDescriptor>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        let types = FHIR_PRIMITIVES
            .iter()
            .map(|(name, kind)| (name.to_string(), TypeDescriptor::primitive(*name, *kind)))
            .collect();
        Self { types }
    }

    /// Load type descriptors from a JSON document of the form
    /// `{ "types": [ ... ] }` and check that every field type is known.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_descriptors(document.types)
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_value(json)?;
        Self::from_descriptors(document.types)
    }

    fn from_descriptors(descriptors: Vec<TypeDescriptor>) -> Result<Self> {
        let mut schema = Self::new();
        for descriptor in descriptors {
            schema.insert(descriptor);
        }
        schema.validate()?;
        tracing::debug!(types = schema.types.len(), "loaded schema");
        Ok(schema)
    }

    /// Register (or replace) a type. Missing JSON names are derived from the
    /// internal field name.
    pub fn insert(&mut self, mut descriptor: TypeDescriptor) {
        for field in &mut descriptor.fields {
            if field.json_name.is_empty() {
                field.json_name = field.name.to_lower_camel_case();
            }
        }
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Every field must reference a registered type and choice types must
    /// not be repeated inside.
    pub fn validate(&self) -> Result<()> {
        for descriptor in self.types.values() {
            for field in &descriptor.fields {
                if !self.types.contains_key(&field.type_name) {
                    return Err(Error::Internal(format!(
                        "field '{}.{}' references unknown type '{}'",
                        descriptor.name, field.name, field.type_name
                    )));
                }
                if descriptor.kind == TypeKind::Choice && field.repeated {
                    return Err(Error::Internal(format!(
                        "choice branch '{}.{}' cannot be repeated",
                        descriptor.name, field.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SchemaReflector for Schema {
    fn describe(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }
}
