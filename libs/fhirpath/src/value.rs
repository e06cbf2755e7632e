//! Working values and collections
//!
//! Every FHIRPath sub-expression evaluates to a [`Collection`]: an ordered
//! list of [`Item`]s. An item is a [`Value`] plus the ancestry it was reached
//! through, which is what `%resource` walks. Values either borrow a record
//! [`Node`] or are computed primitives owned by the collection.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rust_decimal::Decimal;
use smallvec::{smallvec, SmallVec};

use crate::error::{Error, Result};
use crate::node::{Node, Scalar};
use crate::schema::{SchemaReflector, TypeKind};
use crate::temporal::{compare_date_times, compare_times, date_times_equal, PartialDateTime, PartialTime};

/// UCUM system URI, used for quantity literals with a quoted unit.
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// A decimal value with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: Decimal,
    pub code: Option<Arc<str>>,
    pub system: Option<Arc<str>>,
}

impl Quantity {
    pub fn same_unit(&self, other: &Quantity) -> bool {
        self.code == other.code && self.system == other.system
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} '{}'", self.value, code),
            None => write!(f, "{}", self.value),
        }
    }
}

/// A single element of a working collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Element of the input record, structured or primitive.
    Node(&'a Node),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(Arc<str>),
    Date(PartialDateTime),
    DateTime(PartialDateTime),
    Time(PartialTime),
    Quantity(Quantity),
}

impl<'a> Value<'a> {
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value::String(value.into())
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Type name for diagnostics.
    pub fn type_label(&self) -> &str {
        match self {
            Value::Node(node) => node.type_name(),
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Time(_) => "Time",
            Value::Quantity(_) => "Quantity",
        }
    }

    /// Primitive reading of this value. Record primitives become the matching
    /// system value, quantity-shaped records become [`Value::Quantity`] and
    /// other structured records have none.
    pub fn primitive(&self, schema: &dyn SchemaReflector) -> Option<Value<'a>> {
        let node = match self {
            Value::Node(node) => *node,
            other => return Some(other.clone()),
        };

        if let Some(scalar) = node.value() {
            return Some(match scalar {
                Scalar::Boolean(b) => Value::Boolean(*b),
                Scalar::Integer(i) => Value::Integer(*i),
                Scalar::Decimal(d) => Value::Decimal(*d),
                Scalar::String(s) => Value::string(s.as_str()),
                Scalar::Enum(symbol) => Value::string(schema.enum_code(node.type_name(), symbol)),
                Scalar::Date(d) => Value::Date(*d),
                Scalar::DateTime(d) => Value::DateTime(*d),
                Scalar::Time(t) => Value::Time(*t),
            });
        }

        let is_quantity = schema
            .describe(node.type_name())
            .is_some_and(|d| d.kind == TypeKind::Quantity);
        if !is_quantity {
            return None;
        }
        let text = |field: &str| -> Option<Arc<str>> {
            let child = node.field(field).first()?;
            match child.value()? {
                Scalar::String(s) => Some(Arc::from(s.as_str())),
                Scalar::Enum(symbol) => Some(Arc::from(schema.enum_code(child.type_name(), symbol))),
                _ => None,
            }
        };
        let value = match node.field("value").first()?.value()? {
            Scalar::Decimal(d) => *d,
            Scalar::Integer(i) => Decimal::from(*i),
            _ => return None,
        };
        Some(Value::Quantity(Quantity {
            value,
            code: text("code").or_else(|| text("unit")),
            system: text("system"),
        }))
    }

    /// String content of a string-like value.
    pub fn as_str(&self, schema: &dyn SchemaReflector) -> Option<Arc<str>> {
        match self.primitive(schema)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// FHIRPath `=` on single elements.
    pub fn equals(&self, other: &Value<'a>, schema: &dyn SchemaReflector) -> bool {
        if let (Value::Node(a), Value::Node(b)) = (self, other) {
            if std::ptr::eq(*a, *b) {
                return true;
            }
        }
        match (self.primitive(schema), other.primitive(schema)) {
            (Some(a), Some(b)) => primitive_equals(&a, &b),
            (None, None) => self == other,
            _ => false,
        }
    }

    /// FHIRPath `~` on single elements.
    pub fn equivalent(&self, other: &Value<'a>, schema: &dyn SchemaReflector) -> bool {
        match (self.primitive(schema), other.primitive(schema)) {
            (Some(Value::String(a)), Some(Value::String(b))) => {
                normalize_whitespace(&a) == normalize_whitespace(&b)
            }
            (Some(Value::Decimal(a)), Some(Value::Decimal(b))) => {
                let scale = a.scale().min(b.scale());
                a.round_dp(scale) == b.round_dp(scale)
            }
            (Some(a @ (Value::Date(_) | Value::DateTime(_))), Some(b @ (Value::Date(_) | Value::DateTime(_)))) => {
                temporal_order(&a, &b) == Some(Ordering::Equal)
            }
            _ => self.equals(other, schema),
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn temporal_order(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Date(x) | Value::DateTime(x), Value::Date(y) | Value::DateTime(y)) => {
            compare_date_times(x, y)
        }
        (Value::Time(x), Value::Time(y)) => compare_times(x, y),
        _ => None,
    }
}

fn primitive_equals(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Integer(x), Value::Decimal(y)) | (Value::Decimal(y), Value::Integer(x)) => {
            Decimal::from(*x) == *y
        }
        (Value::Decimal(x), Value::Decimal(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x) | Value::DateTime(x), Value::Date(y) | Value::DateTime(y)) => {
            date_times_equal(x, y)
        }
        (Value::Time(x), Value::Time(y)) => {
            x.precision() == y.precision() && compare_times(x, y) == Some(Ordering::Equal)
        }
        (Value::Quantity(x), Value::Quantity(y)) => x.same_unit(y) && x.value == y.value,
        _ => false,
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Node(node) => match node.value() {
                Some(Scalar::Boolean(b)) => write!(f, "{b}"),
                Some(Scalar::Integer(i)) => write!(f, "{i}"),
                Some(Scalar::Decimal(d)) => write!(f, "{d}"),
                Some(Scalar::String(s)) | Some(Scalar::Enum(s)) => f.write_str(s),
                Some(Scalar::Date(d)) | Some(Scalar::DateTime(d)) => write!(f, "{d}"),
                Some(Scalar::Time(t)) => write!(f, "{t}"),
                None => write!(f, "<{}>", node.type_name()),
            },
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) | Value::DateTime(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Quantity(q) => write!(f, "{q}"),
        }
    }
}

/// Path from the evaluation root to an item.
#[derive(Debug, Clone)]
pub(crate) enum Ancestry<'a> {
    /// Computed value: literals, operator and function results.
    Detached,
    /// The evaluation root itself.
    Root,
    /// Reached through `Frame::node`.
    Child(Rc<Frame<'a>>),
}

#[derive(Debug)]
pub(crate) struct Frame<'a> {
    node: &'a Node,
    parent: Ancestry<'a>,
}

/// A value in a working collection.
#[derive(Debug, Clone)]
pub struct Item<'a> {
    pub value: Value<'a>,
    pub(crate) ancestry: Ancestry<'a>,
}

impl<'a> Item<'a> {
    pub fn detached(value: Value<'a>) -> Self {
        Self {
            value,
            ancestry: Ancestry::Detached,
        }
    }

    pub(crate) fn root(node: &'a Node) -> Self {
        Self {
            value: Value::Node(node),
            ancestry: Ancestry::Root,
        }
    }

    /// `node`, reached from this item's node `parent`.
    pub(crate) fn child(&self, parent: &'a Node, node: &'a Node) -> Item<'a> {
        Item {
            value: Value::Node(node),
            ancestry: Ancestry::Child(Rc::new(Frame {
                node: parent,
                parent: self.ancestry.clone(),
            })),
        }
    }

    /// Nearest resource at or above this item, with its own ancestry.
    pub(crate) fn enclosing_resource(&self, schema: &dyn SchemaReflector) -> Result<Item<'a>> {
        if let Value::Node(node) = self.value {
            if schema.is_resource(node.type_name()) {
                return Ok(self.clone());
            }
        }
        let mut ancestry = &self.ancestry;
        while let Ancestry::Child(frame) = ancestry {
            if schema.is_resource(frame.node.type_name()) {
                return Ok(Item {
                    value: Value::Node(frame.node),
                    ancestry: frame.parent.clone(),
                });
            }
            ancestry = &frame.parent;
        }
        Err(Error::NoResourceInAncestry)
    }
}

/// Ordered collection of items. Most results hold at most one item, which
/// stays inline.
#[derive(Debug, Clone, Default)]
pub struct Collection<'a> {
    items: SmallVec<[Item<'a>; 1]>,
}

impl<'a> Collection<'a> {
    pub fn empty() -> Self {
        Self {
            items: SmallVec::new(),
        }
    }

    pub fn singleton(item: Item<'a>) -> Self {
        Self {
            items: smallvec![item],
        }
    }

    /// Singleton holding a computed value.
    pub fn of(value: Value<'a>) -> Self {
        Self::singleton(Item::detached(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::of(Value::Boolean(value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item<'a>> {
        self.items.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value<'a>> {
        self.items.iter().map(|item| &item.value)
    }

    pub fn push(&mut self, item: Item<'a>) {
        self.items.push(item);
    }

    pub fn extend(&mut self, other: Collection<'a>) {
        self.items.extend(other.items);
    }

    pub fn get(&self, index: usize) -> Option<&Item<'a>> {
        self.items.get(index)
    }

    pub fn into_items(self) -> Vec<Item<'a>> {
        self.items.into_vec()
    }

    /// The only item, `None` when empty, or an error naming `operation` when
    /// there is more than one.
    pub fn single(&self, operation: &str) -> Result<Option<&Item<'a>>> {
        match self.items.as_slice() {
            [] => Ok(None),
            [item] => Ok(Some(item)),
            items => Err(Error::InvalidArgument(format!(
                "{operation} requires at most one element, got {}",
                items.len()
            ))),
        }
    }

    pub fn contains_value(&self, value: &Value<'a>, schema: &dyn SchemaReflector) -> bool {
        self.values().any(|v| v.equals(value, schema))
    }

    /// Keep the first occurrence of every value.
    pub fn distinct(self, schema: &dyn SchemaReflector) -> Self {
        let mut out = Collection::empty();
        for item in self.items {
            if !out.contains_value(&item.value, schema) {
                out.push(item);
            }
        }
        out
    }
}

impl<'a> FromIterator<Item<'a>> for Collection<'a> {
    fn from_iter<I: IntoIterator<Item = Item<'a>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for Collection<'a> {
    type Item = Item<'a>;
    type IntoIter = smallvec::IntoIter<[Item<'a>; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'c, 'a> IntoIterator for &'c Collection<'a> {
    type Item = &'c Item<'a>;
    type IntoIter = std::slice::Iter<'c, Item<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
