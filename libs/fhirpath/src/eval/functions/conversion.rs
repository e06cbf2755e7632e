//! Conversion functions: `toX()` and `convertsToX()`.
//!
//! `toX()` returns `{}` for an unconvertible element and rejects more than one
//! element with `InvalidArgument`. `convertsToX()` answers whether `toX()`
//! would produce a value and rejects more than one element with
//! `FailedPrecondition`.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

/// The single element's primitive reading, `Ok(None)` for empty input.
/// Structured elements read as `Some(None)`.
fn single_primitive<'a>(
    input: &Collection<'a>,
    function: &str,
    converts: bool,
    schema: &dyn SchemaReflector,
) -> Result<Option<Option<Value<'a>>>> {
    if input.len() > 1 {
        let message = format!("{function}() requires at most one element, got {}", input.len());
        return Err(if converts {
            Error::FailedPrecondition(message)
        } else {
            Error::InvalidArgument(message)
        });
    }
    Ok(input.iter().next().map(|item| item.value.primitive(schema)))
}

fn convert<'a>(
    input: &Collection<'a>,
    function: &str,
    schema: &dyn SchemaReflector,
    conversion: fn(&Value<'a>) -> Option<Value<'a>>,
) -> Result<Collection<'a>> {
    let result = single_primitive(input, function, false, schema)?
        .flatten()
        .and_then(|value| conversion(&value));
    Ok(result.map(Collection::of).unwrap_or_default())
}

fn converts<'a>(
    input: &Collection<'a>,
    function: &str,
    schema: &dyn SchemaReflector,
    conversion: fn(&Value<'a>) -> Option<Value<'a>>,
) -> Result<Collection<'a>> {
    let Some(value) = single_primitive(input, function, true, schema)? else {
        return Ok(Collection::empty());
    };
    let convertible = value.is_some_and(|value| conversion(&value).is_some());
    Ok(Collection::boolean(convertible))
}

fn boolean_value<'a>(value: &Value<'a>) -> Option<Value<'a>> {
    let result = match value {
        Value::Boolean(b) => *b,
        Value::Integer(1) => true,
        Value::Integer(0) => false,
        Value::Decimal(d) if *d == Decimal::ONE => true,
        Value::Decimal(d) if d.is_zero() => false,
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
            "false" | "f" | "no" | "n" | "0" | "0.0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Boolean(result))
}

fn integer_value<'a>(value: &Value<'a>) -> Option<Value<'a>> {
    match value {
        Value::Integer(i) => Some(Value::Integer(*i)),
        Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
        Value::String(s) => i32::from_str(s).ok().map(|i| Value::Integer(i64::from(i))),
        _ => None,
    }
}

fn decimal_value<'a>(value: &Value<'a>) -> Option<Value<'a>> {
    match value {
        Value::Decimal(d) => Some(Value::Decimal(*d)),
        Value::Integer(i) => Some(Value::Decimal(Decimal::from(*i))),
        Value::Boolean(b) => Some(Value::Decimal(if *b { Decimal::ONE } else { Decimal::ZERO })),
        Value::String(s) if !s.contains(['e', 'E']) => Decimal::from_str(s).ok().map(Value::Decimal),
        _ => None,
    }
}

fn string_value<'a>(value: &Value<'a>) -> Option<Value<'a>> {
    match value {
        Value::String(s) => Some(Value::String(s.clone())),
        Value::Node(_) => None,
        other => Some(Value::string(other.to_string())),
    }
}

pub(super) fn to_boolean<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    convert(input, "toBoolean", schema, boolean_value)
}

pub(super) fn converts_to_boolean<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    converts(input, "convertsToBoolean", schema, boolean_value)
}

pub(super) fn to_integer<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    convert(input, "toInteger", schema, integer_value)
}

pub(super) fn converts_to_integer<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    converts(input, "convertsToInteger", schema, integer_value)
}

pub(super) fn to_decimal<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    convert(input, "toDecimal", schema, decimal_value)
}

pub(super) fn converts_to_decimal<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    converts(input, "convertsToDecimal", schema, decimal_value)
}

pub(super) fn to_string<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    convert(input, "toString", schema, string_value)
}

pub(super) fn converts_to_string<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    converts(input, "convertsToString", schema, string_value)
}
