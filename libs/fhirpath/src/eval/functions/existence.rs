//! Existence functions: `exists()`, `all()`, `isDistinct()` and the boolean
//! aggregates `allTrue()`, `anyTrue()`, `allFalse()`, `anyFalse()`.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::evaluate;
use crate::eval::operators::truthiness;
use crate::expr::Expr;
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

pub(super) fn exists<'a>(
    input: Collection<'a>,
    criteria: Option<&Expr>,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let Some(criteria) = criteria else {
        return Ok(Collection::boolean(!input.is_empty()));
    };
    for item in input {
        let result = ctx.with_this(item, |ctx| evaluate(criteria, ctx))?;
        if truthiness(&result, "exists", ctx.schema())? == Some(true) {
            return Ok(Collection::boolean(true));
        }
    }
    Ok(Collection::boolean(false))
}

/// `true` when the criteria holds for every element, including for no
/// elements at all.
pub(super) fn all<'a>(
    input: Collection<'a>,
    criteria: &Expr,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    for item in input {
        let result = ctx.with_this(item, |ctx| evaluate(criteria, ctx))?;
        if truthiness(&result, "all", ctx.schema())? != Some(true) {
            return Ok(Collection::boolean(false));
        }
    }
    Ok(Collection::boolean(true))
}

pub(super) fn is_distinct<'a>(
    input: Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let len = input.len();
    Ok(Collection::boolean(input.distinct(schema).len() == len))
}

fn booleans(
    input: &Collection<'_>,
    function: &str,
    schema: &dyn SchemaReflector,
) -> Result<Vec<bool>> {
    input
        .values()
        .map(|value| match value.primitive(schema) {
            Some(Value::Boolean(b)) => Ok(b),
            _ => Err(Error::invalid(format!(
                "{function}() requires boolean elements, got {}",
                value.type_label()
            ))),
        })
        .collect()
}

pub(super) fn all_true<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    let values = booleans(input, "allTrue", schema)?;
    Ok(Collection::boolean(values.iter().all(|b| *b)))
}

pub(super) fn any_true<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    let values = booleans(input, "anyTrue", schema)?;
    Ok(Collection::boolean(values.iter().any(|b| *b)))
}

pub(super) fn all_false<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    let values = booleans(input, "allFalse", schema)?;
    Ok(Collection::boolean(values.iter().all(|b| !*b)))
}

pub(super) fn any_false<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    let values = booleans(input, "anyFalse", schema)?;
    Ok(Collection::boolean(values.iter().any(|b| !*b)))
}
