//! FHIRPath operators
//!
//! Equality, comparison, membership, arithmetic, string concatenation and
//! three-valued boolean logic. Numeric operands promote integer to decimal;
//! decimal arithmetic is exact.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ast::{BinaryOperator, PolarityOperator};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::schema::SchemaReflector;
use crate::temporal::{compare_date_times, compare_times};
use crate::value::{Collection, Item, Quantity, Value};

use super::evaluate;

pub(crate) fn binary<'a>(
    operator: BinaryOperator,
    left: &Expr,
    right: &Expr,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    use BinaryOperator::*;

    if matches!(operator, And | Or | Xor | Implies) {
        return logic(operator, left, right, ctx);
    }

    let left = evaluate(left, ctx)?;
    let right = evaluate(right, ctx)?;
    let schema = ctx.schema();

    match operator {
        Equal => Ok(equal(&left, &right, schema).map(Collection::boolean).unwrap_or_default()),
        NotEqual => Ok(equal(&left, &right, schema)
            .map(|eq| Collection::boolean(!eq))
            .unwrap_or_default()),
        Equivalent => Ok(Collection::boolean(equivalent(&left, &right, schema))),
        NotEquivalent => Ok(Collection::boolean(!equivalent(&left, &right, schema))),

        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let (Some(a), Some(b)) = (
                left.single(operator.symbol())?,
                right.single(operator.symbol())?,
            ) else {
                return Ok(Collection::empty());
            };
            let Some(ordering) = compare(&a.value, &b.value, schema)? else {
                return Ok(Collection::empty());
            };
            let result = match operator {
                LessThan => ordering == Ordering::Less,
                LessThanOrEqual => ordering != Ordering::Greater,
                GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Collection::boolean(result))
        }

        In => membership(&left, &right, "in", schema),
        Contains => membership(&right, &left, "contains", schema),

        Union => {
            let mut result = left;
            result.extend(right);
            Ok(result.distinct(schema))
        }

        Concat => {
            let mut text = String::new();
            for side in [&left, &right] {
                if let Some(item) = side.single("&")? {
                    let part = item.value.as_str(schema).ok_or_else(|| {
                        Error::invalid(format!(
                            "& requires string operands, got {}",
                            item.value.type_label()
                        ))
                    })?;
                    text.push_str(&part);
                }
            }
            Ok(Collection::of(Value::string(text)))
        }

        Add | Subtract | Multiply | Divide | Div | Mod => {
            let (Some(a), Some(b)) = (
                left.single(operator.symbol())?,
                right.single(operator.symbol())?,
            ) else {
                return Ok(Collection::empty());
            };
            let result = arithmetic(operator, &a.value, &b.value, schema)?;
            Ok(result.map(Collection::of).unwrap_or_default())
        }

        And | Or | Xor | Implies => Err(Error::Internal(format!(
            "'{}' evaluates its operands lazily",
            operator.symbol()
        ))),
    }
}

/// Singleton boolean reading for logic operators: `None` for empty, the
/// boolean for a boolean and `true` for any other single value.
pub(crate) fn truthiness(
    collection: &Collection<'_>,
    operation: &str,
    schema: &dyn SchemaReflector,
) -> Result<Option<bool>> {
    Ok(collection
        .single(operation)?
        .map(|item| match item.value.primitive(schema) {
            Some(Value::Boolean(b)) => b,
            _ => true,
        }))
}

/// Three-valued logic. `and`, `or` and `implies` skip the right operand when
/// the left one decides the result.
fn logic<'a>(
    operator: BinaryOperator,
    left: &Expr,
    right: &Expr,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let symbol = operator.symbol();
    let left = evaluate(left, ctx)?;
    let left = truthiness(&left, symbol, ctx.schema())?;

    let decided = match (operator, left) {
        (BinaryOperator::And, Some(false)) => Some(false),
        (BinaryOperator::Or, Some(true)) => Some(true),
        (BinaryOperator::Implies, Some(false)) => Some(true),
        _ => None,
    };
    if let Some(result) = decided {
        return Ok(Collection::boolean(result));
    }

    let right = evaluate(right, ctx)?;
    let right = truthiness(&right, symbol, ctx.schema())?;

    let result = match operator {
        BinaryOperator::And => match (left, right) {
            (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (left, right) {
            (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BinaryOperator::Xor => match (left, right) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        },
        _ => match (left, right) {
            (_, Some(true)) => Some(true),
            (Some(true), right) => right,
            _ => None,
        },
    };
    Ok(result.map(Collection::boolean).unwrap_or_default())
}

/// `=`: `None` when either side is empty.
pub(crate) fn equal(
    left: &Collection<'_>,
    right: &Collection<'_>,
    schema: &dyn SchemaReflector,
) -> Option<bool> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    if left.len() != right.len() {
        return Some(false);
    }
    Some(
        left.values()
            .zip(right.values())
            .all(|(a, b)| a.equals(b, schema)),
    )
}

/// `~`: order-insensitive, and two empty collections are equivalent.
fn equivalent(left: &Collection<'_>, right: &Collection<'_>, schema: &dyn SchemaReflector) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut matched = vec![false; right.len()];
    left.values().all(|a| {
        let found = right
            .values()
            .enumerate()
            .find(|(i, b)| !matched[*i] && a.equivalent(b, schema));
        match found {
            Some((i, _)) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}

/// `item in collection`
fn membership<'a>(
    item: &Collection<'a>,
    collection: &Collection<'a>,
    operation: &str,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let Some(item) = item.single(operation)? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::boolean(collection.contains_value(&item.value, schema)))
}

/// Order of two single values. `None` when temporal precisions leave the
/// order undetermined; incomparable kinds are an error.
pub(crate) fn compare(
    a: &Value<'_>,
    b: &Value<'_>,
    schema: &dyn SchemaReflector,
) -> Result<Option<Ordering>> {
    let incomparable = || {
        Error::invalid(format!(
            "Cannot compare {} with {}",
            a.type_label(),
            b.type_label()
        ))
    };
    let (x, y) = match (a.primitive(schema), b.primitive(schema)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(incomparable()),
    };

    let ordering = match (&x, &y) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
            Some(to_decimal(&x).cmp(&to_decimal(&y)))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Quantity(x), Value::Quantity(y)) => {
            if !x.same_unit(y) {
                return Err(Error::invalid(format!(
                    "Cannot compare quantities with different units: {x} and {y}"
                )));
            }
            Some(x.value.cmp(&y.value))
        }
        (Value::Date(x) | Value::DateTime(x), Value::Date(y) | Value::DateTime(y)) => {
            compare_date_times(x, y)
        }
        (Value::Time(x), Value::Time(y)) => compare_times(x, y),
        _ => return Err(incomparable()),
    };
    Ok(ordering)
}

fn to_decimal(value: &Value<'_>) -> Decimal {
    match value {
        Value::Integer(i) => Decimal::from(*i),
        Value::Decimal(d) => *d,
        _ => Decimal::ZERO,
    }
}

fn overflow(operator: BinaryOperator) -> Error {
    Error::invalid(format!("Arithmetic overflow in '{}'", operator.symbol()))
}

/// Arithmetic on two single values. `None` for division by zero.
fn arithmetic<'a>(
    operator: BinaryOperator,
    a: &Value<'a>,
    b: &Value<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Option<Value<'a>>> {
    use BinaryOperator::*;

    let unsupported = || {
        Error::invalid(format!(
            "Operator '{}' is not defined for {} and {}",
            operator.symbol(),
            a.type_label(),
            b.type_label()
        ))
    };
    let (x, y) = match (a.primitive(schema), b.primitive(schema)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(unsupported()),
    };

    match (&x, &y) {
        (Value::Integer(x), Value::Integer(y)) => {
            let (x, y) = (*x, *y);
            let result = match operator {
                Add => x.checked_add(y).ok_or_else(|| overflow(operator))?,
                Subtract => x.checked_sub(y).ok_or_else(|| overflow(operator))?,
                Multiply => x.checked_mul(y).ok_or_else(|| overflow(operator))?,
                Divide => {
                    return Ok(Decimal::from(x)
                        .checked_div(Decimal::from(y))
                        .map(Value::Decimal))
                }
                Div if y == 0 => return Ok(None),
                Div => x.checked_div(y).ok_or_else(|| overflow(operator))?,
                Mod if y == 0 => return Ok(None),
                Mod => x.checked_rem(y).ok_or_else(|| overflow(operator))?,
                _ => return Err(unsupported()),
            };
            Ok(Some(Value::Integer(result)))
        }

        (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
            let (x, y) = (to_decimal(&x), to_decimal(&y));
            let result = match operator {
                Add => x.checked_add(y).ok_or_else(|| overflow(operator))?,
                Subtract => x.checked_sub(y).ok_or_else(|| overflow(operator))?,
                Multiply => x.checked_mul(y).ok_or_else(|| overflow(operator))?,
                Divide | Div | Mod if y.is_zero() => return Ok(None),
                Divide => x.checked_div(y).ok_or_else(|| overflow(operator))?,
                Div => {
                    let quotient = x.checked_div(y).ok_or_else(|| overflow(operator))?;
                    let truncated = quotient.trunc().to_i64().ok_or_else(|| overflow(operator))?;
                    return Ok(Some(Value::Integer(truncated)));
                }
                Mod => x.checked_rem(y).ok_or_else(|| overflow(operator))?,
                _ => return Err(unsupported()),
            };
            Ok(Some(Value::Decimal(result)))
        }

        (Value::String(x), Value::String(y)) if operator == Add => {
            Ok(Some(Value::string(format!("{x}{y}"))))
        }

        (Value::Quantity(x), Value::Quantity(y)) if matches!(operator, Add | Subtract) => {
            if !x.same_unit(y) {
                return Err(Error::invalid(format!(
                    "Cannot combine quantities with different units: {x} and {y}"
                )));
            }
            let value = if operator == Add {
                x.value.checked_add(y.value)
            } else {
                x.value.checked_sub(y.value)
            }
            .ok_or_else(|| overflow(operator))?;
            Ok(Some(Value::Quantity(Quantity { value, ..x.clone() })))
        }

        _ => Err(unsupported()),
    }
}

/// Unary `+` and `-`.
pub(crate) fn polarity<'a>(
    operator: PolarityOperator,
    operand: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let Some(item) = operand.single("unary operator")? else {
        return Ok(Collection::empty());
    };
    let value = match item.value.primitive(schema) {
        Some(value @ (Value::Integer(_) | Value::Decimal(_) | Value::Quantity(_)))
            if operator == PolarityOperator::Plus =>
        {
            value
        }
        Some(Value::Integer(i)) => Value::Integer(
            i.checked_neg()
                .ok_or_else(|| Error::invalid("Arithmetic overflow in unary '-'"))?,
        ),
        Some(Value::Decimal(d)) => Value::Decimal(-d),
        Some(Value::Quantity(q)) => Value::Quantity(Quantity {
            value: -q.value,
            ..q
        }),
        _ => {
            return Err(Error::invalid(format!(
                "Unary operator is not defined for {}",
                item.value.type_label()
            )))
        }
    };
    Ok(Collection::singleton(Item::detached(value)))
}
