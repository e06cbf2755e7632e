//! Builtin function implementations
//!
//! Functions are organized by category in submodules. [`call`] evaluates the
//! input collection, then either hands the unevaluated arguments to the
//! functions that bind `$this` per element, or evaluates the arguments in the
//! caller's scope and dispatches.

mod combining;
mod conversion;
mod existence;
mod filtering;
mod navigation;
mod string;
mod subsetting;
mod utility;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::functions::Function;
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

use super::evaluate;

/// Execute a builtin call.
pub(crate) fn call<'a>(
    function: Function,
    base: &Expr,
    args: &[Expr],
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let input = evaluate(base, ctx)?;

    match function {
        Function::Where => filtering::where_func(input, argument(args, 0)?, ctx),
        Function::Select => filtering::select_func(input, argument(args, 0)?, ctx),
        Function::All => existence::all(input, argument(args, 0)?, ctx),
        Function::Exists => existence::exists(input, args.first(), ctx),
        Function::Iif => filtering::iif(input, args, ctx),
        Function::Trace => utility::trace(input, args, ctx),
        _ => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>>>()?;
            dispatch(function, input, &args, ctx.schema())
        }
    }
}

fn dispatch<'a>(
    function: Function,
    input: Collection<'a>,
    args: &[Collection<'a>],
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    match function {
        // Existence
        Function::Empty => Ok(Collection::boolean(input.is_empty())),
        Function::Count => Ok(Collection::of(Value::Integer(input.len() as i64))),
        Function::Distinct => Ok(input.distinct(schema)),
        Function::IsDistinct => existence::is_distinct(input, schema),
        Function::AllTrue => existence::all_true(&input, schema),
        Function::AnyTrue => existence::any_true(&input, schema),
        Function::AllFalse => existence::all_false(&input, schema),
        Function::AnyFalse => existence::any_false(&input, schema),
        Function::HasValue => utility::has_value(&input),

        // Subsetting
        Function::Single => subsetting::single(input),
        Function::First => subsetting::first(input),
        Function::Last => subsetting::last(input),
        Function::Tail => subsetting::tail(input),
        Function::Skip => subsetting::skip(input, argument(args, 0)?, schema),
        Function::Take => subsetting::take(input, argument(args, 0)?, schema),
        Function::Intersect => subsetting::intersect(input, argument(args, 0)?, schema),

        // Combining
        Function::Union => combining::union_func(input, argument(args, 0)?.clone(), schema),
        Function::Combine => combining::combine(input, argument(args, 0)?.clone()),

        // Strings
        Function::IndexOf => string::index_of(&input, argument(args, 0)?, schema),
        Function::StartsWith => string::starts_with(&input, argument(args, 0)?, schema),
        Function::EndsWith => string::ends_with(&input, argument(args, 0)?, schema),
        Function::Contains => string::contains_str(&input, argument(args, 0)?, schema),
        Function::Upper => string::upper(&input, schema),
        Function::Lower => string::lower(&input, schema),
        Function::Length => string::length(&input, schema),
        Function::Matches => string::matches(&input, argument(args, 0)?, schema),
        Function::Replace => {
            string::replace(&input, argument(args, 0)?, argument(args, 1)?, schema)
        }
        Function::ReplaceMatches => {
            string::replace_matches(&input, argument(args, 0)?, argument(args, 1)?, schema)
        }

        // Conversion
        Function::ToBoolean => conversion::to_boolean(&input, schema),
        Function::ConvertsToBoolean => conversion::converts_to_boolean(&input, schema),
        Function::ToInteger => conversion::to_integer(&input, schema),
        Function::ConvertsToInteger => conversion::converts_to_integer(&input, schema),
        Function::ToDecimal => conversion::to_decimal(&input, schema),
        Function::ConvertsToDecimal => conversion::converts_to_decimal(&input, schema),
        Function::ToString => conversion::to_string(&input, schema),
        Function::ConvertsToString => conversion::converts_to_string(&input, schema),

        // Tree navigation
        Function::Children => Ok(navigation::children(&input, schema)),
        Function::Descendants => Ok(navigation::descendants(&input, schema)),

        Function::Not => utility::not(&input, schema),

        Function::Where
        | Function::Select
        | Function::All
        | Function::Exists
        | Function::Iif
        | Function::Trace
        | Function::Is
        | Function::As
        | Function::OfType => Err(Error::Internal(format!(
            "{function:?} is not dispatched on evaluated arguments"
        ))),
    }
}

/// Argument at `index`; arity is checked at compile time.
fn argument<T>(args: &[T], index: usize) -> Result<&T> {
    args.get(index)
        .ok_or_else(|| Error::Internal(format!("missing argument {index}")))
}

/// The single string of `input`: `None` when empty, an error for more than
/// one element or a non-string element.
fn single_string(
    input: &Collection<'_>,
    function: &str,
    schema: &dyn SchemaReflector,
) -> Result<Option<std::sync::Arc<str>>> {
    let Some(item) = input.single(function)? else {
        return Ok(None);
    };
    item.value.as_str(schema).map(Some).ok_or_else(|| {
        Error::invalid(format!(
            "{function}() requires a string, got {}",
            item.value.type_label()
        ))
    })
}

/// A single integer argument.
fn integer_argument(arg: &Collection<'_>, function: &str, schema: &dyn SchemaReflector) -> Result<i64> {
    match arg.single(function)?.and_then(|item| item.value.primitive(schema)) {
        Some(Value::Integer(i)) => Ok(i),
        _ => Err(Error::invalid(format!(
            "{function}() requires a single integer argument"
        ))),
    }
}
