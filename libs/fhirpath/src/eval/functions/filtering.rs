//! Filtering and projection: `where()`, `select()` and `iif()`.
//!
//! Each binds `$this` to the element under consideration while its argument
//! is evaluated.

use crate::context::Context;
use crate::error::Result;
use crate::eval::evaluate;
use crate::eval::operators::truthiness;
use crate::expr::Expr;
use crate::value::Collection;

use super::argument;

pub(super) fn where_func<'a>(
    input: Collection<'a>,
    criteria: &Expr,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let mut result = Collection::empty();
    for item in input {
        let matched = ctx.with_this(item.clone(), |ctx| evaluate(criteria, ctx))?;
        if truthiness(&matched, "where", ctx.schema())? == Some(true) {
            result.push(item);
        }
    }
    Ok(result)
}

pub(super) fn select_func<'a>(
    input: Collection<'a>,
    projection: &Expr,
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let mut result = Collection::empty();
    for item in input {
        result.extend(ctx.with_this(item, |ctx| evaluate(projection, ctx))?);
    }
    Ok(result)
}

/// `iif(criterion, true-result [, otherwise-result])`. Only the taken branch
/// is evaluated.
pub(super) fn iif<'a>(
    input: Collection<'a>,
    args: &[Expr],
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let Some(item) = input.single("iif")?.cloned() else {
        return Ok(Collection::empty());
    };

    ctx.with_this(item, |ctx| {
        let criterion = evaluate(argument(args, 0)?, ctx)?;
        if truthiness(&criterion, "iif", ctx.schema())? == Some(true) {
            evaluate(argument(args, 1)?, ctx)
        } else if let Some(otherwise) = args.get(2) {
            evaluate(otherwise, ctx)
        } else {
            Ok(Collection::empty())
        }
    })
}
