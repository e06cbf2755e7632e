//! Utility functions: `not()`, `hasValue()` and `trace()`.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::evaluate;
use crate::eval::operators::truthiness;
use crate::expr::Expr;
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

use super::{argument, single_string};

pub(super) fn not<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    Ok(truthiness(input, "not", schema)?
        .map(|b| Collection::boolean(!b))
        .unwrap_or_default())
}

/// `true` for a single primitive element that carries a value.
pub(super) fn has_value<'a>(input: &Collection<'a>) -> Result<Collection<'a>> {
    let has_value = match input.single("hasValue") {
        Ok(Some(item)) => match &item.value {
            Value::Node(node) => node.value().is_some(),
            Value::Quantity(_) => false,
            _ => true,
        },
        _ => false,
    };
    Ok(Collection::boolean(has_value))
}

/// `trace(name [, projection])` logs the input (or the projection of each
/// element) and returns the input unchanged.
pub(super) fn trace<'a>(
    input: Collection<'a>,
    args: &[Expr],
    ctx: &mut Context<'a, '_>,
) -> Result<Collection<'a>> {
    let name = evaluate(argument(args, 0)?, ctx)?;
    let name = single_string(&name, "trace", ctx.schema())?
        .ok_or_else(|| Error::invalid("trace() requires a name"))?;

    let logged = match args.get(1) {
        Some(projection) => {
            let mut projected = Collection::empty();
            for item in &input {
                projected.extend(ctx.with_this(item.clone(), |ctx| evaluate(projection, ctx))?);
            }
            projected
        }
        None => input.clone(),
    };

    let rendered = logged
        .values()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    tracing::info!(target: "fhirpath::trace", name = %name, count = logged.len(), "[{rendered}]");
    Ok(input)
}
