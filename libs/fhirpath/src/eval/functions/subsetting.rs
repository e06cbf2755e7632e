//! Subsetting functions: `single()`, `first()`, `last()`, `tail()`,
//! `skip()`, `take()` and `intersect()`.

use crate::error::{Error, Result};
use crate::schema::SchemaReflector;
use crate::value::Collection;

use super::integer_argument;

pub(super) fn single(input: Collection<'_>) -> Result<Collection<'_>> {
    if input.len() > 1 {
        return Err(Error::FailedPrecondition(format!(
            "single() called on a collection of {} elements",
            input.len()
        )));
    }
    Ok(input)
}

pub(super) fn first(input: Collection<'_>) -> Result<Collection<'_>> {
    Ok(input.into_iter().take(1).collect())
}

pub(super) fn last(input: Collection<'_>) -> Result<Collection<'_>> {
    let mut items = input.into_items();
    let last = items.pop();
    Ok(last.into_iter().collect())
}

pub(super) fn tail(input: Collection<'_>) -> Result<Collection<'_>> {
    Ok(input.into_iter().skip(1).collect())
}

pub(super) fn skip<'a>(
    input: Collection<'a>,
    count: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let count = integer_argument(count, "skip", schema)?;
    let count = usize::try_from(count).unwrap_or(0);
    Ok(input.into_iter().skip(count).collect())
}

pub(super) fn take<'a>(
    input: Collection<'a>,
    count: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let count = integer_argument(count, "take", schema)?;
    let count = usize::try_from(count).unwrap_or(0);
    Ok(input.into_iter().take(count).collect())
}

/// Elements present in both collections, without duplicates.
pub(super) fn intersect<'a>(
    input: Collection<'a>,
    other: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let common: Collection<'a> = input
        .into_iter()
        .filter(|item| other.contains_value(&item.value, schema))
        .collect();
    Ok(common.distinct(schema))
}
