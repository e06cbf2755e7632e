//! Combining functions: `union()` and `combine()`.

use crate::error::Result;
use crate::schema::SchemaReflector;
use crate::value::Collection;

/// Same as the `|` operator: concatenation without duplicates.
pub(super) fn union_func<'a>(
    mut input: Collection<'a>,
    other: Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    input.extend(other);
    Ok(input.distinct(schema))
}

/// Concatenation keeping duplicates.
pub(super) fn combine<'a>(mut input: Collection<'a>, other: Collection<'a>) -> Result<Collection<'a>> {
    input.extend(other);
    Ok(input)
}
