//! Tree navigation: `children()` and `descendants()`.
//!
//! Children are visited in schema declaration order, repeated fields in
//! element order, choice fields as their set branch.

use crate::eval::push_children;
use crate::schema::SchemaReflector;
use crate::value::{Collection, Item};

fn item_children<'a>(item: &Item<'a>, schema: &dyn SchemaReflector, out: &mut Collection<'a>) {
    let Some(node) = item.value.as_node() else {
        return;
    };
    let Some(descriptor) = schema.describe(node.type_name()) else {
        return;
    };
    for field in &descriptor.fields {
        push_children(item, node, &field.name, schema, out);
    }
}

pub(super) fn children<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Collection<'a> {
    let mut result = Collection::empty();
    for item in input {
        item_children(item, schema, &mut result);
    }
    result
}

/// Pre-order walk below every input element.
pub(super) fn descendants<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Collection<'a> {
    let mut result = Collection::empty();
    for item in input {
        collect_descendants(item, schema, &mut result);
    }
    result
}

fn collect_descendants<'a>(item: &Item<'a>, schema: &dyn SchemaReflector, out: &mut Collection<'a>) {
    let mut direct = Collection::empty();
    item_children(item, schema, &mut direct);
    for child in direct {
        out.push(child.clone());
        collect_descendants(&child, schema, out);
    }
}
