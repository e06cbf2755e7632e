//! Tree-walking evaluator
//!
//! [`evaluate`] walks a compiled [`Expr`] against a [`Context`] and returns
//! the resulting collection. Operators live in [`operators`], builtin
//! functions in [`functions`].

pub(crate) mod functions;
pub(crate) mod operators;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::expr::{Expr, FieldBinding, TypeOperation};
use crate::node::Node;
use crate::schema::SchemaReflector;
use crate::types::TypeSpecifier;
use crate::value::{Collection, Item, Value};

/// Evaluate `expr` with the current `$this` of `ctx` as focus.
pub fn evaluate<'a>(expr: &Expr, ctx: &mut Context<'a, '_>) -> Result<Collection<'a>> {
    match expr {
        Expr::Literal(value) => Ok(Collection::of(value.clone())),

        Expr::Empty => Ok(Collection::empty()),

        Expr::Collection(elements) => {
            let mut result = Collection::empty();
            for element in elements {
                result.extend(evaluate(element, ctx)?);
            }
            Ok(result)
        }

        Expr::This => Ok(Collection::singleton(ctx.this().clone())),

        Expr::Context => Ok(Collection::singleton(ctx.root().clone())),

        Expr::Resource => ctx.resource(),

        Expr::Field {
            base,
            name,
            binding,
        } => {
            let input = evaluate(base, ctx)?;
            let schema = ctx.schema();
            let mut result = Collection::empty();
            for item in &input {
                navigate(item, name, binding, schema, &mut result);
            }
            Ok(result)
        }

        Expr::Index { base, index } => {
            let input = evaluate(base, ctx)?;
            let index = evaluate(index, ctx)?;
            let Some(index) = index.single("Indexer")? else {
                return Ok(Collection::empty());
            };
            let position = match index.value.primitive(ctx.schema()) {
                Some(Value::Integer(i)) => i,
                _ => {
                    return Err(Error::invalid(format!(
                        "Indexer requires an integer index, got {}",
                        index.value.type_label()
                    )))
                }
            };
            let item = usize::try_from(position)
                .ok()
                .and_then(|position| input.get(position));
            Ok(item.cloned().map(Collection::singleton).unwrap_or_default())
        }

        Expr::Polarity { operator, operand } => {
            let operand = evaluate(operand, ctx)?;
            operators::polarity(*operator, &operand, ctx.schema())
        }

        Expr::Binary {
            operator,
            left,
            right,
        } => operators::binary(*operator, left, right, ctx),

        Expr::TypeOp {
            operation,
            operand,
            type_specifier,
        } => {
            let input = evaluate(operand, ctx)?;
            type_operation(*operation, input, type_specifier, ctx.schema())
        }

        Expr::Call {
            function,
            base,
            args,
        } => functions::call(*function, base, args, ctx),
    }
}

/// Push the children named `name` of `item` onto `out`.
fn navigate<'a>(
    item: &Item<'a>,
    name: &str,
    binding: &FieldBinding,
    schema: &dyn SchemaReflector,
    out: &mut Collection<'a>,
) {
    let Some(node) = item.value.as_node() else {
        return;
    };
    match binding {
        FieldBinding::Static(internal) => push_children(item, node, internal, schema, out),
        FieldBinding::PrimitiveValue => out.push(item.clone()),
        FieldBinding::Dynamic => {
            if let Some(field) = schema.find_field(node.type_name(), name) {
                push_children(item, node, &field.name, schema, out);
            } else if name == "value" && node.value().is_some() {
                out.push(item.clone());
            }
        }
    }
}

/// Children of `node` under internal field `field`, with choice nodes
/// replaced by their set branch.
pub(crate) fn push_children<'a>(
    item: &Item<'a>,
    node: &'a Node,
    field: &str,
    schema: &dyn SchemaReflector,
    out: &mut Collection<'a>,
) {
    for child in node.field(field) {
        let child_item = item.child(node, child);
        if schema.is_choice(child.type_name()) {
            if let Some(branch) = child.choice_branch() {
                out.push(child_item.child(child, branch));
            }
        } else {
            out.push(child_item);
        }
    }
}

fn type_operation<'a>(
    operation: TypeOperation,
    input: Collection<'a>,
    type_specifier: &TypeSpecifier,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    match operation {
        TypeOperation::Is => {
            let Some(item) = input.single("is")? else {
                return Ok(Collection::empty());
            };
            Ok(Collection::boolean(type_specifier.matches(&item.value, schema)))
        }
        TypeOperation::As => {
            let Some(item) = input.single("as")? else {
                return Ok(Collection::empty());
            };
            if type_specifier.matches(&item.value, schema) {
                Ok(Collection::singleton(item.clone()))
            } else {
                Ok(Collection::empty())
            }
        }
        TypeOperation::OfType => Ok(input
            .into_iter()
            .filter(|item| type_specifier.matches(&item.value, schema))
            .collect()),
    }
}
