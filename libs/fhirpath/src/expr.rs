//! Compiled expression tree
//!
//! The compiler lowers the AST into this tree with every name resolved:
//! fields are bound to schema fields where the input type is statically
//! known, functions to [`Function`], type names to [`TypeSpecifier`] and
//! external constants to literals or context nodes. The tree is immutable and
//! shared between threads; literal values never borrow a record.

use crate::ast::{BinaryOperator, PolarityOperator};
use crate::functions::Function;
use crate::types::TypeSpecifier;
use crate::value::Value;

/// Compiled expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Singleton literal.
    Literal(Value<'static>),

    /// `{}`
    Empty,

    /// `{ a, b }`: the elements' results concatenated.
    Collection(Vec<Expr>),

    /// `$this`, also the implicit base of unqualified names and functions.
    This,

    /// `%context`
    Context,

    /// `%resource`
    Resource,

    /// Children of a field of every base element.
    Field {
        base: Box<Expr>,
        name: String,
        binding: FieldBinding,
    },

    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },

    Polarity {
        operator: PolarityOperator,
        operand: Box<Expr>,
    },

    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `is`, `as` and `ofType`, in operator or function form.
    TypeOp {
        operation: TypeOperation,
        operand: Box<Expr>,
        type_specifier: TypeSpecifier,
    },

    /// Builtin call. `base` is the input collection, `$this` when the call
    /// has no explicit target.
    Call {
        function: Function,
        base: Box<Expr>,
        args: Vec<Expr>,
    },
}

/// How a field name was bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBinding {
    /// Schema field with this internal name on a statically known type.
    Static(String),
    /// `value` on a primitive: the primitive itself.
    PrimitiveValue,
    /// Resolved per element at evaluation time; elements without such a field
    /// contribute nothing.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperation {
    Is,
    As,
    OfType,
}

impl Expr {
    pub(crate) fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }
}
