//! Abstract Syntax Tree (AST) representation
//!
//! The AST mirrors the FHIRPath grammar without any schema knowledge. Binary
//! operators of every precedence level share one node shape; the parser
//! encodes precedence in the tree structure.
//!
//! ```text
//! expression : term
//!            | expression '.' invocation
//!            | expression '[' expression ']'
//!            | ('+' | '-') expression
//!            | expression op expression
//!            | expression ('is' | 'as') typeSpecifier
//! term       : invocation | literal | '%' constant | '(' expression ')'
//! invocation : identifier | identifier '(' params? ')' | '$this'
//! ```

use rust_decimal::Decimal;

use crate::temporal::{PartialDateTime, PartialTime};

/// AST node representing a FHIRPath expression
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // ============================================
    // Terms
    // ============================================
    Literal(Literal),

    /// `{ a, b }` collection literal; `{}` is [`Literal::Empty`].
    Collection(Vec<AstNode>),

    /// `%name`, `%'name'` or ``%`name` ``
    ExternalConstant(String),

    /// `$this`
    This,

    /// Identifier, either at the start of a path or after a `.`.
    Member(String),

    /// `name(args)`, either at the start of a path or after a `.`.
    Function { name: String, args: Vec<AstNode> },

    // ============================================
    // Expressions
    // ============================================
    /// `target '.' invocation`, where `invocation` is a `Member`, `Function`
    /// or `This` node.
    Invocation {
        target: Box<AstNode>,
        invocation: Box<AstNode>,
    },

    /// `collection '[' index ']'`
    Indexer {
        collection: Box<AstNode>,
        index: Box<AstNode>,
    },

    /// `('+' | '-') operand`
    Polarity {
        operator: PolarityOperator,
        operand: Box<AstNode>,
    },

    Binary {
        left: Box<AstNode>,
        operator: BinaryOperator,
        right: Box<AstNode>,
    },

    /// `operand ('is' | 'as') type`
    Type {
        operand: Box<AstNode>,
        operator: TypeOperator,
        type_name: QualifiedIdentifier,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `{}`
    Empty,
    Boolean(bool),
    /// Integer literals are range-checked against 32 bits by the parser.
    Integer(i64),
    /// Keeps the scale it was written with.
    Decimal(Decimal),
    String(String),
    Date(PartialDateTime),
    DateTime(PartialDateTime),
    Time(PartialTime),
    /// `4 'mg'` (UCUM unit) or `2 days` (calendar unit)
    Quantity {
        value: Decimal,
        unit: String,
        calendar: bool,
    },
}

/// Qualified identifier: identifier ('.' identifier)*
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedIdentifier {
    pub parts: Vec<String>,
}

impl QualifiedIdentifier {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    pub fn name(&self) -> String {
        self.parts.join(".")
    }
}

// ============================================
// Operator types
// ============================================

/// Polarity operator: '+' | '-'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityOperator {
    Plus,
    Minus,
}

/// Type operator: 'is' | 'as'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Is,
    As,
}

/// Binary operators, loosest binding last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Multiplicative
    Multiply, // *
    Divide,   // /
    Div,      // div
    Mod,      // mod

    // Additive
    Add,      // +
    Subtract, // -
    Concat,   // &

    Union, // |

    // Inequality
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=

    // Equality
    Equal,         // =
    Equivalent,    // ~
    NotEqual,      // !=
    NotEquivalent, // !~

    // Membership
    In,       // in
    Contains, // contains

    And,
    Or,
    Xor,
    Implies,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Concat => "&",
            BinaryOperator::Union => "|",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Equal => "=",
            BinaryOperator::Equivalent => "~",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::NotEquivalent => "!~",
            BinaryOperator::In => "in",
            BinaryOperator::Contains => "contains",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Implies => "implies",
        }
    }
}
