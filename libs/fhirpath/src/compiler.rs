//! Compiler: AST → [`Expr`]
//!
//! Binds the syntax tree to the schema. The compiler tracks a static type for
//! every sub-expression so that field names can be checked against the
//! schema where the input type is known:
//!
//! - a single known record type binds fields statically and rejects unknown
//!   names with `NotFound`;
//! - unions of different types, choice fields and polymorphic function
//!   results bind dynamically, per element, at evaluation time;
//! - system-typed values (literals, arithmetic) have no fields at all.

use std::sync::Arc;

use phf::phf_map;

use crate::ast::{AstNode, BinaryOperator, Literal, QualifiedIdentifier, TypeOperator};
use crate::error::{Error, Result};
use crate::expr::{Expr, FieldBinding, TypeOperation};
use crate::functions::{resolve_function, Function, ResultType};
use crate::schema::SchemaReflector;
use crate::temporal::Precision;
use crate::types::{TypeId, TypeSpecifier};
use crate::value::{Quantity, Value, UCUM_SYSTEM};

/// External constants that compile to string literals.
static CONSTANTS: phf::Map<&'static str, &'static str> = phf_map! {
    "ucum" => UCUM_SYSTEM,
    "sct" => "http://snomed.info/sct",
    "loinc" => "http://loinc.org",
};

/// Static type of a sub-expression's elements.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StaticType {
    /// Every element is a record node of this schema type.
    Record(Arc<str>),
    /// Every element is a computed system value.
    System(TypeId),
    /// Always empty.
    Empty,
    /// Mixed or data-dependent.
    Unknown,
}

impl StaticType {
    fn merge(self, other: StaticType) -> StaticType {
        match (self, other) {
            (StaticType::Empty, other) | (other, StaticType::Empty) => other,
            (a, b) if a == b => a,
            _ => StaticType::Unknown,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            StaticType::System(TypeId::Integer) | StaticType::System(TypeId::Decimal)
        )
    }
}

/// Compile `ast` for records of type `root_type`.
pub fn compile_ast(schema: &dyn SchemaReflector, root_type: &str, ast: &AstNode) -> Result<Expr> {
    if schema.describe(root_type).is_none() {
        return Err(Error::NotFound(format!("Unknown root type '{root_type}'")));
    }
    let mut compiler = Compiler {
        schema,
        this_types: vec![StaticType::Record(Arc::from(root_type))],
    };
    let (expr, _) = compiler.compile_node(ast)?;
    Ok(expr)
}

struct Compiler<'s> {
    schema: &'s dyn SchemaReflector,
    /// Static type of `$this`, innermost scope last.
    this_types: Vec<StaticType>,
}

impl Compiler<'_> {
    fn this_type(&self) -> StaticType {
        self.this_types.last().cloned().unwrap_or(StaticType::Unknown)
    }

    fn compile_node(&mut self, node: &AstNode) -> Result<(Expr, StaticType)> {
        match node {
            AstNode::Literal(literal) => self.compile_literal(literal),

            AstNode::Collection(elements) => {
                let mut exprs = Vec::with_capacity(elements.len());
                let mut ty = StaticType::Empty;
                for element in elements {
                    let (expr, element_ty) = self.compile_node(element)?;
                    exprs.push(expr);
                    ty = ty.merge(element_ty);
                }
                Ok((Expr::Collection(exprs), ty))
            }

            AstNode::ExternalConstant(name) => self.compile_constant(name),

            AstNode::This => Ok((Expr::This, self.this_type())),

            AstNode::Member(name) => self.compile_field(Expr::This, self.this_type(), name, true),

            AstNode::Function { name, args } => {
                self.compile_call(Expr::This, self.this_type(), name, args)
            }

            AstNode::Invocation { target, invocation } => {
                let (base, base_ty) = self.compile_node(target)?;
                match invocation.as_ref() {
                    AstNode::Member(name) => self.compile_field(base, base_ty, name, false),
                    AstNode::Function { name, args } => self.compile_call(base, base_ty, name, args),
                    AstNode::This => Ok((base, base_ty)),
                    other => Err(Error::Internal(format!("invalid invocation {other:?}"))),
                }
            }

            AstNode::Indexer { collection, index } => {
                let (base, ty) = self.compile_node(collection)?;
                let (index, _) = self.compile_node(index)?;
                Ok((
                    Expr::Index {
                        base: base.boxed(),
                        index: index.boxed(),
                    },
                    ty,
                ))
            }

            AstNode::Polarity { operator, operand } => {
                let (operand, ty) = self.compile_node(operand)?;
                let ty = match ty {
                    StaticType::System(_) | StaticType::Empty => ty,
                    _ => StaticType::Unknown,
                };
                Ok((
                    Expr::Polarity {
                        operator: *operator,
                        operand: operand.boxed(),
                    },
                    ty,
                ))
            }

            AstNode::Binary {
                left,
                operator,
                right,
            } => {
                let (left, left_ty) = self.compile_node(left)?;
                let (right, right_ty) = self.compile_node(right)?;
                let ty = binary_result_type(*operator, left_ty, right_ty);
                Ok((
                    Expr::Binary {
                        operator: *operator,
                        left: left.boxed(),
                        right: right.boxed(),
                    },
                    ty,
                ))
            }

            AstNode::Type {
                operand,
                operator,
                type_name,
            } => {
                let (operand, operand_ty) = self.compile_node(operand)?;
                let operation = match operator {
                    TypeOperator::Is => TypeOperation::Is,
                    TypeOperator::As => TypeOperation::As,
                };
                self.type_operation(operation, operand, operand_ty, &type_name.name())
            }
        }
    }

    fn compile_literal(&self, literal: &Literal) -> Result<(Expr, StaticType)> {
        let (value, id) = match literal {
            Literal::Empty => return Ok((Expr::Empty, StaticType::Empty)),
            Literal::Boolean(b) => (Value::Boolean(*b), TypeId::Boolean),
            Literal::Integer(i) => (Value::Integer(*i), TypeId::Integer),
            Literal::Decimal(d) => (Value::Decimal(*d), TypeId::Decimal),
            Literal::String(s) => (Value::string(s.as_str()), TypeId::String),
            Literal::Date(d) => (Value::Date(*d), TypeId::Date),
            Literal::DateTime(dt) => {
                if matches!(dt.precision(), Precision::Hour | Precision::Minute) {
                    return Err(Error::Unimplemented(format!(
                        "DateTime literal @{dt} at {:?} precision",
                        dt.precision()
                    )));
                }
                (Value::DateTime(*dt), TypeId::DateTime)
            }
            Literal::Time(t) => (Value::Time(*t), TypeId::Time),
            Literal::Quantity {
                value,
                unit,
                calendar,
            } => (
                Value::Quantity(Quantity {
                    value: *value,
                    code: Some(Arc::from(unit.as_str())),
                    system: (!calendar).then(|| Arc::from(UCUM_SYSTEM)),
                }),
                TypeId::Quantity,
            ),
        };
        Ok((Expr::Literal(value), StaticType::System(id)))
    }

    fn compile_constant(&self, name: &str) -> Result<(Expr, StaticType)> {
        match name {
            "context" => Ok((Expr::Context, self.this_types[0].clone())),
            "resource" => Ok((Expr::Resource, StaticType::Unknown)),
            _ => {
                let value = CONSTANTS
                    .get(name)
                    .ok_or_else(|| Error::NotFound(format!("Unknown external constant '%{name}'")))?;
                Ok((
                    Expr::Literal(Value::string(*value)),
                    StaticType::System(TypeId::String),
                ))
            }
        }
    }

    /// `base.name`. A leading name equal to the type of `$this` (such as
    /// `Encounter` in `Encounter.status`) refers to `$this` itself.
    fn compile_field(
        &self,
        base: Expr,
        base_ty: StaticType,
        name: &str,
        leading: bool,
    ) -> Result<(Expr, StaticType)> {
        let type_name = match &base_ty {
            StaticType::Record(type_name) => type_name.clone(),
            StaticType::System(id) => {
                return Err(Error::NotFound(format!(
                    "Unknown field '{name}' on System.{id:?}"
                )))
            }
            StaticType::Empty | StaticType::Unknown => {
                let expr = Expr::Field {
                    base: base.boxed(),
                    name: name.to_string(),
                    binding: FieldBinding::Dynamic,
                };
                return Ok((expr, StaticType::Unknown));
            }
        };

        if let Some(field) = self.schema.find_field(&type_name, name) {
            let ty = if self.schema.is_choice(&field.type_name) {
                StaticType::Unknown
            } else {
                StaticType::Record(Arc::from(field.type_name.as_str()))
            };
            let expr = Expr::Field {
                base: base.boxed(),
                name: name.to_string(),
                binding: FieldBinding::Static(field.name.clone()),
            };
            return Ok((expr, ty));
        }

        let is_primitive = self
            .schema
            .describe(&type_name)
            .is_some_and(|d| d.primitive_kind().is_some());
        if name == "value" && is_primitive {
            let expr = Expr::Field {
                base: base.boxed(),
                name: name.to_string(),
                binding: FieldBinding::PrimitiveValue,
            };
            return Ok((expr, base_ty));
        }

        if leading && name == type_name.as_ref() {
            return Ok((base, base_ty));
        }

        Err(Error::NotFound(format!(
            "Unknown field '{name}' on type '{type_name}'"
        )))
    }

    fn compile_call(
        &mut self,
        base: Expr,
        base_ty: StaticType,
        name: &str,
        args: &[AstNode],
    ) -> Result<(Expr, StaticType)> {
        let metadata = resolve_function(name, args.len())?;
        let function = metadata.function;

        match function {
            Function::Is | Function::As | Function::OfType => {
                let type_name = type_argument(&args[0]).ok_or_else(|| {
                    Error::InvalidArgument(format!("{name}() expects a type name argument"))
                })?;
                let operation = match function {
                    Function::Is => TypeOperation::Is,
                    Function::As => TypeOperation::As,
                    _ => TypeOperation::OfType,
                };
                return self.type_operation(operation, base, base_ty, &type_name.name());
            }
            _ => {}
        }

        let mut compiled = Vec::with_capacity(args.len());
        let mut arg_types = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            let (expr, ty) = if binds_this(function, position) {
                self.this_types.push(base_ty.clone());
                let result = self.compile_node(arg);
                self.this_types.pop();
                result?
            } else {
                self.compile_node(arg)?
            };
            compiled.push(expr);
            arg_types.push(ty);
        }

        let ty = match function {
            Function::Select => arg_types[0].clone(),
            Function::Union | Function::Combine => base_ty.clone().merge(arg_types[0].clone()),
            Function::Iif => arg_types[1..]
                .iter()
                .cloned()
                .fold(StaticType::Empty, StaticType::merge),
            _ => match metadata.result {
                ResultType::Boolean => StaticType::System(TypeId::Boolean),
                ResultType::Integer => StaticType::System(TypeId::Integer),
                ResultType::Decimal => StaticType::System(TypeId::Decimal),
                ResultType::String => StaticType::System(TypeId::String),
                ResultType::Input => base_ty.clone(),
                ResultType::Unknown => StaticType::Unknown,
            },
        };

        Ok((
            Expr::Call {
                function,
                base: base.boxed(),
                args: compiled,
            },
            ty,
        ))
    }

    /// `as` and `ofType` keep record nodes, so a system type only narrows the
    /// static type of an operand that is already system-typed.
    fn type_operation(
        &self,
        operation: TypeOperation,
        operand: Expr,
        operand_ty: StaticType,
        type_name: &str,
    ) -> Result<(Expr, StaticType)> {
        let type_specifier = TypeSpecifier::resolve(type_name, self.schema)?;
        let ty = match (&operation, &type_specifier) {
            (TypeOperation::Is, _) => StaticType::System(TypeId::Boolean),
            (_, TypeSpecifier::System(id)) if matches!(operand_ty, StaticType::System(_)) => {
                StaticType::System(*id)
            }
            (_, TypeSpecifier::System(_)) => StaticType::Unknown,
            (_, TypeSpecifier::Named(name)) if self.schema.is_choice(name) => StaticType::Unknown,
            (_, TypeSpecifier::Named(name)) => StaticType::Record(name.clone()),
        };
        Ok((
            Expr::TypeOp {
                operation,
                operand: operand.boxed(),
                type_specifier,
            },
            ty,
        ))
    }
}

/// Arguments evaluated with `$this` bound to the call's input elements.
fn binds_this(function: Function, position: usize) -> bool {
    match function {
        Function::Iif => true,
        Function::Trace => position == 1,
        other => other.is_lambda(),
    }
}

/// `Name` or `Namespace.Name` written as a function argument.
fn type_argument(arg: &AstNode) -> Option<QualifiedIdentifier> {
    match arg {
        AstNode::Member(name) => Some(QualifiedIdentifier::single(name.as_str())),
        AstNode::Invocation { target, invocation } => {
            let mut qualified = type_argument(target)?;
            match invocation.as_ref() {
                AstNode::Member(name) => {
                    qualified.parts.push(name.clone());
                    Some(qualified)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn binary_result_type(operator: BinaryOperator, left: StaticType, right: StaticType) -> StaticType {
    use BinaryOperator::*;
    match operator {
        Union => left.merge(right),
        Concat => StaticType::System(TypeId::String),
        Add | Subtract | Multiply | Div | Mod => {
            let integer = StaticType::System(TypeId::Integer);
            if left == integer && right == integer {
                integer
            } else if left.is_numeric() && right.is_numeric() {
                StaticType::System(TypeId::Decimal)
            } else if operator == Add
                && left == StaticType::System(TypeId::String)
                && right == StaticType::System(TypeId::String)
            {
                left
            } else {
                StaticType::Unknown
            }
        }
        Divide if left.is_numeric() && right.is_numeric() => StaticType::System(TypeId::Decimal),
        Divide => StaticType::Unknown,
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual | Equal | Equivalent
        | NotEqual | NotEquivalent | In | Contains | And | Or | Xor | Implies => {
            StaticType::System(TypeId::Boolean)
        }
    }
}
