//! Schema-bound FHIRPath engine
//!
//! Expressions are compiled once against a [`SchemaReflector`] for a fixed
//! root type and then evaluated against any number of records of that type:
//!
//! 1. **Lexer/Parser** → AST
//! 2. **Compiler** → [`expr::Expr`] (fields bound to schema fields, functions
//!    resolved, literals folded into values)
//! 3. **Evaluator** → [`Collection`] borrowing from the record
//!
//! ```text
//! Expression String
//!      |
//!   Parser -> AST
//!      |
//! Compiler (schema, root type) -> Expr
//!      |
//! Evaluator (record) -> Collection
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fhirpath_compiled::{Engine, FieldDescriptor, Node, Schema, TypeDescriptor};
//!
//! let schema = Schema::new().with_type(
//!     TypeDescriptor::resource("Encounter").with_field(FieldDescriptor::new("status", "code")),
//! );
//! let engine = Engine::new(Arc::new(schema));
//!
//! let record = Node::new("Encounter").with("status", Node::string("code", "finished"));
//! let result = engine.evaluate("Encounter", "status = 'finished'", &record).unwrap();
//! assert!(result.get_boolean().unwrap());
//! ```

pub mod ast;
pub mod compiler;
pub mod context;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod schema;
pub mod temporal;
pub mod token;
pub mod types;
pub mod value;

// Re-export main types
pub use engine::{compile, CompiledExpression, Engine, EngineConfig, EvaluationResult};
pub use error::{Error, ErrorKind, Result};
pub use node::{Node, Scalar};
pub use schema::{FieldDescriptor, PrimitiveKind, Schema, SchemaReflector, TypeDescriptor, TypeKind};
pub use value::{Collection, Item, Quantity, Value};
