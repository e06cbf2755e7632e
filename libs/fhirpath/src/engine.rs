//! Main FHIRPath engine
//!
//! Orchestrates the pipeline: Parse → AST → compile against the schema →
//! [`Expr`] tree → evaluation against a record.
//!
//! A [`CompiledExpression`] is immutable and cheap to clone, so one compiled
//! expression can be evaluated from many threads at once. [`Engine`] adds an
//! LRU cache of compiled expressions keyed by root type and expression text.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::compiler::compile_ast;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::evaluate;
use crate::expr::Expr;
use crate::node::Node;
use crate::parser::{Parser, MAX_RECURSION_DEPTH};
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

/// Engine settings, loadable from a host's configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of compiled expressions kept in the cache.
    pub cache_capacity: usize,
    /// Maximum nesting depth of parsed expressions.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

struct Compiled {
    schema: Arc<dyn SchemaReflector>,
    root_type: String,
    text: String,
    expr: Expr,
}

/// An expression compiled against a schema for one root type.
#[derive(Clone)]
pub struct CompiledExpression {
    inner: Arc<Compiled>,
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("root_type", &self.inner.root_type)
            .field("text", &self.inner.text)
            .finish()
    }
}

/// Compile `text` for records of type `root_type`.
pub fn compile(
    schema: Arc<dyn SchemaReflector>,
    root_type: &str,
    text: &str,
) -> Result<CompiledExpression> {
    CompiledExpression::compile(schema, root_type, text)
}

impl CompiledExpression {
    pub fn compile(
        schema: Arc<dyn SchemaReflector>,
        root_type: &str,
        text: &str,
    ) -> Result<CompiledExpression> {
        Self::compile_with_depth(schema, root_type, text, MAX_RECURSION_DEPTH)
    }

    fn compile_with_depth(
        schema: Arc<dyn SchemaReflector>,
        root_type: &str,
        text: &str,
        max_depth: usize,
    ) -> Result<CompiledExpression> {
        let compiled = Parser::with_max_depth(text, max_depth)
            .parse()
            .and_then(|ast| compile_ast(schema.as_ref(), root_type, &ast));

        match compiled {
            Ok(expr) => {
                debug!(root_type, expression = text, "compiled FHIRPath expression");
                Ok(CompiledExpression {
                    inner: Arc::new(Compiled {
                        schema,
                        root_type: root_type.to_string(),
                        text: text.to_string(),
                        expr,
                    }),
                })
            }
            Err(error) => {
                debug!(root_type, expression = text, %error, "failed to compile FHIRPath expression");
                Err(error)
            }
        }
    }

    pub fn root_type(&self) -> &str {
        &self.inner.root_type
    }

    /// Source text of the expression.
    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn expr(&self) -> &Expr {
        &self.inner.expr
    }

    /// Evaluate against `record`, which must be of the root type.
    pub fn evaluate<'a>(&self, record: &'a Node) -> Result<EvaluationResult<'a>> {
        if record.type_name() != self.inner.root_type {
            return Err(Error::InvalidArgument(format!(
                "Expression compiled for '{}' evaluated against '{}'",
                self.inner.root_type,
                record.type_name()
            )));
        }

        let mut ctx = Context::new(self.inner.schema.as_ref(), record);
        let collection = evaluate(&self.inner.expr, &mut ctx)?;
        trace!(expression = %self.inner.text, results = collection.len(), "evaluated");

        Ok(EvaluationResult {
            collection,
            schema: Arc::clone(&self.inner.schema),
        })
    }
}

/// Result of one evaluation. Borrows the evaluated record.
pub struct EvaluationResult<'a> {
    collection: Collection<'a>,
    schema: Arc<dyn SchemaReflector>,
}

impl std::fmt::Debug for EvaluationResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationResult")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<'a> EvaluationResult<'a> {
    pub fn collection(&self) -> &Collection<'a> {
        &self.collection
    }

    pub fn into_collection(self) -> Collection<'a> {
        self.collection
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Every element of the result in order: record nodes (structured or
    /// primitive) as [`Value::Node`], computed values as themselves.
    pub fn get_messages(&self) -> Vec<Value<'a>> {
        self.collection.values().cloned().collect()
    }

    /// Primitive reading of the single result value.
    fn single(&self, expected: &str) -> Result<Value<'a>> {
        let item = match self.collection.single(expected) {
            Ok(Some(item)) => item,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "Expected a single {expected} result, got {} values",
                    self.collection.len()
                )))
            }
        };
        item.value.primitive(self.schema.as_ref()).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Expected a {expected} result, got {}",
                item.value.type_label()
            ))
        })
    }

    fn mismatch(expected: &str, value: &Value<'_>) -> Error {
        Error::InvalidArgument(format!(
            "Expected a {expected} result, got {}",
            value.type_label()
        ))
    }

    pub fn get_boolean(&self) -> Result<bool> {
        match self.single("Boolean")? {
            Value::Boolean(b) => Ok(b),
            other => Err(Self::mismatch("Boolean", &other)),
        }
    }

    pub fn get_integer(&self) -> Result<i64> {
        match self.single("Integer")? {
            Value::Integer(i) => Ok(i),
            other => Err(Self::mismatch("Integer", &other)),
        }
    }

    pub fn get_string(&self) -> Result<String> {
        match self.single("String")? {
            Value::String(s) => Ok(s.to_string()),
            other => Err(Self::mismatch("String", &other)),
        }
    }

    /// The decimal as exact text, scale preserved.
    pub fn get_decimal(&self) -> Result<String> {
        match self.single("Decimal")? {
            Value::Decimal(d) => Ok(d.to_string()),
            other => Err(Self::mismatch("Decimal", &other)),
        }
    }
}

/// Compiles and caches expressions against one schema.
pub struct Engine {
    schema: Arc<dyn SchemaReflector>,
    config: EngineConfig,
    cache: Mutex<LruCache<(String, String), CompiledExpression>>,
}

impl Engine {
    pub fn new(schema: Arc<dyn SchemaReflector>) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config(schema: Arc<dyn SchemaReflector>, config: EngineConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            schema,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn schema(&self) -> &Arc<dyn SchemaReflector> {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile `text` for `root_type`, reusing a cached compilation.
    pub fn compile(&self, root_type: &str, text: &str) -> Result<CompiledExpression> {
        let key = (root_type.to_string(), text.to_string());

        if let Some(compiled) = self.lock_cache().get(&key) {
            trace!(root_type, expression = text, "compiled expression cache hit");
            return Ok(compiled.clone());
        }

        let compiled = CompiledExpression::compile_with_depth(
            Arc::clone(&self.schema),
            root_type,
            text,
            self.config.max_depth,
        )?;
        self.lock_cache().put(key, compiled.clone());
        Ok(compiled)
    }

    /// Compile (or fetch from cache) and evaluate in one step.
    pub fn evaluate<'a>(
        &self,
        root_type: &str,
        text: &str,
        record: &'a Node,
    ) -> Result<EvaluationResult<'a>> {
        self.compile(root_type, text)?.evaluate(record)
    }

    pub fn cached_expressions(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<(String, String), CompiledExpression>> {
        // The cache holds no invariants a panicking holder could break.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
