//! Evaluation context for FHIRPath expressions
//!
//! A context is created per evaluation call and threaded through the
//! recursive walk by `&mut`. It gives access to the schema, the `%context`
//! root and the `$this` scope stack that `where`, `select`, `all`,
//! `exists(criteria)`, `iif` and `trace` push while iterating.

use crate::error::Result;
use crate::node::Node;
use crate::schema::SchemaReflector;
use crate::value::{Collection, Item};

pub struct Context<'a, 's> {
    schema: &'s dyn SchemaReflector,
    root: Item<'a>,
    this: Vec<Item<'a>>,
}

impl<'a, 's> Context<'a, 's> {
    /// Context with `record` as both `%context` and `$this`.
    pub fn new(schema: &'s dyn SchemaReflector, record: &'a Node) -> Self {
        let root = Item::root(record);
        Self {
            schema,
            this: vec![root.clone()],
            root,
        }
    }

    pub fn schema(&self) -> &'s dyn SchemaReflector {
        self.schema
    }

    /// `%context`
    pub fn root(&self) -> &Item<'a> {
        &self.root
    }

    /// Current `$this`.
    pub fn this(&self) -> &Item<'a> {
        self.this.last().unwrap_or(&self.root)
    }

    /// `%resource` of the current `$this`.
    pub fn resource(&self) -> Result<Collection<'a>> {
        let item = self.this().enclosing_resource(self.schema)?;
        Ok(Collection::singleton(item))
    }

    /// Run `f` with `$this` bound to `item`.
    pub fn with_this<T>(&mut self, item: Item<'a>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.this.push(item);
        let result = f(self);
        self.this.pop();
        result
    }

    /// Nesting of `$this` scopes, 1 at the top level.
    pub fn depth(&self) -> usize {
        self.this.len()
    }
}
