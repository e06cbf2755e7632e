//! Integration tests for the full compile and evaluate pipeline

#[path = "../test_support/mod.rs"]
mod test_support;

mod ancestry;
mod errors;
mod functions;
mod operators;
mod strings;
mod types;
