//! String manipulation functions
//!
//! All of them require a single string-like input (string, code, id, uri or
//! an enum code) and return `{}` for empty input. `contains()`,
//! `startsWith()` and `endsWith()` insist on a string argument; the others
//! return `{}` when their argument is empty.

use std::sync::Arc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::SchemaReflector;
use crate::value::{Collection, Value};

use super::single_string;

fn required_argument(
    arg: &Collection<'_>,
    function: &str,
    schema: &dyn SchemaReflector,
) -> Result<Arc<str>> {
    single_string(arg, function, schema)?.ok_or_else(|| {
        Error::invalid(format!("{function}() requires a string argument, got {{}}"))
    })
}

fn compile_regex(pattern: &str, function: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::invalid(format!("{function}() got an invalid regex '{pattern}': {e}")))
}

fn string_result<'a>(value: impl Into<Arc<str>>) -> Result<Collection<'a>> {
    Ok(Collection::of(Value::string(value)))
}

pub(super) fn starts_with<'a>(
    input: &Collection<'a>,
    prefix: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let prefix = required_argument(prefix, "startsWith", schema)?;
    let Some(text) = single_string(input, "startsWith", schema)? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::boolean(text.starts_with(prefix.as_ref())))
}

pub(super) fn ends_with<'a>(
    input: &Collection<'a>,
    suffix: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let suffix = required_argument(suffix, "endsWith", schema)?;
    let Some(text) = single_string(input, "endsWith", schema)? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::boolean(text.ends_with(suffix.as_ref())))
}

pub(super) fn contains_str<'a>(
    input: &Collection<'a>,
    substring: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let substring = required_argument(substring, "contains", schema)?;
    let Some(text) = single_string(input, "contains", schema)? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::boolean(text.contains(substring.as_ref())))
}

/// Zero-based character index of the first occurrence, -1 when absent.
pub(super) fn index_of<'a>(
    input: &Collection<'a>,
    substring: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let (Some(text), Some(substring)) = (
        single_string(input, "indexOf", schema)?,
        single_string(substring, "indexOf", schema)?,
    ) else {
        return Ok(Collection::empty());
    };
    let index = match text.find(substring.as_ref()) {
        Some(byte_index) => text[..byte_index].chars().count() as i64,
        None => -1,
    };
    Ok(Collection::of(Value::Integer(index)))
}

pub(super) fn upper<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    match single_string(input, "upper", schema)? {
        Some(text) => string_result(text.to_uppercase()),
        None => Ok(Collection::empty()),
    }
}

pub(super) fn lower<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    match single_string(input, "lower", schema)? {
        Some(text) => string_result(text.to_lowercase()),
        None => Ok(Collection::empty()),
    }
}

pub(super) fn length<'a>(input: &Collection<'a>, schema: &dyn SchemaReflector) -> Result<Collection<'a>> {
    match single_string(input, "length", schema)? {
        Some(text) => Ok(Collection::of(Value::Integer(text.chars().count() as i64))),
        None => Ok(Collection::empty()),
    }
}

/// Whole-string regex match.
pub(super) fn matches<'a>(
    input: &Collection<'a>,
    pattern: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let (Some(text), Some(pattern)) = (
        single_string(input, "matches", schema)?,
        single_string(pattern, "matches", schema)?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile_regex(&format!("^(?:{pattern})$"), "matches")?;
    Ok(Collection::boolean(regex.is_match(&text)))
}

/// Literal replacement. An empty pattern inserts the substitution around
/// every character of a non-empty input.
pub(super) fn replace<'a>(
    input: &Collection<'a>,
    pattern: &Collection<'a>,
    substitution: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let (Some(text), Some(pattern), Some(substitution)) = (
        single_string(input, "replace", schema)?,
        single_string(pattern, "replace", schema)?,
        single_string(substitution, "replace", schema)?,
    ) else {
        return Ok(Collection::empty());
    };
    if text.is_empty() {
        return string_result(text);
    }
    string_result(text.replace(pattern.as_ref(), &substitution))
}

/// Regex replacement; the substitution may refer to groups as `$1`.
pub(super) fn replace_matches<'a>(
    input: &Collection<'a>,
    pattern: &Collection<'a>,
    substitution: &Collection<'a>,
    schema: &dyn SchemaReflector,
) -> Result<Collection<'a>> {
    let (Some(text), Some(pattern), Some(substitution)) = (
        single_string(input, "replaceMatches", schema)?,
        single_string(pattern, "replaceMatches", schema)?,
        single_string(substitution, "replaceMatches", schema)?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile_regex(&pattern, "replaceMatches")?;
    string_result(regex.replace_all(&text, substitution.as_ref()).into_owned())
}
