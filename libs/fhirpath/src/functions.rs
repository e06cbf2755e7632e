//! Function registry for FHIRPath functions
//!
//! Maps function names to [`Function`] and provides signature metadata. Uses a
//! compile-time perfect hash map (phf) so lookups never allocate.

use phf::phf_map;

use crate::error::{Error, Result};

/// Builtin functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Existence
    Empty,
    Exists,
    All,
    AllTrue,
    AnyTrue,
    AllFalse,
    AnyFalse,
    Count,
    Distinct,
    IsDistinct,
    HasValue,

    // Filtering and projection
    Where,
    Select,
    OfType,

    // Subsetting
    Single,
    First,
    Last,
    Tail,
    Skip,
    Take,
    Intersect,

    // Combining
    Union,
    Combine,

    // Strings
    IndexOf,
    StartsWith,
    EndsWith,
    Contains,
    Upper,
    Lower,
    Replace,
    Matches,
    ReplaceMatches,
    Length,

    // Conversion
    Iif,
    ToBoolean,
    ConvertsToBoolean,
    ToInteger,
    ConvertsToInteger,
    ToDecimal,
    ConvertsToDecimal,
    ToString,
    ConvertsToString,

    // Types
    Is,
    As,

    // Tree navigation
    Children,
    Descendants,

    // Utility
    Not,
    Trace,
}

/// Static result type of a function, used by the compiler to decide between
/// static and dynamic field binding on the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Boolean,
    Integer,
    Decimal,
    String,
    /// Same element type as the input collection.
    Input,
    /// Depends on the data.
    Unknown,
}

/// Function metadata
#[derive(Debug, Clone, Copy)]
pub struct FunctionMetadata {
    pub function: Function,
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub result: ResultType,
}

macro_rules! function {
    ($function:ident, $name:literal, $min:literal..=$max:literal, $result:ident) => {
        FunctionMetadata {
            function: Function::$function,
            name: $name,
            min_args: $min,
            max_args: $max,
            result: ResultType::$result,
        }
    };
}

static FUNCTIONS_BY_NAME: phf::Map<&'static str, FunctionMetadata> = phf_map! {
    "empty" => function!(Empty, "empty", 0..=0, Boolean),
    "exists" => function!(Exists, "exists", 0..=1, Boolean),
    "all" => function!(All, "all", 1..=1, Boolean),
    "allTrue" => function!(AllTrue, "allTrue", 0..=0, Boolean),
    "anyTrue" => function!(AnyTrue, "anyTrue", 0..=0, Boolean),
    "allFalse" => function!(AllFalse, "allFalse", 0..=0, Boolean),
    "anyFalse" => function!(AnyFalse, "anyFalse", 0..=0, Boolean),
    "count" => function!(Count, "count", 0..=0, Integer),
    "distinct" => function!(Distinct, "distinct", 0..=0, Input),
    "isDistinct" => function!(IsDistinct, "isDistinct", 0..=0, Boolean),
    "hasValue" => function!(HasValue, "hasValue", 0..=0, Boolean),

    "where" => function!(Where, "where", 1..=1, Input),
    "select" => function!(Select, "select", 1..=1, Unknown),
    "ofType" => function!(OfType, "ofType", 1..=1, Unknown),

    "single" => function!(Single, "single", 0..=0, Input),
    "first" => function!(First, "first", 0..=0, Input),
    "last" => function!(Last, "last", 0..=0, Input),
    "tail" => function!(Tail, "tail", 0..=0, Input),
    "skip" => function!(Skip, "skip", 1..=1, Input),
    "take" => function!(Take, "take", 1..=1, Input),
    "intersect" => function!(Intersect, "intersect", 1..=1, Input),

    "union" => function!(Union, "union", 1..=1, Unknown),
    "combine" => function!(Combine, "combine", 1..=1, Unknown),

    "indexOf" => function!(IndexOf, "indexOf", 1..=1, Integer),
    "startsWith" => function!(StartsWith, "startsWith", 1..=1, Boolean),
    "endsWith" => function!(EndsWith, "endsWith", 1..=1, Boolean),
    "contains" => function!(Contains, "contains", 1..=1, Boolean),
    "upper" => function!(Upper, "upper", 0..=0, String),
    "lower" => function!(Lower, "lower", 0..=0, String),
    "replace" => function!(Replace, "replace", 2..=2, String),
    "matches" => function!(Matches, "matches", 1..=1, Boolean),
    "replaceMatches" => function!(ReplaceMatches, "replaceMatches", 2..=2, String),
    "length" => function!(Length, "length", 0..=0, Integer),

    "iif" => function!(Iif, "iif", 2..=3, Unknown),
    "toBoolean" => function!(ToBoolean, "toBoolean", 0..=0, Boolean),
    "convertsToBoolean" => function!(ConvertsToBoolean, "convertsToBoolean", 0..=0, Boolean),
    "toInteger" => function!(ToInteger, "toInteger", 0..=0, Integer),
    "convertsToInteger" => function!(ConvertsToInteger, "convertsToInteger", 0..=0, Boolean),
    "toDecimal" => function!(ToDecimal, "toDecimal", 0..=0, Decimal),
    "convertsToDecimal" => function!(ConvertsToDecimal, "convertsToDecimal", 0..=0, Boolean),
    "toString" => function!(ToString, "toString", 0..=0, String),
    "convertsToString" => function!(ConvertsToString, "convertsToString", 0..=0, Boolean),

    "is" => function!(Is, "is", 1..=1, Boolean),
    "as" => function!(As, "as", 1..=1, Unknown),

    "children" => function!(Children, "children", 0..=0, Unknown),
    "descendants" => function!(Descendants, "descendants", 0..=0, Unknown),

    "not" => function!(Not, "not", 0..=0, Boolean),
    "trace" => function!(Trace, "trace", 1..=2, Input),
};

/// Get function metadata by name
pub fn get_function_by_name(name: &str) -> Option<&'static FunctionMetadata> {
    FUNCTIONS_BY_NAME.get(name)
}

/// Look up `name` and check the argument count.
pub fn resolve_function(name: &str, arg_count: usize) -> Result<&'static FunctionMetadata> {
    let metadata = get_function_by_name(name)
        .ok_or_else(|| Error::NotFound(format!("Unknown function '{name}'")))?;

    if arg_count < metadata.min_args || arg_count > metadata.max_args {
        let expected = if metadata.min_args == metadata.max_args {
            metadata.min_args.to_string()
        } else {
            format!("{} to {}", metadata.min_args, metadata.max_args)
        };
        return Err(Error::InvalidArgument(format!(
            "{name}() expects {expected} argument(s), got {arg_count}"
        )));
    }
    Ok(metadata)
}

impl Function {
    /// Arguments evaluated once per input element with `$this` bound to it.
    pub fn is_lambda(self) -> bool {
        matches!(
            self,
            Function::Where | Function::Select | Function::All | Function::Exists
        )
    }
}
