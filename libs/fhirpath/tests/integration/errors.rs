use fhirpath_compiled::{compile, Engine, EngineConfig, ErrorKind, Node};

use crate::test_support::{encounter, eval, eval_literal, literal_error, schema};

#[test]
fn test_integer_literal_overflow() {
    let err = compile(schema(), "Encounter", "10000000000").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("10000000000"), "{err}");

    assert_eq!(eval_literal("2147483647").get_integer().unwrap(), 2147483647);
    assert_eq!(eval_literal("-2147483648").get_integer().unwrap(), -2147483648);
}

#[test]
fn test_malformed_expressions() {
    for text in [">not->valid", "status.", "(1 + 2", "1 +", "'unterminated", "where(", "@20"] {
        let err = compile(schema(), "Encounter", text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal, "{text}: {err}");
    }
    let err = compile(schema(), "Encounter", ">not->valid").unwrap_err();
    assert!(err.to_string().contains(">not->valid"), "{err}");
}

#[test]
fn test_compile_errors_name_the_culprit() {
    let err = compile(schema(), "Encounter", "period.bogus").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("bogus"));

    let err = compile(schema(), "Encounter", "status.frobnicate()").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("frobnicate"));

    let err = compile(schema(), "Encounter", "%unknown").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("unknown"));

    let err = compile(schema(), "Nope", "status").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(literal_error("'abc'.length().bogus"), ErrorKind::NotFound);
    assert_eq!(literal_error("(1 + 2).value"), ErrorKind::NotFound);
}

#[test]
fn test_record_must_match_root_type() {
    let compiled = compile(schema(), "Encounter", "status").unwrap();
    let err = compiled.evaluate(&Node::new("Patient")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_result_getters_require_one_value_of_the_kind() {
    let encounter = encounter();

    let result = eval("Encounter", "type.text", &encounter).unwrap();
    assert_eq!(result.get_string().unwrap_err().kind(), ErrorKind::InvalidArgument);

    let result = eval("Encounter", "priority", &encounter).unwrap();
    assert_eq!(result.get_boolean().unwrap_err().kind(), ErrorKind::InvalidArgument);

    let result = eval("Encounter", "status", &encounter).unwrap();
    assert_eq!(result.get_integer().unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(result.get_decimal().unwrap_err().kind(), ErrorKind::InvalidArgument);

    let result = eval("Encounter", "period", &encounter).unwrap();
    assert_eq!(result.get_string().unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_decimal_text_is_preserved() {
    assert_eq!(eval_literal("1.50").get_decimal().unwrap(), "1.50");
    assert_eq!(eval_literal("0.000").get_decimal().unwrap(), "0.000");

    let encounter = encounter();
    let result = eval("Encounter", "length.value", &encounter).unwrap();
    assert_eq!(result.get_decimal().unwrap(), "42");
}

#[test]
fn test_engine_config() {
    let config: EngineConfig = serde_json::from_value(serde_json::json!({ "max_depth": 4 })).unwrap();
    assert_eq!(config.cache_capacity, EngineConfig::default().cache_capacity);

    let engine = Engine::with_config(schema(), config);
    assert!(engine.compile("Encounter", "(((1)))").is_ok());
    let err = engine.compile("Encounter", "((((((((1))))))))").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_engine_cache_is_bounded() {
    let config = EngineConfig {
        cache_capacity: 2,
        ..EngineConfig::default()
    };
    let engine = Engine::with_config(schema(), config);
    for text in ["1", "2", "3", "4"] {
        engine.compile("Encounter", text).unwrap();
    }
    assert_eq!(engine.cached_expressions(), 2);

    let record = Node::new("Encounter");
    let result = engine.evaluate("Encounter", "1 + 1", &record).unwrap();
    assert_eq!(result.get_integer().unwrap(), 2);
}
