use fhirpath_compiled::ErrorKind;

use crate::test_support::{encounter, eval, eval_literal, is_empty, is_true, literal_error, observation};

/// Renders a boolean-or-empty result as `Some(bool)` / `None`.
fn logic(expression: &str) -> Option<bool> {
    let result = eval_literal(expression);
    if result.is_empty() {
        None
    } else {
        Some(result.get_boolean().unwrap())
    }
}

#[test]
fn test_three_valued_logic() {
    let values = [("true", Some(true)), ("false", Some(false)), ("{}", None)];
    for (left, a) in values {
        for (right, b) in values {
            let and = match (a, b) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            };
            let or = match (a, b) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            };
            let xor = match (a, b) {
                (Some(x), Some(y)) => Some(x != y),
                _ => None,
            };
            let implies = match (a, b) {
                (Some(false), _) | (_, Some(true)) => Some(true),
                (Some(true), Some(false)) => Some(false),
                _ => None,
            };
            assert_eq!(logic(&format!("{left} and {right}")), and, "{left} and {right}");
            assert_eq!(logic(&format!("{left} or {right}")), or, "{left} or {right}");
            assert_eq!(logic(&format!("{left} xor {right}")), xor, "{left} xor {right}");
            assert_eq!(logic(&format!("{left} implies {right}")), implies, "{left} implies {right}");
        }
    }
}

#[test]
fn test_logic_short_circuits() {
    // the right operand would fail if it were evaluated
    assert_eq!(logic("false and (1 | 2).single()"), Some(false));
    assert_eq!(logic("true or (1 | 2).single()"), Some(true));
    assert_eq!(logic("false implies (1 | 2).single()"), Some(true));
    assert_eq!(literal_error("true and (1 | 2).single()"), ErrorKind::FailedPrecondition);
}

#[test]
fn test_logic_truthiness() {
    assert_eq!(logic("'string' and true"), Some(true));
    assert_eq!(logic("1 or false"), Some(true));
    assert_eq!(literal_error("(true | false) and true"), ErrorKind::InvalidArgument);
}

#[test]
fn test_equality() {
    assert!(is_true("1 = 1"));
    assert!(is_true("1 = 1.0"));
    assert!(!is_true("1 = 2"));
    assert!(is_true("'a' != 'b'"));
    assert!(!is_true("'a' = 'A'"));
    assert!(is_true("(1 | 2) = (1 | 2)"));
    assert!(!is_true("(1 | 2) = (2 | 1)"));
    assert!(!is_true("(1 | 2) = 1"));
    assert!(is_empty("1 = {}"));
    assert!(is_empty("{} != {}"));
    assert!(!is_true("1 = '1'"));
}

#[test]
fn test_equivalence() {
    assert!(is_true("'A  b' ~ 'a b'"));
    assert!(is_true("1.2 ~ 1.23"));
    assert!(!is_true("1.2 ~ 1.3"));
    assert!(is_true("(1 | 2) ~ (2 | 1)"));
    assert!(is_true("{} ~ {}"));
    assert!(!is_true("1 ~ {}"));
    assert!(is_true("1 !~ 2"));
}

#[test]
fn test_relational() {
    assert!(is_true("1 < 2"));
    assert!(is_true("2 <= 2"));
    assert!(is_true("2.5 > 2"));
    assert!(is_true("'abc' < 'abd'"));
    assert!(is_true("'b' >= 'a'"));
    assert!(is_empty("1 < {}"));
    assert!(is_empty("{} > 1"));
    assert_eq!(literal_error("(1 | 2) < 3"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("1 < 'a'"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("true > false"), ErrorKind::InvalidArgument);
}

#[test]
fn test_empty_propagation() {
    for operator in ["+", "-", "*", "/", "div", "mod", "<", "<=", ">", ">="] {
        assert!(is_empty(&format!("1 {operator} {{}}")), "1 {operator} {{}}");
        assert!(is_empty(&format!("{{}} {operator} 1")), "{{}} {operator} 1");
    }
    assert!(is_empty("-{}"));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval_literal("1 + 2 * 3").get_integer().unwrap(), 7);
    assert_eq!(eval_literal("(1 + 2) * 3").get_integer().unwrap(), 9);
    assert_eq!(eval_literal("7 div 2").get_integer().unwrap(), 3);
    assert_eq!(eval_literal("7 mod 2").get_integer().unwrap(), 1);
    assert_eq!(eval_literal("-7 div 2").get_integer().unwrap(), -3);
    assert_eq!(eval_literal("3 / 2").get_decimal().unwrap(), "1.5");
    assert_eq!(eval_literal("1.5 + 1").get_decimal().unwrap(), "2.5");
    assert_eq!(eval_literal("0.1 + 0.2").get_decimal().unwrap(), "0.3");
    assert_eq!(eval_literal("5.5 div 0.7").get_integer().unwrap(), 7);
    assert_eq!(eval_literal("5.5 mod 0.7").get_decimal().unwrap(), "0.6");
    assert_eq!(eval_literal("-(3)").get_integer().unwrap(), -3);
    assert_eq!(eval_literal("+2.50").get_decimal().unwrap(), "2.50");
    assert_eq!(eval_literal("-1 + 3").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("5 - -2").get_integer().unwrap(), 7);
    assert_eq!(eval_literal("'a' & 'b' + 'c'").get_string().unwrap(), "abc");
    assert!(is_empty("1 / 0"));
    assert!(is_empty("1 div 0"));
    assert!(is_empty("1 mod 0"));
    assert!(is_empty("1.0 / 0"));
}

#[test]
fn test_arithmetic_errors() {
    assert_eq!(
        literal_error("2147483647 * 2147483647 * 2147483647"),
        ErrorKind::InvalidArgument
    );
    assert_eq!(literal_error("(1 | 2) + 1"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("1 + 'a'"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("'a' - 'b'"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("-'a'"), ErrorKind::InvalidArgument);
    // the sign applies to the string result of the invocation
    assert_eq!(literal_error("-1.toString()"), ErrorKind::InvalidArgument);
}

#[test]
fn test_membership() {
    assert!(is_true("1 in (1 | 2)"));
    assert!(!is_true("3 in (1 | 2)"));
    assert!(is_true("(1 | 2) contains 2"));
    assert!(!is_true("1 in {}"));
    assert!(!is_true("{} contains 1"));
    assert!(is_empty("{} in (1 | 2)"));
    assert!(is_empty("(1 | 2) contains {}"));
    assert_eq!(literal_error("(1 | 2) in (1 | 2)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1 | 2) contains (1 | 2)"), ErrorKind::InvalidArgument);
}

#[test]
fn test_union_is_idempotent() {
    assert_eq!(eval_literal("(1 | 2 | 3) | (1 | 2 | 3)").len(), 3);
    assert_eq!(eval_literal("(3 | 1 | 3 | 2).first()").get_integer().unwrap(), 3);
    assert!(is_true("(3 | 1 | 3 | 2) = (3 | 1 | 2)"));
    assert!(is_empty("{} | {}"));
}

#[test]
fn test_quantities() {
    assert!(is_true("4 'mg' = 4 'mg'"));
    assert!(is_true("4 'mg' < 5 'mg'"));
    assert!(!is_true("4 'mg' = 4 'g'"));
    assert!(is_true("(2 'mg' + 3 'mg') = 5 'mg'"));
    assert!(is_true("2 days = 2 days"));
    assert_eq!(literal_error("4 'mg' > 4 'g'"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("4 'mg' + 4 'g'"), ErrorKind::InvalidArgument);
}

#[test]
fn test_record_quantity_comparisons() {
    let observation = observation();
    let check = |expression: &str| {
        eval("Observation", expression, &observation)
            .unwrap()
            .get_boolean()
            .unwrap()
    };
    assert!(check("value > 100 '[lb_av]'"));
    assert!(check("component[0].value > component[1].value"));
    assert!(check("value = 185 '[lb_av]'"));

    let err = eval("Observation", "value > component[0].value", &observation).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_record_values_compare_with_literals() {
    let encounter = encounter();
    let check = |expression: &str| {
        eval("Encounter", expression, &encounter)
            .unwrap()
            .get_boolean()
            .unwrap()
    };
    assert!(check("status = 'finished'"));
    assert!(check("status in ('planned' | 'finished')"));
    assert!(check("length.value > 40"));
    assert!(check("id & '-x' = 'enc-1-x'"));
}
