use fhirpath_compiled::ErrorKind;

use crate::test_support::{
    encounter, eval, eval_literal, is_empty, is_true, literal_error, observation, patient,
    structure_definition,
};

#[test]
fn test_existence() {
    let patient = patient();
    let check = |expression: &str| {
        eval("Patient", expression, &patient)
            .unwrap()
            .get_boolean()
            .unwrap()
    };
    assert!(check("name.exists()"));
    assert!(!check("name.empty()"));
    assert!(check("name.exists(use = 'usual')"));
    assert!(!check("name.exists(use = 'nickname')"));
    assert!(check("name.all(given.exists())"));
    assert!(!check("name.all(family.exists())"));
    assert!(is_true("{}.all(false)"));
    assert!(!is_true("{}.exists()"));
    assert!(is_true("{}.empty()"));
}

#[test]
fn test_all_over_dynamic_union() {
    let definition = structure_definition();
    let result = eval(
        "StructureDefinition",
        "(snapshot | differential).all(element.exists())",
        &definition,
    )
    .unwrap();
    assert!(result.get_boolean().unwrap());
}

#[test]
fn test_count_and_distinct() {
    assert_eq!(eval_literal("(1 | 2 | 2).count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1).combine(1).count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1).combine(1).distinct().count()").get_integer().unwrap(), 1);
    assert_eq!(eval_literal("{}.count()").get_integer().unwrap(), 0);
    assert!(is_true("(1 | 2 | 3).isDistinct()"));
    assert!(!is_true("(1).combine(1).isDistinct()"));
    assert!(is_true("(1 | 1.0).count() = 1"));
}

#[test]
fn test_boolean_aggregates() {
    assert!(is_true("(true | false).anyTrue()"));
    assert!(!is_true("(true | false).allTrue()"));
    assert!(is_true("(true | false).anyFalse()"));
    assert!(!is_true("(true | false).allFalse()"));
    assert!(is_true("{}.allTrue()"));
    assert!(!is_true("{}.anyTrue()"));
    assert_eq!(literal_error("(1 | 2).anyTrue()"), ErrorKind::InvalidArgument);
}

#[test]
fn test_where_and_select() {
    let observation = observation();
    let result = eval(
        "Observation",
        "code.coding.where(system = %loinc).code",
        &observation,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "29463-7");

    let result = eval(
        "Observation",
        "component.select(code.text)",
        &observation,
    )
    .unwrap();
    assert_eq!(result.len(), 3);

    let result = eval(
        "Observation",
        "component.where($this.code.text = 'Comment').value",
        &observation,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "resting");

    assert!(is_empty("{}.where(true)"));
    assert_eq!(eval_literal("(1 | 2 | 3).where($this > 1).count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1 | 2).select($this * 10).last()").get_integer().unwrap(), 20);
}

#[test]
fn test_where_truthiness() {
    // a non-boolean singleton counts as true
    assert_eq!(eval_literal("(1 | 2).where('x').count()").get_integer().unwrap(), 2);
    assert!(is_empty("(1 | 2).where({})"));
    assert_eq!(literal_error("(1 | 2).where((1 | 2))"), ErrorKind::InvalidArgument);
}

#[test]
fn test_subsetting() {
    assert_eq!(eval_literal("(1 | 2 | 3).first()").get_integer().unwrap(), 1);
    assert_eq!(eval_literal("(1 | 2 | 3).last()").get_integer().unwrap(), 3);
    assert_eq!(eval_literal("(1 | 2 | 3).tail().count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1 | 2 | 3).skip(1).first()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1 | 2 | 3).skip(-1).count()").get_integer().unwrap(), 3);
    assert_eq!(eval_literal("(1 | 2 | 3).skip(5).count()").get_integer().unwrap(), 0);
    assert_eq!(eval_literal("(1 | 2 | 3).take(2).last()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1 | 2 | 3).take(-2).count()").get_integer().unwrap(), 0);
    assert_eq!(eval_literal("(1).single()").get_integer().unwrap(), 1);
    assert!(is_empty("{}.single()"));
    assert!(is_empty("{}.first()"));

    assert_eq!(literal_error("(1 | 2).single()"), ErrorKind::FailedPrecondition);
    assert_eq!(literal_error("(1 | 2).skip('a')"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1 | 2).take({})"), ErrorKind::InvalidArgument);
}

#[test]
fn test_combining() {
    assert_eq!(eval_literal("(1 | 2).union(2 | 3).count()").get_integer().unwrap(), 3);
    assert_eq!(eval_literal("(1 | 2).combine(2 | 3).count()").get_integer().unwrap(), 4);
    assert_eq!(eval_literal("(1 | 2 | 3).intersect(2 | 3 | 4).count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1).combine(1).intersect(1).count()").get_integer().unwrap(), 1);
    assert!(is_empty("(1 | 2).intersect({})"));
}

#[test]
fn test_iif() {
    assert_eq!(eval_literal("iif(true, 1, 2)").get_integer().unwrap(), 1);
    assert_eq!(eval_literal("iif(false, 1, 2)").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("iif({}, 1, 2)").get_integer().unwrap(), 2);
    assert!(is_empty("iif(false, 1)"));
    assert!(is_empty("{}.iif(true, false)"));
    assert_eq!(eval_literal("(5).iif($this > 3, 'big', 'small')").get_string().unwrap(), "big");

    // only the taken branch runs
    assert_eq!(eval_literal("iif(true, 1, (1 | 2).single())").get_integer().unwrap(), 1);

    assert_eq!(literal_error("(1 | 2).iif(true, 1, 2)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("iif(true)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("iif(true, 1, 2, 3)"), ErrorKind::InvalidArgument);
}

#[test]
fn test_not() {
    assert!(!is_true("true.not()"));
    assert!(is_true("false.not()"));
    assert!(is_empty("{}.not()"));
    assert!(!is_true("'text'.not()"));
}

#[test]
fn test_has_value() {
    let patient = patient();
    let check = |expression: &str| {
        eval("Patient", expression, &patient)
            .unwrap()
            .get_boolean()
            .unwrap()
    };
    assert!(check("gender.hasValue()"));
    assert!(!check("name.hasValue()"));
    assert!(!check("name.given.hasValue()"));
    assert!(!check("birthDate.where(false).hasValue()"));
    assert!(check("name.first().family.hasValue()"));
}

#[test]
fn test_children_and_descendants() {
    let definition = structure_definition();
    let count = |expression: &str| {
        eval("StructureDefinition", expression, &definition)
            .unwrap()
            .get_integer()
            .unwrap()
    };
    // url, name, two invariants, snapshot, differential
    assert_eq!(count("children().count()"), 6);
    assert_eq!(count("snapshot.children().count()"), 2);
    assert_eq!(count("differential.descendants().count()"), 4);
    assert_eq!(count("{}.children().count()"), 0);

    let result = eval(
        "StructureDefinition",
        "differential.descendants().first()",
        &definition,
    )
    .unwrap();
    assert_eq!(
        result.get_messages()[0].as_node().unwrap().type_name(),
        "ElementDefinition"
    );

    let result = eval(
        "StructureDefinition",
        "descendants().where($this is ElementDefinition).label",
        &definition,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "Name");
}

#[test]
fn test_children_unwrap_choices() {
    let observation = observation();
    let result = eval(
        "Observation",
        "children().where($this is Quantity).unit",
        &observation,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "lbs");
}

#[test]
fn test_trace_returns_input() {
    let encounter = encounter();
    let result = eval("Encounter", "type.trace('types').text", &encounter).unwrap();
    assert_eq!(result.len(), 2);

    let result = eval("Encounter", "type.trace('texts', text).count()", &encounter).unwrap();
    assert_eq!(result.get_integer().unwrap(), 2);

    assert_eq!(eval_literal("(1 | 2).trace('numbers').count()").get_integer().unwrap(), 2);
}

#[test]
fn test_function_arity_is_checked() {
    assert_eq!(literal_error("(1 | 2).count(1)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1 | 2).where()"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("'a'.replace('a')"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1).trace()"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1).exists(true, false)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1).bogus()"), ErrorKind::NotFound);
}
