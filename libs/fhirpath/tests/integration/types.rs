use fhirpath_compiled::ErrorKind;

use crate::test_support::{eval, eval_literal, is_empty, is_true, literal_error, observation, patient};

#[test]
fn test_is_on_system_values() {
    assert!(is_true("1 is Integer"));
    assert!(!is_true("1 is Decimal"));
    assert!(is_true("1.0 is Decimal"));
    assert!(is_true("'a' is String"));
    assert!(is_true("'a' is System.String"));
    assert!(is_true("@2014-01-01 is Date"));
    assert!(is_true("@2014-01-01T10:00:00Z is DateTime"));
    assert!(is_true("@T10:00 is Time"));
    assert!(is_true("4 'mg' is Quantity"));
    assert!(is_true("(1).is(Integer)"));
    assert!(is_true("(1).is(System.Integer)"));
    assert!(is_empty("{} is Integer"));
    assert_eq!(literal_error("(1 | 2) is Integer"), ErrorKind::InvalidArgument);
}

#[test]
fn test_as() {
    assert_eq!(eval_literal("1 as Integer").get_integer().unwrap(), 1);
    assert!(is_empty("1 as String"));
    assert!(is_empty("{} as String"));
    assert_eq!(eval_literal("(1).as(Integer) + 1").get_integer().unwrap(), 2);
    assert_eq!(literal_error("(1 | 2) as Integer"), ErrorKind::InvalidArgument);
}

#[test]
fn test_of_type_filters() {
    assert_eq!(eval_literal("(1 | 'a' | 2.0 | 3).ofType(Integer).count()").get_integer().unwrap(), 2);
    assert_eq!(eval_literal("(1 | 'a').ofType(String)").get_string().unwrap(), "a");
    assert!(is_empty("(1 | 2).ofType(Boolean)"));
    assert!(is_empty("{}.ofType(Integer)"));
}

#[test]
fn test_schema_types() {
    let observation = observation();
    let check = |expression: &str| {
        eval("Observation", expression, &observation)
            .unwrap()
            .get_boolean()
            .unwrap()
    };
    assert!(check("value is Quantity"));
    assert!(check("value is FHIR.Quantity"));
    assert!(check("code is CodeableConcept"));
    assert!(!check("code is Coding"));
    assert!(check("status is code"));
    assert!(!check("status is String"));
    assert!(check("id is FHIR.id"));

    let result = eval("Observation", "value.as(Quantity).unit", &observation).unwrap();
    assert_eq!(result.get_string().unwrap(), "lbs");

    let result = eval("Observation", "component.value.ofType(Quantity).count()", &observation).unwrap();
    assert_eq!(result.get_integer().unwrap(), 2);

    let result = eval("Observation", "component.value.ofType(string)", &observation).unwrap();
    assert_eq!(result.get_string().unwrap(), "resting");
}

#[test]
fn test_as_binds_fields_statically() {
    let observation = observation();
    let err = eval("Observation", "code.as(Coding).bogus", &observation).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let result = eval("Observation", "code.as(CodeableConcept).coding.count()", &observation).unwrap();
    assert_eq!(result.get_integer().unwrap(), 2);
}

#[test]
fn test_choice_branches_have_their_own_type() {
    let patient = patient();
    let result = eval("Patient", "deceased is Boolean", &patient).unwrap();
    assert!(result.get_boolean().unwrap());
    let result = eval("Patient", "deceased is boolean", &patient).unwrap();
    assert!(result.get_boolean().unwrap());
    let result = eval("Patient", "deceased is DateTime", &patient).unwrap();
    assert!(!result.get_boolean().unwrap());
}

#[test]
fn test_unknown_type_names() {
    assert_eq!(literal_error("1 is Bogus"), ErrorKind::NotFound);
    assert_eq!(literal_error("(1).ofType(System.Patient)"), ErrorKind::NotFound);
    assert_eq!(literal_error("(1).ofType('Integer')"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1).as(1 + 1)"), ErrorKind::InvalidArgument);
}
