use fhirpath_compiled::{ErrorKind, Value};

use crate::test_support::{bundle, encounter, eval, observation};

#[test]
fn test_resource_of_a_bundle_entry() {
    let bundle = bundle();
    let result = eval("Bundle", "entry[0].resource.select(%resource)", &bundle).unwrap();
    let messages = result.get_messages();
    assert_eq!(messages.len(), 1);
    let node = messages[0].as_node().unwrap();
    assert_eq!(node.type_name(), "Patient");
    let expected = bundle.field("entry")[0].field("resource")[0]
        .choice_branch()
        .unwrap();
    assert!(std::ptr::eq(node, expected));

    let result = eval("Bundle", "entry.resource.select(%resource.id)", &bundle).unwrap();
    assert_eq!(result.len(), 3);
}

#[test]
fn test_resource_of_a_nested_bundle_entry() {
    let bundle = bundle();
    let inner = bundle.field("entry")[2].field("resource")[0]
        .choice_branch()
        .unwrap();
    let expected = inner.field("entry")[0].field("resource")[0]
        .choice_branch()
        .unwrap();

    let result = eval(
        "Bundle",
        "entry[2].resource.entry[0].resource.select(%resource)",
        &bundle,
    )
    .unwrap();
    let messages = result.get_messages();
    assert_eq!(messages.len(), 1);
    let node = messages[0].as_node().unwrap();
    assert_eq!(node.type_name(), "Patient");
    assert!(std::ptr::eq(node, expected));

    let result = eval(
        "Bundle",
        "entry[2].resource.entry[0].resource.active.select(%resource.id)",
        &bundle,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "p9");

    let result = eval("Bundle", "entry[2].resource.entry.select(%resource.id)", &bundle).unwrap();
    assert_eq!(result.get_string().unwrap(), "inner");

    let result = eval("Bundle", "entry[2].resource.select(%resource)", &bundle).unwrap();
    assert!(std::ptr::eq(result.get_messages()[0].as_node().unwrap(), inner));
}

#[test]
fn test_nested_elements_find_their_resource() {
    let bundle = bundle();
    let result = eval(
        "Bundle",
        "entry[1].resource.subject.select(%resource.status)",
        &bundle,
    )
    .unwrap();
    assert_eq!(result.get_string().unwrap(), "final");

    let result = eval("Bundle", "entry.select(%resource.type)", &bundle).unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.collection().values().next().map(ToString::to_string).as_deref(), Some("collection"));
}

#[test]
fn test_resource_of_the_root() {
    let encounter = encounter();
    let result = eval("Encounter", "%resource", &encounter).unwrap();
    assert_eq!(result.collection().values().next(), Some(&Value::Node(&encounter)));

    let result = eval("Encounter", "period.start.select(%resource.id)", &encounter).unwrap();
    assert_eq!(result.get_string().unwrap(), "enc-1");

    let observation = observation();
    let result = eval("Observation", "component.where(%resource.status = 'final').count()", &observation)
        .unwrap();
    assert_eq!(result.get_integer().unwrap(), 3);
}

#[test]
fn test_computed_values_have_no_resource() {
    let bundle = bundle();
    let err = eval(
        "Bundle",
        "(entry[0].resource.id & entry[1].resource.id).select(%resource)",
        &bundle,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ancestry);
    assert!(err.to_string().contains("No Resource found in ancestry."));

    let err = eval("Bundle", "(1 | 2).select(%resource)", &bundle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ancestry);
}
