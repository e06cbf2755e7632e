#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use fhirpath_compiled::{Engine, ErrorKind, EvaluationResult, Node, Schema, SchemaReflector};
use serde_json::{json, Value as JsonValue};

static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
static ENGINE: OnceLock<Engine> = OnceLock::new();

pub fn schema() -> Arc<dyn SchemaReflector> {
    SCHEMA
        .get_or_init(|| {
            Arc::new(
                Schema::from_json_str(include_str!("../fixtures/schema.json"))
                    .expect("Failed to load test schema"),
            )
        })
        .clone()
}

pub fn engine() -> &'static Engine {
    ENGINE.get_or_init(|| Engine::new(schema()))
}

/// Materialize a record of `type_name` from JSON.
pub fn record(type_name: &str, json: JsonValue) -> Node {
    Node::from_json(schema().as_ref(), type_name, &json).expect("Failed to build test record")
}

pub fn eval<'a>(
    type_name: &str,
    expression: &str,
    record: &'a Node,
) -> fhirpath_compiled::Result<EvaluationResult<'a>> {
    engine().evaluate(type_name, expression, record)
}

/// Evaluate an expression that does not depend on record content.
pub fn eval_literal(expression: &str) -> EvaluationResult<'static> {
    static EMPTY: OnceLock<Node> = OnceLock::new();
    let record = EMPTY.get_or_init(|| Node::new("Encounter"));
    eval("Encounter", expression, record)
        .unwrap_or_else(|e| panic!("Failed to evaluate '{expression}': {e}"))
}

pub fn literal_error(expression: &str) -> ErrorKind {
    static EMPTY: OnceLock<Node> = OnceLock::new();
    let record = EMPTY.get_or_init(|| Node::new("Encounter"));
    match eval("Encounter", expression, record) {
        Ok(_) => panic!("Expected '{expression}' to fail"),
        Err(e) => e.kind(),
    }
}

pub fn is_true(expression: &str) -> bool {
    eval_literal(expression)
        .get_boolean()
        .unwrap_or_else(|e| panic!("'{expression}' is not a boolean: {e}"))
}

pub fn is_empty(expression: &str) -> bool {
    eval_literal(expression).is_empty()
}

pub fn encounter() -> Node {
    record(
        "Encounter",
        json!({
            "id": "enc-1",
            "status": "finished",
            "class": {
                "system": "http://terminology.hl7.org/CodeSystem/v3-ActCode",
                "code": "AMB",
                "display": "ambulatory"
            },
            "type": [
                { "coding": [{ "system": "http://snomed.info/sct", "code": "270427003" }],
                  "text": "Patient-initiated encounter" },
                { "text": "Follow-up" }
            ],
            "subject": { "reference": "Patient/example" },
            "period": { "start": "2017-02-01T08:45:00-05:00", "end": "2017-02-01T09:27:00-05:00" },
            "length": { "value": "42", "unit": "min", "system": "http://unitsofmeasure.org", "code": "min" },
            "statusHistory": [
                { "status": "arrived", "period": { "start": "2017-02-01T08:45:00-05:00" } },
                { "status": "in-progress", "period": { "start": "2017-02-01T08:50:00-05:00" } }
            ]
        }),
    )
}

pub fn observation() -> Node {
    record(
        "Observation",
        json!({
            "id": "obs-1",
            "status": "final",
            "code": {
                "coding": [
                    { "system": "http://loinc.org", "code": "29463-7", "display": "Body Weight" },
                    { "system": "http://snomed.info/sct", "code": "27113001", "display": "Body weight" }
                ]
            },
            "subject": { "reference": "Patient/example" },
            "effective": { "dateTime": "2016-03-28" },
            "issued": "2016-03-28T12:00:00.000Z",
            "value": {
                "quantity": {
                    "value": "185.0",
                    "unit": "lbs",
                    "system": "http://unitsofmeasure.org",
                    "code": "[lb_av]"
                }
            },
            "component": [
                { "code": { "text": "Systolic" },
                  "value": { "quantity": { "value": "120", "system": "http://unitsofmeasure.org", "code": "mm[Hg]" } } },
                { "code": { "text": "Diastolic" },
                  "value": { "quantity": { "value": "80", "system": "http://unitsofmeasure.org", "code": "mm[Hg]" } } },
                { "code": { "text": "Comment" }, "value": { "string": "resting" } }
            ]
        }),
    )
}

pub fn patient() -> Node {
    record(
        "Patient",
        json!({
            "id": "example",
            "active": true,
            "name": [
                { "use": "official", "family": "Chalmers", "given": ["Peter", "James"] },
                { "use": "usual", "given": ["Jim"] }
            ],
            "gender": "male",
            "birthDate": "1974-12-25",
            "deceased": { "boolean": false }
        }),
    )
}

pub fn bundle() -> Node {
    record(
        "Bundle",
        json!({
            "id": "bundle-1",
            "type": "collection",
            "entry": [
                { "fullUrl": "urn:uuid:1", "resource": { "Patient": { "id": "p1", "active": true } } },
                { "fullUrl": "urn:uuid:2", "resource": { "Observation": {
                    "id": "o1",
                    "status": "final",
                    "subject": { "reference": "Patient/p1" }
                } } },
                { "fullUrl": "urn:uuid:3", "resource": { "Bundle": {
                    "id": "inner",
                    "type": "searchset",
                    "entry": [
                        { "fullUrl": "urn:uuid:4", "resource": { "Patient": { "id": "p9", "active": false } } }
                    ]
                } } }
            ]
        }),
    )
}

pub fn structure_definition() -> Node {
    record(
        "StructureDefinition",
        json!({
            "url": "http://example.org/StructureDefinition/example",
            "name": "Example",
            "contextInvariant": ["a", "b"],
            "snapshot": { "element": [
                { "id": "Patient", "path": "Patient", "min": 0, "max": "*" },
                { "id": "Patient.name", "path": "Patient.name", "label": "Name", "min": 1, "max": "*" }
            ] },
            "differential": { "element": [
                { "id": "Patient.name", "path": "Patient.name", "min": 1 }
            ] }
        }),
    )
}
