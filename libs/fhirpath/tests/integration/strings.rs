use fhirpath_compiled::ErrorKind;

use crate::test_support::{eval, eval_literal, is_empty, is_true, literal_error, patient};

fn string(expression: &str) -> String {
    eval_literal(expression).get_string().unwrap()
}

fn integer(expression: &str) -> i64 {
    eval_literal(expression).get_integer().unwrap()
}

#[test]
fn test_index_of() {
    assert_eq!(integer("'abcdefg'.indexOf('bc')"), 1);
    assert_eq!(integer("'abcdefg'.indexOf('x')"), -1);
    assert_eq!(integer("'abcdefg'.indexOf('')"), 0);
    assert_eq!(integer("'äbc'.indexOf('c')"), 2);
    assert!(is_empty("{}.indexOf('')"));
    assert!(is_empty("''.indexOf({})"));
}

#[test]
fn test_starts_ends_contains() {
    assert!(is_true("'abcdefg'.startsWith('abc')"));
    assert!(!is_true("'abcdefg'.startsWith('bc')"));
    assert!(is_true("'abcdefg'.endsWith('efg')"));
    assert!(is_true("'abcdefg'.contains('cde')"));
    assert!(is_true("'abc'.contains('')"));
    assert!(is_empty("{}.startsWith('a')"));

    assert_eq!(literal_error("'abc'.startsWith({})"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("'abc'.endsWith(1)"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("'abc'.contains({})"), ErrorKind::InvalidArgument);
}

#[test]
fn test_case_and_length() {
    assert_eq!(string("'AbC'.upper()"), "ABC");
    assert_eq!(string("'AbC'.lower()"), "abc");
    assert_eq!(integer("'abc'.length()"), 3);
    assert_eq!(integer("''.length()"), 0);
    assert!(is_empty("{}.length()"));

    assert_eq!(literal_error("(1).length()"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("(1).upper()"), ErrorKind::InvalidArgument);
    assert_eq!(literal_error("('a' | 'b').lower()"), ErrorKind::InvalidArgument);
}

#[test]
fn test_replace() {
    assert_eq!(string("'abcabc'.replace('b', 'x')"), "axcaxc");
    assert_eq!(string("'abc'.replace('', 'x')"), "xaxbxcx");
    assert_eq!(string("''.replace('', 'x')"), "");
    assert_eq!(string("'abc'.replace('abc', '')"), "");
    assert!(is_empty("'abc'.replace({}, 'x')"));
    assert!(is_empty("{}.replace('a', 'x')"));
}

#[test]
fn test_matches() {
    assert!(is_true("'abc123'.matches('[a-z]+[0-9]+')"));
    // whole-string match
    assert!(!is_true("'abc123'.matches('[a-z]+')"));
    assert!(is_true("'N8000123123'.matches('N[0-9]{8,10}')"));
    assert!(is_empty("'abc'.matches({})"));
    assert_eq!(literal_error("'abc'.matches('(')"), ErrorKind::InvalidArgument);
}

#[test]
fn test_replace_matches() {
    assert_eq!(
        string("'2016-03-28'.replaceMatches('([0-9]+)-([0-9]+)-([0-9]+)', '$3/$2/$1')"),
        "28/03/2016"
    );
    assert_eq!(string("'a1b22c'.replaceMatches('[0-9]+', '#')"), "a#b#c");
    assert_eq!(literal_error("'abc'.replaceMatches('[', 'x')"), ErrorKind::InvalidArgument);
}

#[test]
fn test_concatenation() {
    assert_eq!(string("'ab' & 'cd'"), "abcd");
    assert_eq!(string("'ab' & {}"), "ab");
    assert_eq!(string("{} & {}"), "");
    assert_eq!(string("'ab' + 'cd'"), "abcd");
    assert!(is_empty("'ab' + {}"));
}

#[test]
fn test_string_functions_accept_codes() {
    let patient = patient();
    let result = eval("Patient", "gender.upper()", &patient).unwrap();
    assert_eq!(result.get_string().unwrap(), "MALE");

    let result = eval("Patient", "name.first().family.length()", &patient).unwrap();
    assert_eq!(result.get_integer().unwrap(), 8);
}

#[test]
fn test_escapes() {
    assert_eq!(string(r"'a\tb'"), "a\tb");
    assert_eq!(string(r"'it\'s'"), "it's");
    assert_eq!(string(r"'\u0041'"), "A");
    assert_eq!(string(r"'\/'"), "/");
    assert_eq!(string(r"'\x20'"), " ");
    assert_eq!(string(r"'\x00000020'"), " ");
    assert_eq!(string(r"'\123'"), "S");
    assert_eq!(string(r"'\q'"), "q");
}

#[test]
fn test_comments_are_ignored() {
    assert_eq!(string("'a' // trailing comment"), "a");
    assert_eq!(string("/* leading */ 'a' & /* inner */ 'b'"), "ab");
}
