//! Error taxonomy tests: every failure kind, line attribution, and path
//! attachment.

use std::io::Write;

use jaml::{JamlErrorKind, Registry, Shape, ShapeError, from_lines, from_str, jaml_record};

#[derive(Debug, Default, PartialEq)]
struct Person {
    name: String,
    age: i64,
}

fn person_registry() -> Registry {
    let mut registry = Registry::new();
    jaml_record!(registry, Person as "Person" { name: String, age: i64 });
    registry
}

// ============================================================================
// UnknownField
// ============================================================================

#[test]
fn unknown_field_fails_with_line_number() {
    let err = from_lines::<Person, _, _>(&person_registry(), ["foo: 1"]).unwrap_err();
    assert_eq!(err.line, Some(1));
    match err.kind {
        JamlErrorKind::UnknownField { field, expected, .. } => {
            assert_eq!(field, "foo");
            assert_eq!(expected, vec!["name", "age"]);
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

#[test]
fn unknown_field_suggests_a_near_miss() {
    let err = from_lines::<Person, _, _>(&person_registry(), ["nmae: Bob"]).unwrap_err();
    match err.kind {
        JamlErrorKind::UnknownField { suggestion, .. } => {
            assert_eq!(suggestion, Some("name"));
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

#[test]
fn unknown_field_is_never_silently_ignored() {
    // A later valid line does not rescue the parse.
    let err =
        from_lines::<Person, _, _>(&person_registry(), ["name: Bob", "foo: 1", "age: 7"])
            .unwrap_err();
    assert_eq!(err.line, Some(2));
}

#[test]
fn scalar_cannot_own_a_block() {
    let err = from_lines::<Person, _, _>(&person_registry(), ["age: 5", "  x: 1"]).unwrap_err();
    assert_eq!(err.line, Some(2));
    match err.kind {
        JamlErrorKind::UnknownField { field, expected, .. } => {
            assert_eq!(field, "x");
            assert!(expected.is_empty());
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

// ============================================================================
// Syntax
// ============================================================================

#[test]
fn line_without_separator_is_a_syntax_error() {
    let err = from_lines::<Person, _, _>(&person_registry(), ["name Bob"]).unwrap_err();
    assert_eq!(err.line, Some(1));
    assert!(matches!(err.kind, JamlErrorKind::Syntax { .. }));
}

#[test]
fn indented_first_line_is_a_syntax_error() {
    // The base layer is pinned at width 0 and has no value to attach a
    // deeper block to.
    let err = from_lines::<Person, _, _>(&person_registry(), ["  name: Bob"]).unwrap_err();
    assert_eq!(err.line, Some(1));
    assert!(matches!(err.kind, JamlErrorKind::Syntax { .. }));
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn conversion_failure_names_text_and_type() {
    let err =
        from_lines::<Person, _, _>(&person_registry(), ["name: Bob", "age: seven"]).unwrap_err();
    assert_eq!(err.line, Some(2));
    match err.kind {
        JamlErrorKind::Conversion { value, target } => {
            assert_eq!(value, "seven");
            assert_eq!(target, "i64");
        }
        other => panic!("expected Conversion, got {other:?}"),
    }
}

// ============================================================================
// Constructor errors
// ============================================================================

#[derive(Debug, Default, PartialEq, Clone)]
struct Point {
    x: i64,
    y: i64,
}

#[derive(Debug, Default, PartialEq)]
struct Label {
    text: String,
}

#[derive(Debug, Default, PartialEq)]
struct Sketch {
    origin: Point,
}

fn sketch_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(
        Shape::record::<Point>("Point")
            .field("x", |point: &mut Point, value: i64| point.x = value)
            .field("y", |point: &mut Point, value: i64| point.y = value)
            .with_default()
            .ctor2(|x: i64, y: i64| Point { x, y })
            .build(),
    );
    registry.register(
        Shape::record::<Label>("Label")
            .field("text", |label: &mut Label, value: String| label.text = value)
            .with_default()
            .ctor1(|text: String| Label { text })
            .build(),
    );
    jaml_record!(registry, Sketch as "Sketch" { origin: Point });
    registry
}

#[test]
fn unbalanced_call_is_malformed() {
    let err = from_lines::<Sketch, _, _>(&sketch_registry(), ["origin: Point(1,2"]).unwrap_err();
    assert_eq!(err.line, Some(1));
    match err.kind {
        JamlErrorKind::MalformedConstructor { text } => assert_eq!(text, "Point(1,2"),
        other => panic!("expected MalformedConstructor, got {other:?}"),
    }
}

#[test]
fn unknown_class_path() {
    let err = from_lines::<Sketch, _, _>(&sketch_registry(), ["origin: Pointy(1,2)"]).unwrap_err();
    match err.kind {
        JamlErrorKind::UnknownType { path } => assert_eq!(path, "Pointy"),
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

#[test]
fn wrong_arity_has_no_matching_constructor() {
    let err =
        from_lines::<Sketch, _, _>(&sketch_registry(), ["origin: Point(1,2,3)"]).unwrap_err();
    match err.kind {
        JamlErrorKind::NoMatchingConstructor { text, target } => {
            assert_eq!(text, "Point(1,2,3)");
            assert_eq!(target, "Point");
        }
        other => panic!("expected NoMatchingConstructor, got {other:?}"),
    }
}

#[test]
fn uncoercible_arguments_have_no_matching_constructor() {
    let err =
        from_lines::<Sketch, _, _>(&sketch_registry(), ["origin: Point(one,two)"]).unwrap_err();
    assert!(matches!(
        err.kind,
        JamlErrorKind::NoMatchingConstructor { .. }
    ));
}

#[test]
fn unregistered_generic_instantiation_is_unknown() {
    let mut registry = Registry::new();
    registry.register_list::<i64>();

    #[derive(Debug, Default)]
    struct Bag {
        nums: Vec<i64>,
    }
    jaml_record!(registry, Bag as "Bag" { nums: Vec<i64> });

    let err = from_lines::<Bag, _, _>(&registry, ["nums: List<string>"]).unwrap_err();
    match err.kind {
        JamlErrorKind::UnknownType { path } => assert_eq!(path, "List<string>"),
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

#[test]
fn constructing_an_unrelated_type_fails_at_attachment() {
    // `Label` resolves and constructs, but the field is declared as
    // `Point`; the mismatch surfaces when the value is attached.
    let err =
        from_lines::<Sketch, _, _>(&sketch_registry(), ["origin: Label(hello)"]).unwrap_err();
    assert!(matches!(
        err.kind,
        JamlErrorKind::Shape(ShapeError::TypeMismatch { .. })
    ));
}

// ============================================================================
// Root construction
// ============================================================================

#[derive(Debug, Default)]
struct Unregistered {
    #[allow(dead_code)]
    n: i64,
}

#[test]
fn unregistered_root_type_is_unknown() {
    let registry = Registry::new();
    let err = from_str::<Unregistered>(&registry, "n: 1").unwrap_err();
    assert_eq!(err.line, None);
    assert!(matches!(err.kind, JamlErrorKind::UnknownType { .. }));
}

// ============================================================================
// Files and display
// ============================================================================

#[test]
fn missing_file_fails_with_io_and_path() {
    let registry = person_registry();
    let err =
        jaml::from_path::<Person>(&registry, "/nonexistent/jaml/config.jaml").unwrap_err();
    assert!(matches!(err.kind, JamlErrorKind::Io(_)));
    assert_eq!(err.path.as_deref(), Some("/nonexistent/jaml/config.jaml"));
}

#[test]
fn file_errors_carry_path_and_line() {
    let registry = person_registry();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name: Bob").unwrap();
    writeln!(file, "age: seven").unwrap();
    file.flush().unwrap();

    let err = jaml::from_path::<Person>(&registry, file.path()).unwrap_err();
    assert_eq!(err.line, Some(2));
    assert_eq!(err.path.as_deref(), Some(&*file.path().display().to_string()));

    let rendered = err.to_string();
    assert!(rendered.contains(":2:"), "unexpected rendering: {rendered}");
    assert!(rendered.contains("seven"), "unexpected rendering: {rendered}");
}

#[test]
fn file_round_trip() {
    let registry = person_registry();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# from disk").unwrap();
    writeln!(file, "name: Alice").unwrap();
    writeln!(file, "age: 30").unwrap();
    file.flush().unwrap();

    let person: Person = jaml::from_path(&registry, file.path()).unwrap();
    assert_eq!(
        person,
        Person {
            name: "Alice".to_string(),
            age: 30
        }
    );
}
