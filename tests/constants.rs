//! Local constants: literal encoding, display and size limits.

mod common;

use common::{element, lower, session_with, span, Block, Method, Stmt};
use symscope::{
    debuginfo::{
        config::DEFAULT_MAX_CONSTANT_STRING_LEN,
        constants::{decode_constant, encode_constant},
    },
    prelude::*,
};

const SOURCE: &str = "class C { void M() { const decimal d = 1.5m; Write(d); } }";

fn method_with(constant: ConstantRecord) -> Method {
    Method::new(
        MethodIdentity::new("C", "M", 1),
        Block::new(
            span(SOURCE, "{", 1),
            span(SOURCE, "}", 0),
            vec![
                Stmt::Const(constant),
                Stmt::Call {
                    span: span(SOURCE, "Write(d);", 0),
                },
            ],
        ),
    )
}

#[test]
fn test_decimal_constant() -> Result<()> {
    let value = ConstantValue::Decimal(DecimalValue::new(15, 1, false)?);
    assert_eq!(value.display_value(), "1.5");
    assert_eq!(decode_constant(&encode_constant(&value)?)?, value);

    let (session, source) = session_with("a.cs", SOURCE)?;
    let info = lower(&session, source, &method_with(ConstantRecord::new("d", value)))?;
    let xml = session.emit(&[info])?.to_xml()?;

    assert_eq!(
        element(&xml, "constant"),
        r#"<constant name="d" value="1.5" type="Decimal"/>"#
    );
    Ok(())
}

#[test]
fn test_double_uses_round_trip_precision() {
    assert_eq!(
        ConstantValue::R8(f64::MAX).display_value(),
        "1.79769313486232E+308"
    );
    assert_eq!(ConstantValue::R8(0.1).display_value(), "0.1");
}

#[test]
fn test_declared_type_overrides_runtime_type() -> Result<()> {
    let (session, source) = session_with("a.cs", SOURCE)?;
    let constant = ConstantRecord::new(
        "o",
        ConstantValue::Null {
            type_token: Token::new(0x0200_0002),
        },
    )
    .with_declared_type("System.Collections.Generic.List`1[System.Int32]");
    let info = lower(&session, source, &method_with(constant))?;
    let xml = session.emit(&[info])?.to_xml()?;

    assert_eq!(
        element(&xml, "constant"),
        r#"<constant name="o" value="null" type="System.Collections.Generic.List`1[System.Int32]"/>"#
    );
    Ok(())
}

#[test]
fn test_oversized_string_is_dropped() -> Result<()> {
    let (session, source) = session_with("a.cs", SOURCE)?;
    let long = "x".repeat(DEFAULT_MAX_CONSTANT_STRING_LEN + 1);
    let exact = "y".repeat(DEFAULT_MAX_CONSTANT_STRING_LEN);

    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    let (start, end) = span(SOURCE, "Write(d);", 0);
    builder.sequence_point(0, RawSpan::new(source, start, end))?;
    assert!(!builder.declare_constant(ConstantRecord::new("s", ConstantValue::String(long)))?);
    assert!(builder.declare_constant(ConstantRecord::new("t", ConstantValue::String(exact)))?);
    let info = builder.finish(7)?;

    let document = session.emit(&[info])?;
    let method = document.method("C", "M").expect("method");
    let names: Vec<&str> = method
        .root_scope
        .all_constants()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["t"]);
    assert_eq!(method.sequence_points.len(), 1);
    assert!(!session.diagnostics().has_any());
    Ok(())
}

#[test]
fn test_surrogate_pairs_count_as_two_units() -> Result<()> {
    let (session, _) = session_with("a.cs", SOURCE)?;
    // Each emoji is two UTF-16 units.
    let text = "\u{1F600}".repeat(DEFAULT_MAX_CONSTANT_STRING_LEN / 2 + 1);
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    assert!(!builder.declare_constant(ConstantRecord::new("e", ConstantValue::String(text)))?);
    Ok(())
}
