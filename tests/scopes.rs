//! Scope trees produced from nested blocks.

mod common;

use common::{lower, session_with, Block, Method, Stmt};
use proptest::prelude::*;
use symscope::{debuginfo::scope::Scope, prelude::*};

#[derive(Debug, Clone)]
enum Shape {
    Local,
    Call,
    Nested(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![Just(Shape::Local), Just(Shape::Call)];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Shape::Nested)
    })
}

/// Writes the source for `shapes` and returns the matching statements.
fn render(shapes: &[Shape], text: &mut String, counter: &mut usize) -> Vec<Stmt> {
    let mut body = Vec::new();
    for shape in shapes {
        match shape {
            Shape::Local => {
                let statement = format!("int v{counter} = 1;");
                let start = text.len();
                text.push_str(&statement);
                text.push(' ');
                body.push(Stmt::Local {
                    name: format!("v{counter}"),
                    span: (start, start + statement.len()),
                });
                *counter += 1;
            }
            Shape::Call => {
                let start = text.len();
                text.push_str("W(); ");
                body.push(Stmt::Call {
                    span: (start, start + 4),
                });
            }
            Shape::Nested(inner) => body.push(Stmt::Block(block(inner, text, counter))),
        }
    }
    body
}

fn block(shapes: &[Shape], text: &mut String, counter: &mut usize) -> Block {
    let open = (text.len(), text.len() + 1);
    text.push_str("{ ");
    let body = render(shapes, text, counter);
    let close = (text.len(), text.len() + 1);
    text.push_str("} ");
    Block::new(open, close, body)
}

fn scoped_blocks(shapes: &[Shape]) -> usize {
    shapes
        .iter()
        .map(|shape| match shape {
            Shape::Nested(inner) => {
                let own = usize::from(inner.iter().any(|s| matches!(s, Shape::Local)));
                own + scoped_blocks(inner)
            }
            _ => 0,
        })
        .sum()
}

fn check_nesting(scope: &Scope) -> std::result::Result<(), TestCaseError> {
    prop_assert!(scope.start_offset <= scope.end_offset);
    for local in &scope.locals {
        prop_assert!(scope.start_offset <= local.live_start && local.live_end <= scope.end_offset);
    }
    for child in &scope.children {
        prop_assert!(scope.contains(child), "{child:?} escapes {scope:?}");
        check_nesting(child)?;
    }
    for pair in scope.children.windows(2) {
        prop_assert!(pair[0].end_offset <= pair[1].start_offset);
    }
    Ok(())
}

proptest! {
    #[test]
    fn nested_blocks_produce_well_formed_scopes(shapes in prop::collection::vec(shape(), 0..6)) {
        let mut text = String::from("class C { void M() ");
        let mut counter = 0;
        let body = block(&shapes, &mut text, &mut counter);
        text.push('}');

        let (session, source) = session_with("s.cs", &text).unwrap();
        let method = Method::new(MethodIdentity::new("C", "M", 1), body);
        let info = lower(&session, source, &method).unwrap();
        let document = session.emit(&[info]).unwrap();
        let root = &document.methods[0].root_scope;

        check_nesting(root)?;
        prop_assert_eq!(root.start_offset, 0);
        prop_assert_eq!(root.walk().count(), 1 + scoped_blocks(&shapes));
        prop_assert_eq!(root.all_locals().count(), counter);
    }
}

#[test]
fn test_overlapping_sibling_is_rejected() -> Result<()> {
    let (session, _) = session_with("a.cs", "{}")?;
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    builder.begin_scope(2)?;
    builder.end_scope(6)?;

    let error = builder.begin_scope(4).unwrap_err();
    assert!(matches!(error, Error::InvalidScope { offset: 4, .. }));
    Ok(())
}

#[test]
fn test_child_before_parent_is_rejected() -> Result<()> {
    let (session, _) = session_with("a.cs", "{}")?;
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    builder.begin_scope(5)?;

    assert!(matches!(
        builder.begin_scope(3),
        Err(Error::InvalidScope { offset: 3, .. })
    ));
    Ok(())
}

#[test]
fn test_closing_root_is_rejected() -> Result<()> {
    let (session, _) = session_with("a.cs", "{}")?;
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    assert!(matches!(
        builder.end_scope(1),
        Err(Error::InvalidScope { .. })
    ));
    Ok(())
}

#[test]
fn test_unclosed_scope_fails_finish() -> Result<()> {
    let (session, _) = session_with("a.cs", "{}")?;
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    builder.begin_scope(1)?;

    let error = builder.finish(4).unwrap_err();
    assert!(matches!(error, Error::InvalidScope { offset: 1, .. }));
    Ok(())
}

#[test]
fn test_adjacent_siblings_are_allowed() -> Result<()> {
    let (session, _) = session_with("a.cs", "{}")?;
    let mut builder = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
    builder.begin_scope(0)?;
    builder.declare_local(LocalDeclaration::user("a", 0))?;
    builder.end_scope(3)?;
    builder.begin_scope(3)?;
    builder.declare_local(LocalDeclaration::user("b", 5))?;
    builder.end_scope(6)?;
    let info = builder.finish(6)?;

    let document = session.emit(&[info])?;
    let root = &document.methods[0].root_scope;
    let ranges: Vec<(u32, u32)> = root
        .children
        .iter()
        .map(|s| (s.start_offset, s.end_offset))
        .collect();
    assert_eq!(ranges, vec![(0, 3), (3, 6)]);
    assert_eq!(root.all_locals().map(|l| l.slot).collect::<Vec<_>>(), vec![0, 1]);
    Ok(())
}
