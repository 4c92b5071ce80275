//! A tiny code generator used by the integration tests.
//!
//! Statement trees are lowered into builder events with the IL sizes a debug build of a
//! C# compiler produces for them:
//!
//! | Construct | IL | Sequence points |
//! |-----------|----|-----------------|
//! | block `{` / `}` | `nop` (1) | open and close brace |
//! | method body `}` | `ret` (1) | close brace, only when reachable |
//! | `int x = 1;` | `ldc.i4.1; stloc` (2) | statement |
//! | `Write(1);` | `ldc.i4.1; call; nop` (7) | statement |
//! | `for(;;) body` | `br.s` (2) + body + `br.s` (2) | hidden entry, hidden back edge |
//!
//! A nested block opens a scope only when it declares locals or constants.

#![allow(dead_code)]

use std::sync::Once;

use symscope::prelude::*;

static TRACING_INIT: Once = Once::new();

/// Route `tracing` output to the test harness when `RUST_LOG` is set,
/// e.g. `RUST_LOG=symscope=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// Byte range inside a source text.
pub type Span = (usize, usize);

/// Span of the `nth` (0-based) occurrence of `needle` in `text`.
pub fn span(text: &str, needle: &str, nth: usize) -> Span {
    let start = text
        .match_indices(needle)
        .nth(nth)
        .map(|(index, _)| index)
        .unwrap_or_else(|| panic!("`{needle}` #{nth} not found"));
    (start, start + needle.len())
}

/// A statement of the mock language.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `int name = 1;`
    Local { name: String, span: Span },
    /// `const T name = value;` (no IL)
    Const(ConstantRecord),
    /// A void call statement
    Call { span: Span },
    /// A nested block
    Block(Block),
    /// `for(;;) body`
    InfiniteFor(Block),
}

/// `{ ... }`
#[derive(Debug, Clone)]
pub struct Block {
    pub open: Span,
    pub close: Span,
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new(open: Span, close: Span, body: Vec<Stmt>) -> Self {
        Block { open, close, body }
    }

    fn declares_names(&self) -> bool {
        self.body
            .iter()
            .any(|stmt| matches!(stmt, Stmt::Local { .. } | Stmt::Const(_)))
    }
}

/// A method to lower.
#[derive(Debug, Clone)]
pub struct Method {
    pub identity: MethodIdentity,
    pub kind: MethodKind,
    pub imports: Vec<ImportRecord>,
    pub body: Block,
}

impl Method {
    pub fn new(identity: MethodIdentity, body: Block) -> Self {
        Method {
            identity,
            kind: MethodKind::Ordinary,
            imports: Vec::new(),
            body,
        }
    }

    pub fn with_kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_imports(mut self, imports: Vec<ImportRecord>) -> Self {
        self.imports = imports;
        self
    }
}

struct Lowering<'a> {
    builder: MethodDebugInfoBuilder<'a>,
    source: SourceId,
    body_start: usize,
    offset: u32,
    reachable: bool,
}

impl Lowering<'_> {
    fn point(&mut self, span: Span) -> Result<()> {
        self.builder
            .sequence_point(self.offset, RawSpan::new(self.source, span.0, span.1))?;
        Ok(())
    }

    fn hidden(&mut self, reason: HiddenReason) -> Result<()> {
        self.builder.hidden_sequence_point(self.offset, reason)?;
        Ok(())
    }

    fn statements(&mut self, body: &[Stmt]) -> Result<()> {
        for stmt in body {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Local { name, span } => {
                self.point(*span)?;
                let syntax_offset = i32::try_from(span.0 - self.body_start).unwrap_or(i32::MAX);
                self.builder
                    .declare_local(LocalDeclaration::user(name.clone(), syntax_offset))?;
                self.offset += 2;
            }
            Stmt::Const(record) => {
                self.builder.declare_constant(record.clone())?;
            }
            Stmt::Call { span } => {
                self.point(*span)?;
                self.offset += 7;
            }
            Stmt::Block(block) => self.nested_block(block)?,
            Stmt::InfiniteFor(block) => {
                self.hidden(HiddenReason::LoopEntry)?;
                self.offset += 2;
                self.nested_block(block)?;
                self.hidden(HiddenReason::LoopBackEdge)?;
                self.offset += 2;
                self.reachable = false;
            }
        }
        Ok(())
    }

    fn nested_block(&mut self, block: &Block) -> Result<()> {
        let scoped = block.declares_names();
        if scoped {
            self.builder.begin_scope(self.offset)?;
        }
        self.point(block.open)?;
        self.offset += 1;
        self.statements(&block.body)?;
        self.point(block.close)?;
        self.offset += 1;
        if scoped {
            self.builder.end_scope(self.offset)?;
        }
        Ok(())
    }
}

/// Lower `method` against `source` and finish its debug information.
pub fn lower(session: &DebugInfoSession, source: SourceId, method: &Method) -> Result<MethodDebugInfo> {
    let mut builder = session.method_builder(method.identity.clone(), method.kind.clone());
    for import in &method.imports {
        builder.declare_import(import.clone())?;
    }

    let mut lowering = Lowering {
        builder,
        source,
        body_start: method.body.open.0,
        offset: 0,
        reachable: true,
    };

    lowering.point(method.body.open)?;
    lowering.offset += 1;
    lowering.statements(&method.body.body)?;
    if lowering.reachable {
        lowering.point(method.body.close)?;
        lowering.offset += 1;
    }

    let il_length = lowering.offset;
    lowering.builder.finish(il_length)
}

/// A debug session with one registered source.
pub fn session_with(path: &str, text: &str) -> Result<(DebugInfoSession, SourceId)> {
    init_tracing();
    let session = DebugInfoSession::new(EmitConfig::debug());
    let source = session.add_source(SourceText::new(path, text), &[], &[])?;
    Ok((session, source))
}

/// The first `<tag ...>...</tag>` or `<tag .../>` element of `xml`, with its indentation
/// removed line by line.
pub fn element(xml: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let start = xml
        .match_indices(&open)
        .map(|(index, _)| index)
        .find(|index| {
            xml[index + open.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == ' ' || c == '>' || c == '/')
        })
        .unwrap_or_else(|| panic!("no <{tag}> element"));

    let rest = &xml[start..];
    let first_line_end = rest.find('>').unwrap_or(rest.len());
    let end = if rest[..=first_line_end].ends_with("/>") {
        first_line_end + 1
    } else {
        let close = format!("</{tag}>");
        rest.find(&close).map(|i| i + close.len()).unwrap_or(rest.len())
    };

    rest[..end]
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}
