//! Lexical scope tree of one method.
//!
//! While a method is generated, scopes live in an arena ([`ScopeTree`]) and refer to
//! their parent and children by [`ScopeId`]. The root scope is open from the start and
//! is closed by [`ScopeTree::finish`] with the method's IL length; the result is an owned,
//! nested [`Scope`] value.
//!
//! # Invariants
//!
//! - Scopes close innermost first and are never reopened.
//! - A child's `[start, end)` lies inside its parent's.
//! - Siblings do not overlap; a new child may start where the previous one ended.

use crate::{
    debuginfo::{
        constants::ConstantRecord, importscope::ImportRecord, locals::LocalRecord,
    },
    Error, Result,
};

/// Index of a scope in its method's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The root scope of every method.
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone)]
struct PendingLocal {
    record: LocalRecord,
    explicit_range: bool,
}

#[derive(Debug, Clone)]
struct ScopeNode {
    start: u32,
    end: Option<u32>,
    children: Vec<ScopeId>,
    locals: Vec<PendingLocal>,
    constants: Vec<ConstantRecord>,
    imports: Vec<ImportRecord>,
}

impl ScopeNode {
    fn new(start: u32) -> Self {
        ScopeNode {
            start,
            end: None,
            children: Vec::new(),
            locals: Vec::new(),
            constants: Vec::new(),
            imports: Vec::new(),
        }
    }
}

/// A closed scope with its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// First IL offset covered
    pub start_offset: u32,
    /// First IL offset after the scope
    pub end_offset: u32,
    /// Nested scopes in IL order
    pub children: Vec<Scope>,
    /// Locals in declaration order
    pub locals: Vec<LocalRecord>,
    /// Constants in declaration order
    pub constants: Vec<ConstantRecord>,
}

impl Scope {
    /// Returns `true` if `other` lies within this scope.
    #[must_use]
    pub fn contains(&self, other: &Scope) -> bool {
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// Depth-first iterator over this scope and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Scope> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let scope = stack.pop()?;
            stack.extend(scope.children.iter().rev());
            Some(scope)
        })
    }

    /// All locals of the tree, depth first.
    pub fn all_locals(&self) -> impl Iterator<Item = &LocalRecord> {
        self.walk().flat_map(|scope| scope.locals.iter())
    }

    /// All constants of the tree, depth first.
    pub fn all_constants(&self) -> impl Iterator<Item = &ConstantRecord> {
        self.walk().flat_map(|scope| scope.constants.iter())
    }
}

/// Arena of scopes under construction.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
    open: Vec<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree whose root is open at offset 0.
    #[must_use]
    pub fn new() -> Self {
        ScopeTree {
            nodes: vec![ScopeNode::new(0)],
            open: vec![ScopeId::ROOT],
        }
    }

    /// Innermost open scope.
    #[must_use]
    pub fn current(&self) -> ScopeId {
        self.open.last().copied().unwrap_or(ScopeId::ROOT)
    }

    /// Number of scopes created so far, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; the root exists from the start.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: ScopeId) -> Result<&ScopeNode> {
        self.nodes
            .get(id.0 as usize)
            .ok_or_else(|| malformed_error!("Unknown scope {:?}", id))
    }

    fn open_node_mut(&mut self, id: ScopeId) -> Result<&mut ScopeNode> {
        if !self.open.contains(&id) {
            let offset = self.node(id)?.start;
            return Err(Error::InvalidScope {
                offset,
                message: format!("scope {} is already closed", id.0),
            });
        }
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| malformed_error!("Unknown scope {:?}", id))
    }

    /// Open a child of the current scope at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if `offset` lies before the parent's start or
    /// inside the previous sibling.
    pub fn begin(&mut self, offset: u32) -> Result<ScopeId> {
        let parent_id = self.current();
        let parent = self.node(parent_id)?;

        if offset < parent.start {
            return Err(Error::InvalidScope {
                offset,
                message: format!("child starts before its parent (0x{:x})", parent.start),
            });
        }
        if let Some(previous) = parent.children.last() {
            let previous_end = self.node(*previous)?.end.unwrap_or(u32::MAX);
            if offset < previous_end {
                return Err(Error::InvalidScope {
                    offset,
                    message: format!("overlaps previous sibling ending at 0x{previous_end:x}"),
                });
            }
        }

        let id = ScopeId(crate::utils::to_u32(self.nodes.len())?);
        self.nodes.push(ScopeNode::new(offset));
        self.open_node_mut(parent_id)?.children.push(id);
        self.open.push(id);
        Ok(id)
    }

    /// Close the innermost open scope at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if only the root is open, if `offset` precedes the
    /// scope's start, or if a child ends after `offset`.
    pub fn end(&mut self, offset: u32) -> Result<ScopeId> {
        if self.open.len() <= 1 {
            return Err(Error::InvalidScope {
                offset,
                message: "no open scope to close".to_string(),
            });
        }
        let id = self.current();
        self.close(id, offset)?;
        self.open.pop();
        Ok(id)
    }

    fn close(&mut self, id: ScopeId, offset: u32) -> Result<()> {
        let node = self.node(id)?;
        if offset < node.start {
            return Err(Error::InvalidScope {
                offset,
                message: format!("scope ends before its start (0x{:x})", node.start),
            });
        }
        if let Some(last_child) = node.children.last() {
            let child_end = self.node(*last_child)?.end.unwrap_or(u32::MAX);
            if child_end > offset {
                return Err(Error::InvalidScope {
                    offset,
                    message: format!("child scope ends after its parent (0x{child_end:x})"),
                });
            }
        }

        let node = self.open_node_mut(id)?;
        node.end = Some(offset);
        let start = node.start;
        for local in node.locals.iter_mut().filter(|l| !l.explicit_range) {
            local.record.live_start = start;
            local.record.live_end = offset;
        }
        Ok(())
    }

    /// Record a local in the open scope `scope`.
    ///
    /// Without an explicit live range the local lives as long as the scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if `scope` is closed.
    pub fn add_local(&mut self, scope: ScopeId, record: LocalRecord, explicit_range: bool) -> Result<()> {
        self.open_node_mut(scope)?.locals.push(PendingLocal {
            record,
            explicit_range,
        });
        Ok(())
    }

    /// Record a constant in the open scope `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if `scope` is closed.
    pub fn add_constant(&mut self, scope: ScopeId, record: ConstantRecord) -> Result<()> {
        self.open_node_mut(scope)?.constants.push(record);
        Ok(())
    }

    /// Record an import in the open scope `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if `scope` is closed.
    pub fn add_import(&mut self, scope: ScopeId, record: ImportRecord) -> Result<()> {
        self.open_node_mut(scope)?.imports.push(record);
        Ok(())
    }

    /// Import levels, innermost scope first.
    ///
    /// Deeper scopes come first; scopes at the same depth keep their opening order.
    #[must_use]
    pub fn import_levels(&self) -> Vec<Vec<ImportRecord>> {
        let mut with_depth: Vec<(usize, usize)> = Vec::new();
        let mut stack = vec![(ScopeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id.0 as usize) else {
                continue;
            };
            if !node.imports.is_empty() {
                with_depth.push((id.0 as usize, depth));
            }
            stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        with_depth.sort_by(|a, b| b.1.cmp(&a.1));
        with_depth
            .into_iter()
            .map(|(index, _)| self.nodes[index].imports.clone())
            .collect()
    }

    /// Close the root at `il_length` and produce the nested tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] if a scope other than the root is still open or a
    /// scope extends past `il_length`.
    pub fn finish(mut self, il_length: u32) -> Result<Scope> {
        if self.open.len() > 1 {
            let unclosed = self.node(self.current())?.start;
            return Err(Error::InvalidScope {
                offset: unclosed,
                message: "scope was never closed".to_string(),
            });
        }
        self.close(ScopeId::ROOT, il_length)?;
        self.build(ScopeId::ROOT)
    }

    fn build(&self, id: ScopeId) -> Result<Scope> {
        let node = self.node(id)?;
        let end = node
            .end
            .ok_or_else(|| malformed_error!("Scope {:?} has no end", id))?;

        let children = node
            .children
            .iter()
            .map(|child| self.build(*child))
            .collect::<Result<Vec<_>>>()?;

        Ok(Scope {
            start_offset: node.start,
            end_offset: end,
            children,
            locals: node.locals.iter().map(|l| l.record.clone()).collect(),
            constants: node.constants.clone(),
        })
    }
}
