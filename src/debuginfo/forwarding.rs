//! Import forwarding between methods of the same type.
//!
//! Writing the full import list for every method would repeat the same `using` context
//! over and over. Instead, a method whose flattened imports equal those of an earlier
//! method of the same declaring type only records a reference to that method.
//!
//! # Rules
//!
//! - `MoveNext` of a state machine always forwards to its kickoff method.
//! - A method with imports forwards to the first earlier method of its type that wrote
//!   an identical list in full, unless it opted out of forwarding.
//! - A synthesized member without imports of its own (constructors, accessors)
//!   forwards to the first user method of its type that has imports, wherever that
//!   method sits in emission order.
//! - Anything else without imports forwards to the module-level method when one is
//!   configured, and writes nothing otherwise.
//!
//! Forwarding never crosses types and never targets a method that forwards itself.

use std::collections::HashMap;

use crate::debuginfo::{
    importscope::ImportLevels,
    method::{MethodDebugInfo, MethodKind},
    token::Token,
};

/// How a method's imports are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportForm {
    /// No import record at all
    None,
    /// The full import list and per-level counts
    Full,
    /// Same imports as the given method
    Forward(Token),
    /// Imports of the module-level method
    ForwardToModule(Token),
}

#[derive(Default)]
struct TypeState<'a> {
    written: Vec<(&'a ImportLevels, Token)>,
    anchor: Option<Token>,
}

/// Decides the [`ImportForm`] of every method of a compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardingResolver {
    module_method: Option<Token>,
}

impl ForwardingResolver {
    /// Resolver without a module-level method.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward methods without imports to `token`.
    #[must_use]
    pub fn with_module_method(mut self, token: Option<Token>) -> Self {
        self.module_method = token;
        self
    }

    /// Import form for each of `methods`, in the same order.
    ///
    /// `methods` must be in emission order; "earlier" refers to that order.
    #[must_use]
    pub fn resolve(&self, methods: &[MethodDebugInfo]) -> Vec<ImportForm> {
        let mut types: HashMap<&str, TypeState<'_>> = HashMap::new();

        for method in methods {
            if method.kind.is_user_code() && !method.imports.is_empty() {
                let state = types
                    .entry(method.identity.containing_type.as_str())
                    .or_default();
                state.anchor.get_or_insert(method.identity.token);
            }
        }

        methods
            .iter()
            .map(|method| {
                let state = types
                    .entry(method.identity.containing_type.as_str())
                    .or_default();
                let form = self.decide(method, state);
                if form != ImportForm::Full && form != ImportForm::None {
                    tracing::debug!(method = %method.identity, ?form, "forwarding imports");
                }
                form
            })
            .collect()
    }

    fn decide<'a>(&self, method: &'a MethodDebugInfo, state: &mut TypeState<'a>) -> ImportForm {
        let token = method.identity.token;

        if let MethodKind::StateMachineMoveNext { kickoff } = method.kind {
            return ImportForm::Forward(kickoff);
        }

        if method.imports.is_empty() {
            if method.kind == MethodKind::Synthesized {
                if let Some(anchor) = state.anchor.filter(|anchor| *anchor != token) {
                    return ImportForm::Forward(anchor);
                }
            }
            return match self.module_method {
                Some(module) if module != token => ImportForm::ForwardToModule(module),
                _ => ImportForm::None,
            };
        }

        if method.identity.forward_candidate {
            if let Some((_, target)) = state
                .written
                .iter()
                .find(|(imports, _)| **imports == method.imports)
            {
                return ImportForm::Forward(*target);
            }
        }

        state.written.push((&method.imports, token));
        ImportForm::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::{
        importscope::ImportRecord,
        method::MethodIdentity,
        scope::ScopeTree,
    };

    fn method(type_name: &str, row: u32, kind: MethodKind, imports: &[&str]) -> MethodDebugInfo {
        MethodDebugInfo {
            identity: MethodIdentity::new(type_name, format!("M{row}"), row),
            kind,
            sequence_points: Vec::new(),
            root_scope: ScopeTree::new().finish(0).unwrap(),
            imports: ImportLevels::new(vec![imports
                .iter()
                .map(|name| ImportRecord::namespace(*name))
                .collect()]),
            slots: Vec::new(),
            hoisted_scopes: Vec::new(),
            il_length: 0,
        }
    }

    #[test]
    fn siblings_forward_to_first_writer() {
        let methods = vec![
            method("C", 1, MethodKind::Ordinary, &["System"]),
            method("C", 2, MethodKind::Ordinary, &["System"]),
            method("C", 3, MethodKind::Ordinary, &["System.IO"]),
            method("D", 4, MethodKind::Ordinary, &["System"]),
        ];
        let forms = ForwardingResolver::new().resolve(&methods);
        assert_eq!(
            forms,
            vec![
                ImportForm::Full,
                ImportForm::Forward(Token::method_def(1)),
                ImportForm::Full,
                ImportForm::Full,
            ]
        );
    }

    #[test]
    fn opt_out_writes_full() {
        let mut second = method("C", 2, MethodKind::Ordinary, &["System"]);
        second.identity = second.identity.without_forwarding();
        let methods = vec![method("C", 1, MethodKind::Ordinary, &["System"]), second];
        assert_eq!(
            ForwardingResolver::new().resolve(&methods)[1],
            ImportForm::Full
        );
    }

    #[test]
    fn synthesized_members_anchor_on_first_user_method() {
        let methods = vec![
            method("C", 1, MethodKind::Synthesized, &[]),
            method("C", 2, MethodKind::Ordinary, &[]),
            method("C", 3, MethodKind::Ordinary, &["System"]),
            method("C", 4, MethodKind::Synthesized, &[]),
        ];
        let forms = ForwardingResolver::new().resolve(&methods);
        assert_eq!(forms[0], ImportForm::Forward(Token::method_def(3)));
        assert_eq!(forms[1], ImportForm::None);
        assert_eq!(forms[2], ImportForm::Full);
        assert_eq!(forms[3], ImportForm::Forward(Token::method_def(3)));
    }

    #[test]
    fn move_next_forwards_to_kickoff() {
        let methods = vec![
            method(
                "C",
                1,
                MethodKind::StateMachineKickoff {
                    state_machine_type: "<M1>d__0".to_string(),
                },
                &["System"],
            ),
            method(
                "C.<M1>d__0",
                2,
                MethodKind::StateMachineMoveNext {
                    kickoff: Token::method_def(1),
                },
                &["System"],
            ),
        ];
        let forms = ForwardingResolver::new().resolve(&methods);
        assert_eq!(forms[1], ImportForm::Forward(Token::method_def(1)));
    }

    #[test]
    fn module_method_fallback() {
        let methods = vec![
            method("<Module>", 1, MethodKind::Ordinary, &["System"]),
            method("C", 2, MethodKind::Ordinary, &[]),
        ];
        let forms = ForwardingResolver::new()
            .with_module_method(Some(Token::method_def(1)))
            .resolve(&methods);
        assert_eq!(forms[0], ImportForm::Full);
        assert_eq!(forms[1], ImportForm::ForwardToModule(Token::method_def(1)));
    }
}
