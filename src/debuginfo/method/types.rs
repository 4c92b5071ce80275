//! Method identity and classification.

use std::fmt;

use crate::debuginfo::token::Token;

/// Who a method is, as shown in symbol dumps and used for forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    /// Full name of the declaring type
    pub containing_type: String,
    /// Method name
    pub name: String,
    /// Parameter names in declaration order
    pub parameter_names: Vec<String>,
    /// MethodDef token
    pub token: Token,
    /// Whether the method may forward its imports to an earlier method of its type
    pub forward_candidate: bool,
}

impl MethodIdentity {
    /// Identity of method `name` in `containing_type` with MethodDef row `row`.
    pub fn new(containing_type: impl Into<String>, name: impl Into<String>, row: u32) -> Self {
        MethodIdentity {
            containing_type: containing_type.into(),
            name: name.into(),
            parameter_names: Vec::new(),
            token: Token::method_def(row),
            forward_candidate: true,
        }
    }

    /// Set the parameter names.
    #[must_use]
    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Never forward this method's imports.
    #[must_use]
    pub fn without_forwarding(mut self) -> Self {
        self.forward_candidate = false;
        self
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.containing_type, self.name)
    }
}

/// How a method came to be.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MethodKind {
    /// Method with a user-written body
    #[default]
    Ordinary,
    /// Compiler generated member without source of its own (constructors, accessors)
    Synthesized,
    /// User method whose body was moved into a state machine
    StateMachineKickoff {
        /// Name of the generated state machine type
        state_machine_type: String,
    },
    /// `MoveNext` of a state machine
    StateMachineMoveNext {
        /// Token of the kickoff method
        kickoff: Token,
    },
}

impl MethodKind {
    /// Returns `true` for methods that contain user-written code.
    #[must_use]
    pub fn is_user_code(&self) -> bool {
        matches!(
            self,
            MethodKind::Ordinary | MethodKind::StateMachineKickoff { .. }
        )
    }
}
