//! Lowering errors
//!
//! Two classes of failure exist. `LoweringDiagnostic` covers malformed user
//! constructs: they are reported through a `DiagnosticSink` and lowering
//! continues with a placeholder node. `LowerError` covers broken internal
//! invariants and aborts the whole compilation.

use crate::ir::{FunctionId, LocalId, TargetId};
use kiln_syntax::Span;
use thiserror::Error;

/// Result type for fatal lowering failures
pub type LowerResult<T> = Result<T, LowerError>;

/// Fatal lowering failure (a defect in the engine, not in user input)
#[derive(Debug, Error)]
pub enum LowerError {
    /// An assumed invariant about tree shape did not hold
    #[error("internal lowering error: {message}")]
    Internal { message: String },

    /// A lowered function failed structural validation
    #[error("invalid IR in function {function}: {source}")]
    InvalidIr {
        function: FunctionId,
        #[source]
        source: ValidateError,
    },

    /// Writing the IR dump failed
    #[error("failed to write IR dump: {0}")]
    Io(#[from] std::io::Error),
}

impl LowerError {
    pub fn internal(message: impl Into<String>) -> Self {
        LowerError::Internal {
            message: message.into(),
        }
    }
}

/// Structural IR violation found by `IrFunction::validate`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// A jump (or a structural node) names a target that is never placed
    #[error("target {target} is referenced but never placed")]
    DanglingTarget { target: TargetId },

    /// The same target anchor is placed more than once
    #[error("target {target} is placed more than once")]
    DuplicateTarget { target: TargetId },

    /// A local slot is used outside the block that declares it
    #[error("local {local} is used outside its block")]
    LocalOutOfScope { local: LocalId },

    /// A nested function id does not exist in the function table
    #[error("function {function} is not in the function table")]
    UnknownFunction { function: FunctionId },
}

/// User-facing lowering error, recovered locally
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoweringDiagnostic {
    /// Assignment to something that is not a reference
    #[error("invalid assignment left-hand side")]
    BadAssignLeft { span: Span },

    /// `[a, b] += x` and friends
    #[error("destructuring assignment requires '='")]
    BadDestructOp { span: Span },

    /// for-in/for-of head that cannot be assigned
    #[error("invalid left-hand side of for-in/for-of loop")]
    BadForInLhs { span: Span },

    /// Destructuring in for-in other than a `[key, value]` pair
    #[error("for-in destructuring must be a two-element array pattern")]
    BadForInDestruct { span: Span },

    /// `++x` on something that is not a reference
    #[error("invalid increment/decrement operand")]
    BadIncDec { span: Span },

    /// `break` with nothing to break out of
    #[error("'break' outside of a loop, switch or labeled statement")]
    BreakOutsideTarget { span: Span },

    /// `continue` outside of any loop
    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop { span: Span },

    /// `break L` / `continue L` with no enclosing `L:`
    #[error("undefined label '{name}'")]
    UndefinedLabel { name: String, span: Span },

    /// `continue L` where `L` does not label a loop
    #[error("label '{name}' does not refer to a loop")]
    ContinueNonLoopLabel { name: String, span: Span },

    /// A `let`/`const` binding declared twice in one scope
    #[error("redeclaration of '{name}'")]
    Redeclaration { name: String, span: Span },

    /// `@numericTemplate` combined with other decorators
    #[error("@numericTemplate cannot be combined with other decorators in '{name}'")]
    NumericTemplateMixed { name: String, span: Span },
}

impl LoweringDiagnostic {
    /// Stable message code of this diagnostic
    pub fn message_code(&self) -> &'static str {
        use LoweringDiagnostic::*;
        match self {
            BadAssignLeft { .. } => "msg.bad.assign.left",
            BadDestructOp { .. } => "msg.bad.destruct.op",
            BadForInLhs { .. } => "msg.bad.for.in.lhs",
            BadForInDestruct { .. } => "msg.bad.for.in.destruct",
            BadIncDec { .. } => "msg.bad.incr",
            BreakOutsideTarget { .. } => "msg.bad.break",
            ContinueOutsideLoop { .. } => "msg.continue.outside",
            UndefinedLabel { .. } => "msg.undef.label",
            ContinueNonLoopLabel { .. } => "msg.continue.nonloop",
            Redeclaration { .. } => "msg.let.redecl",
            NumericTemplateMixed { .. } => "msg.decorator.numeric.template",
        }
    }

    pub fn span(&self) -> Span {
        use LoweringDiagnostic::*;
        match self {
            BadAssignLeft { span }
            | BadDestructOp { span }
            | BadForInLhs { span }
            | BadForInDestruct { span }
            | BadIncDec { span }
            | BreakOutsideTarget { span }
            | ContinueOutsideLoop { span }
            | UndefinedLabel { span, .. }
            | ContinueNonLoopLabel { span, .. }
            | Redeclaration { span, .. }
            | NumericTemplateMixed { span, .. } => *span,
        }
    }
}
