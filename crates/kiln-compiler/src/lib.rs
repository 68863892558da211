//! Kiln Compiler
//!
//! The lowering engine of the Kiln front end. A syntax tree produced by the
//! parser goes in; a flat, control-flow-explicit IR comes out, one tree per
//! function, collected in a script-wide function table.
//!
//! # Modules
//!
//! - `ir`: node model, scope tables, function table, pretty printer, validator
//! - `lower`: dispatch-by-construct lowering and the control-flow routines
//! - `optimize`: peephole constant folding applied during lowering
//! - `diagnostic`: user-facing error reporting
//! - `options`: lowering configuration
//!
//! # Example
//!
//! ```ignore
//! let output = kiln_compiler::lower_script(&script, &mut interner, &LowerOptions::default())?;
//! for diag in &output.diagnostics {
//!     eprintln!("{}", diag);
//! }
//! ```

pub mod diagnostic;
pub mod error;
pub mod ir;
pub mod lower;
pub mod optimize;
pub mod options;

pub use diagnostic::{Diagnostic, DiagnosticSink, ErrorCode};
pub use error::{LowerError, LowerResult, LoweringDiagnostic, ValidateError};
pub use ir::{FunctionId, IrFunction, IrNode, IrScript, LocalId, NodeKind, PrettyPrint, TargetId};
pub use lower::{dump_ir, lower_script, LowerOutput, Lowerer};
pub use options::LowerOptions;
