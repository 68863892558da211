//! AST to IR Lowering
//!
//! Converts the parsed syntax tree into the control-flow IR, one `IrFunction`
//! per function literal. Nested functions are lowered depth-first when they
//! are met; the script root always gets `FunctionId(0)`.

mod context;
mod control_flow;
mod destructure;
mod expr;
mod function;
mod reference;
mod stmt;

use crate::diagnostic::DiagnosticSink;
use crate::error::{LowerError, LowerResult, LoweringDiagnostic};
use crate::ir::{
    Declared, FunctionId, IrFunction, IrNode, IrScript, NodeKind, PrettyPrint, ScopeKind,
    ScopeTable, SymbolKind,
};
use crate::optimize::ConstantFolder;
use crate::options::LowerOptions;
use context::FunctionContext;
use kiln_syntax::ast::{Script, VariableKind};
use kiln_syntax::{Interner, Span, Symbol};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Result of lowering one script
#[derive(Debug)]
pub struct LowerOutput {
    pub script: IrScript,
    /// Malformed constructs found along the way, in source order
    pub diagnostics: Vec<LoweringDiagnostic>,
}

impl LowerOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Lower `script`, collecting diagnostics instead of stopping at the first one
pub fn lower_script(
    script: &Script,
    interner: &mut Interner,
    options: &LowerOptions,
) -> LowerResult<LowerOutput> {
    let mut diagnostics = Vec::new();
    let ir = Lowerer::new(interner, options, &mut diagnostics).lower(script)?;

    if let Some(dir) = &options.debug_output_dir {
        match dump_ir(&ir, interner, dir) {
            Ok(path) => debug!("wrote IR dump to {}", path.display()),
            Err(e) => warn!("could not write IR dump for {}: {}", ir.name, e),
        }
    }

    Ok(LowerOutput {
        script: ir,
        diagnostics,
    })
}

/// Write the pretty-printed IR of `script` to `<dir>/ir/<name>.txt`
pub fn dump_ir(script: &IrScript, interner: &Interner, dir: &Path) -> LowerResult<PathBuf> {
    let ir_dir = dir.join("ir");
    std::fs::create_dir_all(&ir_dir)?;
    let file_name: String = script
        .name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let path = ir_dir.join(format!("{}.txt", file_name));
    std::fs::write(&path, script.pretty_print(interner))?;
    Ok(path)
}

/// AST to IR lowerer
pub struct Lowerer<'a> {
    interner: &'a mut Interner,
    options: &'a LowerOptions,
    sink: &'a mut dyn DiagnosticSink,
    folder: ConstantFolder,
    /// Function table; a slot is reserved when a function is entered
    functions: Vec<Option<IrFunction>>,
    /// State of the function being lowered
    ctx: FunctionContext,
    /// Enclosing functions' states, innermost last
    saved: Vec<FunctionContext>,
}

impl<'a> Lowerer<'a> {
    pub fn new(
        interner: &'a mut Interner,
        options: &'a LowerOptions,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            interner,
            options,
            sink,
            folder: ConstantFolder::new(options.fold_constants),
            functions: Vec::new(),
            ctx: FunctionContext::new(FunctionId(0), true, options.strict),
            saved: Vec::new(),
        }
    }

    /// Lower a whole script into its function table
    pub fn lower(mut self, script: &Script) -> LowerResult<IrScript> {
        debug!(
            "lowering script {} ({} statements)",
            script.source_name,
            script.statements.len()
        );

        let id = FunctionId(0);
        self.functions.push(None);
        self.ctx = FunctionContext::new(id, true, self.options.strict || script.strict);
        self.ctx.push_scope(ScopeKind::Block);

        let body = self.lower_statements(&script.statements)?;
        let mut root = IrFunction::new(id, None, None);
        if self.options.generate_source {
            root.source_span = script.span;
        }
        self.finish_function(root, body, script.span.line)?;

        let functions = self
            .functions
            .into_iter()
            .enumerate()
            .map(|(i, f)| f.ok_or_else(|| LowerError::internal(format!("function slot {} never filled", i))))
            .collect::<LowerResult<Vec<_>>>()?;

        debug!("lowered {} into {} functions", script.source_name, functions.len());
        Ok(IrScript {
            name: script.source_name.clone(),
            functions,
        })
    }

    // ========================================================================
    // Function bookkeeping
    // ========================================================================

    /// Reserve a function slot and make a fresh context current
    fn enter_function(&mut self, name: Option<Symbol>) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(None);
        self.ctx.nested.push(id);
        // Nested function literals need the parent's variables in an activation
        self.ctx.requires_activation = true;

        let strict = self.ctx.strict;
        let parent = std::mem::replace(&mut self.ctx, FunctionContext::new(id, false, strict));
        self.saved.push(parent);
        self.ctx.push_scope(ScopeKind::Block);

        debug!(
            "entering function {} ({})",
            id,
            name.map(|n| self.interner.resolve(n)).unwrap_or("<anonymous>")
        );
        id
    }

    /// Finish the current function and restore the enclosing context
    fn exit_function(&mut self, func: IrFunction, body: Vec<IrNode>, line: u32) -> LowerResult<FunctionId> {
        let id = func.id;
        self.finish_function(func, body, line)?;
        self.ctx = self
            .saved
            .pop()
            .ok_or_else(|| LowerError::internal("function context stack underflow"))?;
        Ok(id)
    }

    /// Move the current context's results into `func`, validate it and store it
    fn finish_function(&mut self, mut func: IrFunction, body: Vec<IrNode>, line: u32) -> LowerResult<()> {
        if func.id != self.ctx.id {
            return Err(LowerError::internal(format!(
                "finishing {} while {} is current",
                func.id, self.ctx.id
            )));
        }
        if !self.ctx.jumps.is_empty() {
            return Err(LowerError::internal(format!("jump contexts left open at end of {}", func.id)));
        }
        let root_scope = self.pop_scope()?;
        if !self.ctx.scopes.is_empty() {
            return Err(LowerError::internal(format!(
                "{} open block scopes left at end of {}",
                self.ctx.scopes.len(),
                func.id
            )));
        }

        func.body = Self::scoped(root_scope, body, line);
        func.symbols = std::mem::replace(&mut self.ctx.symbols, ScopeTable::new(ScopeKind::Function));
        func.requires_activation = self.ctx.requires_activation;
        func.strict = self.ctx.strict;
        func.nested = std::mem::take(&mut self.ctx.nested);
        func.target_count = self.ctx.target_count();
        func.local_count = self.ctx.local_count();

        func.validate().map_err(|source| LowerError::InvalidIr {
            function: func.id,
            source,
        })?;

        let id = func.id;
        debug!(
            "finished {}: {} targets, {} locals, {} nested",
            id,
            func.target_count,
            func.local_count,
            func.nested.len()
        );
        let slot = self
            .functions
            .get_mut(id.index())
            .ok_or_else(|| LowerError::internal(format!("no slot reserved for {}", id)))?;
        *slot = Some(func);
        Ok(())
    }

    // ========================================================================
    // Scopes and declarations
    // ========================================================================

    fn pop_scope(&mut self) -> LowerResult<ScopeTable> {
        self.ctx
            .pop_scope()
            .ok_or_else(|| LowerError::internal("block scope stack underflow"))
    }

    /// Wrap `children` in a `Scope` node, or a plain block when nothing was declared
    fn scoped(table: ScopeTable, children: Vec<IrNode>, line: u32) -> IrNode {
        if table.is_empty() {
            IrNode::block(children, line)
        } else {
            IrNode::with_children(NodeKind::Scope(Box::new(table)), children, line)
        }
    }

    /// Declare `name` where `kind` says it belongs, reporting illegal redeclarations
    fn declare(&mut self, name: Symbol, kind: SymbolKind, span: Span) {
        if kind.is_lexical() {
            let shadowed = self.ctx.symbols.contains(name)
                || self.ctx.scopes.iter().rev().skip(1).any(|s| s.contains(name));
            let at_body_level = self.ctx.scopes.len() == 1;
            let clashes_with_var = at_body_level
                && self
                    .ctx
                    .symbols
                    .lookup(name)
                    .map_or(false, |s| s.kind != SymbolKind::Temp);
            let outcome = match self.ctx.scopes.last_mut() {
                Some(scope) => scope.declare(name, kind, shadowed, span),
                None => self.ctx.symbols.declare(name, kind, false, span),
            };
            if matches!(outcome, Declared::Existing(_)) || clashes_with_var {
                self.redeclaration(name, span);
            }
        } else {
            let outcome = self.ctx.symbols.declare(name, kind, false, span);
            let clashes_with_lexical = self
                .ctx
                .scopes
                .iter()
                .any(|s| s.lookup(name).map_or(false, |d| d.kind.is_lexical() && d.kind != SymbolKind::CatchParam));
            let clashes_with_fn_table = matches!(outcome, Declared::Existing(existing) if existing.is_lexical());
            if clashes_with_lexical || clashes_with_fn_table {
                self.redeclaration(name, span);
            }
        }
    }

    fn redeclaration(&mut self, name: Symbol, span: Span) {
        let name = self.interner.resolve(name).to_string();
        self.report(LoweringDiagnostic::Redeclaration { name, span });
    }

    /// Fresh synthetic name, declared as a temporary of the current function
    fn new_temp(&mut self, prefix: &str) -> Symbol {
        let sym = self.synthetic_name(prefix);
        self.ctx.symbols.declare(sym, SymbolKind::Temp, false, Span::default());
        sym
    }

    /// Name for a generated binding, not yet declared anywhere. It cannot
    /// clash with an identifier of the script.
    fn synthetic_name(&mut self, prefix: &str) -> Symbol {
        self.interner.fresh(prefix)
    }

    fn report(&mut self, diagnostic: LoweringDiagnostic) {
        debug!("lowering diagnostic: {}", diagnostic);
        self.sink.report(diagnostic);
    }

    fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }
}

fn symbol_kind(kind: VariableKind) -> SymbolKind {
    match kind {
        VariableKind::Var => SymbolKind::Var,
        VariableKind::Let => SymbolKind::Let,
        VariableKind::Const => SymbolKind::Const,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_syntax::ast::VariableKind;
    use kiln_syntax::AstBuilder;

    fn lower(b: AstBuilder, script: &Script) -> (LowerOutput, Interner) {
        let mut interner = b.into_interner();
        let output = lower_script(script, &mut interner, &LowerOptions::default()).expect("lowering failed");
        (output, interner)
    }

    #[test]
    fn test_empty_script() {
        let b = AstBuilder::new();
        let script = b.script(vec![]);
        let (output, _) = lower(b, &script);

        assert_eq!(output.script.function_count(), 1);
        let root = output.script.root().expect("root");
        assert!(root.is_script());
        assert!(root.body.is_empty_block());
        assert!(!output.has_errors());
    }

    #[test]
    fn test_let_redeclaration_is_reported() {
        let mut b = AstBuilder::new();
        let one = b.num(1.0);
        let two = b.num(2.0);
        let first = b.var(VariableKind::Let, "x", Some(one));
        let second = b.var(VariableKind::Let, "x", Some(two));
        let script = b.script(vec![first, second]);
        let (output, _) = lower(b, &script);

        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].message_code(), "msg.let.redecl");
    }

    #[test]
    fn test_var_then_let_clash() {
        let mut b = AstBuilder::new();
        let first = b.var(VariableKind::Var, "x", None);
        let second = b.var(VariableKind::Let, "x", None);
        let script = b.script(vec![first, second]);
        let (output, _) = lower(b, &script);

        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn test_var_redeclaration_is_fine() {
        let mut b = AstBuilder::new();
        let first = b.var(VariableKind::Var, "x", None);
        let second = b.var(VariableKind::Var, "x", None);
        let script = b.script(vec![first, second]);
        let (output, interner) = lower(b, &script);

        assert!(!output.has_errors());
        let root = output.script.root().expect("root");
        assert_eq!(root.symbols.len(), 1);
        let x = interner.get("x").expect("interned");
        assert_eq!(root.symbols.lookup(x).map(|s| s.kind), Some(SymbolKind::Var));
    }

    #[test]
    fn test_dump_ir_writes_file() {
        let b = AstBuilder::new();
        let script = b.script(vec![]);
        let (output, interner) = lower(b, &script);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dump_ir(&output.script, &interner, dir.path()).expect("dump");
        assert!(path.ends_with("ir/test.kiln.txt"));
        let text = std::fs::read_to_string(path).expect("read dump");
        assert!(text.contains("fn0 <script>()"));
    }
}
