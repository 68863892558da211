//! Statement Lowering
//!
//! Converts AST statements to IR. Structured control flow (if, loops, switch,
//! labels, try/catch/finally) is flattened into jumps and target anchors.

use super::control_flow::{JumpContext, JumpLookupError};
use super::{symbol_kind, Lowerer};
use crate::error::{LowerError, LowerResult, LoweringDiagnostic};
use crate::ir::{
    EnumMode, IrNode, JumpKind, LocalId, NodeKind, ScopeKind, SymbolKind, TargetId, Unwind,
};
use kiln_syntax::ast::{
    self, BlockStatement, ForInLeft, ForInit, Pattern, Statement, VariableDecl, VariableKind,
};
use log::trace;

/// Targets of one loop, allocated before its body is lowered
pub(super) struct LoopTargets {
    body: TargetId,
    condition: TargetId,
    increment: Option<TargetId>,
    exit: TargetId,
}

impl LoopTargets {
    fn continue_target(&self) -> TargetId {
        self.increment.unwrap_or(self.condition)
    }
}

impl<'a> Lowerer<'a> {
    pub(super) fn lower_statements(&mut self, stmts: &[Statement]) -> LowerResult<Vec<IrNode>> {
        stmts.iter().map(|stmt| self.lower_stmt(stmt)).collect()
    }

    /// Lower a statement
    pub fn lower_stmt(&mut self, stmt: &Statement) -> LowerResult<IrNode> {
        match stmt {
            Statement::VariableDecl(decl) => self.lower_var_decl(decl),
            Statement::FunctionDecl(func) => self.lower_function_decl(func),
            Statement::ClassDecl(class) => self.lower_class_decl(class),
            Statement::DecoratorDecl(decl) => self.lower_decorator_decl(decl),
            Statement::Expression(expr) => self.lower_expr_stmt(expr),
            Statement::If(if_stmt) => self.lower_if(if_stmt),
            Statement::Switch(switch) => self.lower_switch(switch),
            Statement::While(while_stmt) => self.lower_while(while_stmt),
            Statement::DoWhile(do_while) => self.lower_do_while(do_while),
            Statement::For(for_stmt) => self.lower_for(for_stmt),
            Statement::ForIn(for_in) => self.lower_for_in(for_in),
            Statement::Break(brk) => self.lower_break(brk),
            Statement::Continue(cont) => self.lower_continue(cont),
            Statement::Return(ret) => self.lower_return(ret),
            Statement::Throw(throw) => {
                let value = self.lower_expr(&throw.argument)?;
                Ok(IrNode::unary(NodeKind::Throw, value, throw.span.line))
            }
            Statement::Try(try_stmt) => self.lower_try(try_stmt),
            Statement::Block(block) => self.lower_block(block, ScopeKind::Block),
            Statement::Labeled(labeled) => self.lower_labeled(labeled),
            Statement::With(with) => self.lower_with(with),
            Statement::Empty(span) => Ok(IrNode::empty(span.line)),
            Statement::Debugger(span) => Ok(IrNode::new(NodeKind::Debugger, span.line)),
        }
    }

    pub(super) fn lower_block(&mut self, block: &BlockStatement, kind: ScopeKind) -> LowerResult<IrNode> {
        self.ctx.push_scope(kind);
        let children = self.lower_statements(&block.statements)?;
        let table = self.pop_scope()?;
        Ok(Self::scoped(table, children, block.span.line))
    }

    pub(super) fn lower_var_decl(&mut self, decl: &VariableDecl) -> LowerResult<IrNode> {
        let line = decl.span.line;
        let kind = symbol_kind(decl.kind);
        let is_const = decl.kind == VariableKind::Const;
        let mut children = Vec::with_capacity(decl.declarations.len());

        for declarator in &decl.declarations {
            for id in declarator.target.bound_names() {
                self.declare(id.name, kind, id.span);
            }
            match (&declarator.target, &declarator.init) {
                (Pattern::Identifier(id), Some(init)) => {
                    let value = self.lower_expr(init)?;
                    children.push(Self::bind_name(id.name, value, is_const, line));
                }
                (Pattern::Identifier(id), None) => children.push(IrNode::name(id.name, line)),
                (Pattern::Array(_) | Pattern::Object(_), Some(init)) => {
                    let value = self.lower_expr(init)?;
                    children.push(self.destructure(&declarator.target, value, is_const, line)?);
                }
                (Pattern::Array(_) | Pattern::Object(_), None) => {
                    for id in declarator.target.bound_names() {
                        children.push(IrNode::name(id.name, line));
                    }
                }
                (Pattern::Expression(expr), _) => {
                    self.report(LoweringDiagnostic::BadAssignLeft { span: *expr.span() });
                }
            }
        }

        Ok(IrNode::with_children(NodeKind::VarDecl(decl.kind), children, line))
    }

    fn lower_expr_stmt(&mut self, stmt: &ast::ExpressionStatement) -> LowerResult<IrNode> {
        let value = self.lower_expr(&stmt.expression)?;
        // The script keeps the value of its last expression statement
        let kind = if self.ctx.is_script {
            NodeKind::ExprResult
        } else {
            NodeKind::ExprVoid
        };
        Ok(IrNode::unary(kind, value, stmt.span.line))
    }

    // ========================================================================
    // Conditionals
    // ========================================================================

    fn lower_if(&mut self, if_stmt: &ast::IfStatement) -> LowerResult<IrNode> {
        let line = if_stmt.span.line;
        let condition = self.lower_expr(&if_stmt.test)?;

        // Both branches are lowered even when one is dead so that its `var`
        // and function declarations still reach the function's tables
        let then_branch = self.lower_stmt(&if_stmt.consequent)?;
        let else_branch = match &if_stmt.alternate {
            Some(alternate) => Some(self.lower_stmt(alternate)?),
            None => None,
        };
        Ok(self.build_if(condition, then_branch, else_branch, line))
    }

    /// `IfFalse cond -> else; then; Goto end; else: ...; end:`
    pub(super) fn build_if(
        &mut self,
        condition: IrNode,
        then_branch: IrNode,
        else_branch: Option<IrNode>,
        line: u32,
    ) -> IrNode {
        match self.folder.truthiness(&condition) {
            Some(true) => return then_branch,
            Some(false) => return else_branch.unwrap_or_else(|| IrNode::block(Vec::new(), line)),
            None => {}
        }

        let end = self.ctx.new_target();
        match else_branch {
            None => IrNode::block(
                vec![
                    IrNode::branch(JumpKind::IfFalse, condition, end, line),
                    then_branch,
                    IrNode::target(end, line),
                ],
                line,
            ),
            Some(else_branch) => {
                let otherwise = self.ctx.new_target();
                IrNode::block(
                    vec![
                        IrNode::branch(JumpKind::IfFalse, condition, otherwise, line),
                        then_branch,
                        IrNode::goto(end, line),
                        IrNode::target(otherwise, line),
                        else_branch,
                        IrNode::target(end, line),
                    ],
                    line,
                )
            }
        }
    }

    fn lower_switch(&mut self, switch: &ast::SwitchStatement) -> LowerResult<IrNode> {
        let line = switch.span.line;
        trace!("lowering switch with {} cases at line {}", switch.cases.len(), line);

        let discriminant = self.lower_expr(&switch.discriminant)?;
        let exit = self.ctx.new_target();
        let case_targets: Vec<TargetId> = switch.cases.iter().map(|_| self.ctx.new_target()).collect();
        let default = switch
            .cases
            .iter()
            .position(|case| case.test.is_none())
            .map(|i| case_targets[i]);

        let mut dispatch = IrNode::unary(
            NodeKind::Switch {
                break_target: exit,
                default,
            },
            discriminant,
            line,
        );
        for (case, &target) in switch.cases.iter().zip(&case_targets) {
            if let Some(test) = &case.test {
                let value = self.lower_expr(test)?;
                dispatch.push(IrNode::unary(NodeKind::Case(target), value, case.span.line));
            }
        }

        self.ctx.jumps.push(JumpContext::for_switch(exit, self.ctx.unwinds.len()));
        self.ctx.push_scope(ScopeKind::Block);

        let mut children = vec![dispatch, IrNode::goto(default.unwrap_or(exit), line)];
        for (case, &target) in switch.cases.iter().zip(&case_targets) {
            children.push(IrNode::target(target, case.span.line));
            let body = self.lower_statements(&case.consequent)?;
            children.push(IrNode::block(body, case.span.line));
        }
        children.push(IrNode::target(exit, line));

        let table = self.pop_scope()?;
        self.end_jump_context()?;
        Ok(Self::scoped(table, children, line))
    }

    // ========================================================================
    // Loops
    // ========================================================================

    pub(super) fn new_loop_targets(&mut self, with_increment: bool) -> LoopTargets {
        LoopTargets {
            body: self.ctx.new_target(),
            condition: self.ctx.new_target(),
            increment: if with_increment {
                Some(self.ctx.new_target())
            } else {
                None
            },
            exit: self.ctx.new_target(),
        }
    }

    /// Make `targets` the destination of `break`/`continue` in the loop body
    fn begin_loop(&mut self, targets: &LoopTargets) {
        let labels = std::mem::take(&mut self.ctx.pending_labels);
        self.ctx.jumps.push(JumpContext::for_loop(
            targets.exit,
            targets.continue_target(),
            labels,
            self.ctx.unwinds.len(),
        ));
    }

    fn end_jump_context(&mut self) -> LowerResult<()> {
        self.ctx
            .jumps
            .pop()
            .map(|_| ())
            .ok_or_else(|| LowerError::internal("jump context stack underflow"))
    }

    /// Assemble the common loop shape:
    ///
    /// ```text
    /// Loop [prefix...; Goto cond?; body:; BODY; incr:; INCR; cond:; IfTrue COND -> body; exit:]
    /// ```
    pub(super) fn build_loop(
        targets: LoopTargets,
        prefix: Vec<IrNode>,
        body: IrNode,
        condition: Option<IrNode>,
        increment: Option<IrNode>,
        test_first: bool,
        line: u32,
    ) -> IrNode {
        let mut children = prefix;
        if test_first {
            children.push(IrNode::goto(targets.condition, line));
        }
        children.push(IrNode::target(targets.body, line));
        children.push(body);
        if let Some(incr_target) = targets.increment {
            children.push(IrNode::target(incr_target, line));
            if let Some(increment) = increment {
                children.push(IrNode::unary(NodeKind::ExprVoid, increment, line));
            }
        }
        children.push(IrNode::target(targets.condition, line));
        let condition = condition.unwrap_or_else(|| IrNode::new(NodeKind::True, line));
        children.push(IrNode::branch(JumpKind::IfTrue, condition, targets.body, line));
        children.push(IrNode::target(targets.exit, line));

        IrNode::with_children(
            NodeKind::Loop {
                break_target: targets.exit,
                continue_target: targets.continue_target(),
            },
            children,
            line,
        )
    }

    fn lower_while(&mut self, while_stmt: &ast::WhileStatement) -> LowerResult<IrNode> {
        let line = while_stmt.span.line;
        trace!("lowering while loop at line {}", line);

        let condition = self.lower_expr(&while_stmt.test)?;
        let targets = self.new_loop_targets(false);
        self.begin_loop(&targets);
        let body = self.lower_stmt(&while_stmt.body)?;
        self.end_jump_context()?;

        Ok(Self::build_loop(targets, Vec::new(), body, Some(condition), None, true, line))
    }

    fn lower_do_while(&mut self, do_while: &ast::DoWhileStatement) -> LowerResult<IrNode> {
        let line = do_while.span.line;
        trace!("lowering do-while loop at line {}", line);

        let targets = self.new_loop_targets(false);
        self.begin_loop(&targets);
        let body = self.lower_stmt(&do_while.body)?;
        self.end_jump_context()?;
        let condition = self.lower_expr(&do_while.test)?;

        // The body runs before the first test
        Ok(Self::build_loop(targets, Vec::new(), body, Some(condition), None, false, line))
    }

    fn lower_for(&mut self, for_stmt: &ast::ForStatement) -> LowerResult<IrNode> {
        let line = for_stmt.span.line;
        trace!("lowering for loop at line {}", line);

        let lexical = matches!(
            &for_stmt.init,
            Some(ForInit::Variable(decl)) if decl.kind != VariableKind::Var
        );
        if lexical {
            self.ctx.push_scope(ScopeKind::Loop);
        }

        let init = match &for_stmt.init {
            Some(ForInit::Variable(decl)) => Some(self.lower_var_decl(decl)?),
            Some(ForInit::Expression(expr)) => {
                let value = self.lower_expr(expr)?;
                Some(IrNode::unary(NodeKind::ExprVoid, value, line))
            }
            None => None,
        };
        let condition = match &for_stmt.test {
            Some(test) => Some(self.lower_expr(test)?),
            None => None,
        };
        let increment = match &for_stmt.update {
            Some(update) => Some(self.lower_expr(update)?),
            None => None,
        };

        let targets = self.new_loop_targets(true);
        self.begin_loop(&targets);
        let body = self.lower_stmt(&for_stmt.body)?;
        self.end_jump_context()?;

        if lexical {
            // A lexical head lives in its own scope around the loop
            let mut children: Vec<IrNode> = init.into_iter().collect();
            children.push(Self::build_loop(targets, Vec::new(), body, condition, increment, true, line));
            let table = self.pop_scope()?;
            Ok(Self::scoped(table, children, line))
        } else {
            let prefix: Vec<IrNode> = init.into_iter().collect();
            Ok(Self::build_loop(targets, prefix, body, condition, increment, true, line))
        }
    }

    fn lower_for_in(&mut self, for_in: &ast::ForInStatement) -> LowerResult<IrNode> {
        let line = for_in.span.line;
        trace!(
            "lowering {} loop at line {}",
            if for_in.is_of { "for-of" } else { "for-in" },
            line
        );

        let (kind, pattern) = match &for_in.left {
            ForInLeft::Variable(decl) => match decl.declarations.as_slice() {
                [single] if single.init.is_none() => (Some(decl.kind), &single.target),
                _ => {
                    self.report(LoweringDiagnostic::BadForInLhs { span: decl.span });
                    return Ok(IrNode::empty(line));
                }
            },
            ForInLeft::Pattern(pattern) => (None, pattern),
        };
        if let Pattern::Expression(expr) = pattern {
            if kind.is_some() || !Self::is_reference_target(expr) {
                self.report(LoweringDiagnostic::BadForInLhs { span: *expr.span() });
                return Ok(IrNode::empty(line));
            }
        }

        let lexical = matches!(kind, Some(VariableKind::Let | VariableKind::Const));
        if lexical {
            self.ctx.push_scope(ScopeKind::Loop);
        }
        let declaration = kind.map(|kind| self.declare_enum_names(pattern, kind, line));

        let iterated = self.lower_expr(&for_in.right)?;
        self.check_enum_destructuring(for_in.is_of, pattern);
        let mode = self.enum_mode(for_in.is_of, pattern);
        let local = self.ctx.new_local();
        let assign = self.enum_binding(pattern, kind == Some(VariableKind::Const), local, line)?;

        let targets = self.new_loop_targets(false);
        self.begin_loop(&targets);
        let body = self.lower_stmt(&for_in.body)?;
        self.end_jump_context()?;

        let node = Self::build_enum_loop(targets, declaration, local, mode, iterated, assign, body, line);
        if lexical {
            let table = self.pop_scope()?;
            Ok(Self::scoped(table, vec![node], line))
        } else {
            Ok(node)
        }
    }

    /// Declare the names bound by an enumeration head and build its `VarDecl`
    pub(super) fn declare_enum_names(&mut self, pattern: &Pattern, kind: VariableKind, line: u32) -> IrNode {
        let mut names = Vec::new();
        for id in pattern.bound_names() {
            self.declare(id.name, symbol_kind(kind), id.span);
            names.push(IrNode::name(id.name, line));
        }
        IrNode::with_children(NodeKind::VarDecl(kind), names, line)
    }

    /// Legacy for-in destructuring only accepts a `[key, value]` pair
    pub(super) fn check_enum_destructuring(&mut self, is_of: bool, pattern: &Pattern) {
        if is_of || !self.options.legacy_for_in_destructuring {
            return;
        }
        let bad = match pattern {
            Pattern::Object(_) => true,
            Pattern::Array(array) => array.elements.len() != 2 || array.rest.is_some(),
            _ => false,
        };
        if bad {
            self.report(LoweringDiagnostic::BadForInDestruct { span: *pattern.span() });
        }
    }

    pub(super) fn enum_mode(&self, is_of: bool, pattern: &Pattern) -> EnumMode {
        if is_of {
            EnumMode::ValuesInOrder
        } else if pattern.is_destructuring() && self.options.legacy_for_in_destructuring {
            EnumMode::Array
        } else {
            EnumMode::Keys
        }
    }

    /// Assignment of the current enumeration value to the loop head
    pub(super) fn enum_binding(
        &mut self,
        pattern: &Pattern,
        is_const: bool,
        local: LocalId,
        line: u32,
    ) -> LowerResult<IrNode> {
        let current = IrNode::new(NodeKind::EnumId(local), line);
        match pattern {
            Pattern::Identifier(id) => Ok(Self::bind_name(id.name, current, is_const, line)),
            Pattern::Array(_) | Pattern::Object(_) => self.destructure(pattern, current, is_const, line),
            Pattern::Expression(expr) => match self.make_reference(expr)? {
                Some(reference) => Ok(Self::assign_reference(reference, current, line)),
                None => Err(LowerError::internal("enumeration target is not a reference")),
            },
        }
    }

    /// `LocalBlock [Loop [decl?; EnumInit; Goto cond; body:; {assign; BODY}; cond:; IfTrue EnumNext -> body; exit:]]`
    #[allow(clippy::too_many_arguments)]
    pub(super) fn build_enum_loop(
        targets: LoopTargets,
        declaration: Option<IrNode>,
        local: LocalId,
        mode: EnumMode,
        iterated: IrNode,
        assign: IrNode,
        body: IrNode,
        line: u32,
    ) -> IrNode {
        let mut prefix: Vec<IrNode> = declaration.into_iter().collect();
        prefix.push(IrNode::unary(NodeKind::EnumInit { local, mode }, iterated, line));
        let body = IrNode::block(vec![IrNode::unary(NodeKind::ExprVoid, assign, line), body], line);
        let condition = IrNode::new(NodeKind::EnumNext(local), line);
        let looped = Self::build_loop(targets, prefix, body, Some(condition), None, true, line);
        IrNode::unary(NodeKind::LocalBlock(local), looped, line)
    }

    // ========================================================================
    // Jumps
    // ========================================================================

    fn lower_break(&mut self, brk: &ast::BreakStatement) -> LowerResult<IrNode> {
        let line = brk.span.line;
        let label = brk.label.as_ref().map(|l| l.name);
        let found = self
            .ctx
            .jumps
            .break_context(label)
            .map(|ctx| (ctx.break_target, ctx.unwind_depth));

        match found {
            Ok((target, depth)) => {
                let unwinds = self.ctx.unwinds_from(depth);
                Ok(IrNode::jump(JumpKind::Goto, target, unwinds, line))
            }
            Err(JumpLookupError::NoTarget) => {
                self.report(LoweringDiagnostic::BreakOutsideTarget { span: brk.span });
                Ok(IrNode::empty(line))
            }
            Err(_) => {
                let name = self.label_name(brk.label.as_ref());
                self.report(LoweringDiagnostic::UndefinedLabel { name, span: brk.span });
                Ok(IrNode::empty(line))
            }
        }
    }

    fn lower_continue(&mut self, cont: &ast::ContinueStatement) -> LowerResult<IrNode> {
        let line = cont.span.line;
        let label = cont.label.as_ref().map(|l| l.name);
        let found = self
            .ctx
            .jumps
            .continue_context(label)
            .map(|ctx| (ctx.continue_target, ctx.unwind_depth));

        match found {
            Ok((Some(target), depth)) => {
                let unwinds = self.ctx.unwinds_from(depth);
                Ok(IrNode::jump(JumpKind::Goto, target, unwinds, line))
            }
            Ok((None, _)) => Err(LowerError::internal("loop context without a continue target")),
            Err(JumpLookupError::NoTarget) => {
                self.report(LoweringDiagnostic::ContinueOutsideLoop { span: cont.span });
                Ok(IrNode::empty(line))
            }
            Err(JumpLookupError::NotALoop) => {
                let name = self.label_name(cont.label.as_ref());
                self.report(LoweringDiagnostic::ContinueNonLoopLabel { name, span: cont.span });
                Ok(IrNode::empty(line))
            }
            Err(JumpLookupError::UndefinedLabel) => {
                let name = self.label_name(cont.label.as_ref());
                self.report(LoweringDiagnostic::UndefinedLabel { name, span: cont.span });
                Ok(IrNode::empty(line))
            }
        }
    }

    fn label_name(&self, label: Option<&ast::Identifier>) -> String {
        label.map(|l| self.resolve(l.name).to_string()).unwrap_or_default()
    }

    fn lower_return(&mut self, ret: &ast::ReturnStatement) -> LowerResult<IrNode> {
        let line = ret.span.line;
        let unwinds = self.ctx.unwinds_from(0);
        let mut node = IrNode::new(NodeKind::Return { unwinds }, line);
        if let Some(argument) = &ret.argument {
            node.push(self.lower_expr(argument)?);
        }
        Ok(node)
    }

    fn lower_labeled(&mut self, labeled: &ast::LabeledStatement) -> LowerResult<IrNode> {
        let line = labeled.span.line;
        let names: Vec<_> = labeled.labels.iter().map(|l| l.name).collect();
        let exit = self.ctx.new_target();

        self.ctx
            .jumps
            .push(JumpContext::for_label(exit, names.clone(), self.ctx.unwinds.len()));
        if labels_loop(&labeled.body) {
            self.ctx.pending_labels.extend(names.iter().copied());
        }
        let body = self.lower_stmt(&labeled.body)?;
        self.ctx.pending_labels.clear();
        self.end_jump_context()?;

        Ok(IrNode::block(
            vec![
                IrNode::new(
                    NodeKind::Label {
                        names,
                        break_target: exit,
                    },
                    line,
                ),
                body,
                IrNode::target(exit, line),
            ],
            line,
        ))
    }

    // ========================================================================
    // Scoped regions
    // ========================================================================

    fn lower_with(&mut self, with: &ast::WithStatement) -> LowerResult<IrNode> {
        let line = with.span.line;
        trace!("lowering with statement at line {}", line);

        let object = self.lower_expr(&with.object)?;
        self.ctx.requires_activation = true;
        self.ctx.unwinds.push(Unwind::Scope);
        let body = self.lower_stmt(&with.body)?;
        self.ctx.unwinds.pop();

        Ok(IrNode::block(Self::with_region(object, vec![body], line), line))
    }

    /// `EnterWith [object]; With [body...]; LeaveWith`
    fn with_region(object: IrNode, body: Vec<IrNode>, line: u32) -> Vec<IrNode> {
        vec![
            IrNode::unary(NodeKind::EnterWith, object, line),
            IrNode::with_children(NodeKind::With, body, line),
            IrNode::new(NodeKind::LeaveWith, line),
        ]
    }

    fn lower_try(&mut self, try_stmt: &ast::TryStatement) -> LowerResult<IrNode> {
        let line = try_stmt.span.line;
        let has_finally = try_stmt
            .finalizer
            .as_ref()
            .map_or(false, |f| !f.statements.is_empty());

        // Nothing can throw, or nothing would observe it
        if try_stmt.block.statements.is_empty() && !has_finally {
            return self.lower_block(&try_stmt.block, ScopeKind::Block);
        }
        if try_stmt.handlers.is_empty() && !has_finally {
            return self.lower_block(&try_stmt.block, ScopeKind::Block);
        }
        trace!(
            "lowering try with {} catch clauses{} at line {}",
            try_stmt.handlers.len(),
            if has_finally { " and finally" } else { "" },
            line
        );

        let handler = self.ctx.new_local();
        let catch_target = self.ctx.new_target();
        let finally_target = if has_finally {
            Some(self.ctx.new_target())
        } else {
            None
        };
        let end_catch = self.ctx.new_target();

        if let Some(target) = finally_target {
            self.ctx.unwinds.push(Unwind::Finally(target));
        }

        let try_block = self.lower_block(&try_stmt.block, ScopeKind::Block)?;
        let mut region = vec![
            try_block,
            IrNode::goto(end_catch, line),
            IrNode::target(catch_target, line),
        ];

        if try_stmt.handlers.is_empty() {
            region.push(IrNode::new(NodeKind::Rethrow(handler), line));
        } else {
            self.ctx.requires_activation = true;
            let scope_local = self.ctx.new_local();
            let mut dispatch = Vec::new();
            let mut has_default = false;

            for (index, clause) in try_stmt.handlers.iter().enumerate() {
                let clause_line = clause.span.line;
                has_default |= clause.guard.is_none();
                dispatch.push(IrNode::unary(
                    NodeKind::CatchScope {
                        name: clause.param.as_ref().map(|p| p.name),
                        index: index as u32,
                        local: scope_local,
                    },
                    IrNode::new(NodeKind::UseLocal(handler), clause_line),
                    clause_line,
                ));
                let body = self.lower_catch_clause(clause, end_catch)?;
                let object = IrNode::new(NodeKind::UseLocal(scope_local), clause_line);
                dispatch.extend(Self::with_region(object, body, clause_line));
            }

            region.push(IrNode::with_children(NodeKind::LocalBlock(scope_local), dispatch, line));
            if !has_default {
                // Every clause is guarded; an unmatched exception propagates
                region.push(IrNode::new(NodeKind::Rethrow(handler), line));
            }
        }
        region.push(IrNode::target(end_catch, line));

        if let Some(finally_target) = finally_target {
            self.ctx.unwinds.pop();
            let finally_end = self.ctx.new_target();
            let finalizer = match &try_stmt.finalizer {
                Some(block) => self.lower_block(block, ScopeKind::Block)?,
                None => IrNode::block(Vec::new(), line),
            };
            region.push(IrNode::jump(JumpKind::Finally, finally_target, Vec::new(), line));
            region.push(IrNode::goto(finally_end, line));
            region.push(IrNode::target(finally_target, line));
            region.push(IrNode::unary(NodeKind::Finally, finalizer, line));
            region.push(IrNode::target(finally_end, line));
        }

        let try_node = IrNode::with_children(
            NodeKind::Try {
                catch_target,
                finally_target,
                handler,
            },
            region,
            line,
        );
        Ok(IrNode::unary(NodeKind::LocalBlock(handler), try_node, line))
    }

    /// Body of one catch clause, run inside the clause's catch scope
    fn lower_catch_clause(&mut self, clause: &ast::CatchClause, end_catch: TargetId) -> LowerResult<Vec<IrNode>> {
        let line = clause.span.line;
        self.ctx.unwinds.push(Unwind::Scope);
        self.ctx.push_scope(ScopeKind::Catch);
        if let Some(param) = &clause.param {
            self.declare(param.name, SymbolKind::CatchParam, param.span);
        }

        let mut children = Vec::new();
        let skip = match &clause.guard {
            Some(guard) => {
                let condition = self.lower_expr(guard)?;
                let skip = self.ctx.new_target();
                children.push(IrNode::branch(JumpKind::IfFalse, condition, skip, line));
                Some(skip)
            }
            None => None,
        };

        let body = self.lower_statements(&clause.body.statements)?;
        let table = self.pop_scope()?;
        self.ctx.unwinds.pop();

        children.push(Self::scoped(table, body, clause.body.span.line));
        children.push(IrNode::new(NodeKind::LeaveWith, line));
        children.push(IrNode::goto(end_catch, line));
        if let Some(skip) = skip {
            children.push(IrNode::target(skip, line));
        }
        Ok(children)
    }
}

/// A labeled statement whose labels a `continue` may name
fn labels_loop(stmt: &Statement) -> bool {
    match stmt {
        Statement::Labeled(inner) => labels_loop(&inner.body),
        other => other.is_loop(),
    }
}
