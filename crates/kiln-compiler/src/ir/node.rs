//! IR Nodes
//!
//! A closed set of node kinds. Statement-level kinds carry control flow
//! (jumps, targets, local blocks); expression-level kinds mirror the
//! evaluation order of the source language.

use super::props::{PropKey, PropValue};
use super::scope::ScopeTable;
use kiln_syntax::ast::{BinaryOperator, LogicalOperator, VariableKind};
use kiln_syntax::Symbol;
use std::fmt;

/// Jump anchor, unique within one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Block-scoped storage slot, unique within one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Index into the script's function table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    /// Unconditional
    Goto,
    /// Jump when the condition child is truthy
    IfTrue,
    /// Jump when the condition child is falsy
    IfFalse,
    /// Run the finally block anchored at the target, then continue after the jump
    Finally,
}

/// A frame an exit edge leaves on its way out, innermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unwind {
    /// Run the finally block anchored at this target
    Finally(TargetId),
    /// Leave a `with` (or catch) scope
    Scope,
}

/// How a for-in/for-of loop enumerates its object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumMode {
    /// Property keys (for-in)
    Keys,
    /// `[key, value]` pairs (for-in with a destructuring head)
    Array,
    /// Iterated values in order (for-of)
    ValuesInOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncDecFlags {
    pub decrement: bool,
    pub postfix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    Ne,
    ShEq,
    ShNe,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstanceOf,
    BitAnd,
    BitOr,
    BitXor,
    Lsh,
    Rsh,
    Ursh,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Exp => "**",
            Eq => "==",
            Ne => "!=",
            ShEq => "===",
            ShNe => "!==",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            In => "in",
            InstanceOf => "instanceof",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Lsh => "<<",
            Rsh => ">>",
            Ursh => ">>>",
        }
    }
}

impl From<BinaryOperator> for BinaryOp {
    fn from(op: BinaryOperator) -> Self {
        use BinaryOperator::*;
        match op {
            Add => BinaryOp::Add,
            Subtract => BinaryOp::Sub,
            Multiply => BinaryOp::Mul,
            Divide => BinaryOp::Div,
            Modulo => BinaryOp::Mod,
            Exponent => BinaryOp::Exp,
            Equal => BinaryOp::Eq,
            NotEqual => BinaryOp::Ne,
            StrictEqual => BinaryOp::ShEq,
            StrictNotEqual => BinaryOp::ShNe,
            LessThan => BinaryOp::Lt,
            LessEqual => BinaryOp::Le,
            GreaterThan => BinaryOp::Gt,
            GreaterEqual => BinaryOp::Ge,
            In => BinaryOp::In,
            InstanceOf => BinaryOp::InstanceOf,
            BitwiseAnd => BinaryOp::BitAnd,
            BitwiseOr => BinaryOp::BitOr,
            BitwiseXor => BinaryOp::BitXor,
            LeftShift => BinaryOp::Lsh,
            RightShift => BinaryOp::Rsh,
            UnsignedRightShift => BinaryOp::Ursh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl From<LogicalOperator> for LogicalOp {
    fn from(op: LogicalOperator) -> Self {
        match op {
            LogicalOperator::And => LogicalOp::And,
            LogicalOperator::Or => LogicalOp::Or,
            LogicalOperator::NullishCoalescing => LogicalOp::Nullish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    BitNot,
    Typeof,
    Void,
    /// Getter wrapper in an object literal
    Get,
    /// Setter wrapper in an object literal
    Set,
    /// Method wrapper in an object literal
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassMemberKind {
    Method,
    Getter,
    Setter,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoratorName {
    Wrap,
    Register,
    Initialize,
    NumericTemplate,
    User(Symbol),
}

/// The closed set of IR node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ------------------------------------------------------------------
    // Structure and control flow
    // ------------------------------------------------------------------
    /// Sequence of statements
    Block,
    /// Sequence of statements that introduces bindings
    Scope(Box<ScopeTable>),
    /// Owner of a local slot; children may use it
    LocalBlock(LocalId),
    /// Zero-effect jump anchor
    Target(TargetId),
    /// `[condition]` for conditional kinds, no children for Goto/Finally
    Jump {
        kind: JumpKind,
        target: TargetId,
        unwinds: Vec<Unwind>,
    },
    /// `[discriminant, Case...]`
    Switch {
        break_target: TargetId,
        default: Option<TargetId>,
    },
    /// `[test]`: jump to the target when `discriminant === test`
    Case(TargetId),
    /// Lowered loop body sequence
    Loop {
        break_target: TargetId,
        continue_target: TargetId,
    },
    /// Label marker at the start of a labeled block
    Label {
        names: Vec<Symbol>,
        break_target: TargetId,
    },
    /// `[value?]`
    Return { unwinds: Vec<Unwind> },
    /// `[value]`
    Throw,
    /// Rethrow the exception held in the handler slot
    Rethrow(LocalId),
    /// Try region; on exception the execution layer stores the thrown value
    /// in `handler` and continues at `catch_target`
    Try {
        catch_target: TargetId,
        finally_target: Option<TargetId>,
        handler: LocalId,
    },
    /// `[UseLocal(handler)]`: build the scope object of catch clause `index`
    /// and store it in `local`
    CatchScope {
        name: Option<Symbol>,
        index: u32,
        local: LocalId,
    },
    /// `[scope object]`
    EnterWith,
    /// Body executed with the entered scope
    With,
    LeaveWith,
    /// Finally block body, entered through `Jump::Finally`
    Finally,
    /// `[object]`: start enumerating into `local`
    EnumInit { local: LocalId, mode: EnumMode },
    /// Advance the enumeration; true while elements remain
    EnumNext(LocalId),
    /// Current enumerated element
    EnumId(LocalId),
    /// `[expr]` evaluated for effect
    ExprVoid,
    /// `[expr]` whose value becomes the script result
    ExprResult,
    /// Declarations: `Name` leaves or initializing assignments
    VarDecl(VariableKind),
    /// `[Decorator...]`
    DecoratorDecl(Symbol),
    Empty,
    Debugger,

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    Number(f64),
    String(String),
    True,
    False,
    Null,
    This,
    Undefined,
    RegExp { pattern: String, flags: String },
    /// `[tag?, String, expr, String, ...]`
    Template { tagged: bool },
    Name(Symbol),
    BindName(Symbol),
    /// `[BindName, value]`
    SetName,
    /// `[BindName, value]` for const bindings
    SetConst,
    UseLocal(LocalId),
    /// The value read by an enclosing `*Op` assignment
    UseStack,
    /// `[object, key]`
    GetProp,
    /// `[object, index]`
    GetElem,
    /// `[object, key, value]`
    SetProp,
    /// `[object, index, value]`
    SetElem,
    /// `[object, key, op(UseStack, rhs)]`
    SetPropOp,
    /// `[object, index, op(UseStack, rhs)]`
    SetElemOp,
    /// `[reference]`
    GetRef,
    /// `[reference, value]`
    SetRef,
    /// `[reference, op(UseStack, rhs)]`
    SetRefOp,
    /// `[callee, args...]` producing a reference
    RefCall,
    /// `[Name | GetProp | GetElem | GetRef]`
    IncDec(IncDecFlags),
    /// `[object, key]`
    DelProp,
    /// `[reference]`
    DelRef,
    TypeofName(Symbol),
    Binary(BinaryOp),
    Logical(LogicalOp),
    Unary(UnaryOp),
    /// `[test, then, else]`
    Hook,
    Comma,
    /// `[callee, args...]`
    Call,
    /// `[callee, args...]`
    New,
    Spread,
    /// Partial-application hole `f(?)`
    Placeholder,
    Super,
    ArrayLit,
    /// `[array]`: elements from index `from` on
    ArrayRest { from: u32 },
    ObjectLit,
    /// `[key, value]`
    ObjectProperty { computed: bool },
    /// `[object, excluded keys...]`
    ObjectRest,
    Function(FunctionId),
    /// The currently executing function object
    ThisFn,
    /// `[value?]`
    Yield { delegate: bool },
    /// `[init, body]`: bind a temporary to `init` while evaluating `body`
    LetExpr(Symbol),
    /// `[Function(ctor), heritage?, ClassMember..., Decorator...]`
    Class { name: Option<Symbol> },
    /// `[key, value, Decorator...]`
    ClassMember { kind: ClassMemberKind, is_static: bool },
    /// `[args...]`
    Decorator(DecoratorName),
}

/// A node of the lowered tree
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub kind: NodeKind,
    pub children: Vec<IrNode>,
    pub line: u32,
    props: Vec<(PropKey, PropValue)>,
}

impl IrNode {
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            children: Vec::new(),
            line,
            props: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<IrNode>, line: u32) -> Self {
        Self {
            kind,
            children,
            line,
            props: Vec::new(),
        }
    }

    pub fn unary(kind: NodeKind, child: IrNode, line: u32) -> Self {
        Self::with_children(kind, vec![child], line)
    }

    pub fn binary(kind: NodeKind, left: IrNode, right: IrNode, line: u32) -> Self {
        Self::with_children(kind, vec![left, right], line)
    }

    pub fn block(children: Vec<IrNode>, line: u32) -> Self {
        Self::with_children(NodeKind::Block, children, line)
    }

    pub fn empty(line: u32) -> Self {
        Self::new(NodeKind::Empty, line)
    }

    pub fn target(id: TargetId, line: u32) -> Self {
        Self::new(NodeKind::Target(id), line)
    }

    pub fn goto(target: TargetId, line: u32) -> Self {
        Self::jump(JumpKind::Goto, target, Vec::new(), line)
    }

    pub fn jump(kind: JumpKind, target: TargetId, unwinds: Vec<Unwind>, line: u32) -> Self {
        Self::new(
            NodeKind::Jump {
                kind,
                target,
                unwinds,
            },
            line,
        )
    }

    /// Conditional jump on `condition`
    pub fn branch(kind: JumpKind, condition: IrNode, target: TargetId, line: u32) -> Self {
        let mut node = Self::jump(kind, target, Vec::new(), line);
        node.children.push(condition);
        node
    }

    pub fn number(value: f64, line: u32) -> Self {
        Self::new(NodeKind::Number(value), line)
    }

    pub fn string(value: impl Into<String>, line: u32) -> Self {
        Self::new(NodeKind::String(value.into()), line)
    }

    pub fn name(name: Symbol, line: u32) -> Self {
        Self::new(NodeKind::Name(name), line)
    }

    pub fn push(&mut self, child: IrNode) {
        self.children.push(child);
    }

    pub fn first_child(&self) -> Option<&IrNode> {
        self.children.first()
    }

    pub fn is_empty_block(&self) -> bool {
        matches!(self.kind, NodeKind::Block | NodeKind::Empty) && self.children.is_empty()
    }

    pub fn number_value(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Property bag
    // ------------------------------------------------------------------

    pub fn set_prop(&mut self, key: PropKey, value: PropValue) {
        if let Some(slot) = self.props.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.props.push((key, value));
        }
    }

    pub fn with_prop(mut self, key: PropKey, value: PropValue) -> Self {
        self.set_prop(key, value);
        self
    }

    pub fn prop(&self, key: PropKey) -> Option<&PropValue> {
        self.props.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn has_prop(&self, key: PropKey) -> bool {
        self.prop(key).is_some()
    }

    pub fn props(&self) -> &[(PropKey, PropValue)] {
        &self.props
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Pre-order walk over this node and all descendants
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a IrNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Nodes matching `pred`, in pre-order
    pub fn find_all(&self, pred: impl Fn(&IrNode) -> bool) -> Vec<&IrNode> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if pred(n) {
                out.push(n);
            }
        });
        out
    }

    pub fn count(&self, pred: impl Fn(&IrNode) -> bool) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if pred(node) {
                n += 1;
            }
        });
        n
    }
}
