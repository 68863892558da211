//! Constant Folding
//!
//! Peephole simplification of operators applied to literal operands. Folds
//! are limited to literal-literal arithmetic and string concatenation,
//! identity operations (`x - 0`, `x * 1`, `x / 1` become `+x`), and
//! short-circuit operators whose left operand has a statically known value.
//! `x * 0` is never folded and operands are never reordered.

use crate::ir::{BinaryOp, IrNode, LogicalOp, NodeKind, UnaryOp};

/// Constant folding helper used by the lowering routines
#[derive(Debug, Clone, Copy)]
pub struct ConstantFolder {
    enabled: bool,
}

impl ConstantFolder {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Static truthiness of a literal node
    ///
    /// Only `true`, `false`, `null` and numbers are considered.
    pub fn truthiness(&self, node: &IrNode) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        match node.kind {
            NodeKind::True => Some(true),
            NodeKind::False | NodeKind::Null => Some(false),
            NodeKind::Number(n) => Some(!n.is_nan() && n != 0.0),
            _ => None,
        }
    }

    /// Build `left op right`, folding when possible
    pub fn binary(&self, op: BinaryOp, left: IrNode, right: IrNode, line: u32) -> IrNode {
        if self.enabled {
            match self.fold_binary(op, left, right, line) {
                Ok(folded) => folded,
                Err((left, right)) => IrNode::binary(NodeKind::Binary(op), left, right, line),
            }
        } else {
            IrNode::binary(NodeKind::Binary(op), left, right, line)
        }
    }

    fn fold_binary(&self, op: BinaryOp, left: IrNode, right: IrNode, line: u32) -> Result<IrNode, (IrNode, IrNode)> {
        match op {
            BinaryOp::Add => match (&left.kind, &right.kind) {
                (NodeKind::String(l), NodeKind::String(r)) => Ok(IrNode::string(format!("{}{}", l, r), line)),
                (NodeKind::String(l), NodeKind::Number(r)) => {
                    Ok(IrNode::string(format!("{}{}", l, number_to_string(*r)), line))
                }
                (NodeKind::Number(l), NodeKind::String(r)) => {
                    Ok(IrNode::string(format!("{}{}", number_to_string(*l), r), line))
                }
                (NodeKind::Number(l), NodeKind::Number(r)) => Ok(IrNode::number(l + r, line)),
                _ => Err((left, right)),
            },
            BinaryOp::Sub => match (left.number_value(), right.number_value()) {
                (Some(l), Some(r)) => Ok(IrNode::number(l - r, line)),
                // x - 0 => +x (but not x - -0, which maps -0 to +0)
                (None, Some(r)) if r == 0.0 && r.is_sign_positive() => Ok(IrNode::unary(NodeKind::Unary(UnaryOp::Pos), left, line)),
                _ => Err((left, right)),
            },
            BinaryOp::Mul => match (left.number_value(), right.number_value()) {
                (Some(l), Some(r)) => Ok(IrNode::number(l * r, line)),
                (Some(l), None) if l == 1.0 => Ok(IrNode::unary(NodeKind::Unary(UnaryOp::Pos), right, line)),
                (None, Some(r)) if r == 1.0 => Ok(IrNode::unary(NodeKind::Unary(UnaryOp::Pos), left, line)),
                _ => Err((left, right)),
            },
            BinaryOp::Div => match (left.number_value(), right.number_value()) {
                (Some(l), Some(r)) => Ok(IrNode::number(l / r, line)),
                (None, Some(r)) if r == 1.0 => Ok(IrNode::unary(NodeKind::Unary(UnaryOp::Pos), left, line)),
                _ => Err((left, right)),
            },
            _ => Err((left, right)),
        }
    }

    /// Build `op operand`, folding `-n`, `~n` and `!literal`
    pub fn unary(&self, op: UnaryOp, operand: IrNode, line: u32) -> IrNode {
        if self.enabled {
            match (op, &operand.kind) {
                (UnaryOp::Neg, NodeKind::Number(n)) => return IrNode::number(-n, line),
                (UnaryOp::BitNot, NodeKind::Number(n)) => return IrNode::number(f64::from(!to_int32(*n)), line),
                (UnaryOp::Not, _) => {
                    if let Some(truthy) = self.truthiness(&operand) {
                        let kind = if truthy { NodeKind::False } else { NodeKind::True };
                        return IrNode::new(kind, line);
                    }
                }
                _ => {}
            }
        }
        IrNode::unary(NodeKind::Unary(op), operand, line)
    }

    /// Build `left op right` for `&&`, `||` and `??`
    pub fn logical(&self, op: LogicalOp, left: IrNode, right: IrNode, line: u32) -> IrNode {
        if self.enabled {
            match op {
                LogicalOp::And => match self.truthiness(&left) {
                    Some(true) => return right,
                    Some(false) => return left,
                    None => {}
                },
                LogicalOp::Or => match self.truthiness(&left) {
                    Some(true) => return left,
                    Some(false) => return right,
                    None => {}
                },
                LogicalOp::Nullish => match left.kind {
                    NodeKind::Null => return right,
                    NodeKind::True | NodeKind::False | NodeKind::Number(_) | NodeKind::String(_) => return left,
                    _ => {}
                },
            }
        }
        IrNode::binary(NodeKind::Logical(op), left, right, line)
    }

    /// Build `test ? then : otherwise`, picking a branch for literal tests
    pub fn hook(&self, test: IrNode, then: IrNode, otherwise: IrNode, line: u32) -> IrNode {
        match self.truthiness(&test) {
            Some(true) => then,
            Some(false) => otherwise,
            None => IrNode::with_children(NodeKind::Hook, vec![test, then, otherwise], line),
        }
    }
}

/// ECMAScript ToInt32
pub fn to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

/// ECMAScript Number::toString (radix 10)
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-tripping digits
    let sci = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return format!("{}{}", sign, sci);
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;
    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    };
    format!("{}{}", sign, body)
}
