//! Pattern AST nodes
//!
//! Patterns are used in variable declarations, function parameters,
//! for-in/for-of heads and assignment targets.

use super::*;
use crate::span::Span;

/// Pattern (for destructuring and binding)
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Simple identifier: x
    Identifier(Identifier),

    /// Array destructuring: [x, , y = 1, ...rest]
    Array(ArrayPattern),

    /// Object destructuring: { x, y: [a, b], ...rest }
    Object(ObjectPattern),

    /// Any other assignment target (`o.p`, `a[i]`, `f()`), or an invalid one
    Expression(Box<Expression>),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Identifier(id) => &id.span,
            Pattern::Array(p) => &p.span,
            Pattern::Object(p) => &p.span,
            Pattern::Expression(e) => e.span(),
        }
    }

    /// Check if this pattern destructures
    pub fn is_destructuring(&self) -> bool {
        matches!(self, Pattern::Array(_) | Pattern::Object(_))
    }

    /// Collect every identifier bound by this pattern, left to right
    pub fn bound_names(&self) -> Vec<&Identifier> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Pattern::Identifier(id) => out.push(id),
            Pattern::Array(p) => {
                for element in p.elements.iter().flatten() {
                    element.target.collect_names(out);
                }
                if let Some(rest) = &p.rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Object(p) => {
                for prop in &p.properties {
                    prop.value.collect_names(out);
                }
                if let Some(rest) = &p.rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Expression(_) => {}
        }
    }
}

/// Array destructuring pattern; `None` elements are skipped slots
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPattern {
    pub elements: Vec<Option<PatternElement>>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternElement {
    pub target: Pattern,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    pub key: PropertyKey,
    pub value: Pattern,
    pub default: Option<Expression>,
    pub shorthand: bool,
    pub span: Span,
}
