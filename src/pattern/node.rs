//! Pattern grammar
//!
//! A pattern is a small tree built from three constructs:
//!
//! - [`Pattern::Op`]: a concrete operation kind with ordered child patterns
//! - [`Pattern::Label`]: a wildcard with identity, an optional predicate and
//!   an optional wrapped sub-pattern
//! - [`Pattern::Skip`]: a child pattern behind an optionally present
//!   single-argument node
//!
//! # Example
//!
//! ```ignore
//! use reshape_optimizer::pattern::{Label, Pattern};
//!
//! // reshape(reshape(x))
//! let x = Label::new("x");
//! let pattern = Pattern::reshape(Pattern::reshape(x.pattern()));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::graph::OpKind;

use super::predicate::{NodePredicate, Predicate};

static NEXT_LABEL_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique label identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(usize);

impl LabelId {
    fn fresh() -> Self {
        Self(NEXT_LABEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Wildcard pattern node
///
/// Clones share the identity, so every occurrence of a cloned label inside
/// one pattern must bind to the same graph node.
#[derive(Clone)]
pub struct Label {
    id: LabelId,
    name: Arc<str>,
    predicate: Option<Predicate>,
    pattern: Option<Arc<Pattern>>,
}

impl Label {
    /// Unconstrained label
    pub fn new(name: &str) -> Self {
        Self {
            id: LabelId::fresh(),
            name: Arc::from(name),
            predicate: None,
            pattern: None,
        }
    }

    /// Label accepting only nodes that satisfy `predicate`
    pub fn with_predicate(mut self, predicate: impl NodePredicate + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Label whose bound node must also match `pattern`
    pub fn wrapping(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(Arc::new(pattern));
        self
    }

    /// Identity shared by all clones
    pub fn id(&self) -> LabelId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached predicate, if any
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Wrapped sub-pattern, if any
    pub fn sub_pattern(&self) -> Option<&Pattern> {
        self.pattern.as_deref()
    }

    /// This label as a pattern node
    pub fn pattern(&self) -> Pattern {
        Pattern::Label(self.clone())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Label");
        s.field("id", &self.id).field("name", &self.name);
        if let Some(predicate) = &self.predicate {
            s.field("predicate", predicate);
        }
        if let Some(pattern) = &self.pattern {
            s.field("pattern", pattern);
        }
        s.finish()
    }
}

/// Pattern node
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Concrete operation with ordered child patterns
    Op {
        /// Operation kind to match
        kind: OpKind,
        /// One pattern per argument
        children: Vec<Pattern>,
    },

    /// Wildcard with identity
    Label(Label),

    /// Child pattern, optionally behind one pass-through node
    Skip {
        /// Pattern matched either at the candidate or at its single argument
        child: Box<Pattern>,
        /// Decides whether the candidate is the optional node
        optional: Predicate,
    },
}

impl Pattern {
    /// Operation pattern
    pub fn op(kind: OpKind, children: Vec<Pattern>) -> Self {
        Self::Op { kind, children }
    }

    /// Any reshape over `argument`; the axis order is left to the callback
    pub fn reshape(argument: Pattern) -> Self {
        Self::op(OpKind::Reshape, vec![argument])
    }

    /// Dot product of two patterns
    pub fn dot(lhs: Pattern, rhs: Pattern) -> Self {
        Self::op(OpKind::Dot, vec![lhs, rhs])
    }

    /// Unary element-wise operation
    pub fn unary(kind: OpKind, argument: Pattern) -> Self {
        Self::op(kind, vec![argument])
    }

    /// Binary element-wise operation
    pub fn binary(kind: OpKind, lhs: Pattern, rhs: Pattern) -> Self {
        Self::op(kind, vec![lhs, rhs])
    }

    /// `child`, possibly behind a node satisfying `optional`
    pub fn skip(child: Pattern, optional: impl NodePredicate + 'static) -> Self {
        Self::Skip {
            child: Box::new(child),
            optional: Arc::new(optional),
        }
    }

    /// Visit every label reachable in this pattern, wrapped sub-patterns included
    pub fn labels(&self) -> Vec<&Label> {
        let mut labels = Vec::new();
        self.collect_labels(&mut labels);
        labels
    }

    fn collect_labels<'p>(&'p self, labels: &mut Vec<&'p Label>) {
        match self {
            Self::Op { children, .. } => {
                for child in children {
                    child.collect_labels(labels);
                }
            }
            Self::Label(label) => {
                if !labels.iter().any(|l| l.id() == label.id()) {
                    labels.push(label);
                }
                if let Some(sub) = label.sub_pattern() {
                    sub.collect_labels(labels);
                }
            }
            Self::Skip { child, .. } => child.collect_labels(labels),
        }
    }
}

impl From<Label> for Pattern {
    fn from(label: Label) -> Self {
        Pattern::Label(label)
    }
}

impl From<&Label> for Pattern {
    fn from(label: &Label) -> Self {
        label.pattern()
    }
}
