//! Typed node predicates
//!
//! Predicates constrain what a [`Label`](super::Label) may bind to and
//! decide whether a [`Skip`](super::Pattern::Skip) treats a node as the
//! optional pass-through. They are plain values implementing
//! [`NodePredicate`], so they can be inspected in `Debug` output and
//! combined with [`PredicateExt`].

use std::fmt;
use std::sync::Arc;

use crate::graph::{Graph, NodeId, OpKind};
use crate::tensor::{ElementType, Shape};

/// A test over one graph node
pub trait NodePredicate: fmt::Debug + Send + Sync {
    /// Evaluate the predicate; unknown ids evaluate to `false`
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool;
}

/// Shared, type-erased predicate as stored inside patterns
pub type Predicate = Arc<dyn NodePredicate>;

impl<P: NodePredicate + ?Sized> NodePredicate for Arc<P> {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        (**self).evaluate(graph, node)
    }
}

/// Node has the given operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsKind(pub OpKind);

impl NodePredicate for IsKind {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.kind(node) == Some(self.0)
    }
}

/// Node output has the given rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasRank(pub usize);

impl NodePredicate for HasRank {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.shape(node).is_some_and(|shape| shape.len() == self.0)
    }
}

/// Node output has exactly the given shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasShape(pub Shape);

impl NodePredicate for HasShape {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.shape(node) == Some(self.0.as_slice())
    }
}

/// Node output has the given element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasElementType(pub ElementType);

impl NodePredicate for HasElementType {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.element_type(node) == Some(self.0)
    }
}

/// Node has exactly one unique user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleUser;

impl NodePredicate for SingleUser {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.has_single_user(node)
    }
}

/// Both predicates hold
#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

impl<A: NodePredicate, B: NodePredicate> NodePredicate for And<A, B> {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        self.0.evaluate(graph, node) && self.1.evaluate(graph, node)
    }
}

/// Either predicate holds
#[derive(Debug, Clone)]
pub struct Or<A, B>(pub A, pub B);

impl<A: NodePredicate, B: NodePredicate> NodePredicate for Or<A, B> {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        self.0.evaluate(graph, node) || self.1.evaluate(graph, node)
    }
}

/// Predicate does not hold (on an existing node)
#[derive(Debug, Clone)]
pub struct Not<P>(pub P);

impl<P: NodePredicate> NodePredicate for Not<P> {
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.contains(node) && !self.0.evaluate(graph, node)
    }
}

/// Named closure predicate, for conditions the typed predicates cannot express
pub struct FnPredicate<F> {
    name: &'static str,
    function: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&Graph, NodeId) -> bool + Send + Sync,
{
    /// Wrap a closure under a name used for `Debug` output
    pub fn new(name: &'static str, function: F) -> Self {
        Self { name, function }
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnPredicate({})", self.name)
    }
}

impl<F> NodePredicate for FnPredicate<F>
where
    F: Fn(&Graph, NodeId) -> bool + Send + Sync,
{
    fn evaluate(&self, graph: &Graph, node: NodeId) -> bool {
        graph.contains(node) && (self.function)(graph, node)
    }
}

/// Combinators available on every predicate
pub trait PredicateExt: NodePredicate + Sized {
    /// Both `self` and `other`
    fn and<P: NodePredicate>(self, other: P) -> And<Self, P> {
        And(self, other)
    }

    /// Either `self` or `other`
    fn or<P: NodePredicate>(self, other: P) -> Or<Self, P> {
        Or(self, other)
    }

    /// Negation of `self`
    fn not(self) -> Not<Self> {
        Not(self)
    }

    /// Type-erase into a shareable [`Predicate`]
    fn shared(self) -> Predicate
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<P: NodePredicate + Sized> PredicateExt for P {}
