//! Structural pattern matching engine
//!
//! Matches a [`Pattern`] against a candidate node, walking from the node
//! toward its arguments. The grammar does not backtrack: once a child or
//! sibling fails, the whole attempt fails without trying other bindings.
//! The only rollback is inside [`Pattern::Skip`], where bindings made by
//! the failed "absent" attempt are discarded before the "present" attempt.

use std::fmt;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Graph, NodeId};

use super::node::{Label, LabelId, Pattern};
use super::predicate::NodePredicate;

/// Label bindings produced by one successful match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMap {
    root: Option<NodeId>,
    bindings: IndexMap<LabelId, NodeId>,
}

impl PatternMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// The candidate node the match was attempted at
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node bound to `label`
    pub fn get(&self, label: &Label) -> Option<NodeId> {
        self.bindings.get(&label.id()).copied()
    }

    /// Node bound to `label`, failing with `InvariantViolation`
    ///
    /// Callbacks use this for labels the pattern always binds.
    pub fn node(&self, label: &Label) -> GraphResult<NodeId> {
        self.get(label).ok_or_else(|| {
            GraphError::invariant(format!("label '{}' is not bound", label.name()))
        })
    }

    /// Whether `label` is bound
    pub fn contains(&self, label: &Label) -> bool {
        self.bindings.contains_key(&label.id())
    }

    /// Number of bound labels
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no label is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in the order they were made
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, NodeId)> + '_ {
        self.bindings.iter().map(|(&label, &node)| (label, node))
    }

    /// Bind `label` to `node`; an existing binding must agree
    pub(crate) fn bind(&mut self, label: LabelId, node: NodeId) -> bool {
        match self.bindings.get(&label) {
            Some(&bound) => bound == node,
            None => {
                self.bindings.insert(label, node);
                true
            }
        }
    }

    fn checkpoint(&self) -> usize {
        self.bindings.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.bindings.truncate(checkpoint);
    }
}

/// Match `pattern` at `candidate`
///
/// # Returns
/// * `Some(PatternMap)` with the candidate as root on success
/// * `None` on any structural mismatch
pub fn match_pattern(graph: &Graph, pattern: &Pattern, candidate: NodeId) -> Option<PatternMap> {
    match_seeded(graph, pattern, candidate, PatternMap::new())
}

/// Match with labels pre-bound by `seed`
///
/// Seeded bindings take part in the label consistency check, so a label
/// bound in `seed` only matches its recorded node.
pub fn match_seeded(
    graph: &Graph,
    pattern: &Pattern,
    candidate: NodeId,
    mut seed: PatternMap,
) -> Option<PatternMap> {
    if !graph.contains(candidate) {
        return None;
    }
    seed.root = Some(candidate);
    if match_node(graph, pattern, candidate, &mut seed) {
        Some(seed)
    } else {
        None
    }
}

fn match_node(graph: &Graph, pattern: &Pattern, candidate: NodeId, map: &mut PatternMap) -> bool {
    match pattern {
        Pattern::Op { kind, children } => {
            if graph.kind(candidate) != Some(*kind) {
                return false;
            }
            let arguments = graph.arguments(candidate);
            if arguments.len() != children.len() {
                return false;
            }
            children
                .iter()
                .zip(arguments)
                .all(|(child, &argument)| match_node(graph, child, argument, map))
        }

        Pattern::Label(label) => {
            if let Some(predicate) = label.predicate() {
                if !predicate.evaluate(graph, candidate) {
                    trace!(label = label.name(), %candidate, "label predicate rejected node");
                    return false;
                }
            }
            if !map.bind(label.id(), candidate) {
                trace!(label = label.name(), %candidate, "label bound to a different node");
                return false;
            }
            match label.sub_pattern() {
                Some(sub) => match_node(graph, sub, candidate, map),
                None => true,
            }
        }

        Pattern::Skip { child, optional } => {
            let checkpoint = map.checkpoint();
            if match_node(graph, child, candidate, map) {
                return true;
            }
            map.rollback(checkpoint);

            match graph.arguments(candidate) {
                [argument] if optional.evaluate(graph, candidate) => {
                    if match_node(graph, child, *argument, map) {
                        true
                    } else {
                        map.rollback(checkpoint);
                        false
                    }
                }
                _ => false,
            }
        }
    }
}

/// Callback invoked with a successful single match
///
/// Returns `Ok(true)` after mutating the graph, `Ok(false)` to reject the
/// match without touching anything. `Err` aborts the running pass.
pub type MatchCallback = Box<dyn Fn(&mut Graph, &PatternMap) -> GraphResult<bool> + Send + Sync>;

/// A pattern paired with its rewrite callback
pub struct Matcher {
    name: String,
    pattern: Pattern,
    callback: MatchCallback,
}

impl Matcher {
    /// Create a matcher
    pub fn new<F>(name: impl Into<String>, pattern: Pattern, callback: F) -> Self
    where
        F: Fn(&mut Graph, &PatternMap) -> GraphResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            callback: Box::new(callback),
        }
    }

    /// Matcher name, used in logs and statistics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern root
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Attempt a structural match at `candidate`
    pub fn try_match(&self, graph: &Graph, candidate: NodeId) -> Option<PatternMap> {
        match_pattern(graph, &self.pattern, candidate)
    }

    /// Run the callback on a match produced by this matcher
    pub fn apply(&self, graph: &mut Graph, map: &PatternMap) -> GraphResult<bool> {
        (self.callback)(graph, map)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::OpKind;
    use crate::pattern::predicate::{HasRank, IsKind};
    use crate::tensor::ElementType;
    use proptest::prelude::*;

    fn make_test_graph() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![2, 3]).unwrap();
        let t = graph.add_transpose(x, vec![1, 0]).unwrap();
        let back = graph.add_transpose(t, vec![1, 0]).unwrap();
        let neg = graph.add_unary(OpKind::Negative, back).unwrap();
        (graph, x, t, back, neg)
    }

    #[test]
    fn test_op_pattern_binds_labels() {
        let (graph, x, t, back, _) = make_test_graph();
        let operand = Label::new("operand");
        let pattern = Pattern::reshape(Pattern::reshape(operand.pattern()));

        let map = match_pattern(&graph, &pattern, back).unwrap();
        assert_eq!(map.root(), Some(back));
        assert_eq!(map.get(&operand), Some(x));
        assert_eq!(map.len(), 1);

        // one reshape short
        assert!(match_pattern(&graph, &pattern, t).is_none());
    }

    #[test]
    fn test_label_is_match_boundary() {
        let (graph, _, t, back, _) = make_test_graph();
        let any = Label::new("any");
        let pattern = Pattern::reshape(any.pattern());

        // the label binds to the inner reshape without descending into it
        let map = match_pattern(&graph, &pattern, back).unwrap();
        assert_eq!(map.get(&any), Some(t));
    }

    #[test]
    fn test_label_predicate() {
        let (graph, _, t, back, _) = make_test_graph();
        let reshape_only = Label::new("r").with_predicate(IsKind(OpKind::Reshape));
        let pattern = Pattern::reshape(reshape_only.pattern());

        assert!(match_pattern(&graph, &pattern, back).is_some());
        assert!(match_pattern(&graph, &pattern, t).is_none());
    }

    #[test]
    fn test_label_with_sub_pattern() {
        let (graph, x, t, _, neg) = make_test_graph();
        let operand = Label::new("operand");
        let inner = Label::new("inner").wrapping(Pattern::reshape(operand.pattern()));
        let pattern = Pattern::unary(OpKind::Negative, Pattern::reshape(inner.pattern()));

        let map = match_pattern(&graph, &pattern, neg).unwrap();
        assert_eq!(map.get(&inner), Some(t));
        assert_eq!(map.get(&operand), Some(x));
        // insertion order: outer label first
        let order: Vec<_> = map.iter().map(|(_, node)| node).collect();
        assert_eq!(order, vec![t, x]);
    }

    #[test]
    fn test_label_consistency() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let y = graph.add_parameter("y", ElementType::F32, vec![4]).unwrap();
        let same = graph.add_binary(OpKind::Add, x, x).unwrap();
        let different = graph.add_binary(OpKind::Add, x, y).unwrap();

        let a = Label::new("a");
        let pattern = Pattern::binary(OpKind::Add, a.pattern(), a.pattern());

        let map = match_pattern(&graph, &pattern, same).unwrap();
        assert_eq!(map.get(&a), Some(x));
        assert!(match_pattern(&graph, &pattern, different).is_none());
    }

    #[test]
    fn test_arity_and_kind_mismatch() {
        let (graph, x, _, _, neg) = make_test_graph();
        let a = Label::new("a");

        assert!(match_pattern(&graph, &Pattern::reshape(a.pattern()), neg).is_none());
        assert!(match_pattern(&graph, &Pattern::reshape(a.pattern()), x).is_none());
        let too_many = Pattern::op(OpKind::Negative, vec![a.pattern(), a.pattern()]);
        assert!(match_pattern(&graph, &too_many, neg).is_none());
    }

    #[test]
    fn test_skip_absent_and_present() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let relu = graph.add_unary(OpKind::Relu, x).unwrap();
        let direct = graph.add_unary(OpKind::Negative, x).unwrap();
        let through = graph.add_unary(OpKind::Negative, relu).unwrap();

        let operand = Label::new("operand").with_predicate(IsKind(OpKind::Parameter));
        let pattern = Pattern::unary(
            OpKind::Negative,
            Pattern::skip(operand.pattern(), IsKind(OpKind::Relu)),
        );

        assert_eq!(
            match_pattern(&graph, &pattern, direct).and_then(|m| m.get(&operand)),
            Some(x)
        );
        assert_eq!(
            match_pattern(&graph, &pattern, through).and_then(|m| m.get(&operand)),
            Some(x)
        );
    }

    #[test]
    fn test_skip_rolls_back_absent_bindings() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let relu = graph.add_unary(OpKind::Relu, x).unwrap();
        let neg = graph.add_unary(OpKind::Negative, relu).unwrap();

        // the absent attempt binds `seen` to relu and then fails on the
        // parameter predicate; the present attempt must start clean
        let seen = Label::new("seen");
        let leaf = Label::new("leaf").with_predicate(IsKind(OpKind::Parameter));
        let child = seen.clone().wrapping(leaf.pattern());
        let pattern = Pattern::unary(
            OpKind::Negative,
            Pattern::skip(child.pattern(), IsKind(OpKind::Relu)),
        );

        let map = match_pattern(&graph, &pattern, neg).unwrap();
        assert_eq!(map.get(&seen), Some(x));
        assert_eq!(map.get(&leaf), Some(x));
    }

    #[test]
    fn test_skip_requires_predicate() {
        let mut graph = Graph::new();
        let x = graph.add_parameter("x", ElementType::F32, vec![4]).unwrap();
        let neg_inner = graph.add_unary(OpKind::Negative, x).unwrap();
        let neg = graph.add_unary(OpKind::Negative, neg_inner).unwrap();

        let operand = Label::new("operand").with_predicate(IsKind(OpKind::Parameter));
        let pattern = Pattern::unary(
            OpKind::Negative,
            Pattern::skip(operand.pattern(), IsKind(OpKind::Relu)),
        );
        assert!(match_pattern(&graph, &pattern, neg).is_none());
    }

    #[test]
    fn test_seeded_match() {
        let (graph, x, t, back, _) = make_test_graph();
        let operand = Label::new("operand");
        let pattern = Pattern::reshape(operand.pattern());

        let mut seed = PatternMap::new();
        assert!(seed.bind(operand.id(), x));
        assert!(match_seeded(&graph, &pattern, t, seed.clone()).is_some());
        assert!(match_seeded(&graph, &pattern, back, seed).is_none());
    }

    #[test]
    fn test_pattern_map_node_unbound() {
        let map = PatternMap::new();
        let label = Label::new("missing");
        assert!(map.node(&label).unwrap_err().is_invariant_violation());
    }

    #[test]
    fn test_matcher_apply() {
        let (mut graph, x, _, back, _) = make_test_graph();
        let operand = Label::new("operand").with_predicate(HasRank(2));
        let captured = operand.clone();
        let matcher = Matcher::new(
            "double_reshape",
            Pattern::reshape(Pattern::reshape(operand.pattern())),
            move |graph, map| {
                let root = map.root().ok_or_else(|| GraphError::invariant("no root"))?;
                graph.replace_node(root, map.node(&captured)?)?;
                Ok(true)
            },
        );

        let map = matcher.try_match(&graph, back).unwrap();
        assert!(matcher.apply(&mut graph, &map).unwrap());
        assert!(graph.has_no_users(back));
        assert_eq!(graph.users(x).len(), 2);
        assert_eq!(matcher.name(), "double_reshape");
    }

    proptest! {
        #[test]
        fn prop_label_consistency(same in any::<bool>()) {
            let mut graph = Graph::new();
            let x = graph.add_parameter("x", ElementType::F32, vec![3]).unwrap();
            let y = graph.add_parameter("y", ElementType::F32, vec![3]).unwrap();
            let rhs = if same { x } else { y };
            let product = graph.add_binary(OpKind::Multiply, x, rhs).unwrap();

            let a = Label::new("a");
            let pattern = Pattern::binary(OpKind::Multiply, a.pattern(), a.pattern());
            prop_assert_eq!(match_pattern(&graph, &pattern, product).is_some(), same);
        }
    }
}
