//! Recurrent matching along single-consumer chains
//!
//! A [`RecurrentMatcher`] applies one pattern repeatedly: each repetition
//! starts where the previous one bound its `operand` label, so a chain of
//! any length is found without spelling it out in the pattern.
//!
//! # Chain order
//!
//! Index 0 of a [`RecurrentMatch`] is the seed, the outermost link nearest
//! the consumers. The last entry is the innermost link, nearest the
//! driving operand.

use std::fmt;

use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Graph, NodeId};

use super::matcher::{match_seeded, PatternMap};
use super::node::{Label, Pattern};

/// Sequence of bindings, one per repetition, in chain order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrentMatch {
    maps: Vec<PatternMap>,
}

impl RecurrentMatch {
    /// Number of repetitions
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether no repetition matched
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Per-repetition bindings
    pub fn maps(&self) -> &[PatternMap] {
        &self.maps
    }

    /// The node each repetition was matched at
    pub fn roots(&self) -> Vec<NodeId> {
        self.maps.iter().filter_map(PatternMap::root).collect()
    }

    /// Nodes bound to `label`, one per repetition that bound it
    pub fn bound_nodes(&self, label: &Label) -> Vec<NodeId> {
        self.maps.iter().filter_map(|map| map.get(label)).collect()
    }

    /// Binding of `label` in the outermost repetition
    pub fn first(&self, label: &Label) -> GraphResult<NodeId> {
        self.maps
            .first()
            .ok_or_else(|| GraphError::invariant("empty recurrent match"))?
            .node(label)
    }

    /// Binding of `label` in the innermost repetition
    pub fn last(&self, label: &Label) -> GraphResult<NodeId> {
        self.maps
            .last()
            .ok_or_else(|| GraphError::invariant("empty recurrent match"))?
            .node(label)
    }
}

/// Callback invoked with a whole chain
pub type RecurrentCallback =
    Box<dyn Fn(&mut Graph, &RecurrentMatch) -> GraphResult<bool> + Send + Sync>;

/// Matcher for variable-length chains of one repeated pattern
pub struct RecurrentMatcher {
    name: String,
    pattern: Pattern,
    recurring: Label,
    operand: Label,
    correlated: Vec<Label>,
    max_length: Option<usize>,
    callback: RecurrentCallback,
}

impl RecurrentMatcher {
    /// Create a recurrent matcher
    ///
    /// # Arguments
    /// * `pattern` - Pattern for one link
    /// * `recurring` - Label bound to the link node of each repetition
    /// * `operand` - Label whose binding is where the next repetition starts
    /// * `correlated` - Labels that must bind to the same node in every repetition
    pub fn new<F>(
        name: impl Into<String>,
        pattern: Pattern,
        recurring: Label,
        operand: Label,
        correlated: Vec<Label>,
        callback: F,
    ) -> Self
    where
        F: Fn(&mut Graph, &RecurrentMatch) -> GraphResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            recurring,
            operand,
            correlated,
            max_length: None,
            callback: Box::new(callback),
        }
    }

    /// Bound the number of repetitions
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Matcher name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label bound to each link node
    pub fn recurring(&self) -> &Label {
        &self.recurring
    }

    /// Label marking where each link continues
    pub fn operand(&self) -> &Label {
        &self.operand
    }

    /// Repetition bound, if any
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Match the chain starting at `seed`
    ///
    /// Stops at the first repetition that fails to match, at a repetition
    /// after the seed whose `recurring` node has more than one unique user,
    /// or at `max_length`.
    /// Repetitions matched before the stop are kept.
    pub fn match_chain(&self, graph: &Graph, seed: NodeId) -> Option<RecurrentMatch> {
        let mut maps: Vec<PatternMap> = Vec::new();
        let mut correlated = PatternMap::new();
        let mut candidate = seed;

        loop {
            if self.max_length.is_some_and(|max| maps.len() >= max) {
                trace!(matcher = %self.name, length = maps.len(), "chain length bound reached");
                break;
            }

            let Some(map) = match_seeded(graph, &self.pattern, candidate, correlated.clone())
            else {
                break;
            };

            let Some(link) = map.get(&self.recurring) else {
                trace!(matcher = %self.name, %candidate, "recurring label left unbound");
                break;
            };
            if !maps.is_empty() && graph.user_count(link) > 1 {
                trace!(matcher = %self.name, %link, "chain stopped at fan-out");
                break;
            }

            if maps.is_empty() {
                for label in &self.correlated {
                    if let Some(node) = map.get(label) {
                        correlated.bind(label.id(), node);
                    }
                }
            }

            let next = map.get(&self.operand);
            maps.push(map);

            match next {
                Some(next) if next != candidate => candidate = next,
                _ => break,
            }
        }

        if maps.is_empty() {
            None
        } else {
            Some(RecurrentMatch { maps })
        }
    }

    /// Run the callback on a chain produced by this matcher
    pub fn apply(&self, graph: &mut Graph, chain: &RecurrentMatch) -> GraphResult<bool> {
        (self.callback)(graph, chain)
    }
}

impl fmt::Debug for RecurrentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurrentMatcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("recurring", &self.recurring)
            .field("operand", &self.operand)
            .field("correlated", &self.correlated)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
