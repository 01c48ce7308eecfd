//! Core rewrite driver
//!
//! [`GraphRewrite`] visits every live node once, in the reverse of the
//! topological order computed before any mutation, and tries its registered
//! matchers in order. The first callback that returns `Ok(true)` ends the
//! work on that node.

use rustc_hash::FxHashSet;
use tracing::{debug, debug_span, trace};

use crate::error::GraphResult;
use crate::graph::{Function, Graph, NodeId, OpKind};
use crate::pattern::{Matcher, RecurrentMatcher};

/// Rewrite configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Maximum pipeline iterations to prevent infinite loops
    pub max_iterations: usize,
    /// Repetition bound handed to recurrent matchers
    pub max_chain_length: Option<usize>,
    /// Whether to sweep dead nodes after each pass
    pub cleanup_after: bool,
    /// Whether to validate the function after each pass
    pub validate_after_pass: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_chain_length: None,
            cleanup_after: true,
            validate_after_pass: false,
        }
    }
}

impl RewriteConfig {
    /// Set the iteration bound
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the recurrent chain bound
    pub fn with_max_chain_length(mut self, max_chain_length: Option<usize>) -> Self {
        self.max_chain_length = max_chain_length;
        self
    }

    /// Enable or disable the dead-node sweep
    pub fn with_cleanup_after(mut self, cleanup_after: bool) -> Self {
        self.cleanup_after = cleanup_after;
        self
    }

    /// Enable or disable validation after each pass
    pub fn with_validate_after_pass(mut self, validate_after_pass: bool) -> Self {
        self.validate_after_pass = validate_after_pass;
        self
    }
}

/// Statistics from a rewrite run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteStats {
    /// Number of nodes the driver visited
    pub nodes_visited: usize,
    /// Number of structural matches found
    pub patterns_matched: usize,
    /// Number of callbacks that rewrote the graph
    pub rewrites_applied: usize,
    /// Number of callbacks that rejected their match
    pub rewrites_rejected: usize,
    /// Number of nodes removed by the dead-node sweep
    pub nodes_eliminated: usize,
    /// Names of the nodes at which a rewrite was applied
    pub rewritten_nodes: Vec<String>,
}

impl RewriteStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful rewrite at `node_name`
    pub fn record(&mut self, node_name: &str) {
        self.rewrites_applied += 1;
        self.rewritten_nodes.push(node_name.to_string());
    }

    /// Whether any rewrite was applied
    pub fn changed(&self) -> bool {
        self.rewrites_applied > 0
    }

    /// Merge with other statistics
    pub fn merge(&mut self, other: RewriteStats) {
        self.nodes_visited += other.nodes_visited;
        self.patterns_matched += other.patterns_matched;
        self.rewrites_applied += other.rewrites_applied;
        self.rewrites_rejected += other.rewrites_rejected;
        self.nodes_eliminated += other.nodes_eliminated;
        self.rewritten_nodes.extend(other.rewritten_nodes);
    }
}

/// Either kind of matcher, in registration order
#[derive(Debug)]
enum RegisteredMatcher {
    Single(Matcher),
    Recurrent(RecurrentMatcher),
}

impl RegisteredMatcher {
    fn name(&self) -> &str {
        match self {
            Self::Single(matcher) => matcher.name(),
            Self::Recurrent(matcher) => matcher.name(),
        }
    }

    /// Match at `node` and run the callback; `None` on structural mismatch
    fn try_rewrite(&self, graph: &mut Graph, node: NodeId) -> GraphResult<Option<bool>> {
        match self {
            Self::Single(matcher) => match matcher.try_match(graph, node) {
                Some(map) => matcher.apply(graph, &map).map(Some),
                None => Ok(None),
            },
            Self::Recurrent(matcher) => match matcher.match_chain(graph, node) {
                Some(chain) => {
                    trace!(matcher = matcher.name(), length = chain.len(), "chain matched");
                    matcher.apply(graph, &chain).map(Some)
                }
                None => Ok(None),
            },
        }
    }
}

/// Whether the driver should skip `node`
///
/// A node is dead once it is eliminated or, unless it is a result, every
/// user it still records is dead. Users are visited before their arguments,
/// so `dead` already holds every user abandoned earlier in the run.
fn is_dead(graph: &Graph, dead: &FxHashSet<NodeId>, node: NodeId) -> bool {
    match graph.get(node) {
        Some(entry) => {
            entry.eliminated
                || (entry.kind() != OpKind::Result
                    && entry.users.iter().all(|user| dead.contains(user)))
        }
        None => true,
    }
}

/// Rewrite pass over a function
///
/// Owns its ordered matcher list; there is no global registry.
#[derive(Debug)]
pub struct GraphRewrite {
    name: String,
    matchers: Vec<RegisteredMatcher>,
}

impl GraphRewrite {
    /// Create a pass with no matchers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matchers: Vec::new(),
        }
    }

    /// Pass name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a single-match rule
    pub fn add_matcher(&mut self, matcher: Matcher) -> &mut Self {
        self.matchers.push(RegisteredMatcher::Single(matcher));
        self
    }

    /// Register a chain rule
    pub fn add_recurrent_matcher(&mut self, matcher: RecurrentMatcher) -> &mut Self {
        self.matchers.push(RegisteredMatcher::Recurrent(matcher));
        self
    }

    /// Registered matcher names, in trial order
    pub fn matcher_names(&self) -> Vec<&str> {
        self.matchers.iter().map(RegisteredMatcher::name).collect()
    }

    /// Number of registered matchers
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether no matcher is registered
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Run one pass
    ///
    /// # Errors
    /// Any callback error is returned immediately; the graph then holds the
    /// rewrites completed before the failing callback.
    pub fn run(&self, function: &mut Function) -> GraphResult<RewriteStats> {
        let span = debug_span!("graph_rewrite", pass = %self.name);
        let _enter = span.enter();

        let order = function.ordered_ops()?;
        let graph = function.graph_mut();
        let mut stats = RewriteStats::new();
        let mut dead: FxHashSet<NodeId> = FxHashSet::default();

        for &node in order.iter().rev() {
            if is_dead(graph, &dead, node) {
                trace!(%node, "skipping dead node");
                dead.insert(node);
                continue;
            }
            stats.nodes_visited += 1;

            for matcher in &self.matchers {
                match matcher.try_rewrite(graph, node)? {
                    None => {
                        trace!(matcher = matcher.name(), %node, "no match");
                    }
                    Some(true) => {
                        stats.patterns_matched += 1;
                        let name = graph.name(node).unwrap_or_default().to_string();
                        debug!(matcher = matcher.name(), node = %name, "rewrite applied");
                        stats.record(&name);
                        if graph.has_no_users(node) && graph.kind(node) != Some(OpKind::Result) {
                            dead.insert(node);
                        }
                        break;
                    }
                    Some(false) => {
                        stats.patterns_matched += 1;
                        stats.rewrites_rejected += 1;
                        debug!(matcher = matcher.name(), %node, "match rejected by callback");
                    }
                }
            }
        }

        debug!(
            visited = stats.nodes_visited,
            applied = stats.rewrites_applied,
            rejected = stats.rewrites_rejected,
            "pass finished"
        );
        Ok(stats)
    }
}
