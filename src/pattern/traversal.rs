//! Graph traversal utilities
//!
//! Breadth-first reachability over the node arena. Cycle checks in
//! `replace_node` and the liveness sweep both walk argument edges with it.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::graph::{Graph, NodeId};

/// Direction of traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward: follow user edges (producer → consumer)
    Forward,
    /// Backward: follow argument edges (consumer → producer)
    Backward,
}

fn neighbors(graph: &Graph, node: NodeId, direction: Direction) -> Vec<NodeId> {
    match direction {
        Direction::Forward => graph.users(node),
        Direction::Backward => graph.arguments(node).to_vec(),
    }
}

/// BFS traversal iterator
pub struct BfsIterator<'a> {
    graph: &'a Graph,
    queue: VecDeque<NodeId>,
    visited: FxHashSet<NodeId>,
    direction: Direction,
}

impl<'a> BfsIterator<'a> {
    /// Create a new BFS iterator starting from the given node
    pub fn new(graph: &'a Graph, start: NodeId, direction: Direction) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = FxHashSet::default();

        if graph.contains(start) {
            queue.push_back(start);
            visited.insert(start);
        }

        Self {
            graph,
            queue,
            visited,
            direction,
        }
    }

    /// Create backward BFS (follows arguments)
    pub fn backward(graph: &'a Graph, start: NodeId) -> Self {
        Self::new(graph, start, Direction::Backward)
    }
}

impl Iterator for BfsIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;

        for next in neighbors(self.graph, node, self.direction) {
            if self.visited.insert(next) {
                self.queue.push_back(next);
            }
        }

        Some(node)
    }
}

/// Collect all nodes reachable from start in the given direction
pub fn reachable_nodes(graph: &Graph, start: NodeId, direction: Direction) -> Vec<NodeId> {
    BfsIterator::new(graph, start, direction).collect()
}

/// Collect all transitive arguments of `start`
pub fn predecessors(graph: &Graph, start: NodeId) -> Vec<NodeId> {
    BfsIterator::backward(graph, start).skip(1).collect() // skip start node
}
