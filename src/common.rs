mod node;

pub use node::{Node, NodeArena, NodeId};

use std::fmt::Display;

/// Root-to-goal path returned by a successful search. Only
/// [`NodeArena::solution`] builds one, so it always holds at least the root.
#[derive(Debug, Clone)]
pub struct Solution<S, A> {
    pub(crate) nodes: Vec<Node<S, A>>,
}

impl<S, A> Solution<S, A> {
    /// Number of actions in the plan.
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cost(&self) -> usize {
        self.nodes.last().map_or(0, |node| node.path_cost)
    }

    pub fn nodes(&self) -> &[Node<S, A>] {
        &self.nodes
    }

    pub fn goal(&self) -> &Node<S, A> {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn actions(&self) -> impl Iterator<Item = &A> {
        self.nodes.iter().filter_map(|node| node.action.as_ref())
    }
}

impl<S, A: Display> Solution<S, A> {
    pub fn steps(&self) -> Vec<String> {
        self.actions().map(ToString::to_string).collect()
    }
}
