use super::Solution;
use crate::problem::Problem;

use std::hash::{Hash, Hasher};

/// Stable handle of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A search-tree node. Nodes are never mutated once pushed; the parent link is
/// a handle into the arena that owns the node.
#[derive(Debug, Clone)]
pub struct Node<S, A> {
    pub state: S,
    pub parent: Option<NodeId>,
    pub action: Option<A>,
    pub path_cost: usize,
    pub depth: usize,
}

// Nodes compare by state only, which is what duplicate detection relies on.
impl<S: PartialEq, A> PartialEq for Node<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<S: Eq, A> Eq for Node<S, A> {}

impl<S: Hash, A> Hash for Node<S, A> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.state.hash(hasher);
    }
}

#[derive(Debug)]
pub struct NodeArena<S, A> {
    nodes: Vec<Node<S, A>>,
}

impl<S: Clone, A: Clone> Default for NodeArena<S, A> {
    fn default() -> Self {
        NodeArena { nodes: Vec::new() }
    }
}

impl<S: Clone, A: Clone> NodeArena<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&mut self, state: S) -> NodeId {
        self.push(Node {
            state,
            parent: None,
            action: None,
            path_cost: 0,
            depth: 0,
        })
    }

    pub fn get(&self, id: NodeId) -> &Node<S, A> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every node allocated after the first `len` nodes. Handles past
    /// `len` become invalid.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    fn push(&mut self, node: Node<S, A>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Allocates the child reached from `parent` by `action`.
    pub fn child<P>(&mut self, problem: &P, parent: NodeId, action: A) -> Option<NodeId>
    where
        P: Problem<State = S, Action = A> + ?Sized,
    {
        let node = &self.nodes[parent.0];
        let next_state = problem.result(&node.state, &action)?;
        let path_cost = problem.path_cost(node.path_cost, &node.state, &action, &next_state);
        let depth = node.depth + 1;

        Some(self.push(Node {
            state: next_state,
            parent: Some(parent),
            action: Some(action),
            path_cost,
            depth,
        }))
    }

    /// Allocates every child of `id`, in the order the problem lists actions.
    pub fn expand<P>(&mut self, problem: &P, id: NodeId) -> Vec<NodeId>
    where
        P: Problem<State = S, Action = A> + ?Sized,
    {
        problem
            .actions(&self.nodes[id.0].state)
            .into_iter()
            .filter_map(|action| self.child(problem, id, action))
            .collect()
    }

    /// Walks parent handles back from `goal` and returns the root-to-goal path.
    pub fn solution(&self, goal: NodeId) -> Solution<S, A> {
        let mut path = vec![self.nodes[goal.0].clone()];
        let mut current = self.nodes[goal.0].parent;
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            path.push(node.clone());
            current = node.parent;
        }
        path.reverse();

        // Re-point parents into the extracted path so it stands on its own.
        for (i, node) in path.iter_mut().enumerate() {
            node.parent = i.checked_sub(1).map(NodeId);
        }

        Solution { nodes: path }
    }
}
