mod arrangement;
mod color;

pub use arrangement::ArrangementProblem;
pub use color::ColorGroupingProblem;

use crate::common::Node;
use crate::model::{Block, BlockId, WorldModel};

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// A state space searchable by every algorithm in [`crate::algorithm`].
pub trait Problem: Send + Sync {
    type State: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Action: Clone + Debug + Display + Send + Sync + 'static;

    fn initial_state(&self) -> &Self::State;

    /// Legal actions in `state`, in a stable order.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Successor of `state` under `action`; `None` if the action does not apply.
    fn result(&self, state: &Self::State, action: &Self::Action) -> Option<Self::State>;

    fn goal_test(&self, state: &Self::State) -> bool;

    fn path_cost(
        &self,
        cost: usize,
        _state: &Self::State,
        _action: &Self::Action,
        _next_state: &Self::State,
    ) -> usize {
        cost + 1
    }

    /// Estimated remaining cost. `None` means the problem has no heuristic.
    fn heuristic(&self, _node: &Node<Self::State, Self::Action>) -> Option<usize> {
        None
    }
}

/// The block-world problems as one object-safe type, so the controller can
/// pick the goal kind at runtime.
pub type BlocksProblem = dyn Problem<State = BlockState, Action = Action>;

/// Arrangement of the table plus the gripper contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockState {
    pub model: WorldModel,
    pub hand: Option<Block>,
}

impl BlockState {
    pub fn new(model: WorldModel, hand: Option<Block>) -> Self {
        BlockState { model, hand }
    }

    /// Grab actions for every non-empty stack, scanned left to right.
    pub(crate) fn grab_actions(&self) -> Vec<Action> {
        self.model
            .stacks()
            .iter()
            .enumerate()
            .filter_map(|(stack, blocks)| {
                blocks.last().map(|top| Action::Grab {
                    block: top.id.clone(),
                    stack,
                })
            })
            .collect()
    }

    pub(crate) fn apply(&self, action: &Action) -> Option<BlockState> {
        match action {
            Action::Grab { block, stack } => {
                if self.hand.is_some() {
                    return None;
                }
                let top = self.model.stack(*stack).len().checked_sub(1)?;
                let (model, grabbed) = self.model.pop(*stack, top)?;
                if grabbed.id != *block {
                    return None;
                }
                Some(BlockState {
                    model,
                    hand: Some(grabbed),
                })
            }
            Action::PutOn {
                block,
                target,
                stack,
            } => {
                let held = self.hand.as_ref().filter(|held| held.id == *block)?;
                if self.model.top(*stack).map(|top| &top.id) != Some(target) {
                    return None;
                }
                Some(BlockState {
                    model: self.model.add(held.clone(), *stack)?,
                    hand: None,
                })
            }
            Action::OnTable { block, stack } => {
                let held = self.hand.as_ref().filter(|held| held.id == *block)?;
                if !self.model.stack(*stack).is_empty() {
                    return None;
                }
                Some(BlockState {
                    model: self.model.add(held.clone(), *stack)?,
                    hand: None,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Grab {
        block: BlockId,
        stack: usize,
    },
    PutOn {
        block: BlockId,
        target: BlockId,
        stack: usize,
    },
    OnTable {
        block: BlockId,
        stack: usize,
    },
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Grab { block, .. } => write!(f, "Grab {block}"),
            Action::PutOn { block, target, .. } => write!(f, "Put {block} on {target}"),
            Action::OnTable { block, .. } => write!(f, "Put {block} on table"),
        }
    }
}
