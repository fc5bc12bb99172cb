use super::{Action, BlockState, Problem};
use crate::common::Node;
use crate::model::{Block, WorldModel};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Gather every colour group on a single stack of its own; order inside a
/// stack does not matter. Blocks may only be stacked on their own colour.
#[derive(Debug, Clone)]
pub struct ColorGroupingProblem {
    initial: BlockState,
}

impl ColorGroupingProblem {
    pub fn new(model: WorldModel) -> Self {
        Self::with_hand(model, None)
    }

    pub fn with_hand(model: WorldModel, hand: Option<Block>) -> Self {
        ColorGroupingProblem {
            initial: BlockState::new(model, hand),
        }
    }
}

impl Problem for ColorGroupingProblem {
    type State = BlockState;
    type Action = Action;

    fn initial_state(&self) -> &BlockState {
        &self.initial
    }

    fn actions(&self, state: &BlockState) -> Vec<Action> {
        let Some(held) = &state.hand else {
            return state.grab_actions();
        };

        state
            .model
            .stacks()
            .iter()
            .enumerate()
            .filter_map(|(stack, blocks)| {
                blocks
                    .last()
                    .filter(|top| top.color_group == held.color_group)
                    .map(|top| Action::PutOn {
                        block: held.id.clone(),
                        target: top.id.clone(),
                        stack,
                    })
            })
            .collect()
    }

    fn result(&self, state: &BlockState, action: &Action) -> Option<BlockState> {
        match action {
            Action::OnTable { .. } => None,
            _ => state.apply(action),
        }
    }

    fn goal_test(&self, state: &BlockState) -> bool {
        if state.hand.is_some() {
            return false;
        }

        let mut seen: HashSet<&Arc<str>> = HashSet::new();
        for stack in state.model.stacks() {
            let Some(first) = stack.first() else {
                continue;
            };
            if !seen.insert(&first.color_group) {
                return false;
            }
            if stack.iter().any(|b| b.color_group != first.color_group) {
                return false;
            }
        }
        true
    }

    fn heuristic(&self, node: &Node<BlockState, Action>) -> Option<usize> {
        let state = &node.state;
        let mut stacks_per_group: HashMap<&Arc<str>, usize> = HashMap::new();
        for stack in state.model.stacks() {
            let groups: HashSet<&Arc<str>> = stack.iter().map(|b| &b.color_group).collect();
            for group in groups {
                *stacks_per_group.entry(group).or_default() += 1;
            }
        }

        let spread: usize = stacks_per_group
            .values()
            .map(|count| count.saturating_sub(1))
            .sum();
        Some(spread + usize::from(state.hand.is_some()))
    }
}
