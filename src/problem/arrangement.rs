use super::{Action, BlockState, Problem};
use crate::common::Node;
use crate::model::{Block, WorldModel};

/// Reach one exact target arrangement, gripper contents included.
#[derive(Debug, Clone)]
pub struct ArrangementProblem {
    initial: BlockState,
    goal: BlockState,
}

impl ArrangementProblem {
    pub fn new(model: WorldModel, goal: WorldModel) -> Self {
        Self::with_hands(model, None, goal, None)
    }

    pub fn with_hands(
        model: WorldModel,
        hand: Option<Block>,
        goal: WorldModel,
        goal_hand: Option<Block>,
    ) -> Self {
        ArrangementProblem {
            initial: BlockState::new(model, hand),
            goal: BlockState::new(goal, goal_hand),
        }
    }

    pub fn goal(&self) -> &BlockState {
        &self.goal
    }

    /// Cost of the blocks of one stack that still have to move. A block is out
    /// of place if it differs from the goal block at its position or sits on
    /// a block that is out of place. The block meant to end up in the hand
    /// adds nothing here: its final grab is the hand term of the heuristic.
    fn stack_estimate(&self, model: &WorldModel, stack_idx: usize) -> usize {
        let goal = &self.goal.model;
        let mut out_of_place = false;
        let mut estimate = 0;

        for (height, block) in model.stack(stack_idx).iter().enumerate() {
            out_of_place = out_of_place || goal.block_at(stack_idx, height) != Some(block);
            if !out_of_place {
                continue;
            }
            if self.goal.hand.as_ref() == Some(block) {
                continue;
            }
            // Leaving and coming back to the same stack takes two moves.
            match goal.locate(&block.id) {
                Some((goal_stack, _)) if goal_stack == stack_idx => estimate += 4,
                _ => estimate += 2,
            }
        }

        estimate
    }
}

impl Problem for ArrangementProblem {
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
            .map(|(stack, blocks)| match blocks.last() {
                Some(top) => Action::PutOn {
                    block: held.id.clone(),
                    target: top.id.clone(),
                    stack,
                },
                None => Action::OnTable {
                    block: held.id.clone(),
                    stack,
                },
            })
            .collect()
    }

    fn result(&self, state: &BlockState, action: &Action) -> Option<BlockState> {
        state.apply(action)
    }

    fn goal_test(&self, state: &BlockState) -> bool {
        if state.hand != self.goal.hand {
            return false;
        }

        let goal = &self.goal.model;
        let stack_count = state.model.stack_count().max(goal.stack_count());
        (0..stack_count).all(|i| state.model.stack(i) == goal.stack(i))
    }

    fn heuristic(&self, node: &Node<BlockState, Action>) -> Option<usize> {
        let state = &node.state;
        let hand_estimate = usize::from(state.hand != self.goal.hand);
        let stacks_estimate: usize = (0..state.model.stack_count())
            .map(|i| self.stack_estimate(&state.model, i))
            .sum();
        Some(hand_estimate + stacks_estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::{model, state};
    use crate::common::NodeArena;

    fn h(problem: &ArrangementProblem, state: BlockState) -> usize {
        let mut arena = NodeArena::new();
        let root = arena.root(state);
        problem.heuristic(arena.get(root)).unwrap()
    }

    #[test]
    fn test_actions_empty_hand() {
        let m = model(&[&[], &[("A", "red"), ("B", "red")], &[("C", "red")], &[]]);
        let problem = ArrangementProblem::new(m.clone(), m.clone());
        let actions = problem.actions(&state(m));
        let rendered: Vec<_> = actions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["Grab B", "Grab C"]);
    }

    #[test]
    fn test_actions_holding_block() {
        let m = model(&[&[], &[("A", "red")], &[("C", "red")]]);
        let problem = ArrangementProblem::new(m.clone(), m.clone());
        let holding = BlockState::new(m, Some(Block::new("B", "red", [0, 0, 0])));
        let rendered: Vec<_> = problem
            .actions(&holding)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["Put B on table", "Put B on A", "Put B on C"]);
    }

    #[test]
    fn test_goal_test_by_identity() {
        let goal = model(&[&[], &[("A", "red"), ("B", "red")]]);
        let problem = ArrangementProblem::new(goal.clone(), goal.clone());

        // Same ids, different colours: still the goal.
        assert!(problem.goal_test(&state(model(&[&[], &[("A", "blue"), ("B", "green")]]))));
        assert!(!problem.goal_test(&state(model(&[&[], &[("B", "red"), ("A", "red")]]))));
        assert!(!problem.goal_test(&state(model(&[&[("A", "red"), ("B", "red")], &[]]))));
        // Extra trailing empty stacks do not matter; extra blocks do.
        assert!(problem.goal_test(&state(model(&[&[], &[("A", "red"), ("B", "red")], &[]]))));
        assert!(!problem.goal_test(&state(model(&[
            &[],
            &[("A", "red"), ("B", "red")],
            &[("C", "red")]
        ]))));

        let holding = BlockState::new(goal, Some(Block::new("C", "red", [0, 0, 0])));
        assert!(!problem.goal_test(&holding));
    }

    #[test]
    fn test_heuristic() {
        let goal = model(&[&[], &[], &[("A", "red"), ("B", "red"), ("C", "red")], &[]]);
        let start = model(&[&[], &[("A", "red"), ("B", "red")], &[("C", "red")], &[]]);
        let problem = ArrangementProblem::new(start.clone(), goal.clone());

        assert_eq!(h(&problem, state(goal.clone())), 0);
        // A and B change stack (2 each), C must leave stack 2 and return (4).
        assert_eq!(h(&problem, state(start)), 8);

        // A correct prefix is left alone; only C is misplaced.
        let partial = model(&[&[("C", "red")], &[], &[("A", "red"), ("B", "red")], &[]]);
        assert_eq!(h(&problem, state(partial.clone())), 2);

        let holding = BlockState::new(
            model(&[&[], &[], &[("A", "red"), ("B", "red")], &[]]),
            Some(Block::new("C", "red", [0, 0, 0])),
        );
        assert_eq!(h(&problem, holding), 1);
    }

    #[test]
    fn test_heuristic_goal_hand_block_on_stack() {
        let b = Block::new("B", "red", [0, 0, 0]);
        let problem = ArrangementProblem::with_hands(
            model(&[&[("A", "red"), ("B", "red")], &[]]),
            None,
            model(&[&[("A", "red")], &[]]),
            Some(b.clone()),
        );
        // A single grab finishes the job.
        assert_eq!(h(&problem, problem.initial_state().clone()), 1);

        let problem = ArrangementProblem::with_hands(
            model(&[&[("A", "red"), ("B", "red"), ("C", "red")], &[]]),
            None,
            model(&[&[("A", "red")], &[("C", "red")]]),
            Some(b),
        );
        assert_eq!(h(&problem, problem.initial_state().clone()), 3);

        let outcome = crate::algorithm::astar_search(&problem, None, None);
        let solution = outcome.solution().expect("three moves suffice");
        assert_eq!(solution.cost(), 3);
        assert_eq!(solution.steps(), vec!["Grab C", "Put C on table", "Grab B"]);
    }
}
