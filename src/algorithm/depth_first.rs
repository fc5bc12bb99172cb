use super::{tree_search, Discipline, Outcome, SearchControl};
use crate::channel::{Control, Endpoint};
use crate::common::NodeArena;
use crate::problem::Problem;
use crate::stat::Stats;

use std::collections::HashSet;
use tracing::{debug, instrument, trace};

/// Depth-first tree search. Not complete when the state space has cycles;
/// rely on the test limit to bound it.
#[instrument(skip_all, name = "depth_first_tree", level = "debug")]
pub fn depth_first_tree_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    tree_search(
        problem,
        SearchControl::new(endpoint, test_limit),
        Discipline::Lifo,
    )
}

#[instrument(skip_all, name = "depth_first_graph", level = "debug")]
pub fn depth_first_graph_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    let mut control = SearchControl::new(endpoint, test_limit);
    let mut stats = Stats::default();
    let mut arena = NodeArena::new();

    let root = arena.root(problem.initial_state().clone());
    let mut frontier = vec![root];
    let mut frontier_states = HashSet::from([problem.initial_state().clone()]);
    let mut explored = HashSet::new();

    loop {
        if let Some(halted) = control.halt(&stats) {
            return halted;
        }

        let Some(current) = frontier.pop() else {
            debug!("frontier exhausted, explored {} states", explored.len());
            return Outcome::NoSolution;
        };

        stats.tested_nodes += 1;
        let state = arena.get(current).state.clone();
        if problem.goal_test(&state) {
            return Outcome::Solved {
                solution: arena.solution(current),
                stats,
            };
        }
        frontier_states.remove(&state);
        explored.insert(state);

        for child in arena.expand(problem, current) {
            let child_state = &arena.get(child).state;
            if explored.contains(child_state) || frontier_states.contains(child_state) {
                continue;
            }
            trace!("push node at depth {}", arena.get(child).depth);
            stats.expanded_nodes += 1;
            frontier_states.insert(child_state.clone());
            frontier.push(child);
        }
    }
}
