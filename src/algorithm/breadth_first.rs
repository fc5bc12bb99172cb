use super::{tree_search, Discipline, Outcome, SearchControl};
use crate::channel::{Control, Endpoint};
use crate::common::NodeArena;
use crate::problem::Problem;
use crate::stat::Stats;

use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument, trace};

#[instrument(skip_all, name = "breadth_first_tree", level = "debug")]
pub fn breadth_first_tree_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    tree_search(
        problem,
        SearchControl::new(endpoint, test_limit),
        Discipline::Fifo,
    )
}

/// Breadth-first search with an explored set. Children are goal-tested as
/// they are generated, so the search exits one level early.
#[instrument(skip_all, name = "breadth_first_graph", level = "debug")]
pub fn breadth_first_graph_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    let mut control = SearchControl::new(endpoint, test_limit);
    let mut stats = Stats::default();
    let mut arena = NodeArena::new();

    let root = arena.root(problem.initial_state().clone());
    stats.tested_nodes += 1;
    if problem.goal_test(&arena.get(root).state) {
        return Outcome::Solved {
            solution: arena.solution(root),
            stats,
        };
    }

    let mut frontier = VecDeque::from([root]);
    let mut frontier_states = HashSet::from([arena.get(root).state.clone()]);
    let mut explored = HashSet::new();

    loop {
        if let Some(halted) = control.halt(&stats) {
            return halted;
        }

        let Some(current) = frontier.pop_front() else {
            debug!("frontier exhausted, explored {} states", explored.len());
            return Outcome::NoSolution;
        };
        let state = arena.get(current).state.clone();
        frontier_states.remove(&state);
        explored.insert(state);

        for child in arena.expand(problem, current) {
            let child_state = &arena.get(child).state;
            if explored.contains(child_state) || frontier_states.contains(child_state) {
                continue;
            }

            stats.expanded_nodes += 1;
            stats.tested_nodes += 1;
            if problem.goal_test(child_state) {
                return Outcome::Solved {
                    solution: arena.solution(child),
                    stats,
                };
            }

            trace!("enqueue node at depth {}", arena.get(child).depth);
            frontier_states.insert(child_state.clone());
            frontier.push_back(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::tests::{init_tracing, replay, short_arrangement, tower_arrangement};
    use crate::algorithm::SearchStatus;

    #[test]
    fn test_breadth_first_graph_counts() {
        init_tracing();
        let problem = short_arrangement();
        let outcome = breadth_first_graph_search(&problem, None, None);
        let Outcome::Solved { solution, stats } = outcome else {
            panic!("expected a solution");
        };
        assert_eq!(solution.len(), 4);
        assert_eq!(stats.tested_nodes, stats.expanded_nodes + 1);
        assert!(problem.goal_test(&replay(&problem, &solution)));
    }

    #[test]
    fn test_breadth_first_tree_explores_more_than_graph() {
        init_tracing();
        let problem = short_arrangement();
        let Outcome::Solved { stats: tree, .. } = breadth_first_tree_search(&problem, None, None)
        else {
            panic!("tree search failed");
        };
        let Outcome::Solved { stats: graph, .. } =
            breadth_first_graph_search(&problem, None, None)
        else {
            panic!("graph search failed");
        };
        assert!(tree.tested_nodes > graph.tested_nodes);
    }

    #[test]
    fn test_breadth_first_graph_budget() {
        let problem = tower_arrangement();
        let outcome = breadth_first_graph_search(&problem, None, Some(5));
        assert_eq!(outcome.status(), SearchStatus::BudgetExhausted);
    }
}
