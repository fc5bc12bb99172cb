use super::{Outcome, SearchControl};
use crate::channel::{Control, Endpoint};
use crate::common::{NodeArena, NodeId};
use crate::problem::Problem;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument, trace};

/// Open-list key: lowest `f` first, then insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f_cost: usize,
    order: usize,
    node: NodeId,
}

/// Best-first graph search on `f = path_cost + heuristic`.
///
/// A frontier entry is replaced when its state is reached again with a strictly
/// lower `f`. An explored state is reopened when reached with a strictly lower
/// path cost, which keeps the result optimal for admissible heuristics that
/// are not consistent.
#[instrument(skip_all, name = "astar", level = "debug")]
pub fn astar_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    let mut control = SearchControl::new(endpoint, test_limit);
    let mut stats = Stats::default();
    let mut arena = NodeArena::new();

    let root = arena.root(problem.initial_state().clone());
    let Some(root_h) = problem.heuristic(arena.get(root)) else {
        return Outcome::Malformed("A* requires a heuristic".to_string());
    };

    let mut order = 0;
    let mut open_list = BTreeSet::new();
    let mut frontier: HashMap<P::State, OpenEntry> = HashMap::new();
    let mut closed_list: HashMap<P::State, usize> = HashMap::new();

    let start = OpenEntry {
        f_cost: root_h,
        order,
        node: root,
    };
    open_list.insert(start);
    frontier.insert(problem.initial_state().clone(), start);

    loop {
        if let Some(halted) = control.halt(&stats) {
            return halted;
        }

        let Some(current) = open_list.pop_first() else {
            debug!("open list exhausted, closed {} states", closed_list.len());
            return Outcome::NoSolution;
        };

        stats.tested_nodes += 1;
        let node = arena.get(current.node);
        trace!("expand node: f {} g {}", current.f_cost, node.path_cost);
        if problem.goal_test(&node.state) {
            return Outcome::Solved {
                solution: arena.solution(current.node),
                stats,
            };
        }
        let state = node.state.clone();
        closed_list.insert(state.clone(), node.path_cost);
        frontier.remove(&state);

        for child in arena.expand(problem, current.node) {
            let child_node = arena.get(child);
            let g_cost = child_node.path_cost;
            let f_cost = g_cost + problem.heuristic(child_node).unwrap_or(0);

            if let Some(old) = frontier.get(&child_node.state) {
                if f_cost >= old.f_cost {
                    continue;
                }
                debug!("find a smaller f cost {f_cost} (was {})", old.f_cost);
                // We should find such node already in open list.
                open_list.remove(old);
            } else if let Some(&closed_g) = closed_list.get(&child_node.state) {
                if g_cost >= closed_g {
                    continue;
                }
                debug!("reopen state with g cost {g_cost} (was {closed_g})");
                closed_list.remove(&child_node.state);
            } else {
                stats.expanded_nodes += 1;
            }

            order += 1;
            let entry = OpenEntry {
                f_cost,
                order,
                node: child,
            };
            open_list.insert(entry);
            frontier.insert(child_node.state.clone(), entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::tests::{init_tracing, replay, split_colors, tower_arrangement};
    use crate::algorithm::{breadth_first_graph_search, SearchStatus};
    use crate::common::fixtures::model;
    use crate::common::Node;
    use crate::model::Block;
    use crate::problem::{Action, BlockState, ColorGroupingProblem};

    /// Colour grouping with the heuristic switched off.
    struct Blind(ColorGroupingProblem);

    impl Problem for Blind {
        type State = BlockState;
        type Action = Action;

        fn initial_state(&self) -> &BlockState {
            self.0.initial_state()
        }

        fn actions(&self, state: &BlockState) -> Vec<Action> {
            self.0.actions(state)
        }

        fn result(&self, state: &BlockState, action: &Action) -> Option<BlockState> {
            self.0.result(state, action)
        }

        fn goal_test(&self, state: &BlockState) -> bool {
            self.0.goal_test(state)
        }
    }

    /// Small weighted digraph on numbered states.
    struct Weighted {
        edges: &'static [(u8, u8, usize)],
        estimates: &'static [(u8, usize)],
        goal: u8,
    }

    impl Problem for Weighted {
        type State = u8;
        type Action = u8;

        fn initial_state(&self) -> &u8 {
            &0
        }

        fn actions(&self, state: &u8) -> Vec<u8> {
            self.edges
                .iter()
                .filter(|(from, _, _)| from == state)
                .map(|&(_, to, _)| to)
                .collect()
        }

        fn result(&self, _state: &u8, action: &u8) -> Option<u8> {
            Some(*action)
        }

        fn goal_test(&self, state: &u8) -> bool {
            *state == self.goal
        }

        fn path_cost(&self, cost: usize, state: &u8, _action: &u8, next_state: &u8) -> usize {
            let weight = self
                .edges
                .iter()
                .find(|(from, to, _)| from == state && to == next_state)
                .map_or(0, |&(_, _, weight)| weight);
            cost + weight
        }

        fn heuristic(&self, node: &Node<u8, u8>) -> Option<usize> {
            let estimate = self
                .estimates
                .iter()
                .find(|(state, _)| *state == node.state)
                .map_or(0, |&(_, estimate)| estimate);
            Some(estimate)
        }
    }

    #[test]
    fn test_astar_replaces_frontier_entry() {
        init_tracing();
        // S=0, A=1, X=2, G=3. X first enters the frontier through the
        // expensive edge and must be replaced once A offers a cheaper route.
        let problem = Weighted {
            edges: &[(0, 1, 1), (0, 2, 10), (1, 2, 1), (2, 3, 1)],
            estimates: &[],
            goal: 3,
        };
        let Outcome::Solved { solution, stats } = astar_search(&problem, None, None) else {
            panic!("goal is reachable");
        };
        assert_eq!(solution.cost(), 3);
        assert_eq!(solution.steps(), vec!["1", "2", "3"]);
        // A, X and G are new; the cheaper X replaces the old entry.
        assert_eq!(stats.expanded_nodes, 3);
    }

    #[test]
    fn test_astar_reopens_closed_state() {
        init_tracing();
        // S=0, A=1, C=2, G=3. h(A)=4 is admissible but not consistent, so C is
        // closed through the direct edge before the cheaper route via A shows up.
        let problem = Weighted {
            edges: &[(0, 1, 1), (0, 2, 3), (1, 2, 1), (2, 3, 3)],
            estimates: &[(1, 4)],
            goal: 3,
        };
        let Outcome::Solved { solution, stats } = astar_search(&problem, None, None) else {
            panic!("goal is reachable");
        };
        assert_eq!(solution.cost(), 5);
        assert_eq!(solution.steps(), vec!["1", "2", "3"]);
        // C is tested twice: once closed at g=3, once reopened at g=2.
        assert_eq!(stats.tested_nodes, 5);
    }

    #[test]
    fn test_astar_matches_breadth_first_cost() {
        init_tracing();
        let problem = tower_arrangement();
        let astar = astar_search(&problem, None, None);
        let bfs = breadth_first_graph_search(&problem, None, None);

        let astar_solution = astar.solution().expect("A* solves the tower");
        let bfs_solution = bfs.solution().expect("BFS solves the tower");
        assert!(astar_solution.cost() <= bfs_solution.cost());
        assert_eq!(astar_solution.cost(), 10);
        assert!(problem.goal_test(&replay(&problem, astar_solution)));
    }

    #[test]
    fn test_astar_color_grouping() {
        init_tracing();
        let problem = ColorGroupingProblem::new(model(&[
            &[("R1", "red"), ("G1", "green")],
            &[("G2", "green")],
            &[("R2", "red"), ("B1", "blue")],
            &[("B2", "blue"), ("R3", "red")],
        ]));
        let astar = astar_search(&problem, None, None);
        let bfs = breadth_first_graph_search(&problem, None, None);
        let astar_solution = astar.solution().expect("A* groups the colours");
        let bfs_solution = bfs.solution().expect("BFS groups the colours");
        assert_eq!(astar_solution.cost(), bfs_solution.cost());
        assert!(problem.goal_test(&replay(&problem, astar_solution)));

        let Outcome::Solved { stats: astar_stats, .. } = astar else {
            unreachable!()
        };
        let Outcome::Solved { stats: bfs_stats, .. } = bfs else {
            unreachable!()
        };
        assert!(astar_stats.tested_nodes <= bfs_stats.tested_nodes);
    }

    #[test]
    fn test_astar_without_heuristic_is_malformed() {
        let problem = Blind(split_colors());
        let outcome = astar_search(&problem, None, None);
        assert_eq!(outcome.status(), SearchStatus::Malformed);

        // Uninformed searches do not care.
        assert!(breadth_first_graph_search(&problem, None, None).is_solved());
    }

    #[test]
    fn test_open_entry_order() {
        let a = OpenEntry {
            f_cost: 3,
            order: 2,
            node: NodeId(0),
        };
        let b = OpenEntry {
            f_cost: 3,
            order: 1,
            node: NodeId(5),
        };
        let c = OpenEntry {
            f_cost: 2,
            order: 9,
            node: NodeId(1),
        };
        let open: BTreeSet<_> = [a, b, c].into_iter().collect();
        let popped: Vec<_> = open.into_iter().map(|e| e.node).collect();
        assert_eq!(popped, vec![NodeId(1), NodeId(5), NodeId(0)]);
    }

    #[test]
    fn test_heuristic_sees_node() {
        let problem = split_colors();
        let node = Node {
            state: BlockState::new(model(&[&[("R1", "red")]]), Some(Block::new("R2", "red", [0; 3]))),
            parent: None,
            action: None,
            path_cost: 7,
            depth: 7,
        };
        assert_eq!(problem.heuristic(&node), Some(1));
    }
}
