use super::{Outcome, SearchControl};
use crate::channel::{Control, Endpoint};
use crate::common::{NodeArena, NodeId, Solution};
use crate::problem::Problem;
use crate::stat::Stats;

use tracing::{debug, instrument};

/// Result of one depth-limited pass.
#[derive(Debug, Clone)]
pub enum DepthLimited<S, A> {
    Found {
        solution: Solution<S, A>,
        stats: Stats,
    },
    /// Some branch hit the depth limit; a deeper pass may still succeed.
    Cutoff,
    /// Every branch ended before the limit, so deepening cannot help.
    Exhausted,
    Cancelled,
    BudgetExhausted,
}

enum Step {
    Found(NodeId),
    Cutoff,
    Exhausted,
    Halted(Halt),
}

enum Halt {
    Cancelled,
    BudgetExhausted,
}

#[instrument(skip_all, name = "depth_limited", fields(limit = limit), level = "debug")]
pub fn depth_limited_search<P: Problem + ?Sized>(
    problem: &P,
    limit: usize,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> DepthLimited<P::State, P::Action> {
    let mut control = SearchControl::new(endpoint, test_limit);
    let mut stats = Stats::default();
    limited_pass(problem, limit, &mut control, &mut stats)
}

#[instrument(skip_all, name = "iterative_deepening", level = "debug")]
pub fn iterative_deepening_search<P: Problem + ?Sized>(
    problem: &P,
    endpoint: Option<&mut Endpoint<Control>>,
    test_limit: Option<usize>,
) -> Outcome<P::State, P::Action> {
    let mut control = SearchControl::new(endpoint, test_limit);
    // One budget for the whole sweep, not one per depth.
    let mut stats = Stats::default();
    let mut limit = 0;

    loop {
        match limited_pass(problem, limit, &mut control, &mut stats) {
            DepthLimited::Found { solution, stats } => {
                return Outcome::Solved { solution, stats };
            }
            DepthLimited::Cutoff => {
                debug!("cutoff at depth {limit}, tested {}", stats.tested_nodes);
                limit += 1;
            }
            DepthLimited::Exhausted => return Outcome::NoSolution,
            DepthLimited::Cancelled => return Outcome::Cancelled,
            DepthLimited::BudgetExhausted => return Outcome::BudgetExhausted,
        }
    }
}

fn limited_pass<P: Problem + ?Sized>(
    problem: &P,
    limit: usize,
    control: &mut SearchControl<'_>,
    stats: &mut Stats,
) -> DepthLimited<P::State, P::Action> {
    let mut arena = NodeArena::new();
    let root = arena.root(problem.initial_state().clone());

    match recursive_dls(problem, &mut arena, root, limit, control, stats) {
        Step::Found(goal) => DepthLimited::Found {
            solution: arena.solution(goal),
            stats: stats.clone(),
        },
        Step::Cutoff => DepthLimited::Cutoff,
        Step::Exhausted => DepthLimited::Exhausted,
        Step::Halted(Halt::Cancelled) => DepthLimited::Cancelled,
        Step::Halted(Halt::BudgetExhausted) => DepthLimited::BudgetExhausted,
    }
}

fn recursive_dls<P: Problem + ?Sized>(
    problem: &P,
    arena: &mut NodeArena<P::State, P::Action>,
    current: NodeId,
    limit: usize,
    control: &mut SearchControl<'_>,
    stats: &mut Stats,
) -> Step {
    if control.cancelled() {
        return Step::Halted(Halt::Cancelled);
    }
    if control.over_budget(stats.tested_nodes) {
        return Step::Halted(Halt::BudgetExhausted);
    }

    stats.tested_nodes += 1;
    if problem.goal_test(&arena.get(current).state) {
        return Step::Found(current);
    }
    if limit == 0 {
        return Step::Cutoff;
    }

    let children = arena.expand(problem, current);
    stats.expanded_nodes += children.len();
    // Everything allocated after the children belongs to a finished subtree.
    let mark = arena.len();

    let mut cutoff_occurred = false;
    for child in children {
        match recursive_dls(problem, arena, child, limit - 1, control, stats) {
            Step::Cutoff => cutoff_occurred = true,
            Step::Exhausted => {}
            found_or_halted => return found_or_halted,
        }
        arena.truncate(mark);
    }

    if cutoff_occurred {
        Step::Cutoff
    } else {
        Step::Exhausted
    }
}
