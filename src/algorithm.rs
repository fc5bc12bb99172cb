mod astar;
mod breadth_first;
mod depth_first;
mod iterative_deepening;

pub use astar::astar_search;
pub use breadth_first::{breadth_first_graph_search, breadth_first_tree_search};
pub use depth_first::{depth_first_graph_search, depth_first_tree_search};
pub use iterative_deepening::{depth_limited_search, iterative_deepening_search, DepthLimited};

use crate::channel::{Control, Endpoint};
use crate::common::{NodeArena, Solution};
use crate::problem::Problem;
use crate::stat::Stats;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// How a search run ended.
#[derive(Debug, Clone)]
pub enum Outcome<S, A> {
    Solved {
        solution: Solution<S, A>,
        stats: Stats,
    },
    /// Frontier exhausted without reaching a goal.
    NoSolution,
    /// A stop request was observed before a goal was found.
    Cancelled,
    /// The tested-node budget ran out.
    BudgetExhausted,
    /// The problem cannot be searched with this algorithm.
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Solved,
    NoSolution,
    Cancelled,
    BudgetExhausted,
    Malformed,
}

impl<S, A> Outcome<S, A> {
    pub fn status(&self) -> SearchStatus {
        match self {
            Outcome::Solved { .. } => SearchStatus::Solved,
            Outcome::NoSolution => SearchStatus::NoSolution,
            Outcome::Cancelled => SearchStatus::Cancelled,
            Outcome::BudgetExhausted => SearchStatus::BudgetExhausted,
            Outcome::Malformed(_) => SearchStatus::Malformed,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved { .. })
    }

    pub fn solution(&self) -> Option<&Solution<S, A>> {
        match self {
            Outcome::Solved { solution, .. } => Some(solution),
            _ => None,
        }
    }
}

/// Common signature of every registered search.
pub type SearchFn<P> = fn(
    &P,
    Option<&mut Endpoint<Control>>,
    Option<usize>,
) -> Outcome<<P as Problem>::State, <P as Problem>::Action>;

/// Registry of the available searches, keyed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    BreadthFirstTree,
    BreadthFirstGraph,
    DepthFirstTree,
    DepthFirstGraph,
    IterativeDeepening,
    AStar,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::BreadthFirstTree,
        Algorithm::BreadthFirstGraph,
        Algorithm::DepthFirstTree,
        Algorithm::DepthFirstGraph,
        Algorithm::IterativeDeepening,
        Algorithm::AStar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BreadthFirstTree => "breadth-first-tree",
            Algorithm::BreadthFirstGraph => "breadth-first-graph",
            Algorithm::DepthFirstTree => "depth-first-tree",
            Algorithm::DepthFirstGraph => "depth-first-graph",
            Algorithm::IterativeDeepening => "iterative-deepening",
            Algorithm::AStar => "astar",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::BreadthFirstTree => "Breadth First Tree Search",
            Algorithm::BreadthFirstGraph => "Breadth First Graph Search",
            Algorithm::DepthFirstTree => "Depth First Tree Search",
            Algorithm::DepthFirstGraph => "Depth First Graph Search",
            Algorithm::IterativeDeepening => "Iterative Depth First Search",
            Algorithm::AStar => "A* Search",
        }
    }

    pub fn requires_heuristic(self) -> bool {
        self == Algorithm::AStar
    }

    pub fn search_fn<P: Problem + ?Sized>(self) -> SearchFn<P> {
        match self {
            Algorithm::BreadthFirstTree => breadth_first_tree_search::<P>,
            Algorithm::BreadthFirstGraph => breadth_first_graph_search::<P>,
            Algorithm::DepthFirstTree => depth_first_tree_search::<P>,
            Algorithm::DepthFirstGraph => depth_first_graph_search::<P>,
            Algorithm::IterativeDeepening => iterative_deepening_search::<P>,
            Algorithm::AStar => astar_search::<P>,
        }
    }

    pub fn search<P: Problem + ?Sized>(
        self,
        problem: &P,
        endpoint: Option<&mut Endpoint<Control>>,
        test_limit: Option<usize>,
    ) -> Outcome<P::State, P::Action> {
        (self.search_fn::<P>())(problem, endpoint, test_limit)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s || algorithm.label() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Algorithm::ALL.iter().map(|a| a.name()).collect();
                anyhow!("unknown algorithm {s:?}, expected one of {known:?}")
            })
    }
}

impl TryFrom<String> for Algorithm {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.name().to_string()
    }
}

/// Cooperative stop requests and the tested-node budget, checked by every
/// search once per loop iteration.
pub(crate) struct SearchControl<'a> {
    endpoint: Option<&'a mut Endpoint<Control>>,
    test_limit: Option<usize>,
    stopped: bool,
}

impl<'a> SearchControl<'a> {
    pub(crate) fn new(endpoint: Option<&'a mut Endpoint<Control>>, test_limit: Option<usize>) -> Self {
        SearchControl {
            endpoint,
            test_limit,
            stopped: false,
        }
    }

    /// Drains pending messages without blocking. Once a stop has been seen it
    /// stays seen.
    pub(crate) fn cancelled(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(endpoint) = self.endpoint.as_mut() {
            while let Some(message) = endpoint.receive(false) {
                trace!("control message: {message:?}");
                if message == Control::Stop {
                    debug!("stop requested");
                    self.stopped = true;
                }
            }
        }
        self.stopped
    }

    pub(crate) fn over_budget(&self, tested: usize) -> bool {
        self.test_limit.is_some_and(|limit| tested > limit)
    }

    /// Shared check at the top of a search loop.
    pub(crate) fn halt<S, A>(&mut self, stats: &Stats) -> Option<Outcome<S, A>> {
        if self.cancelled() {
            return Some(Outcome::Cancelled);
        }
        if self.over_budget(stats.tested_nodes) {
            debug!("test limit reached after {} tests", stats.tested_nodes);
            return Some(Outcome::BudgetExhausted);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Discipline {
    Fifo,
    Lifo,
}

/// Tree search without duplicate detection; the frontier discipline decides
/// between breadth-first and depth-first order. Goal test at dequeue.
pub(crate) fn tree_search<P: Problem + ?Sized>(
    problem: &P,
    mut control: SearchControl<'_>,
    discipline: Discipline,
) -> Outcome<P::State, P::Action> {
    let mut stats = Stats::default();
    let mut arena = NodeArena::new();
    let root = arena.root(problem.initial_state().clone());
    let mut frontier = VecDeque::from([root]);

    loop {
        if let Some(halted) = control.halt(&stats) {
            return halted;
        }

        let popped = match discipline {
            Discipline::Fifo => frontier.pop_front(),
            Discipline::Lifo => frontier.pop_back(),
        };
        let Some(current) = popped else {
            return Outcome::NoSolution;
        };

        stats.tested_nodes += 1;
        let node = arena.get(current);
        trace!("test node at depth {}: {:?}", node.depth, node.state);
        if problem.goal_test(&node.state) {
            return Outcome::Solved {
                solution: arena.solution(current),
                stats,
            };
        }

        let children = arena.expand(problem, current);
        stats.expanded_nodes += children.len();
        frontier.extend(children);
    }
}
