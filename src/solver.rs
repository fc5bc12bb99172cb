use crate::algorithm::{Algorithm, Outcome, SearchStatus};
use crate::channel::{Channel, Control, Endpoint};
use crate::common::{Node, Solution};
use crate::config::Config;
use crate::problem::Problem;
use crate::stat::Stats;

use anyhow::{anyhow, bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the callback receives when a run ends. On failure `solution` is
/// `None` and the counters are zero; `status` tells why the run ended.
#[derive(Debug, Clone)]
pub struct SolveReport<S, A> {
    pub status: SearchStatus,
    pub solution: Option<Solution<S, A>>,
    pub stats: Stats,
}

pub type Callback<S, A> = Arc<dyn Fn(bool, SolveReport<S, A>) + Send + Sync>;

/// Runs one search at a time on a background worker and reports through a
/// callback. Stop requests travel over a [`Channel`] and are picked up by the
/// search at its next loop iteration.
pub struct Solver<P: Problem + ?Sized + 'static> {
    problem: Option<Arc<P>>,
    algorithm: Algorithm,
    test_limit: Option<usize>,
    callback: Callback<P::State, P::Action>,
    done: Arc<AtomicBool>,
    client: Option<Endpoint<Control>>,
    worker: Option<JoinHandle<()>>,
}

impl<P: Problem + ?Sized + 'static> Default for Solver<P> {
    fn default() -> Self {
        Self::new(Algorithm::BreadthFirstTree, None)
    }
}

impl<P: Problem + ?Sized + 'static> Solver<P> {
    pub fn new(algorithm: Algorithm, test_limit: Option<usize>) -> Self {
        Solver {
            problem: None,
            algorithm,
            test_limit,
            callback: Arc::new(|_: bool, _: SolveReport<P::State, P::Action>| ()),
            done: Arc::new(AtomicBool::new(true)),
            client: None,
            worker: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.algorithm, config.test_limit)
    }

    pub fn set_problem(&mut self, problem: Arc<P>) {
        self.problem = Some(problem);
    }

    /// Selects a search by its registered name (or display label).
    pub fn use_algorithm(&mut self, name: &str) -> Result<()> {
        self.algorithm = name.parse()?;
        Ok(())
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(bool, SolveReport<P::State, P::Action>) + Send + Sync + 'static,
    {
        self.callback = Arc::new(callback);
    }

    pub fn set_test_limit(&mut self, test_limit: Option<usize>) {
        self.test_limit = test_limit;
    }

    /// `true` when no search is in flight.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Starts the selected search on a new worker thread and returns at once.
    pub fn solve(&mut self) -> Result<()> {
        if !self.is_done() {
            bail!("a search is already running");
        }
        let problem = self
            .problem
            .clone()
            .context("no problem set on the solver")?;

        if self.algorithm.requires_heuristic() {
            let root = Node {
                state: problem.initial_state().clone(),
                parent: None,
                action: None,
                path_cost: 0,
                depth: 0,
            };
            if problem.heuristic(&root).is_none() {
                bail!("{} requires a problem with a heuristic", self.algorithm.label());
            }
        }

        // The previous worker has already flagged completion; reap it.
        if let Some(previous) = self.worker.take() {
            previous
                .join()
                .map_err(|_| anyhow!("previous solver worker panicked"))?;
        }

        // A fresh channel per run, so a late stop for an old run is never seen.
        let (mut server, client) = Channel::new().split();
        client.send(Control::Continue)?;

        let algorithm = self.algorithm;
        let test_limit = self.test_limit;
        let callback = Arc::clone(&self.callback);
        let done = Arc::clone(&self.done);
        info!("Start solving with {} (test limit {test_limit:?})", algorithm.label());

        self.done.store(false, Ordering::Release);
        let spawned = thread::Builder::new()
            .name("solver-worker".to_string())
            .spawn(move || {
                let start = Instant::now();
                let outcome = algorithm.search(&*problem, Some(&mut server), test_limit);
                let elapsed_secs = start.elapsed().as_secs_f64();

                let report = match outcome {
                    Outcome::Solved {
                        solution,
                        mut stats,
                    } => {
                        stats.elapsed_secs = elapsed_secs;
                        stats.print();
                        SolveReport {
                            status: SearchStatus::Solved,
                            solution: Some(solution),
                            stats,
                        }
                    }
                    other => {
                        if let Outcome::Malformed(reason) = &other {
                            warn!("malformed problem: {reason}");
                        }
                        info!("Search ended without a solution: {:?}", other.status());
                        SolveReport {
                            status: other.status(),
                            solution: None,
                            stats: Stats {
                                elapsed_secs,
                                ..Stats::default()
                            },
                        }
                    }
                };

                done.store(true, Ordering::Release);
                callback(report.status == SearchStatus::Solved, report);
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.client = Some(client);
                Ok(())
            }
            Err(err) => {
                self.done.store(true, Ordering::Release);
                Err(err).context("failed to spawn solver worker")
            }
        }
    }

    /// Asks the running search to stop. The worker notices at its next poll.
    pub fn stop_solving(&self) {
        if self.is_done() {
            return;
        }
        if let Some(client) = &self.client {
            if let Err(err) = client.send(Control::Stop) {
                debug!("stop request not delivered: {err}");
            }
        }
    }

    /// Blocks until the current worker, if any, has finished its callback.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("solver worker panicked"))?;
        }
        Ok(())
    }
}

impl<P: Problem + ?Sized + 'static> Drop for Solver<P> {
    fn drop(&mut self) {
        self.stop_solving();
        if let Err(err) = self.wait() {
            warn!("{err}");
        }
    }
}
