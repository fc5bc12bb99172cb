use blocks_planner::channel::Channel;
use blocks_planner::config::{Cli, Config, GoalKind};
use blocks_planner::model::WorldModel;
use blocks_planner::problem::{
    Action, ArrangementProblem, BlockState, BlocksProblem, ColorGroupingProblem,
};
use blocks_planner::solver::{SolveReport, Solver};

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Report = (bool, SolveReport<BlockState, Action>);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let model = match &config.model_path {
        Some(path) => WorldModel::load_from_file(path)?,
        None => WorldModel::random(config.random_blocks, &config.colors, &mut rng)?,
    };
    info!("Initial world: {model}");

    let problem: Arc<BlocksProblem> = match config.goal {
        GoalKind::Color => Arc::new(ColorGroupingProblem::new(model)),
        GoalKind::Arrangement => {
            let goal = match &config.goal_path {
                Some(path) => WorldModel::load_from_file(path)?,
                None => model.shuffle(&mut rng),
            };
            ensure_same_blocks(&model, &goal)?;
            info!("Goal world: {goal}");
            Arc::new(ArrangementProblem::new(model, goal))
        }
    };

    let (server, mut reports) = Channel::<Report>::new().split();
    let outbound = server.outbound();
    let mut solver = Solver::from_config(&config);
    solver.set_problem(problem);
    solver.set_callback(move |success, report| {
        if let Err(err) = outbound.send((success, report)) {
            warn!("solve report dropped: {err}");
        }
    });
    solver.solve()?;

    if let Some(timeout_secs) = config.timeout_secs {
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        while !solver.is_done() {
            if Instant::now() >= deadline {
                warn!("Timeout after {timeout_secs}s, stopping the search");
                solver.stop_solving();
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
    solver.wait()?;

    let Some((success, report)) = reports.receive(true) else {
        bail!("solver finished without a report");
    };
    if !success {
        error!("No plan found: {:?}", report.status);
        return Ok(());
    }

    let solution = report
        .solution
        .context("successful report without a solution")?;
    info!(
        "Found a plan of {} actions in {:.6}s ({} nodes tested)",
        solution.len(),
        report.stats.elapsed_secs,
        report.stats.tested_nodes
    );
    for (i, step) in solution.steps().iter().enumerate() {
        println!("{:>3}. {step}", i + 1);
    }

    Ok(())
}

fn ensure_same_blocks(model: &WorldModel, goal: &WorldModel) -> anyhow::Result<()> {
    let initial: HashSet<_> = model.blocks().map(|block| block.id.clone()).collect();
    let target: HashSet<_> = goal.blocks().map(|block| block.id.clone()).collect();
    if initial != target {
        bail!("goal model must contain exactly the blocks of the initial model");
    }
    Ok(())
}
