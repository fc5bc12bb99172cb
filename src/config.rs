use crate::algorithm::Algorithm;
use crate::model::ColorGroup;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug, Default)]
#[command(
    name = "Blocks Planner",
    about = "Blocks-world planning with classic search algorithms.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the JSON model of the initial world")]
    pub model_path: Option<String>,

    #[arg(long, value_enum, help = "Goal to plan for")]
    pub goal: Option<GoalKind>,

    #[arg(long, help = "Path to the JSON model of the goal arrangement")]
    pub goal_path: Option<String>,

    #[arg(
        long,
        help = "Search algorithm: breadth-first-tree, breadth-first-graph, depth-first-tree, depth-first-graph, iterative-deepening or astar"
    )]
    pub algorithm: Option<String>,

    #[arg(long, help = "Maximum number of goal-tested nodes")]
    pub test_limit: Option<usize>,

    #[arg(long, help = "Stop the search after this many seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Generate a random model with this many blocks")]
    pub random_blocks: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Every colour group on a single stack of its own.
    Color,
    /// An exact target arrangement.
    Arrangement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model_path: Option<String>,
    pub goal: GoalKind,
    pub goal_path: Option<String>,
    pub algorithm: Algorithm,
    pub test_limit: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub random_blocks: usize,
    pub seed: u64,
    pub colors: Vec<ColorGroup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            goal: GoalKind::Color,
            goal_path: None,
            algorithm: Algorithm::BreadthFirstGraph,
            test_limit: None,
            timeout_secs: None,
            random_blocks: 6,
            seed: 0,
            colors: ColorGroup::default_palette(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(model_path) = &cli.model_path {
            self.model_path = Some(model_path.clone());
        }
        if let Some(goal) = cli.goal {
            self.goal = goal;
        }
        if let Some(goal_path) = &cli.goal_path {
            self.goal_path = Some(goal_path.clone());
        }
        if let Some(algorithm) = &cli.algorithm {
            self.algorithm = algorithm
                .parse()
                .with_context(|| format!("invalid --algorithm {algorithm}"))?;
        }
        if cli.test_limit.is_some() {
            self.test_limit = cli.test_limit;
        }
        if cli.timeout_secs.is_some() {
            self.timeout_secs = cli.timeout_secs;
        }
        if let Some(random_blocks) = cli.random_blocks {
            self.random_blocks = random_blocks;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model_path.is_none() {
            if self.random_blocks == 0 {
                return Err(anyhow!(
                    "either a model path or a positive random block count is required"
                ));
            }
            if self.colors.is_empty() {
                return Err(anyhow!("random generation needs at least one colour group"));
            }
        }
        if self.goal == GoalKind::Color && self.goal_path.is_some() {
            return Err(anyhow!("a goal path only applies to the arrangement goal"));
        }
        if self.test_limit == Some(0) {
            return Err(anyhow!("test limit must be greater than 0, got 0"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("timeout must be greater than 0 seconds, got 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_with_defaults() {
        let config = Config::from_yaml_str(
            "goal: arrangement\nalgorithm: astar\ntest_limit: 5000\nseed: 7\n",
        )
        .unwrap();
        assert_eq!(config.goal, GoalKind::Arrangement);
        assert_eq!(config.algorithm, Algorithm::AStar);
        assert_eq!(config.test_limit, Some(5000));
        assert_eq!(config.seed, 7);
        assert_eq!(config.random_blocks, Config::default().random_blocks);
        assert_eq!(config.colors.len(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_accepts_labels_and_rejects_unknown() {
        let config = Config::from_yaml_str("algorithm: Iterative Depth First Search\n").unwrap();
        assert_eq!(config.algorithm, Algorithm::IterativeDeepening);
        assert!(Config::from_yaml_str("algorithm: simulated-annealing\n").is_err());
        assert!(Config::from_yaml_str("goal: tidy\n").is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let config = Config::from_yaml_str("algorithm: depth-first-graph\nseed: 3\n").unwrap();
        let cli = Cli::parse_from([
            "blocks_planner",
            "--algorithm",
            "breadth-first-tree",
            "--goal",
            "arrangement",
            "--test-limit",
            "100",
        ]);
        let config = config.override_from_command_line(&cli).unwrap();
        assert_eq!(config.algorithm, Algorithm::BreadthFirstTree);
        assert_eq!(config.goal, GoalKind::Arrangement);
        assert_eq!(config.test_limit, Some(100));
        assert_eq!(config.seed, 3);

        let cli = Cli::parse_from(["blocks_planner", "--algorithm", "hill-climbing"]);
        assert!(Config::default().override_from_command_line(&cli).is_err());
    }

    #[test]
    fn test_bundled_config() {
        let config = Config::from_yaml_str(include_str!("../config.yaml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.algorithm, Algorithm::AStar);
        assert_eq!(config.goal, GoalKind::Arrangement);
        assert_eq!(config.colors, ColorGroup::default_palette());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        let config = Config {
            random_blocks: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            goal_path: Some("goal.json".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            test_limit: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
