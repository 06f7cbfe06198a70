//! The `decompose` CLI subcommand.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::decomp::{BottomUpHeuristic, Constructor, Neighborhood};
use crate::decomposer::{Decomposer, Decomposition};
use crate::graph_loader::load_dimacs;
use crate::json::encode_tree;
use crate::matching::MatcherKind;
use crate::optimize::{AnnealingParams, Budget, Optimizer};
use crate::progress::{FileSink, LogSink};

use super::CliError;

/// Build a decomposition of a DIMACS graph.
#[derive(Parser, Debug)]
pub struct DecomposeArgs {
    /// DIMACS graph file to decompose.
    input: PathBuf,

    /// Output the tree to a json file instead of printing it.
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// How the initial tree is built.
    #[arg(long, value_enum, default_value_t = ConstructorArg::AllPairs)]
    constructor: ConstructorArg,

    /// Matching used to score merges in bottom-up construction.
    #[arg(long, value_enum, default_value_t = MatcherArg::Hk)]
    matcher: MatcherArg,

    /// How the initial tree is improved.
    #[arg(long, value_enum, default_value_t = OptimizerArg::Annealing)]
    optimizer: OptimizerArg,

    /// Neighbourhood explored by annealing and local search.
    #[arg(long, value_enum, default_value_t = OperatorArg::TwoSwap)]
    operator: OperatorArg,

    /// Let the top-down optimizer pick unbalanced splits.
    #[arg(long)]
    unbalanced: bool,

    /// Starting temperature for annealing.
    #[arg(long, default_value_t = 15.0)]
    start_temp: f64,

    /// Cooling factor for annealing.
    #[arg(long, default_value_t = 0.99)]
    multiplier: f64,

    /// Continue from the best tree found whenever annealing reheats.
    #[arg(long)]
    restart_from_best: bool,

    /// Time limit in milliseconds.
    #[arg(long, default_value_t = 1000)]
    time_ms: u64,

    /// Stop the optimizer after this many iterations.
    #[arg(long)]
    iterations: Option<usize>,

    /// Seed for the random number generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Strip vertices of degree < 2 before the search.
    #[arg(long)]
    preprocess: bool,

    /// Append every improvement to this file.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ConstructorArg {
    AllPairs,
    RandomGreedy,
    Smallest,
    Random,
    Sharmin,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MatcherArg {
    Hk,
    Greedy,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OptimizerArg {
    None,
    Annealing,
    LocalSearch,
    Sharmin,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OperatorArg {
    UncleSwap,
    TwoSwap,
    Sharmin,
}

impl DecomposeArgs {
    fn constructor(&self) -> Constructor {
        let kind = match self.matcher {
            MatcherArg::Hk => MatcherKind::HopcroftKarp,
            MatcherArg::Greedy => MatcherKind::Greedy,
        };
        let heuristic = match self.constructor {
            ConstructorArg::AllPairs => BottomUpHeuristic::AllPairsGreedy,
            ConstructorArg::RandomGreedy => BottomUpHeuristic::RandomGreedy,
            ConstructorArg::Smallest => BottomUpHeuristic::SmallestGreedy,
            ConstructorArg::Random => BottomUpHeuristic::CompletelyRandom,
            ConstructorArg::Sharmin => return Constructor::TopDown,
        };
        Constructor::BottomUp(heuristic, kind)
    }

    fn optimizer(&self) -> Option<Optimizer> {
        let operator = match self.operator {
            OperatorArg::UncleSwap => Neighborhood::UncleSwap,
            OperatorArg::TwoSwap => Neighborhood::TwoSwap,
            OperatorArg::Sharmin => Neighborhood::Sharmin,
        };
        match self.optimizer {
            OptimizerArg::None => None,
            OptimizerArg::Annealing => Some(Optimizer::Annealing(AnnealingParams {
                operator,
                start_temp: self.start_temp,
                multiplier: self.multiplier,
                restart_from_best: self.restart_from_best,
                ..AnnealingParams::default()
            })),
            OptimizerArg::LocalSearch => Some(Optimizer::LocalSearch(operator)),
            OptimizerArg::Sharmin => Some(Optimizer::Sharmin {
                balanced: !self.unbalanced,
            }),
        }
    }

    fn budget(&self) -> Budget {
        let budget = Budget::time(Duration::from_millis(self.time_ms));
        match self.iterations {
            Some(n) => budget.with_max_iterations(n),
            None => budget,
        }
    }

    /// Run the `decompose` command using the provided arguments.
    pub fn run(self) -> Result<(), CliError> {
        let graph = load_dimacs(&self.input)?;
        let constructor = self.constructor();
        let optimizer = self.optimizer();

        let mut decomposer = Decomposer::new();
        decomposer
            .constructor(constructor)
            .optimizer(optimizer)
            .budget(self.budget())
            .preprocess(self.preprocess);
        if let Some(seed) = self.seed {
            decomposer.seed(seed);
        }

        let d: Decomposition = match &self.log {
            Some(path) => {
                let mut sink = FileSink::open(path)?;
                let method = optimizer.map_or_else(|| "none".to_string(), |o| o.to_string());
                sink.write_line(&format!(
                    "{} {} {}",
                    self.input.display(),
                    constructor,
                    method
                ))?;
                decomposer.run_with_sink(&graph, &mut sink)?
            }
            None => decomposer.run_with_sink(&graph, &mut LogSink)?,
        };

        println!(
            "MM-width: {} (fitness {}, {} ms)",
            d.width,
            d.fitness,
            d.elapsed.as_millis()
        );
        let json = encode_tree(&graph, &d.tree)?;
        if let Some(out_path) = self.out {
            fs::write(out_path, json)?;
        } else {
            println!("{json}");
        }
        Ok(())
    }
}
