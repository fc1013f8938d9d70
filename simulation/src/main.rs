//! dpsim - data preservation in sensor networks
//!
//! Generates random sensor networks, runs the scheduling models against saved
//! snapshots, compares them, and exports the min-cost-flow problem for
//! external solvers.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dpsim_logging::{DpsimSubscriberBuilder, FileConfig, LogConfig};
use dpsim_models::{
    ExternalFlowModel, Model, PriorityGreedyModel, ProcessFlowSolver, ProfitGreedyModel, compare,
};
use dpsim_network::SensorNetwork;
use dpsim_simulation::{GenerationOverrides, NetworkOverrides, Scenario, load_network};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "dpsim",
    about = "Data preservation simulator for energy-constrained sensor networks",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random connected network and save its snapshot
    Generate {
        #[command(flatten)]
        params: GenerationOverrides,

        /// Seed for reproducible networks
        #[arg(long)]
        seed: Option<u64>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the DIMACS flow network to this file
        #[arg(long)]
        flow: Option<PathBuf>,
    },

    /// Run one model against a snapshot
    Run {
        /// Snapshot file
        snapshot: PathBuf,

        #[arg(long, value_enum, default_value_t = ModelKind::Priority)]
        model: ModelKind,

        #[command(flatten)]
        overrides: NetworkOverrides,

        /// Print every route
        #[arg(long)]
        routes: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every model against a snapshot and compare them
    Compare {
        /// Snapshot file
        snapshot: PathBuf,

        #[command(flatten)]
        overrides: NetworkOverrides,

        /// Min-cost-flow solver executable (DIMACS on stdin, solution on stdout)
        #[arg(long)]
        solver: Option<PathBuf>,

        /// Extra argument for the solver, may be repeated
        #[arg(long = "solver-arg")]
        solver_args: Vec<String>,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the DIMACS flow network for a snapshot
    ExportFlow {
        /// Snapshot file
        snapshot: PathBuf,

        #[command(flatten)]
        overrides: NetworkOverrides,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the reference scenarios
    Scenario {
        /// Scenario to run; all of them when omitted
        #[arg(value_enum)]
        name: Option<Scenario>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelKind {
    /// Most valuable data first
    Priority,
    /// Most profitable destination per batch
    Profit,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if cli.verbose {
        LogConfig::development()
    } else {
        LogConfig {
            default_level: "warn".to_string(),
            ..LogConfig::default()
        }
    };
    let mut logging = DpsimSubscriberBuilder::new().with_config(config);
    if let Some(directory) = cli.log_dir {
        logging = logging.with_file_output(FileConfig {
            directory,
            ..FileConfig::default()
        });
    }
    let _guard = logging.init()?;

    match cli.command {
        Commands::Generate {
            params,
            seed,
            output,
            flow,
        } => {
            let params = params.resolve()?;
            let network = match seed {
                Some(seed) => SensorNetwork::generate(&params, &mut StdRng::seed_from_u64(seed))?,
                None => SensorNetwork::random(&params)?,
            };
            network.save(&output)?;
            println!(
                "Generated {} nodes ({} data, {} storage, {} transition), {} edges -> {}",
                network.node_count(),
                network.data_node_count(),
                network.storage_node_count(),
                network.transition_node_count(),
                network.edge_count(),
                output.display()
            );
            if let Some(path) = flow {
                network.flow_network()?.save(&path)?;
                println!("Flow network -> {}", path.display());
            }
        }

        Commands::Run {
            snapshot,
            model,
            overrides,
            routes,
            json,
        } => {
            let network = load_network(&snapshot, &overrides)?;
            let mut model: Box<dyn Model> = match model {
                ModelKind::Priority => Box::new(PriorityGreedyModel::new(network)),
                ModelKind::Profit => Box::new(ProfitGreedyModel::new(network)),
            };
            model.run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(model.results()?)?);
            } else {
                println!("model:   {}", model.name());
                println!("value:   {}", model.total_value()?);
                println!("cost:    {} uJ", model.total_cost()?);
                println!("profit:  {}", model.total_profit()?);
                println!("packets: {}", model.total_packets()?);
                if routes {
                    model.print_route()?;
                }
            }
        }

        Commands::Compare {
            snapshot,
            overrides,
            solver,
            solver_args,
            json,
        } => {
            let network = load_network(&snapshot, &overrides)?;
            let mut models: Vec<Box<dyn Model>> = vec![
                Box::new(PriorityGreedyModel::new(network.clone())),
                Box::new(ProfitGreedyModel::new(network.clone())),
            ];
            if let Some(program) = solver {
                let solver = solver_args
                    .into_iter()
                    .fold(ProcessFlowSolver::new(program), |solver, arg| solver.arg(arg));
                models.push(Box::new(ExternalFlowModel::new(network, solver)));
            }

            let report = compare(&mut models)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{report}");
                if let Some(best) = report.best_by_profit() {
                    println!("best: {} (profit {})", best.name, best.profit);
                }
            }
        }

        Commands::ExportFlow {
            snapshot,
            overrides,
            output,
        } => {
            let network = load_network(&snapshot, &overrides)?;
            let flow = network.flow_network()?;
            match output {
                Some(path) => flow.save(&path)?,
                None => flow
                    .write_dimacs(io::stdout().lock())
                    .context("Failed to write flow network")?,
            }
        }

        Commands::Scenario { name } => {
            let scenarios = match name {
                Some(scenario) => vec![scenario],
                None => Scenario::ALL.to_vec(),
            };
            let mut failed = 0;
            for scenario in scenarios {
                let report = scenario.run()?;
                println!("{report}\n");
                if !report.passed {
                    failed += 1;
                }
            }
            info!(failed, "Scenarios complete");
            if failed > 0 {
                bail!("{failed} scenario(s) failed");
            }
        }
    }

    Ok(())
}
