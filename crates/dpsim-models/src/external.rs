//! Model backed by an external min-cost-flow solver

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use dpsim_network::{FlowNetwork, SensorNetwork};
use tracing::{debug, info, warn};

use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelOutcome, RouteRecord};
use crate::solution::{FlowSolution, NodeFlows, decompose};

/// Something that solves a DIMACS min-cost-flow problem
///
/// The returned text is the solver's output in DIMACS solution format.
pub trait FlowSolver {
    fn solve(&mut self, problem: &FlowNetwork) -> ModelResult<String>;
}

/// Runs a solver executable, feeding the problem on stdin and reading the
/// solution from stdout
#[derive(Debug, Clone)]
pub struct ProcessFlowSolver {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessFlowSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn failure(&self, reason: impl std::fmt::Display) -> ModelError {
        ModelError::Solver(format!("{}: {reason}", self.program.display()))
    }
}

impl FlowSolver for ProcessFlowSolver {
    fn solve(&mut self, problem: &FlowNetwork) -> ModelResult<String> {
        debug!(
            program = %self.program.display(),
            arcs = problem.arc_count(),
            "Starting flow solver"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            problem
                .write_dimacs(&mut stdin)
                .and_then(|_| stdin.flush())
                .map_err(|e| self.failure(e))?;
        }

        let output = child.wait_with_output().map_err(|e| self.failure(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("exited with {}: {}", output.status, stderr.trim())));
        }
        String::from_utf8(output.stdout).map_err(|e| self.failure(e))
    }
}

/// Optimal allocation computed by a [`FlowSolver`]
///
/// Running the model does not move packets through the network: the solution
/// is read back into routes and totals only, and the network keeps its reset
/// state.
#[derive(Debug, Clone)]
pub struct ExternalFlowModel<S> {
    network: SensorNetwork,
    solver: S,
    outcome: Option<ModelOutcome>,
}

impl<S: FlowSolver> ExternalFlowModel<S> {
    pub fn new(network: SensorNetwork, solver: S) -> Self {
        Self {
            network,
            solver,
            outcome: None,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

impl<S: FlowSolver> Model for ExternalFlowModel<S> {
    fn name(&self) -> &str {
        "min-cost-flow"
    }

    fn network(&self) -> &SensorNetwork {
        &self.network
    }

    fn outcome(&self) -> Option<&ModelOutcome> {
        self.outcome.as_ref()
    }

    fn run(&mut self) -> ModelResult<()> {
        self.outcome = None;
        self.network.reset_packets();
        self.network.reset_energy();
        let network = &self.network;

        let problem = network.flow_network()?;
        let output = self.solver.solve(&problem)?;
        let solution = FlowSolution::parse(&output)?;
        let flows = NodeFlows::from_solution(network, problem.index(), &solution)?;

        let mut outcome = ModelOutcome::default();
        for route in decompose(network, &flows)? {
            let (Some(dn), Some(sn)) = (route.path.first(), route.path.last()) else {
                continue;
            };
            // Data -> storage arcs stand for the min-cost path between them
            let hops = match route.path.len() {
                2 => {
                    let path = network.min_cost_path(*dn, *sn)?;
                    if path.len() < 2 {
                        route.path.clone()
                    } else {
                        path
                    }
                }
                _ => route.path.clone(),
            };
            let packets = u32::try_from(route.packets).map_err(|_| {
                ModelError::Solver(format!("flow of {} packets is out of range", route.packets))
            })?;

            let unit_cost = network.calculate_cost_of_path(&hops)?;
            let value = network.node(*dn)?.packet_value();
            outcome.record(value, unit_cost, RouteRecord::from_path(network, &hops, packets)?);
            outcome.total_packets += route.packets;
        }

        if let Some(objective) = solution.objective {
            if outcome.total_profit() != -objective {
                warn!(
                    objective,
                    profit = outcome.total_profit(),
                    "Solver objective does not match decomposed profit"
                );
            }
        }

        info!(
            model = self.name(),
            value = outcome.total_value,
            cost = outcome.total_cost,
            profit = outcome.total_profit(),
            packets = outcome.total_packets,
            "Run complete"
        );
        self.outcome = Some(outcome);
        Ok(())
    }
}
