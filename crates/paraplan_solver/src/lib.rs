//! The routing core: builds a pickup-and-delivery model with time
//! windows, heterogeneous capacities, compatibility, rest breaks, and
//! drop penalties from a normalized problem, searches it under a
//! wall-clock limit, and decodes the best assignment back into a
//! [`Solution`](paraplan_core::solution::Solution).

mod decode;
pub mod error;
pub mod model;
pub mod params;
mod search;
mod state;
#[cfg(test)]
pub(crate) mod test_support;

use parking_lot::RwLock;
use tracing::{info, warn};

use paraplan_core::normalize::NormalizedProblem;
use paraplan_core::problem::Problem;
use paraplan_core::solution::Solution;
use paraplan_osrm::TravelMatrices;

pub use error::SolverError;
pub use params::{SkipFlags, SolverParams};

use crate::model::RoutingModel;
use crate::search::Search;

/// One synchronous solve. Infeasibility is not an error: it produces a
/// well-formed solution with every ride dropped and a message attached.
pub fn solve(
    problem: &Problem,
    normalized: &NormalizedProblem,
    matrices: &TravelMatrices,
    params: &SolverParams,
) -> Result<Solution, SolverError> {
    info!(
        vehicles = problem.vehicles().len(),
        rides = problem.ride_requests().len(),
        time_limit = %params.time_limit,
        "starting solve"
    );

    let model = RoutingModel::build(problem, normalized, matrices, params)?;

    let solution = match Search::new(&model).run() {
        Ok(best) => decode::decode(&model, &best),
        Err(message) => {
            warn!(%message, "solve infeasible");
            Solution::failed(problem, message)
        }
    };

    info!(
        routes = solution.routes.len(),
        dropped = solution.dropped_rides.len(),
        "solve finished"
    );

    Ok(solution)
}

#[derive(Copy, Clone, Debug)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

/// Shareable solve entry point carrying the configured parameters; each
/// call owns its scratch state, so parallel solves never interfere.
pub struct Solver {
    params: SolverParams,
    status: RwLock<SolverStatus>,
}

impl Solver {
    pub fn new(params: SolverParams) -> Self {
        Solver {
            params,
            status: RwLock::new(SolverStatus::Pending),
        }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    pub fn solve(
        &self,
        problem: &Problem,
        normalized: &NormalizedProblem,
        matrices: &TravelMatrices,
    ) -> Result<Solution, SolverError> {
        *self.status.write() = SolverStatus::Running;
        let result = solve(problem, normalized, matrices, &self.params);
        *self.status.write() = SolverStatus::Completed;
        result
    }
}
