//! The one endpoint: validate, normalize, fetch matrices, solve off the
//! async runtime, decode, then fetch route geometry in parallel. Upstream
//! road-network failures keep the legacy contract: `200 OK` with an
//! `error_message` instead of an HTTP error.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use paraplan_core::normalize::normalize;
use paraplan_core::problem::{Coordinate, Problem};
use paraplan_core::solution::Solution;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn solve_handler(
    State(state): State<Arc<AppState>>,
    Json(problem): Json<Problem>,
) -> Result<Json<Solution>, ApiError> {
    problem
        .validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let normalized =
        normalize(&problem).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let matrices = match state.osrm.fetch_matrices(normalized.coordinates()).await {
        Ok(matrices) => matrices,
        Err(err) => {
            warn!(%err, "matrix query failed");
            return Ok(Json(Solution::failed(&problem, err.to_string())));
        }
    };

    let problem = Arc::new(problem);
    let solve_problem = problem.clone();
    let solve_state = state.clone();

    // each solve is CPU-bound and single-threaded; keep it off the runtime
    let mut solution =
        tokio::task::spawn_blocking(move || {
            solve_state
                .solver
                .solve(&solve_problem, &normalized, &matrices)
        })
        .await
        .map_err(|err| ApiError::InternalServerError(err.to_string()))?
        .map_err(|err| {
            error!(%err, "routing model rejected");
            ApiError::InternalServerError(err.to_string())
        })?;

    if let Err(err) = attach_geometry(&state, &mut solution).await {
        warn!(%err, "route geometry query failed");
        return Ok(Json(Solution::failed(&problem, err)));
    }

    Ok(Json(solution))
}

/// Fetches every route's geometry concurrently against a bounded worker
/// pool; one failure fails the whole request.
async fn attach_geometry(state: &Arc<AppState>, solution: &mut Solution) -> Result<(), String> {
    let semaphore = Arc::new(Semaphore::new(state.geometry_workers));
    let mut join_set = JoinSet::new();

    for (index, route) in solution.routes.iter().enumerate() {
        let waypoints: Vec<Coordinate> = route
            .visits
            .iter()
            .map(|visit| visit.coordinates)
            .collect();

        let state = state.clone();
        let semaphore = semaphore.clone();

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, state.osrm.fetch_route_geometry(&waypoints).await)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, Ok(geometry))) => solution.routes[index].geometry = geometry,
            Ok((_, Err(err))) => return Err(err.to_string()),
            Err(err) => return Err(err.to_string()),
        }
    }

    Ok(())
}
