//! Two-phase search: cheapest-insertion construction over ride groups in
//! deterministic order, then guided local search (relocate / reinsert /
//! swap moves under an arc-penalised objective) until the wall-clock
//! limit runs out.

mod penalties;

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::model::RoutingModel;
use crate::search::penalties::ArcPenalties;
use crate::state::working::WorkingSolution;

pub(crate) struct Search<'m, 'a> {
    model: &'m RoutingModel<'a>,
    rng: StdRng,
    penalties: ArcPenalties,
}

impl<'m, 'a> Search<'m, 'a> {
    pub fn new(model: &'m RoutingModel<'a>) -> Self {
        let params = model.params();
        Search {
            model,
            rng: StdRng::seed_from_u64(params.seed),
            penalties: ArcPenalties::new(params.gls_lambda_factor),
        }
    }

    /// Runs to the time limit and returns the best solution found.
    /// `Err` means a hard commitment (a pre-boarded delivery) could not
    /// be scheduled at all.
    pub fn run(&mut self) -> Result<WorkingSolution, String> {
        let model = self.model;
        let params = model.params();

        let started = Instant::now();
        let deadline = started + time_limit(params.time_limit);

        let mut current = WorkingSolution::new(model)?;

        // first solution: groups in input order, cheapest feasible spot
        for group in 0..model.groups().len() {
            current.insert_group_best(model, group);
        }

        let mut best = current.clone();
        let mut best_cost = best.objective(model);
        debug!(cost = best_cost, "construction finished");

        let num_groups = model.groups().len();
        if num_groups == 0 {
            return Ok(best);
        }

        let mut stall = 0_usize;
        let mut iterations = 0_usize;

        while Instant::now() < deadline && iterations < params.max_iterations {
            iterations += 1;

            if self.step(&mut current) {
                stall = 0;
                let cost = current.objective(model);
                if cost < best_cost {
                    best = current.clone();
                    best_cost = cost;
                }
            } else {
                stall += 1;
                if stall >= params.stall_iterations {
                    self.penalties.penalize(model, &current);
                    stall = 0;
                }
            }
        }

        debug!(
            iterations,
            cost = best_cost,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(best)
    }

    /// One local-search move; true when the candidate was accepted.
    fn step(&mut self, current: &mut WorkingSolution) -> bool {
        let model = self.model;
        let num_groups = model.groups().len();

        let before = self.penalties.augmented(model, current);
        let mut candidate = current.clone();

        let accepted_move = match self.rng.random_range(0..3_u32) {
            // relocate: rip one active group out and reinsert it wherever
            // is now cheapest
            0 => {
                let group = self.rng.random_range(0..num_groups);
                candidate.is_group_active(model, group)
                    && candidate.remove_group(model, group)
                    && candidate.insert_group_best(model, group)
            }
            // revive a dropped group
            1 => {
                let group = self.rng.random_range(0..num_groups);
                candidate.is_group_dropped(model, group)
                    && candidate.insert_group_best(model, group)
            }
            // swap: remove two groups, reinsert both
            _ => {
                let first = self.rng.random_range(0..num_groups);
                let second = self.rng.random_range(0..num_groups);
                first != second
                    && candidate.is_group_active(model, first)
                    && candidate.is_group_active(model, second)
                    && candidate.remove_group(model, first)
                    && candidate.remove_group(model, second)
                    && candidate.insert_group_best(model, first)
                    && candidate.insert_group_best(model, second)
            }
        };

        if !accepted_move {
            return false;
        }

        if self.penalties.augmented(model, &candidate) < before {
            *current = candidate;
            true
        } else {
            false
        }
    }
}

fn time_limit(limit: jiff::SignedDuration) -> Duration {
    Duration::from_secs_f64(limit.as_secs_f64().max(0.0))
}
