//! Guided-local-search feature penalties over arcs. When the search
//! stalls, the arcs of the incumbent with the highest utility
//! `distance / (1 + penalty)` are penalised, steering the augmented
//! objective away from the local optimum.

use fxhash::FxHashMap;

use crate::model::RoutingModel;
use crate::state::working::WorkingSolution;

pub(crate) struct ArcPenalties {
    counts: FxHashMap<(usize, usize), i64>,
    lambda: i64,
    lambda_factor: f64,
}

impl ArcPenalties {
    pub fn new(lambda_factor: f64) -> Self {
        ArcPenalties {
            counts: FxHashMap::default(),
            lambda: 0,
            lambda_factor,
        }
    }

    /// Objective augmented with the accumulated arc penalties.
    pub fn augmented(&self, model: &RoutingModel, solution: &WorkingSolution) -> i64 {
        let mut cost = solution.objective(model);

        if self.lambda > 0 && !self.counts.is_empty() {
            for arc in solution.arcs(model) {
                if let Some(&count) = self.counts.get(&arc) {
                    cost = cost.saturating_add(self.lambda.saturating_mul(count));
                }
            }
        }

        cost
    }

    /// Penalises the maximum-utility arcs of the given solution.
    pub fn penalize(&mut self, model: &RoutingModel, solution: &WorkingSolution) {
        let arcs = solution.arcs(model);
        if arcs.is_empty() {
            return;
        }

        if self.lambda == 0 {
            let mean = arcs
                .iter()
                .map(|&(from, to)| model.matrices().distance(from, to))
                .sum::<i64>()
                / arcs.len() as i64;
            self.lambda = ((mean as f64 * self.lambda_factor) as i64).max(1);
        }

        let utilities: Vec<i64> = arcs
            .iter()
            .map(|arc| {
                let distance = model.matrices().distance(arc.0, arc.1);
                let count = self.counts.get(arc).copied().unwrap_or(0);
                distance / (1 + count)
            })
            .collect();

        let Some(&max_utility) = utilities.iter().max() else {
            return;
        };

        for (arc, utility) in arcs.into_iter().zip(utilities) {
            if utility == max_utility {
                *self.counts.entry(arc).or_insert(0) += 1;
            }
        }
    }
}
