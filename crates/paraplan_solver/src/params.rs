use jiff::SignedDuration;

/// Cost of leaving a ride unserved. Much larger than any realistic
/// distance so drops are only chosen when nothing else is feasible.
pub const DROP_PENALTY: i64 = 1_000_000_000;

/// Short-circuiting a delivery at the end depot beats dropping the ride
/// outright but never beats serving it properly.
pub const DEPOT_DROP_PENALTY: i64 = DROP_PENALTY / 4;

/// Longest a passenger may stay on board, pickup to delivery.
pub const MAX_RIDE_TIME_SECONDS: i64 = 5_000;

pub const REST_TIME_SECONDS: i64 = 1_800;
pub const REST_MIN_OFFSET_SECONDS: i64 = 3_600;
pub const REST_MIN_TAIL_SECONDS: i64 = 3_600;

pub const TIME_STOP_COMMON_SECONDS: i64 = 120;
pub const TIME_STOP_WHEELCHAIR_SECONDS: i64 = 300;
pub const TIME_STOP_ELECTRIC_RAMP_SECONDS: i64 = 300;

/// Weight of the longest per-vehicle distance in the objective; spreads
/// work across the fleet.
pub const SPAN_COST_COEFFICIENT: i64 = 100;

/// Cost per second a delivery arrives after its window opens.
pub const SOFT_DELIVERY_PENALTY_PER_SECOND: i64 = 1_000;

/// Disables one part of the model build each; useful for bisecting an
/// infeasible problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFlags {
    pub drop_penalties: bool,
    pub distance_dimension: bool,
    pub time_dimension: bool,
    pub seat_capacity: bool,
    pub wheelchair_capacity: bool,
    pub pickup_delivery: bool,
    pub max_ride_time: bool,
    pub shift_containment: bool,
    pub compatibility: bool,
    pub rest: bool,
}

impl SkipFlags {
    pub fn from_env() -> Self {
        SkipFlags {
            drop_penalties: env_flag("SKIP_DROP_PENALTIES"),
            distance_dimension: env_flag("SKIP_DISTANCE_DIMENSION"),
            time_dimension: env_flag("SKIP_TIME_DIMENSION"),
            seat_capacity: env_flag("SKIP_SEAT_CAPACITY"),
            wheelchair_capacity: env_flag("SKIP_WHEELCHAIR_CAPACITY"),
            pickup_delivery: env_flag("SKIP_PICKUP_DELIVERY"),
            max_ride_time: env_flag("SKIP_MAX_RIDE_TIME"),
            shift_containment: env_flag("SKIP_SHIFT_CONTAINMENT"),
            compatibility: env_flag("SKIP_COMPATIBILITY"),
            rest: env_flag("SKIP_REST"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct SolverParams {
    pub time_limit: SignedDuration,
    pub seed: u64,
    /// Backstop against spinning when the problem converges instantly.
    pub max_iterations: usize,
    /// Non-improving iterations tolerated before arc penalisation.
    pub stall_iterations: usize,
    /// Scale factor of the guided-local-search penalty weight relative
    /// to the mean arc distance.
    pub gls_lambda_factor: f64,
    pub allow_depot_drop: bool,

    pub drop_penalty: i64,
    pub depot_drop_penalty: i64,
    pub max_ride_time: i64,
    pub rest_time: i64,
    pub rest_min_offset: i64,
    pub rest_min_tail: i64,
    pub span_cost_coefficient: i64,
    pub soft_delivery_penalty: i64,

    pub skip: SkipFlags,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            time_limit: SignedDuration::from_secs(5),
            seed: 0,
            max_iterations: 200_000,
            stall_iterations: 400,
            gls_lambda_factor: 0.2,
            allow_depot_drop: false,

            drop_penalty: DROP_PENALTY,
            depot_drop_penalty: DEPOT_DROP_PENALTY,
            max_ride_time: MAX_RIDE_TIME_SECONDS,
            rest_time: REST_TIME_SECONDS,
            rest_min_offset: REST_MIN_OFFSET_SECONDS,
            rest_min_tail: REST_MIN_TAIL_SECONDS,
            span_cost_coefficient: SPAN_COST_COEFFICIENT,
            soft_delivery_penalty: SOFT_DELIVERY_PENALTY_PER_SECOND,

            skip: SkipFlags::default(),
        }
    }
}

impl SolverParams {
    pub fn from_env() -> Self {
        let mut params = SolverParams::default();

        if let Ok(seconds) = std::env::var("SOLVE_TIME_LIMIT_SECONDS")
            && let Ok(seconds) = seconds.parse::<i64>()
        {
            params.time_limit = SignedDuration::from_secs(seconds);
        }

        if let Ok(seed) = std::env::var("SOLVER_SEED")
            && let Ok(seed) = seed.parse()
        {
            params.seed = seed;
        }

        params.allow_depot_drop = env_flag("ALLOW_DEPOT_DROP");
        params.skip = SkipFlags::from_env();
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SolverParams::default();
        assert_eq!(params.time_limit, SignedDuration::from_secs(5));
        assert_eq!(params.drop_penalty, 1_000_000_000);
        assert_eq!(params.depot_drop_penalty, 250_000_000);
        assert!(!params.allow_depot_drop);
        assert!(!params.skip.rest);
    }
}
