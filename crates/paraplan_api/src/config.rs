use paraplan_osrm::OsrmConfig;
use paraplan_solver::SolverParams;

/// Everything configurable gathered at startup; passed down by value so
/// nothing reads the environment after boot.
pub struct EngineConfig {
    pub bind_addr: String,
    pub osrm: OsrmConfig,
    pub solver: SolverParams,
    /// Concurrent route-geometry queries per request.
    pub geometry_workers: usize,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        EngineConfig {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            osrm: OsrmConfig::from_env(),
            solver: SolverParams::from_env(),
            geometry_workers: std::env::var("GEOMETRY_WORKERS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(10),
        }
    }
}
