use paraplan_osrm::OsrmClient;
use paraplan_solver::Solver;

pub struct AppState {
    pub osrm: OsrmClient,
    pub solver: Solver,
    pub geometry_workers: usize,
}
