/// Distances are stored as integers at metres × 100 so the solver
/// operates on integers while keeping sub-kilometre resolution.
pub const DISTANCE_SCALE: i64 = 100;

/// Square travel matrices in node order, row-major.
#[derive(Debug, Clone)]
pub struct TravelMatrices {
    size: usize,
    /// metres × [`DISTANCE_SCALE`]
    distances: Vec<i64>,
    /// seconds
    times: Vec<i64>,
}

impl TravelMatrices {
    pub fn new(size: usize, distances: Vec<i64>, times: Vec<i64>) -> Self {
        assert_eq!(distances.len(), size * size);
        assert_eq!(times.len(), size * size);

        TravelMatrices {
            size,
            distances,
            times,
        }
    }

    /// Builds matrices from per-pair raw values (metres, seconds),
    /// applying the distance scale and zeroing the diagonal.
    pub fn from_fn(size: usize, mut pair: impl FnMut(usize, usize) -> (f64, f64)) -> Self {
        let mut distances = vec![0_i64; size * size];
        let mut times = vec![0_i64; size * size];

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (meters, seconds) = pair(from, to);
                distances[from * size + to] = (meters * DISTANCE_SCALE as f64) as i64;
                times[from * size + to] = seconds as i64;
            }
        }

        TravelMatrices {
            size,
            distances,
            times,
        }
    }

    /// Every pair at the same raw distance and travel time.
    pub fn from_constant(size: usize, meters: f64, seconds: f64) -> Self {
        TravelMatrices::from_fn(size, |_, _| (meters, seconds))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[from * self.size + to]
    }

    pub fn time(&self, from: usize, to: usize) -> i64 {
        self.times[from * self.size + to]
    }
}

/// Inverse of the storage scale: scaled units back to kilometres, rounded
/// to 3 decimals.
pub fn distance_km(scaled: i64) -> f64 {
    let km = scaled as f64 / DISTANCE_SCALE as f64 / 1000.0;
    (km * 1000.0).round() / 1000.0
}
