use std::ops::Range;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use paraplan_core::problem::Coordinate;

use crate::matrix::{DISTANCE_SCALE, TravelMatrices};

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("matrix query failed: {0}")]
    MatrixQuery(String),

    #[error("route query failed: {0}")]
    RouteQuery(String),
}

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub matrix_endpoint: String,
    pub matrix_params: String,
    pub route_endpoint: String,
    pub route_params: String,
    /// Largest coordinate list sent in a single table query; bigger
    /// requests are tiled into row×column sub-blocks.
    pub batch_size: usize,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        OsrmConfig {
            base_url: "http://localhost:5000".to_owned(),
            matrix_endpoint: "table/v1/driving".to_owned(),
            matrix_params: "annotations=duration,distance".to_owned(),
            route_endpoint: "route/v1/driving".to_owned(),
            route_params: "overview=full".to_owned(),
            batch_size: 100,
        }
    }
}

impl OsrmConfig {
    pub fn from_env() -> Self {
        let defaults = OsrmConfig::default();

        OsrmConfig {
            base_url: env_or("OSRM_BASE_URL", defaults.base_url),
            matrix_endpoint: env_or("OSRM_MATRIX_ENDPOINT", defaults.matrix_endpoint),
            matrix_params: env_or("OSRM_MATRIX_PARAMS", defaults.matrix_params),
            route_endpoint: env_or("OSRM_ROUTE_ENDPOINT", defaults.route_endpoint),
            route_params: env_or("OSRM_ROUTE_PARAMS", defaults.route_params),
            batch_size: std::env::var("OSRM_MATRIX_BATCH_SIZE")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.batch_size),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

#[derive(Deserialize)]
struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: String,
}

pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Self {
        OsrmClient {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Integer distance and time matrices for the ordered coordinate
    /// list, tiled when the list exceeds the configured batch size.
    pub async fn fetch_matrices(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<TravelMatrices, OsrmError> {
        let size = coordinates.len();
        let mut distances = vec![0_i64; size * size];
        let mut times = vec![0_i64; size * size];

        if size == 0 {
            return Ok(TravelMatrices::new(0, distances, times));
        }

        if size <= self.config.batch_size {
            let response = self.query_table(coordinates, None).await?;
            stitch_block(
                &mut distances,
                &mut times,
                size,
                &Tile {
                    rows: 0..size,
                    cols: 0..size,
                },
                response,
            )?;
        } else {
            let tiles = tiles(size, self.config.batch_size);
            debug!(nodes = size, tiles = tiles.len(), "tiling matrix query");

            for tile in tiles {
                let request = TileRequest::new(&tile);
                let batch: Vec<Coordinate> = request
                    .coordinate_indices
                    .iter()
                    .map(|&index| coordinates[index])
                    .collect();

                let response = self
                    .query_table(&batch, Some((&request.sources, &request.destinations)))
                    .await?;
                stitch_block(&mut distances, &mut times, size, &tile, response)?;
            }
        }

        for node in 0..size {
            distances[node * size + node] = 0;
            times[node * size + node] = 0;
        }

        Ok(TravelMatrices::new(size, distances, times))
    }

    /// Road geometry through the ordered waypoints as `[lon, lat]` pairs.
    pub async fn fetch_route_geometry(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<Vec<[f64; 2]>, OsrmError> {
        let url = format!(
            "{}/{}/{}?{}",
            self.config.base_url,
            self.config.route_endpoint,
            join_coordinates(coordinates),
            self.config.route_params,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| OsrmError::RouteQuery(err.to_string()))?;

        let body: OsrmRouteResponse = response
            .json()
            .await
            .map_err(|err| OsrmError::RouteQuery(err.to_string()))?;

        if body.code != "Ok" {
            return Err(OsrmError::RouteQuery(format!(
                "OSRM route returned code {}",
                body.code
            )));
        }

        if body.routes.len() != 1 {
            return Err(OsrmError::RouteQuery(format!(
                "exactly one route expected, received {}",
                body.routes.len()
            )));
        }

        Ok(crate::polyline::decode(&body.routes[0].geometry))
    }

    async fn query_table(
        &self,
        coordinates: &[Coordinate],
        sources_destinations: Option<(&[usize], &[usize])>,
    ) -> Result<OsrmTableResponse, OsrmError> {
        let mut url = format!(
            "{}/{}/{}?{}",
            self.config.base_url,
            self.config.matrix_endpoint,
            join_coordinates(coordinates),
            self.config.matrix_params,
        );

        if let Some((sources, destinations)) = sources_destinations {
            url.push_str(&format!(
                "&sources={}&destinations={}",
                join_indices(sources),
                join_indices(destinations)
            ));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| OsrmError::MatrixQuery(err.to_string()))?;

        let body: OsrmTableResponse = response
            .json()
            .await
            .map_err(|err| OsrmError::MatrixQuery(err.to_string()))?;

        if body.code != "Ok" {
            return Err(OsrmError::MatrixQuery(format!(
                "OSRM table returned code {}",
                body.code
            )));
        }

        Ok(body)
    }
}

fn join_coordinates(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(Coordinate::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, PartialEq, Eq)]
struct Tile {
    rows: Range<usize>,
    cols: Range<usize>,
}

fn tiles(size: usize, batch_size: usize) -> Vec<Tile> {
    let mut tiles = Vec::new();

    for row_start in (0..size).step_by(batch_size) {
        let row_end = (row_start + batch_size).min(size);
        for col_start in (0..size).step_by(batch_size) {
            let col_end = (col_start + batch_size).min(size);
            tiles.push(Tile {
                rows: row_start..row_end,
                cols: col_start..col_end,
            });
        }
    }

    tiles
}

/// Sub-request for one tile: the deduplicated coordinate list plus the
/// `sources`/`destinations` positions into it.
struct TileRequest {
    coordinate_indices: Vec<usize>,
    sources: Vec<usize>,
    destinations: Vec<usize>,
}

impl TileRequest {
    fn new(tile: &Tile) -> Self {
        let mut coordinate_indices: Vec<usize> = tile.rows.clone().collect();
        let sources: Vec<usize> = (0..tile.rows.len()).collect();

        let mut destinations = Vec::with_capacity(tile.cols.len());
        for col in tile.cols.clone() {
            if tile.rows.contains(&col) {
                destinations.push(col - tile.rows.start);
            } else {
                destinations.push(coordinate_indices.len());
                coordinate_indices.push(col);
            }
        }

        TileRequest {
            coordinate_indices,
            sources,
            destinations,
        }
    }
}

fn stitch_block(
    distances: &mut [i64],
    times: &mut [i64],
    size: usize,
    tile: &Tile,
    response: OsrmTableResponse,
) -> Result<(), OsrmError> {
    let block_distances = response
        .distances
        .ok_or_else(|| OsrmError::MatrixQuery("OSRM table returned no distances".to_owned()))?;
    let block_durations = response
        .durations
        .ok_or_else(|| OsrmError::MatrixQuery("OSRM table returned no durations".to_owned()))?;

    if block_distances.len() != tile.rows.len() || block_durations.len() != tile.rows.len() {
        return Err(OsrmError::MatrixQuery(format!(
            "OSRM table returned {} rows, expected {}",
            block_distances.len(),
            tile.rows.len()
        )));
    }

    for (row_offset, row) in tile.rows.clone().enumerate() {
        let distance_row = &block_distances[row_offset];
        let duration_row = &block_durations[row_offset];

        if distance_row.len() != tile.cols.len() || duration_row.len() != tile.cols.len() {
            return Err(OsrmError::MatrixQuery(format!(
                "OSRM table returned {} columns, expected {}",
                distance_row.len(),
                tile.cols.len()
            )));
        }

        for (col_offset, col) in tile.cols.clone().enumerate() {
            let distance = distance_row[col_offset].ok_or_else(|| {
                OsrmError::MatrixQuery(format!("no road distance between nodes {row} and {col}"))
            })?;
            let duration = duration_row[col_offset].ok_or_else(|| {
                OsrmError::MatrixQuery(format!("no road duration between nodes {row} and {col}"))
            })?;

            distances[row * size + col] = (distance * DISTANCE_SCALE as f64) as i64;
            times[row * size + col] = duration as i64;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_cover_the_matrix_once() {
        let tiles = tiles(250, 100);
        assert_eq!(tiles.len(), 9);

        let mut covered = vec![0_u8; 250 * 250];
        for tile in &tiles {
            for row in tile.rows.clone() {
                for col in tile.cols.clone() {
                    covered[row * 250 + col] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_single_tile_for_small_matrix() {
        let tiles = tiles(10, 100);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].rows, 0..10);
        assert_eq!(tiles[0].cols, 0..10);
    }

    #[test]
    fn test_tile_request_reuses_overlapping_coordinates() {
        // Diagonal tile: rows and columns are the same block, so no
        // coordinate should be duplicated.
        let request = TileRequest::new(&Tile {
            rows: 0..3,
            cols: 0..3,
        });
        assert_eq!(request.coordinate_indices, vec![0, 1, 2]);
        assert_eq!(request.sources, vec![0, 1, 2]);
        assert_eq!(request.destinations, vec![0, 1, 2]);

        // Off-diagonal tile: columns follow the row block.
        let request = TileRequest::new(&Tile {
            rows: 0..2,
            cols: 4..6,
        });
        assert_eq!(request.coordinate_indices, vec![0, 1, 4, 5]);
        assert_eq!(request.sources, vec![0, 1]);
        assert_eq!(request.destinations, vec![2, 3]);
    }

    #[test]
    fn test_stitch_block_writes_the_right_cells() {
        let size = 4;
        let mut distances = vec![0_i64; size * size];
        let mut times = vec![0_i64; size * size];

        let response = OsrmTableResponse {
            code: "Ok".to_owned(),
            distances: Some(vec![
                vec![Some(10.0), Some(20.0)],
                vec![Some(30.0), Some(40.0)],
            ]),
            durations: Some(vec![
                vec![Some(1.0), Some(2.0)],
                vec![Some(3.0), Some(4.0)],
            ]),
        };

        stitch_block(
            &mut distances,
            &mut times,
            size,
            &Tile {
                rows: 0..2,
                cols: 2..4,
            },
            response,
        )
        .unwrap();

        assert_eq!(distances[2], 1000); // (0, 2), scaled ×100
        assert_eq!(distances[3], 2000);
        assert_eq!(distances[size + 2], 3000);
        assert_eq!(distances[size + 3], 4000);
        assert_eq!(times[2], 1);
        assert_eq!(times[size + 3], 4);
        assert_eq!(distances[0], 0); // untouched outside the tile
    }

    #[test]
    fn test_table_response_wire_format() {
        let body = r#"{
            "code": "Ok",
            "distances": [[0.0, 1523.4], [1601.2, 0.0]],
            "durations": [[0.0, 132.6], [140.1, 0.0]]
        }"#;

        let response: OsrmTableResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.code, "Ok");
        assert_eq!(response.distances.unwrap()[0][1], Some(1523.4));

        // unroutable pairs come back as nulls
        let body = r#"{"code": "Ok", "distances": [[0.0, null]], "durations": [[0.0, 9.0]]}"#;
        let response: OsrmTableResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.distances.unwrap()[0][1], None);

        let body = r#"{"code": "NoTable"}"#;
        let response: OsrmTableResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.code, "NoTable");
        assert!(response.distances.is_none());
    }

    #[test]
    fn test_stitch_block_rejects_missing_values() {
        let mut distances = vec![0_i64; 4];
        let mut times = vec![0_i64; 4];

        let response = OsrmTableResponse {
            code: "Ok".to_owned(),
            distances: Some(vec![vec![Some(1.0), None], vec![Some(1.0), Some(1.0)]]),
            durations: Some(vec![vec![Some(1.0), Some(1.0)], vec![Some(1.0), Some(1.0)]]),
        };

        let result = stitch_block(
            &mut distances,
            &mut times,
            2,
            &Tile {
                rows: 0..2,
                cols: 0..2,
            },
            response,
        );
        assert!(matches!(result, Err(OsrmError::MatrixQuery(_))));
    }
}
