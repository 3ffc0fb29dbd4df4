//! Lattices of points over an area of interest, and the per-point results of a grid run.

use crate::agforecast::LatLon;
use crate::types::risk_record::RiskRecord;
use serde::Serialize;
use thiserror::Error;

/// Absorbs floating point error when dividing the extent by the resolution,
/// so `1.0 / 0.1` doesn't produce an extra step.
const STEP_EPSILON: f64 = 1e-9;

/// Upper bound on lattice points per run; finer resolutions are rejected.
pub const MAX_GRID_POINTS: usize = 1_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Grid resolution must be a positive number, got {0}")]
    InvalidResolution(f64),

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, GridError> {
        let bbox = Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        };
        if ![min_lat, min_lon, max_lat, max_lon].iter().all(|v| v.is_finite()) {
            return Err(GridError::InvalidBoundingBox(format!(
                "coordinates must be finite: {bbox:?}"
            )));
        }
        if min_lat > max_lat || min_lon > max_lon {
            return Err(GridError::InvalidBoundingBox(format!(
                "minimum exceeds maximum: {bbox:?}"
            )));
        }
        Ok(bbox)
    }
}

/// Number of lattice values along one axis from `min` to `max` inclusive, `None` past
/// [`MAX_GRID_POINTS`].
fn axis_len(min: f64, max: f64, resolution: f64) -> Option<usize> {
    let steps = ((max - min) / resolution - STEP_EPSILON).ceil().max(0.0);
    if !steps.is_finite() || steps >= MAX_GRID_POINTS as f64 {
        return None;
    }
    Some(steps as usize + 1)
}

fn axis(min: f64, len: usize, resolution: f64) -> impl Iterator<Item = f64> {
    (0..len).map(move |i| min + i as f64 * resolution)
}

/// Every `(lat, lon)` from the box's minimum corner stepping by `resolution`, latitude-major.
///
/// Each axis gets `ceil((max - min) / resolution) + 1` values, so the last value can lie
/// beyond the maximum when the extent isn't a multiple of the resolution.
///
/// # Errors
///
/// Returns [`GridError::InvalidResolution`] if `resolution` isn't a positive number or the
/// lattice would exceed [`MAX_GRID_POINTS`].
pub fn generate_grid(bbox: &BoundingBox, resolution: f64) -> Result<Vec<LatLon>, GridError> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(GridError::InvalidResolution(resolution));
    }
    let (Some(lat_len), Some(lon_len)) = (
        axis_len(bbox.min_lat, bbox.max_lat, resolution),
        axis_len(bbox.min_lon, bbox.max_lon, resolution),
    ) else {
        return Err(GridError::InvalidResolution(resolution));
    };
    match lat_len.checked_mul(lon_len) {
        Some(points) if points <= MAX_GRID_POINTS => {}
        _ => return Err(GridError::InvalidResolution(resolution)),
    }

    let lons: Vec<f64> = axis(bbox.min_lon, lon_len, resolution).collect();
    Ok(axis(bbox.min_lat, lat_len, resolution)
        .flat_map(|lat| lons.iter().map(move |&lon| LatLon(lat, lon)))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPointRisk {
    pub location: LatLon,
    pub records: Vec<RiskRecord>,
}

/// Risk records per successful grid point, in lattice order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridResult {
    pub points: Vec<GridPointRisk>,
}

impl GridResult {
    pub fn push(&mut self, location: LatLon, records: Vec<RiskRecord>) {
        self.points.push(GridPointRisk { location, records });
    }

    pub fn get(&self, location: LatLon) -> Option<&[RiskRecord]> {
        self.points
            .iter()
            .find(|point| point.location == location)
            .map(|point| point.records.as_slice())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn locations(&self) -> impl Iterator<Item = LatLon> + '_ {
        self.points.iter().map(|point| point.location)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_unit_box_at_half_degree() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let grid = generate_grid(&bbox, 0.5).unwrap();
        assert_eq!(
            grid,
            vec![
                LatLon(0.0, 0.0),
                LatLon(0.0, 0.5),
                LatLon(0.0, 1.0),
                LatLon(0.5, 0.0),
                LatLon(0.5, 0.5),
                LatLon(0.5, 1.0),
                LatLon(1.0, 0.0),
                LatLon(1.0, 0.5),
                LatLon(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_lattice_sizes() {
        // Wisconsin at a tenth of a degree: floating error must not add a row.
        let bbox = BoundingBox::new(42.5, -92.9, 47.1, -86.8).unwrap();
        let grid = generate_grid(&bbox, 0.1).unwrap();
        assert_eq!(grid.len(), 47 * 62);

        // Extent not a multiple of the resolution: the last value overshoots.
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 0.0).unwrap();
        let grid = generate_grid(&bbox, 0.3).unwrap();
        assert_eq!(grid.len(), 5);
        assert!((grid[4].0 - 1.2).abs() < 1e-9);

        // Degenerate box
        let bbox = BoundingBox::new(43.0, -89.0, 43.0, -89.0).unwrap();
        assert_eq!(generate_grid(&bbox, 0.5).unwrap(), vec![LatLon(43.0, -89.0)]);
    }

    #[test]
    fn test_invalid_input() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(generate_grid(&bbox, 0.0), Err(GridError::InvalidResolution(0.0)));
        assert!(generate_grid(&bbox, -0.5).is_err());
        assert!(generate_grid(&bbox, f64::NAN).is_err());

        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_oversized_lattice_is_rejected() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(
            generate_grid(&bbox, 1e-12),
            Err(GridError::InvalidResolution(1e-12))
        );
        // Each axis is fine on its own, the product is not.
        assert_eq!(
            generate_grid(&bbox, 1e-4),
            Err(GridError::InvalidResolution(1e-4))
        );
        // Exactly at the limit: 1000 x 1000 points.
        let bbox = BoundingBox::new(0.0, 0.0, 0.999, 0.999).unwrap();
        assert_eq!(generate_grid(&bbox, 0.001).unwrap().len(), MAX_GRID_POINTS);
        assert!(BoundingBox::new(0.0, f64::INFINITY, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_result_lookup_and_json() {
        let mut result = GridResult::default();
        let date = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        result.push(LatLon(43.0, -89.5), vec![RiskRecord::new(date)]);
        result.push(LatLon(43.5, -89.5), Vec::new());

        assert_eq!(result.len(), 2);
        assert_eq!(result.get(LatLon(43.0, -89.5)).map(<[_]>::len), Some(1));
        assert!(result.get(LatLon(44.0, -89.5)).is_none());

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["points"][0]["location"], serde_json::json!([43.0, -89.5]));
        assert_eq!(json["points"][0]["records"][0]["forecasting_date"], "2024-07-02");
    }
}
