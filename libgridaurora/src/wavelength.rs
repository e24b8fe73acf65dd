use ndarray::{Array1, ArrayView1};

use super::error::GridError;

/// Fraction of a step forgiven when deciding whether `stop` lands on the grid
const STEP_TOLERANCE: f64 = 1e-9;
/// Largest grid that will be allocated
const MAX_GRID_POINTS: usize = 10_000_000;

/// The common wavelength grid (nm) that every transmission curve of a run is resampled onto.
///
/// Always non-empty and strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    values: Array1<f64>,
}

impl WavelengthGrid {
    /// Build the grid `start, start + step, ...` up to and including `stop` when `stop` falls on
    /// the grid. Each value is computed as `start + i * step` so that long grids do not drift.
    pub fn from_range(start: f64, stop: f64, step: f64) -> Result<Self, GridError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(GridError::BadStep(step));
        }
        if !start.is_finite() || !stop.is_finite() || stop < start {
            return Err(GridError::BadBounds(start, stop));
        }
        let n_points = ((stop - start) / step + STEP_TOLERANCE).floor() + 1.0;
        if !(n_points <= MAX_GRID_POINTS as f64) {
            return Err(GridError::TooManyPoints(n_points, MAX_GRID_POINTS));
        }
        let n_steps = n_points as usize - 1;
        let values = Array1::from_iter((0..=n_steps).map(|i| start + (i as f64) * step));
        Ok(Self { values })
    }

    /// Wrap an existing axis, checking that it is non-empty and strictly increasing
    pub fn from_values(values: Array1<f64>) -> Result<Self, GridError> {
        check_increasing(values.view())?;
        Ok(Self { values })
    }

    pub fn values(&self) -> ArrayView1<f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// Check a wavelength axis is non-empty, finite and strictly increasing
pub fn check_increasing(values: ArrayView1<f64>) -> Result<(), GridError> {
    if values.is_empty() {
        return Err(GridError::Empty);
    }
    for (idx, pair) in values.windows(2).into_iter().enumerate() {
        if !(pair[1] > pair[0]) || !pair[1].is_finite() {
            return Err(GridError::NotIncreasing(idx + 1, pair[1]));
        }
    }
    if !values[0].is_finite() {
        return Err(GridError::NotIncreasing(0, values[0]));
    }
    Ok(())
}
