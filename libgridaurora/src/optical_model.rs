use ndarray::{Array1, Array2, ArrayView1, ArrayView3, Axis, Zip};

use super::constants::{SYS_NO_FILTER_SERIES, SYS_SERIES};
use super::eigenprofile::Eigenprofiles;
use super::error::ApplicatorError;
use super::system::SystemTransmission;

/// Relative tolerance when matching VER wavelengths to the transmission grid
const GRID_TOLERANCE: f64 = 1e-9;

/// VER per unit flux after the optics, indexed by (altitude, energy)
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredVer {
    pub altitude_km: Array1<f64>,
    pub energy_ev: Array1<f64>,
    pub values: Array2<f64>,
    /// The series actually applied, after any fallback
    pub series: String,
}

impl FilteredVer {
    /// Summed over every beam energy, as the camera would see it
    pub fn camera_profile(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(1))
    }
}

/// Map an optical filter selection onto a series of the table.
///
/// `bg3` and `none` are accepted as the historical names for `sys` and `sysNObg3`. Any name the
/// table does not know falls back to `sysNObg3` with a warning.
pub fn resolve_series<'a>(
    table: &'a SystemTransmission,
    name: &str,
) -> (&'static str, ArrayView1<'a, f64>) {
    let canonical = match name {
        "bg3" => SYS_SERIES,
        "none" => SYS_NO_FILTER_SERIES,
        other => SystemTransmission::series_names()
            .into_iter()
            .find(|n| *n == other)
            .unwrap_or(""),
    };
    match table.series(canonical) {
        Some(series) => (canonical, series),
        None => {
            log::warn!(
                "Unknown optical filter type: {}, falling back to using no filter at all",
                name
            );
            (SYS_NO_FILTER_SERIES, table.sys_no_filter())
        }
    }
}

/// Multiply each wavelength slice of `ver` (altitude x energy x wavelength) by the chosen
/// transmission series and sum over wavelength.
///
/// The VER wavelengths must match the table's grid. Products that are NaN, from transmission
/// outside a curve's measured range, are left out of the sum.
pub fn apply_optical_model(
    ver: ArrayView3<f64>,
    wavelength_nm: ArrayView1<f64>,
    table: &SystemTransmission,
    series: &str,
) -> Result<(Array2<f64>, &'static str), ApplicatorError> {
    check_grid(wavelength_nm, table.grid().values())?;
    let (name, transmission) = resolve_series(table, series);
    let (n_alt, n_energy, _) = ver.dim();
    let mut filtered = Array2::<f64>::zeros((n_alt, n_energy));
    Zip::from(&mut filtered)
        .and(ver.lanes(Axis(2)))
        .for_each(|out, spectrum| {
            *out = spectrum
                .iter()
                .zip(transmission.iter())
                .map(|(v, t)| v * t)
                .filter(|p| !p.is_nan())
                .sum();
        });
    Ok((filtered, name))
}

/// Apply the optical model to every time of an eigenprofile run
pub fn apply_to_eigenprofiles(
    eig: &Eigenprofiles,
    table: &SystemTransmission,
    series: &str,
) -> Result<Vec<FilteredVer>, ApplicatorError> {
    let wavelength_nm = eig.wavelength_nm();
    let mut results = Vec::with_capacity(eig.n_times());
    for idx in 0..eig.n_times() {
        let ver = eig.ver_at(idx).ok_or(ApplicatorError::BadTimeIndex(idx))?;
        let (values, name) = apply_optical_model(ver, wavelength_nm.view(), table, series)?;
        results.push(FilteredVer {
            altitude_km: eig.altitude_km.clone(),
            energy_ev: eig.energy.centers(),
            values,
            series: name.to_string(),
        });
    }
    Ok(results)
}

fn check_grid(ver_nm: ArrayView1<f64>, grid_nm: ArrayView1<f64>) -> Result<(), ApplicatorError> {
    if ver_nm.len() != grid_nm.len() {
        return Err(ApplicatorError::GridLengthMismatch(
            ver_nm.len(),
            grid_nm.len(),
        ));
    }
    for (idx, (v, g)) in ver_nm.iter().zip(grid_nm.iter()).enumerate() {
        if (v - g).abs() > GRID_TOLERANCE * g.abs().max(1.0) {
            return Err(ApplicatorError::GridMismatch(idx, *v, *g));
        }
    }
    Ok(())
}
