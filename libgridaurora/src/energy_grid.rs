use ndarray::Array1;
use std::path::Path;

use super::error::EnergyGridError;

/// Energy bins (eV) of the unit input flux, shared by every tensor of an eigenprofile run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyBins {
    pub low: Array1<f64>,
    pub high: Array1<f64>,
}

impl EnergyBins {
    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    /// Bin centres, the coordinate stored as `/Ebins`
    pub fn centers(&self) -> Array1<f64> {
        (&self.low + &self.high) / 2.0
    }

    pub fn widths(&self) -> Array1<f64> {
        &self.high - &self.low
    }

    /// Bin edges for pcolor style plots: every lower edge followed by the last upper edge
    pub fn edges(&self) -> Array1<f64> {
        let mut edges = self.low.to_vec();
        if !self.high.is_empty() {
            edges.push(self.high[self.high.len() - 1]);
        }
        Array1::from(edges)
    }

    /// Differential number flux (cm^-2 s^-1 eV^-1) carrying a unit number flux in each bin
    pub fn unit_diffnumflux(&self) -> Array1<f64> {
        self.widths().mapv(|w| 1.0 / w)
    }
}

/// Read the reference grid, one `low,high` pair (eV) per line.
/// Blank lines and lines starting with `#` are skipped.
pub fn read_reference_grid(path: &Path) -> Result<EnergyBins, EnergyGridError> {
    if !path.exists() {
        return Err(EnergyGridError::DataUnavailable(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let mut low = Vec::new();
    let mut high = Vec::new();
    for (line_number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entries: Vec<&str> = line.split_terminator(',').map(str::trim).collect();
        if entries.len() < 2 {
            return Err(EnergyGridError::BadFileFormat(line_number + 1));
        }
        low.push(entries[0].parse::<f64>()?);
        high.push(entries[1].parse::<f64>()?);
    }
    let bins = EnergyBins {
        low: Array1::from(low),
        high: Array1::from(high),
    };
    validate(&bins)?;
    Ok(bins)
}

/// Extend the reference grid up to `max_energy_ev`.
///
/// Each edge column is fit with `ln E = a + b * index` by least squares and new bins are
/// appended along the fit until the upper edge reaches `max_energy_ev`. The reference bins are
/// kept as they are.
pub fn extrapolate(
    reference: &EnergyBins,
    max_energy_ev: f64,
) -> Result<EnergyBins, EnergyGridError> {
    validate(reference)?;
    let n_ref = reference.len();
    if n_ref < 2 {
        return Err(EnergyGridError::InsufficientData(n_ref));
    }
    let last_high = reference.high[n_ref - 1];
    if !(max_energy_ev > last_high) {
        return Err(EnergyGridError::BadMaxEnergy(max_energy_ev));
    }
    let (a_low, b_low) = fit_log_linear(&reference.low);
    let (a_high, b_high) = fit_log_linear(&reference.high);
    if b_low <= 0.0 || b_high <= 0.0 {
        return Err(EnergyGridError::NotIncreasing(n_ref));
    }

    let mut low = reference.low.to_vec();
    let mut high = reference.high.to_vec();
    let mut index = n_ref;
    while high[high.len() - 1] < max_energy_ev {
        let x = index as f64;
        // Keep bins contiguous with the last one even where the fit drifts from the reference
        let next_low = (a_low + b_low * x).exp().max(high[high.len() - 1]);
        let next_high = (a_high + b_high * x).exp().max(next_low * (1.0 + f64::EPSILON));
        low.push(next_low);
        high.push(next_high);
        index += 1;
    }
    log::info!(
        "Extrapolated energy grid from {} to {} bins, {:.1} eV to {:.3e} eV",
        n_ref,
        low.len(),
        low[0],
        high[high.len() - 1]
    );
    Ok(EnergyBins {
        low: Array1::from(low),
        high: Array1::from(high),
    })
}

/// Least squares fit of ln(y) against the sample index, returning (intercept, slope)
fn fit_log_linear(values: &Array1<f64>) -> (f64, f64) {
    let n = values.len() as f64;
    let xs = Array1::from_iter((0..values.len()).map(|i| i as f64));
    let ys = values.mapv(f64::ln);
    let x_mean = xs.sum() / n;
    let y_mean = ys.sum() / n;
    let sxy = ((&xs - x_mean) * (&ys - y_mean)).sum();
    let sxx = (&xs - x_mean).mapv(|d| d * d).sum();
    let slope = sxy / sxx;
    (y_mean - slope * x_mean, slope)
}

fn validate(bins: &EnergyBins) -> Result<(), EnergyGridError> {
    if bins.len() < 2 || bins.high.len() != bins.len() {
        return Err(EnergyGridError::InsufficientData(bins.len()));
    }
    for i in 0..bins.len() {
        let (lo, hi) = (bins.low[i], bins.high[i]);
        if !(lo > 0.0) || !(hi > lo) || (i > 0 && !(lo > bins.low[i - 1])) {
            return Err(EnergyGridError::NotIncreasing(i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::io::Write;

    fn geometric_grid(n: usize) -> EnergyBins {
        let low = Array1::from_iter((0..n).map(|i| 50.0 * 1.5f64.powi(i as i32)));
        let high = low.mapv(|e| e * 1.5);
        EnergyBins { low, high }
    }

    #[test]
    fn test_bin_geometry() {
        let bins = EnergyBins {
            low: array![10.0, 20.0],
            high: array![20.0, 40.0],
        };
        assert_eq!(bins.centers(), array![15.0, 30.0]);
        assert_eq!(bins.edges(), array![10.0, 20.0, 40.0]);
        assert_eq!(bins.unit_diffnumflux(), array![0.1, 0.05]);
    }

    #[test]
    fn test_extrapolate_follows_geometric_grid() {
        let reference = geometric_grid(10);
        let bins = extrapolate(&reference, 1e6).unwrap();
        assert!(bins.high[bins.len() - 1] >= 1e6);
        assert!(bins.high[bins.len() - 2] < 1e6);
        for i in 0..reference.len() {
            assert_eq!(bins.low[i], reference.low[i]);
        }
        // the fit is exact on a geometric grid
        let i = reference.len();
        assert_relative_eq!(bins.low[i], 50.0 * 1.5f64.powi(i as i32), max_relative = 1e-9);
        for w in bins.low.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn test_extrapolate_rejects_low_max() {
        let reference = geometric_grid(4);
        assert!(matches!(
            extrapolate(&reference, 10.0),
            Err(EnergyGridError::BadMaxEnergy(_))
        ));
    }

    #[test]
    fn test_read_reference_grid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# low,high").unwrap();
        writeln!(file, "50.0,60.0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "60.0, 75.0").unwrap();
        writeln!(file, "75.0,90.0").unwrap();
        let bins = read_reference_grid(file.path()).unwrap();
        assert_eq!(bins.low, array![50.0, 60.0, 75.0]);
        assert_eq!(bins.high, array![60.0, 75.0, 90.0]);
    }

    #[test]
    fn test_read_bad_reference_grid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "50.0").unwrap();
        assert!(matches!(
            read_reference_grid(file.path()),
            Err(EnergyGridError::BadFileFormat(1))
        ));
        assert!(matches!(
            read_reference_grid(Path::new("/nonexistent/zettflux.csv")),
            Err(EnergyGridError::DataUnavailable(_))
        ));
    }
}
