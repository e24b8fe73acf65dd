use hdf5::types::{VarLenAscii, VarLenUnicode};
use hdf5::File;
use ndarray::{Array1, ArrayView1};
use std::fmt::Display;
use std::path::Path;

use super::constants::{ATM_SERIES, FILTER_SERIES, QE_SERIES, WINDOW_SERIES};
use super::error::TransmissionError;
use super::wavelength::{check_increasing, WavelengthGrid};

const FILTER_WAVELENGTH_NAME: &str = "wavelength";
const ELEMENT_WAVELENGTH_NAME: &str = "lamb";
const TRANSMISSION_NAME: &str = "T";
const QE_NAME: &str = "QE";
const FILTER_NAME_ATTR: &str = "name";

/// The role an optical element plays in the light path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Filter(String),
    Window,
    QuantumEfficiency,
    Atmosphere,
}

impl ElementKind {
    /// Name of the per-element series this kind contributes to a system table
    pub fn series_name(&self) -> &'static str {
        match self {
            Self::Filter(_) => FILTER_SERIES,
            Self::Window => WINDOW_SERIES,
            Self::QuantumEfficiency => QE_SERIES,
            Self::Atmosphere => ATM_SERIES,
        }
    }

    /// The (wavelength, value) dataset names used by the files for this element
    fn dataset_names(&self) -> (&'static str, &'static str) {
        match self {
            Self::Filter(_) | Self::Atmosphere => (FILTER_WAVELENGTH_NAME, TRANSMISSION_NAME),
            Self::Window => (ELEMENT_WAVELENGTH_NAME, TRANSMISSION_NAME),
            Self::QuantumEfficiency => (ELEMENT_WAVELENGTH_NAME, QE_NAME),
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter(name) => write!(f, "{name}"),
            Self::Window => write!(f, "window"),
            Self::QuantumEfficiency => write!(f, "QE"),
            Self::Atmosphere => write!(f, "atmosphere"),
        }
    }
}

/// A measured transmission fraction vs. wavelength (nm) for one optical element, on its native grid.
#[derive(Debug, Clone)]
pub struct TransmissionCurve {
    pub kind: ElementKind,
    wavelength_nm: Array1<f64>,
    transmission: Array1<f64>,
}

impl TransmissionCurve {
    /// Create a curve from its native samples. Wavelengths must be strictly increasing.
    ///
    /// Transmission values outside [0, 1] are suspicious but allowed; a warning is logged.
    pub fn new(
        kind: ElementKind,
        wavelength_nm: Array1<f64>,
        transmission: Array1<f64>,
    ) -> Result<Self, TransmissionError> {
        if wavelength_nm.len() != transmission.len() {
            return Err(TransmissionError::LengthMismatch(
                kind.to_string(),
                wavelength_nm.len(),
                transmission.len(),
            ));
        }
        check_increasing(wavelength_nm.view())
            .map_err(|e| TransmissionError::BadNativeGrid(kind.to_string(), e))?;
        let n_outside = transmission
            .iter()
            .filter(|t| !(0.0..=1.0).contains(*t))
            .count();
        if n_outside > 0 {
            log::warn!(
                "Transmission curve {} has {} values outside [0, 1]",
                kind,
                n_outside
            );
        }
        Ok(Self {
            kind,
            wavelength_nm,
            transmission,
        })
    }

    /// Read the curve for an element from its HDF5 file.
    ///
    /// Filter files carry `/wavelength` and `/T` (with an optional `name` attribute on `/T`),
    /// window files `/lamb` and `/T`, quantum efficiency files `/lamb` and `/QE`.
    /// For filters, `kind` is replaced by the name stored in the file, or the file stem if the
    /// file does not name itself.
    pub fn read(path: &Path, kind: ElementKind) -> Result<Self, TransmissionError> {
        let file = File::open(path)
            .map_err(|_| TransmissionError::DataUnavailable(path.to_path_buf()))?;
        let (wl_name, t_name) = kind.dataset_names();
        let wl_dset = file
            .dataset(wl_name)
            .map_err(|_| TransmissionError::MissingDataset(path.to_path_buf(), wl_name.into()))?;
        let t_dset = file
            .dataset(t_name)
            .map_err(|_| TransmissionError::MissingDataset(path.to_path_buf(), t_name.into()))?;
        let wavelength_nm = wl_dset.read_1d::<f64>()?;
        let transmission = t_dset.read_1d::<f64>()?;

        let kind = match kind {
            ElementKind::Filter(_) => ElementKind::Filter(read_filter_name(&t_dset, path)),
            other => other,
        };
        log::info!(
            "Loaded {} transmission from {} ({} samples)",
            kind,
            path.to_string_lossy(),
            wavelength_nm.len()
        );
        Self::new(kind, wavelength_nm, transmission)
    }

    pub fn wavelength_nm(&self) -> ArrayView1<f64> {
        self.wavelength_nm.view()
    }

    pub fn transmission(&self) -> ArrayView1<f64> {
        self.transmission.view()
    }

    /// Resample onto the common grid. Points outside the native range become NaN.
    pub fn resample(&self, grid: &WavelengthGrid) -> Array1<f64> {
        grid.values()
            .mapv(|wl| interp_log_linear(wl, &self.wavelength_nm, &self.transmission))
    }
}

fn read_filter_name(dset: &hdf5::Dataset, path: &Path) -> String {
    let stored = dset.attr(FILTER_NAME_ATTR).ok().and_then(|attr| {
        attr.read_scalar::<VarLenUnicode>()
            .map(|s| s.as_str().to_string())
            .or_else(|_| attr.read_scalar::<VarLenAscii>().map(|s| s.as_str().to_string()))
            .ok()
    });
    match stored {
        Some(name) if !name.is_empty() => name,
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

/// Interpolate between native samples, in log space when both neighbours are positive.
/// Any pair touching zero is interpolated linearly.
fn interp_log_linear(x: f64, xs: &Array1<f64>, ys: &Array1<f64>) -> f64 {
    let n = xs.len();
    if n == 0 || x.is_nan() || x < xs[0] || x > xs[n - 1] {
        return f64::NAN;
    }
    let slice = match xs.as_slice() {
        Some(s) => s,
        None => return f64::NAN,
    };
    let idx = match slice.binary_search_by(|v| v.total_cmp(&x)) {
        Ok(exact) => return ys[exact],
        Err(insert) => insert,
    };
    let (x1, x2) = (xs[idx - 1], xs[idx]);
    let (y1, y2) = (ys[idx - 1], ys[idx]);
    let t = (x - x1) / (x2 - x1);
    if y1 > 0.0 && y2 > 0.0 {
        (y1.ln() + t * (y2.ln() - y1.ln())).exp()
    } else {
        y1 + t * (y2 - y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn write_curve(path: &Path, wl_name: &str, t_name: &str, name: Option<&str>) {
        let file = File::create(path).unwrap();
        file.new_dataset_builder()
            .with_data(&array![400.0, 500.0, 600.0, 700.0])
            .create(wl_name)
            .unwrap();
        let t = file
            .new_dataset_builder()
            .with_data(&array![0.1, 0.4, 0.9, 0.0])
            .create(t_name)
            .unwrap();
        if let Some(n) = name {
            t.new_attr::<VarLenUnicode>()
                .create(FILTER_NAME_ATTR)
                .unwrap()
                .write_scalar(&n.parse::<VarLenUnicode>().unwrap())
                .unwrap();
        }
    }

    #[test]
    fn test_interp_log_linear() {
        let xs = array![1.0, 2.0, 3.0];
        let ys = array![0.1, 1.0, 0.0];
        assert_eq!(interp_log_linear(2.0, &xs, &ys), 1.0);
        // geometric mean halfway between two positive samples
        assert_relative_eq!(interp_log_linear(1.5, &xs, &ys), 0.1f64.sqrt(), epsilon = 1e-12);
        // linear when a neighbour is zero
        assert_relative_eq!(interp_log_linear(2.5, &xs, &ys), 0.5, epsilon = 1e-12);
        assert!(interp_log_linear(0.5, &xs, &ys).is_nan());
        assert!(interp_log_linear(3.5, &xs, &ys).is_nan());
    }

    #[test]
    fn test_resample_out_of_range_is_nan() {
        let curve = TransmissionCurve::new(
            ElementKind::Window,
            array![450.0, 550.0],
            array![0.5, 0.5],
        )
        .unwrap();
        let grid = WavelengthGrid::from_range(400.0, 600.0, 50.0).unwrap();
        let resampled = curve.resample(&grid);
        assert!(resampled[0].is_nan());
        assert_relative_eq!(resampled[1], 0.5);
        assert_relative_eq!(resampled[2], 0.5);
        assert_relative_eq!(resampled[3], 0.5);
        assert!(resampled[4].is_nan());
    }

    #[test]
    fn test_bad_curves() {
        assert!(matches!(
            TransmissionCurve::new(ElementKind::Window, array![1.0, 2.0], array![0.5]),
            Err(TransmissionError::LengthMismatch(_, 2, 1))
        ));
        assert!(matches!(
            TransmissionCurve::new(ElementKind::Window, array![2.0, 1.0], array![0.5, 0.5]),
            Err(TransmissionError::BadNativeGrid(_, _))
        ));
    }

    #[test]
    fn test_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let filter_path = dir.path().join("HoyaV10transmittance.h5");
        write_curve(&filter_path, "wavelength", "T", Some("Hoya V-10"));
        let qe_path = dir.path().join("emccdQE.h5");
        write_curve(&qe_path, "lamb", "QE", None);
        let unnamed_path = dir.path().join("BG3transmittance.h5");
        write_curve(&unnamed_path, "wavelength", "T", None);

        let filter =
            TransmissionCurve::read(&filter_path, ElementKind::Filter(String::new())).unwrap();
        assert_eq!(filter.kind, ElementKind::Filter("Hoya V-10".into()));
        assert_eq!(filter.transmission()[2], 0.9);

        let qe = TransmissionCurve::read(&qe_path, ElementKind::QuantumEfficiency).unwrap();
        assert_eq!(qe.wavelength_nm().len(), 4);

        let unnamed =
            TransmissionCurve::read(&unnamed_path, ElementKind::Filter(String::new())).unwrap();
        assert_eq!(
            unnamed.kind,
            ElementKind::Filter("BG3transmittance".into())
        );

        // window files use /lamb, so a filter-layout file is rejected
        assert!(matches!(
            TransmissionCurve::read(&filter_path, ElementKind::Window),
            Err(TransmissionError::MissingDataset(_, _))
        ));
        assert!(matches!(
            TransmissionCurve::read(&dir.path().join("missing.h5"), ElementKind::Window),
            Err(TransmissionError::DataUnavailable(_))
        ));
        let not_hdf5 = dir.path().join("ixonWindowT.h5");
        std::fs::write(&not_hdf5, "lamb,T\n400,0.9\n").unwrap();
        assert!(matches!(
            TransmissionCurve::read(&not_hdf5, ElementKind::Window),
            Err(TransmissionError::DataUnavailable(_))
        ));
    }
}
