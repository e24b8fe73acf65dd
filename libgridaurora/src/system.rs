use ndarray::{Array1, ArrayView1};

use super::constants::{
    ATM_SERIES, FILTER_SERIES, QE_SERIES, SYS_NO_FILTER_SERIES, SYS_SERIES, WINDOW_SERIES,
};
use super::transmission::{ElementKind, TransmissionCurve};
use super::wavelength::WavelengthGrid;

/// Per-element and combined transmission of an instrument, all on one wavelength grid.
///
/// Holds the element series `filter`, `window`, `qe`, `atm` and the products
/// `sysNObg3 = window * qe * atm` and `sys = sysNObg3 * filter`. Elements that were not supplied
/// are 1 everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemTransmission {
    /// Display label, the filter name for tables built around a filter
    pub filename: String,
    grid: WavelengthGrid,
    filter: Array1<f64>,
    window: Array1<f64>,
    qe: Array1<f64>,
    atm: Array1<f64>,
    sys_no_filter: Array1<f64>,
    sys: Array1<f64>,
}

impl SystemTransmission {
    /// Compose the elements supplied, in any order, onto `grid`.
    ///
    /// Non-filter elements of the same kind multiply together. Only the filter named `filter`
    /// enters `sys`; when that name matches none of the supplied filters a warning is logged and
    /// `sys` equals `sysNObg3`. With `filter` set to None, `sys` also equals `sysNObg3`.
    pub fn compose(
        grid: &WavelengthGrid,
        elements: &[TransmissionCurve],
        filter: Option<&str>,
    ) -> Self {
        let ones = Array1::<f64>::ones(grid.len());
        let mut filter_series = ones.clone();
        let mut window = ones.clone();
        let mut qe = ones.clone();
        let mut atm = ones;
        let mut found_filter = false;

        for element in elements {
            match &element.kind {
                ElementKind::Filter(name) => {
                    if filter == Some(name.as_str()) {
                        filter_series *= &element.resample(grid);
                        found_filter = true;
                    }
                }
                ElementKind::Window => window *= &element.resample(grid),
                ElementKind::QuantumEfficiency => qe *= &element.resample(grid),
                ElementKind::Atmosphere => atm *= &element.resample(grid),
            }
        }

        if let Some(name) = filter {
            if !found_filter {
                log::warn!(
                    "Unknown optical filter {} requested, falling back to no filter at all",
                    name
                );
            }
        }

        let sys_no_filter = &window * &qe * &atm;
        let sys = &sys_no_filter * &filter_series;
        Self {
            filename: filter.filter(|_| found_filter).unwrap_or("").to_string(),
            grid: grid.clone(),
            filter: filter_series,
            window,
            qe,
            atm,
            sys_no_filter,
            sys,
        }
    }

    /// A table whose combined series is `sys`, with every element 1. Used for derived entries
    /// such as the product of two filtered systems.
    pub fn from_product(grid: &WavelengthGrid, filename: &str, sys: Array1<f64>) -> Self {
        let ones = Array1::<f64>::ones(grid.len());
        Self {
            filename: filename.to_string(),
            grid: grid.clone(),
            filter: sys.clone(),
            window: ones.clone(),
            qe: ones.clone(),
            atm: ones.clone(),
            sys_no_filter: ones,
            sys,
        }
    }

    pub fn grid(&self) -> &WavelengthGrid {
        &self.grid
    }

    pub fn sys(&self) -> ArrayView1<f64> {
        self.sys.view()
    }

    pub fn sys_no_filter(&self) -> ArrayView1<f64> {
        self.sys_no_filter.view()
    }

    /// Look up a series by its name
    pub fn series(&self, name: &str) -> Option<ArrayView1<f64>> {
        match name {
            SYS_SERIES => Some(self.sys.view()),
            SYS_NO_FILTER_SERIES => Some(self.sys_no_filter.view()),
            FILTER_SERIES => Some(self.filter.view()),
            WINDOW_SERIES => Some(self.window.view()),
            QE_SERIES => Some(self.qe.view()),
            ATM_SERIES => Some(self.atm.view()),
            _ => None,
        }
    }

    pub fn series_names() -> [&'static str; 6] {
        [
            SYS_SERIES,
            SYS_NO_FILTER_SERIES,
            FILTER_SERIES,
            WINDOW_SERIES,
            QE_SERIES,
            ATM_SERIES,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn grid() -> WavelengthGrid {
        WavelengthGrid::from_range(400.0, 700.0, 100.0).unwrap()
    }

    fn curve(kind: ElementKind, values: [f64; 4]) -> TransmissionCurve {
        TransmissionCurve::new(
            kind,
            array![400.0, 500.0, 600.0, 700.0],
            Array1::from(values.to_vec()),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_composition_is_identity() {
        let table = SystemTransmission::compose(&grid(), &[], None);
        assert_eq!(table.sys(), table.sys_no_filter());
        assert!(table.sys().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_composition_commutes() {
        let a = curve(ElementKind::Window, [0.9, 0.8, 0.7, 0.6]);
        let b = curve(ElementKind::QuantumEfficiency, [0.2, 0.5, 0.6, 0.3]);
        let ab = SystemTransmission::compose(&grid(), &[a.clone(), b.clone()], None);
        let ba = SystemTransmission::compose(&grid(), &[b, a], None);
        assert_eq!(ab.sys(), ba.sys());
        assert_eq!(ab.sys_no_filter(), ba.sys_no_filter());
    }

    #[test]
    fn test_filter_only_in_sys() {
        let elements = [
            curve(ElementKind::Filter("BG3".into()), [0.5, 0.9, 0.1, 0.0]),
            curve(ElementKind::Window, [0.9, 0.9, 0.9, 0.9]),
            curve(ElementKind::QuantumEfficiency, [0.5, 0.5, 0.5, 0.5]),
        ];
        let table = SystemTransmission::compose(&grid(), &elements, Some("BG3"));
        assert_eq!(table.filename, "BG3");
        assert_relative_eq!(table.sys_no_filter()[0], 0.45, epsilon = 1e-12);
        assert_relative_eq!(table.sys()[0], 0.225, epsilon = 1e-12);
        assert_eq!(table.sys()[3], 0.0);
        assert_eq!(table.series("atm").unwrap(), Array1::<f64>::ones(4));
    }

    #[test]
    fn test_unknown_filter_falls_back() {
        let elements = [
            curve(ElementKind::Filter("BG3".into()), [0.5, 0.9, 0.1, 0.0]),
            curve(ElementKind::Window, [0.9, 0.9, 0.9, 0.9]),
        ];
        let table = SystemTransmission::compose(&grid(), &elements, Some("BG4"));
        assert_eq!(table.sys(), table.sys_no_filter());
        assert_eq!(table.filename, "");
    }

    #[test]
    fn test_series_lookup() {
        let table = SystemTransmission::compose(&grid(), &[], None);
        for name in SystemTransmission::series_names() {
            assert!(table.series(name).is_some());
        }
        assert!(table.series("bogus").is_none());
    }
}
