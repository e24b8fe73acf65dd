use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3, Axis};
use time::OffsetDateTime;

use super::constants::ANGSTROM_PER_NM;
use super::energy_grid::EnergyBins;
use super::error::EigenprofileError;

/// A rate tensor indexed by (time, energy, altitude, reaction) with its reaction labels
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionRates {
    pub rates: Array4<f64>,
    pub reactions: Vec<String>,
}

impl ReactionRates {
    /// Total over every reaction, indexed by (time, energy, altitude)
    pub fn summed(&self) -> Array3<f64> {
        self.rates.sum_axis(Axis(3))
    }
}

/// The ionospheric response to unit flux in each energy bin.
///
/// Shapes, with Nt times, Ne energy bins, Nz altitudes:
/// - `ver`: Nt x Ne x Nz x Nwavelength
/// - `prod`, `loss`: Nt x Ne x Nz x Nreaction
/// - `energy_deposition`: Nt x Nz x Ne
///
/// All tensors share the same time, energy and altitude coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenprofiles {
    pub times: Vec<OffsetDateTime>,
    pub energy: EnergyBins,
    pub diffnumflux: Array1<f64>,
    pub altitude_km: Array1<f64>,
    pub wavelength_angstrom: Array1<f64>,
    pub ver: Array4<f64>,
    pub prod: ReactionRates,
    pub loss: ReactionRates,
    pub energy_deposition: Array3<f64>,
}

impl Eigenprofiles {
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn n_energies(&self) -> usize {
        self.energy.len()
    }

    pub fn n_altitudes(&self) -> usize {
        self.altitude_km.len()
    }

    /// Check every tensor against the shared coordinate axes
    pub fn validate(&self) -> Result<(), EigenprofileError> {
        let (nt, ne, nz) = (self.n_times(), self.n_energies(), self.n_altitudes());
        check_shape("Ebins_high", self.energy.high.shape(), &[ne])?;
        check_shape(
            "diffnumflux",
            self.diffnumflux.shape(),
            &[ne],
        )?;
        check_shape(
            "ver",
            self.ver.shape(),
            &[nt, ne, nz, self.wavelength_angstrom.len()],
        )?;
        check_shape(
            "prod",
            self.prod.rates.shape(),
            &[nt, ne, nz, self.prod.reactions.len()],
        )?;
        check_shape(
            "loss",
            self.loss.rates.shape(),
            &[nt, ne, nz, self.loss.reactions.len()],
        )?;
        check_shape(
            "energydeposition",
            self.energy_deposition.shape(),
            &[nt, nz, ne],
        )?;
        Ok(())
    }

    /// VER wavelength axis in nm
    pub fn wavelength_nm(&self) -> Array1<f64> {
        self.wavelength_angstrom.mapv(|a| a / ANGSTROM_PER_NM)
    }

    /// VER at one time as (altitude, energy, wavelength)
    pub fn ver_at(&self, time_index: usize) -> Option<ArrayView3<f64>> {
        if time_index >= self.n_times() {
            return None;
        }
        Some(
            self.ver
                .slice(s![time_index, .., .., ..])
                .permuted_axes([1, 0, 2]),
        )
    }

    /// VER at one time summed over wavelength, as (altitude, energy)
    pub fn ver_summed_at(&self, time_index: usize) -> Option<Array2<f64>> {
        self.ver_at(time_index).map(|v| v.sum_axis(Axis(2)))
    }

    /// Select a subset of times, keeping every tensor consistent
    pub fn select_times(&self, indices: &[usize]) -> Self {
        Self {
            times: indices.iter().map(|i| self.times[*i]).collect(),
            energy: self.energy.clone(),
            diffnumflux: self.diffnumflux.clone(),
            altitude_km: self.altitude_km.clone(),
            wavelength_angstrom: self.wavelength_angstrom.clone(),
            ver: self.ver.select(Axis(0), indices),
            prod: ReactionRates {
                rates: self.prod.rates.select(Axis(0), indices),
                reactions: self.prod.reactions.clone(),
            },
            loss: ReactionRates {
                rates: self.loss.rates.select(Axis(0), indices),
                reactions: self.loss.reactions.clone(),
            },
            energy_deposition: self.energy_deposition.select(Axis(0), indices),
        }
    }
}

fn check_shape(name: &str, found: &[usize], expected: &[usize]) -> Result<(), EigenprofileError> {
    if found == expected {
        Ok(())
    } else {
        Err(EigenprofileError::ShapeMismatch(
            name.to_string(),
            found.to_vec(),
            expected.to_vec(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim_time::parse_time;
    use ndarray::array;

    /// A small but fully populated set of eigenprofiles, with distinct values everywhere
    pub(crate) fn sample_eigenprofiles() -> Eigenprofiles {
        let (nt, ne, nz, nw, nr) = (2, 3, 4, 5, 2);
        let times = vec![
            parse_time("2013-01-31T09:00:00Z").unwrap(),
            parse_time("2013-01-31T10:00:00Z").unwrap(),
        ];
        let energy = EnergyBins {
            low: array![50.0, 100.0, 200.0],
            high: array![100.0, 200.0, 400.0],
        };
        let diffnumflux = energy.unit_diffnumflux();
        Eigenprofiles {
            times,
            energy,
            diffnumflux,
            altitude_km: array![90.0, 110.0, 150.0, 300.0],
            wavelength_angstrom: array![4278.0, 5577.0, 6300.0, 7320.0, 8446.0],
            ver: Array4::from_shape_fn((nt, ne, nz, nw), |(t, e, z, w)| {
                1.0 + t as f64 + 0.1 * e as f64 + 0.01 * z as f64 + 0.001 * w as f64
            }),
            prod: ReactionRates {
                rates: Array4::from_shape_fn((nt, ne, nz, nr), |(t, e, z, r)| {
                    (t * 1000 + e * 100 + z * 10 + r) as f64
                }),
                reactions: vec!["O+(2P)".to_string(), "N2+".to_string()],
            },
            loss: ReactionRates {
                rates: Array4::from_shape_fn((nt, ne, nz, nr), |(t, e, z, r)| {
                    ((t * 1000 + e * 100 + z * 10 + r) as f64).sqrt()
                }),
                reactions: vec!["O+(2D)".to_string(), "O2+".to_string()],
            },
            energy_deposition: Array3::from_shape_fn((nt, nz, ne), |(t, z, e)| {
                1e-3 * (t + z + e) as f64
            }),
        }
    }

    #[test]
    fn test_validate() {
        let eig = sample_eigenprofiles();
        assert!(eig.validate().is_ok());

        let mut bad = eig.clone();
        bad.energy_deposition = Array3::zeros((2, 3, 4));
        match bad.validate() {
            Err(EigenprofileError::ShapeMismatch(name, found, expected)) => {
                assert_eq!(name, "energydeposition");
                assert_eq!(found, vec![2, 3, 4]);
                assert_eq!(expected, vec![2, 4, 3]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut bad = eig.clone();
        bad.prod.reactions.pop();
        assert!(bad.validate().is_err());

        let mut bad = eig;
        bad.energy.high = array![100.0, 200.0];
        match bad.validate() {
            Err(EigenprofileError::ShapeMismatch(name, found, expected)) => {
                assert_eq!(name, "Ebins_high");
                assert_eq!(found, vec![2]);
                assert_eq!(expected, vec![3]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ver_views() {
        let eig = sample_eigenprofiles();
        let v = eig.ver_at(1).unwrap();
        assert_eq!(v.shape(), &[4, 3, 5]);
        assert_eq!(v[[2, 1, 3]], eig.ver[[1, 1, 2, 3]]);
        let summed = eig.ver_summed_at(0).unwrap();
        assert_eq!(summed.shape(), &[4, 3]);
        assert!(eig.ver_at(2).is_none());
        assert_eq!(eig.wavelength_nm()[1], 557.7);
    }

    #[test]
    fn test_select_times() {
        let eig = sample_eigenprofiles();
        let one = eig.select_times(&[1]);
        assert!(one.validate().is_ok());
        assert_eq!(one.n_times(), 1);
        assert_eq!(one.times[0], eig.times[1]);
        assert_eq!(one.prod.rates[[0, 2, 3, 1]], eig.prod.rates[[1, 2, 3, 1]]);
    }
}
