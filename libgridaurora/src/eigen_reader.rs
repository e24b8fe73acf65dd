use hdf5::types::{VarLenAscii, VarLenUnicode};
use hdf5::{File, Group};
use ndarray::{Array1, Array3, Array4, Ix3, Ix4};
use std::path::Path;

use super::constants::*;
use super::eigen_writer::{EBINS_HIGH_NAME, EBINS_LOW_NAME};
use super::eigenprofile::{Eigenprofiles, ReactionRates};
use super::energy_grid::EnergyBins;
use super::error::EigenReaderError;
use super::sim_time::from_unix_seconds;

/// Read an eigenprofile container back into memory, returning the tensors and the sensor
/// location (latitude, longitude in degrees).
pub fn read_eigenprofiles(path: &Path) -> Result<(Eigenprofiles, [f64; 2]), EigenReaderError> {
    if !path.exists() {
        return Err(EigenReaderError::DataUnavailable(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let root: &Group = &file;

    let sensor = read_axis(root, SENSORLOC_NAME)?;
    if sensor.len() != 2 {
        return Err(EigenReaderError::BadContainer(format!(
            "{SENSORLOC_NAME} has {} values, expected 2",
            sensor.len()
        )));
    }

    let diffnumflux = read_axis(root, DIFFNUMFLUX_NAME)?;
    let energy = read_energy_bins(root, &diffnumflux)?;
    let altitude_km = read_axis(root, ALTITUDE_NAME)?;
    let times = read_axis(root, UT1_UNIX_NAME)?
        .iter()
        .map(|s| from_unix_seconds(*s))
        .collect::<Result<Vec<_>, _>>()?;

    let ver_group = open_group(root, VER_GROUP)?;
    let ver = read_tensor4(&ver_group, VER_EIGEN_NAME)?;
    let wavelength_angstrom = read_axis(&ver_group, WAVELENGTH_NAME)?;

    let prod = read_rates(root, PROD_GROUP, PROD_EIGEN_NAME)?;
    let loss = read_rates(root, LOSS_GROUP, LOSS_EIGEN_NAME)?;
    let energy_deposition: Array3<f64> = root
        .dataset(ENERGY_DEPOSITION_NAME)
        .map_err(|_| missing(ENERGY_DEPOSITION_NAME))?
        .read::<f64, Ix3>()?;

    let eig = Eigenprofiles {
        times,
        energy,
        diffnumflux,
        altitude_km,
        wavelength_angstrom,
        ver,
        prod,
        loss,
        energy_deposition,
    };
    eig.validate()?;
    log::info!(
        "Read eigenprofiles from {}: {} times, {} energies, {} altitudes",
        path.to_string_lossy(),
        eig.n_times(),
        eig.n_energies(),
        eig.n_altitudes()
    );
    Ok((eig, [sensor[0], sensor[1]]))
}

fn missing(name: &str) -> EigenReaderError {
    EigenReaderError::BadContainer(format!("missing {name}"))
}

fn open_group(root: &Group, name: &str) -> Result<Group, EigenReaderError> {
    root.group(name).map_err(|_| missing(name))
}

fn read_axis(group: &Group, name: &str) -> Result<Array1<f64>, EigenReaderError> {
    Ok(group
        .dataset(name)
        .map_err(|_| missing(name))?
        .read_1d::<f64>()?)
}

fn read_tensor4(group: &Group, name: &str) -> Result<Array4<f64>, EigenReaderError> {
    Ok(group
        .dataset(name)
        .map_err(|_| missing(name))?
        .read::<f64, Ix4>()?)
}

fn read_rates(
    root: &Group,
    group_name: &str,
    dset_name: &str,
) -> Result<ReactionRates, EigenReaderError> {
    let group = open_group(root, group_name)?;
    let rates = read_tensor4(&group, dset_name)?;
    let labels = group
        .dataset(REACTION_NAME)
        .map_err(|_| missing(REACTION_NAME))?;
    let reactions = match labels.read_1d::<VarLenUnicode>() {
        Ok(r) => r.iter().map(|s| s.as_str().to_string()).collect(),
        Err(_) => labels
            .read_1d::<VarLenAscii>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
    };
    Ok(ReactionRates { rates, reactions })
}

/// Rebuild the bins from the stored edges, or from the centres and the unit flux widths for
/// containers that only carry `/Ebins`
fn read_energy_bins(
    root: &Group,
    diffnumflux: &Array1<f64>,
) -> Result<EnergyBins, EigenReaderError> {
    if let (Ok(low), Ok(high)) = (root.dataset(EBINS_LOW_NAME), root.dataset(EBINS_HIGH_NAME)) {
        return Ok(EnergyBins {
            low: low.read_1d::<f64>()?,
            high: high.read_1d::<f64>()?,
        });
    }
    let centers = read_axis(root, EBINS_NAME)?;
    if centers.len() != diffnumflux.len() {
        return Err(EigenReaderError::BadContainer(format!(
            "{EBINS_NAME} and {DIFFNUMFLUX_NAME} lengths differ"
        )));
    }
    let half_widths = diffnumflux.mapv(|f| 0.5 / f);
    Ok(EnergyBins {
        low: &centers - &half_widths,
        high: &centers + &half_widths,
    })
}
