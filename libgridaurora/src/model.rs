use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;

use super::eigen_reader::read_eigenprofiles;
use super::eigenprofile::Eigenprofiles;
use super::energy_grid::EnergyBins;
use super::error::ModelError;
use super::sim_time::{format_time, to_unix_seconds};

/// Archived times within this many seconds of a requested time are taken as a match
const TIME_MATCH_TOLERANCE_S: f64 = 0.5;
/// Relative tolerance when matching requested bin edges to the archive
const ENERGY_EDGE_TOLERANCE: f64 = 1e-9;

/// The known ionospheric models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Glow,
    Rees,
    Transcar,
}

impl FromStr for ModelKind {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "glow" => Ok(Self::Glow),
            "rees" => Ok(Self::Rees),
            "transcar" => Ok(Self::Transcar),
            _ => Err(ModelError::UnsupportedModel(s.to_string())),
        }
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glow => write!(f, "glow"),
            Self::Rees => write!(f, "rees"),
            Self::Transcar => write!(f, "transcar"),
        }
    }
}

/// What the model is asked to simulate
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub times: Vec<OffsetDateTime>,
    pub energy: EnergyBins,
    /// Geodetic latitude, longitude (deg)
    pub latlon: [f64; 2],
}

/// An ionospheric model that turns unit flux per energy bin into eigenprofiles.
///
/// Implementations must return tensors shaped time x energy x altitude x {wavelength|reaction}
/// with the requested times and energy bins.
pub trait EigenprofileModel {
    fn kind(&self) -> ModelKind;
    fn run(&self, request: &ModelRequest) -> Result<Eigenprofiles, ModelError>;
}

/// A model whose output was produced ahead of time by the external model code and archived in
/// the eigenprofile container format.
#[derive(Debug, Clone)]
pub struct ArchivedModel {
    kind: ModelKind,
    path: PathBuf,
}

impl ArchivedModel {
    pub fn new(kind: ModelKind, path: &Path) -> Result<Self, ModelError> {
        if kind == ModelKind::Transcar {
            return Err(ModelError::UnimplementedModel(kind));
        }
        if !path.exists() {
            return Err(ModelError::DataUnavailable(path.to_path_buf()));
        }
        Ok(Self {
            kind,
            path: path.to_path_buf(),
        })
    }
}

impl EigenprofileModel for ArchivedModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn run(&self, request: &ModelRequest) -> Result<Eigenprofiles, ModelError> {
        if self.kind == ModelKind::Rees && request.times.len() != 1 {
            return Err(ModelError::TooManyTimes(self.kind, request.times.len()));
        }
        let (archive, sensorloc) = read_eigenprofiles(&self.path)?;
        if archive.n_energies() != request.energy.len() {
            return Err(ModelError::EnergyBinMismatch(
                request.energy.len(),
                archive.n_energies(),
            ));
        }
        check_energy_edges(&request.energy, &archive.energy)?;
        if sensorloc != request.latlon {
            log::warn!(
                "Archived {} run is for {:?}, requested {:?}",
                self.kind,
                sensorloc,
                request.latlon
            );
        }

        let mut indices = Vec::with_capacity(request.times.len());
        for t in request.times.iter() {
            let wanted = to_unix_seconds(t);
            match archive
                .times
                .iter()
                .position(|a| (to_unix_seconds(a) - wanted).abs() <= TIME_MATCH_TOLERANCE_S)
            {
                Some(idx) => indices.push(idx),
                None => return Err(ModelError::MissingTime(format_time(t))),
            }
        }
        let mut eig = archive.select_times(&indices);
        eig.times = request.times.clone();
        eig.energy = request.energy.clone();
        eig.diffnumflux = request.energy.unit_diffnumflux();
        eig.validate()?;
        Ok(eig)
    }
}

/// The archived tensors are only valid for the bins they were computed with
fn check_energy_edges(requested: &EnergyBins, archive: &EnergyBins) -> Result<(), ModelError> {
    let close = |a: f64, b: f64| (a - b).abs() <= ENERGY_EDGE_TOLERANCE * a.abs().max(b.abs());
    for idx in 0..requested.len() {
        let wanted = [requested.low[idx], requested.high[idx]];
        let stored = [archive.low[idx], archive.high[idx]];
        if !close(wanted[0], stored[0]) || !close(wanted[1], stored[1]) {
            return Err(ModelError::EnergyEdgeMismatch(idx, wanted, stored));
        }
    }
    Ok(())
}

/// Pick the model for a selector string
pub fn model_for(selector: &str, data_path: &Path) -> Result<Box<dyn EigenprofileModel>, ModelError> {
    let kind = ModelKind::from_str(selector)?;
    Ok(Box::new(ArchivedModel::new(kind, data_path)?))
}
