use std::path::PathBuf;
use thiserror::Error;

use super::model::ModelKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GridError {
    #[error("Wavelength grid step must be positive and finite, got {0}")]
    BadStep(f64),
    #[error("Wavelength grid bounds must be finite with start <= stop, got start={0} stop={1}")]
    BadBounds(f64, f64),
    #[error("Wavelength grid is empty")]
    Empty,
    #[error("Wavelength grid must be strictly increasing; value {1} at index {0} breaks the order")]
    NotIncreasing(usize, f64),
    #[error("Wavelength grid would have {0} points, more than the limit of {1}")]
    TooManyPoints(f64, usize),
}

#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("Transmission data unavailable: file {0:?} does not exist or is not readable HDF5")]
    DataUnavailable(PathBuf),
    #[error("Transmission file {0:?} does not contain the dataset {1}")]
    MissingDataset(PathBuf, String),
    #[error("Transmission curve {0} has {1} wavelengths but {2} values")]
    LengthMismatch(String, usize, usize),
    #[error("Transmission curve {0} native wavelength axis is invalid: {1}")]
    BadNativeGrid(String, GridError),
    #[error("Transmission failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
}

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Filter comparison is missing the required input filter {0}")]
    MissingComparisonInput(String),
    #[error("Filter comparison input {0} is not on the same wavelength grid as {1}")]
    GridMismatch(String, String),
}

#[derive(Debug, Error)]
pub enum EnergyGridError {
    #[error("Energy grid unavailable: file {0:?} does not exist")]
    DataUnavailable(PathBuf),
    #[error("Energy grid failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Energy grid failed to parse a float: {0}")]
    ParsingError(#[from] std::num::ParseFloatError),
    #[error("Energy grid line {0} does not have the low,high format")]
    BadFileFormat(usize),
    #[error("Energy grid needs at least 2 bins for regression, found {0}")]
    InsufficientData(usize),
    #[error("Energy grid bin {0} is not positive and increasing")]
    NotIncreasing(usize),
    #[error("Energy grid maximum energy {0} eV is not above the reference grid")]
    BadMaxEnergy(f64),
}

#[derive(Debug, Error)]
pub enum SimTimeError {
    #[error("Could not parse simulation time {0:?}: {1}")]
    BadTime(String, String),
    #[error("Simulation times must be one time or a start/end pair, got {0} values")]
    BadCount(usize),
    #[error("Simulation end time {1} precedes start time {0}")]
    Reversed(String, String),
    #[error("Unix time {0} cannot be represented as a date")]
    BadUnixTime(f64),
}

#[derive(Debug, Error)]
pub enum EigenprofileError {
    #[error("Eigenprofile {0} has shape {1:?}, expected {2:?}")]
    ShapeMismatch(String, Vec<usize>, Vec<usize>),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unsupported eigenprofile model: {0}")]
    UnsupportedModel(String),
    #[error("Eigenprofile model {0} is recognized but not implemented")]
    UnimplementedModel(ModelKind),
    #[error("Eigenprofile model output unavailable: file {0:?} does not exist")]
    DataUnavailable(PathBuf),
    #[error("Eigenprofile model {0} only handles one simulation time, got {1}")]
    TooManyTimes(ModelKind, usize),
    #[error("Eigenprofile model archive has {1} energy bins but {0} were requested")]
    EnergyBinMismatch(usize, usize),
    #[error("Eigenprofile model archive bin {0} spans {2:?} eV but {1:?} eV was requested")]
    EnergyEdgeMismatch(usize, [f64; 2], [f64; 2]),
    #[error("Eigenprofile model archive has no data for simulation time {0}")]
    MissingTime(String),
    #[error("Eigenprofile model failed due to reader error: {0}")]
    ReaderError(#[from] EigenReaderError),
    #[error("Eigenprofile model failed due to eigenprofile error: {0}")]
    EigenprofileError(#[from] EigenprofileError),
}

#[derive(Debug, Error)]
pub enum EigenWriterError {
    #[error("EigenWriter cannot write {0:?} because the parent directory does not exist")]
    BadOutputPath(PathBuf),
    #[error("EigenWriter failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("EigenWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("EigenWriter failed due to eigenprofile error: {0}")]
    EigenprofileError(#[from] EigenprofileError),
    #[error("EigenWriter could not encode text {0:?}")]
    BadText(String),
}

#[derive(Debug, Error)]
pub enum EigenReaderError {
    #[error("EigenReader cannot open {0:?} because it does not exist")]
    DataUnavailable(PathBuf),
    #[error("EigenReader failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("EigenReader found an invalid container: {0}")]
    BadContainer(String),
    #[error("EigenReader failed due to time error: {0}")]
    TimeError(#[from] SimTimeError),
    #[error("EigenReader failed due to eigenprofile error: {0}")]
    EigenprofileError(#[from] EigenprofileError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ApplicatorError {
    #[error("VER wavelength axis ({0} points) does not match the transmission grid ({1} points)")]
    GridLengthMismatch(usize, usize),
    #[error("VER wavelength {1} nm at index {0} does not match transmission grid value {2} nm")]
    GridMismatch(usize, f64, f64),
    #[error("VER tensor has no time index {0}")]
    BadTimeIndex(usize),
}

#[derive(Debug, Error)]
pub enum IndicesError {
    #[error("Geophysical indices unavailable: file {0:?} does not exist; download from ftp://ftp.swpc.noaa.gov/pub/weekly/RecentIndices.txt")]
    DataUnavailable(PathBuf),
    #[error("Geophysical indices failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Geophysical indices line {0} has too few columns")]
    BadFileFormat(usize),
    #[error("Geophysical indices failed to parse a number on line {0}: {1}")]
    ParsingError(usize, String),
    #[error("Geophysical indices have no entry for {0:04}-{1:02}")]
    MonthNotFound(i32, u8),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has an invalid value: {0}")]
    BadValue(String),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to wavelength grid error: {0}")]
    GridError(#[from] GridError),
    #[error("Processor failed due to Transmission error: {0}")]
    TransmissionError(#[from] TransmissionError),
    #[error("Processor failed due to Comparison error: {0}")]
    ComparisonError(#[from] ComparisonError),
    #[error("Processor failed due to EnergyGrid error: {0}")]
    EnergyGridError(#[from] EnergyGridError),
    #[error("Processor failed due to SimTime error: {0}")]
    SimTimeError(#[from] SimTimeError),
    #[error("Processor failed due to Model error: {0}")]
    ModelError(#[from] ModelError),
    #[error("Processor failed due to EigenWriter error: {0}")]
    EigenWriterError(#[from] EigenWriterError),
    #[error("Processor failed due to Applicator error: {0}")]
    ApplicatorError(#[from] ApplicatorError),
    #[error("Processor failed due to Indices error: {0}")]
    IndicesError(#[from] IndicesError),
}
