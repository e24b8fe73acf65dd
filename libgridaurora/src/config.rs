use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::DEFAULT_MAX_ENERGY_EV;
use super::error::{ConfigError, GridError};
use super::wavelength::WavelengthGrid;

/// Filter comparison settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory holding the transmission files
    pub data_path: PathBuf,
    pub filter_files: Vec<PathBuf>,
    pub window_file: PathBuf,
    pub qe_file: PathBuf,
    /// Precomputed atmospheric transmission. Without it the atmosphere is transparent.
    pub atmosphere_file: Option<PathBuf>,
    /// START STOP STEP in nm
    pub wavelength_nm: [f64; 3],
    pub obs_alt_km: f64,
    pub zenith_angle_deg: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("precompute"),
            filter_files: vec![
                PathBuf::from("BG3transmittance.h5"),
                PathBuf::from("NE01transmittance.h5"),
                PathBuf::from("Wratten32transmittance.h5"),
                PathBuf::from("Wratten21transmittance.h5"),
                PathBuf::from("HoyaV10transmittance.h5"),
            ],
            window_file: PathBuf::from("ixonWindowT.h5"),
            qe_file: PathBuf::from("emccdQE.h5"),
            atmosphere_file: None,
            wavelength_nm: [400.0, 700.0, 0.1],
            obs_alt_km: 0.0,
            zenith_angle_deg: 0.0,
        }
    }
}

impl FilterConfig {
    /// Resolve a transmission file relative to the data directory
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_path.join(file)
        }
    }

    pub fn filter_paths(&self) -> Vec<PathBuf> {
        self.filter_files.iter().map(|f| self.resolve(f)).collect()
    }

    pub fn wavelength_grid(&self) -> Result<WavelengthGrid, GridError> {
        let [start, stop, step] = self.wavelength_nm;
        WavelengthGrid::from_range(start, stop, step)
    }
}

/// Eigenprofile generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EigenConfig {
    /// Reference energy grid the unit flux bins are extrapolated from
    pub input_grid_path: PathBuf,
    /// Container to write. Without it the run only plots.
    pub output_path: Option<PathBuf>,
    /// One ISO-8601 time, or a start/end pair expanded hourly
    pub sim_times: Vec<String>,
    /// Geodetic latitude, longitude (deg)
    pub latlon: [f64; 2],
    /// glow, rees or transcar
    pub model: String,
    /// Archived output of the external model run
    pub model_data_path: PathBuf,
    pub max_energy_ev: f64,
    /// Altitude plot limits (km)
    pub zlim: Option<[f64; 2]>,
    /// Plot value limits for energy deposition and production
    pub vlim: [f64; 2],
    /// Transmission series applied to the VER: sys, sysNObg3, bg3 or none.
    /// When set, the window, QE and filter files of the filter settings are required.
    pub optical_filter: Option<String>,
    /// Filter whose system transmission is applied to the VER
    pub reference_filter: Option<String>,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self {
            input_grid_path: PathBuf::from("zettflux.csv"),
            output_path: None,
            sim_times: vec![String::from("1999-12-21T00:00:00Z")],
            latlon: [65.0, -148.0],
            model: String::from("glow"),
            model_data_path: PathBuf::from("glow_eigen.h5"),
            max_energy_ev: DEFAULT_MAX_ENERGY_EV,
            zlim: None,
            vlim: [1e-7, 1e1],
            optical_filter: None,
            reference_filter: None,
        }
    }
}

/// Plot style handed to the plotting collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub font_scale: f64,
    /// Line colours as #rrggbb
    pub palette: Vec<String>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_path: PathBuf::from("plots"),
            width: 1024,
            height: 768,
            font_scale: 1.5,
            palette: vec![
                String::from("#1f77b4"),
                String::from("#ff7f0e"),
                String::from("#2ca02c"),
                String::from("#d62728"),
                String::from("#9467bd"),
                String::from("#8c564b"),
            ],
        }
    }
}

/// Structure representing the application configuration.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub filters: FilterConfig,
    pub eigen: EigenConfig,
    pub plot: PlotConfig,
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.check()?;
        Ok(config)
    }

    /// Write the configuration as YAML
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Sanity checks that serde cannot express
    pub fn check(&self) -> Result<(), ConfigError> {
        let [lat, lon] = self.eigen.latlon;
        if !(-90.0..=90.0).contains(&lat) || !(-360.0..=360.0).contains(&lon) {
            return Err(ConfigError::BadValue(format!(
                "latlon {lat},{lon} is not a geodetic position"
            )));
        }
        if self.eigen.sim_times.is_empty() || self.eigen.sim_times.len() > 2 {
            return Err(ConfigError::BadValue(format!(
                "sim_times needs one time or a start/end pair, got {}",
                self.eigen.sim_times.len()
            )));
        }
        if self.plot.font_scale <= 0.0 {
            return Err(ConfigError::BadValue(String::from(
                "font_scale must be positive",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let mut config = Config::default();
        config.eigen.output_path = Some(PathBuf::from("/tmp/eigen.h5"));
        config.write_config_file(&path).unwrap();
        let back = Config::read_config_file(&path).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "filters:\n  wavelength_nm: [200.0, 1200.0, 0.1]\n";
        let config = serde_yaml::from_str::<Config>(yaml).unwrap();
        assert_eq!(config.filters.wavelength_nm, [200.0, 1200.0, 0.1]);
        assert_eq!(config.filters.filter_files.len(), 5);
        assert_eq!(config.eigen.model, "glow");
        assert_eq!(
            config.filters.resolve(Path::new("emccdQE.h5")),
            PathBuf::from("precompute/emccdQE.h5")
        );
    }

    #[test]
    fn test_bad_values() {
        let mut config = Config::default();
        config.eigen.latlon = [165.0, 0.0];
        assert!(matches!(config.check(), Err(ConfigError::BadValue(_))));
        assert!(matches!(
            Config::read_config_file(Path::new("/nonexistent/config.yml")),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
