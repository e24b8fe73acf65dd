use std::path::{Path, PathBuf};

use super::comparison::compare_filters;
use super::config::{Config, FilterConfig};
use super::eigen_writer::write_eigenprofiles;
use super::eigenprofile::Eigenprofiles;
use super::energy_grid::{extrapolate, read_reference_grid};
use super::error::ProcessorError;
use super::indices::{read_monthly_ap_f107, ApF107};
use super::model::{model_for, ModelRequest};
use super::optical_model::{apply_to_eigenprofiles, FilteredVer};
use super::sim_time::{expand_sim_times, format_time, parse_time};
use super::system::SystemTransmission;
use super::transmission::{ElementKind, TransmissionCurve};
use super::wavelength::WavelengthGrid;

/// Everything an eigenprofile run produced, for the plotting side
#[derive(Debug, Clone)]
pub struct EigenRun {
    pub eigenprofiles: Eigenprofiles,
    pub sensorloc: [f64; 2],
    pub written: Option<PathBuf>,
    pub filtered: Option<Vec<FilteredVer>>,
}

/// Load the elements shared by every filter: window, quantum efficiency and, if configured,
/// the atmosphere
fn load_optics(config: &FilterConfig) -> Result<Vec<TransmissionCurve>, ProcessorError> {
    let mut optics = vec![
        TransmissionCurve::read(&config.resolve(&config.window_file), ElementKind::Window)?,
        TransmissionCurve::read(
            &config.resolve(&config.qe_file),
            ElementKind::QuantumEfficiency,
        )?,
    ];
    if let Some(atm) = &config.atmosphere_file {
        optics.push(TransmissionCurve::read(
            &config.resolve(atm),
            ElementKind::Atmosphere,
        )?);
    }
    Ok(optics)
}

fn load_filter(path: &Path) -> Result<TransmissionCurve, ProcessorError> {
    Ok(TransmissionCurve::read(
        path,
        ElementKind::Filter(String::new()),
    )?)
}

/// Build the system transmission of every configured filter, then the filter comparison.
///
/// `on_progress` receives the fraction of filters done.
pub fn process_filters(
    config: &FilterConfig,
    on_progress: &mut dyn FnMut(f32),
) -> Result<Vec<(String, SystemTransmission)>, ProcessorError> {
    let grid = config.wavelength_grid()?;
    log::info!(
        "Wavelength grid {} to {} nm, {} points",
        grid.first(),
        grid.last(),
        grid.len()
    );
    log::info!(
        "Observer altitude {} km, zenith angle {} deg",
        config.obs_alt_km,
        config.zenith_angle_deg
    );
    let optics = load_optics(config)?;

    let paths = config.filter_paths();
    let mut tables = Vec::with_capacity(paths.len());
    for (idx, path) in paths.iter().enumerate() {
        let filter = load_filter(path)?;
        let name = filter.kind.to_string();
        let mut elements = optics.clone();
        elements.push(filter);
        tables.push(SystemTransmission::compose(&grid, &elements, Some(&name)));
        on_progress((idx + 1) as f32 / paths.len() as f32);
    }

    Ok(compare_filters(tables)?)
}

/// System transmission on the VER wavelength axis, for applying the optical model
fn system_for_ver(
    config: &FilterConfig,
    eig: &Eigenprofiles,
    reference_filter: Option<&str>,
) -> Result<SystemTransmission, ProcessorError> {
    let grid = WavelengthGrid::from_values(eig.wavelength_nm())?;
    let mut elements = load_optics(config)?;
    if reference_filter.is_some() {
        for path in config.filter_paths() {
            elements.push(load_filter(&path)?);
        }
    }
    Ok(SystemTransmission::compose(
        &grid,
        &elements,
        reference_filter,
    ))
}

/// The eigenprofile pipeline: simulation times and unit flux energy bins, the ionospheric model,
/// the container (when an output path is configured) and optionally the optical model.
///
/// `on_progress` receives the fraction of the pipeline done.
pub fn process_eigenprofiles(
    config: &Config,
    on_progress: &mut dyn FnMut(f32),
) -> Result<EigenRun, ProcessorError> {
    let eigen = &config.eigen;
    let times = expand_sim_times(&eigen.sim_times)?;
    log::info!(
        "{} simulation times from {} to {}",
        times.len(),
        format_time(&times[0]),
        format_time(&times[times.len() - 1])
    );

    let reference = read_reference_grid(&eigen.input_grid_path)?;
    let energy = extrapolate(&reference, eigen.max_energy_ev)?;
    on_progress(0.1);

    let model = model_for(&eigen.model, &eigen.model_data_path)?;
    log::info!("Running {} model", model.kind());
    let request = ModelRequest {
        times,
        energy,
        latlon: eigen.latlon,
    };
    let eigenprofiles = model.run(&request)?;
    on_progress(0.6);

    let written = write_eigenprofiles(
        eigen.output_path.as_deref(),
        &eigenprofiles,
        eigen.latlon,
    )?;
    if written.is_none() {
        log::info!("No output file was specified, so results are only plotted and not saved");
    }
    on_progress(0.8);

    let filtered = match &eigen.optical_filter {
        Some(series) => {
            let table = system_for_ver(
                &config.filters,
                &eigenprofiles,
                eigen.reference_filter.as_deref(),
            )?;
            Some(apply_to_eigenprofiles(&eigenprofiles, &table, series)?)
        }
        None => None,
    };
    on_progress(1.0);

    Ok(EigenRun {
        eigenprofiles,
        sensorloc: eigen.latlon,
        written,
        filtered,
    })
}

/// Look up Ap and F10.7 for the month of `date`
pub fn process_indices(date: &str, path: &Path) -> Result<ApF107, ProcessorError> {
    let date = parse_time(date)?;
    let indices = read_monthly_ap_f107(&date, path)?;
    log::info!(
        "{:04}-{:02}: F10.7 observed {} smoothed {}, Ap observed {} smoothed {}",
        indices.year,
        indices.month,
        indices.f107_observed,
        indices.f107_smoothed,
        indices.ap_observed,
        indices.ap_smoothed
    );
    Ok(indices)
}
