//! # gridaurora
//!
//! gridaurora is a set of tools for the optical side of auroral studies, written in Rust.
//! It combines optical filter, camera window, camera quantum efficiency and atmospheric
//! transmission curves into system transmission tables, compares candidate filters, and
//! produces per-energy "eigenprofiles" of volume emission rate (VER) and of ionospheric
//! production and loss from a unit input particle flux. The eigenprofiles are stored in
//! an HDF5 container and can be weighted by the system transmission to predict what a
//! filtered camera sees per beam energy.
//!
//! ## Installation
//!
//! Currently the only method of install is from source, which is laid out below.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### HDF5
//!
//! Before building and running gridaurora, HDF5 must be installed. Typically this will
//! be installed using a package manager (homebrew, apt, etc), and the Rust libraries will
//! auto detect the location of the HDF install. If a custom install is needed, write the
//! following snippet into the file `.cargo/config.toml` in the gridaurora repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./gridaurora_cli` from the top
//! level gridaurora repository. This installs the `gridaurora` binary to your cargo
//! install location (typically `~/.cargo/bin/`).
//!
//! ## Configuration
//!
//! Every tool reads a YAML configuration. A template is written by
//! `gridaurora new -p config.yml`:
//!
//! ```yml
//! filters:
//!   data_path: precompute
//!   filter_files:
//!   - BG3transmittance.h5
//!   - NE01transmittance.h5
//!   - Wratten32transmittance.h5
//!   - Wratten21transmittance.h5
//!   - HoyaV10transmittance.h5
//!   window_file: ixonWindowT.h5
//!   qe_file: emccdQE.h5
//!   atmosphere_file: null
//!   wavelength_nm: [400.0, 700.0, 0.1]
//!   obs_alt_km: 0.0
//!   zenith_angle_deg: 0.0
//! eigen:
//!   input_grid_path: zettflux.csv
//!   output_path: null
//!   sim_times: ['1999-12-21T00:00:00Z']
//!   latlon: [65.0, -148.0]
//!   model: glow
//!   model_data_path: glow_eigen.h5
//!   max_energy_ev: 100000000.0
//!   zlim: null
//!   vlim: [1.0e-7, 10.0]
//!   optical_filter: null
//!   reference_filter: null
//! plot:
//!   enabled: true
//!   output_path: plots
//!   width: 1024
//!   height: 768
//!   font_scale: 1.5
//!   palette: ['#1f77b4', '#ff7f0e', '#2ca02c', '#d62728', '#9467bd', '#8c564b']
//! ```
//!
//! Without an `output_path` the eigenprofile run only plots and does not save.
//!
//! ### Transmission files
//!
//! Filter files hold `/wavelength` (nm) and `/T`, with the filter name as the string
//! attribute `name` on `/T`. The window file holds `/lamb` and `/T`, the QE file `/lamb`
//! and `/QE`. Every curve is resampled onto the wavelength grid by log-linear
//! interpolation; outside its measured range a curve is NaN.
//!
//! ## Output
//!
//! ### HDF5 Data Format
//!
//! The eigenprofile container is laid out as follows:
//!
//! ```text
//! eigen.h5
//! |---- sensorloc(dset) - unit, description
//! |---- Ebins(dset) - unit
//! |---- Ebins_low(dset) - unit
//! |---- Ebins_high(dset) - unit
//! |---- altitude(dset) - unit
//! |---- ut1_unix(dset) - unit
//! |---- diffnumflux(dset) - unit
//! |---- ver
//! |    |---- eigenprofile(dset) - unit, size
//! |    |---- wavelength(dset) - unit
//! |---- prod
//! |    |---- eigenprofile(dset) - unit, size
//! |    |---- reaction(dset) - description
//! |---- loss
//! |    |---- eigenprofiles(dset) - unit, size
//! |    |---- reaction(dset) - description
//! |---- energydeposition(dset) - unit, size
//! ```
pub mod comparison;
pub mod config;
pub mod constants;
pub mod eigen_reader;
pub mod eigen_writer;
pub mod eigenprofile;
pub mod energy_grid;
pub mod error;
pub mod indices;
pub mod model;
pub mod optical_model;
pub mod process;
pub mod sim_time;
pub mod system;
pub mod transmission;
pub mod wavelength;
