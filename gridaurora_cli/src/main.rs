mod plots;

use clap::{value_parser, Arg, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use libgridaurora::config::Config;
use libgridaurora::process::{process_eigenprofiles, process_filters, process_indices};
use plots::{report, PlotStyle, Plotter};

fn make_template_config(path: &Path) -> Result<(), libgridaurora::error::ConfigError> {
    Config::default().write_config_file(path)
}

fn cli() -> Command {
    Command::new("gridaurora")
        .about("Optical filter transmission and auroral eigenprofile tools")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("filters")
                .about("Compare the system transmission of the optical filters")
                .arg(
                    Arg::new("wlnm")
                        .long("wlnm")
                        .num_args(3)
                        .value_names(["START", "STOP", "STEP"])
                        .value_parser(value_parser!(f64))
                        .help("Wavelength grid in nm"),
                )
                .arg(
                    Arg::new("altkm")
                        .long("altkm")
                        .value_parser(value_parser!(f64))
                        .help("Observer altitude in km"),
                )
                .arg(
                    Arg::new("zenang")
                        .long("zenang")
                        .value_parser(value_parser!(f64))
                        .help("Observer zenith angle in degrees"),
                ),
        )
        .subcommand(
            Command::new("eigen")
                .about("Make eigenprofiles for unit flux in each energy bin")
                .arg(
                    Arg::new("simtime")
                        .long("simtime")
                        .num_args(1..=2)
                        .help("Simulation time, or a start/end pair expanded hourly"),
                )
                .arg(
                    Arg::new("latlon")
                        .long("latlon")
                        .num_args(2)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Geodetic latitude and longitude in degrees"),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .help("Ionospheric model: glow, rees or transcar"),
                )
                .arg(
                    Arg::new("outfn")
                        .long("outfn")
                        .help("HDF5 file to write the eigenprofiles to"),
                )
                .arg(
                    Arg::new("vlim")
                        .long("vlim")
                        .num_args(2)
                        .value_parser(value_parser!(f64))
                        .help("Plot value limits"),
                )
                .arg(
                    Arg::new("zlim")
                        .short('z')
                        .long("zlim")
                        .num_args(2)
                        .value_parser(value_parser!(f64))
                        .help("Altitude plot limits in km"),
                )
                .arg(
                    Arg::new("inputgridfn")
                        .short('i')
                        .long("inputgridfn")
                        .help("Reference energy grid CSV (low,high eV per row)"),
                ),
        )
        .subcommand(
            Command::new("indices")
                .about("Look up the monthly Ap and F10.7 indices")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .required(true)
                        .help("Date of interest"),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .default_value("RecentIndices.txt")
                        .help("NOAA SWPC RecentIndices.txt"),
                ),
        )
}

fn many_f64<const N: usize>(matches: &ArgMatches, id: &str) -> Option<[f64; N]> {
    let values: Vec<f64> = matches.get_many::<f64>(id)?.copied().collect();
    values.try_into().ok()
}

/// Command line values take precedence over the configuration file
fn apply_overrides(config: &mut Config, command: &str, matches: &ArgMatches) {
    match command {
        "filters" => {
            if let Some(wlnm) = many_f64::<3>(matches, "wlnm") {
                config.filters.wavelength_nm = wlnm;
            }
            if let Some(altkm) = matches.get_one::<f64>("altkm") {
                config.filters.obs_alt_km = *altkm;
            }
            if let Some(zenang) = matches.get_one::<f64>("zenang") {
                config.filters.zenith_angle_deg = *zenang;
            }
        }
        "eigen" => {
            if let Some(simtime) = matches.get_many::<String>("simtime") {
                config.eigen.sim_times = simtime.cloned().collect();
            }
            if let Some(latlon) = many_f64::<2>(matches, "latlon") {
                config.eigen.latlon = latlon;
            }
            if let Some(model) = matches.get_one::<String>("model") {
                config.eigen.model = model.clone();
            }
            if let Some(outfn) = matches.get_one::<String>("outfn") {
                config.eigen.output_path = Some(PathBuf::from(outfn));
            }
            if let Some(vlim) = many_f64::<2>(matches, "vlim") {
                config.eigen.vlim = vlim;
            }
            if let Some(zlim) = many_f64::<2>(matches, "zlim") {
                config.eigen.zlim = Some(zlim);
            }
            if let Some(grid) = matches.get_one::<String>("inputgridfn") {
                config.eigen.input_grid_path = PathBuf::from(grid);
            }
        }
        _ => (),
    }
}

fn run_filters(config: &Config, pb: &ProgressBar) -> bool {
    let entries = match process_filters(&config.filters, &mut |p: f32| {
        pb.set_position((p * 100.0) as u64)
    }) {
        Ok(e) => e,
        Err(e) => {
            log::error!("Filter comparison failed with error: {e}");
            return false;
        }
    };
    log::info!("Compared {} transmission tables", entries.len());

    if config.plot.enabled {
        let plotter = Plotter::new(PlotStyle::from_config(&config.plot));
        for (name, table) in entries.iter() {
            report(name, plotter.plot_transmission(table));
        }
        report("filter comparison", plotter.plot_filter_comparison(&entries));
    }
    true
}

fn run_eigen(config: &Config, pb: &ProgressBar) -> bool {
    let run = match process_eigenprofiles(config, &mut |p: f32| {
        pb.set_position((p * 100.0) as u64)
    }) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Eigenprofile generation failed with error: {e}");
            return false;
        }
    };
    if let Some(path) = &run.written {
        log::info!("Eigenprofiles written to {}", path.display());
    }

    if config.plot.enabled {
        let plotter = Plotter::new(PlotStyle::from_config(&config.plot));
        let zlim = config.eigen.zlim;
        report("VER", plotter.plot_ver(&run.eigenprofiles, zlim));
        report(
            "production",
            plotter.plot_production(&run.eigenprofiles, zlim, config.eigen.vlim),
        );
        if let Some(filtered) = &run.filtered {
            report(
                "filtered VER",
                plotter.plot_filtered_ver(&run.eigenprofiles, filtered, zlim),
            );
        }
    }
    true
}

fn main() -> ExitCode {
    // Create a cli
    let matches = cli().get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    let (command, sub_matches) = match matches.subcommand() {
        Some(sub) => sub,
        None => {
            log::error!("No command given, see gridaurora --help");
            return ExitCode::FAILURE;
        }
    };
    let config_path = sub_matches.get_one::<String>("path").map(PathBuf::from);

    if command == "indices" {
        let date = sub_matches
            .get_one::<String>("date")
            .map(String::as_str)
            .unwrap_or_default();
        let file = sub_matches
            .get_one::<String>("file")
            .map(PathBuf::from)
            .unwrap_or_default();
        return match process_indices(date, &file) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let config_path = match config_path {
        Some(p) => p,
        None => {
            log::error!("The {command} command needs a configuration file, given with -p");
            return ExitCode::FAILURE;
        }
    };

    if command == "new" {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        return match make_template_config(&config_path) {
            Ok(()) => {
                log::info!("Done.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let mut config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    apply_overrides(&mut config, command, sub_matches);
    if let Err(e) = config.check() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    log::info!("Config successfully loaded.");
    log::info!(
        "Transmission data Path: {}",
        config.filters.data_path.to_string_lossy()
    );

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let success = match command {
        "filters" => run_filters(&config, &pb),
        "eigen" => run_eigen(&config, &pb),
        other => {
            log::error!("Unknown command {other}");
            false
        }
    };
    pb.finish();

    if success {
        log::info!("Done.");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let matches = cli()
            .try_get_matches_from([
                "gridaurora",
                "eigen",
                "-p",
                "config.yml",
                "--simtime",
                "2013-01-31T09:00:00Z",
                "2013-01-31T12:00:00Z",
                "--latlon",
                "65.1",
                "-147.5",
                "--outfn",
                "eigen.h5",
                "-z",
                "90",
                "300",
                "-i",
                "grid.csv",
            ])
            .unwrap();
        let (command, sub) = matches.subcommand().unwrap();
        assert_eq!(
            sub.get_one::<String>("path").map(String::as_str),
            Some("config.yml")
        );
        let mut config = Config::default();
        apply_overrides(&mut config, command, sub);
        assert_eq!(config.eigen.sim_times.len(), 2);
        assert_eq!(config.eigen.latlon, [65.1, -147.5]);
        assert_eq!(config.eigen.output_path, Some(PathBuf::from("eigen.h5")));
        assert_eq!(config.eigen.model, "glow");
        assert_eq!(config.eigen.zlim, Some([90.0, 300.0]));
        assert_eq!(config.eigen.input_grid_path, PathBuf::from("grid.csv"));
    }

    #[test]
    fn test_cli_wavelength_override() {
        let matches = cli()
            .try_get_matches_from([
                "gridaurora", "-p", "config.yml", "filters", "--wlnm", "200", "1200", "0.1",
            ])
            .unwrap();
        let (command, sub) = matches.subcommand().unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, command, sub);
        assert_eq!(config.filters.wavelength_nm, [200.0, 1200.0, 0.1]);
    }
}
