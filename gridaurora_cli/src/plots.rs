use ndarray::{Array1, ArrayView1, Axis};
use plotters::prelude::*;
use std::path::PathBuf;

use libgridaurora::config::PlotConfig;
use libgridaurora::eigenprofile::Eigenprofiles;
use libgridaurora::optical_model::FilteredVer;
use libgridaurora::sim_time::format_time;
use libgridaurora::system::SystemTransmission;

pub type PlotResult = Result<(), Box<dyn std::error::Error>>;

const FONT: &str = "sans-serif";
const CAPTION_SIZE: f64 = 20.0;
const LABEL_SIZE: f64 = 12.0;
/// Beyond this many series the legend would cover the chart
const MAX_LEGEND_ENTRIES: usize = 12;

const FALLBACK_PALETTE: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

/// Everything that controls how a plot looks. Handed to the Plotter when it is made.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub font_scale: f64,
    pub palette: Vec<RGBColor>,
}

impl PlotStyle {
    pub fn from_config(config: &PlotConfig) -> Self {
        let mut palette: Vec<RGBColor> = config
            .palette
            .iter()
            .filter_map(|c| {
                let parsed = parse_hex_color(c);
                if parsed.is_none() {
                    log::warn!("Ignoring palette entry {c}, expected #rrggbb");
                }
                parsed
            })
            .collect();
        if palette.is_empty() {
            palette = FALLBACK_PALETTE.to_vec();
        }
        Self {
            output_path: config.output_path.clone(),
            width: config.width,
            height: config.height,
            font_scale: config.font_scale,
            palette,
        }
    }

    fn color(&self, idx: usize) -> RGBColor {
        self.palette[idx % self.palette.len()]
    }

    fn caption_size(&self) -> f64 {
        CAPTION_SIZE * self.font_scale
    }

    fn label_size(&self) -> f64 {
        LABEL_SIZE * self.font_scale
    }
}

fn parse_hex_color(color: &str) -> Option<RGBColor> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// File name safe version of a label
fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Limits of the positive, finite values, widened when they collapse to a point
fn positive_limits<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite() && **v > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !lo.is_finite() {
        return None;
    }
    if lo == hi {
        Some((lo / 10.0, hi * 10.0))
    } else {
        Some((lo, hi))
    }
}

/// A named line of a plot
struct Series {
    label: String,
    values: Array1<f64>,
    color: RGBColor,
}

/// Renders the run results as SVG files in the style's output directory
pub struct Plotter {
    style: PlotStyle,
}

impl Plotter {
    pub fn new(style: PlotStyle) -> Self {
        Self { style }
    }

    fn target(&self, stem: &str) -> Result<PathBuf, std::io::Error> {
        std::fs::create_dir_all(&self.style.output_path)?;
        Ok(self
            .style
            .output_path
            .join(format!("{}.svg", file_stem(stem))))
    }

    /// Every series of one system transmission table against wavelength
    pub fn plot_transmission(&self, table: &SystemTransmission) -> PlotResult {
        let series = SystemTransmission::series_names()
            .into_iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                table.series(name).map(|values| Series {
                    label: name.to_string(),
                    values: values.to_owned(),
                    color: self.style.color(idx),
                })
            })
            .collect::<Vec<_>>();
        let title = format!("{} system transmission", table.filename);
        let stem = format!("transmission_{}", table.filename);
        self.spectrum_chart(&stem, &title, table.grid().values(), &series)
    }

    /// The combined transmission of each filter, and the Rayleigh combination, on one chart
    pub fn plot_filter_comparison(&self, entries: &[(String, SystemTransmission)]) -> PlotResult {
        let Some((_, first)) = entries.first() else {
            return Ok(());
        };
        let series = entries
            .iter()
            .enumerate()
            .map(|(idx, (name, table))| Series {
                label: name.clone(),
                values: table.sys().to_owned(),
                color: self.style.color(idx),
            })
            .collect::<Vec<_>>();
        self.spectrum_chart(
            "filter_comparison",
            "Filter comparison",
            first.grid().values(),
            &series,
        )
    }

    /// VER summed over wavelength, one profile per beam energy, one file per time
    pub fn plot_ver(&self, eig: &Eigenprofiles, zlim: Option<[f64; 2]>) -> PlotResult {
        let edges = eig.energy.edges();
        for idx in 0..eig.n_times() {
            let Some(summed) = eig.ver_summed_at(idx) else {
                continue;
            };
            let series = self.energy_series(&summed.view(), &edges);
            let time = format_time(&eig.times[idx]);
            self.profile_chart(
                &format!("ver_{time}"),
                &format!("Volume emission rate per unit flux {time}"),
                "VER [photons cm^-3 sr^-1 s^-1]",
                eig.altitude_km.view(),
                &series,
                zlim,
                None,
            )?;
        }
        Ok(())
    }

    /// Production summed over reactions, one profile per beam energy, one file per time
    pub fn plot_production(
        &self,
        eig: &Eigenprofiles,
        zlim: Option<[f64; 2]>,
        vlim: [f64; 2],
    ) -> PlotResult {
        let edges = eig.energy.edges();
        let prod = eig.prod.summed();
        for (idx, t) in eig.times.iter().enumerate() {
            // (energy, altitude) to (altitude, energy)
            let by_altitude = prod.index_axis(Axis(0), idx).reversed_axes();
            let series = self.energy_series(&by_altitude, &edges);
            let time = format_time(t);
            self.profile_chart(
                &format!("production_{time}"),
                &format!("Production per unit flux {time}"),
                "Production [particle cm^-3 sr^-1 s^-1]",
                eig.altitude_km.view(),
                &series,
                zlim,
                Some(vlim),
            )?;
        }
        Ok(())
    }

    /// VER after the optics for each beam energy plus the sum the camera sees, one file per time
    pub fn plot_filtered_ver(
        &self,
        eig: &Eigenprofiles,
        filtered: &[FilteredVer],
        zlim: Option<[f64; 2]>,
    ) -> PlotResult {
        let edges = eig.energy.edges();
        for (fver, t) in filtered.iter().zip(eig.times.iter()) {
            let mut series = self.energy_series(&fver.values.view(), &edges);
            series.push(Series {
                label: String::from("camera"),
                values: fver.camera_profile(),
                color: BLACK,
            });
            let time = format_time(t);
            self.profile_chart(
                &format!("filtered_ver_{time}"),
                &format!("VER through {} optics {time}", fver.series),
                "filtered VER",
                fver.altitude_km.view(),
                &series,
                zlim,
                None,
            )?;
        }
        Ok(())
    }

    /// One series per energy column of an (altitude, energy) array, labelled by bin edges
    fn energy_series(
        &self,
        values: &ndarray::ArrayView2<f64>,
        edges: &Array1<f64>,
    ) -> Vec<Series> {
        values
            .axis_iter(Axis(1))
            .zip(edges.windows(2))
            .enumerate()
            .map(|(idx, (column, bin))| Series {
                label: format!("{:.0}-{:.0} eV", bin[0], bin[1]),
                values: column.to_owned(),
                color: self.style.color(idx),
            })
            .collect()
    }

    fn spectrum_chart(
        &self,
        stem: &str,
        title: &str,
        wavelength_nm: ArrayView1<f64>,
        series: &[Series],
    ) -> PlotResult {
        let path = self.target(stem)?;
        let n = wavelength_nm.len();
        if n == 0 {
            return Ok(());
        }
        let root =
            SVGBackend::new(&path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, self.style.caption_size()).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(wavelength_nm[0]..wavelength_nm[n - 1], 0.0..1.05)?;

        chart
            .configure_mesh()
            .x_desc("Wavelength [nm]")
            .y_desc("Transmission")
            .axis_desc_style((FONT, self.style.label_size()).into_font())
            .draw()?;

        for s in series {
            let points = wavelength_nm
                .iter()
                .zip(s.values.iter())
                .filter(|(_, t)| t.is_finite())
                .map(|(w, t)| (*w, *t));
            let color = s.color;
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(s.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }

    /// Altitude profiles with a logarithmic value axis
    #[allow(clippy::too_many_arguments)]
    fn profile_chart(
        &self,
        stem: &str,
        title: &str,
        x_desc: &str,
        altitude_km: ArrayView1<f64>,
        series: &[Series],
        zlim: Option<[f64; 2]>,
        vlim: Option<[f64; 2]>,
    ) -> PlotResult {
        let limits = match vlim {
            Some([lo, hi]) => Some((lo, hi)),
            None => positive_limits(series.iter().flat_map(|s| s.values.iter())),
        };
        let Some((v_lo, v_hi)) = limits else {
            log::warn!("Nothing positive to plot for {title}, skipping");
            return Ok(());
        };
        let (z_lo, z_hi) = match zlim {
            Some([lo, hi]) => (lo, hi),
            None => {
                let n = altitude_km.len();
                if n < 2 || !(altitude_km[n - 1] > altitude_km[0]) {
                    return Ok(());
                }
                (altitude_km[0], altitude_km[n - 1])
            }
        };

        let path = self.target(stem)?;
        let root =
            SVGBackend::new(&path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, self.style.caption_size()).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((v_lo..v_hi).log_scale(), z_lo..z_hi)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Altitude [km]")
            .x_label_formatter(&|x| format!("{x:.0e}"))
            .axis_desc_style((FONT, self.style.label_size()).into_font())
            .draw()?;

        let with_legend = series.len() <= MAX_LEGEND_ENTRIES;
        for s in series {
            let points = s
                .values
                .iter()
                .zip(altitude_km.iter())
                .filter(|(v, _)| v.is_finite() && **v > 0.0)
                .map(|(v, z)| (*v, *z));
            let color = s.color;
            let anno = chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
            if with_legend {
                anno.label(s.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }

        if with_legend {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Plot failures never end the run
pub fn report(name: &str, result: PlotResult) {
    if let Err(e) = result {
        log::warn!("Could not draw the {name} plot: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1f77b4"), Some(RGBColor(0x1f, 0x77, 0xb4)));
        assert_eq!(parse_hex_color("1f77b4"), None);
        assert_eq!(parse_hex_color("#1f77"), None);
        assert_eq!(parse_hex_color("#zz77b4"), None);
    }

    #[test]
    fn test_style_from_config() {
        let mut config = PlotConfig::default();
        let style = PlotStyle::from_config(&config);
        assert_eq!(style.palette.len(), 6);
        assert_eq!(style.color(7), style.palette[1]);

        config.palette = vec![String::from("red")];
        let style = PlotStyle::from_config(&config);
        assert_eq!(style.palette, FALLBACK_PALETTE.to_vec());
    }

    #[test]
    fn test_limits_and_stems() {
        let values = [0.0, f64::NAN, 1e-3, 2.0, -5.0];
        assert_eq!(positive_limits(values.iter()), Some((1e-3, 2.0)));
        assert_eq!(positive_limits([3.0].iter()), Some((0.3, 30.0)));
        assert_eq!(positive_limits([0.0, -1.0].iter()), None);
        assert_eq!(file_stem("ver_2013-01-31T09:00:00Z"), "ver_2013_01_31T09_00_00Z");
    }

    #[test]
    fn test_energy_series_labels() {
        let plotter = Plotter::new(PlotStyle::from_config(&PlotConfig::default()));
        let values = ndarray::Array2::<f64>::ones((4, 3));
        let edges = ndarray::array![50.0, 100.0, 200.0, 400.0];
        let series = plotter.energy_series(&values.view(), &edges);
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["50-100 eV", "100-200 eV", "200-400 eV"]);
        assert_eq!(series[2].values.len(), 4);
    }
}
