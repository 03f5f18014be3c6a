use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::models::Sample;
use crate::renderer::colours::Colours;
use crate::store::LogStore;

mod colours;
mod drawing;

/// Produces a chart artifact from a log file.
pub trait Renderer: Send + Sync {
    /// Renders `log` and returns the path of the artifact written.
    fn render(&self, log: &Path) -> Result<PathBuf>;
}

/// Chart path for a log: same base name, `.png` extension. A log that is
/// itself named `*.png` gets `.png` appended so the chart never replaces it.
pub fn chart_path(log: &Path) -> PathBuf {
    let out = log.with_extension("png");
    if out != log {
        return out;
    }
    let mut name = log.as_os_str().to_owned();
    name.push(".png");
    PathBuf::from(name)
}

/// Line chart of battery %, CPU %, temperature and power over every row of
/// the log. Percentages and °C share a 0-100 scale; power is scaled to its
/// own maximum.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            margin: 20,
        }
    }
}

impl ChartRenderer {
    pub fn draw(&self, samples: &[Sample]) -> RgbaImage {
        let colours = Colours::default();
        let mut image = RgbaImage::from_pixel(self.width, self.height, colours.background);

        let plot_w = self.width.saturating_sub(2 * self.margin).max(1);
        let plot_h = self.height.saturating_sub(2 * self.margin).max(1);

        for step in 1..4 {
            let y = self.margin + plot_h * step / 4;
            drawing::horizontal_line(&mut image, self.margin, y, plot_w, colours.grid);
        }
        drawing::frame(&mut image, self.margin, self.margin, plot_w, plot_h, colours.frame);

        let max_power = samples
            .iter()
            .filter_map(|s| s.power_watts)
            .fold(0.0_f64, f64::max);

        let series: [(Vec<Option<f64>>, Rgba<u8>); 4] = [
            (samples.iter().map(|s| s.battery_percent.map(f64::from)).collect(), colours.battery),
            (samples.iter().map(|s| s.cpu_util_percent).collect(), colours.cpu),
            (samples.iter().map(|s| s.temperature_celsius).collect(), colours.temperature),
            (
                samples
                    .iter()
                    .map(|s| {
                        s.power_watts
                            .filter(|_| max_power > 0.0)
                            .map(|w| w / max_power * 100.0)
                    })
                    .collect(),
                colours.power,
            ),
        ];

        let last = samples.len().saturating_sub(1).max(1) as f32;
        for (values, colour) in series.iter() {
            let points: Vec<Option<(f32, f32)>> = values
                .iter()
                .enumerate()
                .map(|(idx, value)| {
                    value.map(|v| {
                        let x = self.margin as f32 + idx as f32 / last * plot_w as f32;
                        let fraction = (v.clamp(0.0, 100.0) / 100.0) as f32;
                        let y = (self.margin + plot_h) as f32 - fraction * plot_h as f32;
                        (x, y)
                    })
                })
                .collect();
            drawing::polyline(&mut image, &points, *colour);
        }

        image
    }
}

impl Renderer for ChartRenderer {
    fn render(&self, log: &Path) -> Result<PathBuf> {
        let start = Instant::now();
        let samples = LogStore::new(log)
            .rows()
            .with_context(|| format!("Failed to read log {}", log.display()))?;
        if samples.len() < 2 {
            bail!("need at least two samples to draw a chart, have {}", samples.len());
        }

        let out = chart_path(log);
        self.draw(&samples)
            .save(&out)
            .with_context(|| format!("Failed to save chart to {}", out.display()))?;
        debug!("chart render took: {} ms", start.elapsed().as_millis());
        Ok(out)
    }
}
