use anyhow::{Context, Result};
use config::{Config, File};
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::SamplerError;

pub const DEFAULT_CONFIG_FILE: &str = "sys-log.ini";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplerConfig {
    pub file: String,
    pub interval: String,
    pub battery: String,
    pub plot: bool,
    pub process_count: usize,
    /// Comma separated command names never reported as top processes.
    pub exclude_processes: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            file: "sys-log.csv".to_string(),
            interval: "60s".to_string(),
            battery: "BAT0".to_string(),
            plot: false,
            process_count: 20,
            exclude_processes: "ps,sensors,mpstat,cpufreq-info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub power: String,
    pub cpu_load: String,
    pub cpu_clock: String,
    pub temperature: String,
    pub cpu_window: String,
    pub generic_temperature_labels: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            power: "sensors".to_string(),
            cpu_load: "mpstat".to_string(),
            cpu_clock: "cpufreq-info".to_string(),
            temperature: "sensors".to_string(),
            cpu_window: "1s".to_string(),
            generic_temperature_labels: "Package id 0,Tctl,Tdie,CPU,Core 0,temp1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub power_supply: String,
    pub hwmon: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            power_supply: "/sys/class/power_supply".to_string(),
            hwmon: "/sys/class/hwmon".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line. They win over the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub file: Option<PathBuf>,
    pub interval: Option<String>,
    pub battery: Option<String>,
    pub plot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerBackend {
    Sensors,
    Sysfs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuLoadBackend {
    Mpstat,
    Kernel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuClockBackend {
    CpufreqInfo,
    Kernel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBackend {
    Sensors,
    Hwmon,
}

macro_rules! backend_from_str {
    ($ty:ty, $metric:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = SamplerError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    _ => Err(SamplerError::UnknownBackend {
                        metric: $metric,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

backend_from_str!(PowerBackend, "power", { "sensors" => PowerBackend::Sensors, "sysfs" => PowerBackend::Sysfs });
backend_from_str!(CpuLoadBackend, "cpu_load", { "mpstat" => CpuLoadBackend::Mpstat, "kernel" => CpuLoadBackend::Kernel });
backend_from_str!(CpuClockBackend, "cpu_clock", { "cpufreq-info" => CpuClockBackend::CpufreqInfo, "kernel" => CpuClockBackend::Kernel });
backend_from_str!(TemperatureBackend, "temperature", { "sensors" => TemperatureBackend::Sensors, "hwmon" => TemperatureBackend::Hwmon });

/// Fully resolved, immutable settings for one process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub file: PathBuf,
    pub interval: Duration,
    pub battery: String,
    pub plot: bool,
    pub process_count: usize,
    pub exclude_processes: Vec<String>,
    pub power: PowerBackend,
    pub cpu_load: CpuLoadBackend,
    pub cpu_clock: CpuClockBackend,
    pub temperature: TemperatureBackend,
    pub cpu_window: Duration,
    pub generic_temperature_labels: Vec<String>,
    pub power_supply_root: PathBuf,
    pub hwmon_root: PathBuf,
}

impl AppConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    /// Loads an INI file. A missing file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(
                File::with_name(config_path.to_str().unwrap_or(""))
                    .format(config::FileFormat::Ini)
                    .required(false),
            )
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    /// Applies command-line overrides and validates every value.
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings, SamplerError> {
        let interval = overrides
            .interval
            .as_deref()
            .unwrap_or(&self.sampler.interval);

        Ok(Settings {
            file: overrides
                .file
                .clone()
                .unwrap_or_else(|| PathBuf::from(&self.sampler.file)),
            interval: parse_interval(interval)?,
            battery: overrides
                .battery
                .clone()
                .unwrap_or_else(|| self.sampler.battery.clone()),
            plot: overrides.plot || self.sampler.plot,
            process_count: self.sampler.process_count,
            exclude_processes: split_list(&self.sampler.exclude_processes),
            power: self.sources.power.parse()?,
            cpu_load: self.sources.cpu_load.parse()?,
            cpu_clock: self.sources.cpu_clock.parse()?,
            temperature: self.sources.temperature.parse()?,
            cpu_window: parse_interval(&self.sources.cpu_window)?,
            generic_temperature_labels: split_list(&self.sources.generic_temperature_labels),
            power_supply_root: PathBuf::from(&self.paths.power_supply),
            hwmon_root: PathBuf::from(&self.paths.hwmon),
        })
    }
}

/// Parses `<integer>[s|m|h|d]`; a bare integer is seconds. Zero is rejected.
pub fn parse_interval(text: &str) -> Result<Duration, SamplerError> {
    let invalid = || SamplerError::InvalidInterval(text.to_string());
    let trimmed = text.trim();
    let (digits, multiplier) = match trimmed.char_indices().last() {
        Some((idx, 's')) => (&trimmed[..idx], 1),
        Some((idx, 'm')) => (&trimmed[..idx], 60),
        Some((idx, 'h')) => (&trimmed[..idx], 3600),
        Some((idx, 'd')) => (&trimmed[..idx], 86_400),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let seconds = value.checked_mul(multiplier).ok_or_else(invalid)?;
    if seconds == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(seconds))
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
