use clap::Parser;
use log::warn;
use std::path::PathBuf;

use crate::config::{Overrides, DEFAULT_CONFIG_FILE};

/// Periodically log battery charge, power draw, CPU load and clock,
/// temperature and the busiest processes to a `;` separated file.
///
/// Positional arguments (FILE INTERVAL BATTERY) are only used when none of
/// -f, -i, -b or -p is given.
#[derive(Parser, Debug, Default)]
#[command(name = "sys-log", version)]
pub struct Cli {
    /// Log file to append to [default: sys-log.csv]
    #[arg(short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Time between samples, e.g. 30s, 5m, 1h, 1d [default: 60s]
    #[arg(short = 'i', value_name = "INTERVAL")]
    pub interval: Option<String>,

    /// Battery identifier under /sys/class/power_supply [default: BAT0]
    #[arg(short = 'b', value_name = "BATTERY")]
    pub battery: Option<String>,

    /// Render a PNG chart next to the log file after every sample
    #[arg(short = 'p')]
    pub plot: bool,

    /// Configuration file
    #[arg(short = 'c', long = "config", value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[arg(value_name = "FILE", hide = true)]
    pub file_pos: Option<PathBuf>,

    #[arg(value_name = "INTERVAL", hide = true)]
    pub interval_pos: Option<String>,

    #[arg(value_name = "BATTERY", hide = true)]
    pub battery_pos: Option<String>,
}

impl Cli {
    fn uses_flags(&self) -> bool {
        self.file.is_some() || self.interval.is_some() || self.battery.is_some() || self.plot
    }

    fn has_positionals(&self) -> bool {
        self.file_pos.is_some() || self.interval_pos.is_some() || self.battery_pos.is_some()
    }

    /// Settings taken from the command line. Positionals only count when no
    /// flag was given; mixing the two drops the positionals with a warning.
    pub fn overrides(&self) -> Overrides {
        if self.uses_flags() {
            if self.has_positionals() {
                warn!("Positional arguments are ignored when flags are used");
            }
            Overrides {
                file: self.file.clone(),
                interval: self.interval.clone(),
                battery: self.battery.clone(),
                plot: self.plot,
            }
        } else {
            Overrides {
                file: self.file_pos.clone(),
                interval: self.interval_pos.clone(),
                battery: self.battery_pos.clone(),
                plot: false,
            }
        }
    }
}
