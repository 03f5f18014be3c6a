use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::System as SysInfo;
use systemstat::{Platform, System};

use crate::collectors::command::run_tool;
use crate::collectors::MetricSource;
use crate::error::Tool;
use crate::models::{MetricKind, Reading};

pub const MPSTAT: Tool = Tool {
    program: "mpstat",
    package: "sysstat",
};

pub const CPUFREQ_INFO: Tool = Tool {
    program: "cpufreq-info",
    package: "cpufrequtils",
};

/// `%idle` of the `Average:` line of `mpstat` output. The column is located
/// through the header so extra or missing columns on other sysstat versions
/// do not shift it.
pub fn mpstat_idle(output: &str) -> Option<String> {
    let lines: Vec<Vec<&str>> = output
        .lines()
        .map(|line| line.split_whitespace().collect())
        .collect();

    let average = lines
        .iter()
        .find(|fields| fields.first() == Some(&"Average:"))?;
    let from_end = lines
        .iter()
        .find_map(|fields| {
            fields
                .iter()
                .position(|f| *f == "%idle")
                .map(|idx| fields.len() - 1 - idx)
        })
        .unwrap_or(0);

    let idx = average.len().checked_sub(from_end + 1)?;
    Some(average[idx].to_string())
}

/// CPU load over a fixed window from `mpstat <window> 1`.
#[derive(Debug, Clone)]
pub struct MpstatLoad {
    window: Duration,
}

impl MpstatLoad {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl MetricSource for MpstatLoad {
    fn kind(&self) -> MetricKind {
        MetricKind::CpuLoad
    }

    fn tools(&self) -> Vec<Tool> {
        vec![MPSTAT]
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let window = self.window.as_secs().max(1).to_string();
            let output = run_tool(MPSTAT.program, &[&window, "1"]).await;
            Reading::from_output(output.as_deref().and_then(mpstat_idle))
        }
        .boxed()
    }
}

/// CPU load from the kernel counters, measured over the same window.
#[derive(Debug, Clone)]
pub struct KernelLoad {
    window: Duration,
}

impl KernelLoad {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl MetricSource for KernelLoad {
    fn kind(&self) -> MetricKind {
        MetricKind::CpuLoad
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        let window = self.window;
        async move {
            let start = Instant::now();
            let measured = tokio::task::spawn_blocking(move || {
                let measurement = System::new().cpu_load_aggregate();
                std::thread::sleep(window);
                measurement?.done()
            })
            .await;
            let result = match measured {
                Ok(Ok(cpu)) => Reading::Primary(format!("{:.2}", cpu.idle * 100.0)),
                Ok(Err(x)) => {
                    error!("CPU load measurement error: {}", x);
                    Reading::Unavailable
                }
                Err(x) => {
                    error!("CPU load task failed: {}", x);
                    Reading::Unavailable
                }
            };
            debug!("kernel cpu load took: {} ms", start.elapsed().as_millis());
            result
        }
        .boxed()
    }
}

/// Current frequency of the first core from `cpufreq-info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpufreqClock;

impl MetricSource for CpufreqClock {
    fn kind(&self) -> MetricKind {
        MetricKind::CpuClock
    }

    fn tools(&self) -> Vec<Tool> {
        vec![CPUFREQ_INFO]
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let output = run_tool(CPUFREQ_INFO.program, &["-c", "0", "-f", "-m"]).await;
            Reading::from_output(output)
        }
        .boxed()
    }
}

/// Frequency of the first core as reported by the kernel, in MHz.
pub struct KernelClock {
    system: Mutex<SysInfo>,
}

impl KernelClock {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(SysInfo::new()),
        }
    }
}

impl Default for KernelClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for KernelClock {
    fn kind(&self) -> MetricKind {
        MetricKind::CpuClock
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            let start = Instant::now();
            let frequency = match self.system.lock() {
                Ok(mut sys) => {
                    sys.refresh_cpu_frequency();
                    sys.cpus().first().map(|cpu| cpu.frequency())
                }
                Err(_) => None,
            };
            debug!("kernel cpu clock took: {} ms", start.elapsed().as_millis());
            match frequency {
                Some(mhz) if mhz > 0 => Reading::Primary(format!("{mhz} MHz")),
                _ => Reading::Unavailable,
            }
        }
        .boxed()
    }
}
