//! The fixed-cadence sampling loop.
//!
//! One cycle runs `Sampling -> Publishing -> Sleeping` and starts over. Every
//! source is awaited in turn; nothing runs concurrently. The time spent
//! sampling (dominated by the CPU statistics window) is taken off the sleep
//! so rows stay close to the configured interval.

use anyhow::Result;
use chrono::Local;
use log::{debug, error, info, trace, warn};
use std::time::{Duration, Instant};

use crate::collectors::{battery, command, MetricSource};
use crate::config::Settings;
use crate::error::SamplerError;
use crate::models::{MetricKind, Reading, Sample};
use crate::normalizer;
use crate::renderer::Renderer;
use crate::store::LogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Sampling,
    Publishing,
    Sleeping,
}

/// How long to sleep after a sampling pass that took `cost`. Never negative.
pub fn compensated_sleep(interval: Duration, cost: Duration) -> Duration {
    interval.saturating_sub(cost)
}

/// Startup warning for the first temperature reading, if it did not come
/// from a sensor tied to `battery`.
pub fn temperature_notice(battery: &str, reading: &Reading) -> Option<String> {
    match reading {
        Reading::Primary(_) => None,
        Reading::Fallback(_) => Some(format!(
            "No temperature sensor found for {battery}, using a generic sensor instead"
        )),
        Reading::Unavailable => Some(format!(
            "No temperature sensor found for {battery} and no generic sensor either, temperature will be NA"
        )),
    }
}

pub struct Scheduler {
    settings: Settings,
    sources: Vec<Box<dyn MetricSource>>,
    store: LogStore,
    renderer: Option<Box<dyn Renderer>>,
    phase: Phase,
    header_shown: bool,
}

impl Scheduler {
    pub fn new(
        settings: Settings,
        sources: Vec<Box<dyn MetricSource>>,
        renderer: Option<Box<dyn Renderer>>,
    ) -> Self {
        let store = LogStore::new(settings.file.clone());
        Self {
            settings,
            sources,
            store,
            renderer,
            phase: Phase::Initializing,
            header_shown: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Startup checks, in order: external tools, battery identifier, log
    /// file. Nothing is written before all of them pass.
    pub async fn initialize(&mut self) -> Result<(), SamplerError> {
        self.enter(Phase::Initializing);
        command::check_dependencies(self.sources.iter().flat_map(|s| s.tools()))?;
        battery::ensure_exists(&self.settings.power_supply_root, &self.settings.battery)?;

        if let Some(source) = self
            .sources
            .iter()
            .find(|s| s.kind() == MetricKind::Temperature)
        {
            let reading = source.read().await;
            if let Some(notice) = temperature_notice(&self.settings.battery, &reading) {
                warn!("{notice}");
            }
        }

        self.store.ensure_header()?;
        self.header_shown = false;

        println!(
            "Logging to {} every {}s (battery {}, plotting {})",
            self.settings.file.display(),
            self.settings.interval.as_secs(),
            self.settings.battery,
            if self.settings.plot { "on" } else { "off" }
        );
        Ok(())
    }

    /// Reads every source in order and returns the sample with the time it
    /// took to gather.
    pub async fn sample(&mut self) -> (Sample, Duration) {
        self.enter(Phase::Sampling);
        let start = Instant::now();
        let mut sample = Sample::new(Local::now().fixed_offset());

        for source in &self.sources {
            let reading = source.read().await;
            if reading == Reading::Unavailable {
                debug!("{} unavailable this cycle", source.kind());
            }
            normalizer::apply(source.kind(), &reading, &mut sample);
        }

        let cost = start.elapsed();
        debug!("sampling took: {} ms", cost.as_millis());
        (sample, cost)
    }

    /// Appends the sample and returns the console lines for it: the header on
    /// the first call, then the latest row.
    pub fn publish(&mut self, sample: &Sample) -> Vec<String> {
        self.enter(Phase::Publishing);
        if let Err(e) = self.store.append(sample) {
            error!("Failed to append to {}: {}", self.store.path().display(), e);
            return Vec::new();
        }

        let summary = match self.store.summary() {
            Ok(summary) => summary,
            Err(e) => {
                error!("Failed to read back {}: {}", self.store.path().display(), e);
                return Vec::new();
            }
        };

        let mut lines = Vec::with_capacity(2);
        if !self.header_shown {
            lines.push(summary.header);
            self.header_shown = true;
        }
        lines.extend(summary.latest);
        lines
    }

    /// Sleeps out the rest of the interval, then refreshes the chart if
    /// plotting is on. Render failures are dropped.
    pub async fn sleep_then_render(&mut self, cost: Duration) {
        self.enter(Phase::Sleeping);
        let remaining = compensated_sleep(self.settings.interval, cost);
        debug!("sleeping {} ms", remaining.as_millis());
        tokio::time::sleep(remaining).await;

        if !self.settings.plot {
            return;
        }
        if let Some(renderer) = &self.renderer {
            match renderer.render(self.store.path()) {
                Ok(out) => debug!("chart updated at {}", out.display()),
                Err(e) => debug!("chart not rendered: {e:#}"),
            }
        }
    }

    pub async fn cycle(&mut self) {
        let (sample, cost) = self.sample().await;
        for line in self.publish(&sample) {
            println!("{line}");
        }
        self.sleep_then_render(cost).await;
    }

    /// Runs cycles until the process is stopped from outside.
    pub async fn run(&mut self) -> Result<()> {
        info!("Sampling every {}s", self.settings.interval.as_secs());
        loop {
            self.cycle().await;
        }
    }
}
