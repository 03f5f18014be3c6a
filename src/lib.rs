pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod renderer;
pub mod scheduler;
pub mod store;

mod utils;

use crate::config::Settings;
use crate::renderer::{ChartRenderer, Renderer};
use crate::scheduler::Scheduler;
use anyhow::Context;
use log::{debug, info};

/// Runs the sampler until it is interrupted. An interrupt between or during
/// cycles ends the process cleanly; a cycle cut short writes nothing.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    info!("Starting sampler");

    tokio::select! {
        result = main_loop(settings) => {
            if let Err(e) = result {
                debug!("Sampler stopped: {e:#}");
                return Err(e);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for interrupt")?;
            info!("Interrupted, stopping");
        }
    }

    Ok(())
}

async fn main_loop(settings: Settings) -> anyhow::Result<()> {
    debug!("Resolved settings: {:?}", settings);
    let sources = collectors::build_sources(&settings);
    let renderer: Option<Box<dyn Renderer>> = if settings.plot {
        Some(Box::new(ChartRenderer::default()))
    } else {
        None
    };

    let mut scheduler = Scheduler::new(settings, sources, renderer);
    scheduler.initialize().await?;
    scheduler.run().await
}
