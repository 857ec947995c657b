#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Outbreak automaton.

mod args;
mod refresh;
mod terminal;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use outbreak_rendering::{completion_channel, Framebuffer, Presentation, RenderingBackend, Rgb};
use outbreak_rendering_macroquad::MacroquadBackend;
use outbreak_system_frame_loop::{RunOptions, Simulation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use self::{
    args::{BackendChoice, CliArgs},
    terminal::TerminalBackend,
};

/// Interval between emulated panel transfer completions.
const REFRESH_PERIOD: Duration = Duration::from_micros(500);

/// Entry point for the Outbreak command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level)?;

    let config = args.simulation_config()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        grid_width = config.grid.width(),
        grid_height = config.grid.height(),
        panel_width = config.panel.width(),
        panel_height = config.panel.height(),
        reseed_interval = config.reseed_interval,
        backend = ?args.backend,
        "starting outbreak"
    );

    let mut simulation = Simulation::new(&config, seed)
        .context("invalid simulation configuration")?
        .with_execution(args.execution());
    let (sender, receiver) = completion_channel();
    simulation.attach_completions(receiver);
    let refresh = refresh::spawn(sender, REFRESH_PERIOD).context("failed to spawn refresh thread")?;

    let options = RunOptions::from_config(&config).with_max_ticks(args.ticks);
    let mut driver = simulation.into_driver(options);
    let presentation = Presentation::new("Outbreak", config.panel, Rgb::BLACK);

    match args.backend {
        BackendChoice::Headless => {
            if args.ticks.is_none() {
                warn!("headless backend without --ticks runs until interrupted");
            }
            let mut framebuffer = Framebuffer::new(config.panel, presentation.background);
            if let Some(report) = driver.run(&mut framebuffer) {
                info!(
                    ticks = report.tick,
                    generation = report.generation,
                    dormant = report.census.dormant,
                    active = report.census.active,
                    saturated = report.census.saturated,
                    reseeds = driver.simulation().scheduler().reseeds(),
                    "final census"
                );
            }
            drop(driver);
        }
        BackendChoice::Terminal => {
            TerminalBackend::default().run(presentation, move |framebuffer| {
                driver.frame(framebuffer)
            })?;
        }
        BackendChoice::Window => {
            let mut backend = MacroquadBackend::new().with_show_fps(args.show_fps);
            if let Some(vsync) = args.vsync {
                backend = backend.with_vsync(vsync);
            }
            backend.run(presentation, move |framebuffer| driver.frame(framebuffer))?;
        }
    }

    let signalled = refresh
        .join()
        .map_err(|_| anyhow!("panel refresh thread panicked"))?;
    info!(signalled, "shut down");
    Ok(())
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log level `{default_level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}
