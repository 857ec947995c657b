#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that sequences one automaton tick after another.
//!
//! A tick forwards pending transfer completions to the display, resets the
//! display's draw state, lets the reseed scheduler act on the previous
//! buffer, runs the transition pass into the current buffer, pushes every
//! current cell through the colormap and the panel layout, flips the display
//! and finally swaps the buffer roles. Everything the loop touches is owned
//! by a single [`Simulation`] value.

use std::{thread, time::Duration};

use outbreak_core::{CellRect, Command, ConfigError, Event, SimulationConfig};
use outbreak_rendering::{
    Colormap, CompletionReceiver, DisplayDriver, FrameControl, PanelLayout,
};
use outbreak_system_reseed::{Config as ReseedConfig, ReseedScheduler};
use outbreak_system_transition::{Execution, TransitionEngine};
use outbreak_world::{
    self as world,
    query::{self, BandCensus},
    BufferRole, World,
};
use tracing::debug;

/// Summary of a completed tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// One-based index of the tick.
    pub tick: u64,
    /// Generation published by the tick's buffer swap.
    pub generation: u64,
    /// Region refilled by the reseed scheduler, if it fired.
    pub reseeded: Option<CellRect>,
    /// Band census of the generation the transition pass read.
    pub census: BandCensus,
    /// Transfer completions forwarded to the display before drawing.
    pub transfers_forwarded: usize,
}

/// Pacing of the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause after every tick.
    pub tick_delay: Duration,
    /// Number of ticks after which the loop stops; `None` runs forever.
    pub max_ticks: Option<u64>,
}

impl RunOptions {
    /// Options that pause between ticks as configured and never stop.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            tick_delay: Duration::from_millis(config.tick_delay_ms),
            max_ticks: None,
        }
    }

    /// Stops the loop after `ticks` ticks.
    #[must_use]
    pub fn with_max_ticks(mut self, ticks: Option<u64>) -> Self {
        self.max_ticks = ticks;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_delay: Duration::ZERO,
            max_ticks: None,
        }
    }
}

/// Owned simulation context: both grid buffers plus every system acting on them.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: ReseedScheduler,
    engine: TransitionEngine,
    colormap: Colormap,
    layout: PanelLayout,
    completions: Option<CompletionReceiver>,
    ticks: u64,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Simulation {
    /// Validates the configuration and allocates a dormant simulation.
    ///
    /// `rng_seed` drives every reseed; equal seeds replay identical runs.
    pub fn new(config: &SimulationConfig, rng_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = PanelLayout::new(config.grid, config.panel)?;
        let world = World::new(config.grid)?;
        let scheduler = ReseedScheduler::new(ReseedConfig::new(
            config.reseed_interval,
            config.reseed_region,
            config.seed_distribution,
            rng_seed,
        ));
        let engine = TransitionEngine::new(config.rules).with_probe(config.probe);

        debug!(
            grid_width = config.grid.width(),
            grid_height = config.grid.height(),
            panel_width = config.panel.width(),
            panel_height = config.panel.height(),
            folded = layout.is_folded(),
            "simulation allocated"
        );

        Ok(Self {
            world,
            scheduler,
            engine,
            colormap: Colormap::build(&config.colormap),
            layout,
            completions: None,
            ticks: 0,
            commands: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Selects how the transition pass visits cells.
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.engine = self.engine.with_execution(execution);
        self
    }

    /// Routes transfer completions from `receiver` into the display each tick.
    pub fn attach_completions(&mut self, receiver: CompletionReceiver) {
        self.completions = Some(receiver);
    }

    /// Automaton state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Colour table used to paint cells.
    #[must_use]
    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    /// Grid-to-panel projection.
    #[must_use]
    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    /// Reseed scheduler state.
    #[must_use]
    pub fn scheduler(&self) -> &ReseedScheduler {
        &self.scheduler
    }

    /// Number of ticks completed.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick against `display`.
    pub fn tick<D: DisplayDriver>(&mut self, display: &mut D) -> TickReport {
        let transfers_forwarded = match &self.completions {
            Some(receiver) => receiver.forward(display),
            None => 0,
        };
        display.clear();

        self.events.clear();
        self.scheduler
            .handle(query::size(&self.world), &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        let reseeded = self.events.iter().find_map(|event| match event {
            Event::Reseeded { region, .. } => Some(*region),
            Event::BuffersSwapped { .. } => None,
        });

        self.ticks += 1;
        let census = query::census(&self.world);
        debug!(
            tick = self.ticks,
            dormant = census.dormant,
            active = census.active,
            saturated = census.saturated,
            "census"
        );

        {
            let (previous, current) = world::staging(&mut self.world);
            self.engine.advance(previous, current);
        }

        let current = query::grid(&self.world, BufferRole::Current);
        for (cell, value) in current.coords().zip(current.cells()) {
            display.set_color(self.layout.map(cell), self.colormap.color(*value));
        }
        display.flip(true);

        world::apply(&mut self.world, Command::SwapBuffers, &mut self.events);

        TickReport {
            tick: self.ticks,
            generation: query::generation(&self.world),
            reseeded,
            census,
            transfers_forwarded,
        }
    }

    /// Wraps the simulation into a paced driver.
    #[must_use]
    pub fn into_driver(self, options: RunOptions) -> FrameDriver {
        FrameDriver {
            simulation: self,
            options,
            last_report: None,
        }
    }
}

/// Simulation paired with its pacing, callable once per presented frame.
#[derive(Debug)]
pub struct FrameDriver {
    simulation: Simulation,
    options: RunOptions,
    last_report: Option<TickReport>,
}

impl FrameDriver {
    /// Runs one tick, waits out the tick delay and reports whether to keep going.
    pub fn frame<D: DisplayDriver>(&mut self, display: &mut D) -> FrameControl {
        if self.finished() {
            return FrameControl::Stop;
        }
        self.last_report = Some(self.simulation.tick(display));
        if !self.options.tick_delay.is_zero() {
            thread::sleep(self.options.tick_delay);
        }
        if self.finished() {
            FrameControl::Stop
        } else {
            FrameControl::Continue
        }
    }

    /// Drives `display` until the tick limit is reached, returning the last report.
    ///
    /// Without a tick limit this never returns.
    pub fn run<D: DisplayDriver>(&mut self, display: &mut D) -> Option<TickReport> {
        while self.frame(display) == FrameControl::Continue {}
        self.last_report
    }

    /// Report of the most recent tick.
    #[must_use]
    pub const fn last_report(&self) -> Option<TickReport> {
        self.last_report
    }

    /// Driven simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    fn finished(&self) -> bool {
        self.options
            .max_ticks
            .is_some_and(|limit| self.simulation.ticks() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{GridSize, PanelSize};
    use outbreak_rendering::{Framebuffer, Rgb};

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            grid: GridSize::new(6, 4),
            panel: PanelSize::new(6, 4),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn first_tick_reseeds_and_publishes_generation_one() {
        let mut simulation = Simulation::new(&small_config(), 3).expect("valid config");
        let mut framebuffer = Framebuffer::new(PanelSize::new(6, 4), Rgb::BLACK);

        let report = simulation.tick(&mut framebuffer);
        assert_eq!(report.tick, 1);
        assert_eq!(report.generation, 1);
        assert_eq!(report.reseeded, CellRect::covering(GridSize::new(6, 4)));
        assert_eq!(report.census.total(), 24);
        assert_eq!(framebuffer.frames_presented(), 1);

        let report = simulation.tick(&mut framebuffer);
        assert_eq!(report.reseeded, None);
        assert_eq!(report.generation, 2);
    }

    #[derive(Debug, Default)]
    struct RecordingDisplay {
        calls: Vec<&'static str>,
    }

    impl DisplayDriver for RecordingDisplay {
        fn clear(&mut self) {
            self.calls.push("clear");
        }

        fn set_color(&mut self, _pixel: outbreak_core::PanelCoord, _color: Rgb) {
            if self.calls.last() != Some(&"set_color") {
                self.calls.push("set_color");
            }
        }

        fn flip(&mut self, clear_background: bool) {
            assert!(clear_background);
            self.calls.push("flip");
        }

        fn transfer_complete(&mut self) {
            self.calls.push("transfer_complete");
        }
    }

    #[test]
    fn tick_resets_draw_state_before_painting() {
        let mut simulation = Simulation::new(&small_config(), 1).expect("valid config");
        let (sender, receiver) = outbreak_rendering::completion_channel();
        simulation.attach_completions(receiver);
        let mut display = RecordingDisplay::default();

        assert!(sender.notify());
        let _report = simulation.tick(&mut display);
        let _report = simulation.tick(&mut display);

        assert_eq!(
            display.calls,
            [
                "transfer_complete",
                "clear",
                "set_color",
                "flip",
                "clear",
                "set_color",
                "flip",
            ]
        );
    }

    #[test]
    fn driver_stops_at_tick_limit() {
        let simulation = Simulation::new(&small_config(), 9).expect("valid config");
        let mut driver = simulation.into_driver(RunOptions::default().with_max_ticks(Some(5)));
        let mut framebuffer = Framebuffer::new(PanelSize::new(6, 4), Rgb::BLACK);

        let last = driver.run(&mut framebuffer).expect("at least one tick");
        assert_eq!(last.tick, 5);
        assert_eq!(driver.simulation().ticks(), 5);
        assert_eq!(driver.frame(&mut framebuffer), FrameControl::Stop);
        assert_eq!(framebuffer.frames_presented(), 5);
    }

    #[test]
    fn zero_tick_limit_never_ticks() {
        let simulation = Simulation::new(&small_config(), 9).expect("valid config");
        let mut driver = simulation.into_driver(RunOptions::default().with_max_ticks(Some(0)));
        let mut framebuffer = Framebuffer::new(PanelSize::new(6, 4), Rgb::BLACK);

        assert_eq!(driver.run(&mut framebuffer), None);
        assert_eq!(framebuffer.frames_presented(), 0);
    }

    #[test]
    fn run_options_follow_configured_delay() {
        let config = SimulationConfig {
            tick_delay_ms: 12,
            ..SimulationConfig::default()
        };
        let options = RunOptions::from_config(&config);
        assert_eq!(options.tick_delay, Duration::from_millis(12));
        assert_eq!(options.max_ticks, None);
    }
}
