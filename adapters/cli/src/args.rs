//! Command-line surface and configuration assembly.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use outbreak_core::{
    CellCoord, GridSize, PanelSize, ReseedRegion, RuleConstants, SimulationConfig,
};
use outbreak_system_transition::Execution;

/// Toroidal outbreak automaton rendered onto an emulated LED matrix.
#[derive(Debug, Parser)]
#[command(name = "outbreak", version, about)]
pub(crate) struct CliArgs {
    /// TOML file holding a full or partial simulation configuration.
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Grid and panel layout preset.
    #[arg(long, value_enum)]
    pub(crate) preset: Option<Preset>,

    /// Transition rule constants.
    #[arg(long, value_enum)]
    pub(crate) rules: Option<RulesPreset>,

    /// Logical grid dimensions, e.g. `128x64`.
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions)]
    pub(crate) grid: Option<Dimensions>,

    /// Physical panel dimensions, e.g. `256x64`.
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions)]
    pub(crate) panel: Option<Dimensions>,

    /// Ticks between reseed events.
    #[arg(long, value_name = "TICKS")]
    pub(crate) reseed_interval: Option<u32>,

    /// Reseed a random rectangle instead of the whole grid.
    #[arg(long)]
    pub(crate) block_reseed: bool,

    /// Seed for the reseed RNG; drawn at random when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Stop after this many ticks.
    #[arg(long)]
    pub(crate) ticks: Option<u64>,

    /// Pause after every tick, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub(crate) tick_delay_ms: Option<u64>,

    /// Where frames are presented.
    #[arg(long, value_enum, default_value_t = BackendChoice::Terminal)]
    pub(crate) backend: BackendChoice,

    /// Render dormant cells as pure black.
    #[arg(long, value_name = "BOOL")]
    pub(crate) black_dormant: Option<bool>,

    /// Cell whose rule inputs are traced every tick, e.g. `10,20`.
    #[arg(long, value_name = "X,Y", value_parser = parse_probe)]
    pub(crate) probe: Option<CellCoord>,

    /// Split the transition pass across the rayon thread pool.
    #[arg(long)]
    pub(crate) parallel: bool,

    /// Log frame and tick rates from the window backend.
    #[arg(long)]
    pub(crate) show_fps: bool,

    /// Sync the window backend to the display refresh; platform default when omitted.
    #[arg(long, value_name = "BOOL")]
    pub(crate) vsync: Option<bool>,

    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    pub(crate) log_level: String,
}

/// Named grid/panel layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Preset {
    /// 128×64 grid on a single 128×64 panel.
    Single,
    /// 128×128 grid folded onto a 256×64 panel chain.
    Folded,
}

/// Named rule constant sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RulesPreset {
    /// `k1 = 2`, `k2 = 3`, `g = 7`.
    Reference,
    /// Constants tuned for a physical panel.
    PanelTuned,
}

/// Presentation surface selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum BackendChoice {
    /// ANSI truecolour half-blocks on stdout.
    Terminal,
    /// No output; logs the final census.
    Headless,
    /// Desktop window drawing LED dots.
    Window,
}

/// Width and height parsed from `WxH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Dimensions {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl CliArgs {
    /// Loads the configuration file (or preset) and applies flag overrides.
    pub(crate) fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => SimulationConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Transition pass strategy requested on the command line.
    pub(crate) fn execution(&self) -> Execution {
        if self.parallel {
            Execution::Parallel
        } else {
            Execution::Sequential
        }
    }

    fn apply_overrides(&self, config: &mut SimulationConfig) {
        if let Some(preset) = self.preset {
            let layout = match preset {
                Preset::Single => SimulationConfig::single_panel(),
                Preset::Folded => SimulationConfig::folded(),
            };
            config.grid = layout.grid;
            config.panel = layout.panel;
        }
        if let Some(rules) = self.rules {
            config.rules = match rules {
                RulesPreset::Reference => RuleConstants::reference(),
                RulesPreset::PanelTuned => RuleConstants::panel_tuned(),
            };
        }
        if let Some(Dimensions { width, height }) = self.grid {
            config.grid = GridSize::new(width, height);
        }
        if let Some(Dimensions { width, height }) = self.panel {
            config.panel = PanelSize::new(width, height);
        }
        if let Some(interval) = self.reseed_interval {
            config.reseed_interval = interval;
        }
        if self.block_reseed {
            config.reseed_region = ReseedRegion::RandomBlock;
        }
        if let Some(delay) = self.tick_delay_ms {
            config.tick_delay_ms = delay;
        }
        if let Some(black_dormant) = self.black_dormant {
            config.colormap.black_dormant = black_dormant;
        }
        if let Some(probe) = self.probe {
            config.probe = Some(probe);
        }
    }
}

fn parse_dimensions(value: &str) -> Result<Dimensions, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|error| format!("invalid dimension `{part}`: {error}"))
    };
    Ok(Dimensions {
        width: parse(width)?,
        height: parse(height)?,
    })
}

fn parse_probe(value: &str) -> Result<CellCoord, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(CellCoord::new(parse(x)?, parse(y)?))
}
