#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Outbreak automaton.
//!
//! This crate defines the value types and the message surface that connect
//! adapters, the authoritative world, and pure systems. Systems such as the
//! reseed scheduler emit [`Command`] values describing desired mutations, the
//! world executes those commands via its `apply` entry point, and then reports
//! [`Event`] values describing what changed. Everything that can be tuned
//! lives in [`SimulationConfig`], which is validated once before the frame
//! loop starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of distinct intensity levels a cell can hold.
pub const INTENSITY_LEVELS: usize = 256;

/// Ticks between reseed events in the reference behaviour.
pub const DEFAULT_RESEED_INTERVAL: u32 = 1_000;

/// Eight-bit cell intensity in the range `0..=255`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Intensity(u8);

impl Intensity {
    /// Intensity of a dormant cell.
    pub const DORMANT: Self = Self(0);

    /// Intensity of a saturated cell.
    pub const SATURATED: Self = Self(u8::MAX);

    /// Wraps a raw intensity byte.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the underlying intensity byte.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Classifies the intensity into its state band.
    #[must_use]
    pub const fn band(&self) -> Band {
        Band::of(self.0)
    }

    /// Clamps a floating point value into `0.0..=255.0` and truncates it.
    ///
    /// NaN collapses to [`Intensity::DORMANT`].
    #[must_use]
    pub fn from_clamped(value: f32) -> Self {
        Self(value.clamp(0.0, 255.0) as u8)
    }
}

impl From<u8> for Intensity {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Canonical state bands partitioning the intensity range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Intensity 0.
    Dormant,
    /// Intensity 1 through 254.
    Active,
    /// Intensity 255.
    Saturated,
}

impl Band {
    /// Classifies a raw intensity byte.
    #[must_use]
    pub const fn of(value: u8) -> Self {
        match value {
            0 => Self::Dormant,
            u8::MAX => Self::Saturated,
            _ => Self::Active,
        }
    }
}

/// Logical coordinate within the automaton grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Physical pixel coordinate on the LED panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelCoord {
    x: u32,
    y: u32,
}

impl PanelCoord {
    /// Creates a new panel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Pixel column on the panel.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Pixel row on the panel.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Dimensions of the logical automaton grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether either axis is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Dimensions of the physical LED panel in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelSize {
    width: u32,
    height: u32,
}

impl PanelSize {
    /// Creates a new panel size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel columns on the panel.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Pixel rows on the panel.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether either axis is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned inclusive rectangle of grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    min: CellCoord,
    max: CellCoord,
}

impl CellRect {
    /// Builds a rectangle from two arbitrary corners, normalising min/max per axis.
    #[must_use]
    pub fn from_corners(a: CellCoord, b: CellCoord) -> Self {
        Self {
            min: CellCoord::new(a.x.min(b.x), a.y.min(b.y)),
            max: CellCoord::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Rectangle covering every cell of a grid. Empty grids yield `None`.
    #[must_use]
    pub fn covering(size: GridSize) -> Option<Self> {
        if size.is_empty() {
            return None;
        }
        Some(Self {
            min: CellCoord::new(0, 0),
            max: CellCoord::new(size.width - 1, size.height - 1),
        })
    }

    /// Top-left corner (inclusive).
    #[must_use]
    pub const fn min(&self) -> CellCoord {
        self.min
    }

    /// Bottom-right corner (inclusive).
    #[must_use]
    pub const fn max(&self) -> CellCoord {
        self.max
    }

    /// Number of columns spanned.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max.x - self.min.x + 1
    }

    /// Number of rows spanned.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max.y - self.min.y + 1
    }

    /// Number of cells inside the rectangle.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Whether the coordinate lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Iterates the cells row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let Self { min, max } = *self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| CellCoord::new(x, y)))
    }
}

/// Tunable constants of the transition rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConstants {
    /// Divisor `k1` applied to the active-neighbour count of a dormant cell.
    pub active_divisor: f32,
    /// Divisor `k2` applied to the saturated-neighbour count of a dormant cell.
    pub saturated_divisor: f32,
    /// Growth bias `g` added to an active cell's local average.
    pub growth_bias: f32,
    /// Scale applied to the neighbourhood sum before averaging an active cell.
    pub activity_scale: f32,
}

impl RuleConstants {
    /// Reference constants: `k1 = 2`, `k2 = 3`, `g = 7`, unscaled sum.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            active_divisor: 2.0,
            saturated_divisor: 3.0,
            growth_bias: 7.0,
            activity_scale: 1.0,
        }
    }

    /// Softer constants tuned for a 128×64 HUB75 panel.
    #[must_use]
    pub const fn panel_tuned() -> Self {
        Self {
            active_divisor: 1.6,
            saturated_divisor: 2.2,
            growth_bias: 4.25,
            activity_scale: 0.125,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("active_divisor", self.active_divisor),
            ("saturated_divisor", self.saturated_divisor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDivisor { name, value });
            }
        }
        for (name, value) in [
            ("growth_bias", self.growth_bias),
            ("activity_scale", self.activity_scale),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteConstant { name, value });
            }
        }
        Ok(())
    }
}

impl Default for RuleConstants {
    fn default() -> Self {
        Self::reference()
    }
}

/// Portion of the grid refilled by a reseed event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReseedRegion {
    /// Every cell of the grid.
    #[default]
    FullGrid,
    /// A random axis-aligned rectangle drawn per event.
    RandomBlock,
}

/// Inclusive range random reseed intensities are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedDistribution {
    /// Smallest intensity that may be drawn.
    pub low: u8,
    /// Largest intensity that may be drawn.
    pub high: u8,
}

impl SeedDistribution {
    /// Distribution that always yields the same intensity.
    #[must_use]
    pub const fn constant(value: u8) -> Self {
        Self {
            low: value,
            high: value,
        }
    }
}

impl Default for SeedDistribution {
    fn default() -> Self {
        Self {
            low: 0,
            high: u8::MAX,
        }
    }
}

/// How the value channel of the colormap is derived.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValueCurve {
    /// Value rises linearly with intensity.
    Linear,
    /// Value is the same for every intensity.
    Fixed {
        /// Value channel in `0.0..=1.0`.
        level: f32,
    },
}

/// Parameters of the intensity-to-colour curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColormapSettings {
    /// Hue (as a fraction of the circle) assigned to intensity 0.
    pub hue_start: f32,
    /// Hue distance travelled between intensity 0 and 255.
    pub hue_span: f32,
    /// Saturation shared by every entry.
    pub saturation: f32,
    /// Value channel curve.
    pub value: ValueCurve,
    /// Render dormant cells as pure black instead of sampling the curve.
    pub black_dormant: bool,
}

impl ColormapSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("hue_start", self.hue_start), ("hue_span", self.hue_span)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteConstant { name, value });
            }
        }
        let mut unit_channels = vec![("saturation", self.saturation)];
        if let ValueCurve::Fixed { level } = self.value {
            unit_channels.push(("value", level));
        }
        for (name, value) in unit_channels {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ChannelOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ColormapSettings {
    fn default() -> Self {
        Self {
            hue_start: 0.4,
            hue_span: 0.375,
            saturation: 0.875,
            value: ValueCurve::Linear,
            black_dormant: true,
        }
    }
}

/// Complete startup configuration of a simulation instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Logical automaton grid dimensions.
    pub grid: GridSize,
    /// Physical panel dimensions.
    pub panel: PanelSize,
    /// Ticks between reseed events.
    pub reseed_interval: u32,
    /// Region refilled on each reseed event.
    pub reseed_region: ReseedRegion,
    /// Intensity range drawn during reseeding.
    pub seed_distribution: SeedDistribution,
    /// Transition rule constants.
    pub rules: RuleConstants,
    /// Colormap curve.
    pub colormap: ColormapSettings,
    /// Pause at the end of every tick, in milliseconds.
    pub tick_delay_ms: u64,
    /// Cell whose rule inputs are traced every tick.
    pub probe: Option<CellCoord>,
}

impl SimulationConfig {
    /// Single 128×64 panel showing a 128×64 grid.
    #[must_use]
    pub fn single_panel() -> Self {
        Self::default()
    }

    /// 128×128 grid folded onto a 256×64 panel chain.
    #[must_use]
    pub fn folded() -> Self {
        Self {
            grid: GridSize::new(128, 128),
            panel: PanelSize::new(256, 64),
            ..Self::default()
        }
    }

    /// Rejects configurations the automaton cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_layout(self.grid, self.panel)?;
        if self.seed_distribution.low > self.seed_distribution.high {
            return Err(ConfigError::InvertedSeedDistribution {
                low: self.seed_distribution.low,
                high: self.seed_distribution.high,
            });
        }
        self.rules.validate()?;
        self.colormap.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::new(128, 64),
            panel: PanelSize::new(128, 64),
            reseed_interval: DEFAULT_RESEED_INTERVAL,
            reseed_region: ReseedRegion::FullGrid,
            seed_distribution: SeedDistribution::default(),
            rules: RuleConstants::reference(),
            colormap: ColormapSettings::default(),
            tick_delay_ms: 1,
            probe: None,
        }
    }
}

/// Checks that a grid can be projected onto a panel with the fold mapping.
pub fn validate_layout(grid: GridSize, panel: PanelSize) -> Result<(), ConfigError> {
    if grid.is_empty() {
        return Err(ConfigError::EmptyGrid {
            width: grid.width,
            height: grid.height,
        });
    }
    if panel.is_empty() {
        return Err(ConfigError::EmptyPanel {
            width: panel.width,
            height: panel.height,
        });
    }
    if grid.width > panel.width {
        return Err(ConfigError::GridWiderThanPanel {
            grid_width: grid.width,
            panel_width: panel.width,
        });
    }
    if u64::from(grid.height) > 2 * u64::from(panel.height) {
        return Err(ConfigError::GridTallerThanFold {
            grid_height: grid.height,
            panel_height: panel.height,
        });
    }
    Ok(())
}

/// Reasons a configuration is rejected at startup.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has a zero-sized axis.
    #[error("grid dimensions must be non-zero (received {width}x{height})")]
    EmptyGrid {
        /// Requested grid width.
        width: u32,
        /// Requested grid height.
        height: u32,
    },
    /// The panel has a zero-sized axis.
    #[error("panel dimensions must be non-zero (received {width}x{height})")]
    EmptyPanel {
        /// Requested panel width.
        width: u32,
        /// Requested panel height.
        height: u32,
    },
    /// The grid does not fit horizontally on the panel.
    #[error("grid width {grid_width} exceeds panel width {panel_width}")]
    GridWiderThanPanel {
        /// Requested grid width.
        grid_width: u32,
        /// Requested panel width.
        panel_width: u32,
    },
    /// The grid is taller than a two-half fold can hold.
    #[error("grid height {grid_height} exceeds twice the panel height {panel_height}")]
    GridTallerThanFold {
        /// Requested grid height.
        grid_height: u32,
        /// Requested panel height.
        panel_height: u32,
    },
    /// A rule divisor would make the transition undefined.
    #[error("{name} must be a positive finite number (received {value})")]
    InvalidDivisor {
        /// Field that failed validation.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A constant is NaN or infinite.
    #[error("{name} must be finite (received {value})")]
    NonFiniteConstant {
        /// Field that failed validation.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A colour channel lies outside `0.0..=1.0`.
    #[error("{name} must lie within 0.0..=1.0 (received {value})")]
    ChannelOutOfRange {
        /// Field that failed validation.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The seed distribution's bounds are swapped.
    #[error("seed distribution low bound {low} exceeds high bound {high}")]
    InvertedSeedDistribution {
        /// Requested lower bound.
        low: u8,
        /// Requested upper bound.
        high: u8,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Clears the buffer about to be read and refills a region of it.
    Reseed {
        /// Cells to refill; everything outside the region stays dormant.
        region: CellRect,
        /// Intensities written row by row across the region.
        intensities: Vec<Intensity>,
    },
    /// Publishes the staged generation so it becomes the next one read.
    SwapBuffers,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the previous buffer was cleared and refilled.
    Reseeded {
        /// Region that received fresh intensities.
        region: CellRect,
        /// Number of cells actually written.
        filled: usize,
    },
    /// Confirms that the buffer roles were exchanged.
    BuffersSwapped {
        /// Number of generations published so far.
        generation: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn band_boundaries_match_definition() {
        assert_eq!(Band::of(0), Band::Dormant);
        assert_eq!(Band::of(1), Band::Active);
        assert_eq!(Band::of(254), Band::Active);
        assert_eq!(Band::of(255), Band::Saturated);
    }

    proptest! {
        #[test]
        fn bands_partition_every_intensity(value in any::<u8>()) {
            let band = Intensity::new(value).band();
            let expected = if value == 0 {
                Band::Dormant
            } else if value == 255 {
                Band::Saturated
            } else {
                Band::Active
            };
            prop_assert_eq!(band, expected);
        }

        #[test]
        fn from_clamped_never_escapes_range(value in any::<f32>()) {
            let intensity = Intensity::from_clamped(value);
            if value >= 255.0 {
                prop_assert_eq!(intensity, Intensity::SATURATED);
            }
            if value <= 0.0 || value.is_nan() {
                prop_assert_eq!(intensity, Intensity::DORMANT);
            }
        }
    }

    #[test]
    fn from_clamped_truncates_fractions() {
        assert_eq!(Intensity::from_clamped(16.9).get(), 16);
        assert_eq!(Intensity::from_clamped(-3.5).get(), 0);
        assert_eq!(Intensity::from_clamped(1_000.0).get(), 255);
    }

    #[test]
    fn rect_from_corners_normalises_ordering() {
        let rect = CellRect::from_corners(CellCoord::new(9, 2), CellCoord::new(3, 7));
        assert_eq!(rect.min(), CellCoord::new(3, 2));
        assert_eq!(rect.max(), CellCoord::new(9, 7));
        assert_eq!(rect.cell_count(), 7 * 6);
        assert_eq!(rect.cells().count(), rect.cell_count());
    }

    #[test]
    fn rect_cells_iterate_row_major() {
        let rect = CellRect::from_corners(CellCoord::new(1, 1), CellCoord::new(2, 2));
        let cells: Vec<_> = rect.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(1, 2),
                CellCoord::new(2, 2),
            ]
        );
    }

    #[test]
    fn covering_rejects_empty_grid() {
        assert!(CellRect::covering(GridSize::new(0, 4)).is_none());
        let rect = CellRect::covering(GridSize::new(8, 4)).expect("non-empty grid");
        assert_eq!(rect.cell_count(), 32);
    }

    #[test]
    fn default_configuration_is_valid() {
        SimulationConfig::default()
            .validate()
            .expect("default config validates");
        SimulationConfig::folded()
            .validate()
            .expect("folded config validates");
    }

    #[test]
    fn zero_sized_dimensions_are_rejected() {
        let config = SimulationConfig {
            grid: GridSize::new(0, 64),
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid {
                width: 0,
                height: 64
            })
        );

        let config = SimulationConfig {
            panel: PanelSize::new(128, 0),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyPanel { .. })
        ));
    }

    #[test]
    fn grid_must_fit_panel_fold() {
        assert!(matches!(
            validate_layout(GridSize::new(129, 64), PanelSize::new(128, 64)),
            Err(ConfigError::GridWiderThanPanel { .. })
        ));
        assert!(matches!(
            validate_layout(GridSize::new(128, 129), PanelSize::new(256, 64)),
            Err(ConfigError::GridTallerThanFold { .. })
        ));
        assert!(validate_layout(GridSize::new(128, 128), PanelSize::new(256, 64)).is_ok());
    }

    #[test]
    fn degenerate_rule_constants_are_rejected() {
        let mut config = SimulationConfig::default();
        config.rules.active_divisor = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDivisor {
                name: "active_divisor",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.rules.growth_bias = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteConstant { .. })
        ));
    }

    #[test]
    fn inverted_seed_distribution_is_rejected() {
        let config = SimulationConfig {
            seed_distribution: SeedDistribution { low: 9, high: 3 },
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSeedDistribution { low: 9, high: 3 })
        );
    }

    #[test]
    fn colormap_channels_must_be_unit_range() {
        let mut config = SimulationConfig::default();
        config.colormap.value = ValueCurve::Fixed { level: 1.5 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChannelOutOfRange { name: "value", .. })
        ));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            reseed_interval = 250
            reseed_region = "random-block"

            [grid]
            width = 32
            height = 16

            [rules]
            growth_bias = 5.0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.reseed_interval, 250);
        assert_eq!(config.reseed_region, ReseedRegion::RandomBlock);
        assert_eq!(config.grid, GridSize::new(32, 16));
        assert_eq!(config.panel, PanelSize::new(128, 64));
        assert!((config.rules.growth_bias - 5.0).abs() < f32::EPSILON);
        assert!((config.rules.active_divisor - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.colormap, ColormapSettings::default());
    }
}
