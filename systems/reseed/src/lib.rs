#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic reseed scheduler that periodically reinitialises the grid.
//!
//! The scheduler counts ticks down from a fixed interval. When the countdown
//! reaches zero it emits a [`Command::Reseed`] carrying the region to refill
//! and the freshly drawn intensities, then restarts the countdown. The
//! countdown starts at zero, so the very first tick seeds the grid before any
//! frame is shown.

use outbreak_core::{
    CellCoord, CellRect, Command, GridSize, Intensity, ReseedRegion, SeedDistribution,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    interval: u32,
    region: ReseedRegion,
    distribution: SeedDistribution,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from the reseed cadence, region mode, intensity range and seed.
    #[must_use]
    pub const fn new(
        interval: u32,
        region: ReseedRegion,
        distribution: SeedDistribution,
        rng_seed: u64,
    ) -> Self {
        Self {
            interval,
            region,
            distribution,
            rng_seed,
        }
    }
}

/// Pure system that decides when and where the grid is reseeded.
#[derive(Debug)]
pub struct ReseedScheduler {
    interval: u32,
    region: ReseedRegion,
    distribution: SeedDistribution,
    countdown: u32,
    reseeds: u64,
    rng: ChaCha8Rng,
}

impl ReseedScheduler {
    /// Creates a scheduler whose first tick fires a reseed.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: config.interval,
            region: config.region,
            distribution: config.distribution,
            countdown: 0,
            reseeds: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Ticks remaining before the next reseed fires.
    #[must_use]
    pub const fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Number of reseed events emitted so far.
    #[must_use]
    pub const fn reseeds(&self) -> u64 {
        self.reseeds
    }

    /// Advances the countdown by one tick, emitting a reseed command when it expires.
    pub fn handle(&mut self, size: GridSize, out: &mut Vec<Command>) {
        if self.countdown > 0 {
            self.countdown -= 1;
            return;
        }
        self.countdown = self.interval;

        let Some(region) = self.pick_region(size) else {
            return;
        };
        let SeedDistribution { low, high } = self.distribution;
        let intensities: Vec<Intensity> = (0..region.cell_count())
            .map(|_| Intensity::new(self.rng.gen_range(low..=high)))
            .collect();

        self.reseeds += 1;
        info!(
            reseed = self.reseeds,
            x = region.min().x(),
            y = region.min().y(),
            width = region.width(),
            height = region.height(),
            "reseeding grid"
        );
        out.push(Command::Reseed {
            region,
            intensities,
        });
    }

    fn pick_region(&mut self, size: GridSize) -> Option<CellRect> {
        let full = CellRect::covering(size)?;
        match self.region {
            ReseedRegion::FullGrid => Some(full),
            ReseedRegion::RandomBlock => {
                let a = CellCoord::new(
                    self.rng.gen_range(0..size.width()),
                    self.rng.gen_range(0..size.height()),
                );
                let b = CellCoord::new(
                    self.rng.gen_range(0..size.width()),
                    self.rng.gen_range(0..size.height()),
                );
                Some(CellRect::from_corners(a, b))
            }
        }
    }
}
