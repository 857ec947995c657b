#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure transition system computing the next generation of the automaton.
//!
//! Each cell's next intensity depends only on the previous generation: the
//! cell's own band selects the rule, and the rule consumes the aggregates of
//! the 3×3 toroidal block around it (centre included). Because the engine is
//! handed the previous grid by shared reference and the current grid by
//! exclusive reference, no pass can read a value it wrote itself, which also
//! makes the row-parallel execution bit-identical to the sequential one.

use outbreak_core::{Band, CellCoord, Intensity, RuleConstants};
use outbreak_world::{Grid, Neighborhood};
use rayon::prelude::*;
use tracing::trace;

/// Strategy used to visit the cells of a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    /// Visit cells one after another on the calling thread.
    #[default]
    Sequential,
    /// Split the pass into rows processed on the rayon pool.
    Parallel,
}

/// Computes the next intensity of a single cell.
#[must_use]
pub fn next_intensity(
    rules: &RuleConstants,
    old: Intensity,
    neighborhood: Neighborhood,
) -> Intensity {
    match old.band() {
        Band::Dormant => {
            let active = f32::from(neighborhood.active) / rules.active_divisor;
            let saturated = f32::from(neighborhood.saturated) / rules.saturated_divisor;
            Intensity::from_clamped(active + saturated)
        }
        Band::Saturated => Intensity::DORMANT,
        Band::Active => {
            // +1 keeps the divisor non-zero when no neighbour is saturated.
            let biased = f32::from(neighborhood.saturated) + 1.0;
            let average = rules.activity_scale * neighborhood.sum as f32 / biased;
            Intensity::from_clamped(average + rules.growth_bias)
        }
    }
}

/// Transition system applying [`next_intensity`] across a whole grid.
#[derive(Clone, Debug)]
pub struct TransitionEngine {
    rules: RuleConstants,
    execution: Execution,
    probe: Option<CellCoord>,
}

impl TransitionEngine {
    /// Creates a sequential engine using the provided rule constants.
    #[must_use]
    pub fn new(rules: RuleConstants) -> Self {
        Self {
            rules,
            execution: Execution::Sequential,
            probe: None,
        }
    }

    /// Selects how cells are visited.
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Traces the rule inputs of one cell after every pass.
    #[must_use]
    pub fn with_probe(mut self, probe: Option<CellCoord>) -> Self {
        self.probe = probe;
        self
    }

    /// Rule constants in effect.
    #[must_use]
    pub fn rules(&self) -> &RuleConstants {
        &self.rules
    }

    /// Execution strategy in effect.
    #[must_use]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Computes the next value of one cell of `previous`.
    #[must_use]
    pub fn evaluate(&self, previous: &Grid, cell: CellCoord) -> Intensity {
        next_intensity(&self.rules, previous.read(cell), previous.neighborhood(cell))
    }

    /// Writes the successor of every cell of `previous` into `current`.
    ///
    /// Both grids must share the same dimensions.
    pub fn advance(&self, previous: &Grid, current: &mut Grid) {
        debug_assert_eq!(previous.size(), current.size(), "grid shapes diverged");
        let width = previous.size().width() as usize;

        match self.execution {
            Execution::Sequential => {
                for (row, cells) in current.cells_mut().chunks_mut(width).enumerate() {
                    self.advance_row(previous, row, cells);
                }
            }
            Execution::Parallel => {
                current
                    .cells_mut()
                    .par_chunks_mut(width)
                    .enumerate()
                    .for_each(|(row, cells)| self.advance_row(previous, row, cells));
            }
        }

        self.trace_probe(previous);
    }

    /// Writes successors for the listed cells only, in the given order.
    ///
    /// Visiting every cell in any permutation yields the same grid as
    /// [`TransitionEngine::advance`].
    pub fn advance_cells(&self, previous: &Grid, current: &mut Grid, order: &[CellCoord]) {
        for &cell in order {
            current.write(cell, self.evaluate(previous, cell));
        }
    }

    fn advance_row(&self, previous: &Grid, row: usize, cells: &mut [Intensity]) {
        for (column, slot) in cells.iter_mut().enumerate() {
            *slot = self.evaluate(previous, CellCoord::new(column as u32, row as u32));
        }
    }

    fn trace_probe(&self, previous: &Grid) {
        let Some(probe) = self.probe else {
            return;
        };
        let cell = previous.wrap(probe);
        let old = previous.read(cell);
        let neighborhood = previous.neighborhood(cell);
        let next = next_intensity(&self.rules, old, neighborhood);
        trace!(
            x = cell.x(),
            y = cell.y(),
            band = ?old.band(),
            sum = neighborhood.sum,
            active = neighborhood.active,
            saturated = neighborhood.saturated,
            old = old.get(),
            next = next.get(),
            "probe"
        );
    }
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(RuleConstants::reference())
    }
}
