#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative automaton state for Outbreak.
//!
//! The world owns two same-shaped grids. One of them is the *previous*
//! generation that every reader consults, the other is the *current* buffer
//! the transition pass writes into. [`staging`] hands out exactly that split
//! (a shared borrow of the previous grid next to an exclusive borrow of the
//! current one) so a pass cannot observe its own writes. Roles flip only when
//! [`Command::SwapBuffers`] is applied.

use outbreak_core::{Band, CellCoord, Command, ConfigError, Event, GridSize, Intensity};
use tracing::{debug, trace};

/// Row-major toroidal grid of intensities.
///
/// Every coordinate is wrapped modulo the grid dimensions before use, so
/// reads and writes never go out of bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<Intensity>,
}

impl Grid {
    /// Allocates an all-dormant grid.
    pub fn new(size: GridSize) -> Result<Self, ConfigError> {
        if size.is_empty() {
            return Err(ConfigError::EmptyGrid {
                width: size.width(),
                height: size.height(),
            });
        }
        Ok(Self {
            size,
            cells: vec![Intensity::DORMANT; size.cell_count()],
        })
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Folds an arbitrary coordinate back onto the torus.
    #[must_use]
    pub fn wrap(&self, cell: CellCoord) -> CellCoord {
        CellCoord::new(cell.x() % self.size.width(), cell.y() % self.size.height())
    }

    /// Linear index of a (wrapped) coordinate.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> usize {
        let cell = self.wrap(cell);
        cell.y() as usize * self.size.width() as usize + cell.x() as usize
    }

    /// Reads the intensity stored at a coordinate.
    #[must_use]
    pub fn read(&self, cell: CellCoord) -> Intensity {
        self.cells[self.index_of(cell)]
    }

    /// Stores an intensity at a coordinate.
    pub fn write(&mut self, cell: CellCoord, value: Intensity) {
        let index = self.index_of(cell);
        self.cells[index] = value;
    }

    /// Resets every cell to dormant.
    pub fn clear(&mut self) {
        self.cells.fill(Intensity::DORMANT);
    }

    /// Read-only access to the row-major cell storage.
    #[must_use]
    pub fn cells(&self) -> &[Intensity] {
        &self.cells
    }

    /// Mutable access to the row-major cell storage.
    pub fn cells_mut(&mut self) -> &mut [Intensity] {
        &mut self.cells
    }

    /// Iterates every coordinate in storage order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.size.width();
        let height = self.size.height();
        (0..height).flat_map(move |y| (0..width).map(move |x| CellCoord::new(x, y)))
    }

    /// Aggregates the 3×3 block centred on `cell`, the centre included.
    #[must_use]
    pub fn neighborhood(&self, cell: CellCoord) -> Neighborhood {
        let width = u64::from(self.size.width());
        let height = u64::from(self.size.height());
        let cell = self.wrap(cell);
        let (x, y) = (u64::from(cell.x()), u64::from(cell.y()));

        let mut neighborhood = Neighborhood::default();
        for dy in [height - 1, 0, 1] {
            let row = ((y + dy) % height) as usize * width as usize;
            for dx in [width - 1, 0, 1] {
                let column = ((x + dx) % width) as usize;
                neighborhood.accumulate(self.cells[row + column]);
            }
        }
        neighborhood
    }
}

/// Aggregates over a 3×3 toroidal neighbourhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Sum of all nine intensities.
    pub sum: u32,
    /// Number of cells in the active band.
    pub active: u8,
    /// Number of cells in the saturated band.
    pub saturated: u8,
}

impl Neighborhood {
    fn accumulate(&mut self, value: Intensity) {
        self.sum += u32::from(value.get());
        match value.band() {
            Band::Dormant => {}
            Band::Active => self.active += 1,
            Band::Saturated => self.saturated += 1,
        }
    }
}

/// Logical role of one of the two grid buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// The generation every reader consults during a tick.
    Previous,
    /// The generation being written by the transition pass.
    Current,
}

/// Ping-pong pair of grids plus the generation counter.
#[derive(Debug)]
pub struct World {
    buffers: [Grid; 2],
    previous: usize,
    generation: u64,
}

impl World {
    /// Allocates both buffers, zero-initialised.
    pub fn new(size: GridSize) -> Result<Self, ConfigError> {
        let grid = Grid::new(size)?;
        Ok(Self {
            buffers: [grid.clone(), grid],
            previous: 0,
            generation: 0,
        })
    }

    fn slot(&self, role: BufferRole) -> usize {
        match role {
            BufferRole::Previous => self.previous,
            BufferRole::Current => 1 - self.previous,
        }
    }

    fn grid(&self, role: BufferRole) -> &Grid {
        &self.buffers[self.slot(role)]
    }

    fn grid_mut(&mut self, role: BufferRole) -> &mut Grid {
        let slot = self.slot(role);
        &mut self.buffers[slot]
    }
}

/// Applies a command to the world, recording the resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Reseed {
            region,
            intensities,
        } => {
            let grid = world.grid_mut(BufferRole::Previous);
            grid.clear();
            let mut filled = 0;
            for (cell, value) in region.cells().zip(intensities) {
                grid.write(cell, value);
                filled += 1;
            }
            debug!(?region, filled, "previous buffer reseeded");
            out_events.push(Event::Reseeded { region, filled });
        }
        Command::SwapBuffers => {
            world.previous = 1 - world.previous;
            world.generation = world.generation.saturating_add(1);
            trace!(generation = world.generation, "buffers swapped");
            out_events.push(Event::BuffersSwapped {
                generation: world.generation,
            });
        }
    }
}

/// Splits the world into the previous grid (read-only) and the current grid (write-only).
pub fn staging(world: &mut World) -> (&Grid, &mut Grid) {
    let (first, second) = world.buffers.split_at_mut(1);
    if world.previous == 0 {
        (&first[0], &mut second[0])
    } else {
        (&second[0], &mut first[0])
    }
}

/// Writes one cell of the buffer currently holding `role`.
pub fn write(world: &mut World, role: BufferRole, cell: CellCoord, value: Intensity) {
    world.grid_mut(role).write(cell, value);
}

/// Resets the buffer currently holding `role` to all-dormant.
pub fn clear(world: &mut World, role: BufferRole) {
    world.grid_mut(role).clear();
}

/// Read-only views over the world.
pub mod query {
    use super::{BufferRole, Grid, Neighborhood, World};
    use outbreak_core::{Band, CellCoord, GridSize, Intensity};

    /// Dimensions shared by both buffers.
    #[must_use]
    pub fn size(world: &World) -> GridSize {
        world.buffers[0].size()
    }

    /// Number of generations published so far.
    #[must_use]
    pub fn generation(world: &World) -> u64 {
        world.generation
    }

    /// Grid currently holding `role`.
    #[must_use]
    pub fn grid(world: &World, role: BufferRole) -> &Grid {
        world.grid(role)
    }

    /// Reads one cell of the buffer currently holding `role`.
    #[must_use]
    pub fn read(world: &World, role: BufferRole, cell: CellCoord) -> Intensity {
        world.grid(role).read(cell)
    }

    /// Neighbourhood aggregates of a cell in the previous generation.
    #[must_use]
    pub fn neighborhood(world: &World, cell: CellCoord) -> Neighborhood {
        world.grid(BufferRole::Previous).neighborhood(cell)
    }

    /// Counts the cells of each band in the previous generation.
    #[must_use]
    pub fn census(world: &World) -> BandCensus {
        census_of(world.grid(BufferRole::Previous))
    }

    /// Counts the cells of each band in an arbitrary grid.
    #[must_use]
    pub fn census_of(grid: &Grid) -> BandCensus {
        grid.cells()
            .iter()
            .fold(BandCensus::default(), |mut census, value| {
                match value.band() {
                    Band::Dormant => census.dormant += 1,
                    Band::Active => census.active += 1,
                    Band::Saturated => census.saturated += 1,
                }
                census
            })
    }

    /// Per-band cell counts.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BandCensus {
        /// Cells at intensity 0.
        pub dormant: usize,
        /// Cells at intensity 1..=254.
        pub active: usize,
        /// Cells at intensity 255.
        pub saturated: usize,
    }

    impl BandCensus {
        /// Total number of cells counted.
        #[must_use]
        pub const fn total(&self) -> usize {
            self.dormant + self.active + self.saturated
        }

        /// Cells that are not dormant.
        #[must_use]
        pub const fn awake(&self) -> usize {
            self.active + self.saturated
        }
    }
}
