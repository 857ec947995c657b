use outbreak_core::{validate_layout, CellCoord, ConfigError, GridSize, PanelCoord, PanelSize};

/// Projects a logical cell onto a physical pixel.
///
/// Rows inside the panel height map to themselves. Rows below it belong to
/// the folded half: both axes are mirrored, so the lower half of the grid is
/// rotated 180° and lands beside the upper half. Callers must pass a
/// coordinate inside a layout accepted by [`validate_layout`].
#[must_use]
pub const fn fold_to_panel(cell: CellCoord, grid_height: u32, panel: PanelSize) -> PanelCoord {
    if cell.y() < panel.height() {
        PanelCoord::new(cell.x(), cell.y())
    } else {
        PanelCoord::new(panel.width() - 1 - cell.x(), grid_height - 1 - cell.y())
    }
}

/// Validated pairing of a grid with the panel it is shown on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelLayout {
    grid: GridSize,
    panel: PanelSize,
}

impl PanelLayout {
    /// Pairs a grid with a panel, rejecting combinations the fold cannot place.
    pub fn new(grid: GridSize, panel: PanelSize) -> Result<Self, ConfigError> {
        validate_layout(grid, panel)?;
        Ok(Self { grid, panel })
    }

    /// Logical grid dimensions.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Physical panel dimensions.
    #[must_use]
    pub const fn panel(&self) -> PanelSize {
        self.panel
    }

    /// Whether part of the grid is mirrored onto the panel's second half.
    #[must_use]
    pub const fn is_folded(&self) -> bool {
        self.grid.height() > self.panel.height()
    }

    /// Physical pixel showing a grid cell. Coordinates wrap onto the grid first.
    #[must_use]
    pub const fn map(&self, cell: CellCoord) -> PanelCoord {
        let cell = CellCoord::new(cell.x() % self.grid.width(), cell.y() % self.grid.height());
        fold_to_panel(cell, self.grid.height(), self.panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn unfolded_layout_is_identity() {
        let layout = PanelLayout::new(GridSize::new(128, 64), PanelSize::new(128, 64))
            .expect("valid layout");
        assert!(!layout.is_folded());
        for (x, y) in [(0, 0), (127, 0), (0, 63), (127, 63), (64, 31)] {
            assert_eq!(layout.map(CellCoord::new(x, y)), PanelCoord::new(x, y));
        }
    }

    #[test]
    fn folded_half_is_rotated_beside_upper_half() {
        let layout = PanelLayout::new(GridSize::new(128, 128), PanelSize::new(256, 64))
            .expect("valid layout");
        assert!(layout.is_folded());
        assert_eq!(layout.map(CellCoord::new(0, 63)), PanelCoord::new(0, 63));
        assert_eq!(layout.map(CellCoord::new(0, 64)), PanelCoord::new(255, 63));
        assert_eq!(layout.map(CellCoord::new(127, 127)), PanelCoord::new(128, 0));
        assert_eq!(layout.map(CellCoord::new(10, 100)), PanelCoord::new(245, 27));
    }

    #[test]
    fn folded_layout_lights_every_pixel_once() {
        let layout = PanelLayout::new(GridSize::new(128, 128), PanelSize::new(256, 64))
            .expect("valid layout");
        let mut seen = HashSet::new();
        for y in 0..128 {
            for x in 0..128 {
                assert!(seen.insert(layout.map(CellCoord::new(x, y))));
            }
        }
        assert_eq!(seen.len(), layout.panel().pixel_count());
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert!(PanelLayout::new(GridSize::new(0, 64), PanelSize::new(128, 64)).is_err());
        assert!(PanelLayout::new(GridSize::new(128, 129), PanelSize::new(256, 64)).is_err());
    }

    proptest! {
        #[test]
        fn fold_matches_mirror_formula(
            panel_width in 1u32..300,
            panel_height in 1u32..100,
            x_seed in any::<u32>(),
            y_seed in any::<u32>(),
            extra_rows in 0u32..100,
        ) {
            let grid_height = panel_height + extra_rows % (panel_height + 1);
            let layout = PanelLayout::new(
                GridSize::new(panel_width, grid_height),
                PanelSize::new(panel_width, panel_height),
            )
            .expect("layout within fold limits");
            let x = x_seed % panel_width;
            let y = y_seed % grid_height;

            let pixel = layout.map(CellCoord::new(x, y));
            prop_assert!(pixel.x() < panel_width);
            prop_assert!(pixel.y() < panel_height);
            if y < panel_height {
                prop_assert_eq!(pixel, PanelCoord::new(x, y));
            } else {
                prop_assert_eq!(
                    pixel,
                    PanelCoord::new(panel_width - 1 - x, grid_height - 1 - y)
                );
            }
        }
    }
}
