use outbreak_core::{PanelCoord, PanelSize};

use crate::{DisplayDriver, Rgb};

/// In-memory stand-in for a double-buffered LED panel.
///
/// Pixels are staged into a back buffer and become visible on [`flip`]. The
/// published buffer is streamed one row per transfer completion, mimicking a
/// panel that refreshes rows from DMA.
///
/// [`flip`]: DisplayDriver::flip
#[derive(Clone, Debug)]
pub struct Framebuffer {
    size: PanelSize,
    background: Rgb,
    staging: Vec<Rgb>,
    front: Vec<Rgb>,
    frames_presented: u64,
    streamed_row: u32,
    transfers_completed: u64,
}

impl Framebuffer {
    /// Creates a framebuffer with both buffers filled with the background colour.
    #[must_use]
    pub fn new(size: PanelSize, background: Rgb) -> Self {
        let pixels = size.pixel_count();
        Self {
            size,
            background,
            staging: vec![background; pixels],
            front: vec![background; pixels],
            frames_presented: 0,
            streamed_row: 0,
            transfers_completed: 0,
        }
    }

    /// Panel dimensions.
    #[must_use]
    pub const fn size(&self) -> PanelSize {
        self.size
    }

    /// Published pixels in row-major order.
    #[must_use]
    pub fn front(&self) -> &[Rgb] {
        &self.front
    }

    /// Published colour of a single pixel, or `None` outside the panel.
    #[must_use]
    pub fn pixel(&self, pixel: PanelCoord) -> Option<Rgb> {
        self.index_of(pixel).map(|index| self.front[index])
    }

    /// Number of frames published through [`DisplayDriver::flip`].
    #[must_use]
    pub const fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Row the simulated refresh will stream next.
    #[must_use]
    pub const fn streamed_row(&self) -> u32 {
        self.streamed_row
    }

    /// Number of transfer completions received.
    #[must_use]
    pub const fn transfers_completed(&self) -> u64 {
        self.transfers_completed
    }

    fn index_of(&self, pixel: PanelCoord) -> Option<usize> {
        if pixel.x() >= self.size.width() || pixel.y() >= self.size.height() {
            return None;
        }
        Some(pixel.y() as usize * self.size.width() as usize + pixel.x() as usize)
    }
}

impl DisplayDriver for Framebuffer {
    fn clear(&mut self) {
        self.staging.fill(self.background);
    }

    fn set_color(&mut self, pixel: PanelCoord, color: Rgb) {
        if let Some(index) = self.index_of(pixel) {
            self.staging[index] = color;
        }
    }

    fn flip(&mut self, clear_background: bool) {
        std::mem::swap(&mut self.staging, &mut self.front);
        if clear_background {
            self.staging.fill(self.background);
        } else {
            self.staging.copy_from_slice(&self.front);
        }
        self.frames_presented += 1;
    }

    fn transfer_complete(&mut self) {
        self.transfers_completed += 1;
        if self.size.height() > 0 {
            self.streamed_row = (self.streamed_row + 1) % self.size.height();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREY: Rgb = Rgb::new(8, 8, 8);

    #[test]
    fn staged_pixels_appear_only_after_flip() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(4, 2), Rgb::BLACK);
        framebuffer.set_color(PanelCoord::new(3, 1), RED);
        assert_eq!(framebuffer.pixel(PanelCoord::new(3, 1)), Some(Rgb::BLACK));

        framebuffer.flip(true);
        assert_eq!(framebuffer.pixel(PanelCoord::new(3, 1)), Some(RED));
        assert_eq!(framebuffer.frames_presented(), 1);
    }

    #[test]
    fn flip_with_background_resets_staging() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 2), GREY);
        framebuffer.set_color(PanelCoord::new(0, 0), RED);
        framebuffer.flip(true);
        framebuffer.flip(true);
        assert!(framebuffer.front().iter().all(|pixel| *pixel == GREY));
    }

    #[test]
    fn flip_without_background_keeps_previous_frame() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 2), GREY);
        framebuffer.set_color(PanelCoord::new(1, 0), RED);
        framebuffer.flip(false);
        framebuffer.flip(false);
        assert_eq!(framebuffer.pixel(PanelCoord::new(1, 0)), Some(RED));
    }

    #[test]
    fn clear_discards_staged_pixels() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 2), GREY);
        framebuffer.set_color(PanelCoord::new(0, 0), RED);
        framebuffer.clear();
        framebuffer.flip(false);
        assert_eq!(framebuffer.pixel(PanelCoord::new(0, 0)), Some(GREY));
        assert_eq!(framebuffer.frames_presented(), 1);
    }

    #[test]
    fn clear_leaves_published_frame_alone() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 1), Rgb::BLACK);
        framebuffer.set_color(PanelCoord::new(1, 0), RED);
        framebuffer.flip(false);
        framebuffer.clear();
        assert_eq!(framebuffer.pixel(PanelCoord::new(1, 0)), Some(RED));
        framebuffer.flip(false);
        assert_eq!(framebuffer.pixel(PanelCoord::new(1, 0)), Some(Rgb::BLACK));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 2), Rgb::BLACK);
        framebuffer.set_color(PanelCoord::new(2, 0), RED);
        framebuffer.set_color(PanelCoord::new(0, 9), RED);
        framebuffer.flip(true);
        assert!(framebuffer.front().iter().all(|pixel| *pixel == Rgb::BLACK));
        assert_eq!(framebuffer.pixel(PanelCoord::new(2, 0)), None);
    }

    #[test]
    fn transfer_completions_stream_rows_cyclically() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 3), Rgb::BLACK);
        for _ in 0..4 {
            framebuffer.transfer_complete();
        }
        assert_eq!(framebuffer.transfers_completed(), 4);
        assert_eq!(framebuffer.streamed_row(), 1);
    }
}
