//! ANSI truecolour terminal backend.

use std::{
    fmt::{self, Write as _},
    io::{self, Write as _},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use outbreak_core::PanelCoord;
use outbreak_rendering::{FrameControl, Framebuffer, Presentation, RenderingBackend, Rgb};

const ENTER: &str = "\x1b[2J\x1b[?25l";
const LEAVE: &str = "\x1b[0m\x1b[?25h\n";
const HOME: &str = "\x1b[H";

/// Renders the published framebuffer to stdout, two panel rows per text row.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TerminalBackend {
    min_redraw: Duration,
}

impl TerminalBackend {
    /// Backend redrawing at most once per `min_redraw`.
    pub(crate) const fn new(min_redraw: Duration) -> Self {
        Self { min_redraw }
    }
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(33))
    }
}

impl RenderingBackend for TerminalBackend {
    fn run<F>(self, presentation: Presentation, mut update_frame: F) -> Result<()>
    where
        F: FnMut(&mut Framebuffer) -> FrameControl + 'static,
    {
        let mut framebuffer = Framebuffer::new(presentation.panel, presentation.background);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(ENTER.as_bytes())
            .context("failed to prepare terminal")?;

        let mut frame = String::new();
        let mut last_redraw: Option<Instant> = None;
        loop {
            let control = update_frame(&mut framebuffer);
            let due = last_redraw.map_or(true, |at| at.elapsed() >= self.min_redraw);
            if due || control == FrameControl::Stop {
                frame.clear();
                frame.push_str(HOME);
                render_half_blocks(&framebuffer, &mut frame).context("failed to format frame")?;
                out.write_all(frame.as_bytes())
                    .and_then(|()| out.flush())
                    .context("failed to write frame to stdout")?;
                last_redraw = Some(Instant::now());
            }
            if control == FrameControl::Stop {
                break;
            }
        }

        out.write_all(LEAVE.as_bytes())
            .and_then(|()| out.flush())
            .context("failed to restore terminal")
    }
}

/// Appends the framebuffer's published pixels as upper-half-block glyphs.
///
/// The glyph's foreground carries the even row, its background the odd row
/// below it. An odd final row is paired with black.
pub(crate) fn render_half_blocks(framebuffer: &Framebuffer, out: &mut String) -> fmt::Result {
    let size = framebuffer.size();
    for row in (0..size.height()).step_by(2) {
        for column in 0..size.width() {
            let upper = framebuffer
                .pixel(PanelCoord::new(column, row))
                .unwrap_or(Rgb::BLACK);
            let lower = framebuffer
                .pixel(PanelCoord::new(column, row + 1))
                .unwrap_or(Rgb::BLACK);
            write!(
                out,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                upper.red(),
                upper.green(),
                upper.blue(),
                lower.red(),
                lower.green(),
                lower.blue()
            )?;
        }
        out.push_str("\x1b[0m\n");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::PanelSize;
    use outbreak_rendering::DisplayDriver;

    #[test]
    fn pairs_rows_into_half_blocks() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(2, 2), Rgb::BLACK);
        framebuffer.set_color(PanelCoord::new(0, 0), Rgb::new(255, 0, 0));
        framebuffer.set_color(PanelCoord::new(1, 1), Rgb::new(0, 0, 255));
        framebuffer.flip(true);

        let mut out = String::new();
        render_half_blocks(&framebuffer, &mut out).expect("formatting into a String");

        assert_eq!(
            out,
            "\x1b[38;2;255;0;0m\x1b[48;2;0;0;0m\u{2580}\
             \x1b[38;2;0;0;0m\x1b[48;2;0;0;255m\u{2580}\x1b[0m\n"
        );
    }

    #[test]
    fn odd_final_row_is_padded_with_black() {
        let mut framebuffer = Framebuffer::new(PanelSize::new(1, 3), Rgb::new(9, 9, 9));
        framebuffer.flip(true);

        let mut out = String::new();
        render_half_blocks(&framebuffer, &mut out).expect("formatting into a String");

        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with("\x1b[38;2;9;9;9m\x1b[48;2;0;0;0m\u{2580}\x1b[0m\n"));
    }
}
