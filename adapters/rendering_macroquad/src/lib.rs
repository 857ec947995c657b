#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed panel emulator for Outbreak.
//!
//! Every published framebuffer pixel is drawn as a square LED, scaled to fit
//! the window while keeping the panel's aspect ratio.

use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_pressed, KeyCode};
use outbreak_core::PanelSize;
use outbreak_rendering::{FrameControl, Framebuffer, Presentation, RenderingBackend, Rgb};
use tracing::info;

/// Fraction of each LED cell left dark between neighbouring LEDs.
const LED_GAP: f32 = 0.15;

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that keeps the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronises presentation with the display refresh rate, or renders as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = Some(i32::from(enabled));
        self
    }

    /// Logs rendered frames and automaton ticks per second once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_frame: F) -> Result<()>
    where
        F: FnMut(&mut Framebuffer) -> FrameControl + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;
        let Presentation {
            window_title,
            panel,
            background,
        } = presentation;

        let (window_width, window_height) = initial_window_size(panel);
        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut framebuffer = Framebuffer::new(panel, background);
            let mut rate_meter = RateMeter::default();
            let frame_background = to_macroquad_color(Rgb::BLACK);

            loop {
                if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
                    break;
                }

                let control = update_frame(&mut framebuffer);

                macroquad::window::clear_background(frame_background);
                let metrics = LedMetrics::fit(
                    panel,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                draw_panel(&framebuffer, &metrics);

                if show_fps {
                    let dt_seconds = macroquad::time::get_frame_time();
                    let frame = Duration::from_secs_f32(dt_seconds.max(0.0));
                    if let Some(rates) =
                        rate_meter.record_frame(frame, framebuffer.frames_presented())
                    {
                        info!(
                            fps = rates.frames_per_second,
                            ticks_per_second = rates.ticks_per_second,
                            "render rate"
                        );
                    }
                }

                macroquad::window::next_frame().await;

                if control == FrameControl::Stop {
                    break;
                }
            }
        });

        Ok(())
    }
}

fn initial_window_size(panel: PanelSize) -> (i32, i32) {
    let longest = panel.width().max(panel.height()).max(1);
    let pitch = (1024 / longest).clamp(1, 16);
    let width = (panel.width() * pitch).max(64);
    let height = (panel.height() * pitch).max(64);
    (
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

/// Placement of the LED array inside the window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LedMetrics {
    origin: Vec2,
    pitch: f32,
    diameter: f32,
}

impl LedMetrics {
    fn fit(panel: PanelSize, screen_width: f32, screen_height: f32) -> Self {
        let columns = panel.width().max(1) as f32;
        let rows = panel.height().max(1) as f32;
        let pitch = (screen_width / columns).min(screen_height / rows).max(0.0);
        let used = Vec2::new(columns * pitch, rows * pitch);
        let screen = Vec2::new(screen_width, screen_height);
        Self {
            origin: ((screen - used) * 0.5).max(Vec2::ZERO),
            pitch,
            diameter: pitch * (1.0 - LED_GAP),
        }
    }

    fn led_origin(&self, column: u32, row: u32) -> Vec2 {
        let inset = (self.pitch - self.diameter) * 0.5;
        self.origin + Vec2::new(column as f32, row as f32) * self.pitch + Vec2::splat(inset)
    }
}

fn draw_panel(framebuffer: &Framebuffer, metrics: &LedMetrics) {
    let width = framebuffer.size().width().max(1) as usize;
    for (index, pixel) in framebuffer.front().iter().enumerate() {
        if *pixel == Rgb::BLACK {
            continue;
        }
        let column = (index % width) as u32;
        let row = (index / width) as u32;
        let origin = metrics.led_origin(column, row);
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            metrics.diameter,
            metrics.diameter,
            to_macroquad_color(*pixel),
        );
    }
}

fn to_macroquad_color(color: Rgb) -> macroquad::color::Color {
    macroquad::color::Color::from_rgba(color.red(), color.green(), color.blue(), 255)
}

/// Per-second rates of rendered frames and published automaton frames.
#[derive(Debug, Default)]
struct RateMeter {
    elapsed: Duration,
    frames: u32,
    ticks_reported: u64,
}

#[derive(Clone, Copy, Debug)]
struct Rates {
    frames_per_second: f32,
    ticks_per_second: f32,
}

impl RateMeter {
    /// Records one rendered frame; `ticks` is the running count of published
    /// automaton frames. Returns the rates once a second has elapsed.
    fn record_frame(&mut self, frame: Duration, ticks: u64) -> Option<Rates> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let ticked = ticks.saturating_sub(self.ticks_reported);
        let rates = Rates {
            frames_per_second: self.frames as f32 / seconds,
            ticks_per_second: ticked as f32 / seconds,
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.ticks_reported = ticks;
        Some(rates)
    }
}
