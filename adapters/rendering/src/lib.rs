#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared display contracts for Outbreak adapters.
//!
//! The automaton never talks to panel hardware directly. It stages pixels
//! through the [`DisplayDriver`] trait, projects grid cells onto panel pixels
//! with a [`PanelLayout`], and colours them through a precomputed
//! [`Colormap`]. Backends that own a presentation surface implement
//! [`RenderingBackend`] and drive the frame loop through a closure.

mod colormap;
mod completion;
mod framebuffer;
mod layout;

pub use colormap::Colormap;
pub use completion::{completion_channel, CompletionReceiver, CompletionSender};
pub use framebuffer::Framebuffer;
pub use layout::{fold_to_panel, PanelLayout};

use anyhow::Result as AnyResult;
use outbreak_core::{PanelCoord, PanelSize};

/// Opaque 8-bit-per-channel pixel colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Pure black, the colour of an unlit LED.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a new colour from byte RGB components.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Converts hue, saturation and value (all fractions) into an RGB colour.
///
/// Hue wraps around the unit circle; saturation and value are clamped into
/// `0.0..=1.0`.
#[must_use]
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb {
    let hue = hue.rem_euclid(1.0) * 6.0;
    let saturation = saturation.clamp(0.0, 1.0);
    let value = value.clamp(0.0, 1.0);

    let sector = hue.floor();
    let fraction = hue - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - fraction * saturation);
    let t = value * (1.0 - (1.0 - fraction) * saturation);

    let (red, green, blue) = match sector as u32 % 6 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    Rgb::new(to_channel(red), to_channel(green), to_channel(blue))
}

fn to_channel(fraction: f32) -> u8 {
    (fraction.clamp(0.0, 1.0) * 255.0) as u8
}

/// Surface that stages pixels and publishes them to panel hardware.
///
/// Implementations are free to stream the published frame asynchronously;
/// the core only promises to forward every transfer-completion notification
/// through [`DisplayDriver::transfer_complete`].
pub trait DisplayDriver {
    /// Resets any pending draw state.
    fn clear(&mut self);

    /// Writes one staged pixel. Coordinates outside the panel are ignored.
    fn set_color(&mut self, pixel: PanelCoord, color: Rgb);

    /// Publishes the staged frame, optionally resetting the staging area to the background.
    fn flip(&mut self, clear_background: bool);

    /// Continues streaming the published frame after a transfer segment finished.
    fn transfer_complete(&mut self);
}

impl<D: DisplayDriver + ?Sized> DisplayDriver for &mut D {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn set_color(&mut self, pixel: PanelCoord, color: Rgb) {
        (**self).set_color(pixel, color);
    }

    fn flip(&mut self, clear_background: bool) {
        (**self).flip(clear_background);
    }

    fn transfer_complete(&mut self) {
        (**self).transfer_complete();
    }
}

/// Whether a backend should keep calling the frame closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Render another frame.
    Continue,
    /// Shut the backend down after presenting this frame.
    Stop,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by windowed backends.
    pub window_title: String,
    /// Physical panel being emulated.
    pub panel: PanelSize,
    /// Colour of unlit pixels.
    pub background: Rgb,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, panel: PanelSize, background: Rgb) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            panel,
            background,
        }
    }
}

/// Rendering backend capable of presenting panel frames.
pub trait RenderingBackend {
    /// Runs the backend until the frame closure asks it to stop or the user exits.
    ///
    /// The provided `update_frame` closure stages and flips exactly one frame
    /// into the framebuffer; the backend then presents the framebuffer's
    /// published pixels.
    fn run<F>(self, presentation: Presentation, update_frame: F) -> AnyResult<()>
    where
        F: FnMut(&mut Framebuffer) -> FrameControl + 'static;
}
