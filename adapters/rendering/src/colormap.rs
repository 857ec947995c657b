use outbreak_core::{ColormapSettings, Intensity, ValueCurve, INTENSITY_LEVELS};

use crate::{hsv_to_rgb, Rgb};

/// Immutable intensity-to-colour lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Colormap {
    entries: [Rgb; INTENSITY_LEVELS],
}

impl Colormap {
    /// Builds the table with the built-in HSV conversion.
    #[must_use]
    pub fn build(settings: &ColormapSettings) -> Self {
        Self::build_with(settings, hsv_to_rgb)
    }

    /// Builds the table with a caller-supplied `(hue, saturation, value) -> Rgb` conversion.
    #[must_use]
    pub fn build_with<F>(settings: &ColormapSettings, convert: F) -> Self
    where
        F: Fn(f32, f32, f32) -> Rgb,
    {
        let mut entries = [Rgb::BLACK; INTENSITY_LEVELS];
        for (index, entry) in entries.iter_mut().enumerate() {
            if index == 0 && settings.black_dormant {
                continue;
            }
            let fraction = index as f32 / 255.0;
            let hue = settings.hue_start + fraction * settings.hue_span;
            let value = match settings.value {
                ValueCurve::Linear => fraction,
                ValueCurve::Fixed { level } => level,
            };
            *entry = convert(hue, settings.saturation, value);
        }
        Self { entries }
    }

    /// Colour assigned to an intensity.
    #[must_use]
    pub fn color(&self, intensity: Intensity) -> Rgb {
        self.entries[usize::from(intensity.get())]
    }

    /// Every entry, indexed by intensity.
    #[must_use]
    pub fn entries(&self) -> &[Rgb; INTENSITY_LEVELS] {
        &self.entries
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::build(&ColormapSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn dormant_entry_is_black_when_requested() {
        let colormap = Colormap::build(&ColormapSettings {
            value: ValueCurve::Fixed { level: 1.0 },
            black_dormant: true,
            ..ColormapSettings::default()
        });
        assert_eq!(colormap.color(Intensity::DORMANT), Rgb::BLACK);
        assert_ne!(colormap.color(Intensity::new(1)), Rgb::BLACK);
    }

    #[test]
    fn dormant_entry_samples_curve_when_not_special_cased() {
        let settings = ColormapSettings {
            value: ValueCurve::Fixed { level: 1.0 },
            black_dormant: false,
            ..ColormapSettings::default()
        };
        let colormap = Colormap::build(&settings);
        assert_eq!(
            colormap.color(Intensity::DORMANT),
            hsv_to_rgb(settings.hue_start, settings.saturation, 1.0)
        );
    }

    #[test]
    fn curve_interpolates_hue_and_value() {
        let calls = RefCell::new(Vec::new());
        let settings = ColormapSettings::default();
        let _colormap = Colormap::build_with(&settings, |hue, saturation, value| {
            calls.borrow_mut().push((hue, saturation, value));
            Rgb::BLACK
        });

        let calls = calls.into_inner();
        assert_eq!(calls.len(), 255, "dormant entry bypasses the conversion");
        let (hue, saturation, value) = calls[calls.len() - 1];
        assert!((hue - (0.4 + 0.375)).abs() < 1e-6);
        assert!((saturation - 0.875).abs() < f32::EPSILON);
        assert!((value - 1.0).abs() < f32::EPSILON);
        let (first_hue, _, first_value) = calls[0];
        assert!((first_hue - (0.4 + 0.375 / 255.0)).abs() < 1e-6);
        assert!((first_value - 1.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn saturated_entry_is_brightest_with_linear_value() {
        let colormap = Colormap::default();
        let brightness = |rgb: Rgb| u32::from(rgb.red()) + u32::from(rgb.green()) + u32::from(rgb.blue());
        assert!(
            brightness(colormap.color(Intensity::SATURATED))
                > brightness(colormap.color(Intensity::new(32)))
        );
    }
}
