use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

use crate::data::model::Clarity;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Clarity palette: grade → Color32
// ---------------------------------------------------------------------------

/// Maps clarity grades to distinct colours, worst → best along the hue
/// circle, for the projection scatter and its legend.
#[derive(Debug, Clone)]
pub struct ClarityPalette {
    mapping: BTreeMap<Clarity, Color32>,
    default_color: Color32,
}

impl Default for ClarityPalette {
    fn default() -> Self {
        let palette = generate_palette(Clarity::ALL.len());
        let mapping: BTreeMap<Clarity, Color32> =
            Clarity::ALL.into_iter().zip(palette).collect();
        ClarityPalette {
            mapping,
            default_color: Color32::GRAY,
        }
    }
}

impl ClarityPalette {
    pub fn color_for(&self, clarity: Clarity) -> Color32 {
        self.mapping
            .get(&clarity)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Diverging ramp for correlation values
// ---------------------------------------------------------------------------

/// Map a correlation coefficient in [-1, 1] onto a blue → white → red
/// diverging ramp.  `NaN` (undefined correlation) renders gray.
pub fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::from_gray(120);
    }
    let t = (r.clamp(-1.0, 1.0) as f32 + 1.0) / 2.0;
    let cold: Srgb = Srgb::new(0.17, 0.35, 0.70);
    let warm: Srgb = Srgb::new(0.75, 0.16, 0.16);
    let white: Srgb = Srgb::new(0.97, 0.97, 0.97);
    let rgb = if t < 0.5 {
        cold.into_linear().mix(white.into_linear(), t * 2.0)
    } else {
        white.into_linear().mix(warm.into_linear(), (t - 0.5) * 2.0)
    };
    let srgb: Srgb = Srgb::from_linear(rgb);
    Color32::from_rgb(
        (srgb.red * 255.0) as u8,
        (srgb.green * 255.0) as u8,
        (srgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_one_distinct_color_per_grade() {
        let palette = ClarityPalette::default();
        let mut seen = std::collections::BTreeSet::new();
        for grade in Clarity::ALL {
            seen.insert(palette.color_for(grade).to_array());
        }
        assert_eq!(seen.len(), Clarity::ALL.len());
    }

    #[test]
    fn undefined_correlation_renders_gray() {
        assert_eq!(correlation_color(f64::NAN), Color32::from_gray(120));
    }

    #[test]
    fn ramp_endpoints_differ() {
        assert_ne!(correlation_color(-1.0), correlation_color(1.0));
        assert_ne!(correlation_color(0.0), correlation_color(1.0));
    }
}
