use palette::{LinSrgb, Mix, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Heatmap colour scale
// ---------------------------------------------------------------------------

/// Anchor colours of the "inferno" map, dark to light, evenly spaced.
const INFERNO: [(u8, u8, u8); 11] = [
    (0, 0, 4),
    (22, 11, 57),
    (66, 10, 104),
    (106, 23, 110),
    (147, 38, 103),
    (188, 55, 84),
    (221, 81, 58),
    (243, 120, 25),
    (252, 165, 10),
    (246, 215, 70),
    (252, 255, 164),
];

/// Background luminance above which annotations are drawn in black.
const LIGHT_BACKGROUND: f32 = 0.408;

fn to_linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

fn to_rgb(color: LinSrgb) -> RGBColor {
    let srgb: Srgb<u8> = Srgb::<f32>::from_linear(color).into_format();
    RGBColor(srgb.red, srgb.green, srgb.blue)
}

/// Maps similarity percentages to colours on a reversed inferno scale:
/// high similarity is dark, low similarity light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapScale {
    pub vmin: f64,
    pub vmax: f64,
}

impl HeatmapScale {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        HeatmapScale { vmin, vmax }
    }

    /// Position of `value` on the scale, clamped to `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f64 {
        let range = self.vmax - self.vmin;
        if range.abs() < f64::EPSILON {
            return 1.0;
        }
        ((value - self.vmin) / range).clamp(0.0, 1.0)
    }

    /// Colour of a cell holding `value`.
    pub fn color_for(&self, value: f64) -> RGBColor {
        let t = (1.0 - self.fraction(value)) as f32 * (INFERNO.len() - 1) as f32;
        let lower = (t.floor() as usize).min(INFERNO.len() - 2);
        let mixed = to_linear(INFERNO[lower]).mix(to_linear(INFERNO[lower + 1]), t - lower as f32);
        to_rgb(mixed)
    }
}

// ---------------------------------------------------------------------------
// Annotation contrast
// ---------------------------------------------------------------------------

/// Relative luminance of a colour, 0 (black) to 1 (white).
pub fn luminance(color: RGBColor) -> f32 {
    let lin = to_linear((color.0, color.1, color.2));
    0.2126 * lin.red + 0.7152 * lin.green + 0.0722 * lin.blue
}

/// Black text on light cells, white text on dark ones.
pub fn annotation_color(background: RGBColor) -> RGBColor {
    if luminance(background) > LIGHT_BACKGROUND {
        RGBColor(0, 0, 0)
    } else {
        RGBColor(255, 255, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_of_the_scale() {
        let scale = HeatmapScale::new(20.0, 100.0);
        assert_eq!(scale.color_for(100.0), RGBColor(0, 0, 4));
        assert_eq!(scale.color_for(20.0), RGBColor(252, 255, 164));
        // Out-of-range values clamp to the ends.
        assert_eq!(scale.color_for(5.0), RGBColor(252, 255, 164));
    }

    #[test]
    fn higher_similarity_is_darker() {
        let scale = HeatmapScale::new(0.0, 100.0);
        let steps: Vec<f32> = (0..=10)
            .map(|k| luminance(scale.color_for(k as f64 * 10.0)))
            .collect();
        assert!(steps.windows(2).all(|w| w[0] > w[1]), "{steps:?}");
    }

    #[test]
    fn flat_scale_uses_darkest_colour() {
        let scale = HeatmapScale::new(100.0, 100.0);
        assert_eq!(scale.color_for(100.0), RGBColor(0, 0, 4));
    }

    #[test]
    fn annotation_contrasts_with_cell() {
        assert_eq!(annotation_color(RGBColor(0, 0, 4)), RGBColor(255, 255, 255));
        assert_eq!(annotation_color(RGBColor(252, 255, 164)), RGBColor(0, 0, 0));
    }
}
