use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Lab, Mix, Srgb};

use crate::data::model::Field;

/// Bars for pollutants that went up.
pub const INCREASE: Color32 = Color32::from_rgb(0xDC, 0x14, 0x3C);
/// Bars for pollutants that went down.
pub const DECREASE: Color32 = Color32::from_rgb(0x1E, 0x90, 0xFF);
/// Highest-station bars.
pub const HIGHEST: Color32 = Color32::from_rgb(0xDC, 0x14, 0x3C);
/// Lowest-station bars.
pub const LOWEST: Color32 = Color32::from_rgb(0x00, 0xCE, 0xD1);
/// Cells with no defined value.
pub const UNDEFINED: Color32 = Color32::GRAY;

// ---------------------------------------------------------------------------
// Series palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl: Hsl = Hsl::new(hue, 0.75, 0.55);
            to_color32(hsl.into_color())
        })
        .collect()
}

/// Stable line colour for a field, used for every chart so PM2.5 always has
/// the same colour.
pub fn field_color(field: Field) -> Color32 {
    let palette = generate_palette(Field::ALL.len());
    let idx = Field::ALL.iter().position(|f| *f == field).unwrap_or(0);
    palette[idx]
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Diverging scale for correlations
// ---------------------------------------------------------------------------

/// Blue (-1) → near-white (0) → red (+1), interpolated in Lab so the midpoint
/// stays neutral. `None` maps to [`UNDEFINED`].
pub fn diverging(value: Option<f64>) -> Color32 {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return UNDEFINED;
    };
    let v = v.clamp(-1.0, 1.0) as f32;

    let cold: Lab = Srgb::new(0.23_f32, 0.30, 0.75).into_color();
    let mid: Lab = Srgb::new(0.87_f32, 0.87, 0.87).into_color();
    let warm: Lab = Srgb::new(0.71_f32, 0.02, 0.15).into_color();

    let mixed = if v < 0.0 {
        mid.mix(cold, -v)
    } else {
        mid.mix(warm, v)
    };
    to_color32(mixed.into_color())
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(10);
        assert_eq!(colors.len(), 10);
        assert_ne!(colors[0], colors[5]);
    }

    #[test]
    fn field_colors_are_distinct() {
        assert_ne!(field_color(Field::Pm25), field_color(Field::Pm10));
        assert_eq!(field_color(Field::O3), field_color(Field::O3));
    }

    #[test]
    fn diverging_ends_are_blue_and_red() {
        let cold = diverging(Some(-1.0));
        let warm = diverging(Some(1.0));
        assert!(cold.b() > cold.r());
        assert!(warm.r() > warm.b());
        assert_eq!(diverging(None), UNDEFINED);
        assert_eq!(diverging(Some(f64::NAN)), UNDEFINED);
    }

    #[test]
    fn text_contrast() {
        assert_eq!(text_on(Color32::WHITE), Color32::BLACK);
        assert_eq!(text_on(Color32::from_rgb(20, 20, 80)), Color32::WHITE);
    }
}
