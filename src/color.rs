use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::FieldValue;

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
// Color mapping: cohort value → Color32
// ---------------------------------------------------------------------------

/// Maps the unique values of the group-by column to distinct colours, so a
/// cohort keeps its colour across the scatter, curve, and filter list.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<FieldValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &std::collections::BTreeSet<FieldValue>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<FieldValue, Color32> = unique_values
            .iter()
            .zip(palette.into_iter())
            .map(|(v, c): (&FieldValue, Color32)| (v.clone(), c))
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given cohort value.
    pub fn color_for(&self, value: &FieldValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn distinct_values_get_distinct_colors() {
        let values: BTreeSet<FieldValue> = ["Yes", "No", "Unknown"]
            .iter()
            .map(|s| FieldValue::String(s.to_string()))
            .collect();
        let map = ColorMap::new("Member", &values);
        let colors: BTreeSet<[u8; 3]> = values
            .iter()
            .map(|v| {
                let c = map.color_for(v);
                [c.r(), c.g(), c.b()]
            })
            .collect();
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn unknown_value_falls_back_to_default() {
        let values: BTreeSet<FieldValue> =
            std::iter::once(FieldValue::String("Yes".into())).collect();
        let map = ColorMap::new("Member", &values);
        assert_eq!(map.color_for(&FieldValue::Null), Color32::GRAY);
    }
}
