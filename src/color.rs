use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::{AuditStatus, OrderedCategory};

// ---------------------------------------------------------------------------
// Fixed audit-status colours
// ---------------------------------------------------------------------------

/// Red → orange → green → blue, worst to best.
pub fn status_color(status: AuditStatus) -> Color32 {
    match status {
        AuditStatus::BelowExpectation => Color32::from_rgb(0xd6, 0x27, 0x28),
        AuditStatus::NeedsImprovement => Color32::from_rgb(0xff, 0x7f, 0x0e),
        AuditStatus::MeetsExpectation => Color32::from_rgb(0x2c, 0xa0, 0x2c),
        AuditStatus::Outstanding => Color32::from_rgb(0x1f, 0x77, 0xb4),
    }
}

/// Colour for a raw status label; labels outside the enumeration are grey.
pub fn status_label_color(label: &str) -> Color32 {
    AuditStatus::parse(label)
        .map(status_color)
        .unwrap_or(Color32::GRAY)
}

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
            let hsl = Hsl::new(hue, 0.65, 0.5);
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
// Color mapping: group label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of a categorical field (stores, countries) to distinct colours.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let labels: Vec<&String> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(l, c)| (l.clone(), c))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}
