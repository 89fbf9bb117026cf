//! Unified theme and color constants for the dashboard.
//!
//! Panels, the flow diagram and the color scales all pull their colors from
//! here so the dashboard stays visually consistent.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Flow diagram background - darkest layer
    pub const DIAGRAM: Color32 = Color32::from_rgb(14, 17, 23);

    /// Panel backgrounds - slightly lighter than the diagram
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Card/elevated surface backgrounds
    pub const SURFACE: Color32 = Color32::from_rgb(28, 30, 38);
}

/// Node fill colors
pub mod node {
    use super::*;

    /// Default node fill
    pub const PURPLE_500: Color32 = Color32::from_rgb(108, 95, 199);

    /// Selected/hovered node fill
    pub const PURPLE_400: Color32 = Color32::from_rgb(142, 131, 214);
}

/// Link ribbon opacity
pub mod link {
    pub const FOCUSED_OPACITY: f32 = 0.9;
    pub const BLURRED_OPACITY: f32 = 0.5;
}

/// Tooltip colors
pub mod tooltip {
    use super::*;

    pub const BACKGROUND: Color32 = Color32::from_rgb(48, 40, 57);
    pub const DIVIDER: Color32 = Color32::from_rgb(100, 85, 116);
    pub const SERIES_TEXT: Color32 = Color32::from_rgb(149, 133, 163);
    pub const MARKER: Color32 = Color32::from_rgb(68, 70, 116);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    /// Primary text - high contrast
    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    /// Secondary text - medium contrast
    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    /// Muted text - low contrast for less important info
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// State colors
pub mod state {
    use super::*;

    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
}

/// Skeleton loading placeholder colors
pub mod skeleton {
    use super::*;

    /// Base skeleton background
    pub const BASE: Color32 = Color32::from_rgb(35, 38, 48);

    /// Animated shimmer highlight
    pub const SHIMMER: Color32 = Color32::from_rgb(50, 53, 63);
}

const CHART_PALETTE: [Color32; 5] = [
    Color32::from_rgb(68, 70, 116),
    Color32::from_rgb(122, 80, 136),
    Color32::from_rgb(184, 85, 134),
    Color32::from_rgb(233, 98, 110),
    Color32::from_rgb(245, 140, 70),
];

/// Five-step chart palette, cool to hot.
pub fn chart_palette() -> &'static [Color32; 5] {
    &CHART_PALETTE
}

/// Create a skeleton rectangle for loading placeholders
pub fn skeleton_rect(ui: &mut egui::Ui, width: f32, height: f32) {
    let (rect, _) = ui.allocate_exact_size(egui::Vec2::new(width, height), egui::Sense::hover());

    // Animate the shimmer effect
    let time = ui.ctx().input(|i| i.time);
    let phase = (time * 2.0).sin() * 0.5 + 0.5;

    let color = Color32::from_rgb(
        lerp_u8(skeleton::BASE.r(), skeleton::SHIMMER.r(), phase as f32),
        lerp_u8(skeleton::BASE.g(), skeleton::SHIMMER.g(), phase as f32),
        lerp_u8(skeleton::BASE.b(), skeleton::SHIMMER.b(), phase as f32),
    );

    ui.painter().rect_filled(rect, 4.0, color);
    ui.ctx().request_repaint();
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let result = a as f32 + (b as f32 - a as f32) * t;
    result.clamp(0.0, 255.0) as u8
}

/// Apply alpha in 0..=1 to a color.
pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
