//! Plan-change vs. misery insights panel.

use crate::api::QueryResult;
use crate::filters::FilterSelection;
use crate::theme;
use eframe::egui::{RichText, Ui};
use egui_plot::{Plot, Points};

/// The panel only makes sense for plan changes colored by misery.
pub fn is_available(filters: &FilterSelection) -> bool {
    filters.is_value_plan_changes() && filters.is_heat_misery()
}

/// Scatter points as `[plan_change_count, percent_misery]`.
pub fn scatter_points(result: Option<&QueryResult>) -> Vec<[f64; 2]> {
    result
        .map(|r| {
            r.scatter_data
                .iter()
                .map(|p| [p.plan_change_count, p.percent_misery])
                .collect()
        })
        .unwrap_or_default()
}

/// Render the panel; `show` toggles between the reveal button and the plot.
pub fn render_insights_panel(ui: &mut Ui, result: Option<&QueryResult>, show: &mut bool) {
    if !*show {
        if ui.button("⚡ Show me some magic").clicked() {
            *show = true;
        }
        return;
    }

    let correlation = result
        .and_then(|r| r.meta.correlation)
        .map(|c| format!("{:.3}", c))
        .unwrap_or_else(|| "—".to_string());
    ui.horizontal(|ui| {
        ui.label(RichText::new("📈").size(16.0));
        ui.vertical(|ui| {
            ui.label(RichText::new("Correlation").color(theme::text::PRIMARY));
            ui.label(RichText::new(correlation).color(theme::text::MUTED));
        });
    });

    let points = Points::new(scatter_points(result))
        .radius(4.0)
        .color(theme::chart_palette()[0])
        .name("sessions");

    Plot::new("plan_change_misery")
        .width(200.0)
        .height(200.0)
        .x_axis_label("plan changes")
        .y_axis_label("misery %")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.points(points));

    ui.add_space(4.0);
    if ui.small_button("Hide").clicked() {
        *show = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures::GROUPED_SESSIONS;
    use crate::filters::{heat_types, value_types};

    #[test]
    fn available_only_for_plan_changes_and_misery() {
        let mut filters = FilterSelection::default();
        assert!(!is_available(&filters));
        filters.value = value_types()[2].clone();
        assert!(!is_available(&filters));
        filters.heat = heat_types()[1].clone();
        assert!(is_available(&filters));
    }

    #[test]
    fn scatter_points_from_result() {
        let result = QueryResult::from_json(GROUPED_SESSIONS).unwrap();
        assert_eq!(scatter_points(Some(&result)), vec![[1.0, 0.5], [4.0, 2.0]]);
        assert!(scatter_points(None).is_empty());
    }
}
