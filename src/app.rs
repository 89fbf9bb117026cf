//! Main application state and UI.

use crate::api::{ApiClient, QueryResult};
use crate::color::{ColorScale, HeatScales};
use crate::filters::{self, FilterItem, FilterSelection, MAX_DROPDOWN_OPTIONS};
use crate::flow::{self, transform::full_name, DisplayGraph, FlowEvent, FlowState, Highlight};
use crate::insights;
use crate::navigation::{self, History, Location};
use crate::query::{SessionFetcher, SessionQuery};
use crate::settings::Settings;
use crate::summary;
use crate::tags::{self, TagDrilldown};
use crate::theme;
use eframe::egui::{self, RichText};

/// Main dashboard application
pub struct DashboardApp {
    // API client
    api: ApiClient,
    settings: Settings,
    api_url_input: String,

    // Data
    fetcher: SessionFetcher,

    // Filter state
    filters: FilterSelection,
    scales: HeatScales,
    known_users: Vec<FilterItem>,

    // Selection and hover
    selected_node: Option<String>,
    flow: FlowState,

    // Side panels
    show_insights: bool,
    tags: TagDrilldown,

    history: History,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self::with_settings(Settings::load())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let api = ApiClient::new(settings.api_base_url.clone(), settings.request_timeout());
        let history = History::new(
            Location::new(settings.page_path.clone())
                .with_param("query", navigation::build_filter_string(None)),
        );

        Self {
            api,
            api_url_input: settings.api_base_url.clone(),
            settings,
            fetcher: SessionFetcher::new(),
            filters: FilterSelection::default(),
            scales: HeatScales::load_or(theme::node::PURPLE_500),
            known_users: Vec::new(),
            selected_node: None,
            flow: FlowState::default(),
            show_insights: false,
            tags: TagDrilldown::default(),
            history,
        }
    }

    /// Inputs of the next `/groupedsessions` request.
    fn current_query(&self) -> SessionQuery {
        SessionQuery::new(self.selected_node.as_deref(), &self.filters)
    }

    fn data(&self) -> Option<&QueryResult> {
        self.fetcher.state().data.as_ref()
    }

    /// Populate the user dropdown once; later lists never overwrite it.
    fn set_known_users(&mut self, users: Vec<FilterItem>) {
        if self.known_users.is_empty() && !users.is_empty() {
            tracing::debug!("Known users set to {} entries", users.len());
            self.known_users = users;
        }
    }

    /// Select (or clear) a node by full name and record the navigation.
    fn set_selected_node(&mut self, node: Option<String>) {
        self.selected_node = node;
        let next = navigation::selection_location(self.history.current(), self.selected_node.as_deref());
        self.history.push(next);
    }

    fn filter_string(&self) -> String {
        navigation::build_filter_string(self.selected_node.as_deref())
    }

    fn color_scale(&self) -> &ColorScale {
        self.scales.for_heat(&self.filters.heat.value)
    }

    fn set_value_item(&mut self, item: FilterItem) {
        self.filters.value = item;
        self.show_insights = false;
    }

    fn set_user_item(&mut self, item: FilterItem) {
        if item != self.filters.user {
            self.filters.user = item;
            self.filters.session = filters::default_session_item();
        }
    }

    fn user_options(&self) -> Vec<FilterItem> {
        std::iter::once(filters::default_user_item())
            .chain(self.known_users.iter().take(MAX_DROPDOWN_OPTIONS).cloned())
            .collect()
    }

    fn session_options(&self) -> Vec<FilterItem> {
        let mut options = vec![filters::default_session_item()];
        if let Some(data) = self.data() {
            options.extend(data.session_options());
        }
        options
    }

    /// Index of the selected node within the current payload.
    fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_node.as_deref()?;
        self.data()?
            .data
            .nodes
            .iter()
            .position(|n| full_name(&n.name) == selected)
    }

    fn highlight(&self) -> Highlight {
        Highlight {
            selected_node: self.selected_index(),
            active_node: self.flow.active_node,
            active_link: self.flow.active_link,
        }
    }

    fn display_graph(&self) -> DisplayGraph {
        flow::build_display_graph(self.data(), self.color_scale(), &self.highlight())
    }

    fn handle_flow_event(&mut self, event: FlowEvent, graph: &DisplayGraph) {
        match event {
            FlowEvent::NodeClicked(index) => {
                if let Some(node) = graph.node(index) {
                    self.set_selected_node(Some(node.full_name.clone()));
                }
            }
            FlowEvent::SelectionCleared => self.set_selected_node(None),
        }
    }

    /// Apply finished requests and start a new one if the inputs changed.
    fn sync_data(&mut self) {
        if let Some(users) = self.fetcher.poll() {
            self.flow.clear();
            self.set_known_users(users);
        }

        let query = self.current_query();
        if self.fetcher.needs_fetch(&query) {
            self.fetcher.request(&self.api, query);
        }
    }

    fn apply_api_url(&mut self) {
        let url = self.api_url_input.trim().to_string();
        if url.is_empty() || url == self.settings.api_base_url {
            return;
        }
        self.settings.api_base_url = url;
        self.settings.save();
        self.api = ApiClient::new(self.settings.api_base_url.clone(), self.settings.request_timeout());
        tracing::info!("API base URL set to {}", self.api.base_url());
        self.fetcher.invalidate();
    }

    fn render_filter_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if let Some(item) = filter_dropdown(ui, "op", "Type", &filters::op_types(), &self.filters.op, false, true) {
                self.filters.op = item;
            }
            if let Some(item) =
                filter_dropdown(ui, "value", "Value", &filters::value_types(), &self.filters.value, false, true)
            {
                self.set_value_item(item);
            }
            if let Some(item) =
                filter_dropdown(ui, "heat", "Heat", &filters::heat_types(), &self.filters.heat, false, true)
            {
                self.filters.heat = item;
            }
            let users = self.user_options();
            if let Some(item) = filter_dropdown(ui, "user", "User", &users, &self.filters.user, true, true) {
                self.set_user_item(item);
            }
            let sessions = self.session_options();
            let session_enabled = self.filters.session_enabled();
            if let Some(item) =
                filter_dropdown(ui, "session", "Session", &sessions, &self.filters.session, false, session_enabled)
            {
                self.filters.session = item;
            }
        });

        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.history.len() > 1, egui::Button::new("←").small())
                .on_hover_text("Back")
                .clicked()
            {
                self.history.back();
            }
            ui.label(
                RichText::new(self.history.current().to_url())
                    .small()
                    .monospace()
                    .color(theme::text::MUTED),
            );
        });
    }

    fn render_side_panel(&mut self, ui: &mut egui::Ui) {
        summary::render_summary_panel(ui, self.data().map(|d| &d.meta));

        if insights::is_available(&self.filters) {
            ui.separator();
            let data = self.fetcher.state().data.as_ref();
            insights::render_insights_panel(ui, data, &mut self.show_insights);
        }

        ui.separator();
        egui::CollapsingHeader::new("Tag drill-down")
            .default_open(false)
            .show(ui, |ui| {
                let organization = self.settings.organization_slug.clone();
                if let Some(location) = tags::render_tag_drilldown(ui, &mut self.tags, &self.api, &organization) {
                    self.history.push(location);
                }
            });

        egui::CollapsingHeader::new("Connection")
            .default_open(false)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("Connected to {}", self.api.base_url()))
                        .small()
                        .color(theme::text::MUTED),
                );
                ui.label(RichText::new("API base URL").small().color(theme::text::MUTED));
                ui.text_edit_singleline(&mut self.api_url_input);
                if ui.button("Apply").clicked() {
                    self.apply_api_url();
                }
            });
    }

    fn render_flow(&mut self, ui: &mut egui::Ui) {
        let state = self.fetcher.state();
        if state.is_loading {
            ui.add_space(8.0);
            theme::skeleton_rect(ui, ui.available_width(), flow::transform::VIS_HEIGHT);
            return;
        }
        if let Some(ref err) = state.error {
            ui.colored_label(theme::state::ERROR, err);
        }

        let graph = self.display_graph();
        let heat = self.filters.heat.clone();
        let value = self.filters.value.clone();
        let events = flow::render_flow_diagram(
            ui,
            &mut self.flow,
            &graph,
            &heat,
            &value,
            self.selected_node.is_some(),
        );
        for event in events {
            self.handle_flow_event(event, &graph);
        }

        ui.add_space(6.0);
        ui.label(
            RichText::new(self.filter_string())
                .small()
                .monospace()
                .color(theme::text::SECONDARY),
        );
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_data();
        let tags_pending = self.tags.poll();

        if self.fetcher.is_loading() || tags_pending {
            ctx.request_repaint();
        }

        // Dark theme
        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::right("summary")
            .min_width(240.0)
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::same(20.0)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_side_panel(ui);
                });
            });

        egui::TopBottomPanel::top("filters")
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::SURFACE)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
            )
            .show(ctx, |ui| {
                self.render_filter_bar(ui);
            });

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::DIAGRAM)
                    .inner_margin(egui::Margin::same(8.0)),
            )
            .show(ctx, |ui| {
                self.render_flow(ui);
            });
    }
}

/// A prefixed dropdown over `items`. Returns the newly picked option.
///
/// With `redacted` set, non-sentinel options show only their ordinal.
fn filter_dropdown(
    ui: &mut egui::Ui,
    id: &str,
    prefix: &str,
    items: &[FilterItem],
    current: &FilterItem,
    redacted: bool,
    enabled: bool,
) -> Option<FilterItem> {
    let mut picked = None;
    let selected_text = format!("{}: {}", prefix, filters::selected_label(items, current, redacted));

    ui.add_enabled_ui(enabled, |ui| {
        egui::ComboBox::from_id_salt(id)
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (index, item) in items.iter().enumerate() {
                    let label = filters::option_label(item, index, redacted);
                    if ui.selectable_label(item == current, label).clicked() && item != current {
                        picked = Some(item.clone());
                    }
                }
            });
    });

    picked
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
