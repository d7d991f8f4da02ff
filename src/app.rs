use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AuditDashboardApp {
    pub state: AppState,
}

impl AuditDashboardApp {
    /// Start the dashboard, loading `initial` right away when given.
    pub fn new(initial: Option<PathBuf>) -> Self {
        let mut app = Self::default();
        if let Some(path) = initial {
            if let Err(e) = app.state.open(&path) {
                log::error!("{e:#}");
                app.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
        app
    }
}

impl eframe::App for AuditDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::dashboard(ui, &self.state);
        });
    }
}
