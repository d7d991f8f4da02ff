use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::aggregate::density::DensityDomain;
use crate::color::status_label_color;
use crate::data::model::{AuditStatus, Field, OrderedCategory};
use crate::pipeline::ChartKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and chart options
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Global Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Choices always come from the full dataset so they do not shift as other filters change.
    let choices: Vec<(Field, Vec<String>)> = Field::FILTERABLE
        .iter()
        .map(|&field| {
            let mut values: Vec<String> = dataset
                .distinct(field)
                .map(|v| v.iter().cloned().collect())
                .unwrap_or_default();
            if field == Field::AuditStatus {
                values.sort_by_key(|v| (AuditStatus::parse(v).is_none(), AuditStatus::parse(v)));
            }
            (field, values)
        })
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (field, values) in &choices {
                filter_widget(ui, state, *field, values);
            }

            ui.separator();
            chart_options(ui, state);
        });

    state.refresh();
}

fn filter_widget(ui: &mut Ui, state: &mut AppState, field: Field, values: &[String]) {
    let n_selected = state.filters.allowed(field).map_or(values.len(), |s| s.len());
    let header_text = format!("{field}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(field)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(field);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(field);
                }
            });

            for value in values {
                let mut checked = state
                    .filters
                    .allowed(field)
                    .map_or(true, |s| s.contains(value));
                let label = if value.is_empty() { "<blank>" } else { value.as_str() };
                let mut text = RichText::new(label);
                if field == Field::AuditStatus {
                    text = text.color(status_label_color(value));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(field, value);
                }
            }
        });
}

fn chart_options(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Charts").strong())
        .id_salt("chart_options")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut changed = false;

            let mut bins = state.config.bin_count;
            if ui.add(egui::Slider::new(&mut bins, 5..=50).text("Score bins")).changed() {
                state.config.bin_count = bins;
                changed = true;
            }

            let mut fixed = matches!(state.config.density_domain, DensityDomain::Fixed { .. });
            if ui.checkbox(&mut fixed, "Normal curve over 0–100").changed() {
                state.config.density_domain = if fixed {
                    DensityDomain::Fixed { low: 0.0, high: 100.0 }
                } else {
                    DensityDomain::Observed
                };
                changed = true;
            }

            ui.separator();
            for kind in ChartKind::ALL {
                let mut enabled = state.config.charts.contains(&kind);
                if ui.checkbox(&mut enabled, kind.title()).changed() {
                    state.config.set_chart(kind, enabled);
                    changed = true;
                }
            }

            if changed {
                state.mark_dirty();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                if let Err(e) = state.reload() {
                    report_error(state, &e);
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(state.report.is_some(), egui::Button::new("Export report…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} visible ({} without a score)",
                ds.len(),
                state.view.len(),
                state.view.missing_results()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn report_error(state: &mut AppState, err: &anyhow::Error) {
    log::error!("{err:#}");
    state.status_message = Some(format!("Error: {err:#}"));
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open audit results")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(&path) {
            report_error(state, &e);
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export report")
        .set_file_name("audit_report.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match state.export_report(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => report_error(state, &e),
        }
    }
}
