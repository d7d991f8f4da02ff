use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, PlotUi};

use crate::aggregate::counts::CumulativePoint;
use crate::aggregate::density::NormalCurve;
use crate::aggregate::groups::GroupExtremes;
use crate::aggregate::histogram::{Bin, GroupedBin, StackedBin};
use crate::color::{generate_palette, status_color, status_label_color};
use crate::data::model::{AuditStatus, Field, OrderedCategory};
use crate::pipeline::{ChartData, ChartKind};
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 260.0;
const SCORE_AXIS: &str = "Performance Score";
const COUNT_AXIS: &str = "Number of Employees";

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render every computed chart followed by the filtered records.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view audit results  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for output in &report.charts {
                ui.heading(output.kind.title());
                match &output.result {
                    Ok(data) => chart(ui, state, output.kind, data),
                    Err(e) => {
                        ui.label(RichText::new(format!("Not available: {e}")).italics().color(Color32::GRAY));
                    }
                }
                ui.add_space(12.0);
            }

            egui::CollapsingHeader::new(RichText::new(format!("Records ({})", state.view.len())).strong())
                .id_salt("records")
                .default_open(false)
                .show(ui, |ui: &mut Ui| records_table(ui, state));
        });
}

fn chart(ui: &mut Ui, state: &AppState, kind: ChartKind, data: &ChartData) {
    let id = format!("{kind:?}");
    match data {
        ChartData::GroupedHistogram(bins) => status_histogram(ui, &id, bins),
        ChartData::Cumulative(points) => cumulative(ui, &id, points),
        ChartData::PerGroupHistograms(groups) => {
            for (name, bins) in groups {
                egui::CollapsingHeader::new(name.as_str())
                    .id_salt((&id, name))
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| status_histogram(ui, &format!("{id}/{name}"), bins));
            }
        }
        ChartData::StatusTallies(rows) => status_tallies(ui, &id, rows),
        ChartData::Stacked(series) => stacked_area(ui, &id, series),
        ChartData::NormalOverlay { bins, curve } => normal_overlay(ui, &id, bins, curve),
        ChartData::Means(rows) => {
            let colors: Vec<Color32> = if kind == ChartKind::MeanByStore {
                rows.iter().map(|(name, _)| state.store_colors.color_for(name)).collect()
            } else {
                generate_palette(rows.len())
            };
            means(ui, &id, rows, &colors);
        }
        ChartData::Extremes(rows) => extremes(ui, &id, rows),
    }
}

/// Score on x, employee count on y.
fn score_plot<R>(ui: &mut Ui, id: &str, build: impl FnOnce(&mut PlotUi) -> R) {
    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label(SCORE_AXIS)
        .y_axis_label(COUNT_AXIS)
        .show(ui, build);
}

fn bin_width(low: f64, high: f64) -> f64 {
    let w = high - low;
    if w > 0.0 { w * 0.95 } else { 1.0 }
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// Score histogram with one stacked layer per audit status.
fn status_histogram(ui: &mut Ui, id: &str, bins: &[GroupedBin]) {
    let labels: BTreeSet<&String> = bins.iter().flat_map(|b| b.counts.keys()).collect();
    let mut labels: Vec<&String> = labels.into_iter().collect();
    labels.sort_by_key(|l| (AuditStatus::parse(l).is_none(), AuditStatus::parse(l)));

    let mut charts: Vec<BarChart> = Vec::with_capacity(labels.len());
    for label in labels {
        let bars = bins
            .iter()
            .map(|b| {
                let count = b.counts.get(label).copied().unwrap_or(0);
                Bar::new((b.low + b.high) / 2.0, count as f64).width(bin_width(b.low, b.high))
            })
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(label)
            .color(status_label_color(label))
            .stack_on(&below);
        charts.push(chart);
    }

    score_plot(ui, id, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

fn cumulative(ui: &mut Ui, id: &str, points: &[CumulativePoint]) {
    let line: PlotPoints = points.iter().map(|p| [p.value, p.count as f64]).collect();
    score_plot(ui, id, |plot_ui| {
        plot_ui.line(Line::new(line).name("Cumulative count").width(1.5));
    });
}

/// One horizontal stacked bar per row, statuses stacked in enumeration order.
fn status_tallies(ui: &mut Ui, id: &str, rows: &[(String, Vec<(AuditStatus, usize)>)]) {
    let mut charts: Vec<BarChart> = Vec::new();
    for (pos, status) in AuditStatus::ALL.iter().enumerate() {
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, (name, counts))| {
                let n = counts.get(pos).map_or(0, |(_, n)| *n);
                Bar::new(i as f64, n as f64).width(0.6).name(name)
            })
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        charts.push(
            BarChart::new(bars)
                .name(status.label())
                .color(status_color(*status))
                .horizontal()
                .stack_on(&below),
        );
    }

    let height = (60.0 + 28.0 * rows.len() as f32).min(PLOT_HEIGHT * 2.0);
    Plot::new(id)
        .height(height)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label(COUNT_AXIS)
        .show_axes([true, false])
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });

    egui::Grid::new(format!("{id}/grid")).striped(true).show(ui, |ui: &mut Ui| {
        ui.strong("");
        for status in AuditStatus::ALL {
            ui.label(RichText::new(status.label()).color(status_color(*status)));
        }
        ui.end_row();
        for (name, counts) in rows {
            ui.label(name);
            for (_, n) in counts {
                ui.label(n.to_string());
            }
            ui.end_row();
        }
    });
}

/// Cumulative counts per status, drawn as filled stacked layers.
fn stacked_area(ui: &mut Ui, id: &str, series: &[StackedBin<AuditStatus>]) {
    let layers = series.first().map_or(0, |b| b.cumulative.len());
    // tops[layer][bin]: running height of this layer and all layers below it
    let mut tops = vec![vec![0.0_f64; series.len()]; layers];
    for (i, bin) in series.iter().enumerate() {
        let mut acc = 0.0;
        for (layer, (_, n)) in bin.cumulative.iter().enumerate() {
            acc += *n as f64;
            tops[layer][i] = acc;
        }
    }

    score_plot(ui, id, |plot_ui| {
        // Highest layer first so lower fills paint over it.
        for layer in (0..layers).rev() {
            let status = series[0].cumulative[layer].0;
            let points: PlotPoints = series
                .iter()
                .zip(&tops[layer])
                .map(|(bin, top)| [bin.mid(), *top])
                .collect();
            plot_ui.line(
                Line::new(points)
                    .name(status.label())
                    .color(status_color(status))
                    .fill(0.0_f32)
                    .width(0.5),
            );
        }
    });
}

/// Histogram with the fitted normal curve scaled to counts.
fn normal_overlay(ui: &mut Ui, id: &str, bins: &[Bin], curve: &NormalCurve) {
    let stats = &curve.stats;
    ui.label(format!(
        "n = {}, mean = {:.2}, std dev = {:.2}",
        stats.count, stats.mean, stats.std_dev
    ));

    let width = bins.first().map_or(1.0, |b| b.high - b.low);
    let scale = stats.count as f64 * if width > 0.0 { width } else { 1.0 };
    let bars = bins
        .iter()
        .map(|b| Bar::new(b.mid(), b.count as f64).width(bin_width(b.low, b.high)))
        .collect();
    let density: PlotPoints = curve.points.iter().map(|(x, d)| [*x, d * scale]).collect();

    score_plot(ui, id, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).name("Scores").color(Color32::LIGHT_BLUE));
        plot_ui.line(Line::new(density).name("Normal fit").color(Color32::RED).width(2.0));
    });
}

fn means(ui: &mut Ui, id: &str, rows: &[(String, f64)], colors: &[Color32]) {
    let bars = rows
        .iter()
        .zip(colors)
        .enumerate()
        .map(|(i, ((name, mean), color))| Bar::new(i as f64, *mean).width(0.7).name(name).fill(*color))
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .y_axis_label("Average Score")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Average"));
        });

    egui::Grid::new(format!("{id}/grid")).striped(true).show(ui, |ui: &mut Ui| {
        for ((name, mean), color) in rows.iter().zip(colors) {
            ui.label(RichText::new(name).color(*color));
            ui.label(format!("{mean:.1}"));
            ui.end_row();
        }
    });
}

fn extremes(ui: &mut Ui, id: &str, rows: &[GroupExtremes]) {
    egui::Grid::new(id.to_string()).striped(true).show(ui, |ui: &mut Ui| {
        for header in ["Country", "Top store", "Avg", "Bottom store", "Avg"] {
            ui.strong(header);
        }
        ui.end_row();
        for row in rows {
            ui.label(&row.partition);
            ui.label(&row.top.name);
            ui.label(format!("{:.1}", row.top.mean));
            ui.label(&row.bottom.name);
            ui.label(format!("{:.1}", row.bottom.mean));
            ui.end_row();
        }
    });
}

// ---------------------------------------------------------------------------
// Filtered records table
// ---------------------------------------------------------------------------

fn records_table(ui: &mut Ui, state: &AppState) {
    let records = state.view.records();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(true)
        .max_scroll_height(320.0)
        .columns(Column::auto().at_least(80.0), Field::ALL.len())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for field in Field::ALL {
                header.col(|ui| {
                    ui.strong(field.column_name());
                });
            }
            header.col(|ui| {
                ui.strong("Result");
            });
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let rec = &records[row.index()];
                for field in Field::ALL {
                    row.col(|ui| {
                        let text = rec.get(field);
                        if field == Field::AuditStatus {
                            ui.label(RichText::new(text).color(status_label_color(text)));
                        } else {
                            ui.label(text);
                        }
                    });
                }
                row.col(|ui| {
                    match rec.result {
                        Some(v) => ui.label(format!("{v}")),
                        None => ui.label(RichText::new("—").color(Color32::GRAY)),
                    };
                });
            });
        });
}
