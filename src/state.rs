use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{apply, FilterSpec};
use crate::data::loader::load_file;
use crate::data::model::{Field, RecordSet};
use crate::pipeline::{run, Report};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Never filtered in place.
    pub dataset: Option<RecordSet>,

    /// Path the dataset was read from; opening it again reuses `dataset`.
    pub source: Option<PathBuf>,

    /// Per-field filter selections.
    pub filters: FilterSpec,

    /// Records passing the current filters.
    pub view: RecordSet,

    pub config: DashboardConfig,

    /// Charts computed for `view` under `config`.
    pub report: Option<Report>,

    /// Colours of the stores of the full dataset.
    pub store_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    dirty: bool,
}

impl AppState {
    /// Load `path` unless it is the source already in memory.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        if self.dataset.is_some() && self.source.as_deref() == Some(path) {
            log::debug!("Reusing cached dataset for {}", path.display());
            return Ok(());
        }
        self.load(path)
    }

    /// Re-read the current source from disk.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.source.clone().context("no dataset loaded")?;
        self.load(&path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let dataset =
            load_file(path).with_context(|| format!("loading {}", path.display()))?;
        log::info!("Loaded {} records from {}", dataset.len(), path.display());
        self.set_dataset(dataset, Some(path.to_path_buf()));
        Ok(())
    }

    /// Ingest a newly loaded dataset and select every value of every filter.
    pub fn set_dataset(&mut self, dataset: RecordSet, source: Option<PathBuf>) {
        self.filters = FilterSpec::select_everything(&dataset);
        self.store_colors = dataset
            .distinct(Field::Store)
            .map(ColorMap::new)
            .unwrap_or_default();
        self.dataset = Some(dataset);
        self.source = source;
        self.status_message = None;
        self.dirty = true;
        self.refresh();
    }

    /// Schedule a recompute on the next [`AppState::refresh`].
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Re-filter and recompute the report if anything changed since last time.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let Some(ds) = &self.dataset else {
            self.view = RecordSet::default();
            self.report = None;
            return;
        };
        self.view = apply(ds, &self.filters);
        self.report = Some(run(&self.view, &self.config));
    }

    /// Toggle a single value in a field's filter.
    pub fn toggle_filter_value(&mut self, field: Field, value: &str) {
        self.filters.toggle(field, value);
        self.mark_dirty();
    }

    /// Select all values of a field.
    pub fn select_all(&mut self, field: Field) {
        if let Some(all_vals) = self.dataset.as_ref().and_then(|ds| ds.distinct(field)) {
            self.filters.set(field, all_vals.clone());
            self.mark_dirty();
        }
    }

    /// Deselect all values of a field.
    pub fn select_none(&mut self, field: Field) {
        self.filters.set(field, BTreeSet::new());
        self.mark_dirty();
    }

    /// Write the current report as pretty-printed JSON.
    pub fn export_report(&self, path: &Path) -> Result<()> {
        let report = self.report.as_ref().context("nothing to export yet")?;
        let json = serde_json::to_string_pretty(report).context("serialising report")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;
    use crate::pipeline::ChartKind;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("audit-dashboard-{}-{name}", std::process::id()))
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(
            RecordSet::from_records(vec![
                rec("Opera", "France", "Outstanding", Some(90.0)),
                rec("Mall", "UAE", "Needs Improvement", Some(45.0)),
                rec("Mall", "UAE", "Outstanding", Some(88.0)),
            ]),
            None,
        );
        state
    }

    #[test]
    fn new_dataset_shows_everything() {
        let state = loaded();
        assert_eq!(state.view.len(), 3);
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.charts.len(), ChartKind::ALL.len());
    }

    #[test]
    fn filter_changes_apply_on_refresh_only() {
        let mut state = loaded();
        state.toggle_filter_value(Field::Country, "UAE");
        assert_eq!(state.view.len(), 3);
        state.refresh();
        assert_eq!(state.view.len(), 1);
        assert_eq!(state.report.as_ref().map(|r| r.records), Some(1));
        // the loaded dataset itself is never filtered
        assert_eq!(state.dataset.as_ref().map(|d| d.len()), Some(3));

        state.select_none(Field::Store);
        state.refresh();
        assert!(state.view.is_empty());

        state.select_all(Field::Store);
        state.select_all(Field::Country);
        state.refresh();
        assert_eq!(state.view.len(), 3);
    }

    #[test]
    fn reopening_the_same_path_uses_the_cache() {
        let path = temp_path("cache.csv");
        let header = "Employee Name,Store,Entity Id,Country,Audit Status,Result\n";
        std::fs::write(&path, format!("{header}A,Opera,E1,France,Outstanding,90\n")).unwrap();

        let mut state = AppState::default();
        state.open(&path).unwrap();
        assert_eq!(state.view.len(), 1);

        std::fs::write(
            &path,
            format!("{header}A,Opera,E1,France,Outstanding,90\nB,Mall,E2,UAE,Outstanding,70\n"),
        )
        .unwrap();
        state.open(&path).unwrap();
        assert_eq!(state.view.len(), 1);

        state.reload().unwrap();
        assert_eq!(state.view.len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_failure_keeps_previous_dataset() {
        let mut state = loaded();
        let err = state.open(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("loading"));
        assert_eq!(state.view.len(), 3);
        assert!(AppState::default().reload().is_err());
    }

    #[test]
    fn export_writes_json_report() {
        let state = loaded();
        let path = temp_path("report.json");
        state.export_report(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["records"], 3);
        assert!(AppState::default().export_report(&path).is_err());
    }
}
