use std::collections::BTreeSet;

use crate::color::ColorMap;
use crate::data::columns;
use crate::data::filter::{FilterState, filtered_indices, init_filter_state};
use crate::data::fx::{self, CurrencyCheck, CurrencyTables};
use crate::data::merge::merge_editions;
use crate::data::model::{FieldValue, SurveyDataset};
use crate::panel::PanelConfig;

/// Columns with more unique values than this get no filter widget; they are
/// constrained by the panel's sanity bounds instead.
pub const MAX_FILTER_CARDINALITY: usize = 32;

/// Which central view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chart,
    Drivers,
    Currency,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Raw editions as loaded, keyed by survey year.
    pub editions: Vec<(u16, SurveyDataset)>,

    /// Combined dataset: merged, normalized, currency-converted.
    /// (None until the user loads a file.)
    pub dataset: Option<SurveyDataset>,

    /// Loaded ISO/FX reference tables (empty until loaded).
    pub currency_tables: CurrencyTables,

    /// Coverage report from the last table-driven conversion.
    pub currency_check: Option<CurrencyCheck>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which column splits the visible records into cohorts.
    pub group_column: Option<String>,

    /// Active colour map over the group column's values.
    pub color_map: Option<ColorMap>,

    /// Numeric columns plotted on the x and y axes.
    pub x_column: String,
    pub y_column: String,

    /// SPC panel configuration (bounds, thresholds, degree, trim).
    pub panel_config: PanelConfig,

    /// Active central view.
    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            editions: Vec::new(),
            dataset: None,
            currency_tables: CurrencyTables::default(),
            currency_check: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            group_column: None,
            color_map: None,
            x_column: columns::EXPERIENCE.to_string(),
            y_column: columns::SALARY_USD.to_string(),
            panel_config: PanelConfig::default(),
            view: View::Chart,
            status_message: None,
        }
    }
}

impl AppState {
    /// Register a freshly loaded raw edition and rebuild the combined
    /// dataset. Replaces any previously loaded edition for the same year.
    pub fn add_edition(&mut self, year: u16, dataset: SurveyDataset) {
        self.editions.retain(|(y, _)| *y != year);
        self.editions.push((year, dataset));
        self.editions.sort_by_key(|(y, _)| *y);
        self.rebuild_combined();
    }

    /// Use a single already-normalized survey file directly.
    pub fn set_combined(&mut self, dataset: SurveyDataset) {
        self.editions.clear();
        let converted = self.convert_currency(dataset);
        self.set_dataset(converted);
    }

    /// Re-run merge + currency conversion over the loaded editions.
    pub fn rebuild_combined(&mut self) {
        if self.editions.is_empty() {
            return;
        }
        match merge_editions(&self.editions) {
            Ok(merged) => {
                let converted = self.convert_currency(merged);
                self.set_dataset(converted);
            }
            Err(e) => {
                log::error!("Failed to merge editions: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Derive `SalaryUSD`: through the ISO/FX tables when loaded, else the
    /// built-in rate table. A dataset that already carries the column is
    /// left alone.
    fn convert_currency(&mut self, dataset: SurveyDataset) -> SurveyDataset {
        if dataset
            .column_names
            .iter()
            .any(|c| c == columns::SALARY_USD)
        {
            self.currency_check = None;
            return dataset;
        }
        if self.currency_tables.is_loaded() {
            let (converted, check) = fx::convert_with_tables(&dataset, &self.currency_tables);
            log::info!(
                "Table-driven conversion: {} unmapped groups, {} missing-FX groups",
                check.unmapped.len(),
                check.missing_fx.len()
            );
            self.currency_check = Some(check);
            converted
        } else {
            self.currency_check = None;
            fx::apply_builtin_rates(&dataset)
        }
    }

    /// Ingest the combined dataset, initialise filters, cohorts and colour.
    pub fn set_dataset(&mut self, dataset: SurveyDataset) {
        self.filters = init_filter_state(&dataset, MAX_FILTER_CARDINALITY);
        self.visible_indices = (0..dataset.len()).collect();

        // Default cohort split: membership, the first comparison the survey
        // reports on; fall back to no split.
        self.group_column = dataset
            .column_names
            .iter()
            .find(|c| c.as_str() == columns::IS_MEMBER)
            .cloned();
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Rebuild the colour map from the current `group_column`.
    pub fn rebuild_color_map(&mut self, dataset: &SurveyDataset) {
        self.color_map = self.group_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Set the cohort column and rebuild the colour map.
    pub fn set_group_column(&mut self, col: Option<String>) {
        self.group_column = col;
        if let Some(ds) = &self.dataset {
            let ds_clone = ds.clone();
            self.rebuild_color_map(&ds_clone);
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &FieldValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}
