use std::path::Path;

use eframe::egui::{self, Color32, ComboBox, DragValue, RichText, ScrollArea, Ui};

use crate::data::filter::cohorts;
use crate::data::loader;
use crate::panel::{PanelOutcome, build_panel};
use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – cohort selection, axes, panel config, filters
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Cohorts");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.column_names.clone();
    let categorical = dataset.categorical_columns(crate::state::MAX_FILTER_CARDINALITY);
    let unique = dataset.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Cohort (group-by) selector ----
            ui.strong("Split cohorts by");
            let current_group = state
                .group_column
                .clone()
                .unwrap_or_else(|| "(none)".to_string());
            ComboBox::from_id_salt("group_by")
                .selected_text(&current_group)
                .show_ui(ui, |ui: &mut Ui| {
                    if ui
                        .selectable_label(state.group_column.is_none(), "(none)")
                        .clicked()
                    {
                        state.set_group_column(None);
                    }
                    for col in &categorical {
                        if ui
                            .selectable_label(current_group == *col, col)
                            .clicked()
                        {
                            state.set_group_column(Some(col.clone()));
                        }
                    }
                });
            ui.separator();

            // ---- Axis columns ----
            ui.strong("Axes");
            axis_combo(ui, "x_axis", "x", &mut state.x_column, &columns);
            axis_combo(ui, "y_axis", "y", &mut state.y_column, &columns);
            ui.separator();

            // ---- Panel configuration ----
            ui.strong("Chart settings");
            let cfg = &mut state.panel_config;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Salary bounds");
                ui.add(
                    DragValue::new(&mut cfg.min_salary)
                        .speed(1_000)
                        .range(0.0..=f64::MAX),
                );
                ui.add(
                    DragValue::new(&mut cfg.max_salary)
                        .speed(1_000)
                        .range(cfg.min_salary..=f64::MAX),
                );
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Min points");
                ui.add(DragValue::new(&mut cfg.min_points).range(1..=1000));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Curve degree");
                for degree in [2usize, 3] {
                    if ui
                        .selectable_label(cfg.curve_degree == degree, degree.to_string())
                        .clicked()
                    {
                        cfg.curve_degree = degree;
                    }
                }
            });
            ui.separator();

            // ---- Per-column filter widgets (collapsible) ----
            ui.strong("Filters");
            for col in &categorical {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let selected = state.filters.entry(col.clone()).or_default();

                // Show count of selected / total in the header
                let n_selected = selected.len();
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        // Select all / none buttons
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        // Re-borrow after potential mutation from All/None
                        let selected = state.filters.entry(col.clone()).or_default();

                        for val in all_values {
                            let is_selected = selected.contains(val);
                            let label = val.to_string();

                            // Show colour swatch if this is the cohort column
                            let mut text = RichText::new(&label);
                            if state.group_column.as_deref() == Some(col) {
                                if let Some(cm) = &state.color_map {
                                    let c = cm.color_for(val);
                                    text = text.color(c);
                                }
                            }

                            let mut checked = is_selected;
                            if ui.checkbox(&mut checked, text).changed() {
                                if checked {
                                    selected.insert(val.clone());
                                } else {
                                    selected.remove(val);
                                }
                            }
                        }
                    });
            }
        });

    // Recompute visible indices after any checkbox changes.
    state.refilter();
}

fn axis_combo(ui: &mut Ui, id: &str, label: &str, current: &mut String, columns: &[String]) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        ComboBox::from_id_salt(id)
            .selected_text(current.clone())
            .show_ui(ui, |ui: &mut Ui| {
                for col in columns {
                    if ui.selectable_label(*current == *col, col).clicked() {
                        *current = col.clone();
                    }
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open 2015 edition…").clicked() {
                open_edition_dialog(state, 2015);
                ui.close_menu();
            }
            if ui.button("Open 2023 edition…").clicked() {
                open_edition_dialog(state, 2023);
                ui.close_menu();
            }
            if ui.button("Open combined survey…").clicked() {
                open_combined_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Load currency ISO table…").clicked() {
                load_iso_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load FX rate table…").clicked() {
                load_fx_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Export", |ui: &mut Ui| {
            if ui.button("Cohort summaries…").clicked() {
                export_summaries_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for (view, label) in [
            (View::Chart, "Chart"),
            (View::Drivers, "Drivers"),
            (View::Currency, "Currency"),
        ] {
            if ui.selectable_label(state.view == view, label).clicked() {
                state.view = view;
            }
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.panel_config.remove_outliers, "Trim > UCL")
            .clicked()
        {
            state.panel_config.remove_outliers = !state.panel_config.remove_outliers;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_survey_file(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

fn open_edition_dialog(state: &mut AppState, year: u16) {
    let Some(path) = pick_survey_file(&format!("Open {year} survey edition")) else {
        return;
    };
    match loader::load_file(&path) {
        Ok(dataset) => {
            log::info!(
                "Loaded {year} edition: {} records with {} columns",
                dataset.len(),
                dataset.column_names.len()
            );
            state.add_edition(year, dataset);
        }
        Err(e) => {
            log::error!("Failed to load {year} edition: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn open_combined_dialog(state: &mut AppState) {
    let Some(path) = pick_survey_file("Open combined survey data") else {
        return;
    };
    match loader::load_file(&path) {
        Ok(dataset) => {
            log::info!(
                "Loaded combined survey: {} records with columns {:?}",
                dataset.len(),
                dataset.column_names
            );
            state.set_combined(dataset);
        }
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn load_iso_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Load currency ISO table")
        .add_filter("CSV", &["csv"])
        .pick_file()
    else {
        return;
    };
    match state.currency_tables.load_iso_csv(&path) {
        Ok(n) => {
            log::info!("Loaded {n} ISO currency mappings");
            state.rebuild_combined();
        }
        Err(e) => {
            log::error!("Failed to load ISO table: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn load_fx_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Load FX rate table")
        .add_filter("CSV", &["csv"])
        .pick_file()
    else {
        return;
    };
    match state.currency_tables.load_fx_csv(&path) {
        Ok(n) => {
            log::info!("Loaded {n} FX rates");
            state.rebuild_combined();
        }
        Err(e) => {
            log::error!("Failed to load FX table: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Summary export
// ---------------------------------------------------------------------------

fn export_summaries_dialog(state: &mut AppState) {
    if state.dataset.is_none() {
        state.status_message = Some("Nothing to export: no dataset loaded.".to_string());
        return;
    }
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export cohort summaries")
        .set_file_name("cohort_summaries.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };
    match write_summaries_csv(state, &path) {
        Ok(n) => {
            log::info!("Exported {n} cohort summaries to {}", path.display());
            state.status_message = Some(format!("Exported {}", path.display()));
        }
        Err(e) => {
            log::error!("Summary export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Rebuild every cohort panel and write one summary row per cohort. The
/// pipeline is pure, so exporting recomputes exactly what the chart view
/// shows.
fn write_summaries_csv(state: &AppState, path: &Path) -> anyhow::Result<usize> {
    use anyhow::Context;

    let dataset = state.dataset.as_ref().context("no dataset loaded")?;
    let cohort_list = cohorts(
        dataset,
        &state.visible_indices,
        state.group_column.as_deref(),
    );

    let mut writer = csv::Writer::from_path(path).context("creating export file")?;
    writer.write_record([
        "Cohort", "Shown", "Clean", "Mean", "StdDev", "UCL", "LCL", "Correlation", "R2", "Note",
    ])?;

    let mut n = 0;
    for cohort in &cohort_list {
        let sample = dataset.numeric_pairs(&cohort.indices, &state.x_column, &state.y_column);
        match build_panel(&sample, &cohort.label, &state.panel_config) {
            PanelOutcome::Panel(panel) => {
                let s = &panel.summary;
                writer.write_record([
                    cohort.label.clone(),
                    s.n_display.to_string(),
                    s.n_clean.to_string(),
                    format!("{:.2}", s.mean),
                    format!("{:.2}", s.std),
                    format!("{:.2}", s.ucl),
                    format!("{:.2}", s.lcl),
                    s.correlation.map(|r| format!("{r:.4}")).unwrap_or_default(),
                    s.r_squared.map(|r| format!("{r:.4}")).unwrap_or_default(),
                    String::new(),
                ])?;
            }
            PanelOutcome::InsufficientData { reason, .. } => {
                writer.write_record([
                    cohort.label.clone(),
                    "0".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    reason,
                ])?;
            }
        }
        n += 1;
    }
    writer.flush().context("flushing export file")?;
    Ok(n)
}
