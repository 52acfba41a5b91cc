use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::columns;
use crate::data::fx::CurrencyCheck;
use crate::state::AppState;
use crate::stats::correlation::rank_factor_correlations;
use crate::stats::regression::fit_linear_model;

/// Factor columns examined by the driver analyses, in report order.
pub const DRIVER_FACTORS: &[&str] = &[
    columns::IS_MEMBER,
    columns::IS_CERTIFIED,
    columns::EXPERIENCE,
    columns::GENDER,
    columns::EDUCATION,
];

/// A correlation needs more than this many complete pairs to be reported.
const MIN_CORRELATION_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// Drivers view: correlation ranking + OLS driver ranking
// ---------------------------------------------------------------------------

/// Render the salary-driver tables for the currently visible records.
pub fn drivers_view(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a survey file to analyse drivers");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Correlation ranking");
            ui.label("Each factor encoded first-seen, correlated against salary, ranked by |r|.");
            ui.add_space(4.0);

            let ranked = rank_factor_correlations(
                dataset,
                &state.visible_indices,
                DRIVER_FACTORS,
                &state.y_column,
                MIN_CORRELATION_ROWS,
            );

            if ranked.is_empty() {
                ui.label(RichText::new("Not enough complete rows.").color(Color32::GRAY));
            } else {
                ui.push_id("correlation_table", |ui: &mut Ui| {
                    TableBuilder::new(ui)
                        .striped(true)
                        .column(Column::auto().at_least(140.0))
                        .column(Column::auto().at_least(90.0))
                        .column(Column::auto().at_least(90.0))
                        .column(Column::remainder())
                        .header(20.0, |mut header| {
                            header.col(|ui| {
                                ui.strong("Factor");
                            });
                            header.col(|ui| {
                                ui.strong("r");
                            });
                            header.col(|ui| {
                                ui.strong("p-value");
                            });
                            header.col(|ui| {
                                ui.strong("n");
                            });
                        })
                        .body(|mut body| {
                            for row in &ranked {
                                body.row(18.0, |mut table_row| {
                                    table_row.col(|ui| {
                                        ui.label(&row.factor);
                                    });
                                    table_row.col(|ui| {
                                        ui.label(format!("{:.4}", row.r));
                                    });
                                    table_row.col(|ui| {
                                        ui.label(format!("{:.4}", row.p_value));
                                    });
                                    table_row.col(|ui| {
                                        ui.label(row.n.to_string());
                                    });
                                });
                            }
                        });
                });
            }

            ui.add_space(16.0);
            ui.heading("Salary drivers (OLS)");
            ui.label("Multiple regression of salary on all factors; impact is |beta|.");
            ui.add_space(4.0);

            let model = fit_linear_model(
                dataset,
                &state.visible_indices,
                DRIVER_FACTORS,
                &state.y_column,
            );

            match model {
                None => {
                    ui.label(
                        RichText::new("Model not estimable over the visible records.")
                            .color(Color32::GRAY),
                    );
                }
                Some(model) => {
                    ui.label(format!("n = {}, R² = {:.4}", model.n, model.r_squared));
                    ui.add_space(4.0);
                    ui.push_id("driver_table", |ui: &mut Ui| {
                        TableBuilder::new(ui)
                            .striped(true)
                            .column(Column::auto().at_least(140.0))
                            .column(Column::auto().at_least(100.0))
                            .column(Column::auto().at_least(90.0))
                            .column(Column::remainder())
                            .header(20.0, |mut header| {
                                header.col(|ui| {
                                    ui.strong("Factor");
                                });
                                header.col(|ui| {
                                    ui.strong("Beta");
                                });
                                header.col(|ui| {
                                    ui.strong("p-value");
                                });
                                header.col(|ui| {
                                    ui.strong("Impact");
                                });
                            })
                            .body(|mut body| {
                                for row in model.ranked_by_impact() {
                                    body.row(18.0, |mut table_row| {
                                        table_row.col(|ui| {
                                            ui.label(&row.factor);
                                        });
                                        table_row.col(|ui| {
                                            ui.label(format!("{:.1}", row.beta));
                                        });
                                        table_row.col(|ui| {
                                            ui.label(format!("{:.4}", row.p_value));
                                        });
                                        table_row.col(|ui| {
                                            ui.label(format!("{:.1}", row.impact));
                                        });
                                    });
                                }
                            });
                    });
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Currency view: conversion sample + coverage checks
// ---------------------------------------------------------------------------

/// Render the currency conversion report.
pub fn currency_view(ui: &mut Ui, state: &mut AppState) {
    let mut status: Option<String> = None;

    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a survey file to check currency conversion");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Conversion source");
            if state.currency_tables.is_loaded() {
                ui.label(format!(
                    "ISO/FX tables loaded: {} currency names mapped, {} (ISO, year) rates.",
                    state.currency_tables.iso.len(),
                    state.currency_tables.fx.len()
                ));
            } else {
                ui.label(
                    "Built-in rate table in use. Load ISO and FX tables (File menu) for \
                     year-accurate conversion.",
                );
            }

            ui.add_space(12.0);
            ui.heading("Coverage check");
            match &state.currency_check {
                None => {
                    ui.label(
                        RichText::new("No table-driven conversion has run yet.")
                            .color(Color32::GRAY),
                    );
                }
                Some(check) if check.is_clean() => {
                    ui.label(
                        RichText::new("All currencies mapped and all FX rates present.")
                            .color(Color32::from_rgb(0x2e, 0xcc, 0x71)),
                    );
                }
                Some(check) => {
                    gap_table(
                        ui,
                        "unmapped_table",
                        "Unmapped currency values",
                        "Currency",
                        &check.unmapped,
                    );
                    ui.add_space(8.0);
                    gap_table(ui, "missing_fx_table", "Missing FX rates", "ISO", &check.missing_fx);
                    ui.add_space(8.0);
                    export_buttons(ui, check, &mut status);
                }
            }

            ui.add_space(12.0);
            ui.heading("Converted sample");
            conversion_sample(ui, dataset);
        });

    if status.is_some() {
        state.status_message = status;
    }
}

fn gap_table(
    ui: &mut Ui,
    id: &str,
    title: &str,
    key_header: &str,
    gaps: &[crate::data::fx::CoverageGap],
) {
    ui.strong(title);
    if gaps.is_empty() {
        ui.label(RichText::new("None.").color(Color32::GRAY));
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(160.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("SurveyYear");
                });
                header.col(|ui| {
                    ui.strong(key_header);
                });
                header.col(|ui| {
                    ui.strong("Count");
                });
            })
            .body(|mut body| {
                for gap in gaps {
                    body.row(18.0, |mut table_row| {
                        table_row.col(|ui| {
                            ui.label(gap.year.to_string());
                        });
                        table_row.col(|ui| {
                            ui.label(&gap.key);
                        });
                        table_row.col(|ui| {
                            ui.label(gap.count.to_string());
                        });
                    });
                }
            });
    });
}

fn export_buttons(ui: &mut Ui, check: &CurrencyCheck, status: &mut Option<String>) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Export unmapped…").clicked() {
            save_gaps(&check.unmapped, "Currency", "unmapped_currency.csv", status);
        }
        if ui.button("Export missing FX…").clicked() {
            save_gaps(&check.missing_fx, "ISO", "missing_fx.csv", status);
        }
    });
}

fn save_gaps(
    gaps: &[crate::data::fx::CoverageGap],
    key_header: &str,
    default_name: &str,
    status: &mut Option<String>,
) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export check file")
        .set_file_name(default_name)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };
    match CurrencyCheck::export_csv(gaps, key_header, &path) {
        Ok(()) => {
            log::info!("Exported {} rows to {}", gaps.len(), path.display());
            *status = Some(format!("Exported {}", path.display()));
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            *status = Some(format!("Error: {e:#}"));
        }
    }
}

fn conversion_sample(ui: &mut Ui, dataset: &crate::data::model::SurveyDataset) {
    const SAMPLE_ROWS: usize = 20;
    let cols = [
        columns::SURVEY_YEAR,
        columns::SALARY_AMOUNT,
        columns::CURRENCY,
        columns::SALARY_USD,
    ];

    ui.push_id("conversion_sample", |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui).striped(true);
        for _ in &cols {
            builder = builder.column(Column::auto().at_least(120.0));
        }
        builder
            .header(20.0, |mut header| {
                for col in &cols {
                    header.col(|ui| {
                        ui.strong(*col);
                    });
                }
            })
            .body(|mut body| {
                for rec in dataset.records.iter().take(SAMPLE_ROWS) {
                    body.row(18.0, |mut table_row| {
                        for col in &cols {
                            table_row.col(|ui| {
                                ui.label(
                                    rec.get(col)
                                        .map(|v| v.to_string())
                                        .unwrap_or_else(|| "—".to_string()),
                                );
                            });
                        }
                    });
                }
            });
    });
}
