use eframe::egui::{Align2, Color32, Grid, RichText, ScrollArea, Ui};
use egui_plot::{HLine, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::data::filter::cohorts;
use crate::panel::{PanelOutcome, SpcPanel, build_panel};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chart view (central panel): one SPC chart per cohort
// ---------------------------------------------------------------------------

/// Render the cohort SPC charts in the central panel.
pub fn chart_view(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a survey file to view charts  (File → Open…)");
            });
            return;
        }
    };

    let cohort_list = cohorts(
        dataset,
        &state.visible_indices,
        state.group_column.as_deref(),
    );

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for cohort in &cohort_list {
                let sample =
                    dataset.numeric_pairs(&cohort.indices, &state.x_column, &state.y_column);
                let outcome = build_panel(&sample, &cohort.label, &state.panel_config);

                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&cohort.value))
                    .unwrap_or(Color32::LIGHT_BLUE);

                match outcome {
                    PanelOutcome::Panel(panel) => {
                        spc_panel(ui, &panel, color, &state.x_column, &state.y_column);
                    }
                    PanelOutcome::InsufficientData { title, reason } => {
                        ui.group(|ui: &mut Ui| {
                            ui.strong(&title);
                            ui.label(
                                RichText::new(format!("Insufficient data: {reason}"))
                                    .color(Color32::GRAY),
                            );
                        });
                    }
                }
                ui.add_space(8.0);
            }
        });
}

// ---------------------------------------------------------------------------
// One cohort panel: scatter + curve + control lines + summary grid
// ---------------------------------------------------------------------------

fn spc_panel(ui: &mut Ui, panel: &SpcPanel, color: Color32, x_label: &str, y_label: &str) {
    ui.strong(&panel.title);

    Plot::new(format!("spc_{}", panel.title))
        .height(280.0)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .include_y(panel.y_range.0)
        .include_y(panel.y_range.1)
        .include_x(panel.label_x)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // Scatter of the display sample.
            let points: PlotPoints = panel
                .display
                .iter()
                .map(|&(x, y)| [x, y])
                .collect();
            plot_ui.points(
                Points::new(points)
                    .name(&panel.title)
                    .color(color)
                    .radius(2.0),
            );

            // Best-fit curve, when the fit was feasible.
            if let Some(curve) = &panel.curve {
                let line: PlotPoints = curve.iter().map(|&(x, y)| [x, y]).collect();
                plot_ui.line(
                    Line::new(line)
                        .name("Best fit")
                        .color(Color32::WHITE)
                        .width(1.5),
                );
            }

            // Frozen control lines: these come from the pre-trim baseline.
            let mean_color = Color32::from_rgb(0x2e, 0xcc, 0x71);
            let limit_color = Color32::from_rgb(0xe7, 0x4c, 0x3c);
            plot_ui.hline(
                HLine::new(panel.baseline.mean)
                    .color(mean_color)
                    .style(LineStyle::Dashed { length: 8.0 }),
            );
            plot_ui.hline(
                HLine::new(panel.baseline.ucl)
                    .color(limit_color)
                    .style(LineStyle::Dashed { length: 4.0 }),
            );
            plot_ui.hline(
                HLine::new(panel.baseline.lcl)
                    .color(limit_color)
                    .style(LineStyle::Dashed { length: 4.0 }),
            );

            // Labels just right of the data.
            for (text, y, c) in [
                ("Mean", panel.baseline.mean, mean_color),
                ("UCL", panel.baseline.ucl, limit_color),
                ("LCL", panel.baseline.lcl, limit_color),
            ] {
                plot_ui.text(
                    Text::new(PlotPoint::new(panel.label_x, y), RichText::new(text).strong())
                        .color(c)
                        .anchor(Align2::LEFT_CENTER),
                );
            }
        });

    summary_grid(ui, panel);
}

fn summary_grid(ui: &mut Ui, panel: &SpcPanel) {
    let s = &panel.summary;
    Grid::new(format!("summary_{}", panel.title))
        .num_columns(4)
        .spacing([24.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Respondents");
            ui.label(format!("{} shown / {} clean", s.n_display, s.n_clean));
            ui.label("Mean");
            ui.label(format!("{:.0}", s.mean));
            ui.end_row();

            ui.label("Std dev");
            ui.label(format!("{:.0}", s.std));
            ui.label("UCL / LCL");
            ui.label(format!("{:.0} / {:.0}", s.ucl, s.lcl));
            ui.end_row();

            ui.label("Correlation");
            ui.label(
                s.correlation
                    .map(|r| format!("{r:.4}"))
                    .unwrap_or_else(|| "—".to_string()),
            );
            ui.label("R²");
            ui.label(
                s.r_squared
                    .map(|r2| format!("{r2:.4}"))
                    .unwrap_or_else(|| "—".to_string()),
            );
            ui.end_row();
        });
}
