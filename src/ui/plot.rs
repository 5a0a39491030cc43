use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::color::correlation_color;
use crate::data::filter::FilteredView;
use crate::data::model::{DataError, Dataset};
use crate::data::stats::{
    self, DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_N, GroupKey,
};
use crate::state::{AppState, ChartKind};

// ---------------------------------------------------------------------------
// Central panel – chart menu, charts, top-5 table, summary
// ---------------------------------------------------------------------------

/// Render the central panel: analysis selector, the chart(s) for the
/// current filtered view, the top-5 table, and the narrative summary.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data file to explore gemstones  (File → Open…)");
        });
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Analysis:");
        egui::ComboBox::from_id_salt("chart_kind")
            .selected_text(state.chart.label())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in ChartKind::ALL {
                    if ui
                        .selectable_label(state.chart == kind, kind.label())
                        .clicked()
                    {
                        state.chart = kind;
                    }
                }
            });
        ui.checkbox(&mut state.show_all, "Show all analyses");
    });
    ui.separator();

    // A pass with no view halts everything below: no charts, no table.
    match &state.pass_error {
        Some(DataError::EmptySelection) => {
            ui.label(
                RichText::new("No gemstone matches your selection. Adjust the filters on the left.")
                    .color(Color32::YELLOW),
            );
            return;
        }
        Some(err @ DataError::MissingColumns { .. }) => {
            ui.label(RichText::new(format!("Error: {err}")).color(Color32::RED));
            return;
        }
        None => {}
    }
    let Some(dataset) = state.dataset.clone() else {
        return;
    };
    let Some(view) = state.view.clone() else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.show_all {
                for kind in ChartKind::ALL {
                    ui.strong(kind.label());
                    render_chart(ui, kind, state, &dataset, &view);
                    ui.separator();
                }
            } else {
                render_chart(ui, state.chart, state, &dataset, &view);
                ui.separator();
            }

            top_table(ui, &dataset, &view);
            ui.separator();
            summary_section(ui);
        });
}

fn render_chart(ui: &mut Ui, kind: ChartKind, state: &AppState, dataset: &Dataset, view: &FilteredView) {
    match kind {
        ChartKind::PriceHistogram => price_histogram(ui, dataset, view),
        ChartKind::PriceVsCarat => price_vs_carat(ui, dataset, view),
        ChartKind::PriceByClarity => {
            grouped_bars(ui, "by_clarity", &stats::mean_price_by(view, dataset, GroupKey::Clarity))
        }
        ChartKind::PriceByColor => {
            grouped_bars(ui, "by_color", &stats::mean_price_by(view, dataset, GroupKey::Color))
        }
        ChartKind::PriceByCaratGroup => grouped_bars(
            ui,
            "by_carat_group",
            &stats::mean_price_by(view, dataset, GroupKey::CaratGroup),
        ),
        ChartKind::CutDistribution => {
            let counts: Vec<(String, f64)> = stats::cut_counts(view, dataset)
                .into_iter()
                .map(|(label, n)| (label, n as f64))
                .collect();
            grouped_bars(ui, "cut_counts", &counts);
        }
        ChartKind::PriceVsDimensions => price_vs_dimensions(ui, dataset, view),
        ChartKind::CorrelationHeatmap => correlation_heatmap(ui, dataset, view),
        ChartKind::Projection => projection_scatter(ui, state, dataset, view),
    }
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

const CHART_HEIGHT: f32 = 320.0;

fn price_histogram(ui: &mut Ui, dataset: &Dataset, view: &FilteredView) {
    let prices: Vec<f64> = view.records(dataset).map(|r| r.price).collect();
    let hist = stats::histogram(&prices, DEFAULT_HISTOGRAM_BINS);
    if hist.counts.is_empty() {
        return;
    }

    let bars: Vec<Bar> = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let lo = hist.edges[i];
            let hi = *hist.edges.get(i + 1).unwrap_or(&(lo + 1.0));
            let width = (hi - lo).max(1.0);
            Bar::new((lo + hi) / 2.0, count as f64)
                .width(width * 0.9)
                .fill(Color32::GOLD)
        })
        .collect();

    Plot::new("price_histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("Price (USD)")
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn price_vs_carat(ui: &mut Ui, dataset: &Dataset, view: &FilteredView) {
    let points: PlotPoints = view
        .records(dataset)
        .map(|r| [r.carat, r.price])
        .collect();

    Plot::new("price_vs_carat")
        .height(CHART_HEIGHT)
        .x_axis_label("Carat")
        .y_axis_label("Price (USD)")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(points)
                    .radius(2.0)
                    .color(Color32::from_rgba_unmultiplied(30, 60, 140, 120)),
            );
        });
}

fn price_vs_dimensions(ui: &mut Ui, dataset: &Dataset, view: &FilteredView) {
    let series: [(&str, fn(&crate::data::model::Record) -> f64, Color32); 3] = [
        ("x (length)", |r| r.x, Color32::from_rgb(220, 120, 40)),
        ("y (width)", |r| r.y, Color32::from_rgb(60, 160, 90)),
        ("z (height)", |r| r.z, Color32::from_rgb(90, 90, 210)),
    ];

    Plot::new("price_vs_dimensions")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Dimension (mm)")
        .y_axis_label("Price (USD)")
        .show(ui, |plot_ui| {
            for (name, axis, color) in series {
                let points: PlotPoints = view
                    .records(dataset)
                    .map(|r| [axis(r), r.price])
                    .collect();
                plot_ui.points(Points::new(points).radius(1.5).color(color).name(name));
            }
        });
}

/// Bar chart over labeled categories: one bar per observed group, integer
/// x positions mapped back to labels on the axis.
fn grouped_bars(ui: &mut Ui, id: &str, data: &[(String, f64)]) {
    let bars: Vec<Bar> = data
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Bar::new(i as f64, *value)
                .width(0.7)
                .name(label)
                .fill(Color32::from_rgb(110, 170, 220))
        })
        .collect();

    let labels: Vec<String> = data.iter().map(|(l, _)| l.clone()).collect();
    Plot::new(id.to_string())
        .height(CHART_HEIGHT)
        .y_axis_label("Price (USD)")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn correlation_heatmap(ui: &mut Ui, dataset: &Dataset, view: &FilteredView) {
    let corr = stats::correlation_matrix(view, dataset);
    let n = corr.labels.len();

    let row_labels = corr.labels.clone();
    let col_labels = corr.labels.clone();

    Plot::new("correlation_heatmap")
        .height(CHART_HEIGHT + 120.0)
        .data_aspect(1.0)
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < col_labels.len() {
                col_labels[i as usize].to_string()
            } else {
                String::new()
            }
        })
        .y_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < row_labels.len() {
                // Row 0 is drawn at the top.
                row_labels[row_labels.len() - 1 - i as usize].to_string()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for i in 0..n {
                for j in 0..n {
                    let r = corr.values[i][j];
                    let cx = j as f64;
                    let cy = (n - 1 - i) as f64;
                    let cell: PlotPoints = vec![
                        [cx - 0.5, cy - 0.5],
                        [cx + 0.5, cy - 0.5],
                        [cx + 0.5, cy + 0.5],
                        [cx - 0.5, cy + 0.5],
                    ]
                    .into();
                    plot_ui.polygon(
                        Polygon::new(cell)
                            .fill_color(correlation_color(r))
                            .stroke(egui::Stroke::new(0.5, Color32::from_gray(40))),
                    );
                    let text = if r.is_nan() {
                        "–".to_string()
                    } else {
                        format!("{r:.2}")
                    };
                    plot_ui.text(Text::new(
                        PlotPoint::new(cx, cy),
                        RichText::new(text).size(9.0).color(Color32::BLACK),
                    ));
                }
            }
        });
}

fn projection_scatter(ui: &mut Ui, state: &AppState, dataset: &Dataset, view: &FilteredView) {
    let proj = stats::project_2d(view, dataset);

    let dominant = |v: &[f64; 6]| {
        let mut best = 0;
        for i in 1..6 {
            if v[i].abs() > v[best].abs() {
                best = i;
            }
        }
        stats::PROJECTION_FEATURES[best]
    };
    ui.label(format!(
        "Explained variance: PC1 {:.0}% (strongest loading: {}), PC2 {:.0}% (strongest loading: {})",
        proj.explained[0] * 100.0,
        dominant(&proj.components[0]),
        proj.explained[1] * 100.0,
        dominant(&proj.components[1]),
    ));

    // One series per clarity grade so the legend doubles as a color key.
    let mut by_clarity: std::collections::BTreeMap<
        crate::data::model::Clarity,
        Vec<[f64; 2]>,
    > = std::collections::BTreeMap::new();
    for (rec, point) in view.records(dataset).zip(&proj.points) {
        by_clarity.entry(rec.clarity).or_default().push(*point);
    }

    Plot::new("projection_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("PC1")
        .y_axis_label("PC2")
        .show(ui, |plot_ui| {
            for (clarity, points) in by_clarity {
                let points: PlotPoints = points.into();
                plot_ui.points(
                    Points::new(points)
                        .radius(2.0)
                        .color(state.clarity_palette.color_for(clarity))
                        .name(clarity.label()),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Top-5 table
// ---------------------------------------------------------------------------

fn top_table(ui: &mut Ui, dataset: &Dataset, view: &FilteredView) {
    ui.strong(format!("Top {DEFAULT_TOP_N} most expensive gemstones"));
    let top = stats::top_n_by_price(view, dataset, DEFAULT_TOP_N);

    egui_extras::TableBuilder::new(ui)
        .id_salt("top_table")
        .striped(true)
        .columns(egui_extras::Column::auto().at_least(70.0), 5)
        .header(18.0, |mut header| {
            for title in ["Carat", "Cut", "Color", "Clarity", "Price (USD)"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for idx in top {
                let rec = &dataset.records[idx];
                body.row(16.0, |mut row| {
                    row.col(|ui| {
                        ui.label(format!("{:.2}", rec.carat));
                    });
                    row.col(|ui| {
                        ui.label(rec.cut.label());
                    });
                    row.col(|ui| {
                        ui.label(rec.color.label());
                    });
                    row.col(|ui| {
                        ui.label(rec.clarity.label());
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.0}", rec.price));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Narrative summary
// ---------------------------------------------------------------------------

fn summary_section(ui: &mut Ui) {
    egui::CollapsingHeader::new("Executive summary")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(
                "Price is driven first by carat (size), then by clarity and color. \
                 The largest returns sit with stones of 1.5 carat or more and a \
                 clarity of VS1 or better. Cut affects appearance but is not the \
                 dominant price factor.",
            );
        });
}
