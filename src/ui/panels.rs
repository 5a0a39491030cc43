use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::model::{Clarity, ColorGrade, Cut};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and key metrics
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some(mut criteria) = state.criteria.clone() else {
        return;
    };

    let mut changed = false;
    let mut reset = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Price range (USD) ----
            ui.strong("Price range (USD)");
            let (lo, hi) = dataset.price_range;
            changed |= ui
                .add(Slider::new(&mut criteria.price_range.0, lo..=hi).text("min"))
                .changed();
            changed |= ui
                .add(Slider::new(&mut criteria.price_range.1, lo..=hi).text("max"))
                .changed();
            ui.separator();

            // ---- Carat range ----
            ui.strong("Carat range");
            let (lo, hi) = dataset.carat_range;
            changed |= ui
                .add(Slider::new(&mut criteria.carat_range.0, lo..=hi).text("min"))
                .changed();
            changed |= ui
                .add(Slider::new(&mut criteria.carat_range.1, lo..=hi).text("max"))
                .changed();
            ui.separator();

            // ---- Grade selections (collapsible, declared order) ----
            changed |= grade_section(ui, "Cut", Cut::ALL.iter(), &dataset.cuts, &mut criteria.cuts);
            changed |= grade_section(
                ui,
                "Color",
                ColorGrade::ALL.iter(),
                &dataset.colors,
                &mut criteria.colors,
            );
            changed |= grade_section(
                ui,
                "Clarity",
                Clarity::ALL.iter(),
                &dataset.clarities,
                &mut criteria.clarities,
            );

            ui.separator();
            if ui.button("Reset filters").clicked() {
                reset = true;
            }

            // ---- Key metrics ----
            ui.separator();
            ui.strong("Key metrics");
            match &state.view {
                Some(view) => {
                    ui.label(format!("Matching gemstones: {}", view.count));
                    ui.label(format!("Mean price: ${:.0}", view.mean_price));
                    ui.label(format!("Mean carat: {:.2}", view.mean_carat));
                }
                None => {
                    ui.label("No matching gemstones.");
                }
            }
        });

    if reset {
        state.reset_filters();
    } else if changed {
        state.criteria = Some(criteria);
        state.refilter();
    }
}

/// One collapsible checkbox group for an ordinal grade.  Only grades
/// observed in the dataset are offered; All/None toggle the whole set.
fn grade_section<'a, T>(
    ui: &mut Ui,
    title: &str,
    declared: impl Iterator<Item = &'a T>,
    observed: &std::collections::BTreeSet<T>,
    selected: &mut std::collections::BTreeSet<T>,
) -> bool
where
    T: Copy + Ord + std::fmt::Display + 'a,
{
    let mut changed = false;
    let header = format!("{title}  ({}/{})", selected.len(), observed.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = observed.clone();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for grade in declared {
                if !observed.contains(grade) {
                    continue;
                }
                let mut checked = selected.contains(grade);
                if ui.checkbox(&mut checked, grade.to_string()).changed() {
                    if checked {
                        selected.insert(*grade);
                    } else {
                        selected.remove(grade);
                    }
                    changed = true;
                }
            }
        });

    changed
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
            let can_export = state.view.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let visible = state.view.as_ref().map_or(0, |v| v.count);
            ui.label(format!("{} gemstones loaded, {visible} matching", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open gemstone data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load(&path) {
            Ok(dataset) => {
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn export_file_dialog(state: &mut AppState) {
    let (Some(dataset), Some(view)) = (&state.dataset, &state.view) else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export filtered gemstones")
        .set_file_name("filtered_gemstones.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = crate::data::export::export_file(dataset, view, &path) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
