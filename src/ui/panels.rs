use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::StationFilter;
use crate::state::{AppState, Section};

// ---------------------------------------------------------------------------
// Left side panel – navigation and station selector
// ---------------------------------------------------------------------------

/// Render the left navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Navigation");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for section in Section::ALL {
                if ui
                    .selectable_label(state.section == section, section.title())
                    .clicked()
                {
                    state.set_section(section);
                }
            }
            ui.separator();

            let Some(dataset) = &state.dataset else {
                ui.label("No dataset loaded.");
                return;
            };

            // ---- Station selector ----
            ui.strong("Station");
            let stations = dataset.stations().to_vec();
            let mut chosen: Option<StationFilter> = None;
            egui::ComboBox::from_id_salt("station_filter")
                .selected_text(state.filter.label())
                .width(ui.available_width() * 0.9)
                .show_ui(ui, |ui: &mut Ui| {
                    let options = std::iter::once(StationFilter::All)
                        .chain(stations.iter().cloned().map(StationFilter::Station));
                    for option in options {
                        if ui
                            .selectable_label(state.filter == option, option.label())
                            .clicked()
                        {
                            chosen = Some(option);
                        }
                    }
                });
            if let Some(filter) = chosen {
                state.set_filter(filter);
            }

            ui.add_space(8.0);
            if state.views.is_empty() {
                ui.label(RichText::new("No data for this selection").color(Color32::YELLOW));
            } else {
                ui.label(format!("{} measurements selected", state.views.row_count));
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} measurements from {} stations, {} in view",
                ds.len(),
                ds.stations().len(),
                state.views.row_count
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air quality data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        // Failures are logged and surfaced in the top bar.
        state.load_from(&path).ok();
    }
}
