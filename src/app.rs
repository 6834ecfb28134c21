use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, sections};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AirQualityApp {
    pub state: AppState,
}

impl eframe::App for AirQualityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation and station selector ----
        egui::SidePanel::left("navigation_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active section ----
        egui::CentralPanel::default().show(ctx, |ui| {
            sections::show(ui, &self.state);
        });
    }
}
