use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::insights;
use crate::data::pipeline::DerivedViews;
use crate::state::{AppState, Section};
use crate::ui::{plot, tables};

// ---------------------------------------------------------------------------
// Central panel – the active section
// ---------------------------------------------------------------------------

/// Render the page selected in the navigation panel.
pub fn show(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data file to view the dashboard  (File → Open…)");
        });
        return;
    }

    ui.heading(state.section.title());
    ui.label(RichText::new(format!("Station: {}", state.filter)).weak());
    ui.separator();

    if state.section != Section::Overview {
        if let Err(e) = state.views.ensure_data() {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(format!("No data: {e}")).color(Color32::YELLOW).heading());
            });
            return;
        }
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.section {
            Section::Overview => overview(ui, state),
            Section::YearlyTrends => yearly_trends(ui, &state.views),
            Section::YearlyGrowth => yearly_growth(ui, &state.views),
            Section::StationAnalysis => station_analysis(ui, &state.views),
            Section::Correlation => correlation(ui, &state.views),
            Section::Insights => insight_page(ui, state),
        });
}

fn bullets(ui: &mut Ui, lines: &[String]) {
    for line in lines {
        ui.label(format!("• {line}"));
    }
}

fn overview(ui: &mut Ui, state: &AppState) {
    ui.label(
        "This dashboard summarises air pollution measurements: yearly pollutant trends, \
         percentage growth per year, the stations with the highest and lowest pollution, \
         and how pollutants correlate with weather. Use the navigation panel to explore each view \
         and the station selector to focus on a single monitoring station.",
    );
    ui.add_space(8.0);

    let Some(dataset) = &state.dataset else {
        return;
    };
    egui::Grid::new("overview_facts")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            if let Some(source) = &state.source {
                ui.label("Source");
                ui.label(source.display().to_string());
                ui.end_row();
            }
            ui.label("Measurements");
            ui.label(dataset.len().to_string());
            ui.end_row();
            ui.label("Stations");
            ui.label(dataset.stations().join(", "));
            ui.end_row();
            if let Some((first, last)) = dataset.year_range() {
                ui.label("Years");
                ui.label(format!("{first} – {last}"));
                ui.end_row();
            }
            ui.label("In current selection");
            ui.label(state.views.row_count.to_string());
            ui.end_row();
        });
}

fn yearly_trends(ui: &mut Ui, views: &DerivedViews) {
    egui::CollapsingHeader::new(RichText::new("Yearly trend").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            plot::yearly_means_plot(ui, &views.yearly_means);
            ui.strong("Trends summary:");
            bullets(ui, &insights::trend_summary(&views.yearly_means));
            ui.add_space(6.0);
            ui.strong("Trends table:");
            let rows: Vec<(String, _)> = views
                .yearly_means
                .iter()
                .map(|y| (y.year.to_string(), &y.means))
                .collect();
            tables::pollutant_table(ui, "yearly_means_table", "Year", &rows, "");
        });

    let Some(change) = &views.multi_year_change else {
        return;
    };
    let title = format!("Percentage change {} – {}", change.from_year, change.to_year);
    egui::CollapsingHeader::new(RichText::new(title).strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            plot::multi_year_change_plot(ui, change);
            ui.strong("Key changes:");
            bullets(ui, &insights::key_changes(change));
            ui.add_space(6.0);
            let rows = [(format!("{}–{}", change.from_year, change.to_year), &change.change)];
            tables::pollutant_table(ui, "multi_year_change_table", "Period", &rows, "%");
        });
}

fn yearly_growth(ui: &mut Ui, views: &DerivedViews) {
    plot::yearly_change_plot(ui, &views.yearly_change);
    bullets(ui, &insights::yearly_growth_summary(&views.yearly_change));
    ui.add_space(6.0);
    ui.strong("Percentage growth table:");
    let rows: Vec<(String, _)> = views
        .yearly_change
        .iter()
        .map(|y| (y.year.to_string(), &y.change))
        .collect();
    tables::pollutant_table(ui, "yearly_change_table", "Year", &rows, "%");
}

fn station_analysis(ui: &mut Ui, views: &DerivedViews) {
    let averages = &views.station_averages;
    plot::station_extremes_plot(ui, averages);
    ui.add_space(6.0);

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Highest station per pollutant:");
        tables::extremes_table(&mut cols[0], "highest_table", &averages.highest);
        cols[1].strong("Lowest station per pollutant:");
        tables::extremes_table(&mut cols[1], "lowest_table", &averages.lowest);
    });

    ui.add_space(6.0);
    ui.strong("Station averages:");
    let rows: Vec<(String, _)> = averages
        .stations
        .iter()
        .map(|s| (s.station.clone(), &s.means))
        .collect();
    tables::pollutant_table(ui, "station_averages_table", "Station", &rows, "");
}

fn correlation(ui: &mut Ui, views: &DerivedViews) {
    plot::correlation_heatmap(ui, &views.correlation);
    ui.add_space(8.0);
    ui.strong("Correlation insights:");
    bullets(ui, &insights::correlation_summary(&views.correlation));
}

fn insight_page(ui: &mut Ui, state: &AppState) {
    for section in &state.insights {
        ui.add_space(6.0);
        ui.heading(&section.title);
        bullets(ui, &section.lines);
    }
}
