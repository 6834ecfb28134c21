use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color;
use crate::data::model::Field;
use crate::data::pipeline::{
    CorrelationMatrix, FieldValues, MultiYearChange, StationAverages, StationExtreme, YearlyChange,
    YearlyMean,
};

const PLOT_HEIGHT: f32 = 320.0;

fn value(values: &FieldValues, field: Field) -> Option<f64> {
    values.get(&field).copied().flatten()
}

/// Integer ticks only; years never get fractional labels.
fn year_ticks(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract() == 0.0 {
        format!("{:.0}", mark.value)
    } else {
        String::new()
    }
}

/// Label bar positions 0..6 with pollutant names.
fn pollutant_ticks(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract() != 0.0 || mark.value < 0.0 {
        return String::new();
    }
    Field::POLLUTANTS
        .get(mark.value as usize)
        .map(|f| f.column().to_string())
        .unwrap_or_default()
}

/// One line with markers per pollutant over years.
fn pollutant_lines<'a>(
    ui: &mut Ui,
    id: &str,
    y_label: &str,
    series: impl Iterator<Item = (i32, &'a FieldValues)> + Clone,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Year")
        .y_axis_label(y_label)
        .x_axis_formatter(year_ticks)
        .show(ui, |plot_ui| {
            for field in Field::POLLUTANTS {
                let points: Vec<[f64; 2]> = series
                    .clone()
                    .filter_map(|(year, values)| Some([year as f64, value(values, field)?]))
                    .collect();
                let color = color::field_color(field);
                let line = Line::new(PlotPoints::from(points.clone()))
                    .name(field.column())
                    .color(color)
                    .width(2.0);
                let markers = Points::new(PlotPoints::from(points))
                    .name(field.column())
                    .color(color)
                    .radius(3.0);
                plot_ui.line(line);
                plot_ui.points(markers);
            }
        });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Yearly pollutant means.
pub fn yearly_means_plot(ui: &mut Ui, yearly: &[YearlyMean]) {
    pollutant_lines(
        ui,
        "yearly_means",
        "Concentration",
        yearly.iter().map(|y| (y.year, &y.means)),
    );
}

/// Year-over-year percentage growth.
pub fn yearly_change_plot(ui: &mut Ui, changes: &[YearlyChange]) {
    pollutant_lines(
        ui,
        "yearly_change",
        "Percentage growth (%)",
        changes.iter().map(|c| (c.year, &c.change)),
    );
}

/// Bar per pollutant, red for increases and blue for decreases.
pub fn multi_year_change_plot(ui: &mut Ui, change: &MultiYearChange) {
    let bars: Vec<Bar> = Field::POLLUTANTS
        .iter()
        .enumerate()
        .filter_map(|(i, field)| {
            let v = value(&change.change, *field)?;
            let fill = if v > 0.0 { color::INCREASE } else { color::DECREASE };
            Some(Bar::new(i as f64, v).name(format!("{field}: {v:.2}%")).fill(fill))
        })
        .collect();

    Plot::new("multi_year_change")
        .height(PLOT_HEIGHT)
        .x_axis_label("Pollutant")
        .y_axis_label("Percentage change (%)")
        .x_axis_formatter(pollutant_ticks)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.6));
        });
}

/// Horizontal bars of the highest and lowest station mean per pollutant.
pub fn station_extremes_plot(ui: &mut Ui, averages: &StationAverages) {
    let bars = |extremes: &BTreeMap<Field, StationExtreme>| -> Vec<Bar> {
        Field::POLLUTANTS
            .iter()
            .enumerate()
            .filter_map(|(i, field)| {
                let e = extremes.get(field)?;
                let label = format!("{field}: {} ({:.2})", e.station, e.value);
                Some(Bar::new(i as f64, e.value).name(label))
            })
            .collect()
    };

    let highest = BarChart::new(bars(&averages.highest))
        .horizontal()
        .width(0.7)
        .color(color::HIGHEST)
        .name("Highest levels");
    let lowest = BarChart::new(bars(&averages.lowest))
        .horizontal()
        .width(0.7)
        .color(color::LOWEST)
        .name("Lowest levels");

    Plot::new("station_extremes")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Pollutant level")
        .y_axis_formatter(pollutant_ticks)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(highest);
            plot_ui.bar_chart(lowest);
        });
}

/// Annotated heatmap of the correlation matrix. Undefined cells read `NaN`.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    egui::Grid::new("correlation_heatmap")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for field in &matrix.fields {
                ui.strong(field.column());
            }
            ui.end_row();

            for (row_field, row) in matrix.fields.iter().zip(&matrix.values) {
                let label = RichText::new(row_field.column());
                ui.label(if row_field.is_pollutant() { label.strong() } else { label.italics() });
                for cell in row {
                    let fill = color::diverging(*cell);
                    let text = cell.map_or_else(|| "NaN".to_string(), |r| format!("{r:.2}"));
                    egui::Frame::default()
                        .fill(fill)
                        .inner_margin(4.0)
                        .show(ui, |ui: &mut Ui| {
                            ui.set_min_width(40.0);
                            ui.label(RichText::new(text).monospace().color(color::text_on(fill)));
                        });
                }
                ui.end_row();
            }
        });
}
