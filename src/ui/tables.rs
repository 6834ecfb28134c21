use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::Field;
use crate::data::pipeline::{FieldValues, StationExtreme};

const ROW_HEIGHT: f32 = 18.0;

fn format_value(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{suffix}"),
        None => "n/a".to_string(),
    }
}

/// A row label followed by one column per pollutant.
pub fn pollutant_table(
    ui: &mut Ui,
    id: &str,
    label_header: &str,
    rows: &[(String, &FieldValues)],
    suffix: &str,
) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(90.0))
            .columns(Column::auto().at_least(64.0), Field::POLLUTANTS.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                header.col(|ui| {
                    ui.strong(label_header);
                });
                for field in Field::POLLUTANTS {
                    header.col(|ui| {
                        ui.strong(field.column());
                    });
                }
            })
            .body(|mut body| {
                for (label, values) in rows {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.label(label.as_str());
                        });
                        for field in Field::POLLUTANTS {
                            let value = values.get(&field).copied().flatten();
                            row.col(|ui| {
                                ui.label(format_value(value, suffix));
                            });
                        }
                    });
                }
            });
    });
}

/// Pollutant → station → value, for the highest or lowest stations.
pub fn extremes_table(ui: &mut Ui, id: &str, extremes: &BTreeMap<Field, StationExtreme>) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(60.0))
            .column(Column::auto().at_least(110.0))
            .column(Column::auto().at_least(64.0))
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for title in ["Pollutant", "Station", "Mean"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (field, extreme) in extremes {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.label(field.column());
                        });
                        row.col(|ui| {
                            ui.label(extreme.station.as_str());
                        });
                        row.col(|ui| {
                            ui.label(format_value(Some(extreme.value), ""));
                        });
                    });
                }
            });
    });
}
