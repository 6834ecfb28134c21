//! Narrative statements derived from [`DerivedViews`].
//!
//! Nothing here is hardcoded prose about a particular dataset: every claim is
//! read off the computed views, so it stays true for any table and filter.

use std::collections::BTreeMap;

use super::model::Field;
use super::pipeline::{
    CorrelationMatrix, DerivedViews, FieldValues, MultiYearChange, StationAverages,
    StationExtreme, YearlyChange, YearlyMean,
};

/// A titled group of bullet lines.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSection {
    pub title: String,
    pub lines: Vec<String>,
}

/// Build every insight section. Empty views give no sections.
pub fn insights(views: &DerivedViews) -> Vec<InsightSection> {
    if views.is_empty() {
        return Vec::new();
    }

    let mut sections = Vec::new();
    if let Some(change) = &views.multi_year_change {
        sections.push(InsightSection {
            title: format!("Pollution trend from {} to {}", change.from_year, change.to_year),
            lines: multi_year_summary(change),
        });
    }
    if views.yearly_change.len() > 1 {
        sections.push(InsightSection {
            title: "Year-by-year development".to_string(),
            lines: yearly_growth_summary(&views.yearly_change),
        });
    }
    if !views.station_averages.is_empty() {
        sections.push(InsightSection {
            title: "Stations with the highest and lowest pollution".to_string(),
            lines: station_summary(&views.station_averages),
        });
    }
    if !views.correlation.is_empty() {
        sections.push(InsightSection {
            title: "Pollution and weather".to_string(),
            lines: correlation_summary(&views.correlation),
        });
    }
    sections
}

fn value(values: &FieldValues, field: Field) -> Option<f64> {
    values.get(&field).copied().flatten()
}

/// `PM2.5: Increase of 15.54%` per pollutant, in pollutant order.
pub fn key_changes(change: &MultiYearChange) -> Vec<String> {
    Field::POLLUTANTS
        .iter()
        .map(|field| match value(&change.change, *field) {
            Some(v) if v > 0.0 => format!("{field}: Increase of {v:.2}%"),
            Some(v) if v < 0.0 => format!("{field}: Decrease of {v:.2}%"),
            Some(_) => format!("{field}: No change"),
            None => format!("{field}: no data"),
        })
        .collect()
}

/// Pollutants that rose and fell, largest change first.
pub fn multi_year_summary(change: &MultiYearChange) -> Vec<String> {
    let mut ranked: Vec<(Field, f64)> = Field::POLLUTANTS
        .iter()
        .filter_map(|f| Some((*f, value(&change.change, *f)?)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let names = |pred: fn(f64) -> bool| -> Vec<String> {
        ranked
            .iter()
            .filter(|(_, v)| pred(*v))
            .map(|(f, _)| f.to_string())
            .collect()
    };
    let rose = names(|v| v > 0.0);
    let fell = names(|v| v < 0.0);

    let mut lines = Vec::new();
    if !rose.is_empty() {
        lines.push(format!("Increased: {}", rose.join(", ")));
    }
    if !fell.is_empty() {
        lines.push(format!("Decreased: {}", fell.join(", ")));
    }
    for (field, v) in &ranked {
        let verb = if *v > 0.0 { "rose" } else if *v < 0.0 { "fell" } else { "was unchanged" };
        lines.push(format!("{field} {verb} by {:.2}%", v.abs()));
    }
    lines
}

/// One line per year after the first: how many pollutants rose and the
/// largest mover.
pub fn yearly_growth_summary(changes: &[YearlyChange]) -> Vec<String> {
    changes
        .iter()
        .skip(1)
        .map(|year| {
            let known: Vec<(Field, f64)> = Field::POLLUTANTS
                .iter()
                .filter_map(|f| Some((*f, value(&year.change, *f)?)))
                .collect();
            if known.is_empty() {
                return format!("{}: no data", year.year);
            }
            let rose = known.iter().filter(|(_, v)| *v > 0.0).count();
            let fell = known.iter().filter(|(_, v)| *v < 0.0).count();
            let (field, biggest) = known
                .iter()
                .copied()
                .reduce(|best, next| if next.1.abs() > best.1.abs() { next } else { best })
                .unwrap_or((Field::Pm25, 0.0));
            let direction = if rose > fell {
                "mostly rising"
            } else if fell > rose {
                "mostly falling"
            } else {
                "mixed"
            };
            format!(
                "{}: {direction}, {rose} of {} pollutants up and {fell} down; largest move {field} ({biggest:+.2}%)",
                year.year,
                known.len()
            )
        })
        .collect()
}

/// Bullet lines beside the yearly trend chart: most and least variable
/// pollutant across years, and how often PM2.5 and PM10 move together.
pub fn trend_summary(yearly: &[YearlyMean]) -> Vec<String> {
    let mut lines = Vec::new();

    let variation: Vec<(Field, f64)> = Field::POLLUTANTS
        .iter()
        .filter_map(|f| {
            let series: Vec<f64> = yearly.iter().filter_map(|y| value(&y.means, *f)).collect();
            Some((*f, coefficient_of_variation(&series)?))
        })
        .collect();
    let most = variation.iter().copied().reduce(|a, b| if b.1 > a.1 { b } else { a });
    let least = variation.iter().copied().reduce(|a, b| if b.1 < a.1 { b } else { a });
    if let (Some((hi, hi_cv)), Some((lo, lo_cv))) = (most, least) {
        lines.push(format!("{hi} fluctuates the most ({:.1}% variation across years).", hi_cv * 100.0));
        lines.push(format!("{lo} is the most stable ({:.1}% variation).", lo_cv * 100.0));
    }

    let steps: Vec<(f64, f64)> = yearly
        .windows(2)
        .filter_map(|pair| {
            let d25 = value(&pair[1].means, Field::Pm25)? - value(&pair[0].means, Field::Pm25)?;
            let d10 = value(&pair[1].means, Field::Pm10)? - value(&pair[0].means, Field::Pm10)?;
            Some((d25, d10))
        })
        .collect();
    if !steps.is_empty() {
        let together = steps.iter().filter(|(a, b)| a.signum() == b.signum()).count();
        lines.push(format!(
            "PM2.5 and PM10 move in the same direction in {together} of {} year steps.",
            steps.len()
        ));
    }
    lines
}

/// Population standard deviation over mean; `None` for fewer than two values
/// or a zero mean.
fn coefficient_of_variation(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(var.sqrt() / mean.abs())
}

/// Station most often highest and most often lowest across pollutants.
pub fn station_summary(averages: &StationAverages) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some((station, count)) = most_frequent(averages, &averages.highest) {
        lines.push(format!(
            "{station} has the highest average for {count} of {} pollutants.",
            averages.highest.len()
        ));
    }
    if let Some((station, count)) = most_frequent(averages, &averages.lowest) {
        lines.push(format!(
            "{station} has the lowest average for {count} of {} pollutants.",
            averages.lowest.len()
        ));
    }
    for field in Field::POLLUTANTS {
        if let (Some(high), Some(low)) = (averages.highest.get(&field), averages.lowest.get(&field)) {
            lines.push(format!(
                "{field}: highest {} ({:.2}), lowest {} ({:.2})",
                high.station, high.value, low.station, low.value
            ));
        }
    }
    lines
}

/// Ties go to the station listed first.
fn most_frequent<'a>(
    averages: &'a StationAverages,
    extremes: &BTreeMap<Field, StationExtreme>,
) -> Option<(&'a str, usize)> {
    averages
        .stations
        .iter()
        .map(|s| {
            let count = extremes.values().filter(|e| e.station == s.station).count();
            (s.station.as_str(), count)
        })
        .filter(|(_, count)| *count > 0)
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
}

fn strength(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.5 => "strong",
        a if a >= 0.3 => "moderate",
        _ => "weak",
    }
}

/// For each weather field: the sign of its correlation with most pollutants
/// and its strongest pollutant correlation.
pub fn correlation_summary(matrix: &CorrelationMatrix) -> Vec<String> {
    Field::WEATHER
        .iter()
        .filter_map(|weather| {
            let known: Vec<(Field, f64)> = Field::POLLUTANTS
                .iter()
                .filter_map(|p| Some((*p, matrix.get(*weather, *p)?)))
                .collect();
            if known.is_empty() {
                return None;
            }
            let negative = known.iter().filter(|(_, r)| *r < 0.0).count();
            let positive = known.iter().filter(|(_, r)| *r > 0.0).count();
            let (field, r) = known
                .iter()
                .copied()
                .reduce(|best, next| if next.1.abs() > best.1.abs() { next } else { best })?;
            let sign = if negative > positive { "negatively" } else { "positively" };
            let majority = negative.max(positive);
            Some(format!(
                "{} correlates {sign} with {majority} of {} pollutants; strongest with {field} ({r:.2}, {}).",
                weather.description(),
                known.len(),
                strength(r)
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::StationFilter;
    use crate::data::model::{MeasurementRow, MeasurementTable};
    use crate::data::pipeline::aggregate;

    fn change_of(values: &[(Field, Option<f64>)]) -> MultiYearChange {
        MultiYearChange {
            from_year: 2013,
            to_year: 2017,
            change: values.iter().copied().collect(),
        }
    }

    #[test]
    fn key_changes_use_direction_words() {
        let change = change_of(&[
            (Field::Pm25, Some(15.54)),
            (Field::So2, Some(-9.35)),
            (Field::O3, Some(0.0)),
        ]);
        let lines = key_changes(&change);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "PM2.5: Increase of 15.54%");
        assert_eq!(lines[1], "PM10: no data");
        assert_eq!(lines[2], "SO2: Decrease of -9.35%");
        assert_eq!(lines[5], "O3: No change");
    }

    #[test]
    fn multi_year_summary_ranks_changes() {
        let change = change_of(&[
            (Field::Pm25, Some(15.54)),
            (Field::Co, Some(31.73)),
            (Field::O3, Some(-29.89)),
        ]);
        let lines = multi_year_summary(&change);
        assert_eq!(lines[0], "Increased: CO, PM2.5");
        assert_eq!(lines[1], "Decreased: O3");
        assert_eq!(lines[2], "CO rose by 31.73%");
        assert_eq!(lines.last().unwrap(), "O3 fell by 29.89%");
    }

    #[test]
    fn yearly_growth_names_largest_mover() {
        let changes = vec![
            YearlyChange {
                year: 2013,
                change: Field::POLLUTANTS.iter().map(|f| (*f, Some(0.0))).collect(),
            },
            YearlyChange {
                year: 2014,
                change: [
                    (Field::Pm25, Some(6.72)),
                    (Field::Pm10, Some(12.67)),
                    (Field::Co, Some(-1.0)),
                ]
                .into_iter()
                .collect(),
            },
        ];
        let lines = yearly_growth_summary(&changes);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("2014: mostly rising, 2 of 3 pollutants up and 1 down"));
        assert!(lines[0].ends_with("largest move PM10 (+12.67%)"));
    }

    #[test]
    fn insights_follow_the_data() {
        let mut rows = Vec::new();
        for (year, temp) in [(2013, 0.0), (2014, 5.0), (2015, 10.0)] {
            for (station, level) in [("Dongsi", 100.0), ("Dingling", 20.0)] {
                let mut row = MeasurementRow::new(station, year);
                for p in Field::POLLUTANTS {
                    row.set(p, Some(level - temp));
                }
                row.set(Field::Temp, Some(temp));
                rows.push(row);
            }
        }
        let table = MeasurementTable::from_rows(rows);
        let views = aggregate(&table, &StationFilter::All);
        let sections = insights(&views);
        assert_eq!(sections.len(), 4);

        let stations = &sections[2].lines;
        assert_eq!(stations[0], "Dongsi has the highest average for 6 of 6 pollutants.");
        assert_eq!(stations[1], "Dingling has the lowest average for 6 of 6 pollutants.");

        let weather = &sections[3].lines;
        assert_eq!(weather.len(), 1);
        assert!(weather[0].starts_with("Temperature correlates negatively with 6 of 6 pollutants"));

        let decreased = &sections[0].lines[0];
        assert!(decreased.starts_with("Decreased: "));
    }

    #[test]
    fn trend_summary_reports_volatility() {
        let yearly: Vec<YearlyMean> = [(2013, 10.0, 50.0), (2014, 12.0, 20.0), (2015, 14.0, 60.0)]
            .into_iter()
            .map(|(year, pm25, o3)| YearlyMean {
                year,
                means: [
                    (Field::Pm25, Some(pm25)),
                    (Field::Pm10, Some(pm25 * 2.0)),
                    (Field::O3, Some(o3)),
                ]
                .into_iter()
                .collect(),
            })
            .collect();
        let lines = trend_summary(&yearly);
        assert!(lines[0].starts_with("O3 fluctuates the most"));
        assert_eq!(lines[2], "PM2.5 and PM10 move in the same direction in 2 of 2 year steps.");
    }

    #[test]
    fn empty_views_have_no_insights() {
        assert!(insights(&DerivedViews::default()).is_empty());
    }
}
