use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::filter::{filtered_rows, StationFilter};
use super::model::{Field, MeasurementRow, MeasurementTable};
use crate::error::AggregationError;

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// One value per field. `None` is a missing mean or an undefined change.
pub type FieldValues = BTreeMap<Field, Option<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyMean {
    pub year: i32,
    pub means: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyChange {
    pub year: i32,
    /// Percent change from the preceding year, rounded to 2 decimals.
    pub change: FieldValues,
}

/// Percent change between the first and last year present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiYearChange {
    pub from_year: i32,
    pub to_year: i32,
    pub change: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAverage {
    pub station: String,
    pub means: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationExtreme {
    pub station: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationAverages {
    /// Stations in order of first appearance.
    pub stations: Vec<StationAverage>,
    pub highest: BTreeMap<Field, StationExtreme>,
    pub lowest: BTreeMap<Field, StationExtreme>,
}

impl StationAverages {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Square Pearson matrix over `fields`. `None` marks an undefined coefficient.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<Field>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Field, b: Field) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything the dashboard displays for one table + filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedViews {
    pub filter: StationFilter,
    /// Number of rows that passed the filter.
    pub row_count: usize,
    pub yearly_means: Vec<YearlyMean>,
    pub multi_year_change: Option<MultiYearChange>,
    pub yearly_change: Vec<YearlyChange>,
    pub station_averages: StationAverages,
    pub correlation: CorrelationMatrix,
}

impl DerivedViews {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// `Err(EmptyResult)` when the filter matched no rows.
    pub fn ensure_data(&self) -> Result<&Self, AggregationError> {
        if self.is_empty() {
            Err(AggregationError::EmptyResult {
                filter: self.filter.to_string(),
            })
        } else {
            Ok(self)
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Compute every derived view for the rows matching `filter`.
///
/// Pure: the table is only read, and identical inputs give identical output.
/// An empty selection yields empty views rather than an error; use
/// [`DerivedViews::ensure_data`] to detect it.
pub fn aggregate(table: &MeasurementTable, filter: &StationFilter) -> DerivedViews {
    let rows = filtered_rows(table, filter);
    if rows.is_empty() {
        return DerivedViews {
            filter: filter.clone(),
            ..Default::default()
        };
    }

    let yearly_means = yearly_means(&rows);
    let views = DerivedViews {
        filter: filter.clone(),
        row_count: rows.len(),
        multi_year_change: multi_year_change(&yearly_means),
        yearly_change: yearly_change(&yearly_means),
        station_averages: station_averages(&rows),
        correlation: correlation_matrix(&rows, &Field::ALL),
        yearly_means,
    };
    log::debug!(
        "aggregated {} rows for '{}': {} years, {} stations",
        views.row_count,
        filter,
        views.yearly_means.len(),
        views.station_averages.stations.len()
    );
    views
}

/// Running mean that ignores missing values.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-pollutant means for one group of rows.
#[derive(Debug, Clone, Default)]
struct PollutantMeans([Mean; 6]);

impl PollutantMeans {
    fn push(&mut self, row: &MeasurementRow) {
        for (mean, field) in self.0.iter_mut().zip(Field::POLLUTANTS) {
            mean.push(row.get(field));
        }
    }

    fn finish(&self) -> FieldValues {
        Field::POLLUTANTS
            .iter()
            .zip(&self.0)
            .map(|(field, mean)| (*field, mean.value()))
            .collect()
    }
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// `(to - from) / from * 100`, rounded. A zero baseline gives 0.
fn percent_change(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    let (from, to) = (from?, to?);
    if from == 0.0 {
        return Some(0.0);
    }
    Some(round2((to - from) / from * 100.0))
}

fn change_between(from: &FieldValues, to: &FieldValues) -> FieldValues {
    Field::POLLUTANTS
        .iter()
        .map(|field| {
            let before = from.get(field).copied().flatten();
            let after = to.get(field).copied().flatten();
            (*field, percent_change(before, after))
        })
        .collect()
}

/// Group by year, ascending.
fn yearly_means(rows: &[&MeasurementRow]) -> Vec<YearlyMean> {
    let mut by_year: BTreeMap<i32, PollutantMeans> = BTreeMap::new();
    for row in rows {
        by_year.entry(row.year).or_default().push(row);
    }
    by_year
        .into_iter()
        .map(|(year, means)| YearlyMean {
            year,
            means: means.finish(),
        })
        .collect()
}

/// First year present against last year present.
fn multi_year_change(yearly: &[YearlyMean]) -> Option<MultiYearChange> {
    let first = yearly.first()?;
    let last = yearly.last()?;
    Some(MultiYearChange {
        from_year: first.year,
        to_year: last.year,
        change: change_between(&first.means, &last.means),
    })
}

/// Change against the most recent year with a mean for the pollutant.
///
/// A missing mean never yields a missing change: the first year, a year
/// without data, and a year with no earlier data all read 0.
fn yearly_change(yearly: &[YearlyMean]) -> Vec<YearlyChange> {
    let mut last_seen: BTreeMap<Field, f64> = BTreeMap::new();
    yearly
        .iter()
        .map(|year| {
            let change = Field::POLLUTANTS
                .iter()
                .map(|field| {
                    let current = year.means.get(field).copied().flatten();
                    let previous = last_seen.get(field).copied();
                    if let Some(v) = current {
                        last_seen.insert(*field, v);
                    }
                    (*field, percent_change(previous, current).or(Some(0.0)))
                })
                .collect();
            YearlyChange {
                year: year.year,
                change,
            }
        })
        .collect()
}

fn station_averages(rows: &[&MeasurementRow]) -> StationAverages {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, PollutantMeans)> = Vec::new();
    for row in rows {
        let slot = *index.entry(row.station.as_str()).or_insert_with(|| {
            groups.push((row.station.as_str(), PollutantMeans::default()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }

    let stations: Vec<StationAverage> = groups
        .into_iter()
        .map(|(station, means)| StationAverage {
            station: station.to_string(),
            means: means.finish(),
        })
        .collect();

    let mut highest = BTreeMap::new();
    let mut lowest = BTreeMap::new();
    for field in Field::POLLUTANTS {
        let values = stations
            .iter()
            .filter_map(|s| Some((s, s.means.get(&field).copied().flatten()?)));

        let mut max: Option<(&StationAverage, f64)> = None;
        let mut min: Option<(&StationAverage, f64)> = None;
        for (station, value) in values {
            // Strict comparisons keep the first station on ties.
            if max.map_or(true, |(_, best)| value > best) {
                max = Some((station, value));
            }
            if min.map_or(true, |(_, best)| value < best) {
                min = Some((station, value));
            }
        }
        if let Some((s, value)) = max {
            highest.insert(field, StationExtreme { station: s.station.clone(), value });
        }
        if let Some((s, value)) = min {
            lowest.insert(field, StationExtreme { station: s.station.clone(), value });
        }
    }

    StationAverages {
        stations,
        highest,
        lowest,
    }
}

fn correlation_matrix(rows: &[&MeasurementRow], fields: &[Field]) -> CorrelationMatrix {
    let n = fields.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(rows, fields[i], fields[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        fields: fields.to_vec(),
        values,
    }
}

/// Pearson coefficient over rows where both fields are present.
///
/// `None` with fewer than two pairs or when either side is constant.
fn pearson(rows: &[&MeasurementRow], a: Field, b: Field) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.get(a)?, row.get(b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let (x0, y0) = pairs[0];
    if pairs.iter().all(|&(x, _)| x == x0) || pairs.iter().all(|&(_, y)| y == y0) {
        return None;
    }
    if a == b {
        return Some(1.0);
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(station: &str, year: i32, pm25: f64) -> MeasurementRow {
        MeasurementRow::new(station, year).with(Field::Pm25, pm25)
    }

    /// Three stations over 2013..=2017 with every field populated.
    fn sample_table() -> MeasurementTable {
        let stations = ["Aotizhongxin", "Dongsi", "Dingling"];
        let mut rows = Vec::new();
        for year in 2013..=2017 {
            for (s, station) in stations.iter().enumerate() {
                for hour in 0..4 {
                    let t = (year - 2013) as f64 + s as f64 * 0.5 + hour as f64 * 0.1;
                    let mut r = MeasurementRow::new(*station, year);
                    r.set(Field::Pm25, Some(50.0 + 10.0 * t));
                    r.set(Field::Pm10, Some(80.0 + 5.0 * t + hour as f64));
                    r.set(Field::So2, Some(20.0 - t));
                    r.set(Field::No2, Some(40.0 + (hour % 2) as f64));
                    r.set(Field::Co, Some(1000.0 + 30.0 * t));
                    r.set(Field::O3, Some(60.0 - 2.0 * t + hour as f64));
                    r.set(Field::Temp, Some(10.0 + t));
                    r.set(Field::Pres, Some(1010.0 - t));
                    r.set(Field::Rain, Some((hour % 3) as f64));
                    r.set(Field::Wspm, Some(2.0 + 0.1 * hour as f64));
                    rows.push(r);
                }
            }
        }
        MeasurementTable::from_rows(rows)
    }

    fn value(values: &FieldValues, field: Field) -> Option<f64> {
        values.get(&field).copied().flatten()
    }

    #[test]
    fn yearly_means_cover_distinct_years_ascending() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2015, 1.0),
            row("Dongsi", 2013, 2.0),
            row("Dongsi", 2015, 3.0),
            row("Dongsi", 2014, 4.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        let years: Vec<i32> = views.yearly_means.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2013, 2014, 2015]);
        assert_eq!(value(&views.yearly_means[2].means, Field::Pm25), Some(2.0));
    }

    #[test]
    fn multi_year_change_scenario() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2013, 40.0),
            row("Dongsi", 2013, 60.0),
            row("Dongsi", 2017, 60.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        let change = views.multi_year_change.unwrap();
        assert_eq!((change.from_year, change.to_year), (2013, 2017));
        assert_eq!(value(&change.change, Field::Pm25), Some(20.0));
    }

    #[test]
    fn multi_year_change_matches_yearly_means() {
        let views = aggregate(&sample_table(), &StationFilter::All);
        let change = views.multi_year_change.as_ref().unwrap();
        let first = &views.yearly_means.first().unwrap().means;
        let last = &views.yearly_means.last().unwrap().means;
        for field in Field::POLLUTANTS {
            let base = value(first, field).unwrap();
            let end = value(last, field).unwrap();
            let expected = if base == 0.0 {
                0.0
            } else {
                ((end - base) / base * 100.0 * 100.0).round() / 100.0
            };
            assert_eq!(value(&change.change, field), Some(expected), "{field}");
        }
    }

    #[test]
    fn zero_baseline_gives_zero_change() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2013, 0.0),
            row("Dongsi", 2014, 5.0),
            row("Dongsi", 2015, 10.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        let change = views.multi_year_change.unwrap();
        assert_eq!(value(&change.change, Field::Pm25), Some(0.0));
        assert_eq!(value(&views.yearly_change[1].change, Field::Pm25), Some(0.0));
        assert_eq!(value(&views.yearly_change[2].change, Field::Pm25), Some(100.0));
    }

    #[test]
    fn yearly_change_starts_at_zero() {
        let views = aggregate(&sample_table(), &StationFilter::All);
        assert_eq!(views.yearly_change.len(), views.yearly_means.len());
        let first = &views.yearly_change[0];
        assert_eq!(first.year, 2013);
        for field in Field::POLLUTANTS {
            assert_eq!(value(&first.change, field), Some(0.0), "{field}");
        }
    }

    #[test]
    fn yearly_change_is_rounded_percent() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2013, 3.0),
            row("Dongsi", 2014, 4.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        assert_eq!(value(&views.yearly_change[1].change, Field::Pm25), Some(33.33));
    }

    #[test]
    fn missing_mean_stays_missing_in_yearly_means() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2013, 10.0),
            MeasurementRow::new("Dongsi", 2014).with(Field::Pm10, 3.0),
            row("Dongsi", 2015, 12.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        assert_eq!(value(&views.yearly_means[1].means, Field::Pm25), None);
        assert_eq!(value(&views.yearly_means[1].means, Field::Pm10), Some(3.0));
        let change = views.multi_year_change.unwrap();
        assert_eq!(value(&change.change, Field::Pm25), Some(20.0));
    }

    #[test]
    fn yearly_change_bridges_a_gap_year() {
        let table = MeasurementTable::from_rows(vec![
            row("Dongsi", 2013, 10.0),
            MeasurementRow::new("Dongsi", 2014).with(Field::Pm10, 3.0),
            row("Dongsi", 2015, 12.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        let pm25: Vec<Option<f64>> = views
            .yearly_change
            .iter()
            .map(|y| value(&y.change, Field::Pm25))
            .collect();
        // the gap year reads 0, the next year compares against 2013
        assert_eq!(pm25, vec![Some(0.0), Some(0.0), Some(20.0)]);

        // PM10 only exists in 2014: no earlier baseline, no later value
        let pm10: Vec<Option<f64>> = views
            .yearly_change
            .iter()
            .map(|y| value(&y.change, Field::Pm10))
            .collect();
        assert_eq!(pm10, vec![Some(0.0), Some(0.0), Some(0.0)]);
        assert!(views
            .yearly_change
            .iter()
            .all(|y| Field::POLLUTANTS.iter().all(|f| value(&y.change, *f).is_some())));
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(33.3333), 33.33);
    }

    #[test]
    fn missing_values_only_skip_their_field() {
        let table = MeasurementTable::from_rows(vec![
            MeasurementRow::new("Dongsi", 2013).with(Field::Pm25, 10.0).with(Field::O3, 1.0),
            MeasurementRow::new("Dongsi", 2013).with(Field::O3, 3.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        assert_eq!(value(&views.yearly_means[0].means, Field::Pm25), Some(10.0));
        assert_eq!(value(&views.yearly_means[0].means, Field::O3), Some(2.0));
    }

    #[test]
    fn station_extremes_are_true_extremes() {
        let views = aggregate(&sample_table(), &StationFilter::All);
        let averages = &views.station_averages;
        assert_eq!(averages.stations.len(), 3);
        for field in Field::POLLUTANTS {
            let high = &averages.highest[&field];
            let low = &averages.lowest[&field];
            for s in &averages.stations {
                let v = value(&s.means, field).unwrap();
                assert!(v <= high.value, "{field}: {} above max", s.station);
                assert!(v >= low.value, "{field}: {} below min", s.station);
            }
        }
        assert_eq!(averages.highest[&Field::Pm25].station, "Dingling");
        assert_eq!(averages.lowest[&Field::Pm25].station, "Aotizhongxin");
    }

    #[test]
    fn station_ties_go_to_first_seen() {
        let table = MeasurementTable::from_rows(vec![
            row("Wanliu", 2013, 5.0),
            row("Gucheng", 2013, 5.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        assert_eq!(views.station_averages.highest[&Field::Pm25].station, "Wanliu");
        assert_eq!(views.station_averages.lowest[&Field::Pm25].station, "Wanliu");
        assert!(!views.station_averages.highest.contains_key(&Field::Co));
    }

    #[test]
    fn station_filter_degenerates_to_one_station() {
        let filter = StationFilter::Station("Dongsi".into());
        let views = aggregate(&sample_table(), &filter);
        assert_eq!(views.station_averages.stations.len(), 1);
        assert_eq!(views.station_averages.stations[0].station, "Dongsi");
        assert_eq!(views.row_count, 20);
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let views = aggregate(&sample_table(), &StationFilter::All);
        let corr = &views.correlation;
        assert_eq!(corr.fields.len(), 10);
        for a in Field::ALL {
            assert_eq!(corr.get(a, a), Some(1.0), "{a}");
            for b in Field::ALL {
                assert_eq!(corr.get(a, b), corr.get(b, a));
                if let Some(r) = corr.get(a, b) {
                    assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
        // TEMP and PRES move in opposite directions by construction
        assert!(corr.get(Field::Temp, Field::Pres).unwrap() < -0.99);
    }

    #[test]
    fn constant_column_correlation_is_undefined() {
        let table = MeasurementTable::from_rows(vec![
            MeasurementRow::new("Dongsi", 2013).with(Field::Pm25, 1.0).with(Field::Rain, 0.0),
            MeasurementRow::new("Dongsi", 2013).with(Field::Pm25, 2.0).with(Field::Rain, 0.0),
            MeasurementRow::new("Dongsi", 2013).with(Field::Pm25, 4.0).with(Field::Rain, 0.0),
        ]);
        let views = aggregate(&table, &StationFilter::All);
        assert_eq!(views.correlation.get(Field::Rain, Field::Rain), None);
        assert_eq!(views.correlation.get(Field::Pm25, Field::Rain), None);
        assert_eq!(views.correlation.get(Field::Pm25, Field::Pm25), Some(1.0));
    }

    #[test]
    fn absent_station_yields_empty_views() {
        let filter = StationFilter::Station("Nowhere".into());
        let views = aggregate(&sample_table(), &filter);
        assert!(views.is_empty());
        assert!(views.yearly_means.is_empty());
        assert!(views.yearly_change.is_empty());
        assert!(views.multi_year_change.is_none());
        assert!(views.station_averages.is_empty());
        assert!(views.correlation.is_empty());
        assert_eq!(
            views.ensure_data().unwrap_err(),
            AggregationError::EmptyResult {
                filter: "Nowhere".into()
            }
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let table = sample_table();
        let filter = StationFilter::All;
        let a = aggregate(&table, &filter);
        let b = aggregate(&table, &filter);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(a, b);
    }
}
