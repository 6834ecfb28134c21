use std::fmt;

use serde::Serialize;

use super::model::{MeasurementRow, MeasurementTable};

// ---------------------------------------------------------------------------
// Station filter: which rows participate in aggregation
// ---------------------------------------------------------------------------

/// Either every station or a single one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum StationFilter {
    #[default]
    All,
    Station(String),
}

impl StationFilter {
    pub fn matches(&self, station: &str) -> bool {
        match self {
            StationFilter::All => true,
            StationFilter::Station(wanted) => wanted == station,
        }
    }

    /// Label shown in the station selector.
    pub fn label(&self) -> &str {
        match self {
            StationFilter::All => "All stations",
            StationFilter::Station(name) => name,
        }
    }
}

impl fmt::Display for StationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Return indices of rows that pass the filter, in table order.
pub fn filtered_indices(table: &MeasurementTable, filter: &StationFilter) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| filter.matches(&row.station))
        .map(|(i, _)| i)
        .collect()
}

/// Borrow the rows that pass the filter, in table order.
pub fn filtered_rows<'a>(table: &'a MeasurementTable, filter: &StationFilter) -> Vec<&'a MeasurementRow> {
    filtered_indices(table, filter)
        .into_iter()
        .map(|i| &table.rows()[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MeasurementTable {
        MeasurementTable::from_rows(vec![
            MeasurementRow::new("Dongsi", 2013),
            MeasurementRow::new("Dingling", 2013),
            MeasurementRow::new("Dongsi", 2014),
        ])
    }

    #[test]
    fn all_keeps_every_row() {
        assert_eq!(filtered_indices(&table(), &StationFilter::All), vec![0, 1, 2]);
    }

    #[test]
    fn station_keeps_its_rows() {
        let filter = StationFilter::Station("Dongsi".into());
        assert_eq!(filtered_indices(&table(), &filter), vec![0, 2]);
        let table = table();
        let rows = filtered_rows(&table, &filter);
        assert!(rows.iter().all(|r| r.station == "Dongsi"));
    }

    #[test]
    fn unknown_station_matches_nothing() {
        let filter = StationFilter::Station("Nowhere".into());
        assert!(filtered_indices(&table(), &filter).is_empty());
        assert_eq!(filter.to_string(), "Nowhere");
        assert_eq!(StationFilter::All.label(), "All stations");
    }
}
