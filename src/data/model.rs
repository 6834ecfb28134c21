use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Field – the ten numeric columns of a measurement
// ---------------------------------------------------------------------------

/// One of the numeric columns carried by every measurement row.
///
/// Declaration order is the display order, and `Ord` follows it, so maps keyed
/// by `Field` iterate pollutants first, weather last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "TEMP")]
    Temp,
    #[serde(rename = "PRES")]
    Pres,
    #[serde(rename = "RAIN")]
    Rain,
    #[serde(rename = "WSPM")]
    Wspm,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Pm25,
        Field::Pm10,
        Field::So2,
        Field::No2,
        Field::Co,
        Field::O3,
        Field::Temp,
        Field::Pres,
        Field::Rain,
        Field::Wspm,
    ];

    pub const POLLUTANTS: [Field; 6] = [
        Field::Pm25,
        Field::Pm10,
        Field::So2,
        Field::No2,
        Field::Co,
        Field::O3,
    ];

    pub const WEATHER: [Field; 4] = [Field::Temp, Field::Pres, Field::Rain, Field::Wspm];

    /// Column header used in the input files.
    pub fn column(self) -> &'static str {
        match self {
            Field::Pm25 => "PM2.5",
            Field::Pm10 => "PM10",
            Field::So2 => "SO2",
            Field::No2 => "NO2",
            Field::Co => "CO",
            Field::O3 => "O3",
            Field::Temp => "TEMP",
            Field::Pres => "PRES",
            Field::Rain => "RAIN",
            Field::Wspm => "WSPM",
        }
    }

    /// Human readable name for weather fields; pollutants keep their symbol.
    pub fn description(self) -> &'static str {
        match self {
            Field::Temp => "Temperature",
            Field::Pres => "Pressure",
            Field::Rain => "Rain",
            Field::Wspm => "Wind speed",
            other => other.column(),
        }
    }

    pub fn is_pollutant(self) -> bool {
        Field::POLLUTANTS.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// MeasurementRow – one observation
// ---------------------------------------------------------------------------

/// A single observation of one station. Numeric fields are `None` when the
/// source cell was empty or held a missing-value token such as `NA`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MeasurementRow {
    pub station: String,
    pub year: i32,
    #[serde(rename = "PM2.5", default, deserialize_with = "lenient_f64")]
    pub pm25: Option<f64>,
    #[serde(rename = "PM10", default, deserialize_with = "lenient_f64")]
    pub pm10: Option<f64>,
    #[serde(rename = "SO2", default, deserialize_with = "lenient_f64")]
    pub so2: Option<f64>,
    #[serde(rename = "NO2", default, deserialize_with = "lenient_f64")]
    pub no2: Option<f64>,
    #[serde(rename = "CO", default, deserialize_with = "lenient_f64")]
    pub co: Option<f64>,
    #[serde(rename = "O3", default, deserialize_with = "lenient_f64")]
    pub o3: Option<f64>,
    #[serde(rename = "TEMP", default, deserialize_with = "lenient_f64")]
    pub temp: Option<f64>,
    #[serde(rename = "PRES", default, deserialize_with = "lenient_f64")]
    pub pres: Option<f64>,
    #[serde(rename = "RAIN", default, deserialize_with = "lenient_f64")]
    pub rain: Option<f64>,
    #[serde(rename = "WSPM", default, deserialize_with = "lenient_f64")]
    pub wspm: Option<f64>,
}

impl MeasurementRow {
    /// A row with every numeric field missing.
    pub fn new(station: impl Into<String>, year: i32) -> Self {
        Self {
            station: station.into(),
            year,
            pm25: None,
            pm10: None,
            so2: None,
            no2: None,
            co: None,
            o3: None,
            temp: None,
            pres: None,
            rain: None,
            wspm: None,
        }
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Pm25 => self.pm25,
            Field::Pm10 => self.pm10,
            Field::So2 => self.so2,
            Field::No2 => self.no2,
            Field::Co => self.co,
            Field::O3 => self.o3,
            Field::Temp => self.temp,
            Field::Pres => self.pres,
            Field::Rain => self.rain,
            Field::Wspm => self.wspm,
        }
    }

    /// Set a numeric field. NaN and infinities are stored as missing.
    pub fn set(&mut self, field: Field, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        let slot = match field {
            Field::Pm25 => &mut self.pm25,
            Field::Pm10 => &mut self.pm10,
            Field::So2 => &mut self.so2,
            Field::No2 => &mut self.no2,
            Field::Co => &mut self.co,
            Field::O3 => &mut self.o3,
            Field::Temp => &mut self.temp,
            Field::Pres => &mut self.pres,
            Field::Rain => &mut self.rain,
            Field::Wspm => &mut self.wspm,
        };
        *slot = value;
    }

    /// Builder-style [`MeasurementRow::set`].
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }
}

/// Tokens that mean "no value" in the source files (compared case-insensitively).
pub const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "null", "none"];

/// Parse a text cell into an optional number.
///
/// `Ok(None)` for missing-value tokens, `Err` for anything else that is not a
/// number.
pub fn parse_cell(text: &str) -> Result<Option<f64>, String> {
    let trimmed = text.trim();
    if MISSING_TOKENS
        .iter()
        .any(|tok| trimmed.eq_ignore_ascii_case(tok))
    {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(|v| Some(v).filter(|v| v.is_finite()))
        .map_err(|_| format!("'{trimmed}' is not a number"))
}

/// Accepts numbers, numeric strings, missing-value tokens and null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Number(f64),
        Text(String),
    }

    match Option::<Cell>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Cell::Number(v)) => Ok(Some(v).filter(|v| v.is_finite())),
        Some(Cell::Text(s)) => parse_cell(&s).map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// MeasurementTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All loaded rows plus the station index. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    rows: Vec<MeasurementRow>,
    /// Distinct stations in order of first appearance.
    stations: Vec<String>,
}

impl MeasurementTable {
    pub fn from_rows(rows: Vec<MeasurementRow>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stations = Vec::new();
        for row in &rows {
            if seen.insert(row.station.as_str()) {
                stations.push(row.station.clone());
            }
        }
        MeasurementTable { rows, stations }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Smallest and largest year present.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|r| r.year).min()?;
        let max = self.rows.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
