use std::f64::consts::PI;
use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Station name and how polluted it is relative to the city average.
const STATIONS: [(&str, f64); 6] = [
    ("Aotizhongxin", 1.05),
    ("Dingling", 0.70),
    ("Dongsi", 1.20),
    ("Gucheng", 1.10),
    ("Huairou", 0.80),
    ("Wanliu", 1.00),
];

/// Multiplier on pollutant levels per year, 2013..=2017.
const YEAR_FACTORS: [f64; 5] = [1.00, 1.07, 0.93, 0.85, 1.12];

const HOURS: [i64; 4] = [0, 6, 12, 18];
const MISSING_RATE: f64 = 0.02;

const NUMERIC: [&str; 10] = [
    "PM2.5", "PM10", "SO2", "NO2", "CO", "O3", "TEMP", "PRES", "RAIN", "WSPM",
];

#[derive(Default)]
struct Columns {
    year: Vec<i64>,
    month: Vec<i64>,
    day: Vec<i64>,
    hour: Vec<i64>,
    station: Vec<&'static str>,
    numeric: [Vec<Option<f64>>; 10],
}

fn simulate(rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();

    for (y, year_factor) in YEAR_FACTORS.iter().enumerate() {
        let year = 2013 + y as i64;
        for day_of_year in 0..365 {
            // +1 in mid-winter, -1 in mid-summer
            let winter = (2.0 * PI * day_of_year as f64 / 365.0).cos();
            let month = (day_of_year / 31).min(11) + 1;
            let day = day_of_year % 31 + 1;

            for (station, level) in STATIONS {
                for hour in HOURS {
                    let temp = 13.0 - 15.0 * winter + rng.gauss(0.0, 3.0);
                    let pres = 1012.0 + 10.0 * winter + rng.gauss(0.0, 4.0);
                    let wspm = rng.gauss(1.8, 1.0).abs();
                    let rain = if winter < 0.0 && rng.next_f64() < 0.15 {
                        rng.next_f64() * 8.0
                    } else {
                        0.0
                    };

                    let dispersion = 1.0 + 0.35 * wspm + 0.2 * rain;
                    let burden = level * year_factor * (1.0 + 0.5 * winter) / dispersion;
                    let noise = |rng: &mut SimpleRng| rng.gauss(0.0, 0.3).exp();

                    let pm25 = 75.0 * burden * noise(rng);
                    let values = [
                        pm25,
                        pm25 * 1.35 * noise(rng),
                        14.0 * burden * (1.0 + 0.8 * winter.max(0.0)) * noise(rng),
                        48.0 * burden * noise(rng),
                        1150.0 * burden * noise(rng),
                        (60.0 - 35.0 * winter + 4.0 * wspm) * noise(rng),
                        temp,
                        pres,
                        rain,
                        wspm,
                    ];

                    for (slot, v) in cols.numeric.iter_mut().zip(values) {
                        let missing = rng.next_f64() < MISSING_RATE;
                        slot.push((!missing).then_some((v * 10.0).round() / 10.0));
                    }
                    cols.year.push(year);
                    cols.month.push(month);
                    cols.day.push(day);
                    cols.hour.push(hour);
                    cols.station.push(station);
                }
            }
        }
    }
    cols
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;

    let mut header = vec!["No", "year", "month", "day", "hour"];
    header.extend(NUMERIC);
    header.push("station");
    writer.write_record(&header)?;

    for i in 0..cols.year.len() {
        let mut record = vec![
            (i + 1).to_string(),
            cols.year[i].to_string(),
            cols.month[i].to_string(),
            cols.day[i].to_string(),
            cols.hour[i].to_string(),
        ];
        record.extend(
            cols.numeric
                .iter()
                .map(|c| c[i].map_or_else(|| "NA".to_string(), |v| v.to_string())),
        );
        record.push(cols.station[i].to_string());
        writer.write_record(&record)?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn record_batch(cols: &Columns) -> Result<RecordBatch> {
    let mut fields = vec![
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
        Field::new("day", DataType::Int64, false),
        Field::new("hour", DataType::Int64, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(cols.year.clone())),
        Arc::new(Int64Array::from(cols.month.clone())),
        Arc::new(Int64Array::from(cols.day.clone())),
        Arc::new(Int64Array::from(cols.hour.clone())),
    ];
    for (name, values) in NUMERIC.iter().zip(&cols.numeric) {
        fields.push(Field::new(*name, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(values.clone())));
    }
    fields.push(Field::new("station", DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(cols.station.clone())));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building record batch")
}

fn write_parquet(path: &str, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let cols = simulate(&mut rng);

    let csv_path = "all_data.csv";
    write_csv(csv_path, &cols)?;

    let batch = record_batch(&cols)?;
    let parquet_path = "all_data.parquet";
    write_parquet(parquet_path, &batch)?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} measurements ({} stations, {} years) to {csv_path} and {parquet_path}",
        batch.num_rows(),
        STATIONS.len(),
        YEAR_FACTORS.len()
    );
    Ok(())
}
