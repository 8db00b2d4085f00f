//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV file in the `Datetime,Open,High,Low,Close,Volume` layout
//!    (timestamps `%Y-%m-%d %H:%M:%S`, UTC), filtered to a date range
//! 2. Synthetic bars: a seeded random walk for offline demos and tests
//!
//! Synthetic data is a developer-only debug mode; the session report records
//! the dataset hash so synthetic runs are distinguishable.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trendgate_core::domain::BarSnapshot;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV record {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: csv::Error,
    },

    #[error("bad timestamp '{value}' in record {record}: {source}")]
    Timestamp {
        record: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid bar in record {record}: {reason}")]
    InvalidBar { record: usize, reason: String },

    #[error("timestamps not strictly increasing at record {record}")]
    Unordered { record: usize },

    #[error("no bars between {start} and {end}")]
    Empty { start: NaiveDate, end: NaiveDate },
}

/// Options controlling which bars are kept.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl LoadOptions {
    fn contains(&self, ts: &DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Datetime")]
    datetime: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
}

/// Load bars from a CSV file.
pub fn load_csv(path: &Path, opts: &LoadOptions) -> Result<Vec<BarSnapshot>, LoadError> {
    let reader = csv::Reader::from_path(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(reader, opts)
}

/// Parse bars from any CSV source with a header row.
pub fn read_bars<R: Read>(input: R, opts: &LoadOptions) -> Result<Vec<BarSnapshot>, LoadError> {
    read_csv(csv::Reader::from_reader(input), opts)
}

fn read_csv<R: Read>(
    mut reader: csv::Reader<R>,
    opts: &LoadOptions,
) -> Result<Vec<BarSnapshot>, LoadError> {
    let mut bars: Vec<BarSnapshot> = Vec::new();

    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        let record = i + 1;
        let row = row.map_err(|source| LoadError::Record { record, source })?;
        let timestamp = NaiveDateTime::parse_from_str(row.datetime.trim(), TIMESTAMP_FORMAT)
            .map_err(|source| LoadError::Timestamp {
                record,
                value: row.datetime.clone(),
                source,
            })?
            .and_utc();

        if !opts.contains(&timestamp) {
            continue;
        }

        let bar = BarSnapshot::new(timestamp, row.open, row.high, row.low, row.close);
        bar.validate()
            .map_err(|reason| LoadError::InvalidBar { record, reason })?;
        if bars.last().is_some_and(|prev| prev.timestamp >= bar.timestamp) {
            return Err(LoadError::Unordered { record });
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            start: opts.start,
            end: opts.end,
        });
    }
    Ok(bars)
}

/// Deterministic BLAKE3 hash over timestamps and OHLC values.
pub fn dataset_hash(bars: &[BarSnapshot]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` synthetic bars starting at `start`.
///
/// A random walk from 100.0 whose drift flips sign every few hundred bars, so
/// the trend filter sees both regimes. Same seed, same bars.
pub fn generate_synthetic_bars(
    seed: &str,
    count: usize,
    start: DateTime<Utc>,
    interval_minutes: i64,
) -> Vec<BarSnapshot> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(seed.as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut drift = 0.0004_f64;
    let mut regime_left: usize = rng.gen_range(150..400);

    for i in 0..count {
        if regime_left == 0 {
            drift = -drift;
            regime_left = rng.gen_range(150..400);
        }
        regime_left -= 1;

        let ret: f64 = drift + rng.gen_range(-0.004..0.004);
        let open = price;
        let close = (price * (1.0 + ret)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.003));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.003));

        bars.push(BarSnapshot::new(
            start + Duration::minutes(interval_minutes * i as i64),
            open,
            high,
            low,
            close,
        ));
        price = close;
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = "\
Datetime,Open,High,Low,Close,Volume
2022-01-31 23:45:00,38400.0,38500.0,38300.0,38466.9,120.5
2022-02-01 00:00:00,38466.9,38600.0,38400.0,38550.0,98.1
2022-02-01 00:15:00,38550.0,38700.0,38500.0,38650.2,101.0
2022-02-08 23:45:00,44000.0,44100.0,43900.0,44050.0,80.0
2022-02-09 00:00:00,44050.0,44200.0,44000.0,44100.0,70.0
";

    fn opts() -> LoadOptions {
        LoadOptions {
            start: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2022, 2, 8).unwrap(),
        }
    }

    #[test]
    fn reads_and_filters_by_day() {
        let bars = read_bars(SAMPLE.as_bytes(), &opts()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(bars[0].close, 38550.0);
        assert_eq!(
            bars[2].timestamp,
            Utc.with_ymd_and_hms(2022, 2, 8, 23, 45, 0).unwrap()
        );
    }

    #[test]
    fn empty_range_is_an_error() {
        let opts = LoadOptions {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        };
        assert!(matches!(
            read_bars(SAMPLE.as_bytes(), &opts),
            Err(LoadError::Empty { .. })
        ));
    }

    #[test]
    fn bad_timestamp_reports_record() {
        let text = "Datetime,Open,High,Low,Close,Volume\n2022/02/01 00:00,1,2,0.5,1.5,1\n";
        let err = read_bars(text.as_bytes(), &opts()).unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { record: 1, .. }));
    }

    #[test]
    fn inconsistent_ohlc_rejected() {
        let text = "Datetime,Open,High,Low,Close,Volume\n2022-02-01 00:00:00,10,9,8,9.5,1\n";
        let err = read_bars(text.as_bytes(), &opts()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidBar { record: 1, .. }));
    }

    #[test]
    fn out_of_order_rows_rejected() {
        let text = "\
Datetime,Open,High,Low,Close,Volume
2022-02-01 00:15:00,10,11,9,10,1
2022-02-01 00:00:00,10,11,9,10,1
";
        let err = read_bars(text.as_bytes(), &opts()).unwrap_err();
        assert!(matches!(err, LoadError::Unordered { record: 2 }));
    }

    #[test]
    fn synthetic_bars_are_deterministic_and_valid() {
        let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
        let a = generate_synthetic_bars("demo", 500, start, 15);
        let b = generate_synthetic_bars("demo", 500, start, 15);
        let c = generate_synthetic_bars("other", 500, start, 15);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 500);
        assert!(a.iter().all(|bar| bar.validate().is_ok()));
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(a[1].timestamp - a[0].timestamp, Duration::minutes(15));
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
        let bars = generate_synthetic_bars("demo", 50, start, 15);
        let h1 = dataset_hash(&bars);
        assert_eq!(h1, dataset_hash(&bars));
        assert_ne!(h1, dataset_hash(&bars[..49]));
    }
}
