//! Bar ingestion for the runner.
//!
//! The engine assumes ordered, unique-dated, finite bars. Everything that can
//! go wrong before that point is reported here as a named `LoadError`:
//! 1. File missing → `FileNotFound`
//! 2. Required header absent → `MissingColumn` (lists every missing column)
//! 3. Date cell in no accepted format → `UnparseableDate`
//! 4. Price cell not a finite number → `InvalidNumber` / `NonFinitePrice`
//! 5. Two rows on the same date → `DuplicateDate`
//!
//! Synthetic bars are a developer-only debug source, seeded for reproducibility.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use regimelab_core::domain::Bar;

/// Columns every bar file must carry (after trimming and lower-casing).
pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("missing required columns in {path}: {}", columns.join(", "))]
    MissingColumn { path: PathBuf, columns: Vec<String> },

    #[error("line {line}: unparseable date '{value}'")]
    UnparseableDate { line: usize, value: String },

    #[error("line {line}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: column '{column}' is not finite")]
    NonFinitePrice { line: usize, column: &'static str },

    #[error("duplicate bar for date {0}")]
    DuplicateDate(NaiveDate),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse a date cell in any accepted format. RFC 3339 timestamps keep only
/// their date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Load OHLCV bars from a CSV file, sorted ascending by date.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(i) => *slot = i,
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            columns: missing,
        });
    }
    let [date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] = index;

    let mut bars = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = row + 2;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let raw_date = cell(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| LoadError::UnparseableDate {
            line,
            value: raw_date.to_string(),
        })?;

        let number = |i: usize, column: &'static str| -> Result<f64, LoadError> {
            let raw = cell(i);
            let value: f64 = raw.parse().map_err(|_| LoadError::InvalidNumber {
                line,
                column,
                value: raw.to_string(),
            })?;
            if !value.is_finite() {
                return Err(LoadError::NonFinitePrice { line, column });
            }
            Ok(value)
        };

        let bar = Bar::new(
            date,
            number(open_idx, "open")?,
            number(high_idx, "high")?,
            number(low_idx, "low")?,
            number(close_idx, "close")?,
            number(volume_idx, "volume")?,
        );
        if !bar.is_sane() {
            warn!(line, date = %bar.date, "bar fails OHLC sanity check");
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate(pair[0].date));
    }

    debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Write bars in the layout `load_csv` reads.
pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(REQUIRED_COLUMNS)?;
    for b in bars {
        wtr.write_record([
            b.date.to_string(),
            format!("{:.4}", b.open),
            format!("{:.4}", b.high),
            format!("{:.4}", b.low),
            format!("{:.4}", b.close),
            format!("{:.0}", b.volume),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Deterministic BLAKE3 hash over every bar's date and OHLCV values.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `n` synthetic weekday bars starting on or after `start`.
///
/// A seeded random walk from 100.0 with a slight upward drift. The same
/// `(start, n, seed)` always yields the same bars.
pub fn generate_synthetic_bars(start: NaiveDate, n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    let mut current = start;

    while bars.len() < n {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let gap: f64 = rng.gen_range(-0.005..0.005);
        let daily_return: f64 = rng.gen_range(-0.02..0.02) + 0.0003;
        let open = price * (1.0 + gap);
        let close = open * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar::new(current, open, high, low, close, volume));
        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
