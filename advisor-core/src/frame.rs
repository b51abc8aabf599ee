//! Long-form (ticker, date, value) rows for charting and export.

use crate::returns::ReturnTable;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
    #[error("unsupported export format '{0}' (use .csv or .parquet)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    #[serde(rename = "Stock")]
    pub ticker: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongFrame {
    pub rows: Vec<LongRow>,
}

/// Unpivot a return table into one row per (ticker, date), ticker-major.
pub fn melt(table: &ReturnTable) -> LongFrame {
    let rows = table
        .tickers
        .iter()
        .zip(&table.columns)
        .flat_map(|(ticker, column)| {
            table.dates.iter().zip(column).map(move |(date, value)| LongRow {
                ticker: ticker.clone(),
                date: *date,
                value: *value,
            })
        })
        .collect();
    LongFrame { rows }
}

impl LongFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame, ExportError> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let stocks: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        let dates: Vec<i32> = self
            .rows
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect();
        let values: Vec<f64> = self.rows.iter().map(|r| r.value).collect();

        let df = DataFrame::new(vec![
            Column::new("Stock".into(), stocks),
            Column::new("Date".into(), dates).cast(&DataType::Date)?,
            Column::new("Value".into(), values),
        ])?;
        Ok(df)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        let io_err = |source| ExportError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
        wtr.write_record(["Stock", "Date", "Value"])?;
        for row in &self.rows {
            wtr.write_record([
                row.ticker.as_str(),
                &row.date.to_string(),
                &format!("{:.6}", row.value),
            ])?;
        }
        wtr.flush().map_err(io_err)
    }

    pub fn write_parquet(&self, path: &Path) -> Result<(), ExportError> {
        let mut df = self.to_dataframe()?;
        let file = File::create(path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    }

    /// Pick the writer from the file extension.
    pub fn export(&self, path: &Path) -> Result<(), ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => self.write_csv(path),
            Some("parquet") => self.write_parquet(path),
            other => Err(ExportError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}
