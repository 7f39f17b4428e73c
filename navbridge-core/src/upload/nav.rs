//! NAV tables: the required input shape for uploads and its validation.
//!
//! A NAV table has one row per product per date with at least the columns
//! `productCode`, `date`, `unitNav` and `cumulativeNav`. The date column
//! must be date-typed (`Date` or `Datetime`); text dates are rejected rather
//! than parsed. Validation runs over the whole table before anything is sent.

use crate::error::NavError;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const PRODUCT_CODE: &str = "productCode";
pub const DATE: &str = "date";
pub const UNIT_NAV: &str = "unitNav";
pub const CUMULATIVE_NAV: &str = "cumulativeNav";

pub const REQUIRED_COLUMNS: [&str; 4] = [PRODUCT_CODE, DATE, UNIT_NAV, CUMULATIVE_NAV];

/// One typed NAV observation, used to build tables in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavRecord {
    pub product_code: String,
    pub date: NaiveDate,
    pub unit_nav: f64,
    pub cumulative_nav: f64,
}

/// A validated row ready for transcoding: dates as `YYYY-MM-DD`, NAVs as
/// decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavRow {
    pub product_code: String,
    pub date: String,
    pub unit_nav: String,
    pub cumulative_nav: String,
}

/// Build a NAV table with the four required columns.
pub fn nav_frame(records: &[NavRecord]) -> Result<DataFrame, NavError> {
    let epoch = epoch();
    let codes: Vec<&str> = records.iter().map(|r| r.product_code.as_str()).collect();
    let days: Vec<i32> = records
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let units: Vec<f64> = records.iter().map(|r| r.unit_nav).collect();
    let cumulative: Vec<f64> = records.iter().map(|r| r.cumulative_nav).collect();

    DataFrame::new(vec![
        Column::new(PRODUCT_CODE.into(), codes),
        Column::new(DATE.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| NavError::Validation(format!("date cast: {e}")))?,
        Column::new(UNIT_NAV.into(), units),
        Column::new(CUMULATIVE_NAV.into(), cumulative),
    ])
    .map_err(|e| NavError::Validation(format!("dataframe creation: {e}")))
}

/// Check the table's shape and convert every row.
///
/// Fails on an empty table, a missing required column, a non-date date
/// column, or a null/non-finite value in any required column.
pub fn validate_nav_table(df: &DataFrame) -> Result<Vec<NavRow>, NavError> {
    if df.height() == 0 {
        return Err(NavError::Validation("NAV table has no rows".into()));
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(NavError::Validation(format!(
            "NAV table is missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let codes = text_column(df, PRODUCT_CODE)?;
    let dates = date_column(df)?;
    let units = nav_column(df, UNIT_NAV)?;
    let cumulative = nav_column(df, CUMULATIVE_NAV)?;

    Ok(codes
        .into_iter()
        .zip(dates)
        .zip(units.into_iter().zip(cumulative))
        .map(|((product_code, date), (unit_nav, cumulative_nav))| NavRow {
            product_code,
            date,
            unit_nav,
            cumulative_nav,
        })
        .collect())
}

/// 1970-01-01; polars `Date` values are day offsets from it.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, NavError> {
    df.column(name)
        .map_err(|e| NavError::Validation(format!("column '{name}': {e}")))
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>, NavError> {
    let cast = column(df, name)?
        .cast(&DataType::String)
        .map_err(|e| NavError::Validation(format!("column '{name}' as text: {e}")))?;
    let ca = cast
        .str()
        .map_err(|e| NavError::Validation(format!("column '{name}' as text: {e}")))?;

    ca.into_iter()
        .enumerate()
        .map(|(i, v)| match v.map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(NavError::Validation(format!("empty {name} at row {i}"))),
        })
        .collect()
}

fn date_column(df: &DataFrame) -> Result<Vec<String>, NavError> {
    let col = column(df, DATE)?;
    let as_date = match col.dtype() {
        DataType::Date => col.clone(),
        DataType::Datetime(_, _) => col
            .cast(&DataType::Date)
            .map_err(|e| NavError::Validation(format!("date column: {e}")))?,
        other => {
            return Err(NavError::Validation(format!(
                "column '{DATE}' must be date-typed, got {other}"
            )))
        }
    };
    let ca = as_date
        .date()
        .map_err(|e| NavError::Validation(format!("date column: {e}")))?;

    let epoch = epoch();
    (0..ca.len())
        .map(|i| {
            let days = ca
                .get(i)
                .ok_or_else(|| NavError::Validation(format!("null {DATE} at row {i}")))?;
            let date = epoch + chrono::Duration::days(days as i64);
            Ok(date.format("%Y-%m-%d").to_string())
        })
        .collect()
}

fn nav_column(df: &DataFrame, name: &str) -> Result<Vec<String>, NavError> {
    let col = column(df, name)?;
    match col.dtype() {
        DataType::String => text_column(df, name)?
            .into_iter()
            .enumerate()
            .map(|(i, s)| match s.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(s),
                _ => Err(NavError::Validation(format!(
                    "{name} at row {i} is not a decimal: '{s}'"
                ))),
            })
            .collect(),
        // floats are formatted at their own width so f32 input keeps its digits
        DataType::Float64 => {
            let ca = col
                .f64()
                .map_err(|e| NavError::Validation(format!("column '{name}': {e}")))?;
            finite_decimals(name, ca.into_iter(), f64::is_finite)
        }
        DataType::Float32 => {
            let ca = col
                .f32()
                .map_err(|e| NavError::Validation(format!("column '{name}': {e}")))?;
            finite_decimals(name, ca.into_iter(), f32::is_finite)
        }
        DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32 => {
            text_column(df, name)
        }
        other => Err(NavError::Validation(format!(
            "column '{name}' must be numeric or decimal text, got {other}"
        ))),
    }
}

/// Shortest decimal text that round-trips to the same value at `T`'s width.
fn finite_decimals<T: std::fmt::Display + Copy>(
    name: &str,
    values: impl Iterator<Item = Option<T>>,
    is_finite: fn(T) -> bool,
) -> Result<Vec<String>, NavError> {
    values
        .enumerate()
        .map(|(i, v)| match v {
            Some(v) if is_finite(v) => Ok(format!("{v}")),
            _ => Err(NavError::Validation(format!(
                "{name} at row {i} is null or not finite"
            ))),
        })
        .collect()
}
