//! Concatenation of per-chunk query results.

use crate::error::NavError;
use polars::prelude::*;

/// Ordered `(name, dtype)` pairs of a frame.
pub fn column_schema(df: &DataFrame) -> Vec<(String, DataType)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.dtype().clone()))
        .collect()
}

fn describe(schema: &[(String, DataType)]) -> String {
    schema
        .iter()
        .map(|(name, dtype)| format!("{name}: {dtype}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stack chunk results in order.
///
/// Rows of chunk `i` precede rows of chunk `i + 1`; nothing is sorted or
/// deduplicated. Every chunk must carry exactly the first chunk's columns,
/// in the same order and with the same dtypes, otherwise the whole merge
/// fails with `SchemaMismatch`. A `Null`-typed column (no values in that
/// chunk) matches any dtype and is cast to the other side's. A chunk without
/// columns (the vendor had no rows for it) contributes nothing and is not
/// compared.
pub fn merge_frames(frames: Vec<DataFrame>) -> Result<DataFrame, NavError> {
    let mut merged: Option<DataFrame> = None;

    for (chunk, mut frame) in frames.into_iter().enumerate() {
        if frame.width() == 0 {
            continue;
        }
        match merged.as_mut() {
            None => merged = Some(frame),
            Some(acc) => {
                align_schemas(acc, &mut frame, chunk)?;
                acc.vstack_mut(&frame)
                    .map_err(|e| NavError::ResponseFormat(format!("stack chunk {chunk}: {e}")))?;
            }
        }
    }

    Ok(merged.unwrap_or_else(DataFrame::empty))
}

/// Make `frame` stackable onto `acc`, resolving `Null` columns on either side.
fn align_schemas(acc: &mut DataFrame, frame: &mut DataFrame, chunk: usize) -> Result<(), NavError> {
    let expected = column_schema(acc);
    let actual = column_schema(frame);
    let mismatch = || NavError::SchemaMismatch {
        chunk,
        expected: describe(&expected),
        actual: describe(&actual),
    };

    let same_names = expected.len() == actual.len()
        && expected.iter().zip(&actual).all(|((a, _), (b, _))| a == b);
    if !same_names {
        return Err(mismatch());
    }

    for ((name, want), (_, got)) in expected.iter().zip(&actual) {
        if want == got {
            continue;
        }
        match (want, got) {
            (_, DataType::Null) => cast_column(frame, name, want, chunk)?,
            (DataType::Null, _) => cast_column(acc, name, got, chunk)?,
            _ => return Err(mismatch()),
        }
    }
    Ok(())
}

fn cast_column(df: &mut DataFrame, name: &str, dtype: &DataType, chunk: usize) -> Result<(), NavError> {
    let cast = df
        .column(name)
        .and_then(|c| c.cast(dtype))
        .map_err(|e| NavError::ResponseFormat(format!("chunk {chunk} column '{name}': {e}")))?;
    df.with_column(cast)
        .map_err(|e| NavError::ResponseFormat(format!("chunk {chunk} column '{name}': {e}")))?;
    Ok(())
}
