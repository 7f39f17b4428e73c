//! Conversion of vendor JSON rows into a DataFrame.

use crate::error::NavError;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

/// Build a DataFrame from a list of JSON objects.
///
/// Columns appear in first-seen key order. A column whose non-null values
/// are all JSON numbers becomes `Float64`; anything else becomes `String`,
/// with non-string scalars rendered as JSON text. A column with no values at
/// all is `Null`-typed so the merge can adopt another chunk's dtype for it.
/// Keys missing from a row are nulls.
pub fn records_to_frame(records: &[Value]) -> Result<DataFrame, NavError> {
    if records.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (i, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or_else(|| {
            NavError::ResponseFormat(format!("row {i} is not an object: {record}"))
        })?;
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let cells: Vec<Option<&Value>> = records
                .iter()
                .map(|r| r.get(name).filter(|v| !v.is_null()))
                .collect();
            build_column(name, &cells)
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns).map_err(|e| NavError::ResponseFormat(format!("dataframe creation: {e}")))
}

fn build_column(name: &str, cells: &[Option<&Value>]) -> Column {
    if cells.iter().all(Option::is_none) {
        return Column::full_null(name.into(), cells.len(), &DataType::Null);
    }
    if cells.iter().flatten().all(|v| v.is_number()) {
        let values: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(Value::as_f64)).collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| {
                c.map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        Column::new(name.into(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_numeric_and_text_columns() {
        let rows = vec![
            json!({"reg_code": "SVZ009", "nav": 1.0234, "price_date": "2024-01-05"}),
            json!({"reg_code": "SVZ010", "nav": 0.9871, "price_date": "2024-01-05"}),
        ];
        let df = records_to_frame(&rows).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("nav").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("reg_code").unwrap().dtype(), &DataType::String);
        let nav = df.column("nav").unwrap().f64().unwrap();
        assert_eq!(nav.get(1), Some(0.9871));
    }

    #[test]
    fn missing_keys_become_nulls() {
        let rows = vec![
            json!({"reg_code": "A", "nav": 1.0}),
            json!({"reg_code": "B"}),
        ];
        let df = records_to_frame(&rows).unwrap();
        let nav = df.column("nav").unwrap().f64().unwrap();
        assert_eq!(nav.get(0), Some(1.0));
        assert_eq!(nav.get(1), None);
    }

    #[test]
    fn mixed_values_fall_back_to_text() {
        let rows = vec![json!({"v": 1}), json!({"v": "n/a"}), json!({"v": true})];
        let df = records_to_frame(&rows).unwrap();
        let v = df.column("v").unwrap().str().unwrap();
        assert_eq!(v.get(0), Some("1"));
        assert_eq!(v.get(1), Some("n/a"));
        assert_eq!(v.get(2), Some("true"));
    }

    #[test]
    fn all_null_column_is_null_typed() {
        let rows = vec![json!({"v": null, "w": 1}), json!({"w": 2})];
        let df = records_to_frame(&rows).unwrap();
        assert_eq!(df.column("v").unwrap().dtype(), &DataType::Null);
        assert_eq!(df.column("v").unwrap().null_count(), 2);
    }

    #[test]
    fn non_object_row_is_rejected() {
        let rows = vec![json!({"v": 1}), json!([1, 2])];
        assert!(matches!(
            records_to_frame(&rows),
            Err(NavError::ResponseFormat(_))
        ));
    }

    #[test]
    fn empty_input_is_empty_frame() {
        assert_eq!(records_to_frame(&[]).unwrap().width(), 0);
    }
}
