//! Reshaping flat NAV rows into the vendor's nested upload body.

use super::nav::NavRow;
use crate::error::NavError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One dated NAV entry inside an [`UploadPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetEntry {
    pub date: String,
    pub price: String,
    pub cumulative_nav_withdrawal: String,
}

/// All rows of one product within one upload chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub code: String,
    pub nets: Vec<NetEntry>,
}

/// Request body of `{type}_price/batch/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBody {
    pub price_data: Vec<UploadPayload>,
}

/// Group one chunk of rows by product code.
///
/// Groups come out in order of each code's first appearance, and rows keep
/// their order within a group. Grouping is local to the chunk: a product
/// that straddles a chunk boundary shows up in both chunks' payloads.
pub fn transcode(rows: &[NavRow]) -> Result<Vec<UploadPayload>, NavError> {
    if rows.is_empty() {
        return Err(NavError::Validation("cannot transcode an empty chunk".into()));
    }

    let mut payloads: Vec<UploadPayload> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let idx = *slot.entry(row.product_code.as_str()).or_insert_with(|| {
            payloads.push(UploadPayload {
                code: row.product_code.clone(),
                nets: Vec::new(),
            });
            payloads.len() - 1
        });
        payloads[idx].nets.push(NetEntry {
            date: row.date.clone(),
            price: row.unit_nav.clone(),
            cumulative_nav_withdrawal: row.cumulative_nav.clone(),
        });
    }

    Ok(payloads)
}
