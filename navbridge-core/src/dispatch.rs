//! Batch dispatch for both directions.
//!
//! Read: partition keys → one descriptor per batch → execute in order →
//! merge. The first failing batch aborts the whole query and nothing
//! partial is returned.
//!
//! Write: validate the table → partition rows → per chunk transcode, sign
//! with a fresh timestamp, POST → record the outcome. A failing chunk is
//! recorded and the remaining chunks are still sent.
//!
//! Both run strictly sequentially on the calling thread.

use crate::credential::Credential;
use crate::error::NavError;
use crate::request::RequestDescriptor;
use crate::signer::{Clock, SignedQuery};
use crate::table::{merge_frames, partition, KeyBatch};
use crate::transport::{unwrap_envelope, Transport};
use crate::upload::{
    transcode, validate_nav_table, NavRow, UploadBody, UploadOutcome, UploadSummary, UploadType,
};
use polars::prelude::DataFrame;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run one tabular request per key batch and merge the results in batch order.
pub fn dispatch_read<R, F>(
    keys: &[String],
    max_chunk: usize,
    mut factory: F,
) -> Result<DataFrame, NavError>
where
    R: RequestDescriptor,
    F: FnMut(&KeyBatch<'_, String>) -> R,
{
    let batches = partition(keys, max_chunk)?;
    let total = batches.len();
    let mut frames = Vec::with_capacity(total);

    for batch in &batches {
        debug!(batch = batch.index + 1, total, keys = batch.len(), "dispatching read batch");
        let mut request = factory(batch);
        let frame = request.do_request(true)?.into_table()?;
        frames.push(frame);
    }

    let merged = merge_frames(frames)?;
    info!(keys = keys.len(), batches = total, rows = merged.height(), "read dispatch complete");
    Ok(merged)
}

/// Sends NAV tables to `{upload_base_url}/{type}_price/batch/add`.
pub struct UploadDispatcher {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    upload_base_url: String,
    max_chunk: usize,
}

impl UploadDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        upload_base_url: impl Into<String>,
        max_chunk: usize,
    ) -> Self {
        Self {
            transport,
            clock,
            upload_base_url: upload_base_url.into(),
            max_chunk,
        }
    }

    pub fn url(&self, upload_type: UploadType) -> String {
        format!(
            "{}/{}_price/batch/add",
            self.upload_base_url.trim_end_matches('/'),
            upload_type.path_prefix()
        )
    }

    /// Upload every row of `table`.
    ///
    /// Validation failures return `Err` before any request is made. After
    /// that the call always returns `Ok` with one outcome per chunk.
    pub fn dispatch(
        &self,
        table: &DataFrame,
        upload_type: UploadType,
        credential: &Credential,
    ) -> Result<UploadSummary, NavError> {
        let rows = validate_nav_table(table)?;
        let batches = partition(&rows, self.max_chunk)?;
        let url = self.url(upload_type);
        let total = batches.len();

        let mut summary = UploadSummary::default();
        for batch in &batches {
            let outcome = self.send_chunk(&url, batch, credential)?;
            match &outcome.result {
                Ok(_) => debug!(
                    chunk = batch.index + 1,
                    total,
                    rows = outcome.rows,
                    products = outcome.products,
                    "upload chunk accepted"
                ),
                Err(e) => warn!(
                    chunk = batch.index + 1,
                    total,
                    rows = outcome.rows,
                    error = %e,
                    "upload chunk failed"
                ),
            }
            summary.outcomes.push(outcome);
        }

        info!(
            upload_type = %upload_type,
            rows = rows.len(),
            chunks = total,
            failed = summary.failed(),
            "upload dispatch complete"
        );
        Ok(summary)
    }

    fn send_chunk(
        &self,
        url: &str,
        batch: &KeyBatch<'_, NavRow>,
        credential: &Credential,
    ) -> Result<UploadOutcome, NavError> {
        let payloads = transcode(batch.items)?;
        let products = payloads.len();
        let body = serde_json::to_value(UploadBody {
            price_data: payloads,
        })
        .map_err(|e| NavError::Validation(format!("serialize upload body: {e}")))?;

        let signed = SignedQuery::fresh(credential, self.clock.as_ref());
        let result = self
            .transport
            .post_json(url, &signed.to_pairs(), &body)
            .and_then(|resp| match resp.json() {
                Ok(value) => unwrap_envelope(value.clone()).map(|_| value),
                Err(_) => Ok(Value::String(resp.body)),
            });

        Ok(UploadOutcome {
            chunk_index: batch.index,
            rows: batch.len(),
            products,
            result,
        })
    }
}
