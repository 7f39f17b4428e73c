//! Per-endpoint request descriptors.
//!
//! A descriptor is configured with `set_params` and executed with
//! `do_request`, which returns either a DataFrame or the raw JSON records.
//! Every call signs itself with a fresh timestamp.

use crate::credential::Credential;
use crate::error::NavError;
use crate::signer::{Clock, SignedQuery};
use crate::table::records_to_frame;
use crate::transport::{data_rows, unwrap_envelope, Transport};
use polars::prelude::DataFrame;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Query parameters of one request, in stable key order.
pub type Params = BTreeMap<String, String>;

/// Build [`Params`] from literal pairs, dropping `None` values.
pub fn params<const N: usize>(pairs: [(&str, Option<String>); N]) -> Params {
    pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect()
}

/// Vendor read endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FundInfo,
    FundPrice,
    PersonalFundPrice,
    FundCompanyPrice,
    PublicFundPrice,
    FundMultiPrice,
    FundMultiCompanyPrice,
    IndexPrice,
    FactorStyleCne5,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::FundInfo => "/fund/info",
            Endpoint::FundPrice => "/fund/price",
            Endpoint::PersonalFundPrice => "/fund/personal_price",
            Endpoint::FundCompanyPrice => "/fund/company_price",
            Endpoint::PublicFundPrice => "/gmfund/price",
            Endpoint::FundMultiPrice => "/fund/multi_price",
            Endpoint::FundMultiCompanyPrice => "/fund/multi_company_price",
            Endpoint::IndexPrice => "/index/price",
            Endpoint::FactorStyleCne5 => "/factor/style_cne5",
        }
    }
}

/// What `do_request` produced.
#[derive(Debug)]
pub enum RequestOutput {
    Table(DataFrame),
    Records(Vec<Value>),
}

impl RequestOutput {
    pub fn into_table(self) -> Result<DataFrame, NavError> {
        match self {
            RequestOutput::Table(df) => Ok(df),
            RequestOutput::Records(rows) => records_to_frame(&rows),
        }
    }

    pub fn into_records(self) -> Result<Vec<Value>, NavError> {
        match self {
            RequestOutput::Records(rows) => Ok(rows),
            RequestOutput::Table(_) => Err(NavError::ResponseFormat(
                "request produced a table where records were expected".into(),
            )),
        }
    }
}

/// Diagnostics of the last completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo {
    pub endpoint: String,
    pub status: u16,
    pub elapsed: Duration,
    pub rows: usize,
}

pub trait RequestDescriptor {
    fn set_params(&mut self, params: Params);

    fn do_request(&mut self, tabular: bool) -> Result<RequestOutput, NavError>;

    fn debug_info(&self) -> Option<&DebugInfo>;
}

/// Signed GET against one mall endpoint.
pub struct VendorRequest {
    endpoint: Endpoint,
    base_url: String,
    credential: Arc<Credential>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    params: Params,
    last: Option<DebugInfo>,
}

impl VendorRequest {
    pub fn new(
        endpoint: Endpoint,
        base_url: impl Into<String>,
        credential: Arc<Credential>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            endpoint,
            base_url: base_url.into(),
            credential,
            transport,
            clock,
            params: Params::new(),
            last: None,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    fn url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.path()
        )
    }
}

impl RequestDescriptor for VendorRequest {
    fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    fn do_request(&mut self, tabular: bool) -> Result<RequestOutput, NavError> {
        let url = self.url();
        let mut query: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        query.extend(SignedQuery::fresh(&self.credential, self.clock.as_ref()).to_pairs());

        debug!(endpoint = self.endpoint.path(), params = self.params.len(), "vendor GET");
        let resp = self.transport.get(&url, &query, &[])?;
        let rows = data_rows(unwrap_envelope(resp.json()?)?)?;

        self.last = Some(DebugInfo {
            endpoint: self.endpoint.path().to_string(),
            status: resp.status,
            elapsed: resp.elapsed,
            rows: rows.len(),
        });

        if tabular {
            Ok(RequestOutput::Table(records_to_frame(&rows)?))
        } else {
            Ok(RequestOutput::Records(rows))
        }
    }

    fn debug_info(&self) -> Option<&DebugInfo> {
        self.last.as_ref()
    }
}
