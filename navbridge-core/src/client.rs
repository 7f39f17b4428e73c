//! Public entry point: one method per logical vendor operation.

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::dispatch::{dispatch_read, UploadDispatcher};
use crate::error::NavError;
use crate::request::{params, Endpoint, RequestDescriptor, VendorRequest};
use crate::signer::{Clock, SystemClock};
use crate::transport::{HttpTransport, Transport};
use crate::upload::{UploadSummary, UploadType};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Start date used when callers ask for a full price history.
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Fixed filters of the company search behind `company_info_from_code`.
const COMPANY_SEARCH_DEFAULTS: [(&str, &str); 12] = [
    ("member_type", "不限"),
    ("fund_num", "-1"),
    ("scale", "0"),
    ("found_date", "0"),
    ("active", "1"),
    ("company_manager_active", "-1"),
    ("page", "1"),
    ("pagesize", "20"),
    ("advise_type", "0"),
    ("order_by", "fund_num"),
    ("order", "1"),
    ("isReport", "0"),
];

/// Vendor client. Holds an immutable credential and is safe to reuse across
/// sequential calls; every call is a fresh round trip.
pub struct NavClient {
    config: ClientConfig,
    credential: Arc<Credential>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl NavClient {
    /// Client over HTTP with the wall clock.
    pub fn new(config: ClientConfig, credential: Credential) -> Result<Self, NavError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(
            config,
            credential,
            Arc::new(transport),
            Arc::new(SystemClock),
        ))
    }

    /// Client over an injected transport and clock.
    pub fn with_transport(
        config: ClientConfig,
        credential: Credential,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            credential: Arc::new(credential),
            transport,
            clock,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A configured but unexecuted descriptor for `endpoint`.
    pub fn request(&self, endpoint: Endpoint) -> VendorRequest {
        VendorRequest::new(
            endpoint,
            self.config.base_url.clone(),
            Arc::clone(&self.credential),
            Arc::clone(&self.transport),
            Arc::clone(&self.clock),
        )
    }

    /// Fund profile records for one registration code.
    pub fn fund_info(&self, reg_code: &str) -> Result<Vec<Value>, NavError> {
        let mut req = self.request(Endpoint::FundInfo);
        req.set_params(params([("reg_code", Some(reg_code.to_string()))]));
        req.do_request(false)?.into_records()
    }

    pub fn fund_price(&self, reg_code: &str, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        self.single_key_price(Endpoint::FundPrice, "reg_code", reg_code, start_date)
    }

    /// Price series of a personal account, keyed by the vendor's fund id.
    pub fn personal_fund_price(&self, fid: &str, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        self.single_key_price(Endpoint::PersonalFundPrice, "fid", fid, start_date)
    }

    pub fn company_price(&self, reg_code: &str, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        self.single_key_price(Endpoint::FundCompanyPrice, "reg_code", reg_code, start_date)
    }

    /// Public (mutual) fund prices. Codes are six digits; shorter codes are
    /// left-padded with zeros.
    pub fn public_fund_price(&self, reg_code: &str, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        let code = format!("{:0>6}", reg_code.trim());
        self.single_key_price(Endpoint::PublicFundPrice, "reg_code", &code, start_date)
    }

    pub fn index_price(&self, index_code: &str, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        self.single_key_price(Endpoint::IndexPrice, "index_code", index_code, start_date)
    }

    /// CNE5 style-factor returns since `start_date`.
    pub fn factor_style_cne5(&self, start_date: NaiveDate) -> Result<DataFrame, NavError> {
        let mut req = self.request(Endpoint::FactorStyleCne5);
        req.set_params(params([("start_date", Some(ymd(start_date)))]));
        req.do_request(true)?.into_table()
    }

    /// Latest NAVs for many funds, queried in batches of `read_chunk_size`.
    pub fn multi_price(&self, reg_codes: &[String], date: Option<NaiveDate>) -> Result<DataFrame, NavError> {
        self.multi_key_price(Endpoint::FundMultiPrice, reg_codes, date)
    }

    pub fn multi_company_price(
        &self,
        reg_codes: &[String],
        date: Option<NaiveDate>,
    ) -> Result<DataFrame, NavError> {
        self.multi_key_price(Endpoint::FundMultiCompanyPrice, reg_codes, date)
    }

    /// First match of the company search for `comp_code`.
    ///
    /// Authenticated with the web token rather than a signature. A response
    /// without `data.list[0]` is reported as `NavError::Credential`, since
    /// the vendor answers an expired token with an empty or error body.
    pub fn company_info_from_code(&self, comp_code: &str) -> Result<Value, NavError> {
        let url = format!(
            "{}/newgoapi/company/advancedlist",
            self.config.company_base_url.trim_end_matches('/')
        );
        let mut query = vec![
            ("token".to_string(), self.credential.token().to_string()),
            ("keyValue".to_string(), comp_code.to_string()),
        ];
        query.extend(
            COMPANY_SEARCH_DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        debug!(comp_code, "company lookup");
        let resp = self
            .transport
            .get(&url, &query, &[("access-token", self.credential.token())])?;

        let body: Value = serde_json::from_str(&resp.body)
            .map_err(|e| NavError::credential_expired(format!("response is not JSON: {e}")))?;
        first_company(body)
    }

    /// Upload a NAV table in chunks of `write_chunk_size` rows.
    ///
    /// Returns `Err` only for validation failures, which happen before any
    /// request. Per-chunk transport failures are in the summary.
    pub fn upload_nav(&self, table: &DataFrame, upload_type: UploadType) -> Result<UploadSummary, NavError> {
        UploadDispatcher::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.clock),
            self.config.upload_base_url.clone(),
            self.config.write_chunk_size,
        )
        .dispatch(table, upload_type, &self.credential)
    }

    fn single_key_price(
        &self,
        endpoint: Endpoint,
        key_param: &'static str,
        key: &str,
        start_date: NaiveDate,
    ) -> Result<DataFrame, NavError> {
        let start = ymd(start_date);
        dispatch_read(&[key.to_string()], 1, |batch| {
            let mut req = self.request(endpoint);
            req.set_params(params([
                (key_param, Some(batch.items.join(","))),
                ("start_date", Some(start.clone())),
            ]));
            req
        })
    }

    fn multi_key_price(
        &self,
        endpoint: Endpoint,
        reg_codes: &[String],
        date: Option<NaiveDate>,
    ) -> Result<DataFrame, NavError> {
        let date = date.map(ymd);
        dispatch_read(reg_codes, self.config.read_chunk_size, |batch| {
            let mut req = self.request(endpoint);
            req.set_params(params([
                ("order", Some("0".to_string())),
                ("order_by", Some("nav".to_string())),
                ("reg_code", Some(batch.items.join(","))),
                ("date", date.clone()),
            ]));
            req
        })
    }
}

fn first_company(body: Value) -> Result<Value, NavError> {
    let data = body
        .get("data")
        .ok_or_else(|| NavError::credential_expired("missing key `data`"))?;
    let list = data
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| NavError::credential_expired("missing array `data.list`"))?;
    list.first()
        .cloned()
        .ok_or_else(|| NavError::credential_expired("`data.list` is empty"))
}
