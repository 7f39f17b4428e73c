//! Write-path behaviour: chunking, body shape, per-chunk signing and
//! failure isolation.

mod common;

use chrono::{Duration, NaiveDate};
use common::{response, transport_failure, ScriptedTransport, StepClock};
use navbridge_core::upload::nav::{CUMULATIVE_NAV, DATE, PRODUCT_CODE, UNIT_NAV};
use navbridge_core::{
    nav_frame, ClientConfig, Credential, NavClient, NavError, NavRecord, UploadType,
};
use polars::prelude::{Column, DataFrame};
use serde_json::{json, Value};
use std::sync::Arc;

fn client(transport: Arc<ScriptedTransport>) -> NavClient {
    let config = ClientConfig {
        upload_base_url: "https://upload.test/".into(),
        ..ClientConfig::default()
    };
    NavClient::with_transport(
        config,
        Credential::new("demo_app", "secret", "tok-123"),
        transport,
        Arc::new(StepClock::starting_at(1_700_000_000)),
    )
}

fn accepted() -> Result<navbridge_core::HttpResponse, NavError> {
    response(json!({"error_code": 0, "msg": "success"}))
}

/// `days` consecutive dates for each code, product-major.
fn records(codes: &[&str], days: usize) -> Vec<NavRecord> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    codes
        .iter()
        .flat_map(|code| {
            (0..days).map(move |d| NavRecord {
                product_code: code.to_string(),
                date: start + Duration::days(d as i64),
                unit_nav: 1.0 + d as f64 / 1000.0,
                cumulative_nav: 1.5 + d as f64 / 1000.0,
            })
        })
        .collect()
}

fn payload_rows(body: &Value) -> usize {
    body["price_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nets"].as_array().unwrap().len())
        .sum()
}

#[test]
fn fifteen_hundred_rows_make_two_chunks() {
    let table = nav_frame(&records(&["P1", "P2"], 750)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![accepted(), accepted()]));

    let summary = client(Arc::clone(&transport))
        .upload_nav(&table, UploadType::Inner)
        .unwrap();

    assert_eq!(summary.total(), 2);
    assert!(summary.all_succeeded());
    assert_eq!(summary.outcomes[0].rows, 1000);
    assert_eq!(summary.outcomes[1].rows, 500);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].url, "https://upload.test/inner_price/batch/add");

    let first = calls[0].body.as_ref().unwrap();
    assert_eq!(payload_rows(first), 1000);
    // P2 straddles the boundary: 250 rows here, 500 in the next chunk
    let codes: Vec<&str> = first["price_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["P1", "P2"]);
    assert_eq!(first["price_data"][1]["nets"].as_array().unwrap().len(), 250);

    let second = calls[1].body.as_ref().unwrap();
    assert_eq!(payload_rows(second), 500);
    assert_eq!(second["price_data"][0]["code"], "P2");
}

#[test]
fn body_uses_vendor_field_names_and_decimal_strings() {
    let table = nav_frame(&records(&["SVZ009"], 1)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![accepted()]));

    client(Arc::clone(&transport))
        .upload_nav(&table, UploadType::Company)
        .unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.url, "https://upload.test/company_price/batch/add");
    assert_eq!(
        call.body.as_ref().unwrap(),
        &json!({
            "price_data": [{
                "code": "SVZ009",
                "nets": [{
                    "date": "2020-01-01",
                    "price": "1",
                    "cumulative_nav_withdrawal": "1.5"
                }]
            }]
        })
    );
    assert_eq!(call.param("app_id"), Some("demo_app"));
    assert_eq!(call.param("tm"), Some("1700000000"));
    assert_eq!(call.param("sign"), Some("9b5e882f4303c54b4d7fc47917cf75fb"));
}

#[test]
fn each_chunk_gets_a_fresh_signature() {
    let table = nav_frame(&records(&["P1"], 2500)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![accepted(), accepted(), accepted()]));

    client(Arc::clone(&transport))
        .upload_nav(&table, UploadType::Inner)
        .unwrap();

    let calls = transport.calls();
    let tms: Vec<&str> = calls.iter().map(|c| c.param("tm").unwrap()).collect();
    assert_eq!(tms, vec!["1700000000", "1700000001", "1700000002"]);
    let signs: std::collections::HashSet<&str> =
        calls.iter().map(|c| c.param("sign").unwrap()).collect();
    assert_eq!(signs.len(), 3);
}

#[test]
fn failed_middle_chunk_does_not_stop_later_chunks() {
    let table = nav_frame(&records(&["P1", "P2", "P3"], 1000)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![
        accepted(),
        transport_failure(),
        accepted(),
    ]));

    let summary = client(Arc::clone(&transport))
        .upload_nav(&table, UploadType::Inner)
        .unwrap();

    assert_eq!(transport.calls().len(), 3);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.failed(), 1);
    assert!(summary.outcomes[0].is_success());
    assert!(!summary.outcomes[1].is_success());
    assert!(summary.outcomes[2].is_success());
    let failure = summary.failures().next().unwrap();
    assert_eq!(failure.chunk_index, 1);
    assert!(matches!(failure.result, Err(NavError::Transport(_))));
}

#[test]
fn vendor_rejection_is_recorded_as_failed_chunk() {
    let table = nav_frame(&records(&["P1"], 3)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![response(
        json!({"error_code": 2001, "msg": "product not found"}),
    )]));

    let summary = client(transport)
        .upload_nav(&table, UploadType::Inner)
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        summary.outcomes[0].result,
        Err(NavError::Vendor { code: 2001, .. })
    ));
}

#[test]
fn successful_outcome_keeps_raw_response() {
    let table = nav_frame(&records(&["P1"], 3)).unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![response(
        json!({"error_code": 0, "msg": "success", "data": {"inserted": 3}}),
    )]));

    let summary = client(transport)
        .upload_nav(&table, UploadType::Inner)
        .unwrap();

    let body = summary.outcomes[0].result.as_ref().unwrap();
    assert_eq!(body["data"]["inserted"], 3);
    assert_eq!(summary.outcomes[0].products, 1);
}

#[test]
fn invalid_tables_fail_before_any_request() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(Arc::clone(&transport));

    let empty = nav_frame(&[]).unwrap();
    assert!(matches!(
        client.upload_nav(&empty, UploadType::Inner),
        Err(NavError::Validation(_))
    ));

    let missing = nav_frame(&records(&["P1"], 2))
        .unwrap()
        .drop(PRODUCT_CODE)
        .unwrap();
    assert!(matches!(
        client.upload_nav(&missing, UploadType::Inner),
        Err(NavError::Validation(_))
    ));

    let text_dates = DataFrame::new(vec![
        Column::new(PRODUCT_CODE.into(), &["P1", "P1"]),
        Column::new(DATE.into(), &["2020-01-01", "2020-01-02"]),
        Column::new(UNIT_NAV.into(), &[1.0, 1.01]),
        Column::new(CUMULATIVE_NAV.into(), &[1.0, 1.01]),
    ])
    .unwrap();
    assert!(matches!(
        client.upload_nav(&text_dates, UploadType::Inner),
        Err(NavError::Validation(_))
    ));

    assert!(transport.calls().is_empty());
}
