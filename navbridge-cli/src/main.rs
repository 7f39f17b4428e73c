//! navbridge CLI: price queries, company lookup and NAV uploads.
//!
//! Commands:
//! - `price`: single-key price history (fund, personal, company, public, index)
//! - `multi-price`: latest NAVs for many registration codes
//! - `factor`: CNE5 style-factor series
//! - `fund-info`: raw fund profile records
//! - `company-info`: company lookup by code (token-authenticated)
//! - `upload`: push a NAV CSV to the vendor
//!
//! Credentials come from `FOF99_APP_ID`, `FOF99_APP_KEY` and `FOF99_TOKEN`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use navbridge_core::{
    default_start_date, nav_frame, ClientConfig, Credential, NavClient, NavRecord, UploadType,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "navbridge", about = "navbridge CLI: vendor NAV queries and uploads")]
struct Cli {
    /// Path to a TOML client config. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PriceKind {
    Fund,
    Personal,
    Company,
    Public,
    Index,
}

#[derive(Subcommand)]
enum Commands {
    /// Price history for one code.
    Price {
        /// Registration code, personal fund id or index code.
        code: String,

        #[arg(long, value_enum, default_value = "fund")]
        kind: PriceKind,

        /// Start date (YYYY-MM-DD). Defaults to 2010-01-01.
        #[arg(long)]
        start: Option<String>,
    },
    /// Latest NAVs for many registration codes.
    MultiPrice {
        #[arg(required = true)]
        codes: Vec<String>,

        /// Query company-level prices instead of fund prices.
        #[arg(long, default_value_t = false)]
        company: bool,

        /// As-of date (YYYY-MM-DD). Defaults to the vendor's latest.
        #[arg(long)]
        date: Option<String>,
    },
    /// CNE5 style-factor returns.
    Factor {
        #[arg(long)]
        start: Option<String>,
    },
    /// Fund profile records as JSON.
    FundInfo { code: String },
    /// Company record as JSON.
    CompanyInfo { code: String },
    /// Upload a NAV CSV with columns productCode,date,unitNav,cumulativeNav.
    Upload {
        csv: PathBuf,

        /// Target price book: inner or company.
        #[arg(long = "type", default_value = "inner")]
        upload_type: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let client = NavClient::new(config, credential_from_env()?)?;

    match cli.command {
        Commands::Price { code, kind, start } => run_price(&client, &code, kind, start),
        Commands::MultiPrice {
            codes,
            company,
            date,
        } => run_multi_price(&client, codes, company, date),
        Commands::Factor { start } => {
            let df = client.factor_style_cne5(parse_start(start.as_deref())?)?;
            println!("{df}");
            Ok(())
        }
        Commands::FundInfo { code } => {
            let records = client.fund_info(&code)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Commands::CompanyInfo { code } => {
            let record = client.company_info_from_code(&code)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Upload { csv, upload_type } => run_upload(&client, &csv, &upload_type),
    }
}

fn credential_from_env() -> Result<Credential> {
    let var = |name: &str| std::env::var(name).with_context(|| format!("{name} is not set"));
    Ok(Credential::new(
        var("FOF99_APP_ID")?,
        var("FOF99_APP_KEY")?,
        // only the company lookup needs the web token
        std::env::var("FOF99_TOKEN").unwrap_or_default(),
    ))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn parse_start(start: Option<&str>) -> Result<NaiveDate> {
    Ok(start.map(parse_date).transpose()?.unwrap_or_else(default_start_date))
}

fn run_price(client: &NavClient, code: &str, kind: PriceKind, start: Option<String>) -> Result<()> {
    let start = parse_start(start.as_deref())?;
    let df = match kind {
        PriceKind::Fund => client.fund_price(code, start)?,
        PriceKind::Personal => client.personal_fund_price(code, start)?,
        PriceKind::Company => client.company_price(code, start)?,
        PriceKind::Public => client.public_fund_price(code, start)?,
        PriceKind::Index => client.index_price(code, start)?,
    };
    println!("{df}");
    Ok(())
}

fn run_multi_price(
    client: &NavClient,
    codes: Vec<String>,
    company: bool,
    date: Option<String>,
) -> Result<()> {
    // accept both `A B C` and `A,B,C`
    let codes: Vec<String> = codes
        .iter()
        .flat_map(|c| c.split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    let date = date.as_deref().map(parse_date).transpose()?;

    let df = if company {
        client.multi_company_price(&codes, date)?
    } else {
        client.multi_price(&codes, date)?
    };
    println!("{df}");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CsvNavRow {
    #[serde(rename = "productCode")]
    product_code: String,
    date: String,
    #[serde(rename = "unitNav")]
    unit_nav: f64,
    #[serde(rename = "cumulativeNav")]
    cumulative_nav: f64,
}

fn read_nav_csv(path: &Path) -> Result<Vec<NavRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<CsvNavRow>().enumerate() {
        let row = row.with_context(|| format!("{}: row {}", path.display(), i + 1))?;
        records.push(NavRecord {
            product_code: row.product_code,
            date: parse_date(&row.date)?,
            unit_nav: row.unit_nav,
            cumulative_nav: row.cumulative_nav,
        });
    }
    Ok(records)
}

fn run_upload(client: &NavClient, csv: &Path, upload_type: &str) -> Result<()> {
    let upload_type: UploadType = upload_type.parse()?;
    let records = read_nav_csv(csv)?;
    let table = nav_frame(&records)?;

    let summary = client.upload_nav(&table, upload_type)?;
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(body) => println!(
                "  OK: chunk {} ({} rows, {} products): {body}",
                outcome.chunk_index + 1,
                outcome.rows,
                outcome.products
            ),
            Err(e) => println!(
                "  FAIL: chunk {} ({} rows): {e}",
                outcome.chunk_index + 1,
                outcome.rows
            ),
        }
    }
    println!(
        "\nUpload complete: {}/{} chunks succeeded, {} failed",
        summary.succeeded(),
        summary.total(),
        summary.failed()
    );

    if !summary.all_succeeded() {
        bail!("{} upload chunk(s) failed", summary.failed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nav_csv_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navs.csv");
        std::fs::write(
            &path,
            "productCode,date,unitNav,cumulativeNav\n\
             SVZ009,2024-01-05,1.0234,1.2234\n\
             SVZ010,2024-01-05,0.9871,0.9871\n",
        )
        .unwrap();

        let records = read_nav_csv(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product_code, "SVZ009");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(records[1].unit_nav, 0.9871);
    }

    #[test]
    fn bad_date_in_csv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "productCode,date,unitNav,cumulativeNav\nSVZ009,05/01/2024,1.0,1.0\n",
        )
        .unwrap();

        let err = read_nav_csv(&path).unwrap_err();
        assert!(err.to_string().contains("05/01/2024"));
    }

    #[test]
    fn start_defaults_to_2010() {
        assert_eq!(
            parse_start(None).unwrap(),
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()
        );
        assert!(parse_start(Some("2024-13-01")).is_err());
    }
}
