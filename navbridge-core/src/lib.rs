//! navbridge core: client for a fund-data vendor's NAV API.
//!
//! Two directions share one batching core:
//! - Reads: large registration-code lists are split into vendor-sized
//!   batches, queried one batch at a time, and merged back into a single
//!   DataFrame in input order.
//! - Writes: a NAV table is validated, split into row chunks, reshaped into
//!   the vendor's per-product upload body, signed per chunk and posted.
//!
//! Everything is synchronous and sequential. Nothing is cached.

pub mod client;
pub mod config;
pub mod credential;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod signer;
pub mod table;
pub mod transport;
pub mod upload;

pub use client::{default_start_date, NavClient};
pub use config::ClientConfig;
pub use credential::Credential;
pub use dispatch::{dispatch_read, UploadDispatcher};
pub use error::NavError;
pub use request::{Endpoint, RequestDescriptor, RequestOutput, VendorRequest};
pub use signer::{sign, Clock, SystemClock};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use upload::{nav_frame, NavRecord, UploadOutcome, UploadSummary, UploadType};
