//! # Donation engine public API
//!
//! The `engine_api` module exposes the programmatic API of the donation engine. The API is modular, so that clients
//! pick the parts they need.
//!
//! * [`payment_flow_api`] starts donations at a payment provider and handles provider confirmation notifications.
//! * [`reconciliation_api`] drains the confirmed queues into the sharded campaign ledgers.
//! * [`cache_janitor`] expires donations that were never confirmed.
//! * [`ledger_api`] serves the public ledger read path and administrative ledger maintenance.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits the API needs:
//!
//! ```rust,ignore
//! use glow_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db);
//! let page = api.list_donations("kaarsjes", 0, 20).await?;
//! ```
pub mod cache_janitor;
pub mod donation_objects;
pub mod errors;
pub mod ledger_api;
pub mod payment_flow_api;
pub mod reconciliation_api;
