//! # Glow server
//! This crate hosts the HTTP server in front of the donation engine. It is responsible for:
//! * Accepting donations from the campaign front ends and creating the payment at the campaign's provider.
//! * Receiving Pay.nl exchange calls and Payconiq callbacks, and answering them in each provider's own contract.
//! * Serving the campaign ledgers (paginated donations, latest donation, totals).
//! * Running the reconciliation and cache janitor workers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /donations`: Start a donation.
//! * `GET /campaigns/{id}/donations`, `/campaigns/{id}/donations/latest`, `/campaigns/{id}/counters`: Ledger reads.
//! * `GET /payments/{provider}/{reference}`: Where a payment is in the pipeline.
//! * `/webhook/paynl`, `/webhook/payconiq`: Provider notifications.
//! * `/admin/...`: Ledger maintenance and campaign settings. Requires the `glow_admin_token` header.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
