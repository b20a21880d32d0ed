//! paylink relay — bridges a QR payment handoff to on-chain settlement.
//!
//! Hosts two surfaces on one actix-web server: the payer-facing relay at
//! the root scope (`GET /`, `GET /cancel`, `POST /approve`) and the
//! merchant-facing dashboard under `/dashboard`. Both share one injected
//! [`AppState`](state::AppState); the settlement logic itself lives in
//! the core [`paylink`] crate.
//!
//! # Modules
//!
//! - [`routes`] — payer-facing relay endpoints plus health and metrics
//! - [`dashboard`] — merchant dashboard: intent minting, QR display,
//!   merchant registration
//! - [`state`] — shared [`AppState`](state::AppState)
//! - [`config`] — environment configuration, read once at startup
//! - [`pages`] — server-rendered HTML (all user input escaped)
//! - [`metrics`] — Prometheus counters for intent and approval traffic

pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod pages;
pub mod routes;
pub mod state;
