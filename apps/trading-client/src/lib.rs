// Allow unwrap/expect and other test-only patterns in tests
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::items_after_statements
    )
)]

//! Trading Client - Rust Core Library
//!
//! Resilient client for a brokerage REST API plus corporate-action-aware
//! position bookkeeping.
//!
//! # Modules
//!
//! - [`broker`]: authenticated REST client with sliding-window rate
//!   limiting, exponential backoff with jitter, order validation, and
//!   market-data freshness checks
//! - [`corporate_actions`]: split/dividend ledger and adjustment math
//! - [`positions`]: append-only trade log, derived positions, JSON
//!   persistence, broker reconciliation
//! - [`strategy`]: indicator snapshots and rule-based scoring
//! - [`config`]: environment-driven credentials and validated risk limits
//! - [`observability`]: tracing subscriber setup
//!
//! # Safety model
//!
//! The trading mode defaults to paper everywhere a mode is parsed; live
//! trading requires an explicit opt-in, and live order submission is
//! logged loudly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod broker;
pub mod config;
pub mod corporate_actions;
pub mod observability;
pub mod positions;
pub mod strategy;
