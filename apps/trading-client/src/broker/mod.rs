//! Brokerage REST client.
//!
//! A resilient client for the Alpaca trading and market data APIs:
//! sliding-window rate limiting, exponential backoff with jitter for
//! transient failures, pre-submission order validation, and freshness
//! validation on market data.

pub mod api_types;
pub mod client;
pub mod config;
pub mod error;
pub mod freshness;
mod http;
pub mod order;
pub mod rate_limit;
pub mod retry;

pub use api_types::{
    Account, Bar, BarsResponse, BrokerPosition, CalendarDay, Clock, LatestQuotesResponse,
    LatestTradesResponse, Order, Quote, TradeTick,
};
pub use client::{BarsQuery, OrderStatusFilter, OrdersQuery, TradingClient};
pub use config::{BrokerConfig, FreshnessPolicy, TradingMode};
pub use error::BrokerError;
pub use freshness::{FreshnessCheck, FreshnessReport, MarketData};
pub use order::{OrderSide, OrderTicket, OrderType, TimeInForce};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use retry::RetryPolicy;
