//! Authenticated HTTP transport with rate limiting and retry.
//!
//! Every attempt (first try and retries alike) goes through the same
//! sequence: consult the rate limiter, sleeping the reported wait when the
//! window is full, record the request, then send. HTTP 5xx and network
//! failures back off and retry; HTTP 429 sleeps for the server's
//! `Retry-After` hint; HTTP 4xx fails immediately.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::ApiErrorBody;
use super::config::BrokerConfig;
use super::error::BrokerError;
use super::rate_limit::RateLimiter;
use super::retry::{BackoffSchedule, RetryPolicy, parse_retry_after};

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

/// Authenticated HTTP client for the brokerage REST APIs.
///
/// Owns the HTTP session and the rate-limit window. Multiple callers
/// sharing one client share its rate budget; the brokerage limit is per
/// credential set, not per caller.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    trading_base_url: String,
    data_base_url: String,
    retry: RetryPolicy,
    rate_limiter: Mutex<RateLimiter>,
}

impl HttpClient {
    /// Build the transport from a broker configuration.
    pub fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(BrokerError::AuthenticationFailed);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            trading_base_url: config.trading_base_url().to_string(),
            data_base_url: config.data_base_url().to_string(),
            retry: config.retry.clone(),
            rate_limiter: Mutex::new(RateLimiter::new(config.rate_limit)),
        })
    }

    /// GET from the trading API.
    pub async fn get_trading<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.trading_base_url);
        self.request(Method::GET, &url, query, None).await
    }

    /// GET from the market data API.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.data_base_url);
        self.request(Method::GET, &url, query, None).await
    }

    /// POST a JSON body to the trading API.
    pub async fn post_trading<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.trading_base_url);
        let body = serde_json::to_value(body).map_err(|e| BrokerError::Json(e.to_string()))?;
        self.request(Method::POST, &url, &[], Some(body)).await
    }

    /// DELETE on the trading API.
    pub async fn delete_trading<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.trading_base_url);
        self.request(Method::DELETE, &url, query, None).await
    }

    /// Internal request implementation with rate limiting and retry.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, BrokerError> {
        let mut schedule = BackoffSchedule::new(&self.retry);

        loop {
            self.wait_for_rate_limit().await;

            let mut request = self
                .client
                .request(method.clone(), url)
                .header(KEY_HEADER, &self.api_key)
                .header(SECRET_HEADER, &self.api_secret);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = BrokerError::Network(e.to_string());
                    match schedule.next_backoff() {
                        Some(delay) => {
                            tracing::warn!(
                                error = %err,
                                delay_ms = delay.as_millis(),
                                attempt = schedule.attempts(),
                                "network error, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        None => return Err(err),
                    }
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| BrokerError::Network(e.to_string()))?;
                let body = if text.is_empty() { "null" } else { text.as_str() };
                return serde_json::from_str(body).map_err(|e| BrokerError::Json(e.to_string()));
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            let body_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body_text) {
                Ok(body) => body.message,
                Err(_) => body_text,
            };

            if status == StatusCode::TOO_MANY_REQUESTS {
                // Not a hard failure: honor Retry-After, then try again.
                let delay = if let Some(after) = retry_after {
                    schedule.consume_attempt().then_some(after)
                } else {
                    schedule.next_backoff()
                };
                match delay {
                    Some(delay) => {
                        tracing::warn!(
                            delay_ms = delay.as_millis(),
                            attempt = schedule.attempts(),
                            "rate limited by server, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => {
                        return Err(BrokerError::RateLimited {
                            retry_after_secs: retry_after.map_or(60, |d| d.as_secs()),
                        });
                    }
                }
            }

            if status.is_server_error() {
                let err = BrokerError::Server {
                    status: status.as_u16(),
                    message,
                };
                match schedule.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            error = %err,
                            delay_ms = delay.as_millis(),
                            attempt = schedule.attempts(),
                            "server error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => return Err(err),
                }
            }

            // 4xx: fail immediately, no retry.
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(BrokerError::AuthenticationFailed)
                }
                _ => Err(BrokerError::Client {
                    status: status.as_u16(),
                    message,
                }),
            };
        }
    }

    /// Consult the window, sleep if full, then record unconditionally.
    async fn wait_for_rate_limit(&self) {
        let (allowed, wait) = self.limiter().allow();
        if !allowed {
            tracing::warn!(wait_secs = wait, "rate limit window full, waiting");
            tokio::time::sleep(Duration::from_secs(wait)).await;
        }
        self.limiter().record();
    }

    fn limiter(&self) -> MutexGuard<'_, RateLimiter> {
        match self.rate_limiter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
