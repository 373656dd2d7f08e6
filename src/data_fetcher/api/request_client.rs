//! Cached upstream calls with classified retry and backoff

use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::http_client::create_http_client;
use super::retry::{AttemptState, FailureClass, RetryMachine, RetryPolicy};
use super::urls::build_url;
use crate::config::Config;
use crate::constants::logging::{DEBUG_BODY_PREVIEW_CHARS, ERROR_BODY_PREVIEW_CHARS};
use crate::data_fetcher::cache::{DataClass, TieredCache, cache_key};
use crate::error::AppError;
use crate::performance::RequestMetrics;

/// Query parameter names that are never forwarded upstream.
const DROPPED_PARAMS: &[&str] = &["sport"];

/// Issues upstream GET requests through the cache.
///
/// Cheap to clone; clones share the HTTP pool, cache and counters.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: Client,
    base_url: String,
    cache: Arc<TieredCache>,
    policy: RetryPolicy,
    metrics: Arc<RequestMetrics>,
}

/// Result of one network attempt that did not produce a usable payload.
struct AttemptFailure {
    class: FailureClass,
    retry_after: Option<Duration>,
    error: AppError,
}

impl RequestClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        cache: Arc<TieredCache>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            cache,
            policy,
            metrics: Arc::new(RequestMetrics::new()),
        }
    }

    pub fn from_config(config: &Config, cache: Arc<TieredCache>) -> Result<Self, AppError> {
        let http = create_http_client(&config.api_key, config.http_timeout_seconds)?;
        Ok(Self::new(
            http,
            config.api_domain.clone(),
            cache,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `endpoint` with `params`, serving from cache when possible.
    ///
    /// Non-empty payloads are cached with the TTL of `class`. Throttled and
    /// faulted attempts are retried up to the policy ceiling; any other 4xx fails
    /// on the first attempt.
    ///
    /// # Errors
    /// * `AppError::ApiRateLimit` - every attempt was answered with 429
    /// * `AppError::ApiServerError` / `ApiServiceUnavailable` / `NetworkTimeout` /
    ///   `NetworkConnection` - upstream faults outlived the retry ceiling
    /// * `AppError::ApiClientError` / `ApiNotFound` - malformed request, not retried
    /// * `AppError::ApiMalformedJson` - success status with a non-JSON body
    #[instrument(skip(self, params, class))]
    pub async fn call(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        class: DataClass,
    ) -> Result<Value, AppError> {
        let key = cache_key(endpoint, params);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Using cached response for {endpoint}");
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let url = build_url(&self.base_url, endpoint);
        let query = forwarded_params(params);
        info!("Fetching {} {:?}", endpoint, query);

        let mut machine = RetryMachine::new(&self.policy);
        loop {
            let attempt = machine.begin_attempt();
            let failure = match self.attempt(&url, &query).await {
                Ok(value) => {
                    machine.succeed();
                    debug!("{endpoint} succeeded on attempt {attempt}");
                    if is_empty_payload(&value) {
                        debug!("Empty payload from {endpoint}, not caching");
                    } else {
                        self.cache.set(&key, value.clone(), class);
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if failure.class == FailureClass::Validation {
                // Logged once in `attempt` with the response body
                self.metrics.record_failure();
                return Err(failure.error);
            }

            match machine.fail(failure.class, failure.retry_after) {
                AttemptState::Retrying { delay, class, .. } => {
                    warn!(
                        "{:?} from {} ({}). Retrying in {:?} (attempt {}/{})",
                        class,
                        endpoint,
                        failure.error,
                        delay,
                        attempt,
                        self.policy.max_attempts
                    );
                    self.metrics.record_retry();
                    tokio::time::sleep(delay).await;
                }
                AttemptState::Failed { attempts, class } => {
                    self.metrics.record_failure();
                    error!(
                        "Giving up on {} {:?} after {} attempts: {}",
                        endpoint, query, attempts, failure.error
                    );
                    return Err(match class {
                        FailureClass::RateLimited => {
                            AppError::api_rate_limit("Too Many Requests", &url, attempts)
                        }
                        _ => failure.error,
                    });
                }
                other => {
                    // fail() only yields Retrying or Failed
                    error!("Unexpected retry state {:?} for {}", other, endpoint);
                    return Err(failure.error);
                }
            }
        }
    }

    async fn attempt(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AttemptFailure> {
        let started = Instant::now();
        let sent = self.http.get(url).query(query).send().await;
        self.metrics.record_attempt(started.elapsed());

        let response = match sent {
            Ok(response) => response,
            Err(e) => return Err(transport_failure(e, url)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(response, url, query).await);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(transport_failure(e, url)),
        };
        debug!("Response length: {} bytes", body.len());
        debug!(
            "Response text (first {} chars): {}",
            DEBUG_BODY_PREVIEW_CHARS,
            preview(&body, DEBUG_BODY_PREVIEW_CHARS)
        );

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse API response: {} (URL: {}). Body (first {} chars): {}",
                e,
                url,
                ERROR_BODY_PREVIEW_CHARS,
                preview(&body, ERROR_BODY_PREVIEW_CHARS)
            );
            AttemptFailure {
                class: FailureClass::Validation,
                retry_after: None,
                error: AppError::api_malformed_json(e.to_string(), url),
            }
        })
    }
}

fn forwarded_params<'a>(params: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .map(|(k, v)| (*k, v.trim()))
        .filter(|(k, v)| !v.is_empty() && !DROPPED_PARAMS.contains(k))
        .collect()
}

fn transport_failure(e: reqwest::Error, url: &str) -> AttemptFailure {
    let (class, error) = if e.is_timeout() {
        (FailureClass::UpstreamFault, AppError::network_timeout(url))
    } else if e.is_connect() {
        (
            FailureClass::UpstreamFault,
            AppError::network_connection(url, e.to_string()),
        )
    } else if e.is_builder() {
        (FailureClass::Validation, AppError::ApiFetch(e))
    } else {
        (FailureClass::UpstreamFault, AppError::ApiFetch(e))
    };
    if class == FailureClass::Validation {
        error!("Request could not be built for {}: {}", url, error);
    }
    AttemptFailure {
        class,
        retry_after: None,
        error,
    }
}

async fn status_failure(response: Response, url: &str, query: &[(&str, &str)]) -> AttemptFailure {
    let status = response.status();
    let status_code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Unknown error");
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let class = FailureClass::from_status(status_code).unwrap_or(FailureClass::UpstreamFault);

    let error = match status_code {
        404 => AppError::api_not_found(url),
        429 => AppError::api_rate_limit(reason, url, 1),
        400..=499 => AppError::api_client_error(status_code, reason, url),
        502 | 503 => AppError::api_service_unavailable(status_code, reason, url),
        _ => AppError::api_server_error(status_code, reason, url),
    };

    if class == FailureClass::Validation {
        let body = response.text().await.unwrap_or_default();
        error!(
            "HTTP {} - {} (URL: {}, params: {:?}). Body (first {} chars): {}",
            status_code,
            reason,
            url,
            query,
            ERROR_BODY_PREVIEW_CHARS,
            preview(&body, ERROR_BODY_PREVIEW_CHARS)
        );
    }

    AttemptFailure {
        class,
        retry_after,
        error,
    }
}

fn preview(body: &str, chars: usize) -> String {
    body.chars().take(chars).collect()
}

/// True for payloads that carry no records: null, `[]`, `{}`, or a `data` wrapper
/// around nothing.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => {
            map.is_empty()
                || (map.len() == 1 && map.get("data").is_some_and(is_empty_payload))
        }
        _ => false,
    }
}
