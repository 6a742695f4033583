//! Rate-limited HTTP client for the Congress data API.

use rand::Rng;
use serde::Deserialize;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use async_trait::async_trait;

use legisync_core::config::ClientConfig;
use legisync_core::{SyncError, SyncResult};

use crate::limiter::RateLimiter;
use crate::source::{ApiPage, PageSource, ResourceDescriptor};

#[derive(Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(flatten)]
    body: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

/// Client for the upstream API. All requests pass through one token bucket,
/// so total outbound volume stays under the configured budget no matter how
/// many workers share the client.
pub struct CongressClient {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: RateLimiter,
}

impl CongressClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        let limiter = RateLimiter::new(config.requests_per_hour, config.burst);
        Self {
            http,
            config,
            limiter,
        }
    }

    fn build_url(&self, descriptor: &ResourceDescriptor) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = format!(
            "{}/{}/{}",
            base,
            descriptor.resource.path(),
            descriptor.congress
        );
        if let Some(chamber) = descriptor.chamber {
            url.push('/');
            url.push_str(chamber.as_str());
        }
        url.push_str(&format!("?format=json&limit={}&sort=updateDate+asc", descriptor.page_size));
        if let Some(from) = &descriptor.from_datetime {
            url.push_str(&format!("&fromDateTime={}", from));
        }
        url
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.config.base_backoff_ms.saturating_mul(1u64 << attempt.min(10));
        let jitter = rand::thread_rng().gen_range(0..250);
        Duration::from_millis(exp + jitter)
    }

    /// Drives one page fetch to completion: every attempt first takes a
    /// token from the limiter, rate-limit responses wait out the server
    /// hint (or our own backoff when the server gave none), and transient
    /// failures are retried up to `max_retries` times before being
    /// surfaced as permanent. Errors that are not retryable return
    /// immediately.
    async fn fetch_with_retries<F, Fut>(
        &self,
        deadline: Option<Instant>,
        mut attempt: F,
    ) -> SyncResult<ApiPage>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = SyncResult<ApiPage>>,
    {
        let mut transient_attempts: u32 = 0;
        loop {
            self.limiter.acquire(deadline).await?;

            match attempt().await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(SyncError::RateLimited { retry_after_secs }) => {
                    // The server hint wins over our own backoff.
                    let delay = retry_after_secs
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.backoff_delay(transient_attempts));
                    warn!(delay_secs = delay.as_secs(), "rate limited upstream, backing off");
                    if deadline_would_pass(deadline, delay) {
                        return Err(SyncError::DeadlineExceeded("rate-limit backoff".to_string()));
                    }
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if transient_attempts >= self.config.max_retries {
                        // Bounded attempts exhausted; surfaced as permanent.
                        return Err(SyncError::permanent(format!(
                            "retries exhausted after {} attempts: {}",
                            transient_attempts + 1,
                            e
                        )));
                    }
                    let delay = self.backoff_delay(transient_attempts);
                    transient_attempts += 1;
                    debug!(attempt = transient_attempts, ?delay, "transient failure, retrying");
                    if deadline_would_pass(deadline, delay) {
                        return Err(SyncError::DeadlineExceeded("retry backoff".to_string()));
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn request_once(&self, url: &str, records_key: &str) -> SyncResult<ApiPage> {
        let response = self
            .http
            .get(url)
            .header("X-Api-Key", &self.config.api_key)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(SyncError::RateLimited { retry_after_secs });
        }
        if status.is_server_error() {
            return Err(SyncError::transient(format!("server error {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::permanent(format!("API error {}: {}", status, body)));
        }

        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| SyncError::permanent(format!("malformed response: {}", e)))?;

        let records = match list.body.get(records_key) {
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(SyncError::permanent(format!(
                    "malformed response: '{}' is not an array",
                    records_key
                )))
            }
            None => Vec::new(),
        };

        Ok(ApiPage {
            records,
            next_cursor: list.pagination.and_then(|p| p.next),
        })
    }
}

fn classify_request_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() || e.is_connect() {
        SyncError::transient(e.to_string())
    } else if e.is_decode() {
        SyncError::permanent(format!("malformed response: {}", e))
    } else {
        SyncError::transient(e.to_string())
    }
}

#[async_trait]
impl PageSource for CongressClient {
    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        cursor: Option<&str>,
        deadline: Option<Instant>,
    ) -> SyncResult<ApiPage> {
        // The cursor, when present, is the opaque next-page URL the source
        // handed back; otherwise the URL is built from the descriptor.
        let url = match cursor {
            Some(next) => next.to_string(),
            None => self.build_url(descriptor),
        };

        let records_key = descriptor.resource.records_key();
        let page = self
            .fetch_with_retries(deadline, || self.request_once(&url, records_key))
            .await?;
        debug!(
            resource = descriptor.resource.path(),
            records = page.records.len(),
            has_next = page.next_cursor.is_some(),
            "fetched page"
        );
        Ok(page)
    }
}

fn deadline_would_pass(deadline: Option<Instant>, delay: Duration) -> bool {
    deadline.is_some_and(|d| Instant::now() + delay > d)
}
