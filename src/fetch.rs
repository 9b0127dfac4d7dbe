// src/fetch.rs
//! Shared HTTP fetching with per-request timeout and bounded retry/backoff.
//! Every adapter goes through this instead of rolling its own retry loop, and
//! gets a `Result` back so "fetched nothing" and "failed to fetch" stay
//! distinguishable.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use std::time::Duration;

pub const USER_AGENT: &str = "LovSonar/1.0 (compliance monitoring)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ATTEMPTS: u32 = 3;

const BACKOFF_BASE_MS: u64 = 500;

/// Build the shared client with UA and timeout applied to every request.
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("building http client")
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(attempt: u32) -> Duration {
    // 500ms, 1s, 2s, ...
    Duration::from_millis(BACKOFF_BASE_MS << attempt.min(4))
}

/// GET `url` and return the body as text, retrying transient failures
/// (connect/timeout errors, 429, 5xx) up to `attempts` times.
pub async fn get_text(client: &reqwest::Client, url: &str, attempts: u32) -> Result<String> {
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt - 1)).await;
        }

        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return resp
                        .text()
                        .await
                        .with_context(|| format!("reading body from {url}"));
                }
                if is_transient(status) {
                    tracing::warn!(%url, %status, attempt, "transient http status, will retry");
                    last_err = Some(anyhow::anyhow!("http status {status} from {url}"));
                    continue;
                }
                bail!("http status {status} from {url}");
            }
            Err(e) => {
                tracing::warn!(%url, error = ?e, attempt, "http request failed, will retry");
                last_err = Some(anyhow::Error::new(e).context(format!("requesting {url}")));
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("fetch of {url} failed")))
}
