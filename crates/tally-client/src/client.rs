// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed HTTP client for the counter procedures.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tally_core::{Counter, Increment, IncrementCounterInput, ResetCounterInput, TallyError};
use tracing::{debug, warn};

/// Health endpoint response from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a running `tally serve`.
#[derive(Debug, Clone)]
pub struct CounterClient {
    http: reqwest::Client,
    base_url: String,
}

impl CounterClient {
    /// Build a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TallyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport("failed to create HTTP client", e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `getCounter`
    pub async fn get(&self) -> Result<Counter, TallyError> {
        let resp = self
            .http
            .get(self.url("/v1/counter"))
            .send()
            .await
            .map_err(|e| transport("getCounter request failed", e))?;
        decode(resp).await
    }

    /// `incrementCounter`
    pub async fn increment(&self, by: Increment) -> Result<Counter, TallyError> {
        self.post(
            "/v1/counter/increment",
            &IncrementCounterInput {
                increment: by.get(),
            },
        )
        .await
    }

    /// `resetCounter`
    pub async fn reset(&self, value: i64) -> Result<Counter, TallyError> {
        self.post("/v1/counter/reset", &ResetCounterInput { value })
            .await
    }

    /// `GET /health`. A 503 still carries a report, so it is decoded too.
    pub async fn health(&self) -> Result<HealthReport, TallyError> {
        let resp = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| transport("health request failed", e))?;
        if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
            return resp
                .json()
                .await
                .map_err(|e| transport("failed to parse health response", e));
        }
        decode(resp).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Counter, TallyError> {
        debug!(path, "posting counter procedure");
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport("request failed", e))?;
        decode(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TallyError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| transport("failed to parse response", e));
    }

    let url = resp.url().clone();
    let detail = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    warn!(status = status.as_u16(), url = %url, error = %detail, "counter API returned an error");
    Err(TallyError::Transport {
        message: format!("server returned {status}: {detail}"),
        source: None,
    })
}

fn transport(context: &str, e: reqwest::Error) -> TallyError {
    TallyError::Transport {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}
