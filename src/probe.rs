//! Packager status probe.
//!
//! One GET against `http://{endpoint}/status`. The packager answers with the
//! literal body `packager-status:running`; anything else (another body, an
//! error status, a refused connection) means "not running". A probe never
//! returns an error.

use async_trait::async_trait;

use crate::error::PackagerError;

/// Exact body the packager returns from `/status` once it is serving.
pub const STATUS_RUNNING: &str = "packager-status:running";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Running,
    /// Carries why the probe was negative, for logging only.
    NotRunning(String),
}

impl ProbeOutcome {
    /// Classify a `/status` response body. Exact, case-sensitive match.
    pub fn from_body(body: &str) -> Self {
        if body == STATUS_RUNNING {
            Self::Running
        } else {
            Self::NotRunning(format!("unexpected status body {:?}", truncate(body, 64)))
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Something that can tell whether the packager is up.
#[async_trait]
pub trait PackagerStatus: Send + Sync {
    async fn check(&self) -> ProbeOutcome;

    async fn probe(&self) -> bool {
        self.check().await.is_running()
    }
}

/// HTTP-backed status probe.
#[derive(Debug, Clone)]
pub struct StatusProbe {
    client: reqwest::Client,
    status_url: String,
}

impl StatusProbe {
    /// No request timeout is configured; a hung connection is bounded only
    /// by the OS and reqwest defaults. The packager is always local, so
    /// system proxy settings are ignored.
    pub fn new(endpoint: &str) -> Result<Self, PackagerError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| PackagerError::Http(e.to_string()))?;
        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            status_url: format!("http://{}/status", endpoint),
        }
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }
}

#[async_trait]
impl PackagerStatus for StatusProbe {
    async fn check(&self) -> ProbeOutcome {
        let response = match self.client.get(&self.status_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("[Probe] GET {} failed: {}", self.status_url, e);
                return ProbeOutcome::NotRunning(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("[Probe] GET {} returned {}", self.status_url, status);
            return ProbeOutcome::NotRunning(format!("HTTP {}", status));
        }

        match response.text().await {
            Ok(body) => {
                let outcome = ProbeOutcome::from_body(&body);
                if let ProbeOutcome::NotRunning(reason) = &outcome {
                    tracing::debug!("[Probe] {}: {}", self.status_url, reason);
                }
                outcome
            }
            Err(e) => {
                tracing::debug!("[Probe] reading body from {} failed: {}", self.status_url, e);
                ProbeOutcome::NotRunning(e.to_string())
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
