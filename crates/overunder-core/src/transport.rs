// HTTP transport to the contest server: draft autosave, unload beacon and
// final entry submission.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::TransportError;
use crate::snapshot::FormSnapshot;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const CSRF_HEADER: &str = "X-CSRFToken";
const CONTEST_ID_PLACEHOLDER: &str = "{contest_id}";

/// Substitute `contest_id` into an endpoint template.
pub fn endpoint_for(template: &str, contest_id: &str) -> String {
    template.replace(CONTEST_ID_PLACEHOLDER, contest_id)
}

// ---------------------------------------------------------------------------
// EntryTransport
// ---------------------------------------------------------------------------

/// The server calls an entry client makes.
#[async_trait]
pub trait EntryTransport: Send + Sync {
    /// Write an in-progress snapshot. Only success or failure is interpreted.
    async fn save_draft(&self, contest_id: &str, snapshot: &FormSnapshot)
        -> Result<(), TransportError>;

    /// Deliver a snapshot without waiting for, or depending on, a response.
    /// Must return immediately.
    fn send_beacon(&self, contest_id: &str, snapshot: &FormSnapshot);

    /// Wait for beacons still in flight. Called once, on shutdown.
    async fn drain_beacons(&self) {}

    /// Submit the final entry.
    async fn submit_entry(&self, contest_id: &str, snapshot: &FormSnapshot)
        -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    endpoint_template: String,
    csrf_token: String,
    beacons: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        endpoint_template: &str,
        csrf_token: Option<&str>,
        session_cookie: Option<&str>,
        timeout: std::time::Duration,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie.and_then(|c| HeaderValue::from_str(c).ok()) {
            headers.insert(COOKIE, cookie);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint_template: endpoint_template.to_string(),
            csrf_token: csrf_token.unwrap_or_default().to_string(),
            beacons: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Build a transport from the application config.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(
            &config.server.base_url,
            &config.autosave.endpoint_template,
            config.credentials.csrf_token.as_deref(),
            config.credentials.session_cookie.as_deref(),
            config.server.request_timeout(),
        )
    }

    pub fn autosave_url(&self, contest_id: &str) -> String {
        format!(
            "{}{}",
            self.base_url,
            endpoint_for(&self.endpoint_template, contest_id)
        )
    }

    pub fn submit_url(&self, contest_id: &str) -> String {
        format!("{}/contests/{contest_id}/enter", self.base_url)
    }

    /// Beacon tasks that have not finished yet.
    pub fn pending_beacons(&self) -> usize {
        let mut beacons = self.beacons.lock().unwrap_or_else(PoisonError::into_inner);
        beacons.retain(|handle| !handle.is_finished());
        beacons.len()
    }

    fn autosave_request(&self, contest_id: &str, snapshot: &FormSnapshot) -> reqwest::RequestBuilder {
        self.http
            .post(self.autosave_url(contest_id))
            .header(CONTENT_TYPE, "application/json")
            .header(CSRF_HEADER, &self.csrf_token)
            .json(snapshot)
    }
}

#[async_trait]
impl EntryTransport for HttpTransport {
    async fn save_draft(
        &self,
        contest_id: &str,
        snapshot: &FormSnapshot,
    ) -> Result<(), TransportError> {
        let response = self.autosave_request(contest_id, snapshot).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        debug!(contest_id, %status, "autosave accepted");
        Ok(())
    }

    fn send_beacon(&self, contest_id: &str, snapshot: &FormSnapshot) {
        let request = self.autosave_request(contest_id, snapshot);
        let contest_id = contest_id.to_string();
        // The caller never waits on this; only drain_beacons does.
        let handle = tokio::spawn(async move {
            match request.send().await {
                Ok(response) => debug!(contest_id = %contest_id, status = %response.status(), "beacon delivered"),
                Err(e) => warn!(contest_id = %contest_id, "beacon delivery failed: {e}"),
            }
        });
        let mut beacons = self.beacons.lock().unwrap_or_else(PoisonError::into_inner);
        beacons.retain(|handle| !handle.is_finished());
        beacons.push(handle);
    }

    async fn drain_beacons(&self) {
        let pending = std::mem::take(&mut *self.beacons.lock().unwrap_or_else(PoisonError::into_inner));
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "waiting for beacons");
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("beacon task failed: {e}");
            }
        }
    }

    async fn submit_entry(
        &self,
        contest_id: &str,
        snapshot: &FormSnapshot,
    ) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.submit_url(contest_id))
            .header(CSRF_HEADER, &self.csrf_token)
            .form(&snapshot.pairs())
            .send()
            .await?;
        let status = response.status();
        // The server answers a successful submission with a redirect, which
        // reqwest follows.
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
