use std::{sync::Arc, time::Duration};

use tokio::runtime::Handle;
use tracing::{info, info_span, warn, Span};
use url::Url;

use crate::{batch::Batch, codec::encode_batch, config::PublisherConfig};

/// Posts JSON bodies to an ingest endpoint.
pub trait Transport: core::fmt::Debug + Send + Sync + 'static {
    /// Blocking I/O. Returns the response status; `Err` means no response
    /// was received.
    fn post_json(
        &self,
        url: &Url,
        body: &[u8],
        timeout: Option<Duration>,
    ) -> anyhow::Result<u16>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ureq::Agent,
}
impl HttpTransport {
    pub fn new() -> Self {
        let client = ureq::Agent::new();
        Self { client }
    }
}
impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
impl Transport for HttpTransport {
    fn post_json(
        &self,
        url: &Url,
        body: &[u8],
        timeout: Option<Duration>,
    ) -> anyhow::Result<u16> {
        let mut req = self
            .client
            .post(url.as_str())
            .set("Content-Type", "application/json");
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        match req.send_bytes(body) {
            Ok(resp) => Ok(resp.status()),
            Err(ureq::Error::Status(status, _)) => Ok(status),
            Err(e) => Err(e.into()),
        }
    }
}

/// Outcome of delivering one batch.
#[derive(Debug)]
pub enum Delivery {
    Ingested,
    Rejected(u16),
    Undelivered(anyhow::Error),
}

/// Where and how a batch is posted.
#[derive(Debug, Clone)]
pub struct Target {
    pub server: Url,
    pub timeout: Option<Duration>,
}
impl From<&PublisherConfig> for Target {
    fn from(config: &PublisherConfig) -> Self {
        Self {
            server: config.server.clone(),
            timeout: config.timeout,
        }
    }
}

/// Sends batches on detached blocking tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    span: Span,
}
impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        let span = info_span!("blueflood");
        Self::with_span(transport, runtime, span)
    }
    pub fn with_span(transport: Arc<dyn Transport>, runtime: Handle, span: Span) -> Self {
        Self {
            transport,
            runtime,
            span,
        }
    }

    /// Hands `batch` to a blocking task and returns without waiting for it.
    pub fn dispatch(&self, batch: Batch, target: Target) {
        let transport = Arc::clone(&self.transport);
        let span = self.span.clone();
        drop(self.runtime.spawn_blocking(move || {
            let _enter = span.enter();
            log_delivery(&target, batch.len(), deliver(transport.as_ref(), &batch, &target));
        }));
    }
}

/// Encodes and posts one batch. Blocking I/O.
pub fn deliver(transport: &dyn Transport, batch: &Batch, target: &Target) -> Delivery {
    let body = match encode_batch(batch) {
        Ok(body) => body,
        Err(e) => return Delivery::Undelivered(e.into()),
    };
    match transport.post_json(&target.server, &body, target.timeout) {
        Ok(200) => Delivery::Ingested,
        Ok(status) => Delivery::Rejected(status),
        Err(e) => Delivery::Undelivered(e),
    }
}

fn log_delivery(target: &Target, records: usize, delivery: Delivery) {
    let server = target.server.as_str();
    match delivery {
        Delivery::Ingested => info!(server, records, status = 200, "metrics ingested"),
        Delivery::Rejected(status) => warn!(server, records, status, "metrics not ingested"),
        Delivery::Undelivered(e) => warn!(server, records, error = %e, "ingest request failed"),
    }
}
