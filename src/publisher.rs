use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    batch::BatchAccumulator,
    codec::decode_measurements,
    config::{ConfigMap, ConfigPolicy, PublisherConfig},
    error::PublishError,
    exporter::{Dispatcher, HttpTransport, Target, Transport},
    measurement::Measurement,
    normalize::Normalizer,
};

/// Forwards measurements to a Blueflood ingest endpoint.
///
/// Publishing never waits for the ingest requests it starts. Their outcomes
/// are only logged.
#[derive(Debug, Clone)]
pub struct BluefloodPublisher {
    dispatcher: Dispatcher,
}
impl BluefloodPublisher {
    /// Ingest requests run as blocking tasks on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new()), runtime)
    }
    pub fn with_transport(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        let dispatcher = Dispatcher::new(transport, runtime);
        Self { dispatcher }
    }

    /// Config keys a host must validate before calling [`Self::publish`].
    pub fn config_policy() -> ConfigPolicy {
        ConfigPolicy::blueflood()
    }

    /// Decodes a host payload and publishes it with the host's config.
    pub fn publish_content(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> Result<(), PublishError> {
        let measurements = decode_measurements(content_type, content)?;
        self.publish(&measurements, config)
    }

    pub fn publish(
        &self,
        measurements: &[Measurement],
        config: &ConfigMap,
    ) -> Result<(), PublishError> {
        let config = PublisherConfig::try_from(config)?;
        self.publish_with(measurements, &config);
        Ok(())
    }

    /// Normalizes and batches `measurements`, dispatching every full batch
    /// and the final partial one.
    pub fn publish_with(&self, measurements: &[Measurement], config: &PublisherConfig) {
        let target = Target::from(config);
        let mut normalizer = Normalizer::new(config.ttl_in_seconds);
        let mut acc = BatchAccumulator::new(config.rollup_num);
        let mut accepted = 0;
        let mut batches = 0;
        for measurement in measurements {
            let Some(record) = normalizer.normalize(measurement) else {
                continue;
            };
            accepted += 1;
            if let Some(batch) = acc.push(record) {
                batches += 1;
                self.dispatcher.dispatch(batch, target.clone());
            }
        }
        if let Some(batch) = acc.finish() {
            batches += 1;
            self.dispatcher.dispatch(batch, target);
        }
        debug!(
            measurements = measurements.len(),
            accepted,
            batches,
            "published"
        );
    }
}
