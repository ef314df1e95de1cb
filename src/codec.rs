use tracing::warn;

use crate::{batch::Batch, error::PublishError, measurement::Measurement};

/// Host payload type: a JSON array of measurements.
pub const JSON_CONTENT_TYPE: &str = "blueflood.json";

pub fn decode_measurements(
    content_type: &str,
    content: &[u8],
) -> Result<Vec<Measurement>, PublishError> {
    match content_type {
        JSON_CONTENT_TYPE => Ok(serde_json::from_slice(content)?),
        _ => {
            warn!(%content_type, "unknown content type");
            Err(PublishError::UnknownContentType(content_type.to_owned()))
        }
    }
}

/// Ingest request body for one batch.
pub fn encode_batch(batch: &Batch) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(batch)
}
