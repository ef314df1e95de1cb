use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{trace, warn};

use crate::{
    measurement::{Measurement, MetricValue, Namespace},
    Time,
};

/// Numeric payload of a [`WireRecord`]. Integers stay integers on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricNumber {
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// One entry of an ingest batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub collection_time: Time,
    pub ttl_in_seconds: u64,
    pub metric_value: MetricNumber,
    pub metric_name: String,
}

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> Time;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now_millis(&self) -> Time {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Converts a measurement into a wire record stamped with `collection_time`.
///
/// Returns `None` when the measurement cannot be ingested:
/// - empty namespace (silently)
/// - NaN or infinite floats (warned)
/// - text that does not parse as a float (silently)
/// - unsupported value types (warned)
pub fn normalize_at(
    measurement: &Measurement,
    ttl_in_seconds: u64,
    collection_time: Time,
) -> Option<WireRecord> {
    let namespace = &measurement.namespace;
    if namespace.is_empty() {
        trace!("skipping measurement with empty namespace");
        return None;
    }
    let metric_value = match &measurement.data {
        MetricValue::I64(v) => MetricNumber::Int(*v),
        MetricValue::U64(v) => MetricNumber::UInt(*v),
        MetricValue::F64(v) => finite(*v, namespace)?,
        MetricValue::Text(text) => match text.parse::<f64>() {
            Ok(v) => finite(v, namespace)?,
            Err(_) => {
                trace!(%namespace, "skipping non-numeric text value");
                return None;
            }
        },
        MetricValue::Unsupported(type_name) => {
            warn!(%namespace, %type_name, "unknown data received for metric");
            return None;
        }
    };
    Some(WireRecord {
        collection_time,
        ttl_in_seconds,
        metric_value,
        metric_name: namespace.key(),
    })
}

/// [`normalize_at`] stamped with the current wall-clock time.
pub fn normalize(measurement: &Measurement, ttl_in_seconds: u64) -> Option<WireRecord> {
    normalize_at(measurement, ttl_in_seconds, SystemClock.now_millis())
}

fn finite(value: f64, namespace: &Namespace) -> Option<MetricNumber> {
    if value.is_finite() {
        return Some(MetricNumber::Float(value));
    }
    warn!(%namespace, %value, "dropping non-finite metric value");
    None
}

/// Normalizes the measurements of one publish call.
///
/// Collection times handed out by one normalizer never decrease, even if the
/// clock steps backwards.
#[derive(Debug)]
pub struct Normalizer<C = SystemClock> {
    ttl_in_seconds: u64,
    clock: C,
    last_stamp: Time,
}
impl Normalizer {
    pub fn new(ttl_in_seconds: u64) -> Self {
        Self::with_clock(ttl_in_seconds, SystemClock)
    }
}
impl<C: Clock> Normalizer<C> {
    pub fn with_clock(ttl_in_seconds: u64, clock: C) -> Self {
        Self {
            ttl_in_seconds,
            clock,
            last_stamp: 0,
        }
    }

    pub fn normalize(&mut self, measurement: &Measurement) -> Option<WireRecord> {
        let now = self.clock.now_millis().max(self.last_stamp);
        let record = normalize_at(measurement, self.ttl_in_seconds, now)?;
        self.last_stamp = now;
        Some(record)
    }
}
