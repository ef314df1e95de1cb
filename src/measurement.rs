use serde::Deserialize;

use crate::Time;

/// Ordered path segments identifying a metric, e.g. `["host", "cpu", "util"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Vec<String>);
impl Namespace {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Metric name as ingested: segments joined with `.`.
    pub fn key(&self) -> String {
        self.0.join(".")
    }
}
impl core::fmt::Display for Namespace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// The value a collector attached to a measurement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "HostValue")]
pub enum MetricValue {
    I64(i64),
    U64(u64),
    F64(f64),
    Text(String),
    /// Any other shape, carrying the name of the type that was received.
    Unsupported(#[serde(skip_deserializing)] &'static str),
}
macro_rules! impl_from_number {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for MetricValue {
                fn from(value: $t) -> Self {
                    MetricValue::$variant(value.into())
                }
            }
        )*
    };
}
impl_from_number!(I64: i8, i16, i32, i64);
impl_from_number!(U64: u8, u16, u32, u64);
impl_from_number!(F64: f32, f64);
impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}
impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_owned())
    }
}

/// Shape of `data` in a host payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum HostValue {
    I64(i64),
    U64(u64),
    F64(f64),
    Text(String),
    Other(serde_json::Value),
}
impl From<HostValue> for MetricValue {
    fn from(value: HostValue) -> Self {
        match value {
            HostValue::I64(v) => MetricValue::I64(v),
            HostValue::U64(v) => MetricValue::U64(v),
            HostValue::F64(v) => MetricValue::F64(v),
            HostValue::Text(v) => MetricValue::Text(v),
            HostValue::Other(v) => MetricValue::Unsupported(match v {
                serde_json::Value::Null => "null",
                serde_json::Value::Bool(_) => "bool",
                serde_json::Value::Number(_) => "number",
                serde_json::Value::String(_) => "string",
                serde_json::Value::Array(_) => "array",
                serde_json::Value::Object(_) => "object",
            }),
        }
    }
}

/// One collected measurement handed over by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measurement {
    pub namespace: Namespace,
    pub data: MetricValue,
    /// Collection time reported by the host. Not forwarded; records are
    /// stamped when they are batched.
    #[serde(default)]
    pub timestamp: Time,
}
impl Measurement {
    pub fn new(namespace: Namespace, data: impl Into<MetricValue>) -> Self {
        Self {
            namespace,
            data: data.into(),
            timestamp: 0,
        }
    }
}
