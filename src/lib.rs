pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod exporter;
pub mod measurement;
pub mod normalize;
pub mod publisher;

pub use config::{ConfigMap, ConfigValue, PublisherConfig};
pub use error::{ConfigError, PublishError};
pub use measurement::{Measurement, MetricValue, Namespace};
pub use publisher::BluefloodPublisher;

/// Milliseconds since the Unix epoch.
pub type Time = u64;

pub const PLUGIN_NAME: &str = "blueflood";
pub const PLUGIN_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Publisher,
}

/// What a host needs to know to load this publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMeta {
    pub name: &'static str,
    pub version: u32,
    pub kind: PluginKind,
    pub accepted_content_types: &'static [&'static str],
}

pub fn meta() -> PluginMeta {
    PluginMeta {
        name: PLUGIN_NAME,
        version: PLUGIN_VERSION,
        kind: PluginKind::Publisher,
        accepted_content_types: &[codec::JSON_CONTENT_TYPE],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_describes_a_publisher() {
        let meta = meta();
        assert_eq!(meta.name, "blueflood");
        assert_eq!(meta.version, 1);
        assert_eq!(meta.kind, PluginKind::Publisher);
        assert_eq!(meta.accepted_content_types, ["blueflood.json"]);
    }
}
