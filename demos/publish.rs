//! Samples host CPU and memory usage and publishes them to a Blueflood server.
//!
//! ```sh
//! cargo run --example publish -- http://127.0.0.1:19000/v2.0/tenant/ingest 10s
//! ```

use std::time::Duration;

use blueflood::{BluefloodPublisher, ConfigMap, ConfigValue, Measurement, Namespace, Time};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blueflood=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let server = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:19000/v2.0/tenant/ingest".into());
    let interval = match args.next() {
        Some(interval) => humantime::parse_duration(&interval)?,
        None => Duration::from_secs(10),
    };

    let config = ConfigMap::from([
        ("server".to_owned(), ConfigValue::Str(server)),
        ("rollupNum".to_owned(), ConfigValue::Int(100)),
        ("timeout".to_owned(), ConfigValue::Int(5)),
    ]);
    let publisher = BluefloodPublisher::new(Handle::current());
    let hostname = sysinfo::System::host_name().unwrap_or_else(|| "localhost".into());
    let mut sys = sysinfo::System::new_all();
    loop {
        tokio::time::sleep(interval).await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        let now = Time::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_millis(),
        )?;
        let sample = |metric: &str, value: f64| {
            let mut measurement =
                Measurement::new(Namespace::new([hostname.as_str(), "system", metric]), value);
            measurement.timestamp = now;
            measurement
        };
        let measurements = [
            sample("cpu_usage", f64::from(sys.global_cpu_usage())),
            sample("memory_used", sys.used_memory() as f64),
            sample("memory_total", sys.total_memory() as f64),
        ];
        publisher.publish(&measurements, &config)?;
    }
}
