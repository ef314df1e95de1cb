use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use blueflood::{
    exporter::{HttpTransport, Transport},
    BluefloodPublisher, ConfigMap, ConfigValue, Measurement, Namespace,
};
use poem::{
    handler,
    http::StatusCode,
    listener::TcpAcceptor,
    middleware::AddData,
    post,
    web::{Data, Json},
    EndpointExt, Request, Route, Server,
};
use tokio::{runtime::Handle, sync::mpsc};
use url::Url;

struct Ingested {
    content_type: Option<String>,
    records: Vec<serde_json::Value>,
}

#[derive(Clone)]
struct IngestState {
    status: StatusCode,
    delay: Duration,
    tx: mpsc::UnboundedSender<Ingested>,
}

#[handler]
async fn ingest(
    req: &Request,
    Json(records): Json<Vec<serde_json::Value>>,
    state: Data<&IngestState>,
) -> StatusCode {
    tokio::time::sleep(state.delay).await;
    let content_type = req.content_type().map(str::to_owned);
    let _ = state.tx.send(Ingested {
        content_type,
        records,
    });
    state.status
}

async fn ingest_server(
    status: StatusCode,
    delay: Duration,
) -> (Url, mpsc::UnboundedReceiver<Ingested>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TcpAcceptor::from_tokio(listener).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let state = IngestState { status, delay, tx };
    let app = Route::new()
        .at("/v2.0/tenant/ingest", post(ingest))
        .with(AddData::new(state));
    tokio::spawn(Server::new_with_acceptor(acceptor).run(app));
    let url = Url::parse(&format!("http://{addr}/v2.0/tenant/ingest")).unwrap();
    (url, rx)
}

fn config(server: &Url, rollup_num: i64) -> ConfigMap {
    ConfigMap::from([
        ("server".to_owned(), ConfigValue::from(server.as_str())),
        ("rollupNum".to_owned(), ConfigValue::Int(rollup_num)),
        ("ttlInSeconds".to_owned(), ConfigValue::Int(172800)),
        ("timeout".to_owned(), ConfigValue::Int(5)),
    ])
}

fn int_metrics(n: i64) -> Vec<Measurement> {
    (1..=n)
        .map(|i| {
            let name = format!("int{i}");
            Measurement::new(Namespace::new(["staples", "test", name.as_str()]), i)
        })
        .collect()
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Ingested>) -> Ingested {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("batch not ingested in time")
        .expect("ingest server stopped")
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_is_posted_as_json() {
    let (url, mut rx) = ingest_server(StatusCode::OK, Duration::ZERO).await;
    let publisher = BluefloodPublisher::new(Handle::current());
    publisher.publish(&int_metrics(3), &config(&url, 20)).unwrap();

    let ingested = recv(&mut rx).await;
    assert_eq!(ingested.content_type.as_deref(), Some("application/json"));
    assert_eq!(ingested.records.len(), 3);
    let first = &ingested.records[0];
    assert_eq!(first["metricName"], "staples.test.int1");
    assert_eq!(first["metricValue"], 1);
    assert_eq!(first["ttlInSeconds"], 172800);
    assert!(first["collectionTime"].as_u64().unwrap() > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_not_surfaced() {
    let (url, mut rx) = ingest_server(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
    let publisher = BluefloodPublisher::new(Handle::current());
    publisher.publish(&int_metrics(3), &config(&url, 2)).unwrap();

    let mut sizes = vec![recv(&mut rx).await.records.len(), recv(&mut rx).await.records.len()];
    sizes.sort();
    assert_eq!(sizes, [1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_returns_before_slow_server_answers() {
    let delay = Duration::from_secs(2);
    let (url, mut rx) = ingest_server(StatusCode::OK, delay).await;
    let publisher = BluefloodPublisher::new(Handle::current());
    let start = Instant::now();
    publisher.publish(&int_metrics(4), &config(&url, 100)).unwrap();
    assert!(start.elapsed() < delay);
    assert_eq!(recv(&mut rx).await.records.len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_reports_statuses_and_failures() {
    let (url, _rx) = ingest_server(StatusCode::SERVICE_UNAVAILABLE, Duration::ZERO).await;
    let (slow_url, _slow_rx) = ingest_server(StatusCode::OK, Duration::from_secs(3)).await;
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        Url::parse(&format!("http://{addr}/ingest")).unwrap()
    };

    let transport = Arc::new(HttpTransport::new());
    let (status, refused, timed_out) = tokio::task::spawn_blocking(move || {
        let status = transport.post_json(&url, b"[]", None);
        let refused = transport.post_json(&closed, b"[]", None);
        let timed_out = transport.post_json(&slow_url, b"[]", Some(Duration::from_millis(200)));
        (status, refused, timed_out)
    })
    .await
    .unwrap();
    assert_eq!(status.unwrap(), 503);
    assert!(refused.is_err());
    assert!(timed_out.is_err());
}
