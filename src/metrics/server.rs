use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use super::aggregator::FlowMetrics;
use super::errors::MetricsResult;

const METRICS_PATH: &str = "/metrics";

/// Upper bound on the request line plus headers of one scrape.
const MAX_REQUEST_BYTES: u64 = 8 * 1024;

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

fn default_address() -> String {
    "0.0.0.0:9590".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsSettings {
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        MetricsSettings {
            address: default_address(),
        }
    }
}

fn response(request_line: &str, metrics: &FlowMetrics) -> String {
    let mut parts = request_line.split_whitespace();
    let (method, path) = (parts.next(), parts.next());

    let (status, body) = match (method, path) {
        (Some("GET"), Some(METRICS_PATH)) => ("200 OK", metrics.gather()),
        (Some("GET"), Some(_)) => ("404 Not Found", "Not Found\n".to_string()),
        _ => ("405 Method Not Allowed", "Method Not Allowed\n".to_string()),
    };

    format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

async fn handle(stream: TcpStream, metrics: Arc<FlowMetrics>) -> MetricsResult<()> {
    let mut reader = BufReader::new(stream).take(MAX_REQUEST_BYTES);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // drain headers, the body of a scrape request is irrelevant
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
            break;
        }
    }

    let mut stream = reader.into_inner().into_inner();
    stream
        .write_all(response(&request_line, &metrics).as_bytes())
        .await?;
    stream.shutdown().await?;

    Ok(())
}

async fn handle_within(
    stream: TcpStream,
    metrics: Arc<FlowMetrics>,
    limit: Duration,
) -> MetricsResult<()> {
    timeout(limit, handle(stream, metrics)).await?
}

/// Binds the scrape address. Fails early when the address is unusable.
pub async fn bind(settings: &MetricsSettings) -> MetricsResult<TcpListener> {
    let listener = TcpListener::bind(&settings.address).await?;
    info!(
        "Starting Prometheus web server, available at: http://{}{}",
        settings.address, METRICS_PATH
    );
    Ok(listener)
}

/// Serves the registry on `GET /metrics` until the listener fails.
pub async fn serve(listener: TcpListener, metrics: Arc<FlowMetrics>) -> MetricsResult<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("metrics scrape from {}", peer);

        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_within(stream, metrics, SCRAPE_TIMEOUT).await {
                error!("unable to serve metrics to {}: {:?}", peer, e);
            }
        });
    }
}
