use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::Receiver;
use tokio::task;
use tokio::time::Duration;

use crate::enricher::FlowEnricher;
use crate::flow::is_flow_record;
use crate::metrics::Observe;

const REPORT_INTERVAL_SECS: u64 = 10;

/// Destination for lines that are not flow records.
pub trait DiagnosticSink: Send {
    fn forward(&mut self, line: &str);
}

/// Prints forwarded lines verbatim on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn forward(&mut self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", line) {
            warn!("unable to forward diagnostic line: {}", e);
        }
    }
}

/// Handles a single line. Returns `true` when a flow reached the aggregator.
pub fn process_line(
    line: &str,
    enricher: &FlowEnricher,
    observer: &dyn Observe,
    sink: &mut dyn DiagnosticSink,
) -> bool {
    if !is_flow_record(line) {
        sink.forward(line);
        return false;
    }

    match enricher.enrich(line) {
        Ok(flow) => {
            debug!("{:?}", flow);
            observer.observe(&flow);
            true
        }
        Err(e) => {
            warn!("discarding flow record: {}", e);
            observer.reject(&e);
            false
        }
    }
}

/// Ingestion worker. Consumes lines sequentially until the channel closes.
pub async fn run(
    enricher: FlowEnricher,
    observer: Arc<dyn Observe>,
    rx: &mut Receiver<String>,
    sink: &mut dyn DiagnosticSink,
) {
    info!("Spawned ingestion worker...");

    let current = Arc::new(AtomicU64::new(0));
    let current_clone = current.clone();
    let timer = task::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(REPORT_INTERVAL_SECS));
        interval.tick().await;

        loop {
            interval.tick().await;
            let processed = current_clone.swap(0, Ordering::Relaxed);
            info!(
                "Aggregating flows with a speed of: {} flows per second",
                processed / REPORT_INTERVAL_SECS
            );
        }
    });

    while let Some(line) = rx.recv().await {
        if process_line(&line, &enricher, observer.as_ref(), sink) {
            current.fetch_add(1, Ordering::Relaxed);
        }
    }

    timer.abort();
    info!("Closing ingestion worker...");
}
