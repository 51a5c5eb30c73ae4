use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task;

use crate::config::{ConfigCache, ConfigErr};
use crate::enricher::FlowEnricher;
use crate::importers;
use crate::metrics::{self, FlowMetrics, MetricsError, Observe};
use crate::pipeline::{self, StdoutSink};
use crate::settings::{Configuration, ConstructorErr};

const INGESTION_BUFFER: usize = 1024;

pub struct ApplicationState {
    pub config_cache: ConfigCache,
    pub config: Configuration,
}

#[derive(Debug)]
pub enum AppInitErr {
    Config(ConfigErr),
    Components(ConstructorErr),
    Metrics(MetricsError),
}

async fn wait_for_termination() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

impl ApplicationState {
    pub fn new(config_cache: ConfigCache, config: Configuration) -> Self {
        Self {
            config_cache,
            config,
        }
    }

    pub async fn init_components(self) -> Result<(), AppInitErr> {
        let config = self.config;
        debug!("components configured from: [{}]", self.config_cache.config_path());

        // lookup services and local addresses are fixed for the lifetime of the process
        let resolver = config
            .geo
            .construct_resolver()
            .map_err(AppInitErr::Components)?;

        let local_addresses = config
            .local_addresses
            .construct_local_addresses()
            .map_err(AppInitErr::Components)?;
        if local_addresses.is_empty() {
            warn!("no local addresses known, every flow will be unattributable");
        }

        let flow_metrics = Arc::new(FlowMetrics::new().map_err(AppInitErr::Metrics)?);

        // start prometheus on /metrics, an unusable address aborts startup
        let listener = metrics::bind(&config.metrics)
            .await
            .map_err(AppInitErr::Metrics)?;
        let server_metrics = flow_metrics.clone();
        let metrics_task = task::spawn(async move {
            if let Err(e) = metrics::serve(listener, server_metrics).await {
                error!("metrics server stopped: {:?}", e);
            }
        });

        let (importer, collector) = config
            .importer
            .source
            .construct_importer(config.importer.settings)
            .map_err(AppInitErr::Components)?;

        // lines travel in order from the importer to the single ingestion worker
        let (tx, mut rx) = mpsc::channel::<String>(INGESTION_BUFFER);

        let importer_task = task::spawn(importers::run(importer, tx));

        let enricher = FlowEnricher::new(resolver, local_addresses);
        let observer: Arc<dyn Observe> = flow_metrics;
        let mut worker = task::spawn(async move {
            let mut sink = StdoutSink;
            pipeline::run(enricher, observer, &mut rx, &mut sink).await
        });

        // wait a reason to exit
        let worker_finished = tokio::select! {
            result = wait_for_termination() => {
                match result {
                    Ok(()) => info!("term received, shutting down..."),
                    Err(e) => error!("unable to listen for termination signals: {}", e),
                }
                false
            }
            result = &mut worker => {
                if let Err(e) = result {
                    error!("ingestion worker failed: {}", e);
                }
                true
            }
        };

        match collector {
            Some(collector) => {
                if let Err(e) = collector.shutdown().await {
                    error!("unable to stop collector: {:?}", e);
                }
                if let Err(e) = importer_task.await {
                    error!("importer failed: {}", e);
                }
            }
            // nothing closes stdin for us
            None => importer_task.abort(),
        }

        if !worker_finished {
            if let Err(e) = worker.await {
                error!("ingestion worker failed: {}", e);
            }
        }

        metrics_task.abort();
        info!("finished!");
        Ok(())
    }
}

pub fn init_config(config_path: &str) -> Result<(ConfigCache, Configuration), AppInitErr> {
    let config_cache = ConfigCache::new(config_path).map_err(AppInitErr::Config)?;
    let configuration = config_cache
        .get_config::<Configuration>()
        .map_err(AppInitErr::Config)?;
    info!("loaded configuration from: [{}]", config_cache.config_path());

    Ok((config_cache, configuration))
}
