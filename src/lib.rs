pub mod application_state;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod enricher;
pub mod flow;
pub mod importers;
pub mod metrics;
pub mod peers;
pub mod pipeline;
pub mod settings;
