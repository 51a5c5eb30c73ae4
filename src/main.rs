use clap::Parser;
use log::info;

use geoflow::application_state::{init_config, ApplicationState};
use geoflow::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Setup logger
    let env = env_logger::Env::default().default_filter_or(args.log_filter());
    env_logger::init_from_env(env);

    info!("Starting application");

    let (config_cache, config) = init_config(&args.config).expect("Configuration init failed");
    let app_state = ApplicationState::new(config_cache, config);

    if let Err(e) = app_state.init_components().await {
        panic!("Components init error: {:?}", e);
    }
}
