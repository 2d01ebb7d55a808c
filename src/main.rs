use std::env;
use std::process;
use termvec_trainer::Pipeline;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {

    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

    info!("entering program...");
    let args: Vec<String> = env::args().collect();
    if let Err(e) = Pipeline::run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
