mod cli;
use cli::{USAGE, parse_cli_mode, run};

use clinic_agenda::storage::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    setup_logging();

    let mode = match parse_cli_mode() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return;
        }
    };

    tracing::info!("Running {:?}", mode);

    if let Err(e) = run(mode).await {
        eprintln!("Error: {:#}", e);
        tracing::error!("clinic-agenda failed: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "clinic-agenda.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("clinic-agenda started");
}
