use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use netguard::config::Config;
use netguard::input::CsvLogSource;
use netguard::monitor::Monitor;
use netguard::output::{OutputFormat, OutputHandler};

/// Continuous anomaly monitor
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting netguard monitor...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("netguard.toml"));

    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        log::warn!("Config file not found, using defaults");
        Config::default()
    };

    // Setup graceful shutdown signal handling
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, stopping monitor...");
        r.store(false, Ordering::SeqCst);
    })?;

    let output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;

    log::info!("Watching file: {:?}", config.input.file_path);
    log::info!("Check interval: {} seconds", config.monitor.check_interval_secs);
    log::info!("IT devices: {}", config.classification.it_devices.join(", "));
    log::info!("Protected servers: {}", config.classification.servers.join(", "));
    log::info!("Monitor running. Press Ctrl+C to stop.");

    let source = CsvLogSource::new(config.input.file_path.clone());
    let mut monitor = Monitor::new(source, &config, output);
    monitor.run(&running);

    log::info!("Netguard monitor stopped");
    Ok(())
}
