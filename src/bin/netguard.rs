use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use structopt::StructOpt;

use netguard::config::Config;
use netguard::detection::DeviceClassifier;
use netguard::input::{CsvLogSource, LogSource};
use netguard::monitor::Monitor;
use netguard::output::{OutputFormat, OutputHandler};
use netguard::prediction::TrendPredictor;

const BANNER: &str = "======================================================================";

/// Network traffic anomaly detection command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "netguard", about = "Network traffic anomaly detection CLI")]
pub enum Cli {
    /// Run trend analysis once and print predictions
    Predict {
        /// Path to configuration file
        #[structopt(short, long, default_value = "netguard.toml")]
        config: PathBuf,
        /// Log file to analyze, overriding the configured one
        #[structopt(short, long)]
        file: Option<PathBuf>,
    },
    /// Monitor the log file continuously until interrupted
    Monitor {
        /// Path to configuration file
        #[structopt(short, long, default_value = "netguard.toml")]
        config: PathBuf,
        /// Log file to watch, overriding the configured one
        #[structopt(short, long)]
        file: Option<PathBuf>,
    },
    /// Interactively run trend analysis followed by continuous monitoring
    Analyze {
        /// Path to configuration file
        #[structopt(short, long, default_value = "netguard.toml")]
        config: PathBuf,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "netguard.toml")]
        output: PathBuf,
    },
    /// Parse and display events from a log file
    Parse {
        /// Path to log file
        #[structopt(short, long)]
        file: PathBuf,
        /// Number of events to show
        #[structopt(short, long, default_value = "10")]
        lines: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Predict { config, file } => {
            let config = with_file_override(load_config(&config)?, file);
            run_predictions(&config)?;
        }
        Cli::Monitor { config, file } => {
            let config = with_file_override(load_config(&config)?, file);
            run_monitor(&config)?;
        }
        Cli::Analyze { config } => {
            let config = load_config(&config)?;
            run_orchestrator(&config)?;
        }
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Parse { file, lines } => {
            if !file.exists() {
                eprintln!("File not found: {:?}", file);
                std::process::exit(1);
            }

            let events = CsvLogSource::new(file).load()?;
            let display_count = std::cmp::min(lines, events.len());

            println!("Parsed {} event(s) (showing {}):\n", events.len(), display_count);
            for event in events.iter().take(display_count) {
                println!(
                    "  Time: {}, Source: {}, Destination: {}, Action: {}, Packets: {}",
                    event.timestamp,
                    event.source(),
                    event.destination(),
                    event.action(),
                    event.packet_count()
                );
            }
        }
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Config::from_file(path)
    } else {
        log::warn!("Config file {:?} not found, using defaults", path);
        Ok(Config::default())
    }
}

fn with_file_override(mut config: Config, file: Option<PathBuf>) -> Config {
    if let Some(file) = file {
        config.input.file_path = file;
    }
    config
}

/// Run the trend predictor once and print its report
fn run_predictions(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}\n   NETWORK PREDICTIVE ANALYSIS\n{}\n", BANNER, BANNER);
    println!("Loading data from: {:?}", config.input.file_path);
    println!(
        "Analysis time: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let table = CsvLogSource::new(config.input.file_path.clone()).load_or_empty();
    if table.is_empty() {
        println!("No data to analyze");
        return Ok(());
    }

    println!("Analyzing {} network events...\n", table.len());

    let predictor = TrendPredictor::with_config(
        DeviceClassifier::new(&config.classification),
        config.detection.clone(),
    );
    let predictions = predictor.predict(&table);

    let mut output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;
    output.write_predictions(&predictions)?;

    println!("\n{}", BANNER);
    println!("Analysis complete! Run again to check for new trends.");
    println!("{}", BANNER);
    Ok(())
}

/// Run the monitor until Ctrl+C
fn run_monitor(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    println!("{}\n   NETWORK ANOMALY DETECTION\n{}\n", BANNER, BANNER);
    println!("Watching file: {:?}", config.input.file_path);
    println!("Check interval: {} seconds\n", config.monitor.check_interval_secs);

    let output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
    )?;
    let source = CsvLogSource::new(config.input.file_path.clone());
    let mut monitor = Monitor::new(source, config, output);
    monitor.run(&running);

    println!("\nMonitoring stopped by user");
    Ok(())
}

/// Ask before running the predictor and then the monitor
fn run_orchestrator(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}\n   COMPLETE NETWORK ANALYSIS\n{}\n", BANNER, BANNER);
    println!("This will run:");
    println!("1. Predictive Analysis (one-time)");
    println!("2. Anomaly Detection (continuous monitoring)\n");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    if !confirm(&mut input, "Run both? (y/n): ")? {
        println!("\nRun the steps individually:");
        println!("  netguard monitor   (for continuous monitoring)");
        println!("  netguard predict   (for one-time prediction)");
        return Ok(());
    }

    println!("\nSTEP 1: Running Predictive Analysis...\n{}", BANNER);
    run_predictions(config)?;

    print!("\n\nPress Enter to start continuous anomaly monitoring...");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;

    println!("\nSTEP 2: Starting Continuous Anomaly Detection...\n{}", BANNER);
    run_monitor(config)
}

fn confirm<R: BufRead>(input: &mut R, prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
