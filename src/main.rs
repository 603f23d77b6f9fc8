//! Gait Sensor Agent CLI
//!
//! Records a walk, stores it, and asks the verification service who walked.

use clap::{Parser, Subcommand, ValueEnum};
use gait_sensor_agent::{
    audit::{create_shared_log_with_persistence, SharedAuditLog},
    config::Config,
    sensor::{NoopSensor, SensorKind, SensorSource, SimulatedSensor},
    ArchiveBrowser, Outcome, PredictionResult, RecordId, RecordStore, RecordingController,
    RecordingError, StoreError, TransmissionClient, TransmissionConfig, VerificationPipeline,
    CAPTURE_NOTICE, VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gait-sensor")]
#[command(version = VERSION)]
#[command(about = "Gait signature capture and identity verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where sensor readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SensorBackend {
    /// Synthetic walking waveform (hosts without motion hardware)
    Simulated,
    /// No sensors; recording is refused
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a walk, store it, and submit it for verification
    Record {
        /// Stop automatically after this many seconds (default: until Ctrl+C)
        #[arg(long, short)]
        duration: Option<u64>,

        /// Enrollment label for the record (ASCII letters only)
        #[arg(long)]
        label: Option<String>,

        /// Sensor backend
        #[arg(long, value_enum, default_value = "simulated")]
        source: SensorBackend,

        /// Verification endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Response timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Store the record without submitting it
        #[arg(long)]
        no_submit: bool,
    },

    /// List stored walk records
    List,

    /// Show the content of a stored record
    Show {
        /// Record id (e.g. walk_1712345678901)
        id: String,
    },

    /// Submit a stored record for verification
    Submit {
        /// Record id (e.g. walk_1712345678901)
        id: String,

        /// Verification endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Response timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Delete a stored record
    Delete {
        /// Record id (e.g. walk_1712345678901)
        id: String,
    },

    /// Show configuration, storage, and audit statistics
    Status,

    /// Display what is captured and where it goes
    Notice,

    /// Show or update configuration
    Config {
        /// Verification endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Identity the verdict is checked against
        #[arg(long)]
        claimed_user: Option<String>,

        /// Sensor update interval in milliseconds
        #[arg(long)]
        update_interval: Option<u64>,

        /// Response timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            duration,
            label,
            source,
            endpoint,
            timeout,
            no_submit,
        } => {
            cmd_record(duration, label, source, endpoint, timeout, no_submit);
        }
        Commands::List => {
            cmd_list();
        }
        Commands::Show { id } => {
            cmd_show(&id);
        }
        Commands::Submit {
            id,
            endpoint,
            timeout,
        } => {
            cmd_submit(&id, endpoint, timeout);
        }
        Commands::Delete { id } => {
            cmd_delete(&id);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Notice => {
            println!("{CAPTURE_NOTICE}");
        }
        Commands::Config {
            endpoint,
            claimed_user,
            update_interval,
            timeout,
        } => {
            cmd_config(endpoint, claimed_user, update_interval, timeout);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config ({e}); using defaults");
            Config::default()
        }
    }
}

fn cmd_record(
    duration: Option<u64>,
    label: Option<String>,
    source: SensorBackend,
    endpoint: Option<String>,
    timeout: Option<u64>,
    no_submit: bool,
) {
    println!("Gait Sensor Agent v{VERSION}");
    println!("{CAPTURE_NOTICE}");

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let audit = create_shared_log_with_persistence(config.audit_path());
    let store = RecordStore::new(&config.records_path);

    let (accel, gyro): (Box<dyn SensorSource>, Box<dyn SensorSource>) = match source {
        SensorBackend::Simulated => (
            Box::new(SimulatedSensor::new(SensorKind::Accelerometer)),
            Box::new(SimulatedSensor::new(SensorKind::Gyroscope)),
        ),
        SensorBackend::None => (
            Box::new(NoopSensor::new(SensorKind::Accelerometer)),
            Box::new(NoopSensor::new(SensorKind::Gyroscope)),
        ),
    };

    let mut controller = RecordingController::new(accel, gyro, store)
        .with_update_interval(config.update_interval);
    if let Err(e) = controller.set_label(label.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let mut pipeline = VerificationPipeline::new(controller, audit.clone());
    if no_submit {
        println!("  Verification: skipped (--no-submit)");
    } else if let Some(client) = build_client(&config, endpoint, timeout) {
        println!("  Verification endpoint: {}", client.config().endpoint);
        pipeline = pipeline.with_client(client);
    } else {
        println!("  Verification: no endpoint configured, record will only be stored");
    }
    println!("  Update interval: {}ms", config.update_interval.as_millis());
    println!("  Records: {:?}", config.records_path);
    println!();

    if let Err(e) = pipeline.start() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    match duration {
        Some(secs) => println!("Recording for {secs}s... walk normally (Ctrl+C to stop early)"),
        None => println!("Recording... walk normally, press Ctrl+C to stop"),
    }

    let limit = duration.map(Duration::from_secs);
    let started = Instant::now();
    let mut last_tick = 0;
    while running.load(Ordering::SeqCst) {
        if limit.map(|l| started.elapsed() >= l).unwrap_or(false) {
            break;
        }

        let secs = pipeline.controller().duration_secs();
        if secs != last_tick {
            last_tick = secs;
            let counts = pipeline.controller().sample_counts();
            println!(
                "  [{secs:>3}s] {} readings ({} accel, {} gyro)",
                counts.total(),
                counts.accel,
                counts.gyro
            );
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping recording...");
    let result = pipeline.stop();
    save_audit(&audit);

    match result {
        Ok(Some(outcome)) => {
            let counts = outcome.record.counts();
            println!(
                "Saved {} ({} accel, {} gyro readings)",
                outcome.record.id, counts.accel, counts.gyro
            );
            if let Some(prediction) = outcome.prediction {
                report_prediction(&outcome.record.id, &prediction);
            }
        }
        Ok(None) => println!("Recording was not active."),
        Err(RecordingError::EmptySample) => {
            println!("No motion data was captured; nothing was saved.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_list() {
    let config = load_config();
    let browser = ArchiveBrowser::new(RecordStore::new(&config.records_path));

    match browser.list() {
        Ok(ids) if ids.is_empty() => {
            println!("No saved walk records found in {:?}", config.records_path);
            println!("Run 'gait-sensor record' to capture one.");
        }
        Ok(ids) => {
            println!("Saved walk records ({}):", ids.len());
            for id in ids {
                let created = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(
                    id.created_at_ms(),
                )
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default();
                match id.label() {
                    Some(label) => println!("  {id}  {created}  [{label}]"),
                    None => println!("  {id}  {created}"),
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_show(id: &str) {
    let config = load_config();
    let id = parse_id(id);
    let browser = ArchiveBrowser::new(RecordStore::new(&config.records_path));

    match browser.view(&id) {
        Ok(view) => {
            println!("Record: {}", view.id);
            match view.counts() {
                Some(counts) => println!(
                    "Readings: {} ({} accel, {} gyro)",
                    counts.total(),
                    counts.accel,
                    counts.gyro
                ),
                None => {
                    if let Err(ref e) = view.readings {
                        eprintln!("Warning: {e}");
                    }
                }
            }
            println!();
            println!("{}", view.pretty());
        }
        Err(e) => exit_store_error(e),
    }
}

fn cmd_submit(id: &str, endpoint: Option<String>, timeout: Option<u64>) {
    let config = load_config();
    let id = parse_id(id);

    let Some(client) = build_client(&config, endpoint, timeout) else {
        eprintln!("Error: No verification endpoint configured.");
        eprintln!("Pass --endpoint or run 'gait-sensor config --endpoint <URL>'.");
        std::process::exit(1);
    };

    let audit = create_shared_log_with_persistence(config.audit_path());
    let browser = ArchiveBrowser::new(RecordStore::new(&config.records_path)).with_client(client);

    match browser.resubmit(&id) {
        Ok(prediction) => {
            audit.record_submission(&prediction);
            save_audit(&audit);
            report_prediction(&id, &prediction);
        }
        Err(e) => exit_store_error(e),
    }
}

fn cmd_delete(id: &str) {
    let config = load_config();
    let id = parse_id(id);
    let browser = ArchiveBrowser::new(RecordStore::new(&config.records_path));

    match browser.delete(&id) {
        Ok(()) => println!("Deleted {id}"),
        Err(e) => exit_store_error(e),
    }
}

fn cmd_status() {
    let config = load_config();

    println!("Gait Sensor Agent Status");
    println!("========================");
    println!();

    println!("Configuration:");
    println!(
        "  Endpoint: {}",
        config.endpoint.as_deref().unwrap_or("(not configured)")
    );
    println!(
        "  Claimed user: {}",
        config.claimed_user.as_deref().unwrap_or("(any enrolled user)")
    );
    println!("  Update interval: {}ms", config.update_interval.as_millis());
    println!("  Request timeout: {}s", config.request_timeout.as_secs());
    println!();

    let store = RecordStore::new(&config.records_path);
    match store.list() {
        Ok(ids) => println!("Stored records: {} in {:?}", ids.len(), config.records_path),
        Err(e) => println!("Stored records: unavailable ({e})"),
    }
    println!();

    if config.audit_path().exists() {
        let audit = create_shared_log_with_persistence(config.audit_path());
        println!("{}", audit.summary());
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config(
    endpoint: Option<String>,
    claimed_user: Option<String>,
    update_interval: Option<u64>,
    timeout: Option<u64>,
) {
    let mut config = load_config();
    let changed = endpoint.is_some()
        || claimed_user.is_some()
        || update_interval.is_some()
        || timeout.is_some();

    if let Some(endpoint) = endpoint {
        config.endpoint = if endpoint.is_empty() {
            None
        } else {
            Some(endpoint)
        };
    }
    if let Some(user) = claimed_user {
        config.claimed_user = if user.is_empty() { None } else { Some(user) };
    }
    if let Some(ms) = update_interval {
        config.update_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = timeout {
        config.request_timeout = Duration::from_secs(secs);
    }

    if changed {
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Configuration updated.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Build a transmission client from config plus per-invocation overrides.
fn build_client(
    config: &Config,
    endpoint: Option<String>,
    timeout: Option<u64>,
) -> Option<TransmissionClient> {
    let effective = Config {
        endpoint: endpoint.or_else(|| config.endpoint.clone()),
        request_timeout: timeout
            .map(Duration::from_secs)
            .unwrap_or(config.request_timeout),
        ..config.clone()
    };
    if let Err(e) = effective.validate() {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let transmission = TransmissionConfig::new(effective.endpoint?)
        .with_timeout(effective.request_timeout)
        .with_claimed_user(effective.claimed_user);

    http_client(transmission)
}

#[cfg(feature = "http")]
fn http_client(config: TransmissionConfig) -> Option<TransmissionClient> {
    match TransmissionClient::http(config) {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Warning: HTTP client initialization failed: {e}");
            None
        }
    }
}

#[cfg(not(feature = "http"))]
fn http_client(_config: TransmissionConfig) -> Option<TransmissionClient> {
    eprintln!("Warning: verification disabled (http feature not enabled at compile time)");
    None
}

fn report_prediction(id: &RecordId, prediction: &PredictionResult) {
    println!();
    match prediction.outcome {
        Outcome::Authorized => println!("✅ Access Granted: {prediction}"),
        Outcome::Denied => println!("⛔ Access Denied: {prediction}"),
        Outcome::Error => {
            println!("❌ Verification failed: {prediction}");
            println!("The record was kept. Retry with: gait-sensor submit {id}");
        }
    }
}

fn parse_id(id: &str) -> RecordId {
    match RecordId::parse(id) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

fn exit_store_error(e: StoreError) -> ! {
    match e {
        StoreError::NotFound(id) => {
            eprintln!("Error: No record named {id}. Run 'gait-sensor list' to see saved records.");
        }
        other => eprintln!("Error: {other}"),
    }
    std::process::exit(1);
}

fn save_audit(audit: &SharedAuditLog) {
    if let Err(e) = audit.save() {
        eprintln!("Warning: Could not save audit log: {e}");
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not install Ctrl+C handler: {e}");
    }
}
