//! Campus Gate CLI
//!
//! Runs one ID-card scan session for the organization described in a
//! configuration file and records the resulting entry or exit.

use campus_gate::{
    campus::{AttendanceDesk, CampusError, CampusStore, OrgId, UserId},
    capture::{VideoError, VideoSource},
    clock::{Clock, MonotonicClock},
    config::{FileConfig, OcrEngine},
    metrics::{MetricsRegistry, MetricsSnapshot},
    ocr::{ScriptedExtractor, TesseractExtractor, TextExtractor},
    preprocess::Preprocessor,
    session::{CancelToken, FrameSampler, ScanSession, Scanner, SessionState, TickOutcome},
};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Scan student ID cards and record campus entry/exit.
#[derive(Debug, Parser)]
#[command(name = "campus-gate", version)]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OCR script for the scripted engine, one read per line.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Give up after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,
}

/// The operator running this station owns the configured organization.
const OPERATOR: UserId = UserId(1);

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    info!("Campus Gate v{}", campus_gate::VERSION);

    let config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => {
            info!("No config file given, using defaults");
            FileConfig::default()
        }
    };

    let (mut store, org) = build_campus(&config)?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let extractor: Box<dyn TextExtractor> = match config.ocr.engine {
        OcrEngine::Scripted => {
            let script = match &args.script {
                Some(path) => ScriptedExtractor::from_file(path)?,
                None => {
                    warn!("No --script given; scripted OCR will read nothing");
                    ScriptedExtractor::new()
                }
            };
            Box::new(script)
        }
        OcrEngine::Tesseract => Box::new(TesseractExtractor::new(
            &config.ocr.tesseract_bin,
            &config.ocr.language,
        )),
    };

    let preprocessor = Preprocessor::new(config.scan.contrast, config.scan.jpeg_quality);
    let sampler = FrameSampler::new(open_source(&config)?, extractor, preprocessor)
        .retain_last_frame(config.scan.retain_last_frame);

    let clock = MonotonicClock::new();
    let mut scanner = Scanner::new(sampler, &clock, config.scan.sample_interval(), cancel);
    let mut session = ScanSession::new(config.scan.recency_window());
    session.start(store.scan_profile(org)?)?;

    let publish = metrics_publisher(config.output.metrics_port)?;

    info!("Scanning... present an ID card (Ctrl-C to stop)");
    let mut desk = AttendanceDesk::new(&mut store, org)?;
    let run = scanner.run_with(&mut session, &mut desk, args.max_ticks, |session, outcome| {
        let now = clock.now();
        publish(&MetricsSnapshot::from_session(session, now));
        if !matches!(outcome, TickOutcome::Skipped) {
            debug!("\n{}", session.status(now));
        }
    });

    if let Some(frame) = scanner.sampler().last_frame() {
        info!(
            width = frame.width(),
            height = frame.height(),
            sequence = frame.sequence(),
            "Last normalized frame retained"
        );
    }

    match session.state() {
        SessionState::Succeeded(receipt) => println!("{}", receipt.message),
        SessionState::Failed(message) => println!("Scan failed: {}", message),
        _ if run.cancelled => info!("Scan cancelled"),
        _ => {
            println!("No card verified after {} ticks", run.ticks);
            println!("{}", session.status(clock.now()));
        }
    }

    let stats = session.stats();
    info!(
        ticks = stats.ticks_started,
        dropped = stats.ticks_dropped,
        failures = stats.sample_failures,
        "Done"
    );
    Ok(())
}

/// Creates the configured organization and loads its roster.
fn build_campus(config: &FileConfig) -> Result<(CampusStore, OrgId), CampusError> {
    let settings = &config.organization;
    let mut store = CampusStore::new();
    let org = store.create_organization(&settings.name, &settings.access_code, OPERATOR)?;

    if !settings.validation_keywords.is_empty() {
        store.configure_organization(
            org,
            OPERATOR,
            settings.validation_keywords.clone(),
            settings.roll_no_length,
        )?;
    } else {
        warn!("No validation keywords configured; keyword check disabled");
        store.set_roll_no_length(org, OPERATOR, settings.roll_no_length)?;
    }

    if !config.students.is_empty() {
        let report = store.import_students(org, Some(OPERATOR), &config.students)?;
        for row in &report.errors {
            warn!(row = row.row, name = %row.name, error = %row.error, "Student row rejected");
        }
    }

    Ok((store, org))
}

fn open_source(config: &FileConfig) -> Result<Box<dyn VideoSource>, VideoError> {
    #[cfg(feature = "camera")]
    let mut source: Box<dyn VideoSource> = Box::new(campus_gate::capture::CameraSource::new());

    #[cfg(not(feature = "camera"))]
    let mut source: Box<dyn VideoSource> = {
        info!("Built without camera support; using synthetic frames");
        Box::new(campus_gate::capture::MockVideoSource::new())
    };

    source.open(&config.capture)?;
    Ok(source)
}

/// Returns a sink for metrics snapshots, serving them over HTTP when a
/// port is configured.
#[cfg(feature = "metrics")]
fn metrics_publisher(port: u16) -> Result<Box<dyn Fn(&MetricsSnapshot)>, Box<dyn Error>> {
    use campus_gate::metrics::{MetricsServer, MetricsServerConfig};

    let registry = MetricsRegistry::new()?;
    if port == 0 {
        return Ok(Box::new(move |snapshot: &MetricsSnapshot| registry.update(snapshot)));
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Failed to start metrics runtime");
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            error!(error = %e, "Metrics server stopped");
        }
    });
    Ok(Box::new(move |snapshot: &MetricsSnapshot| state.update(snapshot)))
}

/// Returns a sink for metrics snapshots.
#[cfg(not(feature = "metrics"))]
fn metrics_publisher(port: u16) -> Result<Box<dyn Fn(&MetricsSnapshot)>, Box<dyn Error>> {
    if port != 0 {
        warn!(port, "Built without the metrics feature; exporter disabled");
    }
    let registry = MetricsRegistry::new()?;
    Ok(Box::new(move |snapshot: &MetricsSnapshot| registry.update(snapshot)))
}
