//! Shake CLI - Command-line interface for shake-sos
//!
//! Commands:
//! - run: Detect shakes in a live NDJSON motion stream on stdin
//! - replay: Detect shakes in a recorded motion file (batch mode)
//! - voice: Match trigger phrases in transcript lines on stdin
//! - validate: Validate motion record schema
//! - doctor: Diagnose configuration and environment
//! - schema: Print wire format information

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use shake_sos::alert::{
    ClipboardChannel, Contact, GeoPoint, ShareChain, ShareReceipt, ShareRequest, SmsLinkChannel,
};
use shake_sos::config::{Settings, ShakeConfig, TimeoutPolicy};
use shake_sos::permission::{ensure_permission, AmbientPermission};
use shake_sos::schema::{
    format_timestamp_ms, MotionEventAdapter, ShakeEventRecord, EVENT_SCHEMA_VERSION,
    SCHEMA_VERSION,
};
use shake_sos::sensor::ReaderSource;
use shake_sos::trigger::{SosActivation, TriggerGate, TriggerSource};
use shake_sos::voice::PhraseMatcher;
use shake_sos::{ShakeDetector, ShakeError, ShakeListener, PRODUCER_NAME, SHAKE_SOS_VERSION};

/// Shake - shake-gesture detection for personal-safety apps
#[derive(Parser)]
#[command(name = "shake")]
#[command(author = "SafeGuard Contributors")]
#[command(version = SHAKE_SOS_VERSION)]
#[command(about = "Detect deliberate shake gestures in accelerometer data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect shakes in a live NDJSON motion stream on stdin (streaming mode)
    Run {
        #[command(flatten)]
        detector: DetectorArgs,

        #[command(flatten)]
        sos: SosArgs,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Detect shakes in a recorded motion file (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Match trigger phrases in transcript lines on stdin
    Voice {
        /// Settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trigger phrase (repeatable; replaces the configured list)
        #[arg(long = "phrase")]
        phrases: Vec<String>,

        #[command(flatten)]
        sos: SosArgs,
    },

    /// Validate motion record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Settings file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Args)]
struct DetectorArgs {
    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Jolt threshold (delta-acceleration magnitude)
    #[arg(long)]
    threshold: Option<f64>,

    /// Gesture timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Which gap abandons a partial gesture
    #[arg(long, value_enum)]
    timeout_policy: Option<PolicyArg>,
}

#[derive(Args)]
struct SosArgs {
    /// Gate triggers through the SOS cooldown and emit alert records
    #[arg(long)]
    sos: bool,

    /// Last known latitude for the alert message
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Last known longitude for the alert message
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Last known altitude in meters
    #[arg(long, allow_hyphen_values = true)]
    alt: Option<f64>,

    /// Emergency contact as PHONE or NAME=PHONE (repeatable)
    #[arg(long = "contact")]
    contacts: Vec<String>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one shake event per line)
    Ndjson,
    /// JSON array of shake events
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (motion.sample.v1)
    Input,
    /// Output schema (shake.event.v1)
    Output,
}

#[derive(Clone, ValueEnum)]
enum PolicyArg {
    SampleGap,
    SampleOrJoltGap,
}

impl From<PolicyArg> for TimeoutPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::SampleGap => TimeoutPolicy::SampleGap,
            PolicyArg::SampleOrJoltGap => TimeoutPolicy::SampleOrJoltGap,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ShakeCliError> {
    match cli.command {
        Commands::Run {
            detector,
            sos,
            flush,
        } => cmd_run(&detector, &sos, flush),

        Commands::Replay {
            input,
            input_format,
            output_format,
            detector,
        } => cmd_replay(&input, input_format, output_format, &detector),

        Commands::Voice {
            config,
            phrases,
            sos,
        } => cmd_voice(config.as_deref(), phrases, &sos),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_run(detector: &DetectorArgs, sos: &SosArgs, flush: bool) -> Result<(), ShakeCliError> {
    let settings = load_settings(detector.config.as_deref())?;
    let config = detector_config(&settings, detector);
    ensure_permission(&AmbientPermission)?;

    let dispatcher = if sos.sos {
        Some(SosDispatcher::new(&settings, sos))
    } else {
        None
    };

    let sink = Arc::new(Mutex::new(RunSink {
        stdout: io::stdout(),
        dispatcher,
        flush,
        error: None,
    }));
    let handler_sink = Arc::clone(&sink);

    let mut listener = ShakeListener::new(ReaderSource::stdin(), config, move |event| {
        let mut sink = match handler_sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if sink.error.is_some() {
            return;
        }
        if let Err(e) = sink.emit(ShakeEventRecord::from_event(event.clone())) {
            warn!("Failed to write shake event: {:?}", e);
            sink.error = Some(e);
        }
    })?;

    listener.wait();

    let error = match sink.lock() {
        Ok(mut guard) => guard.error.take(),
        Err(poisoned) => poisoned.into_inner().error.take(),
    };
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn cmd_replay(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    detector: &DetectorArgs,
) -> Result<(), ShakeCliError> {
    let settings = load_settings(detector.config.as_deref())?;
    let config = detector_config(&settings, detector);

    let input_data = read_input(input)?;
    let events = match input_format {
        InputFormat::Ndjson => MotionEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => MotionEventAdapter::parse_array(&input_data)?,
    };

    if events.is_empty() {
        return Err(ShakeCliError::NoReadings);
    }

    let readings = MotionEventAdapter::to_readings(&events)?;
    let mut shake_detector = ShakeDetector::new(config);
    let summary = MotionEventAdapter::replay(&mut shake_detector, &readings);

    info!(
        "Replayed {} readings ({} discarded), {} shakes detected",
        summary.readings,
        summary.discarded,
        summary.events.len()
    );

    let records: Vec<ShakeEventRecord> = summary
        .events
        .into_iter()
        .map(ShakeEventRecord::from_event)
        .collect();

    print!("{}", format_output(&records, &output_format)?);
    Ok(())
}

fn cmd_voice(
    config: Option<&Path>,
    phrases: Vec<String>,
    sos: &SosArgs,
) -> Result<(), ShakeCliError> {
    let settings = load_settings(config)?;
    let mut voice = settings.voice.clone();
    if !phrases.is_empty() {
        voice.trigger_phrases = phrases;
    }
    let mut matcher = PhraseMatcher::new(&voice).map_err(ShakeError::from)?;
    let mut dispatcher = if sos.sos {
        Some(SosDispatcher::new(&settings, sos))
    } else {
        None
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        let Some(phrase) = matcher.feed(&[line.as_str()], now_ms) else {
            continue;
        };

        let record = PhraseRecord {
            phrase,
            detected_at: format_timestamp_ms(now_ms),
        };
        writeln!(stdout, "{}", serde_json::to_string(&record)?)?;

        if let Some(dispatcher) = dispatcher.as_mut() {
            if let Some(alert) = dispatcher.trigger(TriggerSource::Voice, now_ms) {
                writeln!(stdout, "{}", serde_json::to_string(&alert)?)?;
            }
        }
        stdout.flush()?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), ShakeCliError> {
    let input_data = read_input(input)?;

    let events = match input_format {
        InputFormat::Ndjson => MotionEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => MotionEventAdapter::parse_array(&input_data)?,
    };

    let results = MotionEventAdapter::validate_events(&events);

    let report = ValidationReport {
        total_records: events.len(),
        valid_records: events.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                timestamp_ms: r.timestamp_ms,
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record at {}ms (index {}): {}",
                    err.timestamp_ms, err.index, err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(ShakeCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), ShakeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("shake-sos version {}", SHAKE_SOS_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input: {}, output: {}", SCHEMA_VERSION, EVENT_SCHEMA_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Settings file does not exist; defaults apply".to_string(),
        }),
        Some(path) => {
            let check = match fs::read_to_string(path) {
                Ok(content) => match Settings::from_json(&content) {
                    Ok(settings) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Settings valid (threshold {}, timeout {}ms, cooldown {}ms)",
                            settings.shake.threshold,
                            settings.shake.timeout_ms,
                            settings.sos.cooldown_ms
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid settings: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read settings file: {}", e),
                },
            };
            checks.push(check);
        }
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No settings file; defaults apply".to_string(),
        }),
    }

    checks.push(match ensure_permission(&AmbientPermission) {
        Ok(state) => DoctorCheck {
            name: "motion_permission".to_string(),
            status: CheckStatus::Ok,
            message: format!("Motion access: {:?}", state),
        },
        Err(e) => DoctorCheck {
            name: "motion_permission".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a TTY; pipe motion records in for `shake run`".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SHAKE_SOS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Shake Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ShakeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), ShakeCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One accelerometer reading per record:");
                println!();
                println!("- schema_version: optional, defaults to {}", SCHEMA_VERSION);
                println!("- timestamp_ms: reading time, Unix epoch milliseconds");
                println!("- x, y, z: acceleration including gravity (m/s²); null when unknown");
                println!("- sensor: native_accelerometer, device_motion, replay, or any label");
                println!("- device_id: optional");
                println!();
                println!("Readings with a null or non-finite axis are skipped by the detector.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", EVENT_SCHEMA_VERSION);
                println!();
                println!("One record per detected shake:");
                println!();
                println!("- schema_version: {}", EVENT_SCHEMA_VERSION);
                println!("- detected_at: RFC 3339 time of the completing jolt");
                println!("- event_id: UUID v4");
                println!("- sequence: 1-based count of shakes from this detector");
                println!("- detected_at_ms, gesture_started_at_ms: epoch milliseconds");
                println!("- jolt_magnitudes: magnitude of each counted jolt");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_settings(path: Option<&Path>) -> Result<Settings, ShakeCliError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(Settings::from_json(&content)?)
        }
        None => Ok(Settings::default()),
    }
}

fn detector_config(settings: &Settings, args: &DetectorArgs) -> ShakeConfig {
    let mut config = settings.shake.clone();
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(policy) = args.timeout_policy.clone() {
        config = config.with_timeout_policy(policy.into());
    }
    config
}

fn read_input(input: &Path) -> Result<String, ShakeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output(
    records: &[ShakeEventRecord],
    format: &OutputFormat,
) -> Result<String, ShakeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

fn parse_contact(raw: &str) -> Contact {
    match raw.split_once('=') {
        Some((name, phone)) => Contact::new(name.trim(), phone.trim()),
        None => Contact::new(raw.trim(), raw.trim()),
    }
}

/// Streaming output shared with the listener's delivery thread
struct RunSink {
    stdout: io::Stdout,
    dispatcher: Option<SosDispatcher>,
    flush: bool,
    error: Option<ShakeCliError>,
}

impl RunSink {
    fn emit(&mut self, record: ShakeEventRecord) -> Result<(), ShakeCliError> {
        let detected_at_ms = record.event.detected_at_ms;
        writeln!(self.stdout, "{}", serde_json::to_string(&record)?)?;

        if let Some(dispatcher) = self.dispatcher.as_mut() {
            if let Some(alert) = dispatcher.trigger(TriggerSource::Shake, detected_at_ms) {
                writeln!(self.stdout, "{}", serde_json::to_string(&alert)?)?;
            }
        }

        if self.flush {
            self.stdout.flush()?;
        }
        Ok(())
    }
}

/// Gate, compose, and share an SOS alert
struct SosDispatcher {
    gate: TriggerGate,
    location: Option<GeoPoint>,
    contacts: Vec<Contact>,
    chain: ShareChain,
}

impl SosDispatcher {
    fn new(settings: &Settings, args: &SosArgs) -> Self {
        let location = match (args.lat, args.lon) {
            (Some(lat), Some(lon)) => {
                let point = GeoPoint::new(lat, lon);
                Some(match args.alt {
                    Some(alt) => point.with_altitude(alt),
                    None => point,
                })
            }
            _ => None,
        };

        // Links go to stderr for whatever opens them; the alert record
        // itself goes to stdout
        let chain = ShareChain::new()
            .with_channel(SmsLinkChannel::new(io::stderr()))
            .with_channel(ClipboardChannel::new(io::stderr()));

        Self {
            gate: TriggerGate::from_config(&settings.sos),
            location,
            contacts: args.contacts.iter().map(|c| parse_contact(c)).collect(),
            chain,
        }
    }

    fn trigger(&mut self, source: TriggerSource, now_ms: i64) -> Option<SosRecord> {
        let activation = self.gate.trigger(source, now_ms)?;
        let request = ShareRequest::sos(self.location.as_ref());

        let share = match self.chain.dispatch(&request, &self.contacts) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                warn!("SOS alert was not shared: {}", e);
                None
            }
        };

        Some(SosRecord {
            record_type: "sos_activation",
            activated_at: format_timestamp_ms(activation.activated_at_ms),
            activation,
            message: request.text,
            share,
        })
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "motion.sample.v1",
        "title": "motion.sample.v1",
        "description": "One accelerometer reading",
        "type": "object",
        "required": ["timestamp_ms"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": SCHEMA_VERSION
            },
            "timestamp_ms": { "type": "integer" },
            "x": { "type": ["number", "null"] },
            "y": { "type": ["number", "null"] },
            "z": { "type": ["number", "null"] },
            "sensor": { "type": "string" },
            "device_id": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "shake.event.v1",
        "title": "shake.event.v1",
        "description": "A detected shake gesture",
        "type": "object",
        "required": [
            "schema_version", "detected_at", "event_id", "sequence",
            "detected_at_ms", "gesture_started_at_ms", "jolt_magnitudes"
        ],
        "properties": {
            "schema_version": { "type": "string", "const": EVENT_SCHEMA_VERSION },
            "detected_at": { "type": "string", "format": "date-time" },
            "event_id": { "type": "string", "format": "uuid" },
            "sequence": { "type": "integer", "minimum": 1 },
            "detected_at_ms": { "type": "integer" },
            "gesture_started_at_ms": { "type": "integer" },
            "jolt_magnitudes": {
                "type": "array",
                "items": { "type": "number" }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum ShakeCliError {
    Io(io::Error),
    Shake(ShakeError),
    Json(serde_json::Error),
    NoReadings,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for ShakeCliError {
    fn from(e: io::Error) -> Self {
        ShakeCliError::Io(e)
    }
}

impl From<ShakeError> for ShakeCliError {
    fn from(e: ShakeError) -> Self {
        ShakeCliError::Shake(e)
    }
}

impl From<serde_json::Error> for ShakeCliError {
    fn from(e: serde_json::Error) -> Self {
        ShakeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ShakeCliError> for CliError {
    fn from(e: ShakeCliError) -> Self {
        match e {
            ShakeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ShakeCliError::Shake(ShakeError::Config(e)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'shake doctor --config <file>' to check settings".to_string()),
            },
            ShakeCliError::Shake(e @ (ShakeError::PermissionDenied | ShakeError::Unsupported)) => {
                CliError {
                    code: "SENSOR_UNAVAILABLE".to_string(),
                    message: e.to_string(),
                    hint: Some("Grant motion access and retry".to_string()),
                }
            }
            ShakeCliError::Shake(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", SCHEMA_VERSION)),
            },
            ShakeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ShakeCliError::NoReadings => CliError {
                code: "NO_READINGS".to_string(),
                message: "No motion records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ShakeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            ShakeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    timestamp_ms: i64,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

// Output records

#[derive(serde::Serialize)]
struct PhraseRecord {
    phrase: String,
    detected_at: String,
}

#[derive(serde::Serialize)]
struct SosRecord {
    record_type: &'static str,
    activated_at: String,
    #[serde(flatten)]
    activation: SosActivation,
    message: String,
    share: Option<ShareReceipt>,
}
