//! MoodTrace CLI - Command-line interface for observation log analysis
//!
//! Commands:
//! - analyze: Full report (correlations, alerts, aggregates)
//! - correlate: Stimulus → mood correlations only
//! - alerts: Pattern alerts only
//! - stats: Quick statistics only
//! - validate: Validate persisted records
//! - doctor: Diagnose configuration and environment
//! - schema: Print record and report schemas

use chrono::{DateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use moodtrace::schema::{RawRecord, RawRecordAdapter, SCHEMA_VERSION};
use moodtrace::{AnalysisConfig, AnalysisError, Analyzer, MOODTRACE_VERSION, PRODUCER_NAME};

/// MoodTrace - behavioral pattern analysis over observation logs
#[derive(Parser)]
#[command(name = "moodtrace")]
#[command(version = MOODTRACE_VERSION)]
#[command(about = "Correlate sensory inputs with moods and flag recurring patterns", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full analysis pass and print the report
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print stimulus → mood correlations
    Correlate {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print pattern alerts
    Alerts {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print quick statistics
    Stats {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate persisted records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Timezone for naive timestamps (IANA format, e.g., "Europe/Berlin")
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or report)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

/// Input and configuration shared by the analysis commands
#[derive(Args)]
struct SourceArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured timezone (IANA format)
    #[arg(long)]
    timezone: Option<String>,

    /// Override the correlation and alert window in milliseconds
    #[arg(long)]
    window_ms: Option<i64>,

    /// Reference time (RFC 3339 or epoch milliseconds); defaults to the current time
    #[arg(long)]
    now: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (moodtrace.record.v1)
    Input,
    /// Analysis report
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

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

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), MoodtraceCliError> {
    match cli.command {
        Commands::Analyze {
            source,
            output_format,
        } => {
            let (analyzer, records, now) = load_source(&source)?;
            let report = analyzer.analyze(&records, now);
            print_output(&report, &output_format)
        }

        Commands::Correlate {
            source,
            output_format,
        } => {
            let (analyzer, records, _) = load_source(&source)?;
            let sequence = analyzer.sequence(&records);
            print_output(&analyzer.correlations(&sequence), &output_format)
        }

        Commands::Alerts {
            source,
            output_format,
        } => {
            let (analyzer, records, now) = load_source(&source)?;
            let sequence = analyzer.sequence(&records);
            print_output(&analyzer.alerts(&sequence, now), &output_format)
        }

        Commands::Stats {
            source,
            output_format,
        } => {
            let (analyzer, records, now) = load_source(&source)?;
            let sequence = analyzer.sequence(&records);
            print_output(&analyzer.reporter().quick_stats(&sequence, now), &output_format)
        }

        Commands::Validate {
            input,
            input_format,
            timezone,
            json,
        } => cmd_validate(&input, input_format, &timezone, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

/// Read records, build the analyzer and resolve `now`
fn load_source(
    source: &SourceArgs,
) -> Result<(Analyzer, Vec<RawRecord>, DateTime<Utc>), MoodtraceCliError> {
    let mut config = match &source.config {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    if let Some(timezone) = &source.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(window_ms) = source.window_ms {
        config.window_ms = window_ms;
    }

    let analyzer = Analyzer::new(config)?;
    let records = read_records(&source.input, &source.input_format)?;
    let now = match &source.now {
        Some(text) => parse_now(text)?,
        None => Utc::now(),
    };

    tracing::info!(records = records.len(), %now, "loaded input");
    Ok((analyzer, records, now))
}

fn read_records(input: &Path, format: &InputFormat) -> Result<Vec<RawRecord>, MoodtraceCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format {
        InputFormat::Json => RawRecordAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => RawRecordAdapter::parse_ndjson(&input_data)?,
    };
    Ok(records)
}

fn parse_now(text: &str) -> Result<DateTime<Utc>, MoodtraceCliError> {
    let trimmed = text.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| MoodtraceCliError::InvalidNow(text.to_string()));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MoodtraceCliError::InvalidNow(text.to_string()))
}

fn print_output<T: Serialize>(value: &T, format: &OutputFormat) -> Result<(), MoodtraceCliError> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", output);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    timezone: &str,
    json: bool,
) -> Result<(), MoodtraceCliError> {
    let config = AnalysisConfig {
        timezone: timezone.to_string(),
        ..Default::default()
    };
    let analyzer = Analyzer::new(config)?;
    let records = read_records(input, &input_format)?;

    let results = RawRecordAdapter::validate_records(&records, analyzer.normalizer());

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                record_id: r.record_id.clone(),
                error: r.error.to_string(),
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
                    "  - Record {} (index {}): {}",
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(MoodtraceCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), MoodtraceCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("MoodTrace version {}", MOODTRACE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    // Config file, and the timezone it names (or the default)
    let timezone = match config {
        Some(path) if path.exists() => match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AnalysisConfig>(&content) {
                Ok(parsed) => {
                    let (status, message) = match parsed.validate() {
                        Ok(()) => (
                            CheckStatus::Ok,
                            format!("Configuration valid (window {} ms)", parsed.window_ms),
                        ),
                        Err(AnalysisError::InvalidTimezone(_)) => (
                            CheckStatus::Ok,
                            "Configuration parsed; timezone checked below".to_string(),
                        ),
                        Err(e) => (CheckStatus::Error, e.to_string()),
                    };
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status,
                        message,
                    });
                    Some(parsed.timezone)
                }
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid configuration JSON: {}", e),
                    });
                    None
                }
            },
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read configuration file: {}", e),
                });
                None
            }
        },
        Some(_) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist; defaults apply".to_string(),
            });
            Some(AnalysisConfig::default().timezone)
        }
        None => Some(AnalysisConfig::default().timezone),
    };

    if let Some(timezone) = timezone {
        let probe = AnalysisConfig {
            timezone: timezone.clone(),
            ..Default::default()
        };
        checks.push(match probe.tz() {
            Ok(_) => DoctorCheck {
                name: "timezone".to_string(),
                status: CheckStatus::Ok,
                message: format!("Timezone {} is recognized", timezone),
            },
            Err(e) => DoctorCheck {
                name: "timezone".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        });
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (use --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MOODTRACE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("MoodTrace Doctor Report");
        println!("=======================");
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
        Err(MoodtraceCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), MoodtraceCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Each record is a mood log or a sensory (stimulus) log:");
                println!();
                println!("- id: number or string (legacy records use epoch ms here)");
                println!("- kind: \"mood\" | \"stimulus\" (alias: type; \"sensory\" accepted)");
                println!("- mood: Happy | Sad | Angry | Anxious (mood records)");
                println!("- category: Visual | Auditory | Tactile | Olfactory | Gustatory |");
                println!("            Vestibular | Proprioception (alias: sensoryType)");
                println!("- intensity: Low | Medium | High (stimulus records)");
                println!("- timestamp: epoch ms or date string (RFC 3339, RFC 2822, naive ISO)");
                println!("- note: optional free text");
                println!();
                println!("Instant resolution: timestamp, then the id (epoch ms or date string).");
            }
        }
        SchemaType::Report => {
            if json_schema {
                println!("{}", get_report_json_schema());
            } else {
                println!("Analysis report");
                println!();
                println!("- generated_at: reference time of the pass");
                println!("- window_ms, total_events");
                println!("- correlations: [{{ stimulus_category, mood_label, occurrence_count }}]");
                println!("- alerts: [{{ severity, rule, message, generated_at }}]");
                println!("- mood_distribution, stimulus_distribution: [{{ label, count }}]");
                println!("- daily_trend: [{{ date, moods, stimuli }}]");
                println!("- hourly_trend: [{{ hour, moods, stimuli }}]");
                println!("- stats: quick statistics");
            }
        }
    }

    Ok(())
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Persisted mood or sensory observation record",
        "type": "object",
        "properties": {
            "id": { "type": ["number", "string"] },
            "kind": { "type": "string", "enum": ["mood", "stimulus", "sensory"] },
            "mood": { "type": "string", "enum": ["Happy", "Sad", "Angry", "Anxious"] },
            "category": {
                "type": "string",
                "enum": ["Visual", "Auditory", "Tactile", "Olfactory", "Gustatory", "Vestibular", "Proprioception"]
            },
            "intensity": { "type": "string", "enum": ["Low", "Medium", "High"] },
            "timestamp": { "type": ["number", "string"] },
            "note": { "type": "string" }
        }
    })
    .to_string()
}

fn get_report_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "moodtrace.report",
        "description": "Result of one analysis pass",
        "type": "object",
        "required": [
            "generated_at", "window_ms", "total_events", "correlations", "alerts",
            "mood_distribution", "stimulus_distribution", "daily_trend", "hourly_trend", "stats"
        ],
        "properties": {
            "generated_at": { "type": "string", "format": "date-time" },
            "window_ms": { "type": "integer" },
            "total_events": { "type": "integer" },
            "correlations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["stimulus_category", "mood_label", "occurrence_count"],
                    "properties": {
                        "stimulus_category": { "type": "string" },
                        "mood_label": { "type": "string" },
                        "occurrence_count": { "type": "integer", "minimum": 1 }
                    }
                }
            },
            "alerts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["severity", "rule", "message", "generated_at"],
                    "properties": {
                        "severity": { "type": "string", "enum": ["warning", "info"] },
                        "rule": {
                            "type": "string",
                            "enum": ["acute_distress", "sensory_overload", "weekly_recurrence", "causal_trigger"]
                        },
                        "message": { "type": "string" },
                        "generated_at": { "type": "string", "format": "date-time" }
                    }
                }
            },
            "mood_distribution": { "type": "array" },
            "stimulus_distribution": { "type": "array" },
            "daily_trend": { "type": "array" },
            "hourly_trend": { "type": "array" },
            "stats": { "type": "object" }
        }
    })
    .to_string()
}

// Error types

enum MoodtraceCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    InvalidNow(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for MoodtraceCliError {
    fn from(e: io::Error) -> Self {
        MoodtraceCliError::Io(e)
    }
}

impl From<AnalysisError> for MoodtraceCliError {
    fn from(e: AnalysisError) -> Self {
        MoodtraceCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for MoodtraceCliError {
    fn from(e: serde_json::Error) -> Self {
        MoodtraceCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MoodtraceCliError> for CliError {
    fn from(e: MoodtraceCliError) -> Self {
        match e {
            MoodtraceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MoodtraceCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'moodtrace doctor --config <file>'")
                    }
                    AnalysisError::InvalidTimezone(_) => {
                        ("TIMEZONE_ERROR", "Use an IANA name such as Europe/Berlin")
                    }
                    AnalysisError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    _ => ("PARSE_ERROR", "Check input format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            MoodtraceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MoodtraceCliError::InvalidNow(text) => CliError {
                code: "INVALID_NOW".to_string(),
                message: format!("Cannot parse reference time: {}", text),
                hint: Some("Use RFC 3339 (2024-01-15T11:00:00Z) or epoch milliseconds".to_string()),
            },
            MoodtraceCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Invalid records are skipped or excluded from time windows".to_string()),
            },
            MoodtraceCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<String>,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
