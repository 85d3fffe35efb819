//! MoodTrace - behavioral pattern analysis over mood and sensory observation logs
//!
//! MoodTrace turns a student's time-stamped observation log into correlations,
//! alerts and aggregates through a deterministic pipeline: record adaptation →
//! timestamp normalization → ordered sequence → correlation, pattern detection
//! and reporting.
//!
//! ## Modules
//!
//! - **Engine**: `correlation`, `patterns`, `reporters` over an [`EventSequence`]
//! - **Ingestion**: `schema` records and the `normalizer` that resolves their instants
//! - **Surfaces**: one-shot [`analyze_json`], the [`Analyzer`], the C ABI in `ffi`

pub mod classifier;
pub mod config;
pub mod correlation;
pub mod error;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod prompt;
pub mod reporters;
pub mod schema;
pub mod sequence;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::AnalysisConfig;
pub use correlation::{compute_correlations, CorrelationEngine};
pub use error::AnalysisError;
pub use normalizer::TimestampNormalizer;
pub use patterns::{detect_patterns, PatternDetector, PatternThresholds};
pub use pipeline::{analyze_json, AnalysisReport, Analyzer};
pub use prompt::{build_insight_prompt, generate_insight, InsightGenerator};
pub use reporters::{AggregateReporter, QuickStats};
pub use sequence::EventSequence;
pub use types::{
    Alert, AlertRule, AlertSeverity, CorrelationPair, EventId, Instant, Intensity, MoodLabel,
    ObservationEvent, StimulusCategory,
};

// Schema exports
pub use schema::{RawRecord, RawRecordAdapter, SCHEMA_VERSION};

/// Library version reported by the CLI and FFI
pub const MOODTRACE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by diagnostics
pub const PRODUCER_NAME: &str = "moodtrace";
