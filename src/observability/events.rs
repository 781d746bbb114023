//! Observability events for insightdb
//!
//! Every log line names one of these events. Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in insightdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Engine startup begins
    BootStart,
    /// Engine startup complete, ready to query
    BootComplete,
    /// Configuration loaded
    ConfigLoaded,

    // Datasets
    /// Persisted datasets loaded from the data directory
    DatasetsLoaded,
    /// A persisted dataset could not be loaded (FATAL)
    DatasetLoadFailed,
    /// Dataset registered
    DatasetAdded,
    /// Dataset registration or removal failed
    DatasetRejected,
    /// Dataset removed
    DatasetRemoved,

    // Queries
    /// Query received
    QueryReceived,
    /// Query executed successfully
    QueryExecuted,
    /// Query rejected
    QueryRejected,
    /// SUM/AVG input outside the decimal range, clamped
    AggregateSaturated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "INSIGHTDB_STARTUP_BEGIN",
            Event::BootComplete => "INSIGHTDB_STARTUP_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::DatasetsLoaded => "DATASETS_LOADED",
            Event::DatasetLoadFailed => "DATASET_LOAD_FAILED",
            Event::DatasetAdded => "DATASET_ADDED",
            Event::DatasetRejected => "DATASET_REJECTED",
            Event::DatasetRemoved => "DATASET_REMOVED",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::AggregateSaturated => "AGGREGATE_SATURATED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DatasetLoadFailed => Severity::Fatal,
            Event::DatasetRejected | Event::QueryRejected | Event::AggregateSaturated => {
                Severity::Warn
            }
            Event::QueryReceived => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
