//! ObservationScope for begin/complete logging around one operation
//!
//! - Logs the begin event on creation
//! - Logs a completion or failure event, with elapsed time, when finished
//! - Warns on drop if neither happened

use std::time::Instant;

use super::events::Event;
use super::logger::{Logger, Severity};

/// A scope that logs how one operation started and ended
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::new(Event::QueryReceived, &[("dataset", "courses")]);
/// // ... do work ...
/// scope.complete(Event::QueryExecuted, &[("rows", "42")]);
/// ```
pub struct ObservationScope<'a> {
    begin: Event,
    finished: bool,
    fields: Vec<(&'a str, String)>,
    timer: Timer,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope, logging `begin` immediately.
    ///
    /// `fields` are repeated on the closing event.
    pub fn new(begin: Event, fields: &[(&'a str, &str)]) -> Self {
        Logger::log(begin.severity(), begin.as_str(), fields);

        Self {
            begin,
            finished: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
        }
    }

    /// Logs `event` with the scope fields, `extra` and `elapsed_ms`
    pub fn complete(mut self, event: Event, extra: &[(&str, &str)]) {
        self.finish(event, event.severity(), extra);
    }

    /// Logs `event` at its own severity (at least WARN) with a failure reason
    pub fn fail(mut self, event: Event, code: &str, reason: &str) {
        let severity = event.severity().max(Severity::Warn);
        self.finish(event, severity, &[("code", code), ("reason", reason)]);
    }

    fn finish(&mut self, event: Event, severity: Severity, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.timer.elapsed_ms();
        let mut all_fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        all_fields.extend(extra.iter().copied());
        all_fields.push(("elapsed_ms", elapsed.as_str()));
        Logger::log(severity, event.as_str(), &all_fields);
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let event = format!("{}_INCOMPLETE", self.begin.as_str());
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}

/// Wall-clock timer for `elapsed_ms`
struct Timer {
    start: Instant,
}

impl Timer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}
