//! Event detection
//!
//! Decides from a single fresh [`CheckResult`] whether a discrete event
//! should be recorded. No prior history is consulted, so repeated failures
//! produce repeated events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{CheckResult, ComponentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ComponentDown,
    ComponentError,
    SlowResponse,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ComponentDown => "component_down",
            EventType::ComponentError => "component_error",
            EventType::SlowResponse => "slow_response",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "component_down" => Some(EventType::ComponentDown),
            "component_error" => Some(EventType::ComponentError),
            "slow_response" => Some(EventType::SlowResponse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// A significant transition or threshold breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub component_name: String,
    pub severity: Severity,
    pub message: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Nothing resolves events yet; always false when created
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        event_type: EventType,
        component_name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        details: Option<String>,
    ) -> Self {
        Self {
            event_type,
            component_name: component_name.into(),
            severity,
            message: message.into(),
            details,
            timestamp: Utc::now(),
            resolved: false,
            resolved_at: None,
        }
    }
}

/// Threshold-based event detector
#[derive(Debug, Clone)]
pub struct EventDetector {
    slow_response_ms: u64,
}

impl Default for EventDetector {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl EventDetector {
    pub fn new(slow_response_ms: u64) -> Self {
        Self { slow_response_ms }
    }

    /// At most one event per check; failures take precedence over latency
    pub fn evaluate(&self, result: &CheckResult) -> Option<Event> {
        let name = &result.component_name;
        match result.status {
            ComponentStatus::Offline => Some(Event::new(
                EventType::ComponentDown,
                name,
                Severity::Critical,
                format!("Component {} is offline", name),
                result.error_message.clone(),
            )),
            ComponentStatus::Error => Some(Event::new(
                EventType::ComponentError,
                name,
                Severity::Warning,
                format!("Component {} has errors", name),
                result.error_message.clone(),
            )),
            ComponentStatus::Online if result.response_time_ms > self.slow_response_ms => {
                Some(Event::new(
                    EventType::SlowResponse,
                    name,
                    Severity::Warning,
                    format!(
                        "Component {} response time is high: {}ms",
                        name, result.response_time_ms
                    ),
                    Some(format!("threshold {}ms", self.slow_response_ms)),
                ))
            }
            ComponentStatus::Online | ComponentStatus::Unknown => None,
        }
    }
}
