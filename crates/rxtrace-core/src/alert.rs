//! Externally reported alerts (temperature excursions, tamper events, ...).
//!
//! Alerts are written by telemetry and security collaborators. Inside this
//! workspace they are read-only: counted and filtered, never mutated.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{AlertId, BatchId};
use crate::temporal::Timestamp;

/// Alert severity, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational.
    Low,
    /// Needs follow-up.
    Medium,
    /// Product integrity may be compromised.
    High,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ValidationError::UnknownSeverity(s.to_string())),
        }
    }
}

/// An anomaly report tied to a batch by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Alert identifier.
    pub alert_id: AlertId,
    /// The batch/shipment this alert concerns. Not checked for existence.
    pub batch_id: BatchId,
    /// When the anomaly was observed.
    pub timestamp: Timestamp,
    /// Free-form category, e.g. `"Temperature Excursion"`.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Severity.
    pub severity: Severity,
    /// Free-text details.
    #[serde(default)]
    pub details: String,
}
