//! # rxtrace-alerts — Alert Correlator
//!
//! Joins externally reported [`Alert`]s to the items they reference by
//! shared batch id. Read-only: the correlator filters and counts, and never
//! calls the summarization collaborator itself. It only decides whether a
//! summary is worth offering and supplies the alert list to summarize.
//!
//! The correlator is never on the transition write path.

use std::collections::{BTreeMap, HashMap, HashSet};

use rxtrace_core::{Alert, AlertId, BatchId, ErrorKind, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Correlator construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// Two alerts share an id.
    #[error("duplicate alert id {0:?}")]
    DuplicateAlert(String),
}

impl AlertError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateAlert(_) => ErrorKind::AlreadyExists,
        }
    }
}

/// Count per severity. Every severity is present, zero included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityCounts(BTreeMap<Severity, usize>);

impl SeverityCounts {
    /// Count a slice of alerts.
    pub fn tally<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Self {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.into_iter().map(|s| (s, 0)).collect();
        for alert in alerts {
            *counts.entry(alert.severity).or_insert(0) += 1;
        }
        Self(counts)
    }

    /// Count for one severity.
    pub fn get(&self, severity: Severity) -> usize {
        self.0.get(&severity).copied().unwrap_or(0)
    }

    /// Total across severities.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Highest severity with a non-zero count.
    pub fn highest(&self) -> Option<Severity> {
        self.0
            .iter()
            .rev()
            .find(|(_, &n)| n > 0)
            .map(|(&s, _)| s)
    }
}

/// Immutable alert snapshot indexed by batch id.
#[derive(Debug, Clone, Default)]
pub struct AlertCorrelator {
    alerts: Vec<Alert>,
    by_batch: HashMap<BatchId, Vec<usize>>,
}

impl AlertCorrelator {
    /// Index a set of alerts. Duplicate alert ids are rejected.
    pub fn new(alerts: Vec<Alert>) -> Result<Self, AlertError> {
        let mut seen: HashSet<&AlertId> = HashSet::with_capacity(alerts.len());
        for alert in &alerts {
            if !seen.insert(&alert.alert_id) {
                return Err(AlertError::DuplicateAlert(alert.alert_id.to_string()));
            }
        }
        let mut by_batch: HashMap<BatchId, Vec<usize>> = HashMap::new();
        for (idx, alert) in alerts.iter().enumerate() {
            by_batch.entry(alert.batch_id.clone()).or_default().push(idx);
        }
        for indexes in by_batch.values_mut() {
            indexes.sort_by(|&a, &b| {
                alerts[a]
                    .timestamp
                    .cmp(&alerts[b].timestamp)
                    .then_with(|| alerts[a].alert_id.cmp(&alerts[b].alert_id))
            });
        }
        Ok(Self { alerts, by_batch })
    }

    /// All alerts, in load order.
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    /// Number of alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether there are no alerts.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Alerts for one batch, oldest first; ties broken by alert id.
    pub fn for_batch(&self, batch_id: &BatchId) -> Vec<&Alert> {
        self.by_batch
            .get(batch_id)
            .map(|idx| idx.iter().map(|&i| &self.alerts[i]).collect())
            .unwrap_or_default()
    }

    /// Severity counts over an arbitrary alert list.
    pub fn severity_counts(alerts: &[&Alert]) -> SeverityCounts {
        SeverityCounts::tally(alerts.iter().copied())
    }

    /// Severity counts for one batch.
    pub fn batch_severity_counts(&self, batch_id: &BatchId) -> SeverityCounts {
        Self::severity_counts(&self.for_batch(batch_id))
    }

    /// Whether a summary should be offered: the batch has at least one alert.
    pub fn summary_offered(&self, batch_id: &BatchId) -> bool {
        self.by_batch.get(batch_id).is_some_and(|v| !v.is_empty())
    }

    /// Alert count per batch, for list views.
    pub fn counts_by_batch(&self) -> BTreeMap<BatchId, usize> {
        self.by_batch
            .iter()
            .map(|(id, idx)| (id.clone(), idx.len()))
            .collect()
    }

    /// Alerts whose batch id matches no known item, in load order.
    pub fn orphans(&self, is_known: impl Fn(&BatchId) -> bool) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| !is_known(&a.batch_id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxtrace_core::Timestamp;

    fn alert(id: &str, batch: &str, ts: &str, severity: Severity) -> Alert {
        Alert {
            alert_id: AlertId::new(id).unwrap(),
            batch_id: BatchId::new(batch).unwrap(),
            timestamp: Timestamp::parse(ts).unwrap(),
            alert_type: "Temperature Excursion".into(),
            severity,
            details: String::new(),
        }
    }

    fn b(id: &str) -> BatchId {
        BatchId::new(id).unwrap()
    }

    fn sample() -> AlertCorrelator {
        AlertCorrelator::new(vec![
            alert("A-3", "B-1", "2026-03-02T08:00:00Z", Severity::High),
            alert("A-1", "B-1", "2026-03-01T08:00:00Z", Severity::Low),
            alert("A-9", "B-2", "2026-03-01T09:00:00Z", Severity::Medium),
            alert("A-2", "B-1", "2026-03-01T08:00:00Z", Severity::Medium),
            alert("A-5", "B-404", "2026-03-03T08:00:00Z", Severity::Low),
        ])
        .unwrap()
    }

    #[test]
    fn test_for_batch_sorted_by_time_then_id() {
        let c = sample();
        let ids: Vec<_> = c.for_batch(&b("B-1")).iter().map(|a| a.alert_id.as_str()).collect();
        assert_eq!(ids, ["A-1", "A-2", "A-3"]);
        assert!(c.for_batch(&b("B-0")).is_empty());
    }

    #[test]
    fn test_severity_counts_include_zeroes() {
        let c = sample();
        let counts = c.batch_severity_counts(&b("B-2"));
        assert_eq!(counts.get(Severity::Low), 0);
        assert_eq!(counts.get(Severity::Medium), 1);
        assert_eq!(counts.get(Severity::High), 0);
        assert_eq!(counts.total(), 1);
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json, serde_json::json!({"Low": 0, "Medium": 1, "High": 0}));
    }

    #[test]
    fn test_empty_counts() {
        let counts = AlertCorrelator::severity_counts(&[]);
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.highest(), None);
    }

    #[test]
    fn test_highest_severity() {
        let c = sample();
        assert_eq!(c.batch_severity_counts(&b("B-1")).highest(), Some(Severity::High));
    }

    #[test]
    fn test_summary_offered_iff_alerts_exist() {
        let c = sample();
        assert!(c.summary_offered(&b("B-1")));
        assert!(!c.summary_offered(&b("B-3")));
    }

    #[test]
    fn test_counts_by_batch_and_orphans() {
        let c = sample();
        let counts = c.counts_by_batch();
        assert_eq!(counts[&b("B-1")], 3);
        assert_eq!(counts[&b("B-2")], 1);
        let known = [b("B-1"), b("B-2")];
        let orphans: Vec<_> = c
            .orphans(|id| known.contains(id))
            .iter()
            .map(|a| a.alert_id.as_str())
            .collect();
        assert_eq!(orphans, ["A-5"]);
    }

    #[test]
    fn test_duplicate_alert_rejected() {
        let err = AlertCorrelator::new(vec![
            alert("A-1", "B-1", "2026-03-01T08:00:00Z", Severity::Low),
            alert("A-1", "B-2", "2026-03-01T08:00:00Z", Severity::Low),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
}
