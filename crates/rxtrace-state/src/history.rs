//! # Custody History Ledger
//!
//! The append-only list of `{status, holder, timestamp}` entries behind every
//! item in the custody phase. The ledger is never empty, and timestamps never
//! decrease (equal timestamps are allowed, e.g. create-and-ship writes two
//! entries in the same second).
//!
//! There is no API to edit or remove an entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rxtrace_core::{ErrorKind, Timestamp};

use crate::status::CustodyStatus;

/// One immutable history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Status entered.
    pub status: CustodyStatus,
    /// Holder name after the change.
    pub holder: String,
    /// When the change was committed.
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    /// Construct an entry.
    pub fn new(status: CustodyStatus, holder: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            status,
            holder: holder.into(),
            timestamp,
        }
    }
}

/// Ledger invariant violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A ledger must carry at least one entry.
    #[error("history must not be empty")]
    Empty,

    /// An entry's timestamp precedes its predecessor's.
    #[error("history entry {index} at {next} precedes previous entry at {previous}")]
    NonMonotonic {
        /// Index of the offending entry.
        index: usize,
        /// Predecessor timestamp.
        previous: Timestamp,
        /// Offending timestamp.
        next: Timestamp,
    },

    /// An entry has a blank holder.
    #[error("history entry {index} has a blank holder")]
    BlankHolder {
        /// Index of the offending entry.
        index: usize,
    },
}

impl LedgerError {
    /// Ledger violations are malformed data.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Non-empty, append-only, timestamp-monotone history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct CustodyLedger {
    entries: Vec<HistoryEntry>,
}

impl CustodyLedger {
    /// Start a ledger with its first entry.
    pub fn seed(first: HistoryEntry) -> Result<Self, LedgerError> {
        Self::from_entries(vec![first])
    }

    /// Rebuild a ledger from stored entries, checking every invariant.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Result<Self, LedgerError> {
        if entries.is_empty() {
            return Err(LedgerError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            if entry.holder.trim().is_empty() {
                return Err(LedgerError::BlankHolder { index });
            }
        }
        for (index, pair) in entries.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(LedgerError::NonMonotonic {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Append one entry. Rejects a timestamp earlier than the last entry's.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), LedgerError> {
        let last = self.last();
        if entry.timestamp < last.timestamp {
            return Err(LedgerError::NonMonotonic {
                index: self.entries.len(),
                previous: last.timestamp,
                next: entry.timestamp,
            });
        }
        if entry.holder.trim().is_empty() {
            return Err(LedgerError::BlankHolder {
                index: self.entries.len(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// The most recent entry. Always present.
    pub fn last(&self) -> &HistoryEntry {
        // Construction guarantees at least one entry.
        &self.entries[self.entries.len() - 1]
    }

    /// The first entry.
    pub fn first(&self) -> &HistoryEntry {
        &self.entries[0]
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries. Never zero.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Holder of the latest entry that precedes the trailing run of
    /// `status` entries. Falls back to the first entry of the run when the
    /// ledger begins with it.
    ///
    /// For a ledger ending `[.., (Pending, Alice), (RequiresApproval, Alice)]`
    /// and `status = RequiresApproval` this is `Alice`.
    pub fn holder_before_run_of(&self, status: CustodyStatus) -> &str {
        let run_start = self
            .entries
            .iter()
            .rposition(|e| e.status != status)
            .map(|i| i + 1)
            .unwrap_or(0);
        match run_start.checked_sub(1) {
            Some(prev) => &self.entries[prev].holder,
            None => &self.entries[0].holder,
        }
    }
}

impl TryFrom<Vec<HistoryEntry>> for CustodyLedger {
    type Error = LedgerError;

    fn try_from(entries: Vec<HistoryEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<CustodyLedger> for Vec<HistoryEntry> {
    fn from(ledger: CustodyLedger) -> Self {
        ledger.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(1_767_225_600 + secs).unwrap()
    }

    fn entry(status: CustodyStatus, holder: &str, secs: i64) -> HistoryEntry {
        HistoryEntry::new(status, holder, ts(secs))
    }

    #[test]
    fn test_empty_ledger_rejected() {
        assert_eq!(CustodyLedger::from_entries(vec![]), Err(LedgerError::Empty));
        assert!(serde_json::from_str::<CustodyLedger>("[]").is_err());
    }

    #[test]
    fn test_append_allows_equal_timestamps() {
        let mut ledger = CustodyLedger::seed(entry(CustodyStatus::Pending, "Alice", 10)).unwrap();
        ledger
            .append(entry(CustodyStatus::InTransit, "Dan", 10))
            .unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.last().holder, "Dan");
        assert_eq!(ledger.first().holder, "Alice");
    }

    #[test]
    fn test_append_rejects_going_backwards() {
        let mut ledger = CustodyLedger::seed(entry(CustodyStatus::Pending, "Alice", 10)).unwrap();
        let err = ledger
            .append(entry(CustodyStatus::InTransit, "Dan", 9))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NonMonotonic { index: 1, .. }));
        assert_eq!(ledger.len(), 1, "rejected append leaves the ledger unchanged");
    }

    #[test]
    fn test_load_rejects_non_monotonic_history() {
        let json = serde_json::json!([
            {"status": "PENDING", "holder": "Alice", "timestamp": "2026-01-02T00:00:00Z"},
            {"status": "IN_TRANSIT", "holder": "Dan", "timestamp": "2026-01-01T00:00:00Z"}
        ]);
        assert!(serde_json::from_value::<CustodyLedger>(json).is_err());
    }

    #[test]
    fn test_blank_holder_rejected() {
        let err = CustodyLedger::seed(entry(CustodyStatus::Pending, " ", 0)).unwrap_err();
        assert_eq!(err, LedgerError::BlankHolder { index: 0 });
    }

    #[test]
    fn test_holder_before_trailing_run() {
        let ledger = CustodyLedger::from_entries(vec![
            entry(CustodyStatus::Pending, "Alice", 0),
            entry(CustodyStatus::RequiresApproval, "Alice", 1),
        ])
        .unwrap();
        assert_eq!(ledger.holder_before_run_of(CustodyStatus::RequiresApproval), "Alice");

        let seeded_in_run = CustodyLedger::seed(entry(CustodyStatus::RequiresApproval, "Sub", 0)).unwrap();
        assert_eq!(seeded_in_run.holder_before_run_of(CustodyStatus::RequiresApproval), "Sub");
    }

    #[test]
    fn test_serde_is_a_plain_array() {
        let ledger = CustodyLedger::seed(entry(CustodyStatus::Pending, "Alice", 0)).unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        let back: CustodyLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }

    proptest! {
        #[test]
        fn appended_ledgers_stay_monotone(steps in proptest::collection::vec(-5i64..20, 1..40)) {
            let mut ledger = CustodyLedger::seed(entry(CustodyStatus::Pending, "Alice", 0)).unwrap();
            let mut clock = 0i64;
            for step in steps {
                let candidate = clock + step;
                let before = ledger.len();
                let result = ledger.append(entry(CustodyStatus::InTransit, "Dan", candidate));
                if step < 0 {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(ledger.len(), before);
                } else {
                    prop_assert!(result.is_ok());
                    clock = candidate;
                }
            }
            for pair in ledger.entries().windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            prop_assert!(CustodyLedger::from_entries(ledger.entries().to_vec()).is_ok());
        }
    }
}
