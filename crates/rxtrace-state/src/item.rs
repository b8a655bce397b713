//! # Trackable Items
//!
//! A production batch and the shipment it becomes are one record: a
//! [`TrackableItem`] keyed by a single [`BatchId`], whose [`Phase`] is either
//! `pre_custody` (a [`ProductionBatch`]) or `in_custody` (a [`Custody`] with
//! its history ledger). Shipping a batch swaps the phase in place; the id
//! never changes.
//!
//! ## Stored shape
//!
//! ```json
//! {
//!   "id": "B-1", "kind": "physical_shipment", "productName": "Amoxicillin 500mg",
//!   "version": 3, "createdAt": "...", "lastUpdateAt": "...",
//!   "phase": "in_custody",
//!   "custody": { "status": "IN_TRANSIT", "currentHolderName": "Dan Distributor", ... }
//! }
//! ```
//!
//! Every record read from storage passes the same invariant checks as a
//! freshly built one; a document whose cached status/holder disagrees with
//! its ledger is rejected at load time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rxtrace_core::{Actor, BatchId, ErrorKind, Role, Timestamp};

use crate::history::{CustodyLedger, HistoryEntry, LedgerError};
use crate::status::{BatchStatus, CustodyStatus, ItemKind};

// ─── Errors ──────────────────────────────────────────────────────────

/// Item invariant violations and misuse.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    /// History ledger invariant violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A cached field disagrees with the last history entry.
    #[error("cached {field} {cached:?} does not match last history entry {ledger:?}")]
    ProjectionMismatch {
        /// `"status"` or `"currentHolderName"`.
        field: &'static str,
        /// Value in the cached field.
        cached: String,
        /// Value in the last history entry.
        ledger: String,
    },

    /// A status from the other mode appears in this item.
    #[error("status {status} is not valid for a {kind}")]
    StatusOutsideMode {
        /// Offending status.
        status: CustodyStatus,
        /// Item kind.
        kind: ItemKind,
    },

    /// A required text field is blank.
    #[error("{0} must not be blank")]
    Blank(&'static str),

    /// Lot facts are inconsistent.
    #[error("invalid lot details: {0}")]
    Lot(String),

    /// Regulatory submissions have no production phase.
    #[error("a regulatory submission cannot be in the pre-custody phase")]
    SubmissionBatch,

    /// `SHIPPED` is derived from the custody phase and never stored.
    #[error("batch status SHIPPED is derived and cannot be stored")]
    ShippedStored,

    /// `lastUpdateAt` precedes `createdAt`.
    #[error("lastUpdateAt {last_update_at} precedes createdAt {created_at}")]
    UpdatedBeforeCreated {
        /// Creation time.
        created_at: Timestamp,
        /// Last update time.
        last_update_at: Timestamp,
    },

    /// Only custodial roles may hold an item.
    #[error("{name} ({role}) cannot hold custody")]
    NonCustodialHolder {
        /// Actor name.
        name: String,
        /// Actor role.
        role: Role,
    },

    /// A decision was computed against a status the item is no longer in.
    #[error("decision was made from {expected} but the item is now {actual}")]
    Stale {
        /// Status the decision assumed.
        expected: CustodyStatus,
        /// Current status.
        actual: CustodyStatus,
    },

    /// The operation needs an item in the custody phase.
    #[error("item {0} has not entered the custody chain")]
    NotInCustody(BatchId),
}

impl ItemError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonCustodialHolder { .. } => ErrorKind::Unauthorized,
            Self::Stale { .. } => ErrorKind::ConcurrentModification,
            Self::NotInCustody(_) => ErrorKind::InvalidTransition,
            _ => ErrorKind::Validation,
        }
    }
}

// ─── Lot and Batch ───────────────────────────────────────────────────

/// Lot facts recorded at production and carried along the custody chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotDetails {
    /// Units in the lot. Positive.
    pub quantity: u32,
    /// Date of manufacture.
    pub manufacture_date: NaiveDate,
    /// Expiry date. Strictly after `manufacture_date`.
    pub expiry_date: NaiveDate,
}

impl LotDetails {
    /// Check quantity and date ordering.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.quantity == 0 {
            return Err(ItemError::Lot("quantity must be greater than zero".into()));
        }
        if self.expiry_date <= self.manufacture_date {
            return Err(ItemError::Lot(format!(
                "expiry date {} must be after manufacture date {}",
                self.expiry_date, self.manufacture_date
            )));
        }
        Ok(())
    }
}

/// Pre-custody phase: a lot still with its manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionBatch {
    /// Name of the registering manufacturer.
    pub manufacturer: String,
    /// `IN_PRODUCTION` or `READY_FOR_SHIPMENT`.
    pub status: BatchStatus,
    /// Lot facts.
    pub lot: LotDetails,
}

// ─── Custody ─────────────────────────────────────────────────────────

/// In-custody phase. `status` and `current_holder_name` are a cached
/// projection of the ledger's last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Custody {
    status: CustodyStatus,
    current_holder_name: String,
    origin_location: String,
    destination_location: String,
    history: CustodyLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<BatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lot: Option<LotDetails>,
}

impl Custody {
    /// Current status.
    pub fn status(&self) -> CustodyStatus {
        self.status
    }

    /// Current holder name.
    pub fn current_holder(&self) -> &str {
        &self.current_holder_name
    }

    /// Where the item started this hop.
    pub fn origin(&self) -> &str {
        &self.origin_location
    }

    /// Where the item is headed.
    pub fn destination(&self) -> &str {
        &self.destination_location
    }

    /// The history ledger.
    pub fn history(&self) -> &CustodyLedger {
        &self.history
    }

    /// The delivered item this hop was forwarded from.
    pub fn parent(&self) -> Option<&BatchId> {
        self.parent.as_ref()
    }

    /// Lot facts carried from production, if known.
    pub fn lot(&self) -> Option<&LotDetails> {
        self.lot.as_ref()
    }

    fn check(&self, kind: ItemKind) -> Result<(), ItemError> {
        let last = self.history.last();
        if last.status != self.status {
            return Err(ItemError::ProjectionMismatch {
                field: "status",
                cached: self.status.to_string(),
                ledger: last.status.to_string(),
            });
        }
        if last.holder != self.current_holder_name {
            return Err(ItemError::ProjectionMismatch {
                field: "currentHolderName",
                cached: self.current_holder_name.clone(),
                ledger: last.holder.clone(),
            });
        }
        if let Some(bad) = self
            .history
            .entries()
            .iter()
            .find(|e| !kind.allows(e.status))
        {
            return Err(ItemError::StatusOutsideMode {
                status: bad.status,
                kind,
            });
        }
        if self.origin_location.trim().is_empty() {
            return Err(ItemError::Blank("originLocation"));
        }
        if self.destination_location.trim().is_empty() {
            return Err(ItemError::Blank("destinationLocation"));
        }
        if let Some(lot) = &self.lot {
            lot.validate()?;
        }
        Ok(())
    }

    fn push(&mut self, entry: HistoryEntry) -> Result<(), ItemError> {
        let status = entry.status;
        let holder = entry.holder.clone();
        self.history.append(entry)?;
        self.status = status;
        self.current_holder_name = holder;
        Ok(())
    }
}

// ─── Phase ───────────────────────────────────────────────────────────

/// Lifecycle phase discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// With the manufacturer, not yet shipped.
    PreCustody {
        /// Production facts.
        batch: ProductionBatch,
    },
    /// In the custody chain.
    InCustody {
        /// Custody state and ledger.
        custody: Custody,
    },
}

// ─── Trackable Item ──────────────────────────────────────────────────

/// Parameters for opening a new item directly in the custody phase.
#[derive(Debug, Clone)]
pub struct NewShipment<'a> {
    /// Item identifier.
    pub id: BatchId,
    /// Status mode.
    pub kind: ItemKind,
    /// Product or dossier name.
    pub product_name: String,
    /// Initial holder.
    pub holder: &'a Actor,
    /// Origin; defaults to the holder's location.
    pub origin: Option<String>,
    /// Destination location.
    pub destination: String,
    /// Delivered item this hop continues from.
    pub parent: Option<BatchId>,
    /// Lot facts carried over.
    pub lot: Option<LotDetails>,
}

/// A batch or shipment, keyed by one identifier across both phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawItem")]
pub struct TrackableItem {
    id: BatchId,
    kind: ItemKind,
    product_name: String,
    version: u64,
    created_at: Timestamp,
    last_update_at: Timestamp,
    #[serde(flatten)]
    phase: Phase,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    id: BatchId,
    kind: ItemKind,
    product_name: String,
    version: u64,
    created_at: Timestamp,
    last_update_at: Timestamp,
    #[serde(flatten)]
    phase: Phase,
}

impl TryFrom<RawItem> for TrackableItem {
    type Error = ItemError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let item = Self {
            id: raw.id,
            kind: raw.kind,
            product_name: raw.product_name,
            version: raw.version,
            created_at: raw.created_at,
            last_update_at: raw.last_update_at,
            phase: raw.phase,
        };
        item.validate()?;
        Ok(item)
    }
}

impl TrackableItem {
    /// Open an item directly in the custody phase with one seeded entry:
    /// `PENDING` for physical shipments, `REQUIRES_APPROVAL` for submissions.
    pub fn open_shipment(spec: NewShipment<'_>, now: Timestamp) -> Result<Self, ItemError> {
        let holder = spec.holder;
        if !holder.role.is_custodial() {
            return Err(ItemError::NonCustodialHolder {
                name: holder.name.clone(),
                role: holder.role,
            });
        }
        let origin = spec
            .origin
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| holder.location.clone());
        let status = spec.kind.initial_status();
        let history = CustodyLedger::seed(HistoryEntry::new(status, holder.name.clone(), now))?;
        let item = Self {
            id: spec.id,
            kind: spec.kind,
            product_name: spec.product_name.trim().to_string(),
            version: 1,
            created_at: now,
            last_update_at: now,
            phase: Phase::InCustody {
                custody: Custody {
                    status,
                    current_holder_name: holder.name.clone(),
                    origin_location: origin,
                    destination_location: spec.destination.trim().to_string(),
                    history,
                    parent: spec.parent,
                    lot: spec.lot,
                },
            },
        };
        item.validate()?;
        Ok(item)
    }

    /// Check every invariant. Run on construction and on load.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.product_name.trim().is_empty() {
            return Err(ItemError::Blank("productName"));
        }
        if self.last_update_at < self.created_at {
            return Err(ItemError::UpdatedBeforeCreated {
                created_at: self.created_at,
                last_update_at: self.last_update_at,
            });
        }
        match &self.phase {
            Phase::PreCustody { batch } => {
                if self.kind == ItemKind::RegulatorySubmission {
                    return Err(ItemError::SubmissionBatch);
                }
                if batch.status == BatchStatus::Shipped {
                    return Err(ItemError::ShippedStored);
                }
                if batch.manufacturer.trim().is_empty() {
                    return Err(ItemError::Blank("manufacturer"));
                }
                batch.lot.validate()
            }
            Phase::InCustody { custody } => custody.check(self.kind),
        }
    }

    /// Item identifier.
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    /// Status mode.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Product or dossier name.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Optimistic-concurrency version. Starts at 1.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Time of the last committed mutation.
    pub fn last_update_at(&self) -> Timestamp {
        self.last_update_at
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Custody state, if the item has entered the chain.
    pub fn custody(&self) -> Option<&Custody> {
        match &self.phase {
            Phase::InCustody { custody } => Some(custody),
            Phase::PreCustody { .. } => None,
        }
    }

    /// Production facts, if the item has not yet shipped.
    pub fn batch(&self) -> Option<&ProductionBatch> {
        match &self.phase {
            Phase::PreCustody { batch } => Some(batch),
            Phase::InCustody { .. } => None,
        }
    }

    /// Whether the item has entered the custody chain.
    pub fn is_in_custody(&self) -> bool {
        self.custody().is_some()
    }

    /// Batch status view. `SHIPPED` for any item in the custody phase.
    pub fn batch_status(&self) -> BatchStatus {
        match &self.phase {
            Phase::PreCustody { batch } => batch.status,
            Phase::InCustody { .. } => BatchStatus::Shipped,
        }
    }

    /// Lot facts from either phase.
    pub fn lot(&self) -> Option<&LotDetails> {
        match &self.phase {
            Phase::PreCustody { batch } => Some(&batch.lot),
            Phase::InCustody { custody } => custody.lot(),
        }
    }

    /// Whether the item is in a terminal custody status.
    pub fn is_terminal(&self) -> bool {
        self.custody()
            .is_some_and(|c| self.kind.is_terminal(c.status()))
    }

    /// Append one history entry, producing the next version.
    ///
    /// `expected_from` must equal the current status; the cached projection,
    /// `lastUpdateAt` and `version` move with the new entry.
    pub fn with_entry(
        &self,
        expected_from: CustodyStatus,
        entry: HistoryEntry,
    ) -> Result<Self, ItemError> {
        let mut next = self.clone();
        let timestamp = entry.timestamp;
        match &mut next.phase {
            Phase::InCustody { custody } => {
                if custody.status != expected_from {
                    return Err(ItemError::Stale {
                        expected: expected_from,
                        actual: custody.status,
                    });
                }
                if !self.kind.allows(entry.status) {
                    return Err(ItemError::StatusOutsideMode {
                        status: entry.status,
                        kind: self.kind,
                    });
                }
                custody.push(entry)?;
            }
            Phase::PreCustody { .. } => return Err(ItemError::NotInCustody(self.id.clone())),
        }
        next.last_update_at = timestamp.max(self.last_update_at);
        next.version = self.version + 1;
        Ok(next)
    }

    pub(crate) fn new_batch(
        id: BatchId,
        product_name: &str,
        batch: ProductionBatch,
        now: Timestamp,
    ) -> Result<Self, ItemError> {
        let item = Self {
            id,
            kind: ItemKind::PhysicalShipment,
            product_name: product_name.trim().to_string(),
            version: 1,
            created_at: now,
            last_update_at: now,
            phase: Phase::PreCustody { batch },
        };
        item.validate()?;
        Ok(item)
    }

    pub(crate) fn with_phase(&self, phase: Phase, now: Timestamp) -> Result<Self, ItemError> {
        let mut next = self.clone();
        next.phase = phase;
        next.last_update_at = now.max(self.last_update_at);
        next.version = self.version + 1;
        next.validate()?;
        Ok(next)
    }

    pub(crate) fn custody_from_batch(
        holder: &Actor,
        destination: &str,
        lot: LotDetails,
        now: Timestamp,
    ) -> Result<Custody, ItemError> {
        let status = ItemKind::PhysicalShipment.initial_status();
        Ok(Custody {
            status,
            current_holder_name: holder.name.clone(),
            origin_location: holder.location.clone(),
            destination_location: destination.trim().to_string(),
            history: CustodyLedger::seed(HistoryEntry::new(status, holder.name.clone(), now))?,
            parent: None,
            lot: Some(lot),
        })
    }
}
