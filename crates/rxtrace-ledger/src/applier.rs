//! # Transition Applier
//!
//! The only path by which item records change. Each operation runs
//!
//! ```text
//! lock(id) → read → resolve actor → decide → journal.commit → store CAS
//! ```
//!
//! under a per-item async lock, so two calls on one id are serialized and
//! the later one decides against the post-transition state. The journal is
//! written first; the in-memory record is replaced only once the durable
//! write succeeded. A rejection performs no write at all.
//!
//! Every operation reports one `rxtrace_transitions_total` increment labelled
//! with the operation and its outcome (`ok` or the error kind code).

use std::sync::Arc;

use thiserror::Error;

use rxtrace_core::{same_name, Actor, ActorId, BatchId, ErrorKind, Timestamp};
use rxtrace_directory::{ActorDirectory, DirectoryError};
use rxtrace_state::{
    decide, BatchError, CustodyError, CustodyStatus, ItemError, ItemKind, LotDetails,
    NewShipment, TrackableItem,
};

use crate::journal::{Journal, StorageError};
use crate::locks::KeyedLocks;
use crate::store::Store;

/// Source of "now" for new history entries.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

// ─── Errors ──────────────────────────────────────────────────────────

/// Reasons an applier operation is refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    /// No item with this id.
    #[error("unknown item {0}")]
    UnknownItem(BatchId),

    /// An item with this id already exists.
    #[error("item {0} already exists")]
    AlreadyExists(BatchId),

    /// The acting actor could not be resolved.
    #[error(transparent)]
    Actor(#[from] DirectoryError),

    /// The state machine refused the transition.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// The batch lifecycle refused the action.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// The resulting record would violate an item invariant.
    #[error(transparent)]
    Item(#[from] ItemError),

    /// Forwarding needs a delivered physical shipment.
    #[error("item {id} is {status} and cannot be forwarded")]
    NotForwardable {
        /// Parent id.
        id: BatchId,
        /// Parent status, or the batch phase.
        status: String,
    },

    /// Only the holder of a delivered item may forward it.
    #[error("{actor} does not hold {id}")]
    NotHolder {
        /// Parent id.
        id: BatchId,
        /// Acting actor name.
        actor: String,
    },

    /// A recipient was named without shipping immediately.
    #[error("a recipient can only be named when shipping immediately")]
    RecipientWithoutShipment,

    /// The in-memory record moved on during the write.
    #[error("item {id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Item id.
        id: BatchId,
        /// Version the writer read.
        expected: u64,
    },

    /// The durable write failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApplyError {
    /// The error kind this refusal is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownItem(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Actor(e) => e.kind(),
            Self::Custody(e) => e.kind(),
            Self::Batch(e) => e.kind(),
            Self::Item(e) => e.kind(),
            Self::NotForwardable { .. } => ErrorKind::InvalidTransition,
            Self::NotHolder { .. } => ErrorKind::Unauthorized,
            Self::RecipientWithoutShipment => ErrorKind::Validation,
            Self::VersionConflict { .. } => ErrorKind::ConcurrentModification,
            Self::Storage(e) => e.kind(),
        }
    }
}

// ─── Requests ────────────────────────────────────────────────────────

/// Open a new item directly in the custody phase.
#[derive(Debug, Clone)]
pub struct CreateShipment {
    pub id: BatchId,
    pub kind: ItemKind,
    pub actor_id: ActorId,
    pub product_name: String,
    pub destination: String,
    pub origin: Option<String>,
    pub ship_now: bool,
    pub recipient: Option<String>,
}

/// Open the next hop from a delivered shipment.
#[derive(Debug, Clone)]
pub struct ForwardShipment {
    pub parent_id: BatchId,
    pub id: BatchId,
    pub actor_id: ActorId,
    pub destination: String,
    pub ship_now: bool,
    pub recipient: Option<String>,
}

/// Register a production batch.
#[derive(Debug, Clone)]
pub struct RegisterBatch {
    pub id: BatchId,
    pub actor_id: ActorId,
    pub drug_name: String,
    pub lot: LotDetails,
}

/// Move a ready batch into the custody chain.
#[derive(Debug, Clone)]
pub struct ShipBatch {
    pub id: BatchId,
    pub actor_id: ActorId,
    pub destination: String,
    pub ship_now: bool,
    pub recipient: Option<String>,
}

// ─── Applier ─────────────────────────────────────────────────────────

/// Serialized, journaled writer over the item store.
pub struct TransitionApplier<J: Journal> {
    items: Store<BatchId, TrackableItem>,
    directory: Arc<ActorDirectory>,
    journal: J,
    locks: KeyedLocks,
    clock: Clock,
}

impl<J: Journal> std::fmt::Debug for TransitionApplier<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionApplier")
            .field("items", &self.items.len())
            .field("actors", &self.directory.len())
            .finish_non_exhaustive()
    }
}

impl<J: Journal> TransitionApplier<J> {
    /// An applier with no items.
    pub fn empty(directory: Arc<ActorDirectory>, journal: J) -> Self {
        Self {
            items: Store::new(),
            directory,
            journal,
            locks: KeyedLocks::new(),
            clock: Arc::new(Timestamp::now),
        }
    }

    /// Build an applier over already-validated items.
    pub fn new(
        directory: Arc<ActorDirectory>,
        items: Vec<TrackableItem>,
        journal: J,
    ) -> Result<Self, ApplyError> {
        let applier = Self::empty(directory, journal);
        for item in items {
            let id = item.id().clone();
            if !applier.items.insert_new(id.clone(), item) {
                return Err(ApplyError::AlreadyExists(id));
            }
        }
        Ok(applier)
    }

    /// Replace the clock. Tests pin time with this.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The actor snapshot decisions are made against.
    pub fn directory(&self) -> &Arc<ActorDirectory> {
        &self.directory
    }

    /// The durable journal.
    pub fn journal(&self) -> &J {
        &self.journal
    }

    /// Current record for an id.
    pub fn get(&self, id: &BatchId) -> Option<TrackableItem> {
        self.items.get(id)
    }

    /// Whether an id is taken.
    pub fn contains(&self, id: &BatchId) -> bool {
        self.items.contains(id)
    }

    /// All items, ordered by id.
    pub fn list(&self) -> Vec<TrackableItem> {
        self.items.list()
    }

    /// Items in the custody phase, ordered by id.
    pub fn shipments(&self) -> Vec<TrackableItem> {
        self.items.filter(TrackableItem::is_in_custody)
    }

    /// Items still in the production phase, ordered by id.
    pub fn batches(&self) -> Vec<TrackableItem> {
        self.items.filter(|i| !i.is_in_custody())
    }

    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    fn actor(&self, id: &ActorId) -> Result<&Actor, ApplyError> {
        Ok(self.directory.by_id(id)?)
    }

    fn current(&self, id: &BatchId) -> Result<TrackableItem, ApplyError> {
        self.items
            .get(id)
            .ok_or_else(|| ApplyError::UnknownItem(id.clone()))
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Request a status change on an item in the custody phase.
    pub async fn apply(
        &self,
        id: &BatchId,
        actor_id: &ActorId,
        requested: CustodyStatus,
        recipient: Option<&str>,
    ) -> Result<TrackableItem, ApplyError> {
        let result = self.try_apply(id, actor_id, requested, recipient).await;
        observe("transition", id, &result);
        result
    }

    /// Open a new shipment or submission held by the acting actor.
    pub async fn create_shipment(&self, req: CreateShipment) -> Result<TrackableItem, ApplyError> {
        let id = req.id.clone();
        let result = self.try_create(req).await;
        observe("create", &id, &result);
        result
    }

    /// Open the next hop from a delivered physical shipment.
    ///
    /// The new item starts at the parent's destination, carries its product
    /// name and lot facts, and records the parent id.
    pub async fn forward(&self, req: ForwardShipment) -> Result<TrackableItem, ApplyError> {
        let id = req.id.clone();
        let result = self.try_forward(req).await;
        observe("forward", &id, &result);
        result
    }

    /// Register a production batch in `IN_PRODUCTION`.
    pub async fn register_batch(&self, req: RegisterBatch) -> Result<TrackableItem, ApplyError> {
        let id = req.id.clone();
        let result = self.try_register(req).await;
        observe("register_batch", &id, &result);
        result
    }

    /// `IN_PRODUCTION → READY_FOR_SHIPMENT`.
    pub async fn advance_batch(
        &self,
        id: &BatchId,
        actor_id: &ActorId,
    ) -> Result<TrackableItem, ApplyError> {
        let result = self.try_advance(id, actor_id).await;
        observe("advance_batch", id, &result);
        result
    }

    /// Move a ready batch into the custody phase, optionally shipping it in
    /// the same write.
    pub async fn ship_batch(&self, req: ShipBatch) -> Result<TrackableItem, ApplyError> {
        let id = req.id.clone();
        let result = self.try_ship(req).await;
        observe("ship_batch", &id, &result);
        result
    }

    async fn try_apply(
        &self,
        id: &BatchId,
        actor_id: &ActorId,
        requested: CustodyStatus,
        recipient: Option<&str>,
    ) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(id.as_str()).await;
        let current = self.current(id)?;
        let actor = self.actor(actor_id)?;
        let decision = decide(
            &current,
            actor,
            requested,
            recipient,
            &self.directory,
            self.now(),
        )?;
        let next = current.with_entry(decision.from_status, decision.history_entry)?;
        self.commit_update(&current, next).await
    }

    async fn try_create(&self, req: CreateShipment) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(req.id.as_str()).await;
        self.ensure_vacant(&req.id)?;
        let actor = self.actor(&req.actor_id)?;
        let now = self.now();
        let item = TrackableItem::open_shipment(
            NewShipment {
                id: req.id,
                kind: req.kind,
                product_name: req.product_name,
                holder: actor,
                origin: req.origin,
                destination: req.destination,
                parent: None,
                lot: None,
            },
            now,
        )?;
        let item = self.maybe_ship(item, actor, req.ship_now, req.recipient.as_deref(), now)?;
        self.commit_create(item).await
    }

    async fn try_forward(&self, req: ForwardShipment) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(req.id.as_str()).await;
        let parent = self.current(&req.parent_id)?;
        let custody = match parent.custody() {
            Some(c)
                if parent.kind() == ItemKind::PhysicalShipment
                    && c.status() == CustodyStatus::Delivered =>
            {
                c
            }
            Some(c) => {
                return Err(ApplyError::NotForwardable {
                    id: req.parent_id,
                    status: c.status().to_string(),
                })
            }
            None => {
                return Err(ApplyError::NotForwardable {
                    id: req.parent_id,
                    status: parent.batch_status().to_string(),
                })
            }
        };
        let actor = self.actor(&req.actor_id)?;
        if !same_name(&actor.name, custody.current_holder()) {
            return Err(ApplyError::NotHolder {
                id: req.parent_id,
                actor: actor.name.clone(),
            });
        }
        self.ensure_vacant(&req.id)?;
        let now = self.now();
        let item = TrackableItem::open_shipment(
            NewShipment {
                id: req.id,
                kind: ItemKind::PhysicalShipment,
                product_name: parent.product_name().to_string(),
                holder: actor,
                origin: Some(custody.destination().to_string()),
                destination: req.destination,
                parent: Some(req.parent_id),
                lot: custody.lot().copied(),
            },
            now,
        )?;
        let item = self.maybe_ship(item, actor, req.ship_now, req.recipient.as_deref(), now)?;
        self.commit_create(item).await
    }

    async fn try_register(&self, req: RegisterBatch) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(req.id.as_str()).await;
        self.ensure_vacant(&req.id)?;
        let actor = self.actor(&req.actor_id)?;
        let item =
            rxtrace_state::register_batch(req.id, &req.drug_name, actor, req.lot, self.now())?;
        self.commit_create(item).await
    }

    async fn try_advance(
        &self,
        id: &BatchId,
        actor_id: &ActorId,
    ) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(id.as_str()).await;
        let current = self.current(id)?;
        let actor = self.actor(actor_id)?;
        let next = rxtrace_state::advance_batch(&current, actor, self.now())?;
        self.commit_update(&current, next).await
    }

    async fn try_ship(&self, req: ShipBatch) -> Result<TrackableItem, ApplyError> {
        let _guard = self.locks.lock(req.id.as_str()).await;
        let current = self.current(&req.id)?;
        let actor = self.actor(&req.actor_id)?;
        let now = self.now();
        let shipped = rxtrace_state::ship_batch(&current, actor, &req.destination, now)?;
        let next = self.maybe_ship(shipped, actor, req.ship_now, req.recipient.as_deref(), now)?;
        self.commit_update(&current, next).await
    }

    // ── Internals ───────────────────────────────────────────────────

    fn ensure_vacant(&self, id: &BatchId) -> Result<(), ApplyError> {
        if self.items.contains(id) {
            return Err(ApplyError::AlreadyExists(id.clone()));
        }
        Ok(())
    }

    /// Append the `IN_TRANSIT` entry to a freshly opened item, at the same
    /// timestamp as its seed entry.
    fn maybe_ship(
        &self,
        item: TrackableItem,
        actor: &Actor,
        ship_now: bool,
        recipient: Option<&str>,
        now: Timestamp,
    ) -> Result<TrackableItem, ApplyError> {
        if !ship_now {
            if recipient.is_some_and(|r| !r.trim().is_empty()) {
                return Err(ApplyError::RecipientWithoutShipment);
            }
            return Ok(item);
        }
        let decision = decide(
            &item,
            actor,
            CustodyStatus::InTransit,
            recipient,
            &self.directory,
            now,
        )?;
        Ok(item.with_entry(decision.from_status, decision.history_entry)?)
    }

    async fn commit_create(&self, item: TrackableItem) -> Result<TrackableItem, ApplyError> {
        self.journal.create(&item).await?;
        if !self.items.insert_new(item.id().clone(), item.clone()) {
            return Err(ApplyError::AlreadyExists(item.id().clone()));
        }
        Ok(item)
    }

    async fn commit_update(
        &self,
        previous: &TrackableItem,
        next: TrackableItem,
    ) -> Result<TrackableItem, ApplyError> {
        let id = previous.id();
        let expected = previous.version();
        let conflict = || ApplyError::VersionConflict {
            id: id.clone(),
            expected,
        };
        if self.items.get(id).map(|i| i.version()) != Some(expected) {
            return Err(conflict());
        }
        self.journal.commit(expected, &next).await?;
        self.items
            .try_update(id, |slot| {
                if slot.version() != expected {
                    return Err(conflict());
                }
                *slot = next.clone();
                Ok(())
            })
            .ok_or_else(|| ApplyError::UnknownItem(id.clone()))??;
        Ok(next)
    }
}

fn observe(op: &'static str, id: &BatchId, result: &Result<TrackableItem, ApplyError>) {
    let outcome = match result {
        Ok(item) => {
            tracing::info!(
                op,
                id = %id,
                version = item.version(),
                status = %status_label(item),
                "item committed"
            );
            "ok"
        }
        Err(e) => {
            let kind = e.kind();
            match kind {
                ErrorKind::StorageFailure => {
                    tracing::error!(op, id = %id, error = %e, "durable write failed")
                }
                _ => tracing::warn!(op, id = %id, kind = %kind, error = %e, "operation rejected"),
            }
            kind.as_str()
        }
    };
    metrics::counter!("rxtrace_transitions_total", "op" => op, "outcome" => outcome).increment(1);
}

fn status_label(item: &TrackableItem) -> String {
    match item.custody() {
        Some(c) => c.status().to_string(),
        None => item.batch_status().to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
