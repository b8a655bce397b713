//! # Custody State Machine
//!
//! [`decide`] is a pure function: given an item, the acting actor, a target
//! status, an optional named recipient, the directory snapshot and the
//! current time, it either returns a [`TransitionDecision`] or a
//! [`CustodyError`]. It performs no I/O and mutates nothing; persistence is
//! the applier's job.
//!
//! ## Actor position
//!
//! Evaluated in this order, first match wins:
//!
//! 1. **Regulator**: the actor's role is `Regulator`.
//! 2. **Holder**: the actor's name equals the current holder.
//! 3. **Receiver**: the actor is located at the destination.
//! 4. **Outsider**: anyone else. Always rejected.
//!
//! ## Edges
//!
//! | Mode | From | To | By | New holder |
//! |---|---|---|---|---|
//! | physical | Pending | In-Transit | Holder | named recipient or successor |
//! | physical | Pending | Requires-Approval | Holder | unchanged |
//! | physical | In-Transit | Delivered | Receiver | acting actor |
//! | physical | Requires-Approval | In-Transit | Regulator | pre-approval holder |
//! | physical | Requires-Approval | Pending | Regulator | pre-approval holder |
//! | submission | Requires-Approval | In-Review | Regulator | unchanged |
//! | submission | In-Review | Approved | Regulator | unchanged |
//! | submission | In-Review | Rejected | Regulator | unchanged |
//!
//! Delivery is authorized on location alone. Anyone registered at the
//! destination may accept.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rxtrace_core::{same_name, Actor, ErrorKind, Role, Timestamp};
use rxtrace_directory::{ActorDirectory, DirectoryError};

use crate::history::HistoryEntry;
use crate::item::{Custody, TrackableItem};
use crate::status::{CustodyStatus, ItemKind};

// ─── Actor Position ──────────────────────────────────────────────────

/// How the acting actor relates to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorPosition {
    /// Oversight role.
    Regulator,
    /// Current custodian.
    Holder,
    /// Located at the destination, not the holder.
    Receiver,
    /// No standing on this item.
    Outsider,
}

impl ActorPosition {
    /// Classify `actor` against `custody`.
    pub fn of(actor: &Actor, custody: &Custody) -> Self {
        if actor.role == Role::Regulator {
            Self::Regulator
        } else if same_name(&actor.name, custody.current_holder()) {
            Self::Holder
        } else if actor.is_located_at(custody.destination()) {
            Self::Receiver
        } else {
            Self::Outsider
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regulator => "REGULATOR",
            Self::Holder => "HOLDER",
            Self::Receiver => "RECEIVER",
            Self::Outsider => "OUTSIDER",
        }
    }
}

impl std::fmt::Display for ActorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Edge Tables ─────────────────────────────────────────────────────

/// How the holder is computed when an edge is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderRule {
    /// Holder stays the same.
    Unchanged,
    /// Named recipient, else first actor of the successor role.
    Advance,
    /// The acting actor takes custody.
    Acting,
    /// Restore the holder from before the approval hold.
    PreApproval,
}

/// One permitted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Source status.
    pub from: CustodyStatus,
    /// Target status.
    pub to: CustodyStatus,
    /// Position required to take the edge.
    pub by: ActorPosition,
    /// Holder computation.
    pub holder: HolderRule,
}

const fn edge(
    from: CustodyStatus,
    to: CustodyStatus,
    by: ActorPosition,
    holder: HolderRule,
) -> Edge {
    Edge {
        from,
        to,
        by,
        holder,
    }
}

const PHYSICAL_EDGES: &[Edge] = &[
    edge(
        CustodyStatus::Pending,
        CustodyStatus::InTransit,
        ActorPosition::Holder,
        HolderRule::Advance,
    ),
    edge(
        CustodyStatus::Pending,
        CustodyStatus::RequiresApproval,
        ActorPosition::Holder,
        HolderRule::Unchanged,
    ),
    edge(
        CustodyStatus::InTransit,
        CustodyStatus::Delivered,
        ActorPosition::Receiver,
        HolderRule::Acting,
    ),
    edge(
        CustodyStatus::RequiresApproval,
        CustodyStatus::InTransit,
        ActorPosition::Regulator,
        HolderRule::PreApproval,
    ),
    edge(
        CustodyStatus::RequiresApproval,
        CustodyStatus::Pending,
        ActorPosition::Regulator,
        HolderRule::PreApproval,
    ),
];

const SUBMISSION_EDGES: &[Edge] = &[
    edge(
        CustodyStatus::RequiresApproval,
        CustodyStatus::InReview,
        ActorPosition::Regulator,
        HolderRule::Unchanged,
    ),
    edge(
        CustodyStatus::InReview,
        CustodyStatus::Approved,
        ActorPosition::Regulator,
        HolderRule::Unchanged,
    ),
    edge(
        CustodyStatus::InReview,
        CustodyStatus::Rejected,
        ActorPosition::Regulator,
        HolderRule::Unchanged,
    ),
];

/// The edge table for a mode.
pub fn edges(kind: ItemKind) -> &'static [Edge] {
    match kind {
        ItemKind::PhysicalShipment => PHYSICAL_EDGES,
        ItemKind::RegulatorySubmission => SUBMISSION_EDGES,
    }
}

/// Find the edge `from -> to` in a mode.
pub fn find_edge(kind: ItemKind, from: CustodyStatus, to: CustodyStatus) -> Option<&'static Edge> {
    edges(kind).iter().find(|e| e.from == from && e.to == to)
}

/// Targets reachable from `from` in a mode, regardless of who asks.
pub fn valid_transitions(kind: ItemKind, from: CustodyStatus) -> Vec<CustodyStatus> {
    edges(kind)
        .iter()
        .filter(|e| e.from == from)
        .map(|e| e.to)
        .collect()
}

/// Targets `actor` may request on `item` right now.
///
/// Empty for items outside the custody phase and for outsiders.
pub fn available_transitions(item: &TrackableItem, actor: &Actor) -> Vec<CustodyStatus> {
    let Some(custody) = item.custody() else {
        return Vec::new();
    };
    let position = ActorPosition::of(actor, custody);
    edges(item.kind())
        .iter()
        .filter(|e| e.from == custody.status() && e.by == position)
        .map(|e| e.to)
        .collect()
}

// ─── Decision ────────────────────────────────────────────────────────

/// An accepted transition, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDecision {
    /// Status before.
    pub from_status: CustodyStatus,
    /// Status after.
    pub new_status: CustodyStatus,
    /// Holder after.
    pub new_holder_name: String,
    /// The entry to append.
    pub history_entry: HistoryEntry,
}

/// Reasons a transition is refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustodyError {
    /// The item is still a production batch.
    #[error("item {id} has not entered the custody chain")]
    NotInCustody {
        /// Item id.
        id: String,
    },

    /// Actor lacks standing for this transition.
    #[error("{actor} ({position}) may not move {id} from {from} to {to}")]
    Unauthorized {
        /// Item id.
        id: String,
        /// Acting actor name.
        actor: String,
        /// Actor position.
        position: ActorPosition,
        /// Current status.
        from: CustodyStatus,
        /// Requested status.
        to: CustodyStatus,
    },

    /// No such edge in this mode.
    #[error("{kind} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Item id.
        id: String,
        /// Item kind.
        kind: ItemKind,
        /// Current status.
        from: CustodyStatus,
        /// Requested status.
        to: CustodyStatus,
    },

    /// The current holder is not in the directory.
    #[error("current holder {0:?} is not a registered actor")]
    UnknownHolder(String),

    /// The named recipient is not in the directory.
    #[error("recipient {0:?} is not a registered actor")]
    UnknownRecipient(String),

    /// The named recipient cannot take custody.
    #[error("recipient {name:?} rejected: {reason}")]
    InvalidRecipient {
        /// Recipient name.
        name: String,
        /// Why.
        reason: &'static str,
    },

    /// The holder's role has no successor.
    #[error("{role} has no successor in the custody chain")]
    NoSuccessor {
        /// Holder role.
        role: Role,
    },

    /// No actor is registered with the successor role.
    #[error("no registered {role} to receive custody")]
    NoActorForRole {
        /// Successor role.
        role: Role,
    },
}

impl CustodyError {
    /// The error kind this refusal is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::UnknownHolder(_) | Self::UnknownRecipient(_) => ErrorKind::NotFound,
            Self::NotInCustody { .. }
            | Self::InvalidTransition { .. }
            | Self::InvalidRecipient { .. }
            | Self::NoSuccessor { .. }
            | Self::NoActorForRole { .. } => ErrorKind::InvalidTransition,
        }
    }
}

/// Decide whether `actor` may move `item` to `requested`.
///
/// Refusals, in evaluation order:
///
/// 1. item still in production → `InvalidTransition`
/// 2. outsider → `Unauthorized`, whatever the target
/// 3. no such edge from the current status in this mode (including the
///    current status itself) → `InvalidTransition`
/// 4. edge exists but needs a different position → `Unauthorized`
/// 5. holder resolution failures → `NotFound` / `InvalidTransition`
///
/// The entry timestamp is `max(now, last entry timestamp)`, so the ledger
/// stays monotone under clock skew.
pub fn decide(
    item: &TrackableItem,
    actor: &Actor,
    requested: CustodyStatus,
    recipient: Option<&str>,
    directory: &ActorDirectory,
    now: Timestamp,
) -> Result<TransitionDecision, CustodyError> {
    let custody = item.custody().ok_or_else(|| CustodyError::NotInCustody {
        id: item.id().to_string(),
    })?;
    let from = custody.status();
    let position = ActorPosition::of(actor, custody);

    let unauthorized = || CustodyError::Unauthorized {
        id: item.id().to_string(),
        actor: actor.name.clone(),
        position,
        from,
        to: requested,
    };

    if position == ActorPosition::Outsider {
        return Err(unauthorized());
    }

    let edge = find_edge(item.kind(), from, requested).ok_or_else(|| {
        CustodyError::InvalidTransition {
            id: item.id().to_string(),
            kind: item.kind(),
            from,
            to: requested,
        }
    })?;

    if edge.by != position {
        return Err(unauthorized());
    }

    let recipient = recipient.map(str::trim).filter(|r| !r.is_empty());
    let new_holder = match edge.holder {
        HolderRule::Advance => advance_holder(custody, recipient, directory)?,
        HolderRule::Acting => {
            if let Some(name) = recipient {
                if name != actor.name.trim() {
                    return Err(CustodyError::InvalidRecipient {
                        name: name.to_string(),
                        reason: "only the accepting actor can take delivery",
                    });
                }
            }
            actor.name.clone()
        }
        HolderRule::Unchanged | HolderRule::PreApproval => {
            if let Some(name) = recipient {
                return Err(CustodyError::InvalidRecipient {
                    name: name.to_string(),
                    reason: "this transition does not hand over custody",
                });
            }
            match edge.holder {
                HolderRule::PreApproval => custody
                    .history()
                    .holder_before_run_of(CustodyStatus::RequiresApproval)
                    .to_string(),
                _ => custody.current_holder().to_string(),
            }
        }
    };

    let timestamp = now.max(custody.history().last().timestamp);
    Ok(TransitionDecision {
        from_status: from,
        new_status: requested,
        new_holder_name: new_holder.clone(),
        history_entry: HistoryEntry::new(requested, new_holder, timestamp),
    })
}

/// Resolve who receives custody on an onward shipment.
pub fn advance_holder(
    custody: &Custody,
    recipient: Option<&str>,
    directory: &ActorDirectory,
) -> Result<String, CustodyError> {
    if let Some(name) = recipient {
        let target = directory.by_name(name).map_err(|e| match e {
            DirectoryError::UnknownName(n) => CustodyError::UnknownRecipient(n),
            other => CustodyError::UnknownRecipient(other.to_string()),
        })?;
        if target.role == Role::Regulator {
            return Err(CustodyError::InvalidRecipient {
                name: target.name.clone(),
                reason: "regulators never hold custody",
            });
        }
        if same_name(&target.name, custody.current_holder()) {
            return Err(CustodyError::InvalidRecipient {
                name: target.name.clone(),
                reason: "recipient is already the holder",
            });
        }
        return Ok(target.name.clone());
    }

    let holder = directory
        .by_name(custody.current_holder())
        .map_err(|_| CustodyError::UnknownHolder(custody.current_holder().to_string()))?;
    let next_role = holder
        .role
        .successor()
        .ok_or(CustodyError::NoSuccessor { role: holder.role })?;
    directory
        .first_with_role(next_role)
        .map(|a| a.name.clone())
        .ok_or(CustodyError::NoActorForRole { role: next_role })
}

// ─── Tests ───────────────────────────────────────────────────────────
