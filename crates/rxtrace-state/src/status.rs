//! # Statuses and Item Kinds
//!
//! One status field serves two mutually exclusive modes, selected by the
//! item's [`ItemKind`]:
//!
//! ```text
//! physical_shipment:
//!   Pending ──▶ In-Transit ──▶ Delivered (terminal)
//!      │  ▲         ▲
//!      ▼  │         │
//!   Requires-Approval
//!
//! regulatory_submission:
//!   Requires-Approval ──▶ In-Review ──▶ Approved (terminal)
//!                              │
//!                              └──────▶ Rejected (terminal)
//! ```
//!
//! `Requires-Approval` is the only status shared by both modes. Which edges
//! exist, and who may take them, is defined in [`crate::custody`].

use serde::{Deserialize, Serialize};

use rxtrace_core::ValidationError;

/// Status of an item in the custody phase.
///
/// Wire names are `SCREAMING_SNAKE_CASE`; the hyphenated display names
/// (`In-Transit`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    /// Awaiting dispatch by the current holder.
    #[serde(alias = "Pending")]
    Pending,
    /// Held for a Regulator decision.
    #[serde(alias = "Requires-Approval", alias = "RequiresApproval")]
    RequiresApproval,
    /// Moving between custodians.
    #[serde(alias = "In-Transit", alias = "InTransit")]
    InTransit,
    /// Accepted at the destination (terminal).
    #[serde(alias = "Delivered")]
    Delivered,
    /// Submission under Regulator review.
    #[serde(alias = "In-Review", alias = "InReview")]
    InReview,
    /// Submission approved (terminal).
    #[serde(alias = "Approved")]
    Approved,
    /// Submission rejected (terminal).
    #[serde(alias = "Rejected")]
    Rejected,
}

impl CustodyStatus {
    /// All statuses.
    pub const ALL: [CustodyStatus; 7] = [
        Self::Pending,
        Self::RequiresApproval,
        Self::InTransit,
        Self::Delivered,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::RequiresApproval => "REQUIRES_APPROVAL",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Human-facing name (`In-Transit`).
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::RequiresApproval => "Requires-Approval",
            Self::InTransit => "In-Transit",
            Self::Delivered => "Delivered",
            Self::InReview => "In-Review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse any accepted spelling: wire name, display name, or either with
    /// spaces, hyphens or underscores in any case.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let folded = fold(s);
        Self::ALL
            .into_iter()
            .find(|status| fold(status.as_str()) == folded)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustodyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Which status mode an item follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A physical consignment moving between custodians.
    PhysicalShipment,
    /// A dossier submitted for regulatory review.
    RegulatorySubmission,
}

impl ItemKind {
    /// Status a newly opened item starts in.
    pub fn initial_status(&self) -> CustodyStatus {
        match self {
            Self::PhysicalShipment => CustodyStatus::Pending,
            Self::RegulatorySubmission => CustodyStatus::RequiresApproval,
        }
    }

    /// Statuses that belong to this mode.
    pub fn statuses(&self) -> &'static [CustodyStatus] {
        match self {
            Self::PhysicalShipment => &[
                CustodyStatus::Pending,
                CustodyStatus::RequiresApproval,
                CustodyStatus::InTransit,
                CustodyStatus::Delivered,
            ],
            Self::RegulatorySubmission => &[
                CustodyStatus::RequiresApproval,
                CustodyStatus::InReview,
                CustodyStatus::Approved,
                CustodyStatus::Rejected,
            ],
        }
    }

    /// Whether `status` belongs to this mode.
    pub fn allows(&self, status: CustodyStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// Whether `status` is terminal in this mode.
    pub fn is_terminal(&self, status: CustodyStatus) -> bool {
        match self {
            Self::PhysicalShipment => status == CustodyStatus::Delivered,
            Self::RegulatorySubmission => {
                matches!(status, CustodyStatus::Approved | CustodyStatus::Rejected)
            }
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhysicalShipment => "physical_shipment",
            Self::RegulatorySubmission => "regulatory_submission",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "physicalshipment" | "physical" | "shipment" => Ok(Self::PhysicalShipment),
            "regulatorysubmission" | "submission" | "regulatory" => {
                Ok(Self::RegulatorySubmission)
            }
            _ => Err(ValidationError::UnknownKind(s.to_string())),
        }
    }
}

/// Status of a production batch.
///
/// `Shipped` is never stored. It is reported for items in the custody phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Being manufactured.
    #[serde(alias = "InProduction", alias = "In-Production")]
    InProduction,
    /// Released and awaiting shipment.
    #[serde(alias = "ReadyForShipment", alias = "Ready-For-Shipment")]
    ReadyForShipment,
    /// Entered the custody chain.
    #[serde(alias = "Shipped")]
    Shipped,
}

impl BatchStatus {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProduction => "IN_PRODUCTION",
            Self::ReadyForShipment => "READY_FOR_SHIPMENT",
            Self::Shipped => "SHIPPED",
        }
    }

    /// Valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [BatchStatus] {
        match self {
            Self::InProduction => &[Self::ReadyForShipment],
            Self::ReadyForShipment => &[Self::Shipped],
            Self::Shipped => &[],
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
