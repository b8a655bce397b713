//! # Roles and the Custody Order
//!
//! ```text
//! IngredientSupplier ──▶ Manufacturer ──▶ Distributor ──▶ Pharmacy ──▶ Patient
//!
//! Regulator (oversight, never holds custody)
//! ```
//!
//! [`CUSTODY_CHAIN`] is the only place the custodial order is written down.
//! [`Role::successor`] steps one index along it, and both the state machine
//! and the directory's "who can receive this" query go through that method.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The fixed set of actor roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Supplies active ingredients to manufacturers.
    IngredientSupplier,
    /// Produces batches and initiates the first physical shipment.
    Manufacturer,
    /// Wholesale custodian between manufacturer and pharmacy.
    Distributor,
    /// Dispensing custodian.
    Pharmacy,
    /// Final custodian. Has no successor.
    Patient,
    /// Oversight role. Gates approval states; never a holder.
    Regulator,
}

/// Custodial roles in custody order. Regulator is deliberately absent.
pub const CUSTODY_CHAIN: &[Role] = &[
    Role::IngredientSupplier,
    Role::Manufacturer,
    Role::Distributor,
    Role::Pharmacy,
    Role::Patient,
];

impl Role {
    /// All roles, custodial ones first.
    pub const ALL: [Role; 6] = [
        Role::IngredientSupplier,
        Role::Manufacturer,
        Role::Distributor,
        Role::Pharmacy,
        Role::Patient,
        Role::Regulator,
    ];

    /// Position in [`CUSTODY_CHAIN`], `None` for the Regulator.
    pub fn chain_index(&self) -> Option<usize> {
        CUSTODY_CHAIN.iter().position(|r| r == self)
    }

    /// The next custodial role, if any.
    ///
    /// `Patient` and `Regulator` have no successor.
    pub fn successor(&self) -> Option<Role> {
        self.chain_index()
            .and_then(|i| CUSTODY_CHAIN.get(i + 1))
            .copied()
    }

    /// Whether actors of this role may hold custody.
    pub fn is_custodial(&self) -> bool {
        self.chain_index().is_some()
    }

    /// Wire name (`snake_case`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IngredientSupplier => "ingredient_supplier",
            Self::Manufacturer => "manufacturer",
            Self::Distributor => "distributor",
            Self::Pharmacy => "pharmacy",
            Self::Patient => "patient",
            Self::Regulator => "regulator",
        }
    }

    /// Parse a role name.
    ///
    /// Accepts the wire name and the display name in any case, ignoring
    /// spaces, hyphens and underscores (`"Ingredient Supplier"`,
    /// `"ingredient-supplier"`, `"IngredientSupplier"`).
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "ingredientsupplier" | "supplier" => Ok(Self::IngredientSupplier),
            "manufacturer" => Ok(Self::Manufacturer),
            "distributor" => Ok(Self::Distributor),
            "pharmacy" => Ok(Self::Pharmacy),
            "patient" => Ok(Self::Patient),
            "regulator" | "fda" => Ok(Self::Regulator),
            _ => Err(ValidationError::UnknownRole(name.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
