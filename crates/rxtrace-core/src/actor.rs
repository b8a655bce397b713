//! Actors: the people and organisations that hold, receive or oversee goods.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::ActorId;
use crate::role::Role;

/// A WGS84 coordinate. Display-only; the core never routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub lat: f64,
    /// Longitude in degrees, `-180..=180`.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a validated coordinate.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        let ok = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if ok {
            Ok(Self { lat, lon })
        } else {
            Err(ValidationError::GeoOutOfRange { lat, lon })
        }
    }
}

/// Reference data for a participant in the custody chain.
///
/// `name` is the custody key: history entries and the `currentHolderName`
/// projection record names, not ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Stable identifier.
    pub id: ActorId,
    /// Display name, unique within a directory.
    pub name: String,
    /// Role in the custody chain.
    pub role: Role,
    /// Free-text location. Compared against shipment destinations.
    pub location: String,
    /// Optional coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
}

impl Actor {
    /// Create a validated actor. Name and location are trimmed.
    pub fn new(
        id: ActorId,
        name: impl Into<String>,
        role: Role,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let actor = Self {
            id,
            name: name.into().trim().to_string(),
            role,
            location: location.into().trim().to_string(),
            geo: None,
        };
        actor.validate()?;
        Ok(actor)
    }

    /// Attach a coordinate.
    pub fn with_geo(mut self, geo: GeoPoint) -> Self {
        self.geo = Some(geo);
        self
    }

    /// Check field-level invariants. Used after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("actor name"));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::BlankField("actor location"));
        }
        if let Some(geo) = self.geo {
            GeoPoint::new(geo.lat, geo.lon)?;
        }
        Ok(())
    }

    /// Whether this actor is located at `place`.
    ///
    /// Case-insensitive, surrounding whitespace ignored.
    pub fn is_located_at(&self, place: &str) -> bool {
        same_place(&self.location, place)
    }
}

/// Location equality used throughout custody checks.
pub fn same_place(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Holder-name equality. Names are case-sensitive and compared trimmed, the
/// same way the directory keys them.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Actor {
        Actor::new(
            ActorId::new("act-alice").unwrap(),
            "Alice Manufacturer",
            Role::Manufacturer,
            "Basel",
        )
        .unwrap()
    }

    #[test]
    fn test_location_match_ignores_case_and_padding() {
        let a = alice();
        assert!(a.is_located_at("basel"));
        assert!(a.is_located_at("  BASEL "));
        assert!(!a.is_located_at("Zurich"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = Actor::new(ActorId::new("a1").unwrap(), "  ", Role::Patient, "Home").unwrap_err();
        assert_eq!(err, ValidationError::BlankField("actor name"));
    }

    #[test]
    fn test_geo_range_checked() {
        assert!(GeoPoint::new(47.56, 7.59).is_ok());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_serde_camel_case_and_optional_geo() {
        let json = serde_json::to_value(alice()).unwrap();
        assert_eq!(json["name"], "Alice Manufacturer");
        assert_eq!(json["role"], "manufacturer");
        assert!(json.get("geo").is_none());

        let with_geo = alice().with_geo(GeoPoint::new(47.5, 7.6).unwrap());
        let back: Actor =
            serde_json::from_value(serde_json::to_value(&with_geo).unwrap()).unwrap();
        assert_eq!(back, with_geo);
    }

    #[test]
    fn names_match_exactly_after_trimming() {
        assert!(same_name(" Dan Distributor ", "Dan Distributor"));
        assert!(!same_name("dan distributor", "Dan Distributor"));
        assert!(same_place("frankfurt", " Frankfurt "));
    }
}
