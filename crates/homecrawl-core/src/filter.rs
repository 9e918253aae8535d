//! Search criteria forwarded to the upstream provider.

use serde::{Deserialize, Serialize};

/// Who posted the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvertiserType {
    Person,
    Business,
}

impl AdvertiserType {
    /// Provider wire value for the `business-type` filter field.
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            AdvertiserType::Person => "personal",
            AdvertiserType::Business => "real-estate-business",
        }
    }
}

/// Optional constraints applied to every tile query of one crawl.
///
/// `None` on any field means "no constraint on this dimension", not `false`;
/// the provider request omits the field entirely rather than sending a
/// default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balcony: Option<bool>,
    /// Floor area bounds in square meters, `(min, max)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<(u64, u64)>,
    /// Total price bounds, `(min, max)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<(u64, u64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser: Option<AdvertiserType>,
}

impl FilterCriteria {
    /// Returns `true` when no dimension is constrained.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.elevator.is_none()
            && self.parking.is_none()
            && self.balcony.is_none()
            && self.size.is_none()
            && self.price.is_none()
            && self.advertiser.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_criteria_are_unconstrained() {
        assert!(FilterCriteria::default().is_unconstrained());
    }

    #[test]
    fn any_field_makes_criteria_constrained() {
        let filters = FilterCriteria {
            parking: Some(true),
            ..FilterCriteria::default()
        };
        assert!(!filters.is_unconstrained());
    }

    #[test]
    fn advertiser_wire_values() {
        assert_eq!(AdvertiserType::Person.wire_value(), "personal");
        assert_eq!(
            AdvertiserType::Business.wire_value(),
            "real-estate-business"
        );
    }

    #[test]
    fn absent_fields_are_omitted_from_json() {
        let json = serde_json::to_string(&FilterCriteria {
            elevator: Some(true),
            ..FilterCriteria::default()
        })
        .unwrap();
        assert_eq!(json, r#"{"elevator":true}"#);
    }
}
