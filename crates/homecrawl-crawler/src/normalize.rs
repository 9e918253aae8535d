//! Normalization from raw map posts to canonical [`Listing`] records.
//!
//! This is the single place where the provider's loosely-typed payload is
//! resolved into strict data: every nested field is presence-checked, the
//! card shape is preferred with fallback to the legacy pin properties, and a
//! post that cannot produce a token, coordinates, size, and per-meter price
//! is dropped rather than emitted with defaults.

use homecrawl_core::{FeatureFlags, Listing, Location};

use crate::parse::{parse_digits_only, parse_localized_number, parse_positive_number};
use crate::provider::types::{Chip, PinDetails, PriceField, RawPost};

/// Area-unit marker in chip titles ("متر" = meter).
const AREA_UNIT_MARKER: &str = "متر";

/// Floor marker ("طبقه"); floor chips also contain the area-unit substring,
/// so the size scan must exclude them.
const FLOOR_MARKER: &str = "طبقه";

/// Label of the per-meter price field ("متری:").
const PRICE_PER_METER_LABEL: &str = "متری:";

/// Label of the total price field ("قیمت:").
const TOTAL_PRICE_LABEL: &str = "قیمت:";

const AGE_MARKERS: [&str; 2] = ["ساخت", "سال"];
const ROOM_MARKERS: [&str; 2] = ["خواب", "اتاق"];

#[derive(Debug, Clone, Copy)]
enum Amenity {
    Elevator,
    Parking,
    Storage,
}

/// Icon-URL substring per amenity. An icon-only chip matching a pattern
/// means the amenity is absent (the provider's crossed-out convention); kept
/// as a table so the quirk rules stay auditable and extensible.
const AMENITY_ICON_RULES: [(Amenity, &str); 3] = [
    (Amenity::Elevator, "elevator"),
    (Amenity::Parking, "parking"),
    (Amenity::Storage, "storage"),
];

/// Normalizes one raw post into a canonical [`Listing`].
///
/// Returns `None` (post dropped) when the token, coordinates, area size, or
/// per-meter price cannot be extracted. Deterministic: the same raw input
/// always yields the same listing or the same drop decision.
#[must_use]
pub fn normalize_post(post: &RawPost) -> Option<Listing> {
    let card = post.map_post_card.as_ref();
    let pin = post.map_pin_feature.as_ref();
    let details = pin
        .and_then(|p| p.properties.as_ref())
        .and_then(|p| p.properties.as_ref());

    let token = card
        .and_then(|c| c.token.clone())
        .or_else(|| details.and_then(|d| d.token.clone()))
        .filter(|t| !t.is_empty())?;

    let lat = pin
        .and_then(|p| p.lat)
        .or_else(|| details.and_then(|d| d.lat))?;
    let lng = pin
        .and_then(|p| p.lon)
        .or_else(|| details.and_then(|d| d.lon))?;

    // Card chips win over pin chips; same source feeds size, extras, and the
    // amenity scan so one post is judged consistently.
    let chips: &[Chip] = card
        .map(|c| c.chips.as_slice())
        .filter(|c| !c.is_empty())
        .or_else(|| details.map(|d| d.chips.as_slice()))
        .unwrap_or(&[]);

    let area_size = extract_area_size(chips)?;

    let price_fields: &[PriceField] = card.map_or(&[], |c| c.price_fields.as_slice());
    let price_per_meter = extract_price_per_meter(price_fields, details)?;
    let total_price = extract_total_price(price_fields, details);

    let title = card
        .and_then(|c| c.title.clone())
        .or_else(|| details.and_then(|d| d.title.clone()))
        .unwrap_or_default();

    let image_url = card
        .and_then(|c| c.images.first().cloned())
        .or_else(|| details.and_then(|d| d.image_url.clone()))
        .filter(|url| !url.is_empty());

    let chip_titles: Vec<String> = chips
        .iter()
        .filter_map(|chip| chip.title.clone())
        .filter(|t| !t.is_empty())
        .collect();

    let building_age = chip_titles
        .iter()
        .find(|t| AGE_MARKERS.iter().any(|m| t.contains(m)))
        .and_then(|t| parse_digits_only(t));
    let floor = chip_titles
        .iter()
        .find(|t| t.contains(FLOOR_MARKER))
        .cloned();
    let room_count = chip_titles
        .iter()
        .find(|t| ROOM_MARKERS.iter().any(|m| t.contains(m)))
        .and_then(|t| parse_digits_only(t));

    Some(Listing {
        token,
        location: Location { lat, lng },
        price_per_meter,
        total_price,
        area_size,
        title,
        subtitle: detail_text(details, |d| d.subtitle.as_ref()),
        subtitle1: detail_text(details, |d| d.subtitle1.as_ref()),
        subtitle2: detail_text(details, |d| d.subtitle2.as_ref()),
        subtitle3: detail_text(details, |d| d.subtitle3.as_ref()),
        features: amenity_flags(chips),
        chips: chip_titles,
        image_url,
        advertiser: detail_field(details, |d| d.source.as_ref()),
        neighborhood: detail_field(details, |d| d.neighborhood.as_ref()),
        created_at: detail_field(details, |d| d.created_at.as_ref()),
        building_age,
        floor,
        room_count,
        raw: raw_value(post),
    })
}

/// Finds the area chip (unit marker present, floor marker absent) and parses
/// its numeric value.
fn extract_area_size(chips: &[Chip]) -> Option<f64> {
    let title = chips.iter().find_map(|chip| {
        chip.title
            .as_deref()
            .filter(|t| t.contains(AREA_UNIT_MARKER) && !t.contains(FLOOR_MARKER))
    })?;
    parse_localized_number(title).filter(|v| v.is_finite())
}

/// Per-meter price: structured field first, legacy `subtitle2` fallback.
fn extract_price_per_meter(
    price_fields: &[PriceField],
    details: Option<&PinDetails>,
) -> Option<f64> {
    if let Some(value) = labeled_price(price_fields, PRICE_PER_METER_LABEL) {
        return Some(value);
    }
    details
        .and_then(|d| d.subtitle2.as_deref())
        .and_then(parse_localized_number)
}

/// Total price: structured field first, legacy `subtitle1` fallback. Zero
/// values mean "price not stated" and collapse to `None`.
fn extract_total_price(price_fields: &[PriceField], details: Option<&PinDetails>) -> Option<f64> {
    if let Some(value) = labeled_price(price_fields, TOTAL_PRICE_LABEL) {
        return Some(value).filter(|v| *v > 0.0);
    }
    details
        .and_then(|d| d.subtitle1.as_deref())
        .and_then(parse_positive_number)
}

fn labeled_price(price_fields: &[PriceField], label: &str) -> Option<f64> {
    price_fields
        .iter()
        .find(|field| field.title.as_deref() == Some(label))
        .and_then(|field| field.value.as_deref())
        .and_then(parse_localized_number)
}

/// Applies the icon rule table. Flags start `true` and only an icon-only
/// chip whose URL names the amenity forces one to `false`.
fn amenity_flags(chips: &[Chip]) -> FeatureFlags {
    let mut flags = FeatureFlags::default();
    for chip in chips {
        if !chip.is_icon_only() {
            continue;
        }
        for (amenity, pattern) in AMENITY_ICON_RULES {
            let matches = [&chip.icon_url_light, &chip.icon_url_dark]
                .into_iter()
                .flatten()
                .any(|url| url.contains(pattern));
            if matches {
                match amenity {
                    Amenity::Elevator => flags.has_elevator = false,
                    Amenity::Parking => flags.has_parking = false,
                    Amenity::Storage => flags.has_storage = false,
                }
            }
        }
    }
    flags
}

fn detail_text<'a, F>(details: Option<&'a PinDetails>, field: F) -> String
where
    F: Fn(&'a PinDetails) -> Option<&'a String>,
{
    details.and_then(field).cloned().unwrap_or_default()
}

fn detail_field<'a, F>(details: Option<&'a PinDetails>, field: F) -> Option<String>
where
    F: Fn(&'a PinDetails) -> Option<&'a String>,
{
    details.and_then(field).cloned().filter(|s| !s.is_empty())
}

/// Full raw passthrough for debugging. Serialization of the raw types cannot
/// fail, but the fallback keeps this path total.
fn raw_value(post: &RawPost) -> serde_json::Value {
    serde_json::to_value(post).unwrap_or(serde_json::Value::Null)
}
