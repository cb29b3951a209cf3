// Hostel catalog: the canonical record shape and the read-only collection the
// listing, comparison and cost pages all work from.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
    path::Path,
    sync::OnceLock,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// Catalog shipped with the crate
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../samples/hostels.json");
pub const SAMPLE_CATALOG_PATH: &str = "samples/hostels.json";

// Choices of the college picker; each one is used as a `FilterCriteria::area`
pub const COLLEGES: [&str; 10] = [
    "Delhi University North Campus",
    "Delhi University South Campus",
    "Hansraj College",
    "St. Stephen's College",
    "Miranda House",
    "Lady Shri Ram College",
    "Hindu College",
    "Ramjas College",
    "Kirori Mal College",
    "Sri Venkateswara College",
];

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

// Error types for catalog loading
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate hostel id: {0}")]
    DuplicateId(HostelId),

    #[error("Hostel {id}: room type {room_type:?} is not both listed and priced")]
    RoomTypeMismatch { id: HostelId, room_type: String },

    #[error("Hostel {id}: room type {room_type:?} listed more than once")]
    DuplicateRoomType { id: HostelId, room_type: String },

    #[error("Hostel {id}: price {price} does not match lowest room price {lowest:?}")]
    PriceMismatch {
        id: HostelId,
        price: u64,
        lowest: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostelId(pub u32);

impl fmt::Display for HostelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for HostelId {
    fn from(id: u32) -> Self {
        HostelId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessType {
    Veg,
    NonVeg,
    Both,
    None,
}

impl MessType {
    pub fn label(&self) -> &'static str {
        match self {
            MessType::Veg => "Vegetarian",
            MessType::NonVeg => "Non-Vegetarian",
            MessType::Both => "Veg & Non-Veg",
            MessType::None => "No mess",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenderPolicy {
    Boys,
    Girls,
    CoEd,
}

impl GenderPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            GenderPolicy::Boys => "Boys",
            GenderPolicy::Girls => "Girls",
            GenderPolicy::CoEd => "Co-ed",
        }
    }
}

// Per-category review scores, 0.0..=5.0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubRatings {
    pub cleanliness: f64,
    pub staff: f64,
    pub facilities: f64,
    pub location: f64,
    pub value: f64,
    pub food: f64,
}

/// One hostel in the catalog.
///
/// Money is whole rupees per month unless noted, distances are kilometres.
/// `pricing` and `room_types` describe the same set of room labels; `price`
/// is the lowest entry of `pricing` and is what summary cards show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostel {
    pub id: HostelId,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    pub hostel_type: String,
    pub gender: GenderPolicy,
    pub price: u64,
    pub distance_to_college: f64,
    pub distance_to_metro: f64,
    pub rating: f64,
    pub review_count: u32,
    pub security_deposit: u64,
    pub total_rooms: u32,
    pub pricing: BTreeMap<String, u64>,
    pub room_types: Vec<String>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    pub mess_type: MessType,
    #[serde(default)]
    pub mess_fee: Option<u64>,
    pub electricity_included: bool,
    // months
    #[serde(default)]
    pub minimum_stay: Option<u32>,
    #[serde(default)]
    pub payment_options: Option<Vec<String>>,
    #[serde(default)]
    pub nearby_landmarks: Option<Vec<String>>,
    #[serde(default)]
    pub ratings: Option<SubRatings>,
    pub listed_on: NaiveDate,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,
}

impl Hostel {
    /// Monthly price of a room type, `None` when the hostel does not offer it.
    pub fn room_price(&self, room_type: &str) -> Option<u64> {
        self.pricing.get(room_type).copied()
    }

    /// Price shown on a summary card: the cheapest room type.
    pub fn summary_price(&self) -> u64 {
        self.pricing.values().copied().min().unwrap_or(self.price)
    }

    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.contains(amenity)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut listed = HashSet::new();
        for room_type in &self.room_types {
            if !listed.insert(room_type.as_str()) {
                return Err(CatalogError::DuplicateRoomType {
                    id: self.id,
                    room_type: room_type.clone(),
                });
            }
            if !self.pricing.contains_key(room_type) {
                return Err(CatalogError::RoomTypeMismatch {
                    id: self.id,
                    room_type: room_type.clone(),
                });
            }
        }

        if let Some(unlisted) = self.pricing.keys().find(|k| !listed.contains(k.as_str())) {
            return Err(CatalogError::RoomTypeMismatch {
                id: self.id,
                room_type: unlisted.clone(),
            });
        }

        let lowest = self.pricing.values().copied().min();
        if lowest != Some(self.price) {
            return Err(CatalogError::PriceMismatch {
                id: self.id,
                price: self.price,
                lowest,
            });
        }

        Ok(())
    }
}

/// Read-only hostel collection, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    hostels: Vec<Hostel>,
}

impl Catalog {
    pub fn new(hostels: Vec<Hostel>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for hostel in &hostels {
            if !seen.insert(hostel.id) {
                return Err(CatalogError::DuplicateId(hostel.id));
            }
            hostel.validate()?;
        }

        debug!(count = hostels.len(), "catalog loaded");
        Ok(Self { hostels })
    }

    /// The catalog embedded in the crate, parsed on first use and kept for the
    /// lifetime of the process.
    pub fn builtin() -> &'static Catalog {
        BUILTIN.get_or_init(|| {
            Catalog::from_json(BUILTIN_CATALOG_JSON).expect("embedded hostel catalog is valid")
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let hostels: Vec<Hostel> =
            serde_json::from_str(json).map_err(|e| CatalogError::JsonParseError(e.to_string()))?;
        Self::new(hostels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(&self.hostels)
            .map_err(|e| CatalogError::JsonParseError(e.to_string()))
    }

    pub fn get(&self, id: HostelId) -> Option<&Hostel> {
        self.hostels.iter().find(|h| h.id == id)
    }

    pub fn hostels(&self) -> &[Hostel] {
        &self.hostels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hostel> {
        self.hostels.iter()
    }

    pub fn len(&self) -> usize {
        self.hostels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostels.is_empty()
    }

    // Every amenity tag offered anywhere in the catalog, sorted
    pub fn amenity_tags(&self) -> BTreeSet<&str> {
        self.hostels
            .iter()
            .flat_map(|h| h.amenities.iter().map(String::as_str))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Hostel;
    type IntoIter = std::slice::Iter<'a, Hostel>;

    fn into_iter(self) -> Self::IntoIter {
        self.hostels.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::hostel;
    use super::*;
    use crate::filter::FilterCriteria;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 8);

        let sunrise = catalog.get(HostelId(1)).unwrap();
        assert_eq!(sunrise.name, "Sunrise Hostel");
        assert_eq!(sunrise.room_price("Double"), Some(12000));
        assert_eq!(sunrise.summary_price(), sunrise.price);
        assert_eq!(sunrise.mess_type, MessType::Both);
        assert!(sunrise.has_amenity("Library"));

        // same instance every time
        assert!(std::ptr::eq(catalog, Catalog::builtin()));
    }

    #[test]
    fn test_builtin_catalog_invariants() {
        for h in Catalog::builtin() {
            assert!(h.validate().is_ok(), "hostel {} invalid", h.id);
            assert_eq!(h.room_types.len(), h.pricing.len());
            assert_eq!(h.summary_price(), h.price);
        }
    }

    #[test]
    fn test_load_sample_file() {
        let result = Catalog::load(SAMPLE_CATALOG_PATH);
        assert!(
            result.is_ok(),
            "Failed to load sample catalog: {:?}",
            result.err()
        );
        assert_eq!(&result.unwrap(), Catalog::builtin());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Catalog::load("samples/does_not_exist.json");
        assert!(matches!(result, Err(CatalogError::IoError(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = Catalog::from_json("[{\"id\": 1}");
        assert!(matches!(result, Err(CatalogError::JsonParseError(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_records() {
        let catalog = Catalog::builtin();
        let json = catalog.to_json().unwrap();
        assert_eq!(&Catalog::from_json(&json).unwrap(), catalog);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(vec![hostel(1, 9000), hostel(1, 9500)]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(HostelId(1)))));
    }

    #[test]
    fn test_room_type_without_price_rejected() {
        let mut h = hostel(1, 9000);
        h.room_types.push("Single".to_string());
        assert!(matches!(
            h.validate(),
            Err(CatalogError::RoomTypeMismatch { room_type, .. }) if room_type == "Single"
        ));
    }

    #[test]
    fn test_price_without_room_type_rejected() {
        let mut h = hostel(1, 9000);
        h.pricing.insert("Triple".to_string(), 9500);
        assert!(matches!(
            h.validate(),
            Err(CatalogError::RoomTypeMismatch { room_type, .. }) if room_type == "Triple"
        ));
    }

    #[test]
    fn test_duplicate_room_type_rejected() {
        let mut h = hostel(1, 9000);
        h.room_types.push("Double".to_string());
        assert!(matches!(
            h.validate(),
            Err(CatalogError::DuplicateRoomType { .. })
        ));
    }

    #[test]
    fn test_price_must_be_lowest_room_price() {
        let mut h = hostel(1, 9000);
        h.pricing.insert("Triple".to_string(), 7000);
        h.room_types.push("Triple".to_string());
        assert!(matches!(
            h.validate(),
            Err(CatalogError::PriceMismatch {
                price: 9000,
                lowest: Some(7000),
                ..
            })
        ));
    }

    #[test]
    fn test_colleges_feed_area_filter() {
        let criteria = FilterCriteria {
            area: Some(COLLEGES[0].to_lowercase()),
            ..FilterCriteria::unrestricted()
        };
        let hits: Vec<u32> = Catalog::builtin()
            .iter()
            .filter(|h| criteria.matches(h))
            .map(|h| h.id.0)
            .collect();
        assert_eq!(hits, vec![1]);

        let unique: BTreeSet<_> = COLLEGES.iter().collect();
        assert_eq!(unique.len(), COLLEGES.len());
    }

    #[test]
    fn test_amenity_tags_union() {
        let catalog = Catalog::new(vec![
            fixtures::with_amenities(hostel(1, 9000), &["WiFi", "AC"]),
            fixtures::with_amenities(hostel(2, 9000), &["WiFi", "Gym"]),
        ])
        .unwrap();
        let tags: Vec<_> = catalog.amenity_tags().into_iter().collect();
        assert_eq!(tags, vec!["AC", "Gym", "WiFi"]);
    }
}
