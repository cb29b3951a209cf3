// Filter/sort engine over the hostel catalog

use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{GenderPolicy, Hostel, MessType};

// Reset values of the filter panel
pub const DEFAULT_MAX_PRICE: u64 = 20000;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 5.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sort key: {0}")]
pub struct ParseSortKeyError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Catalog order.
    #[default]
    Recommended,
    PriceAsc,
    PriceDesc,
    DistanceToCollege,
    DistanceToMetro,
    /// Most recently listed first.
    Newest,
    /// Highest rated first.
    Rating,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Recommended,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::DistanceToCollege,
        SortKey::DistanceToMetro,
        SortKey::Newest,
        SortKey::Rating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recommended => "recommended",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::DistanceToCollege => "distance-to-college",
            SortKey::DistanceToMetro => "distance-to-metro",
            SortKey::Newest => "newest",
            SortKey::Rating => "rating",
        }
    }

    fn compare(&self, a: &Hostel, b: &Hostel) -> Ordering {
        match self {
            SortKey::Recommended => Ordering::Equal,
            SortKey::PriceAsc => a.price.cmp(&b.price),
            SortKey::PriceDesc => b.price.cmp(&a.price),
            SortKey::DistanceToCollege => a.distance_to_college.total_cmp(&b.distance_to_college),
            SortKey::DistanceToMetro => a.distance_to_metro.total_cmp(&b.distance_to_metro),
            SortKey::Newest => b.listed_on.cmp(&a.listed_on),
            SortKey::Rating => b.rating.total_cmp(&a.rating),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ParseSortKeyError(s.to_string()))
    }
}

/// Every active filter and the sort order of the listing.
///
/// `None` (or an empty set) means the constraint is off. The engine takes the
/// value as-is; use the setters or [`FilterCriteria::normalized`] to keep the
/// price range ordered before handing it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub max_distance_to_college: Option<f64>,
    pub max_distance_to_metro: Option<f64>,
    #[serde(default)]
    pub mess_types: BTreeSet<MessType>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    pub gender: Option<GenderPolicy>,
    // case-insensitive substring of the address, e.g. a campus name
    pub area: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_price: None,
            max_price: Some(DEFAULT_MAX_PRICE),
            max_distance_to_college: Some(DEFAULT_MAX_DISTANCE_KM),
            max_distance_to_metro: Some(DEFAULT_MAX_DISTANCE_KM),
            mess_types: BTreeSet::new(),
            amenities: BTreeSet::new(),
            gender: None,
            area: None,
            sort: SortKey::Recommended,
        }
    }
}

impl FilterCriteria {
    /// Criteria that let every hostel through, in catalog order.
    pub fn unrestricted() -> Self {
        Self {
            max_price: None,
            max_distance_to_college: None,
            max_distance_to_metro: None,
            ..Default::default()
        }
    }

    // Moving the floor above the ceiling drags the ceiling up with it
    pub fn set_min_price(&mut self, min: Option<u64>) {
        self.min_price = min;
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                self.max_price = Some(min);
            }
        }
    }

    // Moving the ceiling below the floor drags the floor down with it
    pub fn set_max_price(&mut self, max: Option<u64>) {
        self.max_price = max;
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if max < min {
                self.min_price = Some(max);
            }
        }
    }

    pub fn toggle_amenity(&mut self, amenity: &str) {
        if !self.amenities.remove(amenity) {
            self.amenities.insert(amenity.to_string());
        }
    }

    pub fn toggle_mess_type(&mut self, mess_type: MessType) {
        if !self.mess_types.remove(&mess_type) {
            self.mess_types.insert(mess_type);
        }
    }

    /// Copy with an inverted price range swapped back into order.
    pub fn normalized(&self) -> Self {
        let mut criteria = self.clone();
        if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
            if min > max {
                criteria.min_price = Some(max);
                criteria.max_price = Some(min);
            }
        }
        criteria
    }

    pub fn has_valid_price_range(&self) -> bool {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    /// Whether a single hostel passes every active constraint.
    pub fn matches(&self, hostel: &Hostel) -> bool {
        let min_price_ok = self.min_price.map_or(true, |min| hostel.price >= min);

        let max_price_ok = self.max_price.map_or(true, |max| hostel.price <= max);

        let college_ok = self
            .max_distance_to_college
            .map_or(true, |max| hostel.distance_to_college <= max);

        let metro_ok = self
            .max_distance_to_metro
            .map_or(true, |max| hostel.distance_to_metro <= max);

        let mess_ok = self.mess_types.is_empty() || self.mess_types.contains(&hostel.mess_type);

        let gender_ok = self.gender.map_or(true, |gender| hostel.gender == gender);

        let amenities_ok = self.amenities.is_subset(&hostel.amenities);

        let area_ok = self.area.as_ref().map_or(true, |area| {
            hostel
                .address
                .to_lowercase()
                .contains(&area.to_lowercase())
        });

        min_price_ok
            && max_price_ok
            && college_ok
            && metro_ok
            && mess_ok
            && gender_ok
            && amenities_ok
            && area_ok
    }
}

/// Filters `catalog` by `criteria` and orders the survivors by its sort key.
///
/// The sort is stable, so hostels with equal keys keep their catalog order.
pub fn apply_filters_and_sort(catalog: &[Hostel], criteria: &FilterCriteria) -> Vec<Hostel> {
    let mut filtered: Vec<Hostel> = catalog
        .iter()
        .filter(|hostel| criteria.matches(hostel))
        .cloned()
        .collect();

    if criteria.sort != SortKey::Recommended {
        filtered.sort_by(|a, b| criteria.sort.compare(a, b));
    }

    debug!(
        input = catalog.len(),
        output = filtered.len(),
        sort = %criteria.sort,
        "applied hostel filters"
    );

    filtered
}
