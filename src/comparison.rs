// Side-by-side comparison: the bounded selection and the rows the comparison
// view renders for it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::{Catalog, Hostel, HostelId, SubRatings};

pub const MAX_COMPARISON: usize = 3;

/// Hostels picked for comparison, oldest pick first.
///
/// Holds at most [`MAX_COMPARISON`] distinct ids. Picking a fourth evicts the
/// oldest pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSelection {
    ids: Vec<HostelId>,
}

impl ComparisonSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selection after toggling `id`; `self` is left untouched.
    pub fn toggle(&self, id: HostelId) -> ComparisonSelection {
        let mut next = self.clone();
        next.toggle_in_place(id);
        next
    }

    pub fn toggle_in_place(&mut self, id: HostelId) {
        if let Some(pos) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(pos);
            trace!(%id, "deselected for comparison");
            return;
        }

        if self.ids.len() >= MAX_COMPARISON {
            let evicted = self.ids.remove(0);
            trace!(%evicted, "comparison full, evicted oldest");
        }
        self.ids.push(id);
        trace!(%id, size = self.ids.len(), "selected for comparison");
    }

    pub fn can_compare(&self) -> bool {
        self.ids.len() >= 2
    }

    pub fn contains(&self, id: HostelId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[HostelId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    // Ids missing from the catalog are skipped
    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Hostel> {
        self.ids.iter().filter_map(|id| catalog.get(*id)).collect()
    }
}

/// Slice form of [`ComparisonSelection::toggle`].
pub fn toggle_comparison_selection(selection: &[HostelId], id: HostelId) -> Vec<HostelId> {
    let mut next = selection.to_vec();
    if let Some(pos) = next.iter().position(|selected| *selected == id) {
        next.remove(pos);
    } else {
        if next.len() >= MAX_COMPARISON {
            next.remove(0);
        }
        next.push(id);
    }
    next
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonTab {
    Overview,
    Pricing,
    Amenities,
    Location,
    Reviews,
}

impl ComparisonTab {
    pub const ALL: [ComparisonTab; 5] = [
        ComparisonTab::Overview,
        ComparisonTab::Pricing,
        ComparisonTab::Amenities,
        ComparisonTab::Location,
        ComparisonTab::Reviews,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComparisonTab::Overview => "Overview",
            ComparisonTab::Pricing => "Pricing",
            ComparisonTab::Amenities => "Amenities",
            ComparisonTab::Location => "Location",
            ComparisonTab::Reviews => "Reviews",
        }
    }
}

// One labelled row, one value per compared hostel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub label: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSection {
    pub tab: ComparisonTab,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub hostels: Vec<HostelId>,
    pub names: Vec<String>,
    pub sections: Vec<ComparisonSection>,
}

impl ComparisonTable {
    pub fn build(hostels: &[&Hostel]) -> Self {
        let sections = ComparisonTab::ALL
            .into_iter()
            .map(|tab| ComparisonSection {
                tab,
                rows: match tab {
                    ComparisonTab::Overview => overview_rows(hostels),
                    ComparisonTab::Pricing => pricing_rows(hostels),
                    ComparisonTab::Amenities => amenity_rows(hostels),
                    ComparisonTab::Location => location_rows(hostels),
                    ComparisonTab::Reviews => review_rows(hostels),
                },
            })
            .collect();

        Self {
            hostels: hostels.iter().map(|h| h.id).collect(),
            names: hostels.iter().map(|h| h.name.clone()).collect(),
            sections,
        }
    }

    pub fn section(&self, tab: ComparisonTab) -> Option<&ComparisonSection> {
        self.sections.iter().find(|s| s.tab == tab)
    }

    pub fn row(&self, tab: ComparisonTab, label: &str) -> Option<&ComparisonRow> {
        self.section(tab)?.rows.iter().find(|r| r.label == label)
    }
}

fn row(label: &str, hostels: &[&Hostel], render: impl Fn(&Hostel) -> String) -> ComparisonRow {
    ComparisonRow {
        label: label.to_string(),
        values: hostels.iter().map(|h| render(*h)).collect(),
    }
}

fn overview_rows(hostels: &[&Hostel]) -> Vec<ComparisonRow> {
    vec![
        row("Type", hostels, |h| h.hostel_type.clone()),
        row("Gender", hostels, |h| h.gender.label().to_string()),
        row("Total Rooms", hostels, |h| h.total_rooms.to_string()),
        row("Room Types", hostels, |h| h.room_types.join(", ")),
        row("Mess Type", hostels, |h| h.mess_type.label().to_string()),
        row("Check-in Time", hostels, |h| {
            h.check_in_time.clone().unwrap_or_else(|| "Flexible".to_string())
        }),
        row("Check-out Time", hostels, |h| {
            h.check_out_time.clone().unwrap_or_else(|| "Flexible".to_string())
        }),
        row("Distance to College", hostels, |h| {
            format_km(h.distance_to_college)
        }),
        row("Distance to Metro", hostels, |h| format_km(h.distance_to_metro)),
        row("Rating", hostels, |h| {
            format!("{:.1} ({} reviews)", h.rating, h.review_count)
        }),
    ]
}

fn pricing_rows(hostels: &[&Hostel]) -> Vec<ComparisonRow> {
    // every room type on offer, first-seen order
    let mut room_types: Vec<&str> = Vec::new();
    for h in hostels {
        for room_type in &h.room_types {
            if !room_types.contains(&room_type.as_str()) {
                room_types.push(room_type);
            }
        }
    }

    let mut rows: Vec<ComparisonRow> = room_types
        .into_iter()
        .map(|room_type| {
            row(room_type, hostels, |h| match h.room_price(room_type) {
                Some(price) => format!("{}/month", format_rupees(price)),
                None => "Not available".to_string(),
            })
        })
        .collect();

    rows.push(row("Security Deposit", hostels, |h| {
        format_rupees(h.security_deposit)
    }));
    rows.push(row("Mess Fee", hostels, |h| match h.mess_fee {
        Some(fee) if fee > 0 => format!("{}/month", format_rupees(fee)),
        _ => "Not included".to_string(),
    }));
    rows.push(row("Electricity", hostels, |h| {
        if h.electricity_included {
            "Included".to_string()
        } else {
            "Not included".to_string()
        }
    }));
    rows.push(row("Minimum Stay", hostels, |h| match h.minimum_stay {
        Some(months) => format!("{months} months"),
        None => "No minimum".to_string(),
    }));
    rows.push(row("Payment Options", hostels, |h| match &h.payment_options {
        Some(options) if !options.is_empty() => options.join(", "),
        _ => "Cash only".to_string(),
    }));
    rows
}

fn amenity_rows(hostels: &[&Hostel]) -> Vec<ComparisonRow> {
    let all: BTreeSet<&str> = hostels
        .iter()
        .flat_map(|h| h.amenities.iter().map(String::as_str))
        .collect();

    all.into_iter()
        .map(|amenity| {
            row(amenity, hostels, |h| {
                let present = if h.has_amenity(amenity) { "Yes" } else { "No" };
                present.to_string()
            })
        })
        .collect()
}

fn location_rows(hostels: &[&Hostel]) -> Vec<ComparisonRow> {
    vec![
        row("Full Address", hostels, |h| h.address.clone()),
        row("Neighborhood", hostels, |h| {
            h.neighborhood
                .clone()
                .unwrap_or_else(|| "Not specified".to_string())
        }),
        row("Distance to College", hostels, |h| {
            format_km(h.distance_to_college)
        }),
        row("Distance to Metro", hostels, |h| format_km(h.distance_to_metro)),
        row("Nearby Landmarks", hostels, |h| match &h.nearby_landmarks {
            Some(landmarks) if !landmarks.is_empty() => landmarks.join(", "),
            _ => "Not specified".to_string(),
        }),
    ]
}

fn review_rows(hostels: &[&Hostel]) -> Vec<ComparisonRow> {
    vec![
        row("Overall Rating", hostels, |h| format!("{:.1}", h.rating)),
        sub_rating_row("Cleanliness", hostels, |r: &SubRatings| r.cleanliness),
        sub_rating_row("Staff", hostels, |r: &SubRatings| r.staff),
        sub_rating_row("Facilities", hostels, |r: &SubRatings| r.facilities),
        sub_rating_row("Location", hostels, |r: &SubRatings| r.location),
        sub_rating_row("Value for Money", hostels, |r: &SubRatings| r.value),
        sub_rating_row("Food Quality", hostels, |r: &SubRatings| r.food),
    ]
}

fn sub_rating_row(
    label: &str,
    hostels: &[&Hostel],
    score: fn(&SubRatings) -> f64,
) -> ComparisonRow {
    row(label, hostels, move |h| match &h.ratings {
        Some(ratings) => format!("{:.1}", score(ratings)),
        None => "N/A".to_string(),
    })
}

pub fn format_km(km: f64) -> String {
    format!("{km:.1} km")
}

/// Rupee amount with Indian digit grouping, e.g. `₹2,15,000`.
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("₹{},{}", groups.join(","), tail)
}
