// Hostel finder: browse, filter, compare and cost out student hostels

pub mod catalog;
pub mod comparison;
pub mod cost;
pub mod filter;
pub mod listing;

// Re-export key types for convenience
pub use catalog::{
    Catalog, CatalogError, GenderPolicy, Hostel, HostelId, MessType, SubRatings, COLLEGES,
};
pub use comparison::{toggle_comparison_selection, ComparisonSelection, ComparisonTable};
pub use cost::{estimate_cost, CostBreakdown, CostComponent, CostParams};
pub use filter::{apply_filters_and_sort, FilterCriteria, SortKey};
pub use listing::{HostelSearch, ListingConfig, ListingError, ListingService};
