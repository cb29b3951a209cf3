// Listing service: holds the state of the browse page (criteria, visible
// hostels, comparison picks) on top of a read-only catalog.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, Hostel, HostelId},
    comparison::{ComparisonSelection, ComparisonTable},
    cost::{CostBreakdown, CostParams},
    filter::{apply_filters_and_sort, FilterCriteria},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("Unknown hostel: {0}")]
    UnknownHostel(HostelId),
}

#[derive(Debug, Clone)]
pub struct ListingConfig {
    // artificial wait before each search recomputes, 0 disables it
    pub simulated_latency_ms: u64,
    pub similar_limit: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 500,
            similar_limit: 3,
        }
    }
}

impl ListingConfig {
    pub fn instant() -> Self {
        Self {
            simulated_latency_ms: 0,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct ListingStats {
    pub searches: AtomicUsize,
    pub resets: AtomicUsize,
    pub comparison_toggles: AtomicUsize,
}

// Search surface of the browse page
#[async_trait]
pub trait HostelSearch: Send + Sync + 'static {
    // Replace the active criteria and return the recomputed listing
    async fn search(&self, criteria: FilterCriteria) -> Vec<Hostel>;

    // Back to the default criteria
    async fn reset(&self) -> Vec<Hostel>;

    // Hostels currently shown
    fn visible(&self) -> Vec<Hostel>;

    fn hostel(&self, id: HostelId) -> Result<Hostel, ListingError>;
}

#[derive(Debug)]
struct ListingState {
    criteria: FilterCriteria,
    visible: Vec<Hostel>,
    selection: ComparisonSelection,
}

// Counts one search as in flight until dropped, so a cancelled search
// still leaves the count
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ListingService {
    catalog: Arc<Catalog>,
    config: ListingConfig,
    state: RwLock<ListingState>,
    in_flight: AtomicUsize,
    stats: ListingStats,
}

impl ListingService {
    pub fn new(catalog: Arc<Catalog>, config: ListingConfig) -> Self {
        let criteria = FilterCriteria::default();
        let visible = apply_filters_and_sort(catalog.hostels(), &criteria);

        Self {
            catalog,
            config,
            state: RwLock::new(ListingState {
                criteria,
                visible,
                selection: ComparisonSelection::new(),
            }),
            in_flight: AtomicUsize::new(0),
            stats: ListingStats::default(),
        }
    }

    pub fn builtin(config: ListingConfig) -> Self {
        Self::new(Arc::new(Catalog::builtin().clone()), config)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    pub fn stats(&self) -> &ListingStats {
        &self.stats
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.read().criteria.clone()
    }

    // True while any search or reset is still running
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    async fn recompute(&self, criteria: FilterCriteria) -> Vec<Hostel> {
        let _in_flight = InFlight::enter(&self.in_flight);

        if self.config.simulated_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;
        }

        let criteria = criteria.normalized();
        let visible = apply_filters_and_sort(self.catalog.hostels(), &criteria);
        {
            let mut state = self.state.write();
            state.criteria = criteria;
            state.visible = visible.clone();
        }

        visible
    }

    pub fn toggle_compare(&self, id: HostelId) -> ComparisonSelection {
        self.stats.comparison_toggles.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write();
        state.selection.toggle_in_place(id);
        state.selection.clone()
    }

    pub fn selection(&self) -> ComparisonSelection {
        self.state.read().selection.clone()
    }

    pub fn clear_selection(&self) {
        self.state.write().selection.clear();
    }

    // None until at least two hostels are picked
    pub fn comparison(&self) -> Option<ComparisonTable> {
        let selection = self.selection();
        if !selection.can_compare() {
            return None;
        }
        let hostels = selection.resolve(&self.catalog);
        Some(ComparisonTable::build(&hostels))
    }

    /// Other hostels to suggest on a detail page, in catalog order.
    pub fn similar_hostels(&self, id: HostelId, limit: usize) -> Vec<Hostel> {
        self.catalog
            .iter()
            .filter(|h| h.id != id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn similar_to(&self, id: HostelId) -> Vec<Hostel> {
        self.similar_hostels(id, self.config.similar_limit)
    }

    pub fn estimate(
        &self,
        id: HostelId,
        params: &CostParams,
    ) -> Result<CostBreakdown, ListingError> {
        let hostel = self.catalog.get(id).ok_or(ListingError::UnknownHostel(id))?;
        Ok(params.estimate(hostel))
    }
}

#[async_trait]
impl HostelSearch for ListingService {
    async fn search(&self, criteria: FilterCriteria) -> Vec<Hostel> {
        self.stats.searches.fetch_add(1, Ordering::SeqCst);
        let visible = self.recompute(criteria).await;
        info!(found = visible.len(), "hostel search");
        visible
    }

    async fn reset(&self) -> Vec<Hostel> {
        self.stats.resets.fetch_add(1, Ordering::SeqCst);
        debug!("filters reset");
        self.recompute(FilterCriteria::default()).await
    }

    fn visible(&self) -> Vec<Hostel> {
        self.state.read().visible.clone()
    }

    fn hostel(&self, id: HostelId) -> Result<Hostel, ListingError> {
        self.catalog
            .get(id)
            .cloned()
            .ok_or(ListingError::UnknownHostel(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::MessType, comparison::ComparisonTab, filter::SortKey};
    use std::time::Instant;

    fn ids(hostels: &[Hostel]) -> Vec<u32> {
        hostels.iter().map(|h| h.id.0).collect()
    }

    #[test]
    fn test_initial_listing_uses_default_criteria() {
        let service = ListingService::builtin(ListingConfig::instant());
        assert_eq!(service.criteria(), FilterCriteria::default());
        // every sample hostel is under 20000 and within 5 km
        assert_eq!(service.visible().len(), 8);
        assert!(!service.is_loading());
    }

    #[test]
    fn test_search_updates_visible() {
        let service = ListingService::builtin(ListingConfig::instant());
        let mut criteria = FilterCriteria::default();
        criteria.set_max_price(Some(12000));
        criteria.sort = SortKey::PriceAsc;

        let result = tokio_test::block_on(service.search(criteria.clone()));
        assert_eq!(ids(&result), vec![6, 2, 7, 1]);
        assert_eq!(service.visible(), result);
        assert_eq!(service.criteria(), criteria);
        assert_eq!(service.stats().searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_search_normalizes_inverted_range() {
        let service = ListingService::builtin(ListingConfig::instant());
        let criteria = FilterCriteria {
            min_price: Some(14000),
            max_price: Some(12000),
            ..FilterCriteria::unrestricted()
        };

        let result = tokio_test::block_on(service.search(criteria));
        assert_eq!(ids(&result), vec![1, 4, 8]);
        assert_eq!(service.criteria().min_price, Some(12000));
        assert_eq!(service.criteria().max_price, Some(14000));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let service = ListingService::builtin(ListingConfig::instant());
        let mut criteria = FilterCriteria::default();
        criteria.toggle_mess_type(MessType::NonVeg);
        tokio_test::block_on(service.search(criteria));
        assert_eq!(ids(&service.visible()), vec![3, 7]);

        let result = tokio_test::block_on(service.reset());
        assert_eq!(result.len(), 8);
        assert_eq!(service.criteria(), FilterCriteria::default());
    }

    #[tokio::test]
    async fn test_simulated_latency_does_not_change_result() {
        let slow = ListingService::builtin(ListingConfig {
            simulated_latency_ms: 50,
            ..Default::default()
        });
        let fast = ListingService::builtin(ListingConfig::instant());

        let mut criteria = FilterCriteria::default();
        criteria.toggle_amenity("AC");
        criteria.sort = SortKey::DistanceToMetro;

        let started = Instant::now();
        let slow_result = slow.search(criteria.clone()).await;
        assert!(started.elapsed() >= Duration::from_millis(50));

        let fast_result = fast.search(criteria).await;
        assert_eq!(slow_result, fast_result);
        assert!(!slow.is_loading());
    }

    #[tokio::test]
    async fn test_loading_until_last_overlapping_search_finishes() {
        let service = Arc::new(ListingService::builtin(ListingConfig {
            simulated_latency_ms: 200,
            ..Default::default()
        }));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.search(FilterCriteria::default()).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.reset().await }
        });

        first.await.unwrap();
        assert!(service.is_loading());

        second.await.unwrap();
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn test_cancelled_search_is_not_loading() {
        let service = ListingService::builtin(ListingConfig {
            simulated_latency_ms: 1000,
            ..Default::default()
        });

        let search = service.search(FilterCriteria::default());
        let timed_out = tokio::time::timeout(Duration::from_millis(20), search).await;
        assert!(timed_out.is_err());
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn test_shared_service_across_tasks() {
        let service = Arc::new(ListingService::builtin(ListingConfig::instant()));
        let mut handles = vec![];

        for max in [10000u64, 12000, 15000, 20000] {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let criteria = FilterCriteria {
                    max_price: Some(max),
                    ..FilterCriteria::unrestricted()
                };
                service.search(criteria).await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(!result.is_empty());
        }

        // whichever search landed last, state is consistent with its criteria
        let criteria = service.criteria();
        assert_eq!(
            service.visible(),
            apply_filters_and_sort(service.catalog().hostels(), &criteria)
        );
        assert_eq!(service.stats().searches.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_comparison_flow() {
        let service = ListingService::builtin(ListingConfig::instant());
        assert!(service.comparison().is_none());

        service.toggle_compare(HostelId(1));
        assert!(service.comparison().is_none());

        service.toggle_compare(HostelId(3));
        service.toggle_compare(HostelId(5));
        let selection = service.toggle_compare(HostelId(8));
        assert_eq!(selection.ids(), &[HostelId(3), HostelId(5), HostelId(8)]);

        let table = service.comparison().unwrap();
        assert_eq!(table.hostels, selection.ids());
        assert!(table.section(ComparisonTab::Reviews).is_some());

        service.clear_selection();
        assert!(service.selection().is_empty());
    }

    #[test]
    fn test_hostel_lookup_and_similar() {
        let service = ListingService::builtin(ListingConfig::instant());
        assert_eq!(service.hostel(HostelId(3)).unwrap().name, "Metro Residency");
        assert_eq!(
            service.hostel(HostelId(42)),
            Err(ListingError::UnknownHostel(HostelId(42)))
        );

        assert_eq!(ids(&service.similar_to(HostelId(1))), vec![2, 3, 4]);
        assert_eq!(ids(&service.similar_to(HostelId(3))), vec![1, 2, 4]);
        assert_eq!(service.similar_hostels(HostelId(1), 10).len(), 7);
    }

    #[test]
    fn test_estimate_through_service() {
        let service = ListingService::builtin(ListingConfig::instant());
        let hostel = service.hostel(HostelId(1)).unwrap();
        let params = CostParams {
            room_type: "Double".to_string(),
            ..CostParams::defaults_for(&hostel)
        };

        let cost = service.estimate(HostelId(1), &params).unwrap();
        assert_eq!(cost.total, 215000);
        assert_eq!(
            service.estimate(HostelId(99), &params),
            Err(ListingError::UnknownHostel(HostelId(99)))
        );
    }
}
