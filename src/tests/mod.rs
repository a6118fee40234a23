use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::catalog::{FetchError, FetchedPage, PageFetcher, Record, RecordId};
use crate::controller::{ControllerError, NavigationOutcome, SelectStrategy, SelectionController};

#[derive(Clone, Copy, Debug)]
enum Failure {
    Network,
    Decode,
}

// in-memory catalog that records every fetch it serves
#[derive(Debug, Default)]
struct FakeCatalog {
    records: Vec<Record>,
    page_size: usize,
    reported_total: Option<u64>,
    failures: HashMap<u32, Failure>,
    gates: HashMap<u32, Arc<Notify>>,
    calls: Mutex<Vec<u32>>,
}

impl FakeCatalog {
    fn new(total: u64, page_size: usize) -> Self {
        Self::with_ids((1..=total).collect(), page_size)
    }

    fn with_ids(ids: Vec<RecordId>, page_size: usize) -> Self {
        Self {
            records: ids
                .into_iter()
                .map(|id| Record::new(id, format!("Artwork {id}")))
                .collect(),
            page_size,
            ..Default::default()
        }
    }

    fn reporting_total(mut self, total: u64) -> Self {
        self.reported_total = Some(total);
        self
    }

    fn failing(mut self, page: u32, failure: Failure) -> Self {
        self.failures.insert(page, failure);
        self
    }

    fn gated(mut self, page: u32) -> Self {
        self.gates.insert(page, Arc::new(Notify::new()));
        self
    }

    fn gate(&self, page: u32) -> Arc<Notify> {
        self.gates[&page].clone()
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeCatalog {
    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(&self, page: u32) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(page);
        if let Some(gate) = self.gates.get(&page) {
            gate.notified().await;
        }
        match self.failures.get(&page) {
            Some(Failure::Network) => {
                return Err(FetchError::Network {
                    page,
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    )),
                })
            }
            Some(Failure::Decode) => {
                return Err(FetchError::Decode {
                    page,
                    source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
                })
            }
            None => {}
        }
        let start = (page as usize - 1) * self.page_size;
        let records = self
            .records
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(FetchedPage {
            records,
            total_count: self
                .reported_total
                .unwrap_or(self.records.len() as u64),
        })
    }
}

async fn poll_once<Fut: Future + Unpin>(fut: &mut Fut) -> Option<Fut::Output> {
    tokio::select! {
        biased;
        out = fut => Some(out),
        _ = std::future::ready(()) => None,
    }
}

fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().map(|r| r.id).collect()
}

fn set(ids: &[RecordId]) -> HashSet<RecordId> {
    ids.iter().copied().collect()
}

#[tokio::test]
async fn toggle_matches_clear_then_add() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.navigate_to(2).await.unwrap();
    controller.toggle_rows_on_current_page(&set(&[13, 14]), &HashSet::new());
    controller.navigate_to(1).await.unwrap();

    let cases: Vec<(Vec<RecordId>, Vec<RecordId>)> = vec![
        (vec![1, 2, 3], vec![]),
        (vec![2], vec![1, 3]),
        (vec![], vec![2]),
        (vec![4, 12], vec![99, 13]),
        (vec![4, 12, 30], vec![]),
    ];
    let page_ids: HashSet<RecordId> = (1..=12).collect();
    for (selected, deselected) in cases {
        let before: HashSet<RecordId> = controller.selected_ids().into_iter().collect();
        controller.toggle_rows_on_current_page(&set(&selected), &set(&deselected));
        let mut expected: HashSet<RecordId> = before.difference(&page_ids).copied().collect();
        expected.extend(selected.iter().copied());
        let after: HashSet<RecordId> = controller.selected_ids().into_iter().collect();
        assert_eq!(after, expected);
    }
    assert!(controller.is_selected(13));
    assert!(controller.is_selected(14));
}

#[tokio::test]
async fn select_first_n_non_positive_is_noop() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.navigate_to(1).await.unwrap();
    controller.toggle_rows_on_current_page(&set(&[3]), &HashSet::new());

    assert_eq!(controller.select_first_n(0, 25).await.unwrap(), 0);
    assert_eq!(controller.select_first_n(-5, 25).await.unwrap(), 0);
    assert_eq!(controller.selected_ids(), vec![3]);
    assert_eq!(controller.fetcher().calls(), vec![1]);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn select_first_n_caps_at_total() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    assert_eq!(controller.select_first_n(40, 25).await.unwrap(), 25);
    assert_eq!(controller.selected_count(), 25);
    assert_eq!(controller.fetcher().calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn select_first_n_is_idempotent() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.select_first_n(15, 25).await.unwrap();
    let once = controller.selected_ids();
    controller.select_first_n(15, 25).await.unwrap();
    assert_eq!(controller.selected_ids(), once);
}

#[tokio::test]
async fn select_first_n_keeps_existing_selection() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.navigate_to(2).await.unwrap();
    controller.toggle_rows_on_current_page(&set(&[20]), &HashSet::new());

    controller.select_first_n(5, 25).await.unwrap();
    assert_eq!(controller.selected_ids(), vec![1, 2, 3, 4, 5, 20]);
}

#[tokio::test]
async fn clear_selection_empties_everything() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.select_first_n(25, 25).await.unwrap();
    controller.clear_selection();
    assert_eq!(controller.selected_count(), 0);
    controller.clear_selection();
    assert_eq!(controller.selected_count(), 0);
}

#[tokio::test]
async fn visible_selection_is_a_projection() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    controller.navigate_to(1).await.unwrap();
    controller.toggle_rows_on_current_page(&set(&[9, 4, 7]), &HashSet::new());

    let first = controller.visible_selection();
    let second = controller.visible_selection();
    assert_eq!(first, second);
    assert_eq!(ids(&first), vec![4, 7, 9]);

    controller.clear_selection();
    assert!(controller.visible_selection().is_empty());
}

#[tokio::test]
async fn selection_survives_pagination() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));

    controller.navigate_to(1).await.unwrap();
    assert_eq!(ids(&controller.current_page().records), (1..=12).collect::<Vec<_>>());
    controller.toggle_rows_on_current_page(&set(&[2, 5]), &HashSet::new());

    controller.navigate_to(2).await.unwrap();
    assert_eq!(ids(&controller.current_page().records), (13..=24).collect::<Vec<_>>());
    assert!(controller.visible_selection().is_empty());
    assert_eq!(controller.selected_count(), 2);

    controller.navigate_to(1).await.unwrap();
    assert_eq!(ids(&controller.visible_selection()), vec![2, 5]);

    let view = controller.view_state();
    assert_eq!(view.current_page, 1);
    assert_eq!(view.total_records, 25);
    assert_eq!(view.total_pages(), 3);
    assert!(!view.loading);
}

#[tokio::test]
async fn select_first_n_fetches_only_needed_pages() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    assert_eq!(controller.select_first_n(15, 25).await.unwrap(), 15);
    assert_eq!(controller.fetcher().calls(), vec![1, 2]);
    assert_eq!(controller.selected_count(), 15);
    assert_eq!(controller.selected_ids(), (1..=15).collect::<Vec<_>>());
}

#[tokio::test]
async fn failed_bulk_fetch_leaves_selection_untouched() {
    let controller =
        SelectionController::new(FakeCatalog::new(25, 12).failing(3, Failure::Network));
    controller.navigate_to(1).await.unwrap();
    controller.toggle_rows_on_current_page(&set(&[2, 5]), &HashSet::new());

    let err = controller.select_first_n(30, 25).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Fetch(FetchError::Network { page: 3, .. })
    ));
    assert_eq!(controller.selected_ids(), vec![2, 5]);
    assert!(!controller.is_loading());
    assert_eq!(controller.fetcher().calls(), vec![1, 1, 2, 3]);
}

#[tokio::test]
async fn fetch_strategy_uses_real_ids() {
    let sparse: Vec<RecordId> = (1..=20).map(|i| i * 10).collect();
    let controller = SelectionController::new(FakeCatalog::with_ids(sparse, 12));
    controller.select_first_n(14, 20).await.unwrap();
    assert_eq!(
        controller.selected_ids(),
        (1..=14).map(|i| i * 10).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn dense_strategy_selects_without_fetching() {
    let controller =
        SelectionController::with_strategy(FakeCatalog::new(25, 12), SelectStrategy::DenseIds);
    assert_eq!(controller.select_first_n(15, 25).await.unwrap(), 15);
    assert_eq!(controller.selected_ids(), (1..=15).collect::<Vec<_>>());
    assert!(controller.fetcher().calls().is_empty());
}

#[tokio::test]
async fn bulk_select_stops_when_catalog_runs_out() {
    let controller = SelectionController::new(FakeCatalog::new(24, 12).reporting_total(30));
    assert_eq!(controller.select_first_n(30, 30).await.unwrap(), 24);
    assert_eq!(controller.fetcher().calls(), vec![1, 2, 3]);
    assert_eq!(controller.selected_count(), 24);
}

#[tokio::test]
async fn stale_navigation_does_not_overwrite_newer_page() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12).gated(1));
    let gate = controller.fetcher().gate(1);

    let first = controller.navigate_to(1);
    tokio::pin!(first);
    assert!(poll_once(&mut first).await.is_none());
    assert!(controller.is_loading());

    assert_eq!(
        controller.navigate_to(2).await.unwrap(),
        NavigationOutcome::Applied
    );
    assert!(controller.is_loading());

    gate.notify_one();
    assert_eq!(first.await.unwrap(), NavigationOutcome::Stale);
    assert_eq!(controller.view_state().current_page, 2);
    assert_eq!(ids(&controller.current_page().records)[0], 13);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn overlapping_bulk_select_is_rejected() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12).gated(1));
    let gate = controller.fetcher().gate(1);

    let bulk = controller.select_first_n(5, 25);
    tokio::pin!(bulk);
    assert!(poll_once(&mut bulk).await.is_none());

    assert!(matches!(
        controller.select_first_n(3, 25).await,
        Err(ControllerError::Busy)
    ));

    gate.notify_one();
    assert_eq!(bulk.await.unwrap(), 5);
    assert_eq!(controller.selected_count(), 5);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn dropped_bulk_select_releases_loading() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12).gated(1));
    {
        let bulk = controller.select_first_n(5, 25);
        tokio::pin!(bulk);
        assert!(poll_once(&mut bulk).await.is_none());
        assert!(controller.is_loading());
    }
    assert!(!controller.is_loading());
    assert_eq!(controller.selected_count(), 0);
}

#[tokio::test]
async fn failed_navigation_keeps_last_good_page() {
    let controller =
        SelectionController::new(FakeCatalog::new(25, 12).failing(2, Failure::Decode));
    controller.navigate_to(1).await.unwrap();

    let err = controller.navigate_to(2).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Fetch(FetchError::Decode { page: 2, .. })
    ));
    let view = controller.view_state();
    assert_eq!(view.current_page, 1);
    assert_eq!(view.total_records, 25);
    assert_eq!(controller.current_page().records.len(), 12);
    assert!(!view.loading);
}

#[tokio::test]
async fn navigate_to_rejects_page_zero() {
    let controller = SelectionController::new(FakeCatalog::new(25, 12));
    assert!(matches!(
        controller.navigate_to(0).await,
        Err(ControllerError::InvalidPage { page: 0 })
    ));
    assert!(controller.fetcher().calls().is_empty());
}
