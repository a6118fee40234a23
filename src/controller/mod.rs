mod loading;
pub mod selection;

use std::collections::HashSet;
use std::sync::Mutex;

use thiserror::Error;

use crate::catalog::{FetchError, PageFetcher, Record, RecordId};
use loading::{lock, FetchKind, InFlight, LoadingGuard};
pub use selection::SelectionSet;

/// How `select_first_n` turns a count into record ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectStrategy {
    /// Page through the catalog from page 1 and select the real ids found.
    #[default]
    Fetch,
    /// Assume ids are dense and start at 1 in catalog order; no fetches.
    /// Selects the wrong records if the catalog has id gaps.
    DenseIds,
}

impl SelectStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fetch" | "fetch-based" => Some(Self::Fetch),
            "dense" | "dense-ids" | "index" => Some(Self::DenseIds),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::DenseIds => "dense",
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("another fetch is in progress")]
    Busy,

    #[error("invalid page {page}, pages start at 1")]
    InvalidPage { page: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: usize,
    pub records: Vec<Record>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub current_page: u32,
    pub page_size: usize,
    pub total_records: u64,
    pub loading: bool,
}

impl ViewState {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_records.div_ceil(self.page_size as u64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    Applied,
    /// A newer navigation was issued while this one was in flight; its
    /// result was dropped.
    Stale,
}

#[derive(Debug)]
struct ControllerState {
    selection: SelectionSet,
    page: Page,
    total_records: u64,
    latest_request: u64,
}

/// Owns the cross-page selection and the currently displayed page.
///
/// All methods take `&self`; state lives behind short-lived locks that are
/// never held across a fetch, so a navigation can be awaited while another
/// one is still pending.
#[derive(Debug)]
pub struct SelectionController<F> {
    fetcher: F,
    strategy: SelectStrategy,
    state: Mutex<ControllerState>,
    in_flight: Mutex<InFlight>,
}

impl<F: PageFetcher> SelectionController<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_strategy(fetcher, SelectStrategy::default())
    }

    pub fn with_strategy(fetcher: F, strategy: SelectStrategy) -> Self {
        let page = Page {
            number: 1,
            size: fetcher.page_size(),
            records: Vec::new(),
        };
        Self {
            fetcher,
            strategy,
            state: Mutex::new(ControllerState {
                selection: SelectionSet::new(),
                page,
                total_records: 0,
                latest_request: 0,
            }),
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn strategy(&self) -> SelectStrategy {
        self.strategy
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.in_flight).is_loading()
    }

    pub fn view_state(&self) -> ViewState {
        let loading = self.is_loading();
        let state = lock(&self.state);
        ViewState {
            current_page: state.page.number,
            page_size: state.page.size,
            total_records: state.total_records,
            loading,
        }
    }

    pub fn current_page(&self) -> Page {
        lock(&self.state).page.clone()
    }

    /// Loads `page` and makes it the current page, unless a newer
    /// navigation was issued before this one resolved.
    pub async fn navigate_to(&self, page: u32) -> Result<NavigationOutcome, ControllerError> {
        if page == 0 {
            return Err(ControllerError::InvalidPage { page });
        }
        let token = {
            let mut state = lock(&self.state);
            state.latest_request += 1;
            state.latest_request
        };
        let _guard = LoadingGuard::acquire(&self.in_flight, FetchKind::Navigation)
            .ok_or(ControllerError::Busy)?;

        let fetched = self.fetcher.fetch_page(page).await.map_err(|e| {
            tracing::warn!(page, error = %e, "page navigation failed");
            e
        })?;

        let mut state = lock(&self.state);
        if token != state.latest_request {
            tracing::debug!(page, token, latest = state.latest_request, "discarding stale page");
            return Ok(NavigationOutcome::Stale);
        }
        tracing::debug!(page, records = fetched.records.len(), total = fetched.total_count, "page loaded");
        state.page = Page {
            number: page,
            size: self.fetcher.page_size(),
            records: fetched.records,
        };
        state.total_records = fetched.total_count;
        Ok(NavigationOutcome::Applied)
    }

    /// Applies the table's full list of checked rows for the visible page.
    ///
    /// The current page's ids are removed from the selection and then every
    /// id in `newly_selected` is added. `newly_deselected` has no effect on
    /// the result; any current-page id not in `newly_selected` ends up
    /// unselected.
    pub fn toggle_rows_on_current_page(
        &self,
        newly_selected: &HashSet<RecordId>,
        newly_deselected: &HashSet<RecordId>,
    ) {
        let mut state = lock(&self.state);
        let ControllerState {
            selection, page, ..
        } = &mut *state;
        selection.reconcile_page(&page.records, newly_selected);
        tracing::trace!(
            page = page.number,
            checked = newly_selected.len(),
            unchecked = newly_deselected.len(),
            total = selection.len(),
            "reconciled page selection"
        );
    }

    /// Adds the first `min(n, total_records)` records in catalog order to
    /// the selection. Returns how many records the bulk request covered.
    ///
    /// Purely additive. Nothing is committed unless every needed fetch
    /// succeeds. Refused with `Busy` while any other fetch is in flight.
    pub async fn select_first_n(&self, n: i64, total_records: u64) -> Result<usize, ControllerError> {
        if n <= 0 {
            return Ok(0);
        }
        let target = (n as u64).min(total_records);
        let _guard =
            LoadingGuard::acquire(&self.in_flight, FetchKind::Bulk).ok_or(ControllerError::Busy)?;
        if target == 0 {
            return Ok(0);
        }

        let ids: Vec<RecordId> = match self.strategy {
            SelectStrategy::DenseIds => (1..=target).collect(),
            SelectStrategy::Fetch => self.collect_first(target).await?,
        };

        let mut state = lock(&self.state);
        state.selection.extend(ids.iter().copied());
        tracing::info!(
            requested = n,
            target,
            selected = ids.len(),
            total = state.selection.len(),
            strategy = self.strategy.label(),
            "bulk selection applied"
        );
        Ok(ids.len())
    }

    async fn collect_first(&self, target: u64) -> Result<Vec<RecordId>, ControllerError> {
        let page_size = self.fetcher.page_size().max(1) as u64;
        let pages_needed = u32::try_from(target.div_ceil(page_size)).unwrap_or(u32::MAX);

        let mut collected: Vec<RecordId> = Vec::new();
        for page in 1..=pages_needed {
            let fetched = self.fetcher.fetch_page(page).await.map_err(|e| {
                tracing::warn!(page, error = %e, "bulk selection aborted");
                e
            })?;
            if fetched.records.is_empty() {
                tracing::debug!(page, "catalog exhausted before target");
                break;
            }
            let remaining = usize::try_from(target - collected.len() as u64).unwrap_or(usize::MAX);
            collected.extend(fetched.records.iter().take(remaining).map(|r| r.id));
            if collected.len() as u64 >= target {
                break;
            }
        }
        Ok(collected)
    }

    pub fn clear_selection(&self) {
        lock(&self.state).selection.clear();
    }

    /// Selected records of the current page, in page order.
    pub fn visible_selection(&self) -> Vec<Record> {
        let state = lock(&self.state);
        state
            .selection
            .visible(&state.page.records)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        lock(&self.state).selection.len()
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        lock(&self.state).selection.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<RecordId> {
        lock(&self.state).selection.sorted_ids()
    }
}
