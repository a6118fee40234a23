use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Navigation,
    Bulk,
}

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    navigations: usize,
    bulk: bool,
}

impl InFlight {
    pub(crate) fn is_loading(&self) -> bool {
        self.navigations > 0 || self.bulk
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a fetch as in flight for as long as it is alive.
///
/// Dropping the guard releases the mark on every exit path, including `?`
/// returns and futures dropped mid-await.
#[derive(Debug)]
pub(crate) struct LoadingGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    kind: FetchKind,
}

impl<'a> LoadingGuard<'a> {
    /// Bulk fetches are exclusive: they are refused while anything else is
    /// in flight. Navigations may overlap each other and a bulk fetch.
    pub(crate) fn acquire(in_flight: &'a Mutex<InFlight>, kind: FetchKind) -> Option<Self> {
        let mut state = lock(in_flight);
        match kind {
            FetchKind::Bulk => {
                if state.is_loading() {
                    return None;
                }
                state.bulk = true;
            }
            FetchKind::Navigation => state.navigations += 1,
        }
        Some(Self { in_flight, kind })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.in_flight);
        match self.kind {
            FetchKind::Bulk => state.bulk = false,
            FetchKind::Navigation => state.navigations = state.navigations.saturating_sub(1),
        }
    }
}
