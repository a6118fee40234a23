use std::collections::HashSet;

use crate::catalog::{Record, RecordId};

/// Cross-page set of selected record ids.
///
/// Membership is independent of which page is loaded, so an id can stay
/// selected while its page is not in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn extend<I: IntoIterator<Item = RecordId>>(&mut self, ids: I) {
        self.ids.extend(ids);
    }

    /// Makes the set agree exactly with `selected` for the ids on `page`.
    ///
    /// Every id of `page` is dropped first, then all of `selected` is added.
    /// Ids belonging to other pages are left alone.
    pub fn reconcile_page(&mut self, page: &[Record], selected: &HashSet<RecordId>) {
        for record in page {
            self.ids.remove(&record.id);
        }
        self.ids.extend(selected.iter().copied());
    }

    /// Records of `page` that are selected, in page order.
    pub fn visible<'a>(&self, page: &'a [Record]) -> Vec<&'a Record> {
        page.iter().filter(|r| self.ids.contains(&r.id)).collect()
    }

    pub fn sorted_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
