use alloc::string::String;
use alloc::vec::Vec;

use crate::{Data, IdKey, SortDirection, SourceError};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Sort and filter parameters forwarded with every fetch.
///
/// Changing the query invalidates every cached chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Query {
    pub sort: Vec<SortKey>,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey::new(field, direction));
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::new(field, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sort.is_empty() && self.filters.is_empty()
    }
}

/// A request for `count` items starting at absolute index `start`.
///
/// Sources must respect `start`/`count` exactly; returning fewer items near the end of the
/// dataset is expected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRequest {
    pub start: usize,
    pub count: usize,
    pub query: Query,
}

/// Identifies one in-flight chunk fetch.
///
/// Asynchronous sources hand the ticket back with the result; the cache only stores results whose
/// ticket still matches a loading slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadTicket {
    pub start: usize,
    pub id: u64,
}

/// Outcome of [`DataSource::fetch`].
#[derive(Clone, Debug, PartialEq)]
pub enum Fetch<T, K> {
    /// Items are available immediately.
    Ready(Vec<Data<T, K>>),
    /// The source will deliver the items later through `complete_load`.
    Pending,
}

/// The data-fetch contract consumed by the core.
///
/// Selection lives in the source, not in the viewport: the core only mirrors it into cached
/// [`Data`] wrappers. All methods take `&self`; sources that track selection use interior
/// mutability.
pub trait DataSource {
    type Item;
    type Key: IdKey;

    /// Number of items after any filter is applied.
    fn total(&self) -> usize;

    /// Called with the new sort/filter query before [`Self::total`] is re-read.
    ///
    /// Sources that filter must narrow `total()` to match; the query also arrives with every
    /// [`ItemRequest`].
    fn set_query(&self, _query: &Query) {}

    fn fetch(
        &self,
        request: &ItemRequest,
        ticket: LoadTicket,
    ) -> Result<Fetch<Self::Item, Self::Key>, SourceError>;

    /// Returns whether the selection changed.
    fn set_selected(&self, _index: usize, _selected: bool) -> bool {
        false
    }

    fn select_all(&self) {}

    fn clear_selection(&self) {}

    /// Selects `start..end`.
    fn select_range(&self, start: usize, end: usize) {
        for i in start..end {
            self.set_selected(i, true);
        }
    }

    fn is_selected(&self, _index: usize) -> bool {
        false
    }

    fn selected_indices(&self) -> Vec<usize> {
        Vec::new()
    }

    fn selected_ids(&self) -> Vec<Self::Key> {
        Vec::new()
    }
}
