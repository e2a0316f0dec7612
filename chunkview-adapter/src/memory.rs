use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use chunkview::{Data, DataSource, Fetch, ItemId, ItemRequest, LoadTicket, SourceError};
use parking_lot::{Mutex, RwLock};

/// Keeps items for which it returns `true`.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Orders items for presentation.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

struct Layout<T> {
    filter: Option<Predicate<T>>,
    sort: Option<Comparator<T>>,
    // Positions into `items`, in presentation order.
    order: Vec<usize>,
}

/// An in-memory [`DataSource`] with filtering, sorting and id-keyed selection.
///
/// Filtering and sorting apply to the presentation order only; ids stay attached to their items,
/// so selection survives both. After changing either, call `refresh()` on the list so it re-reads
/// `total()` and drops stale chunks.
///
/// In deferred mode `fetch` answers [`Fetch::Pending`] and records the request; the host resolves
/// it later with [`MemorySource::take_pending`] + [`MemorySource::resolve`] and hands the items to
/// `complete_load`.
pub struct MemorySource<T, K = ItemId> {
    items: Vec<(K, T)>,
    layout: RwLock<Layout<T>>,
    selected: Mutex<HashSet<K>>,
    deferred: bool,
    pending: Mutex<Vec<(ItemRequest, LoadTicket)>>,
}

impl<T> MemorySource<T, ItemId> {
    /// Creates a source whose ids are the items' original positions.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self::new(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i as ItemId, item)),
        )
    }
}

impl<T, K: Hash + Eq + Clone> MemorySource<T, K> {
    pub fn new(items: impl IntoIterator<Item = (K, T)>) -> Self {
        let items: Vec<(K, T)> = items.into_iter().collect();
        let order = (0..items.len()).collect();
        Self {
            items,
            layout: RwLock::new(Layout {
                filter: None,
                sort: None,
                order,
            }),
            selected: Mutex::new(HashSet::new()),
            deferred: false,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Number of items ignoring the filter.
    pub fn len_unfiltered(&self) -> usize {
        self.items.len()
    }

    pub fn set_filter(&self, filter: impl Fn(&T) -> bool + Send + Sync + 'static) {
        let mut layout = self.layout.write();
        layout.filter = Some(Arc::new(filter));
        self.relayout(&mut layout);
    }

    pub fn clear_filter(&self) {
        let mut layout = self.layout.write();
        layout.filter = None;
        self.relayout(&mut layout);
    }

    /// Sorts the presentation order. The sort is stable.
    pub fn set_sort(&self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) {
        let mut layout = self.layout.write();
        layout.sort = Some(Arc::new(cmp));
        self.relayout(&mut layout);
    }

    pub fn clear_sort(&self) {
        let mut layout = self.layout.write();
        layout.sort = None;
        self.relayout(&mut layout);
    }

    fn relayout(&self, layout: &mut Layout<T>) {
        let mut order: Vec<usize> = (0..self.items.len())
            .filter(|&i| layout.filter.as_ref().is_none_or(|f| f(&self.items[i].1)))
            .collect();
        if let Some(cmp) = &layout.sort {
            order.sort_by(|&a, &b| cmp(&self.items[a].1, &self.items[b].1));
        }
        layout.order = order;
        adebug!(
            visible = layout.order.len(),
            total = self.items.len(),
            "MemorySource relayout"
        );
    }

    /// Current index of `id`, if it passes the filter. Suitable as a `key_to_index` mapping.
    pub fn index_of(&self, id: &K) -> Option<usize> {
        let layout = self.layout.read();
        layout.order.iter().position(|&i| self.items[i].0 == *id)
    }

    pub fn id_at(&self, index: usize) -> Option<K> {
        let layout = self.layout.read();
        let &i = layout.order.get(index)?;
        Some(self.items[i].0.clone())
    }

    /// Builds the items answering `request` from the current presentation order.
    ///
    /// Requests reaching past the end are answered short.
    pub fn resolve(&self, request: &ItemRequest) -> Vec<Data<T, K>>
    where
        T: Clone,
    {
        let layout = self.layout.read();
        let selected = self.selected.lock();
        let end = request
            .start
            .saturating_add(request.count)
            .min(layout.order.len());
        let start = request.start.min(end);
        layout.order[start..end]
            .iter()
            .map(|&i| {
                let (id, item) = &self.items[i];
                Data::new(id.clone(), item.clone()).with_selected(selected.contains(id))
            })
            .collect()
    }

    /// Drains the requests recorded in deferred mode, oldest first.
    pub fn take_pending(&self) -> Vec<(ItemRequest, LoadTicket)> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<T: Clone, K: Hash + Eq + Clone> DataSource for MemorySource<T, K> {
    type Item = T;
    type Key = K;

    fn total(&self) -> usize {
        self.layout.read().order.len()
    }

    fn fetch(
        &self,
        request: &ItemRequest,
        ticket: LoadTicket,
    ) -> Result<Fetch<T, K>, SourceError> {
        if request.start >= self.total() {
            return Err(SourceError::new(format!(
                "request starts at {} past the end of {} items",
                request.start,
                self.total()
            )));
        }
        if self.deferred {
            self.pending.lock().push((request.clone(), ticket));
            return Ok(Fetch::Pending);
        }
        Ok(Fetch::Ready(self.resolve(request)))
    }

    fn set_selected(&self, index: usize, selected: bool) -> bool {
        let Some(id) = self.id_at(index) else {
            return false;
        };
        let mut set = self.selected.lock();
        if selected {
            set.insert(id)
        } else {
            set.remove(&id)
        }
    }

    fn select_all(&self) {
        let layout = self.layout.read();
        let mut set = self.selected.lock();
        set.extend(layout.order.iter().map(|&i| self.items[i].0.clone()));
    }

    fn clear_selection(&self) {
        self.selected.lock().clear();
    }

    fn is_selected(&self, index: usize) -> bool {
        self.id_at(index)
            .is_some_and(|id| self.selected.lock().contains(&id))
    }

    fn selected_indices(&self) -> Vec<usize> {
        let layout = self.layout.read();
        let set = self.selected.lock();
        layout
            .order
            .iter()
            .enumerate()
            .filter(|&(_, &i)| set.contains(&self.items[i].0))
            .map(|(pos, _)| pos)
            .collect()
    }

    fn selected_ids(&self) -> Vec<K> {
        let layout = self.layout.read();
        let set = self.selected.lock();
        layout
            .order
            .iter()
            .map(|&i| &self.items[i].0)
            .filter(|id| set.contains(*id))
            .cloned()
            .collect()
    }
}

impl<T, K> std::fmt::Debug for MemorySource<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layout = self.layout.read();
        f.debug_struct("MemorySource")
            .field("items", &self.items.len())
            .field("visible", &layout.order.len())
            .field("filtered", &layout.filter.is_some())
            .field("sorted", &layout.sort.is_some())
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}
