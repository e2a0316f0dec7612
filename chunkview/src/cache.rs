use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::{
    Data, DataSource, Fetch, ItemRange, ItemRequest, LoadError, LoadTicket, Query, SourceError,
};

/// A contiguous block of items fetched together.
#[derive(Clone, Debug)]
pub struct Chunk<T, K> {
    pub start: usize,
    pub end: usize, // exclusive, as requested
    pub items: Vec<Data<T, K>>,
    pub loaded_at: u64,
    pub request: ItemRequest,
}

impl<T, K> Chunk<T, K> {
    pub fn range(&self) -> ItemRange {
        ItemRange::new(self.start, self.end)
    }
}

#[derive(Clone, Debug)]
enum Slot<T, K> {
    Loading { ticket: LoadTicket, request: ItemRequest },
    Ready(Chunk<T, K>),
}

/// Result of an item lookup.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, T, K> {
    Item(&'a Data<T, K>),
    /// The containing chunk has an outstanding fetch.
    Loading,
    NotLoaded,
}

impl<'a, T, K> Lookup<'a, T, K> {
    pub fn item(&self) -> Option<&'a Data<T, K>> {
        match self {
            Self::Item(d) => Some(d),
            _ => None,
        }
    }
}

impl<T, K> Clone for Lookup<'_, T, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, K> Copy for Lookup<'_, T, K> {}

/// Outcome of [`ChunkCache::ensure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ensure {
    /// The chunk was already loaded or loading; no fetch was issued.
    Present,
    /// The source answered synchronously and the chunk is stored.
    Loaded(ItemRange),
    /// A fetch is in flight; deliver its result with [`ChunkCache::complete`].
    Pending(LoadTicket),
    /// The index lies past the end of the dataset.
    OutOfRange,
}

/// Outcome of [`ChunkCache::complete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Stored(ItemRange),
    /// The slot was evicted or invalidated while the fetch was in flight.
    Discarded,
}

/// Fixed-size block cache keyed by chunk start.
///
/// Lookups are O(log n) over at most a handful of chunks; the cache is expected to hold the
/// viewport's chunk plus a one-chunk margin on each side, regardless of dataset size.
#[derive(Clone, Debug)]
pub struct ChunkCache<T, K> {
    chunk_size: usize,
    total: usize,
    query: Query,
    slots: BTreeMap<usize, Slot<T, K>>,
    next_ticket: u64,
    fetches: u64,
}

impl<T, K> ChunkCache<T, K> {
    /// Creates an empty cache. A zero `chunk_size` is treated as one.
    pub fn new(chunk_size: usize, total: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            total,
            query: Query::default(),
            slots: BTreeMap::new(),
            next_ticket: 0,
            fetches: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Start of the chunk containing `index`.
    pub fn chunk_start(&self, index: usize) -> usize {
        (index / self.chunk_size) * self.chunk_size
    }

    /// Number of slots (loaded or loading).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of fetches issued to a data source since construction.
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    pub fn contains_chunk(&self, start: usize) -> bool {
        self.slots.contains_key(&self.chunk_start(start))
    }

    pub fn is_loading(&self, start: usize) -> bool {
        matches!(
            self.slots.get(&self.chunk_start(start)),
            Some(Slot::Loading { .. })
        )
    }

    /// Starts of every slot in ascending order.
    pub fn chunk_starts(&self) -> Vec<usize> {
        self.slots.keys().copied().collect()
    }

    pub fn chunk(&self, start: usize) -> Option<&Chunk<T, K>> {
        match self.slots.get(&self.chunk_start(start))? {
            Slot::Ready(chunk) => Some(chunk),
            Slot::Loading { .. } => None,
        }
    }

    /// Number of items held across all loaded chunks.
    pub fn item_count(&self) -> usize {
        self.slots
            .values()
            .map(|slot| match slot {
                Slot::Ready(chunk) => chunk.items.len(),
                Slot::Loading { .. } => 0,
            })
            .sum()
    }

    /// Updates the dataset length.
    ///
    /// Chunks starting past the new end are dropped, as are chunks that were fetched short and
    /// would now cover more items.
    pub fn set_total(&mut self, total: usize) {
        if self.total == total {
            return;
        }
        self.total = total;
        let chunk_size = self.chunk_size;
        self.slots.retain(|&start, slot| {
            let requested = match slot {
                Slot::Loading { request, .. } => request.count,
                Slot::Ready(chunk) => chunk.request.count,
            };
            start < total && requested >= chunk_size.min(total - start)
        });
    }

    /// Replaces the sort/filter query. A different query invalidates every chunk.
    pub fn set_query(&mut self, query: Query) {
        if self.query == query {
            return;
        }
        self.query = query;
        self.invalidate_all();
    }

    pub fn get(&self, index: usize) -> Lookup<'_, T, K> {
        if index >= self.total {
            return Lookup::NotLoaded;
        }
        let start = self.chunk_start(index);
        match self.slots.get(&start) {
            Some(Slot::Ready(chunk)) => match chunk.items.get(index - start) {
                Some(item) => Lookup::Item(item),
                None => Lookup::NotLoaded,
            },
            Some(Slot::Loading { .. }) => Lookup::Loading,
            None => Lookup::NotLoaded,
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Data<T, K>> {
        let start = self.chunk_start(index);
        match self.slots.get_mut(&start)? {
            Slot::Ready(chunk) => chunk.items.get_mut(index - start),
            Slot::Loading { .. } => None,
        }
    }

    /// Loads the chunk containing `index` unless it is already loaded or loading.
    ///
    /// The cache does not retry: on failure the chunk stays absent and the error carries the
    /// failed range.
    pub fn ensure<S>(&mut self, index: usize, source: &S, now_ms: u64) -> Result<Ensure, LoadError>
    where
        S: DataSource<Item = T, Key = K> + ?Sized,
    {
        if index >= self.total {
            return Ok(Ensure::OutOfRange);
        }
        let start = self.chunk_start(index);
        if self.slots.contains_key(&start) {
            return Ok(Ensure::Present);
        }

        let count = self.chunk_size.min(self.total - start);
        let request = ItemRequest {
            start,
            count,
            query: self.query.clone(),
        };
        let ticket = LoadTicket {
            start,
            id: self.next_ticket,
        };
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.fetches = self.fetches.saturating_add(1);
        ctrace!(start, count, ticket = ticket.id, "ChunkCache::ensure fetch");

        match source.fetch(&request, ticket) {
            Ok(Fetch::Ready(items)) => {
                let range = self.store(request, items, now_ms);
                Ok(Ensure::Loaded(range))
            }
            Ok(Fetch::Pending) => {
                self.slots.insert(start, Slot::Loading { ticket, request });
                Ok(Ensure::Pending(ticket))
            }
            Err(source) => {
                cwarn!(start, count, "ChunkCache::ensure fetch failed");
                Err(LoadError {
                    range: ItemRange::new(start, start + count),
                    source,
                })
            }
        }
    }

    /// Delivers the result of an asynchronous fetch.
    ///
    /// The result is stored only if the slot is still loading under the same ticket; results for
    /// evicted or invalidated slots are dropped.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Data<T, K>>, SourceError>,
        now_ms: u64,
    ) -> Result<Completion, LoadError> {
        let wanted = matches!(
            self.slots.get(&ticket.start),
            Some(Slot::Loading { ticket: t, .. }) if *t == ticket
        );
        if !wanted {
            cdebug!(
                start = ticket.start,
                ticket = ticket.id,
                "ChunkCache::complete discarded stale result"
            );
            return Ok(Completion::Discarded);
        }
        let Some(Slot::Loading { request, .. }) = self.slots.remove(&ticket.start) else {
            return Ok(Completion::Discarded);
        };
        match result {
            Ok(items) => Ok(Completion::Stored(self.store(request, items, now_ms))),
            Err(source) => Err(LoadError {
                range: ItemRange::new(request.start, request.start + request.count),
                source,
            }),
        }
    }

    fn store(&mut self, request: ItemRequest, mut items: Vec<Data<T, K>>, now_ms: u64) -> ItemRange {
        items.truncate(request.count);
        let start = request.start;
        let end = start + request.count;
        self.slots.insert(
            start,
            Slot::Ready(Chunk {
                start,
                end,
                items,
                loaded_at: now_ms,
                request,
            }),
        );
        ItemRange::new(start, end)
    }

    /// Removes every slot whose start fails `retain`, except the chunk containing `pinned`.
    ///
    /// Returns the number of removed slots.
    pub fn evict(&mut self, pinned: usize, mut retain: impl FnMut(usize) -> bool) -> usize {
        let pinned = self.chunk_start(pinned);
        let before = self.slots.len();
        self.slots
            .retain(|&start, _| start == pinned || retain(start));
        let removed = before - self.slots.len();
        if removed > 0 {
            ctrace!(removed, remaining = self.slots.len(), "ChunkCache::evict");
        }
        removed
    }

    /// Drops every chunk. Outstanding fetches will be discarded on arrival.
    pub fn invalidate_all(&mut self) {
        if !self.slots.is_empty() {
            cdebug!(chunks = self.slots.len(), "ChunkCache::invalidate_all");
        }
        self.slots.clear();
    }

    /// Mirrors a selection change into the cached wrapper, if loaded.
    pub fn mark_selected(&mut self, index: usize, selected: bool) {
        if let Some(item) = self.get_mut(index) {
            item.selected = selected;
        }
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for slot in self.slots.values_mut() {
            if let Slot::Ready(chunk) = slot {
                for item in &mut chunk.items {
                    item.selected = selected;
                }
            }
        }
    }
}
