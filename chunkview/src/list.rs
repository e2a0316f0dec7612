use alloc::vec::Vec;

use crate::{
    ChunkCache, Completion, ConfigError, Data, DataSource, Ensure, ItemRange, LoadError,
    LoadTicket, Lookup, Motion, Navigator, Query, SourceError, ViewportConfig, ViewportState,
};

/// Notifications for the host, drained with [`ListView::take_events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    ChunkLoaded { range: ItemRange },
    /// A fetch is in flight; the host delivers its result via [`ListView::complete_load`].
    ChunkPending { ticket: LoadTicket },
    LoadFailed { range: ItemRange, error: SourceError },
}

/// A row of the current viewport.
#[derive(Debug)]
pub struct VisibleItem<'a, T, K> {
    pub index: usize,
    pub row: usize,
    pub item: Lookup<'a, T, K>,
}

/// Retention window for a viewport covering `first..=last`: the chunk holding `first` with
/// `retain` chunks on each side, widened to cover the chunk holding `last`.
///
/// With `retain == 1` and a chunk size of at least the viewport height this is three chunks.
pub fn retention_window(chunk_size: usize, first: usize, last: usize, retain: usize) -> ItemRange {
    let chunk_size = chunk_size.max(1);
    let anchor = (first / chunk_size) * chunk_size;
    let tail = (last / chunk_size) * chunk_size + chunk_size;
    let margin = chunk_size.saturating_mul(retain);
    ItemRange::new(
        anchor.saturating_sub(margin),
        anchor
            .saturating_add(chunk_size)
            .saturating_add(margin)
            .max(tail),
    )
}

/// Ensures every chunk intersecting the viewport, then evicts chunks outside the retention
/// window. Never evicts the chunk holding the cursor.
///
/// Returns the events produced (loads, pending fetches, failures).
pub fn reconcile<S>(
    nav: &Navigator,
    cache: &mut ChunkCache<S::Item, S::Key>,
    source: &S,
    now_ms: u64,
) -> Vec<ViewEvent>
where
    S: DataSource + ?Sized,
{
    let mut events = Vec::new();
    let state = nav.state();
    if nav.total() == 0 {
        cache.invalidate_all();
        return events;
    }

    let first = state.viewport_start;
    let last = (first + nav.height()).min(nav.total()) - 1;
    let chunk_size = cache.chunk_size();
    let mut start = cache.chunk_start(first);
    while start <= last {
        match cache.ensure(start, source, now_ms) {
            Ok(Ensure::Loaded(range)) => events.push(ViewEvent::ChunkLoaded { range }),
            Ok(Ensure::Pending(ticket)) => events.push(ViewEvent::ChunkPending { ticket }),
            Ok(Ensure::Present | Ensure::OutOfRange) => {}
            Err(err) => events.push(ViewEvent::LoadFailed {
                range: err.range,
                error: err.source,
            }),
        }
        start += chunk_size;
    }

    let window = retention_window(chunk_size, first, last, nav.config().retain_chunks);
    cache.evict(state.cursor_index, |start| window.contains(start));
    events
}

/// A virtualized list: navigation state, chunk cache and data source.
///
/// Every command that moves `viewport_start` ensures the chunks under the new viewport and then
/// evicts chunks outside the retention window, so the cache holds at most three chunks no matter
/// how large the dataset is. Commands that change nothing make no cache calls.
pub struct ListView<S: DataSource> {
    nav: Navigator,
    cache: ChunkCache<S::Item, S::Key>,
    source: S,
    events: Vec<ViewEvent>,
    now_ms: u64,
}

impl<S: DataSource> ListView<S> {
    pub fn new(config: ViewportConfig, source: S) -> Result<Self, ConfigError> {
        let nav = Navigator::new(config, source.total())?;
        let cache = ChunkCache::new(nav.config().chunk_size, nav.total());
        let mut view = Self {
            nav,
            cache,
            source,
            events: Vec::new(),
            now_ms: 0,
        };
        view.reconcile();
        Ok(view)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn cache(&self) -> &ChunkCache<S::Item, S::Key> {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> ViewportState {
        self.nav.state()
    }

    pub fn height(&self) -> usize {
        self.nav.height()
    }

    pub fn total(&self) -> usize {
        self.nav.total()
    }

    /// Sets the timestamp recorded on chunks loaded from now on.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn move_up(&mut self) -> Motion {
        let motion = self.nav.move_up();
        self.after(motion)
    }

    pub fn move_down(&mut self) -> Motion {
        let motion = self.nav.move_down();
        self.after(motion)
    }

    pub fn page_up(&mut self) -> Motion {
        let motion = self.nav.page_up();
        self.after(motion)
    }

    pub fn page_down(&mut self) -> Motion {
        let motion = self.nav.page_down();
        self.after(motion)
    }

    pub fn jump_to_index(&mut self, index: usize) -> Motion {
        let motion = self.nav.jump_to_index(index);
        self.after(motion)
    }

    pub fn jump_to_index_at(&mut self, index: usize, row: usize) -> Motion {
        let motion = self.nav.jump_to_index_at(index, row);
        self.after(motion)
    }

    pub fn jump_to_start(&mut self) -> Motion {
        let motion = self.nav.jump_to_start();
        self.after(motion)
    }

    pub fn jump_to_end(&mut self) -> Motion {
        let motion = self.nav.jump_to_end();
        self.after(motion)
    }

    fn after(&mut self, motion: Motion) -> Motion {
        if motion.viewport_moved {
            self.reconcile();
        }
        motion
    }

    fn reconcile(&mut self) {
        let events = reconcile(&self.nav, &mut self.cache, &self.source, self.now_ms);
        self.events.extend(events);
    }

    /// The rows of the current viewport, in order.
    pub fn visible_items(&self) -> Vec<VisibleItem<'_, S::Item, S::Key>> {
        let state = self.nav.state();
        let rows = if self.nav.total() == 0 {
            0
        } else {
            self.nav.height()
        };
        (0..rows)
            .map(|row| {
                let index = state.index_of_row(row);
                VisibleItem {
                    index,
                    row,
                    item: self.cache.get(index),
                }
            })
            .collect()
    }

    /// The item under the cursor, if loaded.
    pub fn current_item(&self) -> Option<&Data<S::Item, S::Key>> {
        if self.nav.total() == 0 {
            return None;
        }
        self.cache.get(self.nav.state().cursor_index).item()
    }

    /// Delivers the result of a pending fetch.
    ///
    /// Results for chunks that were evicted or invalidated in the meantime are discarded. A failed
    /// fetch is also queued as [`ViewEvent::LoadFailed`].
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Data<S::Item, S::Key>>, SourceError>,
    ) -> Result<Completion, LoadError> {
        let completion = self
            .cache
            .complete(ticket, result, self.now_ms)
            .inspect_err(|err| {
                self.events.push(ViewEvent::LoadFailed {
                    range: err.range,
                    error: err.source.clone(),
                });
            })?;
        if let Completion::Stored(range) = completion {
            self.events.push(ViewEvent::ChunkLoaded { range });
        }
        Ok(completion)
    }

    /// Retries loading the chunks under the current viewport (e.g. after a `LoadFailed`).
    pub fn retry(&mut self) {
        self.reconcile();
    }

    /// Re-reads the dataset length, drops every chunk and reloads the viewport.
    pub fn refresh(&mut self) -> Motion {
        let total = self.source.total();
        self.cache.invalidate_all();
        self.cache.set_total(total);
        let motion = self.nav.set_total(total);
        self.reconcile();
        motion
    }

    /// Applies a new sort/filter query and reloads.
    pub fn set_query(&mut self, query: Query) -> Motion {
        self.source.set_query(&query);
        self.cache.set_query(query);
        self.refresh()
    }

    /// Swaps the data source; the old one is returned.
    ///
    /// The new source receives the current query before its total is read.
    pub fn replace_source(&mut self, source: S) -> S {
        source.set_query(self.cache.query());
        let old = core::mem::replace(&mut self.source, source);
        let _ = self.refresh();
        old
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        if index >= self.nav.total() {
            return false;
        }
        let changed = self.source.set_selected(index, selected);
        if changed {
            self.cache.mark_selected(index, selected);
        }
        changed
    }

    /// Toggles selection of the item under the cursor.
    pub fn toggle_selected(&mut self) -> bool {
        if self.nav.total() == 0 {
            return false;
        }
        let index = self.nav.state().cursor_index;
        let selected = self.source.is_selected(index);
        self.set_selected(index, !selected)
    }

    pub fn select_all(&mut self) {
        self.source.select_all();
        self.cache.set_all_selected(true);
    }

    pub fn clear_selection(&mut self) {
        self.source.clear_selection();
        self.cache.set_all_selected(false);
    }

    /// Selects `start..end` (clamped to the dataset).
    pub fn select_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.nav.total());
        if start >= end {
            return;
        }
        self.source.select_range(start, end);
        for i in start..end {
            self.cache.mark_selected(i, true);
        }
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.source.selected_indices()
    }

    pub fn selected_ids(&self) -> Vec<S::Key> {
        self.source.selected_ids()
    }
}

impl<S> core::fmt::Debug for ListView<S>
where
    S: DataSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListView")
            .field("state", &self.nav.state())
            .field("height", &self.nav.height())
            .field("total", &self.nav.total())
            .field("chunks", &self.cache.chunk_starts())
            .finish_non_exhaustive()
    }
}
