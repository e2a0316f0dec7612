use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chunkview::{
    AnimatedFormatter, AnimationConfig, AnimationScheduler, ChunkCache, Completion, ConfigError,
    Data, DataSource, Formatter, Frame, LoadError, LoadTicket, Motion, Navigator, Query,
    RenderPipeline, SourceError, ViewEvent, ViewportConfig, ViewportState, reconcile,
};
use parking_lot::{Mutex, RwLock};

/// A list whose state can be driven from several threads.
///
/// Navigation state, the chunk cache and the animation scheduler are locked independently, so a
/// loader thread completing fetches doesn't block input handling and a timer thread ticking the
/// scheduler doesn't block either. Every method takes `&self`.
///
/// Lock discipline: a navigation command holds only the navigation lock. Reconciliation takes
/// the cache write lock and then snapshots the navigation state, so the last reconciliation
/// always sees the latest viewport. Rendering snapshots navigation first, then takes the cache
/// read lock, the scheduler and the pipeline, in that order.
pub struct SharedList<S: DataSource> {
    source: Arc<S>,
    nav: Mutex<Navigator>,
    cache: RwLock<ChunkCache<S::Item, S::Key>>,
    scheduler: Mutex<AnimationScheduler<S::Key>>,
    pipeline: Mutex<RenderPipeline<S::Item, S::Key>>,
    events: Mutex<Vec<ViewEvent>>,
    now_ms: AtomicU64,
}

impl<S: DataSource> SharedList<S> {
    pub fn new(
        config: ViewportConfig,
        source: Arc<S>,
        formatter: impl Formatter<S::Item, S::Key> + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        let nav = Navigator::new(config, source.total())?;
        let cache = ChunkCache::new(nav.config().chunk_size, nav.total());
        let list = Self {
            source,
            nav: Mutex::new(nav),
            cache: RwLock::new(cache),
            scheduler: Mutex::new(AnimationScheduler::default()),
            pipeline: Mutex::new(RenderPipeline::new(formatter)),
            events: Mutex::new(Vec::new()),
            now_ms: AtomicU64::new(0),
        };
        list.reconcile();
        Ok(list)
    }

    /// Replaces the scheduler with an empty one using `config`.
    pub fn with_animation_config(self, config: AnimationConfig) -> Self {
        *self.scheduler.lock() = AnimationScheduler::new(config);
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Sets the timestamp recorded on chunks loaded from now on.
    pub fn set_now(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    fn now(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> ViewportState {
        self.nav.lock().state()
    }

    /// A snapshot of the navigation state machine.
    pub fn navigator(&self) -> Navigator {
        self.nav.lock().clone()
    }

    pub fn height(&self) -> usize {
        self.nav.lock().height()
    }

    pub fn total(&self) -> usize {
        self.nav.lock().total()
    }

    fn navigate(&self, command: impl FnOnce(&mut Navigator) -> Motion) -> Motion {
        let motion = {
            let mut nav = self.nav.lock();
            command(&mut *nav)
        };
        if motion.viewport_moved {
            self.reconcile();
        }
        motion
    }

    fn reconcile(&self) {
        let events = {
            let mut cache = self.cache.write();
            let nav = self.nav.lock().clone();
            reconcile(&nav, &mut *cache, &*self.source, self.now())
        };
        if !events.is_empty() {
            self.events.lock().extend(events);
        }
    }

    pub fn move_up(&self) -> Motion {
        self.navigate(Navigator::move_up)
    }

    pub fn move_down(&self) -> Motion {
        self.navigate(Navigator::move_down)
    }

    pub fn page_up(&self) -> Motion {
        self.navigate(Navigator::page_up)
    }

    pub fn page_down(&self) -> Motion {
        self.navigate(Navigator::page_down)
    }

    pub fn jump_to_index(&self, index: usize) -> Motion {
        self.navigate(|nav| nav.jump_to_index(index))
    }

    pub fn jump_to_start(&self) -> Motion {
        self.navigate(Navigator::jump_to_start)
    }

    pub fn jump_to_end(&self) -> Motion {
        self.navigate(Navigator::jump_to_end)
    }

    /// Re-reads the dataset length, drops every chunk and reloads the viewport.
    pub fn refresh(&self) -> Motion {
        let total = self.source.total();
        {
            let mut cache = self.cache.write();
            cache.invalidate_all();
            cache.set_total(total);
        }
        let motion = self.nav.lock().set_total(total);
        self.reconcile();
        motion
    }

    /// Applies a new sort/filter query and reloads.
    pub fn set_query(&self, query: Query) -> Motion {
        self.source.set_query(&query);
        self.cache.write().set_query(query);
        self.refresh()
    }

    /// Retries loading the chunks under the current viewport.
    pub fn retry(&self) {
        self.reconcile();
    }

    /// Delivers the result of a pending fetch. Stale results are discarded.
    pub fn complete_load(
        &self,
        ticket: LoadTicket,
        result: Result<Vec<Data<S::Item, S::Key>>, SourceError>,
    ) -> Result<Completion, LoadError> {
        let outcome = self.cache.write().complete(ticket, result, self.now());
        match &outcome {
            Ok(Completion::Stored(range)) => {
                self.events
                    .lock()
                    .push(ViewEvent::ChunkLoaded { range: *range });
            }
            Ok(Completion::Discarded) => {}
            Err(err) => {
                awarn!(range = %err.range, "SharedList load failed");
                self.events.lock().push(ViewEvent::LoadFailed {
                    range: err.range,
                    error: err.source.clone(),
                });
            }
        }
        outcome
    }

    pub fn take_events(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Runs `f` against the cache under its read lock.
    pub fn with_cache<R>(&self, f: impl FnOnce(&ChunkCache<S::Item, S::Key>) -> R) -> R {
        f(&*self.cache.read())
    }

    /// The item under the cursor, if loaded.
    pub fn current_item(&self) -> Option<Data<S::Item, S::Key>>
    where
        S::Item: Clone,
    {
        let cursor = self.state().cursor_index;
        self.cache.read().get(cursor).item().cloned()
    }

    /// Rows of the current viewport as `(index, item)`; `None` while a row's chunk is not loaded.
    pub fn visible_items(&self) -> Vec<(usize, Option<Data<S::Item, S::Key>>)>
    where
        S::Item: Clone,
    {
        let nav = self.navigator();
        if nav.total() == 0 {
            return Vec::new();
        }
        let state = nav.state();
        let cache = self.cache.read();
        (0..nav.height())
            .map(|row| {
                let index = state.index_of_row(row);
                (index, cache.get(index).item().cloned())
            })
            .collect()
    }

    pub fn set_selected(&self, index: usize, selected: bool) -> bool {
        if index >= self.total() {
            return false;
        }
        let changed = self.source.set_selected(index, selected);
        if changed {
            self.cache.write().mark_selected(index, selected);
        }
        changed
    }

    /// Toggles selection of the item under the cursor.
    pub fn toggle_selected(&self) -> bool {
        let nav = self.navigator();
        if nav.total() == 0 {
            return false;
        }
        let index = nav.state().cursor_index;
        let selected = self.source.is_selected(index);
        self.set_selected(index, !selected)
    }

    pub fn select_all(&self) {
        self.source.select_all();
        self.cache.write().set_all_selected(true);
    }

    pub fn clear_selection(&self) {
        self.source.clear_selection();
        self.cache.write().set_all_selected(false);
    }

    /// Selects `start..end` (clamped to the dataset).
    pub fn select_range(&self, start: usize, end: usize) {
        let end = end.min(self.total());
        if start >= end {
            return;
        }
        self.source.select_range(start, end);
        let mut cache = self.cache.write();
        for i in start..end {
            cache.mark_selected(i, true);
        }
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.source.selected_indices()
    }

    pub fn selected_ids(&self) -> Vec<S::Key> {
        self.source.selected_ids()
    }

    pub fn set_animated_formatter(
        &self,
        formatter: impl AnimatedFormatter<S::Item, S::Key> + Send + Sync + 'static,
    ) {
        self.pipeline.lock().set_animated_formatter(formatter);
    }

    /// Switches back to the plain formatter and drops every animation.
    pub fn clear_animated_formatter(&self) {
        self.pipeline.lock().clear_animated_formatter();
        self.scheduler.lock().clear();
    }

    /// Sets the callback receiving each tick's batch of dirty ids.
    ///
    /// It runs after the scheduler lock is released, so it may call back into the list.
    pub fn set_on_update(&self, on_update: impl Fn(&[S::Key]) + Send + Sync + 'static) {
        self.scheduler.lock().set_on_update(on_update);
    }

    pub fn clear_on_update(&self) {
        self.scheduler.lock().clear_on_update();
    }

    pub fn fire_event(&self, name: &str, now_ms: u64) -> usize {
        self.scheduler.lock().fire_event(name, now_ms)
    }

    pub fn tick(&self, now_ms: u64) -> Option<Vec<S::Key>> {
        let (batch, on_update) = {
            let mut scheduler = self.scheduler.lock();
            (scheduler.advance(now_ms), scheduler.on_update())
        };
        if let (Some(batch), Some(on_update)) = (&batch, on_update) {
            on_update(batch);
        }
        batch
    }

    pub fn next_tick_at(&self) -> Option<u64> {
        self.scheduler.lock().next_tick_at()
    }

    pub fn enable_animations(&self, now_ms: u64) {
        self.scheduler.lock().enable(now_ms);
    }

    pub fn disable_animations(&self) {
        self.scheduler.lock().disable();
    }

    pub fn is_animation_loop_running(&self) -> bool {
        self.scheduler.lock().is_loop_running()
    }

    /// Renders the current viewport.
    pub fn render(&self, now_ms: u64) -> Frame {
        let nav = self.navigator();
        let cache = self.cache.read();
        let mut scheduler = self.scheduler.lock();
        let mut pipeline = self.pipeline.lock();
        pipeline.render(&nav, &cache, &mut scheduler, now_ms)
    }

    /// Ticks the scheduler if its timer is due, then renders.
    pub fn frame(&self, now_ms: u64) -> Frame {
        self.set_now(now_ms);
        let due = self.scheduler.lock().is_due(now_ms);
        if due {
            let _ = self.tick(now_ms);
        }
        self.render(now_ms)
    }
}

impl<S: DataSource> std::fmt::Debug for SharedList<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedList")
            .field("state", &self.state())
            .field("chunks", &self.cache.read().chunk_starts())
            .field("scheduler", &*self.scheduler.lock())
            .finish_non_exhaustive()
    }
}
