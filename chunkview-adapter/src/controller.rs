use std::collections::VecDeque;

use chunkview::{
    AnimatedFormatter, AnimationConfig, AnimationScheduler, Completion, ConfigError, Data,
    DataSource, Formatter, Frame, ListView, LoadError, LoadTicket, Motion, Query, RenderPipeline,
    SourceError, ViewEvent, ViewportConfig, ViewportState, VisibleItem,
};

use crate::{CursorAnchor, apply_cursor_anchor, capture_cursor_anchor};

/// A host command, queued with [`ListController::push`] and applied by the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    JumpTo(usize),
    JumpToStart,
    JumpToEnd,
    /// Re-reads the dataset length and reloads.
    Refresh,
    /// Toggles selection of the item under the cursor.
    ToggleSelected,
}

/// A framework-neutral controller that owns a [`ListView`], an [`AnimationScheduler`] and a
/// [`RenderPipeline`] and runs them as one per-frame pipeline.
///
/// This type does not hold any UI objects. Hosts drive it by:
/// - queueing [`Command`]s as input arrives (or applying them directly with [`Self::apply`])
/// - arming a timer for [`Self::next_tick_at`] and calling [`Self::frame`] when it fires or
///   when input was queued
///
/// Each frame flows one way: commands → cache reconciliation → scheduler tick → render. The
/// render step only reads committed state.
pub struct ListController<S: DataSource> {
    view: ListView<S>,
    scheduler: AnimationScheduler<S::Key>,
    pipeline: RenderPipeline<S::Item, S::Key>,
    queue: VecDeque<Command>,
}

impl<S: DataSource> ListController<S> {
    pub fn new(
        config: ViewportConfig,
        source: S,
        formatter: impl Formatter<S::Item, S::Key> + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            view: ListView::new(config, source)?,
            scheduler: AnimationScheduler::default(),
            pipeline: RenderPipeline::new(formatter),
            queue: VecDeque::new(),
        })
    }

    /// Replaces the scheduler with an empty one using `config`.
    pub fn with_animation_config(mut self, config: AnimationConfig) -> Self {
        self.scheduler = AnimationScheduler::new(config);
        self
    }

    /// Text for rows whose chunk is still loading.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.pipeline = self.pipeline.with_placeholder(placeholder);
        self
    }

    /// Text of the single row shown for an empty dataset.
    pub fn with_empty_text(mut self, empty_text: impl Into<String>) -> Self {
        self.pipeline = self.pipeline.with_empty_text(empty_text);
        self
    }

    pub fn view(&self) -> &ListView<S> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ListView<S> {
        &mut self.view
    }

    pub fn scheduler(&self) -> &AnimationScheduler<S::Key> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AnimationScheduler<S::Key> {
        &mut self.scheduler
    }

    pub fn source(&self) -> &S {
        self.view.source()
    }

    pub fn state(&self) -> ViewportState {
        self.view.state()
    }

    pub fn visible_items(&self) -> Vec<VisibleItem<'_, S::Item, S::Key>> {
        self.view.visible_items()
    }

    pub fn current_item(&self) -> Option<&Data<S::Item, S::Key>> {
        self.view.current_item()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Applies one command immediately.
    pub fn apply(&mut self, command: Command) -> Motion {
        match command {
            Command::MoveUp => self.view.move_up(),
            Command::MoveDown => self.view.move_down(),
            Command::PageUp => self.view.page_up(),
            Command::PageDown => self.view.page_down(),
            Command::JumpTo(index) => self.view.jump_to_index(index),
            Command::JumpToStart => self.view.jump_to_start(),
            Command::JumpToEnd => self.view.jump_to_end(),
            Command::Refresh => self.view.refresh(),
            Command::ToggleSelected => {
                self.view.toggle_selected();
                Motion::default()
            }
        }
    }

    /// Runs one frame at `now_ms` and returns the rows to draw.
    ///
    /// - applies queued commands in order (each reconciles the cache when the viewport moves)
    /// - ticks the scheduler if its timer is due
    /// - renders from the committed state
    pub fn frame(&mut self, now_ms: u64) -> Frame {
        self.view.set_now(now_ms);
        while let Some(command) = self.queue.pop_front() {
            let _ = self.apply(command);
        }
        if self.scheduler.is_due(now_ms) {
            let _ = self.scheduler.tick(now_ms);
        }
        self.render(now_ms)
    }

    /// Renders without applying commands or ticking.
    pub fn render(&mut self, now_ms: u64) -> Frame {
        self.pipeline.render(
            self.view.navigator(),
            self.view.cache(),
            &mut self.scheduler,
            now_ms,
        )
    }

    /// Ticks the scheduler regardless of its timer; returns the ids that became dirty.
    pub fn tick(&mut self, now_ms: u64) -> Option<Vec<S::Key>> {
        self.scheduler.tick(now_ms)
    }

    /// When the host should run the next frame for animations; `None` while idle.
    pub fn next_tick_at(&self) -> Option<u64> {
        self.scheduler.next_tick_at()
    }

    pub fn fire_event(&mut self, name: &str, now_ms: u64) -> usize {
        self.scheduler.fire_event(name, now_ms)
    }

    pub fn set_formatter(
        &mut self,
        formatter: impl Formatter<S::Item, S::Key> + Send + Sync + 'static,
    ) {
        self.pipeline.set_formatter(formatter);
    }

    pub fn set_animated_formatter(
        &mut self,
        formatter: impl AnimatedFormatter<S::Item, S::Key> + Send + Sync + 'static,
    ) {
        self.pipeline.set_animated_formatter(formatter);
    }

    /// Switches back to the plain formatter and drops every animation.
    pub fn clear_animated_formatter(&mut self) {
        self.pipeline.clear_animated_formatter();
        self.scheduler.clear();
    }

    pub fn enable_animations(&mut self, now_ms: u64) {
        self.scheduler.enable(now_ms);
    }

    pub fn disable_animations(&mut self) {
        self.scheduler.disable();
    }

    pub fn is_animation_loop_running(&self) -> bool {
        self.scheduler.is_loop_running()
    }

    pub fn set_query(&mut self, query: Query) -> Motion {
        self.view.set_query(query)
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        self.view.take_events()
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Data<S::Item, S::Key>>, SourceError>,
    ) -> Result<Completion, LoadError> {
        self.view.complete_load(ticket, result)
    }

    pub fn capture_cursor_anchor(&self) -> Option<CursorAnchor<S::Key>> {
        capture_cursor_anchor(&self.view)
    }

    /// Refreshes the list, then moves the cursor back onto the anchored item.
    ///
    /// Call this after the source's filter or order changed.
    pub fn refresh_anchored(
        &mut self,
        anchor: &CursorAnchor<S::Key>,
        key_to_index: impl FnMut(&S::Key) -> Option<usize>,
    ) -> bool {
        let _ = self.view.refresh();
        let applied = apply_cursor_anchor(&mut self.view, anchor, key_to_index);
        if !applied {
            adebug!("ListController anchor item no longer present");
        }
        applied
    }
}

impl<S: DataSource> std::fmt::Debug for ListController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("view", &self.view)
            .field("scheduler", &self.scheduler)
            .field("pipeline", &self.pipeline)
            .field("queued", &self.queue.len())
            .finish()
    }
}
