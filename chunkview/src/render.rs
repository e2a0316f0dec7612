use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::key::{IdMap, IdSet};
use crate::{
    AnimationScheduler, ChunkCache, Data, FormatError, IdKey, ItemId, Lookup, Navigator,
    RefreshTrigger, StateMap,
};

/// Position and cursor/threshold flags of a row being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowContext {
    /// Absolute index in the dataset.
    pub index: usize,
    /// Row within the viewport.
    pub row: usize,
    pub is_cursor: bool,
    pub is_top_threshold: bool,
    pub is_bottom_threshold: bool,
}

impl RowContext {
    fn flags(&self) -> (bool, bool, bool) {
        (self.is_cursor, self.is_top_threshold, self.is_bottom_threshold)
    }
}

/// A pure row formatter: same item and context, same text.
pub trait Formatter<T, K = ItemId> {
    fn render(&self, item: &Data<T, K>, ctx: &RowContext) -> String;
}

impl<T, K, F> Formatter<T, K> for F
where
    F: Fn(&Data<T, K>, &RowContext) -> String,
{
    fn render(&self, item: &Data<T, K>, ctx: &RowContext) -> String {
        self(item, ctx)
    }
}

/// Output of [`AnimatedFormatter::render_animated`].
#[derive(Clone, Debug, Default)]
pub struct AnimatedRender {
    /// Row body, without the cursor-dependent decoration.
    pub content: String,
    /// State to keep for the next render of this row.
    pub state: StateMap,
    /// Triggers used when the row is registered with the scheduler.
    pub triggers: Vec<RefreshTrigger>,
}

/// A formatter whose output depends on per-row animation state.
///
/// The body (`render_animated`) is recomputed only when the row first appears or the scheduler
/// reports it dirty. `decorate` adds the cursor-dependent part and runs whenever the row's
/// cursor/threshold flags change, without touching animation state.
pub trait AnimatedFormatter<T, K = ItemId> {
    fn render_animated(
        &self,
        item: &Data<T, K>,
        state: &StateMap,
        now_ms: u64,
    ) -> Result<AnimatedRender, FormatError>;

    fn decorate(&self, content: &str, ctx: &RowContext) -> String {
        let marker = if ctx.is_cursor { "> " } else { "  " };
        format!("{marker}{content}")
    }
}

/// Turns panics in the wrapped formatter into [`FormatError::Panicked`].
#[cfg(feature = "std")]
#[derive(Clone, Debug)]
pub struct CatchUnwind<F>(pub F);

#[cfg(feature = "std")]
impl<T, K, F> AnimatedFormatter<T, K> for CatchUnwind<F>
where
    F: AnimatedFormatter<T, K>,
{
    fn render_animated(
        &self,
        item: &Data<T, K>,
        state: &StateMap,
        now_ms: u64,
    ) -> Result<AnimatedRender, FormatError> {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.0.render_animated(item, state, now_ms)
        }))
        .unwrap_or(Err(FormatError::Panicked))
    }

    fn decorate(&self, content: &str, ctx: &RowContext) -> String {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.0.decorate(content, ctx)))
            .unwrap_or_else(|_| String::from(content))
    }
}

/// One rendered viewport row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow {
    /// Absolute index, `None` for the placeholder row of an empty dataset.
    pub index: Option<usize>,
    pub row: usize,
    pub text: String,
    pub is_cursor: bool,
}

/// The rows of one frame, top to bottom. The host decides how to join and draw them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<RenderedRow>,
}

impl Frame {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.text.as_str())
    }

    pub fn into_lines(self) -> Vec<String> {
        self.rows.into_iter().map(|r| r.text).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug)]
struct CachedRow {
    body: String,
    decorated: String,
    flags: Option<(bool, bool, bool)>,
    // False for rows rendered once without a scheduler slot.
    animated: bool,
}

pub type SharedFormatter<T, K> = Arc<dyn Formatter<T, K> + Send + Sync>;
pub type SharedAnimatedFormatter<T, K> = Arc<dyn AnimatedFormatter<T, K> + Send + Sync>;

/// Produces the visible rows from committed navigation, cache and animation state.
///
/// Rows whose chunk is not loaded yet render a placeholder instead of blocking on the fetch.
pub struct RenderPipeline<T, K = ItemId> {
    formatter: SharedFormatter<T, K>,
    animated: Option<SharedAnimatedFormatter<T, K>>,
    rows: IdMap<K, CachedRow>,
    placeholder: String,
    empty_text: String,
    fallback: String,
}

impl<T, K: IdKey> RenderPipeline<T, K> {
    pub fn new(formatter: impl Formatter<T, K> + Send + Sync + 'static) -> Self {
        Self {
            formatter: Arc::new(formatter),
            animated: None,
            rows: IdMap::new(),
            placeholder: String::from("…"),
            empty_text: String::new(),
            fallback: String::from("?"),
        }
    }

    /// Text for rows whose chunk is still loading or missing.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Text of the single row shown for an empty dataset.
    pub fn with_empty_text(mut self, empty_text: impl Into<String>) -> Self {
        self.empty_text = empty_text.into();
        self
    }

    /// Body used when an animated formatter fails before producing any content for a row.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn set_formatter(&mut self, formatter: impl Formatter<T, K> + Send + Sync + 'static) {
        self.formatter = Arc::new(formatter);
    }

    pub fn set_animated_formatter(
        &mut self,
        formatter: impl AnimatedFormatter<T, K> + Send + Sync + 'static,
    ) {
        self.animated = Some(Arc::new(formatter));
        self.rows.clear();
    }

    pub fn clear_animated_formatter(&mut self) {
        self.animated = None;
        self.rows.clear();
    }

    pub fn has_animated_formatter(&self) -> bool {
        self.animated.is_some()
    }

    /// Number of cached animated rows.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    /// Renders the current viewport.
    ///
    /// With an animated formatter, the scheduler learns which ids are visible: new rows are
    /// registered, rows that left the viewport stop contributing to ticks, and dirty rows are
    /// consumed.
    ///
    /// A new row is never registered at the cost of evicting another row of the same frame.
    /// When the scheduler is full of on-screen rows the new row renders once with an empty state
    /// and stays static until a slot frees up.
    pub fn render(
        &mut self,
        nav: &Navigator,
        cache: &ChunkCache<T, K>,
        scheduler: &mut AnimationScheduler<K>,
        now_ms: u64,
    ) -> Frame {
        let state = nav.state();
        if nav.total() == 0 {
            if self.animated.is_some() {
                scheduler.retain_visible(core::iter::empty());
            }
            return Frame {
                rows: alloc::vec![RenderedRow {
                    index: None,
                    row: 0,
                    text: self.empty_text.clone(),
                    is_cursor: true,
                }],
            };
        }

        let animated = self.animated.clone();
        let on_screen: IdSet<K> = match &animated {
            Some(_) => (0..nav.height())
                .filter_map(|row| cache.get(state.index_of_row(row)).item())
                .map(|data| data.id.clone())
                .collect(),
            None => IdSet::new(),
        };
        let mut rows = Vec::with_capacity(nav.height());
        for row in 0..nav.height() {
            let index = state.index_of_row(row);
            let (is_top_threshold, is_bottom_threshold) = nav.threshold_flags(row);
            let ctx = RowContext {
                index,
                row,
                is_cursor: row == state.cursor_viewport_index,
                is_top_threshold,
                is_bottom_threshold,
            };
            let text = match cache.get(index) {
                Lookup::Item(data) => match &animated {
                    Some(f) => self.render_animated_row(
                        f.as_ref(),
                        data,
                        &ctx,
                        &on_screen,
                        scheduler,
                        now_ms,
                    ),
                    None => self.formatter.render(data, &ctx),
                },
                Lookup::Loading | Lookup::NotLoaded => self.placeholder.clone(),
            };
            rows.push(RenderedRow {
                index: Some(index),
                row,
                text,
                is_cursor: ctx.is_cursor,
            });
        }

        if animated.is_some() {
            scheduler.retain_visible(on_screen.iter());
            self.rows.retain(|id, row| {
                scheduler.contains(id) || (!row.animated && on_screen.contains(id))
            });
        }
        Frame { rows }
    }

    fn render_animated_row(
        &mut self,
        f: &(dyn AnimatedFormatter<T, K> + Send + Sync),
        data: &Data<T, K>,
        ctx: &RowContext,
        on_screen: &IdSet<K>,
        scheduler: &mut AnimationScheduler<K>,
        now_ms: u64,
    ) -> String {
        let id = &data.id;
        let known = scheduler.contains(id);
        let cached = self.rows.get(id).map(|row| row.animated);
        let admit = known
            || scheduler
                .eviction_candidate()
                .is_none_or(|victim| !on_screen.contains(&victim));

        let stale = match cached {
            None => true,
            Some(animated) => !known && (animated || admit),
        };
        if stale || scheduler.is_dirty(id) {
            let result = {
                let empty = StateMap::new();
                let current = scheduler.state(id).unwrap_or(&empty);
                f.render_animated(data, current, now_ms)
            };
            match result {
                Ok(out) => {
                    if known {
                        scheduler.commit_render(id, out.state);
                    } else if admit {
                        scheduler.register(id.clone(), out.triggers, out.state, now_ms);
                    } else {
                        cdebug!(index = ctx.index, "scheduler full, row left static");
                    }
                    self.rows.insert(
                        id.clone(),
                        CachedRow {
                            body: out.content,
                            decorated: String::new(),
                            flags: None,
                            animated: admit,
                        },
                    );
                }
                Err(_err) => {
                    cwarn!(index = ctx.index, error = %_err, "animated formatter failed");
                    // Keep the last good body; the state map stays as it was.
                    scheduler.consume(id);
                    if cached.is_none() {
                        self.rows.insert(
                            id.clone(),
                            CachedRow {
                                body: self.fallback.clone(),
                                decorated: String::new(),
                                flags: None,
                                animated: true,
                            },
                        );
                    }
                }
            }
        }

        let flags = ctx.flags();
        match self.rows.get_mut(id) {
            Some(entry) => {
                if entry.flags != Some(flags) {
                    entry.decorated = f.decorate(&entry.body, ctx);
                    entry.flags = Some(flags);
                }
                entry.decorated.clone()
            }
            None => f.decorate(&self.fallback, ctx),
        }
    }
}

impl<T, K> core::fmt::Debug for RenderPipeline<T, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("animated", &self.animated.is_some())
            .field("cached_rows", &self.rows.len())
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}
