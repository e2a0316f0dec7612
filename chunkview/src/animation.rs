use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::key::{IdMap, IdSet};
use crate::{AnimationConfig, IdKey, ItemId};

/// A value stored in an animation's state map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StateValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for StateValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Per-row animation state, ordered by key.
pub type StateMap = BTreeMap<String, StateValue>;

/// A predicate deciding whether a conditional trigger fires at `now_ms`.
pub type Condition = Arc<dyn Fn(&StateMap, u64) -> bool + Send + Sync>;

/// A callback receiving the ids that became dirty during one tick.
pub type OnUpdateCallback<K> = Arc<dyn Fn(&[K]) + Send + Sync>;

/// Decides whether/when an animation is due for re-evaluation.
#[derive(Clone)]
pub enum RefreshTrigger {
    Timer { interval_ms: u64 },
    Event(String),
    Conditional(Condition),
}

impl RefreshTrigger {
    /// A timer trigger. The interval is at least one millisecond.
    pub fn timer(interval_ms: u64) -> Self {
        Self::Timer {
            interval_ms: interval_ms.max(1),
        }
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::Event(name.into())
    }

    pub fn conditional(f: impl Fn(&StateMap, u64) -> bool + Send + Sync + 'static) -> Self {
        Self::Conditional(Arc::new(f))
    }
}

impl core::fmt::Debug for RefreshTrigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timer { interval_ms } => f
                .debug_struct("Timer")
                .field("interval_ms", interval_ms)
                .finish(),
            Self::Event(name) => f.debug_tuple("Event").field(name).finish(),
            Self::Conditional(_) => f.write_str("Conditional(..)"),
        }
    }
}

/// Animation bookkeeping for one rendered row identity.
#[derive(Clone, Debug)]
pub struct AnimationState<K = ItemId> {
    id: K,
    state: StateMap,
    triggers: Vec<RefreshTrigger>,
    // Next due time per trigger; `Some` only for timers.
    due: Vec<Option<u64>>,
    last_update: u64,
    is_active: bool,
    is_visible: bool,
    is_dirty: bool,
    seq: u64,
}

impl<K> AnimationState<K> {
    fn new(id: K, triggers: Vec<RefreshTrigger>, state: StateMap, now_ms: u64, seq: u64) -> Self {
        let due = triggers
            .iter()
            .map(|t| match t {
                RefreshTrigger::Timer { interval_ms } => Some(now_ms.saturating_add(*interval_ms)),
                _ => None,
            })
            .collect();
        Self {
            id,
            state,
            triggers,
            due,
            last_update: now_ms,
            is_active: true,
            is_visible: true,
            is_dirty: false,
            seq,
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn triggers(&self) -> &[RefreshTrigger] {
        &self.triggers
    }

    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    /// Earliest due time among timer triggers.
    pub fn next_update(&self) -> Option<u64> {
        self.due.iter().flatten().copied().min()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    fn live(&self) -> bool {
        self.is_active && self.is_visible
    }

    /// Fires due timers and true conditions, rescheduling timers to `now + interval`.
    fn poll(&mut self, now_ms: u64) -> bool {
        let mut fired = false;
        for (trigger, due) in self.triggers.iter().zip(self.due.iter_mut()) {
            match trigger {
                RefreshTrigger::Timer { interval_ms } => {
                    if due.is_some_and(|at| now_ms >= at) {
                        *due = Some(now_ms.saturating_add(*interval_ms));
                        fired = true;
                    }
                }
                RefreshTrigger::Conditional(cond) => {
                    if cond(&self.state, now_ms) {
                        fired = true;
                    }
                }
                RefreshTrigger::Event(_) => {}
            }
        }
        fired
    }

    fn listens_to(&self, name: &str) -> bool {
        self.triggers
            .iter()
            .any(|t| matches!(t, RefreshTrigger::Event(n) if n == name))
    }
}

/// Outcome of [`AnimationScheduler::register`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration<K> {
    /// The id was already active; its timing and state were left untouched.
    Existing,
    Inserted,
    /// Inserted after evicting the animation with the oldest `last_update`.
    InsertedEvicting(K),
}

/// Drives every row animation from one global timer.
///
/// The scheduler does not own a clock. The host arms a single timer for [`Self::next_tick_at`]
/// and calls [`Self::tick`]; while nothing is registered the loop is suspended
/// (`next_tick_at() == None`) and it restarts on the next registration.
///
/// Re-registering an active id never resets its schedule, so re-rendering a row (e.g. because
/// the cursor moved past it) can't make its animation run faster.
pub struct AnimationScheduler<K = ItemId> {
    config: AnimationConfig,
    entries: IdMap<K, AnimationState<K>>,
    // Ids dirtied by events or state updates since the last tick.
    pending: Vec<K>,
    running: bool,
    next_tick_at: Option<u64>,
    seq: u64,
    on_update: Option<OnUpdateCallback<K>>,
}

impl<K: IdKey> AnimationScheduler<K> {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            entries: IdMap::new(),
            pending: Vec::new(),
            running: false,
            next_tick_at: None,
            seq: 0,
            on_update: None,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Sets the callback receiving one batched id list per tick.
    pub fn set_on_update(&mut self, on_update: impl Fn(&[K]) + Send + Sync + 'static) {
        self.on_update = Some(Arc::new(on_update));
    }

    pub fn clear_on_update(&mut self) {
        self.on_update = None;
    }

    /// The current `on_update` callback, for hosts that notify outside their own locks.
    pub fn on_update(&self) -> Option<OnUpdateCallback<K>> {
        self.on_update.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &K) -> Option<&AnimationState<K>> {
        self.entries.get(id)
    }

    pub fn state(&self, id: &K) -> Option<&StateMap> {
        self.entries.get(id).map(|e| &e.state)
    }

    pub fn is_dirty(&self, id: &K) -> bool {
        self.entries.get(id).is_some_and(|e| e.is_dirty)
    }

    pub fn dirty_ids(&self) -> Vec<K> {
        self.entries
            .values()
            .filter(|e| e.is_dirty)
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<K> {
        self.entries
            .values()
            .filter(|e| e.is_visible)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Number of ids waiting to be reported by the next tick.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_loop_running(&self) -> bool {
        self.running
    }

    /// Maximum number of tracked animations.
    pub fn capacity(&self) -> usize {
        self.config.max_animations.max(1)
    }

    /// The id [`Self::register`] would evict to admit a new animation; `None` below capacity.
    pub fn eviction_candidate(&self) -> Option<K> {
        if self.entries.len() < self.capacity() {
            return None;
        }
        self.oldest()
    }

    /// When the host should call [`Self::tick`] next; `None` while idle or disabled.
    pub fn next_tick_at(&self) -> Option<u64> {
        self.next_tick_at
    }

    /// Whether the global timer is due at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_tick_at.is_some_and(|at| now_ms >= at)
    }

    /// Registers an animation for `id`.
    ///
    /// Idempotent: an already active id keeps its `next_update`, `last_update` and state; it is
    /// only marked visible again.
    pub fn register(
        &mut self,
        id: K,
        triggers: Vec<RefreshTrigger>,
        initial_state: StateMap,
        now_ms: u64,
    ) -> Registration<K> {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.is_visible = true;
            return Registration::Existing;
        }

        let mut outcome = Registration::Inserted;
        if let Some(oldest) = self.eviction_candidate() {
            if let Some(mut evicted) = self.entries.remove(&oldest) {
                evicted.is_active = false;
            }
            self.pending.retain(|p| *p != oldest);
            cdebug!("AnimationScheduler::register evicted oldest animation");
            outcome = Registration::InsertedEvicting(oldest);
        }

        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        self.entries.insert(
            id.clone(),
            AnimationState::new(id, triggers, initial_state, now_ms, seq),
        );
        self.wake(now_ms);
        outcome
    }

    fn oldest(&self) -> Option<K> {
        self.entries
            .values()
            .min_by_key(|e| (e.last_update, e.seq))
            .map(|e| e.id.clone())
    }

    pub fn unregister(&mut self, id: &K) -> Option<AnimationState<K>> {
        let mut removed = self.entries.remove(id)?;
        removed.is_active = false;
        self.pending.retain(|p| p != id);
        if self.entries.is_empty() {
            self.suspend();
        }
        Some(removed)
    }

    /// Drops every animation and suspends the loop.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
        self.suspend();
    }

    /// Merges `partial` into the state of `id`.
    ///
    /// Applied only when at least one key's value differs from the stored one; returns whether
    /// anything changed (and the id became dirty).
    pub fn update_state(&mut self, id: &K, partial: StateMap, now_ms: u64) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        let changed = partial
            .iter()
            .any(|(k, v)| entry.state.get(k) != Some(v));
        if !changed {
            return false;
        }
        entry.state.extend(partial);
        entry.last_update = now_ms;
        entry.is_dirty = true;
        if !self.pending.contains(id) {
            self.pending.push(id.clone());
        }
        true
    }

    /// Stores the state produced by a render and clears the dirty flag.
    pub fn commit_render(&mut self, id: &K, state: StateMap) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.state = state;
            entry.is_dirty = false;
        }
    }

    /// Clears the dirty flag of `id`.
    pub fn consume(&mut self, id: &K) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.is_dirty = false;
        }
    }

    /// Invisible animations keep their state but their timers stop contributing to ticks.
    pub fn set_visible(&mut self, id: &K, visible: bool) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.is_visible = visible;
                true
            }
            None => false,
        }
    }

    /// Marks exactly the ids in `visible` as visible.
    pub fn retain_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a K>)
    where
        K: 'a,
    {
        let set: IdSet<&K> = visible.into_iter().collect();
        for entry in self.entries.values_mut() {
            entry.is_visible = set.contains(&entry.id);
        }
    }

    /// Marks active, visible animations listening for `name` dirty.
    ///
    /// Returns how many animations were affected; they are reported by the next tick.
    pub fn fire_event(&mut self, name: &str, now_ms: u64) -> usize {
        let mut n = 0usize;
        for entry in self.entries.values_mut() {
            if !entry.live() || !entry.listens_to(name) {
                continue;
            }
            entry.last_update = now_ms;
            entry.is_dirty = true;
            if !self.pending.contains(&entry.id) {
                self.pending.push(entry.id.clone());
            }
            n += 1;
        }
        n
    }

    /// Runs one pass of the global timer.
    ///
    /// Returns the ids that became dirty since the previous tick as a single batch (also passed
    /// to the `on_update` callback), or `None` when nothing changed.
    pub fn tick(&mut self, now_ms: u64) -> Option<Vec<K>> {
        let batch = self.advance(now_ms)?;
        if let Some(cb) = &self.on_update {
            cb(&batch);
        }
        Some(batch)
    }

    /// Same as [`Self::tick`] without invoking the `on_update` callback.
    ///
    /// Hosts that keep the scheduler behind a lock call this, release the lock and then pass the
    /// batch to [`Self::on_update`], so the callback may call back into the host.
    pub fn advance(&mut self, now_ms: u64) -> Option<Vec<K>> {
        if !self.config.enabled {
            return None;
        }

        let mut seen: IdSet<K> = IdSet::new();
        let mut batch: Vec<K> = Vec::new();
        for id in core::mem::take(&mut self.pending) {
            if self.is_dirty(&id) && seen.insert(id.clone()) {
                batch.push(id);
            }
        }

        for entry in self.entries.values_mut() {
            if !entry.live() {
                continue;
            }
            if entry.poll(now_ms) {
                entry.is_dirty = true;
                entry.last_update = now_ms;
                if seen.insert(entry.id.clone()) {
                    batch.push(entry.id.clone());
                }
            }
        }

        if self.entries.values().any(|e| e.is_active) {
            self.running = true;
            self.next_tick_at = Some(now_ms.saturating_add(self.config.tick_interval_ms));
        } else {
            self.suspend();
        }

        if batch.is_empty() {
            return None;
        }
        ctrace!(dirty = batch.len(), now_ms, "AnimationScheduler::tick");
        Some(batch)
    }

    pub fn enable(&mut self, now_ms: u64) {
        if self.config.enabled {
            return;
        }
        self.config.enabled = true;
        self.wake(now_ms);
    }

    /// Stops the loop. Animations keep their state and resume on [`Self::enable`].
    pub fn disable(&mut self) {
        self.config.enabled = false;
        self.suspend();
    }

    fn wake(&mut self, now_ms: u64) {
        if !self.config.enabled || self.running || self.entries.is_empty() {
            return;
        }
        self.running = true;
        self.next_tick_at = Some(now_ms.saturating_add(self.config.tick_interval_ms));
        ctrace!(now_ms, "AnimationScheduler loop started");
    }

    fn suspend(&mut self) {
        if self.running {
            ctrace!("AnimationScheduler loop suspended");
        }
        self.running = false;
        self.next_tick_at = None;
    }
}

impl<K: IdKey> Default for AnimationScheduler<K> {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

impl<K> core::fmt::Debug for AnimationScheduler<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("config", &self.config)
            .field("animations", &self.entries.len())
            .field("running", &self.running)
            .field("next_tick_at", &self.next_tick_at)
            .finish_non_exhaustive()
    }
}
