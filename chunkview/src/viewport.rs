use crate::{ConfigError, ViewportConfig, ViewportState, proportional_thresholds};

/// What a navigation command changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Motion {
    pub cursor_moved: bool,
    pub viewport_moved: bool,
}

impl Motion {
    pub fn is_noop(&self) -> bool {
        !self.cursor_moved && !self.viewport_moved
    }
}

/// Effective threshold rows for the current dataset.
///
/// `None` means the threshold is disabled; scrolling then happens at the window edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub top: Option<usize>,
    pub bottom: Option<usize>,
}

/// The viewport/navigation state machine.
///
/// States are implicit in [`ViewportState`]; transitions are the navigation commands. The
/// navigator never touches data: [`crate::ListView`] pairs it with a [`crate::ChunkCache`] and
/// reconciles the cache whenever `viewport_start` moves.
///
/// An empty dataset degrades to a one-row view with the cursor at 0; every command is then a
/// no-op.
#[derive(Clone, Debug)]
pub struct Navigator {
    config: ViewportConfig,
    total: usize,
    height: usize,
    thresholds: Thresholds,
    state: ViewportState,
}

impl Navigator {
    /// Creates a navigator over `total` items, normalizing `config` and placing the cursor at
    /// `config.initial_index` (centered when possible).
    pub fn new(config: ViewportConfig, total: usize) -> Result<Self, ConfigError> {
        let config = config.normalize()?;
        let mut nav = Self {
            config,
            total: 0,
            height: 1,
            thresholds: Thresholds {
                top: None,
                bottom: None,
            },
            state: ViewportState::default(),
        };
        nav.apply_total(total);
        if total > 0 {
            let index = config.initial_index.min(total - 1);
            let row = if index == 0 { 0 } else { nav.height / 2 };
            nav.place(index, row);
        } else {
            nav.place(0, 0);
        }
        cdebug!(
            total,
            height = nav.height,
            chunk_size = config.chunk_size,
            "Navigator::new"
        );
        Ok(nav)
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Effective height: the configured height, clamped to the dataset size (at least one row).
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Highest valid `viewport_start`.
    pub fn max_start(&self) -> usize {
        self.total.saturating_sub(self.height)
    }

    /// Threshold flags for a viewport row: `(is_top_threshold, is_bottom_threshold)`.
    pub fn threshold_flags(&self, row: usize) -> (bool, bool) {
        (
            self.thresholds.top == Some(row),
            self.thresholds.bottom == Some(row),
        )
    }

    fn scroll_up_row(&self) -> usize {
        self.thresholds.top.unwrap_or(0)
    }

    fn scroll_down_row(&self) -> usize {
        self.thresholds
            .bottom
            .unwrap_or(self.height.saturating_sub(1))
    }

    pub fn move_down(&mut self) -> Motion {
        if self.total == 0 || self.state.cursor_index + 1 >= self.total {
            return Motion::default();
        }
        let before = self.state;
        if self.state.cursor_viewport_index >= self.scroll_down_row()
            && self.state.viewport_start < self.max_start()
        {
            self.state.viewport_start += 1;
        } else {
            self.state.cursor_viewport_index += 1;
        }
        self.state.cursor_index += 1;
        self.refresh_flags();
        self.motion_from(before)
    }

    pub fn move_up(&mut self) -> Motion {
        if self.total == 0 || self.state.cursor_index == 0 {
            return Motion::default();
        }
        let before = self.state;
        if self.state.cursor_viewport_index <= self.scroll_up_row() && self.state.viewport_start > 0
        {
            self.state.viewport_start -= 1;
        } else {
            self.state.cursor_viewport_index -= 1;
        }
        self.state.cursor_index -= 1;
        self.refresh_flags();
        self.motion_from(before)
    }

    /// Moves the cursor down by one viewport height, keeping its row when the window allows.
    pub fn page_down(&mut self) -> Motion {
        if self.total == 0 || self.state.cursor_index + 1 >= self.total {
            return Motion::default();
        }
        let target = (self.state.cursor_index + self.height).min(self.total - 1);
        let row = self.state.cursor_viewport_index;
        self.transition(target, row)
    }

    /// Moves the cursor up by one viewport height, keeping its row when the window allows.
    pub fn page_up(&mut self) -> Motion {
        if self.total == 0 || self.state.cursor_index == 0 {
            return Motion::default();
        }
        let target = self.state.cursor_index.saturating_sub(self.height);
        let row = self.state.cursor_viewport_index;
        self.transition(target, row)
    }

    /// Moves the cursor to `index` (clamped) and recenters the window around it.
    pub fn jump_to_index(&mut self, index: usize) -> Motion {
        self.jump_to_index_at(index, self.height / 2)
    }

    /// Moves the cursor to `index` (clamped), showing it at viewport `row` when the window allows.
    pub fn jump_to_index_at(&mut self, index: usize, row: usize) -> Motion {
        if self.total == 0 {
            return Motion::default();
        }
        let target = index.min(self.total - 1);
        self.transition(target, row)
    }

    pub fn jump_to_start(&mut self) -> Motion {
        self.jump_to_index(0)
    }

    pub fn jump_to_end(&mut self) -> Motion {
        self.jump_to_index(self.total.saturating_sub(1))
    }

    /// Applies a new dataset length (filtering, appends, provider swap).
    ///
    /// The effective height and thresholds are recomputed and the cursor is clamped into range,
    /// keeping its viewport row when possible.
    pub fn set_total(&mut self, total: usize) -> Motion {
        let before = self.state;
        let row = self.state.cursor_viewport_index;
        let cursor = self.state.cursor_index;
        self.apply_total(total);
        if total == 0 {
            self.place(0, 0);
        } else {
            self.place(cursor.min(total - 1), row);
        }
        self.motion_from(before)
    }

    fn apply_total(&mut self, total: usize) {
        self.total = total;
        let configured = self.config.height;
        if total == 0 {
            self.height = 1;
            self.thresholds = Thresholds {
                top: None,
                bottom: None,
            };
        } else if total >= configured {
            self.height = configured;
            self.thresholds = Thresholds {
                top: self.config.top_threshold,
                bottom: self.config.bottom_threshold,
            };
        } else {
            self.height = total;
            let (top, bottom) = proportional_thresholds(total);
            self.thresholds = Thresholds {
                top: Some(top),
                bottom: Some(bottom),
            };
        }
    }

    fn transition(&mut self, target: usize, preferred_row: usize) -> Motion {
        let before = self.state;
        self.place(target, preferred_row);
        self.motion_from(before)
    }

    /// Puts the cursor at `cursor`, trying to show it at `preferred_row`.
    fn place(&mut self, cursor: usize, preferred_row: usize) {
        let row = preferred_row.min(self.height - 1);
        let start = cursor.saturating_sub(row).min(self.max_start());
        self.state.viewport_start = start;
        self.state.cursor_index = cursor;
        self.state.cursor_viewport_index = cursor - start;
        self.refresh_flags();
        debug_assert!(self.state.cursor_viewport_index < self.height);
    }

    fn refresh_flags(&mut self) {
        let row = self.state.cursor_viewport_index;
        let (top, bottom) = self.threshold_flags(row);
        self.state.at_top_threshold = top;
        self.state.at_bottom_threshold = bottom;
        self.state.at_dataset_start = self.state.cursor_index == 0;
        self.state.at_dataset_end = self.state.cursor_index + 1 >= self.total;
    }

    fn motion_from(&self, before: ViewportState) -> Motion {
        Motion {
            cursor_moved: before.cursor_index != self.state.cursor_index,
            viewport_moved: before.viewport_start != self.state.viewport_start,
        }
    }
}
