use crate::ConfigError;

/// Chunk size used when the configured one is zero.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default cap on concurrently tracked animations.
pub const DEFAULT_MAX_ANIMATIONS: usize = 256;

/// Default period of the global animation timer.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Threshold rows for a viewport of `height` rows.
///
/// Heights up to 3 degenerate to the extremes. Larger heights place the thresholds roughly 20%
/// in from each edge; the two never coincide and never leave the viewport.
pub fn proportional_thresholds(height: usize) -> (usize, usize) {
    if height <= 1 {
        return (0, 0);
    }
    if height <= 3 {
        return (0, height - 1);
    }
    let top = (height / 5).max(1);
    (top, height - 1 - top)
}

/// Configuration for [`crate::Navigator`] and [`crate::ListView`].
///
/// Values are auto-corrected once by [`ViewportConfig::normalize`]; only a zero height is
/// rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportConfig {
    /// Number of rows the host can draw.
    pub height: usize,
    /// Row at which upward movement scrolls the window. `None` disables it (the top edge is used).
    pub top_threshold: Option<usize>,
    /// Row at which downward movement scrolls the window. `None` disables it (the bottom edge is
    /// used).
    pub bottom_threshold: Option<usize>,
    /// Items fetched per data-source request.
    pub chunk_size: usize,
    /// Cursor position after construction.
    pub initial_index: usize,
    /// Chunks retained on each side of the viewport's chunk.
    pub retain_chunks: usize,
}

impl ViewportConfig {
    /// Creates a config with proportional thresholds and the default chunk size.
    pub fn new(height: usize) -> Self {
        let (top, bottom) = proportional_thresholds(height);
        Self {
            height,
            top_threshold: Some(top),
            bottom_threshold: Some(bottom),
            chunk_size: DEFAULT_CHUNK_SIZE,
            initial_index: 0,
            retain_chunks: 1,
        }
    }

    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    pub fn with_thresholds(mut self, top: Option<usize>, bottom: Option<usize>) -> Self {
        self.top_threshold = top;
        self.bottom_threshold = bottom;
        self
    }

    pub fn with_top_threshold(mut self, top: Option<usize>) -> Self {
        self.top_threshold = top;
        self
    }

    pub fn with_bottom_threshold(mut self, bottom: Option<usize>) -> Self {
        self.bottom_threshold = bottom;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_initial_index(mut self, initial_index: usize) -> Self {
        self.initial_index = initial_index;
        self
    }

    /// Returns a corrected copy of this config.
    ///
    /// - thresholds are clamped into the viewport and forced to `top < bottom`
    /// - a zero `chunk_size` becomes [`DEFAULT_CHUNK_SIZE`]
    /// - `chunk_size` is raised to `height` so a viewport spans at most two chunks
    /// - `retain_chunks` is clamped to one chunk per side
    pub fn normalize(self) -> Result<Self, ConfigError> {
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        let mut out = self;
        let last = out.height - 1;

        let mut top = out.top_threshold.unwrap_or(0).min(last);
        let mut bottom = out.bottom_threshold.unwrap_or(last).min(last);
        if out.height >= 2 && top >= bottom {
            bottom = (top + 1).min(last);
            if top >= bottom {
                top = bottom - 1;
            }
        }
        out.top_threshold = out.top_threshold.map(|_| top);
        out.bottom_threshold = out.bottom_threshold.map(|_| bottom);

        if out.chunk_size == 0 {
            out.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        out.chunk_size = out.chunk_size.max(out.height);
        out.retain_chunks = out.retain_chunks.min(1);

        if out != self {
            cdebug!(
                height = out.height,
                chunk_size = out.chunk_size,
                "ViewportConfig::normalize corrected config"
            );
        }
        Ok(out)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Limits for [`crate::AnimationScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationConfig {
    pub max_animations: usize,
    pub tick_interval_ms: u64,
    pub enabled: bool,
}

impl AnimationConfig {
    pub fn with_max_animations(mut self, max_animations: usize) -> Self {
        self.max_animations = max_animations.max(1);
        self
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms.max(1);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            max_animations: DEFAULT_MAX_ANIMATIONS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            enabled: true,
        }
    }
}
