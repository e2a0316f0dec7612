/// A lightweight, serializable snapshot of the navigation state.
///
/// Invariants for every reachable state (with `height` the effective viewport height):
/// - `cursor_viewport_index < height`
/// - `viewport_start + cursor_viewport_index == cursor_index`
/// - `viewport_start + height <= total` unless `total < height`
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`, which is enough for a
/// host that wants to persist scroll position across sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub viewport_start: usize,
    pub cursor_index: usize,
    pub cursor_viewport_index: usize,
    pub at_top_threshold: bool,
    pub at_bottom_threshold: bool,
    pub at_dataset_start: bool,
    pub at_dataset_end: bool,
}

impl ViewportState {
    /// Absolute index of the row at `row` within the viewport.
    pub fn index_of_row(&self, row: usize) -> usize {
        self.viewport_start.saturating_add(row)
    }
}
