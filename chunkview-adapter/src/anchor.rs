use core::fmt;

use chunkview::{DataSource, ListView};

/// A cursor anchor that keeps the cursor on the same item across data changes.
///
/// Typical use cases:
/// - filtering or re-sorting, where the item under the cursor moves to a new index
/// - appending or prepending items around the viewport
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CursorAnchor<K> {
    pub id: K,
    /// Viewport row of the cursor when the anchor was captured.
    pub row: usize,
}

impl<K: fmt::Debug> fmt::Debug for CursorAnchor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorAnchor")
            .field("id", &self.id)
            .field("row", &self.row)
            .finish()
    }
}

/// Captures an anchor for the item under the cursor.
///
/// Returns `None` if the dataset is empty or the cursor's chunk is not loaded.
pub fn capture_cursor_anchor<S: DataSource>(view: &ListView<S>) -> Option<CursorAnchor<S::Key>> {
    let item = view.current_item()?;
    Some(CursorAnchor {
        id: item.id.clone(),
        row: view.state().cursor_viewport_index,
    })
}

/// Moves the cursor back onto the anchored item, at the same viewport row when possible.
///
/// The host must provide a `key_to_index` mapping for the *current* dataset.
///
/// Returns `true` when the anchor was applied; `false` if the item is gone (the cursor is left
/// where the data change put it).
pub fn apply_cursor_anchor<S: DataSource>(
    view: &mut ListView<S>,
    anchor: &CursorAnchor<S::Key>,
    mut key_to_index: impl FnMut(&S::Key) -> Option<usize>,
) -> bool {
    let Some(index) = key_to_index(&anchor.id) else {
        return false;
    };
    if index >= view.total() {
        return false;
    }
    let _ = view.jump_to_index_at(index, anchor.row);
    true
}
