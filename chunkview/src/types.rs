use alloc::string::String;

/// Default stable identity for list items.
pub type ItemId = u64;

/// A half-open range of absolute item indexes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRange {
    pub start: usize,
    pub end: usize, // exclusive
}

impl ItemRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

impl core::fmt::Display for ItemRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// An item as stored in the chunk cache.
///
/// `id` must be independent of the item's position so that selection and animation state
/// survive chunk reloads, filtering and reordering.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Data<T, K = ItemId> {
    pub id: K,
    pub item: T,
    pub selected: bool,
    pub disabled: bool,
    pub hidden: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T, K> Data<T, K> {
    pub fn new(id: K, item: T) -> Self {
        Self {
            id,
            item,
            selected: false,
            disabled: false,
            hidden: false,
            loading: false,
            error: None,
        }
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}
