// ── Directories ──
//
// Paged, sortable lists of one entity kind: columns, providers and the
// view state machine shared by CLI and TUI.

mod column;
mod provider;
mod sort;
mod view;

pub use column::{Column, KEY_COLUMN, Tabular};
pub use provider::{
    CollectionProvider, DataProvider, ListProvider, RemoteProvider, Searchable, slice,
};
pub use sort::{SortParam, SortValue};
pub use view::{DirectoryView, Pagination, RefreshMode};
