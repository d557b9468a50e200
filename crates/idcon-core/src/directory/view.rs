// ── Directory view state ──
//
// One paged, sortable list bound to a `DataProvider`. The view owns the
// current window of rows, the checkbox selection and the column choice;
// front ends render it and call back into it on operator input.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::CoreError;
use crate::model::{Entity, EntityKind};
use crate::preferences::{PAGINATOR_CHOICES, Preferences};

use super::column::{Column, KEY_COLUMN, Tabular};
use super::provider::DataProvider;
use super::sort::SortParam;

// ── Pagination ───────────────────────────────────────────────────────

/// Page math over a total row count. `page` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub rows: u32,
    pub page: u32,
}

impl Pagination {
    pub fn new(rows: u32) -> Self {
        Self {
            total: 0,
            rows: rows.max(1),
            page: 0,
        }
    }

    /// Number of pages; an empty directory still has one.
    pub fn page_count(&self) -> u32 {
        let rows = u64::from(self.rows.max(1));
        let pages = self.total.div_ceil(rows).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn last_page(&self) -> u32 {
        self.page_count() - 1
    }

    /// Offset of the first row of the current page.
    pub fn first(&self) -> u64 {
        u64::from(self.page) * u64::from(self.rows)
    }

    pub fn clamp(&mut self) {
        self.page = self.page.min(self.last_page());
    }

    /// `"21-25 of 25"`, or `"0 of 0"` when empty.
    pub fn range_label(&self) -> String {
        if self.total == 0 {
            return "0 of 0".into();
        }
        let first = self.first() + 1;
        let last = (self.first() + u64::from(self.rows)).min(self.total);
        format!("{first}-{last} of {}", self.total)
    }
}

/// Where a refresh lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Stay on the current page, clamped to the new last page.
    #[default]
    Keep,
    /// Jump to the last page, where a newly created row shows up.
    LastPage,
}

// ── DirectoryView ────────────────────────────────────────────────────

pub struct DirectoryView<P: DataProvider> {
    kind: EntityKind,
    provider: P,
    prefs: Preferences,
    pagination: Pagination,
    sort: Option<SortParam>,
    rows: Vec<P::Item>,
    selection: BTreeSet<String>,
    checkboxes: bool,
    columns: Vec<String>,
}

impl<P: DataProvider> DirectoryView<P> {
    /// A view with rows per page and columns taken from `prefs`. Nothing
    /// is fetched until [`refresh`](Self::refresh).
    pub fn new(kind: EntityKind, provider: P, prefs: Preferences) -> Self {
        let rows = prefs.paginator_rows(kind);
        let defaults = P::Item::default_columns();
        let columns = normalize_columns::<P::Item>(prefs.visible_columns(kind, &defaults));
        Self {
            kind,
            provider,
            prefs,
            pagination: Pagination::new(rows),
            sort: None,
            rows: Vec::new(),
            selection: BTreeSet::new(),
            checkboxes: false,
            columns,
        }
    }

    /// Enable checkbox selection for batch actions.
    pub fn with_checkboxes(mut self, enabled: bool) -> Self {
        self.checkboxes = enabled;
        self
    }

    /// Rows per page for this view, saved as the new preference.
    /// Nothing is fetched.
    pub fn with_rows(mut self, rows: u32) -> Result<Self, CoreError> {
        if !PAGINATOR_CHOICES.contains(&rows) {
            return Err(CoreError::validation(format!(
                "rows per page must be one of {PAGINATOR_CHOICES:?}"
            )));
        }
        self.prefs.try_set_paginator_rows(self.kind, rows);
        self.pagination.rows = rows;
        Ok(self)
    }

    pub fn with_sort(mut self, sort: Option<SortParam>) -> Self {
        self.sort = sort;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn rows(&self) -> &[P::Item] {
        &self.rows
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn sort(&self) -> Option<&SortParam> {
        self.sort.as_ref()
    }

    pub fn checkboxes(&self) -> bool {
        self.checkboxes
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Recount, reposition and refetch the current window. Clears the
    /// selection.
    pub async fn refresh(&mut self, mode: RefreshMode) -> Result<(), CoreError> {
        self.pagination.total = self.provider.size().await?;
        if mode == RefreshMode::LastPage {
            self.pagination.page = self.pagination.last_page();
        }
        self.pagination.clamp();
        self.rows = self
            .provider
            .page(
                self.pagination.first(),
                self.pagination.rows,
                self.sort.as_ref(),
            )
            .await?;
        self.selection.clear();
        debug!(
            kind = %self.kind,
            page = self.pagination.page,
            total = self.pagination.total,
            rows = self.rows.len(),
            "directory refreshed"
        );
        Ok(())
    }

    /// Replace the provider (new filter or realm) and go back to page one.
    pub async fn set_provider(&mut self, provider: P) -> Result<(), CoreError> {
        self.provider = provider;
        self.pagination.page = 0;
        self.refresh(RefreshMode::Keep).await
    }

    pub async fn goto(&mut self, page: u32) -> Result<(), CoreError> {
        self.pagination.page = page;
        self.refresh(RefreshMode::Keep).await
    }

    pub async fn next_page(&mut self) -> Result<(), CoreError> {
        if self.pagination.page < self.pagination.last_page() {
            self.goto(self.pagination.page + 1).await
        } else {
            Ok(())
        }
    }

    pub async fn prev_page(&mut self) -> Result<(), CoreError> {
        if self.pagination.page > 0 {
            self.goto(self.pagination.page - 1).await
        } else {
            Ok(())
        }
    }

    /// Sort on `column`, flipping direction when it is already the sort
    /// column. Unknown or unsortable columns are rejected.
    pub async fn sort_by(&mut self, column: &str) -> Result<(), CoreError> {
        match P::Item::column(column) {
            Some(c) if c.sortable => {}
            _ => {
                return Err(CoreError::validation(format!(
                    "cannot sort {} by {column}",
                    self.kind.title()
                )));
            }
        }
        self.sort = Some(SortParam::toggle(self.sort.as_ref(), column));
        self.pagination.page = 0;
        self.refresh(RefreshMode::Keep).await
    }

    /// Change rows per page, persist the choice and refetch from page one.
    pub async fn set_rows(&mut self, rows: u32) -> Result<(), CoreError> {
        if !PAGINATOR_CHOICES.contains(&rows) {
            return Err(CoreError::validation(format!(
                "rows per page must be one of {PAGINATOR_CHOICES:?}"
            )));
        }
        self.prefs.try_set_paginator_rows(self.kind, rows);
        self.pagination.rows = rows;
        self.pagination.page = 0;
        self.refresh(RefreshMode::Keep).await
    }

    // ── Columns ──────────────────────────────────────────────────────

    pub fn visible_columns(&self) -> Vec<&'static Column> {
        self.columns
            .iter()
            .filter_map(|id| P::Item::column(id))
            .collect()
    }

    /// Show `columns` (the key column is always kept) and persist them.
    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<(), CoreError> {
        self.columns = normalize_columns::<P::Item>(columns);
        self.prefs.set_visible_columns(self.kind, &self.columns)
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Toggle the checkbox of the row with `key`; returns whether it is
    /// now selected.
    pub fn toggle_selected(&mut self, key: &str) -> bool {
        if !self.checkboxes {
            return false;
        }
        if self.selection.remove(key) {
            false
        } else {
            self.selection.insert(key.to_owned());
            true
        }
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    /// Select every row of the current page, or clear when all already are.
    pub fn toggle_all(&mut self) {
        if !self.checkboxes {
            return;
        }
        let keys: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.key().map(str::to_owned))
            .collect();
        if keys.iter().all(|k| self.selection.contains(k)) {
            self.selection.clear();
        } else {
            self.selection.extend(keys);
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.selection.iter().cloned().collect()
    }

    /// Selected rows of the current page.
    pub fn selected_rows(&self) -> Vec<&P::Item> {
        self.rows
            .iter()
            .filter(|r| r.key().is_some_and(|k| self.selection.contains(k)))
            .collect()
    }
}

fn normalize_columns<T: Tabular>(columns: Vec<String>) -> Vec<String> {
    let mut known: Vec<String> = columns
        .into_iter()
        .filter(|c| T::column(c).is_some())
        .collect();
    if T::column(KEY_COLUMN).is_some() && !known.iter().any(|c| c == KEY_COLUMN) {
        known.insert(0, KEY_COLUMN.to_owned());
    }
    known
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directory::provider::ListProvider;
    use crate::model::Role;
    use crate::preferences::{MemoryPreferences, PreferenceStore};

    fn items(n: usize) -> Vec<Role> {
        (1..=n)
            .map(|i| Role {
                key: Some(format!("item-{i:02}")),
                ..Role::default()
            })
            .collect()
    }

    fn keys(view: &DirectoryView<ListProvider<Role>>) -> Vec<String> {
        view.rows()
            .iter()
            .filter_map(|r| r.key.clone())
            .collect()
    }

    #[test]
    fn pagination_math() {
        let mut p = Pagination::new(10);
        assert_eq!(p.page_count(), 1);
        p.total = 25;
        assert_eq!(p.page_count(), 3);
        p.page = 2;
        assert_eq!(p.first(), 20);
        assert_eq!(p.range_label(), "21-25 of 25");
        p.total = 11;
        p.clamp();
        assert_eq!(p.page, 1);
    }

    #[tokio::test]
    async fn third_page_of_twenty_five_shows_last_five() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(25)),
            Preferences::default(),
        );
        view.goto(2).await.unwrap();
        assert_eq!(
            keys(&view),
            vec!["item-21", "item-22", "item-23", "item-24", "item-25"]
        );
        assert_eq!(view.pagination().page_count(), 3);
    }

    #[tokio::test]
    async fn refresh_after_create_jumps_to_last_page() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(12)),
            Preferences::default(),
        );
        view.refresh(RefreshMode::Keep).await.unwrap();
        assert_eq!(view.pagination().page, 0);
        view.set_provider(ListProvider::new(items(31))).await.unwrap();
        view.refresh(RefreshMode::LastPage).await.unwrap();
        assert_eq!(view.pagination().page, 3);
        assert_eq!(keys(&view), vec!["item-31"]);
    }

    #[tokio::test]
    async fn refresh_clamps_after_delete() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(21)),
            Preferences::default(),
        );
        view.goto(2).await.unwrap();
        assert_eq!(keys(&view), vec!["item-21"]);
        view.provider = ListProvider::new(items(20));
        view.refresh(RefreshMode::Keep).await.unwrap();
        assert_eq!(view.pagination().page, 1);
        assert_eq!(view.rows().len(), 10);
    }

    #[tokio::test]
    async fn rows_choice_is_persisted() {
        let store = Arc::new(MemoryPreferences::default());
        let prefs = Preferences::new(store.clone());
        let mut view = DirectoryView::new(EntityKind::Role, ListProvider::new(items(60)), prefs.clone());
        view.set_rows(25).await.unwrap();
        assert_eq!(view.rows().len(), 25);
        assert_eq!(store.get("roles.paginator.rows").as_deref(), Some("25"));
        assert!(view.set_rows(30).await.is_err());

        let reopened = DirectoryView::new(EntityKind::Role, ListProvider::new(items(60)), prefs);
        assert_eq!(reopened.pagination().rows, 25);
    }

    #[tokio::test]
    async fn sort_toggles_direction() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(3)),
            Preferences::default(),
        );
        view.sort_by("key").await.unwrap();
        assert_eq!(keys(&view), vec!["item-01", "item-02", "item-03"]);
        view.sort_by("key").await.unwrap();
        assert_eq!(keys(&view), vec!["item-03", "item-02", "item-01"]);
        assert!(view.sort_by("entitlements").await.is_err());
    }

    #[tokio::test]
    async fn selection_requires_checkboxes_and_clears_on_refresh() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(3)),
            Preferences::default(),
        );
        view.refresh(RefreshMode::Keep).await.unwrap();
        assert!(!view.toggle_selected("item-01"));

        let mut view = view.with_checkboxes(true);
        assert!(view.toggle_selected("item-01"));
        view.toggle_all();
        assert_eq!(view.selected().len(), 3);
        view.toggle_all();
        assert!(view.selected().is_empty());
        view.toggle_selected("item-02");
        view.refresh(RefreshMode::Keep).await.unwrap();
        assert!(view.selected().is_empty());
    }

    #[test]
    fn key_column_is_always_visible() {
        let mut view = DirectoryView::new(
            EntityKind::Role,
            ListProvider::new(items(1)),
            Preferences::default(),
        );
        view.set_columns(vec!["realms".into(), "bogus".into()]).unwrap();
        let ids: Vec<_> = view.visible_columns().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["key", "realms"]);
    }
}
