// ── Data providers ──
//
// A provider answers two questions for a directory: how many rows match,
// and which rows fall in a `[first, first + count)` window under a sort.
// Kinds the server pages go through `RemoteProvider`; the rest fetch the
// full collection and slice it locally.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use idcon_api::{ListQuery, PagedResult, RestClient};

use crate::error::CoreError;
use crate::model::{Group, Realm, User};

use super::column::Tabular;
use super::sort::SortParam;

/// Backing collection of a directory.
pub trait DataProvider: Send + Sync {
    type Item: Tabular;

    /// Total number of matching rows.
    fn size(&self) -> impl Future<Output = Result<u64, CoreError>> + Send;

    /// Rows `first..first + count`, sorted if `sort` is set.
    fn page(
        &self,
        first: u64,
        count: u32,
        sort: Option<&SortParam>,
    ) -> impl Future<Output = Result<Vec<Self::Item>, CoreError>> + Send;
}

// ── In-memory slicing ────────────────────────────────────────────────

/// Sort, filter and slice an already fetched collection.
pub fn slice<T: Tabular>(
    mut items: Vec<T>,
    keyword: Option<&str>,
    first: u64,
    count: u32,
    sort: Option<&SortParam>,
) -> Vec<T> {
    if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
        items.retain(|item| item.matches(keyword));
    }
    if let Some(sort) = sort {
        items.sort_by(|a, b| {
            sort.direct(
                a.sort_value(&sort.property)
                    .cmp(&b.sort_value(&sort.property)),
            )
        });
    }
    let first = usize::try_from(first).unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(first)
        .take(count as usize)
        .collect()
}

fn count_matching<T: Tabular>(items: &[T], keyword: Option<&str>) -> u64 {
    let n = match keyword.filter(|k| !k.is_empty()) {
        Some(keyword) => items.iter().filter(|i| i.matches(keyword)).count(),
        None => items.len(),
    };
    n as u64
}

/// A fixed list held in memory.
#[derive(Debug, Clone)]
pub struct ListProvider<T> {
    items: Vec<T>,
    keyword: Option<String>,
}

impl<T: Tabular> ListProvider<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            keyword: None,
        }
    }

    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }
}

impl<T: Tabular> DataProvider for ListProvider<T> {
    type Item = T;

    async fn size(&self) -> Result<u64, CoreError> {
        Ok(count_matching(&self.items, self.keyword.as_deref()))
    }

    async fn page(
        &self,
        first: u64,
        count: u32,
        sort: Option<&SortParam>,
    ) -> Result<Vec<T>, CoreError> {
        Ok(slice(
            self.items.clone(),
            self.keyword.as_deref(),
            first,
            count,
            sort,
        ))
    }
}

// ── Unpaged remote collections ───────────────────────────────────────

type Fetch<T> =
    Arc<dyn Fn(Arc<RestClient>) -> BoxFuture<'static, Result<Vec<T>, CoreError>> + Send + Sync>;

/// A remote collection the server returns whole; every call refetches.
#[derive(Clone)]
pub struct CollectionProvider<T> {
    client: Arc<RestClient>,
    fetch: Fetch<T>,
    keyword: Option<String>,
}

impl<T: Tabular> CollectionProvider<T> {
    pub fn new<F>(client: Arc<RestClient>, fetch: F) -> Self
    where
        F: Fn(Arc<RestClient>) -> BoxFuture<'static, Result<Vec<T>, CoreError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            client,
            fetch: Arc::new(fetch),
            keyword: None,
        }
    }

    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }

    async fn fetch(&self) -> Result<Vec<T>, CoreError> {
        (self.fetch)(Arc::clone(&self.client)).await
    }
}

impl<T: Tabular> DataProvider for CollectionProvider<T> {
    type Item = T;

    async fn size(&self) -> Result<u64, CoreError> {
        let items = self.fetch().await?;
        Ok(count_matching(&items, self.keyword.as_deref()))
    }

    async fn page(
        &self,
        first: u64,
        count: u32,
        sort: Option<&SortParam>,
    ) -> Result<Vec<T>, CoreError> {
        let items = self.fetch().await?;
        Ok(slice(items, self.keyword.as_deref(), first, count, sort))
    }
}

// ── Server-paged collections ─────────────────────────────────────────

/// Entities the server searches, counts and pages.
pub trait Searchable: Tabular {
    fn search(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<PagedResult<Self>, idcon_api::Error>> + Send;

    fn count(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<u64, idcon_api::Error>> + Send;
}

impl Searchable for User {
    fn search(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<PagedResult<Self>, idcon_api::Error>> + Send {
        client.search_users(query)
    }

    fn count(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<u64, idcon_api::Error>> + Send {
        client.count_users(query)
    }
}

impl Searchable for Group {
    fn search(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<PagedResult<Self>, idcon_api::Error>> + Send {
        client.search_groups(query)
    }

    fn count(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<u64, idcon_api::Error>> + Send {
        client.count_groups(query)
    }
}

impl Searchable for Realm {
    fn search(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<PagedResult<Self>, idcon_api::Error>> + Send {
        client.search_realms(query)
    }

    fn count(
        client: &RestClient,
        query: &ListQuery,
    ) -> impl Future<Output = Result<u64, idcon_api::Error>> + Send {
        client.count_realms(query)
    }
}

/// Search-backed provider: the filter and realm live in `query`, the
/// window and sort are applied per call.
#[derive(Clone)]
pub struct RemoteProvider<T> {
    client: Arc<RestClient>,
    query: ListQuery,
    _kind: std::marker::PhantomData<fn() -> T>,
}

impl<T: Searchable> RemoteProvider<T> {
    pub fn new(client: Arc<RestClient>, query: ListQuery) -> Self {
        Self {
            client,
            query,
            _kind: std::marker::PhantomData,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Query for one window; `first` is expected to be a multiple of `count`.
    fn window(&self, first: u64, count: u32, sort: Option<&SortParam>) -> ListQuery {
        let page = if count == 0 {
            1
        } else {
            u32::try_from(first / u64::from(count)).unwrap_or(u32::MAX - 1) + 1
        };
        let mut query = self.query.clone().page(page).size(count);
        query.order_by = sort.map(SortParam::to_order_by);
        query
    }
}

impl<T: Searchable> DataProvider for RemoteProvider<T> {
    type Item = T;

    async fn size(&self) -> Result<u64, CoreError> {
        Ok(T::count(&self.client, &self.query).await?)
    }

    async fn page(
        &self,
        first: u64,
        count: u32,
        sort: Option<&SortParam>,
    ) -> Result<Vec<T>, CoreError> {
        let query = self.window(first, count, sort);
        Ok(T::search(&self.client, &query).await?.result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idcon_api::TransportConfig;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Role;

    fn roles(names: &[&str]) -> Vec<Role> {
        names
            .iter()
            .map(|n| Role {
                key: Some((*n).into()),
                ..Role::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn list_provider_sorts_then_slices() {
        let provider = ListProvider::new(roles(&["c", "A", "b", "d"]));
        assert_eq!(provider.size().await.unwrap(), 4);
        let page = provider
            .page(2, 2, Some(&SortParam::asc("key")))
            .await
            .unwrap();
        let keys: Vec<_> = page.iter().filter_map(|r| r.key.as_deref()).collect();
        assert_eq!(keys, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn list_provider_keyword_narrows_size() {
        let provider =
            ListProvider::new(roles(&["admin", "superadmin", "user"])).with_keyword(Some("ADMIN".into()));
        assert_eq!(provider.size().await.unwrap(), 2);
    }

    #[test]
    fn remote_window_is_one_based() {
        let client =
            Arc::new(RestClient::new("http://localhost/rest", "Master", &TransportConfig::default()).unwrap());
        let provider = RemoteProvider::<User>::new(client, ListQuery::default().realm("/even"));
        let query = provider.window(20, 10, Some(&SortParam::desc("username")));
        assert_eq!(query.page, 3);
        assert_eq!(query.size, 10);
        assert_eq!(query.order_by.as_deref(), Some("username DESC"));
        assert_eq!(query.realm.as_deref(), Some("/even"));
    }
}
