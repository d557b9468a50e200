// Group endpoints

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{Group, PagedResult, ProvisioningResult, Versioned};
use crate::rest::query::ListQuery;

impl RestClient {
    /// `GET /groups?realm=..&fiql=..&page=..&size=..&orderby=..`
    pub async fn search_groups(&self, query: &ListQuery) -> Result<PagedResult<Group>, Error> {
        self.get_with_params("groups", &query.params()).await
    }

    pub async fn count_groups(&self, query: &ListQuery) -> Result<u64, Error> {
        let page: PagedResult<Group> = self
            .get_with_params("groups", &query.count_only().params())
            .await?;
        Ok(page.total_count)
    }

    /// `GET /groups/{key}`
    pub async fn read_group(&self, key: &str) -> Result<Versioned<Group>, Error> {
        self.get_versioned(&format!("groups/{key}")).await
    }

    /// `POST /groups`
    pub async fn create_group(&self, group: &Group) -> Result<ProvisioningResult<Group>, Error> {
        debug!(name = %group.name, "creating group");
        self.post("groups", group).await
    }

    /// `PUT /groups/{key}` with `If-Match`.
    pub async fn update_group(
        &self,
        key: &str,
        etag: Option<&str>,
        group: &Group,
    ) -> Result<ProvisioningResult<Group>, Error> {
        debug!(key, "updating group");
        self.put(&format!("groups/{key}"), etag, group).await
    }

    /// `DELETE /groups/{key}` with `If-Match`.
    pub async fn delete_group(
        &self,
        key: &str,
        etag: Option<&str>,
    ) -> Result<ProvisioningResult<Group>, Error> {
        debug!(key, "deleting group");
        self.delete_with_response(&format!("groups/{key}"), etag)
            .await
    }
}
