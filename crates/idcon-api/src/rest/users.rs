// User endpoints
//
// Users are searched server-side with FIQL and paged; writes return a
// provisioning result carrying per-resource propagation statuses.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{
    PagedResult, ProvisioningResult, StatusRequest, StatusType, User, Versioned,
};
use crate::rest::query::ListQuery;

impl RestClient {
    /// Search users.
    ///
    /// `GET /users?realm=..&fiql=..&page=..&size=..&orderby=..`
    pub async fn search_users(&self, query: &ListQuery) -> Result<PagedResult<User>, Error> {
        self.get_with_params("users", &query.params()).await
    }

    /// Count users matching the query (a search with `size=0`).
    pub async fn count_users(&self, query: &ListQuery) -> Result<u64, Error> {
        let page: PagedResult<User> = self
            .get_with_params("users", &query.count_only().params())
            .await?;
        Ok(page.total_count)
    }

    /// `GET /users/{key}`
    pub async fn read_user(&self, key: &str) -> Result<Versioned<User>, Error> {
        self.get_versioned(&format!("users/{key}")).await
    }

    /// `POST /users`
    pub async fn create_user(&self, user: &User) -> Result<ProvisioningResult<User>, Error> {
        debug!(username = %user.username, "creating user");
        self.post("users", user).await
    }

    /// `PUT /users/{key}` with `If-Match`.
    pub async fn update_user(
        &self,
        key: &str,
        etag: Option<&str>,
        user: &User,
    ) -> Result<ProvisioningResult<User>, Error> {
        debug!(key, "updating user");
        self.put(&format!("users/{key}"), etag, user).await
    }

    /// `DELETE /users/{key}` with `If-Match`.
    pub async fn delete_user(
        &self,
        key: &str,
        etag: Option<&str>,
    ) -> Result<ProvisioningResult<User>, Error> {
        debug!(key, "deleting user");
        self.delete_with_response(&format!("users/{key}"), etag)
            .await
    }

    /// Suspend or reactivate a user.
    ///
    /// `POST /users/{key}/status` with `If-Match`.
    pub async fn set_user_status(
        &self,
        key: &str,
        etag: Option<&str>,
        status: StatusType,
    ) -> Result<ProvisioningResult<User>, Error> {
        debug!(key, %status, "changing user status");
        let body = StatusRequest {
            key: key.to_owned(),
            kind: status,
            on_syncope: true,
        };
        self.post_conditional(&format!("users/{key}/status"), etag, &body)
            .await
    }
}
