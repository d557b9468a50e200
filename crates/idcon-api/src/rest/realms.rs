// Realm endpoints
//
// Realms are addressed by full path (`/even/two`), not by key.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{PagedResult, ProvisioningResult, Realm};
use crate::rest::query::ListQuery;

impl RestClient {
    /// Search realms below `query.realm` (default `/`).
    ///
    /// `GET /realms?base=..&keyword=..&page=..&size=..`
    pub async fn search_realms(&self, query: &ListQuery) -> Result<PagedResult<Realm>, Error> {
        self.get_with_params("realms", &realm_params(query)).await
    }

    pub async fn count_realms(&self, query: &ListQuery) -> Result<u64, Error> {
        let page: PagedResult<Realm> = self
            .get_with_params("realms", &realm_params(&query.count_only()))
            .await?;
        Ok(page.total_count)
    }

    /// Read a realm by full path (first match of a base search).
    pub async fn read_realm(&self, full_path: &str) -> Result<Realm, Error> {
        let query = ListQuery::default().realm(full_path).size(1);
        let page = self.search_realms(&query).await?;
        page.result
            .into_iter()
            .find(|r| r.full_path == full_path)
            .ok_or_else(|| Error::NotFound {
                path: format!("realms{full_path}"),
            })
    }

    /// Create `realm` below its parent path.
    ///
    /// `POST /realms/{parentPath}`
    pub async fn create_realm(&self, realm: &Realm) -> Result<ProvisioningResult<Realm>, Error> {
        let parent = realm.parent_path();
        debug!(name = %realm.name, parent, "creating realm");
        self.post(&format!("realms{}", trim_root(parent)), realm)
            .await
    }

    /// `PUT /realms/{fullPath}`
    pub async fn update_realm(&self, realm: &Realm) -> Result<ProvisioningResult<Realm>, Error> {
        debug!(path = %realm.full_path, "updating realm");
        self.put(&format!("realms{}", realm.full_path), None, realm)
            .await
    }

    /// `DELETE /realms/{fullPath}`
    pub async fn delete_realm(&self, full_path: &str) -> Result<ProvisioningResult<Realm>, Error> {
        debug!(path = full_path, "deleting realm");
        self.delete_with_response(&format!("realms{full_path}"), None)
            .await
    }
}

fn realm_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("size", query.size.to_string()),
        ("base", query.realm.clone().unwrap_or_else(|| "/".into())),
    ];
    if let Some(ref keyword) = query.keyword {
        params.push(("keyword", keyword.clone()));
    }
    params
}

/// `/` as a parent maps to the bare collection path.
fn trim_root(path: &str) -> &str {
    if path == "/" { "" } else { path }
}
