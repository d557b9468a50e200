// Role endpoints
//
// Roles are not paged server-side; the full list is returned.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{Role, Versioned};

impl RestClient {
    /// `GET /roles`
    pub async fn list_roles(&self) -> Result<Vec<Role>, Error> {
        self.get("roles").await
    }

    /// `GET /roles/{key}`
    pub async fn read_role(&self, key: &str) -> Result<Versioned<Role>, Error> {
        self.get_versioned(&format!("roles/{key}")).await
    }

    /// `POST /roles`; returns the created key.
    pub async fn create_role(&self, role: &Role) -> Result<Option<String>, Error> {
        debug!(key = ?role.key, "creating role");
        self.post_created("roles", role).await
    }

    /// `PUT /roles/{key}`
    pub async fn update_role(
        &self,
        key: &str,
        etag: Option<&str>,
        role: &Role,
    ) -> Result<(), Error> {
        debug!(key, "updating role");
        self.put_empty(&format!("roles/{key}"), etag, role).await
    }

    /// `DELETE /roles/{key}`
    pub async fn delete_role(&self, key: &str) -> Result<(), Error> {
        debug!(key, "deleting role");
        self.delete(&format!("roles/{key}"), None).await
    }
}
