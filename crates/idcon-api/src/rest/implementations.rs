// Implementation endpoints
//
// Implementations are grouped by type: `/implementations/{type}/{key}`.

use tracing::debug;

use crate::error::Error;
use crate::rest::client::RestClient;
use crate::rest::models::{Implementation, Versioned};

impl RestClient {
    /// `GET /implementations/{type}`
    pub async fn list_implementations(&self, kind: &str) -> Result<Vec<Implementation>, Error> {
        self.get(&format!("implementations/{kind}")).await
    }

    /// `GET /implementations/{type}/{key}`
    pub async fn read_implementation(
        &self,
        kind: &str,
        key: &str,
    ) -> Result<Versioned<Implementation>, Error> {
        self.get_versioned(&format!("implementations/{kind}/{key}"))
            .await
    }

    /// `POST /implementations/{type}/{key}`
    pub async fn create_implementation(
        &self,
        key: &str,
        implementation: &Implementation,
    ) -> Result<Option<String>, Error> {
        debug!(kind = %implementation.kind, key, "creating implementation");
        let created = self
            .post_created(
                &format!("implementations/{}/{key}", implementation.kind),
                implementation,
            )
            .await?;
        Ok(created.or_else(|| Some(key.to_owned())))
    }

    /// `PUT /implementations/{type}/{key}`
    pub async fn update_implementation(
        &self,
        key: &str,
        etag: Option<&str>,
        implementation: &Implementation,
    ) -> Result<(), Error> {
        debug!(kind = %implementation.kind, key, "updating implementation");
        self.put_empty(
            &format!("implementations/{}/{key}", implementation.kind),
            etag,
            implementation,
        )
        .await
    }

    /// `DELETE /implementations/{type}/{key}`
    pub async fn delete_implementation(&self, kind: &str, key: &str) -> Result<(), Error> {
        debug!(kind, key, "deleting implementation");
        self.delete(&format!("implementations/{kind}/{key}"), None)
            .await
    }
}
